//! Account provisioning: the one-shot signup operation.
//!
//! Signup sits outside the realtime connection (the original service
//! exposed it over plain HTTP). The HTTP layer itself is not part of
//! this crate; whatever hosts it calls [`signup`] and writes the
//! rendered [`SignupOutcome`] straight into the response body. The
//! reply strings are part of the client contract and must not change.

use std::fmt;

use crate::{AccountError, AccountStore};

/// The result of a signup attempt.
///
/// `Display` renders the exact client-facing reply for each case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignupOutcome {
    /// The account was created.
    Ok,
    /// The username is empty or contains characters outside `[A-Za-z0-9_-]`.
    ForbiddenCharacters,
    /// An account with this username already exists.
    AlreadyExists,
    /// The store failed. Details are logged server-side only.
    StoreError,
}

impl fmt::Display for SignupOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => write!(f, "OK"),
            Self::ForbiddenCharacters => {
                write!(f, "Your username includes forbidden characters!")
            }
            Self::AlreadyExists => {
                write!(f, "A player with this username already exists.")
            }
            Self::StoreError => write!(f, "Database error."),
        }
    }
}

/// Returns `true` if `username` is non-empty and made only of ASCII
/// letters, digits, `-` and `_`.
pub fn valid_username(username: &str) -> bool {
    !username.is_empty()
        && username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Provisions a new account.
///
/// Validation order matches the original service: charset first, then
/// uniqueness (enforced atomically by the store's `create`), then the
/// write itself. The password is hashed by the store; it is never
/// persisted or logged in the clear.
pub async fn signup<S: AccountStore>(
    store: &S,
    username: &str,
    password: &str,
) -> SignupOutcome {
    if !valid_username(username) || password.is_empty() {
        return SignupOutcome::ForbiddenCharacters;
    }

    match store.create(username, password).await {
        Ok(()) => SignupOutcome::Ok,
        Err(AccountError::DuplicateUsername(_)) => SignupOutcome::AlreadyExists,
        Err(e) => {
            tracing::error!(username, error = %e, "signup store failure");
            SignupOutcome::StoreError
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
