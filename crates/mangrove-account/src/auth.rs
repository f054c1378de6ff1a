//! Authentication: credential pair in, client-safe profile out.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use mangrove_protocol::PlayerProfile;

use crate::{AccountError, AccountStore};

/// Default deadline for one account-store round trip.
const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);

/// The result of an authentication attempt.
///
/// Deliberately two-valued on the client side: every internal failure
/// mode (unknown user, bad password, store fault, store timeout)
/// collapses into [`AuthOutcome::Failed`] so the wire gives an
/// attacker nothing to probe. The distinctions live in the server log.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthOutcome {
    /// Credentials check out. The profile has the verifier stripped;
    /// `server_time` is Unix-epoch milliseconds for client clock
    /// reconciliation.
    Succeeded {
        profile: PlayerProfile,
        server_time: u64,
    },
    /// Anything else.
    Failed,
}

/// Validates inbound credential pairs against the account store.
///
/// Pure lookup-and-verify: on success it only *returns* the profile —
/// registering the session with the island directory is the caller's
/// job, after this resolves. That ordering is what keeps unauthenticated
/// connections out of the registry entirely.
pub struct Authenticator<S> {
    store: Arc<S>,
    store_timeout: Duration,
}

impl<S: AccountStore> Authenticator<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    /// Overrides the account-store deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    /// Checks a credential pair.
    ///
    /// The store lookup is the one slow, variable-latency await in the
    /// whole login path; it is bounded by the configured timeout and a
    /// timeout is treated as a store fault, not a crash.
    pub async fn authenticate(&self, username: &str, password: &str) -> AuthOutcome {
        if username.is_empty() || password.is_empty() {
            return AuthOutcome::Failed;
        }

        // A blown deadline is just another store fault from here on.
        let lookup =
            tokio::time::timeout(self.store_timeout, self.store.find(username))
                .await
                .map_err(|_| AccountError::Timeout)
                .and_then(|result| result);

        let account = match lookup {
            Err(e) => {
                tracing::error!(username, error = %e, "account store failure during auth");
                return AuthOutcome::Failed;
            }
            Ok(None) => {
                tracing::debug!(username, "auth failed: unknown username");
                return AuthOutcome::Failed;
            }
            Ok(Some(account)) => account,
        };

        if !self.store.verify(&account, password) {
            tracing::debug!(username, "auth failed: wrong password");
            return AuthOutcome::Failed;
        }

        AuthOutcome::Succeeded {
            profile: account.profile(),
            server_time: now_millis(),
        }
    }
}

/// Milliseconds since the Unix epoch.
fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

// =========================================================================
// Tests
// =========================================================================
