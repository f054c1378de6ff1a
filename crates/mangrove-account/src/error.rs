//! Error types for the account layer.

/// Errors that can come out of an [`AccountStore`](crate::AccountStore).
///
/// These are the store's internal failures. They are logged server-side
/// and always collapsed into a generic client-visible outcome
/// (`AuthFail` / `"Database error."`) — a client must never be able to
/// tell a store fault from bad credentials.
#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    /// The store could not be reached or errored mid-operation.
    #[error("account store unavailable: {0}")]
    Unavailable(String),

    /// An account with this username already exists.
    #[error("username {0:?} is already taken")]
    DuplicateUsername(String),

    /// The store call exceeded its deadline. Treated exactly like
    /// [`AccountError::Unavailable`] by every caller.
    #[error("account store timed out")]
    Timeout,
}
