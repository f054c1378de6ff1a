//! Error types for the island core.

use mangrove_transport::ConnectionId;

/// Errors from directory operations.
///
/// These are recoverable, per-event outcomes. The handler translates
/// [`IslandError::UsernameNotFound`] into the client-visible event of
/// the same name and drops the rest silently — none of them ever
/// terminates a connection.
#[derive(Debug, thiserror::Error)]
pub enum IslandError {
    /// No session is online under this username. A normal outcome
    /// (the player is offline or doesn't exist), not a fault.
    #[error("no session online for username {0:?}")]
    UsernameNotFound(String),

    /// A player tried to visit their own island. `back` is how you go
    /// home; self-visit would put a session in its own guest set.
    #[error("{0} attempted to visit its own island")]
    SelfVisit(ConnectionId),

    /// The requested coordinates are outside the island extents.
    /// Treated as malformed input.
    #[error("position ({x}, {y}) is outside the island")]
    OutOfBounds { x: f64, y: f64 },

    /// The connection has no registered session (never authenticated,
    /// or already removed by an eviction racing this operation).
    #[error("connection {0} is not registered")]
    NotRegistered(ConnectionId),
}
