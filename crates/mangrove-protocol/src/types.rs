//! Wire types: everything that gets serialized and sent over a
//! connection, in either direction.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// A 2D position on an island.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

// ---------------------------------------------------------------------------
// Profile data
// ---------------------------------------------------------------------------

/// One planted tree, as stored on the account and shown to the client.
///
/// The presence core treats trees as opaque economy data; only the
/// harvest stub ever looks inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeRecord {
    /// Unix-epoch milliseconds at which the tree is fully grown.
    pub ends_at: u64,
}

/// The public view of a player account, sent to the client after a
/// successful login.
///
/// This is deliberately a separate type from the persisted account
/// record: there is no password field here, so the credential verifier
/// can never be forwarded to a client by accident.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerProfile {
    pub username: String,
    pub trees: Vec<TreeRecord>,
    pub mangoes: i64,
}

// ---------------------------------------------------------------------------
// ClientEvent — what clients send
// ---------------------------------------------------------------------------

/// Events a client can send to the server.
///
/// `#[serde(tag = "type")]` produces internally tagged JSON:
/// `{ "type": "Visit", "username": "alice" }`. Unknown tags and wrong
/// field types fail to deserialize, which the server treats as a
/// silently dropped frame — malformed input never gets a reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientEvent {
    /// Log in with previously provisioned credentials. Only honored
    /// while the connection is unauthenticated.
    Auth { username: String, password: String },

    /// Go visit another player's island.
    Visit { username: String },

    /// Return to your own island.
    Back,

    /// Move to the given coordinates on the current island.
    Move { x: f64, y: f64 },

    /// Economy stub: buy a new tree. Accepted and ignored.
    BuyTree,

    /// Economy stub: harvest the tree at this index in the player's
    /// tree list.
    Harvest { tree: i64 },
}

// ---------------------------------------------------------------------------
// ServerEvent — what the server sends
// ---------------------------------------------------------------------------

/// Events the server pushes to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    /// Login succeeded. `server_time` is Unix-epoch milliseconds, for
    /// client clock reconciliation.
    Authed {
        profile: PlayerProfile,
        server_time: u64,
    },

    /// Login failed. Sent both for bad credentials and for account
    /// store failures — the client cannot tell them apart (the server
    /// logs the difference).
    AuthFail,

    /// The `Visit` target is offline or does not exist. A normal
    /// outcome, not an error.
    UsernameNotFound,

    /// You are now on your own island; here is who is visiting it.
    /// Sent on `Back` and whenever the server forces a player home
    /// (their host disconnected, or their session was superseded).
    Guests { guests: Vec<String> },

    /// A guest arrived on the island you are on.
    Joined { username: String },

    /// A guest left the island you are on.
    Left { username: String },

    /// A co-occupant of your island moved.
    Moved { username: String, x: f64, y: f64 },

    /// This connection was superseded by a newer login for the same
    /// account. The server closes the connection right after.
    Evicted,

    /// Economy stub: the harvested tree has not finished growing.
    NotGrown,
}

// =========================================================================
// Tests
// =========================================================================
