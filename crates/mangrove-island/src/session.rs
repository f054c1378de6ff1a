//! The session type: what the server knows about one live,
//! authenticated connection.

use std::collections::HashSet;

use mangrove_protocol::{Position, ServerEvent};
use mangrove_transport::ConnectionId;
use tokio::sync::mpsc;

/// Channel sender for pushing server events to a session's connection.
///
/// Unbounded on purpose: sends happen inside the directory's critical
/// section and must never await or fail on backpressure. A client slow
/// enough to make this a memory problem gets disconnected by its own
/// socket long before.
pub type EventSender = mpsc::UnboundedSender<ServerEvent>;

/// Runtime state for one authenticated connection.
///
/// Distinct from the persisted account record: a `Session` exists only
/// while the connection is alive, and only *after* authentication —
/// unauthenticated connections live solely in their handler task and
/// are never visible to the rest of the server.
///
/// `host` and `guests` are connection ids, not references. The
/// directory owns every session in one arena, so the host↔guest cycle
/// (alice visits bob while bob visits alice is representable) costs
/// nothing, and cleanup is id invalidation rather than pointer chasing.
#[derive(Debug)]
pub struct Session {
    /// The underlying transport connection.
    pub conn_id: ConnectionId,

    /// The authenticated account's username. Also the key under which
    /// this session is discoverable by other players.
    pub username: String,

    /// Current position on whichever island the player is on.
    pub position: Position,

    /// `None` — the player is at home. `Some(h)` — the player is
    /// visiting the island of the session with connection id `h`.
    pub host: Option<ConnectionId>,

    /// Sessions currently visiting this player's island.
    pub guests: HashSet<ConnectionId>,

    pub(crate) sender: EventSender,
}

impl Session {
    /// Creates a fresh at-home session standing at `spawn`.
    pub fn new(
        conn_id: ConnectionId,
        username: impl Into<String>,
        sender: EventSender,
        spawn: Position,
    ) -> Self {
        Self {
            conn_id,
            username: username.into(),
            position: spawn,
            host: None,
            guests: HashSet::new(),
            sender,
        }
    }

    /// Returns `true` if the player is on their own island.
    pub fn is_at_home(&self) -> bool {
        self.host.is_none()
    }
}
