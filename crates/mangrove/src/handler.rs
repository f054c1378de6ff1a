//! Per-connection handler: login, registration, and event routing.
//!
//! Each accepted connection gets its own Tokio task running this
//! handler. The flow is:
//!   1. Login phase — only `Auth` is honored; everything else is
//!      silently dropped
//!   2. On success: send `Authed`, spawn the writer task, register the
//!      session with the island directory
//!   3. Loop: receive events → dispatch against the directory
//!   4. On exit (close, error, eviction): detach the session

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use mangrove_account::{AccountStore, AuthOutcome};
use mangrove_island::IslandError;
use mangrove_protocol::{ClientEvent, Codec, PlayerProfile, ServerEvent};
use mangrove_transport::{Connection, ConnectionId, WebSocketConnection};
use tokio::sync::mpsc;

use crate::MangroveError;
use crate::server::ServerState;

/// Drop guard that detaches a session from the directory when the
/// handler exits.
///
/// This ensures cleanup happens even if the handler panics. Since
/// `Drop` is synchronous, we spawn a fire-and-forget task for the
/// async lock. For a session that was already evicted by a newer
/// login, the removal is a no-op.
struct DetachGuard<S: AccountStore> {
    conn_id: ConnectionId,
    state: Arc<ServerState<S>>,
}

impl<S: AccountStore> Drop for DetachGuard<S> {
    fn drop(&mut self) {
        let conn_id = self.conn_id;
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            state.directory.lock().await.remove(conn_id);
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<S: AccountStore>(
    conn: WebSocketConnection,
    state: Arc<ServerState<S>>,
) -> Result<(), MangroveError> {
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new connection");

    // --- Step 1: Login ---
    let Some(outcome) = login_phase(&conn, &state).await? else {
        // Closed, or never produced valid credentials in time.
        return Ok(());
    };
    let (profile, server_time) = outcome;
    let username = profile.username.clone();

    tracing::info!(%conn_id, username, "player logged in");

    // --- Step 2: Writer task + registration ---
    //
    // All outbound traffic after login goes through one channel and
    // one writer, so events from the directory and direct replies
    // cannot interleave mid-frame. When every sender is gone — the
    // handler exited, or the directory dropped the session on
    // eviction — the writer closes the socket behind it.
    let (sender, mut events) = mpsc::unbounded_channel::<ServerEvent>();

    let writer_conn = conn.clone();
    let codec = state.codec;
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            let bytes = match codec.encode(&event) {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::error!(error = %e, "failed to encode server event");
                    continue;
                }
            };
            if writer_conn.send(&bytes).await.is_err() {
                break;
            }
        }
        let _ = writer_conn.close().await;
    });

    // Authed first, then registration: the channel preserves order, so
    // the client sees its own login confirmed before any island
    // traffic. The session takes sole ownership of the sender — when
    // the directory drops the session (disconnect or eviction), the
    // writer runs dry and closes the socket.
    let _ = sender.send(ServerEvent::Authed {
        profile: profile.clone(),
        server_time,
    });

    {
        let mut directory = state.directory.lock().await;
        directory.register(conn_id, &username, sender);
    }
    let _guard = DetachGuard {
        conn_id,
        state: Arc::clone(&state),
    };

    // --- Step 3: Event loop ---
    loop {
        let data = match conn.recv().await {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::info!(%conn_id, username, "connection closed");
                break;
            }
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "recv error");
                break;
            }
        };

        let event: ClientEvent = match state.codec.decode(&data) {
            Ok(event) => event,
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "dropping malformed frame");
                continue;
            }
        };

        dispatch(&state, conn_id, &profile, event).await;
    }

    // _guard drops here → directory detachment fires.
    Ok(())
}

/// Runs the unauthenticated phase of a connection.
///
/// Only [`ClientEvent::Auth`] does anything here; other events and
/// malformed frames are dropped without a reply, so an unauthenticated
/// peer learns nothing about the server's state. Failed attempts get
/// [`ServerEvent::AuthFail`] and may retry on the same connection.
///
/// Returns `Ok(None)` if the peer disconnected or ran out the login
/// clock without authenticating.
async fn login_phase<S: AccountStore>(
    conn: &WebSocketConnection,
    state: &Arc<ServerState<S>>,
) -> Result<Option<(PlayerProfile, u64)>, MangroveError> {
    let attempt_loop = async {
        loop {
            let data = match conn.recv().await {
                Ok(Some(data)) => data,
                Ok(None) => return Ok(None),
                Err(e) => {
                    tracing::debug!(error = %e, "recv error before login");
                    return Ok(None);
                }
            };

            let event: ClientEvent = match state.codec.decode(&data) {
                Ok(event) => event,
                Err(_) => continue,
            };

            let (username, password) = match event {
                ClientEvent::Auth { username, password } => (username, password),
                other => {
                    tracing::debug!(
                        event = ?other,
                        "dropping event from unauthenticated connection"
                    );
                    continue;
                }
            };

            match state.auth.authenticate(&username, &password).await {
                AuthOutcome::Succeeded {
                    profile,
                    server_time,
                } => return Ok(Some((profile, server_time))),
                AuthOutcome::Failed => {
                    let bytes = state.codec.encode(&ServerEvent::AuthFail)?;
                    conn.send(&bytes).await.map_err(MangroveError::Transport)?;
                }
            }
        }
    };

    match tokio::time::timeout(state.login_timeout, attempt_loop).await {
        Ok(result) => result,
        Err(_) => {
            tracing::debug!(conn_id = %conn.id(), "login timed out");
            Ok(None)
        }
    }
}

/// Routes one authenticated client event.
///
/// Per-event failures never terminate the connection: the only error
/// that reaches the client is `UsernameNotFound` (a normal outcome of
/// visiting someone who is offline); the rest are logged and dropped.
async fn dispatch<S: AccountStore>(
    state: &Arc<ServerState<S>>,
    conn_id: ConnectionId,
    profile: &PlayerProfile,
    event: ClientEvent,
) {
    match event {
        ClientEvent::Auth { .. } => {
            // Already authenticated; re-auth on a live session is not
            // a thing.
            tracing::debug!(%conn_id, "ignoring Auth on authenticated connection");
        }

        ClientEvent::Visit { username } => {
            let mut directory = state.directory.lock().await;
            match directory.visit(conn_id, &username) {
                Ok(()) => {}
                Err(IslandError::UsernameNotFound(_)) => {
                    directory.notify(conn_id, ServerEvent::UsernameNotFound);
                }
                Err(e) => {
                    tracing::debug!(%conn_id, error = %e, "visit rejected");
                }
            }
        }

        ClientEvent::Back => {
            state.directory.lock().await.back(conn_id);
        }

        ClientEvent::Move { x, y } => {
            let result = state.directory.lock().await.move_to(conn_id, x, y);
            if let Err(e) = result {
                tracing::debug!(%conn_id, error = %e, "move rejected");
            }
        }

        ClientEvent::BuyTree => {
            // Economy stub: accepted, logged, no effect.
            tracing::debug!(%conn_id, "BuyTree not implemented");
        }

        ClientEvent::Harvest { tree } => {
            // Economy stub: validates against the login-time profile
            // and reports growth status; no payout happens.
            let Ok(index) = usize::try_from(tree) else {
                tracing::debug!(%conn_id, tree, "dropping Harvest with bad index");
                return;
            };
            let Some(record) = profile.trees.get(index) else {
                tracing::debug!(%conn_id, tree, "dropping Harvest for unknown tree");
                return;
            };
            if record.ends_at > now_millis() {
                state
                    .directory
                    .lock()
                    .await
                    .notify(conn_id, ServerEvent::NotGrown);
            } else {
                tracing::debug!(%conn_id, tree, "harvest payout not implemented");
            }
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
