//! The island directory: connection registry + social graph manager.
//!
//! One structure owns both because they share every invariant: a
//! username maps to exactly one live session, and the host/guest
//! relation may only reference sessions that are still in the
//! registry. Splitting them would force two locks and a deadlock-free
//! ordering between them for no gain.

use std::collections::HashMap;

use mangrove_protocol::{Position, ServerEvent};
use mangrove_transport::ConnectionId;

use crate::{EventSender, IslandConfig, IslandError, Session};

/// Registry of all authenticated sessions and the host↔guest relation
/// between them.
///
/// Arena-style: sessions are stored by `ConnectionId` and refer to one
/// another by id, so a vanished session invalidates cleanly. The
/// username index is kept in sync with the arena at every return point.
///
/// Every method that mutates the graph re-establishes the invariant
/// `s.host == Some(h) ⇔ h.guests ∋ s` before returning; callers hold
/// the directory lock across the whole call, so no other task can
/// observe an intermediate state.
pub struct IslandDirectory {
    config: IslandConfig,
    sessions: HashMap<ConnectionId, Session>,
    /// Username → connection of the one live session for that account.
    by_username: HashMap<String, ConnectionId>,
}

impl IslandDirectory {
    /// Creates an empty directory with the given island geometry.
    pub fn new(config: IslandConfig) -> Self {
        Self {
            config,
            sessions: HashMap::new(),
            by_username: HashMap::new(),
        }
    }

    /// The island geometry this directory enforces.
    pub fn config(&self) -> &IslandConfig {
        &self.config
    }

    // -----------------------------------------------------------------
    // Registry
    // -----------------------------------------------------------------

    /// Registers a freshly authenticated connection.
    ///
    /// If the username is already online, the older session is
    /// superseded: it is told so ([`ServerEvent::Evicted`]), detached
    /// from the graph exactly as if it had disconnected, and dropped —
    /// closing its outbound channel, which in turn closes its socket.
    /// A player locked out by a ghost session can always log back in.
    pub fn register(
        &mut self,
        conn_id: ConnectionId,
        username: &str,
        sender: EventSender,
    ) {
        debug_assert!(
            !self.sessions.contains_key(&conn_id),
            "connection {conn_id} registered twice"
        );

        if let Some(old_id) = self.by_username.get(username).copied() {
            self.notify(old_id, ServerEvent::Evicted);
            self.remove(old_id);
            tracing::info!(
                old = %old_id,
                new = %conn_id,
                username,
                "superseded older login"
            );
        }

        let session = Session::new(conn_id, username, sender, self.config.spawn);
        self.by_username.insert(username.to_string(), conn_id);
        self.sessions.insert(conn_id, session);
        tracing::info!(%conn_id, username, "session registered");
    }

    /// Finds the live session for a username. `None` simply means the
    /// player is offline or doesn't exist.
    pub fn find_by_username(&self, username: &str) -> Option<ConnectionId> {
        self.by_username.get(username).copied()
    }

    /// Looks up a session by connection id.
    pub fn session(&self, conn_id: &ConnectionId) -> Option<&Session> {
        self.sessions.get(conn_id)
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Returns `true` if nobody is online.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    // -----------------------------------------------------------------
    // Social graph transitions
    // -----------------------------------------------------------------

    /// Sends `requester` to visit `target_username`'s island.
    ///
    /// If the requester is already visiting somewhere, this is an
    /// atomic relocate: leave the old island and land on the new one
    /// within the same critical section, so the requester is never
    /// listed under two hosts. Visiting the island you are already on
    /// is a no-op.
    ///
    /// Occupants of the target island are told someone
    /// [`Joined`](ServerEvent::Joined); occupants of the previous one
    /// see a [`Left`](ServerEvent::Left).
    pub fn visit(
        &mut self,
        requester: ConnectionId,
        target_username: &str,
    ) -> Result<(), IslandError> {
        let (prev_host, username) = {
            let session = self
                .sessions
                .get(&requester)
                .ok_or(IslandError::NotRegistered(requester))?;
            (session.host, session.username.clone())
        };

        let target = self
            .find_by_username(target_username)
            .ok_or_else(|| IslandError::UsernameNotFound(target_username.into()))?;

        if target == requester {
            return Err(IslandError::SelfVisit(requester));
        }
        if prev_host == Some(target) {
            return Ok(());
        }

        if let Some(prev) = prev_host {
            self.leave_island(requester, prev, &username);
        }

        if let Some(target_session) = self.sessions.get_mut(&target) {
            target_session.guests.insert(requester);
        }
        if let Some(session) = self.sessions.get_mut(&requester) {
            session.host = Some(target);
        }
        self.broadcast(
            target,
            Some(requester),
            ServerEvent::Joined { username },
        );

        tracing::debug!(%requester, target_username, "visiting");
        Ok(())
    }

    /// Returns a session to its own island.
    ///
    /// No-op when already at home (calling it twice is the same as
    /// calling it once). On the way out, the remaining occupants of
    /// the visited island see a `Left`; the returning player gets a
    /// [`Guests`](ServerEvent::Guests) snapshot of their own island,
    /// since guests may have arrived while they were away.
    pub fn back(&mut self, conn_id: ConnectionId) {
        let Some(session) = self.sessions.get(&conn_id) else {
            return;
        };
        let Some(host_id) = session.host else {
            return;
        };
        let username = session.username.clone();

        self.leave_island(conn_id, host_id, &username);
        self.send_home(conn_id);

        tracing::debug!(%conn_id, "returned home");
    }

    /// Moves a session to `(x, y)` on whichever island it is on and
    /// tells its co-occupants.
    ///
    /// Coordinates outside the island extents are malformed input and
    /// change nothing.
    pub fn move_to(
        &mut self,
        conn_id: ConnectionId,
        x: f64,
        y: f64,
    ) -> Result<(), IslandError> {
        if !self.config.contains(x, y) {
            return Err(IslandError::OutOfBounds { x, y });
        }

        let session = self
            .sessions
            .get_mut(&conn_id)
            .ok_or(IslandError::NotRegistered(conn_id))?;
        session.position = Position::new(x, y);
        let username = session.username.clone();
        let island_owner = session.host.unwrap_or(conn_id);

        self.broadcast(
            island_owner,
            Some(conn_id),
            ServerEvent::Moved { username, x, y },
        );
        Ok(())
    }

    /// Removes a session on disconnect, detaching it from both sides
    /// of the social graph.
    ///
    /// If it was visiting, it leaves its host's guest set. Every guest
    /// it was hosting is sent home — their island vanished with its
    /// owner. Removing an id that was never registered (or was already
    /// evicted) is a no-op.
    pub fn remove(&mut self, conn_id: ConnectionId) {
        let Some(session) = self.sessions.remove(&conn_id) else {
            return;
        };
        self.by_username.remove(&session.username);

        if let Some(host_id) = session.host {
            self.leave_island(conn_id, host_id, &session.username);
        }

        for guest_id in &session.guests {
            if let Some(guest) = self.sessions.get_mut(guest_id) {
                guest.host = None;
                guest.position = self.config.spawn;
            }
        }
        // Second pass, once the mutations are done: each orphaned guest
        // gets the same snapshot `back` would have sent them.
        for guest_id in &session.guests {
            let guests = self.guest_usernames(*guest_id);
            self.notify(*guest_id, ServerEvent::Guests { guests });
        }

        tracing::info!(%conn_id, username = %session.username, "session removed");
    }

    // -----------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------

    /// Takes `conn_id` out of `owner`'s guest set and tells whoever is
    /// still on that island.
    fn leave_island(
        &mut self,
        conn_id: ConnectionId,
        owner: ConnectionId,
        username: &str,
    ) {
        if let Some(owner_session) = self.sessions.get_mut(&owner) {
            owner_session.guests.remove(&conn_id);
        }
        self.broadcast(
            owner,
            None,
            ServerEvent::Left {
                username: username.to_string(),
            },
        );
    }

    /// Puts a session back on its own island at the spawn point and
    /// delivers its current guest list.
    fn send_home(&mut self, conn_id: ConnectionId) {
        if let Some(session) = self.sessions.get_mut(&conn_id) {
            session.host = None;
            session.position = self.config.spawn;
        }
        let guests = self.guest_usernames(conn_id);
        self.notify(conn_id, ServerEvent::Guests { guests });
    }

    /// Everyone currently standing on the island owned by `owner`:
    /// its guests, plus the owner themselves if they are at home (an
    /// owner who is off visiting is not on their own island and is not
    /// notified of happenings there).
    fn occupants(&self, owner: ConnectionId) -> Vec<ConnectionId> {
        let Some(owner_session) = self.sessions.get(&owner) else {
            return Vec::new();
        };
        let mut occupants: Vec<ConnectionId> =
            owner_session.guests.iter().copied().collect();
        if owner_session.is_at_home() {
            occupants.push(owner);
        }
        occupants
    }

    /// Sorted usernames of the guests on `conn_id`'s island. Sorted so
    /// clients (and tests) see a deterministic order.
    fn guest_usernames(&self, conn_id: ConnectionId) -> Vec<String> {
        let Some(session) = self.sessions.get(&conn_id) else {
            return Vec::new();
        };
        let mut names: Vec<String> = session
            .guests
            .iter()
            .filter_map(|g| self.sessions.get(g).map(|s| s.username.clone()))
            .collect();
        names.sort();
        names
    }

    fn broadcast(
        &self,
        owner: ConnectionId,
        except: Option<ConnectionId>,
        event: ServerEvent,
    ) {
        for occupant in self.occupants(owner) {
            if Some(occupant) != except {
                self.notify(occupant, event.clone());
            }
        }
    }

    /// Pushes one event to one session.
    ///
    /// Public because per-event replies (`UsernameNotFound`,
    /// `NotGrown`) flow through the same channel as graph
    /// notifications — the session's sender is the only handle to a
    /// connection's outbound stream. No-op for unknown ids, and
    /// dropped silently if the receiver is gone: the writer task
    /// exiting means the connection is already on its way out.
    pub fn notify(&self, conn_id: ConnectionId, event: ServerEvent) {
        if let Some(session) = self.sessions.get(&conn_id) {
            let _ = session.sender.send(event);
        }
    }

    // -----------------------------------------------------------------
    // Invariant checking
    // -----------------------------------------------------------------

    /// Panics if the registry or the graph is inconsistent.
    ///
    /// Violations here are programming faults, not user conditions:
    /// every public operation checks its preconditions before mutating,
    /// so this should be unreachable. Tests call it after every step;
    /// it is cheap enough to call from debug builds too.
    pub fn assert_consistent(&self) {
        for (id, session) in &self.sessions {
            if let Some(host_id) = session.host {
                assert_ne!(host_id, *id, "{id} is visiting itself");
                let host = self
                    .sessions
                    .get(&host_id)
                    .unwrap_or_else(|| panic!("{id} visits dead session {host_id}"));
                assert!(
                    host.guests.contains(id),
                    "{id} visits {host_id} but is not in its guest set"
                );
            }
            for guest_id in &session.guests {
                let guest = self.sessions.get(guest_id).unwrap_or_else(|| {
                    panic!("{id} hosts dead session {guest_id}")
                });
                assert_eq!(
                    guest.host,
                    Some(*id),
                    "{guest_id} is in {id}'s guest set but hosted elsewhere"
                );
            }
            assert_eq!(
                self.by_username.get(&session.username),
                Some(id),
                "username index out of sync for {id}"
            );
        }
        assert_eq!(
            self.by_username.len(),
            self.sessions.len(),
            "username index has stale entries"
        );
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! Unit tests for the directory:
    //! bidirectional host↔guest consistency after every operation,
    //! self-visit rejection, `back` idempotence, disconnect
    //! detachment, and registry uniqueness — plus the login-eviction
    //! and atomic-relocate decisions.

    use mangrove_protocol::ServerEvent;
    use tokio::sync::mpsc;
    use tokio::sync::mpsc::UnboundedReceiver;

    use super::*;

    // -- Helpers ----------------------------------------------------------

    fn conn(n: u64) -> ConnectionId {
        ConnectionId::new(n)
    }

    fn dir() -> IslandDirectory {
        IslandDirectory::new(IslandConfig::default())
    }

    /// Registers a session and returns the receiving end of its
    /// outbound channel, for asserting on delivered events.
    fn login(
        dir: &mut IslandDirectory,
        n: u64,
        username: &str,
    ) -> UnboundedReceiver<ServerEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        dir.register(conn(n), username, tx);
        rx
    }

    /// Drains every event currently queued on a receiver.
    fn drain(rx: &mut UnboundedReceiver<ServerEvent>) -> Vec<ServerEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    // =====================================================================
    // register() / find_by_username() — registry uniqueness
    // =====================================================================

    #[test]
    fn test_register_makes_session_discoverable_by_username() {
        let mut dir = dir();
        let _alice = login(&mut dir, 1, "alice");

        assert_eq!(dir.find_by_username("alice"), Some(conn(1)));
        assert_eq!(dir.find_by_username("bob"), None);
        assert_eq!(dir.len(), 1);
        dir.assert_consistent();
    }

    #[test]
    fn test_register_starts_sessions_at_home_at_spawn() {
        let mut dir = dir();
        let _alice = login(&mut dir, 1, "alice");

        let session = dir.session(&conn(1)).expect("should exist");
        assert!(session.is_at_home());
        assert_eq!(session.position, dir.config().spawn);
    }

    #[test]
    fn test_remove_unregisters_username() {
        let mut dir = dir();
        let _alice = login(&mut dir, 1, "alice");

        dir.remove(conn(1));

        assert_eq!(dir.find_by_username("alice"), None);
        assert!(dir.is_empty());
        dir.assert_consistent();
    }

    #[test]
    fn test_remove_unknown_connection_is_noop() {
        let mut dir = dir();
        let _alice = login(&mut dir, 1, "alice");

        dir.remove(conn(99));

        assert_eq!(dir.len(), 1);
        dir.assert_consistent();
    }

    #[test]
    fn test_register_same_username_evicts_older_session() {
        let mut dir = dir();
        let mut old_rx = login(&mut dir, 1, "alice");
        let _new_rx = login(&mut dir, 2, "alice");

        // Exactly one session for "alice", and it's the newer one.
        assert_eq!(dir.len(), 1);
        assert_eq!(dir.find_by_username("alice"), Some(conn(2)));

        // The old connection was told, then its channel was dropped.
        assert_eq!(drain(&mut old_rx), vec![ServerEvent::Evicted]);
        assert!(old_rx.is_closed());
        dir.assert_consistent();
    }

    #[test]
    fn test_register_eviction_detaches_old_sessions_guests() {
        let mut dir = dir();
        let _alice = login(&mut dir, 1, "alice");
        let mut bob_rx = login(&mut dir, 2, "bob");
        dir.visit(conn(2), "alice").unwrap();
        drain(&mut bob_rx);

        // Alice logs in again from a new tab.
        let _alice2 = login(&mut dir, 3, "alice");

        // Bob's host vanished with the evicted session; he is home.
        let bob = dir.session(&conn(2)).unwrap();
        assert!(bob.is_at_home());
        assert_eq!(
            drain(&mut bob_rx),
            vec![ServerEvent::Guests { guests: vec![] }]
        );
        dir.assert_consistent();
    }

    // =====================================================================
    // visit()
    // =====================================================================

    #[test]
    fn test_visit_links_guest_and_host_both_ways() {
        let mut dir = dir();
        let mut alice_rx = login(&mut dir, 1, "alice");
        let _bob_rx = login(&mut dir, 2, "bob");

        dir.visit(conn(2), "alice").unwrap();

        let alice = dir.session(&conn(1)).unwrap();
        let bob = dir.session(&conn(2)).unwrap();
        assert!(alice.guests.contains(&conn(2)));
        assert_eq!(bob.host, Some(conn(1)));

        // Alice is at home, so she saw the arrival.
        assert_eq!(
            drain(&mut alice_rx),
            vec![ServerEvent::Joined {
                username: "bob".into()
            }]
        );
        dir.assert_consistent();
    }

    #[test]
    fn test_visit_own_island_is_rejected_without_state_change() {
        let mut dir = dir();
        let mut alice_rx = login(&mut dir, 1, "alice");

        let result = dir.visit(conn(1), "alice");

        assert!(matches!(result, Err(IslandError::SelfVisit(_))));
        let alice = dir.session(&conn(1)).unwrap();
        assert!(alice.is_at_home());
        assert!(alice.guests.is_empty());
        assert!(drain(&mut alice_rx).is_empty());
        dir.assert_consistent();
    }

    #[test]
    fn test_visit_offline_username_returns_not_found() {
        let mut dir = dir();
        let _alice = login(&mut dir, 1, "alice");

        let result = dir.visit(conn(1), "ghost");

        assert!(matches!(result, Err(IslandError::UsernameNotFound(_))));
        assert!(dir.session(&conn(1)).unwrap().is_at_home());
        dir.assert_consistent();
    }

    #[test]
    fn test_visit_from_unregistered_connection_is_rejected() {
        let mut dir = dir();
        let _alice = login(&mut dir, 1, "alice");

        let result = dir.visit(conn(99), "alice");

        assert!(matches!(result, Err(IslandError::NotRegistered(_))));
        assert!(dir.session(&conn(1)).unwrap().guests.is_empty());
        dir.assert_consistent();
    }

    #[test]
    fn test_visit_while_visiting_relocates_atomically() {
        let mut dir = dir();
        let mut alice_rx = login(&mut dir, 1, "alice");
        let _bob_rx = login(&mut dir, 2, "bob");
        let mut carol_rx = login(&mut dir, 3, "carol");

        dir.visit(conn(2), "alice").unwrap();
        drain(&mut alice_rx);

        // Bob hops from alice's island straight to carol's.
        dir.visit(conn(2), "carol").unwrap();

        // Never listed under two hosts: alice's guest set is clean.
        assert!(dir.session(&conn(1)).unwrap().guests.is_empty());
        assert!(dir.session(&conn(3)).unwrap().guests.contains(&conn(2)));
        assert_eq!(dir.session(&conn(2)).unwrap().host, Some(conn(3)));

        assert_eq!(
            drain(&mut alice_rx),
            vec![ServerEvent::Left {
                username: "bob".into()
            }]
        );
        assert_eq!(
            drain(&mut carol_rx),
            vec![ServerEvent::Joined {
                username: "bob".into()
            }]
        );
        dir.assert_consistent();
    }

    #[test]
    fn test_visit_island_already_on_is_noop() {
        let mut dir = dir();
        let mut alice_rx = login(&mut dir, 1, "alice");
        let _bob_rx = login(&mut dir, 2, "bob");

        dir.visit(conn(2), "alice").unwrap();
        drain(&mut alice_rx);

        dir.visit(conn(2), "alice").unwrap();

        // No duplicate Joined, still exactly one guest entry.
        assert!(drain(&mut alice_rx).is_empty());
        assert_eq!(dir.session(&conn(1)).unwrap().guests.len(), 1);
        dir.assert_consistent();
    }

    #[test]
    fn test_visit_does_not_notify_owner_who_is_away() {
        let mut dir = dir();
        let mut alice_rx = login(&mut dir, 1, "alice");
        let _bob_rx = login(&mut dir, 2, "bob");
        let _carol_rx = login(&mut dir, 3, "carol");

        // Alice leaves her island to visit carol.
        dir.visit(conn(1), "carol").unwrap();
        drain(&mut alice_rx);

        // Bob arrives at alice's (empty) island.
        dir.visit(conn(2), "alice").unwrap();

        // Alice is not standing on her island; nothing to see.
        assert!(drain(&mut alice_rx).is_empty());
        dir.assert_consistent();
    }

    // =====================================================================
    // back()
    // =====================================================================

    #[test]
    fn test_back_returns_guest_home_and_resets_position() {
        let mut dir = dir();
        let mut alice_rx = login(&mut dir, 1, "alice");
        let mut bob_rx = login(&mut dir, 2, "bob");
        dir.visit(conn(2), "alice").unwrap();
        dir.move_to(conn(2), 100.0, 100.0).unwrap();
        drain(&mut alice_rx);
        drain(&mut bob_rx);

        dir.back(conn(2));

        let alice = dir.session(&conn(1)).unwrap();
        let bob = dir.session(&conn(2)).unwrap();
        assert!(alice.guests.is_empty());
        assert!(bob.is_at_home());
        assert_eq!(bob.position, dir.config().spawn);

        assert_eq!(
            drain(&mut alice_rx),
            vec![ServerEvent::Left {
                username: "bob".into()
            }]
        );
        assert_eq!(
            drain(&mut bob_rx),
            vec![ServerEvent::Guests { guests: vec![] }]
        );
        dir.assert_consistent();
    }

    #[test]
    fn test_back_when_already_home_is_noop() {
        let mut dir = dir();
        let mut alice_rx = login(&mut dir, 1, "alice");
        let mut bob_rx = login(&mut dir, 2, "bob");
        dir.visit(conn(2), "alice").unwrap();
        dir.back(conn(2));
        drain(&mut alice_rx);
        drain(&mut bob_rx);

        // Second back: state and event streams identical to one call.
        dir.back(conn(2));

        assert!(dir.session(&conn(2)).unwrap().is_at_home());
        assert!(drain(&mut alice_rx).is_empty());
        assert!(drain(&mut bob_rx).is_empty());
        dir.assert_consistent();
    }

    #[test]
    fn test_back_reports_guests_that_arrived_while_away() {
        let mut dir = dir();
        let mut alice_rx = login(&mut dir, 1, "alice");
        let _bob_rx = login(&mut dir, 2, "bob");
        let _carol_rx = login(&mut dir, 3, "carol");

        // Alice goes visiting; bob and carol land on her island meanwhile.
        dir.visit(conn(1), "carol").unwrap();
        dir.visit(conn(2), "alice").unwrap();
        drain(&mut alice_rx);

        dir.back(conn(1));

        assert_eq!(
            drain(&mut alice_rx),
            vec![ServerEvent::Guests {
                guests: vec!["bob".into()]
            }]
        );
        dir.assert_consistent();
    }

    // =====================================================================
    // move_to()
    // =====================================================================

    #[test]
    fn test_move_to_applies_requested_coordinates() {
        let mut dir = dir();
        let _alice = login(&mut dir, 1, "alice");

        dir.move_to(conn(1), 123.0, 45.5).unwrap();

        assert_eq!(
            dir.session(&conn(1)).unwrap().position,
            Position::new(123.0, 45.5)
        );
        dir.assert_consistent();
    }

    #[test]
    fn test_move_to_broadcasts_to_co_occupants_only() {
        let mut dir = dir();
        let mut alice_rx = login(&mut dir, 1, "alice");
        let mut bob_rx = login(&mut dir, 2, "bob");
        let mut carol_rx = login(&mut dir, 3, "carol");
        dir.visit(conn(2), "alice").unwrap();
        dir.visit(conn(3), "alice").unwrap();
        drain(&mut alice_rx);
        drain(&mut bob_rx);
        drain(&mut carol_rx);

        dir.move_to(conn(2), 10.0, 20.0).unwrap();

        let moved = ServerEvent::Moved {
            username: "bob".into(),
            x: 10.0,
            y: 20.0,
        };
        // Host and fellow guest see it; the mover does not.
        assert_eq!(drain(&mut alice_rx), vec![moved.clone()]);
        assert_eq!(drain(&mut carol_rx), vec![moved]);
        assert!(drain(&mut bob_rx).is_empty());
    }

    #[test]
    fn test_move_to_out_of_bounds_changes_nothing() {
        let mut dir = dir();
        let _alice = login(&mut dir, 1, "alice");
        let before = dir.session(&conn(1)).unwrap().position;

        let result = dir.move_to(conn(1), -5.0, 10.0);

        assert!(matches!(result, Err(IslandError::OutOfBounds { .. })));
        assert_eq!(dir.session(&conn(1)).unwrap().position, before);
    }

    #[test]
    fn test_move_to_alone_at_home_notifies_nobody() {
        let mut dir = dir();
        let mut alice_rx = login(&mut dir, 1, "alice");

        dir.move_to(conn(1), 50.0, 50.0).unwrap();

        assert!(drain(&mut alice_rx).is_empty());
    }

    // =====================================================================
    // remove() — disconnect detachment
    // =====================================================================

    #[test]
    fn test_remove_host_sends_every_guest_home() {
        let mut dir = dir();
        let _alice = login(&mut dir, 1, "alice");
        let mut bob_rx = login(&mut dir, 2, "bob");
        let mut carol_rx = login(&mut dir, 3, "carol");
        dir.visit(conn(2), "alice").unwrap();
        dir.visit(conn(3), "alice").unwrap();
        drain(&mut bob_rx);
        drain(&mut carol_rx);

        dir.remove(conn(1));

        // No guest references the removed session.
        for id in [conn(2), conn(3)] {
            let guest = dir.session(&id).unwrap();
            assert!(guest.is_at_home());
            assert_eq!(guest.position, dir.config().spawn);
        }
        assert_eq!(dir.find_by_username("alice"), None);
        assert_eq!(
            drain(&mut bob_rx),
            vec![ServerEvent::Guests { guests: vec![] }]
        );
        assert_eq!(
            drain(&mut carol_rx),
            vec![ServerEvent::Guests { guests: vec![] }]
        );
        dir.assert_consistent();
    }

    #[test]
    fn test_remove_guest_cleans_hosts_guest_set() {
        let mut dir = dir();
        let mut alice_rx = login(&mut dir, 1, "alice");
        let _bob_rx = login(&mut dir, 2, "bob");
        dir.visit(conn(2), "alice").unwrap();
        drain(&mut alice_rx);

        dir.remove(conn(2));

        assert!(dir.session(&conn(1)).unwrap().guests.is_empty());
        assert_eq!(
            drain(&mut alice_rx),
            vec![ServerEvent::Left {
                username: "bob".into()
            }]
        );
        dir.assert_consistent();
    }

    #[test]
    fn test_remove_session_that_hosts_and_visits_detaches_both_sides() {
        // Alice hosts carol while herself visiting bob — the cyclic
        // shape the arena exists to make safe.
        let mut dir = dir();
        let _alice = login(&mut dir, 1, "alice");
        let mut bob_rx = login(&mut dir, 2, "bob");
        let mut carol_rx = login(&mut dir, 3, "carol");
        dir.visit(conn(1), "bob").unwrap();
        dir.visit(conn(3), "alice").unwrap();
        dir.assert_consistent();
        drain(&mut bob_rx);
        drain(&mut carol_rx);

        dir.remove(conn(1));

        assert!(dir.session(&conn(2)).unwrap().guests.is_empty());
        assert!(dir.session(&conn(3)).unwrap().is_at_home());
        assert_eq!(
            drain(&mut bob_rx),
            vec![ServerEvent::Left {
                username: "alice".into()
            }]
        );
        assert_eq!(
            drain(&mut carol_rx),
            vec![ServerEvent::Guests { guests: vec![] }]
        );
        dir.assert_consistent();
    }

    // =====================================================================
    // Invariant holds across mixed operation sequences
    // =====================================================================

    #[test]
    fn test_graph_stays_consistent_through_mixed_sequence() {
        let mut dir = dir();
        let _rxs: Vec<_> = [(1, "alice"), (2, "bob"), (3, "carol"), (4, "dave")]
            .into_iter()
            .map(|(n, name)| login(&mut dir, n, name))
            .collect();

        dir.visit(conn(2), "alice").unwrap();
        dir.assert_consistent();
        dir.visit(conn(3), "alice").unwrap();
        dir.assert_consistent();
        dir.visit(conn(1), "dave").unwrap();
        dir.assert_consistent();
        dir.visit(conn(2), "dave").unwrap(); // relocate
        dir.assert_consistent();
        dir.back(conn(3));
        dir.assert_consistent();
        dir.remove(conn(4)); // host of alice and bob disconnects
        dir.assert_consistent();
        assert!(dir.session(&conn(1)).unwrap().is_at_home());
        assert!(dir.session(&conn(2)).unwrap().is_at_home());
        dir.back(conn(1)); // no-op
        dir.assert_consistent();
        dir.visit(conn(3), "bob").unwrap();
        dir.assert_consistent();
        dir.remove(conn(3));
        dir.assert_consistent();
        assert_eq!(dir.len(), 2);
    }
}
