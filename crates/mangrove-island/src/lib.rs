//! The presence core of Mangrove: who is online, and who is visiting
//! whose island.
//!
//! # Key types
//!
//! - [`Session`] — runtime state for one authenticated connection
//! - [`IslandDirectory`] — the process-wide registry of live sessions
//!   *and* the host↔guest social graph, in one mutual-exclusion domain
//! - [`IslandConfig`] — island extents and the spawn point
//!
//! # The location state machine
//!
//! Every session is in one of two states with respect to location:
//!
//! ```text
//!   AtHome (host == None) ──visit(target)──→ Visiting(target)
//!        ↑                                        │
//!        └──── back / host disconnect / evict ────┘
//! ```
//!
//! The directory's operations are the only way to move between them,
//! and each one restores the bidirectional invariant before returning:
//! `s.host == Some(h)` exactly when `h.guests` contains `s`.
//!
//! # Concurrency
//!
//! `IslandDirectory` is NOT thread-safe by itself — plain `HashMap`s,
//! no interior locking. The server wraps the whole directory in a
//! single async mutex, which serializes registry changes and every
//! graph mutation against each other (the alternative, per-session
//! locks, would need a fixed acquisition order to survive a visit
//! racing a disconnect across the same pair). Outbound notifications
//! go through per-session unbounded senders, so nothing inside the
//! critical section ever awaits.

mod config;
mod directory;
mod error;
mod session;

pub use config::IslandConfig;
pub use directory::IslandDirectory;
pub use error::IslandError;
pub use session::{EventSender, Session};
