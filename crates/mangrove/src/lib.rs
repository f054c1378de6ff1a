//! # Mangrove
//!
//! Multiplayer island presence server.
//!
//! Mangrove keeps track of who is online and whose island everyone is
//! standing on: clients log in over WebSocket, visit each other's
//! islands, move around, and get told when their co-occupants come,
//! go, and move. Accounts live behind the [`AccountStore`] seam, so
//! the same server runs against the in-memory dev store or a real
//! database.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use mangrove::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), MangroveError> {
//!     let store = Arc::new(MemoryAccountStore::new());
//!     let server = MangroveServerBuilder::new()
//!         .bind("0.0.0.0:8080")
//!         .build(Arc::clone(&store))
//!         .await?;
//!     server.run().await
//! }
//! ```

mod error;
mod handler;
mod server;

pub use error::MangroveError;
pub use server::{MangroveServer, MangroveServerBuilder};

/// One-stop imports for building and running a server.
pub mod prelude {
    pub use crate::{MangroveError, MangroveServer, MangroveServerBuilder};
    pub use mangrove_account::{
        AccountError, AccountStore, AuthOutcome, Authenticator,
        MemoryAccountStore, PlayerAccount, SignupOutcome, signup,
    };
    pub use mangrove_island::{IslandConfig, IslandDirectory, IslandError};
    pub use mangrove_protocol::{
        ClientEvent, Codec, JsonCodec, PlayerProfile, Position, ProtocolError,
        ServerEvent, TreeRecord,
    };
    pub use mangrove_transport::{
        Connection, ConnectionId, Transport, TransportError, WebSocketConnection,
        WebSocketTransport,
    };
}
