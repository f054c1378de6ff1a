//! Unified error type for the Mangrove server.

use mangrove_account::AccountError;
use mangrove_island::IslandError;
use mangrove_protocol::ProtocolError;
use mangrove_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `mangrove` meta-crate, you deal with this single
/// error type instead of importing errors from each sub-crate.
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum MangroveError {
    /// A transport-level error (connection, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid event).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// An account-store error (lookup, provisioning, timeout).
    #[error(transparent)]
    Account(#[from] AccountError),

    /// An island-core error (visit, move, registry).
    #[error(transparent)]
    Island(#[from] IslandError),
}
