//! Wire protocol for Mangrove.
//!
//! This crate defines the "language" that clients and the server speak:
//!
//! - **Types** ([`ClientEvent`], [`ServerEvent`], [`PlayerProfile`],
//!   [`Position`]) — the structures that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how those events are
//!   converted to/from bytes.
//! - **Errors** ([`ProtocolError`]) — what can go wrong while
//!   encoding/decoding.
//!
//! Each WebSocket frame carries exactly one tagged event; there is no
//! envelope layer. The transport is a single reliable, ordered stream,
//! so sequence numbers and channel metadata would carry no information.

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{ClientEvent, PlayerProfile, Position, ServerEvent, TreeRecord};
