#![warn(missing_docs)]
//! Wire codec and per-connection protocol state for the skirmish protocol.
//!
//! Layers, bottom up: [`packer`] packs and unpacks the primitive wire
//! encodings, [`codec`] applies a schema item's field list to a byte buffer
//! with full validation, [`handshake`] negotiates per-connection IDs for
//! extension items, and [`connection`] ties schema, codec and handshake
//! together behind encode/decode entry points.
//!
//! Everything here is pure and synchronous; transport, framing and delivery
//! guarantees live elsewhere.

pub mod codec;
pub mod connection;
pub mod error;
pub mod handshake;
pub mod packer;

pub use codec::{decode_fields, encode_fields, Record, Value, MAX_STRING_BYTES};
pub use connection::Connection;
pub use error::{FieldError, WireError};
pub use handshake::{Handshake, HandshakeState, EX_ID_BASE};
pub use packer::{Packer, Unpacker, MAX_PACKED_INT_BYTES};
