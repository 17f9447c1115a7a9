#![warn(missing_docs)]
//! Schema model for the skirmish wire protocol.
//!
//! Defines the closed set of wire field kinds, enum/flags domains, and item
//! specifications (snapshot objects, events, messages), and resolves them
//! into an immutable [`Schema`] registry: constants resolved, base items
//! flattened, legacy numeric IDs assigned by declaration order, extension
//! items indexed by stable identifier string.
//!
//! The registry is built once at process start and shared read-only across
//! all connections. The `skirmish-net` crate applies it to byte buffers.

pub mod defs;

mod constants;
mod enums;
mod error;
mod field;
mod item;
mod schema;

pub use constants::{Bound, ConstantTable};
pub use enums::{EnumSpec, FlagsSpec, FlagsView};
pub use error::SchemaError;
pub use field::{
    boolean, int_any, int_range, string, string_half_strict, string_strict, tick, Field,
    FieldDecl, FieldDeclKind, FieldKind, StringMode,
};
pub use item::{ExtInfo, Item, ItemCategory};
pub use schema::{Schema, SchemaBuilder};
