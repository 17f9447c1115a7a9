//! Runtime wire errors.
//!
//! Everything here is a value returned to the caller: malformed input from a
//! peer never panics and never terminates a connection at this layer. The
//! transport or game layer decides whether to drop the item, the packet, or
//! the peer.

use skirmish_schema::ItemCategory;

/// Validation failure for a single wire field, without item context.
///
/// The codec wraps these in [`WireError::Field`] with the offending item and
/// field names attached.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    /// A packed integer does not fit the signed 32-bit space.
    #[error("packed integer exceeds the signed 32-bit range")]
    IntegerOverflow,

    /// A range-validated integer fell outside its declared bounds. Applies
    /// on both encode (caller contract) and decode (peer validation).
    #[error("value {value} outside allowed range [{lo}, {hi}]")]
    IntOutOfRange {
        /// The offending value.
        value: i32,
        /// Inclusive lower bound.
        lo: i32,
        /// Inclusive upper bound.
        hi: i32,
    },

    /// An enum wire value names no variant.
    #[error("enum `{name}` has no variant for wire value {value}")]
    EnumOutOfRange {
        /// Enum name.
        name: String,
        /// The offending wire value.
        value: i32,
    },

    /// Structurally malformed bytes: truncation, bad length prefix,
    /// invalid UTF-8, or forbidden control characters.
    #[error("malformed encoding: {0}")]
    InvalidEncoding(&'static str),

    /// A string exceeded the configured byte limit. Never truncated.
    #[error("string of {len} bytes exceeds the {max}-byte limit")]
    StringTooLong {
        /// Declared or actual byte length.
        len: usize,
        /// Configured maximum.
        max: usize,
    },

    /// Encode-side caller bug: the supplied value variant does not match the
    /// field kind.
    #[error("expected a {expected} value")]
    WrongValueKind {
        /// The value variant the field kind requires.
        expected: &'static str,
    },
}

/// Item-level wire errors produced by the codec and connection layer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WireError {
    /// A field failed to encode or decode. Decoding aborts on the first
    /// failing field; no partial records are produced.
    #[error("item `{item}`, field `{field}`: {source}")]
    Field {
        /// Item being processed.
        item: String,
        /// Offending field name.
        field: String,
        /// The underlying validation failure.
        #[source]
        source: FieldError,
    },

    /// Bytes remained after the last declared field of a size-validated item.
    #[error("{extra} trailing bytes after the last field of `{item}`")]
    TrailingData {
        /// Item that was decoded.
        item: String,
        /// Number of unconsumed bytes.
        extra: usize,
    },

    /// No item is mapped to this wire ID. Recoverable by design: the caller
    /// skips the item, keeping compatibility with peers that know more item
    /// kinds than we do.
    #[error("unknown {category} item id {id}")]
    UnknownItem {
        /// ID space the lookup used.
        category: ItemCategory,
        /// The unmapped wire ID (`-1` when encoding an identifier the peer
        /// never advertised).
        id: i32,
    },

    /// Extension item traffic before the extension handshake resolved.
    #[error("extension item used before the handshake completed")]
    HandshakeNotComplete,

    /// Encode-side caller bug: value count differs from the field count.
    #[error("item `{item}` expects {expected} values, got {actual}")]
    FieldCountMismatch {
        /// Item being encoded.
        item: String,
        /// Declared field count.
        expected: usize,
        /// Supplied value count.
        actual: usize,
    },
}
