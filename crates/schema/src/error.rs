//! Schema load errors.
//!
//! Every variant here is fatal at process start: a process must not serve
//! connections with an invalid schema.

/// Errors detected while building a [`Schema`](crate::Schema).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    /// An item's base chain loops back onto itself.
    #[error("item `{item}` participates in a base-item cycle")]
    Cycle {
        /// Item where the cycle was detected.
        item: String,
    },

    /// An item names a base that does not exist in its category.
    #[error("item `{item}` extends unknown {category} `{base}`")]
    UnknownBase {
        /// Item with the bad base reference.
        item: String,
        /// The missing base name.
        base: String,
        /// Category the base was looked up in.
        category: String,
    },

    /// A range bound references a constant that was never declared.
    #[error("unknown constant `{name}`")]
    UnknownConstant {
        /// The unresolved constant name.
        name: String,
    },

    /// A range bound expression could not be parsed or overflowed.
    #[error("malformed constant expression `{expr}`")]
    BadConstantExpr {
        /// The offending expression text.
        expr: String,
    },

    /// A resolved range has `lo > hi`.
    #[error("field `{field}` resolves to an inverted range [{lo}, {hi}]")]
    InvalidRange {
        /// Field whose range is inverted.
        field: String,
        /// Resolved lower bound.
        lo: i32,
        /// Resolved upper bound.
        hi: i32,
    },

    /// A flags definition names more bits than a validated i32 can hold.
    #[error("flags `{name}` declares {count} bits, limit is 31")]
    TooManyFlagBits {
        /// Flags definition name.
        name: String,
        /// Number of declared bits.
        count: usize,
    },

    /// Two fields of one item (own or inherited from its base chain) share
    /// a name.
    #[error("item `{item}` declares field `{field}` more than once")]
    DuplicateField {
        /// Item with the colliding fields.
        item: String,
        /// The duplicated field name.
        field: String,
    },

    /// Two items share a name.
    #[error("duplicate item name `{name}`")]
    DuplicateItem {
        /// The duplicated name.
        name: String,
    },

    /// Two constants (declared or auto-generated) share a name.
    #[error("duplicate constant `{name}`")]
    DuplicateConstant {
        /// The duplicated name.
        name: String,
    },

    /// Two extension items share an identifier string.
    #[error("duplicate extension identifier `{ident}`")]
    DuplicateExIdent {
        /// The duplicated identifier.
        ident: String,
    },

    /// An extension identifier does not follow `<short-name>@<domain>`.
    #[error("malformed extension identifier `{ident}`")]
    BadExIdent {
        /// The offending identifier.
        ident: String,
    },
}
