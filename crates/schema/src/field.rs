//! Wire field kinds and their declaration helpers.

use crate::constants::{Bound, ConstantTable};
use crate::error::SchemaError;
use serde::Serialize;

/// Strictness applied to string fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StringMode {
    /// UTF-8 well-formedness only.
    Any,
    /// Rejects control characters 0-8, 11-31 and 127. Used for short
    /// structured tokens (names, clan tags, vote descriptions).
    Strict,
    /// Rejects control characters except tab, LF and CR. Used for freeform
    /// chat text where some whitespace is tolerable.
    HalfStrict,
}

/// A field kind as declared, with range bounds still unresolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldDeclKind {
    /// Full signed 32-bit domain.
    IntAny,
    /// Integer constrained to `[lo, hi]` after constant resolution.
    IntRange {
        /// Lower bound expression.
        lo: Bound,
        /// Upper bound expression.
        hi: Bound,
    },
    /// Integer constrained to `{0, 1}`.
    Bool,
    /// Game-time unit; wire encoding identical to `IntAny`.
    Tick,
    /// Length-prefixed UTF-8 string.
    Str(StringMode),
}

/// A named field declaration (builder input).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDecl {
    /// Field name, unique within its item.
    pub name: String,
    /// Declared kind.
    pub kind: FieldDeclKind,
}

impl FieldDecl {
    /// Resolve constant references, producing the runtime field form.
    pub(crate) fn resolve(&self, constants: &ConstantTable) -> Result<Field, SchemaError> {
        let kind = match &self.kind {
            FieldDeclKind::IntAny => FieldKind::IntAny,
            FieldDeclKind::Bool => FieldKind::Bool,
            FieldDeclKind::Tick => FieldKind::Tick,
            FieldDeclKind::Str(mode) => FieldKind::Str(*mode),
            FieldDeclKind::IntRange { lo, hi } => {
                let lo = constants.resolve(lo)?;
                let hi = constants.resolve(hi)?;
                if lo > hi {
                    return Err(SchemaError::InvalidRange { field: self.name.clone(), lo, hi });
                }
                FieldKind::IntRange { lo, hi }
            }
        };
        Ok(Field { name: self.name.clone(), kind })
    }
}

/// A field kind with all bounds resolved to concrete values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum FieldKind {
    /// Full signed 32-bit domain.
    IntAny,
    /// Integer constrained to `[lo, hi]`; decode outside the range is a hard
    /// validation error, never clamped.
    IntRange {
        /// Inclusive lower bound.
        lo: i32,
        /// Inclusive upper bound.
        hi: i32,
    },
    /// Integer constrained to `{0, 1}`.
    Bool,
    /// Game-time unit; skips range validation like `IntAny`.
    Tick,
    /// Length-prefixed UTF-8 string with mode-dependent content checks.
    Str(StringMode),
}

/// A resolved, named field. Part of the flattened field list the codec and
/// the code generator consume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Field {
    /// Field name.
    pub name: String,
    /// Resolved kind.
    pub kind: FieldKind,
}

fn decl(name: &str, kind: FieldDeclKind) -> FieldDecl {
    FieldDecl { name: name.to_string(), kind }
}

/// Declare an unbounded integer field.
pub fn int_any(name: &str) -> FieldDecl {
    decl(name, FieldDeclKind::IntAny)
}

/// Declare a range-validated integer field. Bounds take literals or constant
/// expressions such as `"max_clients-1"`.
pub fn int_range(name: &str, lo: impl Into<Bound>, hi: impl Into<Bound>) -> FieldDecl {
    decl(name, FieldDeclKind::IntRange { lo: lo.into(), hi: hi.into() })
}

/// Declare a boolean field (wire domain `{0, 1}`).
pub fn boolean(name: &str) -> FieldDecl {
    decl(name, FieldDeclKind::Bool)
}

/// Declare a tick field.
pub fn tick(name: &str) -> FieldDecl {
    decl(name, FieldDeclKind::Tick)
}

/// Declare a string field with no content restrictions beyond UTF-8.
pub fn string(name: &str) -> FieldDecl {
    decl(name, FieldDeclKind::Str(StringMode::Any))
}

/// Declare a strictly sanitized string field.
pub fn string_strict(name: &str) -> FieldDecl {
    decl(name, FieldDeclKind::Str(StringMode::Strict))
}

/// Declare a chat-grade string field (tab, LF and CR allowed).
pub fn string_half_strict(name: &str) -> FieldDecl {
    decl(name, FieldDeclKind::Str(StringMode::HalfStrict))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_range_bounds() {
        let mut constants = ConstantTable::new();
        constants.insert("max_clients", 64).unwrap();

        let field = int_range("client_id", 0, "max_clients-1")
            .resolve(&constants)
            .unwrap();
        assert_eq!(field.kind, FieldKind::IntRange { lo: 0, hi: 63 });
    }

    #[test]
    fn inverted_range_is_fatal() {
        let constants = ConstantTable::new();
        let err = int_range("bad", 1, 0).resolve(&constants).unwrap_err();
        assert_eq!(err, SchemaError::InvalidRange { field: "bad".to_string(), lo: 1, hi: 0 });
    }

    #[test]
    fn non_range_kinds_resolve_unchanged() {
        let constants = ConstantTable::new();
        assert_eq!(tick("t").resolve(&constants).unwrap().kind, FieldKind::Tick);
        assert_eq!(
            string_half_strict("chat").resolve(&constants).unwrap().kind,
            FieldKind::Str(StringMode::HalfStrict)
        );
    }
}
