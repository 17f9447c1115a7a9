//! Named integer constants and the bound expressions that reference them.
//!
//! Field range declarations may use expressions such as `"max_clients-1"` or
//! `"weapon_count-1"` instead of literals. All expressions are resolved once
//! while the schema is built; nothing here runs on the decode path.

use crate::error::SchemaError;
use serde::Serialize;
use std::collections::BTreeMap;

/// A range bound as written in an item declaration.
///
/// Either a literal value or a constant expression resolved at schema load.
/// The expression grammar is deliberately small:
/// `int | ident | ident '+' int | ident '-' int`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Bound {
    /// A literal value, used as-is.
    Literal(i32),
    /// A constant expression, resolved against the schema's constant table.
    Expr(String),
}

impl From<i32> for Bound {
    fn from(value: i32) -> Self {
        Bound::Literal(value)
    }
}

impl From<&str> for Bound {
    fn from(expr: &str) -> Self {
        Bound::Expr(expr.to_string())
    }
}

/// Immutable map of constant names to resolved values.
///
/// Seeded with the builtins `min_int` and `max_int`; schema declarations add
/// game constants plus the auto-generated `<enum>_count` / `<flags>_mask`
/// entries.
#[derive(Debug, Clone, Default)]
pub struct ConstantTable {
    values: BTreeMap<String, i32>,
}

impl ConstantTable {
    /// Create a table holding only the builtin constants.
    pub fn new() -> Self {
        let mut values = BTreeMap::new();
        values.insert("min_int".to_string(), i32::MIN);
        values.insert("max_int".to_string(), i32::MAX);
        Self { values }
    }

    /// Register a constant, rejecting redefinitions.
    pub fn insert(&mut self, name: &str, value: i32) -> Result<(), SchemaError> {
        if self.values.contains_key(name) {
            return Err(SchemaError::DuplicateConstant { name: name.to_string() });
        }
        self.values.insert(name.to_string(), value);
        Ok(())
    }

    /// Look up a constant by name.
    pub fn get(&self, name: &str) -> Option<i32> {
        self.values.get(name).copied()
    }

    /// Resolve a bound to a concrete value.
    pub fn resolve(&self, bound: &Bound) -> Result<i32, SchemaError> {
        match bound {
            Bound::Literal(value) => Ok(*value),
            Bound::Expr(expr) => self.resolve_expr(expr),
        }
    }

    fn resolve_expr(&self, expr: &str) -> Result<i32, SchemaError> {
        let text = expr.trim();
        if text.is_empty() || !text.is_ascii() {
            return Err(SchemaError::BadConstantExpr { expr: expr.to_string() });
        }
        if let Ok(value) = text.parse::<i32>() {
            return Ok(value);
        }

        // `ident` optionally followed by a signed offset ("max_clients-1").
        let (name, offset) = match text[1..].find(['+', '-']) {
            Some(pos) => {
                let (name, rest) = text.split_at(pos + 1);
                let offset: i32 = rest
                    .parse()
                    .map_err(|_| SchemaError::BadConstantExpr { expr: expr.to_string() })?;
                (name.trim(), offset)
            }
            None => (text, 0),
        };

        if name.is_empty()
            || !name
                .chars()
                .all(|c| matches!(c, 'a'..='z' | '0'..='9' | '_'))
        {
            return Err(SchemaError::BadConstantExpr { expr: expr.to_string() });
        }

        let base = self
            .get(name)
            .ok_or_else(|| SchemaError::UnknownConstant { name: name.to_string() })?;
        base.checked_add(offset)
            .ok_or_else(|| SchemaError::BadConstantExpr { expr: expr.to_string() })
    }
}
