//! Schema-driven item encoding and decoding.
//!
//! Field encodings concatenate in schema-declared order with no name or type
//! tags on the wire; the schema, keyed by item ID, is the sole source of
//! layout. That is why legacy ID stability is a compatibility contract.

use crate::error::{FieldError, WireError};
use crate::packer::{Packer, Unpacker};
use serde::Serialize;
use skirmish_schema::{EnumSpec, Field, FieldKind, Item, ItemCategory, StringMode};

/// Maximum byte length of any string field. Exceeding it is
/// [`FieldError::StringTooLong`], never silent truncation.
pub const MAX_STRING_BYTES: usize = 512;

/// A decoded (or to-be-encoded) field value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Value {
    /// Plain or range-validated integer.
    Int(i32),
    /// Boolean (wire domain `{0, 1}`).
    Bool(bool),
    /// Game-time tick.
    Tick(i32),
    /// UTF-8 string.
    Str(String),
}

impl Value {
    /// Integer payload, if this is an `Int`.
    pub fn as_int(&self) -> Option<i32> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Boolean payload, if this is a `Bool`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Tick payload, if this is a `Tick`.
    pub fn as_tick(&self) -> Option<i32> {
        match self {
            Value::Tick(v) => Some(*v),
            _ => None,
        }
    }

    /// String payload, if this is a `Str`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(v) => Some(v),
            _ => None,
        }
    }
}

/// A fully decoded item: the structured record handed to the game layer.
///
/// The codec is agnostic to field meaning; consumers key off the item name
/// and category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    /// Schema name of the decoded item.
    pub item: String,
    /// Item category.
    pub category: ItemCategory,
    /// Field values in schema order.
    pub values: Vec<(String, Value)>,
}

impl Record {
    /// Value of the named field.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.iter().find(|(name, _)| name == field).map(|(_, v)| v)
    }
}

/// Encode an item's field values in schema order.
///
/// Validation runs before any bytes are produced: an out-of-range value
/// fails with the same error a corrupted peer buffer would produce on
/// receive, so invalid data never reaches the wire.
pub fn encode_fields(item: &Item, values: &[Value]) -> Result<Vec<u8>, WireError> {
    let fields = item.fields();
    if values.len() != fields.len() {
        return Err(WireError::FieldCountMismatch {
            item: item.name().to_string(),
            expected: fields.len(),
            actual: values.len(),
        });
    }

    let mut packer = Packer::new();
    for (field, value) in fields.iter().zip(values) {
        encode_value(field, value, &mut packer).map_err(|source| WireError::Field {
            item: item.name().to_string(),
            field: field.name.clone(),
            source,
        })?;
    }
    Ok(packer.into_vec())
}

/// Decode an item from a complete byte buffer.
///
/// Aborts on the first failing field with the item and field names attached;
/// no partial records. Trailing bytes fail with [`WireError::TrailingData`]
/// unless the item opted out of size validation, in which case they are
/// ignored (validated-prefix decoding for additive schema evolution).
pub fn decode_fields(item: &Item, bytes: &[u8]) -> Result<Record, WireError> {
    let mut unpacker = Unpacker::new(bytes);
    let mut values = Vec::with_capacity(item.fields().len());

    for field in item.fields() {
        let value = decode_value(field, &mut unpacker).map_err(|source| WireError::Field {
            item: item.name().to_string(),
            field: field.name.clone(),
            source,
        })?;
        values.push((field.name.clone(), value));
    }

    if item.validate_size() && unpacker.remaining() > 0 {
        return Err(WireError::TrailingData {
            item: item.name().to_string(),
            extra: unpacker.remaining(),
        });
    }

    Ok(Record {
        item: item.name().to_string(),
        category: item.category(),
        values,
    })
}

/// Map an enum wire value to its variant index.
pub fn enum_index(spec: &EnumSpec, wire: i32) -> Result<usize, FieldError> {
    match spec.name_of(wire) {
        Some(_) => Ok((wire - spec.base()) as usize),
        None => Err(FieldError::EnumOutOfRange { name: spec.name().to_string(), value: wire }),
    }
}

fn encode_value(field: &Field, value: &Value, packer: &mut Packer) -> Result<(), FieldError> {
    match (&field.kind, value) {
        (FieldKind::IntAny, Value::Int(v)) => {
            packer.put_int(*v);
            Ok(())
        }
        (FieldKind::Tick, Value::Tick(v)) => {
            packer.put_int(*v);
            Ok(())
        }
        (FieldKind::IntRange { lo, hi }, Value::Int(v)) => {
            check_range(*v, *lo, *hi)?;
            packer.put_int(*v);
            Ok(())
        }
        (FieldKind::Bool, Value::Bool(v)) => {
            packer.put_int(i32::from(*v));
            Ok(())
        }
        (FieldKind::Str(mode), Value::Str(s)) => {
            if s.len() > MAX_STRING_BYTES {
                return Err(FieldError::StringTooLong { len: s.len(), max: MAX_STRING_BYTES });
            }
            check_string(s, *mode)?;
            packer.put_str(s);
            Ok(())
        }
        (kind, _) => Err(FieldError::WrongValueKind { expected: expected_value(kind) }),
    }
}

fn decode_value(field: &Field, unpacker: &mut Unpacker<'_>) -> Result<Value, FieldError> {
    match &field.kind {
        FieldKind::IntAny => Ok(Value::Int(unpacker.get_int()?)),
        FieldKind::Tick => Ok(Value::Tick(unpacker.get_int()?)),
        FieldKind::IntRange { lo, hi } => {
            // The packer reconstructs the value regardless of the declared
            // range; membership is a separate validation pass.
            let v = unpacker.get_int()?;
            check_range(v, *lo, *hi)?;
            Ok(Value::Int(v))
        }
        FieldKind::Bool => match unpacker.get_int()? {
            0 => Ok(Value::Bool(false)),
            1 => Ok(Value::Bool(true)),
            v => Err(FieldError::IntOutOfRange { value: v, lo: 0, hi: 1 }),
        },
        FieldKind::Str(mode) => {
            let s = unpacker.get_str(MAX_STRING_BYTES)?;
            check_string(s, *mode)?;
            Ok(Value::Str(s.to_string()))
        }
    }
}

fn check_range(value: i32, lo: i32, hi: i32) -> Result<(), FieldError> {
    if value < lo || value > hi {
        return Err(FieldError::IntOutOfRange { value, lo, hi });
    }
    Ok(())
}

/// Mode-dependent control character policy. `Strict` permits only tab and
/// LF among the C0 controls; `HalfStrict` additionally permits CR.
fn check_string(s: &str, mode: StringMode) -> Result<(), FieldError> {
    let forbidden = |c: char| match mode {
        StringMode::Any => false,
        StringMode::Strict => {
            matches!(c, '\u{00}'..='\u{08}' | '\u{0b}'..='\u{1f}' | '\u{7f}')
        }
        StringMode::HalfStrict => {
            matches!(c, '\u{00}'..='\u{08}' | '\u{0b}' | '\u{0c}' | '\u{0e}'..='\u{1f}' | '\u{7f}')
        }
    };
    if s.chars().any(forbidden) {
        return Err(FieldError::InvalidEncoding("control character in string"));
    }
    Ok(())
}

fn expected_value(kind: &FieldKind) -> &'static str {
    match kind {
        FieldKind::IntAny | FieldKind::IntRange { .. } => "Int",
        FieldKind::Bool => "Bool",
        FieldKind::Tick => "Tick",
        FieldKind::Str(_) => "Str",
    }
}
