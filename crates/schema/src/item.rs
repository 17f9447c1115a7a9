//! Item specifications: snapshot objects, events and messages.

use crate::field::{Field, FieldDecl};
use serde::Serialize;
use std::fmt;

/// Item categories. Each category has its own legacy numeric ID space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum ItemCategory {
    /// Snapshot object: world state replicated every tick.
    Object,
    /// One-shot event attached to a snapshot.
    Event,
    /// Reliable game message.
    Message,
}

impl fmt::Display for ItemCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ItemCategory::Object => "object",
            ItemCategory::Event => "event",
            ItemCategory::Message => "message",
        };
        f.write_str(s)
    }
}

/// Extension metadata for items negotiated by stable identifier string
/// instead of a fixed declaration-order ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtInfo {
    /// Globally unique `<short-name>@<domain>` identifier. Never reuse one
    /// for a different field layout once shipped.
    pub ident: String,
    /// Whether decoders must consume the buffer exactly. `false` tolerates
    /// trailing bytes so the item can grow fields later.
    pub validate_size: bool,
}

/// An item as declared to the builder, before flattening.
#[derive(Debug, Clone)]
pub(crate) struct ItemDecl {
    pub name: String,
    pub category: ItemCategory,
    pub base: Option<String>,
    pub ext: Option<ExtInfo>,
    pub fields: Vec<FieldDecl>,
}

/// A resolved item: flattened field list, assigned identity.
///
/// Base-item inheritance is pure field concatenation resolved at load time;
/// a derived item is indistinguishable on the wire from a flat item declaring
/// the concatenated fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Item {
    name: String,
    category: ItemCategory,
    legacy_id: Option<i32>,
    ext: Option<ExtInfo>,
    fields: Vec<Field>,
}

impl Item {
    pub(crate) fn new(
        name: String,
        category: ItemCategory,
        legacy_id: Option<i32>,
        ext: Option<ExtInfo>,
        fields: Vec<Field>,
    ) -> Self {
        Self { name, category, legacy_id, ext, fields }
    }

    /// Item name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Item category.
    pub fn category(&self) -> ItemCategory {
        self.category
    }

    /// Declaration-order numeric ID. `None` for extension items, whose IDs
    /// are negotiated per connection.
    pub fn legacy_id(&self) -> Option<i32> {
        self.legacy_id
    }

    /// Extension metadata, if this is an extension item.
    pub fn ext(&self) -> Option<&ExtInfo> {
        self.ext.as_ref()
    }

    /// Stable identifier string for extension items.
    pub fn ident(&self) -> Option<&str> {
        self.ext.as_ref().map(|e| e.ident.as_str())
    }

    /// Whether decoders enforce exact buffer consumption.
    pub fn validate_size(&self) -> bool {
        self.ext.as_ref().map_or(true, |e| e.validate_size)
    }

    /// The resolved, flattened field list (base fields first).
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }
}
