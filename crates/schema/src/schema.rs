//! Schema builder and the immutable registry it produces.
//!
//! A [`Schema`] is built once at process start and never mutated afterwards,
//! so it is safely shared across all connections without synchronization.
//! Legacy numeric IDs are a compatibility contract: they equal the item's
//! declaration index among non-extension items of its category, so only
//! appending new declarations is safe once a schema has shipped.

use crate::constants::ConstantTable;
use crate::enums::{EnumSpec, FlagsSpec};
use crate::error::SchemaError;
use crate::field::{Field, FieldDecl};
use crate::item::{ExtInfo, Item, ItemCategory, ItemDecl};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Collects declarations and validates them into a [`Schema`].
///
/// Declaration order matters: it defines legacy numeric IDs.
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    constants: Vec<(String, i32)>,
    enums: Vec<EnumSpec>,
    flags: Vec<FlagsSpec>,
    items: Vec<ItemDecl>,
}

impl SchemaBuilder {
    /// Start an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a named constant usable in range bound expressions.
    pub fn constant(&mut self, name: &str, value: i32) -> &mut Self {
        self.constants.push((name.to_string(), value));
        self
    }

    /// Declare an enum. Also registers the `<name>_count` constant.
    pub fn enumeration<'a>(
        &mut self,
        name: &str,
        variants: impl IntoIterator<Item = &'a str>,
    ) -> &mut Self {
        self.enumeration_with_base(name, 0, variants)
    }

    /// Declare an enum whose wire values start at `base`.
    pub fn enumeration_with_base<'a>(
        &mut self,
        name: &str,
        base: i32,
        variants: impl IntoIterator<Item = &'a str>,
    ) -> &mut Self {
        let variants = variants.into_iter().map(|v| v.to_string()).collect();
        self.enums.push(EnumSpec::new(name, variants, base));
        self
    }

    /// Declare a flags set. Also registers the `<name>_mask` constant.
    pub fn flag_set<'a>(
        &mut self,
        name: &str,
        bits: impl IntoIterator<Item = &'a str>,
    ) -> &mut Self {
        let bits = bits.into_iter().map(|b| b.to_string()).collect();
        self.flags.push(FlagsSpec::new(name, bits));
        self
    }

    fn item(
        &mut self,
        name: &str,
        category: ItemCategory,
        base: Option<&str>,
        ext: Option<ExtInfo>,
        fields: impl IntoIterator<Item = FieldDecl>,
    ) -> &mut Self {
        self.items.push(ItemDecl {
            name: name.to_string(),
            category,
            base: base.map(str::to_string),
            ext,
            fields: fields.into_iter().collect(),
        });
        self
    }

    /// Declare a snapshot object.
    pub fn object(&mut self, name: &str, fields: impl IntoIterator<Item = FieldDecl>) -> &mut Self {
        self.item(name, ItemCategory::Object, None, None, fields)
    }

    /// Declare a snapshot object extending `base` (fields concatenate).
    pub fn derived_object(
        &mut self,
        name: &str,
        base: &str,
        fields: impl IntoIterator<Item = FieldDecl>,
    ) -> &mut Self {
        self.item(name, ItemCategory::Object, Some(base), None, fields)
    }

    /// Declare an extension object carrying a stable identifier string.
    pub fn object_ex(
        &mut self,
        name: &str,
        ident: &str,
        validate_size: bool,
        fields: impl IntoIterator<Item = FieldDecl>,
    ) -> &mut Self {
        let ext = ExtInfo { ident: ident.to_string(), validate_size };
        self.item(name, ItemCategory::Object, None, Some(ext), fields)
    }

    /// Declare an event.
    pub fn event(&mut self, name: &str, fields: impl IntoIterator<Item = FieldDecl>) -> &mut Self {
        self.item(name, ItemCategory::Event, None, None, fields)
    }

    /// Declare an event extending `base`.
    pub fn derived_event(
        &mut self,
        name: &str,
        base: &str,
        fields: impl IntoIterator<Item = FieldDecl>,
    ) -> &mut Self {
        self.item(name, ItemCategory::Event, Some(base), None, fields)
    }

    /// Declare a message.
    pub fn message(&mut self, name: &str, fields: impl IntoIterator<Item = FieldDecl>) -> &mut Self {
        self.item(name, ItemCategory::Message, None, None, fields)
    }

    /// Declare an extension message carrying a stable identifier string.
    pub fn message_ex(
        &mut self,
        name: &str,
        ident: &str,
        validate_size: bool,
        fields: impl IntoIterator<Item = FieldDecl>,
    ) -> &mut Self {
        let ext = ExtInfo { ident: ident.to_string(), validate_size };
        self.item(name, ItemCategory::Message, None, Some(ext), fields)
    }

    /// Validate every declaration and freeze the registry.
    pub fn build(self) -> Result<Schema, SchemaError> {
        let mut constants = ConstantTable::new();
        for (name, value) in &self.constants {
            constants.insert(name, *value)?;
        }
        for spec in &self.enums {
            constants.insert(&spec.count_constant(), spec.count() as i32)?;
        }
        for spec in &self.flags {
            if spec.count() > 31 {
                return Err(SchemaError::TooManyFlagBits {
                    name: spec.name().to_string(),
                    count: spec.count(),
                });
            }
            constants.insert(&spec.mask_constant(), spec.mask())?;
        }

        let mut by_name: BTreeMap<String, usize> = BTreeMap::new();
        for (index, decl) in self.items.iter().enumerate() {
            if let Some(ext) = &decl.ext {
                validate_ident(&ext.ident)?;
            }
            if by_name.insert(decl.name.clone(), index).is_some() {
                return Err(SchemaError::DuplicateItem { name: decl.name.clone() });
            }
        }

        // Resolve each item's own fields, then flatten base chains.
        let mut own_fields: Vec<Vec<Field>> = Vec::with_capacity(self.items.len());
        for decl in &self.items {
            let fields = decl
                .fields
                .iter()
                .map(|f| f.resolve(&constants))
                .collect::<Result<Vec<_>, _>>()?;
            own_fields.push(fields);
        }

        let mut flattened: Vec<Option<Vec<Field>>> = vec![None; self.items.len()];
        for index in 0..self.items.len() {
            flatten(index, &self.items, &by_name, &own_fields, &mut flattened, &mut Vec::new())?;
        }

        // Legacy IDs: declaration index among non-extension items, per category.
        let mut counters: BTreeMap<ItemCategory, i32> = BTreeMap::new();
        let mut legacy: BTreeMap<(ItemCategory, i32), usize> = BTreeMap::new();
        let mut ex_by_ident: BTreeMap<String, usize> = BTreeMap::new();
        let mut items = Vec::with_capacity(self.items.len());

        for (index, decl) in self.items.iter().enumerate() {
            let fields = flattened[index].clone().expect("flattening covered every item");
            // Checked on the flattened list so base/derived collisions are
            // caught, not just duplicates within one declaration.
            let mut field_names = BTreeSet::new();
            for field in &fields {
                if !field_names.insert(field.name.as_str()) {
                    return Err(SchemaError::DuplicateField {
                        item: decl.name.clone(),
                        field: field.name.clone(),
                    });
                }
            }
            let legacy_id = if decl.ext.is_none() {
                let counter = counters.entry(decl.category).or_insert(0);
                let id = *counter;
                *counter += 1;
                legacy.insert((decl.category, id), index);
                Some(id)
            } else {
                None
            };
            if let Some(ext) = &decl.ext {
                if ex_by_ident.insert(ext.ident.clone(), index).is_some() {
                    return Err(SchemaError::DuplicateExIdent { ident: ext.ident.clone() });
                }
            }
            items.push(Item::new(
                decl.name.clone(),
                decl.category,
                legacy_id,
                decl.ext.clone(),
                fields,
            ));
        }

        debug!(
            items = items.len(),
            extensions = ex_by_ident.len(),
            enums = self.enums.len(),
            flag_sets = self.flags.len(),
            "schema built"
        );

        Ok(Schema {
            constants,
            enums: self.enums,
            flags: self.flags,
            items,
            by_name,
            legacy,
            ex_by_ident,
        })
    }
}

fn validate_ident(ident: &str) -> Result<(), SchemaError> {
    let bad = || SchemaError::BadExIdent { ident: ident.to_string() };
    let (short, domain) = ident.split_once('@').ok_or_else(bad)?;
    let part_ok = |s: &str| {
        !s.is_empty()
            && s.chars()
                .all(|c| matches!(c, 'a'..='z' | '0'..='9' | '-' | '.'))
    };
    if !part_ok(short) || !part_ok(domain) || domain.contains('@') {
        return Err(bad());
    }
    Ok(())
}

/// Depth-first flattening with an explicit in-progress stack for cycle
/// detection. Base fields precede the item's own fields.
fn flatten(
    index: usize,
    decls: &[ItemDecl],
    by_name: &BTreeMap<String, usize>,
    own_fields: &[Vec<Field>],
    flattened: &mut Vec<Option<Vec<Field>>>,
    in_progress: &mut Vec<usize>,
) -> Result<(), SchemaError> {
    if flattened[index].is_some() {
        return Ok(());
    }
    if in_progress.contains(&index) {
        return Err(SchemaError::Cycle { item: decls[index].name.clone() });
    }

    let decl = &decls[index];
    let base_fields = match &decl.base {
        None => Vec::new(),
        Some(base) => {
            let base_index = by_name
                .get(base)
                .copied()
                .filter(|&i| decls[i].category == decl.category)
                .ok_or_else(|| SchemaError::UnknownBase {
                    item: decl.name.clone(),
                    base: base.clone(),
                    category: decl.category.to_string(),
                })?;
            in_progress.push(index);
            flatten(base_index, decls, by_name, own_fields, flattened, in_progress)?;
            in_progress.pop();
            flattened[base_index].clone().expect("base flattened above")
        }
    };

    let mut fields = base_fields;
    fields.extend(own_fields[index].iter().cloned());
    flattened[index] = Some(fields);
    Ok(())
}

/// The immutable registry: resolved items, enums, flags and constants.
///
/// This is also the output contract toward the code generator: it exposes
/// every item per category with its legacy ID and flattened field list, all
/// `Serialize`-able for dumping.
#[derive(Debug)]
pub struct Schema {
    constants: ConstantTable,
    enums: Vec<EnumSpec>,
    flags: Vec<FlagsSpec>,
    items: Vec<Item>,
    by_name: BTreeMap<String, usize>,
    legacy: BTreeMap<(ItemCategory, i32), usize>,
    ex_by_ident: BTreeMap<String, usize>,
}

impl Schema {
    /// Look up an item by name.
    pub fn item(&self, name: &str) -> Option<&Item> {
        self.by_name.get(name).map(|&i| &self.items[i])
    }

    /// Look up a legacy item by `(category, numeric ID)`.
    pub fn legacy_item(&self, category: ItemCategory, id: i32) -> Option<&Item> {
        self.legacy.get(&(category, id)).map(|&i| &self.items[i])
    }

    /// Look up an extension item by identifier string.
    pub fn ex_item(&self, ident: &str) -> Option<&Item> {
        self.ex_by_ident.get(ident).map(|&i| &self.items[i])
    }

    /// All extension identifiers, lexicographically sorted.
    pub fn ex_idents(&self) -> impl Iterator<Item = &str> {
        self.ex_by_ident.keys().map(String::as_str)
    }

    /// All items in declaration order.
    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.items.iter()
    }

    /// Items of one category in declaration order.
    pub fn items_in(&self, category: ItemCategory) -> impl Iterator<Item = &Item> {
        self.items.iter().filter(move |i| i.category() == category)
    }

    /// Look up an enum by name.
    pub fn enum_spec(&self, name: &str) -> Option<&EnumSpec> {
        self.enums.iter().find(|e| e.name() == name)
    }

    /// Look up a flags set by name.
    pub fn flag_set(&self, name: &str) -> Option<&FlagsSpec> {
        self.flags.iter().find(|f| f.name() == name)
    }

    /// Look up a resolved constant (declared, builtin or auto-generated).
    pub fn constant(&self, name: &str) -> Option<i32> {
        self.constants.get(name)
    }
}
