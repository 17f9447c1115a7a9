//! Named integer domains (enums) and named bitmasks (flags).
//!
//! Both are pure lookup tables built once with the schema. Field validators
//! reference their domains through the auto-generated constants
//! `<enum>_count` and `<flags>_mask`, which keeps range declarations and
//! variant lists from drifting apart.

use serde::Serialize;

/// An ordered list of variant names; wire value = index + base.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnumSpec {
    name: String,
    variants: Vec<String>,
    base: i32,
}

impl EnumSpec {
    pub(crate) fn new(name: &str, variants: Vec<String>, base: i32) -> Self {
        Self { name: name.to_string(), variants, base }
    }

    /// Enum name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of variants.
    pub fn count(&self) -> usize {
        self.variants.len()
    }

    /// Wire base offset (0 for almost every enum).
    pub fn base(&self) -> i32 {
        self.base
    }

    /// Variant names in wire order.
    pub fn variants(&self) -> &[String] {
        &self.variants
    }

    /// Wire value for a variant name.
    pub fn wire_value(&self, variant: &str) -> Option<i32> {
        let index = self.variants.iter().position(|v| v == variant)?;
        Some(self.base + index as i32)
    }

    /// Variant name for a wire value, `None` when out of range.
    pub fn name_of(&self, wire: i32) -> Option<&str> {
        let index = wire.checked_sub(self.base)?;
        if index < 0 {
            return None;
        }
        self.variants.get(index as usize).map(String::as_str)
    }

    /// Name of the auto-generated variant-count constant.
    pub(crate) fn count_constant(&self) -> String {
        format!("{}_count", self.name)
    }
}

/// An ordered list of bit names; bit `i` corresponds to list position `i`.
/// At most 31 bits so every mask fits the validated `[0, 2^n)` i32 range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlagsSpec {
    name: String,
    bits: Vec<String>,
}

impl FlagsSpec {
    pub(crate) fn new(name: &str, bits: Vec<String>) -> Self {
        Self { name: name.to_string(), bits }
    }

    /// Flags name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of named bits.
    pub fn count(&self) -> usize {
        self.bits.len()
    }

    /// Bit names in position order.
    pub fn bits(&self) -> &[String] {
        &self.bits
    }

    /// Bit position for a name.
    pub fn bit(&self, name: &str) -> Option<u32> {
        self.bits.iter().position(|b| b == name).map(|p| p as u32)
    }

    /// Mask covering every named bit: `2^n - 1`.
    pub fn mask(&self) -> i32 {
        ((1u32 << self.bits.len()) - 1) as i32
    }

    /// Inspect a decoded value through named bit tests.
    pub fn view(&self, value: i32) -> FlagsView<'_> {
        FlagsView { spec: self, value }
    }

    /// Name of the auto-generated mask constant.
    pub(crate) fn mask_constant(&self) -> String {
        format!("{}_mask", self.name)
    }
}

/// A decoded flags value paired with its spec, for named bit tests.
#[derive(Debug, Clone, Copy)]
pub struct FlagsView<'a> {
    spec: &'a FlagsSpec,
    value: i32,
}

impl FlagsView<'_> {
    /// Whether the named bit is set. Undeclared names test as unset.
    pub fn has(&self, bit: &str) -> bool {
        match self.spec.bit(bit) {
            Some(position) => self.value & (1 << position) != 0,
            None => false,
        }
    }

    /// Raw wire value.
    pub fn raw(&self) -> i32 {
        self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emotes() -> EnumSpec {
        EnumSpec::new(
            "emote",
            ["normal", "pain", "happy"].iter().map(|s| s.to_string()).collect(),
            0,
        )
    }

    #[test]
    fn enum_wire_values_follow_declaration_order() {
        let e = emotes();
        assert_eq!(e.wire_value("normal"), Some(0));
        assert_eq!(e.wire_value("happy"), Some(2));
        assert_eq!(e.wire_value("missing"), None);
    }

    #[test]
    fn enum_reverse_lookup_respects_base() {
        let teams = EnumSpec::new(
            "team",
            ["spectators", "red", "blue"].iter().map(|s| s.to_string()).collect(),
            -1,
        );
        assert_eq!(teams.name_of(-1), Some("spectators"));
        assert_eq!(teams.name_of(1), Some("blue"));
        assert_eq!(teams.name_of(2), None);
        assert_eq!(teams.name_of(-2), None);
        assert_eq!(teams.wire_value("red"), Some(0));
    }

    #[test]
    fn flags_mask_and_bit_tests() {
        let f = FlagsSpec::new(
            "player_flag",
            ["playing", "in_menu", "chatting"].iter().map(|s| s.to_string()).collect(),
        );
        assert_eq!(f.mask(), 0b111);
        assert_eq!(f.bit("chatting"), Some(2));

        let view = f.view(0b101);
        assert!(view.has("playing"));
        assert!(!view.has("in_menu"));
        assert!(view.has("chatting"));
        assert!(!view.has("undeclared"));
    }
}
