//! FILENAME: core/crosstab-engine/src/mask.rs
//! Masking of contact details shown as dimension labels or list cells.

/// A masking rule: keep a prefix and a suffix, star out the middle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaskRule {
    /// Phone numbers: keep 3 leading and 4 trailing characters.
    Phone,
    /// WeChat ids: keep 2 leading and 2 trailing characters.
    Wechat,
}

impl MaskRule {
    /// The rule for a field name, if the field is sensitive.
    pub fn for_field(field: &str) -> Option<MaskRule> {
        match field {
            "phone" | "leads.phone" => Some(MaskRule::Phone),
            "wechat" | "leads.wechat" => Some(MaskRule::Wechat),
            _ => None,
        }
    }

    /// (kept prefix, kept suffix)
    fn kept(&self) -> (usize, usize) {
        match self {
            MaskRule::Phone => (3, 4),
            MaskRule::Wechat => (2, 2),
        }
    }

    /// Masks `value`. Values shorter than prefix + suffix are returned as-is.
    pub fn apply(&self, value: &str) -> String {
        let (prefix, suffix) = self.kept();
        let chars: Vec<char> = value.chars().collect();
        if chars.len() < prefix + suffix {
            return value.to_string();
        }

        let hidden = chars.len() - prefix - suffix;
        let mut masked = String::with_capacity(value.len());
        masked.extend(&chars[..prefix]);
        masked.extend(std::iter::repeat('*').take(hidden));
        masked.extend(&chars[chars.len() - suffix..]);
        masked
    }
}

/// Applies the field's masking rule, if any.
pub fn mask_sensitive(field: &str, value: &str) -> String {
    match MaskRule::for_field(field) {
        Some(rule) => rule.apply(value),
        None => value.to_string(),
    }
}
