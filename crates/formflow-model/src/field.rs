//! Form fields
//!
//! A field's identity is the join key between a form and its submissions.
//! Everything else about a field (type, labels, validation hints) is carried
//! as an opaque attribute bag.

use crate::ids::FieldId;
use serde::{Deserialize, Serialize};

/// Opaque display/config attributes
pub type Attributes = serde_json::Map<String, serde_json::Value>;

/// A single question on a form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// Stable identity
    pub id: FieldId,
    /// Question text
    #[serde(default)]
    pub title: String,
    /// Field type name (`textfield`, `dropdown`, ...)
    #[serde(default)]
    pub field_type: String,
    /// Opaque attributes
    #[serde(default)]
    pub attributes: Attributes,
    /// Removed from the active form but retained because submissions reference it
    #[serde(default)]
    pub tombstoned: bool,
}

impl Field {
    /// Create new active field with a fresh id
    #[inline]
    #[must_use]
    pub fn new(title: impl Into<String>, field_type: impl Into<String>) -> Self {
        Self::with_id(FieldId::new(), title, field_type)
    }

    /// Create new active field with a known id
    #[inline]
    #[must_use]
    pub fn with_id(id: FieldId, title: impl Into<String>, field_type: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            field_type: field_type.into(),
            attributes: Attributes::new(),
            tombstoned: false,
        }
    }

    /// With opaque attribute
    #[inline]
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    /// Copy of this field flagged as tombstoned
    #[inline]
    #[must_use]
    pub fn into_tombstone(mut self) -> Self {
        self.tombstoned = true;
        self
    }

    /// Whether the field is an active funnel step
    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.tombstoned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_field_is_active() {
        let field = Field::new("Name", "textfield");
        assert!(field.is_active());
        assert!(field.attributes.is_empty());
    }

    #[test]
    fn tombstone_keeps_identity() {
        let field = Field::new("Email", "email").with_attribute("required", json!(true));
        let id = field.id;

        let tombstone = field.into_tombstone();
        assert_eq!(tombstone.id, id);
        assert!(tombstone.tombstoned);
        assert_eq!(tombstone.attributes["required"], json!(true));
    }

    #[test]
    fn missing_flags_deserialize_to_defaults() {
        let id = FieldId::new();
        let field: Field = serde_json::from_value(json!({ "id": id.to_string() })).unwrap();
        assert_eq!(field.id, id);
        assert!(!field.tombstoned);
        assert!(field.title.is_empty());
    }
}
