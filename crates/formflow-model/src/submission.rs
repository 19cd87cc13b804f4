//! Form submissions
//!
//! A submission snapshots the form's field list at submission time. Entries
//! are never dropped afterwards; removing a field from the form only ever
//! tombstones and relocates the matching entry.

use crate::field::Field;
use crate::ids::{AdminId, FieldId, FormId, SubmissionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One answered field inside a submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionFieldEntry {
    /// Identity of the form field this entry answers
    pub field_id: FieldId,
    /// Question text at submission time
    #[serde(default)]
    pub title: String,
    /// Visitor answer
    #[serde(default)]
    pub answer: serde_json::Value,
    /// Field was later removed from the form
    #[serde(default)]
    pub tombstoned: bool,
}

impl SubmissionFieldEntry {
    /// Snapshot an answer to `field`
    #[inline]
    #[must_use]
    pub fn answer(field: &Field, answer: serde_json::Value) -> Self {
        Self {
            field_id: field.id,
            title: field.title.clone(),
            answer,
            tombstoned: false,
        }
    }
}

/// A completed form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    /// Submission identity
    pub id: SubmissionId,
    /// Owning form
    pub form: FormId,
    /// Owning admin
    pub admin: AdminId,
    /// Field entries in submission order (tombstones at the head)
    pub form_fields: Vec<SubmissionFieldEntry>,
    /// Seconds the visitor spent
    #[serde(default)]
    pub time_elapsed: Option<f64>,
    /// Share of fields answered, 0-100
    #[serde(default)]
    pub percentage_complete: Option<f64>,
    /// Creation time
    pub created: DateTime<Utc>,
}

impl Submission {
    /// Create new submission
    #[inline]
    #[must_use]
    pub fn new(form: FormId, admin: AdminId, form_fields: Vec<SubmissionFieldEntry>) -> Self {
        Self {
            id: SubmissionId::new(),
            form,
            admin,
            form_fields,
            time_elapsed: None,
            percentage_complete: None,
            created: Utc::now(),
        }
    }

    /// Position of the entry answering `field`
    #[inline]
    #[must_use]
    pub fn entry_position(&self, field: FieldId) -> Option<usize> {
        self.form_fields.iter().position(|e| e.field_id == field)
    }

    /// Whether any entry answers `field`
    #[inline]
    #[must_use]
    pub fn references(&self, field: FieldId) -> bool {
        self.entry_position(field).is_some()
    }

    /// Entry answering `field`
    #[inline]
    #[must_use]
    pub fn entry(&self, field: FieldId) -> Option<&SubmissionFieldEntry> {
        self.form_fields.iter().find(|e| e.field_id == field)
    }
}
