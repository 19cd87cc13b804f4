//! Funnel report types

use formflow_model::FieldId;
use serde::Serialize;

/// Aggregate and per-field funnel statistics for one form
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FunnelReport {
    /// Number of visitor sessions
    pub views: usize,
    /// Number of submissions
    pub submissions: usize,
    /// `submissions / views * 100`, zero when there are no views
    pub conversion_rate: f64,
    /// One entry per active field, in form order
    pub fields: Vec<FieldFunnel>,
}

impl FunnelReport {
    /// Statistics for `field`, if it is an active step
    #[inline]
    #[must_use]
    pub fn field(&self, field: FieldId) -> Option<&FieldFunnel> {
        self.fields.iter().find(|f| f.field_id == field)
    }
}

/// Funnel statistics for a single field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldFunnel {
    /// Field identity
    pub field_id: FieldId,
    /// Field title
    pub title: String,
    /// Position in the form's field list
    pub index: usize,
    /// Sessions that stalled here without submitting
    pub dropoff_views: usize,
    /// Sessions that moved past this field (or submitted at the last field)
    pub continue_views: usize,
    /// `dropoff_views + continue_views`
    pub total_views: usize,
    /// Same as `continue_views`
    pub responses: usize,
    /// Rounded continue percentage; `None` when the field has no views
    pub continue_rate: Option<u32>,
    /// Rounded dropoff percentage; `None` when the field has no views
    pub dropoff_rate: Option<u32>,
}

impl FieldFunnel {
    /// Whether any session reached this field
    #[inline]
    #[must_use]
    pub fn has_data(&self) -> bool {
        self.total_views > 0
    }
}

/// Rounded percentage, half away from zero; `None` for an empty total
///
/// Integer arithmetic so exact ties such as 28.5 round up.
#[inline]
#[must_use]
pub fn percent(part: usize, total: usize) -> Option<u32> {
    if total == 0 {
        return None;
    }
    let doubled = part.saturating_mul(200).saturating_add(total);
    let rounded = doubled / total.saturating_mul(2);
    Some(u32::try_from(rounded).unwrap_or(u32::MAX))
}
