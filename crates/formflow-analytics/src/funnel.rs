//! Funnel computation
//!
//! Sessions are indexed once by their last active field, then every field is
//! answered from the index and a suffix sum over field positions, so the
//! whole pass is O(fields + sessions).
//!
//! A session pointing at a field that is not on the form matches nothing.

use crate::report::{percent, FieldFunnel, FunnelReport};
use formflow_model::{Field, FieldId, Form, VisitorSession};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, Default)]
struct Tally {
    stalled: usize,
    finished: usize,
}

/// Sessions grouped by last active field
#[derive(Debug)]
struct SessionIndex {
    by_field: HashMap<FieldId, Tally>,
    /// `beyond[i]` = sessions whose last field sits at a position > `i`
    beyond: Vec<usize>,
}

impl SessionIndex {
    fn build(fields: &[Field], sessions: &[VisitorSession]) -> Self {
        let mut positions: HashMap<FieldId, usize> = HashMap::with_capacity(fields.len());
        for (i, field) in fields.iter().enumerate() {
            positions.entry(field.id).or_insert(i);
        }

        let mut by_field: HashMap<FieldId, Tally> = HashMap::new();
        let mut reached_at = vec![0usize; fields.len()];

        for session in sessions {
            let Some(last) = session.last_active_field else {
                continue;
            };

            let tally = by_field.entry(last).or_default();
            if session.is_submitted {
                tally.finished += 1;
            } else {
                tally.stalled += 1;
            }

            if let Some(&pos) = positions.get(&last) {
                reached_at[pos] += 1;
            }
        }

        let mut beyond = vec![0usize; fields.len()];
        let mut running = 0;
        for i in (0..fields.len()).rev() {
            beyond[i] = running;
            running += reached_at[i];
        }

        Self { by_field, beyond }
    }

    fn tally(&self, field: FieldId) -> Tally {
        self.by_field.get(&field).copied().unwrap_or_default()
    }
}

/// Compute the funnel for an ordered field list
///
/// # Arguments
/// * `fields` - The form's field list in order, tombstones included
/// * `sessions` - Visitor sessions
/// * `submissions` - Number of submissions recorded for the form
///
/// Tombstoned fields keep their position but produce no entry.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn compute(fields: &[Field], sessions: &[VisitorSession], submissions: usize) -> FunnelReport {
    let views = sessions.len();
    let conversion_rate = if views == 0 {
        0.0
    } else {
        submissions as f64 / views as f64 * 100.0
    };

    let index = SessionIndex::build(fields, sessions);
    let last = fields.len().saturating_sub(1);

    let fields = fields
        .iter()
        .enumerate()
        .filter(|(_, field)| field.is_active())
        .map(|(i, field)| {
            let tally = index.tally(field.id);
            let dropoff_views = tally.stalled;
            let continue_views = if i == last {
                tally.finished
            } else {
                index.beyond[i]
            };
            let total_views = dropoff_views + continue_views;

            FieldFunnel {
                field_id: field.id,
                title: field.title.clone(),
                index: i,
                dropoff_views,
                continue_views,
                total_views,
                responses: continue_views,
                continue_rate: percent(continue_views, total_views),
                dropoff_rate: percent(dropoff_views, total_views),
            }
        })
        .collect();

    FunnelReport {
        views,
        submissions,
        conversion_rate,
        fields,
    }
}

/// Compute the funnel for a form document
#[inline]
#[must_use]
pub fn for_form(form: &Form) -> FunnelReport {
    compute(&form.form_fields, form.visitors(), form.submissions.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn fields(n: usize) -> Vec<Field> {
        (0..n)
            .map(|i| Field::new(format!("Q{i}"), "textfield"))
            .collect()
    }

    fn sessions(field: FieldId, count: usize, submitted: bool) -> Vec<VisitorSession> {
        (0..count)
            .map(|_| {
                let s = VisitorSession::at(field);
                if submitted {
                    s.submitted()
                } else {
                    s
                }
            })
            .collect()
    }

    #[test]
    fn three_step_funnel() {
        let f = fields(3);
        let mut visitors = sessions(f[0].id, 3, false);
        visitors.extend(sessions(f[1].id, 2, false));
        visitors.extend(sessions(f[2].id, 5, true));

        let report = compute(&f, &visitors, 5);
        assert_eq!(report.views, 10);
        assert_eq!(report.submissions, 5);
        assert!((report.conversion_rate - 50.0).abs() < f64::EPSILON);

        let a = &report.fields[0];
        assert_eq!(a.dropoff_views, 3);
        assert_eq!(a.continue_views, 7);
        assert_eq!(a.total_views, 10);
        assert_eq!(a.dropoff_rate, Some(30));
        assert_eq!(a.continue_rate, Some(70));

        let b = &report.fields[1];
        assert_eq!(b.dropoff_views, 2);
        assert_eq!(b.continue_views, 5);
        assert_eq!(b.continue_rate, Some(71));
        assert_eq!(b.dropoff_rate, Some(29));

        let c = &report.fields[2];
        assert_eq!(c.dropoff_views, 0);
        assert_eq!(c.continue_views, 5);
        assert_eq!(c.total_views, 5);
        assert_eq!(c.responses, 5);
        assert_eq!(c.continue_rate, Some(100));
        assert_eq!(c.dropoff_rate, Some(0));
    }

    #[test]
    fn no_views_means_zero_conversion() {
        let report = compute(&fields(2), &[], 7);
        assert_eq!(report.views, 0);
        assert_eq!(report.submissions, 7);
        assert!(report.conversion_rate.abs() < f64::EPSILON);
    }

    #[test]
    fn untouched_field_has_no_data() {
        let f = fields(2);
        let report = compute(&f, &[], 0);
        assert!(!report.fields[1].has_data());
        assert_eq!(report.fields[1].continue_rate, None);
        assert_eq!(report.fields[1].dropoff_rate, None);
    }

    #[test]
    fn last_field_counts_only_submitted_sessions() {
        let f = fields(2);
        let mut visitors = sessions(f[1].id, 4, false);
        visitors.extend(sessions(f[1].id, 1, true));

        let report = compute(&f, &visitors, 1);
        let last = &report.fields[1];
        assert_eq!(last.continue_views, 1);
        assert_eq!(last.dropoff_views, 4);
        assert_eq!(last.continue_rate, Some(20));
    }

    #[test]
    fn non_last_continue_ignores_submission_state() {
        let f = fields(3);
        let mut visitors = sessions(f[1].id, 2, true);
        visitors.extend(sessions(f[2].id, 1, false));

        let report = compute(&f, &visitors, 2);
        assert_eq!(report.fields[0].continue_views, 3);
        assert_eq!(report.fields[1].continue_views, 1);
    }

    #[test]
    fn unknown_field_references_match_nothing() {
        let f = fields(2);
        let mut visitors = sessions(FieldId::new(), 3, false);
        visitors.push(VisitorSession::new());

        let report = compute(&f, &visitors, 0);
        assert_eq!(report.views, 4);
        for field in &report.fields {
            assert_eq!(field.total_views, 0);
        }
    }

    #[test]
    fn tombstoned_fields_hold_position_but_are_skipped() {
        let mut f = fields(3);
        f[0].tombstoned = true;
        let visitors = sessions(f[0].id, 2, false);

        let report = compute(&f, &visitors, 0);
        assert_eq!(report.fields.len(), 2);
        assert_eq!(report.fields[0].index, 1);
        assert!(report.field(f[0].id).is_none());
        // sessions resolving to position 0 are not past position 1
        assert_eq!(report.fields[0].continue_views, 0);
    }

    #[test]
    fn empty_form_has_no_field_entries() {
        let report = compute(&[], &sessions(FieldId::new(), 1, false), 0);
        assert!(report.fields.is_empty());
        assert_eq!(report.views, 1);
    }

    #[test]
    fn for_form_uses_embedded_telemetry() {
        let f = fields(1);
        let mut form = formflow_model::Form::new("f", formflow_model::AdminId::new())
            .with_fields(f.clone());
        form.analytics.visitors = sessions(f[0].id, 2, true);
        form.submissions = vec![formflow_model::SubmissionId::new(); 2];

        let report = for_form(&form);
        assert_eq!(report.views, 2);
        assert_eq!(report.fields[0].continue_views, 2);
        assert!((report.conversion_rate - 100.0).abs() < f64::EPSILON);
    }
}
