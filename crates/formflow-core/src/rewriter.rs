//! Submission rewriter
//!
//! Moves the entries of removed fields to the head of each referencing
//! submission and flags them tombstoned. Entries are handled in removal
//! order, so with several removals in one save the last one handled ends up
//! first.

use crate::config::RewritePolicy;
use crate::error::FormError;
use formflow_model::{FieldId, Submission, SubmissionId};
use formflow_store::{StoreError, SubmissionRepository};

/// Tombstones removed-field entries and persists the affected submissions
#[derive(Debug, Clone, Copy, Default)]
pub struct SubmissionRewriter {
    policy: RewritePolicy,
}

impl SubmissionRewriter {
    /// Create new rewriter
    #[inline]
    #[must_use]
    pub fn new(policy: RewritePolicy) -> Self {
        Self { policy }
    }

    /// Batch failure policy
    #[inline]
    #[must_use]
    pub fn policy(&self) -> RewritePolicy {
        self.policy
    }

    /// Tombstone and relocate the entries for `removed`
    ///
    /// Entries already tombstoned are left where they are.
    ///
    /// # Returns
    /// Whether the submission changed
    pub fn tombstone_entries(submission: &mut Submission, removed: &[FieldId]) -> bool {
        let mut changed = false;

        for &field in removed {
            let Some(pos) = submission.entry_position(field) else {
                continue;
            };
            if submission.form_fields[pos].tombstoned {
                continue;
            }

            let mut entry = submission.form_fields.remove(pos);
            entry.tombstoned = true;
            submission.form_fields.insert(0, entry);
            changed = true;
        }

        changed
    }

    /// Rewrite and persist a batch of submissions, one at a time
    ///
    /// Unchanged submissions are not written.
    ///
    /// # Returns
    /// Ids of the submissions that were persisted
    ///
    /// # Errors
    /// - `FormError::RewriteFailed` with the first failure; under
    ///   [`RewritePolicy::FailFast`] the remaining submissions are not attempted
    pub async fn rewrite_batch<R>(
        &self,
        repo: &R,
        submissions: Vec<Submission>,
        removed: &[FieldId],
    ) -> Result<Vec<SubmissionId>, FormError>
    where
        R: SubmissionRepository + ?Sized,
    {
        let mut persisted = Vec::new();
        let mut first_failure: Option<(SubmissionId, StoreError)> = None;
        let mut failures = 0;

        for mut submission in submissions {
            if !Self::tombstone_entries(&mut submission, removed) {
                tracing::trace!(submission = %submission.id, "entries already tombstoned");
                continue;
            }

            match repo.save_submission(&submission).await {
                Ok(()) => persisted.push(submission.id),
                Err(e) => {
                    tracing::warn!(submission = %submission.id, "submission rewrite failed: {}", e);
                    failures += 1;
                    if first_failure.is_none() {
                        first_failure = Some((submission.id, e));
                    }
                    if self.policy == RewritePolicy::FailFast {
                        break;
                    }
                }
            }
        }

        let Some((submission, source)) = first_failure else {
            return Ok(persisted);
        };

        if !persisted.is_empty() {
            tracing::error!(
                failed = %submission,
                persisted = ?persisted,
                "submission batch partially migrated; tombstones need operator follow-up"
            );
        }

        Err(FormError::RewriteFailed {
            submission,
            source,
            persisted,
            failures,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formflow_model::{AdminId, Field, FormId, SubmissionFieldEntry};
    use formflow_store::MemoryStore;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn submission(fields: &[&Field]) -> Submission {
        Submission::new(
            FormId::new(),
            AdminId::new(),
            fields
                .iter()
                .map(|f| SubmissionFieldEntry::answer(f, json!(f.title)))
                .collect(),
        )
    }

    fn order(submission: &Submission) -> Vec<FieldId> {
        submission.form_fields.iter().map(|e| e.field_id).collect()
    }

    #[test]
    fn moves_removed_entry_to_front() {
        let (a, b, c) = (Field::new("A", "t"), Field::new("B", "t"), Field::new("C", "t"));
        let mut s = submission(&[&a, &b, &c]);

        assert!(SubmissionRewriter::tombstone_entries(&mut s, &[b.id]));
        assert_eq!(order(&s), vec![b.id, a.id, c.id]);
        assert!(s.form_fields[0].tombstoned);
        assert!(!s.form_fields[1].tombstoned);
        assert_eq!(s.form_fields[0].answer, json!("B"));
    }

    #[test]
    fn several_removals_land_in_reverse_order() {
        let (a, b, c) = (Field::new("A", "t"), Field::new("B", "t"), Field::new("C", "t"));
        let mut s = submission(&[&a, &b, &c]);

        SubmissionRewriter::tombstone_entries(&mut s, &[a.id, c.id]);
        assert_eq!(order(&s), vec![c.id, a.id, b.id]);
    }

    #[test]
    fn rerun_is_a_noop() {
        let (a, b) = (Field::new("A", "t"), Field::new("B", "t"));
        let mut s = submission(&[&a, &b]);

        assert!(SubmissionRewriter::tombstone_entries(&mut s, &[b.id]));
        let after_first = s.clone();
        assert!(!SubmissionRewriter::tombstone_entries(&mut s, &[b.id]));
        assert_eq!(s, after_first);
    }

    #[test]
    fn unrelated_ids_are_ignored() {
        let a = Field::new("A", "t");
        let mut s = submission(&[&a]);
        assert!(!SubmissionRewriter::tombstone_entries(&mut s, &[FieldId::new()]));
        assert_eq!(s.form_fields.len(), 1);
    }

    #[tokio::test]
    async fn batch_persists_changed_submissions_only() {
        let (a, b) = (Field::new("A", "t"), Field::new("B", "t"));
        let changed = submission(&[&a, &b]);
        let mut already = submission(&[&b, &a]);
        already.form_fields[0].tombstoned = true;

        let store = MemoryStore::with_documents(Vec::new(), [changed.clone(), already.clone()]);
        let rewriter = SubmissionRewriter::default();

        let persisted = rewriter
            .rewrite_batch(&store, vec![changed.clone(), already], &[b.id])
            .await
            .unwrap();

        assert_eq!(persisted, vec![changed.id]);
        let stored = store.submission(changed.id).unwrap();
        assert_eq!(order(&stored), vec![b.id, a.id]);
        assert!(stored.form_fields[0].tombstoned);
    }

    #[tokio::test]
    async fn missing_document_fails_the_batch() {
        let b = Field::new("B", "t");
        let ghost = submission(&[&b]);
        let store = MemoryStore::new();

        let result = SubmissionRewriter::default()
            .rewrite_batch(&store, vec![ghost.clone()], &[b.id])
            .await;

        match result {
            Err(FormError::RewriteFailed {
                submission,
                persisted,
                failures,
                ..
            }) => {
                assert_eq!(submission, ghost.id);
                assert!(persisted.is_empty());
                assert_eq!(failures, 1);
            }
            other => panic!("expected rewrite failure, got {other:?}"),
        }
    }
}
