//! Field lifecycle manager
//!
//! Runs once per form save, before the form is written. Diffs the incoming
//! field list against the persisted one and, for every removed field that
//! some submission still references:
//! - tombstones the matching submission entries (via [`SubmissionRewriter`])
//! - reinstates the field at the head of the form, flagged tombstoned
//!
//! Removed fields nobody answered simply disappear.
//!
//! The previous version is passed in explicitly by the caller; queries and
//! rewrites run sequentially so a submission matched by several removed
//! fields is rewritten once, in one pass.

use crate::error::FormError;
use crate::rewriter::SubmissionRewriter;
use formflow_model::{Field, FieldId, Form, Submission, SubmissionId};
use formflow_store::SubmissionRepository;
use indexmap::IndexMap;
use std::collections::HashSet;

/// What a lifecycle pass did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LifecycleOutcome {
    /// Fields missing from the new list, in their previous order
    pub removed: Vec<FieldId>,
    /// Removed fields kept as tombstones because submissions reference them
    pub preserved: Vec<FieldId>,
    /// Removed fields with no submissions, allowed to disappear
    pub dropped: Vec<FieldId>,
    /// Submissions persisted with tombstoned entries
    pub rewritten: Vec<SubmissionId>,
}

impl LifecycleOutcome {
    /// Whether the pass left everything untouched
    #[inline]
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.removed.is_empty()
    }
}

/// Ids present in `previous` but absent from `current`, in `previous` order
#[must_use]
pub fn removed_field_ids(previous: &[Field], current: &[Field]) -> Vec<FieldId> {
    let kept: HashSet<FieldId> = current.iter().map(|f| f.id).collect();
    previous
        .iter()
        .map(|f| f.id)
        .filter(|id| !kept.contains(id))
        .collect()
}

/// Keeps submissions referentially valid when fields are removed
#[derive(Debug)]
pub struct FieldLifecycleManager<'a, R: ?Sized> {
    repo: &'a R,
    rewriter: SubmissionRewriter,
}

impl<'a, R> FieldLifecycleManager<'a, R>
where
    R: SubmissionRepository + ?Sized,
{
    /// Create new manager over a submission repository
    #[inline]
    #[must_use]
    pub fn new(repo: &'a R, rewriter: SubmissionRewriter) -> Self {
        Self { repo, rewriter }
    }

    /// Reconcile `form` against its persisted `previous` version
    ///
    /// # Arguments
    /// * `form` - The form about to be saved; gains tombstoned fields at its head
    /// * `previous` - The persisted version, `None` for a new form
    ///
    /// # Errors
    /// - `FormError::LookupFailed` if a submission query fails (nothing written)
    /// - `FormError::RewriteFailed` if a submission cannot be persisted
    pub async fn reconcile(
        &self,
        form: &mut Form,
        previous: Option<&Form>,
    ) -> Result<LifecycleOutcome, FormError> {
        let Some(previous) = previous else {
            return Ok(LifecycleOutcome::default());
        };
        if previous.form_fields == form.form_fields {
            return Ok(LifecycleOutcome::default());
        }

        let removed = removed_field_ids(&previous.form_fields, &form.form_fields);
        if removed.is_empty() {
            return Ok(LifecycleOutcome::default());
        }
        tracing::debug!(form = %form.id, removed = removed.len(), "fields removed");

        let mut matched: IndexMap<SubmissionId, Submission> = IndexMap::new();
        let mut preserved = Vec::new();
        let mut dropped = Vec::new();

        for &field in &removed {
            let found = self
                .repo
                .find_submissions(form.id, form.admin, field)
                .await
                .map_err(|source| FormError::LookupFailed {
                    form: form.id,
                    source,
                })?;

            if found.is_empty() {
                dropped.push(field);
            } else {
                preserved.push(field);
            }
            for submission in found {
                matched.entry(submission.id).or_insert(submission);
            }
        }

        let rewritten = self
            .rewriter
            .rewrite_batch(self.repo, matched.into_values().collect(), &removed)
            .await?;

        for &id in &preserved {
            if let Some(field) = previous.field(id) {
                form.form_fields.insert(0, field.clone().into_tombstone());
            }
        }

        tracing::debug!(
            form = %form.id,
            preserved = preserved.len(),
            dropped = dropped.len(),
            rewritten = rewritten.len(),
            "field lifecycle reconciled"
        );

        Ok(LifecycleOutcome {
            removed,
            preserved,
            dropped,
            rewritten,
        })
    }
}
