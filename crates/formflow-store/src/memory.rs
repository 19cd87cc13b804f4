//! In-memory document store
//!
//! Concurrent maps keyed by document id. Form saves are optimistic: the
//! caller's `version` must match the stored one, so a writer working from a
//! stale copy is rejected instead of silently overwriting.

use crate::error::StoreError;
use crate::repository::{FormRepository, SubmissionRepository};
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use formflow_model::{AdminId, FieldId, Form, FormId, Submission, SubmissionId};

/// Document store backed by `DashMap`
#[derive(Debug, Default)]
pub struct MemoryStore {
    forms: DashMap<FormId, Form>,
    submissions: DashMap<SubmissionId, Submission>,
}

impl MemoryStore {
    /// Create empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a store with existing documents, keeping their versions
    #[must_use]
    pub fn with_documents(
        forms: impl IntoIterator<Item = Form>,
        submissions: impl IntoIterator<Item = Submission>,
    ) -> Self {
        let store = Self::new();
        for form in forms {
            store.forms.insert(form.id, form);
        }
        for submission in submissions {
            store.submissions.insert(submission.id, submission);
        }
        store
    }

    /// Snapshot of a stored form
    #[inline]
    #[must_use]
    pub fn form(&self, id: FormId) -> Option<Form> {
        self.forms.get(&id).map(|f| f.value().clone())
    }

    /// Snapshot of a stored submission
    #[inline]
    #[must_use]
    pub fn submission(&self, id: SubmissionId) -> Option<Submission> {
        self.submissions.get(&id).map(|s| s.value().clone())
    }
}

fn sort_oldest_first(submissions: &mut [Submission]) {
    submissions.sort_by(|a, b| a.created.cmp(&b.created).then_with(|| a.id.cmp(&b.id)));
}

#[async_trait]
impl FormRepository for MemoryStore {
    async fn load_form(&self, id: FormId) -> Result<Option<Form>, StoreError> {
        Ok(self.form(id))
    }

    async fn save_form(&self, form: &Form) -> Result<Form, StoreError> {
        match self.forms.entry(form.id) {
            Entry::Occupied(mut entry) => {
                let actual = entry.get().version;
                if actual != form.version {
                    tracing::debug!(form = %form.id, expected = form.version, actual, "stale form save rejected");
                    return Err(StoreError::VersionConflict {
                        form: form.id,
                        expected: form.version,
                        actual,
                    });
                }
                let mut stored = form.clone();
                stored.version = actual + 1;
                entry.insert(stored.clone());
                Ok(stored)
            }
            Entry::Vacant(entry) => {
                if form.version != 0 {
                    return Err(StoreError::VersionConflict {
                        form: form.id,
                        expected: form.version,
                        actual: 0,
                    });
                }
                let mut stored = form.clone();
                stored.version = 1;
                entry.insert(stored.clone());
                Ok(stored)
            }
        }
    }
}

#[async_trait]
impl SubmissionRepository for MemoryStore {
    async fn find_submissions(
        &self,
        form: FormId,
        admin: AdminId,
        field: FieldId,
    ) -> Result<Vec<Submission>, StoreError> {
        let mut found: Vec<Submission> = self
            .submissions
            .iter()
            .filter(|s| s.form == form && s.admin == admin && s.references(field))
            .map(|s| s.value().clone())
            .collect();
        sort_oldest_first(&mut found);
        Ok(found)
    }

    async fn save_submission(&self, submission: &Submission) -> Result<(), StoreError> {
        match self.submissions.get_mut(&submission.id) {
            Some(mut stored) => {
                *stored = submission.clone();
                Ok(())
            }
            None => Err(StoreError::SubmissionNotFound(submission.id)),
        }
    }

    async fn insert_submission(&self, submission: &Submission) -> Result<(), StoreError> {
        match self.submissions.entry(submission.id) {
            Entry::Occupied(_) => Err(StoreError::DuplicateSubmission(submission.id)),
            Entry::Vacant(entry) => {
                entry.insert(submission.clone());
                Ok(())
            }
        }
    }
}
