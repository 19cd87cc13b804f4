//! Testing utilities for Formflow workspace
//!
//! Shared fixtures and a fault-injecting store.

#![allow(missing_docs)]

use async_trait::async_trait;
use formflow_model::{
    AdminId, Field, FieldId, Form, FormId, Submission, SubmissionFieldEntry, SubmissionId,
    VisitorSession,
};
use formflow_store::{FormRepository, MemoryStore, StoreError, SubmissionRepository};
use parking_lot::Mutex;
use serde_json::json;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

pub fn fields(titles: &[&str]) -> Vec<Field> {
    titles.iter().map(|t| Field::new(*t, "textfield")).collect()
}

pub fn form_with_fields(titles: &[&str]) -> Form {
    Form::new("Test form", AdminId::new()).with_fields(fields(titles))
}

/// Submission answering `answered` on `form`
pub fn submission_answering(form: &Form, answered: &[&Field]) -> Submission {
    Submission::new(
        form.id,
        form.admin,
        answered
            .iter()
            .map(|f| SubmissionFieldEntry::answer(f, json!(format!("answer to {}", f.title))))
            .collect(),
    )
}

/// Submission answering every field of `form`
pub fn full_submission(form: &Form) -> Submission {
    let answered: Vec<&Field> = form.form_fields.iter().collect();
    submission_answering(form, &answered)
}

pub fn sessions_at(field: FieldId, count: usize, submitted: bool) -> Vec<VisitorSession> {
    (0..count)
        .map(|_| {
            let session = VisitorSession::at(field);
            if submitted {
                session.submitted()
            } else {
                session
            }
        })
        .collect()
}

pub fn entry_order(submission: &Submission) -> Vec<FieldId> {
    submission.form_fields.iter().map(|e| e.field_id).collect()
}

/// `MemoryStore` wrapper that fails on demand and counts calls
#[derive(Debug, Default)]
pub struct FaultyStore {
    inner: MemoryStore,
    failing_saves: Mutex<HashSet<SubmissionId>>,
    fail_find: AtomicBool,
    fail_load_form: AtomicBool,
    fail_save_form: AtomicBool,
    find_calls: AtomicUsize,
    submission_saves: AtomicUsize,
}

impl FaultyStore {
    pub fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            ..Self::default()
        }
    }

    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }

    pub fn fail_save_of(&self, id: SubmissionId) {
        self.failing_saves.lock().insert(id);
    }

    /// Stop failing submission saves
    pub fn heal(&self) {
        self.failing_saves.lock().clear();
    }

    pub fn fail_find(&self, enabled: bool) {
        self.fail_find.store(enabled, Ordering::SeqCst);
    }

    pub fn fail_load_form(&self, enabled: bool) {
        self.fail_load_form.store(enabled, Ordering::SeqCst);
    }

    pub fn fail_save_form(&self, enabled: bool) {
        self.fail_save_form.store(enabled, Ordering::SeqCst);
    }

    pub fn find_calls(&self) -> usize {
        self.find_calls.load(Ordering::SeqCst)
    }

    /// Attempted submission saves, failed ones included
    pub fn submission_saves(&self) -> usize {
        self.submission_saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FormRepository for FaultyStore {
    async fn load_form(&self, id: FormId) -> Result<Option<Form>, StoreError> {
        if self.fail_load_form.load(Ordering::SeqCst) {
            return Err(StoreError::backend("injected load failure"));
        }
        self.inner.load_form(id).await
    }

    async fn save_form(&self, form: &Form) -> Result<Form, StoreError> {
        if self.fail_save_form.load(Ordering::SeqCst) {
            return Err(StoreError::backend("injected form save failure"));
        }
        self.inner.save_form(form).await
    }
}

#[async_trait]
impl SubmissionRepository for FaultyStore {
    async fn find_submissions(
        &self,
        form: FormId,
        admin: AdminId,
        field: FieldId,
    ) -> Result<Vec<Submission>, StoreError> {
        self.find_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_find.load(Ordering::SeqCst) {
            return Err(StoreError::backend("injected query failure"));
        }
        self.inner.find_submissions(form, admin, field).await
    }

    async fn save_submission(&self, submission: &Submission) -> Result<(), StoreError> {
        self.submission_saves.fetch_add(1, Ordering::SeqCst);
        if self.failing_saves.lock().contains(&submission.id) {
            return Err(StoreError::backend(format!(
                "injected save failure for {}",
                submission.id
            )));
        }
        self.inner.save_submission(submission).await
    }

    async fn insert_submission(&self, submission: &Submission) -> Result<(), StoreError> {
        self.inner.insert_submission(submission).await
    }
}
