//! Form service
//!
//! The save pipeline and telemetry intake on top of a document store:
//! - `save_form`: load previous version → lifecycle pass → timestamps → save
//! - `record_submission`: store a submission and reference it from the form
//! - `record_visit`: create or update a visitor session
//! - `funnel`: analytics over the currently stored form
//!
//! Saves for the same form are serialized by a per-form mutex, and an editor
//! holding an outdated copy is rejected before any submission is touched.
//! Staleness is judged on the editor `revision` only: visits and new
//! submissions are merged into editor saves and never invalidate an
//! editor's copy.

use crate::config::FormServiceConfig;
use crate::error::FormError;
use crate::lifecycle::{FieldLifecycleManager, LifecycleOutcome};
use crate::rewriter::SubmissionRewriter;
use chrono::Utc;
use dashmap::DashMap;
use formflow_analytics::FunnelReport;
use formflow_model::{Form, FormId, Submission, VisitorSession};
use formflow_store::{FormRepository, SubmissionRepository};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

type LockMap = DashMap<FormId, Arc<Mutex<()>>>;

/// Who is writing the form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Writer {
    /// Editor copy: revision check, field lifecycle, telemetry merged in
    Editor,
    /// Freshly loaded copy carrying new telemetry
    Telemetry,
}

/// Per-form save lock; the map entry goes away with its last user
struct FormLock<'a> {
    locks: &'a LockMap,
    form: FormId,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for FormLock<'_> {
    fn drop(&mut self) {
        if self.guard.take().is_some() {
            self.locks
                .remove_if(&self.form, |_, lock| Arc::strong_count(lock) == 1);
        }
    }
}

/// Result of a successful save
#[derive(Debug, Clone)]
pub struct SavedForm {
    /// The form as stored
    pub form: Form,
    /// What the lifecycle pass did
    pub lifecycle: LifecycleOutcome,
}

/// Form save pipeline
#[derive(Debug)]
pub struct FormService<R> {
    repo: Arc<R>,
    config: FormServiceConfig,
    locks: LockMap,
}

impl<R> FormService<R>
where
    R: FormRepository + SubmissionRepository,
{
    /// Create new service
    #[inline]
    #[must_use]
    pub fn new(repo: Arc<R>, config: FormServiceConfig) -> Self {
        Self {
            repo,
            config,
            locks: DashMap::new(),
        }
    }

    /// Get configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &FormServiceConfig {
        &self.config
    }

    /// Get repository
    #[inline]
    #[must_use]
    pub fn repository(&self) -> &Arc<R> {
        &self.repo
    }

    /// Save an editor's copy of a form, preserving removed fields that
    /// submissions reference
    ///
    /// # Workflow
    /// 1. Load the persisted version
    /// 2. Reject the write if another editor saved since this copy was loaded
    /// 3. Carry over visitors and submission ids recorded in the meantime
    /// 4. Tombstone removed-but-referenced fields in submissions and in the form
    /// 5. Bump the revision, update timestamps and persist
    ///
    /// # Errors
    /// - `FormError::LookupFailed` if the previous version or a submission query fails
    /// - `FormError::StaleVersion` if another editor save landed first
    /// - `FormError::RewriteFailed` if a submission cannot be persisted
    /// - `FormError::SaveFailed` if the form write fails
    pub async fn save_form(&self, form: Form) -> Result<SavedForm, FormError> {
        let _lock = self.lock(form.id).await;
        self.save_locked(form, Writer::Editor).await
    }

    /// Store a new submission and reference it from its form
    ///
    /// # Errors
    /// - `FormError::FormNotFound` if the form does not exist
    /// - `FormError::InvalidSubmission` if the submission belongs elsewhere
    /// - `FormError::SubmissionFailed` if the submission cannot be stored
    pub async fn record_submission(
        &self,
        form_id: FormId,
        submission: Submission,
    ) -> Result<SavedForm, FormError> {
        let _lock = self.lock(form_id).await;
        let mut form = self.load_existing(form_id).await?;

        if submission.form != form.id || submission.admin != form.admin {
            return Err(FormError::InvalidSubmission(format!(
                "submission {} belongs to form {} / admin {}",
                submission.id, submission.form, submission.admin
            )));
        }

        self.repo
            .insert_submission(&submission)
            .await
            .map_err(|source| FormError::SubmissionFailed {
                submission: submission.id,
                source,
            })?;
        tracing::debug!(form = %form_id, submission = %submission.id, "submission stored");

        form.submissions.push(submission.id);
        match self.save_locked(form, Writer::Telemetry).await {
            Ok(saved) => Ok(saved),
            Err(e) => {
                tracing::error!(
                    form = %form_id,
                    submission = %submission.id,
                    "submission stored but not referenced by its form: {}",
                    e
                );
                Err(e)
            }
        }
    }

    /// Create or update a visitor session
    ///
    /// # Errors
    /// - `FormError::FormNotFound` if the form does not exist
    pub async fn record_visit(
        &self,
        form_id: FormId,
        session: VisitorSession,
    ) -> Result<SavedForm, FormError> {
        let _lock = self.lock(form_id).await;
        let mut form = self.load_existing(form_id).await?;

        let visitors = &mut form.analytics.visitors;
        match visitors.iter_mut().find(|v| v.id == session.id) {
            Some(existing) => *existing = session,
            None => visitors.push(session),
        }

        self.save_locked(form, Writer::Telemetry).await
    }

    /// Funnel statistics for the stored form
    ///
    /// # Errors
    /// - `FormError::FormNotFound` if the form does not exist
    pub async fn funnel(&self, form_id: FormId) -> Result<FunnelReport, FormError> {
        let form = self.load_existing(form_id).await?;
        Ok(formflow_analytics::for_form(&form))
    }

    async fn lock(&self, form_id: FormId) -> FormLock<'_> {
        let guard = if self.config.serialize_saves {
            let lock = self.locks.entry(form_id).or_default().value().clone();
            Some(lock.lock_owned().await)
        } else {
            None
        };
        FormLock {
            locks: &self.locks,
            form: form_id,
            guard,
        }
    }

    async fn load_existing(&self, form_id: FormId) -> Result<Form, FormError> {
        self.repo
            .load_form(form_id)
            .await
            .map_err(|source| FormError::LookupFailed {
                form: form_id,
                source,
            })?
            .ok_or(FormError::FormNotFound(form_id))
    }

    async fn save_locked(&self, mut form: Form, writer: Writer) -> Result<SavedForm, FormError> {
        let previous = self
            .repo
            .load_form(form.id)
            .await
            .map_err(|source| FormError::LookupFailed {
                form: form.id,
                source,
            })?;

        let lifecycle = match writer {
            Writer::Editor => {
                if let Some(previous) = &previous {
                    if previous.revision != form.revision {
                        tracing::warn!(form = %form.id, "rejecting save based on a stale revision");
                        return Err(FormError::StaleVersion {
                            form: form.id,
                            expected: form.revision,
                            actual: previous.revision,
                        });
                    }
                    form.version = previous.version;
                    form.submissions.clone_from(&previous.submissions);
                    form.analytics.visitors.clone_from(&previous.analytics.visitors);
                }

                let manager = FieldLifecycleManager::new(
                    self.repo.as_ref(),
                    SubmissionRewriter::new(self.config.rewrite_policy),
                );
                let lifecycle = manager.reconcile(&mut form, previous.as_ref()).await?;
                form.revision += 1;
                lifecycle
            }
            Writer::Telemetry => LifecycleOutcome::default(),
        };

        if self.config.touch_timestamps {
            let now = Utc::now();
            form.created = previous
                .as_ref()
                .and_then(|p| p.created)
                .or(form.created)
                .or(Some(now));
            if writer == Writer::Editor {
                form.last_modified = Some(now);
            }
        }

        let saved = self
            .repo
            .save_form(&form)
            .await
            .map_err(|source| FormError::SaveFailed {
                form: form.id,
                source,
            })?;

        if lifecycle.is_noop() {
            tracing::debug!(form = %saved.id, revision = saved.revision, "form saved");
        } else {
            tracing::info!(
                form = %saved.id,
                revision = saved.revision,
                preserved = lifecycle.preserved.len(),
                dropped = lifecycle.dropped.len(),
                rewritten = lifecycle.rewritten.len(),
                "form saved with field removals"
            );
        }

        Ok(SavedForm {
            form: saved,
            lifecycle,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formflow_model::{AdminId, Field, SessionId, SubmissionFieldEntry};
    use formflow_store::MemoryStore;
    use serde_json::json;

    fn service() -> FormService<MemoryStore> {
        FormService::new(Arc::new(MemoryStore::new()), FormServiceConfig::default())
    }

    #[tokio::test]
    async fn first_save_sets_timestamps() {
        let service = service();
        let form = Form::new("Survey", AdminId::new());

        let saved = service.save_form(form).await.unwrap();
        assert_eq!(saved.form.version, 1);
        assert_eq!(saved.form.revision, 1);
        assert!(saved.form.created.is_some());
        assert_eq!(saved.form.created, saved.form.last_modified);
        assert!(saved.lifecycle.is_noop());
    }

    #[tokio::test]
    async fn created_survives_later_saves() {
        let service = service();
        let first = service.save_form(Form::new("Survey", AdminId::new())).await.unwrap();
        let mut edited = first.form.clone();
        edited.title = "Renamed".to_string();

        let second = service.save_form(edited).await.unwrap();
        assert_eq!(second.form.created, first.form.created);
        assert!(second.form.last_modified >= first.form.last_modified);
    }

    #[tokio::test]
    async fn timestamps_can_be_disabled() {
        let service = FormService::new(
            Arc::new(MemoryStore::new()),
            FormServiceConfig::new().with_timestamps(false),
        );
        let saved = service.save_form(Form::new("Survey", AdminId::new())).await.unwrap();
        assert!(saved.form.created.is_none());
        assert!(saved.form.last_modified.is_none());
    }

    #[tokio::test]
    async fn stale_writer_is_rejected() {
        let service = service();
        let saved = service.save_form(Form::new("Survey", AdminId::new())).await.unwrap();
        let stale = saved.form.clone();
        service.save_form(saved.form).await.unwrap();

        let result = service.save_form(stale).await;
        assert!(matches!(
            result,
            Err(FormError::StaleVersion { expected: 1, actual: 2, .. })
        ));
    }

    #[tokio::test]
    async fn visit_during_edit_does_not_stale_the_editor() {
        let service = service();
        let field = Field::new("Name", "textfield");
        let form = Form::new("Survey", AdminId::new()).with_fields(vec![field.clone()]);
        let mut editor_copy = service.save_form(form).await.unwrap().form;

        service
            .record_visit(editor_copy.id, VisitorSession::at(field.id))
            .await
            .unwrap();
        editor_copy.title = "Renamed".to_string();
        let saved = service.save_form(editor_copy).await.unwrap();

        assert_eq!(saved.form.title, "Renamed");
        assert_eq!(saved.form.revision, 2);
        assert_eq!(saved.form.version, 3);
        assert_eq!(saved.form.analytics.visitors.len(), 1);
    }

    #[tokio::test]
    async fn submission_during_edit_stays_referenced() {
        let service = service();
        let field = Field::new("Name", "textfield");
        let form = Form::new("Survey", AdminId::new()).with_fields(vec![field.clone()]);
        let editor_copy = service.save_form(form).await.unwrap().form;

        let submission = Submission::new(
            editor_copy.id,
            editor_copy.admin,
            vec![SubmissionFieldEntry::answer(&field, json!("Ada"))],
        );
        service
            .record_submission(editor_copy.id, submission.clone())
            .await
            .unwrap();
        let saved = service.save_form(editor_copy).await.unwrap();

        assert_eq!(saved.form.submissions, vec![submission.id]);
    }

    #[tokio::test]
    async fn telemetry_leaves_last_modified_alone() {
        let service = service();
        let saved = service.save_form(Form::new("Survey", AdminId::new())).await.unwrap();

        let visited = service
            .record_visit(saved.form.id, VisitorSession::new())
            .await
            .unwrap();
        assert_eq!(visited.form.last_modified, saved.form.last_modified);
        assert_eq!(visited.form.revision, saved.form.revision);
    }

    #[tokio::test]
    async fn locks_are_released_after_use() {
        let service = service();
        let saved = service.save_form(Form::new("Survey", AdminId::new())).await.unwrap();
        service
            .record_visit(saved.form.id, VisitorSession::new())
            .await
            .unwrap();
        let _ = service.funnel(FormId::new()).await;

        assert!(service.locks.is_empty());
    }

    #[tokio::test]
    async fn lock_entry_survives_while_held() {
        let service = service();
        let form_id = FormId::new();

        let held = service.lock(form_id).await;
        assert_eq!(service.locks.len(), 1);
        drop(held);
        assert!(service.locks.is_empty());
    }

    #[tokio::test]
    async fn record_visit_upserts_by_session() {
        let service = service();
        let field = Field::new("Name", "textfield");
        let form = Form::new("Survey", AdminId::new()).with_fields(vec![field.clone()]);
        let form_id = service.save_form(form).await.unwrap().form.id;

        let session = VisitorSession::new();
        let session_id: SessionId = session.id;
        service.record_visit(form_id, session.clone()).await.unwrap();
        let saved = service
            .record_visit(form_id, session.reached(field.id).submitted())
            .await
            .unwrap();

        assert_eq!(saved.form.analytics.visitors.len(), 1);
        assert_eq!(saved.form.analytics.visitors[0].id, session_id);
        assert!(saved.form.analytics.visitors[0].is_submitted);
    }

    #[tokio::test]
    async fn record_submission_references_it() {
        let service = service();
        let field = Field::new("Name", "textfield");
        let form = Form::new("Survey", AdminId::new()).with_fields(vec![field.clone()]);
        let form = service.save_form(form).await.unwrap().form;

        let submission = Submission::new(
            form.id,
            form.admin,
            vec![SubmissionFieldEntry::answer(&field, json!("Ada"))],
        );
        let saved = service.record_submission(form.id, submission.clone()).await.unwrap();

        assert_eq!(saved.form.submissions, vec![submission.id]);
        assert!(service.repository().submission(submission.id).is_some());
    }

    #[tokio::test]
    async fn foreign_submission_is_rejected() {
        let service = service();
        let form = service.save_form(Form::new("Survey", AdminId::new())).await.unwrap().form;
        let submission = Submission::new(form.id, AdminId::new(), Vec::new());

        let result = service.record_submission(form.id, submission).await;
        assert!(matches!(result, Err(FormError::InvalidSubmission(_))));
    }

    #[tokio::test]
    async fn unknown_form_is_not_found() {
        let service = service();
        let missing = FormId::new();
        assert!(matches!(
            service.funnel(missing).await,
            Err(FormError::FormNotFound(id)) if id == missing
        ));
        assert!(matches!(
            service.record_visit(missing, VisitorSession::new()).await,
            Err(FormError::FormNotFound(_))
        ));
    }
}
