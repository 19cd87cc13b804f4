//! Repository seams
//!
//! The lifecycle protocol only needs find-by-filter and per-document save.
//! Any backend (document database, SQL, in-memory) can sit behind these.

use crate::error::StoreError;
use async_trait::async_trait;
use formflow_model::{AdminId, FieldId, Form, FormId, Submission};

/// Form persistence
#[async_trait]
pub trait FormRepository: Send + Sync {
    /// Load the persisted version of a form
    async fn load_form(&self, id: FormId) -> Result<Option<Form>, StoreError>;

    /// Persist a form atomically
    ///
    /// The form's `version` must match the stored version (0 for a new form).
    /// Returns the stored copy with its bumped version.
    async fn save_form(&self, form: &Form) -> Result<Form, StoreError>;
}

/// Submission persistence
#[async_trait]
pub trait SubmissionRepository: Send + Sync {
    /// Submissions of `form` owned by `admin` with an entry for `field`
    async fn find_submissions(
        &self,
        form: FormId,
        admin: AdminId,
        field: FieldId,
    ) -> Result<Vec<Submission>, StoreError>;

    /// Persist an existing submission atomically
    async fn save_submission(&self, submission: &Submission) -> Result<(), StoreError>;

    /// Store a new submission
    async fn insert_submission(&self, submission: &Submission) -> Result<(), StoreError>;
}
