//! Error types for Formflow Core
//!
//! Two failure classes abort a form save:
//! - Lookup failures (previous version or submission query) before anything is written
//! - Rewrite failures while persisting tombstoned submissions, which may leave
//!   the batch partially migrated

use formflow_model::{FormId, SubmissionId};
use formflow_store::StoreError;

/// Main Formflow error type
#[derive(Debug, thiserror::Error)]
pub enum FormError {
    /// Form does not exist
    #[error("form not found: {0}")]
    FormNotFound(FormId),

    /// Previous version or submission query failed; nothing was written
    #[error("lookup failed for form {form}: {source}")]
    LookupFailed {
        /// Form being saved
        form: FormId,
        /// Store failure
        #[source]
        source: StoreError,
    },

    /// A tombstoned submission could not be persisted
    #[error("rewrite of submission {submission} failed ({failures} failure(s), {} already persisted): {source}", .persisted.len())]
    RewriteFailed {
        /// First submission that failed
        submission: SubmissionId,
        /// Store failure for that submission
        #[source]
        source: StoreError,
        /// Submissions of the batch that were saved before the abort
        persisted: Vec<SubmissionId>,
        /// Number of submissions that failed
        failures: usize,
    },

    /// Editor started from a copy another editor save has since replaced
    #[error("stale form {form}: editing revision {expected}, stored revision {actual}")]
    StaleVersion {
        /// Form being saved
        form: FormId,
        /// Revision the editor loaded
        expected: u64,
        /// Revision currently stored
        actual: u64,
    },

    /// Final form write failed
    #[error("save failed for form {form}: {source}")]
    SaveFailed {
        /// Form being saved
        form: FormId,
        /// Store failure
        #[source]
        source: StoreError,
    },

    /// Submission does not belong to the target form
    #[error("invalid submission: {0}")]
    InvalidSubmission(String),

    /// New submission could not be stored
    #[error("could not store submission {submission}: {source}")]
    SubmissionFailed {
        /// Submission being stored
        submission: SubmissionId,
        /// Store failure
        #[source]
        source: StoreError,
    },

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

impl FormError {
    /// Check if error is retryable
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::LookupFailed { source, .. }
            | Self::SaveFailed { source, .. }
            | Self::SubmissionFailed { source, .. }
            | Self::RewriteFailed { source, .. } => source.is_retryable(),
            Self::StaleVersion { .. } => true,
            Self::FormNotFound(_) | Self::InvalidSubmission(_) | Self::Config(_) => false,
        }
    }

    /// Check if some submissions were migrated before the save aborted
    #[inline]
    #[must_use]
    pub fn is_partial_migration(&self) -> bool {
        matches!(self, Self::RewriteFailed { persisted, .. } if !persisted.is_empty())
    }
}
