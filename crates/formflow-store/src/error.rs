//! Store error types

use formflow_model::{FormId, SubmissionId};

/// Errors raised by a document store
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Form does not exist
    #[error("form not found: {0}")]
    FormNotFound(FormId),

    /// Submission does not exist
    #[error("submission not found: {0}")]
    SubmissionNotFound(SubmissionId),

    /// Submission id already taken
    #[error("submission already exists: {0}")]
    DuplicateSubmission(SubmissionId),

    /// Optimistic version check failed
    #[error("version conflict on form {form}: expected {expected}, found {actual}")]
    VersionConflict {
        /// Form being saved
        form: FormId,
        /// Version the writer loaded
        expected: u64,
        /// Version currently stored
        actual: u64,
    },

    /// Backend failure
    #[error("backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Create backend error
    #[inline]
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend(message.into())
    }

    /// Check if a retry could succeed
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Backend(_) | Self::VersionConflict { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_conflict_display() {
        let err = StoreError::VersionConflict {
            form: FormId::new(),
            expected: 2,
            actual: 3,
        };
        assert!(err.to_string().contains("expected 2, found 3"));
        assert!(err.is_retryable());
    }

    #[test]
    fn not_found_is_not_retryable() {
        assert!(!StoreError::FormNotFound(FormId::new()).is_retryable());
        assert!(StoreError::backend("disk full").is_retryable());
    }
}
