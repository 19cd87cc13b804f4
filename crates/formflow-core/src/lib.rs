//! Formflow Core - form save pipeline
//!
//! Keeps historical submissions referentially valid while editors change a
//! live form:
//! - Diffs each saved field list against the persisted one
//! - Tombstones removed fields that submissions still reference, in the
//!   submissions and in the form itself
//! - Serializes saves per form and rejects stale writers
//! - Records submissions and visitor telemetry for funnel analytics
//!
//! # Example
//!
//! ```rust,ignore
//! use formflow_core::{FormService, FormServiceConfig};
//! use formflow_store::MemoryStore;
//! use std::sync::Arc;
//!
//! # async fn example(form: formflow_model::Form) -> Result<(), formflow_core::FormError> {
//! let service = FormService::new(Arc::new(MemoryStore::new()), FormServiceConfig::new());
//!
//! let saved = service.save_form(form).await?;
//! println!("preserved {} removed field(s)", saved.lifecycle.preserved.len());
//!
//! let report = service.funnel(saved.form.id).await?;
//! println!("conversion: {:.1}%", report.conversion_rate);
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod lifecycle;
pub mod rewriter;
pub mod service;

pub use config::{FormServiceConfig, RewritePolicy};
pub use error::FormError;
pub use lifecycle::{removed_field_ids, FieldLifecycleManager, LifecycleOutcome};
pub use rewriter::SubmissionRewriter;
pub use service::{FormService, SavedForm};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with Formflow Core
    pub use crate::{
        FieldLifecycleManager, FormError, FormService, FormServiceConfig, LifecycleOutcome,
        RewritePolicy, SavedForm, SubmissionRewriter,
    };
    pub use formflow_analytics::{FieldFunnel, FunnelReport};
    pub use formflow_model::{Field, FieldId, Form, FormId, Submission, VisitorSession};
    pub use formflow_store::{FormRepository, MemoryStore, StoreError, SubmissionRepository};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
