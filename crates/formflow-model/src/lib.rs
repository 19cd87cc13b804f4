//! Formflow document model
//!
//! Plain serde documents for the form builder:
//! - [`Form`] with its ordered [`Field`] list and embedded [`VisitorSession`]s
//! - [`Submission`] with a snapshot of the fields answered
//! - Typed ULID identifiers shared between documents
//!
//! Field identity ([`FieldId`]) is the join key between a form and its
//! submissions; the lifecycle and analytics crates are built on it.

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod field;
pub mod form;
pub mod ids;
pub mod language;
pub mod submission;
pub mod visitor;

pub use field::{Attributes, Field};
pub use form::{Button, Design, DesignColors, Form, FormAnalytics, StartPage};
pub use ids::{AdminId, FieldId, FormId, SessionId, SubmissionId};
pub use language::Language;
pub use submission::{Submission, SubmissionFieldEntry};
pub use visitor::{DeviceType, VisitorSession};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
