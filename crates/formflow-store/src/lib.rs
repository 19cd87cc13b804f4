//! Formflow document store
//!
//! The external collaborator of the lifecycle protocol:
//! - [`FormRepository`]: load the previous version of a form, save a form
//! - [`SubmissionRepository`]: find submissions by referenced field, save them
//! - [`MemoryStore`]: concurrent in-memory backend with optimistic form versions

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod error;
pub mod memory;
pub mod repository;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use repository::{FormRepository, SubmissionRepository};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
