//! Formflow funnel analytics
//!
//! Derives per-field view/continue/dropoff statistics from visitor session
//! telemetry. Read-only and recomputed on every call; safe to run
//! concurrently with saves and with itself.
//!
//! # Example
//!
//! ```rust,ignore
//! use formflow_analytics::funnel;
//!
//! let report = funnel::for_form(&form);
//! for step in &report.fields {
//!     println!("{}: {:?}% continue", step.title, step.continue_rate);
//! }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod funnel;
pub mod report;

pub use funnel::{compute, for_form};
pub use report::{percent, FieldFunnel, FunnelReport};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
