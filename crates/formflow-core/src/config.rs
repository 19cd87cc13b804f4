//! Form service configuration

use crate::error::FormError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// What to do with the rest of a rewrite batch after a submission fails
///
/// Either way the overall save aborts with the first failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewritePolicy {
    /// Stop at the first failed submission
    #[default]
    FailFast,
    /// Attempt every submission, then report the first failure
    ContinueThenFail,
}

/// Form service configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormServiceConfig {
    /// Batch behaviour when a submission rewrite fails
    pub rewrite_policy: RewritePolicy,
    /// Serialize load/diff/rewrite/save per form
    pub serialize_saves: bool,
    /// Maintain `created` / `last_modified`
    pub touch_timestamps: bool,
}

impl FormServiceConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With rewrite policy
    #[inline]
    #[must_use]
    pub fn with_rewrite_policy(mut self, policy: RewritePolicy) -> Self {
        self.rewrite_policy = policy;
        self
    }

    /// With per-form save serialization
    #[inline]
    #[must_use]
    pub fn with_serialized_saves(mut self, enabled: bool) -> Self {
        self.serialize_saves = enabled;
        self
    }

    /// With timestamp bookkeeping
    #[inline]
    #[must_use]
    pub fn with_timestamps(mut self, enabled: bool) -> Self {
        self.touch_timestamps = enabled;
        self
    }

    /// Parse TOML; missing keys take their defaults
    ///
    /// # Errors
    /// - `FormError::Config` if the TOML is malformed or a value is unknown
    pub fn from_toml_str(raw: &str) -> Result<Self, FormError> {
        toml::from_str(raw).map_err(|e| FormError::Config(e.to_string()))
    }

    /// Load TOML from a file
    ///
    /// # Errors
    /// - `FormError::Config` if the file cannot be read or parsed
    pub fn load(path: impl AsRef<Path>) -> Result<Self, FormError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| FormError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&raw)
    }
}

impl Default for FormServiceConfig {
    fn default() -> Self {
        Self {
            rewrite_policy: RewritePolicy::FailFast,
            serialize_saves: true,
            touch_timestamps: true,
        }
    }
}
