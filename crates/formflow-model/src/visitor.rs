//! Visitor telemetry
//!
//! One [`VisitorSession`] per form visit. The record is created on the first
//! page view and overwritten as the visitor moves through the form; its final
//! state is the furthest point the visitor reached.

use crate::ids::{FieldId, SessionId};
use crate::language::Language;
use serde::{Deserialize, Serialize};

/// Visitor device class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    /// Desktop browser
    Desktop,
    /// Phone
    Phone,
    /// Tablet
    Tablet,
    /// Anything else
    #[default]
    Other,
}

/// A single visitor's progress through a form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisitorSession {
    /// Session identity
    pub id: SessionId,
    /// Last field the visitor interacted with
    #[serde(default)]
    pub last_active_field: Option<FieldId>,
    /// Whether the visitor submitted the form
    #[serde(default)]
    pub is_submitted: bool,
    /// HTTP referrer
    #[serde(default)]
    pub referrer: Option<String>,
    /// Seconds spent on the form
    #[serde(default)]
    pub time_elapsed: Option<f64>,
    /// Visitor language
    #[serde(default)]
    pub language: Option<Language>,
    /// Visitor address
    #[serde(default)]
    pub ip_addr: String,
    /// Device class
    #[serde(default)]
    pub device_type: DeviceType,
    /// Raw user agent
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl VisitorSession {
    /// Start a new session with no progress
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: SessionId::new(),
            last_active_field: None,
            is_submitted: false,
            referrer: None,
            time_elapsed: None,
            language: None,
            ip_addr: String::new(),
            device_type: DeviceType::Other,
            user_agent: None,
        }
    }

    /// Session that stalled at `field`
    #[inline]
    #[must_use]
    pub fn at(field: FieldId) -> Self {
        Self::new().reached(field)
    }

    /// Record progress to `field`
    #[inline]
    #[must_use]
    pub fn reached(mut self, field: FieldId) -> Self {
        self.last_active_field = Some(field);
        self
    }

    /// Mark the session as submitted
    #[inline]
    #[must_use]
    pub fn submitted(mut self) -> Self {
        self.is_submitted = true;
        self
    }

    /// With device class
    #[inline]
    #[must_use]
    pub fn with_device(mut self, device_type: DeviceType) -> Self {
        self.device_type = device_type;
        self
    }
}

impl Default for VisitorSession {
    fn default() -> Self {
        Self::new()
    }
}
