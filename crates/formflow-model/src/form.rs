//! Form document
//!
//! A form embeds its ordered field list and visitor telemetry, and references
//! its submissions by id. Field order defines the funnel sequence.
//!
//! Start-page buttons and design colours are carried as plain records with
//! the product defaults and no validation.

use crate::field::Field;
use crate::ids::{AdminId, FieldId, FormId, SubmissionId};
use crate::language::Language;
use crate::visitor::VisitorSession;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Start-page call-to-action button
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Button {
    /// Link target
    #[serde(default)]
    pub url: Option<String>,
    /// Action name
    #[serde(default)]
    pub action: Option<String>,
    /// Label
    #[serde(default)]
    pub text: Option<String>,
    /// Background colour
    #[serde(default = "defaults::button_bg")]
    pub bg_color: String,
    /// Text colour
    #[serde(default = "defaults::white")]
    pub color: String,
}

impl Default for Button {
    fn default() -> Self {
        Self {
            url: None,
            action: None,
            text: None,
            bg_color: defaults::button_bg(),
            color: defaults::white(),
        }
    }
}

/// Welcome screen shown before the first field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartPage {
    /// Whether the start page is shown
    #[serde(default)]
    pub show_start: bool,
    /// Heading
    #[serde(default = "defaults::intro_title")]
    pub intro_title: String,
    /// Body text
    #[serde(default)]
    pub intro_paragraph: Option<String>,
    /// Start button label
    #[serde(default = "defaults::intro_button_text")]
    pub intro_button_text: String,
    /// Extra buttons
    #[serde(default)]
    pub buttons: Vec<Button>,
}

impl Default for StartPage {
    fn default() -> Self {
        Self {
            show_start: false,
            intro_title: defaults::intro_title(),
            intro_paragraph: None,
            intro_button_text: defaults::intro_button_text(),
            buttons: Vec::new(),
        }
    }
}

/// Form colour scheme
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct DesignColors {
    #[serde(default = "defaults::white_short")]
    pub background_color: String,
    #[serde(default = "defaults::dark")]
    pub question_color: String,
    #[serde(default = "defaults::dark")]
    pub answer_color: String,
    #[serde(default = "defaults::white_short")]
    pub button_color: String,
    #[serde(default = "defaults::dark")]
    pub button_text_color: String,
}

impl Default for DesignColors {
    fn default() -> Self {
        Self {
            background_color: defaults::white_short(),
            question_color: defaults::dark(),
            answer_color: defaults::dark(),
            button_color: defaults::white_short(),
            button_text_color: defaults::dark(),
        }
    }
}

/// Form look and feel
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Design {
    /// Colour scheme
    #[serde(default)]
    pub colors: DesignColors,
    /// Font family
    #[serde(default)]
    pub font: Option<String>,
}

/// Embedded analytics state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormAnalytics {
    /// Google Analytics tracking code
    #[serde(default)]
    pub ga_code: Option<String>,
    /// One record per visit
    #[serde(default)]
    pub visitors: Vec<VisitorSession>,
}

/// A form document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Form {
    /// Form identity
    pub id: FormId,
    /// Title
    pub title: String,
    /// Display language
    #[serde(default)]
    pub language: Language,
    /// Owning admin
    pub admin: AdminId,
    /// Ordered fields; tombstoned fields sit at the head
    #[serde(default)]
    pub form_fields: Vec<Field>,
    /// Submission references
    #[serde(default)]
    pub submissions: Vec<SubmissionId>,
    /// Visitor telemetry
    #[serde(default)]
    pub analytics: FormAnalytics,
    /// Welcome screen
    #[serde(default)]
    pub start_page: StartPage,
    /// Hide the branding footer
    #[serde(default)]
    pub hide_footer: bool,
    /// Accepting responses
    #[serde(default)]
    pub is_live: bool,
    /// Look and feel
    #[serde(default)]
    pub design: Design,
    /// Creation time, set on first save
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
    /// Last save time
    #[serde(default)]
    pub last_modified: Option<DateTime<Utc>>,
    /// Store revision, bumped on every write including telemetry
    #[serde(default)]
    pub version: u64,
    /// Editor revision, bumped only when an editor saves the form
    #[serde(default)]
    pub revision: u64,
}

impl Form {
    /// Create new unsaved form
    #[inline]
    #[must_use]
    pub fn new(title: impl Into<String>, admin: AdminId) -> Self {
        Self {
            id: FormId::new(),
            title: title.into(),
            language: Language::En,
            admin,
            form_fields: Vec::new(),
            submissions: Vec::new(),
            analytics: FormAnalytics::default(),
            start_page: StartPage::default(),
            hide_footer: false,
            is_live: false,
            design: Design::default(),
            created: None,
            last_modified: None,
            version: 0,
            revision: 0,
        }
    }

    /// With fields
    #[inline]
    #[must_use]
    pub fn with_fields(mut self, fields: Vec<Field>) -> Self {
        self.form_fields = fields;
        self
    }

    /// With language
    #[inline]
    #[must_use]
    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    /// Field by identity
    #[inline]
    #[must_use]
    pub fn field(&self, id: FieldId) -> Option<&Field> {
        self.form_fields.iter().find(|f| f.id == id)
    }

    /// Ids of the fields in list order
    #[inline]
    #[must_use]
    pub fn field_ids(&self) -> Vec<FieldId> {
        self.form_fields.iter().map(|f| f.id).collect()
    }

    /// Fields still on the editing surface
    pub fn active_fields(&self) -> impl Iterator<Item = &Field> {
        self.form_fields.iter().filter(|f| f.is_active())
    }

    /// Visitor sessions
    #[inline]
    #[must_use]
    pub fn visitors(&self) -> &[VisitorSession] {
        &self.analytics.visitors
    }
}

mod defaults {
    pub(super) fn button_bg() -> String {
        "#5bc0de".to_string()
    }

    pub(super) fn white() -> String {
        "#ffffff".to_string()
    }

    pub(super) fn white_short() -> String {
        "#fff".to_string()
    }

    pub(super) fn dark() -> String {
        "#333".to_string()
    }

    pub(super) fn intro_title() -> String {
        "Welcome to Form".to_string()
    }

    pub(super) fn intro_button_text() -> String {
        "Start".to_string()
    }
}
