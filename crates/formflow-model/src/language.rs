//! Form language
//!
//! Editors send either an ISO code or an English language name; both are
//! folded into [`Language`]. Anything unrecognised becomes English.

use serde::{Deserialize, Deserializer, Serialize};
use std::str::FromStr;

/// Supported form languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// English
    #[default]
    En,
    /// French
    Fr,
    /// Spanish
    Es,
    /// Italian
    It,
    /// German
    De,
}

impl Language {
    /// Normalize a free-form language tag, falling back to English
    #[must_use]
    pub fn normalize(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "fr" | "french" => Self::Fr,
            "es" | "spanish" => Self::Es,
            "it" | "italian" => Self::It,
            "de" | "german" => Self::De,
            _ => Self::En,
        }
    }

    /// ISO 639-1 code
    #[inline]
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Fr => "fr",
            Self::Es => "es",
            Self::It => "it",
            Self::De => "de",
        }
    }
}

impl FromStr for Language {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::normalize(s))
    }
}

impl<'de> Deserialize<'de> for Language {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::normalize(&raw))
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_names_and_codes() {
        assert_eq!(Language::normalize("spanish"), Language::Es);
        assert_eq!(Language::normalize("FRENCH"), Language::Fr);
        assert_eq!(Language::normalize("de"), Language::De);
        assert_eq!(Language::normalize(" italian "), Language::It);
    }

    #[test]
    fn unknown_falls_back_to_english() {
        assert_eq!(Language::normalize("klingon"), Language::En);
        assert_eq!(Language::normalize(""), Language::En);
    }

    #[test]
    fn decoding_normalizes() {
        let lang: Language = serde_json::from_str("\"german\"").unwrap();
        assert_eq!(lang, Language::De);
    }

    #[test]
    fn serializes_as_code() {
        assert_eq!(serde_json::to_string(&Language::It).unwrap(), "\"it\"");
    }
}
