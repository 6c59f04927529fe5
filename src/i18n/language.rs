//! Supported language codes, system detection and the persisted language choice.

use std::env;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::i18n::storage::KeyValueStorage;

/// Storage key holding the last language chosen by the user.
pub const LANGUAGE_PREFERENCE_KEY: &str = "i18nextLng";

/// Closed set of languages the site is published in.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// Vietnamese, the site default.
    #[default]
    Vi,
    /// English.
    En,
}

impl Language {
    /// Every supported language, in display order.
    pub const ALL: [Self; 2] = [Self::Vi, Self::En];

    /// Two-letter code used in storage keys and API paths.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Vi => "vi",
            Self::En => "en",
        }
    }

    /// What: Parse a loosely formatted locale tag into a supported language.
    ///
    /// Inputs:
    /// - `tag`: Value such as `"en"`, `"EN"`, `"en-US"`, `"vi_VN.UTF-8"`
    ///
    /// Output:
    /// - `Some(Language)` when the primary subtag is supported, `None` otherwise
    ///
    /// Details:
    /// - Drops encoding suffixes (`.UTF-8`) and region/script subtags
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        let primary = primary_subtag(tag)?;
        match primary.as_str() {
            "vi" => Some(Self::Vi),
            "en" => Some(Self::En),
            _ => None,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_tag(s).ok_or_else(|| {
            format!("unsupported language '{s}'. Expected one of: vi, en")
        })
    }
}

/// What: Reduce a locale string to its lowercase primary language subtag.
///
/// Inputs:
/// - `locale_str`: Locale like `"de_DE.UTF-8"`, `"en-US"` or `"vi"`
///
/// Output:
/// - `Some("de")` style subtag, or `None` for empty/garbage input
fn primary_subtag(locale_str: &str) -> Option<String> {
    let trimmed = locale_str.trim();
    if trimmed.is_empty() {
        return None;
    }
    // "de_DE.UTF-8" -> "de_DE" -> "de"
    let locale_part = trimmed.split('.').next()?;
    let primary = locale_part.split(['_', '-']).next()?;
    if primary.is_empty() || !primary.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    Some(primary.to_ascii_lowercase())
}

/// What: Detect a supported language from the process environment.
///
/// Output:
/// - First supported language found in `LC_ALL`, `LC_MESSAGES`, `LANG` (in that order)
///
/// Details:
/// - Unsupported locales (e.g. `de_DE.UTF-8`) are skipped rather than mapped
#[must_use]
pub fn detect_system_language() -> Option<Language> {
    ["LC_ALL", "LC_MESSAGES", "LANG"]
        .iter()
        .filter_map(|var| env::var(var).ok())
        .find_map(|value| Language::from_tag(&value))
}

/// What: Read the persisted language choice.
///
/// Output:
/// - `Some(Language)` when a supported code was stored
/// - `None` when absent, unreadable or unsupported
#[must_use]
pub fn load_preference<S: KeyValueStorage + ?Sized>(storage: &S) -> Option<Language> {
    match storage.get(LANGUAGE_PREFERENCE_KEY) {
        Ok(Some(code)) => {
            let parsed = Language::from_tag(&code);
            if parsed.is_none() {
                tracing::debug!(stored = %code, "ignoring unsupported persisted language");
            }
            parsed
        }
        Ok(None) => None,
        Err(e) => {
            tracing::warn!(error = %e, "failed to read persisted language choice");
            None
        }
    }
}

/// What: Persist the language choice for future process starts.
///
/// Details:
/// - Failure is logged and otherwise ignored; the choice still applies to this run
pub fn save_preference<S: KeyValueStorage + ?Sized>(storage: &S, language: Language) -> bool {
    match storage.set(LANGUAGE_PREFERENCE_KEY, language.code()) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(language = %language, error = %e, "failed to persist language choice");
            false
        }
    }
}

/// What: Resolve the language to activate at startup.
///
/// Inputs:
/// - `storage`: Storage holding the persisted choice
/// - `default_language`: Configured default
///
/// Output:
/// - Persisted choice, else system language, else `default_language`
pub fn resolve_initial_language<S: KeyValueStorage + ?Sized>(
    storage: &S,
    default_language: Language,
) -> Language {
    if let Some(lang) = load_preference(storage) {
        tracing::debug!(language = %lang, "using persisted language choice");
        return lang;
    }
    if let Some(lang) = detect_system_language() {
        tracing::debug!(language = %lang, "using system language");
        return lang;
    }
    default_language
}
