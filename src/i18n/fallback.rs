//! Fallback dictionaries compiled into the binary.

use std::sync::LazyLock;

use crate::i18n::dictionary::Dictionary;
use crate::i18n::language::Language;

/// Raw Vietnamese fallback, embedded at build time.
const VI_JSON: &str = include_str!("../../locales/vi.json");
/// Raw English fallback, embedded at build time.
const EN_JSON: &str = include_str!("../../locales/en.json");

/// Parsed Vietnamese fallback.
static VI: LazyLock<Dictionary> = LazyLock::new(|| parse_bundled(Language::Vi, VI_JSON));
/// Parsed English fallback.
static EN: LazyLock<Dictionary> = LazyLock::new(|| parse_bundled(Language::En, EN_JSON));

/// What: Parse an embedded locale file.
///
/// Details:
/// - A broken bundle is logged and replaced by an empty dictionary so lookups
///   still degrade to returning the key
fn parse_bundled(language: Language, json: &str) -> Dictionary {
    Dictionary::from_json_str(json, &format!("locales/{}.json", language.code())).unwrap_or_else(
        |e| {
            tracing::error!(
                language = %language,
                error = %e,
                "bundled fallback dictionary is invalid"
            );
            Dictionary::new()
        },
    )
}

/// What: Bundled fallback dictionary for `language`.
///
/// Output:
/// - Shared, immutable dictionary; always available without I/O
#[must_use]
pub fn bundled(language: Language) -> &'static Dictionary {
    match language {
        Language::Vi => &*VI,
        Language::En => &*EN,
    }
}
