//! Time-boxed persisted snapshots of fetched dictionaries.
//!
//! Each language owns two storage keys: `i18n_<lang>_data` (the dictionary as
//! JSON) and `i18n_<lang>_timestamp` (capture time, epoch milliseconds). An entry
//! older than the TTL reads as absent but is left in place until the next
//! successful fetch overwrites it.

use std::time::Duration;

use chrono::{TimeZone, Utc};
use tracing::{debug, info, warn};

use crate::i18n::dictionary::Dictionary;
use crate::i18n::language::Language;
use crate::i18n::storage::KeyValueStorage;

/// Default freshness window: one hour.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(3600);

/// [`DEFAULT_CACHE_TTL`] in milliseconds.
const DEFAULT_TTL_MS: i64 = 3_600_000;

/// Key prefixes removed by [`CacheScope::All`].
const CLEARABLE_PREFIXES: [&str; 2] = ["i18n_", "i18next"];

/// Storage key for a language's dictionary blob.
#[must_use]
pub fn data_key(language: Language) -> String {
    format!("i18n_{}_data", language.code())
}

/// Storage key for a language's capture timestamp.
#[must_use]
pub fn timestamp_key(language: Language) -> String {
    format!("i18n_{}_timestamp", language.code())
}

/// Current wall-clock time in epoch milliseconds.
#[must_use]
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Which entries [`TranslationCache::clear`] removes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheScope {
    /// Data and timestamp of a single language.
    Language(Language),
    /// Every `i18n_*` and `i18next*` key, including the persisted language choice.
    All,
}

/// Diagnostic view of one language's cache entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStatus {
    /// Language inspected.
    pub language: Language,
    /// Both keys are present.
    pub exists: bool,
    /// Capture time in RFC 3339, when the timestamp parses.
    pub saved_at: Option<String>,
    /// Age rounded to whole minutes.
    pub age_minutes: Option<i64>,
    /// Entry would be used by a read right now.
    pub fresh: bool,
    /// Top-level key count of the stored dictionary.
    pub key_count: Option<usize>,
    /// Why the stored blob could not be parsed.
    pub error: Option<String>,
}

/// Cache layer over a [`KeyValueStorage`].
#[derive(Debug)]
pub struct TranslationCache<S> {
    storage: S,
    ttl_ms: i64,
}

impl<S: KeyValueStorage> TranslationCache<S> {
    /// Cache with the default one-hour window.
    #[must_use]
    pub const fn new(storage: S) -> Self {
        Self {
            storage,
            ttl_ms: DEFAULT_TTL_MS,
        }
    }

    /// Replace the freshness window.
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        self
    }

    /// Freshness window in milliseconds.
    #[must_use]
    pub const fn ttl_ms(&self) -> i64 {
        self.ttl_ms
    }

    /// Underlying storage, shared with the language preference.
    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    /// What: Read the cached dictionary for `language` if it is still fresh.
    #[must_use]
    pub fn read(&self, language: Language) -> Option<Dictionary> {
        self.read_at(language, now_ms())
    }

    /// What: Read the cached dictionary as of `now` (epoch milliseconds).
    ///
    /// Output:
    /// - `Some(Dictionary)` when both keys exist and `now - timestamp < ttl`
    /// - `None` for missing, stale, unreadable or corrupt entries
    ///
    /// Details:
    /// - Stale entries are not deleted
    #[must_use]
    pub fn read_at(&self, language: Language, now: i64) -> Option<Dictionary> {
        let saved_at = self.timestamp(language)?;
        let age = now.saturating_sub(saved_at);
        if age >= self.ttl_ms {
            debug!(language = %language, age_ms = age, "cache entry expired");
            return None;
        }
        let key = data_key(language);
        let raw = match self.storage.get(&key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(
                    language = %language,
                    error = %e,
                    kind = e.kind(),
                    "failed to read cache data"
                );
                return None;
            }
        };
        match Dictionary::from_json_str(&raw, &key) {
            Ok(dict) => {
                debug!(language = %language, age_ms = age, keys = dict.len(), "cache hit");
                Some(dict)
            }
            Err(e) => {
                warn!(
                    language = %language,
                    error = %e,
                    kind = e.kind(),
                    "cached dictionary is corrupt"
                );
                None
            }
        }
    }

    /// What: Capture timestamp of `language`'s entry, if present and numeric.
    #[must_use]
    pub fn timestamp(&self, language: Language) -> Option<i64> {
        let key = timestamp_key(language);
        match self.storage.get(&key) {
            Ok(Some(raw)) => {
                let parsed = raw.trim().parse::<i64>().ok();
                if parsed.is_none() {
                    warn!(language = %language, value = %raw, "cache timestamp is not a number");
                }
                parsed
            }
            Ok(None) => None,
            Err(e) => {
                warn!(
                    language = %language,
                    error = %e,
                    kind = e.kind(),
                    "failed to read cache timestamp"
                );
                None
            }
        }
    }

    /// What: `true` when `language` has an entry younger than the TTL as of `now`.
    #[must_use]
    pub fn is_fresh_at(&self, language: Language, now: i64) -> bool {
        self.timestamp(language)
            .is_some_and(|saved_at| now.saturating_sub(saved_at) < self.ttl_ms)
    }

    /// What: Store `dictionary` for `language`, stamped with the current time.
    pub fn write(&self, language: Language, dictionary: &Dictionary) -> bool {
        self.write_at(language, dictionary, now_ms())
    }

    /// What: Store `dictionary` for `language`, stamped with `now`.
    ///
    /// Output:
    /// - `true` when both keys were persisted
    ///
    /// Details:
    /// - Overwrites any previous entry
    /// - Failures (quota, disabled storage) are logged and reported as `false`
    /// - If only the timestamp write fails, the entry keeps expiring on its previous schedule
    pub fn write_at(&self, language: Language, dictionary: &Dictionary, now: i64) -> bool {
        let result = self
            .storage
            .set(&data_key(language), &dictionary.to_json_string())
            .and_then(|()| self.storage.set(&timestamp_key(language), &now.to_string()));
        match result {
            Ok(()) => {
                debug!(language = %language, keys = dictionary.len(), "cache entry written");
                true
            }
            Err(e) => {
                warn!(
                    language = %language,
                    error = %e,
                    kind = e.kind(),
                    "failed to write cache entry"
                );
                false
            }
        }
    }

    /// What: Remove cache entries immediately.
    ///
    /// Output:
    /// - Number of storage keys removed
    ///
    /// Details:
    /// - `CacheScope::All` also forgets the persisted language choice
    /// - Individual removal failures are logged and skipped
    pub fn clear(&self, scope: CacheScope) -> usize {
        let keys: Vec<String> = match scope {
            CacheScope::Language(language) => vec![timestamp_key(language), data_key(language)],
            CacheScope::All => match self.storage.keys() {
                Ok(keys) => keys
                    .into_iter()
                    .filter(|k| CLEARABLE_PREFIXES.iter().any(|p| k.starts_with(p)))
                    .collect(),
                Err(e) => {
                    warn!(error = %e, kind = e.kind(), "failed to list cache keys");
                    return 0;
                }
            },
        };

        let mut removed = 0;
        for key in &keys {
            match self.storage.get(key) {
                Ok(Some(_)) => {}
                Ok(None) => continue,
                Err(e) => {
                    warn!(key = %key, error = %e, "failed to inspect cache key");
                    continue;
                }
            }
            match self.storage.remove(key) {
                Ok(()) => removed += 1,
                Err(e) => {
                    warn!(
                        key = %key,
                        error = %e,
                        kind = e.kind(),
                        "failed to clear cache key"
                    );
                }
            }
        }
        info!(scope = ?scope, removed, "translation cache cleared");
        removed
    }

    /// What: Describe `language`'s cache entry as of now.
    #[must_use]
    pub fn status(&self, language: Language) -> CacheStatus {
        self.status_at(language, now_ms())
    }

    /// What: Describe `language`'s cache entry as of `now`.
    #[must_use]
    pub fn status_at(&self, language: Language, now: i64) -> CacheStatus {
        let mut status = CacheStatus {
            language,
            exists: false,
            saved_at: None,
            age_minutes: None,
            fresh: false,
            key_count: None,
            error: None,
        };
        let data = self.storage.get(&data_key(language)).ok().flatten();
        let saved_at = self.timestamp(language);
        let (Some(data), Some(saved_at)) = (data, saved_at) else {
            return status;
        };
        status.exists = true;
        let age = now.saturating_sub(saved_at);
        status.age_minutes = Some(age.saturating_add(30_000).div_euclid(60_000));
        status.saved_at = Utc
            .timestamp_millis_opt(saved_at)
            .single()
            .map(|dt| dt.to_rfc3339());
        match Dictionary::from_json_str(&data, &data_key(language)) {
            Ok(dict) => {
                status.key_count = Some(dict.len());
                status.fresh = age < self.ttl_ms;
            }
            Err(e) => status.error = Some(e.to_string()),
        }
        status
    }
}
