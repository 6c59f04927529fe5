//! Internationalization (i18n) module for langsync.
//!
//! This module keeps one active dictionary per language and keeps it current
//! without ever blocking a reader on the network.
//!
//! # Overview
//!
//! - **Fallback**: Dictionaries bundled at build time from `locales/{vi,en}.json`
//! - **Cache**: The last successfully fetched dictionary per language, persisted
//!   under `i18n_<lang>_data` / `i18n_<lang>_timestamp` and trusted for one hour
//! - **Merge**: Right-biased deep merge of fallback and cache (or fresh fetch)
//! - **Fetch**: `GET /api/language-contents/{lang}/{namespace}` on the backend
//! - **Store**: Ties the above together, refreshes in the background and notifies
//!   subscribers when new text becomes active
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use langsync::i18n::{
//!     HttpDictionarySource, Language, MemoryStorage, TranslationCache, TranslationStore,
//! };
//!
//! # async fn demo() -> Result<(), langsync::i18n::TranslationError> {
//! let source = HttpDictionarySource::new(
//!     "http://localhost:5000",
//!     "translation",
//!     Duration::from_secs(15),
//!     Duration::from_secs(30),
//! )?;
//! let store = TranslationStore::new(TranslationCache::new(MemoryStorage::new()), source);
//! store.on_dictionary_updated(|lang, dict| println!("{lang}: {} keys", dict.len()));
//! let refresh = store.bootstrap(Language::Vi);
//! println!("{}", store.t("footer.address")); // fallback or cached text right away
//! let _ = refresh.await;
//! # Ok(())
//! # }
//! ```
//!
//! # Error Handling
//!
//! - Network, decode and storage failures are logged and counted, never surfaced
//! - Missing translation keys return the key itself

mod cache;
mod dictionary;
mod error;
mod fallback;
mod fetch;
mod language;
mod merge;
mod storage;
mod store;

pub use cache::{
    CacheScope, CacheStatus, DEFAULT_CACHE_TTL, TranslationCache, data_key, now_ms, timestamp_key,
};
pub use dictionary::{Dictionary, TranslationMap, translate, translate_with};
pub use error::TranslationError;
pub use fallback::bundled;
pub use fetch::{DictionarySource, HttpDictionarySource};
pub use language::{
    LANGUAGE_PREFERENCE_KEY, Language, detect_system_language, load_preference,
    resolve_initial_language, save_preference,
};
pub use merge::deep_merge;
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage};
pub use store::{ListenerId, RefreshOutcome, StoreState, StoreStats, TranslationStore};
