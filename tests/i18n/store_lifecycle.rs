//! Store lifecycle: bootstrap, refresh, listeners, switching and invalidation.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use langsync::i18n::{
    CacheScope, Dictionary, KeyValueStorage, LANGUAGE_PREFERENCE_KEY, Language, MemoryStorage,
    RefreshOutcome, StoreState, TranslationCache, TranslationError, TranslationStore, data_key,
    now_ms, save_preference, timestamp_key,
};
use serde_json::json;

use crate::support::{CountingStorage, Reply, ScriptedSource, dict};

fn fallbacks() -> BTreeMap<Language, Dictionary> {
    let mut map = BTreeMap::new();
    map.insert(
        Language::En,
        dict(json!({
            "footer": { "address": "Hanoi, Vietnam", "phone": "+84 000" },
            "nav": { "home": "Home" }
        })),
    );
    map.insert(Language::Vi, dict(json!({ "nav": { "home": "Trang chủ" } })));
    map
}

fn store_with<S: KeyValueStorage + 'static>(
    storage: S,
    source: ScriptedSource,
) -> TranslationStore<S, ScriptedSource> {
    TranslationStore::with_fallbacks(TranslationCache::new(storage), source, fallbacks())
}

#[tokio::test]
async fn successful_fetch_caches_once_and_notifies_listeners_in_order() {
    let fetched = dict(json!({ "footer": { "address": "Ha Noi, Viet Nam" } }));
    let source = ScriptedSource::new().reply(Language::En, Reply::Ok(fetched));
    let store = store_with(CountingStorage::default(), source);

    let seen: Arc<Mutex<Vec<(&str, Language, Dictionary)>>> = Arc::new(Mutex::new(Vec::new()));
    for name in ["header", "footer"] {
        let seen = Arc::clone(&seen);
        store.on_dictionary_updated(move |lang, dict| {
            seen.lock()
                .expect("seen lock")
                .push((name, lang, dict.clone()));
        });
    }

    assert_eq!(store.refresh(Language::En).await, RefreshOutcome::Updated);

    let expected = dict(json!({
        "footer": { "address": "Ha Noi, Viet Nam", "phone": "+84 000" },
        "nav": { "home": "Home" }
    }));
    assert_eq!(*store.get_active_dictionary(Language::En), expected);
    assert_eq!(store.state(Language::En), StoreState::Synced);

    let storage = store.cache().storage();
    assert_eq!(storage.sets_of(&data_key(Language::En)), 1);
    assert_eq!(storage.sets_of(&timestamp_key(Language::En)), 1);

    let seen = seen.lock().expect("seen lock");
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0].0, "header");
    assert_eq!(seen[1].0, "footer");
    for (_, lang, dict) in seen.iter() {
        assert_eq!(*lang, Language::En);
        assert_eq!(*dict, expected);
    }
}

#[tokio::test]
async fn network_and_decode_failures_leave_dictionary_unchanged() {
    let source = ScriptedSource::new()
        .reply(Language::En, Reply::NetworkError)
        .reply(Language::Vi, Reply::DecodeError);
    let store = store_with(MemoryStorage::new(), source);
    let notified = Arc::new(Mutex::new(0_usize));
    let counter = Arc::clone(&notified);
    store.on_dictionary_updated(move |_, _| *counter.lock().expect("counter lock") += 1);

    let en_before = store.get_active_dictionary(Language::En);
    let vi_before = store.get_active_dictionary(Language::Vi);
    assert_eq!(store.refresh(Language::En).await, RefreshOutcome::Failed);
    assert_eq!(store.refresh(Language::Vi).await, RefreshOutcome::Failed);

    assert_eq!(store.get_active_dictionary(Language::En), en_before);
    assert_eq!(store.get_active_dictionary(Language::Vi), vi_before);
    assert_eq!(store.cache().timestamp(Language::En), None);
    assert_eq!(*notified.lock().expect("counter lock"), 0);
    assert_eq!(store.stats().fetch_failures, 2);
}

#[tokio::test]
async fn cache_written_by_one_store_is_served_by_the_next() {
    let storage = MemoryStorage::new();
    let cache = TranslationCache::new(storage);
    assert!(cache.write(Language::En, &dict(json!({ "nav": { "home": "Start" } }))));

    let store = TranslationStore::with_fallbacks(cache, ScriptedSource::new(), fallbacks());
    assert_eq!(store.t("nav.home"), "Trang chủ");
    assert_eq!(
        store.get_active_dictionary(Language::En).lookup("nav.home"),
        Some("Start".to_string())
    );
    assert_eq!(
        store
            .get_active_dictionary(Language::En)
            .lookup("footer.address"),
        Some("Hanoi, Vietnam".to_string())
    );
}

#[tokio::test]
async fn expired_cache_entry_is_ignored() {
    let cache = TranslationCache::new(MemoryStorage::new());
    let written_at = now_ms() - 3_600_001;
    assert!(cache.write_at(
        Language::En,
        &dict(json!({ "nav": { "home": "Old" } })),
        written_at
    ));
    let store = TranslationStore::with_fallbacks(cache, ScriptedSource::new(), fallbacks());
    assert_eq!(
        store.get_active_dictionary(Language::En).lookup("nav.home"),
        Some("Home".to_string())
    );
    assert_eq!(store.state(Language::En), StoreState::Bootstrapped);
}

#[tokio::test]
async fn empty_fallback_and_cache_yield_empty_dictionary() {
    let store = TranslationStore::with_fallbacks(
        TranslationCache::new(MemoryStorage::new()),
        ScriptedSource::new(),
        BTreeMap::new(),
    );
    let active = store.get_active_dictionary(Language::Vi);
    assert!(active.is_empty());
    assert_eq!(active.to_json_string(), "{}");
    assert_eq!(store.t("footer.address"), "footer.address");
}

#[tokio::test]
async fn bootstrap_uses_persisted_language() {
    let storage = MemoryStorage::new();
    assert!(save_preference(&storage, Language::En));
    let source = ScriptedSource::new().reply(
        Language::En,
        Reply::Ok(dict(json!({ "nav": { "home": "Welcome" } }))),
    );
    let store = store_with(storage, source);

    let handle = store.bootstrap(Language::Vi);
    assert_eq!(store.active_language(), Language::En);
    assert_eq!(store.t("nav.home"), "Home");
    assert_eq!(handle.await.expect("refresh joins"), RefreshOutcome::Updated);
    assert_eq!(store.t("nav.home"), "Welcome");
}

#[tokio::test]
async fn switch_language_persists_choice_and_refreshes() {
    let source = ScriptedSource::new().reply(
        Language::En,
        Reply::Ok(dict(json!({ "nav": { "about": "About" } }))),
    );
    let store = store_with(MemoryStorage::new(), source);
    store.select_language(Language::Vi);

    let handle = store.switch_language(Language::En);
    assert_eq!(store.active_language(), Language::En);
    assert_eq!(store.t("nav.home"), "Home");
    assert_eq!(
        store
            .cache()
            .storage()
            .get(LANGUAGE_PREFERENCE_KEY)
            .expect("memory storage never fails"),
        Some("en".to_string())
    );

    assert_eq!(handle.await.expect("refresh joins"), RefreshOutcome::Updated);
    assert_eq!(store.t("nav.about"), "About");
    assert_eq!(store.t("nav.home"), "Home");
}

#[tokio::test]
async fn concurrent_refreshes_for_one_language_fetch_once() {
    let source = ScriptedSource::new()
        .with_delay(Duration::from_millis(50))
        .reply(Language::Vi, Reply::Ok(dict(json!({ "a": "b" }))));
    let store = store_with(MemoryStorage::new(), source);

    let (first, second) = tokio::join!(store.refresh(Language::Vi), store.refresh(Language::Vi));
    let mut outcomes = [first, second];
    outcomes.sort_by_key(|o| *o == RefreshOutcome::Updated);
    assert_eq!(
        outcomes,
        [RefreshOutcome::AlreadyInFlight, RefreshOutcome::Updated]
    );
    assert_eq!(store.stats().refreshes, 1);
    assert_eq!(store.state(Language::Vi), StoreState::Synced);
}

#[tokio::test]
async fn clear_cache_makes_next_read_absent() {
    let store = store_with(MemoryStorage::new(), ScriptedSource::new());
    let cache = store.cache();
    assert!(cache.write(Language::Vi, &dict(json!({ "x": "1" }))));
    assert!(cache.write(Language::En, &dict(json!({ "x": "2" }))));

    assert_eq!(store.clear_cache(CacheScope::Language(Language::Vi)), 2);
    assert!(cache.read(Language::Vi).is_none());
    assert!(cache.read(Language::En).is_some());

    assert_eq!(store.clear_cache(CacheScope::All), 2);
    assert!(cache.read(Language::En).is_none());
    assert_eq!(store.clear_cache(CacheScope::All), 0);
}

#[tokio::test]
async fn reload_drops_cache_and_refetches() {
    let source = ScriptedSource::new().reply(
        Language::Vi,
        Reply::Ok(dict(json!({ "nav": { "home": "Trang chủ mới" } }))),
    );
    let store = store_with(MemoryStorage::new(), source);
    assert!(
        store
            .cache()
            .write(Language::Vi, &dict(json!({ "nav": { "home": "Cũ" } })))
    );
    assert_eq!(store.t("nav.home"), "Cũ");

    assert_eq!(store.reload(Language::Vi).await, RefreshOutcome::Updated);
    assert_eq!(store.t("nav.home"), "Trang chủ mới");
    assert_eq!(
        store.cache().read(Language::Vi),
        Some(dict(json!({ "nav": { "home": "Trang chủ mới" } })))
    );
}

#[tokio::test]
async fn failed_reload_keeps_serving_previous_text() {
    let store = store_with(MemoryStorage::new(), ScriptedSource::new());
    assert!(
        store
            .cache()
            .write(Language::Vi, &dict(json!({ "nav": { "home": "Cũ" } })))
    );
    assert_eq!(store.t("nav.home"), "Cũ");

    assert_eq!(store.reload(Language::Vi).await, RefreshOutcome::Failed);
    assert_eq!(store.t("nav.home"), "Cũ");
    assert!(store.cache().read(Language::Vi).is_none());
}

#[tokio::test]
async fn check_freshness_only_reloads_missing_or_expired_entries() {
    let source = ScriptedSource::new().reply(Language::Vi, Reply::Ok(dict(json!({ "k": "v" }))));
    let store = store_with(MemoryStorage::new(), source);
    store.select_language(Language::Vi);

    assert_eq!(store.check_freshness().await, Some(RefreshOutcome::Updated));
    assert_eq!(store.check_freshness().await, None);

    assert!(store.cache().write_at(
        Language::Vi,
        &dict(json!({ "k": "old" })),
        now_ms() - 3_600_000
    ));
    assert_eq!(store.check_freshness().await, Some(RefreshOutcome::Updated));
}

#[tokio::test]
async fn force_reload_all_covers_every_language() {
    let source = ScriptedSource::new()
        .reply(Language::Vi, Reply::Ok(dict(json!({ "k": "vi" }))))
        .reply(Language::En, Reply::NetworkError);
    let store = store_with(MemoryStorage::new(), source);

    let outcomes: BTreeMap<Language, RefreshOutcome> =
        store.force_reload_all().await.into_iter().collect();
    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes[&Language::Vi], RefreshOutcome::Updated);
    assert_eq!(outcomes[&Language::En], RefreshOutcome::Failed);
    assert_eq!(store.stats().updates, 1);
}

#[tokio::test]
async fn removed_listener_is_not_called() {
    let source = ScriptedSource::new().reply(Language::Vi, Reply::Ok(dict(json!({ "k": "v" }))));
    let store = store_with(MemoryStorage::new(), source);
    let calls = Arc::new(Mutex::new(0_usize));
    let counter = Arc::clone(&calls);
    let id = store.on_dictionary_updated(move |_, _| *counter.lock().expect("calls lock") += 1);
    assert!(store.remove_listener(id));

    assert_eq!(store.refresh(Language::Vi).await, RefreshOutcome::Updated);
    assert_eq!(*calls.lock().expect("calls lock"), 0);
}

#[tokio::test]
async fn retrying_after_failure_recovers() {
    let source = ScriptedSource::new();
    let store = store_with(MemoryStorage::new(), source);
    assert_eq!(store.refresh(Language::En).await, RefreshOutcome::Failed);
    assert_eq!(store.state(Language::En), StoreState::Bootstrapped);
    assert_eq!(store.spawn_refresh(Language::En).await.expect("joins"), RefreshOutcome::Failed);
    assert_eq!(store.stats().refreshes, 2);
}

/// Storage that rejects every write, like a full disk.
#[derive(Default)]
struct FullStorage {
    inner: MemoryStorage,
}

impl KeyValueStorage for FullStorage {
    fn get(&self, key: &str) -> Result<Option<String>, TranslationError> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, _value: &str) -> Result<(), TranslationError> {
        Err(TranslationError::storage(key, "no space left on device"))
    }

    fn remove(&self, key: &str) -> Result<(), TranslationError> {
        self.inner.remove(key)
    }

    fn keys(&self) -> Result<Vec<String>, TranslationError> {
        self.inner.keys()
    }
}

#[tokio::test]
async fn failed_cache_write_still_applies_and_announces_fetch() {
    let source = ScriptedSource::new().reply(
        Language::En,
        Reply::Ok(dict(json!({ "nav": { "about": "About" } }))),
    );
    let store = store_with(FullStorage::default(), source);
    let notified = Arc::new(Mutex::new(0_usize));
    let counter = Arc::clone(&notified);
    store.on_dictionary_updated(move |_, _| *counter.lock().expect("counter lock") += 1);

    assert_eq!(store.refresh(Language::En).await, RefreshOutcome::Updated);

    assert_eq!(
        store.get_active_dictionary(Language::En).lookup("nav.about"),
        Some("About".to_string())
    );
    assert_eq!(store.state(Language::En), StoreState::Synced);
    assert_eq!(*notified.lock().expect("counter lock"), 1);
    assert_eq!(store.stats().storage_failures, 1);
    assert_eq!(store.stats().updates, 1);
    assert!(store.cache().read(Language::En).is_none());
}
