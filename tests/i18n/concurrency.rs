//! Store invariants under a multi-threaded runtime.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use langsync::i18n::{
    Dictionary, DictionarySource, KeyValueStorage, Language, MemoryStorage, RefreshOutcome,
    TranslationCache, TranslationError, TranslationStore, timestamp_key,
};
use serde_json::json;

use crate::support::dict;

/// Source recording the highest number of fetches running at once.
#[derive(Default)]
struct OverlapSource {
    running: AtomicUsize,
    max_running: Arc<AtomicUsize>,
}

impl DictionarySource for OverlapSource {
    async fn fetch_dictionary(&self, _language: Language) -> Result<Dictionary, TranslationError> {
        let now_running = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_running.fetch_max(now_running, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.running.fetch_sub(1, Ordering::SeqCst);
        Ok(dict(json!({ "k": "v" })))
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn refreshes_for_one_language_never_overlap() {
    let source = OverlapSource::default();
    let max_running = Arc::clone(&source.max_running);
    let store = TranslationStore::new(TranslationCache::new(MemoryStorage::new()), source);

    let workers: Vec<_> = (0..8)
        .map(|_| {
            let store = store.clone();
            tokio::spawn(async move {
                for _ in 0..300 {
                    let _ = store.refresh(Language::Vi).await;
                }
            })
        })
        .collect();
    for worker in workers {
        worker.await.expect("worker joins");
    }

    assert_eq!(max_running.load(Ordering::SeqCst), 1);
    assert!(store.stats().refreshes > 0);
}

/// Source answering from a queue; an exhausted queue fails like a dropped connection.
struct QueuedSource {
    replies: Mutex<VecDeque<Dictionary>>,
    delay: Duration,
}

impl DictionarySource for QueuedSource {
    async fn fetch_dictionary(&self, _language: Language) -> Result<Dictionary, TranslationError> {
        tokio::time::sleep(self.delay).await;
        let next = self.replies.lock().expect("replies lock").pop_front();
        next.ok_or_else(|| TranslationError::network("http://backend.test", "connection reset"))
    }
}

/// Storage whose next timestamp read for English pauses after reading the value.
#[derive(Default)]
struct SlowTimestampStorage {
    inner: MemoryStorage,
    stall_next: AtomicBool,
}

impl KeyValueStorage for SlowTimestampStorage {
    fn get(&self, key: &str) -> Result<Option<String>, TranslationError> {
        let value = self.inner.get(key)?;
        if key == timestamp_key(Language::En) && self.stall_next.swap(false, Ordering::SeqCst) {
            std::thread::sleep(Duration::from_millis(300));
        }
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), TranslationError> {
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), TranslationError> {
        self.inner.remove(key)
    }

    fn keys(&self) -> Result<Vec<String>, TranslationError> {
        self.inner.keys()
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn switch_during_refresh_keeps_refreshed_dictionary() {
    let fetched = dict(json!({ "nav": { "about": "About" } }));
    let source = QueuedSource {
        replies: Mutex::new(VecDeque::from([fetched.clone()])),
        delay: Duration::from_millis(50),
    };
    let store = TranslationStore::new(
        TranslationCache::new(SlowTimestampStorage::default()),
        source,
    );
    let notified = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&notified);
    store.on_dictionary_updated(move |_, _| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let _ = store.get_active_dictionary(Language::En);
    store
        .cache()
        .storage()
        .stall_next
        .store(true, Ordering::SeqCst);

    let first = store.spawn_refresh(Language::En);
    let second = store.switch_language(Language::En);

    assert_eq!(first.await.expect("refresh joins"), RefreshOutcome::Updated);
    let _ = second.await.expect("refresh joins");

    assert_eq!(notified.load(Ordering::SeqCst), 1);
    assert_eq!(store.cache().read(Language::En), Some(fetched));
    assert_eq!(
        store.get_active_dictionary(Language::En).lookup("nav.about"),
        Some("About".to_string())
    );
}
