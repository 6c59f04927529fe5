//! Translation store: the active dictionary per language and its refresh lifecycle.
//!
//! Lifecycle per language:
//!
//! ```text
//! Uninitialized -> Bootstrapped (fallback only) -> Synced (fallback + cache/fetch)
//!                        \______________________/      |
//!                                   Refreshing <-------+
//! ```
//!
//! Readers never wait on the network: [`TranslationStore::get_active_dictionary`]
//! answers from the fallback merged with whatever fresh cache entry exists, while
//! a background refresh fetches the authoritative dictionary, writes it to the
//! cache, merges it over the fallback and notifies listeners.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::i18n::cache::{CacheScope, TranslationCache, now_ms};
use crate::i18n::dictionary::{self, Dictionary};
use crate::i18n::fallback;
use crate::i18n::fetch::DictionarySource;
use crate::i18n::language::{self, Language};
use crate::i18n::merge::deep_merge;
use crate::i18n::storage::KeyValueStorage;

/// Handle returned by [`TranslationStore::on_dictionary_updated`].
pub type ListenerId = u64;

/// Callback receiving the language and its newly merged dictionary.
type Listener = Arc<dyn Fn(Language, &Dictionary) + Send + Sync>;

/// Lifecycle state of one language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreState {
    /// Nothing loaded yet.
    Uninitialized,
    /// Serving the fallback dictionary alone.
    Bootstrapped,
    /// Serving fallback merged with a cached or fetched dictionary.
    Synced,
    /// A fetch is in flight; the previous dictionary is still served.
    Refreshing,
}

/// Result of one refresh attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// A non-empty dictionary was fetched, cached, merged and announced.
    Updated,
    /// The backend answered with an empty dictionary; nothing changed.
    Empty,
    /// Network or decode failure; nothing changed.
    Failed,
    /// Another refresh for the same language was already running.
    AlreadyInFlight,
}

/// Point-in-time copy of [`TranslationStore`] counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    /// Refreshes that actually started a fetch.
    pub refreshes: u64,
    /// Refreshes that replaced the active dictionary.
    pub updates: u64,
    /// Fetches that failed with a network or decode error.
    pub fetch_failures: u64,
    /// Fetches that returned an empty dictionary.
    pub empty_fetches: u64,
    /// Refresh requests dropped because one was already in flight.
    pub skipped: u64,
    /// Cache or preference writes that could not be persisted.
    pub storage_failures: u64,
}

/// Atomic backing for [`StoreStats`].
#[derive(Debug, Default)]
struct Counters {
    refreshes: AtomicU64,
    updates: AtomicU64,
    fetch_failures: AtomicU64,
    empty_fetches: AtomicU64,
    skipped: AtomicU64,
    storage_failures: AtomicU64,
}

impl Counters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> StoreStats {
        StoreStats {
            refreshes: self.refreshes.load(Ordering::Relaxed),
            updates: self.updates.load(Ordering::Relaxed),
            fetch_failures: self.fetch_failures.load(Ordering::Relaxed),
            empty_fetches: self.empty_fetches.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            storage_failures: self.storage_failures.load(Ordering::Relaxed),
        }
    }
}

/// Per-language state.
struct Slot {
    /// `Bootstrapped` or `Synced`; `Refreshing` is derived from `in_flight`.
    settled: StoreState,
    active: Arc<Dictionary>,
    in_flight: bool,
}

/// Mutable store state, guarded by one mutex.
struct State {
    active_language: Language,
    slots: BTreeMap<Language, Slot>,
}

/// Shared internals behind every [`TranslationStore`] clone.
struct Inner<S, F> {
    cache: TranslationCache<S>,
    source: F,
    fallbacks: BTreeMap<Language, Dictionary>,
    state: Mutex<State>,
    listeners: Mutex<Vec<(ListenerId, Listener)>>,
    next_listener: AtomicU64,
    counters: Counters,
}

/// Lock a mutex, recovering the data if a previous holder panicked.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Owned, injectable store of active dictionaries.
///
/// Cloning is cheap and every clone observes the same state, so a handle can be
/// moved into background tasks while the caller keeps reading.
pub struct TranslationStore<S, F> {
    inner: Arc<Inner<S, F>>,
}

impl<S, F> Clone for TranslationStore<S, F> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Marks a language as refreshing for as long as it lives.
///
/// Dropping it clears the in-flight flag, including when the refresh task is
/// aborted or panics.
struct InFlight<S, F> {
    inner: Arc<Inner<S, F>>,
    language: Language,
    /// Set once the flag was cleared together with the applied result.
    released: bool,
}

impl<S, F> Drop for InFlight<S, F> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        let mut state = lock(&self.inner.state);
        if let Some(slot) = state.slots.get_mut(&self.language) {
            slot.in_flight = false;
        }
    }
}

impl<S, F> TranslationStore<S, F>
where
    S: KeyValueStorage + 'static,
    F: DictionarySource,
{
    /// What: Create a store using the bundled fallback dictionaries.
    ///
    /// Inputs:
    /// - `cache`: Cache layer (its storage also holds the language choice)
    /// - `source`: Where fresh dictionaries come from
    #[must_use]
    pub fn new(cache: TranslationCache<S>, source: F) -> Self {
        let fallbacks = Language::ALL
            .into_iter()
            .map(|lang| (lang, fallback::bundled(lang).clone()))
            .collect();
        Self::with_fallbacks(cache, source, fallbacks)
    }

    /// What: Create a store with explicit fallback dictionaries.
    ///
    /// Details:
    /// - Languages missing from `fallbacks` use an empty fallback
    pub fn with_fallbacks(
        cache: TranslationCache<S>,
        source: F,
        fallbacks: BTreeMap<Language, Dictionary>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                cache,
                source,
                fallbacks,
                state: Mutex::new(State {
                    active_language: Language::default(),
                    slots: BTreeMap::new(),
                }),
                listeners: Mutex::new(Vec::new()),
                next_listener: AtomicU64::new(1),
                counters: Counters::default(),
            }),
        }
    }

    /// Cache layer, for status reports and administrative clearing.
    #[must_use]
    pub fn cache(&self) -> &TranslationCache<S> {
        &self.inner.cache
    }

    /// Counter snapshot; every swallowed failure is counted here as well as logged.
    #[must_use]
    pub fn stats(&self) -> StoreStats {
        self.inner.counters.snapshot()
    }

    /// Currently active language.
    #[must_use]
    pub fn active_language(&self) -> Language {
        lock(&self.inner.state).active_language
    }

    /// What: Lifecycle state of `language`.
    #[must_use]
    pub fn state(&self, language: Language) -> StoreState {
        lock(&self.inner.state)
            .slots
            .get(&language)
            .map_or(StoreState::Uninitialized, |slot| {
                if slot.in_flight {
                    StoreState::Refreshing
                } else {
                    slot.settled
                }
            })
    }

    /// Fallback dictionary for `language`.
    fn fallback(&self, language: Language) -> Dictionary {
        self.inner
            .fallbacks
            .get(&language)
            .cloned()
            .unwrap_or_default()
    }

    /// What: Build a slot from the fallback and the freshest cache entry.
    fn load_slot(&self, language: Language) -> Slot {
        self.slot_from(language, self.inner.cache.read(language))
    }

    /// What: Build a slot from the fallback merged with `cached`, when present.
    fn slot_from(&self, language: Language, cached: Option<Dictionary>) -> Slot {
        let fallback = self.fallback(language);
        match cached {
            Some(cached) => {
                debug!(language = %language, "bootstrapped from fallback and cache");
                Slot {
                    settled: StoreState::Synced,
                    active: Arc::new(deep_merge(&fallback, &cached)),
                    in_flight: false,
                }
            }
            None => {
                debug!(language = %language, "bootstrapped from fallback only");
                Slot {
                    settled: StoreState::Bootstrapped,
                    active: Arc::new(fallback),
                    in_flight: false,
                }
            }
        }
    }

    /// Initialize `language`'s slot if this is its first use.
    fn ensure_slot<'a>(&self, state: &'a mut State, language: Language) -> &'a mut Slot {
        state
            .slots
            .entry(language)
            .or_insert_with(|| self.load_slot(language))
    }

    /// What: Active dictionary for `language`.
    ///
    /// Output:
    /// - Fallback deep-merged with the best known cached or fetched dictionary
    ///
    /// Details:
    /// - Never blocks on the network and never fails; with empty inputs the
    ///   result is an empty dictionary
    #[must_use]
    pub fn get_active_dictionary(&self, language: Language) -> Arc<Dictionary> {
        let mut state = lock(&self.inner.state);
        Arc::clone(&self.ensure_slot(&mut state, language).active)
    }

    /// Active dictionary of the active language.
    #[must_use]
    pub fn dictionary(&self) -> Arc<Dictionary> {
        self.get_active_dictionary(self.active_language())
    }

    /// What: Translate `key` in the active language; a miss yields the key itself.
    #[must_use]
    pub fn t(&self, key: &str) -> String {
        dictionary::translate(&self.dictionary(), key)
    }

    /// What: Translate `key` in the active language and fill `{{name}}` placeholders.
    #[must_use]
    pub fn t_with(&self, key: &str, args: &[(&str, &str)]) -> String {
        dictionary::translate_with(&self.dictionary(), key, args)
    }

    /// What: Register a callback run after every successful refresh.
    ///
    /// Output:
    /// - Id usable with [`Self::remove_listener`]
    ///
    /// Details:
    /// - Listeners run synchronously, in registration order, on the task that
    ///   completed the refresh, after the new dictionary is already active
    pub fn on_dictionary_updated<L>(&self, listener: L) -> ListenerId
    where
        L: Fn(Language, &Dictionary) + Send + Sync + 'static,
    {
        let id = self.inner.next_listener.fetch_add(1, Ordering::Relaxed);
        lock(&self.inner.listeners).push((id, Arc::new(listener)));
        id
    }

    /// What: Unregister a listener. Returns `false` when the id is unknown.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut listeners = lock(&self.inner.listeners);
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    /// Invoke every listener outside the listener lock.
    fn notify(&self, language: Language, dictionary: &Dictionary) {
        let listeners: Vec<Listener> = lock(&self.inner.listeners)
            .iter()
            .map(|(_, l)| Arc::clone(l))
            .collect();
        for listener in listeners {
            listener(language, dictionary);
        }
    }

    /// What: Mark `language` as refreshing unless a refresh is already running.
    ///
    /// Output:
    /// - `Some(InFlight)` ticket owning the flag, or `None` when already in flight
    fn begin_refresh(&self, language: Language) -> Option<InFlight<S, F>> {
        let mut state = lock(&self.inner.state);
        let slot = self.ensure_slot(&mut state, language);
        if slot.in_flight {
            drop(state);
            Counters::bump(&self.inner.counters.skipped);
            debug!(language = %language, "refresh already in flight, skipping");
            return None;
        }
        slot.in_flight = true;
        Some(InFlight {
            inner: Arc::clone(&self.inner),
            language,
            released: false,
        })
    }

    /// What: Fetch, cache, merge and announce; consumes the in-flight ticket.
    async fn run_refresh(&self, mut ticket: InFlight<S, F>) -> RefreshOutcome {
        let language = ticket.language;
        let counters = &self.inner.counters;
        Counters::bump(&counters.refreshes);

        let fetched = match self.inner.source.fetch_dictionary(language).await {
            Ok(dict) => dict,
            Err(e) => {
                Counters::bump(&counters.fetch_failures);
                warn!(
                    language = %language,
                    error = %e,
                    kind = e.kind(),
                    "dictionary refresh failed"
                );
                return RefreshOutcome::Failed;
            }
        };
        if fetched.is_empty() {
            Counters::bump(&counters.empty_fetches);
            debug!(language = %language, "backend returned an empty dictionary, keeping current");
            return RefreshOutcome::Empty;
        }

        if !self.inner.cache.write(language, &fetched) {
            Counters::bump(&counters.storage_failures);
        }
        let merged = Arc::new(deep_merge(&self.fallback(language), &fetched));
        {
            let mut state = lock(&self.inner.state);
            let slot = self.ensure_slot(&mut state, language);
            slot.active = Arc::clone(&merged);
            slot.settled = StoreState::Synced;
            // Released with the apply so the ticket cannot clear a newer claim.
            slot.in_flight = false;
            ticket.released = true;
        }
        Counters::bump(&counters.updates);
        info!(language = %language, keys = fetched.len(), "translations updated");
        self.notify(language, &merged);
        RefreshOutcome::Updated
    }

    /// What: Refresh `language` from the source and wait for the outcome.
    ///
    /// Details:
    /// - At most one refresh per language runs at a time; a concurrent request
    ///   returns `AlreadyInFlight` immediately
    /// - Failures leave the active dictionary untouched
    pub async fn refresh(&self, language: Language) -> RefreshOutcome {
        match self.begin_refresh(language) {
            Some(ticket) => self.run_refresh(ticket).await,
            None => RefreshOutcome::AlreadyInFlight,
        }
    }

    /// What: Start a refresh in the background.
    ///
    /// Output:
    /// - Join handle resolving to the outcome; dropping it does not cancel the refresh
    ///
    /// Details:
    /// - The in-flight flag is claimed before this returns, so a second call
    ///   made right after resolves to `AlreadyInFlight`
    /// - Must be called from within a Tokio runtime
    pub fn spawn_refresh(&self, language: Language) -> JoinHandle<RefreshOutcome> {
        let Some(ticket) = self.begin_refresh(language) else {
            return tokio::spawn(async { RefreshOutcome::AlreadyInFlight });
        };
        let store = self.clone();
        tokio::spawn(async move { store.run_refresh(ticket).await })
    }

    /// What: Pick the startup language, load it and start its background refresh.
    ///
    /// Inputs:
    /// - `default_language`: Used when neither a persisted nor a system language applies
    pub fn bootstrap(&self, default_language: Language) -> JoinHandle<RefreshOutcome> {
        let language =
            language::resolve_initial_language(self.inner.cache.storage(), default_language);
        self.select_language(language);
        info!(language = %language, "translation store bootstrapped");
        self.spawn_refresh(language)
    }

    /// What: Make `language` active for this process only.
    ///
    /// Details:
    /// - Nothing is persisted and no refresh starts; used for offline lookups
    pub fn select_language(&self, language: Language) {
        let mut state = lock(&self.inner.state);
        state.active_language = language;
        self.ensure_slot(&mut state, language);
    }

    /// What: Make `language` active, persist the choice and refresh it.
    ///
    /// Details:
    /// - Re-reads the cache for `language` right away so the switch renders
    ///   immediately; a refresh already in flight for it keeps running
    /// - Without a fresh cache entry the dictionary already active for
    ///   `language` is kept rather than dropped back to the fallback
    /// - A pending refresh for another language is not cancelled
    pub fn switch_language(&self, language: Language) -> JoinHandle<RefreshOutcome> {
        if !language::save_preference(self.inner.cache.storage(), language) {
            Counters::bump(&self.inner.counters.storage_failures);
        }
        {
            // Read and apply under one guard so a refresh finishing meanwhile is not undone.
            let mut state = lock(&self.inner.state);
            state.active_language = language;
            let cached = self.inner.cache.read(language);
            if let Some(slot) = state.slots.get_mut(&language) {
                if let Some(cached) = cached {
                    slot.active = Arc::new(deep_merge(&self.fallback(language), &cached));
                    slot.settled = StoreState::Synced;
                } else {
                    debug!(language = %language, "no fresh cache entry, keeping active dictionary");
                }
            } else {
                let slot = self.slot_from(language, cached);
                state.slots.insert(language, slot);
            }
        }
        info!(language = %language, "language switched");
        self.spawn_refresh(language)
    }

    /// What: Drop cache entries so the next load fetches fresh data.
    ///
    /// Output:
    /// - Number of storage keys removed
    ///
    /// Details:
    /// - Call after back-office edits; the in-memory dictionary is kept until a
    ///   refresh replaces it
    pub fn clear_cache(&self, scope: CacheScope) -> usize {
        self.inner.cache.clear(scope)
    }

    /// What: Administrative reload: clear `language`'s cache entry and refresh it.
    pub async fn reload(&self, language: Language) -> RefreshOutcome {
        self.clear_cache(CacheScope::Language(language));
        let outcome = self.refresh(language).await;
        info!(language = %language, outcome = ?outcome, "translations reloaded");
        outcome
    }

    /// What: Reload the active language when its cache entry is missing or expired.
    ///
    /// Output:
    /// - `Some(outcome)` when a reload ran, `None` when the cache was fresh
    pub async fn check_freshness(&self) -> Option<RefreshOutcome> {
        let language = self.active_language();
        if self.inner.cache.is_fresh_at(language, now_ms()) {
            debug!(language = %language, "translation cache is fresh");
            return None;
        }
        Some(self.reload(language).await)
    }

    /// What: Reload every supported language concurrently.
    pub async fn force_reload_all(&self) -> Vec<(Language, RefreshOutcome)> {
        let reloads = Language::ALL.map(|lang| async move { (lang, self.reload(lang).await) });
        futures::future::join_all(reloads).await
    }
}
