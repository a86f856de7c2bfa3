//! Fetch-or-serve-from-cache orchestration for weather lookups.
//!
//! One [`WeatherQuery`] instance owns a private in-memory cache keyed by
//! `(city, provider language code)` and publishes its observable state over a
//! watch channel. All cache reads/writes and state transitions are
//! synchronous; only the provider call suspends.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

use crate::{
    error::ErrorKind,
    model::{Language, WeatherSnapshot},
    provider::WeatherProvider,
};

/// How long a cache entry may be served after capture.
pub const CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// Distinct lookup keys retained before the oldest entry is evicted. TTL only
/// invalidates entries on read, so without a bound the map would grow with
/// every new city/language pair for the life of the session.
const CACHE_CAPACITY: usize = 64;

/// Where a served snapshot came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServeSource {
    Cache,
    Fresh,
}

/// Resting and transient states of one weather lookup.
///
/// `Served` and `Failed` are resting states; the controller re-enters
/// `Loading` only on an external trigger (key change or explicit refetch),
/// never on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryPhase {
    Idle,
    Loading,
    Served(ServeSource),
    Failed(ErrorKind),
}

/// Externally observed state of the current lookup.
#[derive(Debug, Clone)]
pub struct QueryState {
    pub phase: QueryPhase,
    pub result: Option<WeatherSnapshot>,
}

impl QueryState {
    fn idle() -> Self {
        Self { phase: QueryPhase::Idle, result: None }
    }

    pub fn is_loading(&self) -> bool {
        self.phase == QueryPhase::Loading
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self.phase {
            QueryPhase::Failed(kind) => Some(kind),
            _ => None,
        }
    }
}

struct CacheEntry {
    snapshot: WeatherSnapshot,
    captured_at: Instant,
}

struct Inner {
    cache: HashMap<String, CacheEntry>,
    /// Key of the most recent lookup request, used by `refetch`.
    key: Option<(String, Language)>,
    /// Lookup key the currently displayed result belongs to.
    result_key: Option<String>,
    /// Stamped on every trigger; a response carrying an older stamp has been
    /// superseded and must not touch state (last-requester-wins).
    generation: u64,
}

/// Weather query controller. Cheap to clone; clones share cache and state.
#[derive(Clone)]
pub struct WeatherQuery {
    provider: Arc<dyn WeatherProvider>,
    inner: Arc<Mutex<Inner>>,
    state_tx: watch::Sender<QueryState>,
}

impl WeatherQuery {
    pub fn new(provider: Arc<dyn WeatherProvider>) -> Self {
        let (state_tx, _) = watch::channel(QueryState::idle());
        Self {
            provider,
            inner: Arc::new(Mutex::new(Inner {
                cache: HashMap::new(),
                key: None,
                result_key: None,
                generation: 0,
            })),
            state_tx,
        }
    }

    /// Current state snapshot.
    pub fn state(&self) -> QueryState {
        self.state_tx.borrow().clone()
    }

    /// Subscribe to state updates (for the presentation layer).
    pub fn subscribe(&self) -> watch::Receiver<QueryState> {
        self.state_tx.subscribe()
    }

    /// Look up weather for a city, serving a cached snapshot when one is
    /// still valid and fetching otherwise. Resolves once the lookup settles;
    /// a lookup superseded by a newer trigger leaves state untouched.
    pub async fn lookup(&self, city: &str, lang: Language) {
        if city.is_empty() {
            return;
        }

        let cache_key = cache_key(city, lang);
        let generation = {
            let mut inner = self.lock();
            inner.generation += 1;
            inner.key = Some((city.to_string(), lang));

            if let Some(entry) = inner.cache.get(&cache_key) {
                if entry.captured_at.elapsed() < CACHE_TTL {
                    tracing::debug!(%cache_key, "serving weather from cache");
                    let snapshot = entry.snapshot.clone();
                    inner.result_key = Some(cache_key);
                    self.state_tx.send_replace(QueryState {
                        phase: QueryPhase::Served(ServeSource::Cache),
                        result: Some(snapshot),
                    });
                    return;
                }
            }

            // A prior result stays visible through Loading only when it
            // belongs to the key being looked up.
            let carried = if inner.result_key.as_deref() == Some(cache_key.as_str()) {
                self.state_tx.borrow().result.clone()
            } else {
                None
            };
            self.state_tx
                .send_replace(QueryState { phase: QueryPhase::Loading, result: carried });

            inner.generation
        };

        tracing::debug!(city, lang = %lang, "fetching weather from provider");
        let outcome = self.provider.current_weather(city, lang).await;

        let mut inner = self.lock();
        if inner.generation != generation {
            tracing::debug!(%cache_key, "discarding superseded weather response");
            return;
        }

        match outcome {
            Ok(snapshot) => {
                store(&mut inner.cache, cache_key.clone(), snapshot.clone());
                inner.result_key = Some(cache_key);
                self.state_tx.send_replace(QueryState {
                    phase: QueryPhase::Served(ServeSource::Fresh),
                    result: Some(snapshot),
                });
            }
            Err(err) => {
                // Displayed result is cleared; the cache entry, if any, is
                // deliberately left for a later request to revalidate.
                tracing::warn!(city, %err, "weather fetch failed");
                inner.result_key = None;
                self.state_tx.send_replace(QueryState {
                    phase: QueryPhase::Failed(err.kind()),
                    result: None,
                });
            }
        }
    }

    /// Re-run the full fetch-or-cache path for the current key. The cache is
    /// consulted again, so a retry shortly after a transient failure may
    /// still serve a valid entry from an earlier success.
    pub async fn refetch(&self) {
        let key = self.lock().key.clone();
        if let Some((city, lang)) = key {
            self.lookup(&city, lang).await;
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

fn cache_key(city: &str, lang: Language) -> String {
    format!("{city}_{}", lang.api_code())
}

fn store(cache: &mut HashMap<String, CacheEntry>, key: String, snapshot: WeatherSnapshot) {
    if cache.len() >= CACHE_CAPACITY && !cache.contains_key(&key) {
        let oldest = cache
            .iter()
            .min_by_key(|(_, entry)| entry.captured_at)
            .map(|(k, _)| k.clone());
        if let Some(oldest) = oldest {
            cache.remove(&oldest);
        }
    }
    cache.insert(key, CacheEntry { snapshot, captured_at: Instant::now() });
}
