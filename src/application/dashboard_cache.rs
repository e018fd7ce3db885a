// Single-slot TTL cache for a computed dashboard, with a re-entrancy guard
use crate::application::clock::Clock;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const DEFAULT_TTL: Duration = Duration::from_secs(120);

/// Raw key/value persistence. Expiry is computed by the reader, never by the store.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn load(&self, key: &str) -> anyhow::Result<Option<String>>;

    async fn save(&self, key: &str, value: &str) -> anyhow::Result<()>;

    async fn remove(&self, key: &str) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry<V> {
    pub view_model: V,
    pub fetched_at_epoch_ms: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CacheLookup<V> {
    Fresh(CacheEntry<V>),
    Stale(CacheEntry<V>),
    Absent,
}

impl<V> CacheLookup<V> {
    /// Any stored entry regardless of age
    pub fn into_stale(self) -> Option<CacheEntry<V>> {
        match self {
            CacheLookup::Fresh(entry) | CacheLookup::Stale(entry) => Some(entry),
            CacheLookup::Absent => None,
        }
    }
}

#[derive(Debug)]
pub enum CacheOutcome<V, E> {
    /// Served from the slot without computing
    Fresh(CacheEntry<V>),
    /// Computed now and written to the slot
    Refreshed(CacheEntry<V>),
    /// Another run for this key is in flight; nothing was fetched
    InFlight { stale: Option<CacheEntry<V>> },
    /// The run failed; the slot was left untouched
    Failed { error: E, stale: Option<CacheEntry<V>> },
}

pub struct DashboardCache<V> {
    store: Arc<dyn CacheStore>,
    clock: Arc<dyn Clock>,
    name: String,
    ttl: Duration,
    in_flight: Mutex<HashSet<String>>,
    _view: std::marker::PhantomData<fn() -> V>,
}

/// Held while a refresh runs; clears the in-flight flag on drop, including
/// when the refreshing future is cancelled.
pub struct RefreshGuard<'a> {
    in_flight: &'a Mutex<HashSet<String>>,
    key: String,
}

impl Drop for RefreshGuard<'_> {
    fn drop(&mut self) {
        let mut keys = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        keys.remove(&self.key);
    }
}

impl<V> DashboardCache<V>
where
    V: Serialize + DeserializeOwned + Clone + Send + Sync,
{
    pub fn new(
        store: Arc<dyn CacheStore>,
        clock: Arc<dyn Clock>,
        name: impl Into<String>,
        ttl: Duration,
    ) -> Self {
        Self {
            store,
            clock,
            name: name.into(),
            ttl,
            in_flight: Mutex::new(HashSet::new()),
            _view: std::marker::PhantomData,
        }
    }

    /// Slot key, namespaced per user when one is known
    pub fn key(&self, user: Option<&str>) -> String {
        match user.map(str::trim).filter(|u| !u.is_empty()) {
            Some(user) => format!("{}:{}", self.name, user),
            None => self.name.clone(),
        }
    }

    pub async fn lookup(&self, user: Option<&str>) -> CacheLookup<V> {
        let key = self.key(user);
        let raw = match self.store.load(&key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return CacheLookup::Absent,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Cache read failed, treating as miss");
                return CacheLookup::Absent;
            }
        };

        let entry: CacheEntry<V> = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Discarding corrupt cache entry");
                if let Err(e) = self.store.remove(&key).await {
                    tracing::warn!(key = %key, error = %e, "Failed to discard corrupt cache entry");
                }
                return CacheLookup::Absent;
            }
        };

        let age_ms = self.clock.now_ms() - entry.fetched_at_epoch_ms;
        if age_ms >= 0 && (age_ms as u128) < self.ttl.as_millis() {
            CacheLookup::Fresh(entry)
        } else {
            CacheLookup::Stale(entry)
        }
    }

    /// The cached view-model if it is still within the TTL
    pub async fn read(&self, user: Option<&str>) -> Option<CacheEntry<V>> {
        match self.lookup(user).await {
            CacheLookup::Fresh(entry) => Some(entry),
            _ => None,
        }
    }

    /// Replace the slot with `view_model`, stamped with the current time
    pub async fn write(&self, user: Option<&str>, view_model: V) -> CacheEntry<V> {
        let key = self.key(user);
        let entry = CacheEntry {
            view_model,
            fetched_at_epoch_ms: self.clock.now_ms(),
        };

        match serde_json::to_string(&entry) {
            Ok(raw) => {
                if let Err(e) = self.store.save(&key, &raw).await {
                    tracing::warn!(key = %key, error = %e, "Cache write failed");
                }
            }
            Err(e) => tracing::warn!(key = %key, error = %e, "Cache entry not serializable"),
        }

        entry
    }

    pub async fn invalidate(&self, user: Option<&str>) {
        let key = self.key(user);
        match self.store.remove(&key).await {
            Ok(()) => tracing::debug!("Invalidated cache slot {}", key),
            Err(e) => tracing::warn!(key = %key, error = %e, "Cache invalidation failed"),
        }
    }

    /// Claim the refresh for `user`'s slot. `None` means a run is already in flight.
    pub fn try_begin_refresh(&self, user: Option<&str>) -> Option<RefreshGuard<'_>> {
        let key = self.key(user);
        let mut keys = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        if keys.insert(key.clone()) {
            Some(RefreshGuard {
                in_flight: &self.in_flight,
                key,
            })
        } else {
            None
        }
    }

    /// Serve the slot if fresh, otherwise run `compute` once and store its result.
    pub async fn load_or_refresh<F, Fut, E>(
        &self,
        user: Option<&str>,
        compute: F,
    ) -> CacheOutcome<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let current = match self.lookup(user).await {
            CacheLookup::Fresh(entry) => return CacheOutcome::Fresh(entry),
            other => other,
        };

        let Some(_guard) = self.try_begin_refresh(user) else {
            tracing::debug!("Refresh already in flight for {}", self.key(user));
            return CacheOutcome::InFlight {
                stale: current.into_stale(),
            };
        };

        // A run that finished between the first lookup and the claim has
        // already filled the slot.
        let current = match self.lookup(user).await {
            CacheLookup::Fresh(entry) => return CacheOutcome::Fresh(entry),
            other => other,
        };

        self.compute_into_slot(user, current, compute).await
    }

    /// Recompute regardless of the slot's age. The slot is only replaced on
    /// success, so a failed run still has the previous entry to fall back on.
    pub async fn force_refresh<F, Fut, E>(
        &self,
        user: Option<&str>,
        compute: F,
    ) -> CacheOutcome<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let current = self.lookup(user).await;

        let Some(_guard) = self.try_begin_refresh(user) else {
            tracing::debug!("Refresh already in flight for {}", self.key(user));
            return CacheOutcome::InFlight {
                stale: current.into_stale(),
            };
        };

        self.compute_into_slot(user, current, compute).await
    }

    async fn compute_into_slot<F, Fut, E>(
        &self,
        user: Option<&str>,
        current: CacheLookup<V>,
        compute: F,
    ) -> CacheOutcome<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        match compute().await {
            Ok(view_model) => CacheOutcome::Refreshed(self.write(user, view_model).await),
            Err(error) => CacheOutcome::Failed {
                error,
                stale: current.into_stale(),
            },
        }
    }
}
