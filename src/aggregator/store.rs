//! Session-scoped query cache owned by the view layer.
//!
//! Entries live until the store is dropped. There is no single-flight: two
//! concurrent fetches for one key both hit the gateway and the last one to
//! finish wins. Views render whatever [`QueryStore::current`] returns, which
//! always follows the most recently requested key of a route, so a slow
//! response for a superseded key never replaces what is on screen.

use super::client::{FetchError, GatewayClient, RouteName};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};
use tokio::sync::broadcast;
use tracing::debug;

const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey {
    pub route: RouteName,
    pub query: BTreeMap<String, String>,
}

impl QueryKey {
    /// Empty values are dropped so `camera=` and no camera share a key
    pub fn new<K, V>(route: RouteName, params: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let query = params
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .filter(|(_, v)| !v.is_empty())
            .collect();
        Self { route, query }
    }

    pub fn bare(route: RouteName) -> Self {
        Self {
            route,
            query: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryStatus {
    Loading,
    Ready,
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct QueryCacheEntry {
    /// Last successful payload, kept across failed refetches
    pub data: Option<Value>,
    pub status: EntryStatus,
    pub updated_at: DateTime<Utc>,
}

impl QueryCacheEntry {
    fn loading() -> Self {
        Self {
            data: None,
            status: EntryStatus::Loading,
            updated_at: Utc::now(),
        }
    }

    pub fn is_loading(&self) -> bool {
        self.status == EntryStatus::Loading
    }

    pub fn error(&self) -> Option<&str> {
        match &self.status {
            EntryStatus::Failed(msg) => Some(msg),
            _ => None,
        }
    }

    pub fn decode<T: DeserializeOwned>(&self) -> Option<Result<T, serde_json::Error>> {
        self.data.clone().map(serde_json::from_value)
    }
}

/// Published whenever an entry changes state
#[derive(Debug, Clone)]
pub struct CacheEvent {
    pub key: QueryKey,
    pub status: EntryStatus,
    /// Whether `key` is still the latest request for its route
    pub current: bool,
}

#[derive(Debug, Clone)]
pub enum FetchOutcome {
    Cached(QueryCacheEntry),
    Fresh(QueryCacheEntry),
    /// Finished after a newer key was requested for the same route
    Superseded(QueryCacheEntry),
}

impl FetchOutcome {
    pub fn entry(&self) -> &QueryCacheEntry {
        match self {
            FetchOutcome::Cached(e) | FetchOutcome::Fresh(e) | FetchOutcome::Superseded(e) => e,
        }
    }
}

#[derive(Default)]
struct StoreState {
    entries: HashMap<QueryKey, QueryCacheEntry>,
    latest: HashMap<RouteName, QueryKey>,
}

pub struct QueryStore {
    client: GatewayClient,
    state: Mutex<StoreState>,
    events: broadcast::Sender<CacheEvent>,
}

impl QueryStore {
    pub fn new(client: GatewayClient) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            client,
            state: Mutex::new(StoreState::default()),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CacheEvent> {
        self.events.subscribe()
    }

    /// Serve a ready entry from cache, otherwise ask the gateway
    pub async fn fetch(&self, key: QueryKey) -> FetchOutcome {
        {
            let mut state = self.state();
            let cached = state
                .entries
                .get(&key)
                .filter(|e| e.status == EntryStatus::Ready)
                .cloned();
            if let Some(entry) = cached {
                state.latest.insert(key.route, key.clone());
                debug!(route = ?key.route, "query cache hit");
                return FetchOutcome::Cached(entry);
            }
        }
        self.load(key).await
    }

    /// Always go to the gateway, replacing the cached entry on success
    pub async fn refetch(&self, key: QueryKey) -> FetchOutcome {
        self.load(key).await
    }

    /// Entry for the most recently requested key of `route`
    pub fn current(&self, route: RouteName) -> Option<QueryCacheEntry> {
        let state = self.state();
        let key = state.latest.get(&route)?;
        state.entries.get(key).cloned()
    }

    pub fn current_key(&self, route: RouteName) -> Option<QueryKey> {
        self.state().latest.get(&route).cloned()
    }

    pub fn get(&self, key: &QueryKey) -> Option<QueryCacheEntry> {
        self.state().entries.get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.state().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    async fn load(&self, key: QueryKey) -> FetchOutcome {
        {
            let mut state = self.state();
            state.latest.insert(key.route, key.clone());
            let entry = state
                .entries
                .entry(key.clone())
                .or_insert_with(QueryCacheEntry::loading);
            entry.status = EntryStatus::Loading;
        }
        self.publish(&key, EntryStatus::Loading, true);

        let result = self.client.get(key.route, &key.query).await;

        let (entry, current) = {
            let mut state = self.state();
            let current = state.latest.get(&key.route) == Some(&key);
            let entry = state
                .entries
                .entry(key.clone())
                .or_insert_with(QueryCacheEntry::loading);
            apply(entry, result);
            (entry.clone(), current)
        };
        self.publish(&key, entry.status.clone(), current);

        if current {
            FetchOutcome::Fresh(entry)
        } else {
            debug!(route = ?key.route, "discarding superseded response");
            FetchOutcome::Superseded(entry)
        }
    }

    fn publish(&self, key: &QueryKey, status: EntryStatus, current: bool) {
        // No subscribers is fine
        let _ = self.events.send(CacheEvent {
            key: key.clone(),
            status,
            current,
        });
    }

    fn state(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn apply(entry: &mut QueryCacheEntry, result: Result<Value, FetchError>) {
    match result {
        Ok(data) => {
            entry.data = Some(data);
            entry.status = EntryStatus::Ready;
        }
        Err(err) => entry.status = EntryStatus::Failed(err.to_string()),
    }
    entry.updated_at = Utc::now();
}
