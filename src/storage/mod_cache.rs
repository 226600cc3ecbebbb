// src/storage/mod_cache.rs
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use futures::future::{BoxFuture, FutureExt, Shared};
use log::{debug, warn};
use parking_lot::Mutex;
use tokio::time::Instant;

use crate::config::Config;
use crate::error::{FetchError, Result};
use crate::models::mod_info::{ModListResponse, ModMetadata, ModResponse, ModShortMetadata};
use crate::transport::{mod_path, Transport, MOD_CATALOG_PATH};

/// The whole `/m/mods` catalog.
pub type Catalog = Arc<Vec<ModShortMetadata>>;

type InFlight<T> = Shared<BoxFuture<'static, Result<T>>>;

#[derive(Clone)]
struct CacheEntry<T> {
    value: T,
    fetched_at: Instant,
}

impl<T> CacheEntry<T> {
    fn new(value: T) -> Self {
        Self {
            value,
            fetched_at: Instant::now(),
        }
    }

    fn is_fresh(&self, ttl: Duration) -> bool {
        self.fetched_at.elapsed() < ttl
    }
}

#[derive(Default)]
struct CatalogSlot {
    entry: Option<CacheEntry<Catalog>>,
    pending: Option<InFlight<Catalog>>,
}

struct Inner {
    transport: Arc<dyn Transport>,
    ttl: Duration,
    entries: DashMap<String, CacheEntry<Arc<ModMetadata>>>,
    // Held while checking `entries` and while a finished fetch swaps its
    // result in, so a lookup never misses both the entry and the request.
    pending: Mutex<HashMap<String, InFlight<Arc<ModMetadata>>>>,
    catalog: Mutex<CatalogSlot>,
}

/// Mod metadata lookups with a TTL and at most one request in flight per
/// mod id.
///
/// Each outbound request runs on its own task, so a caller that loses
/// interest can drop its future without cancelling the lookup for others.
/// Failures are handed to every waiter but never cached.
#[derive(Clone)]
pub struct ModInfoCache {
    inner: Arc<Inner>,
}

impl ModInfoCache {
    pub fn new(transport: Arc<dyn Transport>, config: &Config) -> Self {
        Self::with_ttl(transport, config.mod_cache_ttl())
    }

    pub fn with_ttl(transport: Arc<dyn Transport>, ttl: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                transport,
                ttl,
                entries: DashMap::new(),
                pending: Mutex::new(HashMap::new()),
                catalog: Mutex::new(CatalogSlot::default()),
            }),
        }
    }

    /// Resolves metadata for `id`, from cache while fresh, otherwise by
    /// joining or starting the single request for that id.
    pub async fn get(&self, id: &str) -> Result<Arc<ModMetadata>> {
        let id = id.trim();
        if id.is_empty() {
            return Err(FetchError::NotFound(String::new()));
        }
        let key = cache_key(id);

        let request = {
            let mut pending = self.inner.pending.lock();
            if let Some(entry) = self.inner.entries.get(&key) {
                if entry.is_fresh(self.inner.ttl) {
                    debug!("Mod cache hit for {}", id);
                    return Ok(entry.value.clone());
                }
            }
            match pending.get(&key) {
                Some(request) => {
                    debug!("Joining in-flight lookup for {}", id);
                    request.clone()
                }
                None => {
                    debug!("Mod cache miss for {}, fetching", id);
                    let request = self.spawn_lookup(key.clone(), id.to_string());
                    pending.insert(key, request.clone());
                    request
                }
            }
        };

        request.await
    }

    /// Fresh cached metadata for `id`, without touching the network.
    pub fn peek(&self, id: &str) -> Option<Arc<ModMetadata>> {
        let entry = self.inner.entries.get(&cache_key(id.trim()))?;
        if entry.is_fresh(self.inner.ttl) {
            Some(entry.value.clone())
        } else {
            None
        }
    }

    pub fn is_pending(&self, id: &str) -> bool {
        self.inner.pending.lock().contains_key(&cache_key(id.trim()))
    }

    /// The whole catalog, cached under one slot. Soft-fails to an empty list
    /// since it only feeds autocomplete.
    pub async fn get_all(&self) -> Catalog {
        let request = {
            let mut slot = self.inner.catalog.lock();
            if let Some(entry) = &slot.entry {
                if entry.is_fresh(self.inner.ttl) {
                    debug!("Mod catalog cache hit ({} mods)", entry.value.len());
                    return entry.value.clone();
                }
            }
            match &slot.pending {
                Some(request) => request.clone(),
                None => {
                    let request = self.spawn_catalog_fetch();
                    slot.pending = Some(request.clone());
                    request
                }
            }
        };

        request.await.unwrap_or_default()
    }

    /// Catalog row for `id`, matched on canonical id or any alias.
    pub async fn short_info(&self, id: &str) -> Option<ModShortMetadata> {
        let catalog = self.get_all().await;
        find_short(&catalog, id).cloned()
    }

    fn spawn_lookup(&self, key: String, id: String) -> InFlight<Arc<ModMetadata>> {
        let inner = self.inner.clone();
        let task = tokio::spawn(async move {
            let result = fetch_mod(inner.transport.as_ref(), &id).await.map(Arc::new);

            let mut pending = inner.pending.lock();
            match &result {
                Ok(info) => {
                    inner.entries.insert(key.clone(), CacheEntry::new(info.clone()));
                }
                Err(e) => warn!("Mod lookup for {} failed: {}", id, e),
            }
            pending.remove(&key);
            result
        });

        async move {
            task.await
                .unwrap_or_else(|e| Err(FetchError::Network(format!("lookup task ended: {}", e))))
        }
        .boxed()
        .shared()
    }

    fn spawn_catalog_fetch(&self) -> InFlight<Catalog> {
        let inner = self.inner.clone();
        let task = tokio::spawn(async move {
            let result = fetch_catalog(inner.transport.as_ref()).await.map(Arc::new);

            let mut slot = inner.catalog.lock();
            match &result {
                Ok(catalog) => {
                    debug!("Mod catalog refreshed ({} mods)", catalog.len());
                    slot.entry = Some(CacheEntry::new(catalog.clone()));
                }
                Err(e) => warn!("Mod catalog fetch failed, serving empty list: {}", e),
            }
            slot.pending = None;
            result
        });

        async move {
            task.await
                .unwrap_or_else(|e| Err(FetchError::Network(format!("catalog task ended: {}", e))))
        }
        .boxed()
        .shared()
    }
}

/// Looks `id` up in a catalog by canonical id, url alias or secondary id.
pub fn find_short<'a>(catalog: &'a [ModShortMetadata], id: &str) -> Option<&'a ModShortMetadata> {
    catalog.iter().find(|m| m.answers_to(id))
}

fn cache_key(id: &str) -> String {
    id.to_lowercase()
}

async fn fetch_mod(transport: &dyn Transport, id: &str) -> Result<ModMetadata> {
    let payload = match transport.get_json(&mod_path(id)).await {
        Err(FetchError::HttpStatus(404)) => return Err(FetchError::NotFound(id.to_string())),
        other => other?,
    };
    let response: ModResponse = serde_json::from_value(payload)?;
    match response.statuscode.as_str() {
        "200" => response
            .info
            .ok_or_else(|| FetchError::NotFound(id.to_string())),
        "404" => Err(FetchError::NotFound(id.to_string())),
        other => Err(FetchError::BadStatus(other.to_string())),
    }
}

async fn fetch_catalog(transport: &dyn Transport) -> Result<Vec<ModShortMetadata>> {
    let payload = transport.get_json(MOD_CATALOG_PATH).await?;
    let response: ModListResponse = serde_json::from_value(payload)?;
    if response.statuscode != "200" {
        return Err(FetchError::BadStatus(response.statuscode));
    }
    Ok(response.mods)
}
