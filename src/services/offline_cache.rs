// src/services/offline_cache.rs
// DOCUMENTATION: Offline cache worker logic
// PURPOSE: Keep the application shell and static assets available offline.
// Application data never goes through here.

use crate::errors::SpotsError;
use async_trait::async_trait;
use reqwest::Client;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Entry documents of the application shell, cached on install
pub const SHELL_URLS: [&str; 3] = ["/", "/index.html", "/manifest.json"];

/// Request as seen by the worker
#[derive(Debug, Clone, Default)]
pub struct AssetRequest {
    pub method: String,
    pub host: String,
    /// Path plus query, the cache key
    pub path: String,
    /// `Sec-Fetch-Mode`
    pub mode: Option<String>,
    /// `Sec-Fetch-Dest`
    pub destination: Option<String>,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl AssetRequest {
    pub fn get(path: &str) -> Self {
        AssetRequest {
            method: "GET".to_string(),
            path: path.to_string(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssetResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// Non-GET or backend/AI traffic, never intercepted
    Bypass,
    /// Network first, cache fallback
    Navigation,
    /// Stale-while-revalidate
    StaticAsset,
    /// Network only
    PassThrough,
}

pub fn classify(request: &AssetRequest, bypass_hosts: &[String]) -> RequestKind {
    if !request.method.eq_ignore_ascii_case("GET")
        || bypass_hosts.iter().any(|h| request.host.contains(h.as_str()))
    {
        return RequestKind::Bypass;
    }
    if request.mode.as_deref() == Some("navigate") {
        return RequestKind::Navigation;
    }
    match request.destination.as_deref() {
        Some("script") | Some("style") | Some("image") | Some("font") => RequestKind::StaticAsset,
        _ => RequestKind::PassThrough,
    }
}

/// Named caches of responses keyed by request path
#[derive(Default)]
pub struct CacheStorage {
    caches: RwLock<HashMap<String, HashMap<String, AssetResponse>>>,
}

impl CacheStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn put(&self, cache: &str, key: &str, response: AssetResponse) {
        let mut caches = self.caches.write().await;
        caches
            .entry(cache.to_string())
            .or_default()
            .insert(key.to_string(), response);
        log::debug!("Cache PUT {} in {}", key, cache);
    }

    pub async fn lookup(&self, cache: &str, key: &str) -> Option<AssetResponse> {
        let caches = self.caches.read().await;
        match caches.get(cache).and_then(|c| c.get(key)) {
            Some(hit) => {
                log::debug!("Cache HIT for {}", key);
                Some(hit.clone())
            }
            None => {
                log::debug!("Cache MISS for {}", key);
                None
            }
        }
    }

    pub async fn names(&self) -> Vec<String> {
        self.caches.read().await.keys().cloned().collect()
    }

    pub async fn delete(&self, cache: &str) -> bool {
        self.caches.write().await.remove(cache).is_some()
    }
}

/// Network side of the worker
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, request: &AssetRequest) -> Result<AssetResponse, SpotsError>;
}

/// Fetches from the origin serving the application shell
pub struct HttpFetcher {
    client: Client,
    origin: String,
}

impl HttpFetcher {
    pub fn new(origin: &str) -> Self {
        Self {
            client: Client::new(),
            origin: origin.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &AssetRequest) -> Result<AssetResponse, SpotsError> {
        let method = reqwest::Method::from_bytes(request.method.as_bytes())
            .map_err(|_| SpotsError::InvalidInput(format!("method {}", request.method)))?;
        let url = format!("{}{}", self.origin, request.path);

        let mut builder = self.client.request(method, &url);
        if let Some(content_type) = &request.content_type {
            builder = builder.header(reqwest::header::CONTENT_TYPE, content_type);
        }
        if !request.body.is_empty() {
            builder = builder.body(request.body.clone());
        }

        let response = builder.send().await.map_err(|e| {
            log::warn!("Network fetch of {} failed: {}", url, e);
            SpotsError::Offline(e.to_string())
        })?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response
            .bytes()
            .await
            .map_err(|e| SpotsError::Offline(e.to_string()))?;

        Ok(AssetResponse {
            status,
            content_type,
            body: body.to_vec(),
        })
    }
}

pub struct OfflineCacheWorker {
    storage: Arc<CacheStorage>,
    fetcher: Arc<dyn Fetcher>,
    cache_name: String,
    bypass_hosts: Vec<String>,
}

impl OfflineCacheWorker {
    pub fn new(
        storage: Arc<CacheStorage>,
        fetcher: Arc<dyn Fetcher>,
        cache_name: &str,
        bypass_hosts: Vec<String>,
    ) -> Self {
        Self {
            storage,
            fetcher,
            cache_name: cache_name.to_string(),
            bypass_hosts,
        }
    }

    pub fn cache_name(&self) -> &str {
        &self.cache_name
    }

    /// Pre-populate the current cache with the shell; nothing is stored unless every entry fetched
    pub async fn install(&self) -> Result<(), SpotsError> {
        let mut fetched = Vec::with_capacity(SHELL_URLS.len());
        for path in SHELL_URLS {
            let response = self.fetcher.fetch(&AssetRequest::get(path)).await?;
            fetched.push((path, response));
        }
        for (path, response) in fetched {
            self.storage.put(&self.cache_name, path, response).await;
        }
        log::info!("Installed {} shell entries into {}", SHELL_URLS.len(), self.cache_name);
        Ok(())
    }

    /// Delete every cache but the current one; returns how many were evicted
    pub async fn activate(&self) -> usize {
        let mut evicted = 0;
        for name in self.storage.names().await {
            if name != self.cache_name && self.storage.delete(&name).await {
                log::info!("Evicted stale cache {}", name);
                evicted += 1;
            }
        }
        evicted
    }

    pub async fn handle(&self, request: &AssetRequest) -> Result<AssetResponse, SpotsError> {
        match classify(request, &self.bypass_hosts) {
            RequestKind::Navigation => self.network_first(request).await,
            RequestKind::StaticAsset => self.stale_while_revalidate(request).await,
            RequestKind::Bypass | RequestKind::PassThrough => self.fetcher.fetch(request).await,
        }
    }

    async fn network_first(&self, request: &AssetRequest) -> Result<AssetResponse, SpotsError> {
        match self.fetcher.fetch(request).await {
            Ok(response) => {
                self.storage
                    .put(&self.cache_name, &request.path, response.clone())
                    .await;
                Ok(response)
            }
            Err(err) => {
                if let Some(hit) = self.storage.lookup(&self.cache_name, &request.path).await {
                    return Ok(hit);
                }
                match self.storage.lookup(&self.cache_name, "/").await {
                    Some(shell) => Ok(shell),
                    None => Err(err),
                }
            }
        }
    }

    async fn stale_while_revalidate(
        &self,
        request: &AssetRequest,
    ) -> Result<AssetResponse, SpotsError> {
        let Some(cached) = self.storage.lookup(&self.cache_name, &request.path).await else {
            let response = self.fetcher.fetch(request).await?;
            self.storage
                .put(&self.cache_name, &request.path, response.clone())
                .await;
            return Ok(response);
        };

        let storage = self.storage.clone();
        let fetcher = self.fetcher.clone();
        let cache_name = self.cache_name.clone();
        let request = request.clone();
        tokio::spawn(async move {
            match fetcher.fetch(&request).await {
                Ok(fresh) => storage.put(&cache_name, &request.path, fresh).await,
                Err(e) => log::debug!("Revalidation of {} failed: {}", request.path, e),
            }
        });

        Ok(cached)
    }
}
