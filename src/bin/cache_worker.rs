// src/bin/cache_worker.rs
// DOCUMENTATION: Offline cache worker entry point
// PURPOSE: Reverse proxy in front of the application shell that installs the
// shell cache, evicts stale caches, then serves every request through the worker

use actix_web::{http::StatusCode, middleware::Logger, web, App, HttpRequest, HttpResponse, HttpServer};
use anyhow::Context;
use std::sync::Arc;
use tokomemo::config::Config;
use tokomemo::errors::SpotsError;
use tokomemo::services::offline_cache::AssetRequest;
use tokomemo::services::{CacheStorage, HttpFetcher, OfflineCacheWorker};

fn header(req: &HttpRequest, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

async fn intercept(
    worker: web::Data<OfflineCacheWorker>,
    req: HttpRequest,
    body: web::Bytes,
) -> Result<HttpResponse, SpotsError> {
    let request = AssetRequest {
        method: req.method().to_string(),
        host: req.connection_info().host().to_string(),
        path: req
            .uri()
            .path_and_query()
            .map(|p| p.as_str().to_string())
            .unwrap_or_else(|| "/".to_string()),
        mode: header(&req, "sec-fetch-mode"),
        destination: header(&req, "sec-fetch-dest"),
        content_type: header(&req, "content-type"),
        body: body.to_vec(),
    };

    let response = worker.handle(&request).await?;
    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::BAD_GATEWAY);
    let mut builder = HttpResponse::build(status);
    if let Some(content_type) = response.content_type {
        builder.content_type(content_type);
    }
    Ok(builder.body(response.body))
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env();
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", &config.log_level);
    }
    env_logger::init();
    config.validate().map_err(anyhow::Error::msg)?;

    log::info!(
        "Starting cache worker for {} (cache {})",
        config.shell_origin,
        config.cache_name
    );

    let worker = OfflineCacheWorker::new(
        Arc::new(CacheStorage::new()),
        Arc::new(HttpFetcher::new(&config.shell_origin)),
        &config.cache_name,
        config.bypass_hosts.clone(),
    );

    // Not fatal: navigations still go to the network first
    if let Err(e) = worker.install().await {
        log::warn!("Shell install failed, starting with an empty cache: {}", e);
    }
    let evicted = worker.activate().await;
    log::info!("Cache {} active, {} stale caches evicted", worker.cache_name(), evicted);

    let worker = web::Data::new(worker);
    let bind_addr = format!("{}:{}", config.cache_worker_address, config.cache_worker_port);

    HttpServer::new(move || {
        App::new()
            .app_data(worker.clone())
            .wrap(Logger::default())
            .default_service(web::to(intercept))
    })
    .bind(&bind_addr)
    .with_context(|| format!("binding cache worker to {}", bind_addr))?
    .run()
    .await
    .context("cache worker server")?;

    Ok(())
}
