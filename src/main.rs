// src/main.rs
// DOCUMENTATION: Application entry point
// PURPOSE: Initialize config, remote store, local state and collaborators,
// then start the companion HTTP service

use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use std::io;
use std::sync::Arc;
use tokomemo::config::{self, Config};
use tokomemo::db::PgStore;
use tokomemo::handlers;
use tokomemo::services::{
    CoordinatorSettings, FileStateStore, HttpAiExtractor, HttpObjectStorage, SpotService,
};

#[actix_web::main]
async fn main() -> io::Result<()> {
    // 1. Load environment variables
    dotenv().ok();

    // 2. Load configuration
    let config = Config::from_env();

    // 3. Initialize logging
    if std::env::var("RUST_LOG").is_err() {
        let log_level = if !config.log_level.is_empty() {
            &config.log_level
        } else {
            "info,actix_web=info,sqlx=warn"
        };
        std::env::set_var("RUST_LOG", log_level);
    }
    env_logger::init();

    if let Err(e) = config.validate() {
        log::error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    log::info!("Starting tokomemo companion service...");
    log::info!("Environment: {}", config.environment);
    log::info!(
        "Server Address: {}:{}",
        config.server_address,
        config.server_port
    );

    // 4. Remote store
    let pool = match config::init_db_pool(&config).await {
        Ok(pool) => pool,
        Err(e) => {
            log::error!("Failed to connect to database: {}", e);
            std::process::exit(1);
        }
    };
    let store = Arc::new(PgStore::new(pool));

    // 5. Local key-value state (plan marker, AI usage counters)
    let state = match FileStateStore::open(&config.local_state_path).await {
        Ok(state) => Arc::new(state),
        Err(e) => {
            log::error!("Failed to open local state: {}", e);
            std::process::exit(1);
        }
    };
    log::info!("Local state at {}", config.local_state_path);

    // 6. Collaborators
    let ai = Arc::new(HttpAiExtractor::new(
        config.ai_api_url.clone(),
        config.ai_api_key.clone(),
        config.ai_requests_per_minute,
    ));
    let storage = Arc::new(HttpObjectStorage::new(
        config.storage_url.clone(),
        config.storage_key.clone(),
        config.storage_bucket.clone(),
    ));

    let service = web::Data::new(SpotService::new(
        store,
        state,
        ai,
        storage,
        CoordinatorSettings::from_config(&config),
    ));

    // 7. Start HTTP server
    let server_addr = format!("{}:{}", config.server_address, config.server_port);

    HttpServer::new(move || {
        App::new()
            .app_data(service.clone())
            .app_data(web::JsonConfig::default().limit(20 * 1024 * 1024))
            // Middleware
            .wrap(Logger::default())
            .wrap(actix_web::middleware::Compress::default())
            // Routes
            .configure(handlers::health_config)
            .configure(handlers::session_config)
            .configure(handlers::spots_config)
            .configure(handlers::pairing_config)
            .configure(handlers::assist_config)
    })
    .bind(&server_addr)?
    .run()
    .await
}
