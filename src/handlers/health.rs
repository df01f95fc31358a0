// src/handlers/health.rs
// DOCUMENTATION: Health check handler
// PURPOSE: Liveness plus whether a session is currently loaded

use crate::services::SpotService;
use actix_web::{web, HttpResponse, Responder};
use serde_json::json;

pub async fn health_check(service: web::Data<SpotService>) -> impl Responder {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "service": "tokomemo",
        "version": env!("CARGO_PKG_VERSION"),
        "signed_in": service.session().current().is_some()
    }))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check));
}
