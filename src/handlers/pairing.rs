// src/handlers/pairing.rs
// DOCUMENTATION: HTTP handlers for partner pairing
// PURPOSE: Status is recomputed from fresh profile reads on every call

use crate::errors::SpotsError;
use crate::services::SpotService;
use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct PairingCodeRequest {
    pub code: String,
}

/// GET /pairing
pub async fn pairing_status(service: web::Data<SpotService>) -> Result<impl Responder, SpotsError> {
    Ok(HttpResponse::Ok().json(service.pairing_status().await?))
}

/// POST /pairing
pub async fn submit_code(
    service: web::Data<SpotService>,
    req: web::Json<PairingCodeRequest>,
) -> Result<impl Responder, SpotsError> {
    let status = service.submit_pairing_code(&req.code).await?;
    Ok(HttpResponse::Ok().json(status))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/pairing", web::get().to(pairing_status))
        .route("/pairing", web::post().to(submit_code));
}
