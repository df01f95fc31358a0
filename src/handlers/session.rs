// src/handlers/session.rs
// DOCUMENTATION: HTTP handlers for the session, account and plan
// PURPOSE: Sign in/out, delete the account, report usage, change plan

use crate::errors::SpotsError;
use crate::models::PlanChangeRequest;
use crate::services::{SessionUser, SpotService};
use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;
use uuid::Uuid;

/// Body of POST /session, issued after the auth collaborator accepted the user
#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub user_id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
}

/// POST /session
pub async fn sign_in(
    service: web::Data<SpotService>,
    req: web::Json<SignInRequest>,
) -> Result<impl Responder, SpotsError> {
    let req = req.into_inner();
    let summary = service
        .sign_in(SessionUser {
            id: req.user_id,
            email: req.email,
        })
        .await?;
    Ok(HttpResponse::Ok().json(summary))
}

/// DELETE /session
pub async fn sign_out(service: web::Data<SpotService>) -> impl Responder {
    service.sign_out().await;
    HttpResponse::NoContent().finish()
}

/// DELETE /account
/// Failure is returned to the caller as-is
pub async fn delete_account(service: web::Data<SpotService>) -> Result<impl Responder, SpotsError> {
    service.delete_account().await?;
    Ok(HttpResponse::NoContent().finish())
}

/// GET /usage
pub async fn usage(service: web::Data<SpotService>) -> Result<impl Responder, SpotsError> {
    Ok(HttpResponse::Ok().json(service.usage_report().await?))
}

/// PUT /plan
pub async fn change_plan(
    service: web::Data<SpotService>,
    req: web::Json<PlanChangeRequest>,
) -> Result<impl Responder, SpotsError> {
    let report = service.change_plan(req.plan).await?;
    Ok(HttpResponse::Ok().json(report))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/session", web::post().to(sign_in))
        .route("/session", web::delete().to(sign_out))
        .route("/account", web::delete().to(delete_account))
        .route("/usage", web::get().to(usage))
        .route("/plan", web::put().to(change_plan));
}
