// src/handlers/spots.rs
// DOCUMENTATION: HTTP handlers for spot and visit operations
// PURPOSE: Parse requests, call the facade, return view models

use crate::errors::SpotsError;
use crate::models::{ListQuery, SpotDraft, SpotPatch, VisitDraft};
use crate::services::{AiCompletion, SpotService};
use actix_web::{web, HttpResponse, Responder};
use uuid::Uuid;

/// GET /spots
/// View, search text, status, comma separated tags and sort order
pub async fn list_spots(
    service: web::Data<SpotService>,
    query: web::Query<ListQuery>,
) -> Result<impl Responder, SpotsError> {
    let criteria = query.criteria();
    let spots = service
        .list(query.view.unwrap_or_default(), &criteria)
        .await?;
    Ok(HttpResponse::Ok().json(spots))
}

/// GET /spots/tags
pub async fn list_tags(service: web::Data<SpotService>) -> Result<impl Responder, SpotsError> {
    Ok(HttpResponse::Ok().json(service.tags().await?))
}

/// POST /spots
pub async fn create_spot(
    service: web::Data<SpotService>,
    req: web::Json<SpotDraft>,
) -> Result<impl Responder, SpotsError> {
    let mut draft = req.into_inner();
    draft.id = None;
    let spot = service.save_spot(draft).await?;
    Ok(HttpResponse::Created().json(spot))
}

/// GET /spots/{id}
pub async fn get_spot(
    service: web::Data<SpotService>,
    path: web::Path<Uuid>,
) -> Result<impl Responder, SpotsError> {
    Ok(HttpResponse::Ok().json(service.spot(path.into_inner()).await?))
}

/// PUT /spots/{id}
/// Full save, including the photo diff when `photos` is present
pub async fn save_spot(
    service: web::Data<SpotService>,
    path: web::Path<Uuid>,
    req: web::Json<SpotDraft>,
) -> Result<impl Responder, SpotsError> {
    let mut draft = req.into_inner();
    draft.id = Some(path.into_inner());
    Ok(HttpResponse::Ok().json(service.save_spot(draft).await?))
}

/// PATCH /spots/{id}
pub async fn patch_spot(
    service: web::Data<SpotService>,
    path: web::Path<Uuid>,
    req: web::Json<SpotPatch>,
) -> Result<impl Responder, SpotsError> {
    let spot = service
        .update_spot(path.into_inner(), req.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(spot))
}

/// POST /spots/{id}/pin
pub async fn toggle_pin(
    service: web::Data<SpotService>,
    path: web::Path<Uuid>,
) -> Result<impl Responder, SpotsError> {
    Ok(HttpResponse::Ok().json(service.toggle_pin(path.into_inner()).await?))
}

/// DELETE /spots/{id}
/// Photos, then visits, then the spot itself
pub async fn delete_spot(
    service: web::Data<SpotService>,
    path: web::Path<Uuid>,
) -> Result<impl Responder, SpotsError> {
    service.delete_spot(path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// POST /spots/{id}/visits
pub async fn create_visit(
    service: web::Data<SpotService>,
    path: web::Path<Uuid>,
    req: web::Json<VisitDraft>,
) -> Result<impl Responder, SpotsError> {
    let mut draft = req.into_inner();
    draft.id = None;
    let visit = service.save_visit(path.into_inner(), draft).await?;
    Ok(HttpResponse::Created().json(visit))
}

/// PUT /spots/{id}/visits/{visit_id}
pub async fn update_visit(
    service: web::Data<SpotService>,
    path: web::Path<(Uuid, Uuid)>,
    req: web::Json<VisitDraft>,
) -> Result<impl Responder, SpotsError> {
    let (spot_id, visit_id) = path.into_inner();
    let mut draft = req.into_inner();
    draft.id = Some(visit_id.into());
    Ok(HttpResponse::Ok().json(service.save_visit(spot_id, draft).await?))
}

/// DELETE /spots/{id}/visits/{visit_id}
pub async fn delete_visit(
    service: web::Data<SpotService>,
    path: web::Path<(Uuid, Uuid)>,
) -> Result<impl Responder, SpotsError> {
    let (spot_id, visit_id) = path.into_inner();
    service.delete_visit(spot_id, visit_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// POST /spots/{id}/ai/apply
/// Apply a previewed completion; undo stays available for the configured window
pub async fn apply_completion(
    service: web::Data<SpotService>,
    path: web::Path<Uuid>,
    req: web::Json<AiCompletion>,
) -> Result<impl Responder, SpotsError> {
    let spot = service
        .apply_completion(path.into_inner(), &req.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(spot))
}

/// Configuration for spot routes
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/spots")
            .route("", web::get().to(list_spots))
            .route("", web::post().to(create_spot))
            .route("/tags", web::get().to(list_tags))
            .route("/{id}", web::get().to(get_spot))
            .route("/{id}", web::put().to(save_spot))
            .route("/{id}", web::patch().to(patch_spot))
            .route("/{id}", web::delete().to(delete_spot))
            .route("/{id}/pin", web::post().to(toggle_pin))
            .route("/{id}/visits", web::post().to(create_visit))
            .route("/{id}/visits/{visit_id}", web::put().to(update_visit))
            .route("/{id}/visits/{visit_id}", web::delete().to(delete_visit))
            .route("/{id}/ai/apply", web::post().to(apply_completion)),
    );
}
