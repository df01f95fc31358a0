// src/handlers/assist.rs
// DOCUMENTATION: HTTP handlers for quota-gated helpers
// PURPOSE: Photo uploads and AI completion, both checked against the plan
// before any collaborator is called

use crate::errors::SpotsError;
use crate::models::SpotDraft;
use crate::services::{SpotService, UploadFile};
use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadPayload {
    pub file_name: String,
    #[serde(default = "default_content_type")]
    pub content_type: String,
    pub bytes: Vec<u8>,
}

fn default_content_type() -> String {
    "application/octet-stream".to_string()
}

#[derive(Debug, Deserialize)]
pub struct UploadRequest {
    pub files: Vec<UploadPayload>,
}

#[derive(Debug, Deserialize)]
pub struct CompletionRequest {
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct DraftCompletionRequest {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub draft: SpotDraft,
}

/// POST /uploads
/// Per-file failures are listed in the response; they never fail the batch
pub async fn upload_photos(
    service: web::Data<SpotService>,
    req: web::Json<UploadRequest>,
) -> Result<impl Responder, SpotsError> {
    let files = req
        .into_inner()
        .files
        .into_iter()
        .map(|f| UploadFile {
            file_name: f.file_name,
            content_type: f.content_type,
            bytes: f.bytes,
        })
        .collect();
    let report = service.upload_photos(files).await?;
    Ok(HttpResponse::Ok().json(report))
}

/// POST /ai/completion
/// Preview only; nothing is written and no usage is counted
pub async fn fetch_completion(
    service: web::Data<SpotService>,
    req: web::Json<CompletionRequest>,
) -> Result<impl Responder, SpotsError> {
    let completion = service.fetch_completion(&req.url).await?;
    let message = if completion.is_empty() {
        Some("No new information found")
    } else {
        None
    };
    Ok(HttpResponse::Ok().json(json!({
        "completion": completion,
        "message": message
    })))
}

/// POST /ai/draft
pub async fn draft_completion(
    service: web::Data<SpotService>,
    req: web::Json<DraftCompletionRequest>,
) -> Result<impl Responder, SpotsError> {
    let req = req.into_inner();
    let (draft, completion) = service.draft_completion(&req.url, req.draft).await?;
    Ok(HttpResponse::Ok().json(json!({
        "draft": draft,
        "completion": completion
    })))
}

/// POST /ai/undo
pub async fn undo_completion(service: web::Data<SpotService>) -> Result<impl Responder, SpotsError> {
    match service.undo_completion().await? {
        Some(spot) => Ok(HttpResponse::Ok().json(spot)),
        None => Ok(HttpResponse::NoContent().finish()),
    }
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/uploads", web::post().to(upload_photos))
        .service(
            web::scope("/ai")
                .route("/completion", web::post().to(fetch_completion))
                .route("/draft", web::post().to(draft_completion))
                .route("/undo", web::post().to(undo_completion)),
        );
}
