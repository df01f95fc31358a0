// src/services/spot_service.rs
// DOCUMENTATION: Application facade over the spot engine
// PURPOSE: Wire the session, coordinator, pairing, usage limiter and
// collaborators together into the operations the UI shell calls

use crate::db::RemoteStore;
use crate::errors::SpotsError;
use crate::models::*;
use crate::services::ai_client::{AiCompletion, AiExtractor};
use crate::services::coordinator::{CoordinatorSettings, SpotCoordinator};
use crate::services::entitlements::LocalEntitlements;
use crate::services::local_state::KeyValueStore;
use crate::services::mapper::{available_tags, list_view};
use crate::services::pairing::{PairingService, PairingStatus};
use crate::services::session::{AuthSession, SessionUser};
use crate::services::storage_client::{object_path, ObjectStorage};
use crate::services::usage::{check_ai_quota, check_photo_quota, current_month, UsageLimiter};
use crate::services::visibility::Viewer;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// What the shell needs right after sign-in
#[derive(Debug, Serialize)]
pub struct SessionSummary {
    pub user_id: Uuid,
    pub plan: Plan,
    pub pairing: PairingStatus,
    pub spot_count: usize,
}

/// One file of an upload batch
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Serialize)]
pub struct UploadFailure {
    pub file_name: String,
    pub message: String,
}

/// Uploaded photos (temporary ids, not yet attached) and per-file failures
#[derive(Debug, Default, Serialize)]
pub struct UploadReport {
    pub photos: Vec<Photo>,
    pub failures: Vec<UploadFailure>,
}

pub struct SpotService {
    session: AuthSession,
    coordinator: SpotCoordinator,
    pairing: PairingService,
    usage: UsageLimiter,
    store: Arc<dyn RemoteStore>,
    ai: Arc<dyn AiExtractor>,
    storage: Arc<dyn ObjectStorage>,
    plan: RwLock<Plan>,
}

impl SpotService {
    pub fn new(
        store: Arc<dyn RemoteStore>,
        state: Arc<dyn KeyValueStore>,
        ai: Arc<dyn AiExtractor>,
        storage: Arc<dyn ObjectStorage>,
        settings: CoordinatorSettings,
    ) -> Self {
        let entitlements = Arc::new(LocalEntitlements::new(state.clone()));
        Self {
            session: AuthSession::new(),
            coordinator: SpotCoordinator::new(store.clone(), settings),
            pairing: PairingService::new(store.clone()),
            usage: UsageLimiter::new(state, entitlements),
            store,
            ai,
            storage,
            plan: RwLock::new(Plan::Free),
        }
    }

    pub fn session(&self) -> &AuthSession {
        &self.session
    }

    pub fn coordinator(&self) -> &SpotCoordinator {
        &self.coordinator
    }

    pub async fn plan(&self) -> Plan {
        *self.plan.read().await
    }

    async fn reload_plan(&self, user_id: Uuid, mutually_paired: bool) -> Result<Plan, SpotsError> {
        let plan = self.usage.resolve_plan(user_id, mutually_paired).await?;
        *self.plan.write().await = plan;
        Ok(plan)
    }

    /// Refresh whose failure leaves the current list in place
    async fn refresh_quietly(&self) -> usize {
        match self.coordinator.refresh().await {
            Ok(count) => count,
            Err(e) => {
                log::warn!("Spot refresh failed, keeping current list: {}", e);
                self.coordinator.spots().await.len()
            }
        }
    }

    /// Load profile, then plan, then spots for a new session
    pub async fn sign_in(&self, user: SessionUser) -> Result<SessionSummary, SpotsError> {
        let profile = self.pairing.ensure_profile(user.id, user.email.clone()).await?;
        let pairing = self.pairing.status(user.id).await?;
        let plan = self.reload_plan(user.id, pairing.is_connected()).await?;

        self.session.sign_in(user.clone());
        self.coordinator.clear().await;
        self.coordinator
            .set_viewer(Viewer::new(user.id, profile.partner_id))
            .await;
        let spot_count = self.refresh_quietly().await;

        log::info!(
            "Signed in {} on {} plan with {} spots",
            user.id,
            plan.as_str(),
            spot_count
        );
        Ok(SessionSummary {
            user_id: user.id,
            plan,
            pairing,
            spot_count,
        })
    }

    pub async fn sign_out(&self) {
        self.coordinator.clear().await;
        *self.plan.write().await = Plan::Free;
        self.session.sign_out();
    }

    pub async fn list(&self, view: ListView, criteria: &FilterCriteria) -> Result<Vec<Spot>, SpotsError> {
        self.session.user_id()?;
        Ok(list_view(&self.coordinator.spots().await, view, criteria))
    }

    pub async fn tags(&self) -> Result<Vec<String>, SpotsError> {
        self.session.user_id()?;
        Ok(available_tags(&self.coordinator.spots().await))
    }

    pub async fn spot(&self, id: Uuid) -> Result<Spot, SpotsError> {
        self.session.user_id()?;
        self.coordinator.spot(id).await
    }

    pub async fn save_spot(&self, draft: SpotDraft) -> Result<Spot, SpotsError> {
        self.coordinator.save_spot(draft).await
    }

    pub async fn update_spot(&self, id: Uuid, patch: SpotPatch) -> Result<Spot, SpotsError> {
        self.coordinator.update_spot(id, patch).await
    }

    pub async fn toggle_pin(&self, id: Uuid) -> Result<Spot, SpotsError> {
        self.coordinator.toggle_pin(id).await
    }

    pub async fn delete_spot(&self, id: Uuid) -> Result<(), SpotsError> {
        self.coordinator.delete_spot(id).await
    }

    pub async fn save_visit(&self, spot_id: Uuid, draft: VisitDraft) -> Result<Visit, SpotsError> {
        self.coordinator.save_visit(spot_id, draft).await
    }

    pub async fn delete_visit(&self, spot_id: Uuid, visit_id: Uuid) -> Result<(), SpotsError> {
        self.coordinator.delete_visit(spot_id, visit_id).await
    }

    pub async fn usage_stats(&self) -> Result<UsageStats, SpotsError> {
        let user_id = self.session.user_id()?;
        Ok(self
            .usage
            .stats(&self.coordinator.spots().await, user_id, &current_month())
            .await)
    }

    pub async fn usage_report(&self) -> Result<UsageReport, SpotsError> {
        let usage = self.usage_stats().await?;
        let plan = self.plan().await;
        Ok(UsageReport {
            plan,
            limits: plan.limits(),
            usage,
        })
    }

    /// Quota-check the whole batch, then upload one file after another
    /// DOCUMENTATION: A failed file is reported and the remaining files are
    /// still uploaded. The returned photos carry temporary ids and are attached
    /// by the next spot or visit save.
    pub async fn upload_photos(&self, files: Vec<UploadFile>) -> Result<UploadReport, SpotsError> {
        let user_id = self.session.user_id()?;
        let usage = self.usage_stats().await?;
        check_photo_quota(self.plan().await, &usage, files.len() as u32)?;

        let mut report = UploadReport::default();
        for file in files {
            let path = object_path(&file.file_name);
            match self.storage.upload(&path, file.bytes, &file.content_type).await {
                Ok(url) => report.photos.push(Photo::uploaded(url, user_id)),
                Err(e) => {
                    log::error!("Upload of {} failed: {}", file.file_name, e);
                    report.failures.push(UploadFailure {
                        file_name: file.file_name,
                        message: e.to_string(),
                    });
                }
            }
        }
        Ok(report)
    }

    /// Ask the AI collaborator about `url` once the monthly quota allows it
    pub async fn fetch_completion(&self, url: &str) -> Result<AiCompletion, SpotsError> {
        self.session.user_id()?;
        let url = url.trim();
        if url.is_empty() {
            return Err(SpotsError::field("url", "required", "Enter a URL first"));
        }
        let usage = self.usage_stats().await?;
        check_ai_quota(self.plan().await, &usage)?;

        self.ai.extract(url).await
    }

    /// Apply a previewed completion to an existing spot; counts usage and arms the undo
    pub async fn apply_completion(
        &self,
        spot_id: Uuid,
        completion: &AiCompletion,
    ) -> Result<Spot, SpotsError> {
        let user_id = self.session.user_id()?;
        if completion.is_empty() {
            return Err(SpotsError::InvalidInput("no new information".to_string()));
        }
        let spot = self
            .coordinator
            .apply_ai_completion(spot_id, completion.to_patch())
            .await?;
        self.usage.record_ai_use(user_id, &current_month()).await?;
        Ok(spot)
    }

    /// Fill a new-spot draft from `url`; usage counts as soon as the extraction succeeds
    pub async fn draft_completion(
        &self,
        url: &str,
        mut draft: SpotDraft,
    ) -> Result<(SpotDraft, AiCompletion), SpotsError> {
        let user_id = self.session.user_id()?;
        let completion = self.fetch_completion(url).await?;
        self.usage.record_ai_use(user_id, &current_month()).await?;

        completion.merge_into_draft(&mut draft);
        if draft.url.as_deref().map_or(true, |u| u.trim().is_empty()) {
            draft.url = Some(url.trim().to_string());
        }
        Ok((draft, completion))
    }

    pub async fn undo_completion(&self) -> Result<Option<Spot>, SpotsError> {
        self.session.user_id()?;
        self.coordinator.undo_ai_completion().await
    }

    /// Fresh pairing status; the plan follows the mutual state
    pub async fn pairing_status(&self) -> Result<PairingStatus, SpotsError> {
        let user_id = self.session.user_id()?;
        let status = self.pairing.status(user_id).await?;
        self.reload_plan(user_id, status.is_connected()).await?;
        Ok(status)
    }

    pub async fn submit_pairing_code(&self, code: &str) -> Result<PairingStatus, SpotsError> {
        let user_id = self.session.user_id()?;
        let status = self.pairing.submit_code(user_id, code).await?;
        self.reload_plan(user_id, status.is_connected()).await?;

        self.coordinator
            .set_viewer(Viewer::new(user_id, status.partner_id))
            .await;
        self.refresh_quietly().await;
        Ok(status)
    }

    /// Record a checkout, or drop the subscription when moving to free
    pub async fn change_plan(&self, plan: Plan) -> Result<UsageReport, SpotsError> {
        let user_id = self.session.user_id()?;
        self.usage
            .entitlements()
            .record_subscription(user_id, plan)
            .await?;
        let status = self.pairing.status(user_id).await?;
        let effective = self.reload_plan(user_id, status.is_connected()).await?;
        log::info!(
            "Plan of {} changed to {} (effective {})",
            user_id,
            plan.as_str(),
            effective.as_str()
        );
        self.usage_report().await
    }

    /// Delete the profile row; the session only ends when that succeeded
    pub async fn delete_account(&self) -> Result<(), SpotsError> {
        let user_id = self.session.user_id()?;
        if let Err(e) = self.store.delete_profile(user_id).await {
            log::error!("Account deletion for {} failed: {}", user_id, e);
            return Err(e);
        }
        self.sign_out().await;
        Ok(())
    }
}
