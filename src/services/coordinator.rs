// src/services/coordinator.rs
// DOCUMENTATION: Optimistic mutation coordinator
// PURPOSE: Single owner of the in-memory spot list. Every mutation is applied
// locally first, then written remotely in a fixed order, then followed by a
// full re-fetch of the visible set.

use crate::config::Config;
use crate::db::RemoteStore;
use crate::errors::SpotsError;
use crate::models::*;
use crate::services::mapper::map_spots;
use crate::services::photo_diff::PhotoPlan;
use crate::services::visibility::{filter_visible, Viewer};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{broadcast, Mutex, RwLock};
use uuid::Uuid;
use validator::Validate;

/// Tunables of the coordinator
#[derive(Debug, Clone)]
pub struct CoordinatorSettings {
    pub placeholder_cover_url: String,
    pub undo_window: Duration,
    /// Restore the pre-mutation list when the remote write fails
    pub rollback_on_failure: bool,
    /// Delete visit-owned photos as part of a spot delete
    pub purge_visit_photos_on_spot_delete: bool,
}

impl Default for CoordinatorSettings {
    fn default() -> Self {
        Self {
            placeholder_cover_url: "https://example.com/placeholder.jpg".to_string(),
            undo_window: Duration::from_secs(10),
            rollback_on_failure: false,
            purge_visit_photos_on_spot_delete: false,
        }
    }
}

impl CoordinatorSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            placeholder_cover_url: config.placeholder_cover_url.clone(),
            undo_window: Duration::from_secs(config.undo_window_secs),
            rollback_on_failure: config.rollback_on_failure,
            purge_visit_photos_on_spot_delete: config.purge_visit_photos_on_spot_delete,
        }
    }
}

/// Notifications published to views of the spot list
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    /// The list was replaced by a full re-fetch with this many spots
    Refreshed(usize),
    /// Views showing this spot must navigate away
    SpotRemoved(Uuid),
    /// A mutation and its follow-up refresh have both finished
    Settled,
}

/// Pre-apply values of the fields an AI completion touched
#[derive(Debug, Clone)]
struct UndoSnapshot {
    spot_id: Uuid,
    fields: SpotPatch,
    expires_at: Instant,
}

pub struct SpotCoordinator {
    store: Arc<dyn RemoteStore>,
    settings: CoordinatorSettings,
    viewer: RwLock<Option<Viewer>>,
    spots: RwLock<Vec<Spot>>,
    undo: Mutex<Option<UndoSnapshot>>,
    events: broadcast::Sender<StoreEvent>,
}

impl SpotCoordinator {
    pub fn new(store: Arc<dyn RemoteStore>, settings: CoordinatorSettings) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            store,
            settings,
            viewer: RwLock::new(None),
            spots: RwLock::new(Vec::new()),
            undo: Mutex::new(None),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    pub fn settings(&self) -> &CoordinatorSettings {
        &self.settings
    }

    pub async fn set_viewer(&self, viewer: Viewer) {
        *self.viewer.write().await = Some(viewer);
    }

    /// Forget the session: no viewer, empty list, no pending undo
    pub async fn clear(&self) {
        *self.viewer.write().await = None;
        self.spots.write().await.clear();
        *self.undo.lock().await = None;
    }

    pub async fn viewer(&self) -> Result<Viewer, SpotsError> {
        self.viewer.read().await.ok_or(SpotsError::Unauthorized)
    }

    /// Snapshot of the current list
    pub async fn spots(&self) -> Vec<Spot> {
        self.spots.read().await.clone()
    }

    pub async fn spot(&self, id: Uuid) -> Result<Spot, SpotsError> {
        self.spots
            .read()
            .await
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or_else(|| SpotsError::NotFound(format!("spot {}", id)))
    }

    /// Fetch, filter and map the visible set, replacing the list wholesale
    pub async fn refresh(&self) -> Result<usize, SpotsError> {
        let viewer = self.viewer().await?;
        let rows = self.store.fetch_spots(&viewer.owner_ids()).await?;
        let visible = filter_visible(rows, &viewer);
        let spots = map_spots(visible, &self.settings.placeholder_cover_url);
        let count = spots.len();

        *self.spots.write().await = spots;
        log::info!("Refreshed {} visible spots for user {}", count, viewer.user_id);
        let _ = self.events.send(StoreEvent::Refreshed(count));
        Ok(count)
    }

    async fn settle(&self) {
        if let Err(e) = self.refresh().await {
            log::warn!("Refresh after mutation failed: {}", e);
        }
        let _ = self.events.send(StoreEvent::Settled);
    }

    async fn backup(&self) -> Option<Vec<Spot>> {
        if self.settings.rollback_on_failure {
            Some(self.spots.read().await.clone())
        } else {
            None
        }
    }

    /// Log a failed remote write, optionally restore the backup, then settle
    async fn finish<T>(
        &self,
        action: &str,
        result: Result<T, SpotsError>,
        backup: Option<Vec<Spot>>,
    ) -> Result<T, SpotsError> {
        if let Err(e) = &result {
            log::error!("{} failed: {}", action, e);
            if let Some(previous) = backup {
                log::warn!("Rolling back optimistic {}", action);
                *self.spots.write().await = previous;
            }
        }
        self.settle().await;
        result
    }

    async fn with_spot<R>(
        &self,
        id: Uuid,
        f: impl FnOnce(&mut Spot) -> R,
    ) -> Result<R, SpotsError> {
        let mut spots = self.spots.write().await;
        let spot = spots
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| SpotsError::NotFound(format!("spot {}", id)))?;
        Ok(f(spot))
    }

    /// Delete removed persisted photos, then insert new ones, for a parent with a permanent id
    async fn reconcile_photos(
        &self,
        parent: PhotoParent,
        submitted: Option<&[Photo]>,
        uploader_id: Uuid,
    ) -> Result<PhotoPlan, SpotsError> {
        let Some(submitted) = submitted else {
            return Ok(PhotoPlan::default());
        };
        let persisted = self.store.photo_ids(parent).await?;
        let plan = PhotoPlan::diff(parent, &persisted, submitted, uploader_id);
        if !plan.delete.is_empty() {
            self.store.delete_photos(&plan.delete).await?;
        }
        if !plan.insert.is_empty() {
            self.store.insert_photos(&plan.insert).await?;
        }
        log::debug!(
            "Photo reconcile for {:?}: {} deleted, {} inserted",
            parent,
            plan.delete.len(),
            plan.insert.len()
        );
        Ok(plan)
    }

    /// Create a spot (no id) or fully save an existing one, reconciling its photos
    pub async fn save_spot(&self, draft: SpotDraft) -> Result<Spot, SpotsError> {
        let viewer = self.viewer().await?;
        draft.check()?;
        match draft.id {
            None => self.create_spot(viewer, draft).await,
            Some(id) => self.full_save_spot(viewer, id, draft).await,
        }
    }

    async fn create_spot(&self, viewer: Viewer, draft: SpotDraft) -> Result<Spot, SpotsError> {
        let backup = self.backup().await;
        let pending = Spot::pending(&draft, viewer.user_id, &self.settings.placeholder_cover_url);
        let temp_id = pending.id.clone();
        self.spots.write().await.insert(0, pending.clone());

        let result = async {
            let id = self
                .store
                .insert_spot(&draft.to_insert_row(viewer.user_id))
                .await?;
            if let Some(spot) = self
                .spots
                .write()
                .await
                .iter_mut()
                .find(|s| s.id == temp_id)
            {
                spot.id = EntityId::Persisted(id);
            }
            self.reconcile_photos(PhotoParent::Spot(id), draft.photos.as_deref(), viewer.user_id)
                .await?;
            Ok::<Uuid, SpotsError>(id)
        }
        .await;

        let id = self.finish("Create spot", result, backup).await?;
        Ok(self.spot(id).await.unwrap_or(Spot {
            id: EntityId::Persisted(id),
            ..pending
        }))
    }

    async fn full_save_spot(
        &self,
        viewer: Viewer,
        id: Uuid,
        draft: SpotDraft,
    ) -> Result<Spot, SpotsError> {
        let backup = self.backup().await;
        let changes = draft.to_changes();
        let placeholder = self.settings.placeholder_cover_url.clone();
        self.with_spot(id, |spot| {
            spot.apply_changes(&changes, &placeholder);
            if let Some(photos) = &draft.photos {
                spot.photos = photos.clone();
            }
        })
        .await?;

        let result = async {
            self.store.update_spot(id, &changes).await?;
            self.reconcile_photos(PhotoParent::Spot(id), draft.photos.as_deref(), viewer.user_id)
                .await?;
            Ok::<(), SpotsError>(())
        }
        .await;

        self.finish("Save spot", result, backup).await?;
        self.spot(id).await
    }

    /// Partial update: only the fields the patch defines are written
    pub async fn update_spot(&self, id: Uuid, patch: SpotPatch) -> Result<Spot, SpotsError> {
        self.viewer().await?;
        let current = self.spot(id).await?;
        patch.check_against(&current)?;
        self.patch_spot(id, patch).await
    }

    async fn patch_spot(&self, id: Uuid, patch: SpotPatch) -> Result<Spot, SpotsError> {
        let changes = patch.to_changes();
        if changes.is_empty() {
            return self.spot(id).await;
        }

        let backup = self.backup().await;
        let placeholder = self.settings.placeholder_cover_url.clone();
        self.with_spot(id, |spot| spot.apply_changes(&changes, &placeholder))
            .await?;

        let result = self.store.update_spot(id, &changes).await;
        self.finish("Update spot", result, backup).await?;
        self.spot(id).await
    }

    pub async fn toggle_pin(&self, id: Uuid) -> Result<Spot, SpotsError> {
        let current = self.spot(id).await?;
        self.update_spot(
            id,
            SpotPatch {
                is_pinned: Some(!current.is_pinned),
                ..Default::default()
            },
        )
        .await
    }

    /// Cascade delete: photos, then visits, then the spot row
    pub async fn delete_spot(&self, id: Uuid) -> Result<(), SpotsError> {
        self.viewer().await?;
        self.spot(id).await?;
        let backup = self.backup().await;
        self.spots.write().await.retain(|s| s.id != id);

        let result = async {
            if self.settings.purge_visit_photos_on_spot_delete {
                for visit_id in self.store.visit_ids_by_spot(id).await? {
                    self.store
                        .delete_photos_by_parent(PhotoParent::Visit(visit_id))
                        .await?;
                }
            }
            self.store
                .delete_photos_by_parent(PhotoParent::Spot(id))
                .await?;
            self.store.delete_visits_by_spot(id).await?;
            self.store.delete_spot(id).await
        }
        .await;

        if result.is_ok() || !self.settings.rollback_on_failure {
            let _ = self.events.send(StoreEvent::SpotRemoved(id));
        }
        self.finish("Delete spot", result, backup).await
    }

    /// Create or update a visit, reconcile its photos and force the spot to `visited`
    pub async fn save_visit(&self, spot_id: Uuid, draft: VisitDraft) -> Result<Visit, SpotsError> {
        let viewer = self.viewer().await?;
        draft.validate()?;

        let backup = self.backup().await;
        let local = draft.to_visit(spot_id, viewer.user_id);
        self.with_spot(spot_id, |spot| {
            match spot.visits.iter_mut().find(|v| v.id == local.id) {
                Some(existing) => *existing = local.clone(),
                None => spot.visits.push(local.clone()),
            }
            spot.visits.sort_by(|a, b| b.visited_at.cmp(&a.visited_at));
            spot.status = SpotStatus::Visited;
            spot.recompute_derived();
        })
        .await?;

        let payload = draft.to_payload(spot_id, viewer.user_id);
        let written = async {
            let visit_id = match draft.persisted_id() {
                Some(id) => {
                    self.store.update_visit(id, &payload).await?;
                    id
                }
                None => self.store.insert_visit(&payload).await?,
            };
            self.reconcile_photos(
                PhotoParent::Visit(visit_id),
                draft.photos.as_deref(),
                viewer.user_id,
            )
            .await?;
            Ok::<Uuid, SpotsError>(visit_id)
        }
        .await;

        let status = self
            .store
            .update_spot(spot_id, &SpotChanges::status(SpotStatus::Visited))
            .await;
        let result = match (written, status) {
            (Ok(id), Ok(())) => Ok(id),
            (Err(e), _) | (Ok(_), Err(e)) => Err(e),
        };

        let visit_id = self.finish("Save visit", result, backup).await?;
        let refreshed = self.spot(spot_id).await.ok().and_then(|spot| {
            spot.visits
                .into_iter()
                .find(|v| v.id == visit_id)
        });
        Ok(refreshed.unwrap_or(Visit {
            id: EntityId::Persisted(visit_id),
            ..local
        }))
    }

    /// Delete a visit's photos, then the visit
    pub async fn delete_visit(&self, spot_id: Uuid, visit_id: Uuid) -> Result<(), SpotsError> {
        self.viewer().await?;
        let backup = self.backup().await;
        self.with_spot(spot_id, |spot| {
            spot.visits.retain(|v| v.id != visit_id);
            spot.recompute_derived();
        })
        .await?;

        let result = async {
            self.store
                .delete_photos_by_parent(PhotoParent::Visit(visit_id))
                .await?;
            self.store.delete_visit(visit_id).await
        }
        .await;

        self.finish("Delete visit", result, backup).await
    }

    /// Apply an AI field completion and arm the undo window
    pub async fn apply_ai_completion(
        &self,
        spot_id: Uuid,
        patch: SpotPatch,
    ) -> Result<Spot, SpotsError> {
        self.viewer().await?;
        let current = self.spot(spot_id).await?;
        patch.check_against(&current)?;

        *self.undo.lock().await = Some(UndoSnapshot {
            spot_id,
            fields: current.snapshot_for(&patch),
            expires_at: Instant::now() + self.settings.undo_window,
        });
        self.patch_spot(spot_id, patch).await
    }

    pub async fn undo_available(&self) -> bool {
        self.undo
            .lock()
            .await
            .as_ref()
            .map(|u| Instant::now() < u.expires_at)
            .unwrap_or(false)
    }

    /// Restore the fields the last AI apply touched; a no-op once the window has passed
    pub async fn undo_ai_completion(&self) -> Result<Option<Spot>, SpotsError> {
        let snapshot = self.undo.lock().await.take();
        match snapshot {
            Some(s) if Instant::now() < s.expires_at => {
                log::info!("Undoing AI completion on spot {}", s.spot_id);
                self.patch_spot(s.spot_id, s.fields).await.map(Some)
            }
            Some(_) => {
                log::debug!("Undo window expired");
                Ok(None)
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::{MemoryStore, StoreOp};
    use chrono::NaiveDate;
    use tokio_test::{assert_err, assert_ok};

    struct Fixture {
        store: Arc<MemoryStore>,
        coordinator: SpotCoordinator,
        me: Uuid,
    }

    async fn fixture(settings: CoordinatorSettings) -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let me = Uuid::new_v4();
        let coordinator = SpotCoordinator::new(store.clone(), settings);
        coordinator.set_viewer(Viewer::new(me, None)).await;
        Fixture {
            store,
            coordinator,
            me,
        }
    }

    fn draft(name: &str) -> SpotDraft {
        SpotDraft {
            name: name.to_string(),
            ..Default::default()
        }
    }

    fn visit(rating: i32) -> VisitDraft {
        VisitDraft {
            id: None,
            visited_at: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            rating,
            memo: Some("lunch".into()),
            bill: Some(1200.0),
            photos: None,
        }
    }

    fn photo(id: Uuid) -> Photo {
        Photo {
            id: EntityId::Persisted(id),
            url: format!("https://cdn.example/{}.jpg", id),
            spot_id: None,
            visit_id: None,
            uploader_id: None,
        }
    }

    #[tokio::test]
    async fn test_create_spot_then_refresh() {
        let f = fixture(CoordinatorSettings::default()).await;
        let spot = assert_ok!(f.coordinator.save_spot(draft("Cafe A")).await);

        let spots = f.coordinator.spots().await;
        assert_eq!(spots.len(), 1);
        assert_eq!(spots[0].name, "Cafe A");
        assert_eq!(spots[0].status, SpotStatus::WantToGo);
        assert_eq!(spots[0].rating, None);
        assert_eq!(spots[0].visit_count, 0);
        assert!(!spot.id.is_temporary());
        assert_eq!(f.store.ops(), vec![StoreOp::InsertSpot("Cafe A".into())]);
    }

    #[tokio::test]
    async fn test_invalid_draft_never_reaches_store() {
        let f = fixture(CoordinatorSettings::default()).await;
        let result = f.coordinator.save_spot(draft("  ")).await;
        assert!(matches!(result, Err(SpotsError::Validation(_))));
        assert!(f.store.ops().is_empty());
        assert!(f.coordinator.spots().await.is_empty());
    }

    #[tokio::test]
    async fn test_full_save_diffs_photos() {
        let f = fixture(CoordinatorSettings::default()).await;
        let spot_id = f.store.seed_spot(f.me, "Cafe A", SpotScope::Personal);
        let a = f.store.seed_photo(PhotoParent::Spot(spot_id), f.me);
        let b = f.store.seed_photo(PhotoParent::Spot(spot_id), f.me);
        let c = f.store.seed_photo(PhotoParent::Spot(spot_id), f.me);
        f.coordinator.refresh().await.unwrap();

        let new_photo = Photo::uploaded("https://cdn.example/d.jpg".into(), f.me);
        let mut d = draft("Cafe A");
        d.id = Some(spot_id);
        d.photos = Some(vec![photo(b), photo(c), new_photo]);
        assert_ok!(f.coordinator.save_spot(d).await);

        let ops = f.store.ops();
        assert!(matches!(ops[0], StoreOp::UpdateSpot(id, _) if id == spot_id));
        assert_eq!(ops[1], StoreOp::DeletePhotos(vec![a]));
        assert_eq!(ops[2], StoreOp::InsertPhoto("https://cdn.example/d.jpg".into()));
        assert_eq!(ops.len(), 3);

        let saved = f.coordinator.spot(spot_id).await.unwrap();
        assert_eq!(saved.photos.len(), 3);
        assert_eq!(saved.cover_photo_url, saved.photos[0].url);
    }

    #[tokio::test]
    async fn test_full_save_keeps_status_and_pin_when_not_supplied() {
        let f = fixture(CoordinatorSettings::default()).await;
        let spot_id = f.store.seed_spot(f.me, "Cafe A", SpotScope::Personal);
        f.coordinator.refresh().await.unwrap();
        f.coordinator.toggle_pin(spot_id).await.unwrap();

        let mut d = draft("Cafe A+");
        d.id = Some(spot_id);
        let saved = f.coordinator.save_spot(d).await.unwrap();
        assert!(saved.is_pinned);
        assert_eq!(saved.name, "Cafe A+");
    }

    #[tokio::test]
    async fn test_patch_writes_only_defined_fields_and_is_idempotent() {
        let f = fixture(CoordinatorSettings::default()).await;
        let spot_id = f.store.seed_spot(f.me, "Cafe A", SpotScope::Personal);
        f.coordinator.refresh().await.unwrap();

        let patch = SpotPatch {
            memo: Some(Some("good coffee".into())),
            ..Default::default()
        };
        let once = f.coordinator.update_spot(spot_id, patch.clone()).await.unwrap();
        let twice = f.coordinator.update_spot(spot_id, patch).await.unwrap();
        assert_eq!(once, twice);

        match &f.store.ops()[0] {
            StoreOp::UpdateSpot(_, changes) => {
                assert_eq!(changes.memo, Some(Some("good coffee".into())));
                assert_eq!(changes.name, None);
                assert_eq!(changes.status, None);
            }
            other => panic!("unexpected op: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_save_visit_forces_visited() {
        let f = fixture(CoordinatorSettings::default()).await;
        let spot_id = f.store.seed_spot(f.me, "Cafe A", SpotScope::Personal);
        f.coordinator.refresh().await.unwrap();
        f.coordinator
            .update_spot(
                spot_id,
                SpotPatch {
                    status: Some(SpotStatus::Revisit),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let saved = assert_ok!(f.coordinator.save_visit(spot_id, visit(4)).await);
        assert!(!saved.id.is_temporary());

        let spot = f.coordinator.spot(spot_id).await.unwrap();
        assert_eq!(spot.status, SpotStatus::Visited);
        assert_eq!(spot.visit_count, 1);
        assert_eq!(spot.rating, Some(4.0));
        assert_eq!(
            f.store.ops().last(),
            Some(&StoreOp::UpdateSpot(
                spot_id,
                SpotChanges::status(SpotStatus::Visited)
            ))
        );
    }

    #[tokio::test]
    async fn test_update_visit_reconciles_visit_photos() {
        let f = fixture(CoordinatorSettings::default()).await;
        let spot_id = f.store.seed_spot(f.me, "Cafe A", SpotScope::Personal);
        let day = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let visit_id = f.store.seed_visit(spot_id, f.me, day, 2);
        let old = f.store.seed_photo(PhotoParent::Visit(visit_id), f.me);
        f.coordinator.refresh().await.unwrap();
        f.store.clear_ops();

        let mut d = visit(5);
        d.id = Some(EntityId::Persisted(visit_id));
        d.photos = Some(vec![Photo::uploaded("https://cdn.example/v.jpg".into(), f.me)]);
        f.coordinator.save_visit(spot_id, d).await.unwrap();

        let ops = f.store.ops();
        assert_eq!(ops[0], StoreOp::UpdateVisit(visit_id));
        assert_eq!(ops[1], StoreOp::DeletePhotos(vec![old]));
        assert_eq!(ops[2], StoreOp::InsertPhoto("https://cdn.example/v.jpg".into()));
        let rows = f.store.photo_rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].visit_id, Some(visit_id));
        assert_eq!(rows[0].spot_id, None);
    }

    #[tokio::test]
    async fn test_delete_spot_cascade_order() {
        let f = fixture(CoordinatorSettings::default()).await;
        let spot_id = f.store.seed_spot(f.me, "Cafe A", SpotScope::Personal);
        let day = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let visit_id = f.store.seed_visit(spot_id, f.me, day, 3);
        f.store.seed_photo(PhotoParent::Visit(visit_id), f.me);
        f.coordinator.refresh().await.unwrap();
        let mut events = f.coordinator.subscribe();

        assert_ok!(f.coordinator.delete_spot(spot_id).await);
        assert_eq!(
            f.store.ops(),
            vec![
                StoreOp::DeletePhotosByParent(PhotoParent::Spot(spot_id)),
                StoreOp::DeleteVisitsBySpot(spot_id),
                StoreOp::DeleteSpot(spot_id),
            ]
        );
        assert_eq!(events.recv().await.unwrap(), StoreEvent::SpotRemoved(spot_id));
        assert!(f.coordinator.spots().await.is_empty());
        // visit-owned photo is left behind unless purging is enabled
        assert_eq!(f.store.photo_rows().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_spot_can_purge_visit_photos() {
        let settings = CoordinatorSettings {
            purge_visit_photos_on_spot_delete: true,
            ..Default::default()
        };
        let f = fixture(settings).await;
        let spot_id = f.store.seed_spot(f.me, "Cafe A", SpotScope::Personal);
        let day = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let visit_id = f.store.seed_visit(spot_id, f.me, day, 3);
        f.store.seed_photo(PhotoParent::Visit(visit_id), f.me);
        f.coordinator.refresh().await.unwrap();

        f.coordinator.delete_spot(spot_id).await.unwrap();
        assert_eq!(
            f.store.ops()[0],
            StoreOp::DeletePhotosByParent(PhotoParent::Visit(visit_id))
        );
        assert!(f.store.photo_rows().is_empty());
    }

    #[tokio::test]
    async fn test_failed_write_keeps_optimistic_state_by_default() {
        let f = fixture(CoordinatorSettings::default()).await;
        f.store.set_fail_writes(true);
        f.store.set_fail_reads(true);

        assert_err!(f.coordinator.save_spot(draft("Offline Cafe")).await);
        let spots = f.coordinator.spots().await;
        assert_eq!(spots.len(), 1);
        assert!(spots[0].id.is_temporary());
    }

    #[tokio::test]
    async fn test_failed_write_rolls_back_when_enabled() {
        let settings = CoordinatorSettings {
            rollback_on_failure: true,
            ..Default::default()
        };
        let f = fixture(settings).await;
        f.store.set_fail_writes(true);
        f.store.set_fail_reads(true);

        assert_err!(f.coordinator.save_spot(draft("Offline Cafe")).await);
        assert!(f.coordinator.spots().await.is_empty());
    }

    #[tokio::test]
    async fn test_mutation_settles_after_refresh() {
        let f = fixture(CoordinatorSettings::default()).await;
        let mut events = f.coordinator.subscribe();
        f.coordinator.save_spot(draft("Cafe A")).await.unwrap();
        assert_eq!(events.recv().await.unwrap(), StoreEvent::Refreshed(1));
        assert_eq!(events.recv().await.unwrap(), StoreEvent::Settled);
    }

    #[tokio::test]
    async fn test_undo_restores_only_touched_fields() {
        let f = fixture(CoordinatorSettings::default()).await;
        let spot_id = f.store.seed_spot(f.me, "Cafe A", SpotScope::Personal);
        f.coordinator.refresh().await.unwrap();
        f.coordinator
            .update_spot(
                spot_id,
                SpotPatch {
                    memo: Some(Some("before".into())),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let completion = SpotPatch {
            memo: Some(Some("from ai".into())),
            address: Some(Some("Shibuya".into())),
            ..Default::default()
        };
        f.coordinator
            .apply_ai_completion(spot_id, completion)
            .await
            .unwrap();
        assert!(f.coordinator.undo_available().await);

        // edit of an untouched field between apply and undo survives the undo
        f.coordinator.toggle_pin(spot_id).await.unwrap();

        let restored = f.coordinator.undo_ai_completion().await.unwrap().unwrap();
        assert_eq!(restored.memo.as_deref(), Some("before"));
        assert_eq!(restored.address, None);
        assert_eq!(restored.name, "Cafe A");
        assert!(restored.is_pinned);
        assert!(!f.coordinator.undo_available().await);
    }

    #[tokio::test]
    async fn test_undo_expires_silently() {
        let settings = CoordinatorSettings {
            undo_window: Duration::from_millis(0),
            ..Default::default()
        };
        let f = fixture(settings).await;
        let spot_id = f.store.seed_spot(f.me, "Cafe A", SpotScope::Personal);
        f.coordinator.refresh().await.unwrap();
        f.coordinator
            .apply_ai_completion(
                spot_id,
                SpotPatch {
                    phone: Some(Some("03-1111-2222".into())),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(f.coordinator.undo_ai_completion().await.unwrap(), None);
        let spot = f.coordinator.spot(spot_id).await.unwrap();
        assert_eq!(spot.phone.as_deref(), Some("03-1111-2222"));
    }

    #[tokio::test]
    async fn test_no_viewer_is_unauthorized() {
        let store = Arc::new(MemoryStore::new());
        let coordinator = SpotCoordinator::new(store, CoordinatorSettings::default());
        assert!(matches!(
            coordinator.refresh().await,
            Err(SpotsError::Unauthorized)
        ));
    }
}
