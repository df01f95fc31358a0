// src/db/memory.rs
// DOCUMENTATION: In-memory remote store used by unit tests
// PURPOSE: Record every write so tests can assert exact remote call sequences

use crate::errors::SpotsError;
use crate::models::*;
use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use std::sync::Mutex;
use uuid::Uuid;

use super::{PhotoRepository, ProfileRepository, SpotRepository, VisitRepository};

/// Remote write observed by the store
#[derive(Debug, Clone, PartialEq)]
pub enum StoreOp {
    InsertSpot(String),
    UpdateSpot(Uuid, SpotChanges),
    DeleteSpot(Uuid),
    InsertVisit(Uuid),
    UpdateVisit(Uuid),
    DeleteVisit(Uuid),
    DeleteVisitsBySpot(Uuid),
    InsertPhoto(String),
    DeletePhotos(Vec<Uuid>),
    DeletePhotosByParent(PhotoParent),
    InsertProfile(Uuid),
    SetPartner(Uuid, Uuid),
    DeleteProfile(Uuid),
}

#[derive(Default)]
struct MemoryState {
    spots: Vec<SpotRow>,
    visits: Vec<VisitRow>,
    photos: Vec<PhotoRow>,
    profiles: Vec<UserProfile>,
    ops: Vec<StoreOp>,
    seq: i64,
    fail_writes: bool,
    fail_reads: bool,
}

impl MemoryState {
    fn next_timestamp(&mut self) -> chrono::DateTime<Utc> {
        self.seq += 1;
        Utc::now() + Duration::milliseconds(self.seq)
    }

    fn write(&mut self, op: StoreOp) -> Result<(), SpotsError> {
        if self.fail_writes {
            return Err(SpotsError::DatabaseError(format!("injected failure: {:?}", op)));
        }
        self.ops.push(op);
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ops(&self) -> Vec<StoreOp> {
        self.state.lock().unwrap().ops.clone()
    }

    pub fn clear_ops(&self) {
        self.state.lock().unwrap().ops.clear();
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.state.lock().unwrap().fail_writes = fail;
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.state.lock().unwrap().fail_reads = fail;
    }

    pub fn seed_profile(&self, id: Uuid, code: &str, partner_id: Option<Uuid>) -> UserProfile {
        let profile = UserProfile {
            id,
            email: Some(format!("{}@example.com", &code.to_lowercase())),
            pairing_code: code.to_string(),
            partner_id,
        };
        self.state.lock().unwrap().profiles.push(profile.clone());
        profile
    }

    pub fn seed_spot(&self, owner: Uuid, name: &str, scope: SpotScope) -> Uuid {
        let mut state = self.state.lock().unwrap();
        let id = Uuid::new_v4();
        let created_at = state.next_timestamp();
        state.spots.push(SpotRow {
            id,
            user_id: owner,
            name: name.to_string(),
            status: SpotStatus::WantToGo.as_str().to_string(),
            scope: scope.as_str().to_string(),
            cover_photo_url: None,
            is_pinned: Some(false),
            tags: Some(Vec::new()),
            url: None,
            memo: None,
            phone: None,
            address: None,
            opening_hours: None,
            price_min: None,
            price_max: None,
            payment_methods: None,
            created_at: Some(created_at),
            visits: None,
            photos: None,
        });
        id
    }

    pub fn seed_visit(&self, spot_id: Uuid, user: Uuid, date: NaiveDate, rating: i32) -> Uuid {
        let mut state = self.state.lock().unwrap();
        let id = Uuid::new_v4();
        let created_at = state.next_timestamp();
        state.visits.push(VisitRow {
            id,
            spot_id,
            user_id: Some(user),
            visited_at: date,
            rating,
            memo: None,
            bill: None,
            created_at: Some(created_at),
            photos: None,
        });
        id
    }

    pub fn seed_photo(&self, parent: PhotoParent, user: Uuid) -> Uuid {
        let mut state = self.state.lock().unwrap();
        let id = Uuid::new_v4();
        let created_at = state.next_timestamp();
        let row = NewPhotoRow::for_parent(parent, format!("https://cdn.example/{}.jpg", id), user);
        state.photos.push(PhotoRow {
            id,
            url: row.url,
            spot_id: row.spot_id,
            visit_id: row.visit_id,
            user_id: Some(user),
            created_at: Some(created_at),
        });
        id
    }

    pub fn spot_row(&self, id: Uuid) -> Option<SpotRow> {
        self.state
            .lock()
            .unwrap()
            .spots
            .iter()
            .find(|s| s.id == id)
            .cloned()
    }

    pub fn profile(&self, id: Uuid) -> Option<UserProfile> {
        self.state
            .lock()
            .unwrap()
            .profiles
            .iter()
            .find(|p| p.id == id)
            .cloned()
    }

    pub fn photo_rows(&self) -> Vec<PhotoRow> {
        self.state.lock().unwrap().photos.clone()
    }

    pub fn visit_count(&self) -> usize {
        self.state.lock().unwrap().visits.len()
    }
}

#[async_trait]
impl SpotRepository for MemoryStore {
    async fn fetch_spots(&self, owner_ids: &[Uuid]) -> Result<Vec<SpotRow>, SpotsError> {
        let state = self.state.lock().unwrap();
        if state.fail_reads {
            return Err(SpotsError::Offline("injected read failure".into()));
        }
        let mut spots: Vec<SpotRow> = state
            .spots
            .iter()
            .filter(|s| owner_ids.contains(&s.user_id))
            .cloned()
            .map(|mut spot| {
                let visits = state
                    .visits
                    .iter()
                    .filter(|v| v.spot_id == spot.id)
                    .cloned()
                    .map(|mut visit| {
                        visit.photos = Some(
                            state
                                .photos
                                .iter()
                                .filter(|p| p.visit_id == Some(visit.id))
                                .cloned()
                                .collect(),
                        );
                        visit
                    })
                    .collect();
                spot.visits = Some(visits);
                spot.photos = Some(
                    state
                        .photos
                        .iter()
                        .filter(|p| p.spot_id == Some(spot.id) && p.visit_id.is_none())
                        .cloned()
                        .collect(),
                );
                spot
            })
            .collect();
        spots.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(spots)
    }

    async fn insert_spot(&self, row: &NewSpotRow) -> Result<Uuid, SpotsError> {
        let mut state = self.state.lock().unwrap();
        state.write(StoreOp::InsertSpot(row.name.clone()))?;
        let id = Uuid::new_v4();
        let created_at = state.next_timestamp();
        state.spots.push(SpotRow {
            id,
            user_id: row.user_id,
            name: row.name.clone(),
            status: row.status.as_str().to_string(),
            scope: row.scope.as_str().to_string(),
            cover_photo_url: row.cover_photo_url.clone(),
            is_pinned: Some(row.is_pinned),
            tags: Some(row.tags.clone()),
            url: row.url.clone(),
            memo: row.memo.clone(),
            phone: row.phone.clone(),
            address: row.address.clone(),
            opening_hours: row.opening_hours.clone(),
            price_min: row.price_min,
            price_max: row.price_max,
            payment_methods: row.payment_methods.clone(),
            created_at: Some(created_at),
            visits: None,
            photos: None,
        });
        Ok(id)
    }

    async fn update_spot(&self, id: Uuid, changes: &SpotChanges) -> Result<(), SpotsError> {
        let mut state = self.state.lock().unwrap();
        state.write(StoreOp::UpdateSpot(id, changes.clone()))?;
        let spot = state
            .spots
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| SpotsError::NotFound(format!("spot {}", id)))?;
        if let Some(name) = &changes.name {
            spot.name = name.clone();
        }
        if let Some(status) = changes.status {
            spot.status = status.as_str().to_string();
        }
        if let Some(scope) = changes.scope {
            spot.scope = scope.as_str().to_string();
        }
        if let Some(is_pinned) = changes.is_pinned {
            spot.is_pinned = Some(is_pinned);
        }
        if let Some(tags) = &changes.tags {
            spot.tags = Some(tags.clone());
        }
        if let Some(url) = &changes.url {
            spot.url = url.clone();
        }
        if let Some(memo) = &changes.memo {
            spot.memo = memo.clone();
        }
        if let Some(phone) = &changes.phone {
            spot.phone = phone.clone();
        }
        if let Some(address) = &changes.address {
            spot.address = address.clone();
        }
        if let Some(hours) = &changes.opening_hours {
            spot.opening_hours = hours.clone();
        }
        if let Some(min) = changes.price_min {
            spot.price_min = min;
        }
        if let Some(max) = changes.price_max {
            spot.price_max = max;
        }
        if let Some(methods) = &changes.payment_methods {
            spot.payment_methods = methods.clone();
        }
        if let Some(cover) = &changes.cover_photo_url {
            spot.cover_photo_url = cover.clone();
        }
        Ok(())
    }

    async fn delete_spot(&self, id: Uuid) -> Result<(), SpotsError> {
        let mut state = self.state.lock().unwrap();
        state.write(StoreOp::DeleteSpot(id))?;
        state.spots.retain(|s| s.id != id);
        Ok(())
    }
}

#[async_trait]
impl VisitRepository for MemoryStore {
    async fn insert_visit(&self, payload: &VisitPayload) -> Result<Uuid, SpotsError> {
        let mut state = self.state.lock().unwrap();
        state.write(StoreOp::InsertVisit(payload.spot_id))?;
        let id = Uuid::new_v4();
        let created_at = state.next_timestamp();
        state.visits.push(VisitRow {
            id,
            spot_id: payload.spot_id,
            user_id: Some(payload.user_id),
            visited_at: payload.visited_at,
            rating: payload.rating,
            memo: payload.memo.clone(),
            bill: payload.bill,
            created_at: Some(created_at),
            photos: None,
        });
        Ok(id)
    }

    async fn update_visit(&self, id: Uuid, payload: &VisitPayload) -> Result<(), SpotsError> {
        let mut state = self.state.lock().unwrap();
        state.write(StoreOp::UpdateVisit(id))?;
        let visit = state
            .visits
            .iter_mut()
            .find(|v| v.id == id)
            .ok_or_else(|| SpotsError::NotFound(format!("visit {}", id)))?;
        visit.visited_at = payload.visited_at;
        visit.rating = payload.rating;
        visit.memo = payload.memo.clone();
        visit.bill = payload.bill;
        Ok(())
    }

    async fn delete_visit(&self, id: Uuid) -> Result<(), SpotsError> {
        let mut state = self.state.lock().unwrap();
        state.write(StoreOp::DeleteVisit(id))?;
        state.visits.retain(|v| v.id != id);
        Ok(())
    }

    async fn visit_ids_by_spot(&self, spot_id: Uuid) -> Result<Vec<Uuid>, SpotsError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .visits
            .iter()
            .filter(|v| v.spot_id == spot_id)
            .map(|v| v.id)
            .collect())
    }

    async fn delete_visits_by_spot(&self, spot_id: Uuid) -> Result<u64, SpotsError> {
        let mut state = self.state.lock().unwrap();
        state.write(StoreOp::DeleteVisitsBySpot(spot_id))?;
        let before = state.visits.len();
        state.visits.retain(|v| v.spot_id != spot_id);
        Ok((before - state.visits.len()) as u64)
    }
}

#[async_trait]
impl PhotoRepository for MemoryStore {
    async fn photo_ids(&self, parent: PhotoParent) -> Result<Vec<Uuid>, SpotsError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .photos
            .iter()
            .filter(|p| match parent {
                PhotoParent::Spot(id) => p.spot_id == Some(id),
                PhotoParent::Visit(id) => p.visit_id == Some(id),
            })
            .map(|p| p.id)
            .collect())
    }

    async fn insert_photos(&self, rows: &[NewPhotoRow]) -> Result<(), SpotsError> {
        let mut state = self.state.lock().unwrap();
        for row in rows {
            state.write(StoreOp::InsertPhoto(row.url.clone()))?;
            let created_at = state.next_timestamp();
            state.photos.push(PhotoRow {
                id: Uuid::new_v4(),
                url: row.url.clone(),
                spot_id: row.spot_id,
                visit_id: row.visit_id,
                user_id: Some(row.user_id),
                created_at: Some(created_at),
            });
        }
        Ok(())
    }

    async fn delete_photos(&self, ids: &[Uuid]) -> Result<(), SpotsError> {
        let mut state = self.state.lock().unwrap();
        state.write(StoreOp::DeletePhotos(ids.to_vec()))?;
        state.photos.retain(|p| !ids.contains(&p.id));
        Ok(())
    }

    async fn delete_photos_by_parent(&self, parent: PhotoParent) -> Result<u64, SpotsError> {
        let mut state = self.state.lock().unwrap();
        state.write(StoreOp::DeletePhotosByParent(parent))?;
        let before = state.photos.len();
        state.photos.retain(|p| match parent {
            PhotoParent::Spot(id) => p.spot_id != Some(id),
            PhotoParent::Visit(id) => p.visit_id != Some(id),
        });
        Ok((before - state.photos.len()) as u64)
    }
}

#[async_trait]
impl ProfileRepository for MemoryStore {
    async fn get_profile(&self, id: Uuid) -> Result<Option<UserProfile>, SpotsError> {
        Ok(self.profile(id))
    }

    async fn insert_profile(&self, profile: &UserProfile) -> Result<UserProfile, SpotsError> {
        let mut state = self.state.lock().unwrap();
        state.write(StoreOp::InsertProfile(profile.id))?;
        state.profiles.push(profile.clone());
        Ok(profile.clone())
    }

    async fn find_profile_by_code(&self, code: &str) -> Result<Option<UserProfile>, SpotsError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .profiles
            .iter()
            .find(|p| p.pairing_code == code)
            .cloned())
    }

    async fn set_partner(&self, id: Uuid, partner_id: Uuid) -> Result<(), SpotsError> {
        let mut state = self.state.lock().unwrap();
        state.write(StoreOp::SetPartner(id, partner_id))?;
        let profile = state
            .profiles
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| SpotsError::NotFound(format!("profile {}", id)))?;
        profile.partner_id = Some(partner_id);
        Ok(())
    }

    async fn delete_profile(&self, id: Uuid) -> Result<(), SpotsError> {
        let mut state = self.state.lock().unwrap();
        state.write(StoreOp::DeleteProfile(id))?;
        state.profiles.retain(|p| p.id != id);
        Ok(())
    }
}
