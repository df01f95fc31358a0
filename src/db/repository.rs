// src/db/repository.rs
// DOCUMENTATION: Remote store contract for spots, plus the PostgreSQL store
// PURPOSE: Abstract remote operations from the mutation coordinator

use crate::errors::SpotsError;
use crate::models::*;
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::collections::HashMap;
use uuid::Uuid;

use super::{PhotoRepository, ProfileRepository, VisitRepository};

/// Spot operations of the remote store
#[async_trait]
pub trait SpotRepository: Send + Sync {
    /// Select spots owned by any of `owner_ids` with nested visits (and their
    /// photos) and spot-level photos, newest first
    async fn fetch_spots(&self, owner_ids: &[Uuid]) -> Result<Vec<SpotRow>, SpotsError>;

    /// Insert a spot and return the id the store assigned
    async fn insert_spot(&self, row: &NewSpotRow) -> Result<Uuid, SpotsError>;

    /// Write only the defined columns of `changes`
    async fn update_spot(&self, id: Uuid, changes: &SpotChanges) -> Result<(), SpotsError>;

    async fn delete_spot(&self, id: Uuid) -> Result<(), SpotsError>;
}

/// Everything the engine needs from the remote relational store
pub trait RemoteStore:
    SpotRepository + VisitRepository + PhotoRepository + ProfileRepository
{
}

impl<T> RemoteStore for T where
    T: SpotRepository + VisitRepository + PhotoRepository + ProfileRepository
{
}

/// PostgreSQL-backed remote store
/// DOCUMENTATION: Row-level ownership policies are enforced by the database;
/// this type only issues the queries.
#[derive(Clone)]
pub struct PgStore {
    pub(crate) pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

pub(crate) fn db_error(action: &str, e: sqlx::Error) -> SpotsError {
    log::error!("{} failed: {}", action, e);
    SpotsError::DatabaseError(format!("{} failed: {}", action, e))
}

#[async_trait]
impl SpotRepository for PgStore {
    async fn fetch_spots(&self, owner_ids: &[Uuid]) -> Result<Vec<SpotRow>, SpotsError> {
        let mut spots = sqlx::query_as::<_, SpotRow>(
            r#"
            SELECT id, user_id, name, status, scope, cover_photo_url, is_pinned,
                   tags, url, memo, phone, address, opening_hours,
                   price_min, price_max, payment_methods, created_at
            FROM spots
            WHERE user_id = ANY($1)
            ORDER BY created_at DESC
            "#,
        )
        .bind(owner_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Fetch spots", e))?;

        if spots.is_empty() {
            return Ok(spots);
        }

        let spot_ids: Vec<Uuid> = spots.iter().map(|s| s.id).collect();

        let visits = sqlx::query_as::<_, VisitRow>(
            r#"
            SELECT id, spot_id, user_id, visited_at, rating, memo, bill, created_at
            FROM visits
            WHERE spot_id = ANY($1)
            ORDER BY visited_at DESC
            "#,
        )
        .bind(&spot_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Fetch visits", e))?;

        let visit_ids: Vec<Uuid> = visits.iter().map(|v| v.id).collect();

        let photos = sqlx::query_as::<_, PhotoRow>(
            r#"
            SELECT id, url, spot_id, visit_id, user_id, created_at
            FROM photos
            WHERE spot_id = ANY($1) OR visit_id = ANY($2)
            ORDER BY created_at ASC
            "#,
        )
        .bind(&spot_ids)
        .bind(&visit_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Fetch photos", e))?;

        let mut spot_photos: HashMap<Uuid, Vec<PhotoRow>> = HashMap::new();
        let mut visit_photos: HashMap<Uuid, Vec<PhotoRow>> = HashMap::new();
        for photo in photos {
            match (photo.visit_id, photo.spot_id) {
                (Some(visit_id), _) => visit_photos.entry(visit_id).or_default().push(photo),
                (None, Some(spot_id)) => spot_photos.entry(spot_id).or_default().push(photo),
                (None, None) => {}
            }
        }

        let mut spot_visits: HashMap<Uuid, Vec<VisitRow>> = HashMap::new();
        for mut visit in visits {
            visit.photos = Some(visit_photos.remove(&visit.id).unwrap_or_default());
            spot_visits.entry(visit.spot_id).or_default().push(visit);
        }

        for spot in spots.iter_mut() {
            spot.visits = Some(spot_visits.remove(&spot.id).unwrap_or_default());
            spot.photos = Some(spot_photos.remove(&spot.id).unwrap_or_default());
        }

        log::debug!("Fetched {} spots for {} owners", spots.len(), owner_ids.len());
        Ok(spots)
    }

    async fn insert_spot(&self, row: &NewSpotRow) -> Result<Uuid, SpotsError> {
        let inserted: (Uuid,) = sqlx::query_as(
            r#"
            INSERT INTO spots (
                user_id, name, status, scope, cover_photo_url, is_pinned,
                tags, url, memo, phone, address, opening_hours,
                price_min, price_max, payment_methods, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, NOW())
            RETURNING id
            "#,
        )
        .bind(row.user_id) // $1
        .bind(&row.name) // $2
        .bind(row.status.as_str()) // $3
        .bind(row.scope.as_str()) // $4
        .bind(&row.cover_photo_url) // $5
        .bind(row.is_pinned) // $6
        .bind(&row.tags) // $7
        .bind(&row.url) // $8
        .bind(&row.memo) // $9
        .bind(&row.phone) // $10
        .bind(&row.address) // $11
        .bind(&row.opening_hours) // $12
        .bind(row.price_min) // $13
        .bind(row.price_max) // $14
        .bind(&row.payment_methods) // $15
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("Insert spot", e))?;

        log::info!("Created spot with id: {}", inserted.0);
        Ok(inserted.0)
    }

    async fn update_spot(&self, id: Uuid, changes: &SpotChanges) -> Result<(), SpotsError> {
        if changes.is_empty() {
            return Ok(());
        }

        let mut builder = QueryBuilder::<Postgres>::new("UPDATE spots SET ");
        let mut set = builder.separated(", ");
        if let Some(name) = &changes.name {
            set.push("name = ").push_bind_unseparated(name.clone());
        }
        if let Some(status) = changes.status {
            set.push("status = ").push_bind_unseparated(status.as_str());
        }
        if let Some(scope) = changes.scope {
            set.push("scope = ").push_bind_unseparated(scope.as_str());
        }
        if let Some(is_pinned) = changes.is_pinned {
            set.push("is_pinned = ").push_bind_unseparated(is_pinned);
        }
        if let Some(tags) = &changes.tags {
            set.push("tags = ").push_bind_unseparated(tags.clone());
        }
        if let Some(url) = &changes.url {
            set.push("url = ").push_bind_unseparated(url.clone());
        }
        if let Some(memo) = &changes.memo {
            set.push("memo = ").push_bind_unseparated(memo.clone());
        }
        if let Some(phone) = &changes.phone {
            set.push("phone = ").push_bind_unseparated(phone.clone());
        }
        if let Some(address) = &changes.address {
            set.push("address = ").push_bind_unseparated(address.clone());
        }
        if let Some(hours) = &changes.opening_hours {
            set.push("opening_hours = ").push_bind_unseparated(hours.clone());
        }
        if let Some(min) = changes.price_min {
            set.push("price_min = ").push_bind_unseparated(min);
        }
        if let Some(max) = changes.price_max {
            set.push("price_max = ").push_bind_unseparated(max);
        }
        if let Some(methods) = &changes.payment_methods {
            set.push("payment_methods = ").push_bind_unseparated(methods.clone());
        }
        if let Some(cover) = &changes.cover_photo_url {
            set.push("cover_photo_url = ").push_bind_unseparated(cover.clone());
        }
        builder.push(" WHERE id = ").push_bind(id);

        let rows = builder
            .build()
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Update spot", e))?
            .rows_affected();

        if rows == 0 {
            return Err(SpotsError::NotFound(format!("spot {}", id)));
        }

        log::info!("Updated spot: {}", id);
        Ok(())
    }

    async fn delete_spot(&self, id: Uuid) -> Result<(), SpotsError> {
        sqlx::query("DELETE FROM spots WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Delete spot", e))?;

        log::info!("Deleted spot: {}", id);
        Ok(())
    }
}
