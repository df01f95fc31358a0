// src/db/visit_repository.rs
// DOCUMENTATION: Visit database operations
// PURPOSE: Handle CRUD operations for visit records

use crate::errors::SpotsError;
use crate::models::VisitPayload;
use async_trait::async_trait;
use uuid::Uuid;

use super::repository::{db_error, PgStore};

/// Visit operations of the remote store
#[async_trait]
pub trait VisitRepository: Send + Sync {
    async fn insert_visit(&self, payload: &VisitPayload) -> Result<Uuid, SpotsError>;

    async fn update_visit(&self, id: Uuid, payload: &VisitPayload) -> Result<(), SpotsError>;

    async fn delete_visit(&self, id: Uuid) -> Result<(), SpotsError>;

    /// Ids of every visit recorded against a spot
    async fn visit_ids_by_spot(&self, spot_id: Uuid) -> Result<Vec<Uuid>, SpotsError>;

    async fn delete_visits_by_spot(&self, spot_id: Uuid) -> Result<u64, SpotsError>;
}

#[async_trait]
impl VisitRepository for PgStore {
    async fn insert_visit(&self, payload: &VisitPayload) -> Result<Uuid, SpotsError> {
        let inserted: (Uuid,) = sqlx::query_as(
            r#"
            INSERT INTO visits (spot_id, user_id, visited_at, rating, memo, bill, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, NOW())
            RETURNING id
            "#,
        )
        .bind(payload.spot_id)
        .bind(payload.user_id)
        .bind(payload.visited_at)
        .bind(payload.rating)
        .bind(&payload.memo)
        .bind(payload.bill)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("Insert visit", e))?;

        Ok(inserted.0)
    }

    async fn update_visit(&self, id: Uuid, payload: &VisitPayload) -> Result<(), SpotsError> {
        let rows = sqlx::query(
            r#"
            UPDATE visits
            SET visited_at = $1,
                rating = $2,
                memo = $3,
                bill = $4
            WHERE id = $5 AND spot_id = $6
            "#,
        )
        .bind(payload.visited_at)
        .bind(payload.rating)
        .bind(&payload.memo)
        .bind(payload.bill)
        .bind(id)
        .bind(payload.spot_id)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Update visit", e))?
        .rows_affected();

        if rows == 0 {
            return Err(SpotsError::NotFound(format!("visit {}", id)));
        }
        Ok(())
    }

    async fn delete_visit(&self, id: Uuid) -> Result<(), SpotsError> {
        sqlx::query("DELETE FROM visits WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Delete visit", e))?;
        Ok(())
    }

    async fn visit_ids_by_spot(&self, spot_id: Uuid) -> Result<Vec<Uuid>, SpotsError> {
        let ids = sqlx::query_scalar::<_, Uuid>("SELECT id FROM visits WHERE spot_id = $1")
            .bind(spot_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error("Fetch visit ids", e))?;
        Ok(ids)
    }

    async fn delete_visits_by_spot(&self, spot_id: Uuid) -> Result<u64, SpotsError> {
        let result = sqlx::query("DELETE FROM visits WHERE spot_id = $1")
            .bind(spot_id)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Delete visits", e))?;
        Ok(result.rows_affected())
    }
}
