// src/db/photo_repository.rs
// DOCUMENTATION: Photo database operations
// PURPOSE: Handle photo rows owned by spots and visits

use crate::errors::SpotsError;
use crate::models::{NewPhotoRow, PhotoParent};
use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use super::repository::{db_error, PgStore};

/// Photo operations of the remote store
#[async_trait]
pub trait PhotoRepository: Send + Sync {
    /// Ids of the photos currently persisted for a parent
    async fn photo_ids(&self, parent: PhotoParent) -> Result<Vec<Uuid>, SpotsError>;

    async fn insert_photos(&self, rows: &[NewPhotoRow]) -> Result<(), SpotsError>;

    async fn delete_photos(&self, ids: &[Uuid]) -> Result<(), SpotsError>;

    /// Delete every photo whose owning column matches the parent
    async fn delete_photos_by_parent(&self, parent: PhotoParent) -> Result<u64, SpotsError>;
}

fn parent_column(parent: PhotoParent) -> (&'static str, Uuid) {
    match parent {
        PhotoParent::Spot(id) => ("spot_id", id),
        PhotoParent::Visit(id) => ("visit_id", id),
    }
}

#[async_trait]
impl PhotoRepository for PgStore {
    async fn photo_ids(&self, parent: PhotoParent) -> Result<Vec<Uuid>, SpotsError> {
        let (column, id) = parent_column(parent);
        let sql = format!("SELECT id FROM photos WHERE {} = $1", column);
        let ids = sqlx::query_scalar::<_, Uuid>(&sql)
            .bind(id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error("Fetch photo ids", e))?;
        Ok(ids)
    }

    async fn insert_photos(&self, rows: &[NewPhotoRow]) -> Result<(), SpotsError> {
        if rows.is_empty() {
            return Ok(());
        }

        let mut builder =
            QueryBuilder::<Postgres>::new("INSERT INTO photos (url, spot_id, visit_id, user_id) ");
        builder.push_values(rows, |mut b, row| {
            b.push_bind(row.url.clone())
                .push_bind(row.spot_id)
                .push_bind(row.visit_id)
                .push_bind(row.user_id);
        });

        builder
            .build()
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Insert photos", e))?;

        log::info!("Inserted {} photos", rows.len());
        Ok(())
    }

    async fn delete_photos(&self, ids: &[Uuid]) -> Result<(), SpotsError> {
        if ids.is_empty() {
            return Ok(());
        }

        sqlx::query("DELETE FROM photos WHERE id = ANY($1)")
            .bind(ids)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Delete photos", e))?;

        log::info!("Deleted {} photos", ids.len());
        Ok(())
    }

    async fn delete_photos_by_parent(&self, parent: PhotoParent) -> Result<u64, SpotsError> {
        let (column, id) = parent_column(parent);
        let sql = format!("DELETE FROM photos WHERE {} = $1", column);
        let result = sqlx::query(&sql)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Delete photos by parent", e))?;
        Ok(result.rows_affected())
    }
}
