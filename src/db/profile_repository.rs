// src/db/profile_repository.rs
// DOCUMENTATION: Profile database operations
// PURPOSE: Profile lookup, self-healing insert, and one-sided pairing writes

use crate::errors::SpotsError;
use crate::models::UserProfile;
use async_trait::async_trait;
use uuid::Uuid;

use super::repository::{db_error, PgStore};

/// Profile operations of the remote store
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    async fn get_profile(&self, id: Uuid) -> Result<Option<UserProfile>, SpotsError>;

    async fn insert_profile(&self, profile: &UserProfile) -> Result<UserProfile, SpotsError>;

    /// Exact match on the pairing code
    async fn find_profile_by_code(&self, code: &str) -> Result<Option<UserProfile>, SpotsError>;

    /// Write `partner_id` of profile `id` only
    async fn set_partner(&self, id: Uuid, partner_id: Uuid) -> Result<(), SpotsError>;

    async fn delete_profile(&self, id: Uuid) -> Result<(), SpotsError>;
}

#[async_trait]
impl ProfileRepository for PgStore {
    async fn get_profile(&self, id: Uuid) -> Result<Option<UserProfile>, SpotsError> {
        sqlx::query_as::<_, UserProfile>(
            "SELECT id, email, pairing_code, partner_id FROM profiles WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Fetch profile", e))
    }

    async fn insert_profile(&self, profile: &UserProfile) -> Result<UserProfile, SpotsError> {
        sqlx::query_as::<_, UserProfile>(
            r#"
            INSERT INTO profiles (id, email, pairing_code, partner_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, email, pairing_code, partner_id
            "#,
        )
        .bind(profile.id)
        .bind(&profile.email)
        .bind(&profile.pairing_code)
        .bind(profile.partner_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("Insert profile", e))
    }

    async fn find_profile_by_code(&self, code: &str) -> Result<Option<UserProfile>, SpotsError> {
        sqlx::query_as::<_, UserProfile>(
            "SELECT id, email, pairing_code, partner_id FROM profiles WHERE pairing_code = $1",
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Find profile by code", e))
    }

    async fn set_partner(&self, id: Uuid, partner_id: Uuid) -> Result<(), SpotsError> {
        let rows = sqlx::query("UPDATE profiles SET partner_id = $1 WHERE id = $2")
            .bind(partner_id)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Set partner", e))?
            .rows_affected();

        if rows == 0 {
            return Err(SpotsError::NotFound(format!("profile {}", id)));
        }
        Ok(())
    }

    async fn delete_profile(&self, id: Uuid) -> Result<(), SpotsError> {
        let rows = sqlx::query("DELETE FROM profiles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Delete profile", e))?
            .rows_affected();

        if rows == 0 {
            return Err(SpotsError::NotFound(format!("profile {}", id)));
        }
        log::info!("Deleted profile: {}", id);
        Ok(())
    }
}
