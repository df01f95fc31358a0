// src/models/photo.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::EntityId;

/// Photo row as stored in the `photos` table
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PhotoRow {
    pub id: Uuid,
    pub url: String,
    pub spot_id: Option<Uuid>,
    pub visit_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub created_at: Option<DateTime<Utc>>,
}

/// Photo view model attached to a spot or a visit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Photo {
    pub id: EntityId,
    pub url: String,
    #[serde(default)]
    pub spot_id: Option<Uuid>,
    #[serde(default)]
    pub visit_id: Option<Uuid>,
    #[serde(default)]
    pub uploader_id: Option<Uuid>,
}

/// Owning parent of a photo; exactly one is set per photo row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhotoParent {
    Spot(Uuid),
    Visit(Uuid),
}

/// Insert payload for a photo whose upload already produced a public URL
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewPhotoRow {
    pub url: String,
    pub spot_id: Option<Uuid>,
    pub visit_id: Option<Uuid>,
    pub user_id: Uuid,
}

impl NewPhotoRow {
    pub fn for_parent(parent: PhotoParent, url: String, user_id: Uuid) -> Self {
        let (spot_id, visit_id) = match parent {
            PhotoParent::Spot(id) => (Some(id), None),
            PhotoParent::Visit(id) => (None, Some(id)),
        };
        Self {
            url,
            spot_id,
            visit_id,
            user_id,
        }
    }
}

impl Photo {
    /// Photo that was uploaded but not yet written to the photos table
    pub fn uploaded(url: String, uploader_id: Uuid) -> Self {
        Self {
            id: EntityId::temporary(),
            url,
            spot_id: None,
            visit_id: None,
            uploader_id: Some(uploader_id),
        }
    }
}

impl From<PhotoRow> for Photo {
    fn from(row: PhotoRow) -> Self {
        Photo {
            id: EntityId::Persisted(row.id),
            url: row.url,
            spot_id: row.spot_id,
            visit_id: row.visit_id,
            uploader_id: row.user_id,
        }
    }
}
