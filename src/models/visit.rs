// src/models/visit.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::{EntityId, Photo, PhotoRow};

/// Visit row as stored in the `visits` table, with its nested photos
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct VisitRow {
    pub id: Uuid,
    pub spot_id: Uuid,
    pub user_id: Option<Uuid>,
    pub visited_at: NaiveDate,
    pub rating: i32,
    pub memo: Option<String>,
    pub bill: Option<f64>,
    pub created_at: Option<DateTime<Utc>>,
    #[sqlx(skip)]
    #[serde(default)]
    pub photos: Option<Vec<PhotoRow>>,
}

/// Visit view model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Visit {
    pub id: EntityId,
    pub spot_id: Uuid,
    pub user_id: Option<Uuid>,
    pub visited_at: NaiveDate,
    pub rating: i32,
    pub memo: String,
    pub bill: Option<f64>,
    pub photos: Vec<Photo>,
}

/// Visit form submission
/// DOCUMENTATION: `id` absent or temporary means "create", persisted means "update".
/// `photos` absent leaves the persisted photo set untouched.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct VisitDraft {
    #[serde(default)]
    pub id: Option<EntityId>,

    pub visited_at: NaiveDate,

    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: i32,

    #[serde(default)]
    pub memo: Option<String>,

    #[validate(range(min = 0.0, message = "Bill must be a number of 0 or more"))]
    #[serde(default)]
    pub bill: Option<f64>,

    #[serde(default)]
    pub photos: Option<Vec<Photo>>,
}

/// Insert/update payload for the `visits` table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisitPayload {
    pub spot_id: Uuid,
    pub user_id: Uuid,
    pub visited_at: NaiveDate,
    pub rating: i32,
    pub memo: Option<String>,
    pub bill: Option<f64>,
}

impl VisitDraft {
    /// Id of the visit when it already exists remotely
    pub fn persisted_id(&self) -> Option<Uuid> {
        self.id.as_ref().and_then(EntityId::persisted)
    }

    pub fn to_payload(&self, spot_id: Uuid, user_id: Uuid) -> VisitPayload {
        VisitPayload {
            spot_id,
            user_id,
            visited_at: self.visited_at,
            rating: self.rating,
            memo: self.memo.clone(),
            bill: self.bill,
        }
    }

    /// Local view of the draft used for the optimistic update
    pub fn to_visit(&self, spot_id: Uuid, user_id: Uuid) -> Visit {
        Visit {
            id: self.id.clone().unwrap_or_else(EntityId::temporary),
            spot_id,
            user_id: Some(user_id),
            visited_at: self.visited_at,
            rating: self.rating,
            memo: self.memo.clone().unwrap_or_default(),
            bill: self.bill,
            photos: self.photos.clone().unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(rating: i32, bill: Option<f64>) -> VisitDraft {
        VisitDraft {
            id: None,
            visited_at: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            rating,
            memo: None,
            bill,
            photos: None,
        }
    }

    #[test]
    fn test_rating_bounds() {
        assert!(draft(1, None).validate().is_ok());
        assert!(draft(5, None).validate().is_ok());
        assert!(draft(0, None).validate().is_err());
        assert!(draft(6, None).validate().is_err());
    }

    #[test]
    fn test_negative_bill_is_rejected() {
        assert!(draft(3, Some(0.0)).validate().is_ok());
        let errors = draft(3, Some(-1.0)).validate().unwrap_err();
        assert!(errors.field_errors().contains_key("bill"));
    }

    #[test]
    fn test_non_numeric_bill_fails_to_parse() {
        let body = r#"{"visitedAt":"2024-05-01","rating":3,"bill":"abc"}"#;
        assert!(serde_json::from_str::<VisitDraft>(body).is_err());
    }
}
