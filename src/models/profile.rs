// src/models/profile.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One row of the `profiles` table
/// DOCUMENTATION: `partner_id` is directional. A's partner pointing at B says
/// nothing about B's partner; mutual pairing needs both rows to agree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: Option<String>,
    pub pairing_code: String,
    pub partner_id: Option<Uuid>,
}
