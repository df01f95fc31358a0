// src/models/spot.rs
// DOCUMENTATION: Core data structures for spots
// PURPOSE: Storage rows, the denormalized view model, and the write payloads
// that translate view-model changes into storage column names

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use super::{EntityId, Photo, PhotoRow, Visit, VisitRow};

/// Visit state of a spot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpotStatus {
    #[default]
    WantToGo,
    Visited,
    Revisit,
}

/// Partner visibility of a spot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpotScope {
    #[default]
    Personal,
    Shared,
    Both,
}

impl SpotStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpotStatus::WantToGo => "want_to_go",
            SpotStatus::Visited => "visited",
            SpotStatus::Revisit => "revisit",
        }
    }

    /// Parse a storage value; unknown values fall back to `want_to_go`
    pub fn from_storage(value: &str) -> Self {
        match value {
            "visited" => SpotStatus::Visited,
            "revisit" => SpotStatus::Revisit,
            _ => SpotStatus::WantToGo,
        }
    }
}

impl SpotScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpotScope::Personal => "personal",
            SpotScope::Shared => "shared",
            SpotScope::Both => "both",
        }
    }

    /// Parse a storage value; unknown values fall back to `personal`
    pub fn from_storage(value: &str) -> Self {
        match value {
            "shared" => SpotScope::Shared,
            "both" => SpotScope::Both,
            _ => SpotScope::Personal,
        }
    }

    /// Whether a partner may see a spot with this scope
    pub fn is_partner_visible(&self) -> bool {
        matches!(self, SpotScope::Shared | SpotScope::Both)
    }
}

/// Spot row as returned by the remote store, with nested visits and photos
/// DOCUMENTATION: Maps directly to the `spots` table. Nested collections are
/// filled by the store; a missing collection is treated as empty by the mapper.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SpotRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub status: String,
    pub scope: String,
    pub cover_photo_url: Option<String>,
    pub is_pinned: Option<bool>,
    pub tags: Option<Vec<String>>,
    pub url: Option<String>,
    pub memo: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub opening_hours: Option<Vec<String>>,
    pub price_min: Option<i32>,
    pub price_max: Option<i32>,
    pub payment_methods: Option<Vec<String>>,
    pub created_at: Option<DateTime<Utc>>,

    #[sqlx(skip)]
    #[serde(default)]
    pub visits: Option<Vec<VisitRow>>,

    #[sqlx(skip)]
    #[serde(default)]
    pub photos: Option<Vec<PhotoRow>>,
}

/// Denormalized spot view model
/// DOCUMENTATION: `rating`, `visit_count` and `last_visit_date` are derived on
/// every mapping pass and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Spot {
    pub id: EntityId,
    pub owner_id: Uuid,
    pub name: String,
    pub status: SpotStatus,
    pub scope: SpotScope,
    pub is_pinned: bool,
    pub tags: Vec<String>,
    pub url: Option<String>,
    pub memo: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub opening_hours: Option<Vec<String>>,
    pub price_min: Option<i32>,
    pub price_max: Option<i32>,
    pub payment_methods: Option<Vec<String>>,
    pub cover_photo_url: String,
    pub photos: Vec<Photo>,
    pub visits: Vec<Visit>,
    pub rating: Option<f64>,
    pub visit_count: usize,
    pub last_visit_date: Option<NaiveDate>,
    pub created_at: Option<DateTime<Utc>>,
}

/// Deserialize a present field (even `null`) as `Some(..)` so that
/// "absent" and "explicitly cleared" stay distinguishable.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Partial field update expressed in view-model names
/// DOCUMENTATION: Absent fields are left untouched. Nullable fields use a
/// nested option: `Some(None)` clears the value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpotPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<SpotStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<SpotScope>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_pinned: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub url: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub memo: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub address: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub opening_hours: Option<Option<Vec<String>>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub price_min: Option<Option<i32>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub price_max: Option<Option<i32>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub payment_methods: Option<Option<Vec<String>>>,
}

/// Changed columns of a `spots` row, in storage names
/// DOCUMENTATION: Only `Some` fields are written. This is the minimal update
/// the coordinator sends to the remote store.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SpotChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<SpotStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<SpotScope>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_pinned: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memo: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opening_hours: Option<Option<Vec<String>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_min: Option<Option<i32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_max: Option<Option<i32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_methods: Option<Option<Vec<String>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_photo_url: Option<Option<String>>,
}

/// Insert payload for the `spots` table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewSpotRow {
    pub user_id: Uuid,
    pub name: String,
    pub status: SpotStatus,
    pub scope: SpotScope,
    pub cover_photo_url: Option<String>,
    pub is_pinned: bool,
    pub tags: Vec<String>,
    pub url: Option<String>,
    pub memo: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub opening_hours: Option<Vec<String>>,
    pub price_min: Option<i32>,
    pub price_max: Option<i32>,
    pub payment_methods: Option<Vec<String>>,
}

/// Spot form submission (create when `id` is absent, full save otherwise)
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SpotDraft {
    #[serde(default)]
    pub id: Option<Uuid>,

    #[validate(custom = "validate_required")]
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub status: Option<SpotStatus>,

    #[serde(default)]
    pub scope: Option<SpotScope>,

    #[serde(default)]
    pub is_pinned: Option<bool>,

    #[serde(default)]
    pub cover_photo_url: Option<String>,

    #[serde(default)]
    pub tags: Vec<String>,

    #[validate(custom = "validate_http_url")]
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub memo: Option<String>,

    #[validate(custom = "validate_phone")]
    #[serde(default)]
    pub phone: Option<String>,

    #[serde(default)]
    pub address: Option<String>,

    #[serde(default)]
    pub opening_hours: Option<Vec<String>>,

    #[serde(default)]
    pub price_min: Option<i32>,

    #[serde(default)]
    pub price_max: Option<i32>,

    #[serde(default)]
    pub payment_methods: Option<Vec<String>>,

    /// Submitted photo list; absent leaves the persisted photo set untouched
    #[serde(default)]
    pub photos: Option<Vec<Photo>>,
}

fn error(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

fn validate_required(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(error("required", "Spot name is required"));
    }
    Ok(())
}

fn validate_http_url(value: &str) -> Result<(), ValidationError> {
    if !value.is_empty() && !value.starts_with("http") {
        return Err(error("url", "URL must start with http or https"));
    }
    Ok(())
}

fn validate_phone(value: &str) -> Result<(), ValidationError> {
    let valid = value
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '-' | '+' | '(' | ')') || c.is_whitespace());
    if !value.is_empty() && !valid {
        return Err(error("phone", "Phone number format is invalid"));
    }
    Ok(())
}

fn check_price_range(
    errors: &mut ValidationErrors,
    min: Option<i32>,
    max: Option<i32>,
) {
    if let (Some(min), Some(max)) = (min, max) {
        if min > max {
            errors.add(
                "price",
                error("price_range", "Minimum price must not exceed maximum price"),
            );
        }
    }
}

fn into_result(errors: ValidationErrors) -> Result<(), ValidationErrors> {
    if errors.errors().is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Empty strings coming from forms mean "no value"
fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_ref()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Trimmed tags without blanks or repeats, in first-seen order
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
        if !out.iter().any(|t| t == tag) {
            out.push(tag.to_string());
        }
    }
    out
}

/// Trimmed list entries without blanks; an empty result is no value
pub fn non_blank_list(values: &Option<Vec<String>>) -> Option<Vec<String>> {
    let list: Vec<String> = values
        .as_deref()?
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect();
    if list.is_empty() {
        None
    } else {
        Some(list)
    }
}

impl SpotDraft {
    /// Field validation plus the cross-field price range check
    pub fn check(&self) -> Result<(), ValidationErrors> {
        let mut errors = match self.validate() {
            Ok(()) => ValidationErrors::new(),
            Err(e) => e,
        };
        check_price_range(&mut errors, self.price_min, self.price_max);
        into_result(errors)
    }

    /// Cover image chosen for storage: first submitted photo, else the explicit cover
    fn cover(&self) -> Option<String> {
        self.photos
            .as_ref()
            .and_then(|p| p.first())
            .map(|p| p.url.clone())
            .or_else(|| non_empty(&self.cover_photo_url))
    }

    pub fn to_insert_row(&self, owner_id: Uuid) -> NewSpotRow {
        NewSpotRow {
            user_id: owner_id,
            name: self.name.trim().to_string(),
            status: self.status.unwrap_or_default(),
            scope: self.scope.unwrap_or_default(),
            cover_photo_url: self.cover(),
            is_pinned: self.is_pinned.unwrap_or(false),
            tags: normalize_tags(&self.tags),
            url: non_empty(&self.url),
            memo: non_empty(&self.memo),
            phone: non_empty(&self.phone),
            address: non_empty(&self.address),
            opening_hours: non_blank_list(&self.opening_hours),
            price_min: self.price_min,
            price_max: self.price_max,
            payment_methods: non_blank_list(&self.payment_methods),
        }
    }

    /// Changes for a full save of an existing spot
    /// DOCUMENTATION: Form fields are all written; status, scope and pin flag
    /// are only written when the form supplied them.
    pub fn to_changes(&self) -> SpotChanges {
        let cover = if self.photos.is_some() || self.cover_photo_url.is_some() {
            Some(self.cover())
        } else {
            None
        };
        SpotChanges {
            name: Some(self.name.trim().to_string()),
            status: self.status,
            scope: self.scope,
            is_pinned: self.is_pinned,
            tags: Some(normalize_tags(&self.tags)),
            url: Some(non_empty(&self.url)),
            memo: Some(non_empty(&self.memo)),
            phone: Some(non_empty(&self.phone)),
            address: Some(non_empty(&self.address)),
            opening_hours: Some(non_blank_list(&self.opening_hours)),
            price_min: Some(self.price_min),
            price_max: Some(self.price_max),
            payment_methods: Some(non_blank_list(&self.payment_methods)),
            cover_photo_url: cover,
        }
    }
}

impl SpotPatch {
    pub fn is_empty(&self) -> bool {
        self.to_changes().is_empty()
    }

    /// Translate into storage column names, omitting undefined fields
    pub fn to_changes(&self) -> SpotChanges {
        SpotChanges {
            name: self.name.as_ref().map(|n| n.trim().to_string()),
            status: self.status,
            scope: self.scope,
            is_pinned: self.is_pinned,
            tags: self.tags.as_deref().map(normalize_tags),
            url: self.url.clone(),
            memo: self.memo.clone(),
            phone: self.phone.clone(),
            address: self.address.clone(),
            opening_hours: self.opening_hours.as_ref().map(non_blank_list),
            price_min: self.price_min,
            price_max: self.price_max,
            payment_methods: self.payment_methods.as_ref().map(non_blank_list),
            cover_photo_url: None,
        }
    }

    /// Validate the patch against the spot it will be merged into
    pub fn check_against(&self, spot: &Spot) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Some(name) = &self.name {
            if let Err(e) = validate_required(name) {
                errors.add("name", e);
            }
        }
        if let Some(Some(url)) = &self.url {
            if let Err(e) = validate_http_url(url) {
                errors.add("url", e);
            }
        }
        if let Some(Some(phone)) = &self.phone {
            if let Err(e) = validate_phone(phone) {
                errors.add("phone", e);
            }
        }
        let min = self.price_min.unwrap_or(spot.price_min);
        let max = self.price_max.unwrap_or(spot.price_max);
        check_price_range(&mut errors, min, max);
        into_result(errors)
    }
}

impl SpotChanges {
    pub fn is_empty(&self) -> bool {
        self == &SpotChanges::default()
    }

    pub fn status(status: SpotStatus) -> Self {
        SpotChanges {
            status: Some(status),
            ..Default::default()
        }
    }
}

impl Spot {
    /// Local spot shown while its insert is in flight
    pub fn pending(draft: &SpotDraft, owner_id: Uuid, placeholder_cover_url: &str) -> Self {
        let row = draft.to_insert_row(owner_id);
        let mut spot = Spot {
            id: EntityId::temporary(),
            owner_id,
            name: row.name,
            status: row.status,
            scope: row.scope,
            is_pinned: row.is_pinned,
            tags: row.tags,
            url: row.url,
            memo: row.memo,
            phone: row.phone,
            address: row.address,
            opening_hours: row.opening_hours,
            price_min: row.price_min,
            price_max: row.price_max,
            payment_methods: row.payment_methods,
            cover_photo_url: row
                .cover_photo_url
                .unwrap_or_else(|| placeholder_cover_url.to_string()),
            photos: draft.photos.clone().unwrap_or_default(),
            visits: Vec::new(),
            rating: None,
            visit_count: 0,
            last_visit_date: None,
            created_at: Some(Utc::now()),
        };
        spot.recompute_derived();
        spot
    }

    /// Recompute rating, visit count and last visit date from the visit list
    pub fn recompute_derived(&mut self) {
        self.visit_count = self.visits.len();
        self.rating = if self.visits.is_empty() {
            None
        } else {
            let total: f64 = self.visits.iter().map(|v| v.rating as f64).sum();
            Some(total / self.visits.len() as f64)
        };
        self.last_visit_date = self.visits.iter().map(|v| v.visited_at).max();
    }

    /// Merge changed columns into the view model
    pub fn apply_changes(&mut self, changes: &SpotChanges, placeholder_cover_url: &str) {
        if let Some(name) = &changes.name {
            self.name = name.clone();
        }
        if let Some(status) = changes.status {
            self.status = status;
        }
        if let Some(scope) = changes.scope {
            self.scope = scope;
        }
        if let Some(is_pinned) = changes.is_pinned {
            self.is_pinned = is_pinned;
        }
        if let Some(tags) = &changes.tags {
            self.tags = tags.clone();
        }
        if let Some(url) = &changes.url {
            self.url = url.clone();
        }
        if let Some(memo) = &changes.memo {
            self.memo = memo.clone();
        }
        if let Some(phone) = &changes.phone {
            self.phone = phone.clone();
        }
        if let Some(address) = &changes.address {
            self.address = address.clone();
        }
        if let Some(hours) = &changes.opening_hours {
            self.opening_hours = hours.clone();
        }
        if let Some(min) = changes.price_min {
            self.price_min = min;
        }
        if let Some(max) = changes.price_max {
            self.price_max = max;
        }
        if let Some(methods) = &changes.payment_methods {
            self.payment_methods = methods.clone();
        }
        if let Some(cover) = &changes.cover_photo_url {
            self.cover_photo_url = cover
                .clone()
                .unwrap_or_else(|| placeholder_cover_url.to_string());
        }
    }

    /// Current values of exactly the fields `patch` touches
    pub fn snapshot_for(&self, patch: &SpotPatch) -> SpotPatch {
        SpotPatch {
            name: patch.name.as_ref().map(|_| self.name.clone()),
            status: patch.status.map(|_| self.status),
            scope: patch.scope.map(|_| self.scope),
            is_pinned: patch.is_pinned.map(|_| self.is_pinned),
            tags: patch.tags.as_ref().map(|_| self.tags.clone()),
            url: patch.url.as_ref().map(|_| self.url.clone()),
            memo: patch.memo.as_ref().map(|_| self.memo.clone()),
            phone: patch.phone.as_ref().map(|_| self.phone.clone()),
            address: patch.address.as_ref().map(|_| self.address.clone()),
            opening_hours: patch
                .opening_hours
                .as_ref()
                .map(|_| self.opening_hours.clone()),
            price_min: patch.price_min.map(|_| self.price_min),
            price_max: patch.price_max.map(|_| self.price_max),
            payment_methods: patch
                .payment_methods
                .as_ref()
                .map(|_| self.payment_methods.clone()),
        }
    }

    /// Persisted id, if the spot has been written remotely
    pub fn remote_id(&self) -> Option<Uuid> {
        self.id.persisted()
    }
}
