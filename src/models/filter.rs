// src/models/filter.rs
// DOCUMENTATION: Ephemeral list filtering and sorting criteria
// PURPOSE: Parsed from the query string of GET /spots, never persisted

use serde::{Deserialize, Serialize};

use super::SpotStatus;

/// Presentation-layer sort order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOption {
    /// Newest first
    #[default]
    CreatedDesc,
    NameAsc,
    /// Highest rating first, unrated spots last
    RatingDesc,
    /// Most recent visit first, never-visited spots last
    LatestVisit,
}

/// Which subset of the visible spots a list shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListView {
    #[default]
    Home,
    Favorites,
    Shared,
}

/// Search text, status filter, required tags (any of) and sort order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterCriteria {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub status: Option<SpotStatus>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub sort: SortOption,
}

/// Query string of GET /spots
/// DOCUMENTATION: Tags arrive comma separated (`tags=cafe,wifi`)
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub view: Option<ListView>,
    pub q: Option<String>,
    pub status: Option<SpotStatus>,
    pub tags: Option<String>,
    pub sort: Option<SortOption>,
}

impl ListQuery {
    pub fn criteria(&self) -> FilterCriteria {
        FilterCriteria {
            q: self.q.clone().filter(|q| !q.trim().is_empty()),
            status: self.status,
            tags: self
                .tags
                .as_deref()
                .unwrap_or_default()
                .split(',')
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect(),
            sort: self.sort.unwrap_or_default(),
        }
    }
}
