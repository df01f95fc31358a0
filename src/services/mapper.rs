// src/services/mapper.rs
// DOCUMENTATION: View-model mapping for spots
// PURPOSE: Turn nested storage rows into the denormalized Spot list and apply
// presentation-layer filtering, sorting and list views

use crate::models::*;
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// Map one visit row with its nested photos
pub fn map_visit(row: VisitRow) -> Visit {
    Visit {
        id: EntityId::Persisted(row.id),
        spot_id: row.spot_id,
        user_id: row.user_id,
        visited_at: row.visited_at,
        rating: row.rating,
        memo: row.memo.unwrap_or_default(),
        bill: row.bill,
        photos: row
            .photos
            .unwrap_or_default()
            .into_iter()
            .map(Photo::from)
            .collect(),
    }
}

/// Map one spot row into the view model and compute its derived fields
/// DOCUMENTATION: Missing nested collections are treated as empty. Visits are
/// ordered newest first.
pub fn map_spot(row: SpotRow, placeholder_cover_url: &str) -> Spot {
    let mut visits: Vec<Visit> = row
        .visits
        .unwrap_or_default()
        .into_iter()
        .map(map_visit)
        .collect();
    visits.sort_by(|a, b| b.visited_at.cmp(&a.visited_at));

    let mut spot = Spot {
        id: EntityId::Persisted(row.id),
        owner_id: row.user_id,
        name: row.name,
        status: SpotStatus::from_storage(&row.status),
        scope: SpotScope::from_storage(&row.scope),
        is_pinned: row.is_pinned.unwrap_or(false),
        tags: row.tags.unwrap_or_default(),
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
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| placeholder_cover_url.to_string()),
        photos: row
            .photos
            .unwrap_or_default()
            .into_iter()
            .map(Photo::from)
            .collect(),
        visits,
        rating: None,
        visit_count: 0,
        last_visit_date: None,
        created_at: row.created_at,
    };
    spot.recompute_derived();
    spot
}

pub fn map_spots(rows: Vec<SpotRow>, placeholder_cover_url: &str) -> Vec<Spot> {
    rows.into_iter()
        .map(|row| map_spot(row, placeholder_cover_url))
        .collect()
}

fn contains_ignore_case(haystack: Option<&str>, needle: &str) -> bool {
    haystack
        .map(|h| h.to_lowercase().contains(needle))
        .unwrap_or(false)
}

/// Search text (name, memo, address), status and any-of tag filter
pub fn matches_criteria(spot: &Spot, criteria: &FilterCriteria) -> bool {
    if let Some(q) = &criteria.q {
        let needle = q.trim().to_lowercase();
        if !needle.is_empty()
            && !contains_ignore_case(Some(&spot.name), &needle)
            && !contains_ignore_case(spot.memo.as_deref(), &needle)
            && !contains_ignore_case(spot.address.as_deref(), &needle)
        {
            return false;
        }
    }

    if let Some(status) = criteria.status {
        if spot.status != status {
            return false;
        }
    }

    if !criteria.tags.is_empty() && !criteria.tags.iter().any(|t| spot.tags.contains(t)) {
        return false;
    }

    true
}

/// Descending order where missing values sort last
fn desc_missing_last<T: PartialOrd>(a: Option<T>, b: Option<T>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Stable presentation sort
pub fn sort_spots(spots: &mut [Spot], sort: SortOption) {
    match sort {
        SortOption::CreatedDesc => {
            spots.sort_by(|a, b| desc_missing_last(a.created_at, b.created_at))
        }
        SortOption::NameAsc => {
            spots.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        }
        SortOption::RatingDesc => spots.sort_by(|a, b| desc_missing_last(a.rating, b.rating)),
        SortOption::LatestVisit => {
            spots.sort_by(|a, b| desc_missing_last(a.last_visit_date, b.last_visit_date))
        }
    }
}

/// Restrict to a list view: favorites are pinned spots, shared excludes personal scope
pub fn in_view(spot: &Spot, view: ListView) -> bool {
    match view {
        ListView::Home => true,
        ListView::Favorites => spot.is_pinned,
        ListView::Shared => spot.scope != SpotScope::Personal,
    }
}

/// Filtered and sorted copy of the list for one view
pub fn list_view(spots: &[Spot], view: ListView, criteria: &FilterCriteria) -> Vec<Spot> {
    let mut result: Vec<Spot> = spots
        .iter()
        .filter(|s| in_view(s, view) && matches_criteria(s, criteria))
        .cloned()
        .collect();
    sort_spots(&mut result, criteria.sort);
    result
}

/// Sorted distinct union of every tag on the given spots
pub fn available_tags(spots: &[Spot]) -> Vec<String> {
    spots
        .iter()
        .flat_map(|s| s.tags.iter().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, Utc};
    use uuid::Uuid;

    const PLACEHOLDER: &str = "https://example.com/placeholder.jpg";

    fn row(name: &str) -> SpotRow {
        SpotRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            name: name.to_string(),
            status: "want_to_go".into(),
            scope: "personal".into(),
            cover_photo_url: None,
            is_pinned: None,
            tags: None,
            url: None,
            memo: None,
            phone: None,
            address: None,
            opening_hours: None,
            price_min: None,
            price_max: None,
            payment_methods: None,
            created_at: Some(Utc::now()),
            visits: None,
            photos: None,
        }
    }

    fn visit_row(spot_id: Uuid, day: u32, rating: i32) -> VisitRow {
        VisitRow {
            id: Uuid::new_v4(),
            spot_id,
            user_id: None,
            visited_at: NaiveDate::from_ymd_opt(2024, 5, day).unwrap(),
            rating,
            memo: None,
            bill: None,
            created_at: None,
            photos: None,
        }
    }

    #[test]
    fn test_spot_without_visits_has_no_rating() {
        let spot = map_spot(row("Cafe A"), PLACEHOLDER);
        assert_eq!(spot.name, "Cafe A");
        assert_eq!(spot.status, SpotStatus::WantToGo);
        assert_eq!(spot.rating, None);
        assert_eq!(spot.visit_count, 0);
        assert_eq!(spot.last_visit_date, None);
        assert_eq!(spot.cover_photo_url, PLACEHOLDER);
        assert!(spot.tags.is_empty());
        assert!(!spot.is_pinned);
    }

    #[test]
    fn test_rating_is_mean_of_visits() {
        let mut r = row("Bistro");
        r.visits = Some(vec![visit_row(r.id, 1, 4), visit_row(r.id, 9, 2)]);
        let spot = map_spot(r, PLACEHOLDER);
        assert!((spot.rating.unwrap() - 3.0).abs() < f64::EPSILON);
        assert_eq!(spot.visit_count, 2);
        assert_eq!(spot.last_visit_date, NaiveDate::from_ymd_opt(2024, 5, 9));
        assert_eq!(spot.visits[0].rating, 2);
    }

    #[test]
    fn test_unknown_enum_values_fall_back() {
        let mut r = row("Bar");
        r.status = "closed".into();
        r.scope = "".into();
        let spot = map_spot(r, PLACEHOLDER);
        assert_eq!(spot.status, SpotStatus::WantToGo);
        assert_eq!(spot.scope, SpotScope::Personal);
    }

    #[test]
    fn test_nested_photos_are_mapped() {
        let mut r = row("Gallery");
        let mut v = visit_row(r.id, 3, 5);
        v.photos = Some(vec![PhotoRow {
            id: Uuid::new_v4(),
            url: "https://cdn.example/v.jpg".into(),
            spot_id: None,
            visit_id: Some(v.id),
            user_id: None,
            created_at: None,
        }]);
        r.visits = Some(vec![v]);
        r.cover_photo_url = Some("https://cdn.example/cover.jpg".into());
        let spot = map_spot(r, PLACEHOLDER);
        assert_eq!(spot.visits[0].photos.len(), 1);
        assert!(!spot.visits[0].photos[0].id.is_temporary());
        assert_eq!(spot.cover_photo_url, "https://cdn.example/cover.jpg");
    }

    #[test]
    fn test_rating_sort_puts_unrated_last() {
        let mut rated = row("Rated");
        rated.visits = Some(vec![visit_row(rated.id, 1, 1)]);
        let mut spots = map_spots(vec![row("Unrated"), rated], PLACEHOLDER);
        sort_spots(&mut spots, SortOption::RatingDesc);
        assert_eq!(spots[0].name, "Rated");
        assert_eq!(spots[1].rating, None);
    }

    #[test]
    fn test_created_sort_is_newest_first() {
        let mut old = row("Old");
        old.created_at = Some(Utc::now() - Duration::days(3));
        let mut spots = map_spots(vec![old, row("New")], PLACEHOLDER);
        sort_spots(&mut spots, SortOption::CreatedDesc);
        assert_eq!(spots[0].name, "New");
        sort_spots(&mut spots, SortOption::NameAsc);
        assert_eq!(spots[0].name, "New");
        assert_eq!(spots[1].name, "Old");
    }

    #[test]
    fn test_filter_by_text_status_and_tags() {
        let mut cafe = row("Cafe A");
        cafe.tags = Some(vec!["cafe".into(), "wifi".into()]);
        cafe.address = Some("Shibuya".into());
        let mut bar = row("Bar B");
        bar.status = "visited".into();
        bar.tags = Some(vec!["bar".into()]);
        let spots = map_spots(vec![cafe, bar], PLACEHOLDER);

        let by_text = FilterCriteria {
            q: Some("shibuya".into()),
            ..Default::default()
        };
        assert_eq!(list_view(&spots, ListView::Home, &by_text).len(), 1);

        let by_status = FilterCriteria {
            status: Some(SpotStatus::Visited),
            ..Default::default()
        };
        assert_eq!(list_view(&spots, ListView::Home, &by_status)[0].name, "Bar B");

        let by_tags = FilterCriteria {
            tags: vec!["wifi".into(), "bar".into()],
            ..Default::default()
        };
        assert_eq!(list_view(&spots, ListView::Home, &by_tags).len(), 2);

        assert_eq!(
            available_tags(&spots),
            vec!["bar".to_string(), "cafe".to_string(), "wifi".to_string()]
        );
    }

    #[test]
    fn test_views_restrict_pinned_and_shared() {
        let mut pinned = row("Pinned");
        pinned.is_pinned = Some(true);
        let mut shared = row("Shared");
        shared.scope = "both".into();
        let spots = map_spots(vec![pinned, shared, row("Plain")], PLACEHOLDER);
        let criteria = FilterCriteria::default();
        assert_eq!(list_view(&spots, ListView::Favorites, &criteria)[0].name, "Pinned");
        assert_eq!(list_view(&spots, ListView::Shared, &criteria)[0].name, "Shared");
        assert_eq!(list_view(&spots, ListView::Home, &criteria).len(), 3);
    }
}
