// src/services/photo_diff.rs
// DOCUMENTATION: Three-way photo set reconciliation
// PURPOSE: Decide which persisted photos to delete and which new photos to insert

use crate::models::{NewPhotoRow, Photo, PhotoParent};
use std::collections::HashSet;
use uuid::Uuid;

/// Remote writes needed to bring a parent's photo set in line with a submission
/// DOCUMENTATION: Photos that are neither new nor removed produce no operation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhotoPlan {
    pub delete: Vec<Uuid>,
    pub insert: Vec<NewPhotoRow>,
}

impl PhotoPlan {
    /// Diff `persisted` ids against the `submitted` list for a parent with a permanent id
    pub fn diff(
        parent: PhotoParent,
        persisted: &[Uuid],
        submitted: &[Photo],
        uploader_id: Uuid,
    ) -> Self {
        let kept: HashSet<Uuid> = submitted.iter().filter_map(|p| p.id.persisted()).collect();

        let delete = persisted
            .iter()
            .filter(|id| !kept.contains(id))
            .copied()
            .collect();

        let insert = submitted
            .iter()
            .filter(|p| p.id.is_temporary())
            .map(|p| {
                NewPhotoRow::for_parent(
                    parent,
                    p.url.clone(),
                    p.uploader_id.unwrap_or(uploader_id),
                )
            })
            .collect();

        PhotoPlan { delete, insert }
    }

    pub fn is_empty(&self) -> bool {
        self.delete.is_empty() && self.insert.is_empty()
    }
}
