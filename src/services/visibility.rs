// src/services/visibility.rs
// DOCUMENTATION: Partner-scoped visibility rules
// PURPOSE: Narrow the remote query by owner and re-filter every fetched row set

use crate::models::{SpotRow, SpotScope};
use uuid::Uuid;

/// Who is looking and who they are paired with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewer {
    pub user_id: Uuid,
    pub partner_id: Option<Uuid>,
}

impl Viewer {
    pub fn new(user_id: Uuid, partner_id: Option<Uuid>) -> Self {
        Self {
            user_id,
            partner_id,
        }
    }

    /// Owner ids the remote select is narrowed to
    pub fn owner_ids(&self) -> Vec<Uuid> {
        match self.partner_id {
            Some(partner) if partner != self.user_id => vec![self.user_id, partner],
            _ => vec![self.user_id],
        }
    }

    /// Own rows are always visible; partner rows only when shared
    pub fn can_see(&self, owner_id: Uuid, scope: SpotScope) -> bool {
        if owner_id == self.user_id {
            return true;
        }
        self.partner_id == Some(owner_id) && scope.is_partner_visible()
    }
}

/// Drop every fetched row the viewer is not allowed to see
pub fn filter_visible(rows: Vec<SpotRow>, viewer: &Viewer) -> Vec<SpotRow> {
    let before = rows.len();
    let visible: Vec<SpotRow> = rows
        .into_iter()
        .filter(|row| viewer.can_see(row.user_id, SpotScope::from_storage(&row.scope)))
        .collect();
    if visible.len() < before {
        log::debug!("Visibility filter dropped {} rows", before - visible.len());
    }
    visible
}
