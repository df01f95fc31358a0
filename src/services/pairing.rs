// src/services/pairing.rs
// DOCUMENTATION: Partner pairing state machine
// PURPOSE: Compute idle / waiting / connected from two directional profile
// references, submit pairing codes, and self-heal missing profiles

use crate::db::RemoteStore;
use crate::errors::SpotsError;
use crate::models::UserProfile;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PairingState {
    /// No partner set
    Idle,
    /// We point at the partner, the partner does not point back
    Waiting,
    /// Both profiles point at each other
    Connected,
}

/// Response of GET /pairing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairingStatus {
    pub state: PairingState,
    pub pairing_code: String,
    pub partner_id: Option<Uuid>,
    pub partner_email: Option<String>,
}

impl PairingStatus {
    pub fn is_connected(&self) -> bool {
        self.state == PairingState::Connected
    }
}

/// Pure state function over both sides of the relationship
/// DOCUMENTATION: A missing partner profile degrades to `Idle`.
pub fn compute_state(me: &UserProfile, partner: Option<&UserProfile>) -> PairingState {
    match (me.partner_id, partner) {
        (Some(target), Some(partner)) if partner.id == target => {
            if partner.partner_id == Some(me.id) {
                PairingState::Connected
            } else {
                PairingState::Waiting
            }
        }
        _ => PairingState::Idle,
    }
}

/// Short shareable code in `XXXX-XXXX` form
pub fn generate_pairing_code() -> String {
    let hex = Uuid::new_v4().simple().to_string().to_uppercase();
    format!("{}-{}", &hex[0..4], &hex[4..8])
}

pub struct PairingService {
    store: Arc<dyn RemoteStore>,
}

impl PairingService {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self { store }
    }

    /// Load the profile, creating it when the sign-up trigger never did
    pub async fn ensure_profile(
        &self,
        user_id: Uuid,
        email: Option<String>,
    ) -> Result<UserProfile, SpotsError> {
        if let Some(profile) = self.store.get_profile(user_id).await? {
            return Ok(profile);
        }

        log::warn!("Profile for {} missing, creating it", user_id);
        let profile = UserProfile {
            id: user_id,
            email,
            pairing_code: generate_pairing_code(),
            partner_id: None,
        };
        self.store.insert_profile(&profile).await
    }

    /// Recompute the status from fresh profile reads
    pub async fn status(&self, user_id: Uuid) -> Result<PairingStatus, SpotsError> {
        let me = self
            .store
            .get_profile(user_id)
            .await?
            .ok_or_else(|| SpotsError::NotFound(format!("profile {}", user_id)))?;

        let partner = match me.partner_id {
            Some(partner_id) => self.store.get_profile(partner_id).await?,
            None => None,
        };
        if me.partner_id.is_some() && partner.is_none() {
            log::warn!("Partner profile of {} not found, treating as idle", user_id);
        }

        let state = compute_state(&me, partner.as_ref());
        let (partner_id, partner_email) = match (state, partner) {
            (PairingState::Idle, _) | (_, None) => (None, None),
            (_, Some(p)) => (Some(p.id), p.email),
        };
        Ok(PairingStatus {
            state,
            pairing_code: me.pairing_code,
            partner_id,
            partner_email,
        })
    }

    /// Point the current user at the owner of `code`; the partner's row is never written
    pub async fn submit_code(&self, user_id: Uuid, code: &str) -> Result<PairingStatus, SpotsError> {
        let code = code.trim().to_uppercase();
        if code.is_empty() {
            return Err(SpotsError::field("code", "required", "Enter a pairing code"));
        }

        let partner = self
            .store
            .find_profile_by_code(&code)
            .await?
            .ok_or_else(|| {
                SpotsError::field("code", "not_found", "No user has this pairing code")
            })?;

        if partner.id == user_id {
            return Err(SpotsError::field(
                "code",
                "self_pairing",
                "You cannot pair with your own code",
            ));
        }

        self.store.set_partner(user_id, partner.id).await?;
        log::info!("User {} now points at partner {}", user_id, partner.id);
        self.status(user_id).await
    }
}
