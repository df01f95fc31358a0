// src/services/session.rs
// DOCUMENTATION: Auth session stand-in
// PURPOSE: Current user id plus a subscribable session-change signal

use crate::errors::SpotsError;
use tokio::sync::watch;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub struct SessionUser {
    pub id: Uuid,
    pub email: Option<String>,
}

pub struct AuthSession {
    current: watch::Sender<Option<SessionUser>>,
}

impl Default for AuthSession {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthSession {
    pub fn new() -> Self {
        let (current, _) = watch::channel(None);
        Self { current }
    }

    pub fn current(&self) -> Option<SessionUser> {
        self.current.borrow().clone()
    }

    pub fn user_id(&self) -> Result<Uuid, SpotsError> {
        self.current
            .borrow()
            .as_ref()
            .map(|u| u.id)
            .ok_or(SpotsError::Unauthorized)
    }

    pub fn sign_in(&self, user: SessionUser) {
        log::info!("Session started for {}", user.id);
        self.current.send_replace(Some(user));
    }

    pub fn sign_out(&self) {
        if let Some(user) = self.current.send_replace(None) {
            log::info!("Session ended for {}", user.id);
        }
    }

    /// Receiver notified on every sign-in and sign-out
    pub fn subscribe(&self) -> watch::Receiver<Option<SessionUser>> {
        self.current.subscribe()
    }
}
