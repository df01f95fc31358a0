// src/services/entitlements.rs
// DOCUMENTATION: Plan entitlement source
// PURPOSE: Keep plan lookup behind one interface so a billing integration can
// replace the local subscription marker without touching the usage limiter

use crate::errors::SpotsError;
use crate::models::Plan;
use crate::services::local_state::KeyValueStore;
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

#[async_trait]
pub trait EntitlementProvider: Send + Sync {
    /// Plan the user paid for, if any
    async fn subscribed_plan(&self, user_id: Uuid) -> Result<Option<Plan>, SpotsError>;

    /// Record a completed checkout
    async fn record_subscription(&self, user_id: Uuid, plan: Plan) -> Result<(), SpotsError>;

    async fn cancel_subscription(&self, user_id: Uuid) -> Result<(), SpotsError>;
}

/// Subscription marker stored under `plan_subscription_<user id>`
pub struct LocalEntitlements {
    state: Arc<dyn KeyValueStore>,
}

impl LocalEntitlements {
    pub fn new(state: Arc<dyn KeyValueStore>) -> Self {
        Self { state }
    }

    fn key(user_id: Uuid) -> String {
        format!("plan_subscription_{}", user_id)
    }
}

#[async_trait]
impl EntitlementProvider for LocalEntitlements {
    async fn subscribed_plan(&self, user_id: Uuid) -> Result<Option<Plan>, SpotsError> {
        Ok(self
            .state
            .get(&Self::key(user_id))
            .await
            .and_then(|marker| Plan::from_marker(&marker)))
    }

    async fn record_subscription(&self, user_id: Uuid, plan: Plan) -> Result<(), SpotsError> {
        if plan == Plan::Free {
            return self.cancel_subscription(user_id).await;
        }
        self.state
            .set(&Self::key(user_id), plan.as_str().to_string())
            .await
    }

    async fn cancel_subscription(&self, user_id: Uuid) -> Result<(), SpotsError> {
        self.state.remove(&Self::key(user_id)).await
    }
}
