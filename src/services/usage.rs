// src/services/usage.rs
// DOCUMENTATION: Usage counters and plan quota gates
// PURPOSE: Block photo additions and AI calls before any remote work when the
// plan's quota would be exceeded

use crate::errors::SpotsError;
use crate::models::{Plan, Spot, UsageStats};
use crate::services::entitlements::EntitlementProvider;
use crate::services::local_state::KeyValueStore;
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

/// Calendar month in `YYYY-MM` form, the rollover unit of AI counters
pub fn current_month() -> String {
    Utc::now().format("%Y-%m").to_string()
}

fn ai_usage_key(user_id: Uuid, month: &str) -> String {
    format!("ai_usage_{}_{}", user_id, month)
}

/// Photos the user owns: direct photos of their own spots plus photos of
/// their own visits. Partner-owned photos on shared spots do not count.
pub fn count_photo_usage(spots: &[Spot], user_id: Uuid) -> u32 {
    spots
        .iter()
        .map(|spot| {
            let direct = if spot.owner_id == user_id {
                spot.photos.len()
            } else {
                0
            };
            let visits: usize = spot
                .visits
                .iter()
                .filter(|v| v.user_id == Some(user_id))
                .map(|v| v.photos.len())
                .sum();
            (direct + visits) as u32
        })
        .sum()
}

pub struct UsageLimiter {
    state: Arc<dyn KeyValueStore>,
    entitlements: Arc<dyn EntitlementProvider>,
}

impl UsageLimiter {
    pub fn new(state: Arc<dyn KeyValueStore>, entitlements: Arc<dyn EntitlementProvider>) -> Self {
        Self {
            state,
            entitlements,
        }
    }

    pub fn entitlements(&self) -> &Arc<dyn EntitlementProvider> {
        &self.entitlements
    }

    /// Subscribed plan, upgraded to couple while the pairing is mutual
    pub async fn resolve_plan(&self, user_id: Uuid, mutually_paired: bool) -> Result<Plan, SpotsError> {
        if mutually_paired {
            return Ok(Plan::Couple);
        }
        Ok(self
            .entitlements
            .subscribed_plan(user_id)
            .await?
            .unwrap_or_default())
    }

    pub async fn ai_usage(&self, user_id: Uuid, month: &str) -> u32 {
        self.state
            .get(&ai_usage_key(user_id, month))
            .await
            .and_then(|v| v.parse().ok())
            .unwrap_or(0)
    }

    pub async fn stats(&self, spots: &[Spot], user_id: Uuid, month: &str) -> UsageStats {
        UsageStats {
            photos: count_photo_usage(spots, user_id),
            ai: self.ai_usage(user_id, month).await,
        }
    }

    /// Count one successful AI-assist application
    pub async fn record_ai_use(&self, user_id: Uuid, month: &str) -> Result<u32, SpotsError> {
        let next = self.ai_usage(user_id, month).await + 1;
        self.state
            .set(&ai_usage_key(user_id, month), next.to_string())
            .await?;
        log::info!("AI usage for {} in {}: {}", user_id, month, next);
        Ok(next)
    }
}

/// Adding `additional` photos must keep usage within the plan's cap
pub fn check_photo_quota(plan: Plan, usage: &UsageStats, additional: u32) -> Result<(), SpotsError> {
    match plan.limits().photos {
        Some(limit) if usage.photos + additional > limit => {
            log::warn!(
                "Photo quota blocked: {} + {} over {} on {} plan",
                usage.photos,
                additional,
                limit,
                plan.as_str()
            );
            Err(SpotsError::QuotaExceeded {
                resource: "Photo",
                limit,
            })
        }
        _ => Ok(()),
    }
}

/// One more AI call must be available this month
pub fn check_ai_quota(plan: Plan, usage: &UsageStats) -> Result<(), SpotsError> {
    let limit = plan.limits().ai_per_month;
    if usage.ai >= limit {
        log::warn!("AI quota blocked: {} of {} used", usage.ai, limit);
        return Err(SpotsError::QuotaExceeded {
            resource: "AI",
            limit,
        });
    }
    Ok(())
}
