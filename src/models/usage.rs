// src/models/usage.rs

use serde::{Deserialize, Serialize};

/// Subscription plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Plan {
    #[default]
    Free,
    Supporter,
    Couple,
}

impl Plan {
    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::Free => "free",
            Plan::Supporter => "supporter",
            Plan::Couple => "couple",
        }
    }

    pub fn from_marker(value: &str) -> Option<Self> {
        match value {
            "free" => Some(Plan::Free),
            "supporter" => Some(Plan::Supporter),
            "couple" => Some(Plan::Couple),
            _ => None,
        }
    }

    /// Quota table
    pub fn limits(&self) -> PlanLimits {
        match self {
            Plan::Free => PlanLimits {
                photos: Some(50),
                ai_per_month: 5,
            },
            Plan::Supporter => PlanLimits {
                photos: Some(500),
                ai_per_month: 30,
            },
            Plan::Couple => PlanLimits {
                photos: None,
                ai_per_month: 100,
            },
        }
    }
}

/// Quotas of one plan; `photos: None` means unlimited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlanLimits {
    pub photos: Option<u32>,
    pub ai_per_month: u32,
}

/// Recomputed usage counters of the current user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct UsageStats {
    pub photos: u32,
    pub ai: u32,
}

/// Response of GET /usage
#[derive(Debug, Serialize)]
pub struct UsageReport {
    pub plan: Plan,
    pub limits: PlanLimits,
    pub usage: UsageStats,
}

/// Body of PUT /plan
#[derive(Debug, Deserialize)]
pub struct PlanChangeRequest {
    pub plan: Plan,
}
