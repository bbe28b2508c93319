//! Credit types.

use serde::{Deserialize, Serialize};

/// Current credit balance of the account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditBalance {
    #[serde(default)]
    pub credit_packs: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub free_credits: Option<f64>,
    /// Time until the free credits reset, as `[d.]hh:mm:ss`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub free_credits_reset_in: Option<String>,
}

/// Credits consumed on one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyUsage {
    /// `YYYY-MM-DD`
    pub date: String,
    #[serde(default)]
    pub credit_packs: f64,
    #[serde(default)]
    pub free_credits: f64,
}

/// Filters for listing daily usage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DailyUsageListOptions {
    pub limit: Option<u32>,
    /// Resume a previous listing; other filters are ignored.
    pub cursor: Option<String>,
    /// Inclusive, `YYYY-MM-DD`.
    pub since: Option<String>,
    /// Inclusive, `YYYY-MM-DD`.
    pub until: Option<String>,
}
