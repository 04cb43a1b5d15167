use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::lenient;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    #[serde(default, deserialize_with = "lenient::i64")]
    pub total_patients: i64,
    #[serde(default, deserialize_with = "lenient::i64")]
    pub total_diseases: i64,
    #[serde(default, deserialize_with = "lenient::i64")]
    pub active_cases: i64,
    #[serde(default, deserialize_with = "lenient::i64")]
    pub healthy_patients: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardAlert {
    /// `warning` or `danger`.
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    #[serde(default)]
    pub disease: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub count: Option<f64>,
}

/// Payload of `get_dashboard_data.php`; chart series stay opaque.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardData {
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub stats: DashboardStats,
    #[serde(default)]
    pub disease_stats: Value,
    #[serde(default)]
    pub recent_activities: Value,
    #[serde(default)]
    pub weekly_stats: Value,
    #[serde(default)]
    pub alerts: Vec<DashboardAlert>,
}
