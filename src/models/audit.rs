use serde::{Deserialize, Serialize};

use super::lenient;
use crate::pipeline::refine::{Refinable, SortValue};

/// Outcome column of an audit entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditResult {
    Success,
    Failed,
    Error,
    #[default]
    #[serde(other)]
    Unknown,
}

impl AuditResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditResult::Success => "success",
            AuditResult::Failed => "failed",
            AuditResult::Error => "error",
            AuditResult::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLog {
    #[serde(deserialize_with = "lenient::i64")]
    pub id: i64,
    pub created_at: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub user_type: Option<String>,
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub entity_type: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub entity_id: Option<String>,
    #[serde(default)]
    pub result: AuditResult,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityLog {
    #[serde(deserialize_with = "lenient::i64")]
    pub id: i64,
    pub created_at: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub user_type: Option<String>,
    #[serde(default)]
    pub activity_type: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub ip_address: Option<String>,
}

impl Refinable for AuditLog {
    fn searchable(&self) -> Vec<&str> {
        let mut fields = vec![self.action.as_str()];
        fields.extend(self.username.as_deref());
        fields.extend(self.description.as_deref());
        fields.extend(self.entity_type.as_deref());
        fields
    }

    fn field(&self, name: &str) -> Option<&str> {
        match name {
            "action" => Some(&self.action),
            "user_type" => self.user_type.as_deref(),
            "result" => Some(self.result.as_str()),
            _ => None,
        }
    }

    fn sort_value(&self, key: &str) -> SortValue<'_> {
        match key {
            "created_at" => SortValue::Text(&self.created_at),
            "username" => self.username.as_deref().into(),
            "action" => SortValue::Text(&self.action),
            "result" => SortValue::Text(self.result.as_str()),
            _ => SortValue::Missing,
        }
    }
}

impl Refinable for ActivityLog {
    fn searchable(&self) -> Vec<&str> {
        let mut fields = vec![self.activity_type.as_str()];
        fields.extend(self.username.as_deref());
        fields.extend(self.description.as_deref());
        fields
    }

    fn field(&self, name: &str) -> Option<&str> {
        match name {
            "activity_type" => Some(&self.activity_type),
            "user_type" => self.user_type.as_deref(),
            _ => None,
        }
    }

    fn sort_value(&self, key: &str) -> SortValue<'_> {
        match key {
            "created_at" => SortValue::Text(&self.created_at),
            "username" => self.username.as_deref().into(),
            "activity_type" => SortValue::Text(&self.activity_type),
            _ => SortValue::Missing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_results_do_not_fail_decoding() {
        let log: AuditLog = serde_json::from_str(
            r#"{"id": "5", "created_at": "2025-02-01 08:00:00", "action": "LOGIN",
                "result": "pending", "entity_id": 17}"#,
        )
        .unwrap();
        assert_eq!(log.result, AuditResult::Unknown);
        assert_eq!(log.entity_id.as_deref(), Some("17"));
    }

    #[test]
    fn missing_result_is_unknown() {
        let log: AuditLog =
            serde_json::from_str(r#"{"id": 6, "created_at": "2025-02-01 08:05:00", "action": "LOGOUT"}"#).unwrap();
        assert_eq!(log.result, AuditResult::Unknown);
        assert_eq!(AuditResult::default().as_str(), "unknown");
    }
}
