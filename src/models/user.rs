use serde::{Deserialize, Serialize};

use super::lenient;

/// Account row from `get_users.php`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(deserialize_with = "lenient::i64")]
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl User {
    pub fn is_active(&self) -> bool {
        self.status.as_deref() != Some("inactive")
    }
}

/// Fields of `update_user.php`; unset fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UserUpdate {
    pub id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Required by the backend whenever `password` is set.
    #[serde(rename = "oldPassword", skip_serializing_if = "Option::is_none")]
    pub old_password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl UserUpdate {
    pub fn has_changes(&self) -> bool {
        self.username.is_some() || self.password.is_some() || self.role.is_some() || self.status.is_some()
    }
}
