use serde::{Deserialize, Serialize};

use super::lenient;

/// The single clinic settings row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClinicSettings {
    #[serde(default)]
    pub clinic_name: Option<String>,
    #[serde(default)]
    pub clinic_address: Option<String>,
    #[serde(default)]
    pub clinic_phone: Option<String>,
    #[serde(default)]
    pub clinic_email: Option<String>,
    /// `"lat,lng"`.
    #[serde(default)]
    pub map_default_center: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_u32")]
    pub map_default_zoom: Option<u32>,
    #[serde(default, deserialize_with = "lenient::opt_u32")]
    pub forecast_default_days: Option<u32>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl ClinicSettings {
    pub fn map_center(&self) -> Option<(f64, f64)> {
        let (lat, lng) = self.map_default_center.as_deref()?.split_once(',')?;
        Some((lat.trim().parse().ok()?, lng.trim().parse().ok()?))
    }
}

/// Partial update; only the fields that are set are sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SettingsUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clinic_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clinic_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clinic_phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clinic_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub map_default_center: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub map_default_zoom: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forecast_default_days: Option<u32>,
}

impl SettingsUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
