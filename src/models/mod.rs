//! Records returned by the PRMS backend.
//!
//! The backend is PHP over MySQL and emits many numeric columns as JSON
//! strings, so numeric fields go through the lenient helpers below.

pub mod audit;
pub mod backup;
pub mod dashboard;
pub mod disease;
pub mod forecast;
pub mod patient;
pub mod record;
pub mod report;
pub mod settings;
pub mod tracker;
pub mod user;

pub use audit::{ActivityLog, AuditLog, AuditResult};
pub use backup::{BackupFile, DatabaseSize};
pub use dashboard::{DashboardAlert, DashboardData, DashboardStats};
pub use disease::Disease;
pub use forecast::{ArimaForecast, ArimaResult, ForecastRecord, SeirForecast, SeirPoint};
pub use patient::Patient;
pub use record::MedicalRecord;
pub use report::RhuExportRecord;
pub use settings::{ClinicSettings, SettingsUpdate};
pub use tracker::{HeatmapPoint, HeatmapSummary};
pub use user::{User, UserUpdate};

pub(crate) mod lenient {
    use serde::de::{self, Deserializer};
    use serde::Deserialize;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Int(i64),
        Float(f64),
        Text(String),
    }

    fn parse_f64<E: de::Error>(raw: NumberOrString) -> Result<Option<f64>, E> {
        match raw {
            NumberOrString::Int(n) => Ok(Some(n as f64)),
            NumberOrString::Float(n) => Ok(Some(n)),
            NumberOrString::Text(s) if s.trim().is_empty() => Ok(None),
            NumberOrString::Text(s) => s
                .trim()
                .parse::<f64>()
                .map(Some)
                .map_err(|_| E::custom(format!("expected a number, got {s:?}"))),
        }
    }

    /// Null and blank count as zero; SQL aggregates over no rows come back as NULL.
    pub fn f64<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
        Ok(opt_f64(d)?.unwrap_or_default())
    }

    pub fn opt_f64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        match Option::<NumberOrString>::deserialize(d)? {
            Some(raw) => parse_f64(raw),
            None => Ok(None),
        }
    }

    pub fn i64<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
        let Some(raw) = Option::<NumberOrString>::deserialize(d)? else {
            return Ok(0);
        };
        match raw {
            NumberOrString::Int(n) => Ok(n),
            NumberOrString::Float(n) => Ok(n as i64),
            NumberOrString::Text(s) if s.trim().is_empty() => Ok(0),
            NumberOrString::Text(s) => s
                .trim()
                .parse::<i64>()
                .map_err(|_| de::Error::custom(format!("expected an integer, got {s:?}"))),
        }
    }

    pub fn u32<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
        let n = i64(d)?;
        u32::try_from(n).map_err(|_| de::Error::custom(format!("{n} is out of range")))
    }

    pub fn opt_u32<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u32>, D::Error> {
        match opt_f64(d)? {
            Some(n) if n >= 0.0 => Ok(Some(n as u32)),
            Some(n) => Err(de::Error::custom(format!("{n} is out of range"))),
            None => Ok(None),
        }
    }

    /// Accepts `"12"`, `12` or `null` and always yields text.
    pub fn opt_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(match Option::<NumberOrString>::deserialize(d)? {
            Some(NumberOrString::Text(s)) => Some(s),
            Some(NumberOrString::Int(n)) => Some(n.to_string()),
            Some(NumberOrString::Float(n)) => Some(n.to_string()),
            None => None,
        })
    }
}
