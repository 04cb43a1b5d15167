//! Forecast payloads. The numbers are computed by the backend; this side only
//! decodes, tabulates and exports them.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::lenient;

/// One month of an ARIMA forecast for one disease.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArimaResult {
    pub disease_name: String,
    /// `YYYY-MM`, or `Error` when the backend could not fit this disease.
    pub forecast_month: String,
    #[serde(deserialize_with = "lenient::f64")]
    pub forecast_cases: f64,
    #[serde(default)]
    pub barangay: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ArimaResult {
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Predicted cases as shown to users: whole numbers.
    pub fn rounded_cases(&self) -> i64 {
        self.forecast_cases.round() as i64
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArimaForecast {
    pub forecast_results: Vec<ArimaResult>,
    #[serde(default)]
    pub summary: Option<Value>,
}

impl ArimaForecast {
    /// Results with a usable prediction, skipping per-disease fit errors.
    pub fn predictions(&self) -> impl Iterator<Item = &ArimaResult> {
        self.forecast_results.iter().filter(|r| !r.is_error())
    }
}

/// One day of an SEIR run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeirPoint {
    #[serde(deserialize_with = "lenient::u32")]
    pub day: u32,
    #[serde(deserialize_with = "lenient::f64")]
    pub susceptible: f64,
    #[serde(deserialize_with = "lenient::f64")]
    pub exposed: f64,
    #[serde(deserialize_with = "lenient::f64")]
    pub infected: f64,
    #[serde(deserialize_with = "lenient::f64")]
    pub recovered: f64,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub new_infections: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Interpretation {
    #[serde(default)]
    pub risk_assessment: Option<String>,
    #[serde(default)]
    pub peak_prediction: Option<String>,
    #[serde(default)]
    pub reproduction_analysis: Option<String>,
    #[serde(default)]
    pub trend_analysis: Option<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeirForecast {
    pub disease: String,
    #[serde(deserialize_with = "lenient::u32")]
    pub forecast_period: u32,
    #[serde(deserialize_with = "lenient::i64")]
    pub population: i64,
    #[serde(default)]
    pub seir_results: Vec<SeirPoint>,
    #[serde(default)]
    pub indicators: Map<String, Value>,
    #[serde(default)]
    pub interpretation: Option<Interpretation>,
    #[serde(default)]
    pub area_data: Value,
    #[serde(default)]
    pub current_data: Value,
    #[serde(default)]
    pub barangay_risk: Value,
    #[serde(default)]
    pub generated_at: Option<String>,
}

impl SeirForecast {
    /// Numeric indicator by name; PHP may have emitted it as a string.
    pub fn indicator(&self, name: &str) -> Option<f64> {
        match self.indicators.get(name)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn risk_level(&self) -> Option<&str> {
        self.indicators.get("risk_level").and_then(Value::as_str)
    }

    /// The interpretation block, or placeholder text when a stored forecast
    /// predates interpretations.
    pub fn interpretation_or_default(&self) -> Interpretation {
        self.interpretation.clone().unwrap_or_else(|| Interpretation {
            risk_assessment: Some("Risk assessment data not available".into()),
            peak_prediction: Some("Peak prediction data not available".into()),
            reproduction_analysis: Some("Reproduction analysis data not available".into()),
            trend_analysis: Some("Trend analysis data not available".into()),
            recommendations: vec!["Recommendations not available".into()],
        })
    }
}

/// Row of `get_forecasts.php`: a previously generated forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRecord {
    #[serde(deserialize_with = "lenient::i64")]
    pub id: i64,
    pub disease: String,
    #[serde(default)]
    pub forecast_type: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_u32")]
    pub forecast_period: Option<u32>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub population: Option<f64>,
    #[serde(default)]
    pub forecast_results: Value,
    #[serde(default)]
    pub indicators: Value,
    #[serde(default)]
    pub generated_at: Option<String>,
}
