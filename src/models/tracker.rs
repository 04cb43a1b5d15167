use serde::{Deserialize, Serialize};

use super::lenient;
use crate::pipeline::refine::{Refinable, SortValue};

/// One barangay on the disease hotspot map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapPoint {
    pub barangay: String,
    #[serde(deserialize_with = "lenient::f64")]
    pub latitude: f64,
    #[serde(deserialize_with = "lenient::f64")]
    pub longitude: f64,
    #[serde(deserialize_with = "lenient::i64")]
    pub total_patients: i64,
    #[serde(deserialize_with = "lenient::i64")]
    pub sick_patients: i64,
    /// Percentage in `[0, 100]`.
    #[serde(deserialize_with = "lenient::f64")]
    pub sick_rate: f64,
    #[serde(default, deserialize_with = "lenient::i64")]
    pub disease_types: i64,
    /// Comma-separated diagnoses seen in the barangay.
    #[serde(default)]
    pub diseases: Option<String>,
}

/// Summary block sent next to the heatmap rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeatmapSummary {
    #[serde(default, deserialize_with = "lenient::i64")]
    pub total_barangays: i64,
    #[serde(default, deserialize_with = "lenient::i64")]
    pub total_patients: i64,
    #[serde(default, deserialize_with = "lenient::i64")]
    pub total_sick: i64,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub overall_sick_rate: f64,
}

impl Refinable for HeatmapPoint {
    fn searchable(&self) -> Vec<&str> {
        vec![&self.barangay]
    }

    fn field(&self, name: &str) -> Option<&str> {
        match name {
            "barangay" => Some(&self.barangay),
            "diseases" => self.diseases.as_deref(),
            _ => None,
        }
    }

    fn sort_value(&self, key: &str) -> SortValue<'_> {
        match key {
            "patients" | "total_patients" => SortValue::Number(self.total_patients as f64),
            "sick-rate" | "sick_rate" => SortValue::Number(self.sick_rate),
            "name" | "barangay" => SortValue::Text(&self.barangay),
            _ => SortValue::Missing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_barangay_decodes_with_zero_rate() {
        let raw = r#"{"id": "4", "barangay": "Dayap", "latitude": "14.1523", "longitude": "121.2890",
            "total_patients": "0", "sick_patients": null, "sick_rate": null,
            "disease_types": "0", "diseases": null}"#;
        let point: HeatmapPoint = serde_json::from_str(raw).unwrap();
        assert_eq!(point.total_patients, 0);
        assert_eq!(point.sick_patients, 0);
        assert_eq!(point.sick_rate, 0.0);
        assert_eq!(point.diseases, None);
    }
}
