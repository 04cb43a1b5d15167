use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::lenient;

/// One consultation from `get_all_medical_records.php`, joined with the
/// patient's demographics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicalRecord {
    #[serde(default, deserialize_with = "lenient::i64")]
    pub medical_record_id: i64,
    #[serde(deserialize_with = "lenient::i64")]
    pub patient_id: i64,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub diagnosis: Option<String>,
    #[serde(default)]
    pub date_of_consultation: Option<String>,
    #[serde(default)]
    pub chief_complaint: Option<String>,
    #[serde(default)]
    pub health_provider: Option<String>,
    #[serde(default)]
    pub prescribed_medicine: Option<String>,
    #[serde(default)]
    pub medical_advice: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub blood_pressure: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    /// Remaining form columns (vitals, PhilHealth ID, name parts).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MedicalRecord {
    pub fn extra_text(&self, column: &str) -> Option<String> {
        match self.extra.get(column)? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_columns_land_in_extra() {
        let raw = r#"{"medical_record_id": "9", "patient_id": "12", "full_name": "Juan Dela Cruz",
            "diagnosis": "Dengue", "temperature": "38.5", "philhealth_id": "12-345678901-2",
            "weight": 61}"#;
        let record: MedicalRecord = serde_json::from_str(raw).unwrap();
        assert_eq!(record.patient_id, 12);
        assert_eq!(record.temperature, Some(38.5));
        assert_eq!(record.extra_text("philhealth_id").as_deref(), Some("12-345678901-2"));
        assert_eq!(record.extra_text("weight").as_deref(), Some("61"));
        assert_eq!(record.extra_text("height"), None);
    }
}
