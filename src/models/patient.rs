use serde::{Deserialize, Serialize};

use super::lenient;
use crate::pipeline::refine::{Refinable, SortValue};

/// A patient row as returned by `get_patients.php`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    #[serde(deserialize_with = "lenient::i64")]
    pub id: i64,
    #[serde(default)]
    pub full_name: String,
    #[serde(default, deserialize_with = "lenient::opt_u32")]
    pub age: Option<u32>,
    #[serde(default)]
    pub sex: String,
    #[serde(default)]
    pub address: String,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub contact_number: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, alias = "disease")]
    pub previous_illness: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub last_visit_date: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl Patient {
    /// Four-digit, zero-padded display ID (`7` becomes `0007`).
    pub fn display_id(&self) -> String {
        format_patient_id(self.id)
    }
}

pub fn format_patient_id(id: i64) -> String {
    if id <= 0 {
        return "0000".to_string();
    }
    format!("{id:04}")
}

impl Refinable for Patient {
    fn searchable(&self) -> Vec<&str> {
        let mut fields = vec![self.full_name.as_str(), self.address.as_str()];
        fields.extend(self.contact_number.as_deref());
        fields.extend(self.previous_illness.as_deref());
        fields
    }

    fn field(&self, name: &str) -> Option<&str> {
        match name {
            "full_name" => Some(&self.full_name),
            "sex" => Some(&self.sex),
            "address" => Some(&self.address),
            "disease" | "previous_illness" | "diagnosis" => self.previous_illness.as_deref(),
            "status" => self.status.as_deref(),
            "severity" => self.severity.as_deref(),
            _ => None,
        }
    }

    fn sort_value(&self, key: &str) -> SortValue<'_> {
        match key {
            "id" => SortValue::Number(self.id as f64),
            "age" => self.age.map(|a| SortValue::Number(a as f64)).into(),
            "full_name" => SortValue::Text(&self.full_name),
            "diagnosis" | "previous_illness" => self.previous_illness.as_deref().into(),
            "status" => self.status.as_deref().into(),
            "last_visit_date" => self.last_visit_date.as_deref().into(),
            "created_at" => self.created_at.as_deref().into(),
            "updated_at" => self.updated_at.as_deref().into(),
            _ => SortValue::Missing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_backend_row() {
        let raw = r#"{
            "id": "12", "full_name": "Juan Dela Cruz", "age": "34", "sex": "Male",
            "address": "Poblacion, Calauan", "contact_number": 9171234567,
            "previous_illness": "Dengue", "status": "active", "severity": "moderate",
            "last_visit_date": "2025-03-01 10:00:00", "created_at": "2025-01-10"
        }"#;
        let p: Patient = serde_json::from_str(raw).unwrap();
        assert_eq!(p.id, 12);
        assert_eq!(p.age, Some(34));
        assert_eq!(p.contact_number.as_deref(), Some("9171234567"));
        assert_eq!(p.previous_illness.as_deref(), Some("Dengue"));
        assert_eq!(p.display_id(), "0012");
    }

    #[test]
    fn disease_alias_is_accepted() {
        let p: Patient =
            serde_json::from_str(r#"{"id": 3, "full_name": "Ana", "disease": "Measles"}"#).unwrap();
        assert_eq!(p.field("disease"), Some("Measles"));
    }

    #[test]
    fn missing_ids_format_as_zeros() {
        assert_eq!(format_patient_id(0), "0000");
        assert_eq!(format_patient_id(1000), "1000");
        assert_eq!(format_patient_id(25), "0025");
    }
}
