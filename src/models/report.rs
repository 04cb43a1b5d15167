use serde::{Deserialize, Serialize};

use super::lenient;
use crate::pipeline::refine::{Refinable, SortValue};

/// Row of the RHU-IS export (`get_rhu_export_data.php`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RhuExportRecord {
    pub barangay: String,
    pub disease: String,
    #[serde(default)]
    pub icd_code: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub age: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub month_year: String,
    #[serde(deserialize_with = "lenient::i64")]
    pub case_count: i64,
}

impl Refinable for RhuExportRecord {
    fn searchable(&self) -> Vec<&str> {
        vec![&self.barangay, &self.disease]
    }

    fn field(&self, name: &str) -> Option<&str> {
        match name {
            "barangay" => Some(&self.barangay),
            "disease" => Some(&self.disease),
            "gender" => self.gender.as_deref(),
            _ => None,
        }
    }

    fn sort_value(&self, key: &str) -> SortValue<'_> {
        match key {
            "barangay" => SortValue::Text(&self.barangay),
            "disease" => SortValue::Text(&self.disease),
            "month_year" => SortValue::Text(&self.month_year),
            "case_count" => SortValue::Number(self.case_count as f64),
            _ => SortValue::Missing,
        }
    }
}
