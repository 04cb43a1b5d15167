use serde::{Deserialize, Serialize};

use super::lenient;
use crate::pipeline::refine::{Refinable, SortValue};

/// Entry in the disease catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Disease {
    #[serde(deserialize_with = "lenient::i64")]
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub symptoms: String,
    #[serde(default)]
    pub incubation_period: Option<String>,
    #[serde(default)]
    pub contagious_period: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

/// Placeholder row seeded by the backend's dummy-data scripts; never offered
/// as a filter choice.
pub const TEST_DISEASE: &str = "Test Disease";

/// Filter choices for a disease selector: `all` followed by catalog names.
pub fn filter_options(catalog: &[Disease]) -> Vec<String> {
    std::iter::once("all".to_string())
        .chain(
            catalog
                .iter()
                .filter(|d| d.name != TEST_DISEASE)
                .map(|d| d.name.clone()),
        )
        .collect()
}

impl Refinable for Disease {
    fn searchable(&self) -> Vec<&str> {
        vec![&self.name, &self.description, &self.symptoms]
    }

    fn field(&self, name: &str) -> Option<&str> {
        match name {
            "name" => Some(&self.name),
            "color" => self.color.as_deref(),
            _ => None,
        }
    }

    fn sort_value(&self, key: &str) -> SortValue<'_> {
        match key {
            "id" => SortValue::Number(self.id as f64),
            "name" => SortValue::Text(&self.name),
            _ => SortValue::Missing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn disease(id: i64, name: &str) -> Disease {
        Disease {
            id,
            name: name.into(),
            description: String::new(),
            symptoms: String::new(),
            incubation_period: None,
            contagious_period: None,
            icon: None,
            color: None,
        }
    }

    #[test]
    fn filter_options_skip_test_disease() {
        let catalog = vec![disease(1, "Dengue"), disease(2, TEST_DISEASE), disease(3, "Measles")];
        assert_eq!(filter_options(&catalog), vec!["all", "Dengue", "Measles"]);
    }
}
