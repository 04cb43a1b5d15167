//! CSV export of list pages and forecasts.
//!
//! Every field is wrapped in double quotes. In [`Quoting::Naive`] mode
//! embedded quotes are written as-is, which is what downstream spreadsheets
//! have always received; a value containing `"` therefore does not survive a
//! round trip. [`Quoting::Escaped`] doubles them per RFC 4180.

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use tracing::info;

use crate::error::Result;
use crate::models::{ArimaResult, AuditLog, Patient, RhuExportRecord};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Quoting {
    #[default]
    Naive,
    Escaped,
}

impl Quoting {
    fn quote(self, value: &str) -> String {
        match self {
            Quoting::Naive => format!("\"{value}\""),
            Quoting::Escaped => format!("\"{}\"", value.replace('"', "\"\"")),
        }
    }
}

/// A row type with a fixed CSV layout.
pub trait CsvRecord {
    const HEADER: &'static str;

    fn csv_fields(&self) -> Vec<String>;
}

fn text(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

impl CsvRecord for Patient {
    const HEADER: &'static str = "Patient ID,Full Name,Age,Sex,Address,Contact Number,Email,Disease,Status,Severity,Last Visit,Date Added";

    fn csv_fields(&self) -> Vec<String> {
        vec![
            self.display_id(),
            self.full_name.clone(),
            self.age.map(|a| a.to_string()).unwrap_or_default(),
            self.sex.clone(),
            self.address.clone(),
            text(&self.contact_number),
            text(&self.email),
            text(&self.previous_illness),
            text(&self.status),
            text(&self.severity),
            text(&self.last_visit_date),
            text(&self.created_at),
        ]
    }
}

impl CsvRecord for AuditLog {
    const HEADER: &'static str =
        "Date/Time,Username,User Type,Action,Entity Type,Entity ID,Result,IP Address,Description";

    fn csv_fields(&self) -> Vec<String> {
        vec![
            self.created_at.clone(),
            text(&self.username),
            text(&self.user_type),
            self.action.clone(),
            text(&self.entity_type),
            text(&self.entity_id),
            self.result.as_str().to_string(),
            text(&self.ip_address),
            text(&self.description),
        ]
    }
}

impl CsvRecord for RhuExportRecord {
    const HEADER: &'static str = "Barangay,Disease,ICD Code,Age,Gender,Month-Year,Case Count";

    fn csv_fields(&self) -> Vec<String> {
        vec![
            self.barangay.clone(),
            self.disease.clone(),
            self.icd_code.clone().filter(|c| !c.is_empty()).unwrap_or_else(|| "N/A".into()),
            text(&self.age),
            text(&self.gender),
            self.month_year.clone(),
            self.case_count.to_string(),
        ]
    }
}

/// ARIMA predictions stamped with the moment of export.
pub struct ArimaExport<'a> {
    pub result: &'a ArimaResult,
    pub generated_at: DateTime<Utc>,
}

impl CsvRecord for ArimaExport<'_> {
    const HEADER: &'static str = "Disease,Forecast Month,Predicted Cases,Generated At";

    fn csv_fields(&self) -> Vec<String> {
        vec![
            self.result.disease_name.clone(),
            self.result.forecast_month.clone(),
            self.result.rounded_cases().to_string(),
            self.generated_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        ]
    }
}

pub fn to_csv<T: CsvRecord>(rows: &[T], quoting: Quoting) -> String {
    let mut out = String::with_capacity(T::HEADER.len() + rows.len() * 64);
    out.push_str(T::HEADER);
    out.push('\n');
    for row in rows {
        let line: Vec<String> = row.csv_fields().iter().map(|f| quoting.quote(f)).collect();
        out.push_str(&line.join(","));
        out.push('\n');
    }
    out
}

pub fn arima_csv(results: &[ArimaResult], generated_at: DateTime<Utc>, quoting: Quoting) -> String {
    let rows: Vec<ArimaExport<'_>> =
        results.iter().map(|result| ArimaExport { result, generated_at }).collect();
    to_csv(&rows, quoting)
}

/// `{prefix}_{YYYY-MM-DD}.csv`
pub fn export_filename(prefix: &str, date: NaiveDate) -> String {
    format!("{prefix}_{}.csv", date.format("%Y-%m-%d"))
}

pub fn rhu_export_filename(disease: Option<&str>, days: u32, date: NaiveDate) -> String {
    let disease = match disease {
        Some(d) if !d.is_empty() && !d.eq_ignore_ascii_case("all") => d.replace(' ', "_"),
        _ => "All_Diseases".to_string(),
    };
    export_filename(&format!("RHU_IS_Export_{disease}_{days}days"), date)
}

/// Writes `contents` to `dir/filename`, creating `dir` if needed.
pub async fn write_export(dir: &Path, filename: &str, contents: &str) -> Result<PathBuf> {
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(filename);
    tokio::fs::write(&path, contents).await?;
    info!(path = %path.display(), bytes = contents.len(), "export written");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    /// Minimal reader: splits on commas outside quotes, strips the wrapping
    /// quotes, understands doubled quotes.
    fn parse_line(line: &str) -> Vec<String> {
        let mut fields = Vec::new();
        let mut current = String::new();
        let mut in_quotes = false;
        let mut chars = line.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '"' if in_quotes && chars.peek() == Some(&'"') => {
                    current.push('"');
                    chars.next();
                }
                '"' => in_quotes = !in_quotes,
                ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
                other => current.push(other),
            }
        }
        fields.push(current);
        fields
    }

    fn rhu(barangay: &str, icd: Option<&str>) -> RhuExportRecord {
        RhuExportRecord {
            barangay: barangay.into(),
            disease: "Dengue".into(),
            icd_code: icd.map(str::to_string),
            age: Some("34".into()),
            gender: Some("Male".into()),
            month_year: "2025-03".into(),
            case_count: 4,
        }
    }

    #[test]
    fn rhu_layout_matches_the_registry_format() {
        let csv = to_csv(&[rhu("Bangyas", None), rhu("Dayap", Some("A90"))], Quoting::Naive);
        assert_eq!(
            csv,
            "Barangay,Disease,ICD Code,Age,Gender,Month-Year,Case Count\n\
             \"Bangyas\",\"Dengue\",\"N/A\",\"34\",\"Male\",\"2025-03\",\"4\"\n\
             \"Dayap\",\"Dengue\",\"A90\",\"34\",\"Male\",\"2025-03\",\"4\"\n"
        );
    }

    #[test]
    fn commas_survive_a_round_trip() {
        let csv = to_csv(&[rhu("Poblacion, Calauan", None)], Quoting::Naive);
        let line = csv.lines().nth(1).unwrap();
        assert_eq!(parse_line(line)[0], "Poblacion, Calauan");
        assert_eq!(parse_line(line).len(), 7);
    }

    #[test]
    fn naive_quoting_breaks_on_embedded_quotes() {
        let row = rhu("Barangay \"Uno\"", None);
        let naive = to_csv(&[row.clone()], Quoting::Naive);
        assert_ne!(parse_line(naive.lines().nth(1).unwrap())[0], "Barangay \"Uno\"");

        let escaped = to_csv(&[row], Quoting::Escaped);
        assert_eq!(parse_line(escaped.lines().nth(1).unwrap())[0], "Barangay \"Uno\"");
    }

    #[test]
    fn arima_rows_round_predictions() {
        let results = vec![ArimaResult {
            disease_name: "Dengue".into(),
            forecast_month: "2025-04".into(),
            forecast_cases: 12.6,
            barangay: None,
            error: None,
        }];
        let at = Utc.with_ymd_and_hms(2025, 3, 15, 8, 30, 0).unwrap();
        let csv = arima_csv(&results, at, Quoting::Naive);
        assert_eq!(
            csv.lines().nth(1),
            Some("\"Dengue\",\"2025-04\",\"13\",\"2025-03-15T08:30:00.000Z\"")
        );
    }

    #[test]
    fn patient_ids_are_zero_padded() {
        let patient: Patient =
            serde_json::from_str(r#"{"id": 7, "full_name": "Ana Reyes", "sex": "Female"}"#).unwrap();
        let csv = to_csv(&[patient], Quoting::Naive);
        assert!(csv.lines().nth(1).unwrap().starts_with("\"0007\",\"Ana Reyes\",\"\",\"Female\""));
    }

    #[test]
    fn file_names_carry_the_date() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 15).unwrap();
        assert_eq!(export_filename("arima_forecast", date), "arima_forecast_2025-03-15.csv");
        assert_eq!(
            rhu_export_filename(Some("all"), 30, date),
            "RHU_IS_Export_All_Diseases_30days_2025-03-15.csv"
        );
        assert_eq!(
            rhu_export_filename(Some("Dengue"), 90, date),
            "RHU_IS_Export_Dengue_90days_2025-03-15.csv"
        );
    }

    #[tokio::test]
    async fn writes_into_the_export_directory() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("exports");
        let path = write_export(&target, "x.csv", "a,b\n").await.unwrap();
        assert_eq!(tokio::fs::read_to_string(path).await.unwrap(), "a,b\n");
    }
}
