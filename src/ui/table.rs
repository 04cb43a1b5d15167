//! Plain-text tables for the terminal pages.

use crate::hotspot::RiskBand;
use crate::models::{
    ActivityLog, AuditLog, BackupFile, Disease, ForecastRecord, HeatmapPoint, MedicalRecord, Patient,
    RhuExportRecord, User,
};
use crate::pipeline::Pagination;

const MAX_CELL: usize = 40;

/// A row the table renderer knows how to lay out.
pub trait TableRow {
    const COLUMNS: &'static [&'static str];

    fn cells(&self) -> Vec<String>;
}

fn or_dash(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v.to_string(),
        _ => "-".to_string(),
    }
}

fn clip(cell: &str) -> String {
    if cell.chars().count() <= MAX_CELL {
        return cell.to_string();
    }
    let mut clipped: String = cell.chars().take(MAX_CELL - 3).collect();
    clipped.push_str("...");
    clipped
}

/// Left-aligned columns separated by two spaces, with a rule under the header.
pub fn render_table<T: TableRow>(rows: &[T]) -> String {
    let body: Vec<Vec<String>> = rows
        .iter()
        .map(|row| row.cells().iter().map(|c| clip(c)).collect())
        .collect();
    let mut widths: Vec<usize> = T::COLUMNS.iter().map(|c| c.chars().count()).collect();
    for cells in &body {
        for (width, cell) in widths.iter_mut().zip(cells) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let line = |cells: &[String]| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, &width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let header: Vec<String> = T::COLUMNS.iter().map(|c| c.to_string()).collect();
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    let mut out = vec![line(header.as_slice()), line(rule.as_slice())];
    out.extend(body.iter().map(|cells| line(cells.as_slice())));
    out.join("\n")
}

/// `Showing 26 to 50 of 53 results  (page 2 of 3)`.
pub fn render_pagination(pagination: &Pagination, rows_on_page: usize) -> String {
    match pagination.shown_range(rows_on_page) {
        Some((start, end)) => format!(
            "Showing {start} to {end} of {} results  (page {} of {})",
            pagination.total_records,
            pagination.current_page,
            pagination.total_pages.max(1)
        ),
        None => "No records found".to_string(),
    }
}

impl TableRow for Patient {
    const COLUMNS: &'static [&'static str] =
        &["ID", "Name", "Age", "Sex", "Address", "Contact", "Illness", "Last Visit"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.display_id(),
            self.full_name.clone(),
            self.age.map(|a| a.to_string()).unwrap_or_else(|| "-".into()),
            self.sex.clone(),
            self.address.clone(),
            or_dash(self.contact_number.as_deref()),
            or_dash(self.previous_illness.as_deref()),
            or_dash(self.last_visit_date.as_deref()),
        ]
    }
}

impl TableRow for MedicalRecord {
    const COLUMNS: &'static [&'static str] =
        &["Date", "Diagnosis", "Complaint", "BP", "Temp", "Provider", "Medicine"];

    fn cells(&self) -> Vec<String> {
        vec![
            or_dash(self.date_of_consultation.as_deref()),
            or_dash(self.diagnosis.as_deref()),
            or_dash(self.chief_complaint.as_deref()),
            or_dash(self.blood_pressure.as_deref()),
            self.temperature.map(|t| format!("{t:.1}")).unwrap_or_else(|| "-".into()),
            or_dash(self.health_provider.as_deref()),
            or_dash(self.prescribed_medicine.as_deref()),
        ]
    }
}

impl TableRow for AuditLog {
    const COLUMNS: &'static [&'static str] = &["Time", "User", "Action", "Entity", "Result", "IP"];

    fn cells(&self) -> Vec<String> {
        let entity = match (&self.entity_type, &self.entity_id) {
            (Some(kind), Some(id)) => format!("{kind} #{id}"),
            (Some(kind), None) => kind.clone(),
            _ => "-".into(),
        };
        vec![
            self.created_at.clone(),
            or_dash(self.username.as_deref()),
            self.action.clone(),
            entity,
            self.result.as_str().to_string(),
            or_dash(self.ip_address.as_deref()),
        ]
    }
}

impl TableRow for ActivityLog {
    const COLUMNS: &'static [&'static str] = &["Time", "User", "Role", "Activity", "Description"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.created_at.clone(),
            or_dash(self.username.as_deref()),
            or_dash(self.user_type.as_deref()),
            self.activity_type.clone(),
            or_dash(self.description.as_deref()),
        ]
    }
}

impl TableRow for Disease {
    const COLUMNS: &'static [&'static str] = &["ID", "Name", "Symptoms", "Incubation", "Contagious"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.name.clone(),
            self.symptoms.clone(),
            or_dash(self.incubation_period.as_deref()),
            or_dash(self.contagious_period.as_deref()),
        ]
    }
}

impl TableRow for HeatmapPoint {
    const COLUMNS: &'static [&'static str] = &["Barangay", "Patients", "Sick", "Rate", "Risk"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.barangay.clone(),
            self.total_patients.to_string(),
            self.sick_patients.to_string(),
            format!("{:.1}%", self.sick_rate),
            RiskBand::of(self.sick_rate).label().to_string(),
        ]
    }
}

impl TableRow for RhuExportRecord {
    const COLUMNS: &'static [&'static str] =
        &["Barangay", "Disease", "ICD Code", "Age", "Gender", "Month-Year", "Cases"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.barangay.clone(),
            self.disease.clone(),
            self.icd_code.clone().unwrap_or_else(|| "N/A".into()),
            or_dash(self.age.as_deref()),
            or_dash(self.gender.as_deref()),
            self.month_year.clone(),
            self.case_count.to_string(),
        ]
    }
}

impl TableRow for ForecastRecord {
    const COLUMNS: &'static [&'static str] = &["ID", "Disease", "Type", "Period", "Generated"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.disease.clone(),
            or_dash(self.forecast_type.as_deref()),
            self.forecast_period.map(|p| p.to_string()).unwrap_or_else(|| "-".into()),
            or_dash(self.generated_at.as_deref()),
        ]
    }
}

impl TableRow for User {
    const COLUMNS: &'static [&'static str] = &["ID", "Username", "Role", "Status", "Created"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.username.clone(),
            or_dash(self.role.as_deref()),
            if self.is_active() { "active" } else { "inactive" }.to_string(),
            or_dash(self.created_at.as_deref()),
        ]
    }
}

impl TableRow for BackupFile {
    const COLUMNS: &'static [&'static str] = &["File", "Size", "Created"];

    fn cells(&self) -> Vec<String> {
        vec![self.filename.clone(), self.display_size(), or_dash(self.created.as_deref())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: i64, name: &str, status: &str) -> User {
        User {
            id,
            username: name.into(),
            role: Some("staff".into()),
            status: Some(status.into()),
            email: None,
            created_at: None,
        }
    }

    #[test]
    fn columns_line_up() {
        let table = render_table(&[user(1, "admin", "active"), user(12, "nurse.joy", "inactive")]);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("ID  Username   Role   Status"));
        assert!(lines[1].starts_with("--  ---------  -----  --------"));
        assert!(lines[3].starts_with("12  nurse.joy  staff  inactive  -"));
    }

    #[test]
    fn long_cells_are_clipped() {
        assert_eq!(clip(&"x".repeat(60)).chars().count(), MAX_CELL);
    }

    #[test]
    fn footer_reads_like_the_pager() {
        let pagination = Pagination { current_page: 3, total_pages: 3, total_records: 53, items_per_page: 25 };
        assert_eq!(render_pagination(&pagination, 3), "Showing 51 to 53 of 53 results  (page 3 of 3)");
        assert_eq!(render_pagination(&Pagination::empty(25), 0), "No records found");
    }
}
