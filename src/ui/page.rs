//! Message-driven list pages and the read-only panels around them.

use std::fmt::Write as _;
use std::sync::Arc;

use crate::hotspot::{HotspotSummary, Marker};
use crate::models::DashboardData;
use crate::pipeline::{Control, FetchState, ListView, Refinable, Refinement, Snapshot};

use super::notice::Notice;
use super::table::{render_pagination, render_table, TableRow};

#[derive(Debug, Clone)]
pub enum Message {
    Control(Control),
    Refine(Refinement),
    Notify(Notice),
    DismissNotice,
}

pub struct ListPage<T> {
    title: &'static str,
    view: Arc<ListView<T>>,
    snapshot: Option<Snapshot<T>>,
    notice: Option<Notice>,
}

impl<T> ListPage<T>
where
    T: TableRow + Refinable + Clone + Send + Sync + 'static,
{
    pub fn new(title: &'static str, view: Arc<ListView<T>>) -> Self {
        Self { title, view, snapshot: None, notice: None }
    }

    /// First load when the page is shown.
    pub async fn open(&mut self) {
        self.snapshot = Some(self.view.load().await);
    }

    pub async fn update(&mut self, message: Message) {
        match message {
            Message::Control(control) => {
                self.snapshot = Some(self.view.apply(control).await);
            }
            Message::Refine(refinement) => {
                self.snapshot = Some(self.view.refine(refinement).await);
            }
            Message::Notify(notice) => self.notice = Some(notice),
            Message::DismissNotice => self.notice = None,
        }
    }

    pub fn view(&self) -> &ListView<T> {
        &self.view
    }

    pub fn snapshot(&self) -> Option<&Snapshot<T>> {
        self.snapshot.as_ref()
    }

    pub fn rows(&self) -> &[T] {
        self.snapshot.as_ref().map(|s| s.rows.as_slice()).unwrap_or_default()
    }

    pub fn render(&self) -> String {
        let mut out = format!("{}\n{}\n", self.title, "=".repeat(self.title.len()));
        if let Some(notice) = &self.notice {
            let _ = writeln!(out, "{notice}");
        }
        match &self.snapshot {
            None => out.push_str("Loading...\n"),
            Some(snapshot) => match &snapshot.state {
                FetchState::Idle | FetchState::Loading => out.push_str("Loading...\n"),
                FetchState::Failed { message, .. } => {
                    let _ = writeln!(out, "{}", Notice::error(message.clone()));
                }
                FetchState::Loaded if snapshot.rows.is_empty() => out.push_str("No records found\n"),
                FetchState::Loaded => {
                    let _ = writeln!(out, "{}", render_table(&snapshot.rows));
                    let _ = writeln!(out, "\n{}", render_pagination(&snapshot.pagination, snapshot.rows.len()));
                }
            },
        }
        out
    }
}

pub fn render_dashboard(data: &DashboardData) -> String {
    let stats = &data.stats;
    let mut out = String::from("Dashboard\n=========\n");
    if let Some(timestamp) = &data.timestamp {
        let _ = writeln!(out, "Updated {timestamp}");
    }
    let _ = writeln!(out, "Total patients    {}", stats.total_patients);
    let _ = writeln!(out, "Diseases tracked  {}", stats.total_diseases);
    let _ = writeln!(out, "Active cases      {}", stats.active_cases);
    let _ = writeln!(out, "Healthy patients  {}", stats.healthy_patients);
    for alert in &data.alerts {
        let tag = if alert.kind == "danger" { "ALERT" } else { "WARN" };
        let _ = writeln!(out, "[{tag}] {}", alert.message);
    }
    out
}

pub fn render_hotspots(summary: &HotspotSummary, markers: &[Marker]) -> String {
    let mut out = String::from("Disease Hotspots\n================\n");
    let _ = writeln!(
        out,
        "{} barangays, {} high risk, {} of {} patients sick ({}%)",
        summary.areas, summary.high_risk, summary.total_sick, summary.total_patients, summary.overall_rate
    );
    for marker in markers {
        let _ = writeln!(
            out,
            "  {:<20} {:>6.1}%  {:<11} r={:.0} {}",
            marker.barangay,
            marker.sick_rate,
            marker.band.label(),
            marker.radius,
            marker.color
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Disease;
    use crate::pipeline::{ListQuery, StaticList};

    fn disease(id: i64, name: &str) -> Disease {
        Disease {
            id,
            name: name.into(),
            description: String::new(),
            symptoms: "fever".into(),
            incubation_period: None,
            contagious_period: None,
            icon: None,
            color: None,
        }
    }

    fn page(rows: Vec<Disease>) -> ListPage<Disease> {
        let view = ListView::new("diseases", Arc::new(StaticList::new(rows)), ListQuery::new());
        ListPage::new("Diseases", Arc::new(view))
    }

    #[tokio::test]
    async fn renders_table_and_footer() {
        let mut page = page(vec![disease(1, "Dengue"), disease(2, "Measles")]);
        assert!(page.render().contains("Loading..."));

        page.open().await;
        let text = page.render();
        assert!(text.starts_with("Diseases\n========\n"));
        assert!(text.contains("Dengue"));
        assert!(text.contains("Showing 1 to 2 of 2 results"));
    }

    #[tokio::test]
    async fn search_without_matches_says_so() {
        let mut page = page(vec![disease(1, "Dengue")]);
        page.open().await;
        page.update(Message::Control(Control::Search("rabies".into()))).await;
        assert!(page.rows().is_empty());
        assert!(page.render().contains("No records found"));

        page.update(Message::Notify(Notice::success("Disease added"))).await;
        assert!(page.render().contains("[OK] Disease added"));
        page.update(Message::DismissNotice).await;
        assert!(!page.render().contains("Disease added"));
    }
}
