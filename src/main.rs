//! PRMS terminal client
//!
//! Command-line front end for the Rural Health Unit Patient Record
//! Management System.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use chrono::{Local, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};

use prms::app::{estimate_backup_time, BackupBackend, BackupContext, Poller, SessionMemory};
use prms::config::{self, Settings};
use prms::export::{self, CsvRecord, Quoting};
use prms::hotspot::{self, HotspotFilter, RiskBand};
use prms::pipeline::source;
use prms::pipeline::{
    Control, DateRange, ListQuery, ListSource, ListView, Refinable, SortOrder, SortSpec,
};
use prms::ui::{render_table, ListPage, Message, Notice, TableRow};
use prms::utils::init_logging;
use prms::{ApiClient, RecordService};

#[derive(Parser)]
#[command(name = "prms", about = "Rural Health Unit patient record management client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Overrides `api.base_url`.
    #[arg(long, global = true)]
    base_url: Option<String>,
    /// Log as JSON lines.
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Patient list (server-side paging).
    Patients(ListArgs),
    /// Consultation history of one patient.
    Records { patient_id: i64 },
    AuditLogs(ListArgs),
    ActivityLogs(ListArgs),
    Diseases(ListArgs),
    /// Barangay disease hotspots.
    Tracker {
        #[arg(long)]
        search: Option<String>,
        /// very-high, high, medium-high, medium, low or very-low.
        #[arg(long)]
        risk: Option<RiskBand>,
        /// patients, sick-rate or name.
        #[arg(long, default_value = "patients")]
        sort: String,
        #[arg(long)]
        asc: bool,
    },
    /// RHU-IS case report.
    Reports {
        #[arg(long)]
        disease: Option<String>,
        #[arg(long)]
        barangay: Option<String>,
        #[arg(long, default_value_t = 30)]
        days: u32,
        #[command(flatten)]
        list: ListArgs,
    },
    Forecasts {
        #[command(subcommand)]
        action: ForecastAction,
    },
    /// Dashboard counters, refreshed until interrupted.
    Dashboard {
        /// Print once and exit.
        #[arg(long)]
        once: bool,
    },
    Backups {
        #[command(subcommand)]
        action: BackupCommand,
    },
    Users {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Remembered login name.
    Session {
        #[command(subcommand)]
        action: SessionAction,
    },
}

#[derive(Args, Clone, Default)]
struct ExportArgs {
    /// Write the rows shown to a CSV file in the export directory.
    #[arg(long)]
    export: bool,
    /// Double embedded quotes (RFC 4180) instead of writing them as-is.
    #[arg(long)]
    escaped: bool,
}

impl ExportArgs {
    fn quoting(&self) -> Quoting {
        if self.escaped {
            Quoting::Escaped
        } else {
            Quoting::Naive
        }
    }
}

#[derive(Args, Clone, Default)]
struct ListArgs {
    #[arg(long)]
    search: Option<String>,
    /// `name=value`; repeatable.
    #[arg(long = "filter", value_parser = parse_filter)]
    filters: Vec<(String, String)>,
    #[arg(long)]
    sort: Option<String>,
    #[arg(long)]
    desc: bool,
    #[arg(long, default_value_t = 1)]
    page: u32,
    #[arg(long)]
    page_size: Option<u32>,
    #[arg(long)]
    from: Option<NaiveDate>,
    #[arg(long)]
    to: Option<NaiveDate>,
    #[command(flatten)]
    output: ExportArgs,
}

fn parse_filter(raw: &str) -> std::result::Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .ok_or_else(|| format!("expected name=value, got {raw:?}"))
}

#[derive(Subcommand)]
enum ForecastAction {
    /// Saved forecasts.
    List,
    Arima {
        #[arg(long)]
        disease: Option<String>,
        #[arg(long, default_value_t = 3)]
        months: u32,
        #[command(flatten)]
        output: ExportArgs,
    },
    Seir {
        disease: String,
        #[arg(long, default_value_t = 30)]
        days: u32,
        #[arg(long)]
        population: Option<u32>,
    },
    Delete { id: i64 },
}

#[derive(Subcommand)]
enum BackupCommand {
    List,
    Create,
    Restore { file: String },
    Delete { file: String },
    Download {
        file: String,
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum UserAction {
    List,
    Toggle { id: i64 },
    Delete { id: i64 },
}

#[derive(Subcommand)]
enum SessionAction {
    Show,
    Remember { username: String },
    Forget,
}

fn initial_query(args: &ListArgs, settings: &Settings) -> ListQuery {
    let mut query = ListQuery::new().with_page_size(args.page_size.unwrap_or(settings.list.default_page_size));
    if let Some(key) = &args.sort {
        let order = if args.desc { SortOrder::Desc } else { SortOrder::Asc };
        query = query.with_sort(key.clone(), order);
    }
    for (name, value) in &args.filters {
        query = query.with_filter(name.clone(), value.clone());
    }
    if let Some(term) = &args.search {
        query = query.with_search(term.clone());
    }
    query.with_date_range(DateRange { from: args.from, to: args.to })
}

/// Loads a list with the command-line controls applied, moves to the
/// requested page, prints it and returns the rows shown.
async fn show_list<T, S>(title: &'static str, source: S, query: ListQuery, page_number: u32) -> Vec<T>
where
    T: TableRow + Refinable + Clone + Send + Sync + 'static,
    S: ListSource<T> + 'static,
{
    let view = ListView::new(title, Arc::new(source), query);
    let mut page = ListPage::new(title, Arc::new(view));
    page.open().await;
    // `Control::Page` clamps against the total of the first load.
    if page_number > 1 {
        page.update(Message::Control(Control::Page(page_number))).await;
    }
    println!("{}", page.render());
    page.rows().to_vec()
}

async fn export_rows<T: CsvRecord>(rows: &[T], prefix: &str, output: &ExportArgs, settings: &Settings) -> Result<()> {
    if !output.export {
        return Ok(());
    }
    let filename = export::export_filename(prefix, today());
    let path = export::write_export(&settings.export.directory, &filename, &export::to_csv(rows, output.quoting()))
        .await
        .context("writing export")?;
    println!("{}", Notice::success(format!("Exported {} rows to {}", rows.len(), path.display())));
    Ok(())
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

async fn run_tracker(
    service: &RecordService,
    search: Option<String>,
    risk: Option<RiskBand>,
    sort: String,
    asc: bool,
) -> Result<()> {
    let (points, reported) = service.heatmap().await?;
    let filter = HotspotFilter {
        search: search.unwrap_or_default(),
        band: risk,
        sort: SortSpec::new(sort, if asc { SortOrder::Asc } else { SortOrder::Desc }),
    };
    let shown = filter.apply(&points);
    let summary = hotspot::summarize(&shown);
    info!(
        shown = shown.len(),
        reported = reported.total_barangays,
        "hotspots loaded"
    );
    println!("{}", prms::ui::page::render_hotspots(&summary, &hotspot::render_markers(&shown)));
    println!("{}", render_table(&shown));
    Ok(())
}

async fn run_forecasts(service: &RecordService, action: ForecastAction, settings: &Settings) -> Result<()> {
    match action {
        ForecastAction::List => println!("{}", render_table(&service.forecasts().await?)),
        ForecastAction::Arima { disease, months, output } => {
            let forecast = service.arima_forecast(disease.as_deref(), months).await?;
            for result in &forecast.forecast_results {
                match &result.error {
                    Some(error) => println!("{:<20} {}", result.disease_name, error),
                    None => println!(
                        "{:<20} {}  {} cases",
                        result.disease_name,
                        result.forecast_month,
                        result.rounded_cases()
                    ),
                }
            }
            if output.export {
                let filename = export::export_filename("arima_forecast", today());
                let csv = export::arima_csv(&forecast.forecast_results, Utc::now(), output.quoting());
                let path = export::write_export(&settings.export.directory, &filename, &csv).await?;
                println!("{}", Notice::success(format!("Exported to {}", path.display())));
            }
        }
        ForecastAction::Seir { disease, days, population } => {
            let run = service.seir_forecast(&disease, days, population).await?;
            let forecast = &run.forecast;
            println!(
                "{} over {} days, population {}, risk {}",
                forecast.disease,
                forecast.forecast_period,
                forecast.population,
                forecast.risk_level().unwrap_or("unknown")
            );
            if let Some(peak) = forecast.indicator("peak_day") {
                println!("Peak expected around day {peak:.0}");
            }
            for recommendation in forecast.interpretation_or_default().recommendations {
                println!("  - {recommendation}");
            }
            match run.saved_id {
                Some(id) => println!("{}", Notice::success(format!(
                    "Forecast for {disease} ({days} days) has been successfully generated! Saved as #{id}"
                ))),
                None => println!("{}", Notice::info("Forecast generated but not saved")),
            }
        }
        ForecastAction::Delete { id } => {
            let ack = service.delete_forecast(id).await?;
            println!("{}", Notice::success(ack.message.unwrap_or_else(|| "Forecast deleted".into())));
        }
    }
    Ok(())
}

async fn run_backups(service: RecordService, action: BackupCommand) -> Result<()> {
    let backend: Arc<dyn BackupBackend> = Arc::new(service.clone());
    let context = BackupContext::mount(backend);
    match action {
        BackupCommand::List => {
            context.load().await;
            let state = context.current();
            println!("{}", render_table(&state.files));
            if let Some(size) = state.database_size {
                println!("\nDatabase size {size:.1} MB, estimated backup time {}", estimate_backup_time(Some(size)));
            }
        }
        BackupCommand::Create => {
            let mut progress = context.subscribe();
            let reporter = tokio::spawn(async move {
                while progress.changed().await.is_ok() {
                    let state = progress.borrow_and_update().clone();
                    if let (true, Some(action)) = (state.running, state.action) {
                        eprintln!(
                            "{} {:>3.0}%  (estimated {})",
                            action.status_text(),
                            state.progress,
                            state.estimated_time.as_deref().unwrap_or("...")
                        );
                    }
                }
            });
            let backup = context.start_backup();
            tokio::pin!(backup);
            let finished = tokio::select! {
                notice = &mut backup => Some(notice),
                _ = tokio::signal::ctrl_c() => None,
            };
            let notice = match finished {
                Some(notice) => notice,
                None => {
                    context.cancel();
                    backup.await
                }
            };
            reporter.abort();
            println!("{notice}");
        }
        BackupCommand::Restore { file } => println!("{}", context.restore(&file).await),
        BackupCommand::Delete { file } => println!("{}", context.delete(&file).await),
        BackupCommand::Download { file, out } => {
            let bytes = service.download_backup(&file).await?;
            let path = out.unwrap_or_else(|| PathBuf::from(&file));
            tokio::fs::write(&path, &bytes).await?;
            println!("{}", Notice::success(format!("Saved {} bytes to {}", bytes.len(), path.display())));
        }
    }
    context.teardown();
    Ok(())
}

async fn run_users(service: &RecordService, action: UserAction) -> Result<()> {
    match action {
        UserAction::List => println!("{}", render_table(&service.users().await?)),
        UserAction::Toggle { id } => {
            let users = service.users().await?;
            let user = users
                .iter()
                .find(|u| u.id == id)
                .ok_or_else(|| anyhow!("no user with id {id}"))?;
            let notice = match service.toggle_user_status(user).await {
                Ok(ack) => Notice::success(ack.message.unwrap_or_default()),
                Err(e) => Notice::from_error(&e, "Failed to update user status"),
            };
            println!("{notice}");
        }
        UserAction::Delete { id } => {
            let notice = match service.delete_user(id).await {
                Ok(ack) => Notice::success(ack.message.unwrap_or_else(|| "User deleted".into())),
                Err(e) => Notice::from_error(&e, "Failed to delete user"),
            };
            println!("{notice}");
        }
    }
    Ok(())
}

async fn run_dashboard(service: RecordService, settings: &Settings, once: bool) -> Result<()> {
    if once {
        println!("{}", prms::ui::page::render_dashboard(&service.dashboard().await?));
        return Ok(());
    }
    let period = Duration::from_secs(settings.dashboard.poll_interval_secs);
    let _poller = Poller::spawn(period, move || {
        let service = service.clone();
        async move {
            match service.dashboard().await {
                Ok(data) => println!("{}", prms::ui::page::render_dashboard(&data)),
                Err(e) => println!("{}", Notice::error(e.user_message())),
            }
        }
    });
    tokio::signal::ctrl_c().await.context("waiting for interrupt")?;
    info!("dashboard closed");
    Ok(())
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let mut settings = config::load_config().context("loading configuration")?;
    if let Some(base_url) = cli.base_url {
        settings.api.base_url = base_url;
    }
    settings.logging.json |= cli.json_logs;
    init_logging(&settings.logging);

    let client = ApiClient::new(&settings.api)?;
    let service = RecordService::new(client.clone());

    match cli.command {
        Commands::Patients(args) => {
            let query = initial_query(&args, &settings);
            let rows = show_list("Patients", source::patients(client), query, args.page).await;
            export_rows(&rows, "patients", &args.output, &settings).await?;
        }
        Commands::Records { patient_id } => {
            let records = service.medical_records(patient_id).await?;
            if records.is_empty() {
                println!("No records found");
            } else {
                println!("{}", render_table(&records));
            }
        }
        Commands::AuditLogs(args) => {
            let query = initial_query(&args, &settings);
            let rows = show_list("Audit Logs", source::audit_logs(client), query, args.page).await;
            export_rows(&rows, "audit_logs", &args.output, &settings).await?;
        }
        Commands::ActivityLogs(args) => {
            let query = initial_query(&args, &settings);
            show_list("Activity Logs", source::activity_logs(client), query, args.page).await;
        }
        Commands::Diseases(args) => {
            let query = initial_query(&args, &settings);
            show_list("Diseases", source::diseases(client), query, args.page).await;
        }
        Commands::Tracker { search, risk, sort, asc } => {
            run_tracker(&service, search, risk, sort, asc).await?;
        }
        Commands::Reports { disease, barangay, days, list } => {
            let query = initial_query(&list, &settings)
                .with_filter("days", days.to_string())
                .with_filter("disease", disease.clone().unwrap_or_default())
                .with_filter("barangay", barangay.unwrap_or_default());
            let rows = show_list("Reports", source::rhu_reports(client), query, list.page).await;
            let output = list.output;
            if output.export {
                let filename = export::rhu_export_filename(disease.as_deref(), days, today());
                let csv = export::to_csv(&rows, output.quoting());
                let path = export::write_export(&settings.export.directory, &filename, &csv).await?;
                println!("{}", Notice::success(format!("Exported to {}", path.display())));
            }
        }
        Commands::Forecasts { action } => run_forecasts(&service, action, &settings).await?,
        Commands::Dashboard { once } => run_dashboard(service, &settings, once).await?,
        Commands::Backups { action } => run_backups(service, action).await?,
        Commands::Users { action } => run_users(&service, action).await?,
        Commands::Session { action } => {
            let memory = SessionMemory::new(&settings.session.file);
            match action {
                SessionAction::Show => match memory.load().await {
                    Some(name) => println!("{name}"),
                    None => println!("No remembered user"),
                },
                SessionAction::Remember { username } => memory.remember(&username).await?,
                SessionAction::Forget => {
                    if let Err(e) = memory.forget().await {
                        warn!(error = %e, "could not forget session");
                    }
                }
            }
        }
    }
    Ok(())
}
