//! PRMS client library
//!
//! Typed access to the Rural Health Unit Patient Record Management System
//! backend: the list-view pipeline every page is built on, CSV export, map
//! hotspot styling, and the record, forecast and backup services.

pub mod api;
pub mod app;
pub mod error;
pub mod export;
pub mod hotspot;
pub mod models;
pub mod pipeline;
pub mod records;
pub mod ui;
pub mod utils;

pub use api::ApiClient;
pub use error::{PrmsError, Result};
pub use records::RecordService;

/// Application configuration
pub mod config {
    use std::path::PathBuf;

    use serde::Deserialize;

    use crate::pipeline::DEFAULT_PAGE_SIZE;

    pub const DEFAULT_BASE_URL: &str = "http://localhost/prms/prms-backend";

    #[derive(Debug, Clone, Deserialize)]
    pub struct Settings {
        pub api: ApiConfig,
        pub list: ListConfig,
        pub dashboard: DashboardConfig,
        pub logging: LoggingConfig,
        pub export: ExportConfig,
        pub session: SessionConfig,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ApiConfig {
        pub base_url: String,
        /// Unset means the HTTP client's own default.
        #[serde(default)]
        pub timeout_secs: Option<u64>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ListConfig {
        pub default_page_size: u32,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct DashboardConfig {
        pub poll_interval_secs: u64,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct LoggingConfig {
        pub filter: String,
        pub json: bool,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ExportConfig {
        pub directory: PathBuf,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct SessionConfig {
        pub file: PathBuf,
    }

    /// Load configuration: built-in defaults, `config/default`, then
    /// `config/{PRMS_ENV}`, then `PRMS_*` environment variables
    /// (`PRMS_API__BASE_URL` sets `api.base_url`).
    pub fn load_config() -> Result<Settings, config::ConfigError> {
        let env = std::env::var("PRMS_ENV").unwrap_or_else(|_| "development".into());
        load_from("config", &env)
    }

    pub fn load_from(dir: &str, env: &str) -> Result<Settings, config::ConfigError> {
        config::Config::builder()
            .set_default("api.base_url", DEFAULT_BASE_URL)?
            .set_default("list.default_page_size", DEFAULT_PAGE_SIZE as i64)?
            .set_default("dashboard.poll_interval_secs", 30_i64)?
            .set_default("logging.filter", "info")?
            .set_default("logging.json", false)?
            .set_default("export.directory", "exports")?
            .set_default("session.file", ".prms_session")?
            .add_source(config::File::with_name(&format!("{dir}/default")).required(false))
            .add_source(config::File::with_name(&format!("{dir}/{env}")).required(false))
            .add_source(config::Environment::with_prefix("PRMS").separator("__"))
            .build()?
            .try_deserialize()
    }

}
