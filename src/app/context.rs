//! Shared state that outlives a single page: backup progress and the
//! remembered login name.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;
use tokio::sync::{oneshot, watch};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::api::Ack;
use crate::error::Result;
use crate::models::{BackupFile, DatabaseSize};
use crate::ui::notice::Notice;

/// Progress is simulated; it parks here until the backend answers.
pub const PROGRESS_CEILING: f64 = 90.0;
const PROGRESS_TICK: Duration = Duration::from_secs(1);
const MAX_PROGRESS_STEP: f64 = 15.0;
const SECONDS_PER_MB: f64 = 3.0;

/// The backup endpoint as the context sees it.
#[async_trait]
pub trait BackupBackend: Send + Sync {
    async fn list_backups(&self) -> Result<Vec<BackupFile>>;
    async fn database_size(&self) -> Result<DatabaseSize>;
    async fn create_backup(&self) -> Result<Ack>;
    async fn restore_backup(&self, file: &str) -> Result<Ack>;
    async fn delete_backup(&self, file: &str) -> Result<Ack>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackupAction {
    Create,
    Restore,
    Delete,
}

impl BackupAction {
    pub fn status_text(&self) -> &'static str {
        match self {
            BackupAction::Create => "Creating backup...",
            BackupAction::Restore => "Restoring database...",
            BackupAction::Delete => "Deleting backup...",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BackupState {
    pub running: bool,
    /// Percent, `0..=90` while a backup is in flight.
    pub progress: f64,
    pub estimated_time: Option<String>,
    pub can_cancel: bool,
    pub action: Option<BackupAction>,
    pub started_at: Option<DateTime<Utc>>,
    /// Megabytes, when the backend could measure it.
    pub database_size: Option<f64>,
    pub files: Vec<BackupFile>,
}

impl BackupState {
    fn idle(files: Vec<BackupFile>) -> Self {
        Self { files, ..Self::default() }
    }
}

/// `"N seconds"` below a minute, whole minutes above, `"1-3 minutes"` when
/// the size is unknown.
pub fn estimate_backup_time(size_mb: Option<f64>) -> String {
    let size = match size_mb {
        Some(mb) if mb > 0.0 => mb,
        _ => return "1-3 minutes".to_string(),
    };
    let seconds = (size * SECONDS_PER_MB).ceil() as u64;
    if seconds < 60 {
        format!("{seconds} seconds")
    } else {
        let minutes = (seconds as f64 / 60.0).ceil() as u64;
        format!("{minutes} minute{}", if minutes > 1 { "s" } else { "" })
    }
}

/// Backup progress shared by every page that shows it.
///
/// Created with [`BackupContext::mount`] by whoever owns the session and
/// dropped (or [`teardown`](BackupContext::teardown)) when it ends. Pages
/// read it through [`subscribe`](BackupContext::subscribe).
pub struct BackupContext {
    backend: Arc<dyn BackupBackend>,
    state: watch::Sender<BackupState>,
    /// Present only while a create run can still be cancelled.
    cancel: Mutex<Option<oneshot::Sender<()>>>,
}

impl BackupContext {
    pub fn mount(backend: Arc<dyn BackupBackend>) -> Arc<Self> {
        let (state, _) = watch::channel(BackupState::default());
        debug!("backup context mounted");
        Arc::new(Self { backend, state, cancel: Mutex::new(None) })
    }

    pub fn subscribe(&self) -> watch::Receiver<BackupState> {
        self.state.subscribe()
    }

    pub fn current(&self) -> BackupState {
        self.state.borrow().clone()
    }

    /// First load of a backup page: file list and database size together.
    pub async fn load(&self) {
        let (files, size) = futures::join!(self.backend.list_backups(), self.backend.database_size());
        let size = match size {
            Ok(size) => size.megabytes(),
            Err(e) => {
                warn!(error = %e, "could not read database size");
                None
            }
        };
        self.state.send_modify(|s| {
            s.database_size = size;
            if let Ok(files) = files {
                s.files = files;
            }
        });
    }

    /// Reloads the file list. Failures leave the old list in place.
    pub async fn refresh_files(&self) {
        match self.backend.list_backups().await {
            Ok(files) => self.state.send_modify(|s| s.files = files),
            Err(e) => warn!(error = %e, "could not list backup files"),
        }
    }

    pub async fn start_backup(&self) -> Notice {
        if !self.claim(BackupAction::Create) {
            return Notice::info("A backup operation is already running");
        }
        let (cancel_tx, mut cancelled) = oneshot::channel();
        *self.cancel_slot() = Some(cancel_tx);

        let size = match self.backend.database_size().await {
            Ok(size) => size.megabytes(),
            Err(e) => {
                warn!(error = %e, "could not read database size");
                None
            }
        };
        let estimate = estimate_backup_time(size);
        info!(size_mb = ?size, estimate = %estimate, "backup started");
        self.state.send_modify(|s| {
            s.estimated_time = Some(estimate);
            s.database_size = size;
        });

        let request = self.backend.create_backup();
        tokio::pin!(request);
        let mut ticker = interval(PROGRESS_TICK);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;

        let outcome = loop {
            tokio::select! {
                result = &mut request => break Some(result),
                _ = &mut cancelled => break None,
                _ = ticker.tick() => self.advance_progress(),
            }
        };

        self.cancel_slot().take();
        if outcome.is_some() {
            self.state.send_modify(|s| {
                s.progress = 100.0;
                s.can_cancel = false;
            });
        }

        let notice = match outcome {
            None => {
                info!("backup cancelled");
                Notice::info("Backup cancelled")
            }
            Some(Ok(_)) => {
                self.refresh_files().await;
                info!("backup created");
                Notice::success("Backup created successfully")
            }
            Some(Err(e)) => {
                warn!(error = %e, "backup failed");
                Notice::from_error(&e, "Failed to create backup")
            }
        };
        self.reset();
        notice
    }

    /// Abandons an in-flight backup. The request is dropped client side;
    /// the server may still finish writing the dump.
    pub fn cancel(&self) {
        if let Some(cancel) = self.cancel_slot().take() {
            let _ = cancel.send(());
        }
    }

    pub async fn restore(&self, file: &str) -> Notice {
        self.run_exclusive(BackupAction::Restore, file).await
    }

    pub async fn delete(&self, file: &str) -> Notice {
        self.run_exclusive(BackupAction::Delete, file).await
    }

    pub fn teardown(self: Arc<Self>) {
        self.cancel();
        debug!("backup context torn down");
    }

    async fn run_exclusive(&self, action: BackupAction, file: &str) -> Notice {
        if !self.claim(action) {
            return Notice::info("A backup operation is already running");
        }

        let (result, ok, fallback) = match action {
            BackupAction::Restore => (
                self.backend.restore_backup(file).await,
                "Database restored successfully",
                "Failed to restore database",
            ),
            _ => (
                self.backend.delete_backup(file).await,
                "Backup file deleted successfully",
                "Failed to delete backup file",
            ),
        };

        let notice = match result {
            Ok(_) => {
                self.refresh_files().await;
                info!(?action, file, "backup operation finished");
                Notice::success(ok)
            }
            Err(e) => {
                warn!(?action, file, error = %e, "backup operation failed");
                Notice::from_error(&e, fallback)
            }
        };
        self.state.send_modify(|s| {
            s.running = false;
            s.action = None;
        });
        notice
    }

    /// Marks `action` as running unless another operation already is.
    fn claim(&self, action: BackupAction) -> bool {
        self.state.send_if_modified(|s| {
            if s.running {
                return false;
            }
            s.running = true;
            s.action = Some(action);
            s.can_cancel = action == BackupAction::Create;
            if action == BackupAction::Create {
                s.progress = 0.0;
                s.started_at = Some(Utc::now());
            }
            true
        })
    }

    fn cancel_slot(&self) -> MutexGuard<'_, Option<oneshot::Sender<()>>> {
        self.cancel.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn advance_progress(&self) {
        let step = rand::thread_rng().gen_range(0.0..MAX_PROGRESS_STEP);
        self.state.send_if_modified(|s| {
            if s.progress >= PROGRESS_CEILING {
                return false;
            }
            s.progress = (s.progress + step).min(PROGRESS_CEILING);
            true
        });
    }

    fn reset(&self) {
        self.state.send_modify(|s| {
            let files = std::mem::take(&mut s.files);
            *s = BackupState::idle(files);
        });
    }
}

/// Remembered login name ("remember me"), kept in a small file.
#[derive(Debug, Clone)]
pub struct SessionMemory {
    path: PathBuf,
}

impl SessionMemory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `None` when nothing is remembered or the file is unreadable.
    pub async fn load(&self) -> Option<String> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => Some(text.trim().to_string()).filter(|name| !name.is_empty()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "could not read session file");
                None
            }
        }
    }

    pub async fn remember(&self, username: &str) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.path, username.trim()).await?;
        Ok(())
    }

    pub async fn forget(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}
