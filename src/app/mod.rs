//! Application state that sits between the pipeline and the pages.

pub mod context;
pub mod forms;
pub mod polling;

pub use context::{estimate_backup_time, BackupBackend, BackupContext, BackupState, SessionMemory};
pub use polling::Poller;
