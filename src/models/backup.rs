use serde::{Deserialize, Serialize};

use super::lenient;

/// A database dump held by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupFile {
    pub filename: String,
    /// File size in bytes as the backend reports it.
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub size: Option<String>,
    #[serde(default)]
    pub created: Option<String>,
}

impl BackupFile {
    pub fn size_bytes(&self) -> Option<u64> {
        self.size.as_deref()?.trim().parse::<f64>().ok().map(|b| b as u64)
    }

    /// `"1.4 MB"`, `"512 KB"`, or `"-"` when unknown.
    pub fn display_size(&self) -> String {
        match self.size_bytes() {
            Some(bytes) => format_bytes(bytes),
            None => "-".to_string(),
        }
    }
}

pub fn format_bytes(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    let b = bytes as f64;
    if b >= KB * KB {
        format!("{:.1} MB", b / (KB * KB))
    } else if b >= KB {
        format!("{:.0} KB", b / KB)
    } else {
        format!("{bytes} B")
    }
}

/// Database size in bytes, as returned by `action=size`. Zero means the
/// backend could not measure it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DatabaseSize(#[serde(deserialize_with = "lenient::f64")] pub f64);

impl DatabaseSize {
    pub fn megabytes(&self) -> Option<f64> {
        (self.0 > 0.0).then(|| self.0 / (1024.0 * 1024.0))
    }
}
