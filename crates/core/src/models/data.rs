use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::errors::CoreError;

/// A spreadsheet queued for upload: its name (for the extension check and
/// the multipart filename) and raw contents.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    /// Read a file from disk.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| CoreError::Validation(format!("Invalid file path: {}", path.display())))?
            .to_string();
        let bytes = tokio::fs::read(path).await?;
        Ok(Self { file_name, bytes })
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Lower-cased text after the last dot, if any.
    pub fn extension(&self) -> Option<String> {
        let (_, ext) = self.file_name.rsplit_once('.')?;
        if ext.is_empty() {
            None
        } else {
            Some(ext.to_lowercase())
        }
    }
}

// ── /data/info ──────────────────────────────────────────────────────

/// Summary of the data the backend is currently predicting from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataInfo {
    pub current_data: CurrentData,
    pub data_sources: Vec<DataSourceFile>,
    pub statistics: Option<DataStatistics>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurrentData {
    pub total_records: u64,
    pub date_range: Option<DateRange>,
    /// Label of the active source ("original", "uploaded", "combined", ...)
    pub data_source: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DateRange {
    pub start: String,
    pub end: String,
}

/// One file that contributed records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSourceFile {
    pub filename: String,
    pub records: u64,
    pub uploaded_at: Option<String>,
}

/// Statistics over monthly totals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataStatistics {
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
    pub std_dev: f64,
}

// ── /data/upload, /data/reset ───────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadResponse {
    pub message: String,
    pub filename: Option<String>,
    pub records_processed: u64,
    pub total_records: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResetResponse {
    pub message: String,
    pub total_records: u64,
}

// ── Derived views ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataSourceSummary {
    pub total_records: u64,
    pub date_range: Option<DateRange>,
    pub data_source: String,
    pub sources_count: usize,
    /// True when original and uploaded data are merged
    pub is_combined: bool,
}
