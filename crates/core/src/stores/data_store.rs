use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{error, info, warn};

use crate::backend::traits::PredictionBackend;
use crate::errors::CoreError;
use crate::models::data::{
    DataInfo, DataSourceFile, DataSourceSummary, DataStatistics, ResetResponse, UploadFile,
    UploadResponse,
};
use super::operation::{read, track, write, HasOperations, OperationGuard, OperationState};

pub const KEY_UPLOAD: &str = "upload";
pub const KEY_DATA_INFO: &str = "dataInfo";
pub const KEY_RESET: &str = "reset";

/// Spreadsheet formats the backend can ingest.
pub const ALLOWED_EXTENSIONS: [&str; 2] = ["xlsx", "xls"];

/// Upload size ceiling (16 MiB).
pub const MAX_FILE_SIZE: u64 = 16 * 1024 * 1024;

/// Simulated progress advances this often while an upload is in flight.
pub const PROGRESS_TICK: Duration = Duration::from_millis(200);

const PROGRESS_STEP: u8 = 10;
const PROGRESS_CEILING: u8 = 90;

#[derive(Debug, Default)]
struct DataState {
    info: Option<DataInfo>,
    /// 0–100; only meaningful while an upload runs
    upload_progress: u8,
    ops: OperationState,
}

impl HasOperations for DataState {
    fn ops(&self) -> &OperationState {
        &self.ops
    }

    fn ops_mut(&mut self) -> &mut OperationState {
        &mut self.ops
    }
}

/// One upload in flight. Owns the progress ticker; dropping it stops the
/// ticker, zeroes the progress and clears the `upload` flag, whether the
/// upload finished or its future was cancelled.
struct UploadRun<'a> {
    state: &'a RwLock<DataState>,
    ticker: Option<JoinHandle<()>>,
}

impl<'a> UploadRun<'a> {
    fn begin(state: &'a RwLock<DataState>) -> Self {
        {
            let mut s = write(state);
            s.ops.begin(KEY_UPLOAD);
            s.upload_progress = 0;
        }
        Self { state, ticker: None }
    }

    fn stop_ticker(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }
}

impl Drop for UploadRun<'_> {
    fn drop(&mut self) {
        self.stop_ticker();
        let mut s = write(self.state);
        s.upload_progress = 0;
        s.ops.finish(KEY_UPLOAD);
    }
}

/// Upload, inspect and reset the data the backend predicts from.
///
/// The transport reports no real upload progress, so progress is simulated:
/// +10 every 200 ms up to 90, 100 once the upload returns, back to 0 when
/// the whole operation (including the info refresh) is over.
pub struct DataStore {
    backend: Arc<dyn PredictionBackend>,
    state: Arc<RwLock<DataState>>,
}

impl DataStore {
    pub fn new(backend: Arc<dyn PredictionBackend>) -> Self {
        Self {
            backend,
            state: Arc::new(RwLock::new(DataState::default())),
        }
    }

    /// Human-readable reason `file` cannot be uploaded, or `None` if it can.
    pub fn validate_file(file: &UploadFile) -> Option<String> {
        let allowed = file
            .extension()
            .is_some_and(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()));
        if !allowed {
            return Some(format!(
                "Tipo de archivo no permitido. Use: {}",
                ALLOWED_EXTENSIONS.join(", ")
            ));
        }

        if file.size() > MAX_FILE_SIZE {
            return Some(format!(
                "Archivo demasiado grande. Máximo: {}MB",
                MAX_FILE_SIZE / (1024 * 1024)
            ));
        }

        None
    }

    // ── Actions ─────────────────────────────────────────────────────

    /// Validate, upload, then refresh the data info.
    ///
    /// Validation failures are recorded under `upload` and returned without
    /// contacting the backend.
    pub async fn upload_file(
        &self,
        file: &UploadFile,
        sheet_name: Option<&str>,
    ) -> Result<UploadResponse, CoreError> {
        if let Some(message) = Self::validate_file(file) {
            warn!("Rejected upload of {}: {message}", file.file_name);
            write(&self.state).ops.fail(KEY_UPLOAD, message.clone());
            return Err(CoreError::Validation(message));
        }

        let mut run = UploadRun::begin(&self.state);
        run.ticker = self.spawn_progress_ticker();
        let uploaded = self.backend.upload_file(file, sheet_name).await;
        run.stop_ticker();

        let outcome = match uploaded {
            Ok(response) => {
                write(&self.state).upload_progress = 100;
                info!("Upload successful: {}", file.file_name);
                self.load_data_info().await.map(|_| response)
            }
            Err(e) => Err(e),
        };

        if let Err(e) = &outcome {
            error!("Upload of {} failed: {e}", file.file_name);
            write(&self.state).ops.fail(KEY_UPLOAD, e.to_string());
        }
        drop(run);
        outcome
    }

    pub async fn load_data_info(&self) -> Result<DataInfo, CoreError> {
        track(&*self.state, KEY_DATA_INFO, self.backend.data_info(), |s, data| {
            info!("Data info retrieved: {} records", data.current_data.total_records);
            s.info = Some(data.clone());
            data
        })
        .await
    }

    /// Clear ingested data on the backend, then refresh the data info.
    pub async fn reset_data(&self) -> Result<ResetResponse, CoreError> {
        let in_flight = OperationGuard::begin(&*self.state, KEY_RESET);

        let outcome = match self.backend.reset_data().await {
            Ok(response) => {
                info!("Data reset successful");
                self.load_data_info().await.map(|_| response)
            }
            Err(e) => Err(e),
        };

        if let Err(e) = &outcome {
            error!("Data reset failed: {e}");
            write(&self.state).ops.fail(KEY_RESET, e.to_string());
        }
        drop(in_flight);
        outcome
    }

    pub fn clear_error(&self, key: &str) {
        write(&self.state).ops.clear_error(key);
    }

    fn spawn_progress_ticker(&self) -> Option<JoinHandle<()>> {
        let runtime = tokio::runtime::Handle::try_current().ok()?;
        let state = Arc::clone(&self.state);
        Some(runtime.spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + PROGRESS_TICK, PROGRESS_TICK);
            loop {
                ticker.tick().await;
                {
                    let mut s = write(&state);
                    if s.upload_progress < PROGRESS_CEILING {
                        s.upload_progress += PROGRESS_STEP;
                    }
                }
            }
        }))
    }

    // ── State ───────────────────────────────────────────────────────

    pub fn is_loading(&self, key: &str) -> bool {
        read(&self.state).ops().is_loading(key)
    }

    pub fn error(&self, key: &str) -> Option<String> {
        read(&self.state).ops().error(key)
    }

    pub fn is_uploading(&self) -> bool {
        self.is_loading(KEY_UPLOAD)
    }

    pub fn is_resetting(&self) -> bool {
        self.is_loading(KEY_RESET)
    }

    pub fn is_loading_info(&self) -> bool {
        self.is_loading(KEY_DATA_INFO)
    }

    pub fn upload_progress(&self) -> u8 {
        read(&self.state).upload_progress
    }

    pub fn data_info(&self) -> Option<DataInfo> {
        read(&self.state).info.clone()
    }

    // ── Derived views ───────────────────────────────────────────────

    pub fn has_data_info(&self) -> bool {
        read(&self.state).info.is_some()
    }

    /// Any of upload, reset or info refresh in flight.
    pub fn is_busy(&self) -> bool {
        read(&self.state).ops().any_loading()
    }

    pub fn can_upload(&self) -> bool {
        !self.is_uploading()
    }

    pub fn data_source_summary(&self) -> Option<DataSourceSummary> {
        let s = read(&self.state);
        let info = s.info.as_ref()?;
        Some(DataSourceSummary {
            total_records: info.current_data.total_records,
            date_range: info.current_data.date_range.clone(),
            data_source: info.current_data.data_source.clone(),
            sources_count: info.data_sources.len(),
            is_combined: info.current_data.data_source == "combined",
        })
    }

    pub fn statistics(&self) -> Option<DataStatistics> {
        read(&self.state).info.as_ref()?.statistics.clone()
    }

    pub fn data_sources(&self) -> Vec<DataSourceFile> {
        read(&self.state)
            .info
            .as_ref()
            .map(|i| i.data_sources.clone())
            .unwrap_or_default()
    }
}
