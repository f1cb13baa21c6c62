use async_trait::async_trait;

use crate::errors::CoreError;
use crate::models::analysis::AiAnalysis;
use crate::models::api_info::ApiInfo;
use crate::models::dashboard::DashboardSnapshot;
use crate::models::data::{DataInfo, ResetResponse, UploadFile, UploadResponse};
use crate::models::prediction::{
    MonthPrediction, PredictionRecord, RangePrediction, RangePredictionRequest, YearPrediction,
};

/// Everything the dashboard needs from the prediction service.
///
/// Stores hold an `Arc<dyn PredictionBackend>` and never know whether they
/// talk to the real HTTP service or to an in-memory double. Each method
/// performs exactly one request.
#[async_trait]
pub trait PredictionBackend: Send + Sync {
    /// Human-readable name of this backend (for logs/errors).
    fn name(&self) -> &str;

    /// Full-year prediction series (`GET /predict/2025`).
    async fn list_predictions(&self) -> Result<Vec<PredictionRecord>, CoreError>;

    async fn month_prediction(&self, year: i32, month: u32) -> Result<MonthPrediction, CoreError>;

    async fn year_prediction(&self, year: i32) -> Result<YearPrediction, CoreError>;

    async fn range_prediction(
        &self,
        request: &RangePredictionRequest,
    ) -> Result<RangePrediction, CoreError>;

    /// AI-generated analysis, optionally steered by free-text market context.
    async fn ai_analysis(&self, market_context: Option<&str>) -> Result<AiAnalysis, CoreError>;

    async fn dashboard(&self) -> Result<DashboardSnapshot, CoreError>;

    async fn api_info(&self) -> Result<ApiInfo, CoreError>;

    /// Liveness probe. Never fails: any problem reads as `false`.
    async fn health_check(&self) -> bool;

    /// Multipart upload of a spreadsheet, optionally restricted to one sheet.
    async fn upload_file(
        &self,
        file: &UploadFile,
        sheet_name: Option<&str>,
    ) -> Result<UploadResponse, CoreError>;

    async fn data_info(&self) -> Result<DataInfo, CoreError>;

    async fn reset_data(&self) -> Result<ResetResponse, CoreError>;
}
