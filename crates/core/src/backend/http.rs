use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::{error, info};

use crate::errors::CoreError;
use crate::models::analysis::{AiAnalysis, AiAnalysisRequest};
use crate::models::api_info::ApiInfo;
use crate::models::dashboard::DashboardSnapshot;
use crate::models::data::{DataInfo, ResetResponse, UploadFile, UploadResponse};
use crate::models::prediction::{
    MonthPrediction, PredictionRecord, RangePrediction, RangePredictionRequest, YearPrediction,
};
use crate::models::settings::Settings;
use super::traits::PredictionBackend;

const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
const XLS_MIME: &str = "application/vnd.ms-excel";

/// REST client for the Balance AI prediction service.
///
/// - **Timeouts**: general requests, uploads and the health probe each have
///   their own limit (see `Settings`).
/// - **Errors**: 404 → `NotFound`, 5xx → `ServerError`, no response at all →
///   `NetworkUnreachable`, elapsed timer → `Timeout`.
/// - **Logging**: one `info` line per request and per response, one `error`
///   line per failure.
pub struct HttpBackend {
    client: Client,
    settings: Settings,
}

impl HttpBackend {
    pub fn new(settings: &Settings) -> Result<Self, CoreError> {
        settings.validate()?;
        let client = Client::builder()
            .timeout(settings.request_timeout())
            .build()
            .map_err(|e| CoreError::Config(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            settings: settings.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        self.settings.api_root()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.settings.api_root())
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, CoreError> {
        let request = self.client.get(self.url(path));
        self.execute("GET", path, request).await
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl serde::Serialize,
    ) -> Result<T, CoreError> {
        let request = self.client.post(self.url(path)).json(body);
        self.execute("POST", path, request).await
    }

    /// Send one request, log it, classify failures and decode the JSON body.
    async fn execute<T: DeserializeOwned>(
        &self,
        method: &str,
        path: &str,
        request: RequestBuilder,
    ) -> Result<T, CoreError> {
        info!("API request: {method} {path}");

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                let err = CoreError::from(e);
                error!("API request failed: {method} {path}: {err}");
                return Err(err);
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = CoreError::from_status(status.as_u16(), &body);
            error!("API response error: {} {path}: {body}", status.as_u16());
            return Err(err);
        }

        info!("API response: {} {path}", status.as_u16());

        let body = response.text().await.map_err(|e| {
            let err = CoreError::from(e);
            error!("Failed to read response body for {path}: {err}");
            err
        })?;

        serde_json::from_str(&body).map_err(|e| {
            error!("Failed to decode response for {path}: {e}");
            CoreError::Deserialization(format!("{path}: {e}"))
        })
    }
}

#[async_trait]
impl PredictionBackend for HttpBackend {
    fn name(&self) -> &str {
        "Balance AI API"
    }

    async fn list_predictions(&self) -> Result<Vec<PredictionRecord>, CoreError> {
        self.get_json("/predict/2025").await
    }

    async fn month_prediction(&self, year: i32, month: u32) -> Result<MonthPrediction, CoreError> {
        self.get_json(&format!("/predict/month/{year}/{month}")).await
    }

    async fn year_prediction(&self, year: i32) -> Result<YearPrediction, CoreError> {
        self.get_json(&format!("/predict/year/{year}")).await
    }

    async fn range_prediction(
        &self,
        request: &RangePredictionRequest,
    ) -> Result<RangePrediction, CoreError> {
        self.post_json("/predict/range", request).await
    }

    async fn ai_analysis(&self, market_context: Option<&str>) -> Result<AiAnalysis, CoreError> {
        let body = AiAnalysisRequest {
            market_context: market_context.map(str::to_string),
        };
        self.post_json("/analyze/ai", &body).await
    }

    async fn dashboard(&self) -> Result<DashboardSnapshot, CoreError> {
        self.get_json("/dashboard").await
    }

    async fn api_info(&self) -> Result<ApiInfo, CoreError> {
        self.get_json("/api/info").await
    }

    async fn health_check(&self) -> bool {
        let request = self
            .client
            .get(self.url("/health"))
            .timeout(self.settings.health_timeout());

        match request.send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                info!("Health check failed: {}", CoreError::from(e));
                false
            }
        }
    }

    async fn upload_file(
        &self,
        file: &UploadFile,
        sheet_name: Option<&str>,
    ) -> Result<UploadResponse, CoreError> {
        let mime = match file.extension().as_deref() {
            Some("xlsx") => XLSX_MIME,
            Some("xls") => XLS_MIME,
            _ => "application/octet-stream",
        };
        let part = Part::bytes(file.bytes.clone())
            .file_name(file.file_name.clone())
            .mime_str(mime)
            .map_err(|e| CoreError::Unclassified(format!("Invalid upload content type: {e}")))?;

        let mut form = Form::new().part("file", part);
        if let Some(sheet) = sheet_name.filter(|s| !s.trim().is_empty()) {
            form = form.text("sheet_name", sheet.to_string());
        }

        info!(
            "Uploading {} ({} bytes, sheet: {})",
            file.file_name,
            file.size(),
            sheet_name.unwrap_or("<first>")
        );

        let request = self
            .client
            .post(self.url("/data/upload"))
            .multipart(form)
            .timeout(self.settings.upload_timeout());
        self.execute("POST", "/data/upload", request).await
    }

    async fn data_info(&self) -> Result<DataInfo, CoreError> {
        self.get_json("/data/info").await
    }

    async fn reset_data(&self) -> Result<ResetResponse, CoreError> {
        let request = self.client.post(self.url("/data/reset"));
        self.execute("POST", "/data/reset", request).await
    }
}
