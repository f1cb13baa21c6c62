use std::sync::{Arc, RwLock};

use tracing::info;

use crate::backend::traits::PredictionBackend;
use crate::errors::CoreError;
use crate::models::chart::ChartData;
use crate::models::prediction::{
    MonthPrediction, PredictionRecord, PredictionSummary, RangePrediction,
    RangePredictionRequest, YearPrediction,
};
use crate::services::chart_service;
use super::operation::{read, track, write, HasOperations, OperationState};

pub const KEY_PREDICTIONS_2025: &str = "predictions2025";
pub const KEY_MONTH_PREDICTION: &str = "monthPrediction";
pub const KEY_YEAR_PREDICTION: &str = "yearPrediction";
pub const KEY_RANGE_PREDICTION: &str = "rangePrediction";

#[derive(Debug, Default)]
struct PredictionsState {
    predictions_2025: Vec<PredictionRecord>,
    month: Option<MonthPrediction>,
    year: Option<YearPrediction>,
    range: Option<RangePrediction>,
    ops: OperationState,
}

impl HasOperations for PredictionsState {
    fn ops(&self) -> &OperationState {
        &self.ops
    }

    fn ops_mut(&mut self) -> &mut OperationState {
        &mut self.ops
    }
}

/// Mirrors the prediction endpoints: the 2025 series and the most recent
/// month, year and range lookups.
pub struct PredictionsStore {
    backend: Arc<dyn PredictionBackend>,
    state: RwLock<PredictionsState>,
}

impl PredictionsStore {
    pub fn new(backend: Arc<dyn PredictionBackend>) -> Self {
        Self {
            backend,
            state: RwLock::new(PredictionsState::default()),
        }
    }

    // ── Actions ─────────────────────────────────────────────────────

    pub async fn fetch_predictions_2025(&self) -> Result<(), CoreError> {
        track(
            &self.state,
            KEY_PREDICTIONS_2025,
            self.backend.list_predictions(),
            |s, data| {
                info!("Predictions 2025 loaded: {} records", data.len());
                s.predictions_2025 = data;
            },
        )
        .await
    }

    pub async fn fetch_month_prediction(&self, year: i32, month: u32) -> Result<(), CoreError> {
        if !(1..=12).contains(&month) {
            let err = CoreError::Validation(format!("Invalid month: {month}"));
            write(&self.state).ops.fail(KEY_MONTH_PREDICTION, err.to_string());
            return Err(err);
        }
        track(
            &self.state,
            KEY_MONTH_PREDICTION,
            self.backend.month_prediction(year, month),
            |s, data| {
                info!("Month prediction loaded: {year}/{month}");
                s.month = Some(data);
            },
        )
        .await
    }

    pub async fn fetch_year_prediction(&self, year: i32) -> Result<(), CoreError> {
        track(
            &self.state,
            KEY_YEAR_PREDICTION,
            self.backend.year_prediction(year),
            |s, data| {
                info!("Year prediction loaded: {year}");
                s.year = Some(data);
            },
        )
        .await
    }

    pub async fn fetch_range_prediction(
        &self,
        start_date: &str,
        end_date: &str,
        market_context: Option<&str>,
    ) -> Result<(), CoreError> {
        let request = RangePredictionRequest {
            start_date: start_date.to_string(),
            end_date: end_date.to_string(),
            market_context: market_context.map(str::to_string),
        };
        track(
            &self.state,
            KEY_RANGE_PREDICTION,
            self.backend.range_prediction(&request),
            |s, data| {
                info!("Range prediction loaded: {start_date} - {end_date}");
                s.range = Some(data);
            },
        )
        .await
    }

    pub fn reset_month_prediction(&self) {
        let mut s = write(&self.state);
        s.month = None;
        s.ops.clear_error(KEY_MONTH_PREDICTION);
    }

    pub fn reset_year_prediction(&self) {
        let mut s = write(&self.state);
        s.year = None;
        s.ops.clear_error(KEY_YEAR_PREDICTION);
    }

    pub fn reset_range_prediction(&self) {
        let mut s = write(&self.state);
        s.range = None;
        s.ops.clear_error(KEY_RANGE_PREDICTION);
    }

    pub fn clear_error(&self, key: &str) {
        write(&self.state).ops.clear_error(key);
    }

    // ── State ───────────────────────────────────────────────────────

    pub fn is_loading(&self, key: &str) -> bool {
        read(&self.state).ops().is_loading(key)
    }

    pub fn error(&self, key: &str) -> Option<String> {
        read(&self.state).ops().error(key)
    }

    pub fn predictions_2025(&self) -> Vec<PredictionRecord> {
        read(&self.state).predictions_2025.clone()
    }

    pub fn month_prediction(&self) -> Option<MonthPrediction> {
        read(&self.state).month.clone()
    }

    pub fn year_prediction(&self) -> Option<YearPrediction> {
        read(&self.state).year.clone()
    }

    pub fn range_prediction(&self) -> Option<RangePrediction> {
        read(&self.state).range.clone()
    }

    // ── Derived views ───────────────────────────────────────────────

    /// Totals over the 2025 series; `None` until it has been loaded.
    pub fn predictions_2025_summary(&self) -> Option<PredictionSummary> {
        let s = read(&self.state);
        if s.predictions_2025.is_empty() {
            return None;
        }
        let total_predicted: f64 = s.predictions_2025.iter().map(|p| p.predicted_balance).sum();
        Some(PredictionSummary {
            total_predicted,
            average_monthly: total_predicted / 12.0,
            data_points: s.predictions_2025.len(),
        })
    }

    pub fn predictions_2025_chart(&self) -> Option<ChartData> {
        let s = read(&self.state);
        if s.predictions_2025.is_empty() {
            return None;
        }
        Some(chart_service::prediction_chart_data(&s.predictions_2025, "Predicciones"))
    }

    pub fn year_breakdown_chart(&self) -> Option<ChartData> {
        read(&self.state)
            .year
            .as_ref()
            .map(chart_service::year_breakdown_chart_data)
    }

    pub fn range_chart(&self) -> Option<ChartData> {
        read(&self.state).range.as_ref().map(|r| {
            let label = format!("{} - {}", r.start_date, r.end_date);
            chart_service::prediction_chart_data(&r.predictions, &label)
        })
    }
}
