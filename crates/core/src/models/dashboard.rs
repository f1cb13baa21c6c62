use serde::{Deserialize, Serialize};

/// Aggregate snapshot returned by `GET /dashboard`.
///
/// Every section defaults when the backend omits it, so derived views never
/// have to guess at missing fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardSnapshot {
    pub historical_summary: HistoricalSummary,
    pub predictions_summary: PredictionsOverview,
    pub recent_trends: Vec<TrendPoint>,
    pub key_metrics: KeyMetrics,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoricalSummary {
    pub total_historical: f64,
    pub average_monthly: f64,
    pub last_update: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictionsOverview {
    pub total_predicted_2025: f64,
    pub average_monthly_2025: f64,
    pub growth_rate: f64,
}

/// One month of the recent-trend series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendPoint {
    pub month: String,
    pub historical: f64,
    pub predicted: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyMetrics {
    pub total_growth: f64,
    pub best_month: String,
    pub worst_month: String,
    pub volatility_index: f64,
}

// ── Derived views ───────────────────────────────────────────────────

/// Headline numbers shown at the top of the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardKeyMetrics {
    pub total_historical: f64,
    pub total_predicted: f64,
    pub growth_rate: f64,
    pub average_monthly_historical: f64,
    pub average_monthly_predicted: f64,
    pub total_growth: f64,
}

/// Recent trends split into parallel arrays, ready for a line chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendSeries {
    pub labels: Vec<String>,
    pub historical: Vec<f64>,
    pub predicted: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceIndicators {
    pub best_month: String,
    pub worst_month: String,
    pub volatility_index: f64,
    pub total_growth: f64,
}
