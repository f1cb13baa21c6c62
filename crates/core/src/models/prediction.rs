use serde::{Deserialize, Serialize};

/// Lower/upper bound around a predicted value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    pub lower: f64,
    pub upper: f64,
}

/// A single predicted balance for a date or period.
///
/// Received from the backend and never mutated; a refetch replaces the
/// whole series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    /// ISO date (or period label) this prediction applies to
    pub date: String,

    /// Predicted balance / income value
    #[serde(default)]
    pub predicted_balance: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence_interval: Option<ConfidenceInterval>,
}

// ── Month ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeeklyPrediction {
    pub week: u32,
    #[serde(default)]
    pub predicted_balance: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonthDetails {
    pub weekly_breakdown: Vec<WeeklyPrediction>,
    pub factors: Vec<String>,
}

/// Prediction for one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthPrediction {
    pub year: i32,
    pub month: u32,
    #[serde(default)]
    pub predicted_balance: f64,
    #[serde(default)]
    pub confidence_interval: ConfidenceInterval,
    #[serde(default)]
    pub details: MonthDetails,
}

// ── Year ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonthlyBreakdown {
    pub month: u32,
    #[serde(default)]
    pub predicted_balance: f64,
    #[serde(default)]
    pub confidence_interval: ConfidenceInterval,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct YearSummary {
    pub average_monthly: f64,
    pub highest_month: f64,
    pub lowest_month: f64,
    pub growth_rate: f64,
}

/// Prediction for one year with a per-month breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearPrediction {
    pub year: i32,
    #[serde(default)]
    pub total_predicted: f64,
    #[serde(default)]
    pub monthly_breakdown: Vec<MonthlyBreakdown>,
    #[serde(default)]
    pub summary: YearSummary,
}

// ── Range ───────────────────────────────────────────────────────────

/// Direction of a predicted range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Increasing,
    Decreasing,
    #[default]
    Stable,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RangeSummary {
    pub total_predicted: f64,
    pub average_daily: f64,
    pub trend: Trend,
}

/// Prediction over an explicit date range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangePrediction {
    pub start_date: String,
    pub end_date: String,
    #[serde(default)]
    pub predictions: Vec<PredictionRecord>,
    #[serde(default)]
    pub summary: RangeSummary,
}

/// Body of `POST /predict/range`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangePredictionRequest {
    pub start_date: String,
    pub end_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_context: Option<String>,
}

/// Derived totals over the 2025 series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionSummary {
    pub total_predicted: f64,
    /// Total spread evenly over twelve months
    pub average_monthly: f64,
    pub data_points: usize,
}
