use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The four chart configurations the dashboard renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Line,
    Bar,
    Pie,
    /// Bar chart whose datasets may individually render as lines
    Mixed,
}

impl ChartKind {
    /// Type name understood by the rendering library.
    /// Mixed charts are bar charts with per-dataset overrides.
    pub fn render_type(&self) -> &'static str {
        match self {
            ChartKind::Line => "line",
            ChartKind::Bar | ChartKind::Mixed => "bar",
            ChartKind::Pie => "pie",
        }
    }
}

/// Per-dataset type inside a mixed chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetType {
    Bar,
    Line,
}

/// Either one colour for the whole dataset or one per data point (pie slices).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColorSpec {
    Single(String),
    Many(Vec<String>),
}

/// A labelled series plus optional styling.
///
/// Unset styling fields are filled in by the chart service; anything set
/// here is kept as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartDataset {
    pub label: String,
    pub data: Vec<f64>,

    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub dataset_type: Option<DatasetType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<ColorSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tension: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub point_radius: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub point_hover_radius: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_radius: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_skipped: Option<bool>,
}

impl ChartDataset {
    pub fn new(label: impl Into<String>, data: Vec<f64>) -> Self {
        Self {
            label: label.into(),
            data,
            ..Self::default()
        }
    }
}

/// Labels plus datasets, the shape every chart kind consumes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub datasets: Vec<ChartDataset>,
}

/// A complete, render-ready chart description.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartConfig {
    #[serde(skip)]
    pub kind: ChartKind,

    #[serde(rename = "type")]
    pub chart_type: String,

    pub data: ChartData,

    pub options: Value,
}
