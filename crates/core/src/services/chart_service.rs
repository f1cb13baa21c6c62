use serde_json::{json, Map, Value};
use std::path::{Path, PathBuf};
use tracing::error;

use crate::errors::CoreError;
use crate::models::chart::{
    ChartConfig, ChartData, ChartDataset, ChartKind, ColorSpec, DatasetType,
};
use crate::models::prediction::{PredictionRecord, YearPrediction};
use crate::services::format_service::{format_date, parse_date, DateStyle, MONTHS};

/// Dashboard palette, cycled through by dataset index.
pub const CHART_COLORS: [&str; 8] = [
    "#3b82f6", // primary
    "#8b5cf6", // secondary
    "#10b981", // success
    "#f59e0b", // warning
    "#ef4444", // danger
    "#06b6d4", // info
    "#f8fafc", // light
    "#0f172a", // dark
];

const PRIMARY: &str = CHART_COLORS[0];
const SECONDARY: &str = CHART_COLORS[1];

/// Builds chart configurations with the dashboard's styling.
///
/// The core computes the whole configuration; the frontend only renders.
/// Styling set on a dataset by the caller is never overwritten, and keys in
/// `custom_options` replace the matching top-level default option.
pub struct ChartService {
    palette: Vec<String>,
}

impl ChartService {
    pub fn new() -> Self {
        Self::with_palette(CHART_COLORS.iter().map(|c| c.to_string()).collect())
    }

    /// Use a different palette. An empty palette falls back to the default.
    pub fn with_palette(palette: Vec<String>) -> Self {
        if palette.is_empty() {
            return Self::new();
        }
        Self { palette }
    }

    fn color(&self, index: usize) -> &str {
        &self.palette[index % self.palette.len()]
    }

    pub fn line_chart(&self, data: ChartData, custom_options: Option<Value>) -> ChartConfig {
        let datasets = data
            .datasets
            .into_iter()
            .enumerate()
            .map(|(i, ds)| {
                let color = self.color(i);
                ChartDataset {
                    border_color: ds.border_color.or_else(|| Some(color.to_string())),
                    background_color: ds
                        .background_color
                        .or_else(|| Some(ColorSpec::Single(format!("{color}20")))),
                    border_width: ds.border_width.or(Some(2)),
                    fill: ds.fill.or(Some(false)),
                    tension: ds.tension.or(Some(0.4)),
                    point_radius: ds.point_radius.or(Some(4)),
                    point_hover_radius: ds.point_hover_radius.or(Some(6)),
                    ..ds
                }
            })
            .collect();

        self.build(ChartKind::Line, data.labels, datasets, default_options(), custom_options)
    }

    pub fn bar_chart(&self, data: ChartData, custom_options: Option<Value>) -> ChartConfig {
        let datasets = data
            .datasets
            .into_iter()
            .enumerate()
            .map(|(i, ds)| {
                let color = self.color(i);
                ChartDataset {
                    background_color: ds
                        .background_color
                        .or_else(|| Some(ColorSpec::Single(format!("{color}80")))),
                    border_color: ds.border_color.or_else(|| Some(color.to_string())),
                    border_width: ds.border_width.or(Some(1)),
                    border_radius: ds.border_radius.or(Some(4)),
                    border_skipped: ds.border_skipped.or(Some(false)),
                    ..ds
                }
            })
            .collect();

        self.build(ChartKind::Bar, data.labels, datasets, default_options(), custom_options)
    }

    /// Pie slices take the whole palette unless the dataset brings its own.
    pub fn pie_chart(&self, data: ChartData, custom_options: Option<Value>) -> ChartConfig {
        let datasets = data
            .datasets
            .into_iter()
            .map(|ds| ChartDataset {
                background_color: ds
                    .background_color
                    .or_else(|| Some(ColorSpec::Many(self.palette.clone()))),
                border_color: ds.border_color.or_else(|| Some("#ffffff".to_string())),
                border_width: ds.border_width.or(Some(2)),
                ..ds
            })
            .collect();

        self.build(ChartKind::Pie, data.labels, datasets, pie_options(), custom_options)
    }

    /// Bar chart where the first dataset is drawn as bars and the rest as
    /// lines, unless a dataset names its own type.
    pub fn mixed_chart(&self, data: ChartData, custom_options: Option<Value>) -> ChartConfig {
        let datasets = data
            .datasets
            .into_iter()
            .enumerate()
            .map(|(i, ds)| {
                let color = self.color(i);
                let default_type = if i == 0 { DatasetType::Bar } else { DatasetType::Line };
                ChartDataset {
                    dataset_type: ds.dataset_type.or(Some(default_type)),
                    background_color: ds
                        .background_color
                        .or_else(|| Some(ColorSpec::Single(format!("{color}80")))),
                    border_color: ds.border_color.or_else(|| Some(color.to_string())),
                    border_width: ds.border_width.or(Some(2)),
                    fill: ds.fill.or(Some(false)),
                    tension: ds.tension.or(Some(0.4)),
                    ..ds
                }
            })
            .collect();

        self.build(ChartKind::Mixed, data.labels, datasets, default_options(), custom_options)
    }

    fn build(
        &self,
        kind: ChartKind,
        labels: Vec<String>,
        datasets: Vec<ChartDataset>,
        defaults: Value,
        custom_options: Option<Value>,
    ) -> ChartConfig {
        ChartConfig {
            kind,
            chart_type: kind.render_type().to_string(),
            data: ChartData { labels, datasets },
            options: merge_options(defaults, custom_options),
        }
    }
}

impl Default for ChartService {
    fn default() -> Self {
        Self::new()
    }
}

/// Shallow merge: every top-level key of `custom` replaces the default.
pub fn merge_options(defaults: Value, custom: Option<Value>) -> Value {
    match (defaults, custom) {
        (Value::Object(mut base), Some(Value::Object(overrides))) => {
            for (key, value) in overrides {
                base.insert(key, value);
            }
            Value::Object(base)
        }
        (defaults, None) => defaults,
        (_, Some(other)) => other,
    }
}

fn legend(position: &str) -> Value {
    json!({
        "position": position,
        "labels": {
            "usePointStyle": true,
            "padding": 20,
            "font": { "size": 12, "family": "Inter" }
        }
    })
}

fn tooltip() -> Value {
    json!({
        "mode": "index",
        "intersect": false,
        "backgroundColor": "rgba(0, 0, 0, 0.8)",
        "titleColor": "#ffffff",
        "bodyColor": "#ffffff",
        "borderColor": "#374151",
        "borderWidth": 1,
        "cornerRadius": 8,
        "padding": 12,
        "displayColors": true
    })
}

fn axis() -> Value {
    json!({
        "grid": { "display": true, "color": "rgba(0, 0, 0, 0.1)" },
        "ticks": { "font": { "size": 11, "family": "Inter" } }
    })
}

/// Options shared by line, bar and mixed charts.
pub fn default_options() -> Value {
    json!({
        "responsive": true,
        "maintainAspectRatio": false,
        "plugins": { "legend": legend("top"), "tooltip": tooltip() },
        "scales": { "x": axis(), "y": axis() },
        "interaction": { "mode": "nearest", "axis": "x", "intersect": false },
        "animation": { "duration": 1000, "easing": "easeInOutQuart" }
    })
}

fn pie_options() -> Value {
    let mut plugins = Map::new();
    plugins.insert("legend".into(), legend("bottom"));
    plugins.insert("tooltip".into(), tooltip());
    json!({
        "responsive": true,
        "maintainAspectRatio": false,
        "plugins": Value::Object(plugins)
    })
}

// ── Series helpers ──────────────────────────────────────────────────

/// One filled line of predicted balances, labelled by date.
pub fn prediction_chart_data(records: &[PredictionRecord], label: &str) -> ChartData {
    ChartData {
        labels: records.iter().map(|r| date_label(&r.date)).collect(),
        datasets: vec![ChartDataset {
            border_color: Some(PRIMARY.to_string()),
            background_color: Some(ColorSpec::Single(format!("{PRIMARY}20"))),
            border_width: Some(2),
            fill: Some(true),
            ..ChartDataset::new(label, records.iter().map(|r| r.predicted_balance).collect())
        }],
    }
}

/// Historical vs predicted per calendar month.
pub fn monthly_chart_data(historical: &[f64], predicted: &[f64]) -> ChartData {
    let styled = |label: &str, data: &[f64], color: &str| ChartDataset {
        background_color: Some(ColorSpec::Single(format!("{color}80"))),
        border_color: Some(color.to_string()),
        border_width: Some(2),
        fill: Some(false),
        ..ChartDataset::new(label, data.to_vec())
    };
    ChartData {
        labels: MONTHS.iter().map(|m| m.to_string()).collect(),
        datasets: vec![
            styled("Histórico", historical, SECONDARY),
            styled("Predicho", predicted, PRIMARY),
        ],
    }
}

/// Monthly breakdown of a year prediction.
pub fn year_breakdown_chart_data(year: &YearPrediction) -> ChartData {
    let labels = year
        .monthly_breakdown
        .iter()
        .map(|m| match MONTHS.get((m.month as usize).wrapping_sub(1)) {
            Some(name) => name.to_string(),
            None => format!("Mes {}", m.month),
        })
        .collect();
    let data = year
        .monthly_breakdown
        .iter()
        .map(|m| m.predicted_balance)
        .collect();
    ChartData {
        labels,
        datasets: vec![ChartDataset::new(format!("Predicción {}", year.year), data)],
    }
}

/// Dates become `dd/mm/yyyy`; period labels the parser does not know are
/// kept verbatim.
fn date_label(raw: &str) -> String {
    if parse_date(raw).is_some() {
        format_date(raw, DateStyle::Numeric)
    } else {
        raw.to_string()
    }
}

// ── Live chart handle ───────────────────────────────────────────────

/// A rendered chart owned by the rendering layer.
pub trait ChartHandle {
    /// Replace the displayed data (no redraw yet).
    fn set_data(&mut self, data: ChartData) -> Result<(), CoreError>;

    /// Redraw using the given animation mode.
    fn update(&mut self, mode: &str) -> Result<(), CoreError>;

    /// Match the container's current size.
    fn resize(&mut self) -> Result<(), CoreError>;

    /// Current rendering as PNG bytes.
    fn to_png(&self) -> Result<Vec<u8>, CoreError>;
}

/// Thin wrapper around an optional live chart, recording the last failure.
pub struct ChartController<H: ChartHandle> {
    handle: Option<H>,
    updating: bool,
    error: Option<String>,
}

impl<H: ChartHandle> ChartController<H> {
    pub fn new() -> Self {
        Self {
            handle: None,
            updating: false,
            error: None,
        }
    }

    pub fn attach(&mut self, handle: H) {
        self.handle = Some(handle);
    }

    pub fn detach(&mut self) -> Option<H> {
        self.handle.take()
    }

    pub fn handle(&self) -> Option<&H> {
        self.handle.as_ref()
    }

    pub fn is_updating(&self) -> bool {
        self.updating
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Write the current rendering to `<dir>/<filename>.png`.
    /// Does nothing without an attached chart.
    pub fn export_chart(&mut self, dir: &Path, filename: &str) -> Option<PathBuf> {
        let handle = self.handle.as_ref()?;
        let path = dir.join(format!("{filename}.png"));
        let written = handle
            .to_png()
            .and_then(|bytes| std::fs::write(&path, bytes).map_err(CoreError::from));
        match written {
            Ok(()) => Some(path),
            Err(e) => {
                error!("Chart export error: {e}");
                self.error = Some("Error exporting chart".to_string());
                None
            }
        }
    }

    /// Swap in new data and request an animated redraw.
    pub fn update_chart(&mut self, data: ChartData) {
        let Some(handle) = self.handle.as_mut() else {
            return;
        };
        self.updating = true;
        let result = handle.set_data(data).and_then(|_| handle.update("active"));
        match result {
            Ok(()) => self.error = None,
            Err(e) => {
                error!("Chart update error: {e}");
                self.error = Some("Error updating chart".to_string());
            }
        }
        self.updating = false;
    }

    pub fn resize_chart(&mut self) {
        if let Some(handle) = self.handle.as_mut() {
            if let Err(e) = handle.resize() {
                error!("Chart resize error: {e}");
            }
        }
    }
}

impl<H: ChartHandle> Default for ChartController<H> {
    fn default() -> Self {
        Self::new()
    }
}
