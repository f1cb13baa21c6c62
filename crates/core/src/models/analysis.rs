use serde::{Deserialize, Serialize};

use crate::services::text_service::{normalize_list, normalize_text};

/// A field the AI backend sends either as one block of text or as a list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TextOrList {
    Text(String),
    List(Vec<String>),
}

/// Body of `POST /analyze/ai`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AiAnalysisRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_context: Option<String>,
}

/// AI-generated analysis, already normalized.
///
/// The upstream model is inconsistent about shape: sections may sit at the
/// top level or inside `analysis` / `insights`, list fields may be a single
/// string, and text may arrive with every character separated by spaces.
/// All of that is resolved here, when the payload is deserialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawAiAnalysis")]
pub struct AiAnalysis {
    /// Generation timestamp; doubles as the history id
    pub generated_at: String,
    pub market_context: Option<String>,
    pub confidence_score: f64,

    pub trend_analysis: String,
    pub seasonal_patterns: String,
    pub overall_assessment: String,

    pub risk_factors: Vec<String>,
    pub recommendations: Vec<String>,
    pub opportunities: Vec<String>,
    pub critical_months: Vec<String>,
    pub business_insights: Vec<String>,
    pub market_trends: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawSections {
    trend_analysis: Option<TextOrList>,
    seasonal_patterns: Option<TextOrList>,
    overall_assessment: Option<TextOrList>,
    risk_factors: Option<TextOrList>,
    recommendations: Option<TextOrList>,
    opportunities: Option<TextOrList>,
    critical_months: Option<TextOrList>,
    business_insights: Option<TextOrList>,
    market_trends: Option<TextOrList>,
}

#[derive(Debug, Deserialize)]
struct RawAiAnalysis {
    #[serde(default)]
    generated_at: String,
    #[serde(default)]
    market_context: Option<String>,
    #[serde(default)]
    confidence_score: Option<f64>,
    #[serde(default)]
    analysis: Option<RawSections>,
    #[serde(default)]
    insights: Option<RawSections>,
    #[serde(flatten)]
    top: RawSections,
}

impl From<RawAiAnalysis> for AiAnalysis {
    fn from(raw: RawAiAnalysis) -> Self {
        let mut sections: Vec<&RawSections> = vec![&raw.top];
        sections.extend(raw.analysis.as_ref());
        sections.extend(raw.insights.as_ref());

        let text = |get: fn(&RawSections) -> Option<&TextOrList>| -> String {
            sections
                .iter()
                .find_map(|s| get(*s))
                .map(text_of)
                .unwrap_or_default()
        };
        let list = |get: fn(&RawSections) -> Option<&TextOrList>| -> Vec<String> {
            sections
                .iter()
                .find_map(|s| get(*s))
                .map(normalize_list)
                .unwrap_or_default()
        };

        AiAnalysis {
            generated_at: raw.generated_at.clone(),
            market_context: raw
                .market_context
                .as_deref()
                .map(normalize_text)
                .filter(|c| !c.is_empty()),
            confidence_score: raw.confidence_score.unwrap_or(0.0),
            trend_analysis: text(|s| s.trend_analysis.as_ref()),
            seasonal_patterns: text(|s| s.seasonal_patterns.as_ref()),
            overall_assessment: text(|s| s.overall_assessment.as_ref()),
            risk_factors: list(|s| s.risk_factors.as_ref()),
            recommendations: list(|s| s.recommendations.as_ref()),
            opportunities: list(|s| s.opportunities.as_ref()),
            critical_months: list(|s| s.critical_months.as_ref()),
            business_insights: list(|s| s.business_insights.as_ref()),
            market_trends: list(|s| s.market_trends.as_ref()),
        }
    }
}

fn text_of(value: &TextOrList) -> String {
    match value {
        TextOrList::Text(s) => normalize_text(s),
        TextOrList::List(items) => items
            .iter()
            .map(|s| normalize_text(s))
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" "),
    }
}

// ── Derived views ───────────────────────────────────────────────────

/// Qualitative bucket for `confidence_score`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
}

impl ConfidenceLevel {
    pub fn from_score(score: f64) -> Self {
        if score >= 80.0 {
            ConfidenceLevel::High
        } else if score >= 60.0 {
            ConfidenceLevel::Medium
        } else {
            ConfidenceLevel::Low
        }
    }

    /// Display label used by the dashboard.
    pub fn label(&self) -> &'static str {
        match self {
            ConfidenceLevel::High => "Alta",
            ConfidenceLevel::Medium => "Media",
            ConfidenceLevel::Low => "Baja",
        }
    }
}

/// Counts over the current analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisSummary {
    pub total_insights: usize,
    pub total_risks: usize,
    pub total_recommendations: usize,
    pub total_opportunities: usize,
    pub total_trends: usize,
    pub confidence: f64,
    pub generated_at: String,
}

/// One row of the "recent analyses" list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisHistoryEntry {
    /// `generated_at` of the analysis, usable with `load_analysis_from_history`
    pub id: String,
    /// Generation date formatted for display
    pub date: String,
    pub confidence: f64,
    pub market_context: String,
    pub insights_count: usize,
}
