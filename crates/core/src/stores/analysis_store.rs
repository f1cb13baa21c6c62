use std::collections::VecDeque;
use std::sync::{Arc, RwLock};

use tracing::info;

use crate::backend::traits::PredictionBackend;
use crate::errors::CoreError;
use crate::models::analysis::{
    AiAnalysis, AnalysisHistoryEntry, AnalysisSummary, ConfidenceLevel,
};
use crate::services::format_service::{format_date, DateStyle};
use super::operation::{read, track, write, HasOperations, OperationState};

pub const KEY_AI_ANALYSIS: &str = "aiAnalysis";

/// Maximum number of analyses kept in history.
pub const HISTORY_LIMIT: usize = 20;

const NO_CONTEXT: &str = "Sin contexto específico";

#[derive(Debug, Default)]
struct AnalysisState {
    current: Option<AiAnalysis>,
    /// Oldest first; bounded to `HISTORY_LIMIT`
    history: VecDeque<AiAnalysis>,
    ops: OperationState,
}

impl HasOperations for AnalysisState {
    fn ops(&self) -> &OperationState {
        &self.ops
    }

    fn ops_mut(&mut self) -> &mut OperationState {
        &mut self.ops
    }
}

impl AnalysisState {
    /// Append unless an analysis with the same `generated_at` is already kept.
    fn remember(&mut self, analysis: &AiAnalysis) {
        if self
            .history
            .iter()
            .any(|a| a.generated_at == analysis.generated_at)
        {
            return;
        }
        self.history.push_back(analysis.clone());
        while self.history.len() > HISTORY_LIMIT {
            self.history.pop_front();
        }
    }
}

/// The current AI analysis plus a short history of previous ones.
pub struct AnalysisStore {
    backend: Arc<dyn PredictionBackend>,
    state: RwLock<AnalysisState>,
}

impl AnalysisStore {
    pub fn new(backend: Arc<dyn PredictionBackend>) -> Self {
        Self {
            backend,
            state: RwLock::new(AnalysisState::default()),
        }
    }

    // ── Actions ─────────────────────────────────────────────────────

    /// Ask the backend for a fresh analysis and make it current.
    pub async fn fetch_ai_analysis(
        &self,
        market_context: Option<&str>,
    ) -> Result<AiAnalysis, CoreError> {
        track(
            &self.state,
            KEY_AI_ANALYSIS,
            self.backend.ai_analysis(market_context),
            |s, data| {
                info!(
                    "AI analysis generated (confidence {}, {} insights, {} risks, {} recommendations)",
                    data.confidence_score,
                    data.business_insights.len(),
                    data.risk_factors.len(),
                    data.recommendations.len()
                );
                s.remember(&data);
                s.current = Some(data.clone());
                data
            },
        )
        .await
    }

    pub async fn generate_new_analysis(
        &self,
        market_context: Option<&str>,
    ) -> Result<AiAnalysis, CoreError> {
        self.fetch_ai_analysis(market_context).await
    }

    /// Make a remembered analysis current again. Returns false for an
    /// unknown id.
    pub fn load_analysis_from_history(&self, analysis_id: &str) -> bool {
        let mut s = write(&self.state);
        let found = s
            .history
            .iter()
            .find(|a| a.generated_at == analysis_id)
            .cloned();
        match found {
            Some(analysis) => {
                info!("Loaded analysis from history: {analysis_id}");
                s.current = Some(analysis);
                true
            }
            None => false,
        }
    }

    pub fn clear_current_analysis(&self) {
        let mut s = write(&self.state);
        s.current = None;
        s.ops.clear_error(KEY_AI_ANALYSIS);
    }

    pub fn clear_analysis_history(&self) {
        write(&self.state).history.clear();
        info!("Analysis history cleared");
    }

    pub fn clear_error(&self) {
        write(&self.state).ops.clear_error(KEY_AI_ANALYSIS);
    }

    /// Pretty JSON of the current analysis, or `None` when there is none.
    pub fn export_analysis(&self) -> Result<Option<String>, CoreError> {
        let s = read(&self.state);
        s.current
            .as_ref()
            .map(|a| serde_json::to_string_pretty(a).map_err(CoreError::from))
            .transpose()
    }

    // ── State ───────────────────────────────────────────────────────

    pub fn is_loading(&self) -> bool {
        read(&self.state).ops().is_loading(KEY_AI_ANALYSIS)
    }

    pub fn error(&self) -> Option<String> {
        read(&self.state).ops().error(KEY_AI_ANALYSIS)
    }

    pub fn current_analysis(&self) -> Option<AiAnalysis> {
        read(&self.state).current.clone()
    }

    pub fn has_analysis(&self) -> bool {
        read(&self.state).current.is_some()
    }

    /// Full history, oldest first.
    pub fn history(&self) -> Vec<AiAnalysis> {
        read(&self.state).history.iter().cloned().collect()
    }

    // ── Derived views ───────────────────────────────────────────────

    pub fn business_insights(&self) -> Vec<String> {
        self.list_field(|a| &a.business_insights)
    }

    pub fn risk_factors(&self) -> Vec<String> {
        self.list_field(|a| &a.risk_factors)
    }

    pub fn recommendations(&self) -> Vec<String> {
        self.list_field(|a| &a.recommendations)
    }

    pub fn opportunities(&self) -> Vec<String> {
        self.list_field(|a| &a.opportunities)
    }

    pub fn critical_months(&self) -> Vec<String> {
        self.list_field(|a| &a.critical_months)
    }

    pub fn market_trends(&self) -> Vec<String> {
        self.list_field(|a| &a.market_trends)
    }

    pub fn confidence_score(&self) -> f64 {
        read(&self.state)
            .current
            .as_ref()
            .map_or(0.0, |a| a.confidence_score)
    }

    pub fn confidence_level(&self) -> ConfidenceLevel {
        ConfidenceLevel::from_score(self.confidence_score())
    }

    /// The last `limit` analyses, most recent first.
    pub fn recent_analyses(&self, limit: usize) -> Vec<AnalysisHistoryEntry> {
        read(&self.state)
            .history
            .iter()
            .rev()
            .take(limit)
            .map(|a| AnalysisHistoryEntry {
                id: a.generated_at.clone(),
                date: format_date(&a.generated_at, DateStyle::Numeric),
                confidence: a.confidence_score,
                market_context: a
                    .market_context
                    .clone()
                    .unwrap_or_else(|| NO_CONTEXT.to_string()),
                insights_count: a.business_insights.len(),
            })
            .collect()
    }

    pub fn analysis_summary(&self) -> Option<AnalysisSummary> {
        let s = read(&self.state);
        let a = s.current.as_ref()?;
        Some(AnalysisSummary {
            total_insights: a.business_insights.len(),
            total_risks: a.risk_factors.len(),
            total_recommendations: a.recommendations.len(),
            total_opportunities: a.opportunities.len(),
            total_trends: a.market_trends.len(),
            confidence: a.confidence_score,
            generated_at: a.generated_at.clone(),
        })
    }

    fn list_field(&self, field: impl Fn(&AiAnalysis) -> &Vec<String>) -> Vec<String> {
        read(&self.state)
            .current
            .as_ref()
            .map(|a| field(a).clone())
            .unwrap_or_default()
    }
}
