pub mod backend;
pub mod errors;
pub mod models;
pub mod services;
pub mod stores;

use std::sync::Arc;

use backend::http::HttpBackend;
use backend::traits::PredictionBackend;
use errors::CoreError;
use models::api_info::ApiInfo;
use models::settings::Settings;
use services::chart_service::ChartService;
use services::connectivity_service::ConnectivityService;
use stores::analysis_store::AnalysisStore;
use stores::dashboard_store::DashboardStore;
use stores::data_store::DataStore;
use stores::predictions_store::PredictionsStore;

/// Main entry point for the Balance dashboard core library.
///
/// Built once at startup and passed by reference to whatever renders the
/// dashboard. Every store shares the same backend but owns its own slice of
/// state, so actions on different stores never contend with each other.
#[must_use]
pub struct BalanceDashboard {
    settings: Settings,
    backend: Arc<dyn PredictionBackend>,
    predictions: PredictionsStore,
    dashboard: DashboardStore,
    analysis: AnalysisStore,
    data: DataStore,
    connectivity: ConnectivityService,
    charts: ChartService,
}

impl std::fmt::Debug for BalanceDashboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BalanceDashboard")
            .field("backend", &self.backend.name())
            .field("base_url", &self.settings.base_url)
            .field("online", &self.connectivity.is_online())
            .field("has_dashboard", &self.dashboard.snapshot().is_some())
            .field("auto_refresh", &self.dashboard.is_auto_refreshing())
            .finish()
    }
}

impl BalanceDashboard {
    /// Connect to the HTTP backend described by `settings`.
    pub fn new(settings: Settings) -> Result<Self, CoreError> {
        let backend = Arc::new(HttpBackend::new(&settings)?);
        Ok(Self::with_backend(settings, backend))
    }

    /// Build from environment variables (see `Settings::from_env`).
    pub fn from_env() -> Result<Self, CoreError> {
        Self::new(Settings::from_env()?)
    }

    /// Use any backend implementation (e.g., an in-memory one for tests).
    pub fn with_backend(settings: Settings, backend: Arc<dyn PredictionBackend>) -> Self {
        Self {
            predictions: PredictionsStore::new(Arc::clone(&backend)),
            dashboard: DashboardStore::with_freshness(
                Arc::clone(&backend),
                settings.dashboard_freshness(),
            ),
            analysis: AnalysisStore::new(Arc::clone(&backend)),
            data: DataStore::new(Arc::clone(&backend)),
            connectivity: ConnectivityService::new(Arc::clone(&backend)),
            charts: ChartService::new(),
            backend,
            settings,
        }
    }

    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    #[must_use]
    pub fn predictions(&self) -> &PredictionsStore {
        &self.predictions
    }

    #[must_use]
    pub fn dashboard(&self) -> &DashboardStore {
        &self.dashboard
    }

    #[must_use]
    pub fn analysis(&self) -> &AnalysisStore {
        &self.analysis
    }

    #[must_use]
    pub fn data(&self) -> &DataStore {
        &self.data
    }

    #[must_use]
    pub fn connectivity(&self) -> &ConnectivityService {
        &self.connectivity
    }

    #[must_use]
    pub fn charts(&self) -> &ChartService {
        &self.charts
    }

    /// Service metadata. Not mirrored in any store; fetched on demand.
    pub async fn api_info(&self) -> Result<ApiInfo, CoreError> {
        self.connectivity
            .with_error_handling(self.backend.api_info(), None)
            .await
    }

    /// Start dashboard auto-refresh with the configured period.
    pub fn start_auto_refresh(&self) -> Result<(), CoreError> {
        self.dashboard
            .start_auto_refresh(Some(self.settings.auto_refresh_interval()))
    }

    /// Stop background work. Also happens on drop.
    pub fn shutdown(&self) {
        self.dashboard.stop_auto_refresh();
    }
}
