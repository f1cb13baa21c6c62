use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::backend::traits::PredictionBackend;
use crate::errors::CoreError;
use crate::models::dashboard::{
    DashboardKeyMetrics, DashboardSnapshot, PerformanceIndicators, TrendSeries,
};
use super::operation::{lock, read, track, write, HasOperations, OperationState};

pub const KEY_DASHBOARD: &str = "dashboard";

/// Default freshness window for a cached snapshot.
pub const DEFAULT_FRESHNESS: Duration = Duration::from_secs(5 * 60);

/// Default auto-refresh period.
pub const DEFAULT_AUTO_REFRESH: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Default)]
struct DashboardState {
    snapshot: Option<DashboardSnapshot>,
    /// Wall-clock time of the last successful fetch (for display)
    last_updated: Option<DateTime<Utc>>,
    /// Monotonic time of the last successful fetch (for freshness)
    fetched_at: Option<Instant>,
    ops: OperationState,
}

impl HasOperations for DashboardState {
    fn ops(&self) -> &OperationState {
        &self.ops
    }

    fn ops_mut(&mut self) -> &mut OperationState {
        &mut self.ops
    }
}

/// The part of the store the auto-refresh task shares.
struct DashboardShared {
    backend: Arc<dyn PredictionBackend>,
    state: RwLock<DashboardState>,
    freshness: Duration,
}

impl DashboardShared {
    fn is_fresh(&self) -> bool {
        let s = read(&self.state);
        match (&s.snapshot, s.fetched_at) {
            (Some(_), Some(at)) => at.elapsed() < self.freshness,
            _ => false,
        }
    }

    async fn fetch(&self, force_refresh: bool) -> Result<(), CoreError> {
        if !force_refresh && self.is_fresh() {
            debug!("Using cached dashboard data");
            return Ok(());
        }

        track(&self.state, KEY_DASHBOARD, self.backend.dashboard(), |s, data| {
            s.snapshot = Some(data);
            s.last_updated = Some(Utc::now());
            s.fetched_at = Some(Instant::now());
            info!("Dashboard data loaded successfully");
        })
        .await
    }
}

/// Holds one dashboard snapshot and keeps it fresh.
///
/// The snapshot is reused for the freshness window (5 minutes by default);
/// `fetch_dashboard_data(true)` always goes to the backend. An optional
/// background task re-fetches on a fixed period until stopped or until the
/// store is dropped.
pub struct DashboardStore {
    shared: Arc<DashboardShared>,
    auto_refresh: Mutex<Option<JoinHandle<()>>>,
}

impl DashboardStore {
    pub fn new(backend: Arc<dyn PredictionBackend>) -> Self {
        Self::with_freshness(backend, DEFAULT_FRESHNESS)
    }

    pub fn with_freshness(backend: Arc<dyn PredictionBackend>, freshness: Duration) -> Self {
        Self {
            shared: Arc::new(DashboardShared {
                backend,
                state: RwLock::new(DashboardState::default()),
                freshness,
            }),
            auto_refresh: Mutex::new(None),
        }
    }

    // ── Actions ─────────────────────────────────────────────────────

    /// Load the snapshot unless a fresh one is cached and `force_refresh`
    /// is false.
    pub async fn fetch_dashboard_data(&self, force_refresh: bool) -> Result<(), CoreError> {
        self.shared.fetch(force_refresh).await
    }

    pub async fn refresh_dashboard(&self) -> Result<(), CoreError> {
        self.shared.fetch(true).await
    }

    /// Forget the snapshot, its timestamps and any error.
    pub fn reset_dashboard(&self) {
        let mut s = write(&self.shared.state);
        s.snapshot = None;
        s.last_updated = None;
        s.fetched_at = None;
        s.ops.clear_error(KEY_DASHBOARD);
    }

    pub fn clear_error(&self) {
        write(&self.shared.state).ops.clear_error(KEY_DASHBOARD);
    }

    /// Re-fetch every `interval` (default 5 minutes) in the background.
    ///
    /// Failures are logged and otherwise ignored. Starting again replaces
    /// the running task. Must be called from inside a Tokio runtime.
    pub fn start_auto_refresh(&self, interval: Option<Duration>) -> Result<(), CoreError> {
        let period = interval.unwrap_or(DEFAULT_AUTO_REFRESH);
        if period.is_zero() {
            return Err(CoreError::Config("auto-refresh interval must be greater than zero".into()));
        }
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|_| CoreError::Config("auto-refresh requires a Tokio runtime".into()))?;

        let mut slot = lock(&self.auto_refresh);
        if let Some(previous) = slot.take() {
            previous.abort();
        }

        let shared = Arc::clone(&self.shared);
        *slot = Some(runtime.spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                debug!("Auto-refreshing dashboard data");
                if let Err(e) = shared.fetch(true).await {
                    warn!("Dashboard auto-refresh failed: {e}");
                }
            }
        }));

        info!("Dashboard auto-refresh enabled ({}s)", period.as_secs());
        Ok(())
    }

    pub fn stop_auto_refresh(&self) {
        if let Some(handle) = lock(&self.auto_refresh).take() {
            handle.abort();
            info!("Dashboard auto-refresh disabled");
        }
    }

    pub fn is_auto_refreshing(&self) -> bool {
        lock(&self.auto_refresh).is_some()
    }

    // ── State ───────────────────────────────────────────────────────

    pub fn is_loading(&self) -> bool {
        read(&self.shared.state).ops().is_loading(KEY_DASHBOARD)
    }

    pub fn error(&self) -> Option<String> {
        read(&self.shared.state).ops().error(KEY_DASHBOARD)
    }

    pub fn snapshot(&self) -> Option<DashboardSnapshot> {
        read(&self.shared.state).snapshot.clone()
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        read(&self.shared.state).last_updated
    }

    pub fn is_fresh(&self) -> bool {
        self.shared.is_fresh()
    }

    // ── Derived views ───────────────────────────────────────────────

    pub fn key_metrics(&self) -> Option<DashboardKeyMetrics> {
        let s = read(&self.shared.state);
        let data = s.snapshot.as_ref()?;
        Some(DashboardKeyMetrics {
            total_historical: data.historical_summary.total_historical,
            total_predicted: data.predictions_summary.total_predicted_2025,
            growth_rate: data.predictions_summary.growth_rate,
            average_monthly_historical: data.historical_summary.average_monthly,
            average_monthly_predicted: data.predictions_summary.average_monthly_2025,
            total_growth: data.key_metrics.total_growth,
        })
    }

    /// Recent trends as parallel arrays; `None` without a snapshot or when
    /// the snapshot carries no trend points.
    pub fn recent_trends_chart(&self) -> Option<TrendSeries> {
        let s = read(&self.shared.state);
        let trends = &s.snapshot.as_ref()?.recent_trends;
        if trends.is_empty() {
            return None;
        }
        Some(TrendSeries {
            labels: trends.iter().map(|t| t.month.clone()).collect(),
            historical: trends.iter().map(|t| t.historical).collect(),
            predicted: trends.iter().map(|t| t.predicted).collect(),
        })
    }

    pub fn performance_indicators(&self) -> Option<PerformanceIndicators> {
        let s = read(&self.shared.state);
        let metrics = &s.snapshot.as_ref()?.key_metrics;
        Some(PerformanceIndicators {
            best_month: metrics.best_month.clone(),
            worst_month: metrics.worst_month.clone(),
            volatility_index: metrics.volatility_index,
            total_growth: metrics.total_growth,
        })
    }
}

impl Drop for DashboardStore {
    fn drop(&mut self) {
        let slot = self
            .auto_refresh
            .get_mut()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(handle) = slot.take() {
            handle.abort();
        }
    }
}
