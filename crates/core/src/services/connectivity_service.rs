use std::fmt::Display;
use std::future::Future;
use std::sync::{Arc, RwLock};

use tracing::{error, warn};

use crate::backend::traits::PredictionBackend;
use crate::stores::operation::{read, write};

#[derive(Debug)]
struct ConnectivityState {
    online: bool,
    last_error: Option<String>,
}

/// Tracks whether the backend is reachable and the last error any wrapped
/// operation produced.
///
/// Starts out optimistic (online) until the first health check says
/// otherwise.
pub struct ConnectivityService {
    backend: Arc<dyn PredictionBackend>,
    state: RwLock<ConnectivityState>,
}

impl ConnectivityService {
    pub fn new(backend: Arc<dyn PredictionBackend>) -> Self {
        Self {
            backend,
            state: RwLock::new(ConnectivityState {
                online: true,
                last_error: None,
            }),
        }
    }

    pub fn is_online(&self) -> bool {
        read(&self.state).online
    }

    pub fn last_error(&self) -> Option<String> {
        read(&self.state).last_error.clone()
    }

    pub fn clear_error(&self) {
        write(&self.state).last_error = None;
    }

    /// Probe the backend and record the result. A healthy answer also
    /// clears the last error.
    pub async fn check_connection(&self) -> bool {
        let healthy = self.backend.health_check().await;
        let mut s = write(&self.state);
        s.online = healthy;
        if healthy {
            s.last_error = None;
        } else {
            warn!("{} is not reachable", self.backend.name());
        }
        healthy
    }

    /// Run `operation`, recording its failure as the last error.
    ///
    /// The error is returned unchanged; `error_message` only replaces the
    /// recorded text.
    pub async fn with_error_handling<T, E, Fut>(
        &self,
        operation: Fut,
        error_message: Option<&str>,
    ) -> Result<T, E>
    where
        E: Display,
        Fut: Future<Output = Result<T, E>>,
    {
        write(&self.state).last_error = None;

        match operation.await {
            Ok(value) => Ok(value),
            Err(e) => {
                error!("API error: {e}");
                let message = error_message.map_or_else(|| e.to_string(), str::to_string);
                write(&self.state).last_error = Some(message);
                Err(e)
            }
        }
    }
}
