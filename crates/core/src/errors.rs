use thiserror::Error;

/// Unified error type for the entire balance-dashboard-core library.
/// Every public function returns `Result<T, CoreError>`.
///
/// Stores only keep the `Display` text of an error against their operation
/// key, so the messages here are the ones a user ends up reading.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Client-side validation ──────────────────────────────────────
    #[error("{0}")]
    Validation(String),

    // ── Backend / Network ───────────────────────────────────────────
    #[error("Resource not found")]
    NotFound,

    #[error("Server error. Please try again later.")]
    ServerError { status: u16 },

    #[error("Request timeout. Please check your connection.")]
    Timeout,

    #[error("Network error. Please check your connection.")]
    NetworkUnreachable,

    #[error("{0}")]
    Unclassified(String),

    // ── Payloads / Files / Config ───────────────────────────────────
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("File I/O error: {0}")]
    FileIO(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl CoreError {
    /// Build the error for a non-success HTTP status.
    ///
    /// 404 and 5xx have dedicated variants; every other status is passed
    /// through with whatever body the server sent back.
    pub fn from_status(status: u16, body: &str) -> Self {
        match status {
            404 => CoreError::NotFound,
            500..=599 => CoreError::ServerError { status },
            _ => {
                let body = body.trim();
                if body.is_empty() {
                    CoreError::Unclassified(format!("Request failed with status code {status}"))
                } else {
                    CoreError::Unclassified(format!(
                        "Request failed with status code {status}: {body}"
                    ))
                }
            }
        }
    }
}

// ── Conversion helpers (From impls) ─────────────────────────────────

impl From<std::io::Error> for CoreError {
    fn from(e: std::io::Error) -> Self {
        CoreError::FileIO(e.to_string())
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Deserialization(e.to_string())
    }
}

impl From<reqwest::Error> for CoreError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            return CoreError::Timeout;
        }
        if let Some(status) = e.status() {
            return CoreError::from_status(status.as_u16(), "");
        }
        // No response object at all: the server was never reached.
        if e.is_connect() || e.is_request() {
            return CoreError::NetworkUnreachable;
        }
        if e.is_decode() {
            return CoreError::Deserialization(redact_query(&e.to_string()));
        }
        CoreError::Unclassified(redact_query(&e.to_string()))
    }
}

/// Strip query parameters from URLs embedded in reqwest messages.
fn redact_query(msg: &str) -> String {
    match msg.find('?') {
        Some(idx) => format!("{}?<query redacted>", &msg[..idx]),
        None => msg.to_string(),
    }
}
