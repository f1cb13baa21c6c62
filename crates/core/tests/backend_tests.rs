// ═══════════════════════════════════════════════════════════════════
// Backend Tests — HttpBackend against a local one-shot HTTP responder
// ═══════════════════════════════════════════════════════════════════

use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use balance_dashboard_core::backend::http::HttpBackend;
use balance_dashboard_core::backend::traits::PredictionBackend;
use balance_dashboard_core::errors::CoreError;
use balance_dashboard_core::models::data::UploadFile;
use balance_dashboard_core::models::prediction::RangePredictionRequest;
use balance_dashboard_core::models::settings::Settings;

// ═══════════════════════════════════════════════════════════════════
// Test Helpers — minimal HTTP server
// ═══════════════════════════════════════════════════════════════════

struct TestServer {
    url: String,
    requests: Arc<Mutex<Vec<String>>>,
}

impl TestServer {
    /// The `index`-th request received, lower-cased.
    fn request(&self, index: usize) -> String {
        self.requests.lock().unwrap()[index].clone()
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Read one request: headers, then a Content-Length or chunked body.
async fn read_request(stream: &mut TcpStream) -> std::io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 8192];

    let header_end = loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Ok(buf);
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = find(&buf, b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_lowercase();
    let content_length = head
        .lines()
        .find_map(|l| l.strip_prefix("content-length:"))
        .and_then(|v| v.trim().parse::<usize>().ok());
    let chunked = head.contains("transfer-encoding: chunked");

    loop {
        let body = &buf[header_end..];
        let complete = match content_length {
            Some(len) => body.len() >= len,
            None if chunked => find(body, b"0\r\n\r\n").is_some(),
            None => true,
        };
        if complete {
            break;
        }
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    Ok(buf)
}

/// Answer every connection with the same status and JSON body.
async fn respond_with(status: u16, body: &'static str) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    let requests = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&requests);

    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            let raw = read_request(&mut stream).await.unwrap_or_default();
            seen.lock()
                .unwrap()
                .push(String::from_utf8_lossy(&raw).to_lowercase());

            let response = format!(
                "HTTP/1.1 {status} Test\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = stream.write_all(response.as_bytes()).await;
            let _ = stream.shutdown().await;
        }
    });

    TestServer { url, requests }
}

/// Accept connections and never answer.
async fn silent_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((stream, _)) = listener.accept().await {
            held.push(stream);
        }
    });
    url
}

/// An address nothing listens on.
async fn closed_port() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);
    url
}

fn backend_for(url: &str) -> HttpBackend {
    HttpBackend::new(&Settings {
        base_url: url.to_string(),
        request_timeout_secs: 1,
        health_timeout_secs: 1,
        ..Settings::default()
    })
    .unwrap()
}

// ═══════════════════════════════════════════════════════════════════
// Construction
// ═══════════════════════════════════════════════════════════════════

mod construction {
    use super::*;

    #[test]
    fn invalid_settings_are_rejected() {
        let result = HttpBackend::new(&Settings {
            base_url: "localhost:8000".into(),
            ..Settings::default()
        });
        assert!(matches!(result, Err(CoreError::Config(_))));
    }

    #[test]
    fn base_url_is_trimmed() {
        let backend = backend_for("http://localhost:8000/");
        assert_eq!(backend.base_url(), "http://localhost:8000");
        assert_eq!(backend.name(), "Balance AI API");
    }
}

// ═══════════════════════════════════════════════════════════════════
// Routes and payloads
// ═══════════════════════════════════════════════════════════════════

mod routes {
    use super::*;

    #[tokio::test]
    async fn dashboard_is_decoded() {
        let server = respond_with(
            200,
            r#"{"historical_summary": {"total_historical": 1234.5}, "recent_trends": []}"#,
        )
        .await;
        let snapshot = backend_for(&server.url).dashboard().await.unwrap();

        assert_eq!(snapshot.historical_summary.total_historical, 1234.5);
        assert!(server.request(0).starts_with("get /dashboard http/1.1"));
    }

    #[tokio::test]
    async fn month_path() {
        let server = respond_with(200, r#"{"year": 2025, "month": 3, "predicted_balance": 10.0}"#).await;
        let month = backend_for(&server.url).month_prediction(2025, 3).await.unwrap();

        assert_eq!(month.month, 3);
        assert!(server.request(0).starts_with("get /predict/month/2025/3 "));
    }

    #[tokio::test]
    async fn range_is_posted_as_json() {
        let server = respond_with(
            200,
            r#"{"start_date": "2025-01-01", "end_date": "2025-02-01", "predictions": []}"#,
        )
        .await;
        let request = RangePredictionRequest {
            start_date: "2025-01-01".into(),
            end_date: "2025-02-01".into(),
            market_context: None,
        };
        backend_for(&server.url).range_prediction(&request).await.unwrap();

        let raw = server.request(0);
        assert!(raw.starts_with("post /predict/range "));
        assert!(raw.contains("content-type: application/json"));
        assert!(raw.contains(r#""start_date":"2025-01-01""#));
        assert!(!raw.contains("market_context"));
    }

    #[tokio::test]
    async fn analysis_sends_market_context() {
        let server = respond_with(200, r#"{"generated_at": "g1", "risk_factors": "Riesgo de liquidez elevado."}"#).await;
        let analysis = backend_for(&server.url)
            .ai_analysis(Some("Subida de tipos"))
            .await
            .unwrap();

        assert_eq!(analysis.risk_factors, vec!["Riesgo de liquidez elevado."]);
        let raw = server.request(0);
        assert!(raw.starts_with("post /analyze/ai "));
        assert!(raw.contains(r#"{"market_context":"subida de tipos"}"#));
    }

    #[tokio::test]
    async fn reset_posts_without_body() {
        let server = respond_with(200, r#"{"message": "ok", "total_records": 0}"#).await;
        let response = backend_for(&server.url).reset_data().await.unwrap();

        assert_eq!(response.message, "ok");
        assert!(server.request(0).starts_with("post /data/reset "));
    }

    #[tokio::test]
    async fn upload_is_multipart() {
        let server = respond_with(
            200,
            r#"{"message": "ok", "filename": "ventas.xlsx", "records_processed": 12, "total_records": 40}"#,
        )
        .await;
        let file = UploadFile::new("ventas.xlsx", b"fake spreadsheet bytes".to_vec());
        let response = backend_for(&server.url)
            .upload_file(&file, Some("Hoja1"))
            .await
            .unwrap();

        assert_eq!(response.total_records, 40);
        let raw = server.request(0);
        assert!(raw.starts_with("post /data/upload "));
        assert!(raw.contains("content-type: multipart/form-data; boundary="));
        assert!(raw.contains(r#"name="file"; filename="ventas.xlsx""#));
        assert!(raw.contains("application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"));
        assert!(raw.contains("fake spreadsheet bytes"));
        assert!(raw.contains(r#"name="sheet_name""#));
        assert!(raw.contains("hoja1"));
    }

    #[tokio::test]
    async fn upload_without_sheet_omits_field() {
        let server = respond_with(200, r#"{"message": "ok"}"#).await;
        let file = UploadFile::new("datos.xls", b"x".to_vec());
        backend_for(&server.url).upload_file(&file, None).await.unwrap();

        let raw = server.request(0);
        assert!(raw.contains("application/vnd.ms-excel"));
        assert!(!raw.contains("sheet_name"));
    }
}

// ═══════════════════════════════════════════════════════════════════
// Error classification
// ═══════════════════════════════════════════════════════════════════

mod errors {
    use super::*;

    #[tokio::test]
    async fn not_found() {
        let server = respond_with(404, r#"{"detail": "Not Found"}"#).await;
        let result = backend_for(&server.url).year_prediction(1999).await;
        assert!(matches!(result, Err(CoreError::NotFound)));
    }

    #[tokio::test]
    async fn server_error() {
        let server = respond_with(500, r#"{"detail": "boom"}"#).await;
        let result = backend_for(&server.url).list_predictions().await;
        assert!(matches!(result, Err(CoreError::ServerError { status: 500 })));
    }

    #[tokio::test]
    async fn other_status_keeps_body() {
        let server = respond_with(422, r#"{"detail": "bad range"}"#).await;
        let err = backend_for(&server.url).data_info().await.unwrap_err();
        assert_eq!(
            err.to_string(),
            r#"Request failed with status code 422: {"detail": "bad range"}"#
        );
    }

    #[tokio::test]
    async fn malformed_body() {
        let server = respond_with(200, "not json").await;
        let result = backend_for(&server.url).api_info().await;
        assert!(matches!(result, Err(CoreError::Deserialization(_))));
    }

    #[tokio::test]
    async fn nothing_listening() {
        let url = closed_port().await;
        let result = backend_for(&url).dashboard().await;
        assert!(matches!(result, Err(CoreError::NetworkUnreachable)));
    }

    #[tokio::test]
    async fn no_answer_times_out() {
        let url = silent_server().await;
        let result = backend_for(&url).dashboard().await;
        assert!(matches!(result, Err(CoreError::Timeout)));
    }
}

// ═══════════════════════════════════════════════════════════════════
// Health probe
// ═══════════════════════════════════════════════════════════════════

mod health {
    use super::*;

    #[tokio::test]
    async fn healthy() {
        let server = respond_with(200, r#"{"status": "healthy"}"#).await;
        assert!(backend_for(&server.url).health_check().await);
        assert!(server.request(0).starts_with("get /health "));
    }

    #[tokio::test]
    async fn unhealthy_status() {
        let server = respond_with(503, "{}").await;
        assert!(!backend_for(&server.url).health_check().await);
    }

    #[tokio::test]
    async fn unreachable() {
        let url = closed_port().await;
        assert!(!backend_for(&url).health_check().await);
    }

    #[tokio::test]
    async fn silent() {
        let url = silent_server().await;
        assert!(!backend_for(&url).health_check().await);
    }
}
