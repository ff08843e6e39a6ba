//! HTTP Server for the cleansheet API.
//!
//! # API Endpoints
//!
//! | Method | Path              | Description                                  |
//! |--------|-------------------|----------------------------------------------|
//! | GET    | `/health`         | Health check                                 |
//! | POST   | `/api/upload`     | Upload a sheet, get the cleaned preview      |
//! | POST   | `/api/download`   | Upload a sheet, get the cleaned file back    |
//! | GET    | `/api/logs`       | SSE stream for real-time logs                |
//!
//! Uploads are multipart with a `file` field. `/api/download` also takes a
//! `format` field or `?format=` query (`csv` or `xlsx`, default `xlsx`).

use axum::{
    extract::{DefaultBodyLimit, Multipart, Query},
    http::{header, Method, StatusCode},
    response::{sse::Event, IntoResponse, Json, Response, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde::Deserialize;
use serde_json::{json, Value};
use std::{convert::Infallible, net::SocketAddr, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;

use super::logs::{log_error, LOG_BROADCASTER};
use super::types::{error_response, pipeline_error_response, UploadResponse};
use crate::error::{
    ExportError, PipelineError, PipelineResult, ReadError, ServerResult, TransformError,
};
use crate::export::ExportFormat;
use crate::transform::pipeline::{clean_and_export, clean_bytes};

type ApiError = (StatusCode, Json<Value>);

/// Server settings
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Largest accepted request body
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            max_upload_bytes: 25 * 1024 * 1024,
        }
    }
}

/// Build the router with all routes and layers.
pub fn router(config: &ServerConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE, header::CONTENT_DISPOSITION]);

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/upload", post(upload))
        .route("/api/download", post(download))
        .route("/api/logs", get(sse_logs))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(cors)
}

/// Start the HTTP server
pub async fn start_server(config: ServerConfig) -> ServerResult<()> {
    let app = router(&config);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| crate::error::ServerError::BadRequest(format!("Invalid listen address: {}", e)))?;

    tracing::info!(%addr, max_upload_bytes = config.max_upload_bytes, "cleansheet server listening");
    tracing::info!("POST /api/upload   - Upload .csv/.xlsx, get cleaned preview");
    tracing::info!("POST /api/download - Upload .csv/.xlsx, get datos_limpios file");
    tracing::info!("GET  /api/logs     - SSE log stream");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check endpoint
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "cleansheet",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "upload": "POST /api/upload",
            "download": "POST /api/download",
            "logs": "GET /api/logs (SSE)"
        }
    }))
}

/// SSE endpoint for real-time log streaming
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(entry) => {
            let json = serde_json::to_string(&entry).ok()?;
            Some(Ok(Event::default().data(json)))
        }
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Fields read from an upload form
struct UploadForm {
    file_name: String,
    bytes: Vec<u8>,
    format: Option<String>,
}

async fn read_form(mut multipart: Multipart) -> Result<UploadForm, ApiError> {
    let mut file: Option<(String, Vec<u8>)> = None;
    let mut format = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        bad_request(format!("Multipart error: {}", e))
    })? {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "file" => {
                let name = field.file_name().unwrap_or("").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| bad_request(format!("Read error: {}", e)))?;
                file = Some((name, data.to_vec()));
            }
            "format" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| bad_request(format!("Read error: {}", e)))?;
                format = Some(text);
            }
            _ => {}
        }
    }

    let (file_name, bytes) = file.ok_or_else(|| bad_request("No file provided"))?;
    Ok(UploadForm { file_name, bytes, format })
}

/// Upload endpoint: returns the cleaned table as JSON
async fn upload(multipart: Multipart) -> Result<Json<UploadResponse>, ApiError> {
    let form = read_form(multipart).await?;
    tracing::info!(file = %form.file_name, bytes = form.bytes.len(), "new upload");

    let UploadForm { file_name, bytes, .. } = form;
    let report = run_pipeline(move || clean_bytes(&file_name, &bytes)).await?;
    Ok(Json(UploadResponse::from(report)))
}

/// Run a pipeline job on the blocking pool so parsing large sheets does not
/// stall the runtime workers.
async fn run_pipeline<T, F>(job: F) -> Result<T, ApiError>
where
    F: FnOnce() -> PipelineResult<T> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(job).await {
        Ok(result) => result.map_err(pipeline_failure),
        Err(e) => {
            log_error(format!("Pipeline task failed: {}", e));
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(error_response("Internal error while processing the file")),
            ))
        }
    }
}

#[derive(Debug, Deserialize)]
struct DownloadQuery {
    format: Option<String>,
}

/// Download endpoint: returns the cleaned file as an attachment
async fn download(
    Query(query): Query<DownloadQuery>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let form = read_form(multipart).await?;
    tracing::info!(file = %form.file_name, bytes = form.bytes.len(), "new download");

    let UploadForm { file_name, bytes, format } = form;
    let format = match format.or(query.format) {
        Some(f) => f
            .parse::<ExportFormat>()
            .map_err(|e| pipeline_failure(e.into()))?,
        None => ExportFormat::default(),
    };

    let (_, download) = run_pipeline(move || clean_and_export(&file_name, &bytes, format)).await?;

    let headers = [
        (header::CONTENT_TYPE, download.media_type().to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", download.file_name()),
        ),
    ];

    Ok((headers, download.bytes).into_response())
}

/// HTTP status for a pipeline failure
pub fn status_for(err: &PipelineError) -> StatusCode {
    match err {
        PipelineError::Read(ReadError::UnsupportedFileType(_)) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        PipelineError::Transform(TransformError::MissingRequiredColumn(_)) => StatusCode::UNPROCESSABLE_ENTITY,
        PipelineError::Export(ExportError::UnknownFormat(_)) => StatusCode::BAD_REQUEST,
        e if e.is_user_error() => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn pipeline_failure(err: PipelineError) -> ApiError {
    log_error(err.to_string());
    (status_for(&err), Json(pipeline_error_response(&err)))
}

fn bad_request(message: impl AsRef<str>) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(error_response(message.as_ref())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    const BOUNDARY: &str = "cleansheet-test-boundary";

    fn multipart_body(file_name: &str, content: &str, format: Option<&str>) -> Body {
        let mut body = String::new();
        if let Some(f) = format {
            body.push_str(&format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"format\"\r\n\r\n{f}\r\n"
            ));
        }
        body.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n{content}\r\n--{BOUNDARY}--\r\n"
        ));
        Body::from(body)
    }

    fn post(uri: &str, body: Body) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
            .body(body)
            .unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let app = router(&ServerConfig::default());
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["service"], "cleansheet");
    }

    #[tokio::test]
    async fn test_upload_returns_preview() {
        let app = router(&ServerConfig::default());
        let csv = "Content URL,Domain Rating,Website Traffic\nhttps://example.com/page?x=1,45,1000";
        let response = app
            .oneshot(post("/api/upload", multipart_body("links.csv", csv, None)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "ready");
        assert_eq!(body["rows"][0]["Content URL"], "example.com");
        assert_eq!(body["rows"][0]["Email"], "");
    }

    #[tokio::test]
    async fn test_upload_rejects_unsupported_type() {
        let app = router(&ServerConfig::default());
        let response = app
            .oneshot(post("/api/upload", multipart_body("links.txt", "Content URL\na.com", None)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(json_body(response).await["kind"], "unsupportedFileType");
    }

    #[tokio::test]
    async fn test_upload_missing_content_url() {
        let app = router(&ServerConfig::default());
        let response = app
            .oneshot(post("/api/upload", multipart_body("links.csv", "URL,Email\na.com,x@y.z", None)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = json_body(response).await;
        assert_eq!(body["status"], "error");
        assert_eq!(body["rows"], json!([]));
    }

    #[tokio::test]
    async fn test_download_csv_attachment() {
        let app = router(&ServerConfig::default());
        let csv = "Content URL\nhttp://a.io/x";
        let response = app
            .oneshot(post("/api/download", multipart_body("links.csv", csv, Some("csv"))))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/csv");
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"datos_limpios.csv\""
        );
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"Content URL,Email,WhatsApp\na.io,,\n");
    }

    #[tokio::test]
    async fn test_download_defaults_to_xlsx() {
        let app = router(&ServerConfig::default());
        let response = app
            .oneshot(post("/api/download", multipart_body("links.csv", "Content URL\na.io", None)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"datos_limpios.xlsx\""
        );
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        // xlsx is a zip archive
        assert_eq!(&bytes[..2], b"PK");
    }

    #[tokio::test]
    async fn test_download_unknown_format() {
        let app = router(&ServerConfig::default());
        let response = app
            .oneshot(post("/api/download?format=pdf", multipart_body("links.csv", "Content URL\na.io", None)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_run_pipeline_runs_job_off_the_runtime() {
        let runtime_thread = std::thread::current().id();
        let job_thread = run_pipeline(move || Ok(std::thread::current().id())).await.unwrap();
        assert_ne!(job_thread, runtime_thread);

        let (status, body) = run_pipeline(|| -> PipelineResult<()> {
            Err(ReadError::UnsupportedFileType("a.txt".into()).into())
        })
        .await
        .unwrap_err();
        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(body.0["kind"], "unsupportedFileType");
    }

    #[tokio::test]
    async fn test_run_pipeline_panic_is_internal_error() {
        let (status, body) = run_pipeline(|| -> PipelineResult<()> { panic!("boom") })
            .await
            .unwrap_err();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.0["status"], "error");
    }

    #[test]
    fn test_status_mapping() {
        let err: PipelineError = ReadError::EmptyFile.into();
        assert_eq!(status_for(&err), StatusCode::BAD_REQUEST);

        let err: PipelineError = ExportError::CsvBuffer("x".into()).into();
        assert_eq!(status_for(&err), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
