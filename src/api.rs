//! HTTP surface for docbrief.
//!
//! This module exposes a compact Axum router:
//!
//! - `POST /summarize` – Summarize raw text: `{ "text": "..." }` -> `{ "summary": {...} }`.
//! - `POST /documents` – Upload a file (multipart field `file`); it is staged, summarized, and
//!   catalogued. Returns the document record with status `201`.
//! - `GET /documents` – List catalogued documents, newest first. Supports `status`, `category`,
//!   `search`, `page`, and `limit` query parameters.
//! - `GET /documents/:id` / `DELETE /documents/:id` – Fetch or remove one document.
//! - `GET /stats` – Catalogue totals by status, category, and urgency.
//! - `GET /metrics` – Summary counters per degradation tier.
//! - `GET /health` – Liveness probe.
//! - `GET /commands` – Machine-readable command catalog for quick discovery by tools/hosts.
//!
//! Errors are returned as `{ "error": message }`. Internal failures are logged and reported
//! with a generic message.

use crate::catalogue::{
    DocumentFilter, DocumentPage, DocumentRecord, DocumentStatus, Page, UsageStats,
};
use crate::metrics::MetricsSnapshot;
use crate::service::{DocumentApi, EXTRACTION_FAILED_MESSAGE, ServiceError, Upload};
use crate::summarization::DocumentSummary;
use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, Query, State, multipart::MultipartError},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

/// Room for multipart framing on top of the file itself.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Build the HTTP router. Request bodies are capped a little above `max_upload_bytes`.
pub fn create_router<S>(service: Arc<S>, max_upload_bytes: usize) -> Router
where
    S: DocumentApi + 'static,
{
    Router::new()
        .route("/summarize", post(summarize_text::<S>))
        .route(
            "/documents",
            get(list_documents::<S>).post(upload_document::<S>),
        )
        .route(
            "/documents/:id",
            get(get_document::<S>).delete(delete_document::<S>),
        )
        .route("/stats", get(get_stats::<S>))
        .route("/metrics", get(get_metrics::<S>))
        .route("/health", get(health))
        .route("/commands", get(get_commands))
        .layer(DefaultBodyLimit::max(
            max_upload_bytes.saturating_add(MULTIPART_OVERHEAD_BYTES),
        ))
        .with_state(service)
}

/// Request body for `POST /summarize`.
#[derive(Deserialize)]
struct SummarizeRequest {
    /// Text to summarize.
    text: String,
}

/// Response body for `POST /summarize`.
#[derive(Serialize)]
struct SummarizeResponse {
    summary: DocumentSummary,
}

/// Summarize raw text. Always answers with a summary unless the text is blank.
async fn summarize_text<S>(
    State(service): State<Arc<S>>,
    Json(request): Json<SummarizeRequest>,
) -> Result<Json<SummarizeResponse>, AppError>
where
    S: DocumentApi,
{
    if request.text.trim().is_empty() {
        return Err(AppError::BadRequest("text must not be empty".into()));
    }
    let summary = service.summarize_text(&request.text).await;
    tracing::info!(
        chars = request.text.chars().count(),
        tier = ?summary.meta.tier,
        "Summarize request completed"
    );
    Ok(Json(SummarizeResponse { summary }))
}

/// Accept a multipart upload and run it through the pipeline.
async fn upload_document<S>(
    State(service): State<Arc<S>>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<DocumentRecord>), AppError>
where
    S: DocumentApi,
{
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field
            .file_name()
            .map(str::to_string)
            .unwrap_or_else(|| "upload".to_string());
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await?;

        let record = service
            .ingest(Upload {
                filename,
                content_type,
                bytes: bytes.to_vec(),
            })
            .await?;
        return Ok((StatusCode::CREATED, Json(record)));
    }

    Err(AppError::BadRequest(
        "multipart field 'file' is required".into(),
    ))
}

/// Query parameters for `GET /documents`.
#[derive(Deserialize, Default)]
struct ListQuery {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    search: Option<String>,
    #[serde(default)]
    page: Option<usize>,
    #[serde(default)]
    limit: Option<usize>,
}

/// List catalogued documents.
async fn list_documents<S>(
    State(service): State<Arc<S>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<DocumentPage>, AppError>
where
    S: DocumentApi,
{
    let status = query
        .status
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::parse::<DocumentStatus>)
        .transpose()
        .map_err(AppError::BadRequest)?;
    let filter = DocumentFilter::new(status, query.category, query.search);
    let page = service
        .list_documents(filter, Page::new(query.page, query.limit))
        .await?;
    Ok(Json(page))
}

/// Fetch one document.
async fn get_document<S>(
    State(service): State<Arc<S>>,
    Path(id): Path<String>,
) -> Result<Json<DocumentRecord>, AppError>
where
    S: DocumentApi,
{
    let id = parse_id(&id)?;
    Ok(Json(service.get_document(id).await?))
}

/// Remove one document and its staged original.
async fn delete_document<S>(
    State(service): State<Arc<S>>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError>
where
    S: DocumentApi,
{
    let id = parse_id(&id)?;
    service.delete_document(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn parse_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::NotFound)
}

/// Catalogue statistics.
async fn get_stats<S>(State(service): State<Arc<S>>) -> Result<Json<UsageStats>, AppError>
where
    S: DocumentApi,
{
    Ok(Json(service.usage_stats().await?))
}

/// Return pipeline counters per degradation tier.
async fn get_metrics<S>(State(service): State<Arc<S>>) -> Json<MetricsSnapshot>
where
    S: DocumentApi,
{
    Json(service.metrics_snapshot())
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Descriptor for a single command in the discovery catalog.
#[derive(Serialize)]
struct CommandDescriptor {
    name: &'static str,
    method: &'static str,
    path: &'static str,
    description: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_example: Option<serde_json::Value>,
}

/// Response body for `GET /commands`.
#[derive(Serialize)]
struct CommandsResponse {
    commands: Vec<CommandDescriptor>,
}

/// Enumerate supported HTTP commands for discovery/UX in hosts and tools.
async fn get_commands() -> Json<CommandsResponse> {
    Json(CommandsResponse {
        commands: vec![
            CommandDescriptor {
                name: "summarize",
                method: "POST",
                path: "/summarize",
                description: "Summarize raw text into the structured summary schema. Falls back to a local summary when the model is unavailable; `_meta.tier` tells which path produced it.",
                request_example: Some(json!({
                    "text": "Metro station closes for maintenance. Staff must relocate."
                })),
            },
            CommandDescriptor {
                name: "upload_document",
                method: "POST",
                path: "/documents",
                description: "Upload a PDF, Word, Excel, or plain-text file as multipart field `file`. Returns the catalogued document with its summary.",
                request_example: None,
            },
            CommandDescriptor {
                name: "list_documents",
                method: "GET",
                path: "/documents",
                description: "List catalogued documents newest first. Query: status, category, search, page, limit (max 100).",
                request_example: Some(json!({
                    "status": "processed",
                    "category": "operations",
                    "search": "station",
                    "page": 1,
                    "limit": 10
                })),
            },
            CommandDescriptor {
                name: "get_document",
                method: "GET",
                path: "/documents/:id",
                description: "Return one catalogued document.",
                request_example: None,
            },
            CommandDescriptor {
                name: "delete_document",
                method: "DELETE",
                path: "/documents/:id",
                description: "Remove a document and its stored original.",
                request_example: None,
            },
            CommandDescriptor {
                name: "stats",
                method: "GET",
                path: "/stats",
                description: "Return catalogue totals by status, category, and urgency with average confidence.",
                request_example: None,
            },
            CommandDescriptor {
                name: "metrics",
                method: "GET",
                path: "/metrics",
                description: "Return summary counters per degradation tier and extraction failures.",
                request_example: None,
            },
        ],
    })
}

enum AppError {
    Service(ServiceError),
    BadRequest(String),
    PayloadTooLarge(String),
    NotFound,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            AppError::PayloadTooLarge(message) => (StatusCode::PAYLOAD_TOO_LARGE, message),
            AppError::NotFound => (StatusCode::NOT_FOUND, "Document not found".to_string()),
            AppError::Service(error) => match error {
                ServiceError::UnsupportedFormat(_) => (StatusCode::BAD_REQUEST, error.to_string()),
                ServiceError::TooLarge { .. } => (StatusCode::PAYLOAD_TOO_LARGE, error.to_string()),
                ServiceError::NotFound(_) => {
                    (StatusCode::NOT_FOUND, "Document not found".to_string())
                }
                ServiceError::Extraction(_) => {
                    tracing::error!(error = %error, "Upload failed during extraction");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        EXTRACTION_FAILED_MESSAGE.to_string(),
                    )
                }
                ServiceError::Storage(_) => {
                    tracing::error!(error = %error, "Document storage failed");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Internal server error".to_string(),
                    )
                }
            },
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<ServiceError> for AppError {
    fn from(inner: ServiceError) -> Self {
        Self::Service(inner)
    }
}

impl From<MultipartError> for AppError {
    fn from(error: MultipartError) -> Self {
        if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::PayloadTooLarge("Upload exceeds the size limit".into())
        } else {
            Self::BadRequest(format!("Invalid multipart body: {}", error.body_text()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{create_router, get_commands};
    use crate::catalogue::{
        DocumentFilter, DocumentPage, DocumentRecord, DocumentStatus, Page, UsageStats,
        compute_usage_stats,
    };
    use crate::extraction::ExtractionError;
    use crate::metrics::MetricsSnapshot;
    use crate::service::{DocumentApi, ServiceError, Upload, resolve_format};
    use crate::summarization::{DocumentSummary, SummaryMeta, SummaryTier};
    use async_trait::async_trait;
    use axum::{
        body::{Body, to_bytes},
        http::{Method, Request, StatusCode},
    };
    use serde_json::{Value, json};
    use std::path::PathBuf;
    use std::sync::Arc;
    use time::OffsetDateTime;
    use tokio::sync::Mutex;
    use tower::ServiceExt;
    use uuid::Uuid;

    const BOUNDARY: &str = "docbrief-test-boundary";

    #[tokio::test]
    async fn commands_catalog_exposes_summarize_endpoint() {
        let response = get_commands().await;
        let commands = response.0.commands;
        let summarize = commands
            .iter()
            .find(|cmd| cmd.name == "summarize")
            .expect("summarize command present");

        assert_eq!(summarize.method, "POST");
        assert_eq!(summarize.path, "/summarize");
        assert!(summarize.description.to_lowercase().contains("summar"));

        // ensure catalog exposes multiple commands for host discovery
        assert!(commands.len() >= 5);
    }

    #[tokio::test]
    async fn summarize_route_returns_summary() {
        let service = Arc::new(StubDocumentService::default());
        let app = create_router(service.clone(), 1024);

        let response = app
            .oneshot(json_request(
                Method::POST,
                "/summarize",
                json!({"text": "Metro station closes."}),
            ))
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["summary"]["executiveSummary"], "Metro station closes.");
        assert_eq!(body["summary"]["_meta"]["tier"], "local_heuristic");
        assert_eq!(service.summarized().await, ["Metro station closes."]);
    }

    #[tokio::test]
    async fn blank_summarize_text_is_a_bad_request() {
        let service = Arc::new(StubDocumentService::default());
        let app = create_router(service.clone(), 1024);

        let response = app
            .oneshot(json_request(Method::POST, "/summarize", json!({"text": "   "})))
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["error"].as_str().expect("error").contains("empty"));
        assert!(service.summarized().await.is_empty());
    }

    #[tokio::test]
    async fn multipart_upload_is_created() {
        let service = Arc::new(StubDocumentService::default());
        let app = create_router(service.clone(), 1024);

        let response = app
            .oneshot(multipart_request("memo.txt", "text/plain", b"Short memo."))
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        assert_eq!(body["filename"], "memo.txt");
        assert_eq!(body["status"], "processed");

        let uploads = service.uploads.lock().await.clone();
        assert_eq!(uploads.len(), 1);
        assert_eq!(uploads[0].content_type.as_deref(), Some("text/plain"));
        assert_eq!(uploads[0].bytes, b"Short memo.");
    }

    #[tokio::test]
    async fn upload_errors_map_to_status_codes() {
        let cases = [
            ("slides.pptx", "application/vnd.ms-powerpoint", StatusCode::BAD_REQUEST),
            ("huge.txt", "text/plain", StatusCode::PAYLOAD_TOO_LARGE),
            ("broken.pdf", "application/pdf", StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (filename, mime, expected) in cases {
            let app = create_router(Arc::new(StubDocumentService::default()), 1024);
            let response = app
                .oneshot(multipart_request(filename, mime, b"bytes"))
                .await
                .expect("router response");
            assert_eq!(response.status(), expected, "{filename}");
            let body = body_json(response).await;
            let message = body["error"].as_str().expect("error message");
            if expected == StatusCode::INTERNAL_SERVER_ERROR {
                assert_eq!(message, "Text extraction failed");
            }
        }
    }

    #[tokio::test]
    async fn missing_file_field_is_a_bad_request() {
        let app = create_router(Arc::new(StubDocumentService::default()), 1024);
        let body = format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"note\"\r\n\r\nhello\r\n--{BOUNDARY}--\r\n");
        let request = Request::builder()
            .method(Method::POST)
            .uri("/documents")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .expect("request");

        let response = app.oneshot(request).await.expect("router response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn list_route_passes_filter_and_page() {
        let service = Arc::new(StubDocumentService::default());
        let app = create_router(service.clone(), 1024);

        let response = app
            .oneshot(empty_request(
                Method::GET,
                "/documents?status=processed&category=Ops&search=station&page=2&limit=500",
            ))
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["page"], 2);
        assert_eq!(body["limit"], 100);

        let (filter, page) = service.listed.lock().await.clone().expect("list call");
        assert_eq!(filter.status, Some(DocumentStatus::Processed));
        assert_eq!(filter.category.as_deref(), Some("ops"));
        assert_eq!(filter.search.as_deref(), Some("station"));
        assert_eq!(page, Page { number: 2, limit: 100 });
    }

    #[tokio::test]
    async fn unknown_status_filter_is_a_bad_request() {
        let app = create_router(Arc::new(StubDocumentService::default()), 1024);
        let response = app
            .oneshot(empty_request(Method::GET, "/documents?status=archived"))
            .await
            .expect("router response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_and_malformed_ids_are_not_found() {
        for uri in [format!("/documents/{}", Uuid::new_v4()), "/documents/not-a-uuid".to_string()] {
            let app = create_router(Arc::new(StubDocumentService::default()), 1024);
            let response = app
                .oneshot(empty_request(Method::GET, &uri))
                .await
                .expect("router response");
            assert_eq!(response.status(), StatusCode::NOT_FOUND);
            let body = body_json(response).await;
            assert_eq!(body["error"], "Document not found");
        }
    }

    #[tokio::test]
    async fn delete_route_returns_no_content() {
        let service = Arc::new(StubDocumentService::default());
        let app = create_router(service.clone(), 1024);

        let response = app
            .oneshot(empty_request(
                Method::DELETE,
                &format!("/documents/{}", StubDocumentService::KNOWN_ID),
            ))
            .await
            .expect("router response");
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn health_stats_and_metrics_respond() {
        let service = Arc::new(StubDocumentService::default());

        let health = create_router(service.clone(), 1024)
            .oneshot(empty_request(Method::GET, "/health"))
            .await
            .expect("health");
        assert_eq!(body_json(health).await, json!({"status": "ok"}));

        let stats = create_router(service.clone(), 1024)
            .oneshot(empty_request(Method::GET, "/stats"))
            .await
            .expect("stats");
        assert_eq!(stats.status(), StatusCode::OK);
        assert_eq!(body_json(stats).await["total_documents"], 0);

        let metrics = create_router(service, 1024)
            .oneshot(empty_request(Method::GET, "/metrics"))
            .await
            .expect("metrics");
        let body = body_json(metrics).await;
        assert_eq!(body["local_summaries"], 1);
        assert_eq!(body["summaries_total"], 1);
    }

    fn json_request(method: Method, uri: &str, payload: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(payload.to_string()))
            .expect("request")
    }

    fn empty_request(method: Method, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .expect("request")
    }

    fn multipart_request(filename: &str, mime: &str, bytes: &[u8]) -> Request<Body> {
        let mut body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: {mime}\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method(Method::POST)
            .uri("/documents")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .expect("request")
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        serde_json::from_slice(&body).expect("json body")
    }

    #[derive(Default)]
    struct StubDocumentService {
        summarized: Mutex<Vec<String>>,
        uploads: Mutex<Vec<Upload>>,
        listed: Mutex<Option<(DocumentFilter, Page)>>,
    }

    impl StubDocumentService {
        const KNOWN_ID: Uuid = Uuid::from_u128(0x5eed);

        async fn summarized(&self) -> Vec<String> {
            self.summarized.lock().await.clone()
        }

        fn summary(text: &str) -> DocumentSummary {
            let mut summary = DocumentSummary::empty(SummaryMeta::fallback(
                SummaryTier::LocalHeuristic,
                None,
                None,
            ));
            summary.executive_summary = text.to_string();
            summary
        }
    }

    #[async_trait]
    impl DocumentApi for StubDocumentService {
        async fn summarize_text(&self, text: &str) -> DocumentSummary {
            self.summarized.lock().await.push(text.to_string());
            Self::summary(text)
        }

        async fn ingest(&self, upload: Upload) -> Result<DocumentRecord, ServiceError> {
            self.uploads.lock().await.push(upload.clone());
            let format = resolve_format(&upload.filename, upload.content_type.as_deref())?;
            if upload.filename.starts_with("huge") {
                return Err(ServiceError::TooLarge {
                    size: 1 << 30,
                    limit: 1024,
                });
            }
            if upload.filename.starts_with("broken") {
                return Err(ServiceError::Extraction(ExtractionError::Failed {
                    format,
                    message: "xref table missing".into(),
                }));
            }
            Ok(DocumentRecord {
                id: Self::KNOWN_ID,
                filename: upload.filename,
                format,
                size_bytes: upload.bytes.len() as u64,
                checksum: String::new(),
                stored_path: PathBuf::from("uploads/stub"),
                status: DocumentStatus::Processed,
                uploaded_at: OffsetDateTime::now_utc(),
                processed_at: Some(OffsetDateTime::now_utc()),
                summary: Some(Self::summary("stub")),
                error: None,
            })
        }

        async fn get_document(&self, id: Uuid) -> Result<DocumentRecord, ServiceError> {
            Err(ServiceError::NotFound(id))
        }

        async fn list_documents(
            &self,
            filter: DocumentFilter,
            page: Page,
        ) -> Result<DocumentPage, ServiceError> {
            *self.listed.lock().await = Some((filter, page));
            Ok(DocumentPage {
                documents: Vec::new(),
                total: 0,
                page: page.number,
                limit: page.limit,
            })
        }

        async fn delete_document(&self, id: Uuid) -> Result<(), ServiceError> {
            if id == Self::KNOWN_ID {
                Ok(())
            } else {
                Err(ServiceError::NotFound(id))
            }
        }

        async fn usage_stats(&self) -> Result<UsageStats, ServiceError> {
            Ok(compute_usage_stats(&[]))
        }

        fn metrics_snapshot(&self) -> MetricsSnapshot {
            MetricsSnapshot {
                summaries_total: 1,
                model_summaries: 0,
                unparsed_responses: 0,
                local_summaries: 1,
                raw_excerpts: 0,
                extraction_failures: 0,
            }
        }
    }
}
