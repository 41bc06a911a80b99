//! Tally Web Server
//!
//! Axum-based REST API for statement uploads and catalogue management.
//!
//! Every response body is an envelope: `{"error": bool, "message": string, "data"?: any}`.
//!
//! Security features:
//! - Restrictive CORS policy
//! - Upload size and content-type validation
//! - Sanitized error responses (store failures are logged, not returned)

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{DefaultBodyLimit, Request},
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{de::DeserializeOwned, Serialize};
use tower_http::{cors::CorsLayer, set_header::SetResponseHeaderLayer, trace::TraceLayer};
use tracing::{error, info, warn};

use tally_core::db::Database;
use tally_core::{IngestOptions, DEFAULT_CATEGORY};

mod handlers;

/// Maximum statement upload size (32 MB)
pub const MAX_UPLOAD_SIZE: usize = 32 * 1024 * 1024;

/// Maximum JSON request body size
pub const MAX_JSON_BODY: usize = 64 * 1024;

/// Default bound on one ingestion run, store waits included
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);

/// Server configuration
#[derive(Clone)]
pub struct ServerConfig {
    /// Allowed CORS origins (empty = same-origin only)
    pub allowed_origins: Vec<String>,
    /// Category assigned to expenses seen for the first time
    pub default_category: String,
    /// Deadline for each upload's reconciliation and batch insert
    pub store_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![],
            default_category: DEFAULT_CATEGORY.to_string(),
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }
}

/// Shared application state
pub struct AppState {
    pub db: Database,
    pub config: ServerConfig,
}

impl AppState {
    pub fn ingest_options(&self) -> IngestOptions {
        IngestOptions {
            default_category: self.config.default_category.clone(),
            ..Default::default()
        }
    }
}

/// Response envelope shared by every endpoint
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub error: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn data(message: &str, data: T) -> Json<Self> {
        Json(Self {
            error: false,
            message: message.to_string(),
            data: Some(data),
        })
    }
}

impl ApiResponse<()> {
    pub fn ok(message: &str) -> Json<Self> {
        Json(Self {
            error: false,
            message: message.to_string(),
            data: None,
        })
    }
}

pub(crate) const SUCCESS: &str = "Successful request";

/// Read a JSON request body, rejecting unknown or malformed input with 400
pub(crate) async fn parse_json_body<T: DeserializeOwned>(request: Request) -> Result<T, AppError> {
    let bytes = axum::body::to_bytes(request.into_body(), MAX_JSON_BODY)
        .await
        .map_err(|_| AppError::bad_request("Invalid request body"))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| AppError::bad_request(&format!("Invalid JSON: {}", e)))
}

/// Create the application router
pub fn create_router(db: Database, config: ServerConfig) -> Router {
    let state = Arc::new(AppState {
        db,
        config: config.clone(),
    });

    let api_routes = Router::new()
        .route(
            "/upload",
            post(handlers::upload_statement)
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_SIZE + MAX_JSON_BODY)),
        )
        // Categories
        .route("/categories", get(handlers::list_categories))
        .route(
            "/category",
            post(handlers::create_category).put(handlers::update_category),
        )
        .route("/category/:id", delete(handlers::disable_category))
        // Expenses
        .route("/expenses", get(handlers::list_expenses))
        .route(
            "/expense",
            post(handlers::create_expense).put(handlers::update_expense),
        )
        .route(
            "/expense/:id",
            get(handlers::get_expense).delete(handlers::disable_expense),
        );

    // Build CORS layer
    let cors = if config.allowed_origins.is_empty() {
        // Restrictive default: only allow same-origin
        CorsLayer::new()
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::CONTENT_TYPE])
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::CONTENT_TYPE])
    };

    Router::new()
        .route("/healthcheck", get(handlers::health_check))
        .nest("/api", api_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // Security headers
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::CONTENT_SECURITY_POLICY,
            HeaderValue::from_static("default-src 'none'; frame-ancestors 'none'"),
        ))
}

/// Start the server
pub async fn serve(db: Database, host: &str, port: u16, config: ServerConfig) -> anyhow::Result<()> {
    if db.get_category_by_name(&config.default_category)?.is_none() {
        warn!(
            "Default category '{}' is missing; uploads with new expenses will fail",
            config.default_category
        );
    }

    let app = create_router(db, config);
    let addr = format!("{}:{}", host, port);

    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============================================================================
// Error Handling
// ============================================================================

/// Application error type with proper HTTP status codes
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
    internal: Option<anyhow::Error>,
}

impl AppError {
    fn new(status: StatusCode, msg: &str) -> Self {
        Self {
            status,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn bad_request(msg: &str) -> Self {
        Self::new(StatusCode::BAD_REQUEST, msg)
    }

    pub fn not_found(msg: &str) -> Self {
        Self::new(StatusCode::NOT_FOUND, msg)
    }

    pub fn unsupported_media_type(msg: &str) -> Self {
        Self::new(StatusCode::UNSUPPORTED_MEDIA_TYPE, msg)
    }

    pub fn payload_too_large(msg: &str) -> Self {
        Self::new(StatusCode::PAYLOAD_TOO_LARGE, msg)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the full internal error if present
        if let Some(err) = &self.internal {
            error!(error = %err, "Internal error");
        }

        let body = Json(serde_json::json!({
            "error": true,
            "message": self.message
        }));

        (self.status, body).into_response()
    }
}

impl From<tally_core::Error> for AppError {
    fn from(err: tally_core::Error) -> Self {
        use tally_core::Error as E;

        let status = match &err {
            E::Parse { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            E::InvalidData(_) => StatusCode::BAD_REQUEST,
            E::NotFound(_) => StatusCode::NOT_FOUND,
            E::Conflict(_) => StatusCode::CONFLICT,
            E::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            // Client went away; nobody reads this response
            E::Cancelled(_) => {
                StatusCode::from_u16(499).unwrap_or(StatusCode::SERVICE_UNAVAILABLE)
            }
            E::Precondition(_) => StatusCode::INTERNAL_SERVER_ERROR,
            E::Database(_) | E::Pool(_) | E::Csv(_) | E::Io(_) => {
                return anyhow::Error::from(err).into();
            }
        };

        if status.is_server_error() {
            error!(error = %err, "Request failed");
        } else {
            warn!(error = %err, "Request rejected");
        }

        Self {
            status,
            message: err.to_string(),
            internal: None,
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            // Return generic message to client
            message: "An internal error occurred".to_string(),
            // Keep full error for logging
            internal: Some(err),
        }
    }
}
