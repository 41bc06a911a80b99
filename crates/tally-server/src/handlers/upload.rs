//! Statement upload handler

use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    Json,
};
use tracing::{debug, info};

use crate::{ApiResponse, AppError, AppState, MAX_UPLOAD_SIZE, SUCCESS};
use tally_core::{ingest_statement, CancelHandle, ExpenseMap, IngestContext};

/// Cancels the ingestion run if the request future is dropped first
struct CancelOnDrop(Option<CancelHandle>);

impl CancelOnDrop {
    fn disarm(mut self) {
        self.0 = None;
    }
}

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        if let Some(handle) = self.0.take() {
            debug!("Upload request dropped, cancelling ingestion");
            handle.cancel();
        }
    }
}

fn is_csv(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .map(|essence| essence.trim().eq_ignore_ascii_case("text/csv"))
        .unwrap_or(false)
}

/// POST /api/upload - Reconcile a statement CSV against the catalogue
///
/// Expects multipart form with:
/// - file: CSV file (required, `text/csv`, max 32MB)
///
/// Responds with every expense on the statement keyed by canonical title.
/// Titles not yet in the catalogue are inserted under the default category.
pub async fn upload_statement(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<ExpenseMap>>, AppError> {
    let mut file_data = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::bad_request(&format!("Failed to read form field: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let content_type = field.content_type().unwrap_or("").to_string();
        if !is_csv(&content_type) {
            return Err(AppError::unsupported_media_type(&format!(
                "Expected text/csv, got '{}'",
                content_type
            )));
        }

        let bytes = field.bytes().await.map_err(|_| {
            AppError::payload_too_large(&format!(
                "Failed to read file data (maximum size is {} MB)",
                MAX_UPLOAD_SIZE / 1024 / 1024
            ))
        })?;
        if bytes.len() > MAX_UPLOAD_SIZE {
            return Err(AppError::payload_too_large(&format!(
                "File too large. Maximum size is {} MB",
                MAX_UPLOAD_SIZE / 1024 / 1024
            )));
        }
        file_data = Some(bytes);
    }

    let file_data = file_data.ok_or_else(|| AppError::bad_request("Missing file field"))?;

    let ctx = IngestContext::with_timeout(state.config.store_timeout);
    let guard = CancelOnDrop(Some(ctx.cancel_handle()));
    let db = state.db.clone();
    let options = state.ingest_options();
    let size = file_data.len();

    let outcome = tokio::task::spawn_blocking(move || {
        ingest_statement(&file_data[..], &db, &options, &ctx)
    })
    .await
    .map_err(anyhow::Error::from)??;
    guard.disarm();

    info!(
        bytes = size,
        expenses = outcome.expenses.len(),
        matched = outcome.matched,
        inserted = outcome.inserted,
        "Statement reconciled"
    );

    Ok(ApiResponse::data(SUCCESS, outcome.expenses))
}
