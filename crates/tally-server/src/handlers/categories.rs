//! Category management handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, Request, State},
    Json,
};
use serde::Deserialize;

use super::ActiveQuery;
use crate::{parse_json_body, ApiResponse, AppError, AppState, SUCCESS};
use tally_core::models::Category;

/// Request body for creating a category
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateCategoryRequest {
    pub name: String,
}

/// Request body for updating a category
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateCategoryRequest {
    pub id: i64,
    pub name: String,
    pub active: bool,
}

/// GET /api/categories?active=bool - List categories
pub async fn list_categories(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ActiveQuery>,
) -> Result<Json<ApiResponse<Vec<Category>>>, AppError> {
    let categories = state.db.list_categories(params.flag()?)?;
    Ok(ApiResponse::data(SUCCESS, categories))
}

/// POST /api/category - Create a new, active category
pub async fn create_category(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Json<ApiResponse<Category>>, AppError> {
    let req: CreateCategoryRequest = parse_json_body(request).await?;
    let category = state.db.create_category(&req.name)?;
    Ok(ApiResponse::data(SUCCESS, category))
}

/// PUT /api/category - Rename or (de)activate a category
pub async fn update_category(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Json<ApiResponse<Category>>, AppError> {
    let req: UpdateCategoryRequest = parse_json_body(request).await?;
    let category = state.db.update_category(req.id, &req.name, req.active)?;
    Ok(ApiResponse::data(SUCCESS, category))
}

/// DELETE /api/category/:id - Soft-delete a category
pub async fn disable_category(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    state.db.disable_category(id)?;
    Ok(ApiResponse::ok(SUCCESS))
}
