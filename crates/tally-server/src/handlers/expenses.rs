//! Expense catalogue handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, Request, State},
    Json,
};
use serde::Deserialize;

use super::ActiveQuery;
use crate::{parse_json_body, ApiResponse, AppError, AppState, SUCCESS};
use tally_core::models::Expense;

/// Request body for creating an expense
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateExpenseRequest {
    pub title: String,
    #[serde(default)]
    pub category_id: Option<i64>,
}

/// Request body for updating an expense
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateExpenseRequest {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub category_id: Option<i64>,
    pub active: bool,
}

/// GET /api/expenses?active=bool - List catalogue expenses
pub async fn list_expenses(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ActiveQuery>,
) -> Result<Json<ApiResponse<Vec<Expense>>>, AppError> {
    let expenses = state.db.list_expenses(params.flag()?)?;
    Ok(ApiResponse::data(SUCCESS, expenses))
}

/// GET /api/expense/:id - Get a single expense
pub async fn get_expense(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Expense>>, AppError> {
    let expense = state
        .db
        .get_expense(id)?
        .ok_or_else(|| AppError::not_found("Expense not found"))?;
    Ok(ApiResponse::data(SUCCESS, expense))
}

/// POST /api/expense - Add an expense to the catalogue
pub async fn create_expense(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Json<ApiResponse<Expense>>, AppError> {
    let req: CreateExpenseRequest = parse_json_body(request).await?;
    let expense = state.db.create_expense(req.title.trim(), req.category_id)?;
    Ok(ApiResponse::data(SUCCESS, expense))
}

/// PUT /api/expense - Update title, category or lifecycle flag
pub async fn update_expense(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Json<ApiResponse<Expense>>, AppError> {
    let req: UpdateExpenseRequest = parse_json_body(request).await?;
    let expense = state
        .db
        .update_expense(req.id, req.title.trim(), req.category_id, req.active)?;
    Ok(ApiResponse::data(SUCCESS, expense))
}

/// DELETE /api/expense/:id - Soft-delete an expense
pub async fn disable_expense(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    state.db.disable_expense(id)?;
    Ok(ApiResponse::ok(SUCCESS))
}
