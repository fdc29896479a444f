//! Student handlers. Course membership is read-only here; it is changed
//! through the course endpoints.

use crate::error::AppError;
use crate::handlers::parse_id;
use crate::response::{created, no_content, ok};
use crate::service::RequestValidator;
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde_json::Value;
use std::collections::HashMap;

pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let filter = RequestValidator::list_filter(&params)?;
    Ok(ok(state.store.list_students(&filter).await?))
}

pub async fn read(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id_str)?;
    let student = state
        .store
        .get_student(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("student {}", id)))?;
    Ok(ok(student))
}

pub async fn create(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(body) = body?;
    let input = RequestValidator::new_student(body)?;
    Ok(created(state.store.create_student(input).await?))
}

pub async fn replace(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id_str)?;
    let Json(body) = body?;
    let input = RequestValidator::new_student(body)?;
    let student = state
        .store
        .update_student(id, input.into())
        .await?
        .ok_or_else(|| AppError::NotFound(format!("student {}", id)))?;
    Ok(ok(student))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id_str)?;
    let Json(body) = body?;
    let patch = RequestValidator::student_patch(body)?;
    let student = state
        .store
        .update_student(id, patch)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("student {}", id)))?;
    Ok(ok(student))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id_str)?;
    if !state.store.delete_student(id).await? {
        return Err(AppError::NotFound(format!("student {}", id)));
    }
    Ok(no_content())
}
