//! Course handlers: list, retrieve, create, replace, partial update, delete.

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
    let courses = state.store.list_courses(&filter).await?;
    Ok(ok(courses))
}

pub async fn read(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id_str)?;
    let course = state
        .store
        .get_course(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("course {}", id)))?;
    Ok(ok(course))
}

pub async fn create(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(body) = body?;
    let input = RequestValidator::new_course(body)?;
    let course = state.store.create_course(input).await?;
    Ok(created(course))
}

pub async fn replace(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id_str)?;
    let Json(body) = body?;
    let input = RequestValidator::new_course(body)?;
    let course = state
        .store
        .update_course(id, input.into())
        .await?
        .ok_or_else(|| AppError::NotFound(format!("course {}", id)))?;
    Ok(ok(course))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id_str)?;
    let Json(body) = body?;
    let patch = RequestValidator::course_patch(body)?;
    let course = state
        .store
        .update_course(id, patch)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("course {}", id)))?;
    Ok(ok(course))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id_str)?;
    if !state.store.delete_course(id).await? {
        return Err(AppError::NotFound(format!("course {}", id)));
    }
    Ok(no_content())
}
