use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::Json;
use http::StatusCode;

use crate::app::AppState;
use crate::error::{AppError, AppResult};
use crate::models::{ItemExport, ItemModel};
use crate::services::{item_id, json_body};
use crate::validation::{CreateItemPayload, UpdateItemPayload};

/// GET /items
pub async fn list_items(State(state): State<AppState>) -> AppResult<Json<Vec<ItemModel>>> {
    let items = state.items.list().await?;
    Ok(Json(items))
}

/// POST /items
pub async fn create_item(
    State(state): State<AppState>,
    payload: Result<Json<CreateItemPayload>, JsonRejection>,
) -> AppResult<(StatusCode, Json<ItemModel>)> {
    let new_item = json_body(payload)?.validate()?;
    let item = state.items.create(new_item).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// GET /items/{id}
pub async fn get_item(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> AppResult<Json<ItemModel>> {
    let id = item_id(id)?;
    match state.items.get(id).await? {
        Some(item) => Ok(Json(item)),
        None => Err(AppError::item_not_found()),
    }
}

/// PATCH /items/{id}
pub async fn update_item(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<UpdateItemPayload>, JsonRejection>,
) -> AppResult<Json<ItemModel>> {
    let id = item_id(id)?;
    let changes = json_body(payload)?.validate()?;
    state
        .items
        .update(id, changes)
        .await?
        .map(Json)
        .ok_or_else(AppError::item_not_found)
}

/// DELETE /items/{id}
pub async fn delete_item(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> AppResult<StatusCode> {
    let id = item_id(id)?;
    if state.items.delete(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::item_not_found())
    }
}

/// GET /items/{id}/export
pub async fn export_item(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> AppResult<Json<ItemExport>> {
    let id = item_id(id)?;
    let item = state
        .items
        .get(id)
        .await?
        .ok_or_else(AppError::item_not_found)?;
    Ok(Json(ItemExport::from(item)))
}
