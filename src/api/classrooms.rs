use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::auth::{CurrentUser, require_staff};
use super::validation::{validate_id, validate_name, validate_page_size};
use super::{ApiError, ApiResponse, AppState, ClassroomDto, Page, PageQuery};
use crate::db::ClassroomChanges;

#[derive(Debug, Deserialize)]
pub struct CreateClassroomRequest {
    pub name: String,
    #[serde(default)]
    pub section: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateClassroomRequest {
    pub name: Option<String>,
    pub section: Option<String>,
}

pub async fn list_classrooms(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ApiResponse<Page<ClassroomDto>>>, ApiError> {
    let page_size = validate_page_size(query.page_size)?;

    let (items, total_pages) = state
        .store()
        .list_classrooms(query.page, page_size)
        .await
        .map_err(ApiError::from_store)?;

    Ok(Json(ApiResponse::success(Page {
        items: items.into_iter().map(ClassroomDto::from).collect(),
        total_pages,
    })))
}

pub async fn get_classroom(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<ClassroomDto>>, ApiError> {
    let id = validate_id(id)?;

    let classroom = state
        .store()
        .get_classroom(id)
        .await
        .map_err(ApiError::from_store)?
        .ok_or_else(|| ApiError::not_found("Classroom", id))?;

    Ok(Json(ApiResponse::success(ClassroomDto::from(classroom))))
}

pub async fn create_classroom(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<CreateClassroomRequest>,
) -> Result<Json<ApiResponse<ClassroomDto>>, ApiError> {
    require_staff(&user)?;
    let name = validate_name(&payload.name, "Classroom name")?.to_string();

    let classroom = state
        .store()
        .create_classroom(name, payload.section)
        .await
        .map_err(ApiError::from_store)?;

    Ok(Json(ApiResponse::success(ClassroomDto::from(classroom))))
}

pub async fn update_classroom(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateClassroomRequest>,
) -> Result<Json<ApiResponse<ClassroomDto>>, ApiError> {
    require_staff(&user)?;
    let id = validate_id(id)?;

    let name = match payload.name {
        Some(name) => Some(validate_name(&name, "Classroom name")?.to_string()),
        None => None,
    };

    let changes = ClassroomChanges {
        name,
        section: payload.section,
    };

    let classroom = state
        .store()
        .update_classroom(id, changes)
        .await
        .map_err(ApiError::from_store)?
        .ok_or_else(|| ApiError::not_found("Classroom", id))?;

    Ok(Json(ApiResponse::success(ClassroomDto::from(classroom))))
}

pub async fn delete_classroom(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    require_staff(&user)?;
    let id = validate_id(id)?;

    let deleted = state
        .store()
        .delete_classroom(id)
        .await
        .map_err(ApiError::from_store)?;

    if !deleted {
        return Err(ApiError::not_found("Classroom", id));
    }

    Ok(Json(ApiResponse::success(())))
}
