use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::validation::{
    ATTENDANCE_STATUSES, validate_choice, validate_date, validate_id, validate_page_size,
};
use super::{ApiError, ApiResponse, AppState, AttendanceDto, Page, PageQuery};
use crate::db::{AttendanceChanges, NewAttendance};

const fn default_status() -> &'static str {
    "present"
}

#[derive(Debug, Deserialize)]
pub struct CreateAttendanceRequest {
    pub student: i32,
    pub date: String,
    pub status: Option<String>,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateAttendanceRequest {
    pub student: Option<i32>,
    pub date: Option<String>,
    pub status: Option<String>,
    pub notes: Option<String>,
}

pub async fn list_attendance(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ApiResponse<Page<AttendanceDto>>>, ApiError> {
    let page_size = validate_page_size(query.page_size)?;

    let (items, total_pages) = state
        .store()
        .list_attendance(query.page, page_size)
        .await
        .map_err(ApiError::from_store)?;

    Ok(Json(ApiResponse::success(Page {
        items: items.into_iter().map(AttendanceDto::from).collect(),
        total_pages,
    })))
}

pub async fn get_attendance(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<AttendanceDto>>, ApiError> {
    let id = validate_id(id)?;

    let row = state
        .store()
        .get_attendance(id)
        .await
        .map_err(ApiError::from_store)?
        .ok_or_else(|| ApiError::not_found("Attendance record", id))?;

    Ok(Json(ApiResponse::success(AttendanceDto::from(row))))
}

pub async fn create_attendance(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateAttendanceRequest>,
) -> Result<Json<ApiResponse<AttendanceDto>>, ApiError> {
    let student_id = validate_id(payload.student)?;
    validate_date(&payload.date, "date")?;
    let status = payload.status.unwrap_or_else(|| default_status().to_string());
    validate_choice(&status, &ATTENDANCE_STATUSES, "status")?;

    if state
        .store()
        .get_student(student_id)
        .await
        .map_err(ApiError::from_store)?
        .is_none()
    {
        return Err(ApiError::validation(format!(
            "Student {student_id} does not exist"
        )));
    }

    let record = state
        .store()
        .create_attendance(NewAttendance {
            student_id,
            date: payload.date,
            status,
            notes: payload.notes,
        })
        .await
        .map_err(ApiError::from_store)?;

    let row = state
        .store()
        .get_attendance(record.id)
        .await
        .map_err(ApiError::from_store)?;

    Ok(Json(ApiResponse::success(row.map_or_else(
        || AttendanceDto::from_model(record),
        AttendanceDto::from,
    ))))
}

pub async fn update_attendance(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateAttendanceRequest>,
) -> Result<Json<ApiResponse<AttendanceDto>>, ApiError> {
    let id = validate_id(id)?;

    if let Some(date) = &payload.date {
        validate_date(date, "date")?;
    }
    if let Some(status) = &payload.status {
        validate_choice(status, &ATTENDANCE_STATUSES, "status")?;
    }

    let changes = AttendanceChanges {
        student_id: payload.student,
        date: payload.date,
        status: payload.status,
        notes: payload.notes,
    };

    let record = state
        .store()
        .update_attendance(id, changes)
        .await
        .map_err(ApiError::from_store)?
        .ok_or_else(|| ApiError::not_found("Attendance record", id))?;

    let row = state
        .store()
        .get_attendance(record.id)
        .await
        .map_err(ApiError::from_store)?;

    Ok(Json(ApiResponse::success(row.map_or_else(
        || AttendanceDto::from_model(record),
        AttendanceDto::from,
    ))))
}

pub async fn delete_attendance(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let id = validate_id(id)?;

    let deleted = state
        .store()
        .delete_attendance(id)
        .await
        .map_err(ApiError::from_store)?;

    if !deleted {
        return Err(ApiError::not_found("Attendance record", id));
    }

    Ok(Json(ApiResponse::success(())))
}
