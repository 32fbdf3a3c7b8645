use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::validation::{validate_date, validate_id, validate_name, validate_page_size};
use super::{ApiError, ApiResponse, AppState, Page, PageQuery, StudentDto};
use crate::db::{NewStudent, StudentChanges};

#[derive(Debug, Deserialize)]
pub struct CreateStudentRequest {
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: String,
    pub roll_number: String,
    pub classroom: i32,
    #[serde(default)]
    pub guardian_name: String,
    #[serde(default)]
    pub contact_phone: String,
    #[serde(default)]
    pub contact_email: String,
    #[serde(default)]
    pub address: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStudentRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub date_of_birth: Option<String>,
    pub roll_number: Option<String>,
    pub classroom: Option<i32>,
    pub guardian_name: Option<String>,
    pub contact_phone: Option<String>,
    pub contact_email: Option<String>,
    pub address: Option<String>,
}

pub async fn list_students(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ApiResponse<Page<StudentDto>>>, ApiError> {
    let page_size = validate_page_size(query.page_size)?;

    let (items, total_pages) = state
        .store()
        .list_students(query.page, page_size)
        .await
        .map_err(ApiError::from_store)?;

    Ok(Json(ApiResponse::success(Page {
        items: items
            .into_iter()
            .map(|(student, classroom)| StudentDto::from_parts(student, classroom))
            .collect(),
        total_pages,
    })))
}

pub async fn get_student(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<StudentDto>>, ApiError> {
    let id = validate_id(id)?;

    let (student, classroom) = state
        .store()
        .get_student(id)
        .await
        .map_err(ApiError::from_store)?
        .ok_or_else(|| ApiError::not_found("Student", id))?;

    Ok(Json(ApiResponse::success(StudentDto::from_parts(
        student, classroom,
    ))))
}

pub async fn create_student(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateStudentRequest>,
) -> Result<Json<ApiResponse<StudentDto>>, ApiError> {
    let first_name = validate_name(&payload.first_name, "First name")?.to_string();
    let last_name = validate_name(&payload.last_name, "Last name")?.to_string();
    validate_date(&payload.date_of_birth, "date of birth")?;
    let classroom_id = validate_id(payload.classroom)?;

    if payload.roll_number.trim().is_empty() {
        return Err(ApiError::validation("Roll number cannot be empty"));
    }

    // Referenced classroom must exist; a missing id is a validation problem
    // for the caller, not a 404 on the student resource.
    if state
        .store()
        .get_classroom(classroom_id)
        .await
        .map_err(ApiError::from_store)?
        .is_none()
    {
        return Err(ApiError::validation(format!(
            "Classroom {classroom_id} does not exist"
        )));
    }

    let student = state
        .store()
        .create_student(NewStudent {
            first_name,
            last_name,
            date_of_birth: payload.date_of_birth,
            roll_number: payload.roll_number,
            classroom_id,
            guardian_name: payload.guardian_name,
            contact_phone: payload.contact_phone,
            contact_email: payload.contact_email,
            address: payload.address,
        })
        .await
        .map_err(ApiError::from_store)?;

    let classroom = state
        .store()
        .get_classroom(student.classroom_id)
        .await
        .map_err(ApiError::from_store)?;

    Ok(Json(ApiResponse::success(StudentDto::from_parts(
        student, classroom,
    ))))
}

pub async fn update_student(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateStudentRequest>,
) -> Result<Json<ApiResponse<StudentDto>>, ApiError> {
    let id = validate_id(id)?;

    if let Some(date) = &payload.date_of_birth {
        validate_date(date, "date of birth")?;
    }
    if let Some(classroom_id) = payload.classroom {
        validate_id(classroom_id)?;
    }

    let changes = StudentChanges {
        first_name: payload.first_name,
        last_name: payload.last_name,
        date_of_birth: payload.date_of_birth,
        roll_number: payload.roll_number,
        classroom_id: payload.classroom,
        guardian_name: payload.guardian_name,
        contact_phone: payload.contact_phone,
        contact_email: payload.contact_email,
        address: payload.address,
    };

    let student = state
        .store()
        .update_student(id, changes)
        .await
        .map_err(ApiError::from_store)?
        .ok_or_else(|| ApiError::not_found("Student", id))?;

    let classroom = state
        .store()
        .get_classroom(student.classroom_id)
        .await
        .map_err(ApiError::from_store)?;

    Ok(Json(ApiResponse::success(StudentDto::from_parts(
        student, classroom,
    ))))
}

pub async fn delete_student(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let id = validate_id(id)?;

    let deleted = state
        .store()
        .delete_student(id)
        .await
        .map_err(ApiError::from_store)?;

    if !deleted {
        return Err(ApiError::not_found("Student", id));
    }

    Ok(Json(ApiResponse::success(())))
}
