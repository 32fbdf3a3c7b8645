use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::validation::{validate_id, validate_non_negative, validate_page_size};
use super::{ApiError, ApiResponse, AppState, GradeDto, Page, PageQuery};
use crate::db::{GradeChanges, NewGrade};

const DEFAULT_MAX_SCORE: f64 = 100.0;

#[derive(Debug, Deserialize)]
pub struct CreateGradeRequest {
    pub student: i32,
    pub subject: String,
    pub term: String,
    pub score: f64,
    pub max_score: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateGradeRequest {
    pub student: Option<i32>,
    pub subject: Option<String>,
    pub term: Option<String>,
    pub score: Option<f64>,
    pub max_score: Option<f64>,
}

pub async fn list_grades(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ApiResponse<Page<GradeDto>>>, ApiError> {
    let page_size = validate_page_size(query.page_size)?;

    let (items, total_pages) = state
        .store()
        .list_grades(query.page, page_size)
        .await
        .map_err(ApiError::from_store)?;

    Ok(Json(ApiResponse::success(Page {
        items: items.into_iter().map(GradeDto::from).collect(),
        total_pages,
    })))
}

pub async fn get_grade(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<GradeDto>>, ApiError> {
    let id = validate_id(id)?;

    let row = state
        .store()
        .get_grade(id)
        .await
        .map_err(ApiError::from_store)?
        .ok_or_else(|| ApiError::not_found("Grade", id))?;

    Ok(Json(ApiResponse::success(GradeDto::from(row))))
}

pub async fn create_grade(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateGradeRequest>,
) -> Result<Json<ApiResponse<GradeDto>>, ApiError> {
    let student_id = validate_id(payload.student)?;
    let score = validate_non_negative(payload.score, "score")?;
    let max_score =
        validate_non_negative(payload.max_score.unwrap_or(DEFAULT_MAX_SCORE), "max score")?;

    if payload.subject.trim().is_empty() {
        return Err(ApiError::validation("Subject cannot be empty"));
    }
    if payload.term.trim().is_empty() {
        return Err(ApiError::validation("Term cannot be empty"));
    }

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
        .create_grade(NewGrade {
            student_id,
            subject: payload.subject,
            term: payload.term,
            score,
            max_score,
        })
        .await
        .map_err(ApiError::from_store)?;

    let row = state
        .store()
        .get_grade(record.id)
        .await
        .map_err(ApiError::from_store)?;

    Ok(Json(ApiResponse::success(row.map_or_else(
        || GradeDto::from_model(record),
        GradeDto::from,
    ))))
}

pub async fn update_grade(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateGradeRequest>,
) -> Result<Json<ApiResponse<GradeDto>>, ApiError> {
    let id = validate_id(id)?;

    if let Some(score) = payload.score {
        validate_non_negative(score, "score")?;
    }
    if let Some(max_score) = payload.max_score {
        validate_non_negative(max_score, "max score")?;
    }

    let changes = GradeChanges {
        student_id: payload.student,
        subject: payload.subject,
        term: payload.term,
        score: payload.score,
        max_score: payload.max_score,
    };

    let record = state
        .store()
        .update_grade(id, changes)
        .await
        .map_err(ApiError::from_store)?
        .ok_or_else(|| ApiError::not_found("Grade", id))?;

    let row = state
        .store()
        .get_grade(record.id)
        .await
        .map_err(ApiError::from_store)?;

    Ok(Json(ApiResponse::success(row.map_or_else(
        || GradeDto::from_model(record),
        GradeDto::from,
    ))))
}

pub async fn delete_grade(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let id = validate_id(id)?;

    let deleted = state
        .store()
        .delete_grade(id)
        .await
        .map_err(ApiError::from_store)?;

    if !deleted {
        return Err(ApiError::not_found("Grade", id));
    }

    Ok(Json(ApiResponse::success(())))
}
