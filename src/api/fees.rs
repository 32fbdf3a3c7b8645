use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::validation::{
    FEE_FREQUENCIES, validate_choice, validate_id, validate_non_negative, validate_page_size,
};
use super::{ApiError, ApiResponse, AppState, FeeStructureDto, Page, PageQuery};
use crate::db::{FeeStructureChanges, NewFeeStructure};

#[derive(Debug, Deserialize)]
pub struct CreateFeeStructureRequest {
    pub classroom: i32,
    pub fee_type: String,
    pub amount: f64,
    pub frequency: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateFeeStructureRequest {
    pub classroom: Option<i32>,
    pub fee_type: Option<String>,
    pub amount: Option<f64>,
    pub frequency: Option<String>,
    pub description: Option<String>,
}

pub async fn list_fee_structures(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ApiResponse<Page<FeeStructureDto>>>, ApiError> {
    let page_size = validate_page_size(query.page_size)?;

    let (items, total_pages) = state
        .store()
        .list_fee_structures(query.page, page_size)
        .await
        .map_err(ApiError::from_store)?;

    Ok(Json(ApiResponse::success(Page {
        items: items
            .into_iter()
            .map(|(fee, classroom)| FeeStructureDto::from_parts(fee, classroom))
            .collect(),
        total_pages,
    })))
}

pub async fn get_fee_structure(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<FeeStructureDto>>, ApiError> {
    let id = validate_id(id)?;

    let (fee, classroom) = state
        .store()
        .get_fee_structure(id)
        .await
        .map_err(ApiError::from_store)?
        .ok_or_else(|| ApiError::not_found("Fee structure", id))?;

    Ok(Json(ApiResponse::success(FeeStructureDto::from_parts(
        fee, classroom,
    ))))
}

pub async fn create_fee_structure(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateFeeStructureRequest>,
) -> Result<Json<ApiResponse<FeeStructureDto>>, ApiError> {
    let classroom_id = validate_id(payload.classroom)?;
    let amount = validate_non_negative(payload.amount, "amount")?;
    validate_choice(&payload.frequency, &FEE_FREQUENCIES, "frequency")?;

    if payload.fee_type.trim().is_empty() {
        return Err(ApiError::validation("Fee type cannot be empty"));
    }

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

    let fee = state
        .store()
        .create_fee_structure(NewFeeStructure {
            classroom_id,
            fee_type: payload.fee_type,
            amount,
            frequency: payload.frequency,
            description: payload.description,
        })
        .await
        .map_err(ApiError::from_store)?;

    let classroom = state
        .store()
        .get_classroom(fee.classroom_id)
        .await
        .map_err(ApiError::from_store)?;

    Ok(Json(ApiResponse::success(FeeStructureDto::from_parts(
        fee, classroom,
    ))))
}

pub async fn update_fee_structure(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateFeeStructureRequest>,
) -> Result<Json<ApiResponse<FeeStructureDto>>, ApiError> {
    let id = validate_id(id)?;

    if let Some(amount) = payload.amount {
        validate_non_negative(amount, "amount")?;
    }
    if let Some(frequency) = &payload.frequency {
        validate_choice(frequency, &FEE_FREQUENCIES, "frequency")?;
    }

    let changes = FeeStructureChanges {
        classroom_id: payload.classroom,
        fee_type: payload.fee_type,
        amount: payload.amount,
        frequency: payload.frequency,
        description: payload.description,
    };

    let fee = state
        .store()
        .update_fee_structure(id, changes)
        .await
        .map_err(ApiError::from_store)?
        .ok_or_else(|| ApiError::not_found("Fee structure", id))?;

    let classroom = state
        .store()
        .get_classroom(fee.classroom_id)
        .await
        .map_err(ApiError::from_store)?;

    Ok(Json(ApiResponse::success(FeeStructureDto::from_parts(
        fee, classroom,
    ))))
}

pub async fn delete_fee_structure(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let id = validate_id(id)?;

    let deleted = state
        .store()
        .delete_fee_structure(id)
        .await
        .map_err(ApiError::from_store)?;

    if !deleted {
        return Err(ApiError::not_found("Fee structure", id));
    }

    Ok(Json(ApiResponse::success(())))
}
