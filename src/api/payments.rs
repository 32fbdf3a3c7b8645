use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::validation::{
    PAYMENT_METHODS, validate_choice, validate_date, validate_id, validate_non_negative,
    validate_page_size,
};
use super::{ApiError, ApiResponse, AppState, Page, PageQuery, PaymentDto};
use crate::db::{NewPayment, PaymentChanges};

#[derive(Debug, Deserialize)]
pub struct CreatePaymentRequest {
    pub student: i32,
    pub fee_type: String,
    pub total_fee: f64,
    pub total_paid: f64,
    pub payment_date: String,
    pub due_date: Option<String>,
    pub payment_method: String,
    #[serde(default)]
    pub receipt_number: String,
    #[serde(default)]
    pub notes: String,
}

/// `due_date` uses a double Option: absent leaves the stored value, an
/// explicit `null` clears it.
#[derive(Debug, Deserialize)]
pub struct UpdatePaymentRequest {
    pub student: Option<i32>,
    pub fee_type: Option<String>,
    pub total_fee: Option<f64>,
    pub total_paid: Option<f64>,
    pub payment_date: Option<String>,
    #[serde(default, with = "serde_double_option")]
    pub due_date: Option<Option<String>>,
    pub payment_method: Option<String>,
    pub receipt_number: Option<String>,
    pub notes: Option<String>,
}

mod serde_double_option {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<String>::deserialize(deserializer).map(Some)
    }
}

pub async fn list_payments(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ApiResponse<Page<PaymentDto>>>, ApiError> {
    let page_size = validate_page_size(query.page_size)?;

    let (items, total_pages) = state
        .store()
        .list_payments(query.page, page_size)
        .await
        .map_err(ApiError::from_store)?;

    Ok(Json(ApiResponse::success(Page {
        items: items.into_iter().map(PaymentDto::from).collect(),
        total_pages,
    })))
}

pub async fn get_payment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<PaymentDto>>, ApiError> {
    let id = validate_id(id)?;

    let row = state
        .store()
        .get_payment(id)
        .await
        .map_err(ApiError::from_store)?
        .ok_or_else(|| ApiError::not_found("Payment", id))?;

    Ok(Json(ApiResponse::success(PaymentDto::from(row))))
}

pub async fn create_payment(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreatePaymentRequest>,
) -> Result<Json<ApiResponse<PaymentDto>>, ApiError> {
    let student_id = validate_id(payload.student)?;
    let total_fee = validate_non_negative(payload.total_fee, "total fee")?;
    let total_paid = validate_non_negative(payload.total_paid, "total paid")?;
    validate_date(&payload.payment_date, "payment date")?;
    if let Some(due_date) = &payload.due_date {
        validate_date(due_date, "due date")?;
    }
    validate_choice(&payload.payment_method, &PAYMENT_METHODS, "payment method")?;

    if payload.fee_type.trim().is_empty() {
        return Err(ApiError::validation("Fee type cannot be empty"));
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
        .create_payment(NewPayment {
            student_id,
            fee_type: payload.fee_type,
            total_fee,
            total_paid,
            payment_date: payload.payment_date,
            due_date: payload.due_date,
            payment_method: payload.payment_method,
            receipt_number: payload.receipt_number,
            notes: payload.notes,
        })
        .await
        .map_err(ApiError::from_store)?;

    let row = state
        .store()
        .get_payment(record.id)
        .await
        .map_err(ApiError::from_store)?;

    Ok(Json(ApiResponse::success(row.map_or_else(
        || PaymentDto::from_model(record),
        PaymentDto::from,
    ))))
}

pub async fn update_payment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdatePaymentRequest>,
) -> Result<Json<ApiResponse<PaymentDto>>, ApiError> {
    let id = validate_id(id)?;

    if let Some(total_fee) = payload.total_fee {
        validate_non_negative(total_fee, "total fee")?;
    }
    if let Some(total_paid) = payload.total_paid {
        validate_non_negative(total_paid, "total paid")?;
    }
    if let Some(date) = &payload.payment_date {
        validate_date(date, "payment date")?;
    }
    if let Some(Some(due_date)) = &payload.due_date {
        validate_date(due_date, "due date")?;
    }
    if let Some(method) = &payload.payment_method {
        validate_choice(method, &PAYMENT_METHODS, "payment method")?;
    }

    let changes = PaymentChanges {
        student_id: payload.student,
        fee_type: payload.fee_type,
        total_fee: payload.total_fee,
        total_paid: payload.total_paid,
        payment_date: payload.payment_date,
        due_date: payload.due_date,
        payment_method: payload.payment_method,
        receipt_number: payload.receipt_number,
        notes: payload.notes,
    };

    let record = state
        .store()
        .update_payment(id, changes)
        .await
        .map_err(ApiError::from_store)?
        .ok_or_else(|| ApiError::not_found("Payment", id))?;

    let row = state
        .store()
        .get_payment(record.id)
        .await
        .map_err(ApiError::from_store)?;

    Ok(Json(ApiResponse::success(row.map_or_else(
        || PaymentDto::from_model(record),
        PaymentDto::from,
    ))))
}

pub async fn delete_payment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let id = validate_id(id)?;

    let deleted = state
        .store()
        .delete_payment(id)
        .await
        .map_err(ApiError::from_store)?;

    if !deleted {
        return Err(ApiError::not_found("Payment", id));
    }

    Ok(Json(ApiResponse::success(())))
}
