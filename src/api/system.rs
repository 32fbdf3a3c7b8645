use axum::{Json, extract::State};
use serde::Serialize;
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState};

#[derive(Debug, Serialize)]
pub struct SystemStatus {
    pub version: String,
    pub uptime: u64,
    pub classrooms: u64,
    pub students: u64,
    pub admin_users: u64,
    pub payments: u64,
}

pub async fn get_status(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<SystemStatus>>, ApiError> {
    let store = state.store();

    let classrooms = store.count_classrooms().await?;
    let students = store.count_students().await?;
    let admin_users = store.count_admin_users().await?;
    let payments = store.count_payments().await?;

    Ok(Json(ApiResponse::success(SystemStatus {
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime: state.start_time.elapsed().as_secs(),
        classrooms,
        students,
        admin_users,
        payments,
    })))
}
