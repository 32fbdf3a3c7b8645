use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{delete, get, post, put},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use time;

use crate::config::Config;
use crate::state::SharedState;

mod admin_users;
mod attendance;
pub mod auth;
mod classrooms;
mod error;
mod fees;
mod grades;
mod observability;
mod payments;
mod students;
mod system;
mod types;
mod validation;

pub use error::ApiError;
pub use types::*;

use tokio::sync::RwLock;

use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Arc<RwLock<Config>> {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &crate::db::Store {
        &self.shared.store
    }

    #[must_use]
    pub fn auth_service(&self) -> &Arc<dyn crate::services::AuthService> {
        &self.shared.auth_service
    }

    #[must_use]
    pub fn admin_user_service(&self) -> &Arc<dyn crate::services::AdminUserService> {
        &self.shared.admin_user_service
    }
}

pub async fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    Ok(Arc::new(AppState {
        shared,
        start_time: std::time::Instant::now(),
        prometheus_handle,
    }))
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    create_app_state(shared, prometheus_handle).await
}

pub async fn router(state: Arc<AppState>) -> Router {
    let (cors_origins, secure_cookies) = {
        let config = state.config().read().await;
        (
            config.server.cors_allowed_origins.clone(),
            config.server.secure_cookies,
        )
    };

    let protected_routes = create_protected_router(state.clone());

    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(secure_cookies)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(60)));

    // Classroom reads are the one surface open to unauthenticated callers.
    let public_routes = Router::new()
        .route("/classrooms", get(classrooms::list_classrooms))
        .route("/classrooms/{id}", get(classrooms::get_classroom));

    let api_router = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .layer(session_layer)
        .with_state(state.clone());

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .nest("/api", api_router)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(observability::track_requests))
}

fn create_protected_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/me", get(auth::me))
        .route("/auth/password", put(auth::change_password))
        .route("/classrooms", post(classrooms::create_classroom))
        .route("/classrooms/{id}", put(classrooms::update_classroom).patch(classrooms::update_classroom))
        .route("/classrooms/{id}", delete(classrooms::delete_classroom))
        .route("/students", get(students::list_students))
        .route("/students", post(students::create_student))
        .route("/students/{id}", get(students::get_student))
        .route("/students/{id}", put(students::update_student).patch(students::update_student))
        .route("/students/{id}", delete(students::delete_student))
        .route("/attendance", get(attendance::list_attendance))
        .route("/attendance", post(attendance::create_attendance))
        .route("/attendance/{id}", get(attendance::get_attendance))
        .route("/attendance/{id}", put(attendance::update_attendance).patch(attendance::update_attendance))
        .route("/attendance/{id}", delete(attendance::delete_attendance))
        .route("/grades", get(grades::list_grades))
        .route("/grades", post(grades::create_grade))
        .route("/grades/{id}", get(grades::get_grade))
        .route("/grades/{id}", put(grades::update_grade).patch(grades::update_grade))
        .route("/grades/{id}", delete(grades::delete_grade))
        .route("/fee-structure", get(fees::list_fee_structures))
        .route("/fee-structure", post(fees::create_fee_structure))
        .route("/fee-structure/{id}", get(fees::get_fee_structure))
        .route("/fee-structure/{id}", put(fees::update_fee_structure).patch(fees::update_fee_structure))
        .route("/fee-structure/{id}", delete(fees::delete_fee_structure))
        .route("/payments", get(payments::list_payments))
        .route("/payments", post(payments::create_payment))
        .route("/payments/{id}", get(payments::get_payment))
        .route("/payments/{id}", put(payments::update_payment).patch(payments::update_payment))
        .route("/payments/{id}", delete(payments::delete_payment))
        .route("/admin-users", get(admin_users::list_admin_users))
        .route("/admin-users", post(admin_users::create_admin_user))
        .route("/admin-users/{id}", get(admin_users::get_admin_user))
        .route("/admin-users/{id}", put(admin_users::update_admin_user).patch(admin_users::update_admin_user))
        .route("/admin-users/{id}", delete(admin_users::delete_admin_user))
        .route("/system/status", get(system::get_status))
        .route("/metrics", get(observability::get_metrics))
        .route_layer(middleware::from_fn_with_state(state, auth::auth_middleware))
}
