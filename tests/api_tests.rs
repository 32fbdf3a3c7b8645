use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use registrar::config::Config;
use tower::ServiceExt;

/// Default API key seeded by migration (must match m20250901_initial.rs)
const DEFAULT_API_KEY: &str = "registrar_default_api_key_please_regenerate";

async fn spawn_app() -> Router {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    config.general.max_db_connections = 1;

    let state = registrar::api::create_app_state_from_config(config, None)
        .await
        .expect("Failed to create app state");
    registrar::api::router(state).await
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("X-Api-Key", DEFAULT_API_KEY)
        .body(Body::empty())
        .unwrap()
}

fn post_json(uri: &str, api_key: &str, body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("X-Api-Key", api_key)
        .header("Content-Type", "application/json")
        .body(Body::from(serde_json::to_string(body).unwrap()))
        .unwrap()
}

#[tokio::test]
async fn test_auth_required_for_protected_routes() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/students")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/students")
                .header("X-Api-Key", "wrong-key")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app.clone().oneshot(get("/api/students")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_bearer_token_accepted() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/system/status")
                .header("Authorization", format!("Bearer {DEFAULT_API_KEY}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_classroom_reads_are_public() {
    let app = spawn_app().await;

    // No credentials at all
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/classrooms")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    // But unauthenticated writes are rejected
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/classrooms")
                .header("Content-Type", "application/json")
                .body(Body::from(r#"{"name": "Grade 1"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_flow() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/auth/login",
            "",
            &serde_json::json!({"username": "admin", "password": "password"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["username"], "admin");
    assert_eq!(body["data"]["api_key"], DEFAULT_API_KEY);
    assert_eq!(body["data"]["is_superuser"], true);

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/auth/login",
            "",
            &serde_json::json!({"username": "admin", "password": "wrong"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

/// Classrooms take the staff-gated write policy; students only need an
/// authenticated caller. The asymmetry is deliberate.
#[tokio::test]
async fn test_two_tier_write_policy() {
    let app = spawn_app().await;

    // Provision a non-staff account
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/admin-users",
            DEFAULT_API_KEY,
            &serde_json::json!({
                "username": "clerk",
                "email": "clerk@school.example",
                "first_name": "Casey",
                "last_name": "Clerk",
                "password": "clerkpw",
                "is_staff": false
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/auth/login",
            "",
            &serde_json::json!({"username": "clerk", "password": "clerkpw"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let clerk_key = body_json(response).await["data"]["api_key"]
        .as_str()
        .unwrap()
        .to_string();

    // Staff-gated: classroom write is forbidden for the clerk
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/classrooms",
            &clerk_key,
            &serde_json::json!({"name": "Grade 1", "section": "A"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Staff can create the classroom
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/classrooms",
            DEFAULT_API_KEY,
            &serde_json::json!({"name": "Grade 1", "section": "A"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let classroom_id = body_json(response).await["data"]["id"].as_i64().unwrap();

    // Authentication-only tier: the clerk can create a student
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/students",
            &clerk_key,
            &serde_json::json!({
                "first_name": "Sam",
                "last_name": "Lee",
                "date_of_birth": "2015-04-02",
                "roll_number": "7",
                "classroom": classroom_id
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Admin-user writes are also staff-gated
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/admin-users",
            &clerk_key,
            &serde_json::json!({
                "username": "intruder",
                "email": "intruder@school.example",
                "password": "nope-nope"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_duplicate_classroom_conflict() {
    let app = spawn_app().await;

    let payload = serde_json::json!({"name": "Grade 2", "section": "B"});

    let response = app
        .clone()
        .oneshot(post_json("/api/classrooms", DEFAULT_API_KEY, &payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(post_json("/api/classrooms", DEFAULT_API_KEY, &payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_classroom_with_students_cannot_be_deleted() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/classrooms",
            DEFAULT_API_KEY,
            &serde_json::json!({"name": "Grade 3"}),
        ))
        .await
        .unwrap();
    let classroom_id = body_json(response).await["data"]["id"].as_i64().unwrap();

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/students",
            DEFAULT_API_KEY,
            &serde_json::json!({
                "first_name": "Ada",
                "last_name": "Byron",
                "date_of_birth": "2014-12-10",
                "roll_number": "1",
                "classroom": classroom_id
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let student_id = body_json(response).await["data"]["id"].as_i64().unwrap();

    // Deletion refused while the student references the classroom
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/classrooms/{classroom_id}"))
                .header("X-Api-Key", DEFAULT_API_KEY)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Remove the student, then deletion goes through
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/students/{student_id}"))
                .header("X-Api-Key", DEFAULT_API_KEY)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/classrooms/{classroom_id}"))
                .header("X-Api-Key", DEFAULT_API_KEY)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_ids_are_not_found() {
    let app = spawn_app().await;

    for uri in [
        "/api/classrooms/9999",
        "/api/students/9999",
        "/api/attendance/9999",
        "/api/grades/9999",
        "/api/fee-structure/9999",
        "/api/payments/9999",
        "/api/admin-users/9999",
    ] {
        let response = app.clone().oneshot(get(uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
    }
}

#[tokio::test]
async fn test_system_status() {
    let app = spawn_app().await;

    let response = app.clone().oneshot(get("/api/system/status")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert!(body["data"]["version"].is_string());
    // Migration seeds exactly one admin account
    assert_eq!(body["data"]["admin_users"], 1);
}

#[tokio::test]
async fn test_change_own_password() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/api/auth/password")
                .header("X-Api-Key", DEFAULT_API_KEY)
                .header("Content-Type", "application/json")
                .body(Body::from(
                    r#"{"current_password": "password", "new_password": "swordfish"}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Old password no longer authenticates
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/auth/login",
            "",
            &serde_json::json!({"username": "admin", "password": "password"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/auth/login",
            "",
            &serde_json::json!({"username": "admin", "password": "swordfish"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
