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

fn get(uri: &str, api_key: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("X-Api-Key", api_key)
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

fn put_json(uri: &str, api_key: &str, body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("PUT")
        .uri(uri)
        .header("X-Api-Key", api_key)
        .header("Content-Type", "application/json")
        .body(Body::from(serde_json::to_string(body).unwrap()))
        .unwrap()
}

async fn create_admin(
    app: &Router,
    api_key: &str,
    username: &str,
    password: &str,
    superuser: bool,
) -> serde_json::Value {
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/admin-users",
            api_key,
            &serde_json::json!({
                "username": username,
                "email": format!("{username}@school.example"),
                "first_name": "Test",
                "last_name": username,
                "password": password,
                "is_staff": true,
                "is_superuser": superuser
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await["data"].clone()
}

async fn login(app: &Router, username: &str, password: &str) -> Option<String> {
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/auth/login",
            "",
            &serde_json::json!({"username": username, "password": password}),
        ))
        .await
        .unwrap();

    if response.status() != StatusCode::OK {
        return None;
    }
    body_json(response).await["data"]["api_key"]
        .as_str()
        .map(str::to_string)
}

#[tokio::test]
async fn test_create_provisions_linked_principal() {
    let app = spawn_app().await;

    let created = create_admin(&app, DEFAULT_API_KEY, "amara", "amarapw", false).await;

    assert_eq!(created["username"], "amara");
    assert_eq!(created["full_name"], "Test amara");
    assert_eq!(created["is_active"], true);
    assert_eq!(created["role"], "admin");
    // Provisioned by the seeded root account
    assert_eq!(created["created_by_name"], "Root Admin");
    // Password is write-only
    assert!(created.get("password").is_none());
    assert!(created.get("password_hash").is_none());

    // The new principal can authenticate immediately
    assert!(login(&app, "amara", "amarapw").await.is_some());
}

#[tokio::test]
async fn test_short_password_creates_nothing() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/admin-users",
            DEFAULT_API_KEY,
            &serde_json::json!({
                "username": "shorty",
                "email": "shorty@school.example",
                "password": "abc"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Neither half of the pair exists: the username is still free and a
    // valid retry succeeds.
    assert!(login(&app, "shorty", "abc").await.is_none());
    create_admin(&app, DEFAULT_API_KEY, "shorty", "abcdef", false).await;
}

#[tokio::test]
async fn test_six_character_password_is_accepted() {
    let app = spawn_app().await;
    create_admin(&app, DEFAULT_API_KEY, "sixchr", "abcdef", false).await;
}

#[tokio::test]
async fn test_duplicate_username_conflicts() {
    let app = spawn_app().await;

    create_admin(&app, DEFAULT_API_KEY, "dupe", "dupepw", false).await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/admin-users",
            DEFAULT_API_KEY,
            &serde_json::json!({
                "username": "dupe",
                "email": "dupe2@school.example",
                "password": "dupepw2"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

/// Non-superusers see only the profiles they provisioned; superusers see all.
#[tokio::test]
async fn test_visibility_policy() {
    let app = spawn_app().await;

    create_admin(&app, DEFAULT_API_KEY, "alice", "alicepw", false).await;
    create_admin(&app, DEFAULT_API_KEY, "bob", "bobpw", false).await;

    let alice_key = login(&app, "alice", "alicepw").await.unwrap();
    let bob_key = login(&app, "bob", "bobpw").await.unwrap();

    let p1 = create_admin(&app, &alice_key, "p1", "p1pass", false).await;
    let p2 = create_admin(&app, &bob_key, "p2", "p2pass", false).await;

    assert_eq!(p1["created_by_name"], "Test alice");
    assert_eq!(p2["created_by_name"], "Test bob");

    // Alice sees exactly her own creation
    let response = app
        .clone()
        .oneshot(get("/api/admin-users", &alice_key))
        .await
        .unwrap();
    let body = body_json(response).await;
    let items = body["data"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["username"], "p1");

    // Bob sees exactly his
    let response = app
        .clone()
        .oneshot(get("/api/admin-users", &bob_key))
        .await
        .unwrap();
    let body = body_json(response).await;
    let items = body["data"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["username"], "p2");

    // The superuser sees everything: root, alice, bob, p1, p2
    let response = app
        .clone()
        .oneshot(get("/api/admin-users", DEFAULT_API_KEY))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 5);

    // Detail reads outside the scope are absent, not forbidden
    let p2_id = p2["id"].as_i64().unwrap();
    let response = app
        .clone()
        .oneshot(get(&format!("/api/admin-users/{p2_id}"), &alice_key))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_seeded_root_created_by_system() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(get("/api/admin-users", DEFAULT_API_KEY))
        .await
        .unwrap();
    let body = body_json(response).await;
    let items = body["data"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["username"], "admin");
    assert_eq!(items[0]["created_by_name"], "System");
    assert_eq!(items[0]["role"], "super_admin");
}

#[tokio::test]
async fn test_notes_update_leaves_password_untouched() {
    let app = spawn_app().await;

    let created = create_admin(&app, DEFAULT_API_KEY, "noter", "noterpw", false).await;
    let id = created["id"].as_i64().unwrap();

    let response = app
        .clone()
        .oneshot(put_json(
            &format!("/api/admin-users/{id}"),
            DEFAULT_API_KEY,
            &serde_json::json!({"notes": "handles enrollment paperwork"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["notes"], "handles enrollment paperwork");

    // The original password still authenticates
    assert!(login(&app, "noter", "noterpw").await.is_some());
}

#[tokio::test]
async fn test_password_update_rotates_hash() {
    let app = spawn_app().await;

    let created = create_admin(&app, DEFAULT_API_KEY, "rotate", "oldpass", false).await;
    let id = created["id"].as_i64().unwrap();

    let response = app
        .clone()
        .oneshot(put_json(
            &format!("/api/admin-users/{id}"),
            DEFAULT_API_KEY,
            &serde_json::json!({"password": "newpass"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    assert!(login(&app, "rotate", "oldpass").await.is_none());
    assert!(login(&app, "rotate", "newpass").await.is_some());
}

#[tokio::test]
async fn test_identity_fields_propagate_to_principal() {
    let app = spawn_app().await;

    let created = create_admin(&app, DEFAULT_API_KEY, "renameme", "renamepw", false).await;
    let id = created["id"].as_i64().unwrap();

    let response = app
        .clone()
        .oneshot(put_json(
            &format!("/api/admin-users/{id}"),
            DEFAULT_API_KEY,
            &serde_json::json!({
                "first_name": "Renata",
                "last_name": "Moss",
                "status": "inactive"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["full_name"], "Renata Moss");
    assert_eq!(body["data"]["is_active"], false);

    // The principal record reflects the change
    let key = login(&app, "renameme", "renamepw").await.unwrap();
    let response = app.clone().oneshot(get("/api/auth/me", &key)).await.unwrap();
    let body = body_json(response).await;
    assert_eq!(body["data"]["full_name"], "Renata Moss");
}

#[tokio::test]
async fn test_delete_removes_principal() {
    let app = spawn_app().await;

    let created = create_admin(&app, DEFAULT_API_KEY, "doomed", "doomedpw", false).await;
    let id = created["id"].as_i64().unwrap();

    // Sanity: the account works before deletion
    let doomed_key = login(&app, "doomed", "doomedpw").await.unwrap();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/admin-users/{id}"))
                .header("X-Api-Key", DEFAULT_API_KEY)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // The profile is gone
    let response = app
        .clone()
        .oneshot(get(&format!("/api/admin-users/{id}"), DEFAULT_API_KEY))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // And so is the authentication identity: neither credentials nor the
    // old API key work
    assert!(login(&app, "doomed", "doomedpw").await.is_none());
    let response = app
        .clone()
        .oneshot(get("/api/students", &doomed_key))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // The username is free again
    create_admin(&app, DEFAULT_API_KEY, "doomed", "reborn-pw", false).await;
}
