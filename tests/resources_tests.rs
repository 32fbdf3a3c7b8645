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

fn post_json(uri: &str, body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("X-Api-Key", DEFAULT_API_KEY)
        .header("Content-Type", "application/json")
        .body(Body::from(serde_json::to_string(body).unwrap()))
        .unwrap()
}

/// Create a classroom + student pair and return (classroom_id, student_id).
async fn seed_student(app: &Router, classroom: &str, roll: &str) -> (i64, i64) {
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/classrooms",
            &serde_json::json!({"name": classroom}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let classroom_id = body_json(response).await["data"]["id"].as_i64().unwrap();

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/students",
            &serde_json::json!({
                "first_name": "Jamie",
                "last_name": "Reyes",
                "date_of_birth": "2014-06-15",
                "roll_number": roll,
                "classroom": classroom_id
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let student_id = body_json(response).await["data"]["id"].as_i64().unwrap();

    (classroom_id, student_id)
}

#[tokio::test]
async fn test_student_embeds_classroom_detail() {
    let app = spawn_app().await;
    let (classroom_id, student_id) = seed_student(&app, "Grade 4", "11").await;

    let response = app
        .clone()
        .oneshot(get(&format!("/api/students/{student_id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["data"]["classroom"], classroom_id);
    assert_eq!(body["data"]["classroom_detail"]["name"], "Grade 4");
}

#[tokio::test]
async fn test_student_requires_existing_classroom() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/students",
            &serde_json::json!({
                "first_name": "Orphan",
                "last_name": "Record",
                "date_of_birth": "2014-06-15",
                "roll_number": "1",
                "classroom": 424242
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_duplicate_roll_number_per_classroom_conflicts() {
    let app = spawn_app().await;
    let (classroom_id, _) = seed_student(&app, "Grade 5", "21").await;

    let duplicate = serde_json::json!({
        "first_name": "Robin",
        "last_name": "Ochoa",
        "date_of_birth": "2014-01-20",
        "roll_number": "21",
        "classroom": classroom_id
    });

    let response = app
        .clone()
        .oneshot(post_json("/api/students", &duplicate))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_attendance_unique_per_student_and_day() {
    let app = spawn_app().await;
    let (_, student_id) = seed_student(&app, "Grade 6", "31").await;

    let record = serde_json::json!({
        "student": student_id,
        "date": "2026-03-02",
        "status": "present"
    });

    let response = app
        .clone()
        .oneshot(post_json("/api/attendance", &record))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["student_detail"]["first_name"], "Jamie");

    let response = app
        .clone()
        .oneshot(post_json("/api/attendance", &record))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Unknown status values are rejected up front
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/attendance",
            &serde_json::json!({
                "student": student_id,
                "date": "2026-03-03",
                "status": "teleported"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_grade_unique_per_student_subject_term() {
    let app = spawn_app().await;
    let (_, student_id) = seed_student(&app, "Grade 7", "41").await;

    let grade = serde_json::json!({
        "student": student_id,
        "subject": "Mathematics",
        "term": "2026-T1",
        "score": 88.5
    });

    let response = app
        .clone()
        .oneshot(post_json("/api/grades", &grade))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    // max_score defaults to 100
    assert_eq!(body["data"]["max_score"], 100.0);

    let response = app
        .clone()
        .oneshot(post_json("/api/grades", &grade))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_fee_structure_unique_per_classroom_and_type() {
    let app = spawn_app().await;
    let (classroom_id, _) = seed_student(&app, "Grade 8", "51").await;

    let fee = serde_json::json!({
        "classroom": classroom_id,
        "fee_type": "tuition",
        "amount": 1200.0,
        "frequency": "monthly"
    });

    let response = app
        .clone()
        .oneshot(post_json("/api/fee-structure", &fee))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["classroom_detail"]["name"], "Grade 8");

    let response = app
        .clone()
        .oneshot(post_json("/api/fee-structure", &fee))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Frequency is an enumerated choice
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/fee-structure",
            &serde_json::json!({
                "classroom": classroom_id,
                "fee_type": "lab",
                "amount": 300.0,
                "frequency": "fortnightly"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_payment_overdue_derivation() {
    let app = spawn_app().await;
    let (_, student_id) = seed_student(&app, "Grade 9", "61").await;

    // Past due date with an open balance: overdue
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/payments",
            &serde_json::json!({
                "student": student_id,
                "fee_type": "tuition",
                "total_fee": 100.0,
                "total_paid": 50.0,
                "payment_date": "2026-01-10",
                "due_date": "2026-01-01",
                "payment_method": "cash",
                "receipt_number": "R-1001"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["balance"], 50.0);
    assert_eq!(body["data"]["is_overdue"], true);
    assert_eq!(body["data"]["student_full_name"], "Jamie Reyes");

    // Fully paid: never overdue, regardless of due date
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/payments",
            &serde_json::json!({
                "student": student_id,
                "fee_type": "admission",
                "total_fee": 100.0,
                "total_paid": 100.0,
                "payment_date": "2026-01-10",
                "due_date": "2026-01-01",
                "payment_method": "bank_transfer",
                "receipt_number": "R-1002"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["balance"], 0.0);
    assert_eq!(body["data"]["is_overdue"], false);

    // Future due date: not overdue even with an open balance
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/payments",
            &serde_json::json!({
                "student": student_id,
                "fee_type": "transport",
                "total_fee": 100.0,
                "total_paid": 10.0,
                "payment_date": "2026-01-10",
                "due_date": "2999-12-31",
                "payment_method": "online",
                "receipt_number": "R-1003"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["is_overdue"], false);
}

#[tokio::test]
async fn test_payment_method_is_validated() {
    let app = spawn_app().await;
    let (_, student_id) = seed_student(&app, "Grade 10", "71").await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/payments",
            &serde_json::json!({
                "student": student_id,
                "fee_type": "tuition",
                "total_fee": 100.0,
                "total_paid": 0.0,
                "payment_date": "2026-01-10",
                "payment_method": "barter"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_classroom_pagination() {
    let app = spawn_app().await;

    for name in ["Grade A", "Grade B", "Grade C"] {
        let response = app
            .clone()
            .oneshot(post_json(
                "/api/classrooms",
                &serde_json::json!({"name": name}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .clone()
        .oneshot(get("/api/classrooms?page=1&page_size=2"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 2);
    assert_eq!(body["data"]["total_pages"], 2);

    let response = app
        .clone()
        .oneshot(get("/api/classrooms?page=2&page_size=2"))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 1);

    // Page size is bounded
    let response = app
        .clone()
        .oneshot(get("/api/classrooms?page=1&page_size=5000"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_partial_update_leaves_other_fields() {
    let app = spawn_app().await;
    let (_, student_id) = seed_student(&app, "Grade 11", "81").await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PATCH")
                .uri(format!("/api/students/{student_id}"))
                .header("X-Api-Key", DEFAULT_API_KEY)
                .header("Content-Type", "application/json")
                .body(Body::from(r#"{"guardian_name": "R. Reyes"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["data"]["guardian_name"], "R. Reyes");
    assert_eq!(body["data"]["first_name"], "Jamie");
    assert_eq!(body["data"]["roll_number"], "81");
}
