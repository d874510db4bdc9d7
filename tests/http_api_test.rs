mod common;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use chrono::Duration as Days;
use common::{seed_company, seed_job, seed_student, setup, unique, JWT_SECRET};
use placement_backend::{
    dto::auth_dto::{LoginPayload, RegisterPayload},
    models::admin::Role,
    routes::build_router,
    utils::{
        time::today,
        token::{issue_token, Claims},
    },
};
use serde_json::{json, Value as JsonValue};
use tower::ServiceExt;
use uuid::Uuid;

fn bearer(role: Role) -> String {
    let (token, _) = issue_token(JWT_SECRET, Uuid::new_v4(), "http-tester", role, 1).unwrap();
    format!("Bearer {}", token)
}

async fn call(
    app: &Router,
    method: &str,
    uri: &str,
    auth: Option<&str>,
    body: Option<JsonValue>,
) -> (StatusCode, JsonValue) {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(auth) = auth {
        req = req.header(header::AUTHORIZATION, auth);
    }
    let req = match body {
        Some(json) => req
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => req.body(Body::empty()).unwrap(),
    };
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    let value = if bytes.is_empty() {
        JsonValue::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(JsonValue::Null)
    };
    (status, value)
}

fn fields(body: &JsonValue) -> Vec<String> {
    body["errors"]
        .as_array()
        .map(|errs| {
            errs.iter()
                .filter_map(|e| e["field"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

#[tokio::test]
async fn health_and_auth_gate() {
    let Some(state) = setup().await else { return };
    let app = build_router(state);

    let (status, body) = call(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = call(&app, "GET", "/api/students", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "UNAUTHORIZED");

    let (status, _) = call(&app, "GET", "/api/students", Some("Bearer not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = call(&app, "GET", "/api/students?limit=1", Some(&bearer(Role::Manager)), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagination"]["limit"], 1);
}

#[tokio::test]
async fn student_crud_over_http() {
    let Some(state) = setup().await else { return };
    let app = build_router(state);
    let auth = bearer(Role::Manager);

    let (status, body) = call(
        &app,
        "POST",
        "/api/students",
        Some(&auth),
        Some(json!({"first_name": "", "last_name": "Nazarov", "email": "not-an-email", "age": 5})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert_eq!(fields(&body), vec!["age", "email", "first_name"]);

    let email = format!("{}@example.com", unique("http"));
    let (status, body) = call(
        &app,
        "POST",
        "/api/students",
        Some(&auth),
        Some(json!({"first_name": "Aziz", "last_name": "Nazarov", "email": email, "city": "Tashkent"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = call(&app, "GET", &format!("/api/students/{}", id), Some(&auth), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], email);
    assert_eq!(body["data"]["status"], "Available");

    let (status, body) = call(
        &app,
        "PUT",
        &format!("/api/students/{}", id),
        Some(&auth),
        Some(json!({"status": "Selected"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(fields(&body), vec!["status"]);

    let (status, body) = call(&app, "PUT", &format!("/api/students/{}", id), Some(&auth), Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, body) = call(
        &app,
        "PUT",
        &format!("/api/students/{}", id),
        Some(&auth),
        Some(json!({"city": "Namangan"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Student updated");

    let (status, body) = call(&app, "DELETE", &format!("/api/students/{}", id), Some(&auth), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");

    let admin = bearer(Role::Admin);
    let (status, _) = call(&app, "DELETE", &format!("/api/students/{}", id), Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = call(&app, "GET", &format!("/api/students/{}", id), Some(&auth), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn malformed_input_uses_the_error_envelope() {
    let Some(state) = setup().await else { return };
    let app = build_router(state);
    let auth = bearer(Role::Manager);

    let req = Request::builder()
        .method("POST")
        .uri("/api/students")
        .header(header::AUTHORIZATION, &auth)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"first_name\": "))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let bytes = to_bytes(resp.into_body(), 64 * 1024).await.unwrap();
    let body: JsonValue = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["code"], "BAD_REQUEST");

    let (status, body) = call(&app, "GET", "/api/students/not-a-uuid", Some(&auth), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, _) = call(&app, "GET", "/api/students?status=Graduated", Some(&auth), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn oversized_bodies_are_refused() {
    let Some(state) = setup().await else { return };
    let app = build_router(state);
    let auth = bearer(Role::Manager);

    let (status, body) = call(
        &app,
        "POST",
        "/api/students",
        Some(&auth),
        Some(json!({
            "first_name": "Aziz",
            "last_name": "Rahimov",
            "email": format!("{}@example.com", unique("big")),
            "education": "x".repeat(2 * 1024 * 1024),
        })),
    )
    .await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["code"], "PAYLOAD_TOO_LARGE");
}

#[tokio::test]
async fn job_skills_are_linked_and_unlinked() {
    let Some(state) = setup().await else { return };
    let company = seed_company(&state).await;
    let job = seed_job(&state, company).await;
    let app = build_router(state);
    let manager = bearer(Role::Manager);
    let admin = bearer(Role::Admin);

    let (status, body) = call(
        &app,
        "POST",
        "/api/skills",
        Some(&manager),
        Some(json!({ "name": unique("Rust"), "category": "Technical" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let skill = body["data"]["id"].as_str().unwrap().to_string();

    let uri = format!("/api/jobs/{}/skills", job);
    let link = json!({ "skill_id": skill, "is_required": true });
    let (status, _) = call(&app, "POST", &uri, Some(&manager), Some(link.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, body) = call(&app, "POST", &uri, Some(&manager), Some(link)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");

    let (status, body) = call(&app, "GET", &uri, Some(&manager), None).await;
    assert_eq!(status, StatusCode::OK);
    let linked = body["data"].as_array().unwrap();
    assert_eq!(linked.len(), 1);
    assert_eq!(linked[0]["is_required"], true);

    let one = format!("{}/{}", uri, skill);
    let (status, _) = call(&app, "DELETE", &one, Some(&manager), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = call(&app, "DELETE", &one, Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = call(&app, "GET", &uri, Some(&manager), None).await;
    assert_eq!(body["data"].as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn job_deadline_must_follow_posting() {
    let Some(state) = setup().await else { return };
    let company = seed_company(&state).await;
    let app = build_router(state);
    let auth = bearer(Role::Manager);

    let (status, body) = call(
        &app,
        "POST",
        "/api/jobs",
        Some(&auth),
        Some(json!({
            "company_id": company,
            "title": "Data Analyst",
            "job_type": "Full-time",
            "posted_date": today().to_string(),
            "deadline": (today() - Days::days(1)).to_string(),
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(fields(&body), vec!["deadline"]);
}

#[tokio::test]
async fn status_endpoint_reports_transitions_and_refusals() {
    let Some(state) = setup().await else { return };
    let company = seed_company(&state).await;
    let job = seed_job(&state, company).await;
    let student = seed_student(&state).await;
    let app = build_router(state);
    let auth = bearer(Role::Manager);

    let (status, body) = call(
        &app,
        "POST",
        "/api/applications",
        Some(&auth),
        Some(json!({"student_id": student, "job_id": job})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = call(
        &app,
        "POST",
        "/api/applications",
        Some(&auth),
        Some(json!({"student_id": student, "job_id": job})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");

    let (status, body) = call(
        &app,
        "PUT",
        &format!("/api/applications/{}/status", id),
        Some(&auth),
        Some(json!({"status": "Under Review", "expected_status": "Pending"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "Under Review");

    let (status, body) = call(
        &app,
        "PUT",
        &format!("/api/applications/{}/status", id),
        Some(&auth),
        Some(json!({"status": "Pending"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "INVALID_TRANSITION");

    let (status, body) = call(
        &app,
        "PUT",
        &format!("/api/applications/{}/status", id),
        Some(&auth),
        Some(json!({"status": "Rejected", "expected_status": "Shortlisted"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONCURRENT_MODIFICATION");

    let (status, body) = call(&app, "GET", &format!("/api/applications/{}/history", id), Some(&auth), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn dashboards_render_every_widget() {
    let Some(state) = setup().await else { return };
    let app = build_router(state);
    let auth = bearer(Role::Manager);

    let (status, body) = call(&app, "GET", "/api/dashboard/overview", Some(&auth), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["students_by_status"]["status"], "ok");

    let (status, body) = call(&app, "GET", "/api/dashboard/trends", Some(&auth), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["applications"]["data"].as_array().map(Vec::len), Some(12));

    let (status, _) = call(&app, "GET", "/api/dashboard/skills?limit=5", Some(&auth), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn registered_admin_can_log_in() {
    let Some(state) = setup().await else { return };
    let super_admin = Claims {
        sub: Uuid::new_v4(),
        username: "root".to_string(),
        role: Role::SuperAdmin,
        iat: 0,
        exp: 0,
    };
    let username = unique("ops").replace('-', "_")[..20].to_string();
    let admin = state
        .auth_service
        .register(
            RegisterPayload {
                username: username.clone(),
                email: format!("{}@example.com", username),
                password: "correct-horse-battery".to_string(),
                full_name: Some("Operations".to_string()),
                role: Some(Role::Manager),
            },
            Some(&super_admin),
        )
        .await
        .expect("register");

    let err = state
        .auth_service
        .login(LoginPayload {
            username: username.clone(),
            password: "wrong-password".to_string(),
        })
        .await
        .unwrap_err();
    assert_eq!(err.code(), "UNAUTHORIZED");

    let session = state
        .auth_service
        .login(LoginPayload {
            username: username.to_uppercase(),
            password: "correct-horse-battery".to_string(),
        })
        .await
        .expect("login");
    assert!(session.expires_in > 0);
    assert_eq!(session.admin.id, admin.id);

    let app = build_router(state);
    let (status, body) = call(
        &app,
        "GET",
        "/api/auth/profile",
        Some(&format!("Bearer {}", session.token)),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["username"], username);
}
