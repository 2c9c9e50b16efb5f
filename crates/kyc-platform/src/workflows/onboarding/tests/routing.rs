use super::common::*;
use crate::workflows::onboarding::router::onboarding_router;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

fn router() -> Router {
    onboarding_router(build_api())
}

async fn send_json(
    router: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(value) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&value).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    router.clone().oneshot(request).await.expect("route executes")
}

async fn register(router: &Router, email: &str, role: &str) -> String {
    let response = send_json(
        router,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({
            "email": email,
            "password": "correct horse",
            "full_name": "Amira Hassan",
            "role": role,
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let payload = read_json_body(response).await;
    payload["token"].as_str().expect("token issued").to_string()
}

fn profile_json() -> Value {
    serde_json::to_value(complete_profile()).expect("profile serializes")
}

fn multipart_request(
    uri: &str,
    token: &str,
    doc_type: &str,
    filename: &str,
    content: &[u8],
) -> Request<Body> {
    let boundary = "onboarding-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"doc_type\"\r\n\r\n{doc_type}\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: application/pdf\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn register_issues_a_token_and_duplicates_conflict() {
    let router = router();
    let token = register(&router, "amira@falcon.example", "merchant").await;
    assert!(!token.is_empty());

    let duplicate = send_json(
        &router,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({
            "email": "amira@falcon.example",
            "password": "correct horse",
            "full_name": "Someone Else",
            "role": "merchant",
        })),
    )
    .await;
    assert_eq!(duplicate.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn short_passwords_are_rejected_at_registration() {
    let response = send_json(
        &router(),
        "POST",
        "/api/auth/register",
        None,
        Some(json!({
            "email": "short@falcon.example",
            "password": "seven77",
            "full_name": "Amira Hassan",
            "role": "merchant",
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn login_rejects_bad_credentials() {
    let router = router();
    register(&router, "amira@falcon.example", "merchant").await;

    let response = send_json(
        &router,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({
            "email": "amira@falcon.example",
            "password": "incorrect",
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn requests_without_a_token_are_unauthorized() {
    let response = send_json(&router(), "GET", "/api/application", None, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let payload = read_json_body(response).await;
    assert_eq!(payload["error"], "Token required");
}

#[tokio::test]
async fn garbage_tokens_are_unauthorized() {
    let response =
        send_json(&router(), "GET", "/api/application", Some("not-a-jwt"), None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let payload = read_json_body(response).await;
    assert_eq!(payload["error"], "Invalid token");
}

#[tokio::test]
async fn merchant_wizard_round_trip() {
    let router = router();
    let token = register(&router, "amira@falcon.example", "merchant").await;

    let empty = send_json(&router, "GET", "/api/application", Some(&token), None).await;
    assert_eq!(read_json_body(empty).await, json!({}));

    let created = send_json(
        &router,
        "POST",
        "/api/application",
        Some(&token),
        Some(profile_json()),
    )
    .await;
    assert_eq!(created.status(), StatusCode::CREATED);
    let payload = read_json_body(created).await;
    assert_eq!(payload["status"], "draft");
    assert!(payload["id"].as_str().is_some());

    let mut updated_profile = complete_profile();
    updated_profile.owner_name = "Amira H. Hassan".to_string();
    let updated = send_json(
        &router,
        "PUT",
        "/api/application",
        Some(&token),
        Some(serde_json::to_value(updated_profile).unwrap()),
    )
    .await;
    assert_eq!(updated.status(), StatusCode::OK);
    let payload = read_json_body(updated).await;
    assert_eq!(payload["owner_name"], "Amira H. Hassan");

    let submitted = send_json(
        &router,
        "POST",
        "/api/application/submit",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(submitted.status(), StatusCode::OK);
    let payload = read_json_body(submitted).await;
    assert_eq!(payload["message"], "Application submitted for review");

    let fetched = send_json(&router, "GET", "/api/application", Some(&token), None).await;
    let payload = read_json_body(fetched).await;
    assert_eq!(payload["status"], "pending");

    let locked = send_json(
        &router,
        "PUT",
        "/api/application",
        Some(&token),
        Some(profile_json()),
    )
    .await;
    assert_eq!(locked.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn reviewer_console_round_trip() {
    let router = router();
    let merchant_token = register(&router, "amira@falcon.example", "merchant").await;
    send_json(
        &router,
        "POST",
        "/api/application",
        Some(&merchant_token),
        Some(profile_json()),
    )
    .await;
    send_json(
        &router,
        "POST",
        "/api/application/submit",
        Some(&merchant_token),
        None,
    )
    .await;

    let reviewer_token = register(&router, "lena@kyc.example", "reviewer").await;

    let list = send_json(
        &router,
        "GET",
        "/api/applications?status=pending",
        Some(&reviewer_token),
        None,
    )
    .await;
    assert_eq!(list.status(), StatusCode::OK);
    let rows = read_json_body(list).await;
    let rows = rows.as_array().expect("array payload");
    assert_eq!(rows.len(), 1);
    let id = rows[0]["id"].as_str().expect("row id").to_string();
    assert_eq!(rows[0]["merchant_name"], "Amira Hassan");

    let detail = send_json(
        &router,
        "GET",
        &format!("/api/applications/{id}"),
        Some(&reviewer_token),
        None,
    )
    .await;
    assert_eq!(detail.status(), StatusCode::OK);
    let payload = read_json_body(detail).await;
    assert_eq!(payload["business_name"], "Falcon Trading LLC");
    assert_eq!(payload["documents"], json!([]));

    let decided = send_json(
        &router,
        "POST",
        &format!("/api/applications/{id}/review"),
        Some(&reviewer_token),
        Some(json!({ "status": "approved", "comment": "Looks complete" })),
    )
    .await;
    assert_eq!(decided.status(), StatusCode::OK);
    let payload = read_json_body(decided).await;
    assert_eq!(payload["message"], "Status updated");
    assert_eq!(payload["status"], "approved");

    // The application is no longer pending; a second decision is refused.
    let again = send_json(
        &router,
        "POST",
        &format!("/api/applications/{id}/review"),
        Some(&reviewer_token),
        Some(json!({ "status": "rejected" })),
    )
    .await;
    assert_eq!(again.status(), StatusCode::CONFLICT);

    let refreshed = send_json(
        &router,
        "GET",
        "/api/applications",
        Some(&reviewer_token),
        None,
    )
    .await;
    let rows = read_json_body(refreshed).await;
    assert_eq!(rows[0]["status"], "approved");
}

#[tokio::test]
async fn merchants_cannot_reach_the_review_console() {
    let router = router();
    let token = register(&router, "amira@falcon.example", "merchant").await;

    let response = send_json(&router, "GET", "/api/applications", Some(&token), None).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let payload = read_json_body(response).await;
    assert_eq!(payload["error"], "Access denied");
}

#[tokio::test]
async fn unknown_status_filters_are_rejected() {
    let router = router();
    let token = register(&router, "lena@kyc.example", "reviewer").await;

    let response = send_json(
        &router,
        "GET",
        "/api/applications?status=bogus",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn upload_then_view_document_with_query_token() {
    let router = router();
    let merchant_token = register(&router, "amira@falcon.example", "merchant").await;
    send_json(
        &router,
        "POST",
        "/api/application",
        Some(&merchant_token),
        Some(profile_json()),
    )
    .await;

    let uploaded = router
        .clone()
        .oneshot(multipart_request(
            "/api/application/documents",
            &merchant_token,
            "business_license",
            "trade-license.pdf",
            b"%PDF-1.4 license",
        ))
        .await
        .expect("route executes");
    assert_eq!(uploaded.status(), StatusCode::CREATED);
    let payload = read_json_body(uploaded).await;
    let document_id = payload["id"].as_str().expect("document id").to_string();
    assert_eq!(payload["doc_type"], "business_license");

    // The document link carries the token as a query parameter.
    let viewed = send_json(
        &router,
        "GET",
        &format!("/api/documents/{document_id}/url?token={merchant_token}"),
        None,
        None,
    )
    .await;
    assert_eq!(viewed.status(), StatusCode::OK);
    assert_eq!(
        viewed
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok()),
        Some("application/pdf")
    );
    let bytes = axum::body::to_bytes(viewed.into_body(), 64 * 1024)
        .await
        .expect("read body");
    assert_eq!(&bytes[..], b"%PDF-1.4 license");
}

#[tokio::test]
async fn upload_without_doc_type_is_a_bad_request() {
    let router = router();
    let token = register(&router, "amira@falcon.example", "merchant").await;
    send_json(
        &router,
        "POST",
        "/api/application",
        Some(&token),
        Some(profile_json()),
    )
    .await;

    let boundary = "onboarding-test-boundary";
    let body = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"a.pdf\"\r\nContent-Type: application/pdf\r\n\r\npdf\r\n--{boundary}--\r\n"
    );
    let request = Request::builder()
        .method("POST")
        .uri("/api/application/documents")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap();
    let response = router.clone().oneshot(request).await.expect("route executes");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn missing_documents_and_applications_are_not_found() {
    let router = router();
    let reviewer_token = register(&router, "lena@kyc.example", "reviewer").await;

    let detail = send_json(
        &router,
        "GET",
        "/api/applications/missing",
        Some(&reviewer_token),
        None,
    )
    .await;
    assert_eq!(detail.status(), StatusCode::NOT_FOUND);

    let document = send_json(
        &router,
        "GET",
        "/api/documents/missing/url",
        Some(&reviewer_token),
        None,
    )
    .await;
    assert_eq!(document.status(), StatusCode::NOT_FOUND);
}
