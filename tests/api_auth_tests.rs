// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API authentication, CORS and security header tests.
//!
//! These tests verify that:
//! 1. Protected routes reject requests without valid tokens
//! 2. Registration and login issue working session tokens
//! 3. CORS preflight honors the configured frontend origin
//! 4. Security headers are present on every response

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::Serialize;
use serde_json::json;
use std::time::{SystemTime, UNIX_EPOCH};
use studyhub::config::Environment;

mod common;
use common::{create_test_app, create_test_app_with, get_request, json_request, test_config};

/// Create a JWT for `user_id` with the given lifetime.
fn create_test_jwt(user_id: &str, signing_key: &[u8], ttl_secs: i64) -> String {
    #[derive(Serialize)]
    struct Claims {
        sub: String,
        exp: i64,
        iat: i64,
    }

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64;

    let claims = Claims {
        sub: user_id.to_string(),
        exp: now + ttl_secs,
        iat: now,
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )
    .unwrap()
}

fn preflight(origin: &str) -> Request<Body> {
    Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/courses")
        .header(header::ORIGIN, origin)
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_health_is_public() {
    let app = create_test_app();

    let (status, body) = app.call(get_request("/api/health", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok", "message": "Server is running" }));
}

#[tokio::test]
async fn test_protected_route_without_token() {
    let app = create_test_app();

    let (status, body) = app.call(get_request("/api/courses", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn test_protected_route_with_invalid_token() {
    let app = create_test_app();

    let (status, _) = app
        .call(get_request("/api/courses", Some("invalid.token.here")))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_expired_and_foreign_tokens_rejected() {
    let app = create_test_app();
    let user = app.seed_user("student@uni.edu", "password1").await;
    let key = app.state.config.jwt_signing_key.clone();

    let expired = create_test_jwt(&user.id, &key, -3600);
    let (status, _) = app.call(get_request("/api/auth/me", Some(expired.as_str()))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let forged = create_test_jwt(&user.id, b"some_other_key_of_enough_length!", 3600);
    let (status, _) = app.call(get_request("/api/auth/me", Some(forged.as_str()))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Valid signature, but the account no longer exists.
    let orphan = create_test_jwt("deleted-user", &key, 3600);
    let (status, _) = app.call(get_request("/api/auth/me", Some(orphan.as_str()))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let valid = create_test_jwt(&user.id, &key, 3600);
    let (status, body) = app.call(get_request("/api/auth/me", Some(valid.as_str()))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "student@uni.edu");
}

#[tokio::test]
async fn test_register_login_me() {
    let app = create_test_app();

    let (status, body) = app
        .call(json_request(
            Method::POST,
            "/api/auth/register",
            None,
            json!({
                "email": " New@Uni.edu ",
                "password": "secret12",
                "fullName": "Ada Student",
                "faculty": "Science",
                "department": "Physics",
                "level": "200"
            }),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["email"], "new@uni.edu");
    assert_eq!(body["fullName"], "Ada Student");
    assert!(body.get("passwordHash").is_none());
    let token = body["token"].as_str().unwrap().to_string();

    let (status, body) = app.call(get_request("/api/auth/me", Some(token.as_str()))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["level"], "200");

    // Same email in a different case is a duplicate.
    let (status, body) = app
        .call(json_request(
            Method::POST,
            "/api/auth/register",
            None,
            json!({
                "email": "NEW@uni.edu",
                "password": "secret12",
                "fullName": "Someone Else",
                "faculty": "Science",
                "department": "Physics",
                "level": "100"
            }),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "User already exists");

    let (status, body) = app
        .call(json_request(
            Method::POST,
            "/api/auth/login",
            None,
            json!({ "email": "new@uni.edu", "password": "secret12" }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["token"].is_string());

    let (status, body) = app
        .call(json_request(
            Method::POST,
            "/api/auth/login",
            None,
            json!({ "email": "new@uni.edu", "password": "wrong-password" }),
        ))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid credentials");

    let (status, body) = app
        .call(json_request(
            Method::POST,
            "/api/auth/login",
            None,
            json!({ "email": "ghost@uni.edu", "password": "secret12" }),
        ))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid credentials");
}

#[tokio::test]
async fn test_register_validation_errors() {
    let app = create_test_app();

    let (status, body) = app
        .call(json_request(
            Method::POST,
            "/api/auth/register",
            None,
            json!({ "email": "not-an-email", "password": "123", "level": "600" }),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let errors = body["errors"].as_object().unwrap();
    for field in ["email", "password", "full_name", "faculty", "department", "level"] {
        assert!(errors.contains_key(field), "missing error for {}", field);
    }
}

#[tokio::test]
async fn test_malformed_json_gets_json_error() {
    let app = create_test_app();

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = app.call(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn test_cors_preflight() {
    let app = create_test_app();

    let response = app.send(preflight("http://localhost:3000")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "http://localhost:3000"
    );
    assert!(response
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_METHODS));

    let response = app.send(preflight("https://evil.example")).await;
    assert!(!response
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
}

#[tokio::test]
async fn test_production_cors_only_allows_frontend() {
    let mut config = test_config();
    config.environment = Environment::Production;
    config.frontend_url = "https://studyhub.example".to_string();
    let app = create_test_app_with(config, Default::default());

    let response = app.send(preflight("https://studyhub.example")).await;
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "https://studyhub.example"
    );

    let response = app.send(preflight("http://localhost:5173")).await;
    assert!(!response
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
}

#[tokio::test]
async fn test_security_headers() {
    let app = create_test_app();

    let response = app.send(get_request("/api/health", None)).await;
    let headers = response.headers();
    assert_eq!(headers[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
    assert_eq!(headers[header::X_FRAME_OPTIONS], "DENY");
    assert_eq!(headers[header::CACHE_CONTROL], "no-store");
    assert!(headers.contains_key(header::CONTENT_SECURITY_POLICY));
    // HSTS only behind TLS in production.
    assert!(!headers.contains_key(header::STRICT_TRANSPORT_SECURITY));

    let mut config = test_config();
    config.environment = Environment::Production;
    let app = create_test_app_with(config, Default::default());
    let response = app.send(get_request("/api/health", None)).await;
    assert!(response
        .headers()
        .contains_key(header::STRICT_TRANSPORT_SECURITY));
}
