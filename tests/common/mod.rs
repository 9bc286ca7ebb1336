// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    response::Response,
    Router,
};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use studyhub::config::Config;
use studyhub::db::{MemoryDb, Store};
use studyhub::middleware::auth::create_jwt;
use studyhub::models::{Course, User};
use studyhub::routes::create_router;
use studyhub::services::email::{EmailError, EmailNotifier};
use studyhub::AppState;
use tower::ServiceExt;

/// Records reset codes instead of sending them.
#[derive(Default)]
pub struct CapturingNotifier {
    sent: Mutex<Vec<(String, String)>>,
    fail: bool,
}

impl CapturingNotifier {
    /// A notifier whose every send fails, like an unreachable SMTP relay.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn last_code_for(&self, email: &str) -> Option<String> {
        self.sent()
            .into_iter()
            .rev()
            .find(|(to, _)| to == email)
            .map(|(_, code)| code)
    }
}

#[async_trait]
impl EmailNotifier for CapturingNotifier {
    async fn send_reset_code(&self, to: &str, code: &str) -> Result<(), EmailError> {
        if self.fail {
            return Err(EmailError::SendFailed("connection refused".to_string()));
        }
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), code.to_string()));
        Ok(())
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    pub db: Arc<MemoryDb>,
    pub notifier: Arc<CapturingNotifier>,
}

/// Test configuration with a private upload directory.
pub fn test_config() -> Config {
    let mut config = Config::test_default();
    config.upload_dir =
        std::env::temp_dir().join(format!("studyhub-test-{}", uuid::Uuid::new_v4().simple()));
    config
}

pub fn create_test_app() -> TestApp {
    create_test_app_with(test_config(), CapturingNotifier::default())
}

pub fn create_test_app_with(config: Config, notifier: CapturingNotifier) -> TestApp {
    let db = Arc::new(MemoryDb::new());
    let notifier = Arc::new(notifier);
    let state = Arc::new(AppState::new(config, db.clone(), notifier.clone()));

    TestApp {
        router: create_router(state.clone()),
        state,
        db,
        notifier,
    }
}

impl TestApp {
    /// Session token for `user_id`, signed with the app's key.
    pub fn token_for(&self, user_id: &str) -> String {
        create_jwt(user_id, &self.state.config.jwt_signing_key).unwrap()
    }

    pub async fn seed_user(&self, email: &str, password: &str) -> User {
        let user = User::new(
            email,
            password,
            "Test Student".to_string(),
            "Science".to_string(),
            "Physics".to_string(),
            "100".to_string(),
        )
        .unwrap();
        self.db.insert_user(&user).await.unwrap();
        user
    }

    /// The configured super admin, created on first call.
    pub async fn seed_admin(&self) -> User {
        let email = self.state.config.admin_email.clone().unwrap();
        match self.db.find_user_by_email(&email).await.unwrap() {
            Some(user) => user,
            None => self.seed_user(&email, "AdminPass1").await,
        }
    }

    pub async fn seed_course(&self, title: &str) -> Course {
        let course = Course::new(
            title.to_string(),
            "Science".to_string(),
            "Physics".to_string(),
            "100".to_string(),
            chrono::Utc::now(),
        );
        self.db.upsert_course(&course).await.unwrap();
        course
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Send a request and decode the JSON body (`Null` when empty).
    pub async fn call(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.send(request).await;
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).unwrap_or(Value::Null)
        };
        (status, json)
    }
}

/// JSON request with an optional bearer token.
pub fn json_request(method: Method, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// Body-less request with an optional bearer token.
pub fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(Method::GET).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}
