// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account routes: registration, login, profile and password reset.

use axum::{extract::State, http::StatusCode, routing::get, routing::post, Extension, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::middleware::auth::{create_jwt, AuthUser};
use crate::models::course::validate_level;
use crate::models::user::normalize_email;
use crate::models::{User, UserProfile};
use crate::routes::extract::ApiJson;
use crate::services::password_reset::{
    ForgotPasswordRequest, ResetPasswordRequest, VerifyOtpRequest,
};
use crate::AppState;

/// Routes that need no session.
pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/forgot-password", post(forgot_password))
        .route("/api/auth/verify-otp", post(verify_otp))
        .route("/api/auth/reset-password", post(reset_password))
}

/// Routes behind `require_auth`.
pub fn protected_routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/auth/me", get(get_me))
}

/// Profile plus a fresh session token.
#[derive(Serialize)]
pub struct SessionResponse {
    #[serde(flatten)]
    pub user: UserProfile,
    pub token: String,
}

impl SessionResponse {
    fn issue(user: &User, signing_key: &[u8]) -> Result<Self> {
        Ok(Self {
            user: UserProfile::from(user),
            token: create_jwt(&user.id, signing_key)?,
        })
    }
}

// ─── Registration & Login ────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default)]
    #[validate(email(message = "Please provide a valid email"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Full name is required"))]
    pub full_name: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Faculty is required"))]
    pub faculty: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Department is required"))]
    pub department: String,
    #[serde(default)]
    #[validate(custom(function = "validate_level"))]
    pub level: String,
}

async fn register(
    State(state): State<Arc<AppState>>,
    ApiJson(mut req): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<SessionResponse>)> {
    req.email = normalize_email(&req.email);
    req.full_name = req.full_name.trim().to_string();
    req.faculty = req.faculty.trim().to_string();
    req.department = req.department.trim().to_string();
    req.validate()?;

    let user = User::new(
        &req.email,
        &req.password,
        req.full_name,
        req.faculty,
        req.department,
        req.level,
    )?;
    state.db.insert_user(&user).await?;
    tracing::info!(user_id = %user.id, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(SessionResponse::issue(&user, &state.config.jwt_signing_key)?),
    ))
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[serde(default)]
    #[validate(email(message = "Please provide a valid email"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

async fn login(
    State(state): State<Arc<AppState>>,
    ApiJson(mut req): ApiJson<LoginRequest>,
) -> Result<Json<SessionResponse>> {
    req.email = normalize_email(&req.email);
    req.validate()?;

    let user = match state.db.find_user_by_email(&req.email).await? {
        Some(user) if user.verify_password(&req.password) => user,
        _ => {
            tracing::debug!(email = %req.email, "Login rejected");
            return Err(AppError::InvalidCredentials);
        }
    };

    Ok(Json(SessionResponse::issue(
        &user,
        &state.config.jwt_signing_key,
    )?))
}

async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<UserProfile>> {
    let user = state
        .db
        .get_user(&user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    Ok(Json(UserProfile::from(&user)))
}

// ─── Password Reset ──────────────────────────────────────────

#[derive(Serialize)]
struct ForgotPasswordResponse {
    success: bool,
    message: &'static str,
    /// Present only when the email could not be sent in development
    #[serde(skip_serializing_if = "Option::is_none")]
    otp: Option<String>,
}

async fn forgot_password(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<ForgotPasswordRequest>,
) -> Result<Json<ForgotPasswordResponse>> {
    let outcome = state.password_reset.request(req).await?;
    Ok(Json(ForgotPasswordResponse {
        success: true,
        message: "OTP code sent to your email",
        otp: outcome.dev_code,
    }))
}

#[derive(Serialize)]
struct VerifyOtpResponse {
    success: bool,
    message: &'static str,
    token: String,
}

async fn verify_otp(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<VerifyOtpRequest>,
) -> Result<Json<VerifyOtpResponse>> {
    let token = state.password_reset.verify(req).await?;
    Ok(Json(VerifyOtpResponse {
        success: true,
        message: "OTP verified successfully",
        token,
    }))
}

#[derive(Serialize)]
struct ResetPasswordResponse {
    success: bool,
    message: &'static str,
    token: String,
    user: UserProfile,
}

async fn reset_password(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<ResetPasswordRequest>,
) -> Result<Json<ResetPasswordResponse>> {
    let done = state.password_reset.reset(req).await?;
    Ok(Json(ResetPasswordResponse {
        success: true,
        message: "Password reset successfully",
        token: done.session_token,
        user: UserProfile::from(&done.user),
    }))
}
