// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.
//!
//! Every failure reaches the client as a JSON body with a `message` field.

use crate::services::email::EmailError;
use crate::services::youtube::GatewayError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::collections::BTreeMap;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not authenticated")]
    Unauthorized,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    /// Field-level validation failures.
    #[error("Validation failed")]
    Validation(BTreeMap<String, String>),

    /// Duplicate unique key.
    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("Failed to send email: {0}")]
    Email(#[from] EmailError),

    /// Server-side misconfiguration; the message is safe to show.
    #[error("{0}")]
    Misconfigured(&'static str),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let fields = errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| {
                let message = errs
                    .first()
                    .and_then(|e| e.message.as_ref())
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid value for {}", field));
                (field.to_string(), message)
            })
            .collect();
        AppError::Validation(fields)
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<BTreeMap<String, String>>,
}

impl AppError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized | AppError::InvalidToken | AppError::InvalidCredentials => {
                StatusCode::UNAUTHORIZED
            }
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) | AppError::Validation(_) | AppError::Conflict(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Gateway(err) => match err {
                GatewayError::Transport(_) => StatusCode::SERVICE_UNAVAILABLE,
                GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
                GatewayError::MalformedRequest(_) => StatusCode::BAD_REQUEST,
                GatewayError::AccessDenied
                | GatewayError::Upstream { .. }
                | GatewayError::Decode(_) => StatusCode::BAD_GATEWAY,
            },
            AppError::Email(_)
            | AppError::Misconfigured(_)
            | AppError::Database(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let (message, errors) = match self {
            AppError::Validation(fields) => {
                let first = fields
                    .values()
                    .next()
                    .cloned()
                    .unwrap_or_else(|| "Validation failed".to_string());
                (first, Some(fields))
            }
            AppError::Gateway(ref err) => {
                tracing::warn!(error = %err, "YouTube gateway error");
                (self.to_string(), None)
            }
            AppError::Email(ref err) => {
                tracing::error!(error = %err, "Email delivery failed");
                (
                    "Failed to send email. Please try again later.".to_string(),
                    None,
                )
            }
            AppError::Database(ref msg) => {
                tracing::error!(error = %msg, "Database error");
                ("Server error occurred".to_string(), None)
            }
            AppError::Internal(ref err) => {
                tracing::error!(error = ?err, "Internal server error");
                ("Server error occurred".to_string(), None)
            }
            other => (other.to_string(), None),
        };

        (status, Json(ErrorResponse { message, errors })).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
