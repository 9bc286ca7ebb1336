// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Password reset by emailed one-time passcode.
//!
//! Three steps, each keyed on the normalized email:
//! 1. `request` issues a 6-digit code and emails it
//! 2. `verify` consumes the code and releases the capability token
//! 3. `reset` accepts the capability token and sets the new password
//!
//! At most one unused passcode exists per email, and a code verifies at
//! most once.

use crate::config::Environment;
use crate::db::Store;
use crate::error::AppError;
use crate::middleware::auth::create_jwt;
use crate::models::user::normalize_email;
use crate::models::{OneTimePasscode, OtpLookup, User};
use crate::services::email::EmailNotifier;
use chrono::Utc;
use ring::rand::{SecureRandom, SystemRandom};
use serde::Deserialize;
use std::sync::Arc;
use validator::{Validate, ValidationError};

/// Capability token length in random bytes (hex-encoded on the wire).
const CAPABILITY_TOKEN_BYTES: usize = 32;

/// Number of distinct reset codes.
const CODE_SPACE: u32 = 1_000_000;

#[derive(Debug, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[serde(default)]
    #[validate(email(message = "Please provide a valid email"))]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct VerifyOtpRequest {
    #[serde(default)]
    #[validate(email(message = "Please provide a valid email"))]
    pub email: String,
    #[serde(default)]
    #[validate(custom(function = "validate_otp_format"))]
    pub otp: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    #[serde(default)]
    #[validate(email(message = "Please provide a valid email"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Reset token is required"))]
    pub token: String,
    #[serde(default)]
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

fn validate_otp_format(otp: &str) -> Result<(), ValidationError> {
    if otp.len() == 6 && otp.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(ValidationError::new("otp").with_message("OTP must be 6 digits".into()))
    }
}

/// Outcome of a reset request.
#[derive(Debug)]
pub struct ResetRequested {
    /// The issued code, returned only when email delivery failed outside
    /// production.
    pub dev_code: Option<String>,
}

/// Outcome of a completed reset.
#[derive(Debug)]
pub struct ResetCompleted {
    pub user: User,
    /// Fresh session token
    pub session_token: String,
}

/// Generate a uniformly distributed 6-digit code.
pub fn generate_reset_code(rng: &dyn SecureRandom) -> Result<String, AppError> {
    // Largest multiple of CODE_SPACE representable in u32; draws at or
    // above it are rejected so every code is equally likely.
    const LIMIT: u32 = u32::MAX - (u32::MAX % CODE_SPACE);

    loop {
        let mut buf = [0u8; 4];
        rng.fill(&mut buf)
            .map_err(|_| AppError::Internal(anyhow::anyhow!("System RNG failure")))?;
        let n = u32::from_be_bytes(buf);
        if n < LIMIT {
            return Ok(format!("{:06}", n % CODE_SPACE));
        }
    }
}

/// Generate a hex capability token.
pub fn generate_capability_token(rng: &dyn SecureRandom) -> Result<String, AppError> {
    let mut buf = [0u8; CAPABILITY_TOKEN_BYTES];
    rng.fill(&mut buf)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("System RNG failure")))?;
    Ok(hex::encode(buf))
}

/// Orchestrates the reset flow over the store and the email notifier.
pub struct PasswordResetService {
    db: Arc<dyn Store>,
    notifier: Arc<dyn EmailNotifier>,
    signing_key: Vec<u8>,
    environment: Environment,
    rng: SystemRandom,
}

impl PasswordResetService {
    pub fn new(
        db: Arc<dyn Store>,
        notifier: Arc<dyn EmailNotifier>,
        signing_key: Vec<u8>,
        environment: Environment,
    ) -> Self {
        Self {
            db,
            notifier,
            signing_key,
            environment,
            rng: SystemRandom::new(),
        }
    }

    /// Issue a new passcode for a registered email and send it.
    pub async fn request(&self, mut req: ForgotPasswordRequest) -> Result<ResetRequested, AppError> {
        req.email = normalize_email(&req.email);
        req.validate()?;
        let email = req.email;

        if self.db.find_user_by_email(&email).await?.is_none() {
            return Err(AppError::NotFound(
                "No account found with this email address. Please sign up first.".to_string(),
            ));
        }

        let code = generate_reset_code(&self.rng)?;
        let token = generate_capability_token(&self.rng)?;

        let replaced = self.db.delete_otps(&email, false).await?;
        let otp = OneTimePasscode::issue(email.clone(), code.clone(), token, Utc::now());
        self.db.insert_otp(&otp).await?;
        tracing::info!(email = %email, otp_id = %otp.id, replaced, "Password reset code issued");

        match self.notifier.send_reset_code(&email, &code).await {
            Ok(()) => Ok(ResetRequested { dev_code: None }),
            Err(e) if self.environment.is_production() => {
                tracing::error!(email = %email, error = %e, "Failed to send reset email");
                Err(AppError::Email(e))
            }
            Err(e) => {
                tracing::warn!(
                    email = %email,
                    code = %code,
                    error = %e,
                    "Reset email not sent, returning code for development"
                );
                Ok(ResetRequested {
                    dev_code: Some(code),
                })
            }
        }
    }

    /// Consume a code and return the capability token for the reset step.
    pub async fn verify(&self, mut req: VerifyOtpRequest) -> Result<String, AppError> {
        req.email = normalize_email(&req.email);
        req.otp = req.otp.trim().to_string();
        req.validate()?;

        let invalid = || AppError::BadRequest("Invalid or expired OTP".to_string());

        let otp = self
            .db
            .find_otp(&req.email, OtpLookup::Code(&req.otp), Utc::now())
            .await?
            .ok_or_else(invalid)?;

        // Lost a race with a concurrent verification of the same code.
        if !self.db.mark_otp_used(&otp.id).await? {
            return Err(invalid());
        }

        tracing::info!(email = %req.email, otp_id = %otp.id, "Password reset code verified");
        Ok(otp.capability_token)
    }

    /// Set a new password using a verified capability token.
    pub async fn reset(&self, mut req: ResetPasswordRequest) -> Result<ResetCompleted, AppError> {
        req.email = normalize_email(&req.email);
        req.validate()?;

        self.db
            .find_otp(&req.email, OtpLookup::Capability(&req.token), Utc::now())
            .await?
            .ok_or_else(|| AppError::BadRequest("Invalid or expired reset token".to_string()))?;

        let mut user = self
            .db
            .find_user_by_email(&req.email)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        user.set_password(&req.password)?;
        self.db.update_user(&user).await?;
        self.db.delete_otps(&req.email, true).await?;

        let session_token = create_jwt(&user.id, &self.signing_key)?;
        tracing::info!(user_id = %user.id, "Password reset completed");

        Ok(ResetCompleted {
            user,
            session_token,
        })
    }
}
