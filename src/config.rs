// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Loaded once at startup and passed by value into the services that need
//! it. Nothing outside this module reads the process environment.

use std::env;
use std::path::PathBuf;

/// Default base URL of the YouTube Data API.
pub const YOUTUBE_API_URL: &str = "https://www.googleapis.com/youtube/v3";

/// Deployment environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            _ => Environment::Development,
        }
    }

    pub fn is_production(self) -> bool {
        self == Environment::Production
    }
}

/// Outbound SMTP settings. Absent when email delivery is not configured.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    /// Implicit TLS (port 465 style) instead of STARTTLS.
    pub secure: bool,
    pub username: String,
    pub password: String,
    pub from_name: String,
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Allowed browser origin for CORS
    pub frontend_url: String,
    /// GCP project ID (Firestore)
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,
    pub environment: Environment,
    /// Directory that receives uploaded study materials
    pub upload_dir: PathBuf,
    /// Keep all data in process memory instead of Firestore (`STORE=memory`)
    pub memory_store: bool,

    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// The single super-admin identity. Admin routes fail closed without it.
    pub admin_email: Option<String>,
    /// Used only to seed the super-admin account at startup.
    pub admin_password: Option<String>,
    /// YouTube Data API key. Imports fail closed without it.
    pub youtube_api_key: Option<String>,
    pub youtube_api_url: String,
    pub smtp: Option<SmtpConfig>,
}

impl Config {
    /// Deterministic configuration for tests.
    pub fn test_default() -> Self {
        Self {
            frontend_url: "http://localhost:3000".to_string(),
            gcp_project_id: "test-project".to_string(),
            port: 5000,
            environment: Environment::Development,
            upload_dir: env::temp_dir().join("studyhub-test-uploads"),
            memory_store: true,
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            admin_email: Some("admin@studyhub.test".to_string()),
            admin_password: None,
            youtube_api_key: Some("test_youtube_key".to_string()),
            youtube_api_url: YOUTUBE_API_URL.to_string(),
            smtp: None,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// A `.env` file in the working directory is honored for local development.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "5000".to_string())
                .parse()
                .unwrap_or(5000),
            environment: Environment::parse(
                &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
            ),
            upload_dir: env::var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("uploads")),
            memory_store: optional_var("STORE").is_some_and(|v| v.eq_ignore_ascii_case("memory")),

            jwt_signing_key: env::var("JWT_SECRET")
                .map_err(|_| ConfigError::Missing("JWT_SECRET"))?
                .into_bytes(),
            admin_email: optional_var("ADMIN_EMAIL").map(|v| v.to_lowercase()),
            admin_password: optional_var("ADMIN_PASSWORD"),
            youtube_api_key: optional_var("YOUTUBE_API_KEY"),
            youtube_api_url: optional_var("YOUTUBE_API_URL")
                .unwrap_or_else(|| YOUTUBE_API_URL.to_string()),
            smtp: smtp_from_env()?,
        })
    }
}

/// Read a variable, treating empty or whitespace-only values as unset.
fn optional_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn smtp_from_env() -> Result<Option<SmtpConfig>, ConfigError> {
    let (Some(host), Some(username), Some(password)) = (
        optional_var("SMTP_HOST"),
        optional_var("EMAIL_USER"),
        optional_var("EMAIL_PASSWORD"),
    ) else {
        return Ok(None);
    };

    let port = match optional_var("SMTP_PORT") {
        Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid("SMTP_PORT"))?,
        None => 587,
    };

    Ok(Some(SmtpConfig {
        host,
        port,
        secure: optional_var("SMTP_SECURE").is_some_and(|v| v == "true"),
        username,
        password,
        from_name: optional_var("EMAIL_FROM_NAME").unwrap_or_else(|| "StudyHub".to_string()),
    }))
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        env::set_var("JWT_SECRET", "test_jwt_key_32_bytes_minimum!!");
        env::set_var("ADMIN_EMAIL", "  Admin@Example.com ");
        env::remove_var("SMTP_HOST");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.jwt_signing_key, b"test_jwt_key_32_bytes_minimum!!");
        assert_eq!(config.admin_email.as_deref(), Some("admin@example.com"));
        assert!(config.smtp.is_none());
    }

    #[test]
    fn test_environment_parse() {
        assert!(Environment::parse("production").is_production());
        assert!(Environment::parse(" PROD ").is_production());
        assert!(!Environment::parse("development").is_production());
        assert!(!Environment::parse("").is_production());
    }
}
