// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! StudyHub: course catalog, video lessons and progress tracking for students
//!
//! This crate provides the JSON API behind the StudyHub web app: accounts
//! and password reset, courses imported from YouTube playlists, study
//! materials, per-video progress, and course administration.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use config::Config;
use db::Store;
use services::{
    AccessPolicy, EmailNotifier, ImportService, PasswordResetService, ProgressService,
    YouTubeClient,
};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Arc<dyn Store>,
    pub policy: AccessPolicy,
    pub password_reset: PasswordResetService,
    pub import_service: ImportService,
    pub progress_service: ProgressService,
}

impl AppState {
    /// Wire services over a store and an email notifier.
    pub fn new(config: Config, db: Arc<dyn Store>, notifier: Arc<dyn EmailNotifier>) -> Self {
        let policy = AccessPolicy::new(config.admin_email.clone());
        let youtube = YouTubeClient::new(
            config.youtube_api_key.clone(),
            config.youtube_api_url.clone(),
        );

        Self {
            password_reset: PasswordResetService::new(
                db.clone(),
                notifier,
                config.jwt_signing_key.clone(),
                config.environment,
            ),
            import_service: ImportService::new(db.clone(), youtube, policy.clone()),
            progress_service: ProgressService::new(db.clone()),
            policy,
            db,
            config,
        }
    }
}
