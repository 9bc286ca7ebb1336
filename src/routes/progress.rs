// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Video progress routes.

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::VideoProgress;
use crate::routes::extract::ApiJson;
use crate::services::progress::{CourseProgress, ProgressUpdate};
use crate::AppState;
use axum::{
    extract::{Path, State},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Serialize;
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/progress/complete", post(mark_complete))
        .route("/api/progress/watch-time", post(update_watch_time))
        .route("/api/progress/track", post(track))
        .route("/api/progress/course/{course_id}", get(course_progress))
}

#[derive(Serialize)]
struct ProgressResponse {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    progress: Option<VideoProgress>,
}

async fn mark_complete(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ApiJson(update): ApiJson<ProgressUpdate>,
) -> Result<Json<ProgressResponse>> {
    let progress = state.progress_service.mark_complete(&user.id, &update).await?;
    Ok(Json(ProgressResponse {
        success: true,
        progress: Some(progress),
    }))
}

async fn update_watch_time(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ApiJson(update): ApiJson<ProgressUpdate>,
) -> Result<Json<ProgressResponse>> {
    let progress = state
        .progress_service
        .update_watch_time(&user.id, &update)
        .await?;
    Ok(Json(ProgressResponse {
        success: true,
        progress: Some(progress),
    }))
}

async fn track(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ApiJson(update): ApiJson<ProgressUpdate>,
) -> Result<Json<ProgressResponse>> {
    state.progress_service.track(&user.id, &update).await?;
    Ok(Json(ProgressResponse {
        success: true,
        progress: None,
    }))
}

async fn course_progress(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(course_id): Path<String>,
) -> Result<Json<CourseProgress>> {
    Ok(Json(
        state
            .progress_service
            .course_progress(&user.id, &course_id)
            .await?,
    ))
}
