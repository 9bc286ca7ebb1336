// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! YouTube import handlers, mounted under both admin prefixes.

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::Topic;
use crate::routes::extract::ApiJson;
use crate::services::import::{ImportOutcome, PlaylistImport, VideoImport};
use crate::AppState;
use axum::{extract::State, Extension, Json};
use serde::Serialize;
use std::sync::Arc;

/// Topic summary returned after an import.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportedTopic {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub description: String,
    pub videos_count: usize,
}

impl From<&Topic> for ImportedTopic {
    fn from(topic: &Topic) -> Self {
        Self {
            id: topic.id.clone(),
            title: topic.title.clone(),
            description: topic.description.clone(),
            videos_count: topic.videos.len(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResponse {
    pub message: &'static str,
    pub topic: ImportedTopic,
    pub videos_count: usize,
    pub topic_count: u32,
}

impl ImportResponse {
    fn new(message: &'static str, outcome: ImportOutcome) -> Self {
        Self {
            message,
            topic: ImportedTopic::from(&outcome.topic),
            videos_count: outcome.videos_imported,
            topic_count: outcome.topic_count,
        }
    }
}

pub async fn import_playlist(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ApiJson(req): ApiJson<PlaylistImport>,
) -> Result<Json<ImportResponse>> {
    let outcome = state.import_service.import_playlist(&user, req).await?;
    Ok(Json(ImportResponse::new(
        "Playlist imported successfully",
        outcome,
    )))
}

pub async fn import_video(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ApiJson(req): ApiJson<VideoImport>,
) -> Result<Json<ImportResponse>> {
    let outcome = state.import_service.import_single_video(&user, req).await?;
    Ok(Json(ImportResponse::new("Video imported successfully", outcome)))
}
