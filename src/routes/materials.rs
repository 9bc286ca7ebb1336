// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! PDF study material uploads, shared by admin and course-admin routes.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{Material, MaterialKind};
use crate::AppState;
use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

/// Largest accepted file.
pub const MAX_FILE_BYTES: usize = 10 * 1024 * 1024;

/// Request body limit for upload routes: the file plus form overhead.
pub const UPLOAD_BODY_LIMIT: usize = MAX_FILE_BYTES + 64 * 1024;

/// Subdirectory of the upload dir, also the URL path segment.
const MATERIALS_DIR: &str = "materials";

#[derive(Default)]
struct UploadForm {
    topic_id: Option<String>,
    material_type: Option<String>,
    title: Option<String>,
    file: Option<Vec<u8>>,
}

#[derive(Serialize)]
pub struct UploadResponse {
    pub message: &'static str,
    pub material: Material,
}

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::BadRequest("File too large. Maximum size is 10MB".to_string())
    } else {
        AppError::BadRequest(e.body_text())
    }
}

async fn read_form(mut multipart: Multipart) -> Result<UploadForm> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                if field.content_type() != Some("application/pdf") {
                    return Err(AppError::BadRequest(
                        "Only PDF files are allowed".to_string(),
                    ));
                }
                let bytes = field.bytes().await.map_err(multipart_error)?;
                if bytes.len() > MAX_FILE_BYTES {
                    return Err(AppError::BadRequest(
                        "File too large. Maximum size is 10MB".to_string(),
                    ));
                }
                form.file = Some(bytes.to_vec());
            }
            "topicId" | "materialType" | "title" => {
                let value = field.text().await.map_err(multipart_error)?;
                let value = Some(value.trim().to_string()).filter(|v| !v.is_empty());
                match name.as_str() {
                    "topicId" => form.topic_id = value,
                    "materialType" => form.material_type = value,
                    _ => form.title = value,
                }
            }
            _ => {}
        }
    }

    Ok(form)
}

/// Attach an uploaded PDF to a topic.
///
/// The file is only written once the topic exists and the caller may manage
/// its course, and is removed again if the topic update fails.
pub async fn upload_material(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    let form = read_form(multipart).await?;

    let file = form
        .file
        .ok_or_else(|| AppError::BadRequest("No file uploaded".to_string()))?;
    let (Some(topic_id), Some(material_type), Some(title)) =
        (form.topic_id, form.material_type, form.title)
    else {
        return Err(AppError::BadRequest(
            "Missing required fields: topicId, materialType, title".to_string(),
        ));
    };
    let kind: MaterialKind = material_type.parse().map_err(|_| {
        AppError::BadRequest("materialType must be pdf, past-question, or note".to_string())
    })?;

    let mut topic = state
        .db
        .get_topic(&topic_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Topic not found".to_string()))?;
    let course = state
        .db
        .get_course(&topic.course_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Course not found".to_string()))?;
    state.policy.require_course(&user, &course)?;

    let dir = state.config.upload_dir.join(MATERIALS_DIR);
    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to create upload dir: {}", e)))?;
    let file_name = format!("file-{}.pdf", uuid::Uuid::new_v4().simple());
    let path: PathBuf = dir.join(&file_name);
    tokio::fs::write(&path, &file)
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to store upload: {}", e)))?;

    let material = Material {
        id: uuid::Uuid::new_v4().to_string(),
        kind,
        title,
        file_url: format!("/uploads/{}/{}", MATERIALS_DIR, file_name),
        uploaded_at: Utc::now(),
    };
    topic.materials.push(material.clone());

    if let Err(e) = state.db.save_topic(&topic).await {
        if let Err(rm) = tokio::fs::remove_file(&path).await {
            tracing::warn!(path = %path.display(), error = %rm, "Failed to remove orphaned upload");
        }
        return Err(e);
    }

    tracing::info!(
        topic_id = %topic.id,
        material_id = %material.id,
        bytes = file.len(),
        "Material uploaded"
    );

    Ok(Json(UploadResponse {
        message: "Material uploaded successfully",
        material,
    }))
}
