// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Course-admin routes.
//!
//! A course admin claims a course with the access token the super admin
//! issued for it, and may then manage that course's content. The super
//! admin passes every course check.

use crate::error::{AppError, Result};
use crate::middleware::auth::{create_jwt, AuthUser};
use crate::models::course::sort_for_admin;
use crate::models::{Course, CourseView, ForumLink, Topic};
use crate::routes::extract::ApiJson;
use crate::routes::imports::{import_playlist, import_video};
use crate::routes::materials::{upload_material, UPLOAD_BODY_LIMIT};
use crate::services::accounts::{find_or_create_course_admin, CourseAdminIdentity};
use crate::AppState;
use axum::{
    extract::{DefaultBodyLimit, Path, State},
    routing::{get, post, put},
    Extension, Json, Router,
};
use chrono::Utc;
use reqwest::Url;
use ring::rand::{SecureRandom, SystemRandom};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use subtle::ConstantTimeEq;

/// Access token length in random bytes (hex-encoded on the wire).
const ACCESS_TOKEN_BYTES: usize = 32;

/// Routes that need no session.
pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/course-admin/login", post(login))
}

/// Routes behind `require_auth`. Each handler checks course ownership.
pub fn protected_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/course-admin/generate-token", post(generate_token))
        .route("/api/course-admin/my-courses", get(my_courses))
        .route(
            "/api/course-admin/courses/{course_id}",
            get(course_details).put(update_course),
        )
        .route("/api/course-admin/import-playlist", post(import_playlist))
        .route("/api/course-admin/import-video", post(import_video))
        .route(
            "/api/course-admin/upload-material",
            post(upload_material).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route(
            "/api/course-admin/courses/{course_id}/forum-links",
            post(add_forum_link),
        )
        .route(
            "/api/course-admin/courses/{course_id}/forum-links/{link_id}",
            put(update_forum_link).delete(delete_forum_link),
        )
}

/// Load a course the caller may manage: 404 if missing, 403 if not theirs.
async fn managed_course(state: &AppState, user: &AuthUser, course_id: &str) -> Result<Course> {
    let course = state
        .db
        .get_course(course_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Course not found".to_string()))?;
    state.policy.require_course(user, &course)?;
    Ok(course)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// ─── Login & Token Issuance ──────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseAdminLoginRequest {
    #[serde(default)]
    pub course_id: String,
    #[serde(default)]
    pub access_token: String,
    pub email: Option<String>,
    /// Required when `email` names an existing account
    pub password: Option<String>,
    pub name: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseAdminSession {
    #[serde(rename = "_id")]
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub token: String,
    pub course_id: String,
    pub course_title: String,
    pub is_course_admin: bool,
}

/// Whether `presented` matches the course's issued token.
///
/// A course that was never issued a token cannot be claimed.
fn access_token_matches(course: &Course, presented: &str) -> bool {
    match course.access_token.as_deref() {
        Some(issued) if !issued.is_empty() => {
            bool::from(issued.as_bytes().ct_eq(presented.as_bytes()))
        }
        _ => false,
    }
}

async fn login(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<CourseAdminLoginRequest>,
) -> Result<Json<CourseAdminSession>> {
    let course_id = req.course_id.trim();
    let presented = req.access_token.trim();
    if course_id.is_empty() || presented.is_empty() {
        return Err(AppError::BadRequest(
            "Missing required fields: courseId, accessToken".to_string(),
        ));
    }

    let mut course = state
        .db
        .get_course(course_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Course not found".to_string()))?;

    if !access_token_matches(&course, presented) {
        tracing::warn!(course_id = %course.id, "Course admin login rejected");
        return Err(AppError::Forbidden("Invalid course access token".to_string()));
    }

    let user = find_or_create_course_admin(
        state.db.as_ref(),
        &state.policy,
        &course,
        CourseAdminIdentity {
            email: req.email.as_deref(),
            password: req.password.as_deref(),
            name: req.name.as_deref(),
        },
    )
    .await?;

    if course.course_admin.as_deref() != Some(user.id.as_str()) {
        course.course_admin = Some(user.id.clone());
        state.db.upsert_course(&course).await?;
        tracing::info!(course_id = %course.id, user_id = %user.id, "Course admin assigned");
    }

    let token = create_jwt(&user.id, &state.config.jwt_signing_key)?;

    Ok(Json(CourseAdminSession {
        id: user.id,
        email: user.email,
        full_name: user.full_name,
        token,
        course_id: course.id,
        course_title: course.title,
        is_course_admin: true,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateTokenRequest {
    #[serde(default)]
    pub course_id: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateTokenResponse {
    pub message: &'static str,
    pub token: String,
    pub course_id: String,
    pub course_title: String,
    pub note: &'static str,
}

/// Issue a fresh access token for a course, replacing any earlier one.
async fn generate_token(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ApiJson(req): ApiJson<GenerateTokenRequest>,
) -> Result<Json<GenerateTokenResponse>> {
    state.policy.ensure_super_admin(&user)?;

    if req.course_id.trim().is_empty() {
        return Err(AppError::BadRequest("Course ID is required".to_string()));
    }
    let mut course = state
        .db
        .get_course(req.course_id.trim())
        .await?
        .ok_or_else(|| AppError::NotFound("Course not found".to_string()))?;

    let mut buf = [0u8; ACCESS_TOKEN_BYTES];
    SystemRandom::new()
        .fill(&mut buf)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("System RNG failure")))?;
    let token = hex::encode(buf);

    course.access_token = Some(token.clone());
    state.db.upsert_course(&course).await?;
    tracing::info!(course_id = %course.id, "Course access token issued");

    Ok(Json(GenerateTokenResponse {
        message: "Access token generated successfully",
        token,
        course_id: course.id,
        course_title: course.title,
        note: "Share this token securely with the course administrator",
    }))
}

// ─── Managed Courses ─────────────────────────────────────────

async fn my_courses(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<CourseView>>> {
    let mut courses = if state.policy.is_super_admin(&user) {
        state.db.list_courses().await?
    } else {
        state.db.list_courses_by_admin(&user.id).await?
    };
    sort_for_admin(&mut courses);
    Ok(Json(courses.iter().map(CourseView::from).collect()))
}

#[derive(Serialize)]
pub struct ManagedCourseDetails {
    pub course: CourseView,
    pub topics: Vec<Topic>,
}

async fn course_details(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(course_id): Path<String>,
) -> Result<Json<ManagedCourseDetails>> {
    let course = managed_course(&state, &user, &course_id).await?;
    let topics = state.db.list_topics(&course.id).await?;
    Ok(Json(ManagedCourseDetails {
        course: CourseView::from(&course),
        topics,
    }))
}

/// Fields a course admin may change. Faculty, department and level are
/// fixed once the super admin creates the course.
#[derive(Debug, Deserialize)]
pub struct UpdateCourseRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub instructor: Option<String>,
    pub units: Option<u32>,
    pub image: Option<String>,
}

#[derive(Serialize)]
pub struct UpdateCourseResponse {
    pub message: &'static str,
    pub course: CourseView,
}

async fn update_course(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(course_id): Path<String>,
    ApiJson(req): ApiJson<UpdateCourseRequest>,
) -> Result<Json<UpdateCourseResponse>> {
    let mut course = managed_course(&state, &user, &course_id).await?;

    if let Some(title) = req.title {
        let title = title.trim();
        if title.is_empty() {
            return Err(AppError::BadRequest("Title cannot be empty".to_string()));
        }
        course.title = title.to_string();
    }
    if let Some(description) = req.description {
        course.description = description.trim().to_string();
    }
    if let Some(instructor) = req.instructor {
        course.instructor = instructor.trim().to_string();
    }
    if let Some(units) = req.units {
        if !(1..=12).contains(&units) {
            return Err(AppError::BadRequest(
                "Units must be between 1 and 12".to_string(),
            ));
        }
        course.units = units;
    }
    if let Some(image) = req.image {
        course.image = image.trim().to_string();
    }

    state.db.upsert_course(&course).await?;
    tracing::info!(course_id = %course.id, user_id = %user.id, "Course updated");

    Ok(Json(UpdateCourseResponse {
        message: "Course updated successfully",
        course: CourseView::from(&course),
    }))
}

// ─── Forum Links ─────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ForumLinkRequest {
    pub title: Option<String>,
    pub url: Option<String>,
    pub platform: Option<String>,
    pub description: Option<String>,
}

/// Validated forum link fields.
struct ForumLinkFields {
    title: String,
    url: String,
    platform: String,
    description: String,
}

impl ForumLinkRequest {
    fn into_fields(self) -> Result<ForumLinkFields> {
        let (Some(title), Some(url)) = (non_blank(self.title), non_blank(self.url)) else {
            return Err(AppError::BadRequest(
                "Missing required fields: title, url".to_string(),
            ));
        };
        if Url::parse(&url).is_err() {
            return Err(AppError::BadRequest("Invalid URL format".to_string()));
        }

        Ok(ForumLinkFields {
            title,
            url,
            platform: non_blank(self.platform).unwrap_or_else(|| "Other".to_string()),
            description: self.description.unwrap_or_default().trim().to_string(),
        })
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForumLinkResponse {
    pub message: &'static str,
    pub forum_link: ForumLink,
}

async fn add_forum_link(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(course_id): Path<String>,
    ApiJson(req): ApiJson<ForumLinkRequest>,
) -> Result<Json<ForumLinkResponse>> {
    let fields = req.into_fields()?;
    let mut course = managed_course(&state, &user, &course_id).await?;

    if course.has_forum_url(&fields.url, None) {
        return Err(AppError::BadRequest(
            "This forum link already exists for this course".to_string(),
        ));
    }

    let link = ForumLink {
        id: uuid::Uuid::new_v4().to_string(),
        title: fields.title,
        url: fields.url,
        platform: fields.platform,
        description: fields.description,
        added_at: Utc::now(),
    };
    course.forum_links.push(link.clone());
    state.db.upsert_course(&course).await?;
    tracing::info!(course_id = %course.id, link_id = %link.id, "Forum link added");

    Ok(Json(ForumLinkResponse {
        message: "Forum link added successfully",
        forum_link: link,
    }))
}

async fn update_forum_link(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path((course_id, link_id)): Path<(String, String)>,
    ApiJson(req): ApiJson<ForumLinkRequest>,
) -> Result<Json<ForumLinkResponse>> {
    let fields = req.into_fields()?;
    let mut course = managed_course(&state, &user, &course_id).await?;

    let Some(index) = course.forum_links.iter().position(|l| l.id == link_id) else {
        return Err(AppError::NotFound("Forum link not found".to_string()));
    };
    if course.has_forum_url(&fields.url, Some(&link_id)) {
        return Err(AppError::BadRequest(
            "This URL already exists for this course".to_string(),
        ));
    }

    let link = &mut course.forum_links[index];
    link.title = fields.title;
    link.url = fields.url;
    link.platform = fields.platform;
    link.description = fields.description;
    let link = link.clone();

    state.db.upsert_course(&course).await?;

    Ok(Json(ForumLinkResponse {
        message: "Forum link updated successfully",
        forum_link: link,
    }))
}

#[derive(Serialize)]
struct MessageResponse {
    message: &'static str,
}

async fn delete_forum_link(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path((course_id, link_id)): Path<(String, String)>,
) -> Result<Json<MessageResponse>> {
    let mut course = managed_course(&state, &user, &course_id).await?;

    let before = course.forum_links.len();
    course.forum_links.retain(|l| l.id != link_id);
    if course.forum_links.len() == before {
        return Err(AppError::NotFound("Forum link not found".to_string()));
    }

    state.db.upsert_course(&course).await?;
    tracing::info!(course_id = %course.id, link_id = %link_id, "Forum link deleted");

    Ok(Json(MessageResponse {
        message: "Forum link deleted successfully",
    }))
}
