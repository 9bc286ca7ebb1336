// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Super-admin routes. Mounted behind `require_auth` and `require_super_admin`.

use crate::error::{AppError, Result};
use crate::models::course::{sort_for_admin, validate_level};
use crate::models::{Course, CourseView, Topic};
use crate::routes::extract::ApiJson;
use crate::routes::imports::import_playlist;
use crate::routes::materials::{upload_material, UPLOAD_BODY_LIMIT};
use crate::AppState;
use axum::{
    extract::{DefaultBodyLimit, Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/admin/courses", get(list_courses).post(create_course))
        .route("/api/admin/courses/{course_id}", get(course_details))
        .route("/api/admin/import-playlist", post(import_playlist))
        .route(
            "/api/admin/upload-material",
            post(upload_material).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route("/api/admin/topics/{topic_id}", delete(delete_topic))
}

async fn list_courses(State(state): State<Arc<AppState>>) -> Result<Json<Vec<CourseView>>> {
    let mut courses = state.db.list_courses().await?;
    sort_for_admin(&mut courses);
    Ok(Json(courses.iter().map(CourseView::from).collect()))
}

/// Course with its topics, for the admin editors.
#[derive(Serialize)]
pub struct AdminCourseDetails {
    pub course: CourseView,
    pub topics: Vec<Topic>,
}

async fn course_details(
    State(state): State<Arc<AppState>>,
    Path(course_id): Path<String>,
) -> Result<Json<AdminCourseDetails>> {
    let course = state
        .db
        .get_course(&course_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Course not found".to_string()))?;
    let topics = state.db.list_topics(&course_id).await?;

    Ok(Json(AdminCourseDetails {
        course: CourseView::from(&course),
        topics,
    }))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCourseRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Faculty is required"))]
    pub faculty: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Department is required"))]
    pub department: String,
    #[serde(default)]
    #[validate(custom(function = "validate_level"))]
    pub level: String,
    #[serde(default)]
    pub instructor: String,
    #[validate(range(min = 1, max = 12, message = "Units must be between 1 and 12"))]
    pub units: Option<u32>,
    #[serde(default)]
    pub image: String,
}

#[derive(Serialize)]
pub struct CourseResponse {
    pub message: &'static str,
    pub course: CourseView,
}

async fn create_course(
    State(state): State<Arc<AppState>>,
    ApiJson(mut req): ApiJson<CreateCourseRequest>,
) -> Result<(StatusCode, Json<CourseResponse>)> {
    req.title = req.title.trim().to_string();
    req.faculty = req.faculty.trim().to_string();
    req.department = req.department.trim().to_string();
    req.validate()?;

    let mut course = Course::new(req.title, req.faculty, req.department, req.level, Utc::now());
    course.description = req.description.trim().to_string();
    course.instructor = req.instructor.trim().to_string();
    course.image = req.image.trim().to_string();
    if let Some(units) = req.units {
        course.units = units;
    }

    state.db.upsert_course(&course).await?;
    tracing::info!(course_id = %course.id, title = %course.title, "Course created");

    Ok((
        StatusCode::CREATED,
        Json(CourseResponse {
            message: "Course created successfully",
            course: CourseView::from(&course),
        }),
    ))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DeleteTopicResponse {
    message: &'static str,
    topic_count: u32,
}

async fn delete_topic(
    State(state): State<Arc<AppState>>,
    Path(topic_id): Path<String>,
) -> Result<Json<DeleteTopicResponse>> {
    let topic = state
        .db
        .get_topic(&topic_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Topic not found".to_string()))?;

    let topic_count = state.db.delete_topic(&topic).await?;
    tracing::info!(
        topic_id = %topic.id,
        course_id = %topic.course_id,
        topic_count,
        "Topic deleted"
    );

    Ok(Json(DeleteTopicResponse {
        message: "Topic deleted successfully",
        topic_count,
    }))
}
