// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Course catalog and enrollment for students.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{CourseStatistics, CourseView, Enrollment, Topic};
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

/// Catalog routes (require authentication via JWT).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/courses", get(list_courses))
        .route("/api/courses/my-courses", get(my_courses))
        .route("/api/courses/{course_id}", get(course_details))
        .route("/api/courses/{course_id}/enroll", post(enroll))
}

/// All courses, newest first.
async fn list_courses(State(state): State<Arc<AppState>>) -> Result<Json<Vec<CourseView>>> {
    let mut courses = state.db.list_courses().await?;
    courses.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(Json(courses.iter().map(CourseView::from).collect()))
}

/// One entry of the student's course list.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrolledCourse {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub description: String,
    pub topics: u32,
    pub progress: u32,
    pub units: u32,
    pub last_activity: DateTime<Utc>,
    pub image: Option<String>,
}

/// Courses the caller is enrolled in, most recent enrollment first.
async fn my_courses(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<EnrolledCourse>>> {
    let mut enrollments = state.db.list_enrollments(&user.id).await?;
    enrollments.sort_by(|a, b| b.enrolled_at.cmp(&a.enrolled_at));

    let mut courses = Vec::with_capacity(enrollments.len());
    for enrollment in enrollments {
        // Enrollments can outlive a deleted course; skip those.
        let Some(course) = state.db.get_course(&enrollment.course_id).await? else {
            continue;
        };
        courses.push(EnrolledCourse {
            id: course.id,
            title: course.title,
            description: course.description,
            topics: course.topic_count,
            progress: enrollment.progress_percent,
            units: course.units,
            last_activity: enrollment.updated_at,
            image: Some(course.image).filter(|i| !i.is_empty()),
        });
    }

    Ok(Json(courses))
}

#[derive(Serialize)]
pub struct CourseDetailsResponse {
    pub course: CourseView,
    pub topics: Vec<Topic>,
    pub statistics: CourseStatistics,
}

/// Course with its ordered topics and content counts.
async fn course_details(
    State(state): State<Arc<AppState>>,
    Path(course_id): Path<String>,
) -> Result<Json<CourseDetailsResponse>> {
    let course = state
        .db
        .get_course(&course_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Course not found".to_string()))?;
    let topics = state.db.list_topics(&course_id).await?;

    Ok(Json(CourseDetailsResponse {
        course: CourseView::from(&course),
        statistics: CourseStatistics::from_topics(&topics),
        topics,
    }))
}

#[derive(Serialize)]
pub struct EnrollResponse {
    pub message: &'static str,
    pub enrollment: Enrollment,
}

async fn enroll(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(course_id): Path<String>,
) -> Result<(StatusCode, Json<EnrollResponse>)> {
    if state.db.get_course(&course_id).await?.is_none() {
        return Err(AppError::NotFound("Course not found".to_string()));
    }
    if state.db.get_enrollment(&user.id, &course_id).await?.is_some() {
        return Err(AppError::BadRequest(
            "Already enrolled in this course".to_string(),
        ));
    }

    let enrollment = Enrollment::new(&user.id, &course_id, Utc::now());
    state.db.upsert_enrollment(&enrollment).await?;
    tracing::info!(user_id = %user.id, course_id = %course_id, "Enrolled in course");

    Ok((
        StatusCode::CREATED,
        Json(EnrollResponse {
            message: "Successfully enrolled in course",
            enrollment,
        }),
    ))
}
