// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Student dashboard summary.

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::{Enrollment, Topic, VideoProgress};
use crate::AppState;
use axum::{extract::State, routing::get, Extension, Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

/// Number of entries in the recently watched list.
const RECENT_LIMIT: usize = 6;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/dashboard", get(dashboard))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentlyWatched {
    /// Video title, or the course title if the video is gone
    pub title: String,
    pub course: String,
    pub watched_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub courses_enrolled: usize,
    pub overall_progress: u32,
    pub study_hours: u64,
    pub recently_watched: Vec<RecentlyWatched>,
}

/// Rounded mean of the enrollment percentages, 0 with no enrollments.
fn overall_progress(enrollments: &[Enrollment]) -> u32 {
    if enrollments.is_empty() {
        return 0;
    }
    let sum: u64 = enrollments.iter().map(|e| u64::from(e.progress_percent)).sum();
    (sum as f64 / enrollments.len() as f64).round() as u32
}

/// Total watch time in whole hours, rounded.
fn study_hours(progress: &[VideoProgress]) -> u64 {
    let seconds: u64 = progress.iter().map(|p| p.watch_seconds).sum();
    (seconds as f64 / 3600.0).round() as u64
}

fn video_title<'a>(topics: &'a [Topic], row: &VideoProgress) -> Option<&'a str> {
    topics
        .iter()
        .filter(|t| row.topic_id.as_deref().map_or(true, |id| id == t.id))
        .flat_map(|t| &t.videos)
        .find(|v| v.youtube_id == row.video_id)
        .map(|v| v.title.as_str())
}

async fn dashboard(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Dashboard>> {
    let enrollments = state.db.list_enrollments(&user.id).await?;
    let mut progress = state.db.list_user_progress(&user.id).await?;
    progress.sort_by(|a, b| b.last_watched_at.cmp(&a.last_watched_at));

    // (course title, topics) per course, loaded once
    let mut courses: HashMap<String, Option<(String, Vec<Topic>)>> = HashMap::new();
    let mut recently_watched = Vec::with_capacity(RECENT_LIMIT);

    for row in &progress {
        if recently_watched.len() == RECENT_LIMIT {
            break;
        }
        if !courses.contains_key(&row.course_id) {
            let entry = match state.db.get_course(&row.course_id).await? {
                Some(course) => Some((course.title, state.db.list_topics(&course.id).await?)),
                None => None,
            };
            courses.insert(row.course_id.clone(), entry);
        }
        // Rows for deleted courses are skipped.
        let Some(Some((course_title, topics))) = courses.get(&row.course_id) else {
            continue;
        };

        recently_watched.push(RecentlyWatched {
            title: video_title(topics, row)
                .unwrap_or(course_title.as_str())
                .to_string(),
            course: course_title.clone(),
            watched_at: row.last_watched_at,
        });
    }

    Ok(Json(Dashboard {
        courses_enrolled: enrollments.len(),
        overall_progress: overall_progress(&enrollments),
        study_hours: study_hours(&progress),
        recently_watched,
    }))
}
