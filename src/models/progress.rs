// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Enrollment and per-video progress records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One row per (user, course).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enrollment {
    pub user_id: String,
    pub course_id: String,
    /// Completed videos as a rounded percentage of the course's videos
    pub progress_percent: u32,
    pub enrolled_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Enrollment {
    pub fn new(user_id: &str, course_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.to_string(),
            course_id: course_id.to_string(),
            progress_percent: 0,
            enrolled_at: now,
            updated_at: now,
        }
    }

    /// Document ID (one enrollment per user and course).
    pub fn doc_id(&self) -> String {
        enrollment_doc_id(&self.user_id, &self.course_id)
    }
}

pub fn enrollment_doc_id(user_id: &str, course_id: &str) -> String {
    format!("{}_{}", user_id, course_id)
}

/// Watch state of a single video. One row per (user, course, video).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoProgress {
    pub user_id: String,
    pub course_id: String,
    pub topic_id: Option<String>,
    /// YouTube video ID
    pub video_id: String,
    pub completed: bool,
    pub watch_seconds: u64,
    pub last_watched_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl VideoProgress {
    pub fn new(
        user_id: &str,
        course_id: &str,
        topic_id: Option<&str>,
        video_id: &str,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id: user_id.to_string(),
            course_id: course_id.to_string(),
            topic_id: topic_id.map(str::to_string),
            video_id: video_id.to_string(),
            completed: false,
            watch_seconds: 0,
            last_watched_at: now,
            completed_at: None,
        }
    }

    /// Document ID. Video IDs are URL-encoded to keep the ID path-safe.
    pub fn doc_id(&self) -> String {
        video_progress_doc_id(&self.user_id, &self.course_id, &self.video_id)
    }
}

pub fn video_progress_doc_id(user_id: &str, course_id: &str, video_id: &str) -> String {
    format!(
        "{}_{}_{}",
        user_id,
        course_id,
        urlencoding::encode(video_id)
    )
}

/// Rounded completion percentage. Zero when the course has no videos.
pub fn completion_percent(completed: u32, total_videos: u32) -> u32 {
    if total_videos == 0 {
        return 0;
    }
    let percent = (f64::from(completed) / f64::from(total_videos) * 100.0).round() as u32;
    percent.min(100)
}
