// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-video progress and course completion.

use crate::db::Store;
use crate::error::AppError;
use crate::models::progress::completion_percent;
use crate::models::topic::total_videos;
use crate::models::{Enrollment, VideoProgress};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Identifies the video a progress update is about.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressUpdate {
    #[serde(default)]
    pub course_id: String,
    pub topic_id: Option<String>,
    #[serde(default)]
    pub video_id: String,
    /// Seconds watched so far
    pub watch_time: Option<u64>,
}

/// Completion summary of one course for one user.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseProgress {
    pub completed_videos: u32,
    pub total_videos: u32,
    pub completion_percentage: u32,
    pub progress: Vec<VideoProgress>,
}

pub struct ProgressService {
    db: Arc<dyn Store>,
}

impl ProgressService {
    pub fn new(db: Arc<dyn Store>) -> Self {
        Self { db }
    }

    /// Mark a video completed and recompute the enrollment percentage.
    pub async fn mark_complete(
        &self,
        user_id: &str,
        update: &ProgressUpdate,
    ) -> Result<VideoProgress, AppError> {
        let mut progress = self.load(user_id, update).await?;
        let now = Utc::now();
        progress.completed = true;
        progress.completed_at = Some(now);
        progress.last_watched_at = now;
        if let Some(seconds) = update.watch_time {
            progress.watch_seconds = seconds;
        }

        self.commit_with_percent(user_id, &progress).await?;
        tracing::info!(
            user_id,
            course_id = %progress.course_id,
            video_id = %progress.video_id,
            "Video completed"
        );
        Ok(progress)
    }

    /// Record watch time and recompute the enrollment percentage.
    pub async fn update_watch_time(
        &self,
        user_id: &str,
        update: &ProgressUpdate,
    ) -> Result<VideoProgress, AppError> {
        let seconds = update
            .watch_time
            .ok_or_else(|| AppError::BadRequest("watchTime is required".to_string()))?;

        let mut progress = self.load(user_id, update).await?;
        progress.watch_seconds = seconds;
        progress.last_watched_at = Utc::now();

        self.commit_with_percent(user_id, &progress).await?;
        Ok(progress)
    }

    /// Record that a video was opened.
    pub async fn track(
        &self,
        user_id: &str,
        update: &ProgressUpdate,
    ) -> Result<VideoProgress, AppError> {
        let mut progress = self.load(user_id, update).await?;
        progress.last_watched_at = Utc::now();
        self.db.commit_progress(&progress, None).await?;
        Ok(progress)
    }

    pub async fn course_progress(
        &self,
        user_id: &str,
        course_id: &str,
    ) -> Result<CourseProgress, AppError> {
        let progress = self.db.list_video_progress(user_id, course_id).await?;
        let completed = progress.iter().filter(|p| p.completed).count() as u32;
        let total = total_videos(&self.db.list_topics(course_id).await?);

        Ok(CourseProgress {
            completed_videos: completed,
            total_videos: total,
            completion_percentage: completion_percent(completed, total),
            progress,
        })
    }

    /// Existing row for the video, or a fresh one.
    async fn load(
        &self,
        user_id: &str,
        update: &ProgressUpdate,
    ) -> Result<VideoProgress, AppError> {
        if update.course_id.trim().is_empty() || update.video_id.trim().is_empty() {
            return Err(AppError::BadRequest(
                "Missing required fields: courseId, videoId".to_string(),
            ));
        }

        let existing = self
            .db
            .get_video_progress(user_id, &update.course_id, &update.video_id)
            .await?;
        let mut progress = existing.unwrap_or_else(|| {
            VideoProgress::new(
                user_id,
                &update.course_id,
                update.topic_id.as_deref(),
                &update.video_id,
                Utc::now(),
            )
        });
        if progress.topic_id.is_none() {
            progress.topic_id = update.topic_id.clone();
        }
        Ok(progress)
    }

    /// Write the row together with the recomputed enrollment.
    async fn commit_with_percent(
        &self,
        user_id: &str,
        progress: &VideoProgress,
    ) -> Result<(), AppError> {
        let course_id = progress.course_id.as_str();

        // Count as if this row were already stored.
        let completed = self
            .db
            .list_video_progress(user_id, course_id)
            .await?
            .iter()
            .filter(|p| p.video_id != progress.video_id && p.completed)
            .count() as u32
            + u32::from(progress.completed);
        let total = total_videos(&self.db.list_topics(course_id).await?);

        let now = Utc::now();
        let mut enrollment = self
            .db
            .get_enrollment(user_id, course_id)
            .await?
            .unwrap_or_else(|| Enrollment::new(user_id, course_id, now));
        enrollment.progress_percent = completion_percent(completed, total);
        enrollment.updated_at = now;

        self.db.commit_progress(progress, Some(&enrollment)).await?;
        tracing::debug!(
            user_id,
            course_id,
            percent = enrollment.progress_percent,
            "Enrollment progress updated"
        );
        Ok(())
    }
}
