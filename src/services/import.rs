// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Topic import from YouTube playlists and single videos.
//!
//! A topic is identified by `(course_id, title)`. Importing a playlist into
//! an existing topic replaces its video list; importing a single video
//! appends it unless the topic already has it. Either way the course's
//! topic count is recounted in the same commit as the topic write.

use crate::db::Store;
use crate::error::AppError;
use crate::middleware::auth::AuthUser;
use crate::models::{Course, Topic};
use crate::services::authz::AccessPolicy;
use crate::services::youtube::{extract_playlist_id, extract_video_id, YouTubeClient};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistImport {
    #[serde(default)]
    pub course_id: String,
    #[serde(default)]
    pub playlist_url: String,
    #[serde(default)]
    pub topic_title: String,
    pub topic_description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoImport {
    #[serde(default)]
    pub course_id: String,
    #[serde(default)]
    pub video_url: String,
    #[serde(default)]
    pub topic_title: String,
    pub topic_description: Option<String>,
}

/// Result of an import.
#[derive(Debug)]
pub struct ImportOutcome {
    pub topic: Topic,
    /// Videos fetched from YouTube by this import
    pub videos_imported: usize,
    pub topic_count: u32,
}

pub struct ImportService {
    db: Arc<dyn Store>,
    youtube: YouTubeClient,
    policy: AccessPolicy,
}

impl ImportService {
    pub fn new(db: Arc<dyn Store>, youtube: YouTubeClient, policy: AccessPolicy) -> Self {
        Self {
            db,
            youtube,
            policy,
        }
    }

    /// Import a playlist as a topic, replacing the topic's videos if it exists.
    pub async fn import_playlist(
        &self,
        actor: &AuthUser,
        req: PlaylistImport,
    ) -> Result<ImportOutcome, AppError> {
        self.ensure_configured()?;
        if is_blank(&req.course_id) || is_blank(&req.playlist_url) || is_blank(&req.topic_title) {
            return Err(AppError::BadRequest(
                "Missing required fields: courseId, playlistUrl, topicTitle".to_string(),
            ));
        }

        let course = self.authorized_course(actor, &req.course_id).await?;

        let playlist_id = extract_playlist_id(&req.playlist_url).ok_or_else(|| {
            AppError::BadRequest(
                "Invalid playlist URL. Please provide a valid YouTube playlist URL.".to_string(),
            )
        })?;

        let videos = self.youtube.fetch_playlist_videos(&playlist_id).await?;
        if videos.is_empty() {
            return Err(AppError::BadRequest(
                "No videos found in playlist".to_string(),
            ));
        }
        let videos_imported = videos.len();

        let title = req.topic_title.trim();
        let description = req.topic_description.as_deref();
        let topic = match self.db.find_topic_by_title(&course.id, title).await? {
            Some(mut topic) => {
                topic.merge_playlist(videos, description);
                topic
            }
            None => {
                let mut topic = self.new_topic(&course, title, description).await?;
                topic.merge_playlist(videos, None);
                topic
            }
        };

        let topic_count = self.db.save_topic(&topic).await?;
        tracing::info!(
            course_id = %course.id,
            topic_id = %topic.id,
            playlist_id = %playlist_id,
            videos = videos_imported,
            "Playlist imported"
        );

        Ok(ImportOutcome {
            topic,
            videos_imported,
            topic_count,
        })
    }

    /// Add one video to a topic unless it is already there.
    pub async fn import_single_video(
        &self,
        actor: &AuthUser,
        req: VideoImport,
    ) -> Result<ImportOutcome, AppError> {
        self.ensure_configured()?;
        if is_blank(&req.course_id) || is_blank(&req.video_url) || is_blank(&req.topic_title) {
            return Err(AppError::BadRequest(
                "Missing required fields: courseId, videoUrl, topicTitle".to_string(),
            ));
        }

        let course = self.authorized_course(actor, &req.course_id).await?;

        let video_id = extract_video_id(&req.video_url).ok_or_else(|| {
            AppError::BadRequest(
                "Invalid video URL. Please provide a valid YouTube video URL.".to_string(),
            )
        })?;

        let video = self.youtube.fetch_single_video(&video_id).await?;

        let title = req.topic_title.trim();
        let description = req.topic_description.as_deref();
        let (topic, changed) = match self.db.find_topic_by_title(&course.id, title).await? {
            Some(mut topic) => {
                let changed = topic.merge_video(video, description);
                (topic, changed)
            }
            None => {
                let mut topic = self.new_topic(&course, title, description).await?;
                topic.merge_video(video, None);
                (topic, true)
            }
        };

        let topic_count = if changed {
            self.db.save_topic(&topic).await?
        } else {
            tracing::debug!(topic_id = %topic.id, video_id = %video_id, "Video already in topic");
            course.topic_count
        };
        tracing::info!(
            course_id = %course.id,
            topic_id = %topic.id,
            video_id = %video_id,
            added = changed,
            "Video imported"
        );

        Ok(ImportOutcome {
            topic,
            videos_imported: 1,
            topic_count,
        })
    }

    fn ensure_configured(&self) -> Result<(), AppError> {
        if self.youtube.is_configured() {
            Ok(())
        } else {
            Err(AppError::Misconfigured("YouTube API key not configured"))
        }
    }

    async fn authorized_course(&self, actor: &AuthUser, course_id: &str) -> Result<Course, AppError> {
        let course = self
            .db
            .get_course(course_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Course not found".to_string()))?;
        self.policy.require_course(actor, &course)?;
        Ok(course)
    }

    /// A fresh topic placed after the course's existing topics.
    async fn new_topic(
        &self,
        course: &Course,
        title: &str,
        description: Option<&str>,
    ) -> Result<Topic, AppError> {
        let order = self.db.list_topics(&course.id).await?.len() as u32;
        Ok(Topic::new(
            &course.id,
            title,
            description.unwrap_or_default(),
            order,
        ))
    }
}

fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}
