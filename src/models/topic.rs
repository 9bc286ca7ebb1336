// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Topics group lesson videos and study materials within a course.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A named grouping of videos and materials. Identified for import
/// purposes by `(course_id, title)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
    #[serde(rename = "_id")]
    pub id: String,
    pub course_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Position within the course
    pub order: u32,
    #[serde(default)]
    pub videos: Vec<Video>,
    #[serde(default)]
    pub materials: Vec<Material>,
    pub created_at: DateTime<Utc>,
}

/// A lesson video hosted on YouTube.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    /// YouTube video ID
    pub youtube_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub thumbnail: String,
    /// Length in seconds, absent when the lookup failed
    #[serde(rename = "duration")]
    pub duration_seconds: Option<u64>,
    pub order: u32,
}

/// Kind of uploaded study material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MaterialKind {
    Pdf,
    PastQuestion,
    Note,
}

impl std::str::FromStr for MaterialKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pdf" => Ok(MaterialKind::Pdf),
            "past-question" => Ok(MaterialKind::PastQuestion),
            "note" => Ok(MaterialKind::Note),
            _ => Err(()),
        }
    }
}

/// An uploaded PDF attached to a topic.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Material {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "type")]
    pub kind: MaterialKind,
    pub title: String,
    /// Public path under `/uploads`
    pub file_url: String,
    pub uploaded_at: DateTime<Utc>,
}

impl Topic {
    pub fn new(course_id: &str, title: &str, description: &str, order: u32) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            course_id: course_id.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            order,
            videos: Vec::new(),
            materials: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Replace the whole video list (playlist import semantics).
    pub fn merge_playlist(&mut self, videos: Vec<Video>, description: Option<&str>) {
        self.videos = videos;
        self.update_description(description);
    }

    /// Append a single video unless one with the same YouTube ID is present.
    ///
    /// Returns `true` if the video list changed.
    pub fn merge_video(&mut self, mut video: Video, description: Option<&str>) -> bool {
        if self.videos.iter().any(|v| v.youtube_id == video.youtube_id) {
            return false;
        }
        video.order = self.videos.len() as u32;
        self.videos.push(video);
        self.update_description(description);
        true
    }

    fn update_description(&mut self, description: Option<&str>) {
        if let Some(d) = description.filter(|d| !d.trim().is_empty()) {
            self.description = d.to_string();
        }
    }
}

/// Aggregate counts shown on a course page.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseStatistics {
    pub total_videos: u32,
    /// PDFs and notes
    pub total_materials: u32,
    pub total_past_questions: u32,
    pub total_topics: u32,
}

impl CourseStatistics {
    pub fn from_topics(topics: &[Topic]) -> Self {
        let mut stats = Self {
            total_topics: topics.len() as u32,
            ..Default::default()
        };
        for topic in topics {
            stats.total_videos += topic.videos.len() as u32;
            for material in &topic.materials {
                match material.kind {
                    MaterialKind::Pdf | MaterialKind::Note => stats.total_materials += 1,
                    MaterialKind::PastQuestion => stats.total_past_questions += 1,
                }
            }
        }
        stats
    }
}

/// Total number of videos across a course's topics.
pub fn total_videos(topics: &[Topic]) -> u32 {
    topics.iter().map(|t| t.videos.len() as u32).sum()
}
