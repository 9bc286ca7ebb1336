// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Course catalog model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::ValidationError;

/// Academic levels a course may belong to.
pub const LEVELS: [&str; 5] = ["100", "200", "300", "400", "500"];

pub fn is_valid_level(level: &str) -> bool {
    LEVELS.contains(&level)
}

/// `validator` hook for level fields.
pub fn validate_level(level: &str) -> Result<(), ValidationError> {
    if is_valid_level(level) {
        Ok(())
    } else {
        Err(ValidationError::new("level")
            .with_message("Level must be 100, 200, 300, 400, or 500".into()))
    }
}

/// Catalog order used by the admin views: level, then title.
pub fn sort_for_admin(courses: &mut [Course]) {
    courses.sort_by(|a, b| a.level.cmp(&b.level).then_with(|| a.title.cmp(&b.title)));
}

/// Stored course record in Firestore.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    /// Course ID (also used as document ID)
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub faculty: String,
    pub department: String,
    pub level: String,
    #[serde(default)]
    pub instructor: String,
    /// Credit units
    pub units: u32,
    #[serde(default)]
    pub image: String,
    /// User ID of the course admin, if one has claimed the course
    pub course_admin: Option<String>,
    /// Secret a course admin presents to claim the course
    pub access_token: Option<String>,
    /// Number of topics, recomputed by full count on every topic write
    #[serde(default)]
    pub topic_count: u32,
    #[serde(default)]
    pub forum_links: Vec<ForumLink>,
    pub created_at: DateTime<Utc>,
}

/// Discussion group link attached to a course.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForumLink {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub url: String,
    /// WhatsApp, Telegram, Discord, ...
    pub platform: String,
    #[serde(default)]
    pub description: String,
    pub added_at: DateTime<Utc>,
}

impl Course {
    pub fn new(
        title: String,
        faculty: String,
        department: String,
        level: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title,
            description: String::new(),
            faculty,
            department,
            level,
            instructor: String::new(),
            units: 3,
            image: String::new(),
            course_admin: None,
            access_token: None,
            topic_count: 0,
            forum_links: Vec::new(),
            created_at: now,
        }
    }

    /// Whether a forum link with this URL exists, ignoring `except_id`.
    pub fn has_forum_url(&self, url: &str, except_id: Option<&str>) -> bool {
        self.forum_links
            .iter()
            .any(|l| l.url == url && Some(l.id.as_str()) != except_id)
    }
}

/// Course as returned by the API. Never carries the access token.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseView {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub description: String,
    pub faculty: String,
    pub department: String,
    pub level: String,
    pub instructor: String,
    pub units: u32,
    pub image: String,
    pub course_admin: Option<String>,
    pub topics: u32,
    pub forum_links: Vec<ForumLink>,
    pub created_at: DateTime<Utc>,
}

impl From<&Course> for CourseView {
    fn from(course: &Course) -> Self {
        Self {
            id: course.id.clone(),
            title: course.title.clone(),
            description: course.description.clone(),
            faculty: course.faculty.clone(),
            department: course.department.clone(),
            level: course.level.clone(),
            instructor: course.instructor.clone(),
            units: course.units,
            image: course.image.clone(),
            course_admin: course.course_admin.clone(),
            topics: course.topic_count,
            forum_links: course.forum_links.clone(),
            created_at: course.created_at,
        }
    }
}
