// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer.
//!
//! `Store` is the seam between handlers and persistence. Production uses
//! Firestore; tests and emulator-less local runs use the in-memory store.

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryDb;

use crate::error::AppError;
use crate::models::{Course, Enrollment, OneTimePasscode, OtpLookup, Topic, User, VideoProgress};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const OTPS: &str = "otps";
    pub const COURSES: &str = "courses";
    pub const TOPICS: &str = "topics";
    /// Keyed by `{user_id}_{course_id}`
    pub const ENROLLMENTS: &str = "enrollments";
    /// Keyed by `{user_id}_{course_id}_{video_id}`
    pub const VIDEO_PROGRESS: &str = "video_progress";
}

/// Document persistence used by every service and handler.
///
/// Compound writes (`save_topic`, `delete_topic`, `commit_progress`) update a
/// document together with the denormalized value derived from it, as one
/// atomic unit.
#[async_trait]
pub trait Store: Send + Sync {
    // ─── Users ───────────────────────────────────────────────────

    async fn get_user(&self, id: &str) -> Result<Option<User>, AppError>;

    /// Look up by normalized email.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    /// Create a user. Fails with `Conflict` if the email is taken.
    async fn insert_user(&self, user: &User) -> Result<(), AppError>;

    async fn update_user(&self, user: &User) -> Result<(), AppError>;

    // ─── One-Time Passcodes ─────────────────────────────────────

    async fn insert_otp(&self, otp: &OneTimePasscode) -> Result<(), AppError>;

    /// Delete every passcode for `email` whose `used` flag equals `used`.
    async fn delete_otps(&self, email: &str, used: bool) -> Result<usize, AppError>;

    /// Find a live passcode for `email` matching `lookup`.
    async fn find_otp(
        &self,
        email: &str,
        lookup: OtpLookup<'_>,
        now: DateTime<Utc>,
    ) -> Result<Option<OneTimePasscode>, AppError>;

    /// Flip `used` to true. Returns `false` if it was already used.
    async fn mark_otp_used(&self, otp_id: &str) -> Result<bool, AppError>;

    // ─── Courses ─────────────────────────────────────────────────

    async fn list_courses(&self) -> Result<Vec<Course>, AppError>;

    async fn get_course(&self, id: &str) -> Result<Option<Course>, AppError>;

    /// Courses whose `course_admin` is `user_id`.
    async fn list_courses_by_admin(&self, user_id: &str) -> Result<Vec<Course>, AppError>;

    async fn upsert_course(&self, course: &Course) -> Result<(), AppError>;

    // ─── Topics ──────────────────────────────────────────────────

    async fn get_topic(&self, id: &str) -> Result<Option<Topic>, AppError>;

    async fn find_topic_by_title(
        &self,
        course_id: &str,
        title: &str,
    ) -> Result<Option<Topic>, AppError>;

    /// Topics of a course sorted by `order`.
    async fn list_topics(&self, course_id: &str) -> Result<Vec<Topic>, AppError>;

    /// Write a topic and recount its course's topics in the same commit.
    /// Returns the new topic count.
    async fn save_topic(&self, topic: &Topic) -> Result<u32, AppError>;

    /// Delete a topic and recount its course's topics in the same commit.
    /// Returns the new topic count.
    async fn delete_topic(&self, topic: &Topic) -> Result<u32, AppError>;

    // ─── Enrollments & Progress ──────────────────────────────────

    async fn get_enrollment(
        &self,
        user_id: &str,
        course_id: &str,
    ) -> Result<Option<Enrollment>, AppError>;

    async fn upsert_enrollment(&self, enrollment: &Enrollment) -> Result<(), AppError>;

    async fn list_enrollments(&self, user_id: &str) -> Result<Vec<Enrollment>, AppError>;

    async fn get_video_progress(
        &self,
        user_id: &str,
        course_id: &str,
        video_id: &str,
    ) -> Result<Option<VideoProgress>, AppError>;

    async fn list_video_progress(
        &self,
        user_id: &str,
        course_id: &str,
    ) -> Result<Vec<VideoProgress>, AppError>;

    /// All progress rows of a user across courses.
    async fn list_user_progress(&self, user_id: &str) -> Result<Vec<VideoProgress>, AppError>;

    /// Write a progress row, and optionally the recomputed enrollment, together.
    async fn commit_progress(
        &self,
        progress: &VideoProgress,
        enrollment: Option<&Enrollment>,
    ) -> Result<(), AppError>;
}
