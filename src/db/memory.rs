// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process store.
//!
//! Backs the integration tests and `STORE=memory` local runs.
//! Single-document operations go straight to the maps; compound writes and
//! uniqueness checks hold `write_lock` so they commit as one unit.

use crate::db::Store;
use crate::error::AppError;
use crate::models::progress::{enrollment_doc_id, video_progress_doc_id};
use crate::models::{Course, Enrollment, OneTimePasscode, OtpLookup, Topic, User, VideoProgress};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::Mutex;

/// In-memory document store keyed like the Firestore collections.
#[derive(Default)]
pub struct MemoryDb {
    users: DashMap<String, User>,
    otps: DashMap<String, OneTimePasscode>,
    courses: DashMap<String, Course>,
    topics: DashMap<String, Topic>,
    enrollments: DashMap<String, Enrollment>,
    video_progress: DashMap<String, VideoProgress>,
    write_lock: Mutex<()>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored passcodes for an email, used and unused.
    pub fn otp_count(&self, email: &str) -> usize {
        self.otps.iter().filter(|o| o.email == email).count()
    }

    fn count_topics(&self, course_id: &str) -> u32 {
        self.topics
            .iter()
            .filter(|t| t.course_id == course_id)
            .count() as u32
    }

    fn store_topic_count(&self, course_id: &str) -> Result<u32, AppError> {
        let count = self.count_topics(course_id);
        let mut course = self
            .courses
            .get_mut(course_id)
            .ok_or_else(|| AppError::NotFound("Course not found".to_string()))?;
        course.topic_count = count;
        Ok(count)
    }
}

#[async_trait]
impl Store for MemoryDb {
    async fn get_user(&self, id: &str) -> Result<Option<User>, AppError> {
        Ok(self.users.get(id).map(|u| u.clone()))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .users
            .iter()
            .find(|u| u.email == email)
            .map(|u| u.clone()))
    }

    async fn insert_user(&self, user: &User) -> Result<(), AppError> {
        let _guard = self.write_lock.lock().await;
        if self.users.iter().any(|u| u.email == user.email) {
            return Err(AppError::Conflict("User already exists".to_string()));
        }
        self.users.insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn update_user(&self, user: &User) -> Result<(), AppError> {
        self.users.insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn insert_otp(&self, otp: &OneTimePasscode) -> Result<(), AppError> {
        self.otps.insert(otp.id.clone(), otp.clone());
        Ok(())
    }

    async fn delete_otps(&self, email: &str, used: bool) -> Result<usize, AppError> {
        let before = self.otps.len();
        self.otps.retain(|_, otp| !(otp.email == email && otp.used == used));
        Ok(before - self.otps.len())
    }

    async fn find_otp(
        &self,
        email: &str,
        lookup: OtpLookup<'_>,
        now: DateTime<Utc>,
    ) -> Result<Option<OneTimePasscode>, AppError> {
        Ok(self
            .otps
            .iter()
            .find(|otp| lookup.matches(otp, email, now))
            .map(|otp| otp.clone()))
    }

    async fn mark_otp_used(&self, otp_id: &str) -> Result<bool, AppError> {
        let Some(mut otp) = self.otps.get_mut(otp_id) else {
            return Ok(false);
        };
        if otp.used {
            return Ok(false);
        }
        otp.used = true;
        Ok(true)
    }

    async fn list_courses(&self) -> Result<Vec<Course>, AppError> {
        Ok(self.courses.iter().map(|c| c.clone()).collect())
    }

    async fn get_course(&self, id: &str) -> Result<Option<Course>, AppError> {
        Ok(self.courses.get(id).map(|c| c.clone()))
    }

    async fn list_courses_by_admin(&self, user_id: &str) -> Result<Vec<Course>, AppError> {
        Ok(self
            .courses
            .iter()
            .filter(|c| c.course_admin.as_deref() == Some(user_id))
            .map(|c| c.clone())
            .collect())
    }

    async fn upsert_course(&self, course: &Course) -> Result<(), AppError> {
        self.courses.insert(course.id.clone(), course.clone());
        Ok(())
    }

    async fn get_topic(&self, id: &str) -> Result<Option<Topic>, AppError> {
        Ok(self.topics.get(id).map(|t| t.clone()))
    }

    async fn find_topic_by_title(
        &self,
        course_id: &str,
        title: &str,
    ) -> Result<Option<Topic>, AppError> {
        Ok(self
            .topics
            .iter()
            .find(|t| t.course_id == course_id && t.title == title)
            .map(|t| t.clone()))
    }

    async fn list_topics(&self, course_id: &str) -> Result<Vec<Topic>, AppError> {
        let mut topics: Vec<Topic> = self
            .topics
            .iter()
            .filter(|t| t.course_id == course_id)
            .map(|t| t.clone())
            .collect();
        topics.sort_by_key(|t| t.order);
        Ok(topics)
    }

    async fn save_topic(&self, topic: &Topic) -> Result<u32, AppError> {
        let _guard = self.write_lock.lock().await;
        if !self.courses.contains_key(&topic.course_id) {
            return Err(AppError::NotFound("Course not found".to_string()));
        }
        self.topics.insert(topic.id.clone(), topic.clone());
        self.store_topic_count(&topic.course_id)
    }

    async fn delete_topic(&self, topic: &Topic) -> Result<u32, AppError> {
        let _guard = self.write_lock.lock().await;
        self.topics.remove(&topic.id);
        self.store_topic_count(&topic.course_id)
    }

    async fn get_enrollment(
        &self,
        user_id: &str,
        course_id: &str,
    ) -> Result<Option<Enrollment>, AppError> {
        Ok(self
            .enrollments
            .get(&enrollment_doc_id(user_id, course_id))
            .map(|e| e.clone()))
    }

    async fn upsert_enrollment(&self, enrollment: &Enrollment) -> Result<(), AppError> {
        self.enrollments
            .insert(enrollment.doc_id(), enrollment.clone());
        Ok(())
    }

    async fn list_enrollments(&self, user_id: &str) -> Result<Vec<Enrollment>, AppError> {
        Ok(self
            .enrollments
            .iter()
            .filter(|e| e.user_id == user_id)
            .map(|e| e.clone())
            .collect())
    }

    async fn get_video_progress(
        &self,
        user_id: &str,
        course_id: &str,
        video_id: &str,
    ) -> Result<Option<VideoProgress>, AppError> {
        Ok(self
            .video_progress
            .get(&video_progress_doc_id(user_id, course_id, video_id))
            .map(|p| p.clone()))
    }

    async fn list_video_progress(
        &self,
        user_id: &str,
        course_id: &str,
    ) -> Result<Vec<VideoProgress>, AppError> {
        Ok(self
            .video_progress
            .iter()
            .filter(|p| p.user_id == user_id && p.course_id == course_id)
            .map(|p| p.clone())
            .collect())
    }

    async fn list_user_progress(&self, user_id: &str) -> Result<Vec<VideoProgress>, AppError> {
        Ok(self
            .video_progress
            .iter()
            .filter(|p| p.user_id == user_id)
            .map(|p| p.clone())
            .collect())
    }

    async fn commit_progress(
        &self,
        progress: &VideoProgress,
        enrollment: Option<&Enrollment>,
    ) -> Result<(), AppError> {
        let _guard = self.write_lock.lock().await;
        self.video_progress
            .insert(progress.doc_id(), progress.clone());
        if let Some(enrollment) = enrollment {
            self.enrollments
                .insert(enrollment.doc_id(), enrollment.clone());
        }
        Ok(())
    }
}
