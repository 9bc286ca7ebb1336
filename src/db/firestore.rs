// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users and one-time passcodes (password reset)
//! - Courses and topics (catalog, with a denormalized topic count)
//! - Enrollments and video progress

use crate::db::{collections, Store};
use crate::error::AppError;
use crate::models::progress::{enrollment_doc_id, video_progress_doc_id};
use crate::models::{Course, Enrollment, OneTimePasscode, OtpLookup, Topic, User, VideoProgress};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::{stream, FutureExt, StreamExt};

const MAX_CONCURRENT_DB_OPS: usize = 16;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: firestore::FirestoreDb,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // The emulator accepts any token; skip credential discovery entirely.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self { client })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self { client })
    }

    // ─── Helper Methods ────────────────────────────────────────────

    async fn get_doc<T>(&self, collection: &str, id: &str) -> Result<Option<T>, AppError>
    where
        T: for<'de> serde::Deserialize<'de> + Send,
    {
        self.client
            .fluent()
            .select()
            .by_id_in(collection)
            .obj()
            .one(id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn set_doc<T>(&self, collection: &str, id: &str, object: &T) -> Result<(), AppError>
    where
        T: serde::Serialize + for<'de> serde::Deserialize<'de> + Sync + Send,
    {
        let _: () = self
            .client
            .fluent()
            .update()
            .in_col(collection)
            .document_id(id)
            .object(object)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn otps_for_email(&self, email: &str) -> Result<Vec<OneTimePasscode>, AppError> {
        let email = email.to_string();
        self.client
            .fluent()
            .select()
            .from(collections::OTPS)
            .filter(move |q| q.field("email").eq(email.clone()))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Write `topic` (or delete it) and the recounted course in one transaction.
    ///
    /// The course and its topics are read through the transaction, so a
    /// concurrent topic write to the same course forces a retry with fresh
    /// data. The count comes from the full query adjusted for the pending
    /// write, never an in-place increment.
    async fn commit_topic_change(&self, topic: &Topic, delete: bool) -> Result<u32, AppError> {
        let topic_count = self
            .client
            .run_transaction(|db, transaction| {
                let topic = topic.clone();
                async move {
                    let course: Option<Course> = db
                        .fluent()
                        .select()
                        .by_id_in(collections::COURSES)
                        .obj()
                        .one(&topic.course_id)
                        .await?;
                    let Some(mut course) = course else {
                        return Ok(None);
                    };

                    let course_id = topic.course_id.clone();
                    let existing: Vec<Topic> = db
                        .fluent()
                        .select()
                        .from(collections::TOPICS)
                        .filter(move |q| q.field("courseId").eq(course_id.clone()))
                        .obj()
                        .query()
                        .await?;
                    let others = existing.iter().filter(|t| t.id != topic.id).count() as u32;
                    course.topic_count = if delete { others } else { others + 1 };

                    if delete {
                        db.fluent()
                            .delete()
                            .from(collections::TOPICS)
                            .document_id(&topic.id)
                            .add_to_transaction(transaction)?;
                    } else {
                        db.fluent()
                            .update()
                            .in_col(collections::TOPICS)
                            .document_id(&topic.id)
                            .object(&topic)
                            .add_to_transaction(transaction)?;
                    }

                    db.fluent()
                        .update()
                        .in_col(collections::COURSES)
                        .document_id(&course.id)
                        .object(&course)
                        .add_to_transaction(transaction)?;

                    Ok(Some(course.topic_count))
                }
                .boxed()
            })
            .await
            .map_err(|e| AppError::Database(format!("Topic transaction failed: {}", e)))?
            .ok_or_else(|| AppError::NotFound("Course not found".to_string()))?;

        tracing::debug!(
            course_id = %topic.course_id,
            topic_id = %topic.id,
            topic_count,
            deleted = delete,
            "Topic change committed"
        );

        Ok(topic_count)
    }
}

#[async_trait]
impl Store for FirestoreDb {
    // ─── User Operations ─────────────────────────────────────────

    async fn get_user(&self, id: &str) -> Result<Option<User>, AppError> {
        self.get_doc(collections::USERS, id).await
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let email = email.to_string();
        let users: Vec<User> = self
            .client
            .fluent()
            .select()
            .from(collections::USERS)
            .filter(move |q| q.field("email").eq(email.clone()))
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(users.into_iter().next())
    }

    async fn insert_user(&self, user: &User) -> Result<(), AppError> {
        if self.find_user_by_email(&user.email).await?.is_some() {
            return Err(AppError::Conflict("User already exists".to_string()));
        }
        self.set_doc(collections::USERS, &user.id, user).await
    }

    async fn update_user(&self, user: &User) -> Result<(), AppError> {
        self.set_doc(collections::USERS, &user.id, user).await
    }

    // ─── One-Time Passcode Operations ───────────────────────────

    async fn insert_otp(&self, otp: &OneTimePasscode) -> Result<(), AppError> {
        self.set_doc(collections::OTPS, &otp.id, otp).await
    }

    async fn delete_otps(&self, email: &str, used: bool) -> Result<usize, AppError> {
        let doomed: Vec<String> = self
            .otps_for_email(email)
            .await?
            .into_iter()
            .filter(|otp| otp.used == used)
            .map(|otp| otp.id)
            .collect();

        stream::iter(doomed.clone())
            .map(|otp_id| {
                let client = self.client.clone();
                async move {
                    client
                        .fluent()
                        .delete()
                        .from(collections::OTPS)
                        .document_id(&otp_id)
                        .execute()
                        .await
                        .map_err(|e| AppError::Database(e.to_string()))
                }
            })
            .buffer_unordered(MAX_CONCURRENT_DB_OPS)
            .collect::<Vec<Result<(), AppError>>>()
            .await
            .into_iter()
            .collect::<Result<Vec<()>, AppError>>()?;

        Ok(doomed.len())
    }

    async fn find_otp(
        &self,
        email: &str,
        lookup: OtpLookup<'_>,
        now: DateTime<Utc>,
    ) -> Result<Option<OneTimePasscode>, AppError> {
        // At most a handful of rows per email; match in memory.
        Ok(self
            .otps_for_email(email)
            .await?
            .into_iter()
            .find(|otp| lookup.matches(otp, email, now)))
    }

    async fn mark_otp_used(&self, otp_id: &str) -> Result<bool, AppError> {
        // Read and flip inside one transaction so two verifies of the same
        // code cannot both win.
        self.client
            .run_transaction(|db, transaction| {
                let otp_id = otp_id.to_string();
                async move {
                    let otp: Option<OneTimePasscode> = db
                        .fluent()
                        .select()
                        .by_id_in(collections::OTPS)
                        .obj()
                        .one(&otp_id)
                        .await?;
                    let Some(mut otp) = otp.filter(|otp| !otp.used) else {
                        return Ok(false);
                    };

                    otp.used = true;
                    db.fluent()
                        .update()
                        .in_col(collections::OTPS)
                        .document_id(&otp_id)
                        .object(&otp)
                        .add_to_transaction(transaction)?;
                    Ok(true)
                }
                .boxed()
            })
            .await
            .map_err(|e| AppError::Database(format!("OTP transaction failed: {}", e)))
    }

    // ─── Course Operations ───────────────────────────────────────

    async fn list_courses(&self) -> Result<Vec<Course>, AppError> {
        self.client
            .fluent()
            .select()
            .from(collections::COURSES)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn get_course(&self, id: &str) -> Result<Option<Course>, AppError> {
        self.get_doc(collections::COURSES, id).await
    }

    async fn list_courses_by_admin(&self, user_id: &str) -> Result<Vec<Course>, AppError> {
        let user_id = user_id.to_string();
        self.client
            .fluent()
            .select()
            .from(collections::COURSES)
            .filter(move |q| q.field("course_admin").eq(user_id.clone()))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn upsert_course(&self, course: &Course) -> Result<(), AppError> {
        self.set_doc(collections::COURSES, &course.id, course).await
    }

    // ─── Topic Operations ────────────────────────────────────────

    async fn get_topic(&self, id: &str) -> Result<Option<Topic>, AppError> {
        self.get_doc(collections::TOPICS, id).await
    }

    async fn find_topic_by_title(
        &self,
        course_id: &str,
        title: &str,
    ) -> Result<Option<Topic>, AppError> {
        let course_id = course_id.to_string();
        let title = title.to_string();
        let topics: Vec<Topic> = self
            .client
            .fluent()
            .select()
            .from(collections::TOPICS)
            .filter(move |q| {
                q.for_all([
                    q.field("courseId").eq(course_id.clone()),
                    q.field("title").eq(title.clone()),
                ])
            })
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(topics.into_iter().next())
    }

    async fn list_topics(&self, course_id: &str) -> Result<Vec<Topic>, AppError> {
        let course_id = course_id.to_string();
        let mut topics: Vec<Topic> = self
            .client
            .fluent()
            .select()
            .from(collections::TOPICS)
            .filter(move |q| q.field("courseId").eq(course_id.clone()))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        topics.sort_by_key(|t| t.order);
        Ok(topics)
    }

    async fn save_topic(&self, topic: &Topic) -> Result<u32, AppError> {
        self.commit_topic_change(topic, false).await
    }

    async fn delete_topic(&self, topic: &Topic) -> Result<u32, AppError> {
        self.commit_topic_change(topic, true).await
    }

    // ─── Enrollment & Progress Operations ────────────────────────

    async fn get_enrollment(
        &self,
        user_id: &str,
        course_id: &str,
    ) -> Result<Option<Enrollment>, AppError> {
        self.get_doc(
            collections::ENROLLMENTS,
            &enrollment_doc_id(user_id, course_id),
        )
        .await
    }

    async fn upsert_enrollment(&self, enrollment: &Enrollment) -> Result<(), AppError> {
        self.set_doc(collections::ENROLLMENTS, &enrollment.doc_id(), enrollment)
            .await
    }

    async fn list_enrollments(&self, user_id: &str) -> Result<Vec<Enrollment>, AppError> {
        let user_id = user_id.to_string();
        self.client
            .fluent()
            .select()
            .from(collections::ENROLLMENTS)
            .filter(move |q| q.field("userId").eq(user_id.clone()))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn get_video_progress(
        &self,
        user_id: &str,
        course_id: &str,
        video_id: &str,
    ) -> Result<Option<VideoProgress>, AppError> {
        self.get_doc(
            collections::VIDEO_PROGRESS,
            &video_progress_doc_id(user_id, course_id, video_id),
        )
        .await
    }

    async fn list_video_progress(
        &self,
        user_id: &str,
        course_id: &str,
    ) -> Result<Vec<VideoProgress>, AppError> {
        let user_id = user_id.to_string();
        let course_id = course_id.to_string();
        self.client
            .fluent()
            .select()
            .from(collections::VIDEO_PROGRESS)
            .filter(move |q| {
                q.for_all([
                    q.field("userId").eq(user_id.clone()),
                    q.field("courseId").eq(course_id.clone()),
                ])
            })
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn list_user_progress(&self, user_id: &str) -> Result<Vec<VideoProgress>, AppError> {
        let user_id = user_id.to_string();
        self.client
            .fluent()
            .select()
            .from(collections::VIDEO_PROGRESS)
            .filter(move |q| q.field("userId").eq(user_id.clone()))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn commit_progress(
        &self,
        progress: &VideoProgress,
        enrollment: Option<&Enrollment>,
    ) -> Result<(), AppError> {
        let Some(enrollment) = enrollment else {
            return self
                .set_doc(collections::VIDEO_PROGRESS, &progress.doc_id(), progress)
                .await;
        };

        let mut transaction = self
            .client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        self.client
            .fluent()
            .update()
            .in_col(collections::VIDEO_PROGRESS)
            .document_id(progress.doc_id())
            .object(progress)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add progress to transaction: {}", e))
            })?;

        self.client
            .fluent()
            .update()
            .in_col(collections::ENROLLMENTS)
            .document_id(enrollment.doc_id())
            .object(enrollment)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add enrollment to transaction: {}", e))
            })?;

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        Ok(())
    }
}
