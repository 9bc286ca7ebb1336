// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Who may manage which course.
//!
//! Two tiers only: the configured super admin manages everything, and a
//! course admin manages the courses that record them as `course_admin`.

use crate::error::AppError;
use crate::middleware::auth::AuthUser;
use crate::models::user::normalize_email;
use crate::models::Course;

/// Capacity in which an actor was allowed to act on a course.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    SuperAdmin,
    CourseAdmin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow(Role),
    Deny,
}

/// Authorization rules derived from configuration.
#[derive(Debug, Clone)]
pub struct AccessPolicy {
    admin_email: Option<String>,
}

impl AccessPolicy {
    pub fn new(admin_email: Option<String>) -> Self {
        Self {
            admin_email: admin_email.map(|e| normalize_email(&e)),
        }
    }

    /// Whether an admin identity is configured at all.
    pub fn has_admin(&self) -> bool {
        self.admin_email.is_some()
    }

    pub fn is_super_admin(&self, actor: &AuthUser) -> bool {
        self.is_admin_email(&actor.email)
    }

    /// Whether `email` names the configured super admin.
    pub fn is_admin_email(&self, email: &str) -> bool {
        self.admin_email
            .as_deref()
            .is_some_and(|admin| normalize_email(email) == admin)
    }

    /// Fail closed: 500 when no admin is configured, 403 for anyone else.
    pub fn ensure_super_admin(&self, actor: &AuthUser) -> Result<(), AppError> {
        if !self.has_admin() {
            return Err(AppError::Misconfigured("Admin credentials not configured"));
        }
        if !self.is_super_admin(actor) {
            return Err(AppError::Forbidden("Admin access required".to_string()));
        }
        Ok(())
    }

    pub fn authorize_course(&self, actor: &AuthUser, course: &Course) -> Decision {
        if self.is_super_admin(actor) {
            Decision::Allow(Role::SuperAdmin)
        } else if course.course_admin.as_deref() == Some(actor.id.as_str()) {
            Decision::Allow(Role::CourseAdmin)
        } else {
            Decision::Deny
        }
    }

    /// `authorize_course` as a `Result` for handlers.
    pub fn require_course(&self, actor: &AuthUser, course: &Course) -> Result<Role, AppError> {
        match self.authorize_course(actor, course) {
            Decision::Allow(role) => Ok(role),
            Decision::Deny => {
                tracing::warn!(user_id = %actor.id, course_id = %course.id, "Course access denied");
                Err(AppError::Forbidden(
                    "You do not have permission to manage this course".to_string(),
                ))
            }
        }
    }
}
