// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account provisioning outside self-registration.

use crate::config::Config;
use crate::db::Store;
use crate::error::AppError;
use crate::models::user::normalize_email;
use crate::models::{Course, User};
use crate::services::authz::AccessPolicy;
use ring::rand::{SecureRandom, SystemRandom};

/// Who is claiming a course, as given in the course-admin login body.
#[derive(Debug, Default, Clone, Copy)]
pub struct CourseAdminIdentity<'a> {
    pub email: Option<&'a str>,
    pub password: Option<&'a str>,
    pub name: Option<&'a str>,
}

/// Create the super-admin account at startup if it does not exist yet.
///
/// Needs both `ADMIN_EMAIL` and `ADMIN_PASSWORD`. An existing account is
/// left untouched so password resets survive restarts.
pub async fn seed_super_admin(db: &dyn Store, config: &Config) -> Result<(), AppError> {
    let (Some(email), Some(password)) = (&config.admin_email, &config.admin_password) else {
        tracing::warn!("ADMIN_EMAIL or ADMIN_PASSWORD not set, skipping admin account seeding");
        return Ok(());
    };

    if db.find_user_by_email(email).await?.is_some() {
        tracing::debug!(email = %email, "Admin account already exists");
        return Ok(());
    }

    let admin = User::new(
        email,
        password,
        "Administrator".to_string(),
        "Administration".to_string(),
        "Administration".to_string(),
        "100".to_string(),
    )?;
    match db.insert_user(&admin).await {
        Ok(()) => tracing::info!(user_id = %admin.id, "Admin account created"),
        // Another instance seeded it first.
        Err(AppError::Conflict(_)) => {}
        Err(e) => return Err(e),
    }
    Ok(())
}

/// Find the user for a course-admin login, creating one if needed.
///
/// The course token only vouches for the course, never for an account: an
/// existing account must also present its own password, and the super
/// admin's account cannot be reached this way at all. New accounts get a
/// random password; they sign in here again or reset it by email.
pub async fn find_or_create_course_admin(
    db: &dyn Store,
    policy: &AccessPolicy,
    course: &Course,
    login: CourseAdminIdentity<'_>,
) -> Result<User, AppError> {
    let email = match login.email.map(normalize_email).filter(|e| !e.is_empty()) {
        Some(email) => {
            if policy.is_admin_email(&email) {
                tracing::warn!(course_id = %course.id, "Course admin login named the super admin");
                return Err(AppError::Forbidden(
                    "This account cannot sign in as a course admin".to_string(),
                ));
            }
            if let Some(user) = db.find_user_by_email(&email).await? {
                return match login.password {
                    Some(password) if user.verify_password(password) => Ok(user),
                    _ => {
                        tracing::warn!(
                            course_id = %course.id,
                            user_id = %user.id,
                            "Course admin login for existing account without its password"
                        );
                        Err(AppError::InvalidCredentials)
                    }
                };
            }
            email
        }
        None => format!(
            "course-admin-{}-{}@temp.studyhub",
            course.id,
            uuid::Uuid::new_v4().simple()
        ),
    };

    let full_name = login
        .name
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .or_else(|| {
            email
                .split('@')
                .next()
                .filter(|local| !local.is_empty() && !local.starts_with("course-admin-"))
                .map(str::to_string)
        })
        .unwrap_or_else(|| "Course Administrator".to_string());

    let user = User::new(
        &email,
        &random_password()?,
        full_name,
        course.faculty.clone(),
        course.department.clone(),
        course.level.clone(),
    )?;
    db.insert_user(&user).await?;
    tracing::info!(user_id = %user.id, course_id = %course.id, "Course admin account created");
    Ok(user)
}

fn random_password() -> Result<String, AppError> {
    let mut buf = [0u8; 16];
    SystemRandom::new()
        .fill(&mut buf)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("System RNG failure")))?;
    Ok(hex::encode(buf))
}
