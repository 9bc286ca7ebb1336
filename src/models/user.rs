//! User model for storage and API.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lowercase and trim an email address so lookups are case-insensitive.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// User account stored in Firestore.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Opaque user ID (also used as document ID)
    pub id: String,
    /// Normalized email, unique across users
    pub email: String,
    /// Argon2 PHC string. Never the plaintext.
    pub password_hash: String,
    pub full_name: String,
    pub faculty: String,
    pub department: String,
    pub level: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a new user, hashing the supplied plaintext password.
    pub fn new(
        email: &str,
        password: &str,
        full_name: String,
        faculty: String,
        department: String,
        level: String,
    ) -> anyhow::Result<Self> {
        let mut user = Self {
            id: uuid::Uuid::new_v4().to_string(),
            email: normalize_email(email),
            password_hash: String::new(),
            full_name,
            faculty,
            department,
            level,
            created_at: Utc::now(),
        };
        user.set_password(password)?;
        Ok(user)
    }

    /// Replace the password. The plaintext is hashed with a fresh salt.
    pub fn set_password(&mut self, password: &str) -> anyhow::Result<()> {
        let salt = SaltString::generate(&mut OsRng);
        self.password_hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?
            .to_string();
        Ok(())
    }

    /// Compare a candidate password against the stored hash.
    pub fn verify_password(&self, candidate: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(&self.password_hash) else {
            tracing::warn!(user_id = %self.id, "Stored password hash is malformed");
            return false;
        };
        Argon2::default()
            .verify_password(candidate.as_bytes(), &parsed)
            .is_ok()
    }
}

/// Public user profile (no credential material).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(rename = "_id")]
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub faculty: String,
    pub department: String,
    pub level: String,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            faculty: user.faculty.clone(),
            department: user.department.clone(),
            level: user.level.clone(),
            created_at: user.created_at,
        }
    }
}
