//! One-time passcodes for the password-reset flow.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

/// How long an issued passcode stays valid.
pub const OTP_TTL_MINUTES: i64 = 10;

/// A short-lived passcode bound to an email and a capability token.
///
/// The capability token is disclosed only after the code has been verified,
/// and is honored by the reset step only while `used` is true and the
/// passcode has not expired.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OneTimePasscode {
    /// Document ID
    pub id: String,
    /// Normalized email
    pub email: String,
    /// Six ASCII digits
    pub code: String,
    /// Opaque hex secret released on successful verification
    pub capability_token: String,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
    pub created_at: DateTime<Utc>,
}

impl OneTimePasscode {
    /// Issue a fresh, unused passcode expiring `OTP_TTL_MINUTES` from `now`.
    pub fn issue(email: String, code: String, capability_token: String, now: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            email,
            code,
            capability_token,
            expires_at: now + Duration::minutes(OTP_TTL_MINUTES),
            used: false,
            created_at: now,
        }
    }

    fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }

    fn code_eq(&self, code: &str) -> bool {
        secret_eq(&self.code, code)
    }

    fn capability_eq(&self, token: &str) -> bool {
        secret_eq(&self.capability_token, token)
    }

    /// Verify-step lookup: unused, unexpired, matching email and code.
    pub fn matches_code(&self, email: &str, code: &str, now: DateTime<Utc>) -> bool {
        !self.used && self.is_live(now) && self.email == email && self.code_eq(code)
    }

    /// Reset-step lookup: already verified, unexpired, matching email and token.
    pub fn matches_capability(&self, email: &str, token: &str, now: DateTime<Utc>) -> bool {
        self.used && self.is_live(now) && self.email == email && self.capability_eq(token)
    }
}

/// Constant-time comparison; an empty stored secret matches nothing.
fn secret_eq(stored: &str, presented: &str) -> bool {
    !stored.is_empty() && bool::from(stored.as_bytes().ct_eq(presented.as_bytes()))
}

/// Which secret a passcode lookup is keyed on.
#[derive(Debug, Clone, Copy)]
pub enum OtpLookup<'a> {
    Code(&'a str),
    Capability(&'a str),
}

impl OtpLookup<'_> {
    pub fn matches(&self, otp: &OneTimePasscode, email: &str, now: DateTime<Utc>) -> bool {
        match *self {
            OtpLookup::Code(code) => otp.matches_code(email, code, now),
            OtpLookup::Capability(token) => otp.matches_capability(email, token, now),
        }
    }
}
