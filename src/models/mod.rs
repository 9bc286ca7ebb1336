// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod course;
pub mod otp;
pub mod progress;
pub mod topic;
pub mod user;

pub use course::{Course, CourseView, ForumLink};
pub use otp::{OneTimePasscode, OtpLookup};
pub use progress::{Enrollment, VideoProgress};
pub use topic::{CourseStatistics, Material, MaterialKind, Topic, Video};
pub use user::{User, UserProfile};
