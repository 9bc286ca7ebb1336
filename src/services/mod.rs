// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod accounts;
pub mod authz;
pub mod email;
pub mod import;
pub mod password_reset;
pub mod progress;
pub mod youtube;

pub use authz::{AccessPolicy, Decision, Role};
pub use email::{create_notifier, EmailNotifier};
pub use import::ImportService;
pub use password_reset::PasswordResetService;
pub use progress::ProgressService;
pub use youtube::YouTubeClient;
