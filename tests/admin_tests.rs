// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Super-admin and course-admin route tests.
//!
//! These tests verify that:
//! 1. Admin routes fail closed without a configured admin
//! 2. Only the super admin passes the admin gate
//! 3. Course admins claim a course only with its issued token
//! 4. Course admins manage only the courses they own

use axum::http::{Method, StatusCode};
use serde_json::{json, Value};
use studyhub::db::Store;
use studyhub::models::Topic;

mod common;
use common::{create_test_app, create_test_app_with, get_request, json_request, test_config, TestApp};

async fn generate_token(app: &TestApp, admin_token: &str, course_id: &str) -> (StatusCode, Value) {
    app.call(json_request(
        Method::POST,
        "/api/course-admin/generate-token",
        Some(admin_token),
        json!({ "courseId": course_id }),
    ))
    .await
}

async fn course_admin_login(app: &TestApp, body: Value) -> (StatusCode, Value) {
    app.call(json_request(Method::POST, "/api/course-admin/login", None, body))
        .await
}

/// Issue a token as the super admin and log in with it.
async fn claim_course(app: &TestApp, course_id: &str, email: &str) -> (String, String) {
    let admin = app.seed_admin().await;
    let (_, body) = generate_token(app, &app.token_for(&admin.id), course_id).await;
    let access_token = body["token"].as_str().unwrap().to_string();

    let (status, body) = course_admin_login(
        app,
        json!({ "courseId": course_id, "accessToken": access_token, "email": email }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    (
        body["_id"].as_str().unwrap().to_string(),
        body["token"].as_str().unwrap().to_string(),
    )
}

#[tokio::test]
async fn test_admin_routes_require_auth() {
    let app = create_test_app();

    let (status, _) = app.call(get_request("/api/admin/courses", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .call(get_request("/api/admin/courses", Some("not-a-jwt")))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_routes_reject_non_admin() {
    let app = create_test_app();
    let user = app.seed_user("student@uni.edu", "password1").await;

    let (status, body) = app
        .call(get_request(
            "/api/admin/courses",
            Some(app.token_for(&user.id).as_str()),
        ))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Admin access required");
}

#[tokio::test]
async fn test_admin_routes_fail_closed_without_admin_email() {
    let mut config = test_config();
    config.admin_email = None;
    let app = create_test_app_with(config, Default::default());
    let user = app.seed_user("admin@studyhub.test", "password1").await;

    let (status, body) = app
        .call(get_request(
            "/api/admin/courses",
            Some(app.token_for(&user.id).as_str()),
        ))
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "Admin credentials not configured");
}

#[tokio::test]
async fn test_create_and_list_courses() {
    let app = create_test_app();
    let admin = app.seed_admin().await;
    let token = app.token_for(&admin.id);

    for (title, level) in [("Waves", "200"), ("Optics", "200"), ("Mechanics", "100")] {
        let (status, body) = app
            .call(json_request(
                Method::POST,
                "/api/admin/courses",
                Some(token.as_str()),
                json!({
                    "title": title,
                    "faculty": "Science",
                    "department": "Physics",
                    "level": level,
                    "units": 2
                }),
            ))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["message"], "Course created successfully");
        assert_eq!(body["course"]["units"], 2);
    }

    let (status, body) = app
        .call(get_request("/api/admin/courses", Some(token.as_str())))
        .await;
    assert_eq!(status, StatusCode::OK);
    let titles: Vec<_> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["title"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(titles, ["Mechanics", "Optics", "Waves"]);

    let (status, body) = app
        .call(json_request(
            Method::POST,
            "/api/admin/courses",
            Some(token.as_str()),
            json!({ "title": "Quantum", "faculty": "Science", "department": "Physics", "level": "700" }),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"]["level"], "Level must be 100, 200, 300, 400, or 500");
}

#[tokio::test]
async fn test_delete_topic_recounts() {
    let app = create_test_app();
    let admin = app.seed_admin().await;
    let token = app.token_for(&admin.id);
    let course = app.seed_course("Mechanics").await;
    let first = Topic::new(&course.id, "Kinematics", "", 0);
    let second = Topic::new(&course.id, "Dynamics", "", 1);
    app.db.save_topic(&first).await.unwrap();
    app.db.save_topic(&second).await.unwrap();

    let (status, body) = app
        .call(json_request(
            Method::DELETE,
            &format!("/api/admin/topics/{}", first.id),
            Some(token.as_str()),
            json!({}),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Topic deleted successfully");
    assert_eq!(body["topicCount"], 1);
    let stored = app.db.get_course(&course.id).await.unwrap().unwrap();
    assert_eq!(stored.topic_count, 1);

    let (status, body) = app
        .call(json_request(
            Method::DELETE,
            &format!("/api/admin/topics/{}", first.id),
            Some(token.as_str()),
            json!({}),
        ))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Topic not found");
}

#[tokio::test]
async fn test_only_super_admin_generates_tokens() {
    let app = create_test_app();
    let course = app.seed_course("Mechanics").await;
    let user = app.seed_user("student@uni.edu", "password1").await;

    let (status, _) = generate_token(&app, &app.token_for(&user.id), &course.id).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let admin = app.seed_admin().await;
    let (status, body) = generate_token(&app, &app.token_for(&admin.id), &course.id).await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap();
    assert_eq!(token.len(), 64);
    assert_eq!(body["courseTitle"], "Mechanics");

    // The token is stored but never listed.
    let stored = app.db.get_course(&course.id).await.unwrap().unwrap();
    assert_eq!(stored.access_token.as_deref(), Some(token));
    let (_, listing) = app
        .call(get_request("/api/courses", Some(app.token_for(&user.id).as_str())))
        .await;
    assert!(!listing.to_string().contains(token));
}

#[tokio::test]
async fn test_course_admin_login_requires_issued_token() {
    let app = create_test_app();
    let course = app.seed_course("Mechanics").await;

    // Never issued: cannot be claimed, even with an empty-looking guess.
    let (status, _) = course_admin_login(
        &app,
        json!({ "courseId": course.id, "accessToken": "anything" }),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = course_admin_login(&app, json!({ "courseId": course.id })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Missing required fields: courseId, accessToken");

    let admin = app.seed_admin().await;
    generate_token(&app, &app.token_for(&admin.id), &course.id).await;

    let (status, body) = course_admin_login(
        &app,
        json!({ "courseId": course.id, "accessToken": "0".repeat(64) }),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Invalid course access token");

    let (status, _) = course_admin_login(
        &app,
        json!({ "courseId": "missing", "accessToken": "0".repeat(64) }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_course_admin_claims_and_manages_course() {
    let app = create_test_app();
    let course = app.seed_course("Mechanics").await;
    let other = app.seed_course("Optics").await;

    let (user_id, token) = claim_course(&app, &course.id, "Lecturer@Uni.edu").await;
    let stored = app.db.get_course(&course.id).await.unwrap().unwrap();
    assert_eq!(stored.course_admin.as_deref(), Some(user_id.as_str()));
    let user = app.db.get_user(&user_id).await.unwrap().unwrap();
    assert_eq!(user.email, "lecturer@uni.edu");

    let (status, body) = app
        .call(get_request("/api/course-admin/my-courses", Some(token.as_str())))
        .await;
    assert_eq!(status, StatusCode::OK);
    let courses = body.as_array().unwrap();
    assert_eq!(courses.len(), 1);
    assert_eq!(courses[0]["_id"], course.id.as_str());

    let (status, body) = app
        .call(json_request(
            Method::PUT,
            &format!("/api/course-admin/courses/{}", course.id),
            Some(token.as_str()),
            json!({ "title": "Classical Mechanics", "units": 4, "level": "500" }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["course"]["title"], "Classical Mechanics");
    assert_eq!(body["course"]["units"], 4);
    // Level is not editable here.
    assert_eq!(body["course"]["level"], "100");

    let (status, body) = app
        .call(get_request(
            &format!("/api/course-admin/courses/{}", other.id),
            Some(token.as_str()),
        ))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(
        body["message"],
        "You do not have permission to manage this course"
    );

    // The super admin sees every course.
    let admin = app.seed_admin().await;
    let (_, body) = app
        .call(get_request(
            "/api/course-admin/my-courses",
            Some(app.token_for(&admin.id).as_str()),
        ))
        .await;
    assert_eq!(body.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_forum_links() {
    let app = create_test_app();
    let course = app.seed_course("Mechanics").await;
    let (_, token) = claim_course(&app, &course.id, "lecturer@uni.edu").await;
    let links = format!("/api/course-admin/courses/{}/forum-links", course.id);

    let (status, body) = app
        .call(json_request(
            Method::POST,
            &links,
            Some(token.as_str()),
            json!({ "title": "Class group", "url": "https://chat.whatsapp.com/abc" }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["forumLink"]["platform"], "Other");
    let first_id = body["forumLink"]["_id"].as_str().unwrap().to_string();

    let (status, body) = app
        .call(json_request(
            Method::POST,
            &links,
            Some(token.as_str()),
            json!({ "title": "Again", "url": "https://chat.whatsapp.com/abc" }),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "This forum link already exists for this course");

    let (status, body) = app
        .call(json_request(
            Method::POST,
            &links,
            Some(token.as_str()),
            json!({ "title": "Bad", "url": "chat group" }),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid URL format");

    let (status, body) = app
        .call(json_request(
            Method::POST,
            &links,
            Some(token.as_str()),
            json!({ "title": "Discord", "url": "https://discord.gg/xyz", "platform": "Discord" }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    let second_id = body["forumLink"]["_id"].as_str().unwrap().to_string();

    // Updating onto another link's URL is a duplicate.
    let (status, body) = app
        .call(json_request(
            Method::PUT,
            &format!("{}/{}", links, second_id),
            Some(token.as_str()),
            json!({ "title": "Discord", "url": "https://chat.whatsapp.com/abc" }),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "This URL already exists for this course");

    // Keeping its own URL is fine.
    let (status, body) = app
        .call(json_request(
            Method::PUT,
            &format!("{}/{}", links, second_id),
            Some(token.as_str()),
            json!({ "title": "Discord server", "url": "https://discord.gg/xyz", "platform": "Discord" }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["forumLink"]["title"], "Discord server");

    let (status, _) = app
        .call(json_request(
            Method::DELETE,
            &format!("{}/{}", links, first_id),
            Some(token.as_str()),
            json!({}),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .call(json_request(
            Method::DELETE,
            &format!("{}/{}", links, first_id),
            Some(token.as_str()),
            json!({}),
        ))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Forum link not found");

    let stored = app.db.get_course(&course.id).await.unwrap().unwrap();
    assert_eq!(stored.forum_links.len(), 1);
    assert_eq!(stored.forum_links[0].platform, "Discord");
}

#[tokio::test]
async fn test_course_token_does_not_reach_existing_accounts() {
    let app = create_test_app();
    let course = app.seed_course("Mechanics").await;
    let admin = app.seed_admin().await;
    let student = app.seed_user("victim@uni.edu", "password1").await;
    let (_, body) = generate_token(&app, &app.token_for(&admin.id), &course.id).await;
    let access_token = body["token"].as_str().unwrap().to_string();

    // The super admin's account is never handed out, even with its password.
    for password in [None, Some("AdminPass1")] {
        let (status, body) = course_admin_login(
            &app,
            json!({
                "courseId": course.id,
                "accessToken": access_token,
                "email": "Admin@StudyHub.test",
                "password": password
            }),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert!(body.get("token").is_none());
    }

    for password in [None, Some("wrong-password")] {
        let (status, body) = course_admin_login(
            &app,
            json!({
                "courseId": course.id,
                "accessToken": access_token,
                "email": "victim@uni.edu",
                "password": password
            }),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Invalid credentials");
        assert!(body.get("token").is_none());
    }

    let stored = app.db.get_course(&course.id).await.unwrap().unwrap();
    assert_eq!(stored.course_admin, None);

    // With the account's own password the owner may claim the course.
    let (status, body) = course_admin_login(
        &app,
        json!({
            "courseId": course.id,
            "accessToken": access_token,
            "email": "victim@uni.edu",
            "password": "password1"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["_id"], student.id.as_str());
    let stored = app.db.get_course(&course.id).await.unwrap().unwrap();
    assert_eq!(stored.course_admin.as_deref(), Some(student.id.as_str()));
}
