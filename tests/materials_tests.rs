// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Study material upload tests.

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use studyhub::db::Store;
use studyhub::models::Topic;

mod common;
use common::{create_test_app, get_request, TestApp};

const BOUNDARY: &str = "studyhub-test-boundary";
const PDF_BYTES: &[u8] = b"%PDF-1.4\n1 0 obj <<>> endobj\ntrailer <<>>\n%%EOF\n";

/// Build a multipart upload. `file` is (content type, bytes).
fn upload_request(
    uri: &str,
    token: &str,
    fields: &[(&str, &str)],
    file: Option<(&str, &[u8])>,
) -> Request<Body> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
    }
    if let Some((content_type, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"notes.pdf\"\r\nContent-Type: {}\r\n\r\n",
                BOUNDARY, content_type
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::from(body))
        .unwrap()
}

fn stored_files(app: &TestApp) -> usize {
    std::fs::read_dir(app.state.config.upload_dir.join("materials"))
        .map(|entries| entries.count())
        .unwrap_or(0)
}

async fn seed_topic(app: &TestApp) -> Topic {
    let course = app.seed_course("Mechanics").await;
    let topic = Topic::new(&course.id, "Kinematics", "", 0);
    app.db.save_topic(&topic).await.unwrap();
    topic
}

#[tokio::test]
async fn test_admin_uploads_pdf() {
    let app = create_test_app();
    let admin = app.seed_admin().await;
    let token = app.token_for(&admin.id);
    let topic = seed_topic(&app).await;

    let (status, body) = app
        .call(upload_request(
            "/api/admin/upload-material",
            &token,
            &[
                ("topicId", topic.id.as_str()),
                ("materialType", "past-question"),
                ("title", "2023 exam"),
            ],
            Some(("application/pdf", PDF_BYTES)),
        ))
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["message"], "Material uploaded successfully");
    assert_eq!(body["material"]["type"], "past-question");
    let file_url = body["material"]["fileUrl"].as_str().unwrap().to_string();
    assert!(file_url.starts_with("/uploads/materials/"));
    assert!(file_url.ends_with(".pdf"));

    let stored = app.db.get_topic(&topic.id).await.unwrap().unwrap();
    assert_eq!(stored.materials.len(), 1);
    assert_eq!(stored.materials[0].title, "2023 exam");

    // Served back as a static file.
    let response = app.send(get_request(&file_url, None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..], PDF_BYTES);
}

#[tokio::test]
async fn test_rejects_non_pdf() {
    let app = create_test_app();
    let admin = app.seed_admin().await;
    let token = app.token_for(&admin.id);
    let topic = seed_topic(&app).await;

    let (status, body) = app
        .call(upload_request(
            "/api/admin/upload-material",
            &token,
            &[
                ("topicId", topic.id.as_str()),
                ("materialType", "note"),
                ("title", "Notes"),
            ],
            Some(("image/png", &b"\x89PNG"[..])),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Only PDF files are allowed");
    assert_eq!(stored_files(&app), 0);
}

#[tokio::test]
async fn test_missing_file_and_fields() {
    let app = create_test_app();
    let admin = app.seed_admin().await;
    let token = app.token_for(&admin.id);
    let topic = seed_topic(&app).await;

    let (status, body) = app
        .call(upload_request(
            "/api/admin/upload-material",
            &token,
            &[("topicId", topic.id.as_str())],
            None,
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "No file uploaded");

    let (status, body) = app
        .call(upload_request(
            "/api/admin/upload-material",
            &token,
            &[("topicId", topic.id.as_str())],
            Some(("application/pdf", PDF_BYTES)),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["message"],
        "Missing required fields: topicId, materialType, title"
    );

    let (status, body) = app
        .call(upload_request(
            "/api/admin/upload-material",
            &token,
            &[
                ("topicId", "missing"),
                ("materialType", "pdf"),
                ("title", "Notes"),
            ],
            Some(("application/pdf", PDF_BYTES)),
        ))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Topic not found");
    assert_eq!(stored_files(&app), 0);
}

#[tokio::test]
async fn test_unauthorized_upload_keeps_no_file() {
    let app = create_test_app();
    let lecturer = app.seed_user("lecturer@uni.edu", "lecturer1").await;
    let token = app.token_for(&lecturer.id);
    let topic = seed_topic(&app).await;

    let (status, _) = app
        .call(upload_request(
            "/api/course-admin/upload-material",
            &token,
            &[
                ("topicId", topic.id.as_str()),
                ("materialType", "pdf"),
                ("title", "Notes"),
            ],
            Some(("application/pdf", PDF_BYTES)),
        ))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(stored_files(&app), 0);

    let stored = app.db.get_topic(&topic.id).await.unwrap().unwrap();
    assert!(stored.materials.is_empty());
}

#[tokio::test]
async fn test_course_admin_uploads_to_owned_course() {
    let app = create_test_app();
    let lecturer = app.seed_user("lecturer@uni.edu", "lecturer1").await;
    let token = app.token_for(&lecturer.id);
    let topic = seed_topic(&app).await;

    let mut course = app.db.get_course(&topic.course_id).await.unwrap().unwrap();
    course.course_admin = Some(lecturer.id.clone());
    app.db.upsert_course(&course).await.unwrap();

    let (status, _) = app
        .call(upload_request(
            "/api/course-admin/upload-material",
            &token,
            &[
                ("topicId", topic.id.as_str()),
                ("materialType", "pdf"),
                ("title", "Notes"),
            ],
            Some(("application/pdf", PDF_BYTES)),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stored_files(&app), 1);
}
