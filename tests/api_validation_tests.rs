// SPDX-License-Identifier: MIT

//! API input validation tests.
//!
//! These tests verify that malformed query parameters and multipart
//! bodies are rejected with 400 before any database work happens.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use resq_api::models::Role;
use tower::ServiceExt;
use uuid::Uuid;

mod common;

const BOUNDARY: &str = "test-boundary";

fn multipart_body(fields: &[(&str, &str)]) -> (String, String) {
    let mut body = String::new();
    for (name, value) in fields {
        body.push_str(&format!(
            "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
            BOUNDARY, name, value
        ));
    }
    body.push_str(&format!("--{}--\r\n", BOUNDARY));

    let content_type = format!("multipart/form-data; boundary={}", BOUNDARY);
    (body, content_type)
}

fn multipart_body_with_file(
    fields: &[(&str, &str)],
    file_name: &str,
    file_content_type: &str,
    file_bytes: &[u8],
) -> (Vec<u8>, String) {
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
    body.extend_from_slice(
        format!(
            "--{}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
            BOUNDARY, file_name, file_content_type
        )
        .as_bytes(),
    );
    body.extend_from_slice(file_bytes);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

    let content_type = format!("multipart/form-data; boundary={}", BOUNDARY);
    (body, content_type)
}

const VALID_FIELDS: &[(&str, &str)] = &[
    ("title", "House Fire"),
    ("lat", "6.9271"),
    ("lng", "79.8612"),
    ("phone", "0712345678"),
];

#[tokio::test]
async fn test_nearby_requires_coordinates() {
    let (app, _state) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/incidents/nearby?radius=1000")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_nearby_rejects_non_positive_radius() {
    let (app, _state) = common::create_test_app();

    for radius in ["0", "-500"] {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri(format!(
                        "/api/incidents/nearby?lat=6.9271&lng=79.8612&radius={}",
                        radius
                    ))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "radius={}", radius);
    }
}

#[tokio::test]
async fn test_map_pins_rejects_non_positive_radius() {
    let (app, _state) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/incidents/map-pins?lat=6.9271&lng=79.8612&radius=0")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_incident_requires_title() {
    let (app, state) = common::create_test_app();
    let token = common::create_test_jwt(
        Uuid::new_v4(),
        "victim@example.com",
        Role::Victim,
        &state.config.jwt_signing_key,
    );

    let (body, content_type) = multipart_body(&[
        ("description", "Water rising fast"),
        ("lat", "6.9271"),
        ("lng", "79.8612"),
        ("phone", "0712345678"),
    ]);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/incidents")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .header(header::CONTENT_TYPE, content_type)
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_incident_requires_phone() {
    let (app, state) = common::create_test_app();
    let token = common::create_test_jwt(
        Uuid::new_v4(),
        "victim@example.com",
        Role::Victim,
        &state.config.jwt_signing_key,
    );

    let (body, content_type) = multipart_body(&[
        ("title", "Flooded street"),
        ("lat", "6.9271"),
        ("lng", "79.8612"),
    ]);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/incidents")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .header(header::CONTENT_TYPE, content_type)
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_incident_rejects_non_numeric_coordinates() {
    let (app, state) = common::create_test_app();
    let token = common::create_test_jwt(
        Uuid::new_v4(),
        "victim@example.com",
        Role::Victim,
        &state.config.jwt_signing_key,
    );

    let (body, content_type) = multipart_body(&[
        ("title", "Flooded street"),
        ("lat", "somewhere"),
        ("lng", "79.8612"),
        ("phone", "0712345678"),
    ]);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/incidents")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .header(header::CONTENT_TYPE, content_type)
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_incident_accepts_mid_size_photo() {
    // A photo between 2MB and 10MB must reach the handler; the unconfigured
    // media store then fails with 502, not a body-limit 400.
    let (app, state) = common::create_test_app();
    let token = common::create_test_jwt(
        Uuid::new_v4(),
        "victim@example.com",
        Role::Victim,
        &state.config.jwt_signing_key,
    );

    let photo = vec![0u8; 3 * 1024 * 1024];
    let (body, content_type) =
        multipart_body_with_file(VALID_FIELDS, "scene.png", "image/png", &photo);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/incidents")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .header(header::CONTENT_TYPE, content_type)
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_create_incident_rejects_oversized_photo() {
    let (app, state) = common::create_test_app();
    let token = common::create_test_jwt(
        Uuid::new_v4(),
        "victim@example.com",
        Role::Victim,
        &state.config.jwt_signing_key,
    );

    let photo = vec![0u8; 10 * 1024 * 1024 + 1];
    let (body, content_type) =
        multipart_body_with_file(VALID_FIELDS, "scene.png", "image/png", &photo);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/incidents")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .header(header::CONTENT_TYPE, content_type)
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_incident_rejects_non_image_file() {
    let (app, state) = common::create_test_app();
    let token = common::create_test_jwt(
        Uuid::new_v4(),
        "victim@example.com",
        Role::Victim,
        &state.config.jwt_signing_key,
    );

    let (body, content_type) =
        multipart_body_with_file(VALID_FIELDS, "report.pdf", "application/pdf", b"%PDF-1.4");

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/incidents")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .header(header::CONTENT_TYPE, content_type)
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_update_me_rejects_unknown_role() {
    let (app, state) = common::create_test_app();
    let token = common::create_test_jwt(
        Uuid::new_v4(),
        "victim@example.com",
        Role::Victim,
        &state.config.jwt_signing_key,
    );

    let response = app
        .oneshot(
            Request::builder()
                .method("PATCH")
                .uri("/api/users/me")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"role":"SUPERHERO"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_incident_detail_rejects_malformed_id() {
    let (app, state) = common::create_test_app();
    let token = common::create_test_jwt(
        Uuid::new_v4(),
        "victim@example.com",
        Role::Victim,
        &state.config.jwt_signing_key,
    );

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/incidents/not-a-uuid")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
