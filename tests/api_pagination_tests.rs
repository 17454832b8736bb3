// SPDX-License-Identifier: MIT

//! Feed pagination parameter tests.
//!
//! These tests verify that:
//! 1. Cursor tokens are validated before reaching the database
//! 2. Page-size limits are enforced

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use tower::ServiceExt;

mod common;

#[tokio::test]
async fn test_nearby_rejects_zero_limit() {
    let (app, _state) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/incidents/nearby?lat=6.9271&lng=79.8612&limit=0")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_nearby_rejects_negative_limit() {
    let (app, _state) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/incidents/nearby?lat=6.9271&lng=79.8612&limit=-5")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_nearby_rejects_garbage_cursor() {
    let (app, _state) = common::create_test_app();

    for cursor in ["!!!", "not-base64!!", "aGVsbG8"] {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri(format!(
                        "/api/incidents/nearby?lat=6.9271&lng=79.8612&cursor={}",
                        cursor
                    ))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            response.status(),
            StatusCode::BAD_REQUEST,
            "cursor={}",
            cursor
        );
    }
}

#[tokio::test]
async fn test_nearby_rejects_cursor_with_negative_distance() {
    let (app, _state) = common::create_test_app();

    let payload = format!(
        "{}:{}",
        (-1.0f64).to_bits(),
        "00000000-0000-0000-0000-000000000000"
    );
    let cursor = URL_SAFE_NO_PAD.encode(payload);

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(format!(
                    "/api/incidents/nearby?lat=6.9271&lng=79.8612&cursor={}",
                    cursor
                ))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_nearby_accepts_oversized_limit() {
    // Oversized limits are clamped server-side, not rejected.
    let (app, _state) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/incidents/nearby?lat=6.9271&lng=79.8612&limit=10000")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}
