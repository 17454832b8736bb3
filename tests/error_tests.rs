// SPDX-License-Identifier: MIT

//! Error-to-HTTP mapping tests.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use resq_api::error::AppError;

#[test]
fn test_error_status_codes() {
    let cases = [
        (AppError::Unauthorized, StatusCode::UNAUTHORIZED),
        (AppError::InvalidToken, StatusCode::UNAUTHORIZED),
        (
            AppError::Forbidden("nope".to_string()),
            StatusCode::FORBIDDEN,
        ),
        (
            AppError::NotFound("gone".to_string()),
            StatusCode::NOT_FOUND,
        ),
        (
            AppError::Validation("bad".to_string()),
            StatusCode::BAD_REQUEST,
        ),
        (
            AppError::Conflict("taken".to_string()),
            StatusCode::CONFLICT,
        ),
        (
            AppError::Upstream("cloudinary".to_string()),
            StatusCode::BAD_GATEWAY,
        ),
        (
            AppError::Database("boom".to_string()),
            StatusCode::INTERNAL_SERVER_ERROR,
        ),
    ];

    for (err, expected) in cases {
        let response = err.into_response();
        assert_eq!(response.status(), expected);
    }
}

#[test]
fn test_row_not_found_maps_to_not_found() {
    let err: AppError = sqlx::Error::RowNotFound.into();
    assert!(matches!(err, AppError::NotFound(_)));
}
