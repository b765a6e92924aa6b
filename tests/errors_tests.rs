//! Error type tests
//!
//! Checks the error body the HTTP layer renders for each error kind.

use actix_web::http::StatusCode;
use shortener::api::services::error_response;
use shortener::api::types::ErrorResponse;
use shortener::errors::ShortenerError;

#[test]
fn test_error_response_body() {
    let err = ShortenerError::code_conflict("Short code 'b' is already taken");
    let body = ErrorResponse::from(&err);

    assert_eq!(body.error, "Short code 'b' is already taken");
    assert_eq!(body.code, "E004");
    assert_eq!(body.kind, "Short Code Conflict");
}

#[test]
fn test_error_response_status() {
    let cases = [
        (ShortenerError::invalid_url("x"), StatusCode::BAD_REQUEST),
        (ShortenerError::invalid_format("x"), StatusCode::BAD_REQUEST),
        (ShortenerError::already_exists("x"), StatusCode::CONFLICT),
        (ShortenerError::code_conflict("x"), StatusCode::CONFLICT),
        (ShortenerError::not_found("x"), StatusCode::NOT_FOUND),
        (
            ShortenerError::generation_exhausted("x"),
            StatusCode::INTERNAL_SERVER_ERROR,
        ),
        (
            ShortenerError::storage_unavailable("x"),
            StatusCode::SERVICE_UNAVAILABLE,
        ),
    ];

    for (err, status) in cases {
        assert_eq!(error_response(&err).status(), status, "{:?}", err);
    }
}

#[test]
fn test_json_error_maps_to_storage_unavailable() {
    let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    let err: ShortenerError = json_err.into();
    assert!(matches!(err, ShortenerError::StorageUnavailable(_)));
}

#[test]
fn test_colored_format_contains_code_and_message() {
    colored::control::set_override(false);
    let err = ShortenerError::configuration("bad port");
    let out = err.format_colored();
    assert!(out.contains("E008"));
    assert!(out.contains("bad port"));
}
