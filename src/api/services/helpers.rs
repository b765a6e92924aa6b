//! 响应构建帮助函数

use actix_web::error::{InternalError, JsonPayloadError};
use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, web};
use serde::Serialize;
use tracing::debug;

use crate::api::types::ErrorResponse;
use crate::errors::ShortenerError;

const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// 构建 JSON 响应
pub fn json_response<T: Serialize>(status: StatusCode, data: &T) -> HttpResponse {
    HttpResponse::build(status)
        .insert_header(("Content-Type", JSON_CONTENT_TYPE))
        .json(data)
}

/// 从 ShortenerError 构建错误响应（自动映射 HTTP 状态码）
pub fn error_response(err: &ShortenerError) -> HttpResponse {
    json_response(err.http_status(), &ErrorResponse::from(err))
}

/// 统一 Result → HttpResponse 转换
pub fn api_result<T: Serialize>(
    status: StatusCode,
    result: Result<T, ShortenerError>,
) -> HttpResponse {
    match result {
        Ok(data) => json_response(status, &data),
        Err(e) => error_response(&e),
    }
}

/// Malformed or unreadable JSON bodies answer 400 with the usual error body.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(64 * 1024)
        .error_handler(|err: JsonPayloadError, _req: &HttpRequest| {
            debug!("Rejected request body: {}", err);
            let response =
                error_response(&ShortenerError::bad_request(format!("Invalid JSON body: {}", err)));
            InternalError::from_response(err, response).into()
        })
}
