//! Link management endpoints
//!
//! - POST /shorten
//! - PUT /u/{code}
//! - DELETE /u/{code}
//! - GET /stats/{code}

use actix_web::http::StatusCode;
use actix_web::{Responder, web};

use super::helpers::api_result;
use crate::api::types::{
    LinkResponse, MessageResponse, ShortenRequest, ShortenResponse, StatsResponse, UpdateRequest,
};
use crate::services::LinkService;

pub async fn shorten(
    service: web::Data<LinkService>,
    body: web::Json<ShortenRequest>,
) -> impl Responder {
    let req = body.into_inner();
    let result = service
        .create(&req.url, req.short_code.as_deref())
        .await
        .map(|link| ShortenResponse {
            short_url: service.short_url(&link.code),
            short_code: link.code,
        });
    api_result(StatusCode::CREATED, result)
}

pub async fn update_link(
    service: web::Data<LinkService>,
    path: web::Path<String>,
    body: web::Json<UpdateRequest>,
) -> impl Responder {
    let code = path.into_inner();
    let req = body.into_inner();
    let result = service
        .update(&code, req.url.as_deref(), req.short_code.as_deref())
        .await
        .map(|link| {
            let short_url = service.short_url(&link.code);
            LinkResponse::new(link, short_url)
        });
    api_result(StatusCode::OK, result)
}

pub async fn delete_link(
    service: web::Data<LinkService>,
    path: web::Path<String>,
) -> impl Responder {
    let code = path.into_inner();
    let result = service.delete(&code).await.map(|_| MessageResponse {
        message: format!("Short code '{}' deleted", code),
    });
    api_result(StatusCode::OK, result)
}

pub async fn link_stats(
    service: web::Data<LinkService>,
    path: web::Path<String>,
) -> impl Responder {
    let code = path.into_inner();
    let result = service
        .stats(&code)
        .await
        .map(|access_count| StatsResponse {
            short_code: code.clone(),
            access_count,
        });
    api_result(StatusCode::OK, result)
}
