use actix_web::{HttpResponse, web};
use tracing::trace;

use super::helpers::error_response;
use crate::errors::ShortenerError;
use crate::services::LinkService;
use crate::utils::is_valid_short_code;

pub struct RedirectService;

impl RedirectService {
    /// `GET /u/{code}`: 302 to the target, the click is recorded in the
    /// background.
    pub async fn handle_redirect(
        service: web::Data<LinkService>,
        path: web::Path<String>,
    ) -> HttpResponse {
        let code = path.into_inner();

        // 非法短码直接 404，不查存储
        if !is_valid_short_code(&code) {
            trace!("Invalid short code rejected: {}", code);
            return error_response(&ShortenerError::not_found(format!(
                "Short code '{}' not found",
                code
            )));
        }

        match service.resolve(&code).await {
            Ok(target) => HttpResponse::Found()
                .insert_header(("Location", target))
                .finish(),
            Err(e) => error_response(&e),
        }
    }
}
