//! HTTP presentation layer for famispots.
//!
//! A thin actix-web wrapper over the listing store: the gallery frontend
//! fetches `GET /places`, the submission form posts to `POST /places` and
//! `POST /photos`. The store instance is constructed once at startup and
//! passed to the handlers through shared state; handlers hold no state of
//! their own across requests.

mod handlers;

use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse, ResponseError};
use serde::Serialize;

use crate::error::Error;
use crate::store::ListingStore;

/// Shared state handed to every request handler.
pub struct AppState {
    /// The active listing store backend.
    pub store: Box<dyn ListingStore>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("backend", &self.store.backend_name())
            .finish()
    }
}

/// JSON body returned for failed requests.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        if self.is_validation() {
            StatusCode::UNPROCESSABLE_ENTITY
        } else if self.is_unsupported_format() {
            StatusCode::UNSUPPORTED_MEDIA_TYPE
        } else if self.is_storage() {
            StatusCode::BAD_GATEWAY
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorBody {
            error: self.to_string(),
        })
    }
}

/// Register the API routes and the upload size limit.
pub fn configure(max_upload_bytes: usize) -> impl Fn(&mut web::ServiceConfig) + Clone {
    move |cfg: &mut web::ServiceConfig| {
        cfg.app_data(web::PayloadConfig::new(max_upload_bytes))
            .service(handlers::get_places)
            .service(handlers::post_place)
            .service(handlers::post_photo)
            .service(handlers::get_health);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_maps_to_422() {
        let err = Error::validation("name", "empty");
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_unsupported_format_maps_to_415() {
        let err = Error::unsupported_format("gif");
        assert_eq!(err.status_code(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[test]
    fn test_storage_error_maps_to_502() {
        let err = Error::remote("connection refused");
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_error_response_carries_message() {
        let response = Error::validation("name", "name must not be empty").error_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
