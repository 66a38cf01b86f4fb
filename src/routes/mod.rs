//! Actix-web handlers. Every JSON failure uses the `{success: false, error}` body.

use actix_web::HttpResponse;
use actix_web::http::StatusCode;
use tera::{Context, Tera};

use crate::dto::api::ErrorResponse;
use crate::services::ServiceError;

pub mod api;
pub mod campaigns;
pub mod notifications;
pub mod tracking;

pub fn error_response(status: StatusCode, message: impl Into<String>) -> HttpResponse {
    HttpResponse::build(status).json(ErrorResponse::new(message))
}

/// Maps a service failure to its HTTP status; internal details are only logged.
pub fn service_error_response(err: ServiceError, action: &str) -> HttpResponse {
    match err {
        ServiceError::NotFound => error_response(StatusCode::NOT_FOUND, "Not found"),
        ServiceError::Form(message) => error_response(StatusCode::BAD_REQUEST, message),
        ServiceError::TypeConstraint(message) => error_response(StatusCode::BAD_REQUEST, message),
        ServiceError::Conflict(message) => error_response(StatusCode::CONFLICT, message),
        ServiceError::Analysis(message) => {
            error_response(StatusCode::INTERNAL_SERVER_ERROR, message)
        }
        err @ (ServiceError::Repository(_) | ServiceError::Internal(_)) => {
            log::error!("Failed to {action}: {err}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    }
}

pub fn render_template(tera: &Tera, template: &str, context: &Context) -> HttpResponse {
    match tera.render(template, context) {
        Ok(body) => HttpResponse::Ok()
            .content_type("text/html; charset=utf-8")
            .body(body),
        Err(err) => {
            log::error!("Failed to render template '{template}': {err}");
            HttpResponse::InternalServerError().finish()
        }
    }
}
