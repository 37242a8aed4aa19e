use actix::MailboxError;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use color_eyre::eyre::{eyre, Report};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Failure taxonomy shared by the submission and vote guards.
///
/// Everything except `Storage` carries a message that is safe to show to the
/// client. Storage failures keep their detail server-side: the full report is
/// logged and the response body is a generic message.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("You must be logged in to do that")]
    Unauthenticated,
    #[error("{0}")]
    Validation(&'static str),
    #[error("Too many requests. Please slow down.")]
    RateLimited,
    #[error("{0}")]
    Conflict(&'static str),
    #[error("Website not found")]
    NotFound,
    #[error("{0}")]
    Forbidden(&'static str),
    #[error("Internal server error")]
    Storage(Report),
}

impl From<Report> for ApiError {
    fn from(report: Report) -> Self {
        ApiError::Storage(report)
    }
}

impl From<MailboxError> for ApiError {
    fn from(err: MailboxError) -> Self {
        ApiError::Storage(eyre!("actor mailbox failure: {}", err))
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let ApiError::Storage(report) = self {
            error!("storage failure: {:?}", report);
        }
        HttpResponse::build(self.status_code()).json(json!({ "error": self.to_string() }))
    }
}
