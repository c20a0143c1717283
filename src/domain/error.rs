use actix_web::http::header;
use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

/// Where an unauthenticated mutation is sent. The login flow itself is an
/// external collaborator.
pub const LOGIN_PATH: &str = "/api/auth/login";

pub fn post_detail_path(post_id: Uuid) -> String {
    format!("/api/posts/{post_id}")
}

pub fn profile_path(username: &str) -> String {
    format!("/api/profile/{username}")
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum DomainError {
    /// Missing, or exists but the viewer may not read it. The two cases are
    /// deliberately indistinguishable so hidden content does not leak
    /// through error codes.
    #[error("not found")]
    NotFound,
    /// Mutation attempted without an identity; answered with a redirect to
    /// the login flow rather than a 401.
    #[error("unauthenticated")]
    Unauthenticated,
    /// Authenticated but not the owner. Intentionally not a 403: the caller
    /// is bounced to the resource's public detail view with no error body.
    #[error("not the owner, redirecting to {redirect}")]
    OwnershipDenied { redirect: String },
    #[error("validation failed")]
    Validation(Vec<FieldError>),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        DomainError::Validation(vec![FieldError::new(field, message)])
    }
}

impl ResponseError for DomainError {
    fn status_code(&self) -> StatusCode {
        match self {
            DomainError::NotFound => StatusCode::NOT_FOUND,
            DomainError::Unauthenticated | DomainError::OwnershipDenied { .. } => {
                StatusCode::SEE_OTHER
            }
            DomainError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            DomainError::Conflict(_) => StatusCode::CONFLICT,
            DomainError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            DomainError::Unauthenticated => HttpResponse::SeeOther()
                .insert_header((header::LOCATION, LOGIN_PATH))
                .finish(),
            DomainError::OwnershipDenied { redirect } => HttpResponse::SeeOther()
                .insert_header((header::LOCATION, redirect.as_str()))
                .finish(),
            DomainError::Validation(fields) => HttpResponse::UnprocessableEntity()
                .json(json!({ "error": "validation failed", "fields": fields })),
            other => HttpResponse::build(self.status_code())
                .json(json!({ "error": other.to_string() })),
        }
    }
}
