//!
//! # Custom Error Handling
//!
//! This module defines the application error type `AppError` and the authentication
//! failure taxonomy `AuthError`.
//!
//! `AppError` implements `actix_web::error::ResponseError`, so handlers can return it
//! directly. Every error body uses the same envelope as successful responses:
//! `{"code": "<status>", "description": "...", "responseData": null}`.
//! Internal details (database messages, hashing failures) are logged and never
//! returned to the client.
//!
//! `AuthError` failures are always rendered by the unauthorized responder, which
//! collapses every cause to one 401 shape.

use actix_web::{error::BlockingError, error::ResponseError, http::StatusCode, HttpResponse};
use log::error;
use std::fmt;
use validator::ValidationErrors;

use crate::auth::responder;
use crate::models::ApiResponse;

/// Why a request was refused admission, or a login rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    /// Unknown account or wrong password. Indistinguishable to the caller.
    CredentialMismatch,
    /// Malformed token, bad signature, or claims that do not decode.
    TokenInvalid,
    /// Correctly signed token whose expiry has passed.
    TokenExpired,
    /// Authenticated identity whose role the route does not admit.
    InsufficientRole,
    /// An `Authorization` header that is not a well-formed bearer credential.
    MalformedRequest,
    /// Anonymous request on a route that is not public.
    Unauthenticated,
}

impl AuthError {
    /// Stable identifier used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::CredentialMismatch => "credential_mismatch",
            AuthError::TokenInvalid => "token_invalid",
            AuthError::TokenExpired => "token_expired",
            AuthError::InsufficientRole => "insufficient_role",
            AuthError::MalformedRequest => "malformed_request",
            AuthError::Unauthenticated => "unauthenticated",
        }
    }

    /// Message shown to the client. Role and presence failures share one message
    /// so a response does not reveal which rule refused it.
    pub fn description(&self) -> &'static str {
        match self {
            AuthError::CredentialMismatch => "Invalid credentials",
            AuthError::TokenExpired => "Token has expired",
            AuthError::TokenInvalid | AuthError::MalformedRequest => "Invalid bearer token",
            AuthError::InsufficientRole | AuthError::Unauthenticated => {
                "You are not authorized to access this resource"
            }
        }
    }
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.description())
    }
}

impl std::error::Error for AuthError {}

/// Represents all possible errors that can occur while handling a request.
#[derive(Debug)]
pub enum AppError {
    /// Authentication or authorization failure (HTTP 401).
    Auth(AuthError),
    /// Malformed or semantically invalid request (HTTP 400).
    BadRequest(String),
    /// Requested resource was not found (HTTP 404).
    NotFound(String),
    /// Unexpected server-side error (HTTP 500). The message is logged, not returned.
    InternalServerError(String),
    /// Error originating from the storage layer (HTTP 500). The message is logged, not returned.
    DatabaseError(String),
    /// Input failed validation (HTTP 422).
    ValidationError(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InternalServerError(_) | AppError::DatabaseError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::ValidationError(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::Auth(err) => write!(f, "Unauthorized: {}", err),
            AppError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            AppError::InternalServerError(msg) => write!(f, "Internal Server Error: {}", msg),
            AppError::DatabaseError(msg) => write!(f, "Database Error: {}", msg),
            AppError::ValidationError(msg) => write!(f, "Validation Error: {}", msg),
        }
    }
}

/// Converts `AppError` variants into enveloped JSON responses.
impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        self.status()
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status();
        let description = match self {
            AppError::Auth(err) => return responder::unauthorized(err),
            AppError::BadRequest(msg) | AppError::NotFound(msg) | AppError::ValidationError(msg) => {
                msg.clone()
            }
            AppError::InternalServerError(msg) => {
                error!("internal error: {}", msg);
                "An internal error occurred".to_string()
            }
            AppError::DatabaseError(msg) => {
                error!("database error: {}", msg);
                "An internal error occurred".to_string()
            }
        };
        HttpResponse::build(status).json(ApiResponse::empty(status, description))
    }
}

impl From<AuthError> for AppError {
    fn from(error: AuthError) -> AppError {
        AppError::Auth(error)
    }
}

/// `sqlx::Error::RowNotFound` becomes `NotFound`; anything else is a storage failure.
impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> AppError {
        match error {
            sqlx::Error::RowNotFound => AppError::NotFound("Record not found".into()),
            _ => AppError::DatabaseError(error.to_string()),
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(error: ValidationErrors) -> AppError {
        AppError::ValidationError(error.to_string())
    }
}

/// The blocking thread pool was shut down or the closure panicked.
impl From<BlockingError> for AppError {
    fn from(error: BlockingError) -> AppError {
        AppError::InternalServerError(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_error_statuses() {
        let cases = [
            (AppError::Auth(AuthError::TokenExpired), 401),
            (AppError::BadRequest("Invalid input".into()), 400),
            (AppError::NotFound("Resource not found".into()), 404),
            (AppError::InternalServerError("Server error".into()), 500),
            (AppError::DatabaseError("pool timed out".into()), 500),
            (AppError::ValidationError("title".into()), 422),
        ];
        for (error, status) in cases {
            assert_eq!(error.error_response().status(), status, "{error}");
        }
    }

    #[actix_rt::test]
    async fn test_internal_details_are_not_returned() {
        let response = AppError::DatabaseError("relation \"users\" does not exist".into())
            .error_response();
        let body = to_bytes(response.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["code"], "500");
        assert_eq!(json["description"], "An internal error occurred");
        assert!(json["responseData"].is_null());
    }

    #[test]
    fn test_role_and_presence_failures_look_alike() {
        assert_eq!(
            AuthError::InsufficientRole.description(),
            AuthError::Unauthenticated.description()
        );
        assert_ne!(AuthError::InsufficientRole.kind(), AuthError::Unauthenticated.kind());
    }
}
