//! The single failure response for every authentication and authorization refusal.
//!
//! Role failures share the 401 of missing credentials. The body never names the
//! rule that refused the request.

use actix_web::{http::StatusCode, HttpResponse};

use crate::error::AuthError;
use crate::models::ApiResponse;

/// Builds the 401 response for `err`. Carries no token or credential material.
pub fn unauthorized(err: &AuthError) -> HttpResponse {
    HttpResponse::Unauthorized().json(ApiResponse::empty(
        StatusCode::UNAUTHORIZED,
        err.description(),
    ))
}
