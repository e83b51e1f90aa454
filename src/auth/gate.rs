//! Authentication stage: turns the `Authorization` header into a [`RequestContext`].

use actix_web::http::header::{HeaderMap, AUTHORIZATION};

use super::context::RequestContext;
use super::token::TokenCodec;
use crate::error::AuthError;

/// Extracts the bearer token, if any.
///
/// No header yields `Ok(None)`. A header that is repeated, not visible ASCII, uses a
/// scheme other than `Bearer`, or carries an empty token is `MalformedRequest`.
pub fn bearer_token(headers: &HeaderMap) -> Result<Option<&str>, AuthError> {
    let mut values = headers.get_all(AUTHORIZATION);
    let value = match values.next() {
        Some(value) => value,
        None => return Ok(None),
    };
    if values.next().is_some() {
        return Err(AuthError::MalformedRequest);
    }

    let raw = value.to_str().map_err(|_| AuthError::MalformedRequest)?.trim();
    let (scheme, token) = raw.split_once(' ').ok_or(AuthError::MalformedRequest)?;
    let token = token.trim();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() || token.contains(' ') {
        return Err(AuthError::MalformedRequest);
    }
    Ok(Some(token))
}

/// Anonymous without a credential, authenticated with a valid one, refused otherwise.
pub fn authenticate(codec: &TokenCodec, headers: &HeaderMap) -> Result<RequestContext, AuthError> {
    match bearer_token(headers)? {
        None => Ok(RequestContext::anonymous()),
        Some(token) => codec.parse(token).map(RequestContext::authenticated),
    }
}
