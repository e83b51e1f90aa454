use std::fmt;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::context::Identity;
use super::AuthResponse;
use crate::config::{Config, ConfigError, MIN_SECRET_LEN};
use crate::error::{AppError, AuthError};
use crate::models::Role;

/// Represents the claims encoded within a JWT (JSON Web Token).
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject of the token: the account email.
    pub sub: String,
    /// Role at the time of issuance.
    pub role: Role,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: i64,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
    /// Token id; keeps two tokens issued in the same second distinct.
    pub jti: Uuid,
}

/// Issues and parses HS256-signed tokens with one process-wide secret.
///
/// Claims are readable by whoever holds a token but cannot be altered without
/// invalidating the signature. Changing the secret invalidates every token issued
/// before the change.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    access_ttl_minutes: u32,
    refresh_ttl_minutes: u32,
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec")
            .field("access_ttl_minutes", &self.access_ttl_minutes)
            .field("refresh_ttl_minutes", &self.refresh_ttl_minutes)
            .finish_non_exhaustive()
    }
}

impl TokenCodec {
    /// Creates a codec. A secret shorter than [`MIN_SECRET_LEN`] bytes or a zero TTL is rejected.
    pub fn new(
        secret: &str,
        access_ttl_minutes: u32,
        refresh_ttl_minutes: u32,
    ) -> Result<Self, ConfigError> {
        if secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::Invalid {
                key: "JWT_SECRET",
                reason: format!("must be at least {} bytes", MIN_SECRET_LEN),
            });
        }
        if access_ttl_minutes == 0 || refresh_ttl_minutes == 0 {
            return Err(ConfigError::Invalid {
                key: "TOKEN_TTL_MINUTES",
                reason: "must be greater than zero".into(),
            });
        }

        // Pinned to HS256. Expiry is checked by `parse_at` with no leeway.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            access_ttl_minutes,
            refresh_ttl_minutes,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Self::new(
            &config.jwt_secret,
            config.access_token_ttl_minutes,
            config.refresh_token_ttl_minutes,
        )
    }

    /// Issues a token for `identity` that expires `ttl_minutes` from now.
    pub fn issue(&self, identity: &Identity, ttl_minutes: u32) -> Result<String, AppError> {
        self.issue_at(identity, ttl_minutes, Utc::now())
    }

    /// Issues a token as if the current instant were `now`.
    pub fn issue_at(
        &self,
        identity: &Identity,
        ttl_minutes: u32,
        now: DateTime<Utc>,
    ) -> Result<String, AppError> {
        if ttl_minutes == 0 {
            return Err(AppError::InternalServerError(
                "Token lifetime must be positive".into(),
            ));
        }
        let expires_at = now + Duration::minutes(i64::from(ttl_minutes));
        let claims = Claims {
            sub: identity.subject.clone(),
            role: identity.role,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::InternalServerError(format!("Failed to generate token: {}", e)))
    }

    /// Issues the access and refresh tokens handed out at login.
    pub fn issue_pair(&self, identity: &Identity) -> Result<AuthResponse, AppError> {
        let now = Utc::now();
        Ok(AuthResponse {
            access_token: self.issue_at(identity, self.access_ttl_minutes, now)?,
            refresh_token: self.issue_at(identity, self.refresh_ttl_minutes, now)?,
        })
    }

    /// Verifies `token` and returns the identity it carries.
    pub fn parse(&self, token: &str) -> Result<Identity, AuthError> {
        self.parse_at(token, Utc::now())
    }

    /// Verifies `token` against the instant `now`.
    ///
    /// The signature is checked before any claim is looked at. A token is expired from
    /// the second its `exp` is reached.
    pub fn parse_at(&self, token: &str, now: DateTime<Utc>) -> Result<Identity, AuthError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::TokenInvalid,
            })?;

        if now.timestamp() >= claims.exp {
            return Err(AuthError::TokenExpired);
        }
        if claims.sub.is_empty() {
            return Err(AuthError::TokenInvalid);
        }

        Ok(Identity::new(claims.sub, claims.role))
    }
}
