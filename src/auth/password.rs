use std::fmt;
use std::sync::Arc;

use bcrypt::{hash, verify};

use crate::config::ConfigError;
use crate::error::AppError;

/// bcrypt accepts work factors in this range.
pub const MIN_COST: u32 = 4;
pub const MAX_COST: u32 = 31;

const DUMMY_PASSWORD: &str = "no-such-account";

/// Salted bcrypt hashing with a configurable work factor.
///
/// Cheap to clone; share one instance per process.
#[derive(Clone)]
pub struct PasswordHasher {
    cost: u32,
    /// Verified against when an account does not exist, so that path costs the same
    /// as a wrong password.
    dummy_hash: Arc<str>,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Result<Self, ConfigError> {
        if !(MIN_COST..=MAX_COST).contains(&cost) {
            return Err(ConfigError::Invalid {
                key: "BCRYPT_COST",
                reason: format!("must be between {} and {}", MIN_COST, MAX_COST),
            });
        }
        let dummy_hash = hash(DUMMY_PASSWORD, cost).map_err(|e| ConfigError::Invalid {
            key: "BCRYPT_COST",
            reason: e.to_string(),
        })?;
        Ok(Self {
            cost,
            dummy_hash: dummy_hash.into(),
        })
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Hashes `password` with a fresh random salt.
    pub fn hash(&self, password: &str) -> Result<String, AppError> {
        hash(password, self.cost)
            .map_err(|e| AppError::InternalServerError(format!("Failed to hash password: {}", e)))
    }

    /// Returns `true` only when `password` matches `hashed_password`.
    /// A malformed hash is a mismatch, never an error.
    pub fn verify(&self, password: &str, hashed_password: &str) -> bool {
        verify(password, hashed_password).unwrap_or(false)
    }

    /// Verifies against the stored hash when there is one, otherwise burns the same
    /// work against the dummy hash and returns `false`.
    pub fn verify_or_dummy(&self, password: &str, hashed_password: Option<&str>) -> bool {
        match hashed_password {
            Some(stored) => self.verify(password, stored),
            None => {
                let _ = self.verify(password, &self.dummy_hash);
                false
            }
        }
    }
}

impl fmt::Debug for PasswordHasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordHasher")
            .field("cost", &self.cost)
            .finish_non_exhaustive()
    }
}
