use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::not_blank;
use crate::auth::AuthResponse;

lazy_static::lazy_static! {
    // Digits with optional leading '+', spaces or hyphens as separators.
    static ref PHONE_REGEX: regex::Regex = regex::Regex::new(r"^\+?[0-9][0-9 \-]{5,18}[0-9]$").unwrap();
}

/// Account role. Closed set; every authorization decision matches on it exhaustively.
/// Corresponds to the `user_role` SQL enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    /// Sees and updates only the tasks assigned to them.
    User,
    /// Creates, assigns and deletes tasks; lists accounts.
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Admin => "ADMIN",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Corresponds to the `gender` SQL enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "gender", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum Gender {
    Male,
    Female,
    Other,
}

/// A stored account. Never serialized directly: it carries the password hash.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    /// Unique account key and token subject.
    pub email: String,
    pub password_hash: String,
    pub phone_number: String,
    pub address: String,
    pub gender: Gender,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// Fields required to insert an account.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub phone_number: String,
    pub address: String,
    pub gender: Gender,
    pub role: Role,
}

/// Registration payload shared by the user and admin signup routes.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignupInput {
    #[validate(custom(function = "not_blank", message = "First name can not be blank!"))]
    pub first_name: String,
    #[validate(custom(function = "not_blank", message = "Last name can not be blank!"))]
    pub last_name: String,
    #[validate(email(message = "Email is invalid!"))]
    pub email: String,
    #[validate(length(min = 6, max = 72, message = "Password must be between 6 and 72 characters"))]
    pub password: String,
    #[validate(custom(function = "not_blank", message = "Confirm password can not be blank!"))]
    pub confirm_password: String,
    #[validate(regex(path = "PHONE_REGEX", message = "Phone number is invalid!"))]
    pub phone_number: String,
    #[validate(custom(function = "not_blank", message = "Address can not be blank!"))]
    pub address: String,
    pub gender: Gender,
}

/// Public view of an account. Login responses additionally carry the role and tokens.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_response: Option<AuthResponse>,
}

impl UserResponse {
    /// Names and email only, as used in account listings.
    pub fn summary(user: &User) -> Self {
        Self {
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            phone_number: None,
            address: None,
            role: None,
            auth_response: None,
        }
    }

    /// Full profile returned after a successful login.
    pub fn profile(user: User, tokens: AuthResponse) -> Self {
        Self {
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            phone_number: Some(user.phone_number),
            address: Some(user.address),
            role: Some(user.role),
            auth_response: Some(tokens),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    fn signup() -> SignupInput {
        SignupInput {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            password: "password123".to_string(),
            confirm_password: "password123".to_string(),
            phone_number: "+44 20 7946 0958".to_string(),
            address: "12 Analytical Row".to_string(),
            gender: Gender::Female,
        }
    }

    #[test]
    fn test_signup_input_validation() {
        assert!(signup().validate().is_ok());

        let mut input = signup();
        input.email = "ada-at-example.com".to_string();
        assert!(input.validate().is_err());

        let mut input = signup();
        input.first_name = "  ".to_string();
        assert!(input.validate().is_err());

        let mut input = signup();
        input.password = "short".to_string();
        assert!(input.validate().is_err());

        let mut input = signup();
        input.phone_number = "call me".to_string();
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_role_serialization() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"ADMIN\"");
        let role: Role = serde_json::from_str("\"USER\"").unwrap();
        assert_eq!(role, Role::User);
        assert!(serde_json::from_str::<Role>("\"user\"").is_err());
        assert_eq!(Role::User.to_string(), "USER");
    }

    #[test]
    fn test_signup_payload_uses_camel_case() {
        let input: SignupInput = serde_json::from_value(serde_json::json!({
            "firstName": "Ada",
            "lastName": "Lovelace",
            "email": "ada@example.com",
            "password": "password123",
            "confirmPassword": "password123",
            "phoneNumber": "08012345678",
            "address": "12 Analytical Row",
            "gender": "FEMALE"
        }))
        .unwrap();
        assert_eq!(input.confirm_password, "password123");
        assert_eq!(input.gender, Gender::Female);
    }
}
