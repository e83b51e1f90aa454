pub mod context;
pub mod extractors;
pub mod gate;
pub mod middleware;
pub mod password;
pub mod policy;
pub mod responder;
pub mod token;

use serde::{Deserialize, Serialize};
use validator::Validate;

pub use context::{Identity, RequestContext};
pub use extractors::CurrentUser;
pub use middleware::AuthMiddleware;
pub use password::PasswordHasher;
pub use policy::{Decision, Requirement, RoleSet, RouteRule, RoutePolicy};
pub use token::{Claims, TokenCodec};

/// Represents the payload for a login request.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Account email. Surrounding whitespace is ignored when looking it up.
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Token pair returned by a successful login.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
}
