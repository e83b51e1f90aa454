#![allow(dead_code)]

use std::sync::Arc;

use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::{test, web};
use serde_json::Value;

use taskdesk::auth::{Identity, PasswordHasher, RoutePolicy, TokenCodec};
use taskdesk::models::{Gender, NewUser, Role, User};
use taskdesk::store::{MemoryStore, TaskStore, UserStore};

pub const SECRET: &str = "integration-test-secret-0123456789abcdef";
pub const PASSWORD: &str = "Password123!";

/// Everything the application needs, backed by the in-memory store.
pub struct TestState {
    pub users: web::Data<dyn UserStore>,
    pub tasks: web::Data<dyn TaskStore>,
    pub hasher: web::Data<PasswordHasher>,
    pub codec: Arc<TokenCodec>,
    pub policy: Arc<RoutePolicy>,
}

impl TestState {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            users: web::Data::from(store.clone() as Arc<dyn UserStore>),
            tasks: web::Data::from(store as Arc<dyn TaskStore>),
            hasher: web::Data::new(PasswordHasher::new(4).unwrap()),
            codec: Arc::new(TokenCodec::new(SECRET, 120, 1440).unwrap()),
            policy: Arc::new(RoutePolicy::task_manager().unwrap()),
        }
    }

    /// Stores an account directly, bypassing the signup route.
    pub async fn seed_user(&self, email: &str, first_name: &str, last_name: &str, role: Role) -> User {
        self.users
            .insert_user(NewUser {
                first_name: first_name.to_string(),
                last_name: last_name.to_string(),
                email: email.to_string(),
                password_hash: self.hasher.hash(PASSWORD).unwrap(),
                phone_number: "+1 555 0100".to_string(),
                address: "1 Main Street".to_string(),
                gender: Gender::Other,
                role,
            })
            .await
            .unwrap()
    }

    pub fn token_for(&self, email: &str, role: Role) -> String {
        self.codec.issue(&Identity::new(email, role), 30).unwrap()
    }
}

/// Builds the application the way the binary does, against a [`TestState`].
macro_rules! test_app {
    ($state:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data($state.users.clone())
                .app_data($state.tasks.clone())
                .app_data($state.hasher.clone())
                .app_data(actix_web::web::Data::from($state.codec.clone()))
                .wrap(taskdesk::auth::AuthMiddleware::new(
                    $state.codec.clone(),
                    $state.policy.clone(),
                ))
                .wrap(actix_web::middleware::Logger::default())
                .configure(taskdesk::routes::config),
        )
        .await
    };
}

/// Sends `req` and returns the status with the JSON body (`Null` when empty).
pub async fn send<S, B>(app: &S, req: actix_http::Request) -> (StatusCode, Value)
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let resp = test::call_service(app, req).await;
    let status = resp.status();
    let bytes = test::read_body(resp).await;
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, body)
}

pub fn bearer(token: &str) -> (actix_web::http::header::HeaderName, String) {
    (actix_web::http::header::AUTHORIZATION, format!("Bearer {}", token))
}
