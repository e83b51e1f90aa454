#[macro_use]
mod common;

use actix_web::http::{header, StatusCode};
use actix_web::test;
use chrono::{Duration, Utc};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use common::{bearer, send, TestState, PASSWORD};
use taskdesk::auth::Identity;
use taskdesk::models::Role;
use taskdesk::store::UserStore;

const TASKS: &str = "/api/v1/task-mgmt/tasks";

fn signup_payload(email: &str) -> Value {
    json!({
        "firstName": "Ada",
        "lastName": "Lovelace",
        "email": email,
        "password": PASSWORD,
        "confirmPassword": PASSWORD,
        "phoneNumber": "+44 20 7946 0958",
        "address": "12 Analytical Row",
        "gender": "FEMALE"
    })
}

fn login_request(uri: &str, email: &str, password: &str) -> actix_http::Request {
    test::TestRequest::post()
        .uri(uri)
        .set_json(json!({ "email": email, "password": password }))
        .to_request()
}

#[test_log::test(actix_rt::test)]
async fn test_signup_and_login_flow() {
    let state = TestState::new();
    let app = test_app!(state);

    let req = test::TestRequest::post()
        .uri("/api/v1/user-mgmt/user/signup")
        .set_json(signup_payload("  Ada@Example.com "))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::CREATED, "signup failed: {}", body);
    assert_eq!(body, json!({"code": "201", "description": "Successful", "responseData": null}));

    let stored = state.users.find_user_by_email("ada@example.com").await.unwrap().unwrap();
    assert_ne!(stored.password_hash, PASSWORD);
    assert_eq!(stored.role, Role::User);

    let (status, body) = send(&app, login_request("/api/v1/user-mgmt/login", "ada@example.com", PASSWORD)).await;
    assert_eq!(status, StatusCode::OK);
    let profile = &body["responseData"];
    assert_eq!(profile["email"], "ada@example.com");
    assert_eq!(profile["role"], "USER");
    assert_eq!(profile["firstName"], "Ada");

    let access = profile["authResponse"]["accessToken"].as_str().unwrap();
    let refresh = profile["authResponse"]["refreshToken"].as_str().unwrap();
    assert_ne!(access, refresh);
    assert_eq!(
        state.codec.parse(access).unwrap(),
        Identity::new("ada@example.com", Role::User)
    );

    // The issued token opens a protected route.
    let req = test::TestRequest::get().uri(TASKS).insert_header(bearer(access)).to_request();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
}

#[actix_rt::test]
async fn test_signup_rejections() {
    let state = TestState::new();
    let app = test_app!(state);
    state.seed_user("taken@example.com", "Existing", "User", Role::User).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/user-mgmt/admin/signup")
        .set_json(signup_payload("TAKEN@example.com"))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["description"], "Email already exist!");

    let mut mismatch = signup_payload("new@example.com");
    mismatch["confirmPassword"] = json!("something-else");
    let req = test::TestRequest::post()
        .uri("/api/v1/user-mgmt/user/signup")
        .set_json(mismatch)
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["description"], "Password mismatch.");

    let req = test::TestRequest::post()
        .uri("/api/v1/user-mgmt/user/signup")
        .set_json(signup_payload("not-an-email"))
        .to_request();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let req = test::TestRequest::post()
        .uri("/api/v1/user-mgmt/user/signup")
        .insert_header((header::CONTENT_TYPE, "application/json"))
        .set_payload("{not json")
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "400");
}

#[actix_rt::test]
async fn test_login_failures_are_indistinguishable() {
    let state = TestState::new();
    let app = test_app!(state);
    state.seed_user("known@example.com", "Known", "User", Role::User).await;

    let (unknown_status, unknown_body) =
        send(&app, login_request("/api/v1/user-mgmt/login", "nobody@example.com", PASSWORD)).await;
    let (wrong_status, wrong_body) =
        send(&app, login_request("/api/v1/user-mgmt/login", "known@example.com", "wrong-password")).await;

    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_body, wrong_body);
    assert_eq!(
        unknown_body,
        json!({"code": "401", "description": "Invalid credentials", "responseData": null})
    );
}

#[actix_rt::test]
async fn test_login_portals_require_matching_role() {
    let state = TestState::new();
    let app = test_app!(state);
    state.seed_user("user@example.com", "Plain", "User", Role::User).await;
    state.seed_user("admin@example.com", "Head", "Admin", Role::Admin).await;

    let (status, body) =
        send(&app, login_request("/api/v1/user-mgmt/user/login", "admin@example.com", PASSWORD)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["description"], "Invalid credentials");

    let (status, _) =
        send(&app, login_request("/api/v1/user-mgmt/admin/login", "user@example.com", PASSWORD)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) =
        send(&app, login_request("/api/v1/user-mgmt/admin/login", "admin@example.com", PASSWORD)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["responseData"]["role"], "ADMIN");

    let (status, body) =
        send(&app, login_request("/api/v1/user-mgmt/user/login", "user@example.com", PASSWORD)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["responseData"]["role"], "USER");
}

#[actix_rt::test]
async fn test_bad_credentials_on_requests() {
    let state = TestState::new();
    let app = test_app!(state);
    let identity = Identity::new("user@example.com", Role::User);

    let expired = state
        .codec
        .issue_at(&identity, 1, Utc::now() - Duration::hours(2))
        .unwrap();
    let req = test::TestRequest::get().uri(TASKS).insert_header(bearer(&expired)).to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["description"], "Token has expired");

    let valid = state.token_for("user@example.com", Role::User);
    let (head, signature) = valid.rsplit_once('.').unwrap();
    let flipped = if signature.starts_with('A') { 'B' } else { 'A' };
    let tampered = format!("{}.{}{}", head, flipped, &signature[1..]);

    let foreign = taskdesk::auth::TokenCodec::new("another-secret-entirely-0123456789abcdef", 120, 1440)
        .unwrap()
        .issue(&identity, 30)
        .unwrap();

    for token in [tampered.as_str(), foreign.as_str(), "not.a.token"] {
        let req = test::TestRequest::get().uri(TASKS).insert_header(bearer(token)).to_request();
        let (status, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "token {:?} was accepted", token);
        assert_eq!(body["description"], "Invalid bearer token");
    }

    for value in ["Basic dXNlcjpwYXNz", "Bearer", "Token abc"] {
        let req = test::TestRequest::get()
            .uri(TASKS)
            .insert_header((header::AUTHORIZATION, value))
            .to_request();
        let (status, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "header {:?} was accepted", value);
        assert_eq!(body["description"], "Invalid bearer token");
    }
}

#[actix_rt::test]
async fn test_missing_token_and_wrong_role_share_one_answer() {
    let state = TestState::new();
    let app = test_app!(state);
    let user_token = state.token_for("user@example.com", Role::User);

    let req = test::TestRequest::get().uri("/api/v1/user-mgmt/users").to_request();
    let (anonymous_status, anonymous_body) = send(&app, req).await;

    let req = test::TestRequest::get()
        .uri("/api/v1/user-mgmt/users")
        .insert_header(bearer(&user_token))
        .to_request();
    let (user_status, user_body) = send(&app, req).await;

    assert_eq!(anonymous_status, StatusCode::UNAUTHORIZED);
    assert_eq!(user_status, StatusCode::UNAUTHORIZED);
    assert_eq!(anonymous_body, user_body);
}

#[actix_rt::test]
async fn test_admin_lists_user_accounts() {
    let state = TestState::new();
    let app = test_app!(state);
    state.seed_user("admin@example.com", "Head", "Admin", Role::Admin).await;
    for i in 0..3 {
        state
            .seed_user(&format!("user{}@example.com", i), "User", &i.to_string(), Role::User)
            .await;
    }
    let token = state.token_for("admin@example.com", Role::Admin);

    let req = test::TestRequest::get()
        .uri("/api/v1/user-mgmt/users?pageNum=0&pageSize=2")
        .insert_header(bearer(&token))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    let page = &body["responseData"];
    assert_eq!(page["content"].as_array().unwrap().len(), 2);
    assert_eq!(page["totalElement"], 2);
    assert_eq!(page["last"], false);
    assert!(page["content"][0].get("authResponse").is_none());

    let req = test::TestRequest::get()
        .uri("/api/v1/user-mgmt/users?pageNum=1&pageSize=2")
        .insert_header(bearer(&token))
        .to_request();
    let (_, body) = send(&app, req).await;
    assert_eq!(body["responseData"]["content"].as_array().unwrap().len(), 1);
    assert_eq!(body["responseData"]["last"], true);

    let req = test::TestRequest::get()
        .uri("/api/v1/user-mgmt/users?pageSize=0")
        .insert_header(bearer(&token))
        .to_request();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}
