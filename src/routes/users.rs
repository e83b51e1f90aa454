use actix_web::{get, http::StatusCode, post, web, HttpResponse, Responder};
use log::{debug, info};
use validator::Validate;

use crate::{
    auth::{Identity, LoginRequest, PasswordHasher, TokenCodec},
    error::{AppError, AuthError},
    models::{ApiResponse, NewUser, PageQuery, Paginated, Role, SignupInput, UserResponse},
    store::{UserStore, DUPLICATE_EMAIL},
};

/// Register a USER account.
///
/// ## Responses:
/// - `201 Created`: account stored, `responseData` is null.
/// - `400 Bad Request`: duplicate email or `password != confirmPassword`.
/// - `422 Unprocessable Entity`: a field failed validation.
#[post("/user/signup")]
pub async fn signup_user(
    users: web::Data<dyn UserStore>,
    hasher: web::Data<PasswordHasher>,
    payload: web::Json<SignupInput>,
) -> Result<impl Responder, AppError> {
    register(users, hasher, payload.into_inner(), Role::User).await
}

/// Register an ADMIN account. Same contract as [`signup_user`].
#[post("/admin/signup")]
pub async fn signup_admin(
    users: web::Data<dyn UserStore>,
    hasher: web::Data<PasswordHasher>,
    payload: web::Json<SignupInput>,
) -> Result<impl Responder, AppError> {
    register(users, hasher, payload.into_inner(), Role::Admin).await
}

async fn register(
    users: web::Data<dyn UserStore>,
    hasher: web::Data<PasswordHasher>,
    mut input: SignupInput,
    role: Role,
) -> Result<HttpResponse, AppError> {
    input.email = input.email.trim().to_lowercase();
    input.validate()?;

    if input.password != input.confirm_password {
        return Err(AppError::BadRequest("Password mismatch.".into()));
    }
    if users.exists_by_email(&input.email).await? {
        return Err(AppError::BadRequest(DUPLICATE_EMAIL.into()));
    }

    // bcrypt blocks; run it on the blocking pool.
    let password = input.password;
    let password_hash = web::block(move || hasher.hash(&password)).await??;

    let user = users
        .insert_user(NewUser {
            first_name: input.first_name.trim().to_string(),
            last_name: input.last_name.trim().to_string(),
            email: input.email,
            password_hash,
            phone_number: input.phone_number,
            address: input.address,
            gender: input.gender,
            role,
        })
        .await?;
    info!("Registered {} account id={}", user.role, user.id);

    Ok(HttpResponse::Created().json(ApiResponse::empty(StatusCode::CREATED, "Successful")))
}

/// Log in with any role.
///
/// Unknown email and wrong password are indistinguishable: both answer the generic
/// 401 and both cost one bcrypt verification.
#[post("/login")]
pub async fn login(
    users: web::Data<dyn UserStore>,
    hasher: web::Data<PasswordHasher>,
    codec: web::Data<TokenCodec>,
    payload: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    sign_in(users, hasher, codec, payload.into_inner(), None).await
}

/// Log in through the USER portal. An ADMIN account gets the generic 401.
#[post("/user/login")]
pub async fn login_user(
    users: web::Data<dyn UserStore>,
    hasher: web::Data<PasswordHasher>,
    codec: web::Data<TokenCodec>,
    payload: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    sign_in(users, hasher, codec, payload.into_inner(), Some(Role::User)).await
}

/// Log in through the ADMIN portal. A USER account gets the generic 401.
#[post("/admin/login")]
pub async fn login_admin(
    users: web::Data<dyn UserStore>,
    hasher: web::Data<PasswordHasher>,
    codec: web::Data<TokenCodec>,
    payload: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    sign_in(users, hasher, codec, payload.into_inner(), Some(Role::Admin)).await
}

async fn sign_in(
    users: web::Data<dyn UserStore>,
    hasher: web::Data<PasswordHasher>,
    codec: web::Data<TokenCodec>,
    mut input: LoginRequest,
    portal: Option<Role>,
) -> Result<HttpResponse, AppError> {
    input.email = input.email.trim().to_lowercase();
    input.validate()?;

    let user = users.find_user_by_email(&input.email).await?;
    let stored_hash = user.as_ref().map(|u| u.password_hash.clone());
    let password = input.password;
    let matched =
        web::block(move || hasher.verify_or_dummy(&password, stored_hash.as_deref())).await?;

    let user = match user {
        Some(user) if matched && portal.map_or(true, |role| role == user.role) => user,
        _ => {
            debug!("Login refused for portal {:?}", portal);
            return Err(AuthError::CredentialMismatch.into());
        }
    };

    let tokens = codec.issue_pair(&Identity::new(user.email.clone(), user.role))?;
    info!("{} account id={} logged in", user.role, user.id);

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        StatusCode::OK,
        UserResponse::profile(user, tokens),
    )))
}

/// Page through USER accounts. ADMIN only (enforced by the route policy).
#[get("/users")]
pub async fn list_users(
    users: web::Data<dyn UserStore>,
    page: web::Query<PageQuery>,
) -> Result<impl Responder, AppError> {
    let page = page.into_inner();
    page.validate()?;

    let slice = users
        .page_users_by_role(Role::User, page)
        .await?
        .map(|user| UserResponse::summary(&user));

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        StatusCode::OK,
        Paginated::from(slice),
    )))
}
