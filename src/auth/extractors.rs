use actix_web::dev::Payload;
use actix_web::{Error as ActixError, FromRequest, HttpMessage, HttpRequest};
use std::future::{ready, Ready};

use super::context::{Identity, RequestContext};
use crate::error::{AppError, AuthError};

/// The authenticated caller of a handler.
///
/// Reads the [`RequestContext`] that `AuthMiddleware` stored in the request
/// extensions. An anonymous or missing context is answered with the generic 401,
/// so handlers behind a `Public` rule can still demand an identity.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Identity);

impl FromRequest for CurrentUser {
    type Error = ActixError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let identity = req
            .extensions()
            .get::<RequestContext>()
            .and_then(|context| context.identity().cloned());

        match identity {
            Some(identity) => ready(Ok(CurrentUser(identity))),
            None => ready(Err(AppError::Auth(AuthError::Unauthenticated).into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use actix_web::dev::Payload;
    use actix_web::http::StatusCode;
    use actix_web::test;

    #[actix_rt::test]
    async fn test_current_user_extractor_success() {
        let req = test::TestRequest::default().to_http_request();
        req.extensions_mut().insert(RequestContext::authenticated(Identity::new(
            "jane@example.com",
            Role::User,
        )));

        let mut payload = Payload::None;
        let user = CurrentUser::from_request(&req, &mut payload).await.unwrap();
        assert_eq!(user.0.subject, "jane@example.com");
        assert_eq!(user.0.role, Role::User);
    }

    #[actix_rt::test]
    async fn test_current_user_extractor_failure() {
        for req in [
            test::TestRequest::default().to_http_request(),
            {
                let req = test::TestRequest::default().to_http_request();
                req.extensions_mut().insert(RequestContext::anonymous());
                req
            },
        ] {
            let mut payload = Payload::None;
            let err = CurrentUser::from_request(&req, &mut payload)
                .await
                .unwrap_err();
            let response = err.error_response();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        }
    }
}
