use std::rc::Rc;
use std::sync::Arc;

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::{header::HeaderMap, Method},
    Error, HttpMessage,
};
use futures::future::{ready, LocalBoxFuture, Ready};
use log::debug;

use super::context::RequestContext;
use super::gate;
use super::policy::{Decision, RoutePolicy};
use super::responder;
use super::token::TokenCodec;
use crate::error::AuthError;

/// Runs the authentication gate and the route policy in front of every handler.
///
/// Admitted requests carry a [`RequestContext`] in their extensions. Refused requests
/// never reach a handler and are answered by the unauthorized responder.
#[derive(Clone)]
pub struct AuthMiddleware {
    codec: Arc<TokenCodec>,
    policy: Arc<RoutePolicy>,
}

impl AuthMiddleware {
    pub fn new(codec: Arc<TokenCodec>, policy: Arc<RoutePolicy>) -> Self {
        Self { codec, policy }
    }
}

/// Authenticates then authorizes a single request.
///
/// `path` must be the form the router dispatches on (`match_info().as_str()`), where
/// every escape except `%25`, `%2F` and `%2B` is already decoded. A path that still
/// carries an escape could name a route the policy does not recognise, so it is refused.
pub fn admit(
    codec: &TokenCodec,
    policy: &RoutePolicy,
    method: &Method,
    path: &str,
    headers: &HeaderMap,
) -> Result<RequestContext, AuthError> {
    let context = gate::authenticate(codec, headers)?;
    if path.contains('%') {
        return Err(AuthError::MalformedRequest);
    }
    match policy.authorize(method, path, &context) {
        Decision::Permitted => Ok(context),
        Decision::Denied(err) => Err(err),
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service: Rc::new(service),
            codec: self.codec.clone(),
            policy: self.policy.clone(),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: Rc<S>,
    codec: Arc<TokenCodec>,
    policy: Arc<RoutePolicy>,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let admitted = admit(
            &self.codec,
            &self.policy,
            req.method(),
            req.match_info().as_str(),
            req.headers(),
        );

        match admitted {
            Ok(context) => {
                req.extensions_mut().insert(context);
                let service = self.service.clone();
                Box::pin(async move {
                    let res = service.call(req).await?;
                    Ok(res.map_into_left_body())
                })
            }
            Err(err) => {
                debug!(
                    "Refused {} {}: {}",
                    req.method(),
                    req.path(),
                    err.kind()
                );
                let res = req
                    .into_response(responder::unauthorized(&err))
                    .map_into_right_body();
                Box::pin(async move { Ok(res) })
            }
        }
    }
}
