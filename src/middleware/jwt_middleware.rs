/// JWT Authentication Middleware
///
/// Validates the access token from the Authorization header and injects the
/// authenticated account ID into request extensions for route handlers.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage,
};
use futures::future::LocalBoxFuture;
use std::rc::Rc;
use uuid::Uuid;

use crate::auth::{extract_bearer, SessionManager};
use crate::error::AppError;

/// Account ID proven by a valid access token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedAccount(pub Uuid);

/// JWT middleware for protecting routes
pub struct JwtMiddleware {
    sessions: SessionManager,
}

impl JwtMiddleware {
    pub fn new(sessions: SessionManager) -> Self {
        Self { sessions }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = JwtMiddlewareService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(JwtMiddlewareService {
            service: Rc::new(service),
            sessions: self.sessions.clone(),
        }))
    }
}

pub struct JwtMiddlewareService<S> {
    service: Rc<S>,
    sessions: SessionManager,
}

impl<S, B> Service<ServiceRequest> for JwtMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let authenticated = extract_bearer(req.headers())
            .and_then(|token| self.sessions.authenticate(token));

        match authenticated {
            Ok(account_id) => {
                req.extensions_mut().insert(AuthenticatedAccount(account_id));
                tracing::debug!(account_id = %account_id, "JWT validated successfully");

                let service = self.service.clone();
                Box::pin(async move { service.call(req).await })
            }
            Err(e) => {
                let err: Error = AppError::from(e).into();
                Box::pin(async move { Err(err) })
            }
        }
    }
}
