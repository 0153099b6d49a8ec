/// HTTP middleware for blog-service
///
/// `BearerAuth` resolves an `Authorization: Bearer` token to a stored user
/// for every request. It never rejects on its own: public routes ignore the
/// outcome, and protected handlers ask for a `CurrentUser`, which turns a
/// missing or failed authentication into the matching error.
use crate::error::AppError;
use crate::handlers::AppState;
use crate::models::User;
use crate::services::UserService;
use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{web, Error, FromRequest, HttpMessage, HttpRequest};
use futures::future::LocalBoxFuture;
use std::future::{ready, Ready};
use std::rc::Rc;

// =====================================================================
// Bearer token authentication
// =====================================================================

/// Authenticated user, resolved from the request's bearer token.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// A token was presented but could not be honoured.
#[derive(Debug, Clone)]
enum AuthRejection {
    /// Bad signature, expired, malformed
    InvalidToken(String),
    /// Valid token for a user that no longer exists
    UnknownUser,
}

impl AuthRejection {
    fn to_error(&self) -> AppError {
        match self {
            AuthRejection::InvalidToken(reason) => AppError::Forbidden(reason.clone()),
            AuthRejection::UnknownUser => AppError::Unauthorized("User not found".to_string()),
        }
    }
}

fn bearer_token(req: &ServiceRequest) -> Option<String> {
    let header = req.headers().get("Authorization")?.to_str().ok()?;
    let token = header.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then(|| token.to_string())
}

pub struct BearerAuth;

impl<S, B> Transform<S, ServiceRequest> for BearerAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = BearerAuthService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(BearerAuthService {
            service: Rc::new(service),
        }))
    }
}

pub struct BearerAuthService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for BearerAuthService<S>
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
        let service = self.service.clone();

        Box::pin(async move {
            let state = req.app_data::<web::Data<AppState>>().cloned();
            if let (Some(token), Some(state)) = (bearer_token(&req), state) {
                match state.auth.validate_token(&token) {
                    Ok(user_id) => {
                        let users = UserService::new(state.store.clone(), state.auth.clone());
                        match users.find(user_id).await? {
                            Some(user) => {
                                req.extensions_mut().insert(CurrentUser(user));
                            }
                            None => {
                                tracing::debug!(%user_id, "Token for unknown user");
                                req.extensions_mut().insert(AuthRejection::UnknownUser);
                            }
                        }
                    }
                    Err(err) => {
                        tracing::debug!(error = %err, "Bearer token rejected");
                        req.extensions_mut()
                            .insert(AuthRejection::InvalidToken(err.to_string()));
                    }
                }
            }

            service.call(req).await
        })
    }
}

impl FromRequest for CurrentUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        let extensions = req.extensions();
        let outcome = match (extensions.get::<CurrentUser>(), extensions.get::<AuthRejection>()) {
            (Some(user), _) => Ok(user.clone()),
            (None, Some(rejection)) => Err(rejection.to_error()),
            (None, None) => Err(AppError::Unauthorized("Access token required".to_string())),
        };
        ready(outcome)
    }
}
