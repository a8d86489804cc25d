use crate::error::HandlerError;
use crate::user::UserId;
use actix_web::body::EitherBody;
use actix_web::cookie::{Cookie, SameSite};
use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::web::{Data, ServiceConfig};
use actix_web::{http, Error, HttpMessage, HttpResponse};
use finance_repo::user_repo::{UserRepo, UserRepoError};
use futures_util::future::{ready, LocalBoxFuture, Ready};
use jwt::JWTAuth;
use std::rc::Rc;
use std::sync::Arc;
use tracing::debug;
use tracing_actix_web::RootSpan;

pub mod handlers;
pub mod jwt;
pub mod password;

pub const SESSION_COOKIE: &str = "session";
pub const LOGIN_PATH: &str = "/login";

pub fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, token)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .finish()
}

/// A cookie that, once sent, makes the browser forget the session.
pub fn removal_cookie() -> Cookie<'static> {
    let mut cookie = session_cookie(String::new());
    cookie.make_removal();
    cookie
}

pub fn auth_config(signups_enabled: bool) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.service(handlers::login_form)
            .service(handlers::login)
            .service(handlers::logout);
        if signups_enabled {
            cfg.service(handlers::register_form)
                .service(handlers::register);
        }
    }
}

/// Reads the user id out of the session cookie using [JWTAuth].
fn session_user(req: &ServiceRequest) -> Option<UserId> {
    let jwt_auth = req.app_data::<JWTAuth>()?;
    let cookie = req.cookie(SESSION_COOKIE)?;
    match jwt_auth.validate_token(cookie.value()) {
        Ok(user_id) => Some(user_id),
        Err(err) => {
            debug!(%err, "rejected session token");
            None
        }
    }
}

fn redirect_to_login<B>(req: ServiceRequest) -> ServiceResponse<EitherBody<B>> {
    let response = HttpResponse::Found()
        .insert_header((http::header::LOCATION, LOGIN_PATH))
        .cookie(removal_cookie())
        .finish()
        .map_into_right_body();
    let (request, _payload) = req.into_parts();
    ServiceResponse::new(request, response)
}

/// Guards every wrapped route with the session cookie. A valid session for a known user injects
/// the user id into the request and into the [RootSpan]; anything else is redirected to the login
/// page.
pub struct SessionAuthentication;

impl<S, B> Transform<S, ServiceRequest> for SessionAuthentication
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = SessionAuthenticationMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(SessionAuthenticationMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct SessionAuthenticationMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for SessionAuthenticationMiddleware<S>
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
        let Some(user_id) = session_user(&req) else {
            return Box::pin(ready(Ok(redirect_to_login(req))));
        };
        let Some(user_repo) = req.app_data::<Data<Arc<dyn UserRepo>>>().cloned() else {
            let err = HandlerError::Internal("User repository is not configured".to_owned());
            return Box::pin(ready(Ok(req.error_response(err).map_into_right_body())));
        };

        let service = Rc::clone(&self.service);
        Box::pin(async move {
            match user_repo.get_user(user_id).await {
                Ok(_) => {}
                Err(UserRepoError::UserNotFound(_)) => {
                    debug!(user_id, "session for unknown user");
                    return Ok(redirect_to_login(req));
                }
                Err(err) => {
                    let err = HandlerError::from(err);
                    return Ok(req.error_response(err).map_into_right_body());
                }
            }

            if let Some(root_span) = req.extensions().get::<RootSpan>() {
                root_span.record("user_id", &user_id);
            }
            req.extensions_mut().insert::<UserId>(user_id);

            let res = service.call(req).await?;
            Ok(res.map_into_left_body())
        })
    }
}
