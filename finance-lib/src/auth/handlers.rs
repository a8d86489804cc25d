use std::sync::Arc;

use actix_web::{http, web, HttpRequest, HttpResponse, Responder, ResponseError};
use finance_repo::user_repo::{NewUser, User, UserRepo, UserRepoError};
use serde::Deserialize;
use tracing::{error, info};

use super::jwt::JWTAuth;
use super::{password, removal_cookie, session_cookie, LOGIN_PATH};
use crate::error::HandlerError;
use crate::view::{non_blank, non_empty, FormView};
use crate::InitialCash;

const INVALID_CREDENTIALS: &str = "Invalid username and/or password";

#[derive(Deserialize)]
pub struct LoginForm {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Deserialize)]
pub struct RegisterForm {
    pub username: Option<String>,
    pub password: Option<String>,
    pub confirmation: Option<String>,
}

fn jwt_auth(req: &HttpRequest) -> Result<&JWTAuth, HandlerError> {
    req.app_data::<JWTAuth>()
        .ok_or_else(|| HandlerError::Internal("Sessions are not configured".to_owned()))
}

/// Starts a session for `user` and sends them to the portfolio.
fn start_session(req: &HttpRequest, user: &User) -> Result<HttpResponse, HandlerError> {
    let token = jwt_auth(req)?.create_token(user.id)?;
    info!(user_id = user.id, "session started");
    Ok(HttpResponse::Found()
        .insert_header((http::header::LOCATION, "/"))
        .cookie(session_cookie(token))
        .finish())
}

#[get("/login")]
pub async fn login_form() -> impl Responder {
    HttpResponse::Ok()
        .cookie(removal_cookie())
        .json(FormView::new("login", &["username", "password"]))
}

#[post("/login")]
pub async fn login(
    user_repo: web::Data<Arc<dyn UserRepo>>,
    form: web::Form<LoginForm>,
    req: HttpRequest,
) -> HttpResponse {
    match authenticate(user_repo.get_ref().as_ref(), form.into_inner()).await {
        Ok(user) => match start_session(&req, &user) {
            Ok(response) => response,
            Err(err) => err.error_response(),
        },
        Err(err) => {
            // a failed attempt still ends whatever session was there before
            let mut response = err.error_response();
            if let Err(err) = response.add_removal_cookie(&removal_cookie()) {
                error!(%err, "unable to clear session cookie");
            }
            response
        }
    }
}

async fn authenticate(user_repo: &dyn UserRepo, form: LoginForm) -> Result<User, HandlerError> {
    let username =
        non_blank(form.username).ok_or_else(|| HandlerError::apology("Must provide username"))?;
    let password =
        non_empty(form.password).ok_or_else(|| HandlerError::apology("Must provide password"))?;

    let user = match user_repo.get_user_by_username(&username).await {
        Ok(user) => user,
        Err(UserRepoError::UserNotFound(_)) => {
            return Err(HandlerError::apology(INVALID_CREDENTIALS));
        }
        Err(err) => return Err(err.into()),
    };

    if password::verify_password(&password, &user.password_hash)? {
        Ok(user)
    } else {
        Err(HandlerError::apology(INVALID_CREDENTIALS))
    }
}

#[get("/logout")]
pub async fn logout() -> impl Responder {
    HttpResponse::Found()
        .insert_header((http::header::LOCATION, LOGIN_PATH))
        .cookie(removal_cookie())
        .finish()
}

#[get("/register")]
pub async fn register_form() -> impl Responder {
    HttpResponse::Ok().json(FormView::new(
        "register",
        &["username", "password", "confirmation"],
    ))
}

#[post("/register")]
pub async fn register(
    user_repo: web::Data<Arc<dyn UserRepo>>,
    initial_cash: web::Data<InitialCash>,
    form: web::Form<RegisterForm>,
    req: HttpRequest,
) -> Result<HttpResponse, HandlerError> {
    let form = form.into_inner();
    let username = non_blank(form.username)
        .ok_or_else(|| HandlerError::apology("Please supply a username"))?;
    let password = non_empty(form.password)
        .filter(|password| form.confirmation.as_ref() == Some(password))
        .ok_or_else(|| {
            HandlerError::apology("Please enter a password and a matching confirmation")
        })?;

    let password_hash = password::encode_password(&password)?;
    let new_user = NewUser::new(username, password_hash, initial_cash.0);
    let user = match user_repo.create_user(new_user).await {
        Ok(user) => user,
        Err(UserRepoError::UserAlreadyExists(_)) => {
            return Err(HandlerError::apology("Username is already taken"));
        }
        Err(err) => return Err(err.into()),
    };
    info!(user_id = user.id, username = %user.username, "registered user");

    start_session(&req, &user)
}
