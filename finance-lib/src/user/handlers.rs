use crate::auth::password;
use crate::error::HandlerError;
use crate::user::UserId;
use crate::view::{non_empty, redirect, FormView};
use actix_web::{web, HttpResponse, Responder};
use finance_repo::user_repo::UserRepo;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

#[derive(Deserialize)]
pub struct PasswordForm {
    pub current: Option<String>,
    pub password: Option<String>,
    pub confirmation: Option<String>,
}

#[get("/password")]
pub async fn password_form() -> impl Responder {
    HttpResponse::Ok().json(FormView::new(
        "password",
        &["current", "password", "confirmation"],
    ))
}

#[post("/password")]
pub async fn change_password(
    user_repo: web::Data<Arc<dyn UserRepo>>,
    user_id: web::ReqData<UserId>,
    form: web::Form<PasswordForm>,
) -> Result<HttpResponse, HandlerError> {
    let user_id = user_id.into_inner();
    let form = form.into_inner();

    let current = non_empty(form.current)
        .ok_or_else(|| HandlerError::apology("Must provide current password"))?;
    let user = user_repo.get_user(user_id).await?;
    if !password::verify_password(&current, &user.password_hash)? {
        return Err(HandlerError::apology("Current password is incorrect"));
    }

    let new_password = non_empty(form.password)
        .filter(|password| form.confirmation.as_ref() == Some(password))
        .ok_or_else(|| {
            HandlerError::apology("Please enter a new password and a matching confirmation")
        })?;
    let password_hash = password::encode_password(&new_password)?;
    user_repo
        .update_password_hash(user_id, &password_hash)
        .await?;
    info!(user_id, "password changed");

    Ok(redirect("/"))
}
