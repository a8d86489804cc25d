mod handlers;

use actix_web::web::ServiceConfig;

pub use finance_repo::user_repo::UserId;

pub fn user_config(cfg: &mut ServiceConfig) {
    cfg.service(handlers::password_form)
        .service(handlers::change_password);
}
