mod handlers;

use actix_web::web::ServiceConfig;

pub fn portfolio_config(cfg: &mut ServiceConfig) {
    cfg.service(handlers::index).service(handlers::history);
}
