mod handlers;

use actix_web::web::ServiceConfig;

pub fn trade_config(cfg: &mut ServiceConfig) {
    cfg.service(handlers::buy_form)
        .service(handlers::buy)
        .service(handlers::sell_form)
        .service(handlers::sell);
}
