#[macro_use]
extern crate actix_web;

use std::sync::Arc;

use actix_web::middleware::DefaultHeaders;
use actix_web::web::{Data, ServiceConfig};
use actix_web::{http, web};
use finance_repo::transaction_repo::TransactionRepo;
use finance_repo::user_repo::UserRepo;
use rust_decimal::Decimal;

use crate::auth::jwt::JWTAuth;
use crate::auth::SessionAuthentication;
use crate::quote::QuoteLookup;

pub mod auth;
pub mod config;
mod error;
pub mod format;
pub mod portfolio;
pub mod quote;
pub mod tracing;
pub mod trade;
pub mod user;
mod view;

pub use error::HandlerError;

/// Cash credited to every newly registered user.
#[derive(Clone, Copy, Debug)]
pub struct InitialCash(pub Decimal);

/// Registers every route of the application. Public routes (login, logout, register) are mounted
/// at the top level, everything else sits behind [SessionAuthentication].
pub fn app_config_func(
    jwt_auth: JWTAuth,
    user_repo: Arc<dyn UserRepo>,
    transaction_repo: Arc<dyn TransactionRepo>,
    quote_lookup: Arc<dyn QuoteLookup>,
    initial_cash: InitialCash,
    signups_enabled: bool,
) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.app_data(jwt_auth)
            .app_data(Data::new(user_repo))
            .app_data(Data::new(transaction_repo))
            .app_data(Data::new(quote_lookup))
            .app_data(Data::new(initial_cash))
            .configure(auth::auth_config(signups_enabled))
            .service(
                web::scope("")
                    .wrap(SessionAuthentication)
                    .configure(portfolio::portfolio_config)
                    .configure(trade::trade_config)
                    .configure(quote::quote_config)
                    .configure(user::user_config),
            );
    }
}

/// Responses describe per-user state, so none of them may be cached.
pub fn no_cache_headers() -> DefaultHeaders {
    DefaultHeaders::new()
        .add((http::header::CACHE_CONTROL, "no-cache, no-store, must-revalidate"))
        .add((http::header::EXPIRES, "0"))
        .add((http::header::PRAGMA, "no-cache"))
}
