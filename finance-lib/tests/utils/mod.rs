use std::sync::Arc;

use finance_lib::quote::{MemQuoteLookup, Quote};
use finance_repo::transaction_repo::TransactionRepo;
use finance_repo::user_repo::UserRepo;
use rstest::*;
use rust_decimal_macros::dec;
use tracing::info;
use tracing::Level;

macro_rules! build_app {
    ($repos:ident, $quotes:ident) => {{
        let (user_repo, transaction_repo) = $repos;
        let secret: [u8; 32] = rand::random();
        let app = App::new()
            .wrap(finance_lib::no_cache_headers())
            .wrap(finance_lib::tracing::create_middleware())
            .configure(finance_lib::app_config_func(
                finance_lib::auth::jwt::JWTAuth::from_secret(secret.to_vec()),
                user_repo,
                transaction_repo,
                $quotes.clone(),
                finance_lib::InitialCash(rust_decimal_macros::dec!(10000.00)),
                true,
            ));
        tracing::info!("Built app");
        test::init_service(app).await
    }};
}

/// Registers a new account and returns its session cookie.
macro_rules! register {
    (&$service:ident, $username:expr, $password:expr) => {{
        let request = TestRequest::post()
            .uri("/register")
            .set_form(&[
                ("username", $username),
                ("password", $password),
                ("confirmation", $password),
            ])
            .to_request();
        let response = test::call_service(&$service, request).await;
        assert_eq!(
            response.status(),
            actix_web::http::StatusCode::FOUND,
            "Got {} response when registering",
            response.status()
        );
        response
            .response()
            .cookies()
            .find(|cookie| cookie.name() == finance_lib::auth::SESSION_COOKIE)
            .expect("registration did not start a session")
            .into_owned()
    }};
}

macro_rules! post_form {
    (&$service:ident, $cookie:expr, $uri:expr, $form:expr) => {{
        let request = TestRequest::post()
            .uri($uri)
            .cookie($cookie.clone())
            .set_form($form)
            .to_request();
        test::call_service(&$service, request).await
    }};
}

macro_rules! get_json {
    (&$service:ident, $cookie:expr, $uri:expr) => {{
        let request = TestRequest::get()
            .uri($uri)
            .cookie($cookie.clone())
            .to_request();
        let response = test::call_service(&$service, request).await;
        assert!(
            response.status().is_success(),
            "Got {} response from {}",
            response.status(),
            $uri
        );
        let body: serde_json::Value = test::read_body_json(response).await;
        body
    }};
}

/// Asserts the response is an apology and returns its message.
macro_rules! apology {
    ($response:ident) => {{
        assert_eq!(
            $response.status(),
            actix_web::http::StatusCode::FORBIDDEN,
            "Expected an apology"
        );
        let body: serde_json::Value = test::read_body_json($response).await;
        body["apology"].as_str().unwrap().to_owned()
    }};
}

#[fixture]
#[once]
pub fn tracing_setup() -> () {
    tracing_subscriber::fmt()
        .pretty()
        .with_max_level(Level::DEBUG)
        .init();
    info!("tracing initialized");
}

#[fixture]
pub fn repos() -> (Arc<dyn UserRepo>, Arc<dyn TransactionRepo>) {
    finance_repo::mem_repo::create_repos()
}

#[fixture]
pub fn quotes() -> Arc<MemQuoteLookup> {
    Arc::new(MemQuoteLookup::from_quotes([
        Quote::new("AAPL", "Apple Inc", dec!(150.00)),
        Quote::new("MSFT", "Microsoft Corporation", dec!(310.25)),
        Quote::new("NFLX", "Netflix Inc", dec!(400.00)),
    ]))
}

#[fixture]
pub fn username() -> String {
    use fake::faker::internet::en::Username;
    use fake::Fake;
    Username().fake()
}
