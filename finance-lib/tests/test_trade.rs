use std::sync::Arc;

use actix_web::http::{header, StatusCode};
use actix_web::test;
use actix_web::test::TestRequest;
use actix_web::App;
use finance_lib::quote::{MemQuoteLookup, Quote};
use finance_repo::transaction_repo::{TransactionKind, TransactionRepo};
use finance_repo::user_repo::UserRepo;
use rstest::rstest;
use rust_decimal_macros::dec;
use tracing::instrument;

use utils::quotes;
use utils::repos;
use utils::tracing_setup;
use utils::username;

#[macro_use]
mod utils;

#[instrument(skip(repos, quotes))]
#[rstest]
#[actix_rt::test]
async fn test_buy(
    _tracing_setup: &(),
    repos: (Arc<dyn UserRepo>, Arc<dyn TransactionRepo>),
    quotes: Arc<MemQuoteLookup>,
    username: String,
) {
    let (user_repo, transaction_repo) = (repos.0.clone(), repos.1.clone());
    let service = build_app!(repos, quotes);
    let cookie = register!(&service, username.as_str(), "pw");

    let response = post_form!(
        &service,
        cookie,
        "/buy",
        &[("symbol", "aapl"), ("shares", "3")]
    );
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/");

    let user = user_repo.get_user_by_username(&username).await.unwrap();
    assert_eq!(user.cash, dec!(9550.00));
    let transactions = transaction_repo
        .get_all_transactions(user.id, None)
        .await
        .unwrap();
    assert_eq!(transactions.len(), 1);
    assert_eq!(transactions[0].symbol, "AAPL");
    assert_eq!(transactions[0].shares, 3);
    assert_eq!(transactions[0].price, dec!(150.00));
    assert_eq!(transactions[0].kind, TransactionKind::Purchase);
}

#[instrument(skip(repos, quotes))]
#[rstest]
#[actix_rt::test]
async fn test_buy_more_than_cash(
    _tracing_setup: &(),
    repos: (Arc<dyn UserRepo>, Arc<dyn TransactionRepo>),
    quotes: Arc<MemQuoteLookup>,
    username: String,
) {
    let (user_repo, transaction_repo) = (repos.0.clone(), repos.1.clone());
    let service = build_app!(repos, quotes);
    let cookie = register!(&service, username.as_str(), "pw");

    let response = post_form!(
        &service,
        cookie,
        "/buy",
        &[("symbol", "NFLX"), ("shares", "26")]
    );
    assert_eq!(
        apology!(response),
        "Not enough cash: that purchase costs $10,400.00 but you have $10,000.00"
    );

    let user = user_repo.get_user_by_username(&username).await.unwrap();
    assert_eq!(user.cash, dec!(10000.00));
    let transactions = transaction_repo
        .get_all_transactions(user.id, None)
        .await
        .unwrap();
    assert!(transactions.is_empty());
}

#[instrument(skip(repos, quotes))]
#[rstest]
#[case::missing_symbol(&[("shares", "1")], "Please input a valid ticker symbol")]
#[case::zero_shares(&[("symbol", "AAPL"), ("shares", "0")], "Please input a positive whole number of shares")]
#[case::negative_shares(&[("symbol", "AAPL"), ("shares", "-2")], "Please input a positive whole number of shares")]
#[case::fractional_shares(&[("symbol", "AAPL"), ("shares", "1.5")], "Please input a positive whole number of shares")]
#[case::unknown_symbol(&[("symbol", "ZZZZ"), ("shares", "1")], "Unknown ticker symbol ZZZZ")]
#[actix_rt::test]
async fn test_buy_rejects_invalid_form(
    _tracing_setup: &(),
    repos: (Arc<dyn UserRepo>, Arc<dyn TransactionRepo>),
    quotes: Arc<MemQuoteLookup>,
    #[case] form: &[(&str, &str)],
    #[case] message: &str,
) {
    let service = build_app!(repos, quotes);
    let cookie = register!(&service, "trader", "pw");

    let response = post_form!(&service, cookie, "/buy", form);
    assert_eq!(apology!(response), message);
}

#[instrument(skip(repos, quotes))]
#[rstest]
#[actix_rt::test]
async fn test_sell(
    _tracing_setup: &(),
    repos: (Arc<dyn UserRepo>, Arc<dyn TransactionRepo>),
    quotes: Arc<MemQuoteLookup>,
    username: String,
) {
    let (user_repo, transaction_repo) = (repos.0.clone(), repos.1.clone());
    let service = build_app!(repos, quotes);
    let cookie = register!(&service, username.as_str(), "pw");

    let response = post_form!(
        &service,
        cookie,
        "/buy",
        &[("symbol", "MSFT"), ("shares", "4")]
    );
    assert_eq!(response.status(), StatusCode::FOUND);

    quotes
        .set_quote(Quote::new("MSFT", "Microsoft Corporation", dec!(300.00)))
        .unwrap();
    let response = post_form!(
        &service,
        cookie,
        "/sell",
        &[("symbol", "MSFT"), ("shares", "1")]
    );
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/");

    let user = user_repo.get_user_by_username(&username).await.unwrap();
    // 10000 - 4 * 310.25 + 300
    assert_eq!(user.cash, dec!(9059.00));

    let transactions = transaction_repo
        .get_all_transactions(user.id, None)
        .await
        .unwrap();
    assert_eq!(transactions.len(), 2);
    assert_eq!(transactions[0].kind, TransactionKind::Sale);
    assert_eq!(transactions[0].shares, 1);
    assert_eq!(transactions[0].price, dec!(300.00));
    assert_eq!(transactions[1].kind, TransactionKind::Purchase);
    assert_eq!(transactions[1].shares, 4);

    assert_eq!(
        transaction_repo.get_holding(user.id, "MSFT").await.unwrap(),
        3
    );

    let sell_form = get_json!(&service, cookie, "/sell");
    assert_eq!(sell_form["symbols"], serde_json::json!(["MSFT"]));
}

#[instrument(skip(repos, quotes))]
#[rstest]
#[actix_rt::test]
async fn test_sell_more_than_held(
    _tracing_setup: &(),
    repos: (Arc<dyn UserRepo>, Arc<dyn TransactionRepo>),
    quotes: Arc<MemQuoteLookup>,
    username: String,
) {
    let user_repo = repos.0.clone();
    let service = build_app!(repos, quotes);
    let cookie = register!(&service, username.as_str(), "pw");

    let response = post_form!(
        &service,
        cookie,
        "/sell",
        &[("symbol", "AAPL"), ("shares", "1")]
    );
    assert_eq!(apology!(response), "You don't own any shares of AAPL");

    let response = post_form!(
        &service,
        cookie,
        "/buy",
        &[("symbol", "AAPL"), ("shares", "2")]
    );
    assert_eq!(response.status(), StatusCode::FOUND);

    let response = post_form!(
        &service,
        cookie,
        "/sell",
        &[("symbol", "AAPL"), ("shares", "5")]
    );
    assert_eq!(
        apology!(response),
        "You don't own that many shares of AAPL, only 2"
    );

    let user = user_repo.get_user_by_username(&username).await.unwrap();
    assert_eq!(user.cash, dec!(9700.00));
}

#[instrument(skip(repos, quotes))]
#[rstest]
#[actix_rt::test]
async fn test_portfolio(
    _tracing_setup: &(),
    repos: (Arc<dyn UserRepo>, Arc<dyn TransactionRepo>),
    quotes: Arc<MemQuoteLookup>,
    username: String,
) {
    let service = build_app!(repos, quotes);
    let cookie = register!(&service, username.as_str(), "pw");

    for (symbol, shares) in [("NFLX", "2"), ("AAPL", "10"), ("NFLX", "1")] {
        let response = post_form!(
            &service,
            cookie,
            "/buy",
            &[("symbol", symbol), ("shares", shares)]
        );
        assert_eq!(response.status(), StatusCode::FOUND);
    }
    // cash left: 10000 - 800 - 1500 - 400 = 7300

    quotes
        .set_quote(Quote::new("AAPL", "Apple Inc", dec!(160.50)))
        .unwrap();
    let portfolio = get_json!(&service, cookie, "/");
    assert_eq!(
        portfolio["holdings"],
        serde_json::json!([
            {
                "symbol": "AAPL",
                "name": "Apple Inc",
                "shares": 10,
                "price": "$160.50",
                "value": "$1,605.00"
            },
            {
                "symbol": "NFLX",
                "name": "Netflix Inc",
                "shares": 3,
                "price": "$400.00",
                "value": "$1,200.00"
            }
        ])
    );
    assert_eq!(portfolio["cash"], "$7,300.00");
    assert_eq!(portfolio["holdings_value"], "$2,805.00");
    assert_eq!(portfolio["total"], "$10,105.00");
}

#[instrument(skip(repos, quotes))]
#[rstest]
#[actix_rt::test]
async fn test_portfolio_without_quote(
    _tracing_setup: &(),
    repos: (Arc<dyn UserRepo>, Arc<dyn TransactionRepo>),
    quotes: Arc<MemQuoteLookup>,
    username: String,
) {
    let service = build_app!(repos, quotes);
    let cookie = register!(&service, username.as_str(), "pw");

    let response = post_form!(
        &service,
        cookie,
        "/buy",
        &[("symbol", "NFLX"), ("shares", "1")]
    );
    assert_eq!(response.status(), StatusCode::FOUND);

    quotes.remove_quote("NFLX").unwrap();
    let request = TestRequest::get()
        .uri("/")
        .cookie(cookie.clone())
        .to_request();
    let response = test::call_service(&service, request).await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[instrument(skip(repos, quotes))]
#[rstest]
#[actix_rt::test]
async fn test_history(
    _tracing_setup: &(),
    repos: (Arc<dyn UserRepo>, Arc<dyn TransactionRepo>),
    quotes: Arc<MemQuoteLookup>,
    username: String,
) {
    let service = build_app!(repos, quotes);
    let cookie = register!(&service, username.as_str(), "pw");

    for (uri, symbol, shares) in [
        ("/buy", "AAPL", "2"),
        ("/buy", "MSFT", "1"),
        ("/sell", "AAPL", "1"),
    ] {
        let response = post_form!(
            &service,
            cookie,
            uri,
            &[("symbol", symbol), ("shares", shares)]
        );
        assert_eq!(response.status(), StatusCode::FOUND);
    }

    let history = get_json!(&service, cookie, "/history");
    let transactions = history["transactions"].as_array().unwrap();
    let rows: Vec<(&str, &str, i64, &str)> = transactions
        .iter()
        .map(|t| {
            (
                t["symbol"].as_str().unwrap(),
                t["kind"].as_str().unwrap(),
                t["shares"].as_i64().unwrap(),
                t["amount"].as_str().unwrap(),
            )
        })
        .collect();
    assert_eq!(
        rows,
        vec![
            ("AAPL", "sale", 1, "$150.00"),
            ("MSFT", "purchase", 1, "$310.25"),
            ("AAPL", "purchase", 2, "$300.00"),
        ]
    );

    let page = get_json!(&service, cookie, "/history?offset=1&limit=1");
    let transactions = page["transactions"].as_array().unwrap();
    assert_eq!(transactions.len(), 1);
    assert_eq!(transactions[0]["symbol"], "MSFT");

    let request = TestRequest::get()
        .uri("/history?offset=-1")
        .cookie(cookie.clone())
        .to_request();
    let response = test::call_service(&service, request).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[instrument(skip(repos, quotes))]
#[rstest]
#[case::lower_case("msft", "MSFT", "Microsoft Corporation", "$310.25")]
#[case::padded(" AAPL ", "AAPL", "Apple Inc", "$150.00")]
#[actix_rt::test]
async fn test_quote(
    _tracing_setup: &(),
    repos: (Arc<dyn UserRepo>, Arc<dyn TransactionRepo>),
    quotes: Arc<MemQuoteLookup>,
    #[case] input: &str,
    #[case] symbol: &str,
    #[case] name: &str,
    #[case] price: &str,
) {
    let service = build_app!(repos, quotes);
    let cookie = register!(&service, "quoter", "pw");

    let response = post_form!(&service, cookie, "/quote", &[("symbol", input)]);
    assert!(response.status().is_success());
    let quote: serde_json::Value = test::read_body_json(response).await;
    assert_eq!(
        quote,
        serde_json::json!({ "symbol": symbol, "name": name, "price": price })
    );
}

#[instrument(skip(repos, quotes))]
#[rstest]
#[case::blank("", "Please enter a valid ticker symbol")]
#[case::too_long("GOOGL", "Please enter a valid ticker symbol")]
#[case::unknown("ZZZ", "Unknown ticker symbol ZZZ")]
#[actix_rt::test]
async fn test_quote_rejected(
    _tracing_setup: &(),
    repos: (Arc<dyn UserRepo>, Arc<dyn TransactionRepo>),
    quotes: Arc<MemQuoteLookup>,
    #[case] input: &str,
    #[case] message: &str,
) {
    let service = build_app!(repos, quotes);
    let cookie = register!(&service, "quoter", "pw");

    let response = post_form!(&service, cookie, "/quote", &[("symbol", input)]);
    assert_eq!(apology!(response), message);
}
