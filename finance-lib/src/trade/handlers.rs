use std::sync::Arc;

use actix_web::{web, HttpResponse, Responder};
use finance_repo::transaction_repo::{Trade, TransactionRepo, TransactionRepoError};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::HandlerError;
use crate::format::usd;
use crate::quote::{Quote, QuoteLookup};
use crate::user::UserId;
use crate::view::{non_blank, redirect, FormView};

#[derive(Deserialize)]
pub struct TradeForm {
    pub symbol: Option<String>,
    pub shares: Option<String>,
}

#[derive(Serialize)]
struct SellFormView {
    form: &'static str,
    fields: &'static [&'static str],
    symbols: Vec<String>,
}

fn parse_symbol(symbol: Option<String>) -> Result<String, HandlerError> {
    non_blank(symbol)
        .map(|s| s.to_uppercase())
        .ok_or_else(|| HandlerError::apology("Please input a valid ticker symbol"))
}

fn parse_shares(shares: Option<String>) -> Result<i64, HandlerError> {
    non_blank(shares)
        .and_then(|s| s.parse::<i64>().ok())
        .filter(|shares| *shares > 0)
        .ok_or_else(|| HandlerError::apology("Please input a positive whole number of shares"))
}

async fn quote_for(quote_lookup: &dyn QuoteLookup, symbol: &str) -> Result<Quote, HandlerError> {
    quote_lookup
        .lookup(symbol)
        .await?
        .ok_or_else(|| HandlerError::apology(format!("Unknown ticker symbol {}", symbol)))
}

fn insufficient_shares(symbol: &str, held: i64) -> HandlerError {
    if held == 0 {
        HandlerError::apology(format!("You don't own any shares of {}", symbol))
    } else {
        HandlerError::apology(format!(
            "You don't own that many shares of {}, only {}",
            symbol, held
        ))
    }
}

#[get("/buy")]
pub async fn buy_form() -> impl Responder {
    HttpResponse::Ok().json(FormView::new("buy", &["symbol", "shares"]))
}

#[post("/buy")]
pub async fn buy(
    transaction_repo: web::Data<Arc<dyn TransactionRepo>>,
    quote_lookup: web::Data<Arc<dyn QuoteLookup>>,
    user_id: web::ReqData<UserId>,
    form: web::Form<TradeForm>,
) -> Result<HttpResponse, HandlerError> {
    let user_id = user_id.into_inner();
    let form = form.into_inner();
    let symbol = parse_symbol(form.symbol)?;
    let shares = parse_shares(form.shares)?;

    let quote = quote_for(quote_lookup.get_ref().as_ref(), &symbol).await?;
    let trade = Trade::new(symbol, shares, quote.price);
    let transaction = match transaction_repo.buy(user_id, trade).await {
        Ok(transaction) => transaction,
        Err(TransactionRepoError::InsufficientFunds { required, available }) => {
            return Err(HandlerError::apology(format!(
                "Not enough cash: that purchase costs {} but you have {}",
                usd(required),
                usd(available)
            )));
        }
        Err(err) => return Err(err.into()),
    };
    info!(
        user_id,
        symbol = %transaction.symbol,
        shares = transaction.shares,
        amount = %transaction.amount,
        "bought shares"
    );

    Ok(redirect("/"))
}

#[get("/sell")]
pub async fn sell_form(
    transaction_repo: web::Data<Arc<dyn TransactionRepo>>,
    user_id: web::ReqData<UserId>,
) -> Result<HttpResponse, HandlerError> {
    let symbols = transaction_repo
        .get_holdings(user_id.into_inner())
        .await?
        .into_iter()
        .map(|holding| holding.symbol)
        .collect();

    Ok(HttpResponse::Ok().json(SellFormView {
        form: "sell",
        fields: &["symbol", "shares"],
        symbols,
    }))
}

#[post("/sell")]
pub async fn sell(
    transaction_repo: web::Data<Arc<dyn TransactionRepo>>,
    quote_lookup: web::Data<Arc<dyn QuoteLookup>>,
    user_id: web::ReqData<UserId>,
    form: web::Form<TradeForm>,
) -> Result<HttpResponse, HandlerError> {
    let user_id = user_id.into_inner();
    let form = form.into_inner();
    let symbol = parse_symbol(form.symbol)?;
    let shares = parse_shares(form.shares)?;

    let held = transaction_repo.get_holding(user_id, &symbol).await?;
    if shares > held {
        return Err(insufficient_shares(&symbol, held));
    }

    let quote = quote_for(quote_lookup.get_ref().as_ref(), &symbol).await?;
    let trade = Trade::new(symbol, shares, quote.price);
    let transaction = match transaction_repo.sell(user_id, trade).await {
        Ok(transaction) => transaction,
        Err(TransactionRepoError::InsufficientShares { symbol, held, .. }) => {
            return Err(insufficient_shares(&symbol, held));
        }
        Err(err) => return Err(err.into()),
    };
    info!(
        user_id,
        symbol = %transaction.symbol,
        shares = transaction.shares,
        amount = %transaction.amount,
        "sold shares"
    );

    Ok(redirect("/"))
}
