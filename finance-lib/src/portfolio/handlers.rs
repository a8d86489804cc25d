use std::sync::Arc;

use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use finance_repo::transaction_repo::{PageOptions, Transaction, TransactionKind, TransactionRepo};
use finance_repo::user_repo::UserRepo;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::HandlerError;
use crate::format::usd;
use crate::quote::QuoteLookup;
use crate::user::UserId;

const DEFAULT_PAGE_SIZE: i64 = 50;

#[derive(Serialize)]
struct HoldingView {
    symbol: String,
    name: String,
    shares: i64,
    price: String,
    value: String,
}

#[derive(Serialize)]
struct PortfolioView {
    holdings: Vec<HoldingView>,
    cash: String,
    holdings_value: String,
    total: String,
}

#[derive(Serialize)]
struct TransactionView {
    symbol: String,
    kind: TransactionKind,
    shares: i64,
    price: String,
    amount: String,
    time: DateTime<Utc>,
}

impl From<Transaction> for TransactionView {
    fn from(value: Transaction) -> Self {
        TransactionView {
            symbol: value.symbol,
            kind: value.kind,
            shares: value.shares,
            price: usd(value.price),
            amount: usd(value.amount),
            time: value.time,
        }
    }
}

#[derive(Serialize)]
struct HistoryView {
    transactions: Vec<TransactionView>,
}

#[derive(Deserialize)]
pub struct HistoryQuery {
    pub offset: Option<i64>,
    pub limit: Option<i64>,
}

impl HistoryQuery {
    fn page_options(&self) -> Result<Option<PageOptions>, HandlerError> {
        if self.offset.is_none() && self.limit.is_none() {
            return Ok(None);
        }
        let offset = self.offset.unwrap_or(0);
        let limit = self.limit.unwrap_or(DEFAULT_PAGE_SIZE);
        if offset < 0 || limit <= 0 {
            return Err(HandlerError::apology(
                "Offset must not be negative and limit must be positive",
            ));
        }
        Ok(Some(PageOptions { offset, limit }))
    }
}

/// Current value of everything the user holds, priced at the latest quotes.
#[get("/")]
pub async fn index(
    user_repo: web::Data<Arc<dyn UserRepo>>,
    transaction_repo: web::Data<Arc<dyn TransactionRepo>>,
    quote_lookup: web::Data<Arc<dyn QuoteLookup>>,
    user_id: web::ReqData<UserId>,
) -> Result<HttpResponse, HandlerError> {
    let user_id = user_id.into_inner();
    let user = user_repo.get_user(user_id).await?;
    let holdings = transaction_repo.get_holdings(user_id).await?;

    let mut holding_views = Vec::with_capacity(holdings.len());
    let mut holdings_value = Decimal::ZERO;
    for holding in holdings {
        let quote = quote_lookup
            .lookup(&holding.symbol)
            .await?
            .ok_or_else(|| HandlerError::QuoteUnavailable(holding.symbol.clone()))?;
        let value = quote.price * Decimal::from(holding.shares);
        holdings_value += value;
        holding_views.push(HoldingView {
            symbol: holding.symbol,
            name: quote.name,
            shares: holding.shares,
            price: usd(quote.price),
            value: usd(value),
        });
    }

    Ok(HttpResponse::Ok().json(PortfolioView {
        holdings: holding_views,
        cash: usd(user.cash),
        holdings_value: usd(holdings_value),
        total: usd(user.cash + holdings_value),
    }))
}

#[get("/history")]
pub async fn history(
    transaction_repo: web::Data<Arc<dyn TransactionRepo>>,
    user_id: web::ReqData<UserId>,
    query: web::Query<HistoryQuery>,
) -> Result<HttpResponse, HandlerError> {
    let page_options = query.page_options()?;
    let transactions = transaction_repo
        .get_all_transactions(user_id.into_inner(), page_options)
        .await?
        .into_iter()
        .map(TransactionView::from)
        .collect();

    Ok(HttpResponse::Ok().json(HistoryView { transactions }))
}
