use std::sync::Arc;

use actix_web::{web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};

use super::{QuoteLookup, MAX_SYMBOL_LEN};
use crate::error::HandlerError;
use crate::format::usd;
use crate::view::{non_blank, FormView};

#[derive(Deserialize)]
pub struct QuoteForm {
    pub symbol: Option<String>,
}

#[derive(Serialize)]
struct QuoteView {
    symbol: String,
    name: String,
    price: String,
}

#[get("/quote")]
pub async fn quote_form() -> impl Responder {
    HttpResponse::Ok().json(FormView::new("quote", &["symbol"]))
}

#[post("/quote")]
pub async fn get_quote(
    quote_lookup: web::Data<Arc<dyn QuoteLookup>>,
    form: web::Form<QuoteForm>,
) -> Result<HttpResponse, HandlerError> {
    let symbol = non_blank(form.into_inner().symbol)
        .filter(|s| s.len() <= MAX_SYMBOL_LEN)
        .ok_or_else(|| HandlerError::apology("Please enter a valid ticker symbol"))?
        .to_uppercase();

    let quote = quote_lookup
        .lookup(&symbol)
        .await?
        .ok_or_else(|| HandlerError::apology(format!("Unknown ticker symbol {}", symbol)))?;

    Ok(HttpResponse::Ok().json(QuoteView {
        symbol: quote.symbol,
        name: quote.name,
        price: usd(quote.price),
    }))
}
