use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use actix_web::web::ServiceConfig;
use anyhow::anyhow;
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

mod handlers;
pub mod iex;

pub use iex::IexQuoteLookup;

/// Longest ticker symbol accepted by the quote form.
pub const MAX_SYMBOL_LEN: usize = 4;

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct Quote {
    pub symbol: String,
    pub name: String,
    pub price: Decimal,
}

impl Quote {
    pub fn new(symbol: impl Into<String>, name: impl Into<String>, price: Decimal) -> Quote {
        Quote {
            symbol: symbol.into(),
            name: name.into(),
            price,
        }
    }
}

#[derive(Error, Debug)]
pub enum LookupError {
    #[error("Quote request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Source of current prices. `Ok(None)` means the provider does not know the symbol.
#[async_trait]
pub trait QuoteLookup: Send + Sync {
    async fn lookup(&self, symbol: &str) -> Result<Option<Quote>, LookupError>;
}

/// Fixed set of quotes held in memory, keyed by upper-cased symbol. Prices can be changed while
/// the service runs.
pub struct MemQuoteLookup {
    quotes: RwLock<HashMap<String, Quote>>,
}

impl MemQuoteLookup {
    pub fn new() -> MemQuoteLookup {
        Self::from_quotes(Vec::new())
    }

    pub fn from_quotes(quotes: impl IntoIterator<Item = Quote>) -> MemQuoteLookup {
        let quotes = quotes
            .into_iter()
            .map(|quote| {
                let quote = normalize(quote);
                (quote.symbol.clone(), quote)
            })
            .collect();
        MemQuoteLookup {
            quotes: RwLock::new(quotes),
        }
    }

    pub fn set_quote(&self, quote: Quote) -> Result<(), LookupError> {
        let quote = normalize(quote);
        self.write_lock()?.insert(quote.symbol.clone(), quote);
        Ok(())
    }

    pub fn remove_quote(&self, symbol: &str) -> Result<(), LookupError> {
        self.write_lock()?.remove(&symbol.to_uppercase());
        Ok(())
    }

    fn read_lock(&self) -> Result<RwLockReadGuard<HashMap<String, Quote>>, anyhow::Error> {
        self.quotes
            .read()
            .map_err(|_| anyhow!("Unable to acquire lock"))
    }

    fn write_lock(&self) -> Result<RwLockWriteGuard<HashMap<String, Quote>>, anyhow::Error> {
        self.quotes
            .write()
            .map_err(|_| anyhow!("Unable to acquire lock"))
    }
}

fn normalize(quote: Quote) -> Quote {
    Quote {
        symbol: quote.symbol.to_uppercase(),
        ..quote
    }
}

impl Default for MemQuoteLookup {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QuoteLookup for MemQuoteLookup {
    async fn lookup(&self, symbol: &str) -> Result<Option<Quote>, LookupError> {
        Ok(self.read_lock()?.get(&symbol.to_uppercase()).cloned())
    }
}

pub fn quote_config(cfg: &mut ServiceConfig) {
    cfg.service(handlers::quote_form)
        .service(handlers::get_quote);
}

#[cfg(test)]
mod tests {
    use super::{MemQuoteLookup, Quote, QuoteLookup};
    use rust_decimal_macros::dec;

    #[actix_rt::test]
    async fn symbols_are_case_insensitive() {
        let lookup = MemQuoteLookup::from_quotes([Quote::new("aapl", "Apple Inc", dec!(150))]);
        lookup
            .set_quote(Quote::new("nflx", "Netflix Inc", dec!(400)))
            .unwrap();

        let quote = lookup.lookup("AAPL").await.unwrap().unwrap();
        assert_eq!(quote, Quote::new("AAPL", "Apple Inc", dec!(150)));
        assert!(lookup.lookup("Nflx").await.unwrap().is_some());

        lookup.remove_quote("NFLX").unwrap();
        assert!(lookup.lookup("nflx").await.unwrap().is_none());
    }
}
