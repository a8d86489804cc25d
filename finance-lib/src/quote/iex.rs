use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{instrument, warn};

use super::{LookupError, Quote, QuoteLookup};

/// Quote provider speaking the IEX Cloud REST API: `GET {base_url}/stock/{symbol}/quote`.
#[derive(Clone)]
pub struct IexQuoteLookup {
    client: Client,
    base_url: String,
    api_key: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct IexQuote {
    symbol: String,
    company_name: String,
    latest_price: Decimal,
}

impl From<IexQuote> for Quote {
    fn from(value: IexQuote) -> Self {
        Quote::new(value.symbol, value.company_name, value.latest_price)
    }
}

impl IexQuoteLookup {
    pub fn new(base_url: &str, api_key: String) -> Result<IexQuoteLookup, LookupError> {
        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;
        Ok(IexQuoteLookup {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
            api_key,
        })
    }

    fn quote_url(&self, symbol: &str) -> String {
        format!("{}/stock/{}/quote", self.base_url, symbol)
    }
}

fn is_valid_symbol(symbol: &str) -> bool {
    !symbol.is_empty()
        && symbol
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
}

#[async_trait]
impl QuoteLookup for IexQuoteLookup {
    #[instrument(skip(self))]
    async fn lookup(&self, symbol: &str) -> Result<Option<Quote>, LookupError> {
        if !is_valid_symbol(symbol) {
            return Ok(None);
        }

        let response = self
            .client
            .get(self.quote_url(&symbol.to_uppercase()))
            .query(&[("token", self.api_key.as_str())])
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            warn!(symbol, "unknown symbol");
            return Ok(None);
        }

        let quote: IexQuote = response.error_for_status()?.json().await?;
        Ok(Some(quote.into()))
    }
}
