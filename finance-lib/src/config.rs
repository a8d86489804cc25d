use anyhow::{anyhow, Context};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::PathBuf;
use std::str::FromStr;
use std::{env, fs};

const DEFAULT_DATABASE_URL: &str = "sqlite://finance.db";
const DEFAULT_QUOTE_BASE_URL: &str = "https://cloud.iexapis.com/stable";

#[derive(Deserialize)]
pub struct SSLConfig {
    pub private_key_file: PathBuf,
    pub certificate_chain_file: PathBuf,
}

#[derive(Deserialize)]
pub struct QuoteConfig {
    #[serde(default = "default_quote_base_url")]
    pub base_url: String,
}

impl Default for QuoteConfig {
    fn default() -> Self {
        QuoteConfig {
            base_url: default_quote_base_url(),
        }
    }
}

#[derive(Deserialize)]
pub struct Config {
    #[serde(default = "default_database_url")]
    pub database_url: String,
    pub signups_enabled: bool,
    #[serde(default = "default_initial_cash")]
    pub initial_cash: Decimal,
    #[serde(default)]
    pub quote: QuoteConfig,
    pub honeycomb_api_key: Option<String>,
    pub ssl: Option<SSLConfig>,
}

impl Config {
    pub fn from_file(path: PathBuf) -> Result<Config, anyhow::Error> {
        let config = fs::read_to_string(path).context("Unable to read config file")?;
        Self::from_toml(config.as_str())
    }

    pub fn from_toml(config: &str) -> Result<Config, anyhow::Error> {
        let config: Config = toml::from_str(config).with_context(|| "Unable to parse config")?;
        Ok(config)
    }

    pub fn from_env() -> Result<Config, anyhow::Error> {
        let signups_enabled = read_env("SIGNUPS_ENABLED")?;
        let signups_enabled = signups_enabled
            .parse()
            .context("Unable to parse SIGNUPS_ENABLED value")?;
        let database_url = env::var("DATABASE_URL").unwrap_or_else(|_| default_database_url());
        let initial_cash = match env::var("INITIAL_CASH") {
            Ok(value) => Decimal::from_str(&value).context("Unable to parse INITIAL_CASH value")?,
            Err(_) => default_initial_cash(),
        };
        let quote = QuoteConfig {
            base_url: env::var("QUOTE_BASE_URL").unwrap_or_else(|_| default_quote_base_url()),
        };
        let honeycomb_api_key = env::var("HONEYCOMB_API_KEY").ok();

        let config = Config {
            database_url,
            signups_enabled,
            initial_cash,
            quote,
            honeycomb_api_key,
            ssl: None,
        };
        Ok(config)
    }
}

/// Reads the quote provider key. The service cannot price anything without it, so a missing or
/// empty `API_KEY` is an error.
pub fn read_api_key() -> Result<String, anyhow::Error> {
    let api_key = read_env("API_KEY")?;
    if api_key.trim().is_empty() {
        return Err(anyhow!("API_KEY not set"));
    }
    Ok(api_key)
}

fn read_env(key: &str) -> Result<String, anyhow::Error> {
    env::var(key).with_context(|| format!("Unable to read env var: {}", key))
}

fn default_database_url() -> String {
    DEFAULT_DATABASE_URL.to_owned()
}

fn default_quote_base_url() -> String {
    DEFAULT_QUOTE_BASE_URL.to_owned()
}

fn default_initial_cash() -> Decimal {
    Decimal::new(1_000_000, 2)
}
