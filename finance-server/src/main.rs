#[macro_use]
extern crate tracing;
extern crate serde_json;

use std::error::Error;
use std::fs;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::sync::Arc;

use actix_web::error::UrlencodedError;
use actix_web::{web, App};
use actix_web::{HttpResponse, HttpServer};
use anyhow::Context;
use rand::Rng;
use rustls::{Certificate, PrivateKey, ServerConfig};
use rustls_pemfile::{certs, pkcs8_private_keys};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry;

use finance_lib::auth::jwt::JWTAuth;
use finance_lib::config::{read_api_key, Config, SSLConfig};
use finance_lib::quote::{IexQuoteLookup, QuoteLookup};
use finance_lib::InitialCash;

const SERVICE_NAME: &str = "finance-server";

#[actix_web::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let subscriber = registry::Registry::default()
        .with(LevelFilter::INFO)
        .with(tracing_subscriber::fmt::Layer::default());
    let tracing_guard = tracing::subscriber::set_default(subscriber);
    info!("tracing initialized");

    let config = match get_config_file() {
        Some(config_path) => Config::from_file(config_path)?,
        None => {
            info!("No config file found, reading config from environment");
            Config::from_env()?
        }
    };
    let api_key = read_api_key()?;

    let telemetry_layer = match &config.honeycomb_api_key {
        Some(api_key) => Some(finance_lib::tracing::create_opentelemetry_layer(
            SERVICE_NAME,
            api_key,
        )?),
        None => None,
    };

    let subscriber = registry::Registry::default()
        .with(LevelFilter::INFO)
        .with(tracing_subscriber::fmt::Layer::default())
        .with(telemetry_layer);
    tracing::subscriber::set_global_default(subscriber).context("Unable to set up subscriber")?;
    drop(tracing_guard);

    let (user_repo, transaction_repo) =
        finance_repo::sqlx_repo::create_repos(&config.database_url, 10).await?;
    let quote_lookup: Arc<dyn QuoteLookup> =
        Arc::new(IexQuoteLookup::new(&config.quote.base_url, api_key)?);

    let secret = get_secret()?;
    let jwt_auth = JWTAuth::from_secret(secret);
    let initial_cash = InitialCash(config.initial_cash);
    let signups_enabled = config.signups_enabled;

    let mut server = HttpServer::new(move || {
        App::new()
            .wrap(finance_lib::no_cache_headers())
            .wrap(finance_lib::tracing::create_middleware())
            .configure(finance_lib::app_config_func(
                jwt_auth.clone(),
                user_repo.clone(),
                transaction_repo.clone(),
                quote_lookup.clone(),
                initial_cash,
                signups_enabled,
            ))
            .app_data(web::FormConfig::default().error_handler(|err, req| {
                error!(req_path = req.path(), %err);
                let error_body = serde_json::json!({
                    "apology": "Unable to parse form",
                });
                if matches!(err, UrlencodedError::Parse(_)) {
                    actix_web::error::InternalError::from_response(
                        err,
                        HttpResponse::BadRequest().json(error_body),
                    )
                    .into()
                } else {
                    err.into()
                }
            }))
    });
    server = match config.ssl {
        None => {
            warn!("Using http");
            server.bind("0.0.0.0:8000")?
        }
        Some(ssl_config) => {
            info!("Using https");
            server.bind_rustls("0.0.0.0:8000", load_rustls_config(ssl_config)?)?
        }
    };
    server.run().await?;

    Ok(())
}

fn load_rustls_config(ssl_config: SSLConfig) -> Result<ServerConfig, anyhow::Error> {
    let config = ServerConfig::builder()
        .with_safe_defaults()
        .with_no_client_auth();

    let mut cert_file = BufReader::new(
        File::open(ssl_config.certificate_chain_file)
            .context("Error opening certificate chain file")?,
    );
    let mut key_file = BufReader::new(
        File::open(ssl_config.private_key_file).context("Error opening private key file")?,
    );

    let cert_chain = certs(&mut cert_file)
        .context("Unable to read certificate chain file")?
        .into_iter()
        .map(Certificate)
        .collect();
    let mut keys: Vec<PrivateKey> = pkcs8_private_keys(&mut key_file)
        .context("Unable to read private key file")?
        .into_iter()
        .map(PrivateKey)
        .collect();

    if keys.is_empty() {
        anyhow::bail!("No private key found in file");
    }

    config
        .with_single_cert(cert_chain, keys.remove(0))
        .context("Invalid certificate or key")
}

fn get_config_file() -> Option<PathBuf> {
    let config_current_dir = PathBuf::from("config.toml");
    if config_current_dir.exists() {
        return Some(config_current_dir);
    }
    if let Ok(config_env) = std::env::var("CONFIGURATION_DIRECTORY") {
        let config_path = PathBuf::from(config_env).join("config.toml");
        if config_path.exists() {
            return Some(config_path);
        }
    }

    None
}

fn get_state_dir() -> PathBuf {
    if let Ok(state_env) = std::env::var("STATE_DIRECTORY") {
        return PathBuf::from(state_env);
    }

    PathBuf::from("data")
}

/// Gets the session signing secret from file. If the file does not exist it will generate a new
/// secret and save it to the file
fn get_secret() -> Result<Vec<u8>, Box<dyn Error>> {
    let state_dir = get_state_dir();
    let secret_file = state_dir.join("secret");
    if secret_file.exists() {
        Ok(fs::read(secret_file)?)
    } else {
        let mut rng = rand::thread_rng();
        let mut secret: [u8; 128] = [0; 128];
        rng.fill(&mut secret);

        fs::create_dir_all(state_dir)?;
        fs::write(secret_file, secret)?;

        Ok(secret.to_vec())
    }
}
