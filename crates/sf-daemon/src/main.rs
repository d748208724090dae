//! sf-daemon entry point.
//!
//! This file is intentionally thin: it sets up tracing, loads config and
//! secrets, builds the shared state, wires middleware, and starts the HTTP
//! server.  All route handlers live in `routes.rs`; all shared state types
//! live in `state.rs`.

use std::{net::SocketAddr, path::Path, sync::Arc, time::Duration};

use anyhow::Context;
use axum::http::{HeaderValue, Method};
use sf_config::{resolve_secrets, StorefrontConfig};
use sf_daemon::{routes, state};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{info, warn, Level};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env.local if present (dev convenience). Silent if the file does
    // not exist — production injects env vars directly.
    let _ = dotenvy::from_filename(".env.local");

    init_tracing();

    let config = load_config()?;
    let secrets = resolve_secrets(&config.secrets_env);

    let pool = sf_db::connect(secrets.require_database_url()?).await?;
    sf_db::migrate(&pool).await?;
    let store = Arc::new(sf_db::PgOrderStore::new(pool));

    let mut shared = state::AppState::new(&config, store)?;

    // External providers are wired only when their keys are set; the
    // corresponding routes answer 503 otherwise.
    match secrets.require_checkout_secret_key() {
        Ok(key) => {
            shared = shared.with_checkout(Arc::new(sf_clients::HostedCheckoutClient::new(
                key.to_string(),
            )));
        }
        Err(e) => warn!("checkout disabled: {e}"),
    }
    match secrets.require_ship_keys() {
        Ok((key, secret)) => {
            shared = shared.with_rates(Arc::new(sf_clients::ShipApiClient::new(
                key.to_string(),
                secret.to_string(),
            )));
        }
        Err(e) => warn!("shipping rates disabled: {e}"),
    }
    match secrets.require_mail_api_key() {
        Ok(key) => {
            shared = shared.with_mail(Arc::new(sf_clients::TemplateMailClient::new(
                key.to_string(),
                config.mail.from_email.clone(),
            )));
        }
        Err(e) => warn!("mail disabled: {e}"),
    }

    let shared = Arc::new(shared);
    state::spawn_heartbeat(shared.bus.clone(), Duration::from_secs(1));

    let app = routes::build_router(Arc::clone(&shared))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_from_config(&config));

    let addr: SocketAddr = config
        .daemon
        .bind_addr
        .parse()
        .with_context(|| format!("bad daemon.bind_addr {:?}", config.daemon.bind_addr))?;
    info!(
        config_fingerprint = %shared.config_fingerprint,
        "sf-daemon listening on http://{}",
        addr
    );

    axum::serve(tokio::net::TcpListener::bind(addr).await?, app)
        .await
        .context("server crashed")?;

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}

/// Load the config named by SF_CONFIG, or fall back to built-in defaults.
fn load_config() -> anyhow::Result<StorefrontConfig> {
    match std::env::var("SF_CONFIG") {
        Ok(path) => StorefrontConfig::load(Path::new(&path)),
        Err(_) => Ok(StorefrontConfig::default()),
    }
}

/// CORS: allow only the origins named in config.
fn cors_from_config(config: &StorefrontConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .daemon
        .cors_origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(tower_http::cors::Any)
}
