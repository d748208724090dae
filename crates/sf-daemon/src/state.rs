//! Shared runtime state for sf-daemon.
//!
//! All types here are `Clone`-able (via `Arc` or copy). Handlers receive
//! `State<Arc<AppState>>` from Axum; this module owns nothing async itself.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use sf_clients::{CheckoutProvider, MailProvider, RateProvider};
use sf_config::StorefrontConfig;
use sf_db::OrderStore;

// ---------------------------------------------------------------------------
// BusMsg — SSE event bus payload
// ---------------------------------------------------------------------------

/// Messages broadcast over the internal event bus and surfaced as SSE events.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BusMsg {
    Heartbeat {
        ts_millis: i64,
    },
    OrderCreated {
        order_id: Uuid,
        store_reference: Uuid,
    },
    PricesAdjusted {
        store_reference: Uuid,
        updated: u64,
    },
}

// ---------------------------------------------------------------------------
// BuildInfo
// ---------------------------------------------------------------------------

/// Static build metadata included in the health response.
#[derive(Clone, Debug, Serialize)]
pub struct BuildInfo {
    pub service: &'static str,
    pub version: &'static str,
}

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

/// Cloneable (Arc) handle shared across all Axum handlers.
///
/// The external providers are optional: a deployment that never sells
/// shipping labels simply leaves SF_SHIP_API_KEY unset and the rates route
/// answers 503. The order store is always required.
#[derive(Clone)]
pub struct AppState {
    /// Broadcast bus for SSE.
    pub bus: broadcast::Sender<BusMsg>,
    /// Static build metadata.
    pub build: BuildInfo,
    /// sha256 of the loaded config, surfaced in /v1/health for deploy checks.
    pub config_fingerprint: String,
    /// Default `limit` for the top-sellers route.
    pub top_limit: usize,
    /// Order/product persistence.
    pub store: Arc<dyn OrderStore>,
    pub checkout: Option<Arc<dyn CheckoutProvider>>,
    pub rates: Option<Arc<dyn RateProvider>>,
    pub mail: Option<Arc<dyn MailProvider>>,
}

impl AppState {
    /// Build state from a config and a store, with no external providers
    /// wired. `main.rs` and tests attach providers via the `with_*` methods.
    pub fn new(config: &StorefrontConfig, store: Arc<dyn OrderStore>) -> anyhow::Result<Self> {
        let (bus, _rx) = broadcast::channel::<BusMsg>(1024);

        Ok(Self {
            bus,
            build: BuildInfo {
                service: "sf-daemon",
                version: env!("CARGO_PKG_VERSION"),
            },
            config_fingerprint: config.fingerprint()?,
            top_limit: config.analytics.top_limit,
            store,
            checkout: None,
            rates: None,
            mail: None,
        })
    }

    pub fn with_checkout(mut self, provider: Arc<dyn CheckoutProvider>) -> Self {
        self.checkout = Some(provider);
        self
    }

    pub fn with_rates(mut self, provider: Arc<dyn RateProvider>) -> Self {
        self.rates = Some(provider);
        self
    }

    pub fn with_mail(mut self, provider: Arc<dyn MailProvider>) -> Self {
        self.mail = Some(provider);
        self
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Spawn a background task that emits a heartbeat SSE every `interval`.
pub fn spawn_heartbeat(bus: broadcast::Sender<BusMsg>, interval: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let ts = chrono::Utc::now().timestamp_millis();
            let _ = bus.send(BusMsg::Heartbeat { ts_millis: ts });
        }
    });
}
