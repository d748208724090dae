//! Hosted payment-checkout sessions.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use crate::upstream_error_message;

/// What the storefront needs to start a hosted checkout.
///
/// `unit_amount_cents` is already fixed-point — callers convert with their
/// own money rules before reaching the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSessionRequest {
    pub product_name: String,
    pub unit_amount_cents: i64,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub success_url: String,
    pub cancel_url: String,
    /// Storefront id carried through as session metadata.
    pub store_id: String,
    /// Connected account to route funds to, if the storefront has one.
    #[serde(default)]
    pub connected_account: Option<String>,
}

fn default_quantity() -> u32 {
    1
}

fn default_currency() -> String {
    "usd".to_string()
}

/// A created checkout session: the id and the URL to redirect the buyer to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    pub url: String,
}

/// Payment-checkout contract.
#[async_trait::async_trait]
pub trait CheckoutProvider: Send + Sync {
    async fn create_session(&self, req: &CheckoutSessionRequest) -> Result<CheckoutSession>;
}

/// Hosted-checkout API client.
///
/// Secret key is injected by the caller; do not log it.
#[derive(Debug, Clone)]
pub struct HostedCheckoutClient {
    secret_key: String,
    http: reqwest::Client,
    base_url: String,
}

impl HostedCheckoutClient {
    pub fn new(secret_key: String) -> Self {
        Self::new_with_base_url(secret_key, "https://api.checkout.example.com".to_string())
    }

    pub fn new_with_base_url(secret_key: String, base_url: String) -> Self {
        Self {
            secret_key,
            http: reqwest::Client::new(),
            base_url,
        }
    }

    fn sessions_url(&self) -> String {
        format!("{}/v1/checkout/sessions", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Serialize)]
struct SessionPayload<'a> {
    mode: &'static str,
    currency: &'a str,
    product_name: &'a str,
    unit_amount: i64,
    quantity: u32,
    success_url: &'a str,
    cancel_url: &'a str,
    metadata: MetadataPayload<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    on_behalf_of: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct MetadataPayload<'a> {
    store_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct SessionResponse {
    id: String,
    url: String,
}

#[async_trait::async_trait]
impl CheckoutProvider for HostedCheckoutClient {
    async fn create_session(&self, req: &CheckoutSessionRequest) -> Result<CheckoutSession> {
        let payload = SessionPayload {
            mode: "payment",
            currency: &req.currency,
            product_name: &req.product_name,
            unit_amount: req.unit_amount_cents,
            quantity: req.quantity,
            success_url: &req.success_url,
            cancel_url: &req.cancel_url,
            metadata: MetadataPayload {
                store_id: &req.store_id,
            },
            on_behalf_of: req.connected_account.as_deref(),
        };

        let resp = self
            .http
            .post(self.sessions_url())
            .bearer_auth(&self.secret_key)
            .json(&payload)
            .send()
            .await
            .context("checkout session request failed")?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .context("checkout session response read failed")?;

        if !status.is_success() {
            return Err(anyhow!(
                "checkout api error status={} message={}",
                status.as_u16(),
                upstream_error_message(&body)
            ));
        }

        let session: SessionResponse =
            serde_json::from_str(&body).context("checkout session decode failed")?;
        Ok(CheckoutSession {
            id: session.id,
            url: session.url,
        })
    }
}
