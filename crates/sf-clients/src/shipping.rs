//! Carrier shipping-rate lookup.

use anyhow::{anyhow, Context, Result};
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::upstream_error_message;

/// One quoted rate from the carrier API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingRate {
    pub service_name: String,
    pub service_code: String,
    pub shipment_cost: f64,
    #[serde(default)]
    pub other_cost: f64,
}

/// Shipping-rate contract.
///
/// The shipment body is passed through as-is — field validation belongs to
/// the carrier API, which is the source of truth for its own schema.
#[async_trait::async_trait]
pub trait RateProvider: Send + Sync {
    async fn get_rates(&self, shipment: &Value) -> Result<Vec<ShippingRate>>;
}

/// Rate API client with HTTP basic auth (key:secret).
#[derive(Debug, Clone)]
pub struct ShipApiClient {
    auth_header: String,
    http: reqwest::Client,
    base_url: String,
}

impl ShipApiClient {
    pub fn new(api_key: String, api_secret: String) -> Self {
        Self::new_with_base_url(api_key, api_secret, "https://api.ship.example.com".to_string())
    }

    pub fn new_with_base_url(api_key: String, api_secret: String, base_url: String) -> Self {
        let token =
            base64::engine::general_purpose::STANDARD.encode(format!("{api_key}:{api_secret}"));
        Self {
            auth_header: format!("Basic {token}"),
            http: reqwest::Client::new(),
            base_url,
        }
    }

    fn rates_url(&self) -> String {
        format!("{}/shipments/getrates", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait::async_trait]
impl RateProvider for ShipApiClient {
    async fn get_rates(&self, shipment: &Value) -> Result<Vec<ShippingRate>> {
        let resp = self
            .http
            .post(self.rates_url())
            .header(reqwest::header::AUTHORIZATION, &self.auth_header)
            .json(shipment)
            .send()
            .await
            .context("rate request failed")?;

        let status = resp.status();
        // The carrier API is known to answer errors with non-JSON bodies;
        // read text first so those surface as messages, not decode panics.
        let body = resp.text().await.context("rate response read failed")?;

        if !status.is_success() {
            return Err(anyhow!(
                "rate api error status={} message={}",
                status.as_u16(),
                upstream_error_message(&body)
            ));
        }

        serde_json::from_str(&body).context("rate response decode failed")
    }
}
