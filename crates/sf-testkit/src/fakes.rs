//! Recording fakes for the external-service providers.
//!
//! Each fake records the requests it saw and can be flipped into a failing
//! mode so tests can assert the daemon's upstream-error mapping.

use anyhow::{bail, Result};
use serde_json::Value;
use tokio::sync::Mutex;

use sf_clients::{
    CheckoutProvider, CheckoutSession, CheckoutSessionRequest, MailProvider, RateProvider,
    ShippingRate, TemplateMail,
};

#[derive(Default)]
pub struct FakeCheckout {
    pub requests: Mutex<Vec<CheckoutSessionRequest>>,
    fail: bool,
}

impl FakeCheckout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }
}

#[async_trait::async_trait]
impl CheckoutProvider for FakeCheckout {
    async fn create_session(&self, req: &CheckoutSessionRequest) -> Result<CheckoutSession> {
        if self.fail {
            bail!("checkout api error status=402 message=card declined");
        }
        self.requests.lock().await.push(req.clone());
        Ok(CheckoutSession {
            id: "cs_test_1".to_string(),
            url: "https://pay.test/cs_test_1".to_string(),
        })
    }
}

#[derive(Default)]
pub struct FakeRates {
    pub requests: Mutex<Vec<Value>>,
    rates: Vec<ShippingRate>,
    fail: bool,
}

impl FakeRates {
    pub fn with_rates(rates: Vec<ShippingRate>) -> Self {
        Self {
            rates,
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }
}

#[async_trait::async_trait]
impl RateProvider for FakeRates {
    async fn get_rates(&self, shipment: &Value) -> Result<Vec<ShippingRate>> {
        if self.fail {
            bail!("rate api error status=500 message=upstream exploded");
        }
        self.requests.lock().await.push(shipment.clone());
        Ok(self.rates.clone())
    }
}

#[derive(Default)]
pub struct FakeMail {
    pub sent: Mutex<Vec<TemplateMail>>,
    fail: bool,
}

impl FakeMail {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }
}

#[async_trait::async_trait]
impl MailProvider for FakeMail {
    async fn send_template(&self, mail: &TemplateMail) -> Result<()> {
        if self.fail {
            bail!("mail api error status=401 message=bad api key");
        }
        self.sent.lock().await.push(mail.clone());
        Ok(())
    }
}
