//! sf-clients
//!
//! Clients for the three external services the storefront leans on:
//! hosted payment checkout, carrier shipping rates, and templated email.
//!
//! Each service sits behind a trait so handlers depend on the contract, not
//! the vendor; concrete clients are reqwest-based. API keys are injected
//! through constructors and never logged — there is no ambient global
//! client anywhere in this workspace.
//!
//! None of this crate re-implements the services themselves: requests go
//! out, upstream error payloads come back as errors with the upstream
//! message attached. That is the whole failure-recovery story; retries, if
//! ever wanted, belong to the caller.

mod checkout;
mod mail;
mod shipping;

pub use checkout::{
    CheckoutProvider, CheckoutSession, CheckoutSessionRequest, HostedCheckoutClient,
};
pub use mail::{MailProvider, TemplateMail, TemplateMailClient};
pub use shipping::{RateProvider, ShipApiClient, ShippingRate};

/// Extract a human-readable error message from an upstream JSON error body,
/// tolerating the envelope shapes the vendors actually send
/// (`{"error": {"message": ...}}`, `{"error": "..."}`, `{"message": "..."}`),
/// falling back to the raw body text.
fn upstream_error_message(body: &str) -> String {
    let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();
    let msg = parsed.as_ref().and_then(|v| {
        v.pointer("/error/message")
            .or_else(|| v.get("error"))
            .or_else(|| v.get("message"))
            .and_then(|m| m.as_str())
            .map(String::from)
    });
    msg.unwrap_or_else(|| {
        // Truncate by characters, not bytes: upstream bodies are arbitrary
        // text and a byte cut can land inside a multibyte character.
        let t: String = body.trim().chars().take(500).collect();
        if t.is_empty() {
            "no response body".to_string()
        } else {
            t
        }
    })
}
