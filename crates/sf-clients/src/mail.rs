//! Templated transactional email.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::upstream_error_message;

/// One templated message: recipient, template, and the dynamic payload the
/// template renders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateMail {
    pub to: String,
    pub template_id: String,
    pub dynamic_data: Value,
}

/// Mail contract.
#[async_trait::async_trait]
pub trait MailProvider: Send + Sync {
    async fn send_template(&self, mail: &TemplateMail) -> Result<()>;
}

/// Template-mail API client. The verified sender address is part of the
/// client configuration, not the per-message payload.
#[derive(Debug, Clone)]
pub struct TemplateMailClient {
    api_key: String,
    from_email: String,
    http: reqwest::Client,
    base_url: String,
}

impl TemplateMailClient {
    pub fn new(api_key: String, from_email: String) -> Self {
        Self::new_with_base_url(api_key, from_email, "https://api.mail.example.com".to_string())
    }

    pub fn new_with_base_url(api_key: String, from_email: String, base_url: String) -> Self {
        Self {
            api_key,
            from_email,
            http: reqwest::Client::new(),
            base_url,
        }
    }

    fn send_url(&self) -> String {
        format!("{}/v3/mail/send", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Serialize)]
struct MailPayload<'a> {
    to: &'a str,
    from: &'a str,
    template_id: &'a str,
    dynamic_template_data: &'a Value,
}

#[async_trait::async_trait]
impl MailProvider for TemplateMailClient {
    async fn send_template(&self, mail: &TemplateMail) -> Result<()> {
        let payload = MailPayload {
            to: &mail.to,
            from: &self.from_email,
            template_id: &mail.template_id,
            dynamic_template_data: &mail.dynamic_data,
        };

        let resp = self
            .http
            .post(self.send_url())
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .context("mail send request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(anyhow!(
                "mail api error status={} message={}",
                status.as_u16(),
                upstream_error_message(&body)
            ));
        }
        Ok(())
    }
}
