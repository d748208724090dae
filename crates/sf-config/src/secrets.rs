//! Runtime secret resolution.
//!
//! The YAML config names the env vars; this module reads them once at
//! startup. Values are redacted in `Debug` output and never appear in
//! error messages.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Env var **names** for every secret the daemon can use. These are what
/// the YAML stores; defaults match the conventional names.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecretsEnv {
    pub database_url: String,
    pub checkout_secret_key: String,
    pub ship_api_key: String,
    pub ship_api_secret: String,
    pub mail_api_key: String,
}

impl Default for SecretsEnv {
    fn default() -> Self {
        Self {
            database_url: "SF_DATABASE_URL".to_string(),
            checkout_secret_key: "SF_CHECKOUT_SECRET_KEY".to_string(),
            ship_api_key: "SF_SHIP_API_KEY".to_string(),
            ship_api_secret: "SF_SHIP_API_SECRET".to_string(),
            mail_api_key: "SF_MAIL_API_KEY".to_string(),
        }
    }
}

/// All runtime-resolved secrets, built once at startup and passed into
/// constructors. **Values are redacted in `Debug` output.**
///
/// Every field is optional at resolution time; the daemon requires each one
/// only when wiring the client that needs it, so a deployment without (say)
/// mail simply runs without the mail route's backing client.
#[derive(Clone)]
pub struct ResolvedSecrets {
    pub database_url: Option<String>,
    pub checkout_secret_key: Option<String>,
    pub ship_api_key: Option<String>,
    pub ship_api_secret: Option<String>,
    pub mail_api_key: Option<String>,
    /// Env var names, kept so `require_*` errors can say which var to set.
    names: SecretsEnv,
}

impl std::fmt::Debug for ResolvedSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fn redact(v: &Option<String>) -> Option<&'static str> {
            v.as_ref().map(|_| "<REDACTED>")
        }
        f.debug_struct("ResolvedSecrets")
            .field("database_url", &redact(&self.database_url))
            .field("checkout_secret_key", &redact(&self.checkout_secret_key))
            .field("ship_api_key", &redact(&self.ship_api_key))
            .field("ship_api_secret", &redact(&self.ship_api_secret))
            .field("mail_api_key", &redact(&self.mail_api_key))
            .finish()
    }
}

impl ResolvedSecrets {
    pub fn require_database_url(&self) -> Result<&str> {
        require(&self.database_url, &self.names.database_url)
    }

    pub fn require_checkout_secret_key(&self) -> Result<&str> {
        require(&self.checkout_secret_key, &self.names.checkout_secret_key)
    }

    pub fn require_ship_keys(&self) -> Result<(&str, &str)> {
        Ok((
            require(&self.ship_api_key, &self.names.ship_api_key)?,
            require(&self.ship_api_secret, &self.names.ship_api_secret)?,
        ))
    }

    pub fn require_mail_api_key(&self) -> Result<&str> {
        require(&self.mail_api_key, &self.names.mail_api_key)
    }
}

fn require<'a>(value: &'a Option<String>, var_name: &str) -> Result<&'a str> {
    match value.as_deref() {
        Some(v) => Ok(v),
        None => bail!("missing required secret: set env var {var_name}"),
    }
}

/// Read every named env var. Absent or empty vars resolve to `None`.
pub fn resolve_secrets(names: &SecretsEnv) -> ResolvedSecrets {
    ResolvedSecrets {
        database_url: read(&names.database_url),
        checkout_secret_key: read(&names.checkout_secret_key),
        ship_api_key: read(&names.ship_api_key),
        ship_api_secret: read(&names.ship_api_secret),
        mail_api_key: read(&names.mail_api_key),
        names: names.clone(),
    }
}

fn read(var_name: &str) -> Option<String> {
    match std::env::var(var_name) {
        Ok(v) if !v.trim().is_empty() => Some(v),
        _ => None,
    }
}
