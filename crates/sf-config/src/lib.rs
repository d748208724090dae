//! sf-config
//!
//! Daemon configuration: a YAML file for non-secret settings, environment
//! variables for secrets.
//!
//! # Contract
//! - The YAML stores only env var **NAMES** for secrets (e.g.
//!   `"SF_CHECKOUT_SECRET_KEY"`), never values.
//! - At startup the daemon calls [`resolve_secrets`] once and passes the
//!   result into constructors; no `std::env::var` calls scattered elsewhere.
//! - `Debug` on secret-containing structs redacts values, and error
//!   messages reference the env var name, never the value.
//! - [`StorefrontConfig::fingerprint`] hashes the effective (secret-free)
//!   config so health responses can report which configuration is live.
//! - A leaf string in the config that *looks* like a secret (known key
//!   prefixes) aborts loading — that is a key pasted where a name belongs.

mod secrets;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::path::Path;

pub use secrets::{resolve_secrets, ResolvedSecrets, SecretsEnv};

/// Known secret-like prefixes. If any leaf string value in the loaded
/// config starts with one of these, loading aborts with
/// CONFIG_SECRET_DETECTED.
const SECRET_PREFIXES: &[&str] = &[
    "sk-",        // payment / AI style secret keys
    "sk_live",    // payment live key
    "sk_test",    // payment test key
    "SG.",        // mail API key
    "AKIA",       // AWS access key ID
    "-----BEGIN", // PEM private keys
    "postgres://",
    "postgresql://",
];

// ---------------------------------------------------------------------------
// Config types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonSection {
    /// Listen address for the HTTP server.
    pub bind_addr: String,
    /// Origins allowed by the CORS layer. The inherited handlers answered
    /// `*` from every copy; here the allow-list is configured once.
    pub cors_origins: Vec<String>,
}

impl Default for DaemonSection {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8088".to_string(),
            cors_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsSection {
    /// Default `limit` for the top-sellers endpoint.
    pub top_limit: usize,
}

impl Default for AnalyticsSection {
    fn default() -> Self {
        Self { top_limit: 6 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MailSection {
    /// Verified sender address for transactional mail.
    pub from_email: String,
}

impl Default for MailSection {
    fn default() -> Self {
        Self {
            from_email: "orders@localhost".to_string(),
        }
    }
}

/// Complete daemon configuration. Secret-free by contract; see the module
/// docs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorefrontConfig {
    pub daemon: DaemonSection,
    pub analytics: AnalyticsSection,
    pub mail: MailSection,
    pub secrets_env: SecretsEnv,
}

impl StorefrontConfig {
    /// Load and validate a YAML config file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let cfg: StorefrontConfig =
            serde_yaml::from_str(&raw).context("parse config yaml failed")?;
        cfg.check_no_secret_values()?;
        Ok(cfg)
    }

    /// Stable hex digest of the effective config.
    ///
    /// The config carries no secrets (enforced at load), so the fingerprint
    /// is safe to expose in health responses and logs.
    pub fn fingerprint(&self) -> Result<String> {
        let json = serde_json::to_vec(self).context("serialize config for fingerprint")?;
        let mut hasher = Sha256::new();
        hasher.update(&json);
        Ok(hex::encode(hasher.finalize()))
    }

    fn check_no_secret_values(&self) -> Result<()> {
        let v = serde_json::to_value(self).context("serialize config for secret scan")?;
        let mut offenders = Vec::new();
        scan_leaves(&v, String::new(), &mut offenders);
        if !offenders.is_empty() {
            bail!(
                "CONFIG_SECRET_DETECTED: secret-like value at {} — config stores env var names, not keys",
                offenders.join(", ")
            );
        }
        Ok(())
    }
}

fn scan_leaves(v: &Value, pointer: String, offenders: &mut Vec<String>) {
    match v {
        Value::String(s) => {
            if SECRET_PREFIXES.iter().any(|p| s.starts_with(p)) {
                offenders.push(if pointer.is_empty() { "/".into() } else { pointer });
            }
        }
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                scan_leaves(item, format!("{pointer}/{i}"), offenders);
            }
        }
        Value::Object(map) => {
            for (k, item) in map {
                scan_leaves(item, format!("{pointer}/{k}"), offenders);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_usable() {
        let cfg = StorefrontConfig::default();
        assert_eq!(cfg.analytics.top_limit, 6);
        assert!(!cfg.daemon.bind_addr.is_empty());
        assert!(cfg.check_no_secret_values().is_ok());
    }

    #[test]
    fn secret_scan_flags_pasted_keys() {
        let mut cfg = StorefrontConfig::default();
        cfg.secrets_env.checkout_secret_key = "sk_live_abc123".to_string();
        let err = cfg.check_no_secret_values().unwrap_err().to_string();
        assert!(err.contains("CONFIG_SECRET_DETECTED"), "{err}");
        assert!(err.contains("checkout_secret_key"), "{err}");
    }

    #[test]
    fn database_url_value_is_flagged_too() {
        let mut cfg = StorefrontConfig::default();
        cfg.secrets_env.database_url = "postgres://u:p@localhost/shop".to_string();
        assert!(cfg.check_no_secret_values().is_err());
    }
}
