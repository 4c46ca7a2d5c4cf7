use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::checkout::{DEFAULT_API_BASE, OfflineGateway, PaymentGateway, StripeGateway};
use crate::error::{Error, Result};
use crate::notify::{LogMailer, Mailer, RelayMailer};

/// Environment variable consulted when the config file has no Stripe key.
pub const STRIPE_SECRET_ENV: &str = "COURSEWORK_STRIPE_SECRET_KEY";

pub const CONFIG_FILE_NAME: &str = "coursework.toml";

pub const DB_FILE_NAME: &str = "coursework.db";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Always taken from the command line, never from the file.
    #[serde(skip)]
    pub data_dir: PathBuf,
    pub gateway: GatewayConfig,
    pub mail: MailConfig,
    pub jobs: JobsConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GatewayProvider {
    Stripe,
    Offline,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub provider: GatewayProvider,
    pub api_base: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_key: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    pub from_address: String,
    /// HTTP relay that accepts JSON messages. Mail is only logged when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relay_url: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JobsConfig {
    pub queue_capacity: usize,
    pub inactive_after_days: i64,
    pub sweep_interval_secs: u64,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> std::result::Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }

    #[must_use]
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(DB_FILE_NAME)
    }

    /// Reads a TOML config file. Missing keys take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))
    }

    /// Loads `path` if given, else `<data_dir>/coursework.toml` if it exists,
    /// else defaults. Environment overrides are applied last.
    pub fn resolve(path: Option<&Path>, data_dir: &Path) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load(path)?,
            None => {
                let candidate = data_dir.join(CONFIG_FILE_NAME);
                if candidate.exists() {
                    Self::load(&candidate)?
                } else {
                    Self::default()
                }
            }
        };

        config.data_dir = data_dir.to_path_buf();
        config.apply_env();
        Ok(config)
    }

    pub fn apply_env(&mut self) {
        if self.gateway.secret_key.is_none() {
            if let Ok(key) = std::env::var(STRIPE_SECRET_ENV) {
                if !key.is_empty() {
                    self.gateway.secret_key = Some(key);
                }
            }
        }
    }
}

impl GatewayConfig {
    pub fn build(&self) -> Result<Arc<dyn PaymentGateway>> {
        match self.provider {
            GatewayProvider::Offline => Ok(Arc::new(OfflineGateway::new())),
            GatewayProvider::Stripe => {
                let secret_key = self.secret_key.as_deref().ok_or_else(|| {
                    Error::Config(format!(
                        "gateway.provider is \"stripe\" but no secret key is set (gateway.secret_key or {STRIPE_SECRET_ENV})"
                    ))
                })?;
                Ok(Arc::new(StripeGateway::new(
                    &self.api_base,
                    secret_key,
                    Duration::from_secs(self.timeout_secs),
                )?))
            }
        }
    }
}

impl MailConfig {
    pub fn build(&self) -> Result<Arc<dyn Mailer>> {
        match self.relay_url.as_deref() {
            Some(url) => Ok(Arc::new(RelayMailer::new(
                url,
                Duration::from_secs(self.timeout_secs),
            )?)),
            None => Ok(Arc::new(LogMailer)),
        }
    }
}

impl JobsConfig {
    #[must_use]
    pub fn inactive_after(&self) -> chrono::Duration {
        chrono::Duration::days(self.inactive_after_days)
    }

    #[must_use]
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            data_dir: PathBuf::from("./data"),
            gateway: GatewayConfig::default(),
            mail: MailConfig::default(),
            jobs: JobsConfig::default(),
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            provider: GatewayProvider::Offline,
            api_base: DEFAULT_API_BASE.to_string(),
            secret_key: None,
            timeout_secs: 15,
        }
    }
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            from_address: "noreply@coursework.local".to_string(),
            relay_url: None,
            timeout_secs: 10,
        }
    }
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 256,
            inactive_after_days: 30,
            sweep_interval_secs: 24 * 60 * 60,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("coursework.toml");
        std::fs::write(
            &path,
            r#"
port = 9090

[gateway]
provider = "stripe"
secret_key = "sk_test_123"

[jobs]
inactive_after_days = 7
"#,
        )
        .unwrap();

        let config = ServerConfig::load(&path).unwrap();
        assert_eq!(config.port, 9090);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.gateway.provider, GatewayProvider::Stripe);
        assert_eq!(config.gateway.api_base, DEFAULT_API_BASE);
        assert_eq!(config.jobs.inactive_after_days, 7);
        assert_eq!(config.jobs.queue_capacity, 256);
        assert!(config.mail.relay_url.is_none());
    }

    #[test]
    fn test_resolve_without_file_uses_data_dir() {
        let temp = TempDir::new().unwrap();
        let config = ServerConfig::resolve(None, temp.path()).unwrap();
        assert_eq!(config.data_dir, temp.path());
        assert_eq!(config.db_path(), temp.path().join("coursework.db"));
    }

    #[test]
    fn test_unknown_provider_is_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("bad.toml");
        std::fs::write(&path, "[gateway]\nprovider = \"paypal\"\n").unwrap();

        assert!(matches!(ServerConfig::load(&path), Err(Error::Config(_))));
    }

    #[test]
    fn test_stripe_without_key_fails_to_build() {
        let gateway = GatewayConfig {
            provider: GatewayProvider::Stripe,
            secret_key: None,
            ..Default::default()
        };
        assert!(matches!(gateway.build(), Err(Error::Config(_))));
    }

    #[test]
    fn test_socket_addr() {
        let config = ServerConfig::default();
        assert_eq!(config.socket_addr().unwrap().port(), 8080);
    }
}
