//! Connection settings, from JSON or the environment.

use std::env;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::client::Client;
use crate::compose::DEFAULT_API_VERSION;
use crate::error::{HueError, Result};
use crate::http::Transport;
use crate::transport::UreqTransport;
use crate::v1;

pub const ENV_HOST: &str = "HUE_BRIDGE_HOST";
pub const ENV_APPLICATION_KEY: &str = "HUE_APPLICATION_KEY";
pub const ENV_USERNAME: &str = "HUE_USERNAME";
pub const ENV_API_VERSION: &str = "HUE_API_VERSION";
pub const ENV_TIMEOUT_SECS: &str = "HUE_TIMEOUT_SECS";
pub const ENV_INSECURE_TLS: &str = "HUE_INSECURE_TLS";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeConfig {
    pub host: String,
    /// v2 credential, sent as the `hue-application-key` header.
    #[serde(default)]
    pub application_key: Option<String>,
    /// v1 credential, embedded in the URL path.
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    /// No timeout when absent.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub insecure_tls: bool,
}

fn default_api_version() -> String {
    DEFAULT_API_VERSION.to_string()
}

impl BridgeConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            application_key: None,
            username: None,
            api_version: default_api_version(),
            timeout_secs: None,
            insecure_tls: false,
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| HueError::Configuration(e.to_string()))
    }

    /// Read `HUE_BRIDGE_HOST` (required) and the optional `HUE_*` settings.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup(ENV_HOST)
            .filter(|h| !h.is_empty())
            .ok_or_else(|| HueError::Configuration(format!("{ENV_HOST} is not set")))?;

        let timeout_secs = lookup(ENV_TIMEOUT_SECS)
            .map(|v| {
                v.parse::<u64>().map_err(|e| {
                    HueError::Configuration(format!("{ENV_TIMEOUT_SECS}={v:?}: {e}"))
                })
            })
            .transpose()?;

        let insecure_tls = match lookup(ENV_INSECURE_TLS).as_deref() {
            None | Some("") | Some("0") | Some("false") => false,
            Some("1") | Some("true") => true,
            Some(other) => {
                return Err(HueError::Configuration(format!(
                    "{ENV_INSECURE_TLS}={other:?}: expected true/false"
                )))
            }
        };

        Ok(Self {
            host,
            application_key: lookup(ENV_APPLICATION_KEY),
            username: lookup(ENV_USERNAME),
            api_version: lookup(ENV_API_VERSION).unwrap_or_else(default_api_version),
            timeout_secs,
            insecure_tls,
        })
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    pub fn transport(&self) -> Arc<dyn Transport> {
        Arc::new(UreqTransport::with_options(self.timeout(), self.insecure_tls))
    }

    /// v2 client. Requires `application_key`.
    pub fn client(&self) -> Result<Client> {
        let key = self.application_key.as_deref().ok_or_else(|| {
            HueError::Configuration("application_key is required for the v2 API".to_string())
        })?;
        Ok(Client::new(self.host.clone(), key)
            .with_api_version(self.api_version.clone())
            .with_transport(self.transport()))
    }

    /// v1 client. Without a username only `create_user` will succeed.
    pub fn v1_client(&self) -> v1::Client {
        v1::Client::new(self.host.clone(), self.username.clone().unwrap_or_default())
            .with_transport(self.transport())
    }
}
