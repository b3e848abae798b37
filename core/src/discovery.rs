//! Bridge discovery through the cloud lookup endpoint.
//!
//! The endpoint answers a plain GET with a JSON array of the bridges that
//! last reported in from the caller's public address.

use std::sync::Arc;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{HueError, Result};
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport};
use crate::transport::UreqTransport;

pub const DEFAULT_DISCOVERY_ENDPOINT: &str = "https://discovery.meethue.com/";

/// A bridge as reported by the discovery endpoint.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredBridge {
    pub id: String,
    pub internalipaddress: String,
    pub port: Option<u16>,
}

impl DiscoveredBridge {
    /// `ip` or `ip:port`, ready to hand to a client. Port 443 is the default and is left out.
    pub fn host(&self) -> String {
        match self.port {
            Some(port) if port != 443 => format!("{}:{port}", self.internalipaddress),
            _ => self.internalipaddress.clone(),
        }
    }
}

#[derive(Clone)]
pub struct Discovery {
    endpoint: String,
    transport: Arc<dyn Transport>,
}

impl Discovery {
    pub fn new() -> Self {
        Self {
            endpoint: DEFAULT_DISCOVERY_ENDPOINT.to_string(),
            transport: Arc::new(UreqTransport::new()),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = transport;
        self
    }

    pub fn build_request(&self) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            url: self.endpoint.clone(),
            headers: vec![("accept".to_string(), "application/json".to_string())],
            body: None,
        }
    }

    /// A non-2xx reply is `HueError::Http`, never an empty bridge list.
    pub fn parse_response(&self, response: HttpResponse) -> Result<Vec<DiscoveredBridge>> {
        if !response.is_success() {
            return Err(HueError::Http {
                status: response.status,
                body: String::from_utf8_lossy(&response.body).into_owned(),
            });
        }
        serde_json::from_slice(&response.body).map_err(HueError::Decode)
    }

    /// Every bridge the endpoint knows about; possibly none.
    pub fn bridges(&self) -> Result<Vec<DiscoveredBridge>> {
        let request = self.build_request();
        debug!("discovering bridges via {}", request.url);
        let response = self.transport.send(&request)?;
        let bridges = self.parse_response(response)?;
        debug!("discovery returned {} bridge(s)", bridges.len());
        Ok(bridges)
    }

    /// The first bridge found. Zero bridges is `HueError::NoBridgesFound`.
    pub fn bridge(&self) -> Result<DiscoveredBridge> {
        self.bridges()?
            .into_iter()
            .next()
            .ok_or(HueError::NoBridgesFound)
    }
}

impl Default for Discovery {
    fn default() -> Self {
        Self::new()
    }
}
