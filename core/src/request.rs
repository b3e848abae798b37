//! Chainable request builder.
//!
//! # Design
//! A `RequestBuilder` accumulates everything about one exchange (verb,
//! resource addressing, headers, body, credential, transport) through
//! by-value setters, then executes. Execution borrows the builder, so calling
//! `execute` again re-sends the same request. The URL is composed at execute
//! time, but `url()` is public so a caller can reject a bad host before any
//! I/O happens.

use std::fmt;
use std::sync::Arc;

use log::{debug, trace};
use serde::Serialize;
use url::Url;

use crate::compose::{self, DEFAULT_API_VERSION};
use crate::envelope::Envelope;
use crate::error::{HueError, Result};
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport};
use crate::transport::UreqTransport;

/// Header carrying the v2 credential.
pub const APPLICATION_KEY_HEADER: &str = "hue-application-key";

#[derive(Clone)]
pub struct RequestBuilder {
    host: String,
    method: HttpMethod,
    api_version: String,
    resource_type: Option<String>,
    resource_id: Option<String>,
    path: Option<String>,
    query: Option<String>,
    headers: Vec<(String, String)>,
    body: Option<Vec<u8>>,
    application_key: Option<String>,
    transport: Option<Arc<dyn Transport>>,
}

impl RequestBuilder {
    /// A GET request against `host`. A host without a scheme is treated as https.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            method: HttpMethod::Get,
            api_version: DEFAULT_API_VERSION.to_string(),
            resource_type: None,
            resource_id: None,
            path: None,
            query: None,
            headers: Vec::new(),
            body: None,
            application_key: None,
            transport: None,
        }
    }

    pub fn get(host: impl Into<String>) -> Self {
        Self::new(host)
    }

    pub fn put(host: impl Into<String>) -> Self {
        Self::new(host).method(HttpMethod::Put)
    }

    pub fn post(host: impl Into<String>) -> Self {
        Self::new(host).method(HttpMethod::Post)
    }

    pub fn delete(host: impl Into<String>) -> Self {
        Self::new(host).method(HttpMethod::Delete)
    }

    pub fn method(mut self, method: HttpMethod) -> Self {
        self.method = method;
        self
    }

    pub fn api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    pub fn resource_type(mut self, resource_type: impl AsRef<str>) -> Self {
        self.resource_type = Some(resource_type.as_ref().to_string());
        self
    }

    pub fn resource_id(mut self, id: impl fmt::Display) -> Self {
        self.resource_id = Some(id.to_string());
        self
    }

    /// Use `path` verbatim instead of the composed `/clip/...` path.
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Raw query string, without the leading `?`.
    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Set a header, replacing any existing header of the same name.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(&name));
        self.headers.push((name, value.into()));
        self
    }

    /// Merge `headers` into the current set.
    pub fn headers<I, K, V>(self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        headers
            .into_iter()
            .fold(self, |builder, (k, v)| builder.header(k, v))
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Serialize `value` as the JSON body and set the content type.
    pub fn json<T: Serialize + ?Sized>(self, value: &T) -> Result<Self> {
        let body = serde_json::to_vec(value).map_err(HueError::Serialization)?;
        Ok(self.header("content-type", "application/json").body(body))
    }

    /// Set the credential; also sets the `hue-application-key` header.
    pub fn application_key(mut self, key: impl Into<String>) -> Self {
        let key = key.into();
        self.application_key = Some(key.clone());
        self.header(APPLICATION_KEY_HEADER, key)
    }

    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn credential(&self) -> Option<&str> {
        self.application_key.as_deref()
    }

    /// Compose the absolute URL without touching the network.
    pub fn url(&self) -> Result<Url> {
        let mut url = compose::compose_url(
            &self.host,
            &self.api_version,
            self.resource_type.as_deref(),
            self.resource_id.as_deref(),
        )?;
        if let Some(path) = &self.path {
            url.set_path(path);
        }
        if let Some(query) = &self.query {
            url.set_query(Some(query));
        }
        Ok(url)
    }

    /// The request as plain data.
    pub fn build(&self) -> Result<HttpRequest> {
        Ok(HttpRequest {
            method: self.method,
            url: self.url()?.to_string(),
            headers: self.headers.clone(),
            body: self.body.clone(),
        })
    }

    /// Dispatch through the transport once and return the full response.
    pub fn send(&self) -> Result<HttpResponse> {
        let request = self.build()?;
        debug!("{} {}", request.method, redacted(&request.url));

        let response = match &self.transport {
            Some(transport) => transport.send(&request)?,
            None => UreqTransport::new().send(&request)?,
        };
        trace!(
            "{} {} -> {} ({} bytes)",
            request.method,
            redacted(&request.url),
            response.status,
            response.body.len()
        );
        Ok(response)
    }

    /// Dispatch and return the raw body, whatever the status.
    pub fn execute_raw(&self) -> Result<Vec<u8>> {
        self.send().map(|response| response.body)
    }

    /// Dispatch and parse the body as a v2 envelope.
    pub fn execute(&self) -> Result<Envelope> {
        let response = self.send()?;
        Envelope::from_slice(&response.body).inspect_err(|_| {
            if !response.is_success() {
                debug!("undecodable body with status {}", response.status);
            }
        })
    }
}

impl fmt::Debug for RequestBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestBuilder")
            .field("host", &self.host)
            .field("method", &self.method)
            .field("api_version", &self.api_version)
            .field("resource_type", &self.resource_type)
            .field("resource_id", &self.resource_id)
            .field("path", &self.path)
            .field("query", &self.query)
            .field("body_len", &self.body.as_ref().map(Vec::len))
            .field("has_application_key", &self.application_key.is_some())
            .finish_non_exhaustive()
    }
}

/// Hide the v1 username segment (`/api/<username>/...`) in log output.
fn redacted(url: &str) -> String {
    match url.split_once("/api/") {
        Some((head, tail)) => match tail.split_once('/') {
            Some((_, rest)) => format!("{head}/api/***/{rest}"),
            None => format!("{head}/api/***"),
        },
        None => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::http::TransportError;

    /// Records every request and answers with a canned response.
    struct Recording {
        sent: Mutex<Vec<HttpRequest>>,
        reply: std::result::Result<HttpResponse, TransportError>,
    }

    impl Recording {
        fn replying(status: u16, body: &str) -> Arc<Self> {
            Arc::new(Self {
                sent: Mutex::new(Vec::new()),
                reply: Ok(HttpResponse {
                    status,
                    headers: Vec::new(),
                    body: body.as_bytes().to_vec(),
                }),
            })
        }

        fn failing(message: &str) -> Arc<Self> {
            Arc::new(Self {
                sent: Mutex::new(Vec::new()),
                reply: Err(TransportError::new(message)),
            })
        }

        fn sent(&self) -> Vec<HttpRequest> {
            self.sent.lock().unwrap().clone()
        }
    }

    impl Transport for Recording {
        fn send(&self, request: &HttpRequest) -> std::result::Result<HttpResponse, TransportError> {
            self.sent.lock().unwrap().push(request.clone());
            self.reply.clone()
        }
    }

    #[test]
    fn builds_item_request() {
        let req = RequestBuilder::put("192.168.1.2")
            .resource_type("Light")
            .resource_id("1234")
            .application_key("secret")
            .body(br#"{"on":{"on":true}}"#.to_vec())
            .build()
            .unwrap();
        assert_eq!(req.method, HttpMethod::Put);
        assert_eq!(req.url, "https://192.168.1.2/clip/v2/resource/light/1234");
        assert_eq!(req.header(APPLICATION_KEY_HEADER), Some("secret"));
        assert!(req.body.is_some());
    }

    #[test]
    fn constructors_preset_the_verb() {
        assert_eq!(RequestBuilder::get("h").build().unwrap().method, HttpMethod::Get);
        assert_eq!(RequestBuilder::post("h").build().unwrap().method, HttpMethod::Post);
        assert_eq!(RequestBuilder::delete("h").build().unwrap().method, HttpMethod::Delete);
        assert_eq!(
            RequestBuilder::new("h").method(HttpMethod::Options).build().unwrap().method,
            HttpMethod::Options
        );
    }

    #[test]
    fn raw_path_and_query_override() {
        let url = RequestBuilder::get("http://bridge:8080")
            .resource_type("light")
            .path("/eventstream/clip/v2")
            .query("since=0")
            .url()
            .unwrap();
        assert_eq!(url.as_str(), "http://bridge:8080/eventstream/clip/v2?since=0");
    }

    #[test]
    fn api_version_is_configurable() {
        let url = RequestBuilder::get("bridge").api_version("v3").url().unwrap();
        assert_eq!(url.path(), "/clip/v3/");
    }

    #[test]
    fn header_replaces_and_headers_merge() {
        let req = RequestBuilder::get("bridge")
            .header("Accept", "text/plain")
            .headers([("accept", "application/json"), ("x-trace", "1")])
            .build()
            .unwrap();
        assert_eq!(req.headers.len(), 2);
        assert_eq!(req.header("ACCEPT"), Some("application/json"));
    }

    #[test]
    fn json_sets_content_type() {
        let req = RequestBuilder::post("bridge")
            .json(&serde_json::json!({"on": {"on": false}}))
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(req.header("content-type"), Some("application/json"));
        let body: serde_json::Value = serde_json::from_slice(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["on"]["on"], false);
    }

    #[test]
    fn credential_is_kept() {
        let builder = RequestBuilder::get("bridge").application_key("k");
        assert_eq!(builder.credential(), Some("k"));
        assert!(!format!("{builder:?}").contains("\"k\""));
    }

    #[test]
    fn bad_host_fails_before_transport() {
        let transport = Recording::replying(200, "{}");
        let err = RequestBuilder::get("invalid hostname")
            .transport(transport.clone())
            .execute_raw()
            .unwrap_err();
        assert!(matches!(err, HueError::Configuration(_)));
        assert!(transport.sent().is_empty());
    }

    #[test]
    fn id_without_type_fails_before_transport() {
        let transport = Recording::replying(200, "{}");
        let err = RequestBuilder::get("bridge")
            .resource_id("abc")
            .transport(transport.clone())
            .execute()
            .unwrap_err();
        assert!(matches!(err, HueError::Configuration(_)));
        assert!(transport.sent().is_empty());
    }

    #[test]
    fn transport_failure_is_surfaced_once() {
        let transport = Recording::failing("dns lookup failed");
        let err = RequestBuilder::get("bridge")
            .transport(transport.clone())
            .execute_raw()
            .unwrap_err();
        match err {
            HueError::Transport(e) => assert_eq!(e, TransportError::new("dns lookup failed")),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(transport.sent().len(), 1);
    }

    #[test]
    fn execute_raw_returns_body_regardless_of_status() {
        let transport = Recording::replying(503, "busy");
        let body = RequestBuilder::get("bridge")
            .transport(transport)
            .execute_raw()
            .unwrap();
        assert_eq!(body, b"busy");
    }

    #[test]
    fn execute_decodes_envelope() {
        let transport = Recording::replying(200, r#"{"data":[{"id":"x"}],"errors":[]}"#);
        let envelope = RequestBuilder::get("bridge")
            .resource_type("light")
            .transport(transport)
            .execute()
            .unwrap();
        assert!(!envelope.has_errors());
        assert_eq!(envelope.data()[0]["id"], "x");
    }

    #[test]
    fn error_status_with_unparseable_body_is_decode_error() {
        let transport = Recording::replying(500, "internal error");
        let err = RequestBuilder::get("bridge")
            .transport(transport)
            .execute()
            .unwrap_err();
        assert!(matches!(err, HueError::Decode(_)));
    }

    #[test]
    fn execute_twice_sends_twice() {
        let transport = Recording::replying(200, r#"{"data":[]}"#);
        let builder = RequestBuilder::get("bridge")
            .resource_type("scene")
            .transport(transport.clone());
        builder.execute().unwrap();
        builder.execute().unwrap();
        let sent = transport.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0], sent[1]);
    }

    #[test]
    fn redacts_v1_username() {
        assert_eq!(
            redacted("http://bridge/api/secretuser/lights/1"),
            "http://bridge/api/***/lights/1"
        );
        assert_eq!(redacted("http://bridge/api/secretuser"), "http://bridge/api/***");
        assert_eq!(
            redacted("https://bridge/clip/v2/resource/light"),
            "https://bridge/clip/v2/resource/light"
        );
    }
}
