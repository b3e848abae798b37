use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::types::{Config, LightState, V1Resource};
use crate::compose::compose_v1_path;
use crate::envelope::Envelope;
use crate::error::{HueError, Result};
use crate::http::{HttpMethod, Transport};
use crate::request::RequestBuilder;
use crate::transport::UreqTransport;

/// Client for the v1 API. The username travels in the URL path.
#[derive(Clone)]
pub struct Client {
    host: String,
    username: String,
    transport: Arc<dyn Transport>,
}

#[derive(Deserialize)]
struct CreatedUser {
    username: String,
}

#[derive(Deserialize)]
struct CreatedResource {
    id: String,
}

impl Client {
    /// A host without a scheme is treated as plain http.
    pub fn new(host: impl Into<String>, username: impl Into<String>) -> Self {
        let host = host.into();
        let host = if host.contains("://") {
            host
        } else {
            format!("http://{host}")
        };
        Self {
            host,
            username: username.into(),
            transport: Arc::new(UreqTransport::new()),
        }
    }

    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = transport;
        self
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// A builder pointed at `/api/<username>/<segments...>`. Fails when a
    /// segment is not a single path segment.
    pub fn request(&self, method: HttpMethod, segments: &[&str]) -> Result<RequestBuilder> {
        Ok(RequestBuilder::new(self.host.clone())
            .method(method)
            .path(compose_v1_path(&self.username, segments)?)
            .transport(Arc::clone(&self.transport)))
    }

    fn call(&self, builder: RequestBuilder) -> Result<Envelope> {
        let response = builder.send()?;
        Envelope::from_v1_slice(&response.body)?.into_result()
    }

    /// Register a new application user. The bridge's link button must have
    /// been pressed; otherwise the bridge answers with error type 101.
    pub fn create_user(&self, devicetype: &str) -> Result<String> {
        let builder = RequestBuilder::post(self.host.clone())
            .path(compose_v1_path("", &[])?)
            .transport(Arc::clone(&self.transport))
            .json(&json!({ "devicetype": devicetype }))?;
        let created: Vec<CreatedUser> = self.call(builder)?.decode_into()?;
        created
            .into_iter()
            .next()
            .map(|c| c.username)
            .ok_or_else(|| HueError::NotFound("username in create-user reply".to_string()))
    }

    /// All records of a collection, ordered by id.
    pub fn list<T: V1Resource>(&self) -> Result<Vec<T>> {
        let envelope = self.call(self.request(HttpMethod::Get, &[T::COLLECTION])?)?;
        let by_id: BTreeMap<String, T> = envelope.decode_into()?;

        let mut records: Vec<(String, T)> = by_id.into_iter().collect();
        records.sort_by(|(a, _), (b, _)| id_order(a, b));
        Ok(records
            .into_iter()
            .map(|(id, mut record)| {
                record.set_id(id);
                record
            })
            .collect())
    }

    pub fn get<T: V1Resource>(&self, id: impl fmt::Display) -> Result<T> {
        let id = id.to_string();
        let envelope = self.call(self.request(HttpMethod::Get, &[T::COLLECTION, id.as_str()])?)?;
        let mut record: T = envelope.decode_into()?;
        record.set_id(id);
        Ok(record)
    }

    /// Create a record and return the id the bridge assigned.
    pub fn create<T: V1Resource>(&self, record: &T) -> Result<String> {
        let builder = self
            .request(HttpMethod::Post, &[T::COLLECTION])?
            .json(record)?;
        let created: Vec<CreatedResource> = self.call(builder)?.decode_into()?;
        created
            .into_iter()
            .next()
            .map(|c| c.id)
            .ok_or_else(|| HueError::NotFound(format!("id in create reply for {}", T::COLLECTION)))
    }

    pub fn update<T: V1Resource>(&self, id: impl fmt::Display, record: &T) -> Result<()> {
        let id = id.to_string();
        let builder = self
            .request(HttpMethod::Put, &[T::COLLECTION, id.as_str()])?
            .json(record)?;
        self.call(builder).map(|_| ())
    }

    pub fn delete<T: V1Resource>(&self, id: impl fmt::Display) -> Result<()> {
        let id = id.to_string();
        self.call(self.request(HttpMethod::Delete, &[T::COLLECTION, id.as_str()])?)
            .map(|_| ())
    }

    pub fn set_light_state(&self, id: impl fmt::Display, state: &LightState) -> Result<()> {
        self.put_attribute("lights", id, "state", state)
    }

    pub fn set_group_action(&self, id: impl fmt::Display, action: &LightState) -> Result<()> {
        self.put_attribute("groups", id, "action", action)
    }

    pub fn config(&self) -> Result<Config> {
        self.call(self.request(HttpMethod::Get, &["config"])?)?
            .decode_into()
    }

    pub fn update_config(&self, config: &Config) -> Result<()> {
        let builder = self.request(HttpMethod::Put, &["config"])?.json(config)?;
        self.call(builder).map(|_| ())
    }

    fn put_attribute<B: Serialize>(
        &self,
        collection: &str,
        id: impl fmt::Display,
        attribute: &str,
        body: &B,
    ) -> Result<()> {
        let id = id.to_string();
        let builder = self
            .request(HttpMethod::Put, &[collection, id.as_str(), attribute])?
            .json(body)?;
        self.call(builder).map(|_| ())
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("host", &self.host)
            .finish_non_exhaustive()
    }
}

/// Numeric ids sort numerically ("2" before "10"); anything else sorts after, lexically.
fn id_order(a: &str, b: &str) -> std::cmp::Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(a), Ok(b)) => a.cmp(&b),
        (Ok(_), Err(_)) => std::cmp::Ordering::Less,
        (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::http::{HttpRequest, HttpResponse, TransportError};
    use crate::v1::{Group, Light, Schedule};

    struct Canned {
        body: String,
        sent: Mutex<Vec<HttpRequest>>,
    }

    impl Canned {
        fn new(body: &str) -> Arc<Self> {
            Arc::new(Self {
                body: body.to_string(),
                sent: Mutex::new(Vec::new()),
            })
        }

        fn last(&self) -> HttpRequest {
            self.sent.lock().unwrap().last().cloned().unwrap()
        }
    }

    impl Transport for Canned {
        fn send(&self, request: &HttpRequest) -> std::result::Result<HttpResponse, TransportError> {
            self.sent.lock().unwrap().push(request.clone());
            Ok(HttpResponse {
                status: 200,
                headers: Vec::new(),
                body: self.body.clone().into_bytes(),
            })
        }
    }

    fn client(transport: Arc<Canned>) -> Client {
        Client::new("192.168.1.2", "user").with_transport(transport)
    }

    #[test]
    fn bare_host_uses_http() {
        let transport = Canned::new("{}");
        client(transport.clone()).config().unwrap();
        assert_eq!(transport.last().url, "http://192.168.1.2/api/user/config");
    }

    #[test]
    fn list_injects_ids_in_numeric_order() {
        let transport = Canned::new(
            r#"{"10":{"name":"Ten","state":{"on":true}},"2":{"name":"Two"},"1":{"name":"One"}}"#,
        );
        let lights: Vec<Light> = client(transport.clone()).list().unwrap();
        let ids: Vec<&str> = lights.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, ["1", "2", "10"]);
        assert_eq!(lights[2].state.as_ref().unwrap().on, Some(true));
        assert_eq!(transport.last().url, "http://192.168.1.2/api/user/lights");
    }

    #[test]
    fn get_injects_requested_id() {
        let transport = Canned::new(r#"{"name":"Kitchen","lights":["1","2"],"type":"Room"}"#);
        let group: Group = client(transport.clone()).get(4).unwrap();
        assert_eq!(group.id, "4");
        assert_eq!(group.group_type.as_deref(), Some("Room"));
        assert_eq!(transport.last().url, "http://192.168.1.2/api/user/groups/4");
    }

    #[test]
    fn error_list_becomes_api_error() {
        let transport = Canned::new(
            r#"[{"error":{"type":1,"address":"/lights","description":"unauthorized user"}}]"#,
        );
        let err = client(transport).list::<Light>().unwrap_err();
        let errors = err.api_errors();
        assert_eq!(errors[0].error_type, Some(1));
        assert_eq!(errors[0].to_string(), "unauthorized user");
    }

    #[test]
    fn create_returns_assigned_id() {
        let transport = Canned::new(r#"[{"success":{"id":"3"}}]"#);
        let schedule = Schedule {
            name: Some("Wake up".to_string()),
            localtime: Some("W124/T07:00:00".to_string()),
            ..Schedule::default()
        };
        let id = client(transport.clone()).create(&schedule).unwrap();
        assert_eq!(id, "3");

        let req = transport.last();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "http://192.168.1.2/api/user/schedules");
    }

    #[test]
    fn light_state_goes_to_state_attribute() {
        let transport = Canned::new(r#"[{"success":{"/lights/1/state/on":true}}]"#);
        let state = LightState {
            on: Some(true),
            bri: Some(200),
            ..LightState::default()
        };
        client(transport.clone()).set_light_state(1, &state).unwrap();
        let req = transport.last();
        assert_eq!(req.method, HttpMethod::Put);
        assert_eq!(req.url, "http://192.168.1.2/api/user/lights/1/state");
        let body: serde_json::Value = serde_json::from_slice(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, serde_json::json!({"on": true, "bri": 200}));
    }

    #[test]
    fn group_action_goes_to_action_attribute() {
        let transport = Canned::new(r#"[{"success":{"/groups/2/action/on":false}}]"#);
        let action = LightState {
            on: Some(false),
            ..LightState::default()
        };
        client(transport.clone()).set_group_action("2", &action).unwrap();
        assert_eq!(transport.last().url, "http://192.168.1.2/api/user/groups/2/action");
    }

    #[test]
    fn update_config_puts_only_set_fields() {
        let transport = Canned::new(r#"[{"success":{"/config/name":"Attic"}}]"#);
        let config = Config {
            name: Some("Attic".to_string()),
            ..Config::default()
        };
        client(transport.clone()).update_config(&config).unwrap();
        let req = transport.last();
        assert_eq!(req.method, HttpMethod::Put);
        assert_eq!(req.url, "http://192.168.1.2/api/user/config");
        let body: serde_json::Value = serde_json::from_slice(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, serde_json::json!({"name": "Attic"}));
    }

    #[test]
    fn create_user_posts_to_api_root() {
        let transport = Canned::new(r#"[{"success":{"username":"generated-user"}}]"#);
        let username = Client::new("192.168.1.2", "")
            .with_transport(transport.clone())
            .create_user("my_app#device")
            .unwrap();
        assert_eq!(username, "generated-user");
        assert_eq!(transport.last().url, "http://192.168.1.2/api");
    }

    #[test]
    fn link_button_error_is_surfaced() {
        let transport = Canned::new(
            r#"[{"error":{"type":101,"address":"","description":"link button not pressed"}}]"#,
        );
        let err = Client::new("192.168.1.2", "")
            .with_transport(transport)
            .create_user("my_app#device")
            .unwrap_err();
        assert_eq!(err.api_errors()[0].error_type, Some(101));
    }

    #[test]
    fn climbing_id_is_refused_before_sending() {
        let transport = Canned::new("[]");
        let err = client(transport.clone())
            .delete::<Light>("../../config")
            .unwrap_err();
        assert!(matches!(err, HueError::Configuration(_)));
        assert!(transport.sent.lock().unwrap().is_empty());
    }

    #[test]
    fn id_order_puts_numbers_first() {
        let mut ids = vec!["b", "10", "a", "2"];
        ids.sort_by(|a, b| id_order(a, b));
        assert_eq!(ids, ["2", "10", "a", "b"]);
    }
}
