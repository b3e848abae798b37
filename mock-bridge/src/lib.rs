//! In-memory emulation of a lighting bridge for integration tests.
//!
//! Serves the v2 `/clip/v2/resource` API (header credential, `data`/`errors`
//! envelope), the legacy v1 `/api/<username>` API (path credential,
//! id-keyed maps, success/error lists) and a `/discovery` endpoint shaped
//! like the cloud lookup service. State is held as raw JSON so the client's
//! typed decoders are checked against wire data rather than shared types.

use std::{collections::BTreeMap, sync::Arc};

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const APPLICATION_KEY: &str = "mock-application-key";
pub const USERNAME: &str = "mock-username";

pub const BRIDGE_ID: &str = "9a8b7c6d-5e4f-4a3b-8c2d-1e0f9a8b7c6d";
pub const DEVICE_ID: &str = "0b1c2d3e-4f50-4617-8293-a4b5c6d7e8f9";
pub const LIGHT_ID: &str = "3f7c1a3e-6b0f-4f6c-9c1e-2a4d5b6c7d8e";
pub const ROOM_ID: &str = "0c7f2e55-3d9c-4b8e-9a0f-1b2c3d4e5f60";
pub const ZONE_ID: &str = "1a2b3c4d-5e6f-4a7b-8c9d-0e1f2a3b4c5d";
pub const GROUPED_LIGHT_ID: &str = "5e6f7a8b-9c0d-4e1f-a2b3-c4d5e6f7a8b9";
pub const SCENE_ID: &str = "7d4b0e70-4d31-4b33-8a7f-3f3a0c1e2b11";

const APPLICATION_KEY_HEADER: &str = "hue-application-key";

/// Everything the mock bridge knows.
#[derive(Debug, Clone)]
pub struct BridgeState {
    pub application_key: String,
    pub username: String,
    /// Whether `POST /api` may register a new user.
    pub link_button: bool,
    /// v2 resources by type, in insertion order.
    pub resources: BTreeMap<String, Vec<Value>>,
    /// v1 collections by name, keyed by numeric id.
    pub collections: BTreeMap<String, BTreeMap<String, Value>>,
    pub config: Value,
    pub discovered: Vec<Value>,
}

impl BridgeState {
    /// A bridge with no resources and the default credentials.
    pub fn empty() -> Self {
        Self {
            application_key: APPLICATION_KEY.to_string(),
            username: USERNAME.to_string(),
            link_button: true,
            resources: BTreeMap::new(),
            collections: BTreeMap::new(),
            config: json!({"name": "Mock bridge"}),
            discovered: Vec::new(),
        }
    }

    /// One device with one color light, a room, a zone, a scene and the bridge itself.
    pub fn seeded() -> Self {
        let mut state = Self::empty();
        state.add_resource(json!({
            "type": "bridge", "id": BRIDGE_ID,
            "owner": {"rid": DEVICE_ID, "rtype": "device"},
            "bridge_id": "001788fffe100491",
            "time_zone": {"time_zone": "Europe/Amsterdam"}
        }));
        state.add_resource(json!({
            "type": "device", "id": DEVICE_ID, "id_v1": "/lights/1",
            "metadata": {"name": "Desk lamp", "archetype": "table_shade"},
            "product_data": {"model_id": "LCT015", "manufacturer_name": "Signify Netherlands B.V.",
                "product_name": "Hue color lamp", "product_archetype": "sultan_bulb",
                "certified": true, "software_version": "1.93.11"},
            "services": [{"rid": LIGHT_ID, "rtype": "light"}]
        }));
        state.add_resource(json!({
            "type": "light", "id": LIGHT_ID, "id_v1": "/lights/1",
            "owner": {"rid": DEVICE_ID, "rtype": "device"},
            "metadata": {"name": "Desk lamp", "archetype": "table_shade"},
            "on": {"on": false},
            "dimming": {"brightness": 50.0, "min_dim_level": 0.2},
            "color_temperature": {"mirek": null, "mirek_valid": false,
                "mirek_schema": {"mirek_minimum": 153, "mirek_maximum": 500}},
            "color": {"xy": {"x": 0.4573, "y": 0.41},
                "gamut": {"red": {"x": 0.6915, "y": 0.3083}, "green": {"x": 0.17, "y": 0.7}, "blue": {"x": 0.1532, "y": 0.0475}},
                "gamut_type": "C"},
            "dynamics": {"status": "none", "speed": 0.0, "speed_valid": false},
            "alert": {"action_values": ["breathe"]},
            "mode": "normal"
        }));
        state.add_resource(json!({
            "type": "room", "id": ROOM_ID, "id_v1": "/groups/1",
            "metadata": {"name": "Office", "archetype": "office"},
            "children": [{"rid": DEVICE_ID, "rtype": "device"}],
            "services": [{"rid": GROUPED_LIGHT_ID, "rtype": "grouped_light"}]
        }));
        state.add_resource(json!({
            "type": "zone", "id": ZONE_ID, "id_v1": "/groups/2",
            "metadata": {"name": "Upstairs", "archetype": "home"},
            "children": [{"rid": LIGHT_ID, "rtype": "light"}],
            "services": []
        }));
        state.add_resource(json!({
            "type": "grouped_light", "id": GROUPED_LIGHT_ID, "id_v1": "/groups/1",
            "owner": {"rid": ROOM_ID, "rtype": "room"},
            "on": {"on": false},
            "dimming": {"brightness": 50.0},
            "alert": {"action_values": ["breathe"]}
        }));
        state.add_resource(json!({
            "type": "scene", "id": SCENE_ID, "id_v1": "/scenes/AbCdEfGh",
            "metadata": {"name": "Relax"},
            "group": {"rid": ROOM_ID, "rtype": "room"},
            "actions": [{
                "target": {"rid": LIGHT_ID, "rtype": "light"},
                "action": {"on": {"on": true}, "dimming": {"brightness": 56.0},
                    "color_temperature": {"mirek": 447}}
            }],
            "speed": 0.6,
            "auto_dynamic": false,
            "status": {"active": "inactive"}
        }));

        let lights = state.collections.entry("lights".to_string()).or_default();
        lights.insert(
            "1".to_string(),
            json!({
                "name": "Desk lamp", "type": "Extended color light",
                "modelid": "LCT015", "manufacturername": "Signify Netherlands B.V.",
                "productname": "Hue color lamp", "uniqueid": "00:17:88:01:00:aa:bb:cc-0b",
                "swversion": "1.93.11",
                "state": {"on": false, "bri": 127, "hue": 8418, "sat": 140,
                    "xy": [0.4573, 0.41], "ct": 366, "alert": "none", "effect": "none",
                    "colormode": "xy", "mode": "homeautomation", "reachable": true}
            }),
        );
        let groups = state.collections.entry("groups".to_string()).or_default();
        groups.insert(
            "1".to_string(),
            json!({
                "name": "Office", "type": "Room", "class": "Office", "lights": ["1"],
                "sensors": [], "recycle": false,
                "state": {"all_on": false, "any_on": false},
                "action": {"on": false, "bri": 127}
            }),
        );
        let sensors = state.collections.entry("sensors".to_string()).or_default();
        sensors.insert(
            "1".to_string(),
            json!({
                "name": "Daylight", "type": "Daylight", "modelid": "PHDL00",
                "manufacturername": "Signify Netherlands B.V.", "swversion": "1.0",
                "state": {"daylight": true, "lastupdated": "2024-01-01T08:00:00"},
                "config": {"on": true, "configured": true, "sunriseoffset": 30, "sunsetoffset": -30}
            }),
        );
        for collection in ["scenes", "schedules", "rules", "resourcelinks"] {
            state.collections.entry(collection.to_string()).or_default();
        }

        state.config = json!({
            "name": "Mock bridge", "bridgeid": "001788FFFE100491", "modelid": "BSB002",
            "mac": "00:17:88:10:04:91", "ipaddress": "192.168.1.2", "netmask": "255.255.255.0",
            "gateway": "192.168.1.1", "dhcp": true, "proxyaddress": "none", "proxyport": 0,
            "zigbeechannel": 25, "UTC": "2024-01-01T10:00:00", "localtime": "2024-01-01T11:00:00",
            "timezone": "Europe/Amsterdam", "swversion": "1962097030", "apiversion": "1.62.0",
            "datastoreversion": "163", "linkbutton": false, "portalservices": true,
            "whitelist": {USERNAME: {"name": "mock#test", "last use date": "2024-01-01T10:00:00",
                "create date": "2023-12-01T10:00:00"}}
        });
        state.discovered = vec![json!({
            "id": "001788fffe100491", "internalipaddress": "192.168.1.2", "port": 443
        })];
        state
    }

    pub fn add_resource(&mut self, resource: Value) {
        let rtype = resource["type"].as_str().unwrap_or_default().to_string();
        self.resources.entry(rtype).or_default().push(resource);
    }
}

pub type Db = Arc<RwLock<BridgeState>>;

type Reply = (StatusCode, Json<Value>);

pub fn app() -> Router {
    app_with(BridgeState::seeded())
}

pub fn app_with(state: BridgeState) -> Router {
    let db: Db = Arc::new(RwLock::new(state));
    Router::new()
        .route("/clip/v2/resource", get(v2_all))
        .route("/clip/v2/resource/{rtype}", get(v2_list).post(v2_create))
        .route(
            "/clip/v2/resource/{rtype}/{id}",
            get(v2_get).put(v2_update).delete(v2_delete),
        )
        .route("/api", post(v1_create_user))
        .route(
            "/api/{username}/{collection}",
            get(v1_list).post(v1_create).put(v1_update_config),
        )
        .route(
            "/api/{username}/{collection}/{id}",
            get(v1_get).put(v1_update).delete(v1_delete),
        )
        .route(
            "/api/{username}/{collection}/{id}/{attribute}",
            put(v1_update_attribute),
        )
        .route("/discovery", get(discovery))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with(listener, BridgeState::seeded()).await
}

pub async fn run_with(listener: TcpListener, state: BridgeState) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with(state)).await
}

// --- v2 ---

fn v2_ok(data: Vec<Value>) -> Reply {
    (StatusCode::OK, Json(json!({"errors": [], "data": data})))
}

fn v2_error(status: StatusCode, description: &str) -> Reply {
    (
        status,
        Json(json!({"errors": [{"description": description}], "data": []})),
    )
}

fn authorize(headers: &HeaderMap, state: &BridgeState) -> Result<(), Reply> {
    match headers
        .get(APPLICATION_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
    {
        Some(key) if key == state.application_key => Ok(()),
        _ => Err(v2_error(StatusCode::FORBIDDEN, "unauthorized user")),
    }
}

fn identifier(rtype: &str, id: &str) -> Value {
    json!({"rid": id, "rtype": rtype})
}

async fn v2_all(State(db): State<Db>, headers: HeaderMap) -> Reply {
    let state = db.read().await;
    if let Err(reply) = authorize(&headers, &state) {
        return reply;
    }
    v2_ok(state.resources.values().flatten().cloned().collect())
}

async fn v2_list(
    State(db): State<Db>,
    Path(rtype): Path<String>,
    headers: HeaderMap,
) -> Reply {
    let state = db.read().await;
    if let Err(reply) = authorize(&headers, &state) {
        return reply;
    }
    v2_ok(state.resources.get(&rtype).cloned().unwrap_or_default())
}

async fn v2_get(
    State(db): State<Db>,
    Path((rtype, id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Reply {
    let state = db.read().await;
    if let Err(reply) = authorize(&headers, &state) {
        return reply;
    }
    state
        .resources
        .get(&rtype)
        .and_then(|items| items.iter().find(|r| r["id"] == id.as_str()))
        .map(|r| v2_ok(vec![r.clone()]))
        .unwrap_or_else(|| v2_error(StatusCode::NOT_FOUND, "Not Found"))
}

async fn v2_create(
    State(db): State<Db>,
    Path(rtype): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    let mut state = db.write().await;
    if let Err(reply) = authorize(&headers, &state) {
        return reply;
    }
    let Value::Object(mut fields) = body else {
        return v2_error(StatusCode::BAD_REQUEST, "body must be a JSON object");
    };
    let id = Uuid::new_v4().to_string();
    fields.insert("id".to_string(), Value::String(id.clone()));
    fields.insert("type".to_string(), Value::String(rtype.clone()));
    state.add_resource(Value::Object(fields));
    v2_ok(vec![identifier(&rtype, &id)])
}

async fn v2_update(
    State(db): State<Db>,
    Path((rtype, id)): Path<(String, String)>,
    headers: HeaderMap,
    Json(mut body): Json<Value>,
) -> Reply {
    let mut state = db.write().await;
    if let Err(reply) = authorize(&headers, &state) {
        return reply;
    }
    let Some(resource) = state
        .resources
        .get_mut(&rtype)
        .and_then(|items| items.iter_mut().find(|r| r["id"] == id.as_str()))
    else {
        return v2_error(StatusCode::NOT_FOUND, "Not Found");
    };

    if let Some(recall) = body.as_object_mut().and_then(|b| b.remove("recall")) {
        let active = match recall["action"].as_str() {
            Some("dynamic_palette") => "dynamic_palette",
            _ => "static",
        };
        merge(resource, &json!({"status": {"active": active}}));
    }
    merge(resource, &body);
    v2_ok(vec![identifier(&rtype, &id)])
}

async fn v2_delete(
    State(db): State<Db>,
    Path((rtype, id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Reply {
    let mut state = db.write().await;
    if let Err(reply) = authorize(&headers, &state) {
        return reply;
    }
    let Some(items) = state.resources.get_mut(&rtype) else {
        return v2_error(StatusCode::NOT_FOUND, "Not Found");
    };
    let before = items.len();
    items.retain(|r| r["id"] != id.as_str());
    if items.len() == before {
        return v2_error(StatusCode::NOT_FOUND, "Not Found");
    }
    v2_ok(vec![identifier(&rtype, &id)])
}

// --- v1 ---

fn v1_error(error_type: u32, address: &str, description: &str) -> Json<Value> {
    Json(json!([{"error": {"type": error_type, "address": address, "description": description}}]))
}

fn v1_authorize(username: &str, address: &str, state: &BridgeState) -> Result<(), Json<Value>> {
    if username == state.username {
        Ok(())
    } else {
        Err(v1_error(1, address, "unauthorized user"))
    }
}

fn not_available(address: &str) -> Json<Value> {
    v1_error(3, address, &format!("resource, {address}, not available"))
}

/// One success entry per changed field, as the bridge reports them.
fn v1_changes(prefix: &str, body: &Value) -> Json<Value> {
    let entries: Vec<Value> = body
        .as_object()
        .map(|fields| {
            fields
                .iter()
                .map(|(k, v)| json!({"success": {format!("{prefix}/{k}"): v}}))
                .collect()
        })
        .unwrap_or_default();
    Json(Value::Array(entries))
}

async fn v1_create_user(State(db): State<Db>, Json(body): Json<Value>) -> Json<Value> {
    let state = db.read().await;
    if body.get("devicetype").and_then(Value::as_str).is_none() {
        return v1_error(5, "/", "invalid/missing parameters in body");
    }
    if !state.link_button {
        return v1_error(101, "", "link button not pressed");
    }
    Json(json!([{"success": {"username": state.username}}]))
}

async fn v1_list(
    State(db): State<Db>,
    Path((username, collection)): Path<(String, String)>,
) -> Json<Value> {
    let state = db.read().await;
    let address = format!("/{collection}");
    if let Err(reply) = v1_authorize(&username, &address, &state) {
        return reply;
    }
    if collection == "config" {
        return Json(state.config.clone());
    }
    match state.collections.get(&collection) {
        Some(items) => Json(Value::Object(items.clone().into_iter().collect())),
        None => not_available(&address),
    }
}

async fn v1_get(
    State(db): State<Db>,
    Path((username, collection, id)): Path<(String, String, String)>,
) -> Json<Value> {
    let state = db.read().await;
    let address = format!("/{collection}/{id}");
    if let Err(reply) = v1_authorize(&username, &address, &state) {
        return reply;
    }
    match state.collections.get(&collection).and_then(|c| c.get(&id)) {
        Some(item) => Json(item.clone()),
        None => not_available(&address),
    }
}

async fn v1_create(
    State(db): State<Db>,
    Path((username, collection)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Json<Value> {
    let mut state = db.write().await;
    let address = format!("/{collection}");
    if let Err(reply) = v1_authorize(&username, &address, &state) {
        return reply;
    }
    let Some(items) = state.collections.get_mut(&collection) else {
        return not_available(&address);
    };
    let next = items
        .keys()
        .filter_map(|k| k.parse::<u32>().ok())
        .max()
        .unwrap_or(0)
        + 1;
    items.insert(next.to_string(), body);
    Json(json!([{"success": {"id": next.to_string()}}]))
}

async fn v1_update(
    State(db): State<Db>,
    Path((username, collection, id)): Path<(String, String, String)>,
    Json(body): Json<Value>,
) -> Json<Value> {
    let mut state = db.write().await;
    let address = format!("/{collection}/{id}");
    if let Err(reply) = v1_authorize(&username, &address, &state) {
        return reply;
    }
    match state.collections.get_mut(&collection).and_then(|c| c.get_mut(&id)) {
        Some(item) => {
            merge(item, &body);
            v1_changes(&address, &body)
        }
        None => not_available(&address),
    }
}

async fn v1_update_attribute(
    State(db): State<Db>,
    Path((username, collection, id, attribute)): Path<(String, String, String, String)>,
    Json(body): Json<Value>,
) -> Json<Value> {
    let mut state = db.write().await;
    let address = format!("/{collection}/{id}/{attribute}");
    if let Err(reply) = v1_authorize(&username, &address, &state) {
        return reply;
    }
    match state.collections.get_mut(&collection).and_then(|c| c.get_mut(&id)) {
        Some(item) => {
            let target = item
                .as_object_mut()
                .map(|fields| fields.entry(attribute.clone()).or_insert_with(|| json!({})));
            match target {
                Some(target) => {
                    merge(target, &body);
                    v1_changes(&address, &body)
                }
                None => not_available(&address),
            }
        }
        None => not_available(&address),
    }
}

async fn v1_update_config(
    State(db): State<Db>,
    Path((username, collection)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Json<Value> {
    let mut state = db.write().await;
    let address = format!("/{collection}");
    if let Err(reply) = v1_authorize(&username, &address, &state) {
        return reply;
    }
    if collection != "config" {
        return v1_error(4, &address, &format!("method, PUT, not available for resource, {address}"));
    }
    merge(&mut state.config, &body);
    v1_changes("/config", &body)
}

async fn v1_delete(
    State(db): State<Db>,
    Path((username, collection, id)): Path<(String, String, String)>,
) -> Json<Value> {
    let mut state = db.write().await;
    let address = format!("/{collection}/{id}");
    if let Err(reply) = v1_authorize(&username, &address, &state) {
        return reply;
    }
    match state.collections.get_mut(&collection).and_then(|c| c.remove(&id)) {
        Some(_) => Json(json!([{"success": format!("{address} deleted")}])),
        None => not_available(&address),
    }
}

// --- discovery ---

async fn discovery(State(db): State<Db>) -> Json<Vec<Value>> {
    Json(db.read().await.discovered.clone())
}

/// Recursive object merge; non-object values replace.
fn merge(target: &mut Value, patch: &Value) {
    match (target, patch) {
        (Value::Object(target), Value::Object(patch)) => {
            for (key, value) in patch {
                merge(target.entry(key.clone()).or_insert(Value::Null), value);
            }
        }
        (target, patch) => *target = patch.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_is_recursive() {
        let mut target = json!({"on": {"on": false}, "dimming": {"brightness": 50.0, "min_dim_level": 0.2}});
        merge(&mut target, &json!({"dimming": {"brightness": 80.0}, "mode": "normal"}));
        assert_eq!(
            target,
            json!({"on": {"on": false}, "dimming": {"brightness": 80.0, "min_dim_level": 0.2}, "mode": "normal"})
        );
    }

    #[test]
    fn merge_replaces_non_objects() {
        let mut target = json!({"lights": ["1", "2"]});
        merge(&mut target, &json!({"lights": ["3"]}));
        assert_eq!(target, json!({"lights": ["3"]}));
    }

    #[test]
    fn seeded_state_has_every_v2_type() {
        let state = BridgeState::seeded();
        for rtype in ["bridge", "device", "light", "room", "zone", "grouped_light", "scene"] {
            assert_eq!(state.resources[rtype].len(), 1, "{rtype}");
        }
        assert_eq!(state.resources["light"][0]["id"], LIGHT_ID);
    }

    #[test]
    fn seeded_ids_are_uuids() {
        for id in [BRIDGE_ID, DEVICE_ID, LIGHT_ID, ROOM_ID, ZONE_ID, GROUPED_LIGHT_ID, SCENE_ID] {
            assert!(Uuid::parse_str(id).is_ok(), "{id}");
        }
    }

    #[test]
    fn seeded_v1_collections_exist() {
        let state = BridgeState::seeded();
        for collection in ["lights", "groups", "scenes", "schedules", "rules", "sensors", "resourcelinks"] {
            assert!(state.collections.contains_key(collection), "{collection}");
        }
        assert_eq!(state.collections["lights"]["1"]["name"], "Desk lamp");
    }

    #[test]
    fn empty_state_has_no_resources() {
        let state = BridgeState::empty();
        assert!(state.resources.is_empty());
        assert!(state.discovered.is_empty());
        assert!(state.link_button);
    }
}
