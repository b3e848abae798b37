//! v1 resource records.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A record living in a v1 collection such as `/lights`.
pub trait V1Resource: Serialize + DeserializeOwned {
    /// Collection path segment, e.g. `lights`.
    const COLLECTION: &'static str;

    /// Store the map key the record was found under.
    fn set_id(&mut self, id: String);
}

macro_rules! v1_resource {
    ($ty:ty, $collection:literal) => {
        impl V1Resource for $ty {
            const COLLECTION: &'static str = $collection;

            fn set_id(&mut self, id: String) {
                self.id = id;
            }
        }
    };
}

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LightState {
    pub on: Option<bool>,
    /// 1–254.
    pub bri: Option<u8>,
    pub hue: Option<u16>,
    pub sat: Option<u8>,
    pub xy: Option<[f64; 2]>,
    /// Mired color temperature.
    pub ct: Option<u16>,
    pub alert: Option<String>,
    pub effect: Option<String>,
    /// Deciseconds.
    pub transitiontime: Option<u16>,
    pub colormode: Option<String>,
    pub mode: Option<String>,
    pub reachable: Option<bool>,
}

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Light {
    #[serde(skip)]
    pub id: String,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub light_type: Option<String>,
    pub state: Option<LightState>,
    pub modelid: Option<String>,
    pub manufacturername: Option<String>,
    pub productname: Option<String>,
    pub uniqueid: Option<String>,
    pub swversion: Option<String>,
}
v1_resource!(Light, "lights");

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupState {
    pub all_on: Option<bool>,
    pub any_on: Option<bool>,
}

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Group {
    #[serde(skip)]
    pub id: String,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub group_type: Option<String>,
    pub class: Option<String>,
    pub lights: Option<Vec<String>>,
    pub sensors: Option<Vec<String>>,
    pub action: Option<LightState>,
    pub state: Option<GroupState>,
    pub recycle: Option<bool>,
}
v1_resource!(Group, "groups");

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    #[serde(skip)]
    pub id: String,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub scene_type: Option<String>,
    pub group: Option<String>,
    pub lights: Option<Vec<String>>,
    pub owner: Option<String>,
    pub recycle: Option<bool>,
    pub locked: Option<bool>,
    pub lastupdated: Option<String>,
    pub version: Option<u32>,
    pub lightstates: Option<BTreeMap<String, LightState>>,
}
v1_resource!(Scene, "scenes");

/// An API call the bridge performs on behalf of a schedule or rule.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Command {
    pub address: String,
    pub method: String,
    pub body: Value,
}

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    #[serde(skip)]
    pub id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub command: Option<Command>,
    pub localtime: Option<String>,
    pub time: Option<String>,
    pub created: Option<String>,
    pub status: Option<String>,
    pub autodelete: Option<bool>,
    pub recycle: Option<bool>,
}
v1_resource!(Schedule, "schedules");

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub address: String,
    pub operator: String,
    pub value: Option<String>,
}

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    #[serde(skip)]
    pub id: String,
    pub name: Option<String>,
    pub owner: Option<String>,
    pub created: Option<String>,
    pub lasttriggered: Option<String>,
    pub timestriggered: Option<u32>,
    pub status: Option<String>,
    pub recycle: Option<bool>,
    pub conditions: Option<Vec<Condition>>,
    pub actions: Option<Vec<Command>>,
}
v1_resource!(Rule, "rules");

/// Sensor state and config differ per sensor type, so both stay untyped.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sensor {
    #[serde(skip)]
    pub id: String,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub sensor_type: Option<String>,
    pub modelid: Option<String>,
    pub manufacturername: Option<String>,
    pub uniqueid: Option<String>,
    pub swversion: Option<String>,
    pub state: Option<BTreeMap<String, Value>>,
    pub config: Option<BTreeMap<String, Value>>,
    pub recycle: Option<bool>,
}
v1_resource!(Sensor, "sensors");

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceLink {
    #[serde(skip)]
    pub id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub link_type: Option<String>,
    pub classid: Option<u32>,
    pub owner: Option<String>,
    pub recycle: Option<bool>,
    pub links: Option<Vec<String>>,
}
v1_resource!(ResourceLink, "resourcelinks");

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WhitelistEntry {
    pub name: Option<String>,
    #[serde(rename = "last use date")]
    pub last_use_date: Option<String>,
    #[serde(rename = "create date")]
    pub create_date: Option<String>,
}

/// Bridge-wide configuration; a singleton, not a collection.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub name: Option<String>,
    pub bridgeid: Option<String>,
    pub modelid: Option<String>,
    pub mac: Option<String>,
    pub ipaddress: Option<String>,
    pub netmask: Option<String>,
    pub gateway: Option<String>,
    pub dhcp: Option<bool>,
    pub proxyaddress: Option<String>,
    pub proxyport: Option<u16>,
    pub zigbeechannel: Option<u8>,
    #[serde(rename = "UTC")]
    pub utc: Option<String>,
    pub localtime: Option<String>,
    pub timezone: Option<String>,
    pub swversion: Option<String>,
    pub apiversion: Option<String>,
    pub datastoreversion: Option<String>,
    pub linkbutton: Option<bool>,
    pub portalservices: Option<bool>,
    pub whitelist: Option<BTreeMap<String, WhitelistEntry>>,
}
