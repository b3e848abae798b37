//! Typed v2 resource records.
//!
//! # Design
//! Every record flattens a `BaseResource` and declares the rest of its
//! fields as `Option`. A field the bridge did not send stays `None`, which is
//! not the same thing as a zero value: a light without a `color` block has no
//! color capability, while a light at `xy = (0, 0)` does. `None` fields are
//! skipped on serialization, so the same records double as partial update
//! bodies.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Well-known v2 resource type names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceType {
    Light,
    Scene,
    Room,
    Zone,
    GroupedLight,
    Device,
    Bridge,
    BridgeHome,
    Motion,
    Temperature,
    LightLevel,
    Button,
    DevicePower,
    ZigbeeConnectivity,
    Entertainment,
    EntertainmentConfiguration,
    SmartScene,
}

impl ResourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Light => "light",
            ResourceType::Scene => "scene",
            ResourceType::Room => "room",
            ResourceType::Zone => "zone",
            ResourceType::GroupedLight => "grouped_light",
            ResourceType::Device => "device",
            ResourceType::Bridge => "bridge",
            ResourceType::BridgeHome => "bridge_home",
            ResourceType::Motion => "motion",
            ResourceType::Temperature => "temperature",
            ResourceType::LightLevel => "light_level",
            ResourceType::Button => "button",
            ResourceType::DevicePower => "device_power",
            ResourceType::ZigbeeConnectivity => "zigbee_connectivity",
            ResourceType::Entertainment => "entertainment",
            ResourceType::EntertainmentConfiguration => "entertainment_configuration",
            ResourceType::SmartScene => "smart_scene",
        }
    }
}

impl AsRef<str> for ResourceType {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cross-reference to another resource by id and type. Lookup only; it owns nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceIdentifier {
    pub rid: Uuid,
    pub rtype: String,
}

/// Fields shared by every v2 record.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BaseResource {
    #[serde(rename = "type")]
    pub resource_type: Option<String>,
    pub id: Option<Uuid>,
    /// Matching v1 path, e.g. `/lights/3`.
    pub id_v1: Option<String>,
    pub metadata: Option<BTreeMap<String, Value>>,
    pub owner: Option<ResourceIdentifier>,
}

impl BaseResource {
    pub fn name(&self) -> Option<&str> {
        self.metadata.as_ref()?.get("name")?.as_str()
    }

    /// Metadata containing only a name, for create and rename bodies.
    pub fn named(name: impl Into<String>) -> Self {
        let mut metadata = BTreeMap::new();
        metadata.insert("name".to_string(), Value::String(name.into()));
        Self {
            metadata: Some(metadata),
            ..Self::default()
        }
    }
}

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct On {
    pub on: Option<bool>,
}

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dimming {
    /// Percent, 0–100.
    pub brightness: Option<f64>,
    pub min_dim_level: Option<f64>,
}

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MirekSchema {
    pub mirek_minimum: Option<u16>,
    pub mirek_maximum: Option<u16>,
}

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColorTemperature {
    /// `None` while the light is not in a color-temperature mode.
    pub mirek: Option<u16>,
    pub mirek_valid: Option<bool>,
    pub mirek_schema: Option<MirekSchema>,
}

/// CIE xy chromaticity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Xy {
    pub x: f64,
    pub y: f64,
}

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Gamut {
    pub red: Option<Xy>,
    pub green: Option<Xy>,
    pub blue: Option<Xy>,
}

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub xy: Option<Xy>,
    pub gamut: Option<Gamut>,
    pub gamut_type: Option<String>,
}

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dynamics {
    /// Transition time in milliseconds.
    pub duration: Option<u32>,
    pub speed: Option<f64>,
    pub speed_valid: Option<bool>,
    pub status: Option<String>,
}

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub action: Option<String>,
    pub action_values: Option<Vec<String>>,
}

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Effects {
    pub effect: Option<String>,
    pub status: Option<String>,
    pub effect_values: Option<Vec<String>>,
}

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Light {
    #[serde(flatten)]
    pub base: BaseResource,
    pub on: Option<On>,
    pub dimming: Option<Dimming>,
    pub color_temperature: Option<ColorTemperature>,
    pub color: Option<Color>,
    pub dynamics: Option<Dynamics>,
    pub alert: Option<Alert>,
    pub effects: Option<Effects>,
    pub mode: Option<String>,
}

impl Light {
    pub fn is_on(&self) -> Option<bool> {
        self.on.as_ref()?.on
    }

    pub fn supports_color(&self) -> bool {
        self.color.is_some()
    }
}

/// Target state applied to one light when a scene is recalled.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LightAction {
    pub on: Option<On>,
    pub dimming: Option<Dimming>,
    pub color: Option<Color>,
    pub color_temperature: Option<ColorTemperature>,
    pub effects: Option<Effects>,
    pub dynamics: Option<Dynamics>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneAction {
    pub target: ResourceIdentifier,
    pub action: LightAction,
}

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneStatus {
    pub active: Option<String>,
}

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneRecall {
    /// `active`, `dynamic_palette` or `static`.
    pub action: Option<String>,
    pub duration: Option<u32>,
    pub dimming: Option<Dimming>,
}

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    #[serde(flatten)]
    pub base: BaseResource,
    pub group: Option<ResourceIdentifier>,
    pub actions: Option<Vec<SceneAction>>,
    pub speed: Option<f64>,
    pub auto_dynamic: Option<bool>,
    pub status: Option<SceneStatus>,
    pub recall: Option<SceneRecall>,
}

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Room {
    #[serde(flatten)]
    pub base: BaseResource,
    pub children: Option<Vec<ResourceIdentifier>>,
    pub services: Option<Vec<ResourceIdentifier>>,
}

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    #[serde(flatten)]
    pub base: BaseResource,
    pub children: Option<Vec<ResourceIdentifier>>,
    pub services: Option<Vec<ResourceIdentifier>>,
}

/// Aggregate control over every light in a room or zone.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupedLight {
    #[serde(flatten)]
    pub base: BaseResource,
    pub on: Option<On>,
    pub dimming: Option<Dimming>,
    pub color_temperature: Option<ColorTemperature>,
    pub color: Option<Color>,
    pub alert: Option<Alert>,
    pub dynamics: Option<Dynamics>,
}

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductData {
    pub model_id: Option<String>,
    pub manufacturer_name: Option<String>,
    pub product_name: Option<String>,
    pub product_archetype: Option<String>,
    pub certified: Option<bool>,
    pub software_version: Option<String>,
}

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Device {
    #[serde(flatten)]
    pub base: BaseResource,
    pub product_data: Option<ProductData>,
    pub services: Option<Vec<ResourceIdentifier>>,
}

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeZone {
    pub time_zone: Option<String>,
}

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Bridge {
    #[serde(flatten)]
    pub base: BaseResource,
    pub bridge_id: Option<String>,
    pub time_zone: Option<TimeZone>,
}
