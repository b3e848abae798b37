//! Legacy v1 profile: `/api/<username>/...` over plain HTTP.
//!
//! # Design
//! v1 shares the request builder, transport and envelope with v2 but keeps
//! its own schemas. Collections come back as JSON objects keyed by numeric
//! id, so records carry their id out-of-band and have it injected after
//! decoding (`V1Resource::set_id`).

mod client;
mod types;

pub use client::Client;
pub use types::{
    Command, Condition, Config, Group, GroupState, Light, LightState, ResourceLink, Rule,
    Scene, Schedule, Sensor, V1Resource, WhitelistEntry,
};
