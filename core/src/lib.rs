//! Blocking client for a lighting bridge's REST API.
//!
//! # Overview
//! Two protocol generations are supported. The v2 API lives under
//! `/clip/v2/resource/<type>[/<id>]` and authenticates with the
//! `hue-application-key` header; the legacy v1 API (see [`v1`]) lives under
//! `/api/<username>/...`. Both share one request builder, one pluggable
//! transport and one response envelope.
//!
//! # Design
//! - `RequestBuilder` is a chainable configuration object that composes the
//!   URL, dispatches exactly one request per execute and returns bytes or an
//!   `Envelope`.
//! - `Transport` is the I/O seam. `UreqTransport` is the default; tests plug
//!   in recording transports or run against the `mock-bridge` crate.
//! - `Envelope` keeps `data` untyped until the caller decodes it, and keeps
//!   bridge-reported errors separate from it.
//! - Nothing is cached, retried or scheduled. Every call is independent.

pub mod client;
pub mod compose;
pub mod config;
pub mod discovery;
pub mod envelope;
pub mod error;
pub mod http;
pub mod request;
pub mod resources;
pub mod transport;
pub mod v1;

pub use client::Client;
pub use config::BridgeConfig;
pub use discovery::{DiscoveredBridge, Discovery};
pub use envelope::{ApiError, Envelope};
pub use error::{HueError, Result};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport, TransportError};
pub use request::{RequestBuilder, APPLICATION_KEY_HEADER};
pub use resources::{
    BaseResource, Bridge, Color, ColorTemperature, Device, Dimming, GroupedLight, Light, On,
    ResourceIdentifier, ResourceType, Room, Scene, Xy, Zone,
};
pub use transport::UreqTransport;
