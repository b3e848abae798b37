//! v2 client: typed CRUD over `/clip/v2/resource`.
//!
//! # Design
//! `Client` holds only the host, credential, API version and a shared
//! transport, and keeps no bridge state between calls. Each operation
//! configures a fresh `RequestBuilder`, executes it once and decodes the
//! envelope. A non-empty error list becomes `HueError::Api` here. Callers
//! who need partial data alongside errors use `request()` and inspect the
//! envelope themselves.

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::compose::DEFAULT_API_VERSION;
use crate::error::{HueError, Result};
use crate::http::{HttpMethod, Transport};
use crate::request::RequestBuilder;
use crate::resources::{
    Bridge, Device, GroupedLight, Light, On, ResourceIdentifier, ResourceType, Room, Scene,
    SceneRecall, Zone,
};
use crate::transport::UreqTransport;

/// Client for one bridge, speaking the v2 API.
#[derive(Clone)]
pub struct Client {
    host: String,
    application_key: String,
    api_version: String,
    transport: Arc<dyn Transport>,
}

impl Client {
    pub fn new(host: impl Into<String>, application_key: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            application_key: application_key.into(),
            api_version: DEFAULT_API_VERSION.to_string(),
            transport: Arc::new(UreqTransport::new()),
        }
    }

    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = transport;
        self
    }

    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// A builder with host, version, credential and transport filled in.
    pub fn request(&self, method: HttpMethod) -> RequestBuilder {
        RequestBuilder::new(self.host.clone())
            .method(method)
            .api_version(self.api_version.clone())
            .application_key(self.application_key.clone())
            .transport(Arc::clone(&self.transport))
    }

    /// Every resource of one type. A reply without `data` is an empty list.
    pub fn list<T: DeserializeOwned>(&self, resource_type: impl AsRef<str>) -> Result<Vec<T>> {
        let items: Option<Vec<T>> = self
            .request(HttpMethod::Get)
            .resource_type(resource_type)
            .execute()?
            .into_result()?
            .decode_into()?;
        Ok(items.unwrap_or_default())
    }

    pub fn get<T: DeserializeOwned>(
        &self,
        resource_type: impl AsRef<str>,
        id: impl fmt::Display,
    ) -> Result<T> {
        let resource_type = resource_type.as_ref();
        let id = id.to_string();
        let items: Option<Vec<T>> = self
            .request(HttpMethod::Get)
            .resource_type(resource_type)
            .resource_id(&id)
            .execute()?
            .into_result()?
            .decode_into()?;
        items
            .unwrap_or_default()
            .into_iter()
            .next()
            .ok_or_else(|| HueError::NotFound(format!("{resource_type}/{id}")))
    }

    pub fn create<B: Serialize + ?Sized>(
        &self,
        resource_type: impl AsRef<str>,
        body: &B,
    ) -> Result<Vec<ResourceIdentifier>> {
        self.request(HttpMethod::Post)
            .resource_type(resource_type)
            .json(body)?
            .execute()?
            .into_result()?
            .decode_into()
    }

    pub fn update<B: Serialize + ?Sized>(
        &self,
        resource_type: impl AsRef<str>,
        id: impl fmt::Display,
        body: &B,
    ) -> Result<Vec<ResourceIdentifier>> {
        self.request(HttpMethod::Put)
            .resource_type(resource_type)
            .resource_id(id)
            .json(body)?
            .execute()?
            .into_result()?
            .decode_into()
    }

    pub fn delete(
        &self,
        resource_type: impl AsRef<str>,
        id: impl fmt::Display,
    ) -> Result<Vec<ResourceIdentifier>> {
        self.request(HttpMethod::Delete)
            .resource_type(resource_type)
            .resource_id(id)
            .execute()?
            .into_result()?
            .decode_into()
    }

    pub fn lights(&self) -> Result<Vec<Light>> {
        self.list(ResourceType::Light)
    }

    pub fn light(&self, id: impl fmt::Display) -> Result<Light> {
        self.get(ResourceType::Light, id)
    }

    pub fn update_light(
        &self,
        id: impl fmt::Display,
        update: &Light,
    ) -> Result<Vec<ResourceIdentifier>> {
        self.update(ResourceType::Light, id, update)
    }

    pub fn set_light_on(&self, id: impl fmt::Display, on: bool) -> Result<Vec<ResourceIdentifier>> {
        let update = Light {
            on: Some(On { on: Some(on) }),
            ..Light::default()
        };
        self.update_light(id, &update)
    }

    pub fn rooms(&self) -> Result<Vec<Room>> {
        self.list(ResourceType::Room)
    }

    pub fn room(&self, id: impl fmt::Display) -> Result<Room> {
        self.get(ResourceType::Room, id)
    }

    pub fn zones(&self) -> Result<Vec<Zone>> {
        self.list(ResourceType::Zone)
    }

    pub fn zone(&self, id: impl fmt::Display) -> Result<Zone> {
        self.get(ResourceType::Zone, id)
    }

    pub fn scenes(&self) -> Result<Vec<Scene>> {
        self.list(ResourceType::Scene)
    }

    pub fn scene(&self, id: impl fmt::Display) -> Result<Scene> {
        self.get(ResourceType::Scene, id)
    }

    pub fn create_scene(&self, scene: &Scene) -> Result<Vec<ResourceIdentifier>> {
        self.create(ResourceType::Scene, scene)
    }

    /// Recall a scene with the `active` action.
    pub fn recall_scene(&self, id: impl fmt::Display) -> Result<Vec<ResourceIdentifier>> {
        let recall = Scene {
            recall: Some(SceneRecall {
                action: Some("active".to_string()),
                ..SceneRecall::default()
            }),
            ..Scene::default()
        };
        self.update(ResourceType::Scene, id, &recall)
    }

    pub fn delete_scene(&self, id: impl fmt::Display) -> Result<Vec<ResourceIdentifier>> {
        self.delete(ResourceType::Scene, id)
    }

    pub fn grouped_lights(&self) -> Result<Vec<GroupedLight>> {
        self.list(ResourceType::GroupedLight)
    }

    pub fn update_grouped_light(
        &self,
        id: impl fmt::Display,
        update: &GroupedLight,
    ) -> Result<Vec<ResourceIdentifier>> {
        self.update(ResourceType::GroupedLight, id, update)
    }

    pub fn devices(&self) -> Result<Vec<Device>> {
        self.list(ResourceType::Device)
    }

    /// The bridge's own resource; there is exactly one.
    pub fn bridge(&self) -> Result<Bridge> {
        self.list::<Bridge>(ResourceType::Bridge)?
            .into_iter()
            .next()
            .ok_or_else(|| HueError::NotFound(ResourceType::Bridge.to_string()))
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("host", &self.host)
            .field("api_version", &self.api_version)
            .finish_non_exhaustive()
    }
}
