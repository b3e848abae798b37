//! Response envelope: data payload and error list, decoded independently.
//!
//! # Design
//! The v2 API wraps every reply as `{"data": [...], "errors": [...]}`. The
//! two halves are kept apart because the bridge can return partial data
//! alongside errors. `data` is held as an untyped `serde_json::Value` and only
//! decoded into a concrete shape when the caller asks, so a reply whose data
//! does not fit one shape can still be inspected or decoded into another.
//!
//! v1 replies are either a bare JSON value or a list of
//! `{"success": ...}` / `{"error": {...}}` entries. `from_v1_slice` maps the
//! latter onto the same envelope so both profiles share one error path.

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{HueError, Result};

/// One bridge-reported error. Its message is its description.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{description}")]
pub struct ApiError {
    #[serde(default)]
    pub description: String,
    /// v1 numeric error type (1 = unauthorized user, 101 = link button not pressed, ...).
    #[serde(rename = "type")]
    pub error_type: Option<i64>,
    /// v1 resource address the error refers to.
    pub address: Option<String>,
}

impl ApiError {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            error_type: None,
            address: None,
        }
    }
}

#[derive(Deserialize)]
struct WireEnvelope {
    #[serde(default)]
    data: Value,
    #[serde(default)]
    errors: Vec<ApiError>,
}

/// A decoded bridge reply.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    data: Value,
    errors: Vec<ApiError>,
    raw: Vec<u8>,
}

impl Envelope {
    /// Parse a v2 reply. The top level must be a JSON object; `data` and
    /// `errors` are both optional.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let value: Value = serde_json::from_slice(bytes).map_err(HueError::Decode)?;
        if !value.is_object() {
            return Err(HueError::Decode(serde_json::Error::custom(
                "expected a JSON object with `data` and `errors` fields",
            )));
        }
        let wire = WireEnvelope::deserialize(value).map_err(HueError::Decode)?;
        Ok(Self {
            data: wire.data,
            errors: wire.errors,
            raw: bytes.to_vec(),
        })
    }

    /// Parse a v1 reply.
    pub fn from_v1_slice(bytes: &[u8]) -> Result<Self> {
        let value: Value = serde_json::from_slice(bytes).map_err(HueError::Decode)?;

        let items = match value {
            Value::Array(items) if !items.is_empty() && items.iter().all(is_v1_status) => items,
            data => {
                return Ok(Self {
                    data,
                    errors: Vec::new(),
                    raw: bytes.to_vec(),
                })
            }
        };

        let mut data = Vec::new();
        let mut errors = Vec::new();
        for item in items {
            let Value::Object(mut entry) = item else {
                continue;
            };
            if let Some(error) = entry.remove("error") {
                errors.push(ApiError::deserialize(error).map_err(HueError::Decode)?);
            } else if let Some(success) = entry.remove("success") {
                data.push(success);
            }
        }

        Ok(Self {
            data: Value::Array(data),
            errors,
            raw: bytes.to_vec(),
        })
    }

    /// Decode the data payload into `T`. Repeatable; the envelope is unchanged.
    pub fn decode_into<T: DeserializeOwned>(&self) -> Result<T> {
        T::deserialize(&self.data).map_err(HueError::Decode)
    }

    /// The untyped data payload; `Value::Null` when the reply had none.
    pub fn data(&self) -> &Value {
        &self.data
    }

    pub fn errors(&self) -> &[ApiError] {
        &self.errors
    }

    pub fn first_error(&self) -> Option<&ApiError> {
        self.errors.first()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// The reply body exactly as received.
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// `Err(HueError::Api)` when the error list is non-empty.
    pub fn into_result(self) -> Result<Self> {
        if self.errors.is_empty() {
            Ok(self)
        } else {
            Err(HueError::Api {
                errors: self.errors,
            })
        }
    }
}

fn is_v1_status(item: &Value) -> bool {
    item.get("success").is_some() || item.get("error").is_some()
}
