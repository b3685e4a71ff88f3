//! Bundle descriptions as seen by the worksheet layer.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A dependency edge from a child bundle onto a parent bundle's output.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BundleDependency {
    #[serde(default)]
    pub child_uuid: String,

    /// Name under which the parent appears inside the child (may be empty).
    #[serde(default)]
    pub child_path: String,

    pub parent_uuid: String,

    /// Subpath inside the parent (empty means the whole bundle).
    #[serde(default)]
    pub parent_path: String,

    /// Display name of the parent bundle.
    #[serde(default)]
    pub parent_name: String,
}

/// Everything the interpreter knows about a bundle.
///
/// A freshly parsed worksheet only carries the `uuid`; the remaining fields
/// are filled in by the client before interpretation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BundleInfo {
    pub uuid: String,

    /// Bundle type: "program", "dataset", "make", "run", ...
    #[serde(default)]
    pub bundle_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    #[serde(default)]
    pub state: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_hash: Option<String>,

    #[serde(default)]
    pub dependencies: Vec<BundleDependency>,

    /// Free-form metadata (name, created, data_size, time, ...).
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl BundleInfo {
    /// Creates an info record that only knows its UUID.
    pub fn from_uuid(uuid: impl Into<String>) -> Self {
        Self {
            uuid: uuid.into(),
            ..Self::default()
        }
    }

    /// The bundle's name from its metadata, or `""`.
    pub fn name(&self) -> &str {
        self.metadata
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    /// Looks up one of the bundle's own fields by name.
    ///
    /// Unset optional fields yield `None` so that callers can fall back to
    /// the metadata map.
    pub fn field(&self, name: &str) -> Option<Value> {
        match name {
            "uuid" => Some(Value::String(self.uuid.clone())),
            "bundle_type" => Some(Value::String(self.bundle_type.clone())),
            "command" => self.command.clone().map(Value::String),
            "state" => Some(Value::String(self.state.clone())),
            "data_hash" => self.data_hash.clone().map(Value::String),
            "metadata" => Some(Value::Object(self.metadata.clone())),
            _ => None,
        }
    }
}
