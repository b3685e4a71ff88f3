//! Worksheet descriptions.

use serde::{Deserialize, Serialize};

use crate::item::WorksheetItem;

/// A worksheet together with its (hydrated) items.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WorksheetInfo {
    pub uuid: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub items: Vec<WorksheetItem>,
}

/// A worksheet referenced from inside another worksheet.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SubworksheetInfo {
    pub uuid: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
}

impl SubworksheetInfo {
    pub fn from_uuid(uuid: impl Into<String>) -> Self {
        Self {
            uuid: uuid.into(),
            name: String::new(),
        }
    }
}
