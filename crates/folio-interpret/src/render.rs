//! Rendered output of an interpretation pass.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use folio_core::bundle::BundleInfo;
use folio_core::client::Target;
use folio_core::display::{DisplayMode, DisplaySpec};
use folio_core::worksheet::SubworksheetInfo;

use crate::schema::SchemaRegistry;

/// A file-backed value that has not been fetched yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeferredValue {
    pub bundle_uuid: String,
    /// A file genpath, including its leading `/`.
    pub genpath: String,
    /// Post-processing to apply once the value is fetched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post: Option<String>,
}

impl DeferredValue {
    pub fn new(bundle_uuid: impl Into<String>, genpath: impl Into<String>) -> Self {
        Self {
            bundle_uuid: bundle_uuid.into(),
            genpath: genpath.into(),
            post: None,
        }
    }

    /// The file this value lives in (the genpath minus `/` and any `:key`).
    pub fn target(&self) -> Target {
        let path = self.genpath.strip_prefix('/').unwrap_or(&self.genpath);
        let subpath = path.split_once(':').map_or(path, |(subpath, _)| subpath);
        Target::new(self.bundle_uuid.clone(), subpath)
    }
}

/// A table/record cell or reference value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Deferred(DeferredValue),
    Value(Value),
}

impl CellValue {
    pub fn null() -> Self {
        Self::Value(Value::Null)
    }

    pub fn is_deferred(&self) -> bool {
        matches!(self, Self::Deferred(_))
    }
}

impl From<Value> for CellValue {
    fn from(v: Value) -> Self {
        Self::Value(v)
    }
}

/// One `key: value` line of a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordRow {
    pub key: String,
    pub value: CellValue,
}

/// A captured `% search` block: what to search for and how to show it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchBlock {
    pub keywords: Vec<String>,
    pub display: DisplaySpec,
    /// Snapshot of the schemas at the time the search directive was seen.
    pub schemas: SchemaRegistry,
}

/// One item of rendered output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum RenderedItem {
    Markup {
        text: String,
    },
    /// A single bundle shown through one of the inline/contents/image/html
    /// modes.
    Reference {
        display: DisplayMode,
        value: CellValue,
        bundle: BundleInfo,
    },
    /// A single bundle shown as `key: value` lines.
    Record {
        header: (String, String),
        rows: Vec<RecordRow>,
        bundle: BundleInfo,
    },
    /// A group of bundles shown as one table.
    Table {
        header: Vec<String>,
        rows: Vec<BTreeMap<String, CellValue>>,
        bundles: Vec<BundleInfo>,
    },
    Worksheet {
        worksheet: SubworksheetInfo,
    },
    Search(SearchBlock),
}

/// The result of interpreting a worksheet.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct InterpretResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub items: Vec<RenderedItem>,
}
