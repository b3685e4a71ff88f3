//! Worksheet items and their persisted form.
//!
//! A worksheet is a sequence of items. In code each item is a
//! [`WorksheetItem`]; in storage it is a [`PersistedItem`] row of
//! `(bundle_uuid, subworksheet_uuid, value, type)` where exactly one of the
//! two UUID columns is set for bundle/worksheet rows and neither for
//! markup/directive rows.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::bundle::BundleInfo;
use crate::token::{self, TokenError};
use crate::worksheet::SubworksheetInfo;

/// Error type for item conversion.
#[derive(Debug, thiserror::Error)]
pub enum ItemError {
    #[error("invalid worksheet item type: {0}")]
    UnknownType(String),

    #[error("{item_type} item is missing its uuid")]
    MissingUuid { item_type: ItemType },

    #[error("invalid directive value: {0}")]
    Directive(#[from] TokenError),
}

/// The four kinds of worksheet item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemType {
    Markup,
    Directive,
    Bundle,
    Worksheet,
}

impl ItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Markup => "markup",
            Self::Directive => "directive",
            Self::Bundle => "bundle",
            Self::Worksheet => "worksheet",
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemType {
    type Err = ItemError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "markup" => Ok(Self::Markup),
            "directive" => Ok(Self::Directive),
            "bundle" => Ok(Self::Bundle),
            "worksheet" => Ok(Self::Worksheet),
            other => Err(ItemError::UnknownType(other.to_string())),
        }
    }
}

impl Serialize for ItemType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ItemType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// One item of a worksheet, as used by the interpreter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum WorksheetItem {
    /// Plain text (markdown), kept verbatim.
    Markup(String),
    /// A `%` directive, already split into tokens.
    Directive(Vec<String>),
    /// A reference to a bundle.
    Bundle(BundleInfo),
    /// A reference to another worksheet.
    Worksheet(SubworksheetInfo),
}

impl WorksheetItem {
    pub fn item_type(&self) -> ItemType {
        match self {
            Self::Markup(_) => ItemType::Markup,
            Self::Directive(_) => ItemType::Directive,
            Self::Bundle(_) => ItemType::Bundle,
            Self::Worksheet(_) => ItemType::Worksheet,
        }
    }

    /// Converts the item into its storage row.
    pub fn to_persisted(&self) -> PersistedItem {
        let item_type = self.item_type();
        match self {
            Self::Markup(text) => PersistedItem {
                bundle_uuid: None,
                subworksheet_uuid: None,
                value: text.clone(),
                item_type,
            },
            Self::Directive(tokens) => PersistedItem {
                bundle_uuid: None,
                subworksheet_uuid: None,
                value: token::tokens_to_string(tokens),
                item_type,
            },
            // The value column is never null; reference rows store "".
            Self::Bundle(info) => PersistedItem {
                bundle_uuid: Some(info.uuid.clone()),
                subworksheet_uuid: None,
                value: String::new(),
                item_type,
            },
            Self::Worksheet(info) => PersistedItem {
                bundle_uuid: None,
                subworksheet_uuid: Some(info.uuid.clone()),
                value: String::new(),
                item_type,
            },
        }
    }

    /// Rebuilds an item from its storage row.
    ///
    /// Bundle and worksheet items come back carrying only their UUID.
    pub fn from_persisted(row: &PersistedItem) -> Result<Self, ItemError> {
        match row.item_type {
            ItemType::Markup => Ok(Self::Markup(row.value.clone())),
            ItemType::Directive => Ok(Self::Directive(token::string_to_tokens(&row.value)?)),
            ItemType::Bundle => row
                .bundle_uuid
                .as_deref()
                .map(|uuid| Self::Bundle(BundleInfo::from_uuid(uuid)))
                .ok_or(ItemError::MissingUuid {
                    item_type: ItemType::Bundle,
                }),
            ItemType::Worksheet => row
                .subworksheet_uuid
                .as_deref()
                .map(|uuid| Self::Worksheet(SubworksheetInfo::from_uuid(uuid)))
                .ok_or(ItemError::MissingUuid {
                    item_type: ItemType::Worksheet,
                }),
        }
    }
}

/// The storage representation of a worksheet item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedItem {
    pub bundle_uuid: Option<String>,
    pub subworksheet_uuid: Option<String>,
    pub value: String,
    #[serde(rename = "type")]
    pub item_type: ItemType,
}
