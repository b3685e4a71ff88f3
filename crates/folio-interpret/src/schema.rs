//! Schemas: named, ordered column lists used to render tables and records.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{InterpretError, Result};

/// One column of a schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaItem {
    pub name: String,
    pub genpath: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post: Option<String>,
}

impl SchemaItem {
    pub fn new(name: impl Into<String>, genpath: impl Into<String>, post: Option<&str>) -> Self {
        Self {
            name: name.into(),
            genpath: genpath.into(),
            post: post.map(str::to_string),
        }
    }
}

/// An ordered list of columns.
pub type Schema = Vec<SchemaItem>;

/// Expands a partial column definition into a full [`SchemaItem`].
///
/// - `genpath` -- the name is the last `:` segment of the genpath's basename
/// - `name genpath`
/// - `name genpath post`
pub fn canonicalize_schema_item<S: AsRef<str>>(args: &[S]) -> Result<SchemaItem> {
    match args {
        [genpath] => {
            let genpath = genpath.as_ref();
            let basename = genpath.rsplit('/').next().unwrap_or(genpath);
            let name = basename.rsplit(':').next().unwrap_or(basename);
            Ok(SchemaItem::new(name, genpath, None))
        }
        [name, genpath] => Ok(SchemaItem::new(name.as_ref(), genpath.as_ref(), None)),
        [name, genpath, post] => Ok(SchemaItem::new(
            name.as_ref(),
            genpath.as_ref(),
            Some(post.as_ref()),
        )),
        _ => Err(InterpretError::usage(format!(
            "invalid number of arguments for a schema item: {:?}",
            args.iter().map(|a| a.as_ref()).collect::<Vec<&str>>()
        ))),
    }
}

/// Mapping from schema name to schema.
///
/// Directives mutate the registry in place for the rest of the pass. A caller
/// that reuses a registry across passes sees the earlier mutations.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaRegistry {
    schemas: BTreeMap<String, Schema>,
}

impl SchemaRegistry {
    /// An empty registry with no built-in schemas.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A registry seeded with the built-in schemas
    /// (`default`, `program`, `dataset`, `make`, `run`).
    pub fn with_defaults() -> Self {
        let name = SchemaItem::new("name", "name", None);
        let created = SchemaItem::new("created", "created", Some("date"));
        let data_size = SchemaItem::new("data_size", "data_size", Some("size"));
        let col = |genpath: &str| SchemaItem::new(genpath, genpath, None);

        let mut registry = Self::empty();
        registry.insert(
            "default",
            vec![
                name.clone(),
                col("bundle_type"),
                created.clone(),
                data_size.clone(),
                col("state"),
            ],
        );
        registry.insert("program", vec![name.clone(), created.clone(), data_size.clone()]);
        registry.insert("dataset", vec![name.clone(), created.clone(), data_size]);
        registry.insert(
            "make",
            vec![name.clone(), created.clone(), col("dependencies"), col("state")],
        );
        registry.insert(
            "run",
            vec![
                name,
                created,
                col("dependencies"),
                col("command"),
                col("state"),
                col("time"),
            ],
        );
        registry
    }

    pub fn get(&self, name: &str) -> Option<&Schema> {
        self.schemas.get(name)
    }

    /// Looks up a schema, failing with a usage error if it does not exist.
    pub fn require(&self, name: &str) -> Result<&Schema> {
        self.get(name)
            .ok_or_else(|| InterpretError::usage(format!("unknown schema: {name}")))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, schema: Schema) {
        self.schemas.insert(name.into(), schema);
    }

    /// Replaces `name` with an empty schema.
    pub fn reset(&mut self, name: &str) {
        self.schemas.insert(name.to_string(), Vec::new());
    }

    /// Appends columns to an existing (or new) schema.
    pub fn extend(&mut self, name: &str, items: impl IntoIterator<Item = SchemaItem>) {
        self.schemas.entry(name.to_string()).or_default().extend(items);
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn canonicalize_one_arg_derives_name() {
        let item = canonicalize_schema_item(&["/stats:errorRate"]).unwrap();
        assert_eq!(item, SchemaItem::new("errorRate", "/stats:errorRate", None));
    }

    #[test]
    fn canonicalize_one_arg_uses_basename() {
        let item = canonicalize_schema_item(&["/out/train/loss"]).unwrap();
        assert_eq!(item.name, "loss");
        let item = canonicalize_schema_item(&["time"]).unwrap();
        assert_eq!(item.name, "time");
    }

    #[test]
    fn canonicalize_two_and_three_args() {
        assert_eq!(
            canonicalize_schema_item(&["err", "/stats:errorRate"]).unwrap(),
            SchemaItem::new("err", "/stats:errorRate", None)
        );
        assert_eq!(
            canonicalize_schema_item(&["err", "/stats:errorRate", "%.3f"]).unwrap(),
            SchemaItem::new("err", "/stats:errorRate", Some("%.3f"))
        );
    }

    #[test]
    fn canonicalize_rejects_bad_arity() {
        assert!(canonicalize_schema_item::<&str>(&[]).unwrap_err().is_usage());
        let err = canonicalize_schema_item(&["a", "b", "c", "d"]).unwrap_err();
        assert!(err.is_usage());
    }

    #[test]
    fn defaults_are_seeded() {
        let r = SchemaRegistry::with_defaults();
        assert_eq!(r.names().collect::<Vec<_>>(), ["dataset", "default", "make", "program", "run"]);
        let default: Vec<_> = r.get("default").unwrap().iter().map(|i| i.name.as_str()).collect();
        assert_eq!(default, ["name", "bundle_type", "created", "data_size", "state"]);
        let run = r.get("run").unwrap();
        assert_eq!(run.len(), 6);
        assert_eq!(run[1].post.as_deref(), Some("date"));
    }

    #[test]
    fn reset_and_extend() {
        let mut r = SchemaRegistry::with_defaults();
        r.reset("default");
        assert!(r.get("default").unwrap().is_empty());
        r.extend("default", [SchemaItem::new("x", "x", None)]);
        assert_eq!(r.get("default").unwrap().len(), 1);
        assert!(r.require("missing").unwrap_err().is_usage());
    }
}
