//! [`MemoryStore`] -- an in-process bundle store.
//!
//! On disk a store is a directory laid out as
//!
//! ```text
//! <root>/bundles/<uuid>.json       bundle info
//! <root>/bundles/<uuid>/<path...>  bundle contents
//! <root>/worksheets/<uuid>.json    {"uuid", "name", "items": [persisted items]}
//! ```

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Component, Path};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};
use walkdir::WalkDir;

use folio_core::bundle::BundleInfo;
use folio_core::client::{self, BundleClient, ClientError, Target, is_uuid};
use folio_core::item::{PersistedItem, WorksheetItem};
use folio_core::worksheet::{SubworksheetInfo, WorksheetInfo};

use crate::error::{Result, StoreError};

/// A worksheet file as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorksheetRecord {
    pub uuid: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub items: Vec<PersistedItem>,
}

/// Bundles, their files, and worksheets, all held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    bundles: BTreeMap<String, BundleInfo>,
    files: HashMap<Target, String>,
    worksheets: BTreeMap<String, WorksheetInfo>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a store directory.
    ///
    /// Missing `bundles/` or `worksheets/` subdirectories are treated as
    /// empty.
    pub fn load_dir(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        info!(?root, "loading store");
        let mut store = Self::new();

        let bundles_dir = root.join("bundles");
        if bundles_dir.is_dir() {
            store.load_bundles(&bundles_dir)?;
        }
        let worksheets_dir = root.join("worksheets");
        if worksheets_dir.is_dir() {
            store.load_worksheets(&worksheets_dir)?;
        }

        info!(
            bundles = store.bundles.len(),
            files = store.files.len(),
            worksheets = store.worksheets.len(),
            "store loaded"
        );
        Ok(store)
    }

    fn load_bundles(&mut self, dir: &Path) -> Result<()> {
        for entry in WalkDir::new(dir).min_depth(1).sort_by_file_name() {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            let Ok(rel) = path.strip_prefix(dir) else {
                continue;
            };
            let parts: Vec<&str> = rel
                .components()
                .filter_map(|c| match c {
                    Component::Normal(s) => s.to_str(),
                    _ => None,
                })
                .collect();

            match parts.as_slice() {
                [file] => {
                    let Some(stem) = file.strip_suffix(".json") else {
                        debug!(?path, "skipping non-JSON file in bundles directory");
                        continue;
                    };
                    let mut info: BundleInfo = read_json(path)?;
                    if info.uuid.is_empty() {
                        info.uuid = stem.to_string();
                    } else if info.uuid != stem {
                        return Err(StoreError::validation(format!(
                            "{} describes bundle {}",
                            path.display(),
                            info.uuid
                        )));
                    }
                    self.insert_bundle(info);
                }
                [uuid, subpath @ ..] => {
                    let bytes = fs::read(path).map_err(|source| StoreError::Io {
                        path: path.to_path_buf(),
                        source,
                    })?;
                    let contents = String::from_utf8_lossy(&bytes).into_owned();
                    self.insert_file(*uuid, &subpath.join("/"), contents);
                }
                [] => {}
            }
        }
        Ok(())
    }

    fn load_worksheets(&mut self, dir: &Path) -> Result<()> {
        for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
            let entry = entry?;
            let path = entry.path();
            if !entry.file_type().is_file() || path.extension().is_none_or(|e| e != "json") {
                continue;
            }
            let record: WorksheetRecord = read_json(path)?;
            let items = record
                .items
                .iter()
                .map(WorksheetItem::from_persisted)
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|source| StoreError::Item {
                    worksheet: record.uuid.clone(),
                    source,
                })?;
            self.insert_worksheet(WorksheetInfo {
                uuid: record.uuid,
                name: record.name,
                items,
            });
        }
        Ok(())
    }

    pub fn insert_bundle(&mut self, info: BundleInfo) {
        self.bundles.insert(info.uuid.clone(), info);
    }

    pub fn insert_file(&mut self, uuid: impl Into<String>, subpath: &str, contents: impl Into<String>) {
        self.files.insert(Target::new(uuid, subpath), contents.into());
    }

    /// Adds a worksheet. Bundle and worksheet items are reduced to their
    /// UUIDs, as they would be in storage.
    pub fn insert_worksheet(&mut self, mut info: WorksheetInfo) {
        for item in &mut info.items {
            match item {
                WorksheetItem::Bundle(b) => *b = BundleInfo::from_uuid(b.uuid.clone()),
                WorksheetItem::Worksheet(w) => *w = SubworksheetInfo::from_uuid(w.uuid.clone()),
                _ => {}
            }
        }
        self.worksheets.insert(info.uuid.clone(), info);
    }

    fn bundle_names_on(&self, worksheet_uuid: &str) -> impl Iterator<Item = &BundleInfo> {
        self.worksheets
            .get(worksheet_uuid)
            .into_iter()
            .flat_map(|ws| ws.items.iter().rev())
            .filter_map(|item| match item {
                WorksheetItem::Bundle(b) => self.bundles.get(&b.uuid),
                _ => None,
            })
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let text = fs::read_to_string(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// `0x` followed by at least one lowercase hex digit.
fn is_uuid_prefix(spec: &str) -> bool {
    spec.strip_prefix("0x").is_some_and(|hex| {
        !hex.is_empty() && hex.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
    })
}

/// Picks the only candidate, or reports none/many.
fn unique<'a>(
    entity: &str,
    spec: &str,
    candidates: impl IntoIterator<Item = &'a String>,
) -> client::Result<Option<String>> {
    let candidates: Vec<&String> = candidates.into_iter().collect();
    match candidates.as_slice() {
        [] => Ok(None),
        [one] => Ok(Some((*one).clone())),
        many => Err(ClientError::Ambiguous {
            entity: entity.to_string(),
            spec: spec.to_string(),
            count: many.len(),
        }),
    }
}

/// Compares a field or metadata value against the text of a `key=value`
/// keyword.
fn value_matches(value: &Value, expected: &str) -> bool {
    match value {
        Value::String(s) => s == expected,
        other => other.to_string() == expected,
    }
}

fn keyword_matches(bundle: &BundleInfo, keyword: &str) -> bool {
    if let Some((key, expected)) = keyword.split_once('=') {
        let key = if key == "type" { "bundle_type" } else { key };
        let value = bundle.field(key).or_else(|| bundle.metadata.get(key).cloned());
        return value.is_some_and(|v| value_matches(&v, expected));
    }
    let needle = keyword.to_lowercase();
    [bundle.name(), bundle.uuid.as_str(), bundle.command.as_deref().unwrap_or_default()]
        .iter()
        .any(|hay| hay.to_lowercase().contains(&needle))
}

fn created(bundle: &BundleInfo) -> f64 {
    bundle
        .metadata
        .get("created")
        .and_then(Value::as_f64)
        .unwrap_or_default()
}

/// Newest first, then by UUID.
fn newest_first(a: &BundleInfo, b: &BundleInfo) -> Ordering {
    created(b)
        .total_cmp(&created(a))
        .then_with(|| a.uuid.cmp(&b.uuid))
}

impl BundleClient for MemoryStore {
    fn resolve_bundle_uuid(&self, worksheet_uuid: &str, bundle_spec: &str) -> client::Result<String> {
        if bundle_spec.is_empty() {
            return Err(ClientError::InvalidSpec("empty bundle spec".into()));
        }
        if is_uuid(bundle_spec) {
            return self
                .bundles
                .contains_key(bundle_spec)
                .then(|| bundle_spec.to_string())
                .ok_or_else(|| ClientError::not_found("bundle", bundle_spec));
        }
        if is_uuid_prefix(bundle_spec) {
            let matches = self.bundles.keys().filter(|uuid| uuid.starts_with(bundle_spec));
            if let Some(uuid) = unique("bundle", bundle_spec, matches)? {
                return Ok(uuid);
            }
        }
        // The most recent bundle with that name on the worksheet wins.
        if let Some(bundle) = self
            .bundle_names_on(worksheet_uuid)
            .find(|b| b.name() == bundle_spec)
        {
            debug!(spec = bundle_spec, uuid = %bundle.uuid, "resolved bundle on worksheet");
            return Ok(bundle.uuid.clone());
        }
        let named = self
            .bundles
            .values()
            .filter(|b| b.name() == bundle_spec)
            .map(|b| &b.uuid);
        unique("bundle", bundle_spec, named)?.ok_or_else(|| ClientError::not_found("bundle", bundle_spec))
    }

    fn resolve_worksheet_uuid(
        &self,
        _base_worksheet_uuid: &str,
        worksheet_spec: &str,
    ) -> client::Result<String> {
        if worksheet_spec.is_empty() {
            return Err(ClientError::InvalidSpec("empty worksheet spec".into()));
        }
        if self.worksheets.contains_key(worksheet_spec) {
            return Ok(worksheet_spec.to_string());
        }
        if is_uuid_prefix(worksheet_spec) {
            let matches = self.worksheets.keys().filter(|uuid| uuid.starts_with(worksheet_spec));
            if let Some(uuid) = unique("worksheet", worksheet_spec, matches)? {
                return Ok(uuid);
            }
        }
        let named = self
            .worksheets
            .values()
            .filter(|w| w.name == worksheet_spec)
            .map(|w| &w.uuid);
        unique("worksheet", worksheet_spec, named)?
            .ok_or_else(|| ClientError::not_found("worksheet", worksheet_spec))
    }

    fn get_bundle_info(&self, uuid: &str) -> client::Result<BundleInfo> {
        self.bundles
            .get(uuid)
            .cloned()
            .ok_or_else(|| StoreError::not_found("bundle", uuid).into())
    }

    fn get_worksheet_info(&self, uuid: &str) -> client::Result<WorksheetInfo> {
        self.worksheets
            .get(uuid)
            .cloned()
            .ok_or_else(|| StoreError::not_found("worksheet", uuid).into())
    }

    fn head_target(&self, target: &Target, max_lines: usize) -> client::Result<Option<Vec<String>>> {
        if !self.bundles.contains_key(&target.bundle_uuid) {
            return Err(StoreError::not_found("bundle", &target.bundle_uuid).into());
        }
        debug!(?target, max_lines, "head");
        Ok(self.files.get(target).map(|contents| {
            contents
                .lines()
                .take(max_lines)
                .map(str::to_string)
                .collect()
        }))
    }

    fn search_bundle_uuids(
        &self,
        _worksheet_uuid: &str,
        keywords: &[String],
        limit: usize,
    ) -> client::Result<Vec<String>> {
        let mut hits: Vec<&BundleInfo> = self
            .bundles
            .values()
            .filter(|b| keywords.iter().all(|k| keyword_matches(b, k)))
            .collect();
        hits.sort_by(|a, b| newest_first(a, b));
        debug!(?keywords, hits = hits.len(), limit, "search");
        Ok(hits.into_iter().take(limit).map(|b| b.uuid.clone()).collect())
    }
}
