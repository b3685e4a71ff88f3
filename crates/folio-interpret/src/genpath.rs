//! Generalized paths ("genpaths"): expressions selecting a value from a
//! bundle.
//!
//! A genpath is either
//! - a field genpath (`command`, `name`, `dependencies/<child_path>`, ...),
//!   resolved immediately from the bundle's fields and metadata, or
//! - a file genpath (starts with `/`), which can descend into a structured
//!   file: `/stats:train/errorRate` reads the file `stats` and looks up
//!   `train` then `errorRate`. File genpaths need bundle contents, so
//!   [`interpret_genpath`] only returns a deferred value for them and the
//!   actual read happens in [`interpret_file_genpath`].

use std::collections::HashMap;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use folio_core::bundle::BundleInfo;
use folio_core::client::{BundleClient, Target};

use crate::error::{InterpretError, Result};
use crate::render::{CellValue, DeferredValue};

/// Maximum number of lines read from a file to resolve a genpath.
pub const MAX_LINES: usize = 1000;

/// Returns whether the genpath refers to a file (`/stdout`) rather than a
/// field (`command`).
pub fn is_file_genpath(genpath: &str) -> bool {
    genpath.starts_with('/')
}

/// Resolves a genpath that only needs bundle metadata.
///
/// File genpaths come back as [`CellValue::Deferred`].
pub fn interpret_genpath(bundle: &BundleInfo, genpath: &str) -> CellValue {
    if is_file_genpath(genpath) {
        return CellValue::Deferred(DeferredValue::new(bundle.uuid.clone(), genpath));
    }
    CellValue::Value(interpret_field_genpath(bundle, genpath))
}

/// Resolves a field genpath. Unknown keys yield `null`.
pub fn interpret_field_genpath(bundle: &BundleInfo, genpath: &str) -> Value {
    match genpath {
        "dependencies" => Value::String(
            bundle
                .dependencies
                .iter()
                .map(|dep| dep.parent_name.as_str())
                .collect::<Vec<_>>()
                .join(","),
        ),
        "args" => args_string(bundle).map_or(Value::Null, Value::String),
        _ => {
            if let Some(child_path) = genpath.strip_prefix("dependencies/") {
                let name = bundle
                    .dependencies
                    .iter()
                    .find(|dep| dep.child_path == child_path)
                    .map_or("n/a", |dep| dep.parent_name.as_str());
                return Value::String(name.to_string());
            }
            bundle
                .field(genpath)
                .or_else(|| bundle.metadata.get(genpath).cloned())
                .unwrap_or(Value::Null)
        }
    }
}

/// The command-line arguments that would recreate a `make` or `run` bundle.
///
/// `run a:0x12 b:0x34/out --name train --- python train.py`
fn args_string(bundle: &BundleInfo) -> Option<String> {
    let bundle_type = bundle.bundle_type.as_str();
    if bundle_type != "make" && bundle_type != "run" {
        return None;
    }

    let deps = &bundle.dependencies;
    // A lone dependency with no child path is passed without a `name:` prefix.
    let anonymous = deps.len() == 1 && deps[0].child_path.is_empty();

    let mut args = vec![bundle_type.to_string()];
    for dep in deps {
        let mut arg = String::new();
        if !anonymous {
            arg.push_str(&dep.child_path);
            arg.push(':');
        }
        arg.push_str(&dep.parent_uuid);
        if !dep.parent_path.is_empty() {
            arg.push('/');
            arg.push_str(&dep.parent_path);
        }
        args.push(arg);
    }
    args.push("--name".to_string());
    args.push(bundle.name().to_string());
    if let Some(command) = bundle.command.as_deref().filter(|c| !c.is_empty()) {
        args.push("---".to_string());
        args.push(command.to_string());
    }
    Some(args.join(" "))
}

/// Parsed file contents, memoized per (bundle, subpath) for one pass.
///
/// Each target is fetched at most once; a failed or missing fetch is cached
/// as `None` as well.
#[derive(Debug)]
pub struct TargetCache {
    entries: HashMap<Target, Option<Value>>,
    max_lines: usize,
}

impl Default for TargetCache {
    fn default() -> Self {
        Self::new()
    }
}

impl TargetCache {
    pub fn new() -> Self {
        Self::with_max_lines(MAX_LINES)
    }

    pub fn with_max_lines(max_lines: usize) -> Self {
        Self {
            entries: HashMap::new(),
            max_lines,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, target: &Target) -> bool {
        self.entries.contains_key(target)
    }

    /// Returns the parsed contents of `target`, fetching them on first use.
    pub fn load<C: BundleClient + ?Sized>(&mut self, client: &C, target: &Target) -> Option<&Value> {
        if !self.entries.contains_key(target) {
            let info = fetch_target(client, target, self.max_lines);
            self.entries.insert(target.clone(), info);
        } else {
            debug!(?target, "target cache hit");
        }
        self.entries.get(target).and_then(Option::as_ref)
    }
}

fn fetch_target<C: BundleClient + ?Sized>(
    client: &C,
    target: &Target,
    max_lines: usize,
) -> Option<Value> {
    debug!(?target, max_lines, "fetching target");
    match client.head_target(target, max_lines) {
        Ok(Some(lines)) => parse_contents(target, &lines),
        Ok(None) => None,
        Err(err) => {
            warn!(?target, error = %err, "failed to fetch target");
            None
        }
    }
}

/// Parses file contents either as tab-separated `key\tvalue` lines (when
/// every non-empty line has a tab) or as a YAML document.
///
/// A single-line YAML document containing a tab is read as key/value; this
/// ambiguity is inherent to the heuristic.
fn parse_contents(target: &Target, lines: &[String]) -> Option<Value> {
    let tabbed = lines
        .iter()
        .filter(|line| !line.trim().is_empty())
        .all(|line| line.contains('\t'));

    if tabbed {
        let mut info = Map::new();
        for line in lines {
            if let Some((key, value)) = line.trim().split_once('\t') {
                info.insert(key.to_string(), Value::String(value.to_string()));
            }
        }
        return Some(Value::Object(info));
    }

    match serde_yaml::from_str::<Value>(&lines.join("\n")) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(?target, error = %err, "target is neither tab-separated nor valid YAML");
            None
        }
    }
}

/// Resolves a file genpath against the bundle's contents.
///
/// `/stats:train/errorRate` reads `stats` from the bundle and descends into
/// `train` then `errorRate`. Returns `Ok(None)` if the file could not be read
/// or the key path does not exist.
pub fn interpret_file_genpath<C: BundleClient + ?Sized>(
    client: &C,
    cache: &mut TargetCache,
    bundle_uuid: &str,
    genpath: &str,
) -> Result<Option<Value>> {
    let path = genpath
        .strip_prefix('/')
        .ok_or_else(|| InterpretError::usage(format!("not a file genpath: {genpath}")))?;
    let (subpath, key) = match path.split_once(':') {
        Some((subpath, key)) => (subpath, Some(key)),
        None => (path, None),
    };

    let target = Target::new(bundle_uuid, subpath);
    let Some(info) = cache.load(client, &target) else {
        return Ok(None);
    };

    let Some(key) = key.filter(|k| !k.is_empty()) else {
        return Ok(Some(info.clone()));
    };
    let mut current = info;
    for k in key.split('/') {
        match current.as_object().and_then(|map| map.get(k)) {
            Some(next) if !next.is_null() => current = next,
            _ => return Ok(None),
        }
    }
    Ok(Some(current.clone()))
}
