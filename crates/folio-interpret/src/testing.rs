//! Test helpers: an in-memory client that records its fetches.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};

use serde_json::json;

use folio_core::bundle::{BundleDependency, BundleInfo};
use folio_core::client::{BundleClient, ClientError, Result, Target};
use folio_core::worksheet::WorksheetInfo;

pub(crate) fn bundle(uuid: &str, bundle_type: &str, name: &str) -> BundleInfo {
    let mut b = BundleInfo::from_uuid(uuid);
    b.bundle_type = bundle_type.to_string();
    b.metadata.insert("name".into(), json!(name));
    b
}

pub(crate) fn dep(
    child_path: &str,
    parent_uuid: &str,
    parent_path: &str,
    parent_name: &str,
) -> BundleDependency {
    BundleDependency {
        child_uuid: String::new(),
        child_path: child_path.to_string(),
        parent_uuid: parent_uuid.to_string(),
        parent_path: parent_path.to_string(),
        parent_name: parent_name.to_string(),
    }
}

/// A fixed set of bundles, worksheets and files.
///
/// Specs resolve by exact UUID or bundle name. Every `head_target` call is
/// counted, and the keywords of every search are recorded. Searches honor
/// their limit unless the client is built with [`FakeClient::ignoring_search_limit`].
#[derive(Default)]
pub(crate) struct FakeClient {
    bundles: BTreeMap<String, BundleInfo>,
    worksheets: BTreeMap<String, WorksheetInfo>,
    files: HashMap<Target, String>,
    search_results: Vec<String>,
    fail_fetches: bool,
    ignore_search_limit: bool,
    fetches: Cell<usize>,
    searches: RefCell<Vec<Vec<String>>>,
}

impl FakeClient {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_bundle(mut self, info: BundleInfo) -> Self {
        self.bundles.insert(info.uuid.clone(), info);
        self
    }

    pub(crate) fn with_worksheet(mut self, info: WorksheetInfo) -> Self {
        self.worksheets.insert(info.uuid.clone(), info);
        self
    }

    pub(crate) fn with_file(mut self, uuid: &str, subpath: &str, contents: &str) -> Self {
        self.files
            .insert(Target::new(uuid, subpath), contents.to_string());
        self
    }

    pub(crate) fn with_search_results(mut self, uuids: &[&str]) -> Self {
        self.search_results = uuids.iter().map(|u| u.to_string()).collect();
        self
    }

    pub(crate) fn failing_fetches(mut self) -> Self {
        self.fail_fetches = true;
        self
    }

    pub(crate) fn ignoring_search_limit(mut self) -> Self {
        self.ignore_search_limit = true;
        self
    }

    pub(crate) fn fetch_count(&self) -> usize {
        self.fetches.get()
    }

    pub(crate) fn searches(&self) -> Vec<Vec<String>> {
        self.searches.borrow().clone()
    }
}

impl BundleClient for FakeClient {
    fn resolve_bundle_uuid(&self, _worksheet_uuid: &str, bundle_spec: &str) -> Result<String> {
        if self.bundles.contains_key(bundle_spec) {
            return Ok(bundle_spec.to_string());
        }
        self.bundles
            .values()
            .find(|b| b.name() == bundle_spec)
            .map(|b| b.uuid.clone())
            .ok_or_else(|| ClientError::not_found("bundle", bundle_spec))
    }

    fn resolve_worksheet_uuid(&self, _base: &str, worksheet_spec: &str) -> Result<String> {
        if self.worksheets.contains_key(worksheet_spec) {
            return Ok(worksheet_spec.to_string());
        }
        self.worksheets
            .values()
            .find(|w| w.name == worksheet_spec)
            .map(|w| w.uuid.clone())
            .ok_or_else(|| ClientError::not_found("worksheet", worksheet_spec))
    }

    fn get_bundle_info(&self, uuid: &str) -> Result<BundleInfo> {
        self.bundles
            .get(uuid)
            .cloned()
            .ok_or_else(|| ClientError::not_found("bundle", uuid))
    }

    fn get_worksheet_info(&self, uuid: &str) -> Result<WorksheetInfo> {
        self.worksheets
            .get(uuid)
            .cloned()
            .ok_or_else(|| ClientError::not_found("worksheet", uuid))
    }

    fn head_target(&self, target: &Target, max_lines: usize) -> Result<Option<Vec<String>>> {
        self.fetches.set(self.fetches.get() + 1);
        if self.fail_fetches {
            return Err(ClientError::Unavailable("fetch disabled".into()));
        }
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
    ) -> Result<Vec<String>> {
        self.searches.borrow_mut().push(keywords.to_vec());
        let limit = if self.ignore_search_limit { usize::MAX } else { limit };
        Ok(self.search_results.iter().take(limit).cloned().collect())
    }
}
