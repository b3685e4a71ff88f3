//! Replaying saved `% search` blocks against the current bundle store.

use tracing::debug;

use folio_core::client::BundleClient;
use folio_core::display::DisplaySpec;
use folio_core::item::WorksheetItem;

use crate::engine::interpret_items;
use crate::error::Result;
use crate::render::{InterpretResult, RenderedItem, SearchBlock};

/// Maximum number of bundles a search block shows.
pub const SEARCH_LIMIT: usize = 100;

/// Runs a captured search and interprets its hits.
///
/// The hits are rendered with the display mode and schemas that were in
/// effect where the search directive appeared. At most `limit` hits are
/// shown, whatever the client returns.
pub fn interpret_search<C: BundleClient + ?Sized>(
    client: &C,
    worksheet_uuid: &str,
    block: &SearchBlock,
    limit: usize,
) -> Result<InterpretResult> {
    let uuids = client.search_bundle_uuids(worksheet_uuid, &block.keywords, limit)?;
    debug!(keywords = ?block.keywords, hits = uuids.len(), limit, "search");

    let shown = uuids.len().min(limit);
    let mut items = Vec::with_capacity(shown + 1);
    items.push(display_directive(&block.display));
    for uuid in uuids.iter().take(limit) {
        items.push(WorksheetItem::Bundle(client.get_bundle_info(uuid)?));
    }

    let mut schemas = block.schemas.clone();
    interpret_items(&mut schemas, items)
}

fn display_directive(display: &DisplaySpec) -> WorksheetItem {
    let mut tokens = vec!["display".to_string()];
    tokens.extend(display.tokens().iter().cloned());
    WorksheetItem::Directive(tokens)
}

/// Replaces every search block in `result` with the items it produces.
pub fn expand_searches<C: BundleClient + ?Sized>(
    client: &C,
    worksheet_uuid: &str,
    result: &mut InterpretResult,
    limit: usize,
) -> Result<()> {
    let items = std::mem::take(&mut result.items);
    for item in items {
        match item {
            RenderedItem::Search(block) => {
                let found = interpret_search(client, worksheet_uuid, &block, limit)?;
                result.items.extend(found.items);
            }
            other => result.items.push(other),
        }
    }
    Ok(())
}
