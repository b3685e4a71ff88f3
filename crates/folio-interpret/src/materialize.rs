//! Second phase of rendering: fetching file-backed values.

use serde_json::Value;

use folio_core::client::BundleClient;
use folio_core::display::DisplayMode;

use crate::error::Result;
use crate::genpath::{TargetCache, interpret_file_genpath};
use crate::postprocess::apply_to_value;
use crate::render::{CellValue, InterpretResult, RenderedItem};

/// Resolves deferred values in table cells, record rows and `inline`
/// references, applying their post-processing.
///
/// `contents`, `image` and `html` references name whole files and stay
/// deferred. A value that cannot be fetched becomes `null`.
pub fn materialize<C: BundleClient + ?Sized>(
    client: &C,
    cache: &mut TargetCache,
    result: &mut InterpretResult,
) -> Result<()> {
    for item in &mut result.items {
        match item {
            RenderedItem::Table { rows, .. } => {
                for row in rows {
                    for cell in row.values_mut() {
                        resolve_cell(client, cache, cell)?;
                    }
                }
            }
            RenderedItem::Record { rows, .. } => {
                for row in rows {
                    resolve_cell(client, cache, &mut row.value)?;
                }
            }
            RenderedItem::Reference {
                display: DisplayMode::Inline,
                value,
                ..
            } => resolve_cell(client, cache, value)?,
            _ => {}
        }
    }
    Ok(())
}

fn resolve_cell<C: BundleClient + ?Sized>(
    client: &C,
    cache: &mut TargetCache,
    cell: &mut CellValue,
) -> Result<()> {
    let CellValue::Deferred(deferred) = cell else {
        return Ok(());
    };
    let value = match interpret_file_genpath(client, cache, &deferred.bundle_uuid, &deferred.genpath)? {
        Some(value) => apply_to_value(deferred.post.as_deref(), value),
        None => Value::Null,
    };
    *cell = CellValue::Value(value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::interpret_items;
    use crate::schema::SchemaRegistry;
    use crate::testing::{FakeClient, bundle};
    use folio_core::item::WorksheetItem;
    use folio_core::token::string_to_tokens;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn items(lines: &[&str], bundles: &[&str]) -> Vec<WorksheetItem> {
        let mut items: Vec<WorksheetItem> = lines
            .iter()
            .map(|l| WorksheetItem::Directive(string_to_tokens(l).unwrap()))
            .collect();
        items.extend(bundles.iter().map(|u| WorksheetItem::Bundle(bundle(u, "run", u))));
        items
    }

    fn client() -> FakeClient {
        FakeClient::new()
            .with_file("0x1", "stats", "train:\n  err: 0.12345\nsize: 3000\n")
            .with_file("0x2", "stats", "train:\n  err: 0.5\n")
            .with_file("0x1", "stdout", "hello\nworld\n")
    }

    #[test]
    fn table_cells_are_fetched_once_per_file() {
        let client = client();
        let mut result = interpret_items(
            &mut SchemaRegistry::with_defaults(),
            items(
                &[
                    "schema s",
                    "add name",
                    "add err /stats:train/err %.2f",
                    "add size /stats:size size",
                    "display table s",
                ],
                &["0x1", "0x2"],
            ),
        )
        .unwrap();
        let mut cache = TargetCache::new();
        materialize(&client, &mut cache, &mut result).unwrap();

        let RenderedItem::Table { rows, .. } = &result.items[0] else {
            panic!("expected table");
        };
        assert_eq!(rows[0]["err"], json!("0.12").into());
        assert_eq!(rows[0]["size"], json!("2.9k").into());
        assert_eq!(rows[1]["err"], json!("0.50").into());
        assert_eq!(rows[1]["size"], CellValue::null());
        assert_eq!(client.fetch_count(), 2);
    }

    #[test]
    fn records_and_inline_references_are_resolved() {
        let client = client();
        let mut result = interpret_items(
            &mut SchemaRegistry::with_defaults(),
            items(&["schema s", "add e /stats:train/err", "display record s"], &["0x1"]),
        )
        .unwrap();
        let mut inline = interpret_items(
            &mut SchemaRegistry::with_defaults(),
            items(&["display inline /stats:train/err"], &["0x2"]),
        )
        .unwrap();
        result.items.append(&mut inline.items);

        let mut cache = TargetCache::new();
        materialize(&client, &mut cache, &mut result).unwrap();
        let RenderedItem::Record { rows, .. } = &result.items[0] else {
            panic!("expected record");
        };
        assert_eq!(rows[0].value, json!(0.12345).into());
        let RenderedItem::Reference { value, .. } = &result.items[1] else {
            panic!("expected reference");
        };
        assert_eq!(value, &json!(0.5).into());
    }

    #[test]
    fn contents_references_stay_deferred() {
        let client = client();
        let mut result = interpret_items(
            &mut SchemaRegistry::with_defaults(),
            items(&["display contents /stdout"], &["0x1"]),
        )
        .unwrap();
        let mut cache = TargetCache::new();
        materialize(&client, &mut cache, &mut result).unwrap();
        let RenderedItem::Reference { value, .. } = &result.items[0] else {
            panic!("expected reference");
        };
        assert!(value.is_deferred());
        assert_eq!(client.fetch_count(), 0);
    }
}
