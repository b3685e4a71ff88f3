//! The interpretation pass: a single walk over the worksheet items.
//!
//! Consecutive bundle items are buffered. Any other item first flushes the
//! buffer, rendering it according to the current display mode, and is then
//! handled itself. Directives update the schema registry and the display
//! mode for the rest of the pass.

use std::collections::BTreeMap;

use tracing::debug;

use folio_core::bundle::BundleInfo;
use folio_core::display::{DirectiveVerb, DisplayMode, DisplaySpec};
use folio_core::item::WorksheetItem;

use crate::error::{InterpretError, Result};
use crate::genpath::{interpret_genpath, is_file_genpath};
use crate::postprocess::apply_func;
use crate::render::{CellValue, InterpretResult, RecordRow, RenderedItem, SearchBlock};
use crate::schema::{SchemaRegistry, canonicalize_schema_item};

/// Schema used by `record` and `table` when the display names none.
const DEFAULT_SCHEMA: &str = "default";

/// Interprets a sequence of (hydrated) worksheet items.
///
/// `schemas` is mutated by `schema`, `addschema` and `add` directives and
/// keeps those changes after the call returns.
///
/// Any usage error aborts the whole pass; no partial result is returned.
pub fn interpret_items(
    schemas: &mut SchemaRegistry,
    items: impl IntoIterator<Item = WorksheetItem>,
) -> Result<InterpretResult> {
    let mut pass = Pass::new(schemas);
    for item in items {
        pass.step(item)?;
    }
    pass.flush()?;
    Ok(pass.result)
}

/// Per-pass state.
struct Pass<'a> {
    schemas: &'a mut SchemaRegistry,
    /// Name of the schema `add`/`addschema` append to.
    current_schema: Option<String>,
    display: DisplaySpec,
    bundles: Vec<BundleInfo>,
    result: InterpretResult,
}

impl<'a> Pass<'a> {
    fn new(schemas: &'a mut SchemaRegistry) -> Self {
        Self {
            schemas,
            current_schema: None,
            display: DisplaySpec::default(),
            bundles: Vec::new(),
            result: InterpretResult::default(),
        }
    }

    fn step(&mut self, item: WorksheetItem) -> Result<()> {
        match item {
            WorksheetItem::Bundle(info) => self.bundles.push(info),
            WorksheetItem::Worksheet(worksheet) => {
                self.flush()?;
                self.emit(RenderedItem::Worksheet { worksheet });
            }
            WorksheetItem::Markup(text) => {
                self.flush()?;
                self.emit(RenderedItem::Markup { text });
            }
            WorksheetItem::Directive(tokens) => {
                self.flush()?;
                self.directive(tokens)?;
            }
        }
        Ok(())
    }

    fn emit(&mut self, item: RenderedItem) {
        self.result.items.push(item);
    }

    fn directive(&mut self, tokens: Vec<String>) -> Result<()> {
        let Some(first) = tokens.first() else {
            return Ok(());
        };
        let verb = DirectiveVerb::parse(first)
            .ok_or_else(|| InterpretError::usage(format!("unknown directive: {first}")))?;
        debug!(?verb, args = ?&tokens[1..], "directive");

        match verb {
            DirectiveVerb::Comment => {}
            DirectiveVerb::Title => {
                self.result.title = Some(arg(&tokens, "title")?.to_string());
            }
            DirectiveVerb::Schema => {
                let name = arg(&tokens, "schema")?;
                self.schemas.reset(name);
                self.current_schema = Some(name.to_string());
            }
            DirectiveVerb::AddSchema => {
                let name = arg(&tokens, "addschema")?;
                let target = self.current_target("addschema")?;
                let items = self.schemas.require(name)?.clone();
                self.schemas.extend(&target, items);
            }
            DirectiveVerb::Add => {
                let item = canonicalize_schema_item(&tokens[1..])?;
                let target = self.current_target("add")?;
                self.schemas.extend(&target, [item]);
            }
            DirectiveVerb::Display => {
                self.display = DisplaySpec::new(tokens[1..].iter().cloned());
            }
            DirectiveVerb::Search => {
                let block = SearchBlock {
                    keywords: tokens[1..].to_vec(),
                    display: self.display.clone(),
                    schemas: self.schemas.clone(),
                };
                self.emit(RenderedItem::Search(block));
            }
        }
        Ok(())
    }

    fn current_target(&self, verb: &str) -> Result<String> {
        self.current_schema
            .clone()
            .ok_or_else(|| InterpretError::usage(format!("{verb}: no schema defined (use `schema <name>` first)")))
    }

    /// Renders the buffered bundles under the current display mode.
    ///
    /// The buffer is emptied even when rendering fails.
    fn flush(&mut self) -> Result<()> {
        if self.bundles.is_empty() {
            return Ok(());
        }
        let bundles = std::mem::take(&mut self.bundles);
        let mode_name = self.display.mode().unwrap_or_default();
        let mode = DisplayMode::parse(mode_name)
            .ok_or_else(|| InterpretError::usage(format!("unknown display mode: {mode_name:?}")))?;
        debug!(%mode, bundles = bundles.len(), "flush");

        match mode {
            DisplayMode::Hidden => {}
            DisplayMode::Inline | DisplayMode::Contents | DisplayMode::Image | DisplayMode::Html => {
                let genpath = self
                    .display
                    .args()
                    .first()
                    .cloned()
                    .ok_or_else(|| InterpretError::usage(format!("display {mode}: missing genpath")))?;
                if !is_file_genpath(&genpath) {
                    return Err(InterpretError::usage(format!(
                        "display {mode}: expected a file genpath, got {genpath}"
                    )));
                }
                for bundle in bundles {
                    let value = interpret_genpath(&bundle, &genpath);
                    self.emit(RenderedItem::Reference {
                        display: mode,
                        value,
                        bundle,
                    });
                }
            }
            DisplayMode::Record => {
                let schema = self.schemas.require(self.schema_name())?.clone();
                for bundle in bundles {
                    let rows: Vec<RecordRow> = schema
                        .iter()
                        .map(|col| RecordRow {
                            key: format!("{}:", col.name),
                            value: apply_func(col.post.as_deref(), interpret_genpath(&bundle, &col.genpath)),
                        })
                        .collect();
                    self.emit(RenderedItem::Record {
                        header: ("key".to_string(), "value".to_string()),
                        rows,
                        bundle,
                    });
                }
            }
            DisplayMode::Table => {
                let schema = self.schemas.require(self.schema_name())?;
                let header: Vec<String> = schema.iter().map(|col| col.name.clone()).collect();
                let rows: Vec<BTreeMap<String, CellValue>> = bundles
                    .iter()
                    .map(|bundle| {
                        schema
                            .iter()
                            .map(|col| {
                                let value: CellValue = interpret_genpath(bundle, &col.genpath);
                                (col.name.clone(), apply_func(col.post.as_deref(), value))
                            })
                            .collect()
                    })
                    .collect();
                self.emit(RenderedItem::Table {
                    header,
                    rows,
                    bundles,
                });
            }
        }
        Ok(())
    }

    fn schema_name(&self) -> &str {
        self.display
            .args()
            .first()
            .map_or(DEFAULT_SCHEMA, String::as_str)
    }
}

/// The first argument of a directive.
fn arg<'t>(tokens: &'t [String], verb: &str) -> Result<&'t str> {
    tokens
        .get(1)
        .map(String::as_str)
        .ok_or_else(|| InterpretError::usage(format!("{verb}: missing argument")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::DeferredValue;
    use crate::schema::SchemaItem;
    use crate::testing::{bundle, dep};
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};

    fn directive(line: &str) -> WorksheetItem {
        WorksheetItem::Directive(folio_core::token::string_to_tokens(line).unwrap())
    }

    fn b(uuid: &str, name: &str) -> WorksheetItem {
        let mut info = bundle(uuid, "run", name);
        info.state = "ready".into();
        info.metadata.insert("created".into(), json!(0));
        info.metadata.insert("data_size".into(), json!(2048));
        WorksheetItem::Bundle(info)
    }

    fn md(text: &str) -> WorksheetItem {
        WorksheetItem::Markup(text.into())
    }

    fn run(items: Vec<WorksheetItem>) -> Result<InterpretResult> {
        interpret_items(&mut SchemaRegistry::with_defaults(), items)
    }

    fn modes(result: &InterpretResult) -> Vec<&'static str> {
        result
            .items
            .iter()
            .map(|item| match item {
                RenderedItem::Markup { .. } => "markup",
                RenderedItem::Reference { .. } => "reference",
                RenderedItem::Record { .. } => "record",
                RenderedItem::Table { .. } => "table",
                RenderedItem::Worksheet { .. } => "worksheet",
                RenderedItem::Search(_) => "search",
            })
            .collect()
    }

    #[test]
    fn default_display_is_default_table() {
        let result = run(vec![b("0x1", "run1"), b("0x2", "run2")]).unwrap();
        let RenderedItem::Table { header, rows, bundles } = &result.items[0] else {
            panic!("expected table");
        };
        assert_eq!(result.items.len(), 1);
        assert_eq!(bundles.len(), 2);
        insta::assert_yaml_snapshot!(json!({ "header": header, "rows": rows }), @r#"
        header:
          - name
          - bundle_type
          - created
          - data_size
          - state
        rows:
          - bundle_type: run
            created: "1970-01-01 00:00:00"
            data_size: 2k
            name: run1
            state: ready
          - bundle_type: run
            created: "1970-01-01 00:00:00"
            data_size: 2k
            name: run2
            state: ready
        "#);
    }

    #[test]
    fn markup_splits_bundle_groups() {
        let result = run(vec![b("0x1", "a"), md("hi"), b("0x2", "b")]).unwrap();
        assert_eq!(modes(&result), ["table", "markup", "table"]);
        for item in [&result.items[0], &result.items[2]] {
            let RenderedItem::Table { rows, bundles, .. } = item else {
                panic!("expected table");
            };
            assert_eq!(rows.len(), 1);
            assert_eq!(bundles.len(), 1);
        }
    }

    #[test]
    fn hidden_discards_the_group() {
        let result = run(vec![directive("display hidden"), b("0x1", "a"), b("0x2", "b")]).unwrap();
        assert!(result.items.is_empty());

        let result = run(vec![
            directive("display hidden"),
            b("0x1", "a"),
            directive("display table"),
            md("x"),
        ])
        .unwrap();
        assert_eq!(modes(&result), ["markup"]);
    }

    #[test]
    fn unknown_directive_aborts() {
        let err = run(vec![md("before"), directive("plot x y")]).unwrap_err();
        assert!(err.is_usage());
        assert_eq!(err.to_string(), "unknown directive: plot");
    }

    #[test]
    fn unknown_display_mode_fails_only_on_flush() {
        assert!(run(vec![directive("display graph"), md("x")]).is_ok());
        let err = run(vec![directive("display graph"), b("0x1", "a")]).unwrap_err();
        assert!(err.is_usage());
        let err = run(vec![directive("display"), b("0x1", "a")]).unwrap_err();
        assert!(err.is_usage());
    }

    #[test]
    fn comments_and_title() {
        let result = run(vec![
            directive("%% just a note"),
            directive("%note"),
            directive("%%"),
            WorksheetItem::Directive(vec![]),
            directive("title first"),
            directive("title \"second title\""),
        ])
        .unwrap();
        assert!(result.items.is_empty());
        assert_eq!(result.title.as_deref(), Some("second title"));
        assert!(run(vec![directive("title")]).unwrap_err().is_usage());
    }

    #[test]
    fn custom_schema_in_table() {
        let result = run(vec![
            directive("schema s1"),
            directive("add name"),
            directive("add err /stats:errorRate %.3f"),
            directive("display table s1"),
            b("0x1", "run1"),
        ])
        .unwrap();
        let RenderedItem::Table { header, rows, .. } = &result.items[0] else {
            panic!("expected table");
        };
        assert_eq!(header, &["name", "err"]);
        assert_eq!(rows[0]["name"], CellValue::Value(json!("run1")));
        let mut deferred = DeferredValue::new("0x1", "/stats:errorRate");
        deferred.post = Some("%.3f".into());
        assert_eq!(rows[0]["err"], CellValue::Deferred(deferred));
    }

    #[test]
    fn schema_directives_mutate_the_callers_registry() {
        let mut schemas = SchemaRegistry::with_defaults();
        interpret_items(
            &mut schemas,
            vec![directive("schema mine"), directive("addschema dataset"), directive("add time")],
        )
        .unwrap();
        let names: Vec<_> = schemas.get("mine").unwrap().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["name", "created", "data_size", "time"]);
    }

    #[test]
    fn add_needs_an_active_schema_and_valid_arity() {
        assert!(run(vec![directive("add name")]).unwrap_err().is_usage());
        assert!(run(vec![directive("addschema run")]).unwrap_err().is_usage());
        let err = run(vec![directive("schema s"), directive("add a b c d")]).unwrap_err();
        assert!(err.is_usage());
        let err = run(vec![directive("schema s"), directive("addschema nope")]).unwrap_err();
        assert!(err.is_usage());
    }

    #[test]
    fn record_mode_renders_one_item_per_bundle() {
        let result = run(vec![
            directive("schema s"),
            directive("add name"),
            directive("add size data_size size"),
            directive("display record s"),
            b("0x1", "a"),
            b("0x2", "b"),
        ])
        .unwrap();
        assert_eq!(modes(&result), ["record", "record"]);
        let RenderedItem::Record { header, rows, bundle } = &result.items[1] else {
            panic!("expected record");
        };
        assert_eq!(header, &("key".to_string(), "value".to_string()));
        assert_eq!(bundle.uuid, "0x2");
        assert_eq!(
            rows,
            &vec![
                RecordRow { key: "name:".into(), value: json!("b").into() },
                RecordRow { key: "size:".into(), value: json!("2k").into() },
            ]
        );
    }

    #[test]
    fn record_without_schema_uses_default() {
        let result = run(vec![directive("display record"), b("0x1", "a")]).unwrap();
        let RenderedItem::Record { rows, .. } = &result.items[0] else {
            panic!("expected record");
        };
        assert_eq!(rows.len(), 5);
    }

    #[test]
    fn reference_modes_need_a_file_genpath() {
        let result = run(vec![directive("display contents /stdout"), b("0x1", "a"), b("0x2", "b")]).unwrap();
        assert_eq!(modes(&result), ["reference", "reference"]);
        let RenderedItem::Reference { display, value, .. } = &result.items[0] else {
            panic!("expected reference");
        };
        assert_eq!(*display, DisplayMode::Contents);
        assert_eq!(value, &CellValue::Deferred(DeferredValue::new("0x1", "/stdout")));

        let err = run(vec![directive("display inline command"), b("0x1", "a")]).unwrap_err();
        assert!(err.is_usage());
        let err = run(vec![directive("display image"), b("0x1", "a")]).unwrap_err();
        assert!(err.is_usage());
    }

    #[test]
    fn search_snapshots_display_and_schemas() {
        let result = run(vec![
            b("0x1", "a"),
            directive("schema s"),
            directive("add name"),
            directive("display table s"),
            directive("search type=run owner"),
            directive("add state"),
        ])
        .unwrap();
        assert_eq!(modes(&result), ["table", "search"]);
        let RenderedItem::Search(block) = &result.items[1] else {
            panic!("expected search");
        };
        assert_eq!(block.keywords, ["type=run", "owner"]);
        assert_eq!(block.display, DisplaySpec::new(["table", "s"]));
        assert_eq!(block.schemas.get("s").unwrap(), &vec![SchemaItem::new("name", "name", None)]);
    }

    #[test]
    fn worksheet_items_render_as_is() {
        let ws = folio_core::worksheet::SubworksheetInfo {
            uuid: "0xw".into(),
            name: "other".into(),
        };
        let result = run(vec![b("0x1", "a"), WorksheetItem::Worksheet(ws.clone())]).unwrap();
        assert_eq!(modes(&result), ["table", "worksheet"]);
        assert_eq!(result.items[1], RenderedItem::Worksheet { worksheet: ws });
    }

    #[test]
    fn dependency_columns() {
        let mut info = bundle("0x1", "run", "r");
        info.dependencies = vec![dep("a", "0xa", "", "run1"), dep("b", "0xb", "", "run2")];
        let result = run(vec![
            directive("schema s"),
            directive("add dependencies"),
            directive("add first dependencies/a"),
            directive("add missing"),
            directive("display table s"),
            WorksheetItem::Bundle(info),
        ])
        .unwrap();
        let RenderedItem::Table { rows, .. } = &result.items[0] else {
            panic!("expected table");
        };
        assert_eq!(rows[0]["dependencies"], json!("run1,run2").into());
        assert_eq!(rows[0]["first"], json!("run1").into());
        assert_eq!(rows[0]["missing"], CellValue::Value(Value::Null));
    }
}
