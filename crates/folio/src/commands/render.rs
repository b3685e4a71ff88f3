//! `folio render` -- interpret a worksheet source file.

use std::fs;
use std::io::{self, Read};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::debug;

use folio_interpret::{
    InterpretResult, SchemaRegistry, TargetCache, expand_searches, hydrate_items, interpret_items,
    materialize, parse_worksheet_form,
};

use crate::cli::RenderArgs;
use crate::context::RuntimeContext;
use crate::output::{output_json, output_result};

/// JSON shape of a rendered worksheet.
#[derive(Serialize)]
struct RenderView<'a> {
    #[serde(flatten)]
    result: &'a InterpretResult,
    commands: &'a [Vec<String>],
}

/// Execute the `folio render` command.
pub fn run(ctx: &RuntimeContext, args: &RenderArgs) -> Result<()> {
    let source = read_source(args)?;
    let lines: Vec<&str> = source.lines().collect();

    let store = ctx.open_store()?;
    let worksheet_uuid = ctx.context_worksheet(&store, args.worksheet.as_deref())?;

    let form = parse_worksheet_form(&lines, &store, &worksheet_uuid)?;
    let items = hydrate_items(&store, form.items)?;
    let mut schemas = SchemaRegistry::with_defaults();
    let mut result = interpret_items(&mut schemas, items)?;

    if !args.no_search {
        expand_searches(&store, &worksheet_uuid, &mut result, ctx.config.search_limit)?;
    }
    if !args.no_fetch {
        let mut cache = TargetCache::with_max_lines(ctx.config.max_lines);
        materialize(&store, &mut cache, &mut result)?;
        debug!(files = cache.len(), "fetched bundle files");
    }

    if ctx.json {
        output_json(&RenderView {
            result: &result,
            commands: &form.commands,
        });
    } else {
        output_result(&result, &form.commands);
    }
    Ok(())
}

fn read_source(args: &RenderArgs) -> Result<String> {
    if args.file.as_os_str() == "-" {
        let mut source = String::new();
        io::stdin()
            .read_to_string(&mut source)
            .context("failed to read worksheet from stdin")?;
        return Ok(source);
    }
    fs::read_to_string(&args.file).with_context(|| format!("failed to read {}", args.file.display()))
}
