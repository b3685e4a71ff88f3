//! `folio search` -- render the bundles matching a live search.

use anyhow::Result;

use folio_core::display::DisplaySpec;
use folio_core::token::string_to_tokens;
use folio_interpret::{SchemaRegistry, SearchBlock, TargetCache, interpret_search, materialize};

use crate::cli::SearchArgs;
use crate::context::RuntimeContext;
use crate::output::{output_json, output_result};

/// Execute the `folio search` command.
pub fn run(ctx: &RuntimeContext, args: &SearchArgs) -> Result<()> {
    let store = ctx.open_store()?;
    let worksheet_uuid = ctx.context_worksheet(&store, args.worksheet.as_deref())?;

    let block = SearchBlock {
        keywords: args.keywords.clone(),
        display: DisplaySpec::new(string_to_tokens(&args.display)?),
        schemas: SchemaRegistry::with_defaults(),
    };
    let mut result = interpret_search(&store, &worksheet_uuid, &block, ctx.config.search_limit)?;
    let mut cache = TargetCache::with_max_lines(ctx.config.max_lines);
    materialize(&store, &mut cache, &mut result)?;

    if ctx.json {
        output_json(&result);
    } else if result.items.is_empty() {
        println!("No bundles found.");
    } else {
        output_result(&result, &[]);
    }
    Ok(())
}
