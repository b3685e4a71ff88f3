//! `folio lines` -- print a stored worksheet in editable form.

use anyhow::Result;

use folio_core::client::BundleClient;
use folio_interpret::{hydrate_items, worksheet_lines};

use crate::cli::LinesArgs;
use crate::context::RuntimeContext;
use crate::output::output_json;

/// Execute the `folio lines` command.
pub fn run(ctx: &RuntimeContext, args: &LinesArgs) -> Result<()> {
    let store = ctx.open_store()?;
    let uuid = store.resolve_worksheet_uuid("", &args.worksheet)?;

    let mut worksheet = store.get_worksheet_info(&uuid)?;
    worksheet.items = hydrate_items(&store, worksheet.items)?;
    let lines = worksheet_lines(&worksheet);

    if ctx.json {
        output_json(&lines);
    } else {
        for line in &lines {
            println!("{}", line);
        }
    }
    Ok(())
}
