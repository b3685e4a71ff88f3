//! `folio tokens` -- show how a directive line splits into tokens.

use anyhow::Result;
use serde_json::json;

use folio_core::token::{string_to_tokens, tokens_to_string};

use crate::cli::TokensArgs;
use crate::context::RuntimeContext;
use crate::output::output_json;

/// Execute the `folio tokens` command.
pub fn run(ctx: &RuntimeContext, args: &TokensArgs) -> Result<()> {
    let tokens = string_to_tokens(&args.string)?;
    let serialized = tokens_to_string(&tokens);

    if ctx.json {
        output_json(&json!({ "tokens": tokens, "serialized": serialized }));
    } else {
        for token in &tokens {
            println!("{}", token);
        }
        println!("=> {}", serialized);
    }
    Ok(())
}
