//! `folio` -- worksheet rendering CLI.
//!
//! Parses CLI arguments with clap, resolves the runtime context (config and
//! store location), and dispatches to command handlers.

mod cli;
mod commands;
mod context;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use context::RuntimeContext;

const VERBOSE_FILTER: &str = "folio=debug,folio_interpret=debug,folio_store=debug";

fn main() {
    let cli = Cli::parse();

    let ctx = match RuntimeContext::from_global_args(&cli.global) {
        Ok(ctx) => ctx,
        Err(e) => fail(cli.global.json, e),
    };

    // Without -v the configured filter applies; a bad filter falls back to warn.
    let filter = if ctx.verbose {
        EnvFilter::new(VERBOSE_FILTER)
    } else {
        EnvFilter::try_new(&ctx.config.log).unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Some(Commands::Render(args)) => commands::render::run(&ctx, &args),
        Some(Commands::Lines(args)) => commands::lines::run(&ctx, &args),
        Some(Commands::Search(args)) => commands::search::run(&ctx, &args),
        Some(Commands::Tokens(args)) => commands::tokens::run(&ctx, &args),
        None => {
            use clap::CommandFactory;
            Cli::command().print_help().ok();
            println!();
            Ok(())
        }
    };

    if let Err(e) = result {
        fail(ctx.json, e);
    }
}

fn fail(json: bool, e: anyhow::Error) -> ! {
    if json {
        let err_json = serde_json::json!({ "error": format!("{:#}", e) });
        eprintln!(
            "{}",
            serde_json::to_string_pretty(&err_json).unwrap_or_else(|_| format!("{:#}", e))
        );
    } else {
        eprintln!("Error: {:#}", e);
    }
    std::process::exit(1);
}
