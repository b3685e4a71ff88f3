//! Clap CLI definitions for the `folio` command.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// folio -- render worksheets against a bundle store.
#[derive(Parser, Debug)]
#[command(
    name = "folio",
    about = "Render worksheets against a bundle store",
    long_about = "Interprets worksheet source: resolves bundle references, applies display \
                  directives and schemas, replays saved searches and pulls values out of \
                  bundle files.",
    version,
    propagate_version = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Global flags available to all subcommands.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Store directory (default: from .folio/config.yaml, else .folio itself).
    #[arg(long, global = true, value_name = "DIR")]
    pub store: Option<PathBuf>,

    /// Output in JSON format.
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable verbose/debug output.
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,
}

/// All available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Interpret a worksheet source file and print the result.
    Render(RenderArgs),

    /// Print the editable source form of a stored worksheet.
    Lines(LinesArgs),

    /// Run an ad-hoc search and render the matching bundles.
    Search(SearchArgs),

    /// Tokenize a string and print it back in serialized form.
    Tokens(TokensArgs),
}

/// Arguments for `folio render`.
#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Worksheet source file (`-` for stdin).
    pub file: PathBuf,

    /// Worksheet used to resolve bundle names (default: config `worksheet`).
    #[arg(short = 'w', long, value_name = "SPEC")]
    pub worksheet: Option<String>,

    /// Leave file-backed values unfetched.
    #[arg(long)]
    pub no_fetch: bool,

    /// Leave `% search` blocks unexpanded.
    #[arg(long)]
    pub no_search: bool,
}

/// Arguments for `folio lines`.
#[derive(Args, Debug)]
pub struct LinesArgs {
    /// Worksheet uuid, uuid prefix or name.
    pub worksheet: String,
}

/// Arguments for `folio search`.
#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Search keywords (`key=value` or bare words).
    #[arg(required = true, num_args = 1..)]
    pub keywords: Vec<String>,

    /// Worksheet the search runs from (default: config `worksheet`).
    #[arg(short = 'w', long, value_name = "SPEC")]
    pub worksheet: Option<String>,

    /// Display tokens for the hits, e.g. "record default".
    #[arg(short = 'd', long, value_name = "TOKENS", default_value = "table default")]
    pub display: String,
}

/// Arguments for `folio tokens`.
#[derive(Args, Debug)]
pub struct TokensArgs {
    /// The string to tokenize.
    pub string: String,
}
