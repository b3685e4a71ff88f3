//! Command handlers, one module per subcommand.

pub mod lines;
pub mod render;
pub mod search;
pub mod tokens;
