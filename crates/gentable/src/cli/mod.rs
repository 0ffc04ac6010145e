//! Command-line interface module.

mod commands;
mod schema_cmd;
mod serve;

pub use commands::{Cli, Commands};
pub use schema_cmd::{plan, validate};
pub use serve::serve;
