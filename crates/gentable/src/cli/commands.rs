//! CLI command definitions.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Generative Table execution core: schema validation, batch planning, and
/// process bootstrap for the row-generation engine.
#[derive(Parser, Debug)]
#[command(name = "gentable")]
#[command(about = "Generative Table execution core", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Enable debug-level logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate a table schema (TOML) against invariants 1-5 and print its
    /// column-graph levels (spec §4.A).
    Validate {
        /// Path to a TOML file deserializing to a `gentable_core::Schema`.
        schema: PathBuf,
    },

    /// Compute the batch planner's `(column_batch, row_batch)` decision for
    /// a schema and a hypothetical request (spec §4.B).
    Plan {
        /// Path to a TOML file deserializing to a `gentable_core::Schema`.
        schema: PathBuf,

        /// Per-request cell budget `C`.
        #[arg(long, default_value_t = gentable_core::DEFAULT_CELL_BUDGET)]
        budget: u32,

        /// Number of output columns that need generation for this request.
        #[arg(long)]
        to_generate: usize,

        /// Whether independent columns/rows may be dispatched concurrently.
        #[arg(long, default_value_t = true)]
        concurrent: bool,

        /// Whether the request targets a multi-turn Chat column.
        #[arg(long, default_value_t = false)]
        multi_turn: bool,
    },

    /// Bootstrap every backend (providers, storage, sandbox, quota, usage
    /// flusher) and idle until interrupted. No HTTP surface is started —
    /// routing is out of scope for this engine (spec §1).
    Serve,
}
