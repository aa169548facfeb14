//! Command-line interface orchestration for the satpipe pipeline runner.
//!
//! The CLI offers a single `run` command that stages a dataset, invokes the
//! external segmentation process, and reports the deliverable.

mod commands;

pub use commands::{
    Cli, CliError, Command, ExecutionSummary, RunCommand, exit_code, render_summary, run_cli,
};
