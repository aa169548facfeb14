//! Command implementations and argument parsing for the satpipe CLI.

use std::io::{self, Write};
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use satpipe_core::{
    LogFileFlag, PipelineBuilder, PipelineError, ProcessSegmenter, ResultArtifact, RunReport,
};
use thiserror::Error;
use tracing::{Span, field, info, instrument};

/// Exit code reported when the dataset path does not exist.
pub const EXIT_INPUT_NOT_FOUND: u8 = 2;

/// Exit code reported when the dataset path has an unsupported extension.
pub const EXIT_UNRECOGNIZED_INPUT: u8 = 3;

/// Exit code reported for every other failure.
pub const EXIT_FAILURE: u8 = 1;

/// Top-level CLI options parsed by [`clap`].
#[derive(Debug, Parser, Clone)]
#[command(name = "satpipe", about = "Run the point-cloud segmentation pipeline.")]
pub struct Cli {
    /// Command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported CLI commands.
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Stage a dataset, run segmentation, and package the results.
    Run(RunCommand),
}

/// Options accepted by the `run` command.
#[derive(Debug, Args, Clone)]
pub struct RunCommand {
    /// Input dataset: a packaged archive (`.zip`) or a single point-cloud
    /// file (`.las`/`.laz`).
    #[arg(long = "dataset-path")]
    pub dataset_path: PathBuf,

    /// Directory the run is staged under; created if absent and retained
    /// afterwards for inspection.
    #[arg(long = "output-dir")]
    pub output_dir: PathBuf,

    /// Textual flag exported to the segmentation process as
    /// `ENABLE_LOG_FILE`; accepts `true` or `false`, case-insensitively.
    #[arg(
        long = "enable-log-file",
        default_value = "false",
        value_parser = parse_log_flag,
    )]
    pub enable_log_file: LogFileFlag,
}

/// Errors surfaced while executing CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// The current working directory could not be resolved for delivery.
    #[error("failed to resolve the current working directory: {source}")]
    CurrentDir {
        /// Underlying operating system error.
        #[source]
        source: io::Error,
    },
    /// Pipeline execution failed.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

/// Summarises the outcome of executing a CLI command.
#[derive(Debug, Clone)]
pub struct ExecutionSummary {
    /// Dataset the run was executed for.
    pub dataset: PathBuf,
    /// Report produced by the pipeline.
    pub report: RunReport,
}

/// Maps `err` to the process exit code documented for it.
///
/// Missing datasets and unrecognised dataset types get distinct codes so
/// wrapping automation can tell them apart; everything else is a generic
/// failure.
#[must_use]
pub fn exit_code(err: &CliError) -> u8 {
    match err {
        CliError::Pipeline(PipelineError::InputNotFound { .. }) => EXIT_INPUT_NOT_FOUND,
        CliError::Pipeline(PipelineError::UnrecognizedInput { .. }) => EXIT_UNRECOGNIZED_INPUT,
        CliError::Pipeline(_) | CliError::CurrentDir { .. } => EXIT_FAILURE,
    }
}

/// Executes the CLI command represented by `cli`.
///
/// # Errors
/// Returns [`CliError`] when the working directory cannot be resolved or the
/// pipeline aborts.
#[instrument(
    name = "cli.run",
    err,
    skip(cli),
    fields(command = field::Empty),
)]
pub fn run_cli(cli: Cli) -> Result<ExecutionSummary, CliError> {
    match cli.command {
        Command::Run(run) => {
            Span::current().record("command", field::display("run"));
            run_command(run)
        }
    }
}

#[instrument(
    name = "cli.execute",
    err,
    skip(command),
    fields(dataset = field::Empty, output_dir = field::Empty, enable_log_file = field::Empty),
)]
pub(super) fn run_command(command: RunCommand) -> Result<ExecutionSummary, CliError> {
    let RunCommand {
        dataset_path,
        output_dir,
        enable_log_file,
    } = command;
    let span = Span::current();
    span.record("dataset", field::display(dataset_path.display()));
    span.record("output_dir", field::display(output_dir.display()));
    span.record("enable_log_file", field::display(enable_log_file.as_str()));

    // The ambient working directory is resolved once here at the edge; the
    // core takes the delivery directory explicitly.
    let delivery_dir = std::env::current_dir().map_err(|source| CliError::CurrentDir { source })?;
    let pipeline = PipelineBuilder::new(output_dir, delivery_dir)
        .with_log_file(enable_log_file)
        .build();
    let report = pipeline.run(&dataset_path, &ProcessSegmenter::new())?;

    info!(
        warnings = report.warnings().len(),
        elapsed_ms = report.elapsed().as_millis(),
        "command completed"
    );
    Ok(ExecutionSummary {
        dataset: dataset_path,
        report,
    })
}

/// Parses the raw `--enable-log-file` text, keeping it verbatim.
pub(super) fn parse_log_flag(raw: &str) -> Result<LogFileFlag, String> {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("true") || trimmed.eq_ignore_ascii_case("false") {
        Ok(LogFileFlag::new(raw))
    } else {
        Err(format!("expected `true` or `false`, got `{raw}`"))
    }
}

/// Renders `summary` to `writer` in a human-readable text format.
///
/// # Errors
/// Returns [`io::Error`] if writing to the supplied writer fails.
///
/// # Examples
/// ```
/// # use std::error::Error;
/// # use std::time::Duration;
/// # use satpipe_cli::cli::{ExecutionSummary, render_summary};
/// # use satpipe_core::{ResultArtifact, RunReport};
/// #
/// # fn main() -> Result<(), Box<dyn Error>> {
/// let summary = ExecutionSummary {
///     dataset: "survey.zip".into(),
///     report: RunReport::new(
///         ResultArtifact::PackagedArchive {
///             path: "processed_files.zip".into(),
///             entries: 3,
///         },
///         Vec::new(),
///         Duration::from_millis(1500),
///     ),
/// };
/// let mut buffer = Vec::new();
/// render_summary(&summary, &mut buffer)?;
/// let text = String::from_utf8(buffer)?;
/// assert!(text.contains("mode: archive"));
/// # Ok(())
/// # }
/// ```
pub fn render_summary(summary: &ExecutionSummary, mut writer: impl Write) -> io::Result<()> {
    writeln!(writer, "dataset: {}", summary.dataset.display())?;
    match summary.report.artifact() {
        ResultArtifact::PackagedArchive { path, entries } => {
            writeln!(writer, "mode: archive")?;
            writeln!(writer, "deliverable: {} ({entries} entries)", path.display())?;
        }
        ResultArtifact::SingleOutput {
            delivered: Some(path),
        } => {
            writeln!(writer, "mode: single-file")?;
            writeln!(writer, "deliverable: {}", path.display())?;
        }
        ResultArtifact::SingleOutput { delivered: None } => {
            writeln!(writer, "mode: single-file")?;
            writeln!(writer, "deliverable: none")?;
        }
    }
    for warning in summary.report.warnings() {
        writeln!(writer, "warning: {warning}")?;
    }
    writeln!(
        writer,
        "elapsed: {:.3}s",
        summary.report.elapsed().as_secs_f64()
    )?;
    Ok(())
}
