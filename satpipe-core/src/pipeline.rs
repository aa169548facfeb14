//! Pipeline orchestration for one segmentation run.
//!
//! Sequences the staging adapter, the layout gates, the segmentation invoker,
//! and the output normaliser. The run proceeds through input validation,
//! staging, segmentation, and packaging; any precondition failure aborts the
//! whole run, while the non-fatal conditions enumerated on [`RunWarning`] are
//! recorded and the run completes.

use std::{
    fmt,
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use tracing::{Span, field, info, instrument};

use crate::{
    adapter,
    artifact::{InputArtifact, LogFileFlag, ResultArtifact},
    error::{PipelineError, Result},
    normalizer,
    segmenter::Segmenter,
    staging::{Stage, StagingRoot},
};

/// Entry point for executing segmentation runs.
///
/// Constructed through [`crate::PipelineBuilder`]. One instance describes the
/// run-level configuration and can execute any number of runs, though the
/// staging layout assumes runs against the same root never overlap.
#[derive(Debug, Clone)]
pub struct Pipeline {
    staging_root: PathBuf,
    delivery_dir: PathBuf,
    log_file: LogFileFlag,
}

impl Pipeline {
    pub(crate) fn new(staging_root: PathBuf, delivery_dir: PathBuf, log_file: LogFileFlag) -> Self {
        Self {
            staging_root,
            delivery_dir,
            log_file,
        }
    }

    /// Returns the staging root path runs are staged under.
    #[must_use]
    pub fn staging_root(&self) -> &Path {
        &self.staging_root
    }

    /// Returns the directory deliverables are written into.
    #[must_use]
    pub fn delivery_dir(&self) -> &Path {
        &self.delivery_dir
    }

    /// Returns the log-enable flag handed to the external process.
    #[must_use]
    pub fn log_file(&self) -> &LogFileFlag {
        &self.log_file
    }

    /// Executes a full run for `dataset_path` using `segmenter`.
    ///
    /// The dataset is validated and classified, staged into the directory
    /// contract, segmented by the external step, and normalised into a
    /// deliverable matching the input mode. The staging root is left in
    /// place afterwards for inspection.
    ///
    /// # Errors
    /// Returns [`PipelineError::InputNotFound`] when the dataset path is not
    /// a regular file (before anything is created under the staging root),
    /// [`PipelineError::UnrecognizedInput`] for unsupported extensions, the
    /// staging taxonomy errors when the adapter fails,
    /// [`PipelineError::ContractViolation`] when the input stage is absent or
    /// empty after staging (the external process is never invoked then),
    /// [`PipelineError::Segmentation`] when the external step fails, and
    /// [`PipelineError::Packaging`] when the results archive cannot be
    /// written.
    pub fn run<S: Segmenter>(&self, dataset_path: &Path, segmenter: &S) -> Result<RunReport> {
        let started = Instant::now();
        let (artifact, warnings) = self.execute(dataset_path, segmenter)?;
        let elapsed = started.elapsed();
        info!(elapsed_ms = elapsed.as_millis(), "run completed");
        Ok(RunReport::new(artifact, warnings, elapsed))
    }

    #[instrument(
        name = "pipeline.run",
        err,
        skip(self, dataset_path, segmenter),
        fields(
            dataset = %dataset_path.display(),
            segmenter = segmenter.name(),
            mode = field::Empty,
        ),
    )]
    fn execute<S: Segmenter>(
        &self,
        dataset_path: &Path,
        segmenter: &S,
    ) -> Result<(ResultArtifact, Vec<RunWarning>)> {
        // Existence and classification come before any filesystem writes so a
        // bad dataset path leaves the requested staging location untouched.
        if !dataset_path.is_file() {
            return Err(PipelineError::InputNotFound {
                path: dataset_path.to_path_buf(),
            });
        }
        let input = InputArtifact::classify(dataset_path)?;
        Span::current().record("mode", field::display(input.mode_label()));

        let root = StagingRoot::create(&self.staging_root)?;
        adapter::stage_input(&input, &root)?;

        // The output stage is provisioned up front; the input gate decides
        // whether the external process runs at all.
        root.ensure_output_stage()?;
        root.require_input_stage()?;
        segmenter
            .segment(&root, &self.log_file)
            .map_err(|error| PipelineError::Segmentation {
                segmenter: segmenter.name().to_owned(),
                error,
            })?;

        let mut warnings = Vec::new();
        let artifact = match input {
            InputArtifact::Archive(_) => normalizer::package_stages(
                &root,
                &self.delivery_dir,
                self.log_file.enabled(),
                &mut warnings,
            )?,
            InputArtifact::SingleFile(_) => {
                normalizer::deliver_single_output(&root, &self.delivery_dir, &mut warnings)
            }
        };
        Ok((artifact, warnings))
    }
}

/// Outcome of a completed [`Pipeline::run`] invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    artifact: ResultArtifact,
    warnings: Vec<RunWarning>,
    elapsed: Duration,
}

impl RunReport {
    /// Builds a report from its parts.
    #[must_use]
    pub fn new(artifact: ResultArtifact, warnings: Vec<RunWarning>, elapsed: Duration) -> Self {
        Self {
            artifact,
            warnings,
            elapsed,
        }
    }

    /// Returns the deliverable the run produced.
    #[must_use]
    pub fn artifact(&self) -> &ResultArtifact {
        &self.artifact
    }

    /// Returns the non-fatal conditions recorded while the run completed.
    #[must_use]
    pub fn warnings(&self) -> &[RunWarning] {
        &self.warnings
    }

    /// Returns the wall-clock duration of the run.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }
}

/// Non-fatal condition recorded while a run completes.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunWarning {
    /// A stage directory was absent while packaging and was skipped.
    MissingStage {
        /// Stage that was not found on disk.
        stage: Stage,
    },
    /// No candidate output file was found for a single-file run.
    NoCandidateOutput,
    /// Several candidate output files were found; none was chosen.
    AmbiguousCandidateOutputs {
        /// How many candidates were found.
        count: usize,
    },
    /// The candidate output could not be renamed or copied into place.
    DeliveryFailed {
        /// Candidate that could not be promoted.
        path: PathBuf,
    },
}

impl fmt::Display for RunWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingStage { stage } => {
                write!(f, "stage `{stage}` was missing and was skipped")
            }
            Self::NoCandidateOutput => f.write_str("no candidate output file was found"),
            Self::AmbiguousCandidateOutputs { count } => {
                write!(f, "{count} candidate output files found, resolve manually")
            }
            Self::DeliveryFailed { path } => {
                write!(f, "candidate output `{}` could not be delivered", path.display())
            }
        }
    }
}
