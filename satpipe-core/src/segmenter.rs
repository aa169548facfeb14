//! Segmentation invoker seam.
//!
//! The segmentation algorithm is an opaque external program. [`Segmenter`]
//! abstracts its invocation so orchestration can be exercised in tests
//! without launching real processes; [`ProcessSegmenter`] is the production
//! implementation that runs the packaged entry point as a child process.

use std::{
    path::{Path, PathBuf},
    process::Command,
};

use tracing::{info, instrument};

use crate::{artifact::LogFileFlag, error::SegmenterError, staging::StagingRoot};

/// Environment variable carrying the absolute staging root path.
pub const SHARED_FOLDER_ENV: &str = "SHARED_FOLDER_PATH";

/// Environment variable carrying the raw log-enable flag.
pub const ENABLE_LOG_FILE_ENV: &str = "ENABLE_LOG_FILE";

/// Entry point of the packaged segmentation process.
pub const DEFAULT_ENTRY_POINT: &str = "/src/main.sh";

/// Abstraction over the external segmentation step.
///
/// Implementations read from the input stage and write results to the output
/// stage under `root`, blocking until the step has finished.
pub trait Segmenter {
    /// Returns a human-readable name used in logs and error reports.
    fn name(&self) -> &str;

    /// Runs segmentation against `root`.
    ///
    /// # Errors
    /// Returns [`SegmenterError`] when the step cannot be started or finishes
    /// unsuccessfully.
    fn segment(&self, root: &StagingRoot, log_file: &LogFileFlag) -> Result<(), SegmenterError>;
}

/// Launches the packaged segmentation script as a child process.
///
/// The child runs with its working directory at the filesystem root and the
/// staging contract communicated through [`SHARED_FOLDER_ENV`] and
/// [`ENABLE_LOG_FILE_ENV`], merged over the inherited environment. Stdout and
/// stderr pass straight through to the invoking process; nothing is captured
/// or buffered.
///
/// The child's exit status is inspected: a non-zero exit surfaces as
/// [`SegmenterError::NonZeroExit`] and aborts the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessSegmenter {
    entry_point: PathBuf,
}

impl ProcessSegmenter {
    /// Creates a segmenter for the packaged entry point.
    #[must_use]
    pub fn new() -> Self {
        Self::with_entry_point(DEFAULT_ENTRY_POINT)
    }

    /// Creates a segmenter for an alternative entry point.
    #[must_use]
    pub fn with_entry_point(entry_point: impl Into<PathBuf>) -> Self {
        Self {
            entry_point: entry_point.into(),
        }
    }

    /// Returns the configured entry point.
    #[must_use]
    pub fn entry_point(&self) -> &Path {
        &self.entry_point
    }
}

impl Default for ProcessSegmenter {
    fn default() -> Self {
        Self::new()
    }
}

impl Segmenter for ProcessSegmenter {
    fn name(&self) -> &str {
        "process"
    }

    #[instrument(
        name = "segmenter.process",
        err,
        skip(self, root, log_file),
        fields(entry_point = %self.entry_point.display(), root = %root.path().display()),
    )]
    fn segment(&self, root: &StagingRoot, log_file: &LogFileFlag) -> Result<(), SegmenterError> {
        let status = Command::new("bash")
            .arg(&self.entry_point)
            .current_dir("/")
            .env(SHARED_FOLDER_ENV, root.path())
            .env(ENABLE_LOG_FILE_ENV, log_file.as_str())
            .status()
            .map_err(|source| SegmenterError::Spawn {
                entry_point: self.entry_point.clone(),
                source,
            })?;
        if !status.success() {
            return Err(SegmenterError::NonZeroExit {
                entry_point: self.entry_point.clone(),
                status,
            });
        }
        info!("segmentation completed");
        Ok(())
    }
}
