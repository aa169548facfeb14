//! Builder for configuring pipeline runs.
//!
//! Collects the run-level configuration (staging root, delivery directory,
//! log flag) before constructing a [`Pipeline`].

use std::path::{Path, PathBuf};

use crate::{artifact::LogFileFlag, pipeline::Pipeline};

/// Configures and constructs [`Pipeline`] instances.
///
/// Both directories are taken explicitly: the staging root is where the run's
/// working tree lives, and the delivery directory is where the deliverable is
/// written. Callers that want the conventional behaviour pass their current
/// working directory as the delivery directory.
///
/// # Examples
/// ```
/// use satpipe_core::{LogFileFlag, PipelineBuilder};
///
/// let pipeline = PipelineBuilder::new("/data/run-0001", "/home/operator")
///     .with_log_file(LogFileFlag::new("true"))
///     .build();
/// assert!(pipeline.log_file().enabled());
/// ```
#[derive(Debug, Clone)]
pub struct PipelineBuilder {
    staging_root: PathBuf,
    delivery_dir: PathBuf,
    log_file: LogFileFlag,
}

impl PipelineBuilder {
    /// Creates a builder for a run staged under `staging_root` that delivers
    /// into `delivery_dir`.
    #[must_use]
    pub fn new(staging_root: impl Into<PathBuf>, delivery_dir: impl Into<PathBuf>) -> Self {
        Self {
            staging_root: staging_root.into(),
            delivery_dir: delivery_dir.into(),
            log_file: LogFileFlag::default(),
        }
    }

    /// Overrides the log-enable flag handed to the external process.
    #[must_use]
    pub fn with_log_file(mut self, log_file: LogFileFlag) -> Self {
        self.log_file = log_file;
        self
    }

    /// Returns the configured staging root path.
    #[must_use]
    pub fn staging_root(&self) -> &Path {
        &self.staging_root
    }

    /// Returns the configured delivery directory.
    #[must_use]
    pub fn delivery_dir(&self) -> &Path {
        &self.delivery_dir
    }

    /// Returns the configured log-enable flag.
    #[must_use]
    pub fn log_file(&self) -> &LogFileFlag {
        &self.log_file
    }

    /// Constructs the [`Pipeline`].
    #[must_use]
    pub fn build(self) -> Pipeline {
        Pipeline::new(self.staging_root, self.delivery_dir, self.log_file)
    }
}
