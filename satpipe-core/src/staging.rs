//! On-disk staging contract shared with the external segmentation process.
//!
//! A run owns one [`StagingRoot`] directory holding four fixed [`Stage`]
//! subdirectories. The external process reads from the input stage and writes
//! to the output stage; everything else in this crate addresses the layout
//! through these types rather than through ambient paths.

use std::{
    fmt, fs,
    path::{Path, PathBuf},
};

use crate::error::{PipelineError, Result};

/// One of the four fixed-purpose subdirectories under a [`StagingRoot`].
///
/// # Examples
/// ```
/// use satpipe_core::Stage;
///
/// assert_eq!(Stage::Input.dir_name(), "02_input_SAT");
/// assert_eq!(Stage::ALL.len(), 4);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Raw uploads as received.
    Original,
    /// Downsampled intermediates.
    Subsampled,
    /// Files the segmentation process consumes.
    Input,
    /// Files the segmentation process produces.
    Output,
}

impl Stage {
    /// Every stage in its fixed on-disk order.
    pub const ALL: [Self; 4] = [Self::Original, Self::Subsampled, Self::Input, Self::Output];

    /// Returns the directory name of this stage under the staging root.
    #[must_use]
    pub const fn dir_name(self) -> &'static str {
        match self {
            Self::Original => "00_original",
            Self::Subsampled => "01_subsampled",
            Self::Input => "02_input_SAT",
            Self::Output => "03_output_SAT",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Root directory under which all stages live for one run.
///
/// Created once per run and retained afterwards for inspection. The value is
/// always absolute and is passed explicitly to every component so no code has
/// to assume anything about the ambient working directory.
///
/// # Examples
/// ```
/// use satpipe_core::{Stage, StagingRoot};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let dir = tempfile::tempdir()?;
/// let root = StagingRoot::create(dir.path())?;
/// assert!(root.stage_dir(Stage::Input).ends_with("02_input_SAT"));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagingRoot {
    path: PathBuf,
}

impl StagingRoot {
    /// Creates the staging root directory if absent and returns a handle to
    /// its absolute path.
    ///
    /// # Errors
    /// Returns [`PipelineError::StagingRootCreation`] when the directory
    /// cannot be created or resolved.
    pub fn create(path: impl Into<PathBuf>) -> Result<Self> {
        let requested = path.into();
        fs::create_dir_all(&requested).map_err(|source| PipelineError::StagingRootCreation {
            path: requested.clone(),
            source,
        })?;
        let path = requested
            .canonicalize()
            .map_err(|source| PipelineError::StagingRootCreation {
                path: requested,
                source,
            })?;
        Ok(Self { path })
    }

    /// Returns the absolute root path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the absolute directory of `stage` under this root.
    #[must_use]
    pub fn stage_dir(&self, stage: Stage) -> PathBuf {
        self.path.join(stage.dir_name())
    }

    /// Creates the output stage directory. Idempotent: an existing stage is
    /// left untouched.
    ///
    /// # Errors
    /// Returns [`PipelineError::StagingRootCreation`] when the directory
    /// cannot be created.
    pub fn ensure_output_stage(&self) -> Result<()> {
        let dir = self.stage_dir(Stage::Output);
        fs::create_dir_all(&dir)
            .map_err(|source| PipelineError::StagingRootCreation { path: dir, source })
    }

    /// Confirms the input stage exists and holds at least one entry.
    ///
    /// This gate decides whether segmentation runs at all: callers must abort
    /// without invoking the external process when it fails.
    ///
    /// # Errors
    /// Returns [`PipelineError::ContractViolation`] when the input stage is
    /// missing, unreadable, or empty.
    pub fn require_input_stage(&self) -> Result<()> {
        let violation = || PipelineError::ContractViolation {
            stage: Stage::Input,
            root: self.path.clone(),
        };
        let mut entries = fs::read_dir(self.stage_dir(Stage::Input)).map_err(|_| violation())?;
        if entries.next().is_none() {
            return Err(violation());
        }
        Ok(())
    }
}
