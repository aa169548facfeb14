//! Input and result artifact unions.
//!
//! A run handles exactly one [`InputArtifact`] variant, chosen solely by the
//! dataset path's extension, and produces the matching [`ResultArtifact`]
//! variant. Modelling both as sum types keeps the staging and packaging
//! logic free of mode flags threaded through call chains.

use std::path::{Path, PathBuf};

use crate::error::{PipelineError, Result};

/// Extensions recognised as packaged-archive input.
const ARCHIVE_EXTENSIONS: [&str; 1] = ["zip"];

/// Extensions recognised as single point-cloud input.
const POINT_CLOUD_EXTENSIONS: [&str; 2] = ["las", "laz"];

/// Dataset accepted for one run.
///
/// # Examples
/// ```
/// use std::path::Path;
/// use satpipe_core::InputArtifact;
///
/// let artifact = InputArtifact::classify(Path::new("survey.ZIP"))?;
/// assert!(matches!(artifact, InputArtifact::Archive(_)));
/// # Ok::<(), satpipe_core::PipelineError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputArtifact {
    /// A packaged archive whose extraction populates some or all stages.
    Archive(PathBuf),
    /// A single point-cloud file copied verbatim into the input stage.
    SingleFile(PathBuf),
}

impl InputArtifact {
    /// Classifies `path` by its extension.
    ///
    /// Classification is a pure, total function of the path suffix,
    /// case-insensitively: `.zip` is archive input, `.las` and `.laz` are
    /// single-file input, and everything else is rejected. Whether the path
    /// exists is the orchestrator's concern, checked separately.
    ///
    /// # Errors
    /// Returns [`PipelineError::UnrecognizedInput`] for any other suffix,
    /// including paths without one.
    pub fn classify(path: &Path) -> Result<Self> {
        let unrecognized = || PipelineError::UnrecognizedInput {
            path: path.to_path_buf(),
        };
        let extension = path
            .extension()
            .and_then(|raw| raw.to_str())
            .map(str::to_ascii_lowercase)
            .ok_or_else(unrecognized)?;
        if ARCHIVE_EXTENSIONS.contains(&extension.as_str()) {
            Ok(Self::Archive(path.to_path_buf()))
        } else if POINT_CLOUD_EXTENSIONS.contains(&extension.as_str()) {
            Ok(Self::SingleFile(path.to_path_buf()))
        } else {
            Err(unrecognized())
        }
    }

    /// Returns the dataset path carried by either variant.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Archive(path) | Self::SingleFile(path) => path,
        }
    }

    /// Returns a short label for the run mode, used in spans and summaries.
    #[must_use]
    pub const fn mode_label(&self) -> &'static str {
        match self {
            Self::Archive(_) => "archive",
            Self::SingleFile(_) => "single-file",
        }
    }
}

/// Deliverable produced by a completed run.
///
/// The variant always matches the [`InputArtifact`] variant the run started
/// from; the two are never mixed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultArtifact {
    /// Archive-mode deliverable: a zip of every staged tree.
    PackagedArchive {
        /// Where the archive was written.
        path: PathBuf,
        /// Number of file entries the archive holds.
        entries: usize,
    },
    /// Single-file-mode deliverable: the canonically named output file.
    SingleOutput {
        /// Where the canonical file was delivered, or `None` when zero or
        /// several candidates were found and the run finished with a warning.
        delivered: Option<PathBuf>,
    },
}

/// Raw textual log-enable flag handed through to the external process.
///
/// The flag travels verbatim into the `ENABLE_LOG_FILE` environment variable;
/// [`LogFileFlag::enabled`] reads it case-insensitively for decisions made on
/// this side of the process boundary.
///
/// # Examples
/// ```
/// use satpipe_core::LogFileFlag;
///
/// let flag = LogFileFlag::new("True");
/// assert_eq!(flag.as_str(), "True");
/// assert!(flag.enabled());
/// assert!(!LogFileFlag::default().enabled());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFileFlag {
    raw: String,
}

impl LogFileFlag {
    /// Wraps the raw textual flag.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    /// Returns the flag exactly as supplied.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns whether the flag reads as `true`, case-insensitively.
    #[must_use]
    pub fn enabled(&self) -> bool {
        self.raw.trim().eq_ignore_ascii_case("true")
    }
}

impl Default for LogFileFlag {
    fn default() -> Self {
        Self::new("false")
    }
}
