//! Error types for the satpipe core library.
//!
//! Defines error enums exposed by the public API and a convenient result alias.

use std::{fmt, io, path::PathBuf, process::ExitStatus};

use thiserror::Error;
use zip::result::ZipError;

use crate::staging::Stage;

macro_rules! define_error_codes {
    (
        $(#[$enum_meta:meta])*
        enum $CodeTy:ident for $ErrTy:ident {
            $(
                $(#[$variant_meta:meta])*
                $CodeVariant:ident => $ErrVariant:ident $( { $($pattern:tt)* } )? => $code:expr
            ),+ $(,)?
        }
    ) => {
        $(#[$enum_meta])*
        #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
        #[non_exhaustive]
        pub enum $CodeTy {
            $(
                $(#[$variant_meta])*
                $CodeVariant,
            )+
        }

        impl $CodeTy {
            /// Return the stable machine-readable representation of this error code.
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$CodeVariant => $code,)+
                }
            }
        }

        impl fmt::Display for $CodeTy {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl $ErrTy {
            #[doc = concat!(
                "Retrieve the stable [`",
                stringify!($CodeTy),
                "`] for this error."
            )]
            pub const fn code(&self) -> $CodeTy {
                match self {
                    $(Self::$ErrVariant $( { $($pattern)* } )? => $CodeTy::$CodeVariant,)+
                }
            }
        }
    };
}

/// An error produced while invoking a [`crate::Segmenter`].
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum SegmenterError {
    /// The external process could not be started.
    #[error("failed to spawn `{entry_point}`: {source}")]
    Spawn {
        /// Entry point that could not be started.
        entry_point: PathBuf,
        /// Underlying operating system error.
        #[source]
        source: io::Error,
    },
    /// The external process ran but exited unsuccessfully.
    #[error("`{entry_point}` exited with {status}")]
    NonZeroExit {
        /// Entry point whose invocation failed.
        entry_point: PathBuf,
        /// Exit status reported by the operating system.
        status: ExitStatus,
    },
}

define_error_codes! {
    /// Stable codes describing [`SegmenterError`] variants.
    enum SegmenterErrorCode for SegmenterError {
        /// The external process could not be started.
        Spawn => Spawn { .. } => "SEGMENTER_SPAWN_FAILED",
        /// The external process ran but exited unsuccessfully.
        NonZeroExit => NonZeroExit { .. } => "SEGMENTER_NONZERO_EXIT",
    }
}

/// Error type produced when staging inputs or running a [`crate::Pipeline`].
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The dataset path does not exist or is not a regular file.
    #[error("input file not found: `{path}`")]
    InputNotFound {
        /// Dataset path supplied by the caller.
        path: PathBuf,
    },
    /// The dataset path matches neither supported input type.
    #[error("input file `{path}` is neither a packaged archive nor a point-cloud file")]
    UnrecognizedInput {
        /// Dataset path supplied by the caller.
        path: PathBuf,
    },
    /// The staging root or one of its stage directories could not be created.
    #[error("failed to create staging directory `{path}`: {source}")]
    StagingRootCreation {
        /// Directory that could not be created.
        path: PathBuf,
        /// Underlying operating system error.
        #[source]
        source: io::Error,
    },
    /// The packaged archive could not be read or extracted.
    #[error("failed to extract `{archive}`: {source}")]
    Extraction {
        /// Archive whose extraction failed.
        archive: PathBuf,
        /// Underlying archive error.
        #[source]
        source: ZipError,
    },
    /// The single input file could not be copied into the input stage.
    #[error("failed to copy `{from}` to `{to}`: {source}")]
    Copy {
        /// Source file that could not be copied.
        from: PathBuf,
        /// Destination the copy was meant to land at.
        to: PathBuf,
        /// Underlying operating system error.
        #[source]
        source: io::Error,
    },
    /// A required stage was absent or empty after staging.
    #[error("staging contract violated: stage `{stage}` under `{root}` is absent or empty")]
    ContractViolation {
        /// Stage whose contract was not met.
        stage: Stage,
        /// Staging root that was inspected.
        root: PathBuf,
    },
    /// The external segmentation step failed.
    #[error("segmenter `{segmenter}` failed: {error}")]
    Segmentation {
        /// Name of the segmenter that failed.
        segmenter: String,
        #[source]
        /// Underlying segmenter error bubbled up by the orchestrator.
        error: SegmenterError,
    },
    /// The results archive could not be written.
    #[error("failed to write results archive `{archive}`: {source}")]
    Packaging {
        /// Archive whose creation failed.
        archive: PathBuf,
        /// Underlying archive error.
        #[source]
        source: ZipError,
    },
}

define_error_codes! {
    /// Stable codes describing [`PipelineError`] variants.
    enum PipelineErrorCode for PipelineError {
        /// The dataset path does not exist or is not a regular file.
        InputNotFound => InputNotFound { .. } => "SATPIPE_INPUT_NOT_FOUND",
        /// The dataset path matches neither supported input type.
        UnrecognizedInput => UnrecognizedInput { .. } => "SATPIPE_UNRECOGNIZED_INPUT",
        /// The staging root or one of its stage directories could not be created.
        StagingRootCreation => StagingRootCreation { .. } => "SATPIPE_STAGING_ROOT_CREATION_FAILED",
        /// The packaged archive could not be read or extracted.
        Extraction => Extraction { .. } => "SATPIPE_EXTRACTION_FAILED",
        /// The single input file could not be copied into the input stage.
        Copy => Copy { .. } => "SATPIPE_COPY_FAILED",
        /// A required stage was absent or empty after staging.
        ContractViolation => ContractViolation { .. } => "SATPIPE_STAGING_CONTRACT_VIOLATION",
        /// The external segmentation step failed.
        Segmentation => Segmentation { .. } => "SATPIPE_SEGMENTATION_PROCESS_FAILURE",
        /// The results archive could not be written.
        Packaging => Packaging { .. } => "SATPIPE_PACKAGING_FAILED",
    }
}

impl PipelineError {
    /// Retrieve the inner [`SegmenterErrorCode`] when the error originated in a [`crate::Segmenter`].
    pub const fn segmenter_code(&self) -> Option<SegmenterErrorCode> {
        match self {
            Self::Segmentation { error, .. } => Some(error.code()),
            _ => None,
        }
    }
}

/// Convenient alias for results returned by the core API.
pub type Result<T> = core::result::Result<T, PipelineError>;
