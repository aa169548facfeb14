//! Satpipe core library.
//!
//! Orchestrates a point-cloud segmentation run: a dataset (packaged archive
//! or single point-cloud file) is staged into a fixed directory contract, an
//! external segmentation process is invoked against it, and the results are
//! normalised into one deliverable whose shape matches the input mode.

mod adapter;
mod artifact;
mod builder;
mod error;
mod normalizer;
mod pipeline;
mod segmenter;
mod staging;
#[cfg(test)]
mod test_utils;

pub use crate::{
    adapter::stage_input,
    artifact::{InputArtifact, LogFileFlag, ResultArtifact},
    builder::PipelineBuilder,
    error::{PipelineError, PipelineErrorCode, Result, SegmenterError, SegmenterErrorCode},
    normalizer::{
        ARCHIVE_FILE_NAME, CANONICAL_OUTPUT_NAME, FINAL_RESULTS_DIR, deliver_single_output,
        package_stages,
    },
    pipeline::{Pipeline, RunReport, RunWarning},
    segmenter::{
        DEFAULT_ENTRY_POINT, ENABLE_LOG_FILE_ENV, ProcessSegmenter, SHARED_FOLDER_ENV, Segmenter,
    },
    staging::{Stage, StagingRoot},
};
