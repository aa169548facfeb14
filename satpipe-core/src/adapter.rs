//! Staging adapter that lands heterogeneous inputs in the directory contract.
//!
//! Archive input is extracted across the staging root as-is; the stage
//! subdirectories are expected to already be named correctly inside the
//! archive, so no paths are remapped. Single-file input is copied into the
//! input stage under its original basename with its timestamps preserved.

use std::{
    fs::{self, File},
    io,
    path::Path,
};

use filetime::FileTime;
use tracing::{info, instrument};
use zip::ZipArchive;

use crate::{
    artifact::InputArtifact,
    error::{PipelineError, Result},
    staging::{Stage, StagingRoot},
};

/// Populates the staging contract from `artifact`.
///
/// # Errors
/// Returns [`PipelineError::Extraction`] when an archive is corrupt or
/// unreadable, and [`PipelineError::Copy`] when a single file cannot be read
/// or its destination cannot be written.
#[instrument(
    name = "adapter.stage_input",
    err,
    skip(artifact, root),
    fields(mode = artifact.mode_label(), dataset = %artifact.path().display(), root = %root.path().display()),
)]
pub fn stage_input(artifact: &InputArtifact, root: &StagingRoot) -> Result<()> {
    match artifact {
        InputArtifact::Archive(archive) => extract_archive(archive, root),
        InputArtifact::SingleFile(file) => copy_into_input_stage(file, root),
    }
}

fn extract_archive(archive: &Path, root: &StagingRoot) -> Result<()> {
    let extraction_error = |source| PipelineError::Extraction {
        archive: archive.to_path_buf(),
        source,
    };
    let file = File::open(archive).map_err(|source| extraction_error(source.into()))?;
    let mut zip = ZipArchive::new(file).map_err(extraction_error)?;
    let entries = zip.len();
    zip.extract(root.path()).map_err(extraction_error)?;
    info!(entries, "archive extracted");
    Ok(())
}

fn copy_into_input_stage(file: &Path, root: &StagingRoot) -> Result<()> {
    let input_dir = root.stage_dir(Stage::Input);
    let copy_error = |to: &Path, source| PipelineError::Copy {
        from: file.to_path_buf(),
        to: to.to_path_buf(),
        source,
    };
    fs::create_dir_all(&input_dir).map_err(|source| copy_error(&input_dir, source))?;
    let name = file.file_name().ok_or_else(|| {
        copy_error(
            &input_dir,
            io::Error::new(io::ErrorKind::InvalidInput, "dataset path has no file name"),
        )
    })?;
    let destination = input_dir.join(name);
    fs::copy(file, &destination).map_err(|source| copy_error(&destination, source))?;
    preserve_timestamps(file, &destination).map_err(|source| copy_error(&destination, source))?;
    info!(destination = %destination.display(), "input file staged");
    Ok(())
}

/// Carries the source's access and modification times onto the staged copy.
fn preserve_timestamps(from: &Path, to: &Path) -> io::Result<()> {
    let metadata = fs::metadata(from)?;
    filetime::set_file_times(
        to,
        FileTime::from_last_access_time(&metadata),
        FileTime::from_last_modification_time(&metadata),
    )
}
