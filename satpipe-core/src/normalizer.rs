//! Output normalisation: one deliverable per run, shaped by the input mode.
//!
//! Archive-mode runs package every staged tree into a single zip. Single-file
//! runs promote the one file the segmentation process left under
//! `final_results` to a canonical name and deliver a copy of it. Non-fatal
//! conditions (missing stages, zero or ambiguous candidates) are recorded as
//! warnings on the run report rather than aborting the run.

use std::{
    fs::{self, File},
    io,
    path::{Path, PathBuf},
};

use tracing::{info, instrument, warn};
use walkdir::WalkDir;
use zip::{CompressionMethod, ZipWriter, result::ZipError, write::SimpleFileOptions};

use crate::{
    artifact::ResultArtifact,
    error::{PipelineError, Result},
    pipeline::RunWarning,
    staging::{Stage, StagingRoot},
};

/// File name of the archive-mode deliverable.
pub const ARCHIVE_FILE_NAME: &str = "processed_files.zip";

/// Subdirectory of the output stage holding finalised results.
pub const FINAL_RESULTS_DIR: &str = "final_results";

/// Canonical name given to the single-file-mode deliverable.
pub const CANONICAL_OUTPUT_NAME: &str = "segmented_pc.laz";

/// Extension expected on candidate single-file outputs.
const OUTPUT_EXTENSION: &str = "laz";

/// Extension of run logs collected into the archive root.
const LOG_EXTENSION: &str = "log";

/// Packages every staged tree into [`ARCHIVE_FILE_NAME`] under `delivery_dir`.
///
/// Stages are visited in their fixed order and each existing tree is walked
/// deterministically, so packaging an unchanged root twice yields the same
/// entries in the same order. Entry names are paths relative to the staging
/// root. Missing stages are skipped with a recorded warning. When
/// `include_logs` is set, `.log` files directly under the staging root are
/// added at the archive root.
///
/// # Errors
/// Returns [`PipelineError::Packaging`] when the archive cannot be opened for
/// writing or an entry cannot be added. The partially written archive handle
/// is dropped, and with it closed, on every failure path.
#[instrument(
    name = "normalizer.package_stages",
    err,
    skip(root, delivery_dir, warnings),
    fields(root = %root.path().display()),
)]
pub fn package_stages(
    root: &StagingRoot,
    delivery_dir: &Path,
    include_logs: bool,
    warnings: &mut Vec<RunWarning>,
) -> Result<ResultArtifact> {
    let archive_path = delivery_dir.join(ARCHIVE_FILE_NAME);
    let packaging_error = |source| PipelineError::Packaging {
        archive: archive_path.clone(),
        source,
    };
    let file = File::create(&archive_path).map_err(|source| packaging_error(source.into()))?;
    let mut writer = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut entries = 0_usize;
    for stage in Stage::ALL {
        let stage_dir = root.stage_dir(stage);
        if !stage_dir.is_dir() {
            warn!(stage = stage.dir_name(), "stage directory missing, skipping");
            warnings.push(RunWarning::MissingStage { stage });
            continue;
        }
        entries += add_tree(&mut writer, root, &stage_dir, options).map_err(packaging_error)?;
    }
    if include_logs {
        entries += add_root_logs(&mut writer, root, options).map_err(packaging_error)?;
    }
    writer.finish().map_err(packaging_error)?;

    info!(archive = %archive_path.display(), entries, "staging root packaged");
    Ok(ResultArtifact::PackagedArchive {
        path: archive_path,
        entries,
    })
}

/// Walks `dir` in sorted order and adds every file under its root-relative
/// entry name. Returns the number of entries added.
fn add_tree(
    writer: &mut ZipWriter<File>,
    root: &StagingRoot,
    dir: &Path,
    options: SimpleFileOptions,
) -> core::result::Result<usize, ZipError> {
    let mut added = 0_usize;
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        writer.start_file(entry_name(root, entry.path())?, options)?;
        let mut file = File::open(entry.path())?;
        io::copy(&mut file, writer)?;
        added += 1;
    }
    Ok(added)
}

/// Adds `.log` files sitting directly under the staging root at the archive
/// root. Returns the number of entries added.
fn add_root_logs(
    writer: &mut ZipWriter<File>,
    root: &StagingRoot,
    options: SimpleFileOptions,
) -> core::result::Result<usize, ZipError> {
    let mut logs: Vec<PathBuf> = fs::read_dir(root.path())?
        .collect::<io::Result<Vec<_>>>()?
        .into_iter()
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && has_extension(path, LOG_EXTENSION))
        .collect();
    logs.sort();

    for path in &logs {
        let name = path
            .file_name()
            .map(|raw| raw.to_string_lossy().into_owned())
            .ok_or_else(|| ZipError::Io(io::Error::other("log file has no file name")))?;
        writer.start_file(name, options)?;
        let mut file = File::open(path)?;
        io::copy(&mut file, writer)?;
    }
    Ok(logs.len())
}

/// Renders the archive entry name for `path`: its components relative to the
/// staging root, joined with forward slashes.
fn entry_name(root: &StagingRoot, path: &Path) -> core::result::Result<String, ZipError> {
    let relative = path
        .strip_prefix(root.path())
        .map_err(|source| ZipError::Io(io::Error::other(source)))?;
    let components: Vec<_> = relative
        .components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect();
    Ok(components.join("/"))
}

/// Finalises a single-file run.
///
/// Scans the output stage's [`FINAL_RESULTS_DIR`] for candidate `.laz` files.
/// Exactly one candidate is renamed in place to [`CANONICAL_OUTPUT_NAME`] and
/// a copy of it is delivered into `delivery_dir`, so the canonical file ends
/// up in both locations. Zero candidates, several candidates, or a failed
/// rename or copy leave the deliverable absent and record a warning; none of
/// these abort the run. With several candidates no guess is made about which
/// one is canonical, and the caller is left to resolve them manually.
#[instrument(
    name = "normalizer.deliver_single_output",
    skip(root, delivery_dir, warnings),
    fields(root = %root.path().display()),
)]
pub fn deliver_single_output(
    root: &StagingRoot,
    delivery_dir: &Path,
    warnings: &mut Vec<RunWarning>,
) -> ResultArtifact {
    let results_dir = root.stage_dir(Stage::Output).join(FINAL_RESULTS_DIR);
    let candidates = candidate_outputs(&results_dir);
    match candidates.as_slice() {
        [] => {
            warn!(results_dir = %results_dir.display(), "no candidate output file found");
            warnings.push(RunWarning::NoCandidateOutput);
            ResultArtifact::SingleOutput { delivered: None }
        }
        [candidate] => {
            let canonical = results_dir.join(CANONICAL_OUTPUT_NAME);
            let delivered = delivery_dir.join(CANONICAL_OUTPUT_NAME);
            match promote_candidate(candidate, &canonical, &delivered) {
                Ok(()) => {
                    info!(delivered = %delivered.display(), "single output delivered");
                    ResultArtifact::SingleOutput {
                        delivered: Some(delivered),
                    }
                }
                Err(source) => {
                    warn!(
                        candidate = %candidate.display(),
                        error = %source,
                        "failed to promote the candidate output",
                    );
                    warnings.push(RunWarning::DeliveryFailed {
                        path: candidate.clone(),
                    });
                    ResultArtifact::SingleOutput { delivered: None }
                }
            }
        }
        several => {
            warn!(
                count = several.len(),
                results_dir = %results_dir.display(),
                "multiple candidate output files found, resolve manually",
            );
            warnings.push(RunWarning::AmbiguousCandidateOutputs {
                count: several.len(),
            });
            ResultArtifact::SingleOutput { delivered: None }
        }
    }
}

/// Lists candidate output files in `results_dir`, sorted by path. An absent
/// or unreadable directory yields no candidates.
fn candidate_outputs(results_dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(results_dir) else {
        return Vec::new();
    };
    let mut candidates: Vec<PathBuf> = entries
        .filter_map(core::result::Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && has_extension(path, OUTPUT_EXTENSION))
        .collect();
    candidates.sort();
    candidates
}

fn promote_candidate(candidate: &Path, canonical: &Path, delivered: &Path) -> io::Result<()> {
    fs::rename(candidate, canonical)?;
    fs::copy(canonical, delivered)?;
    Ok(())
}

fn has_extension(path: &Path, expected: &str) -> bool {
    path.extension()
        .and_then(|raw| raw.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(expected))
}
