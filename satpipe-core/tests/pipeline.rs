//! End-to-end scenarios for the segmentation pipeline, driven through the
//! public API with stub segmenters standing in for the external process.

use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use tempfile::TempDir;
use zip::{ZipArchive, ZipWriter, write::SimpleFileOptions};

use satpipe_core::{
    ARCHIVE_FILE_NAME, CANONICAL_OUTPUT_NAME, FINAL_RESULTS_DIR, InputArtifact, LogFileFlag,
    Pipeline, PipelineBuilder, ResultArtifact, RunWarning, Segmenter, SegmenterError, Stage,
    StagingRoot,
};

/// Stub that completes without touching the staging root.
struct NoOpSegmenter;

impl Segmenter for NoOpSegmenter {
    fn name(&self) -> &str {
        "no-op"
    }

    fn segment(&self, _root: &StagingRoot, _log_file: &LogFileFlag) -> Result<(), SegmenterError> {
        Ok(())
    }
}

/// Stub that writes the given root-relative files, as the external process
/// would, then completes.
struct WritingSegmenter {
    outputs: Vec<(PathBuf, Vec<u8>)>,
}

impl Segmenter for WritingSegmenter {
    fn name(&self) -> &str {
        "writing"
    }

    fn segment(&self, root: &StagingRoot, _log_file: &LogFileFlag) -> Result<(), SegmenterError> {
        for (relative, contents) in &self.outputs {
            let path = root.path().join(relative);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).expect("output parent must be creatable");
            }
            fs::write(&path, contents).expect("output must be writable");
        }
        Ok(())
    }
}

#[test]
fn archive_with_only_an_input_stage_packages_exactly_that_file() {
    let workspace = temp_dir();
    let dataset = workspace.path().join("survey.zip");
    write_archive(&dataset, &[("02_input_SAT/tile.laz", b"points")]);
    let pipeline = pipeline_under(workspace.path());

    let report = pipeline
        .run(&dataset, &NoOpSegmenter)
        .expect("archive run must complete");

    let ResultArtifact::PackagedArchive { path, entries } = report.artifact() else {
        panic!("archive input must produce a packaged archive");
    };
    assert_eq!(*entries, 1);
    assert_eq!(path, &workspace.path().join(ARCHIVE_FILE_NAME));
    assert_eq!(archive_entry_names(path), vec!["02_input_SAT/tile.laz"]);
    // The two optional stages the archive omitted are warned about, nothing
    // more; the ensured (empty) output stage contributes no entries.
    assert_eq!(
        report.warnings(),
        &[
            RunWarning::MissingStage {
                stage: Stage::Original,
            },
            RunWarning::MissingStage {
                stage: Stage::Subsampled,
            },
        ],
    );
}

#[test]
fn single_file_run_delivers_the_renamed_output() {
    let workspace = temp_dir();
    let dataset = workspace.path().join("scan.laz");
    fs::write(&dataset, b"unsegmented points").expect("dataset must be written");
    let pipeline = pipeline_under(workspace.path());
    let segmenter = WritingSegmenter {
        outputs: vec![(
            Path::new(Stage::Output.dir_name())
                .join(FINAL_RESULTS_DIR)
                .join("a.laz"),
            b"segmented points".to_vec(),
        )],
    };

    let report = pipeline
        .run(&dataset, &segmenter)
        .expect("single-file run must complete");

    let delivered = workspace.path().join(CANONICAL_OUTPUT_NAME);
    assert_eq!(
        report.artifact(),
        &ResultArtifact::SingleOutput {
            delivered: Some(delivered.clone()),
        },
    );
    assert!(report.warnings().is_empty());
    // The canonical file exists both in the delivery directory and under
    // final_results, with the stub's output as its content.
    assert_eq!(
        fs::read(&delivered).expect("deliverable must exist"),
        b"segmented points",
    );
    let canonical_in_stage = workspace
        .path()
        .join("staging")
        .join(Stage::Output.dir_name())
        .join(FINAL_RESULTS_DIR)
        .join(CANONICAL_OUTPUT_NAME);
    assert_eq!(
        fs::read(canonical_in_stage).expect("canonical stage file must exist"),
        b"segmented points",
    );
}

#[test]
fn missing_dataset_aborts_without_creating_the_staging_root() {
    let workspace = temp_dir();
    let pipeline = pipeline_under(workspace.path());

    let err = pipeline
        .run(&workspace.path().join("nowhere.zip"), &NoOpSegmenter)
        .expect_err("missing dataset must abort");

    assert_eq!(err.code().as_str(), "SATPIPE_INPUT_NOT_FOUND");
    assert!(!workspace.path().join("staging").exists());
}

#[test]
fn packaged_archive_round_trips_the_stage_trees() {
    let workspace = temp_dir();
    let dataset = workspace.path().join("survey.zip");
    write_archive(
        &dataset,
        &[
            ("00_original/raw.las", b"raw bytes"),
            ("02_input_SAT/tile_a.laz", b"tile a"),
            ("02_input_SAT/nested/tile_b.laz", b"tile b"),
        ],
    );
    let pipeline = pipeline_under(workspace.path());

    let report = pipeline
        .run(&dataset, &NoOpSegmenter)
        .expect("archive run must complete");
    let ResultArtifact::PackagedArchive { path, .. } = report.artifact() else {
        panic!("archive input must produce a packaged archive");
    };

    // Extracting the deliverable under a fresh root reproduces the staged
    // trees byte for byte.
    let fresh = temp_dir();
    let file = File::open(path).expect("deliverable must open");
    let mut archive = ZipArchive::new(file).expect("deliverable must parse");
    archive
        .extract(fresh.path())
        .expect("deliverable must extract");
    for (relative, contents) in [
        ("00_original/raw.las", b"raw bytes".as_slice()),
        ("02_input_SAT/tile_a.laz", b"tile a".as_slice()),
        ("02_input_SAT/nested/tile_b.laz", b"tile b".as_slice()),
    ] {
        let staged = workspace.path().join("staging").join(relative);
        let extracted = fresh.path().join(relative);
        assert_eq!(
            fs::read(&extracted).expect("extracted file must exist"),
            fs::read(&staged).expect("staged file must exist"),
            "{relative} must round-trip",
        );
        assert_eq!(
            fs::read(extracted).expect("extracted file must exist"),
            contents,
        );
    }
}

#[test]
fn enabled_log_flag_collects_root_logs_into_the_archive() {
    let workspace = temp_dir();
    let dataset = workspace.path().join("survey.zip");
    write_archive(&dataset, &[("02_input_SAT/tile.laz", b"points")]);
    let pipeline = PipelineBuilder::new(workspace.path().join("staging"), workspace.path())
        .with_log_file(LogFileFlag::new("TRUE"))
        .build();
    let segmenter = WritingSegmenter {
        outputs: vec![(PathBuf::from("run.log"), b"log line".to_vec())],
    };

    let report = pipeline
        .run(&dataset, &segmenter)
        .expect("archive run must complete");

    let ResultArtifact::PackagedArchive { path, entries } = report.artifact() else {
        panic!("archive input must produce a packaged archive");
    };
    assert_eq!(*entries, 2);
    assert!(archive_entry_names(path).iter().any(|name| name == "run.log"));
}

#[test]
fn result_variant_always_matches_input_variant() {
    let workspace = temp_dir();

    let archive_dataset = workspace.path().join("survey.zip");
    write_archive(&archive_dataset, &[("02_input_SAT/tile.laz", b"points")]);
    let archive_pipeline =
        PipelineBuilder::new(workspace.path().join("archive-staging"), workspace.path()).build();
    let archive_report = archive_pipeline
        .run(&archive_dataset, &NoOpSegmenter)
        .expect("archive run must complete");
    assert!(matches!(
        archive_report.artifact(),
        ResultArtifact::PackagedArchive { .. },
    ));

    let single_dataset = workspace.path().join("scan.laz");
    fs::write(&single_dataset, b"points").expect("dataset must be written");
    let single_pipeline =
        PipelineBuilder::new(workspace.path().join("single-staging"), workspace.path()).build();
    let single_report = single_pipeline
        .run(&single_dataset, &NoOpSegmenter)
        .expect("single-file run must complete");
    assert!(matches!(
        single_report.artifact(),
        ResultArtifact::SingleOutput { .. },
    ));
}

#[test]
fn classification_is_total_over_inputs() {
    for (raw, expected) in [
        ("a.zip", Some("archive")),
        ("a.ZIP", Some("archive")),
        ("a.las", Some("single-file")),
        ("a.LAZ", Some("single-file")),
        ("a.e57", None),
        ("a", None),
    ] {
        let classified = InputArtifact::classify(Path::new(raw));
        match expected {
            Some(label) => assert_eq!(
                classified.expect("supported suffix must classify").mode_label(),
                label,
            ),
            None => {
                let err = classified.expect_err("unsupported suffix must be rejected");
                assert_eq!(err.code().as_str(), "SATPIPE_UNRECOGNIZED_INPUT");
            }
        }
    }
}

fn temp_dir() -> TempDir {
    match TempDir::new() {
        Ok(dir) => dir,
        Err(err) => panic!("failed to create temp dir: {err}"),
    }
}

fn pipeline_under(workspace: &Path) -> Pipeline {
    PipelineBuilder::new(workspace.join("staging"), workspace.to_path_buf()).build()
}

fn write_archive(path: &Path, entries: &[(&str, &[u8])]) {
    let file = File::create(path).expect("archive file must be created");
    let mut writer = ZipWriter::new(file);
    for (name, contents) in entries {
        writer
            .start_file(*name, SimpleFileOptions::default())
            .expect("entry must start");
        writer.write_all(contents).expect("entry must be written");
    }
    writer.finish().expect("archive must be finished");
}

fn archive_entry_names(path: &Path) -> Vec<String> {
    let file = File::open(path).expect("archive must open");
    let mut archive = ZipArchive::new(file).expect("archive must parse");
    (0..archive.len())
        .map(|index| {
            archive
                .by_index(index)
                .expect("entry must be readable")
                .name()
                .to_owned()
        })
        .collect()
}
