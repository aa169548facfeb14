//! Shared helpers for unit tests.

use std::{
    fs::{self, File},
    io::{self, Write},
    path::{Path, PathBuf},
    sync::atomic::{AtomicUsize, Ordering},
};

use tempfile::TempDir;
use zip::{ZipWriter, write::SimpleFileOptions};

use crate::{
    artifact::LogFileFlag,
    error::SegmenterError,
    segmenter::Segmenter,
    staging::StagingRoot,
};

pub(crate) fn temp_dir() -> TempDir {
    match TempDir::new() {
        Ok(dir) => dir,
        Err(err) => panic!("failed to create temp dir: {err}"),
    }
}

/// Creates a staging root under `workspace` populated with the given
/// root-relative files, creating parent directories as needed.
pub(crate) fn populated_root(workspace: &Path, files: &[(&str, &[u8])]) -> StagingRoot {
    let root = match StagingRoot::create(workspace.join("staging")) {
        Ok(root) => root,
        Err(err) => panic!("failed to create staging root: {err}"),
    };
    for (relative, contents) in files {
        let path = root.path().join(relative);
        if let Some(parent) = path.parent() {
            if let Err(err) = fs::create_dir_all(parent) {
                panic!("failed to create {}: {err}", parent.display());
            }
        }
        if let Err(err) = fs::write(&path, contents) {
            panic!("failed to write {}: {err}", path.display());
        }
    }
    root
}

/// Writes a zip archive at `path` holding the given entries.
pub(crate) fn write_archive(path: &Path, entries: &[(&str, &[u8])]) {
    let file = match File::create(path) {
        Ok(file) => file,
        Err(err) => panic!("failed to create {}: {err}", path.display()),
    };
    let mut writer = ZipWriter::new(file);
    for (name, contents) in entries {
        if let Err(err) = writer.start_file(*name, SimpleFileOptions::default()) {
            panic!("failed to start entry {name}: {err}");
        }
        if let Err(err) = writer.write_all(contents) {
            panic!("failed to write entry {name}: {err}");
        }
    }
    if let Err(err) = writer.finish() {
        panic!("failed to finish archive: {err}");
    }
}

/// Stub segmenter that counts invocations and optionally writes files into
/// the staging root before reporting the configured outcome.
pub(crate) struct CountingSegmenter {
    invocations: AtomicUsize,
    outputs: Vec<(PathBuf, Vec<u8>)>,
    fail: bool,
}

impl CountingSegmenter {
    /// A stub that succeeds without touching the staging root.
    pub(crate) fn succeeding() -> Self {
        Self {
            invocations: AtomicUsize::new(0),
            outputs: Vec::new(),
            fail: false,
        }
    }

    /// A stub that fails as if the external process could not be spawned.
    pub(crate) fn failing() -> Self {
        Self {
            invocations: AtomicUsize::new(0),
            outputs: Vec::new(),
            fail: true,
        }
    }

    /// A stub that succeeds after writing `outputs` (root-relative) into the
    /// staging root.
    pub(crate) fn writing(outputs: Vec<(PathBuf, Vec<u8>)>) -> Self {
        Self {
            invocations: AtomicUsize::new(0),
            outputs,
            fail: false,
        }
    }

    pub(crate) fn invocations(&self) -> usize {
        self.invocations.load(Ordering::Relaxed)
    }
}

impl Segmenter for CountingSegmenter {
    fn name(&self) -> &str {
        "counting-stub"
    }

    fn segment(&self, root: &StagingRoot, _log_file: &LogFileFlag) -> Result<(), SegmenterError> {
        self.invocations.fetch_add(1, Ordering::Relaxed);
        if self.fail {
            return Err(SegmenterError::Spawn {
                entry_point: PathBuf::from("counting-stub"),
                source: io::Error::new(io::ErrorKind::NotFound, "stub configured to fail"),
            });
        }
        for (relative, contents) in &self.outputs {
            let path = root.path().join(relative);
            if let Some(parent) = path.parent() {
                if let Err(err) = fs::create_dir_all(parent) {
                    panic!("failed to create {}: {err}", parent.display());
                }
            }
            if let Err(err) = fs::write(&path, contents) {
                panic!("failed to write {}: {err}", path.display());
            }
        }
        Ok(())
    }
}
