//! In-memory metadata reader and factories for resolution tests.

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
};

use crate::{
    metadata::{
        identity::{AssemblyIdentity, AssemblyVersion},
        reader::{AssemblyMetadata, AssemblyMetadataReader},
    },
    Error, Result,
};

/// Serves [`AssemblyMetadata`] registered by path and counts every read.
///
/// Paths that are not registered fail like unreadable files. The files themselves must still
/// exist on disk (see [`touch`]) because the resolver probes the file system before reading.
#[derive(Default)]
pub struct MockReader {
    assemblies: Mutex<HashMap<PathBuf, AssemblyMetadata>>,
    reads: AtomicUsize,
}

impl MockReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `metadata` for `path` and create an empty file there.
    pub fn add(&self, path: &Path, metadata: AssemblyMetadata) {
        touch(path);
        self.assemblies
            .lock()
            .unwrap()
            .insert(path.to_path_buf(), metadata);
    }

    /// Total number of `read` calls, including failed ones.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

impl AssemblyMetadataReader for MockReader {
    fn read(&self, path: &Path) -> Result<AssemblyMetadata> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.assemblies
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| Error::Error(format!("No metadata for {}", path.display())))
    }
}

/// Creates an identity with a culture-neutral, unsigned name.
pub fn create_test_identity(name: &str, version: &str) -> AssemblyIdentity {
    AssemblyIdentity::new(name, AssemblyVersion::parse(version).unwrap())
}

/// Creates metadata for `name` referencing each of `references` as `(name, version)`.
pub fn create_metadata(name: &str, version: &str, references: &[(&str, &str)]) -> AssemblyMetadata {
    AssemblyMetadata {
        identity: create_test_identity(name, version),
        module_name: format!("{}.dll", name),
        references: references
            .iter()
            .map(|(name, version)| create_test_identity(name, version))
            .collect(),
        custom_attributes: Vec::new(),
    }
}

/// Create an empty file, and its parent directories.
pub fn touch(path: &Path) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, b"").unwrap();
}
