//! Locating the file of a requested assembly.

use std::path::{Path, PathBuf};

use crate::{
    metadata::{
        identity::AssemblyIdentity,
        reader::{AssemblyMetadata, AssemblyMetadataReader},
    },
    resolution::options::ResolverOptions,
};

/// Store folders probed below each system store root, in order.
const SYSTEM_STORE_FOLDERS: [&str; 4] = ["GAC_MSIL", "GAC_32", "GAC_64", "GAC"];

/// Where a resolved assembly lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssemblyOrigin {
    /// An ordinary directory; the assembly must be materialized for downstream tools.
    Local,
    /// The system-wide assembly store; the assembly is available everywhere.
    SystemStore,
}

/// An assembly file found for a requested identity.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedAssembly {
    /// Path of the file.
    pub path: PathBuf,
    /// Classification of `path`.
    pub origin: AssemblyOrigin,
    /// Metadata read from the file.
    pub metadata: AssemblyMetadata,
}

impl ResolvedAssembly {
    /// The identity the file declares.
    #[must_use]
    pub fn identity(&self) -> &AssemblyIdentity {
        &self.metadata.identity
    }

    /// The references the file declares.
    #[must_use]
    pub fn references(&self) -> &[AssemblyIdentity] {
        &self.metadata.references
    }
}

/// Why a requested assembly could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveFailure {
    /// No candidate file exists, or none declares the requested name.
    #[error("no matching assembly in the search directories")]
    NotFound,
    /// A candidate file exists but its metadata could not be read.
    #[error("failed to read {} - {}", path.display(), message)]
    Unreadable {
        /// The candidate file.
        path: PathBuf,
        /// The reader's error.
        message: String,
    },
}

/// Finds files for requested identities in a list of directories.
///
/// A candidate matches when the name it declares equals the requested name, ignoring case.
/// Versions are not compared; a differing version is a redirect, not a failure.
pub struct AssemblyResolver<'a> {
    reader: &'a dyn AssemblyMetadataReader,
    options: &'a ResolverOptions,
    system_store_roots: &'a [PathBuf],
}

impl<'a> AssemblyResolver<'a> {
    /// Create a resolver probing only the directories passed to [`AssemblyResolver::resolve`].
    #[must_use]
    pub fn new(reader: &'a dyn AssemblyMetadataReader, options: &'a ResolverOptions) -> Self {
        Self {
            reader,
            options,
            system_store_roots: &[],
        }
    }

    /// Also probe the system store below `roots`, after all directories.
    #[must_use]
    pub fn with_system_store(mut self, roots: &'a [PathBuf]) -> Self {
        self.system_store_roots = roots;
        self
    }

    /// Resolve `identity` against `directories`, in order.
    ///
    /// # Errors
    /// Returns [`ResolveFailure::Unreadable`] for the first unreadable candidate if no
    /// candidate matched, [`ResolveFailure::NotFound`] if there was no candidate at all.
    pub fn resolve(
        &self,
        identity: &AssemblyIdentity,
        directories: &[PathBuf],
    ) -> std::result::Result<ResolvedAssembly, ResolveFailure> {
        let mut unreadable = None;

        for candidate in self.candidates(identity, directories) {
            if !candidate.is_file() {
                continue;
            }

            match self.reader.read(&candidate) {
                Ok(metadata) if metadata.identity.name.eq_ignore_ascii_case(&identity.name) => {
                    return Ok(ResolvedAssembly {
                        origin: self.classify(&candidate),
                        path: candidate,
                        metadata,
                    });
                }
                Ok(metadata) => {
                    log::debug!(
                        "{} declares '{}', not '{}'",
                        candidate.display(),
                        metadata.identity.name,
                        identity.name
                    );
                }
                Err(error) => {
                    log::debug!("Failed to read {}: {}", candidate.display(), error);
                    unreadable.get_or_insert(ResolveFailure::Unreadable {
                        path: candidate,
                        message: error.to_string(),
                    });
                }
            }
        }

        Err(unreadable.unwrap_or(ResolveFailure::NotFound))
    }

    /// Classify a resolved path by the configured system store markers.
    #[must_use]
    pub fn classify(&self, path: &Path) -> AssemblyOrigin {
        if self
            .options
            .is_system_store_path(&path.to_string_lossy())
        {
            AssemblyOrigin::SystemStore
        } else {
            AssemblyOrigin::Local
        }
    }

    fn candidates(&self, identity: &AssemblyIdentity, directories: &[PathBuf]) -> Vec<PathBuf> {
        let mut candidates = Vec::new();

        for dir in directories {
            for extension in &self.options.probe_extensions {
                let file_name = format!("{}.{}", identity.name, extension);
                candidates.push(dir.join(&file_name));
                if let Some(culture) = &identity.culture {
                    candidates.push(dir.join(culture).join(&file_name));
                }
            }
        }

        // <root>/GAC_MSIL/<name>/v4.0_<version>_<culture>_<token>/<name>.dll
        if let Some(token) = identity.public_key_token {
            let culture = identity.culture.as_deref().unwrap_or_default();
            let file_name = format!("{}.dll", identity.name);

            for root in self.system_store_roots {
                for folder in SYSTEM_STORE_FOLDERS {
                    for prefix in ["v4.0_", ""] {
                        let entry = format!("{}{}_{}_{}", prefix, identity.version, culture, token);
                        candidates.push(
                            root.join(folder)
                                .join(&identity.name)
                                .join(entry)
                                .join(&file_name),
                        );
                    }
                }
            }
        }

        candidates
    }
}
