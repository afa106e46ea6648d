//! Resolution pass results and recoverable failures.

use std::{collections::BTreeMap, fmt, path::PathBuf};

use crate::{
    metadata::identity::AssemblyIdentity,
    resolution::{
        content::{BindingRedirect, DependencyContent, DependencyItem},
        resolver::ResolveFailure,
        xmlns::XmlnsDefinitions,
    },
};

/// A failure the pass recovered from.
///
/// Each one stops a single branch of the walk, or a single copy, and is logged as a warning
/// when it happens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionFailure {
    /// A referenced assembly could not be resolved. Reported once per distinct identity.
    Unresolved {
        /// The reference as declared.
        identity: AssemblyIdentity,
        /// Why it could not be resolved.
        reason: ResolveFailure,
    },
    /// The metadata of a primary reference assembly could not be read.
    UnreadableReference {
        /// Path of the reference assembly.
        path: PathBuf,
        /// The reader's error.
        message: String,
    },
    /// A dependency could not be copied into the working directory.
    CopyFailed {
        /// The dependency's location.
        source: PathBuf,
        /// The copy target.
        target: PathBuf,
        /// The I/O error.
        message: String,
    },
}

impl fmt::Display for ResolutionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolutionFailure::Unresolved { identity, reason } => {
                write!(f, "Could not resolve the reference dependency: {} ({})", identity, reason)
            }
            ResolutionFailure::UnreadableReference { path, message } => {
                write!(f, "Could not read the reference assembly {}: {}", path.display(), message)
            }
            ResolutionFailure::CopyFailed {
                source,
                target,
                message,
            } => write!(
                f,
                "Could not copy {} to {}: {}",
                source.display(),
                target.display(),
                message
            ),
        }
    }
}

/// Result of a resolution pass.
///
/// # Usage
///
/// ```rust,no_run
/// use dotdeps::prelude::*;
///
/// let framework = FrameworkDescriptor::new(FrameworkKind::DotNet, FrameworkVersion::new(4, 0))
///     .with_platform(PlatformPaths::from_env());
///
/// let result = ReferenceResolver::new(CilMetadataReader::new())
///     .framework(framework)
///     .reference(ReferenceItem::new("bin/App.dll"))
///     .working_dir("obj/dependencies")
///     .resolve()?;
///
/// for item in &result.discovered {
///     println!("{} ({})", item.name, item.location.display());
/// }
/// for redirect in &result.redirects {
///     println!("redirect {}", redirect);
/// }
/// if !result.is_complete_success() {
///     println!("{} failures", result.failure_count());
/// }
/// # Ok::<(), dotdeps::Error>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolutionResult {
    /// Explicit dependencies followed by discovered ones, with the declared search paths.
    pub content: DependencyContent,
    /// The dependencies found by the walk, in discovery order.
    pub discovered: Vec<DependencyItem>,
    /// Binding redirects of all redirected dependencies.
    pub redirects: Vec<BindingRedirect>,
    /// Documentation comment files found next to dependencies.
    pub comment_files: Vec<PathBuf>,
    /// XAML namespace definitions per module name, for references flagged for XAML syntax.
    pub xmlns: BTreeMap<String, XmlnsDefinitions>,
    /// Every probed directory, absolute and with a trailing separator.
    pub search_directories: Vec<String>,
    /// Failures the pass recovered from.
    pub failures: Vec<ResolutionFailure>,
    /// Number of files copied into the working directory.
    pub copied_count: usize,
}

impl ResolutionResult {
    /// Create an empty result.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if nothing failed.
    #[must_use]
    pub fn is_complete_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Number of recovered failures.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    /// The identities that could not be resolved.
    pub fn unresolved(&self) -> impl Iterator<Item = &AssemblyIdentity> {
        self.failures.iter().filter_map(|failure| match failure {
            ResolutionFailure::Unresolved { identity, .. } => Some(identity),
            _ => None,
        })
    }
}
