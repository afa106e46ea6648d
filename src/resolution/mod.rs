//! Dependency resolution for documented assemblies.
//!
//! A resolution pass takes the primary assemblies of a documentation build, the explicitly
//! declared dependencies and a target framework, and produces everything the reflection and
//! linking tools need to load those assemblies offline: the transitive set of dependency
//! files, the binding redirects for references satisfied by another version, the comment
//! files next to the dependencies and the XAML namespace definitions of markup assemblies.
//!
//! # Architecture
//!
//! - [`planner`] - Ordered search directories per framework family ([`SearchPathPlanner`])
//! - [`resolver`] - Finding the file of one requested identity ([`AssemblyResolver`])
//! - [`walker`] - Depth-first closure over the references ([`DependencyWalker`])
//! - [`redirect`] - Requested versus resolved versions ([`RedirectPolicy`])
//! - [`materializer`] - Copying dependencies into the working directory ([`Materializer`])
//! - [`xmlns`] - `XmlnsDefinitionAttribute` extraction ([`XmlnsExtractor`])
//! - [`content`] and [`result`] - Inputs and outputs of a pass
//! - [`options`] - Pass configuration ([`ResolverOptions`])
//!
//! [`ReferenceResolver`] drives all of them for one build group.
//!
//! # Failure model
//!
//! Only configuration problems abort a pass: no framework, or a framework family without
//! probing rules. Everything else, from an unresolvable reference to a failed copy, is logged
//! and recorded in [`ResolutionResult::failures`] while the pass carries on.
//!
//! # Examples
//!
//! ```rust,no_run
//! use dotdeps::prelude::*;
//!
//! let framework = FrameworkDescriptor::new(FrameworkKind::Silverlight, FrameworkVersion::new(5, 0))
//!     .with_platform(PlatformPaths::from_env());
//!
//! let result = ReferenceResolver::new(CilMetadataReader::new())
//!     .framework(framework)
//!     .reference(ReferenceItem::new("bin/Controls.dll").with_xaml_syntax(true))
//!     .dependencies(DependencyContent::new().with_path("lib"))
//!     .options(ResolverOptions::strict())
//!     .resolve()?;
//!
//! for (module, definitions) in &result.xmlns {
//!     println!("{}: {} XML namespaces", module, definitions.len());
//! }
//! # Ok::<(), dotdeps::Error>(())
//! ```

pub mod content;
pub mod materializer;
pub mod options;
pub mod planner;
pub mod redirect;
pub mod resolver;
pub mod result;
pub mod walker;
pub mod xmlns;

pub use content::{BindingRedirect, DependencyContent, DependencyItem, ReferenceItem};
pub use materializer::{MaterializeOutcome, Materializer};
pub use options::{DuplicatePolicy, ResolverOptions};
pub use planner::{ProbeRoot, ProbeRule, SearchPathPlanner, SearchPlan};
pub use redirect::{Redirect, RedirectPolicy};
pub use resolver::{AssemblyOrigin, AssemblyResolver, ResolveFailure, ResolvedAssembly};
pub use result::{ResolutionFailure, ResolutionResult};
pub use walker::{DependencyWalker, WalkOutcome, WalkPolicy};
pub use xmlns::{XmlnsDefinitions, XmlnsExtractor};

use std::{
    collections::HashSet,
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::{
    framework::FrameworkDescriptor,
    metadata::{AssemblyMetadata, AssemblyMetadataReader, TimeoutReader},
    Error, Result,
};

/// Builder running one resolution pass.
///
/// # Usage Examples
///
/// ## Desktop assemblies with explicit dependencies
/// ```rust,no_run
/// use dotdeps::prelude::*;
///
/// let result = ReferenceResolver::new(CilMetadataReader::new())
///     .framework(FrameworkDescriptor::new(FrameworkKind::DotNet, FrameworkVersion::new(4, 0)))
///     .references([ReferenceItem::new("bin/App.exe"), ReferenceItem::new("bin/Lib.dll")])
///     .dependencies(
///         DependencyContent::new()
///             .with_path("third-party")
///             .with_item(DependencyItem::new("third-party/Vendor.dll")),
///     )
///     .working_dir("obj/deps")
///     .resolve()?;
///
/// println!("{} files copied", result.copied_count);
/// # Ok::<(), dotdeps::Error>(())
/// ```
///
/// ## Link groups
/// ```rust,no_run
/// use dotdeps::prelude::*;
///
/// let framework = FrameworkDescriptor::new(FrameworkKind::Portable, FrameworkVersion::new(4, 0))
///     .with_assembly_dir("sdk/Portable/v4.0");
///
/// let result = ReferenceResolver::new(CilMetadataReader::new())
///     .framework(framework)
///     .reference(ReferenceItem::new("bin/Portable.dll"))
///     .binding_source("sdk/facades")
///     .link_group(true)
///     .resolve()?;
/// # Ok::<(), dotdeps::Error>(())
/// ```
pub struct ReferenceResolver<R> {
    /// Reader for all metadata of the pass
    reader: Arc<R>,
    /// Target framework; a pass without one is a configuration error
    framework: Option<FrameworkDescriptor>,
    /// Primary assemblies, in declaration order
    references: Vec<ReferenceItem>,
    /// Explicit dependencies and dependency directories
    dependencies: DependencyContent,
    /// Extra directories probed last for link and embedded groups
    binding_sources: Vec<PathBuf>,
    /// Whether the group links or embeds its content
    link_group: bool,
    /// Target of materialization; `None` only collects the outputs
    working_dir: Option<PathBuf>,
    options: ResolverOptions,
}

impl<R> ReferenceResolver<R>
where
    R: AssemblyMetadataReader + 'static,
{
    /// Create a resolver reading metadata with `reader`.
    #[must_use]
    pub fn new(reader: R) -> Self {
        Self {
            reader: Arc::new(reader),
            framework: None,
            references: Vec::new(),
            dependencies: DependencyContent::new(),
            binding_sources: Vec::new(),
            link_group: false,
            working_dir: None,
            options: ResolverOptions::default(),
        }
    }

    /// Set the target framework.
    #[must_use]
    pub fn framework(mut self, framework: FrameworkDescriptor) -> Self {
        self.framework = Some(framework);
        self
    }

    /// Add a primary assembly.
    #[must_use]
    pub fn reference(mut self, item: ReferenceItem) -> Self {
        self.references.push(item);
        self
    }

    /// Add several primary assemblies.
    #[must_use]
    pub fn references<I>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = ReferenceItem>,
    {
        self.references.extend(items);
        self
    }

    /// Set the explicit dependencies and dependency directories.
    #[must_use]
    pub fn dependencies(mut self, dependencies: DependencyContent) -> Self {
        self.dependencies = dependencies;
        self
    }

    /// Add a binding source directory, probed after the framework directories of a link
    /// group.
    #[must_use]
    pub fn binding_source(mut self, dir: impl Into<PathBuf>) -> Self {
        self.binding_sources.push(dir.into());
        self
    }

    /// Mark the build group as linking or embedding its content. Binding sources are only
    /// probed for such groups.
    #[must_use]
    pub fn link_group(mut self, enabled: bool) -> Self {
        self.link_group = enabled;
        self
    }

    /// Copy the dependencies into `dir`.
    #[must_use]
    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Replace the pass configuration.
    #[must_use]
    pub fn options(mut self, options: ResolverOptions) -> Self {
        self.options = options;
        self
    }

    /// Run the pass.
    ///
    /// # Errors
    /// Returns [`Error::Configuration`] if no framework is set or its kind is not supported.
    /// Every other failure is recorded in the result.
    pub fn resolve(&self) -> Result<ResolutionResult> {
        let Some(framework) = &self.framework else {
            return Err(Error::Configuration(
                "No valid framework is specified.".to_string(),
            ));
        };

        let references = self.reference_paths();
        log::info!(
            "Resolving the dependencies of {} reference assemblies for {} {}",
            references.len(),
            framework.kind,
            framework.version
        );

        let reference_dirs: Vec<PathBuf> = references
            .iter()
            .filter_map(|(path, _)| path.parent().map(Path::to_path_buf))
            .collect();
        let binding_sources: &[PathBuf] = if self.link_group {
            &self.binding_sources
        } else {
            &[]
        };
        let plan = SearchPathPlanner::new(framework).plan(
            &reference_dirs,
            self.dependencies.paths(),
            binding_sources,
        )?;

        let timed;
        let reader: &dyn AssemblyMetadataReader = match self.options.read_timeout {
            Some(timeout) => {
                timed = TimeoutReader::new(Arc::clone(&self.reader), timeout);
                &timed
            }
            None => self.reader.as_ref(),
        };

        let mut result = ResolutionResult::new();
        let mut roots = Vec::with_capacity(references.len());
        for (path, item) in &references {
            match reader.read(path) {
                Ok(metadata) => {
                    if item.xaml_syntax {
                        let definitions = XmlnsExtractor::extract(&metadata);
                        result.xmlns.insert(metadata.module_name.clone(), definitions);
                    }
                    roots.push(metadata);
                }
                Err(error) => {
                    log::warn!(
                        "Could not read the reference assembly {}: {}",
                        path.display(),
                        error
                    );
                    result.failures.push(ResolutionFailure::UnreadableReference {
                        path: path.clone(),
                        message: error.to_string(),
                    });
                }
            }
        }

        let outcome = self.walk(reader, framework, &plan, &roots, &references);

        result.failures.extend(outcome.failures);
        if let Some(working_dir) = &self.working_dir {
            let materialized = Materializer::new(working_dir, &self.options.comment_extension)
                .materialize(&outcome.content);
            result.comment_files = materialized.comment_files;
            result.redirects = materialized.redirects;
            result.copied_count = materialized.copied;
            result.failures.extend(materialized.failures);
        } else {
            let (comment_files, redirects) =
                Materializer::new(Path::new("."), &self.options.comment_extension)
                    .collect(&outcome.content);
            result.comment_files = comment_files;
            result.redirects = redirects;
        }

        result.search_directories = plan.exported_directories();
        result.content = outcome.content;
        result.discovered = outcome.discovered;

        log::info!(
            "Dependency resolution complete: {} discovered, {} redirects, {} failures",
            result.discovered.len(),
            result.redirects.len(),
            result.failure_count()
        );

        Ok(result)
    }

    /// The primary assemblies taking part in resolution: empty and comment-only items are
    /// dropped, and so are repeated paths (ignoring case). A bare file name is taken relative
    /// to the current directory.
    fn reference_paths(&self) -> Vec<(PathBuf, &ReferenceItem)> {
        let mut seen = HashSet::new();

        self.references
            .iter()
            .filter_map(|item| item.assembly_path().map(|path| (with_directory(path), item)))
            .filter(|(path, _)| seen.insert(path.to_string_lossy().to_lowercase()))
            .collect()
    }

    fn walk(
        &self,
        reader: &dyn AssemblyMetadataReader,
        framework: &FrameworkDescriptor,
        plan: &SearchPlan,
        roots: &[AssemblyMetadata],
        references: &[(PathBuf, &ReferenceItem)],
    ) -> WalkOutcome {
        let resolver =
            AssemblyResolver::new(reader, &self.options).with_system_store(&plan.system_store_roots);
        let policy = WalkPolicy::for_framework(&framework.kind, &self.options);

        DependencyWalker::new(resolver, &self.options, policy, &plan.directories)
            .with_known_locations(references.iter().map(|(path, _)| path))
            .walk(roots, &self.dependencies)
    }
}

/// `path` with an explicit directory, so that its parent is never empty.
fn with_directory(path: &Path) -> PathBuf {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => path.to_path_buf(),
        _ => Path::new(".").join(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        framework::{FrameworkKind, FrameworkVersion},
        metadata::reader::{AttributeValue, CustomAttributeInfo},
        test::{create_metadata, touch, MockReader},
    };

    fn portable() -> FrameworkDescriptor {
        FrameworkDescriptor::new(FrameworkKind::Portable, FrameworkVersion::new(4, 0))
    }

    #[test]
    fn missing_framework() {
        let result = ReferenceResolver::new(MockReader::new())
            .reference(ReferenceItem::new("App.dll"))
            .resolve();

        match result {
            Err(Error::Configuration(message)) => {
                assert_eq!(message, "No valid framework is specified.")
            }
            other => panic!("Expected a configuration error, got {:?}", other),
        }
    }

    #[test]
    fn unsupported_framework() {
        let framework = FrameworkDescriptor::new(
            "XNA".parse::<FrameworkKind>().unwrap(),
            FrameworkVersion::new(4, 0),
        );
        let result = ReferenceResolver::new(MockReader::new())
            .framework(framework)
            .resolve();

        assert!(matches!(
            result,
            Err(Error::Configuration(message)) if message == "The framework kind 'XNA' is not supported."
        ));
    }

    #[test]
    fn reference_items_are_indexed() {
        let temp = tempfile::tempdir().unwrap();
        let bin = temp.path().join("bin");
        let app = bin.join("App.dll");

        let reader = Arc::new(MockReader::new());
        reader.add(&app, create_metadata("App", "1.0.0.0", &[("Lib", "1.0.0.0")]));
        reader.add(&bin.join("Lib.dll"), create_metadata("Lib", "1.0.0.0", &[]));

        let upper = PathBuf::from(app.to_string_lossy().to_uppercase());
        let result = ReferenceResolver::new(Arc::clone(&reader))
            .framework(portable())
            .references([
                ReferenceItem::new(&app),
                ReferenceItem::default(),
                ReferenceItem::comment_only(bin.join("App.xml")),
                ReferenceItem::new(upper),
            ])
            .options(ResolverOptions::legacy())
            .resolve()
            .unwrap();

        // One read for App, one for Lib
        assert_eq!(reader.reads(), 2);
        assert!(result.is_complete_success());
        assert_eq!(result.discovered.len(), 1);
        assert_eq!(result.discovered[0].location, bin.join("Lib.dll"));
        assert_eq!(result.search_directories.len(), 1);
    }

    #[test]
    fn bare_file_names_gain_a_directory() {
        assert_eq!(with_directory(Path::new("App.dll")), Path::new("./App.dll"));
        assert_eq!(
            with_directory(Path::new("App.dll")).parent(),
            Some(Path::new("."))
        );
        assert_eq!(with_directory(Path::new("bin/App.dll")), Path::new("bin/App.dll"));
        assert_eq!(with_directory(Path::new("/bin/App.dll")), Path::new("/bin/App.dll"));

        let resolver = ReferenceResolver::new(MockReader::new())
            .reference(ReferenceItem::new("App.dll"))
            .reference(ReferenceItem::new("./App.dll"));
        let references = resolver.reference_paths();
        assert_eq!(references.len(), 1);
        assert_eq!(references[0].0, Path::new("./App.dll"));
    }

    #[test]
    fn unreadable_reference_is_recoverable() {
        let temp = tempfile::tempdir().unwrap();
        let bin = temp.path().join("bin");
        let broken = bin.join("Broken.dll");
        touch(&broken);

        let reader = MockReader::new();
        reader.add(&bin.join("App.dll"), create_metadata("App", "1.0.0.0", &[("Lib", "1.0.0.0")]));
        reader.add(&bin.join("Lib.dll"), create_metadata("Lib", "1.0.0.0", &[]));

        let result = ReferenceResolver::new(reader)
            .framework(portable())
            .reference(ReferenceItem::new(&broken))
            .reference(ReferenceItem::new(bin.join("App.dll")))
            .resolve()
            .unwrap();

        assert_eq!(result.failure_count(), 1);
        assert!(matches!(
            &result.failures[0],
            ResolutionFailure::UnreadableReference { path, .. } if *path == broken
        ));
        assert_eq!(result.discovered.len(), 1);
    }

    #[test]
    fn binding_sources_for_link_groups() {
        let temp = tempfile::tempdir().unwrap();
        let bin = temp.path().join("bin");
        let facades = temp.path().join("facades");

        let reader = Arc::new(MockReader::new());
        reader.add(&bin.join("App.dll"), create_metadata("App", "1.0.0.0", &[("Facade", "4.0.0.0")]));
        reader.add(&facades.join("Facade.dll"), create_metadata("Facade", "4.0.0.0", &[]));

        let resolver = |link_group: bool| {
            ReferenceResolver::new(Arc::clone(&reader))
                .framework(portable())
                .reference(ReferenceItem::new(bin.join("App.dll")))
                .binding_source(&facades)
                .link_group(link_group)
                .resolve()
                .unwrap()
        };

        let plain = resolver(false);
        assert_eq!(plain.unresolved().count(), 1);
        assert!(plain.discovered.is_empty());

        let linked = resolver(true);
        assert!(linked.is_complete_success());
        assert_eq!(linked.discovered[0].location, facades.join("Facade.dll"));
        assert_eq!(linked.search_directories.len(), 2);
    }

    #[test]
    fn xmlns_per_module() {
        let temp = tempfile::tempdir().unwrap();
        let bin = temp.path().join("bin");

        let mut controls = create_metadata("Controls", "1.0.0.0", &[]);
        controls.custom_attributes.push(CustomAttributeInfo {
            namespace: "System.Windows.Markup".to_string(),
            name: "XmlnsDefinitionAttribute".to_string(),
            fixed_args: vec![
                AttributeValue::String(Some("urn:controls".to_string())),
                AttributeValue::String(Some("Controls.Primitives".to_string())),
            ],
        });

        let reader = MockReader::new();
        reader.add(&bin.join("Controls.dll"), controls);
        reader.add(&bin.join("Plain.dll"), create_metadata("Plain", "1.0.0.0", &[]));
        reader.add(&bin.join("Markup.dll"), create_metadata("Markup", "1.0.0.0", &[]));

        let result = ReferenceResolver::new(reader)
            .framework(portable())
            .reference(ReferenceItem::new(bin.join("Controls.dll")).with_xaml_syntax(true))
            .reference(ReferenceItem::new(bin.join("Plain.dll")))
            .reference(ReferenceItem::new(bin.join("Markup.dll")).with_xaml_syntax(true))
            .resolve()
            .unwrap();

        assert_eq!(
            result.xmlns.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["Controls.dll", "Markup.dll"]
        );
        assert_eq!(
            result.xmlns["Controls.dll"].get("urn:controls"),
            &["Controls.Primitives"]
        );
        assert!(result.xmlns["Markup.dll"].is_empty());
    }

    #[test]
    fn materializes_into_working_dir() {
        let temp = tempfile::tempdir().unwrap();
        let bin = temp.path().join("bin");
        let deps = temp.path().join("deps");
        let work = temp.path().join("work");

        let reader = Arc::new(MockReader::new());
        reader.add(&bin.join("App.dll"), create_metadata("App", "1.0.0.0", &[("Lib", "1.0.0.0")]));
        reader.add(&deps.join("Lib.dll"), create_metadata("Lib", "1.2.0.0", &[]));
        touch(&deps.join("Lib.xml"));

        let resolver = ReferenceResolver::new(Arc::clone(&reader))
            .framework(portable())
            .reference(ReferenceItem::new(bin.join("App.dll")))
            .dependencies(DependencyContent::new().with_path(&deps))
            .working_dir(&work);

        let first = resolver.resolve().unwrap();
        let second = resolver.resolve().unwrap();

        assert_eq!(first.copied_count, 1);
        assert_eq!(second.copied_count, 0);
        assert!(work.join("Lib.dll").is_file());
        assert_eq!(first.comment_files, vec![deps.join("Lib.xml")]);
        assert_eq!(first.redirects.len(), 1);
        assert_eq!(first.redirects, second.redirects);
    }
}
