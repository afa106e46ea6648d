//! Transitive dependency closure.
//!
//! [`DependencyWalker`] starts from the references of the primary assemblies and follows
//! every resolved assembly's own references depth-first, in declaration order. Per-pass state
//! lives in a context value threaded through the recursion, so independent walks never
//! share anything.
//!
//! For each requested identity:
//!
//! 1. The base runtime library of the desktop framework is skipped outright
//! 2. An identity already visited in this walk is skipped (this also ends cycles)
//! 3. The identity is resolved; a failure is recorded once and ends this branch
//! 4. An assembly in the system store is neither recorded nor walked into
//! 5. A version mismatch between request and resolved file becomes a redirect
//! 6. A file not recorded before becomes a [`DependencyItem`] carrying that redirect. For a
//!    file already recorded, the redirect is kept on its own
//! 7. The assembly's references are walked

use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

use crate::{
    framework::FrameworkKind,
    metadata::{identity::AssemblyIdentity, reader::AssemblyMetadata},
    resolution::{
        content::{display_name, BindingRedirect, DependencyContent, DependencyItem},
        options::{DuplicatePolicy, ResolverOptions},
        redirect::RedirectPolicy,
        resolver::{AssemblyOrigin, AssemblyResolver},
        result::ResolutionFailure,
    },
};

/// Framework-specific rules of a walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalkPolicy {
    /// Skip references to the base runtime library.
    pub skip_base_runtime: bool,
    /// Treatment of discovered dependencies whose file is already known.
    pub duplicate_policy: DuplicatePolicy,
}

impl WalkPolicy {
    /// The policy for `kind`: only the desktop framework skips its base runtime.
    #[must_use]
    pub fn for_framework(kind: &FrameworkKind, options: &ResolverOptions) -> Self {
        Self {
            skip_base_runtime: kind.is_desktop(),
            duplicate_policy: options.duplicate_policy,
        }
    }
}

/// Output of [`DependencyWalker::walk`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WalkOutcome {
    /// The explicit dependencies followed by the discovered ones, each location once, plus
    /// the redirects of requests for files recorded earlier.
    pub content: DependencyContent,
    /// The discovered dependencies alone, in discovery order.
    pub discovered: Vec<DependencyItem>,
    /// Identities that could not be resolved, once each.
    pub failures: Vec<ResolutionFailure>,
}

/// Computes the closure of the references of a set of primary assemblies.
pub struct DependencyWalker<'a> {
    resolver: AssemblyResolver<'a>,
    options: &'a ResolverOptions,
    policy: WalkPolicy,
    directories: &'a [PathBuf],
    known_locations: HashSet<PathBuf>,
}

struct WalkContext {
    visited: HashSet<String>,
    known_locations: HashSet<PathBuf>,
    discovered_locations: HashSet<PathBuf>,
    discovered: Vec<DependencyItem>,
    redirects: Vec<BindingRedirect>,
    failures: Vec<ResolutionFailure>,
}

impl<'a> DependencyWalker<'a> {
    /// Create a walker resolving against `directories` in order.
    #[must_use]
    pub fn new(
        resolver: AssemblyResolver<'a>,
        options: &'a ResolverOptions,
        policy: WalkPolicy,
        directories: &'a [PathBuf],
    ) -> Self {
        Self {
            resolver,
            options,
            policy,
            directories,
            known_locations: HashSet::new(),
        }
    }

    /// Treat `locations` as known, in addition to the explicit dependencies. Used for the
    /// primary reference assemblies.
    #[must_use]
    pub fn with_known_locations<I, P>(mut self, locations: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        self.known_locations
            .extend(locations.into_iter().map(|path| path.as_ref().to_path_buf()));
        self
    }

    /// Walk the references of `roots` and merge the result with `explicit`.
    ///
    /// Never fails: unresolvable identities are reported in [`WalkOutcome::failures`].
    #[must_use]
    pub fn walk(&self, roots: &[AssemblyMetadata], explicit: &DependencyContent) -> WalkOutcome {
        let mut known_locations = explicit.locations();
        known_locations.extend(self.known_locations.iter().cloned());

        let mut context = WalkContext {
            visited: HashSet::new(),
            known_locations,
            discovered_locations: HashSet::new(),
            discovered: Vec::new(),
            redirects: Vec::new(),
            failures: Vec::new(),
        };

        for root in roots {
            for reference in &root.references {
                self.resolve_one(reference, &mut context);
            }
        }

        let mut content = explicit.clone();
        for item in &context.discovered {
            if !content.contains_location(&item.location) {
                content.push(item.clone());
            } else if let Some(redirect) = item.binding_redirect() {
                content.add_redirect(redirect);
            }
        }
        for redirect in context.redirects {
            content.add_redirect(redirect);
        }

        WalkOutcome {
            content,
            discovered: context.discovered,
            failures: context.failures,
        }
    }

    fn resolve_one(&self, requested: &AssemblyIdentity, context: &mut WalkContext) {
        if self.policy.skip_base_runtime && self.options.is_base_runtime(&requested.name) {
            return;
        }

        if !context.visited.insert(requested.full_name().to_lowercase()) {
            return;
        }

        let resolved = match self.resolver.resolve(requested, self.directories) {
            Ok(resolved) => resolved,
            Err(reason) => {
                log::warn!(
                    "Could not resolve the reference dependency: {}",
                    requested.full_name()
                );
                context.failures.push(ResolutionFailure::Unresolved {
                    identity: requested.clone(),
                    reason,
                });
                return;
            }
        };

        if resolved.origin == AssemblyOrigin::SystemStore {
            log::debug!(
                "Excluding {} from the system store: {}",
                requested.name,
                resolved.path.display()
            );
            return;
        }

        let redirect = RedirectPolicy::evaluate(requested, resolved.identity());
        if redirect.is_some() {
            log::info!(
                "Creating redirect: '{}' from version '{}' to '{}'",
                requested.name,
                requested.version,
                resolved.identity().version
            );
        }

        let recorded = context.discovered_locations.contains(&resolved.path)
            || (self.policy.duplicate_policy == DuplicatePolicy::SkipKnownLocations
                && context.known_locations.contains(&resolved.path));
        if recorded {
            log::debug!("Already known: {}", resolved.path.display());
            if let Some(redirect) = redirect {
                context
                    .redirects
                    .push(BindingRedirect::new(display_name(&resolved.path), &redirect));
            }
        } else {
            let mut item = DependencyItem::new(resolved.path.clone());
            log::info!("Referenced Assembly: {}", item.name);
            if let Some(redirect) = redirect {
                item = item.with_redirect(redirect);
            }

            context.discovered_locations.insert(resolved.path.clone());
            context.discovered.push(item);
        }

        for reference in resolved.references() {
            self.resolve_one(reference, context);
        }
    }
}
