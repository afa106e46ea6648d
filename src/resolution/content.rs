//! Inputs and outputs of a resolution pass: reference items, dependency items and redirects.

use std::{
    collections::HashSet,
    fmt,
    path::{Path, PathBuf},
};

use crate::{
    metadata::identity::{AssemblyVersion, PublicKeyToken},
    resolution::redirect::Redirect,
};

/// A primary assembly to document.
///
/// An item without an assembly is either empty or carries only a comment file; both kinds take
/// no part in dependency resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceItem {
    /// Path of the assembly file.
    pub assembly: Option<PathBuf>,
    /// Path of the documentation comment file belonging to the assembly.
    pub comments: Option<PathBuf>,
    /// Whether XAML namespace definitions are extracted from this assembly.
    pub xaml_syntax: bool,
}

impl ReferenceItem {
    /// An item for the assembly at `assembly`.
    #[must_use]
    pub fn new(assembly: impl Into<PathBuf>) -> Self {
        Self {
            assembly: Some(assembly.into()),
            comments: None,
            xaml_syntax: false,
        }
    }

    /// An item carrying only a comment file.
    #[must_use]
    pub fn comment_only(comments: impl Into<PathBuf>) -> Self {
        Self {
            assembly: None,
            comments: Some(comments.into()),
            xaml_syntax: false,
        }
    }

    /// Set the comment file.
    #[must_use]
    pub fn with_comments(mut self, comments: impl Into<PathBuf>) -> Self {
        self.comments = Some(comments.into());
        self
    }

    /// Enable or disable XAML namespace extraction.
    #[must_use]
    pub fn with_xaml_syntax(mut self, enabled: bool) -> Self {
        self.xaml_syntax = enabled;
        self
    }

    /// Returns true if the item names neither an assembly nor a comment file.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assembly_path().is_none() && self.comments.is_none()
    }

    /// Returns true if the item only names a comment file.
    #[must_use]
    pub fn is_comment_only(&self) -> bool {
        self.assembly_path().is_none() && self.comments.is_some()
    }

    /// The assembly path, if set and not empty.
    #[must_use]
    pub fn assembly_path(&self) -> Option<&Path> {
        self.assembly
            .as_deref()
            .filter(|path| !path.as_os_str().is_empty())
    }
}

/// A dependency of the documented assemblies, declared explicitly or discovered by a walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyItem {
    /// Display name, the file name of the location (`Lib.dll`).
    pub name: String,
    /// Path of the assembly file.
    pub location: PathBuf,
    /// Full name of the resolved assembly. Set for redirected dependencies, and for explicit
    /// dependencies that declare it.
    pub strong_name: Option<String>,
    /// The version redirect found when the dependency was discovered.
    pub redirect: Option<Redirect>,
}

impl DependencyItem {
    /// A dependency on the file at `location`, named after its file name.
    #[must_use]
    pub fn new(location: impl Into<PathBuf>) -> Self {
        let location = location.into();

        Self {
            name: display_name(&location),
            location,
            strong_name: None,
            redirect: None,
        }
    }

    /// Set the full name of the resolved assembly.
    #[must_use]
    pub fn with_strong_name(mut self, strong_name: impl Into<String>) -> Self {
        self.strong_name = Some(strong_name.into());
        self
    }

    /// Attach a redirect, taking over its strong name.
    #[must_use]
    pub fn with_redirect(mut self, redirect: Redirect) -> Self {
        self.strong_name = Some(redirect.strong_name.clone());
        self.redirect = Some(redirect);
        self
    }

    /// Returns true if the dependency has no location.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.location.as_os_str().is_empty()
    }

    /// Returns true if the requested version differed from the resolved one.
    #[must_use]
    pub fn is_redirected(&self) -> bool {
        self.redirect.is_some()
    }

    /// The originally requested version of a redirected dependency.
    #[must_use]
    pub fn redirect_version(&self) -> Option<AssemblyVersion> {
        self.redirect.as_ref().map(|redirect| redirect.requested.version)
    }

    /// The originally requested culture of a redirected dependency.
    #[must_use]
    pub fn redirect_culture(&self) -> Option<&str> {
        self.redirect
            .as_ref()
            .and_then(|redirect| redirect.requested.culture.as_deref())
    }

    /// The public key token of the originally requested reference.
    #[must_use]
    pub fn public_key_token(&self) -> Option<PublicKeyToken> {
        self.redirect
            .as_ref()
            .and_then(|redirect| redirect.requested.public_key_token)
    }

    /// The binding redirect record of a redirected dependency.
    #[must_use]
    pub fn binding_redirect(&self) -> Option<BindingRedirect> {
        self.redirect
            .as_ref()
            .map(|redirect| BindingRedirect::new(self.name.clone(), redirect))
    }
}

/// The display name of the dependency at `location`: its file name.
pub(crate) fn display_name(location: &Path) -> String {
    location
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// An ordered set of dependencies plus the directories they were declared to live in.
///
/// Redirects found for a file that is already part of the content are kept next to the items,
/// since the file itself is not recorded again.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyContent {
    items: Vec<DependencyItem>,
    paths: Vec<PathBuf>,
    redirects: Vec<BindingRedirect>,
}

impl DependencyContent {
    /// Create empty content.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a dependency.
    pub fn push(&mut self, item: DependencyItem) {
        self.items.push(item);
    }

    /// Append a dependency search directory.
    pub fn add_path(&mut self, path: impl Into<PathBuf>) {
        self.paths.push(path.into());
    }

    /// Record a binding redirect that belongs to no item of its own. Repeated redirects are
    /// stored once.
    pub fn add_redirect(&mut self, redirect: BindingRedirect) {
        if !self.redirects.contains(&redirect) {
            self.redirects.push(redirect);
        }
    }

    /// Builder form of [`DependencyContent::push`].
    #[must_use]
    pub fn with_item(mut self, item: DependencyItem) -> Self {
        self.push(item);
        self
    }

    /// Builder form of [`DependencyContent::add_path`].
    #[must_use]
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.add_path(path);
        self
    }

    /// The dependencies in insertion order.
    #[must_use]
    pub fn items(&self) -> &[DependencyItem] {
        &self.items
    }

    /// The declared search directories.
    #[must_use]
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// The binding redirects recorded apart from the items.
    #[must_use]
    pub fn redirects(&self) -> &[BindingRedirect] {
        &self.redirects
    }

    /// Returns true if a non-empty dependency lives at `location`.
    #[must_use]
    pub fn contains_location(&self, location: &Path) -> bool {
        self.items
            .iter()
            .any(|item| !item.is_empty() && item.location == location)
    }

    /// Iterate over the dependencies in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, DependencyItem> {
        self.items.iter()
    }

    /// Number of dependencies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if there are no dependencies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Find the dependency whose display name matches `name`, ignoring case.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&DependencyItem> {
        self.items
            .iter()
            .find(|item| item.name.eq_ignore_ascii_case(name))
    }

    /// The locations of all non-empty dependencies.
    #[must_use]
    pub fn locations(&self) -> HashSet<PathBuf> {
        self.items
            .iter()
            .filter(|item| !item.is_empty())
            .map(|item| item.location.clone())
            .collect()
    }

    /// Append all dependencies and redirects of `other`, keeping this content's paths.
    pub fn extend(&mut self, other: DependencyContent) {
        self.items.extend(other.items);
        for redirect in other.redirects {
            self.add_redirect(redirect);
        }
    }
}

impl<'a> IntoIterator for &'a DependencyContent {
    type Item = &'a DependencyItem;
    type IntoIter = std::slice::Iter<'a, DependencyItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl FromIterator<DependencyItem> for DependencyContent {
    fn from_iter<T: IntoIterator<Item = DependencyItem>>(iter: T) -> Self {
        Self {
            items: iter.into_iter().collect(),
            paths: Vec::new(),
            redirects: Vec::new(),
        }
    }
}

/// A `(from, to)` pair telling the reflection tool to bind a requested full name to the
/// resolved one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BindingRedirect {
    /// Display name of the dependency (`Lib.dll`).
    pub name: String,
    /// Full name of the requested reference.
    pub from: String,
    /// Full name of the resolved assembly.
    pub to: String,
}

impl BindingRedirect {
    /// The record binding the reference requested by `redirect` to the dependency `name`.
    #[must_use]
    pub fn new(name: impl Into<String>, redirect: &Redirect) -> Self {
        Self {
            name: name.into(),
            from: redirect.requested.full_name(),
            to: redirect.strong_name.clone(),
        }
    }
}

impl fmt::Display for BindingRedirect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.from, self.to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::create_test_identity;

    #[test]
    fn reference_item_kinds() {
        assert!(ReferenceItem::default().is_empty());
        assert!(ReferenceItem::new("").is_empty());

        let comments = ReferenceItem::comment_only("/docs/Lib.xml");
        assert!(comments.is_comment_only());
        assert!(!comments.is_empty());

        let item = ReferenceItem::new("/bin/Lib.dll")
            .with_comments("/bin/Lib.xml")
            .with_xaml_syntax(true);
        assert!(!item.is_empty());
        assert!(!item.is_comment_only());
        assert_eq!(item.assembly_path(), Some(Path::new("/bin/Lib.dll")));
        assert!(item.xaml_syntax);
    }

    #[test]
    fn dependency_item() {
        let item = DependencyItem::new("/deps/Lib.dll");
        assert_eq!(item.name, "Lib.dll");
        assert!(!item.is_redirected());
        assert!(item.binding_redirect().is_none());
        assert!(DependencyItem::new("").is_empty());

        let requested = create_test_identity("Lib", "1.0.0.0").with_culture("de-DE");
        let redirected = item.with_redirect(Redirect {
            requested,
            strong_name: "Lib, Version=1.2.0.0, Culture=de-DE, PublicKeyToken=null".to_string(),
        });
        assert!(redirected.is_redirected());
        assert_eq!(
            redirected.redirect_version(),
            Some(AssemblyVersion::new(1, 0, 0, 0))
        );
        assert_eq!(redirected.redirect_culture(), Some("de-DE"));
        assert_eq!(redirected.public_key_token(), None);
        assert_eq!(
            redirected.strong_name.as_deref(),
            Some("Lib, Version=1.2.0.0, Culture=de-DE, PublicKeyToken=null")
        );

        let binding = redirected.binding_redirect().unwrap();
        assert_eq!(binding.name, "Lib.dll");
        assert_eq!(
            binding.from,
            "Lib, Version=1.0.0.0, Culture=de-DE, PublicKeyToken=null"
        );
    }

    #[test]
    fn content() {
        let mut content = DependencyContent::new()
            .with_path("/deps")
            .with_item(DependencyItem::new("/deps/Lib.dll"));
        content.push(DependencyItem::new("/deps/Util.dll"));

        assert_eq!(content.len(), 2);
        assert_eq!(content.paths(), &[PathBuf::from("/deps")]);
        assert_eq!(content.find("util.DLL").unwrap().name, "Util.dll");
        assert!(content.find("Core.dll").is_none());
        assert!(content.locations().contains(Path::new("/deps/Lib.dll")));
        assert!(content.contains_location(Path::new("/deps/Util.dll")));
        assert!(!content.contains_location(Path::new("/other/Util.dll")));

        let other: DependencyContent = vec![DependencyItem::new("/other/Core.dll")]
            .into_iter()
            .collect();
        content.extend(other);
        assert!(content.redirects().is_empty());
        assert_eq!(
            content.iter().map(|item| item.name.as_str()).collect::<Vec<_>>(),
            vec!["Lib.dll", "Util.dll", "Core.dll"]
        );
    }

    #[test]
    fn standalone_redirects() {
        let redirect = Redirect {
            requested: create_test_identity("Lib", "1.0.0.0"),
            strong_name: "Lib, Version=1.2.0.0, Culture=neutral, PublicKeyToken=null".to_string(),
        };
        let binding = BindingRedirect::new("Lib.dll", &redirect);
        assert_eq!(
            binding.to_string(),
            "Lib, Version=1.0.0.0, Culture=neutral, PublicKeyToken=null -> \
             Lib, Version=1.2.0.0, Culture=neutral, PublicKeyToken=null"
        );

        let mut content = DependencyContent::new();
        content.add_redirect(binding.clone());
        content.add_redirect(binding.clone());
        assert_eq!(content.redirects(), &[binding.clone()]);
        assert!(content.is_empty());

        let mut merged = DependencyContent::new();
        merged.add_redirect(binding.clone());
        merged.extend(content);
        assert_eq!(merged.redirects().len(), 1);
    }
}
