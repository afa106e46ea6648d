//! Copying dependencies into the working directory.

use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::resolution::{
    content::{BindingRedirect, DependencyContent},
    result::ResolutionFailure,
};

/// What a [`Materializer`] did and found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaterializeOutcome {
    /// Number of files copied by this call.
    pub copied: usize,
    /// Documentation comment files next to the dependencies.
    pub comment_files: Vec<PathBuf>,
    /// Binding redirects of the redirected dependencies.
    pub redirects: Vec<BindingRedirect>,
    /// Copies that failed.
    pub failures: Vec<ResolutionFailure>,
}

/// Copies dependencies into a working directory, each file at most once.
///
/// A dependency is copied only if no file of the same name exists in the working directory.
/// Copies are made writable, since reference assembly installs are often read-only. The
/// comment files and redirects are reported for every dependency, copied now or before, so
/// materializing the same content again yields the same outputs without copying anything.
///
/// Two passes must not materialize into the same working directory at the same time.
pub struct Materializer<'a> {
    working_dir: &'a Path,
    comment_extension: &'a str,
}

impl<'a> Materializer<'a> {
    /// Materialize into `working_dir`, looking for comment files with `comment_extension`.
    #[must_use]
    pub fn new(working_dir: &'a Path, comment_extension: &'a str) -> Self {
        Self {
            working_dir,
            comment_extension,
        }
    }

    /// Copy the dependencies of `content` and collect their outputs.
    ///
    /// Copy failures are logged and recorded; they never stop the remaining copies.
    pub fn materialize(&self, content: &DependencyContent) -> MaterializeOutcome {
        let mut outcome = MaterializeOutcome::default();

        if let Err(error) = fs::create_dir_all(self.working_dir) {
            log::warn!(
                "Could not create the working directory {}: {}",
                self.working_dir.display(),
                error
            );
        }

        for item in content.iter().filter(|item| !item.is_empty()) {
            let Some(file_name) = item.location.file_name() else {
                continue;
            };

            let target = self.working_dir.join(file_name);
            if target.exists() {
                continue;
            }

            match copy_writable(&item.location, &target) {
                Ok(()) => outcome.copied += 1,
                Err(error) => {
                    log::warn!(
                        "Could not copy the dependency {} to {}: {}",
                        item.location.display(),
                        target.display(),
                        error
                    );
                    outcome.failures.push(ResolutionFailure::CopyFailed {
                        source: item.location.clone(),
                        target,
                        message: error.to_string(),
                    });
                }
            }
        }

        let (comment_files, redirects) = self.collect(content);
        outcome.comment_files = comment_files;
        outcome.redirects = redirects;
        outcome
    }

    /// The comment files and binding redirects of `content`, without copying anything.
    ///
    /// Redirects of the items come first, followed by the ones recorded apart from them.
    #[must_use]
    pub fn collect(&self, content: &DependencyContent) -> (Vec<PathBuf>, Vec<BindingRedirect>) {
        let mut comment_files = Vec::new();
        let mut redirects = Vec::new();

        for item in content.iter().filter(|item| !item.is_empty()) {
            let comments = item.location.with_extension(self.comment_extension);
            if comments.is_file() && !comment_files.contains(&comments) {
                comment_files.push(comments);
            }

            if let Some(redirect) = item.binding_redirect() {
                if !redirects.contains(&redirect) {
                    redirects.push(redirect);
                }
            }
        }

        for redirect in content.redirects() {
            if !redirects.contains(redirect) {
                redirects.push(redirect.clone());
            }
        }

        (comment_files, redirects)
    }
}

#[allow(clippy::permissions_set_readonly_false)]
fn copy_writable(source: &Path, target: &Path) -> std::io::Result<()> {
    fs::copy(source, target)?;

    let mut permissions = fs::metadata(target)?.permissions();
    if permissions.readonly() {
        permissions.set_readonly(false);
        fs::set_permissions(target, permissions)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        resolution::{content::DependencyItem, redirect::Redirect},
        test::{create_test_identity, touch},
    };

    #[test]
    fn copies_once() {
        let temp = tempfile::tempdir().unwrap();
        let deps = temp.path().join("deps");
        let work = temp.path().join("work");

        touch(&deps.join("Lib.dll"));
        touch(&deps.join("Lib.xml"));
        touch(&deps.join("Util.dll"));

        let content = DependencyContent::new()
            .with_item(DependencyItem::new(deps.join("Lib.dll")).with_redirect(Redirect {
                requested: create_test_identity("Lib", "1.0.0.0"),
                strong_name: "Lib, Version=1.2.0.0, Culture=neutral, PublicKeyToken=null"
                    .to_string(),
            }))
            .with_item(DependencyItem::new(deps.join("Util.dll")));

        let materializer = Materializer::new(&work, "xml");
        let first = materializer.materialize(&content);
        let second = materializer.materialize(&content);

        assert_eq!(first.copied, 2);
        assert_eq!(second.copied, 0);
        assert!(work.join("Lib.dll").is_file());
        assert!(work.join("Util.dll").is_file());

        assert_eq!(first.comment_files, vec![deps.join("Lib.xml")]);
        assert_eq!(first.redirects.len(), 1);
        assert_eq!(first.redirects[0].name, "Lib.dll");
        assert_eq!(first.comment_files, second.comment_files);
        assert_eq!(first.redirects, second.redirects);
        assert!(first.failures.is_empty());
    }

    #[test]
    fn standalone_redirects_are_reported() {
        let temp = tempfile::tempdir().unwrap();
        let lib = temp.path().join("deps").join("Lib.dll");
        touch(&lib);

        let redirect = Redirect {
            requested: create_test_identity("Lib", "1.0.0.0"),
            strong_name: "Lib, Version=1.2.0.0, Culture=neutral, PublicKeyToken=null".to_string(),
        };
        let item = DependencyItem::new(&lib).with_redirect(redirect.clone());
        let mut content = DependencyContent::new().with_item(item);
        content.add_redirect(BindingRedirect::new("Lib.dll", &redirect));
        content.add_redirect(BindingRedirect::new(
            "Lib.dll",
            &Redirect {
                requested: create_test_identity("Lib", "1.1.0.0"),
                ..redirect
            },
        ));

        let work = temp.path().join("work");
        let first = Materializer::new(&work, "xml").materialize(&content);
        let second = Materializer::new(&work, "xml").materialize(&content);

        assert_eq!(
            first
                .redirects
                .iter()
                .map(|redirect| redirect.from.as_str())
                .collect::<Vec<_>>(),
            vec![
                "Lib, Version=1.0.0.0, Culture=neutral, PublicKeyToken=null",
                "Lib, Version=1.1.0.0, Culture=neutral, PublicKeyToken=null",
            ]
        );
        assert_eq!(first.redirects, second.redirects);
        assert_eq!(second.copied, 0);
    }

    #[test]
    fn existing_target_is_kept() {
        let temp = tempfile::tempdir().unwrap();
        let source = temp.path().join("deps").join("Lib.dll");
        let target = temp.path().join("work").join("Lib.dll");
        fs::create_dir_all(source.parent().unwrap()).unwrap();
        fs::write(&source, b"new").unwrap();
        fs::create_dir_all(target.parent().unwrap()).unwrap();
        fs::write(&target, b"old").unwrap();

        let content = DependencyContent::new().with_item(DependencyItem::new(&source));
        let outcome = Materializer::new(target.parent().unwrap(), "xml").materialize(&content);

        assert_eq!(outcome.copied, 0);
        assert_eq!(fs::read(&target).unwrap(), b"old");
    }

    #[test]
    fn read_only_source() {
        let temp = tempfile::tempdir().unwrap();
        let source = temp.path().join("deps").join("Lib.dll");
        touch(&source);
        let mut permissions = fs::metadata(&source).unwrap().permissions();
        permissions.set_readonly(true);
        fs::set_permissions(&source, permissions).unwrap();

        let work = temp.path().join("work");
        let content = DependencyContent::new().with_item(DependencyItem::new(&source));
        let outcome = Materializer::new(&work, "xml").materialize(&content);

        assert_eq!(outcome.copied, 1);
        assert!(!fs::metadata(work.join("Lib.dll"))
            .unwrap()
            .permissions()
            .readonly());
    }

    #[test]
    fn copy_failure_is_isolated() {
        let temp = tempfile::tempdir().unwrap();
        let deps = temp.path().join("deps");
        touch(&deps.join("Util.dll"));

        let work = temp.path().join("work");
        let content = DependencyContent::new()
            .with_item(DependencyItem::new(deps.join("Missing.dll")))
            .with_item(DependencyItem::new(""))
            .with_item(DependencyItem::new(deps.join("Util.dll")));

        let outcome = Materializer::new(&work, "xml").materialize(&content);

        assert_eq!(outcome.copied, 1);
        assert_eq!(outcome.failures.len(), 1);
        assert!(matches!(
            &outcome.failures[0],
            ResolutionFailure::CopyFailed { target, .. } if *target == work.join("Missing.dll")
        ));
    }
}
