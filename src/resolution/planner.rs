//! Search directory planning.
//!
//! The planner turns a [`FrameworkDescriptor`] and the directories known from the inputs into
//! the ordered list of directories the resolver probes. The order is:
//!
//! 1. Directories of the primary reference assemblies
//! 2. Explicitly configured dependency directories
//! 3. Installation directories of the framework, from its [`ProbeRule`] table
//! 4. Extension library directories of the framework family, from the same table
//! 5. Binding source directories of link and embedded groups
//!
//! Directories that do not exist are dropped, as are repeated ones. Framework directories
//! are versioned; when the exact version is not installed a rule may fall back to a
//! compatible version of the same major release.

use std::{
    collections::HashSet,
    env, fs,
    path::{Path, PathBuf, MAIN_SEPARATOR},
};

use crate::{
    framework::{FrameworkDescriptor, FrameworkKind, FrameworkVersion},
    Error, Result,
};

/// The directory a [`ProbeRule`] template is resolved against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeRoot {
    /// The native `Program Files` directory.
    ProgramFiles,
    /// `Program Files` for 32-bit software.
    ProgramFiles32,
    /// The framework's own assembly directory.
    AssemblyDir,
}

/// One versioned installation directory of a framework family.
///
/// Templates use `/` as separator and may contain `{version}` (the version as given, e.g.
/// `5.1.10411.0`) and `{short}` (`5.1`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeRule {
    /// Only apply to this major version.
    pub major: Option<u16>,
    /// Directory the template is resolved against.
    pub root: ProbeRoot,
    /// Relative directory template.
    pub template: &'static str,
    /// Known `(major, minor)` versions to fall back to when the exact directory is missing.
    /// The nearest lower minor of the same major is used.
    pub fallbacks: &'static [(u16, u16)],
    /// Subdirectories probed after the directory itself.
    pub children: &'static [&'static str],
    /// The directory holds one subdirectory per release, named after its date (`Apr10`,
    /// `Nov 2011`); the `Bin` directory of the latest one is probed.
    pub latest_dated: bool,
}

impl ProbeRule {
    const fn new(root: ProbeRoot, template: &'static str) -> Self {
        Self {
            major: None,
            root,
            template,
            fallbacks: &[],
            children: &[],
            latest_dated: false,
        }
    }

    const fn major(mut self, major: u16) -> Self {
        self.major = Some(major);
        self
    }

    const fn fallbacks(mut self, fallbacks: &'static [(u16, u16)]) -> Self {
        self.fallbacks = fallbacks;
        self
    }

    const fn children(mut self, children: &'static [&'static str]) -> Self {
        self.children = children;
        self
    }

    const fn latest_dated(mut self) -> Self {
        self.latest_dated = true;
        self
    }

    /// Existing directories produced by this rule for `framework`, in probing order.
    #[must_use]
    pub fn expand(&self, framework: &FrameworkDescriptor) -> Vec<PathBuf> {
        let version = &framework.version;
        if self.major.is_some_and(|major| major != version.major) {
            return Vec::new();
        }

        let root = match self.root {
            ProbeRoot::ProgramFiles => framework.platform.program_files.as_deref(),
            ProbeRoot::ProgramFiles32 => framework.platform.program_files_32(),
            ProbeRoot::AssemblyDir => framework.assembly_dir.as_deref(),
        };
        let Some(root) = root else {
            return Vec::new();
        };

        let mut dir = join_template(root, self.template, &version.to_string(), &version.short());
        if !dir.is_dir() {
            let Some((major, minor)) = self.fallback(version) else {
                return Vec::new();
            };

            let short = format!("{}.{}", major, minor);
            dir = join_template(root, self.template, &short, &short);
            if !dir.is_dir() {
                return Vec::new();
            }
            log::debug!("Falling back to {} for framework {}", dir.display(), version);
        }

        if self.latest_dated {
            let Some(latest) = latest_dated_dir(&dir) else {
                return Vec::new();
            };
            dir = latest.join("Bin");
        }

        let mut dirs = vec![dir.clone()];
        for child in self.children {
            dirs.push(join_template(&dir, child, "", ""));
        }
        dirs.retain(|dir| dir.is_dir());
        dirs
    }

    fn fallback(&self, version: &FrameworkVersion) -> Option<(u16, u16)> {
        self.fallbacks
            .iter()
            .filter(|(major, minor)| *major == version.major && *minor < version.minor)
            .max_by_key(|(_, minor)| *minor)
            .copied()
    }
}

const SILVERLIGHT_FALLBACKS: &[(u16, u16)] = &[(5, 0)];

static SILVERLIGHT_RULES: &[ProbeRule] = &[
    ProbeRule::new(ProbeRoot::ProgramFiles32, "Microsoft Silverlight/{version}"),
    ProbeRule::new(
        ProbeRoot::ProgramFiles32,
        "Reference Assemblies/Microsoft/Framework/Silverlight/v{short}",
    )
    .fallbacks(SILVERLIGHT_FALLBACKS),
    ProbeRule::new(ProbeRoot::ProgramFiles32, "Microsoft SDKs/Silverlight/v{short}")
        .fallbacks(SILVERLIGHT_FALLBACKS)
        .children(&["Libraries/Client", "Libraries/Server"]),
    // Blend 3
    ProbeRule::new(
        ProbeRoot::ProgramFiles32,
        "Microsoft SDKs/Expression/Blend 3/Interactivity/Libraries/Silverlight",
    )
    .major(3),
    ProbeRule::new(
        ProbeRoot::ProgramFiles32,
        "Microsoft SDKs/Expression/Blend 3/Prototyping/Libraries/Silverlight",
    )
    .major(3),
    // RIA Services, Toolkit, Blend 4
    ProbeRule::new(
        ProbeRoot::ProgramFiles32,
        "Microsoft SDKs/RIA Services/v1.0/Libraries/Silverlight",
    )
    .major(4),
    ProbeRule::new(ProbeRoot::ProgramFiles32, "Microsoft SDKs/Silverlight/v4.0/Toolkit")
        .major(4)
        .latest_dated(),
    ProbeRule::new(
        ProbeRoot::ProgramFiles32,
        "Microsoft SDKs/Expression/Blend/Silverlight/v4.0/Libraries",
    )
    .major(4),
    // RIA Services, Toolkit, Blend 5
    ProbeRule::new(
        ProbeRoot::ProgramFiles32,
        "Microsoft SDKs/RIA Services/v1.0/Libraries/Silverlight",
    )
    .major(5),
    ProbeRule::new(ProbeRoot::ProgramFiles32, "Microsoft SDKs/Silverlight/v5.0/Toolkit")
        .major(5)
        .latest_dated(),
    ProbeRule::new(
        ProbeRoot::ProgramFiles32,
        "Microsoft SDKs/Expression/Blend/Silverlight/v5.0/Libraries",
    )
    .major(5),
];

static DESKTOP_RULES: &[ProbeRule] = &[
    ProbeRule::new(
        ProbeRoot::ProgramFiles,
        "Microsoft SDKs/Expression/Blend 3/Interactivity/Libraries/.NETFramework",
    )
    .major(3),
    ProbeRule::new(
        ProbeRoot::ProgramFiles,
        "Microsoft SDKs/Expression/Blend/.NETFramework/v4.0/Libraries",
    )
    .major(4),
];

static ASSEMBLY_DIR_RULES: &[ProbeRule] = &[ProbeRule::new(ProbeRoot::AssemblyDir, "")];

/// The ordered directories to probe, and whether the system store is probed after them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPlan {
    /// Existing directories in probing order.
    pub directories: Vec<PathBuf>,
    /// Roots of the system store, probed after `directories`. Empty when the framework
    /// family does not use the store.
    pub system_store_roots: Vec<PathBuf>,
}

impl SearchPlan {
    /// Returns true if the resolver falls back to the system store.
    #[must_use]
    pub fn uses_system_store(&self) -> bool {
        !self.system_store_roots.is_empty()
    }

    /// The directories as absolute paths with a trailing separator, the form reflection
    /// configurations expect.
    #[must_use]
    pub fn exported_directories(&self) -> Vec<String> {
        let cwd = env::current_dir().ok();

        self.directories
            .iter()
            .map(|dir| {
                let absolute = match &cwd {
                    Some(cwd) if dir.is_relative() => cwd.join(dir),
                    _ => dir.clone(),
                };

                let mut exported = absolute.to_string_lossy().into_owned();
                if !exported.ends_with(MAIN_SEPARATOR) && !exported.ends_with('/') {
                    exported.push(MAIN_SEPARATOR);
                }
                exported
            })
            .collect()
    }
}

/// Builds a [`SearchPlan`] for one framework.
pub struct SearchPathPlanner<'a> {
    framework: &'a FrameworkDescriptor,
}

impl<'a> SearchPathPlanner<'a> {
    /// Create a planner for `framework`.
    #[must_use]
    pub fn new(framework: &'a FrameworkDescriptor) -> Self {
        Self { framework }
    }

    /// The probing rules of a framework family.
    ///
    /// # Errors
    /// Returns [`Error::Configuration`] for [`FrameworkKind::Other`].
    pub fn rules(kind: &FrameworkKind) -> Result<&'static [ProbeRule]> {
        match kind {
            FrameworkKind::DotNet => Ok(DESKTOP_RULES),
            FrameworkKind::Silverlight => Ok(SILVERLIGHT_RULES),
            FrameworkKind::Portable | FrameworkKind::Compact | FrameworkKind::ScriptSharp => {
                Ok(ASSEMBLY_DIR_RULES)
            }
            FrameworkKind::Other(name) => Err(Error::Configuration(format!(
                "The framework kind '{}' is not supported.",
                name
            ))),
        }
    }

    /// Plan the search directories.
    ///
    /// `reference_dirs` are the directories of the primary assemblies, `explicit_dirs` the
    /// configured dependency directories and `binding_sources` the extra directories of link
    /// and embedded groups (empty for other groups).
    ///
    /// # Errors
    /// Returns [`Error::Configuration`] if the framework kind is not supported. Missing
    /// directories are never an error.
    pub fn plan(
        &self,
        reference_dirs: &[PathBuf],
        explicit_dirs: &[PathBuf],
        binding_sources: &[PathBuf],
    ) -> Result<SearchPlan> {
        let rules = Self::rules(&self.framework.kind)?;

        let mut plan = SearchPlan::default();
        let mut seen = HashSet::new();
        let mut add = |dir: PathBuf| {
            if dir.as_os_str().is_empty() {
                return;
            }
            if !dir.is_dir() {
                log::debug!("Skipping missing search directory {}", dir.display());
                return;
            }
            if seen.insert(dir.clone()) {
                plan.directories.push(dir);
            }
        };

        reference_dirs.iter().cloned().for_each(&mut add);
        explicit_dirs.iter().cloned().for_each(&mut add);
        rules
            .iter()
            .flat_map(|rule| rule.expand(self.framework))
            .for_each(&mut add);
        binding_sources.iter().cloned().for_each(&mut add);

        if self.framework.kind.uses_system_store() {
            plan.system_store_roots = self.framework.platform.system_store_roots.clone();
        }

        Ok(plan)
    }
}

fn join_template(root: &Path, template: &str, version: &str, short: &str) -> PathBuf {
    let relative = template.replace("{version}", version).replace("{short}", short);

    let mut path = root.to_path_buf();
    for component in relative.split('/').filter(|component| !component.is_empty()) {
        path.push(component);
    }
    path
}

const MONTHS: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

/// Parses release directory names such as `Apr10`, `Nov 2011` or `December-2011` into
/// `(year, month)`.
fn parse_release_date(name: &str) -> Option<(u16, u8)> {
    let letters = name
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(name.len());
    if letters < 3 {
        return None;
    }

    let month_name = name[..letters].to_ascii_lowercase();
    let month = MONTHS
        .iter()
        .position(|month| month.starts_with(&month_name))?;

    let year_text = name[letters..].trim_start_matches([' ', '-', '_']);
    if !year_text.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let year = match year_text.len() {
        2 => 2000 + year_text.parse::<u16>().ok()?,
        4 => year_text.parse::<u16>().ok()?,
        _ => return None,
    };

    Some((year, month as u8 + 1))
}

fn latest_dated_dir(dir: &Path) -> Option<PathBuf> {
    fs::read_dir(dir)
        .ok()?
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.path().is_dir())
        .filter_map(|entry| {
            let date = parse_release_date(&entry.file_name().to_string_lossy())?;
            Some((date, entry.path()))
        })
        .max_by_key(|(date, _)| *date)
        .map(|(_, path)| path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::PlatformPaths;

    fn silverlight(root: &Path, version: &str) -> FrameworkDescriptor {
        FrameworkDescriptor::new(
            FrameworkKind::Silverlight,
            FrameworkVersion::parse(version).unwrap(),
        )
        .with_platform(PlatformPaths {
            program_files: Some(root.join("Program Files")),
            program_files_x86: Some(root.join("Program Files (x86)")),
            system_store_roots: vec![root.join("Windows/assembly")],
        })
    }

    fn mkdir(path: &Path) -> PathBuf {
        fs::create_dir_all(path).unwrap();
        path.to_path_buf()
    }

    #[test]
    fn release_dates() {
        assert_eq!(parse_release_date("Apr10"), Some((2010, 4)));
        assert_eq!(parse_release_date("Nov 2011"), Some((2011, 11)));
        assert_eq!(parse_release_date("december-2011"), Some((2011, 12)));
        assert_eq!(parse_release_date("Sept 2009"), Some((2009, 9)));
        assert_eq!(parse_release_date("Bin"), None);
        assert_eq!(parse_release_date("Ma10"), None);
        assert_eq!(parse_release_date("Apr"), None);
        assert_eq!(parse_release_date("Apr123"), None);
    }

    #[test]
    fn ordering_and_filtering() {
        let temp = tempfile::tempdir().unwrap();
        let app = mkdir(&temp.path().join("app"));
        let deps = mkdir(&temp.path().join("deps"));
        let links = mkdir(&temp.path().join("links"));
        let pf = temp.path().join("Program Files (x86)");
        let runtime = mkdir(&pf.join("Microsoft Silverlight").join("4.0.50917.0"));
        let reference = mkdir(&pf.join("Reference Assemblies/Microsoft/Framework/Silverlight/v4.0"));
        let sdk = mkdir(&pf.join("Microsoft SDKs/Silverlight/v4.0"));
        let client = mkdir(&sdk.join("Libraries").join("Client"));
        let ria = mkdir(&pf.join("Microsoft SDKs/RIA Services/v1.0/Libraries/Silverlight"));

        let framework = silverlight(temp.path(), "4.0.50917.0");
        let plan = SearchPathPlanner::new(&framework)
            .plan(
                &[app.clone(), app.clone()],
                &[deps.clone(), temp.path().join("missing")],
                &[links.clone()],
            )
            .unwrap();

        assert_eq!(
            plan.directories,
            vec![app, deps, runtime, reference, sdk, client, ria, links]
        );
        assert!(!plan.uses_system_store());
    }

    #[test]
    fn silverlight_minor_fallback() {
        let temp = tempfile::tempdir().unwrap();
        let pf = temp.path().join("Program Files (x86)");
        let reference = mkdir(&pf.join("Reference Assemblies/Microsoft/Framework/Silverlight/v5.0"));
        let sdk = mkdir(&pf.join("Microsoft SDKs/Silverlight/v5.0"));
        let server = mkdir(&sdk.join("Libraries").join("Server"));

        let plan = SearchPathPlanner::new(&silverlight(temp.path(), "5.1"))
            .plan(&[], &[], &[])
            .unwrap();
        assert_eq!(plan.directories, vec![reference.clone(), sdk.clone(), server]);

        // 4.1 has no fallback edge
        mkdir(&pf.join("Reference Assemblies/Microsoft/Framework/Silverlight/v4.0"));
        let plan = SearchPathPlanner::new(&silverlight(temp.path(), "4.1"))
            .plan(&[], &[], &[])
            .unwrap();
        assert!(plan.directories.is_empty());
    }

    #[test]
    fn silverlight_latest_toolkit() {
        let temp = tempfile::tempdir().unwrap();
        let sdk = temp
            .path()
            .join("Program Files (x86)/Microsoft SDKs/Silverlight/v5.0");
        let toolkit = sdk.join("Toolkit");
        mkdir(&toolkit.join("Apr10").join("Bin"));
        let latest = mkdir(&toolkit.join("Dec11").join("Bin"));
        mkdir(&toolkit.join("Nov 2011").join("Bin"));
        mkdir(&toolkit.join("Samples"));

        let plan = SearchPathPlanner::new(&silverlight(temp.path(), "5.0"))
            .plan(&[], &[], &[])
            .unwrap();
        assert_eq!(plan.directories, vec![sdk, latest]);
    }

    #[test]
    fn desktop_extensions_and_store() {
        let temp = tempfile::tempdir().unwrap();
        let blend = mkdir(
            &temp
                .path()
                .join("Program Files/Microsoft SDKs/Expression/Blend/.NETFramework/v4.0/Libraries"),
        );

        let framework = FrameworkDescriptor::new(FrameworkKind::DotNet, FrameworkVersion::new(4, 0))
            .with_platform(PlatformPaths {
                program_files: Some(temp.path().join("Program Files")),
                program_files_x86: None,
                system_store_roots: vec![temp.path().join("Windows/assembly")],
            });

        let plan = SearchPathPlanner::new(&framework).plan(&[], &[], &[]).unwrap();
        assert_eq!(plan.directories, vec![blend]);
        assert!(plan.uses_system_store());

        let v3 = FrameworkDescriptor {
            version: FrameworkVersion::new(3, 5),
            ..framework
        };
        let plan = SearchPathPlanner::new(&v3).plan(&[], &[], &[]).unwrap();
        assert!(plan.directories.is_empty());
    }

    #[test]
    fn assembly_dir_kinds() {
        let temp = tempfile::tempdir().unwrap();
        let assemblies = mkdir(&temp.path().join("portable"));

        for kind in [
            FrameworkKind::Portable,
            FrameworkKind::Compact,
            FrameworkKind::ScriptSharp,
        ] {
            let framework = FrameworkDescriptor::new(kind, FrameworkVersion::new(4, 0))
                .with_assembly_dir(&assemblies);
            let plan = SearchPathPlanner::new(&framework).plan(&[], &[], &[]).unwrap();
            assert_eq!(plan.directories, vec![assemblies.clone()]);
            assert!(!plan.uses_system_store());
        }

        let without_dir = FrameworkDescriptor::new(FrameworkKind::Portable, FrameworkVersion::new(4, 0));
        let plan = SearchPathPlanner::new(&without_dir).plan(&[], &[], &[]).unwrap();
        assert!(plan.directories.is_empty());
    }

    #[test]
    fn unsupported_kind() {
        let framework = FrameworkDescriptor::new(
            FrameworkKind::Other("XNA".to_string()),
            FrameworkVersion::new(4, 0),
        );

        match SearchPathPlanner::new(&framework).plan(&[], &[], &[]) {
            Err(Error::Configuration(message)) => {
                assert_eq!(message, "The framework kind 'XNA' is not supported.");
            }
            other => panic!("Expected a configuration error, got {:?}", other),
        }
    }

    #[test]
    fn exported_directories() {
        let plan = SearchPlan {
            directories: vec![PathBuf::from("relative"), env::temp_dir()],
            system_store_roots: Vec::new(),
        };

        let exported = plan.exported_directories();
        assert_eq!(exported.len(), 2);
        for dir in &exported {
            assert!(Path::new(dir.trim_end_matches(MAIN_SEPARATOR)).is_absolute());
            assert!(dir.ends_with(MAIN_SEPARATOR));
        }
        assert!(exported[0].contains("relative"));
    }
}
