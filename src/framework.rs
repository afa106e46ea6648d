//! Target framework descriptors.
//!
//! A [`FrameworkDescriptor`] names the platform the documented assemblies were built against.
//! Its [`FrameworkKind`] selects the probing rules of the
//! [`crate::resolution::SearchPathPlanner`] and the skip rules of the
//! [`crate::resolution::DependencyWalker`]; its [`FrameworkVersion`] selects the versioned
//! installation directories inside those rules.
//!
//! # Examples
//!
//! ```rust
//! use dotdeps::framework::{FrameworkDescriptor, FrameworkKind, FrameworkVersion};
//!
//! let kind: FrameworkKind = "Silverlight".parse().unwrap();
//! let framework = FrameworkDescriptor::new(kind, FrameworkVersion::parse("5.1.10411.0")?);
//!
//! assert_eq!(framework.version.short(), "5.1");
//! assert_eq!(framework.version.to_string(), "5.1.10411.0");
//! # Ok::<(), dotdeps::Error>(())
//! ```

use std::{
    env, fmt,
    path::{Path, PathBuf},
    str::FromStr,
};

use strum::EnumString;

use crate::Result;

/// The family of a target framework.
///
/// Parsing is case-insensitive. Text naming no known family becomes [`FrameworkKind::Other`],
/// which parses fine but is rejected when a search plan is built.
#[derive(Debug, Clone, PartialEq, Eq, Hash, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum FrameworkKind {
    /// The desktop .NET Framework.
    #[strum(serialize = "DotNet", serialize = "desktop", serialize = ".NETFramework")]
    DotNet,
    /// Browser-hosted Silverlight.
    Silverlight,
    /// Portable class libraries.
    #[strum(serialize = "Portable", serialize = ".NETPortable")]
    Portable,
    /// The .NET Compact Framework.
    #[strum(serialize = "Compact", serialize = "CompactFramework")]
    Compact,
    /// Script# (C# compiled to script).
    #[strum(serialize = "ScriptSharp", serialize = "Script#")]
    ScriptSharp,
    /// Any framework family this crate has no rules for.
    #[strum(default)]
    Other(String),
}

impl FrameworkKind {
    /// Returns true for the desktop .NET Framework.
    #[must_use]
    pub fn is_desktop(&self) -> bool {
        matches!(self, FrameworkKind::DotNet)
    }

    /// Whether assemblies of this family may be found in the system-wide assembly store.
    #[must_use]
    pub fn uses_system_store(&self) -> bool {
        matches!(self, FrameworkKind::DotNet)
    }
}

impl fmt::Display for FrameworkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameworkKind::DotNet => write!(f, "DotNet"),
            FrameworkKind::Silverlight => write!(f, "Silverlight"),
            FrameworkKind::Portable => write!(f, "Portable"),
            FrameworkKind::Compact => write!(f, "Compact"),
            FrameworkKind::ScriptSharp => write!(f, "ScriptSharp"),
            FrameworkKind::Other(name) => write!(f, "{}", name),
        }
    }
}

/// A framework version with two to four components.
///
/// Unlike [`crate::metadata::identity::AssemblyVersion`], the components that were not given
/// are remembered: installation directories are named after the exact text
/// (`Microsoft Silverlight/5.1.10411.0`) as well as after the short form (`v5.1`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameworkVersion {
    /// Major version component.
    pub major: u16,
    /// Minor version component.
    pub minor: u16,
    /// Build component, if given.
    pub build: Option<u16>,
    /// Revision component, if given. Only present together with `build`.
    pub revision: Option<u16>,
}

impl FrameworkVersion {
    /// Create a `major.minor` version.
    #[must_use]
    pub const fn new(major: u16, minor: u16) -> Self {
        Self {
            major,
            minor,
            build: None,
            revision: None,
        }
    }

    /// Parse a dotted version of two to four components. A bare major (`"4"`) means `4.0`.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] for empty, non-numeric or over-long versions.
    pub fn parse(version: &str) -> Result<Self> {
        let version = version.trim().trim_start_matches(['v', 'V']);
        let parts = version
            .split('.')
            .map(str::parse::<u16>)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|_| malformed_error!("Invalid framework version: {}", version))?;

        match parts.as_slice() {
            [major] => Ok(Self::new(*major, 0)),
            [major, minor] => Ok(Self::new(*major, *minor)),
            [major, minor, build] => Ok(Self {
                build: Some(*build),
                ..Self::new(*major, *minor)
            }),
            [major, minor, build, revision] => Ok(Self {
                build: Some(*build),
                revision: Some(*revision),
                ..Self::new(*major, *minor)
            }),
            _ => Err(malformed_error!("Invalid framework version: {}", version)),
        }
    }

    /// The `major.minor` form used in versioned directory names.
    #[must_use]
    pub fn short(&self) -> String {
        format!("{}.{}", self.major, self.minor)
    }
}

impl fmt::Display for FrameworkVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)?;
        if let Some(build) = self.build {
            write!(f, ".{}", build)?;
            if let Some(revision) = self.revision {
                write!(f, ".{}", revision)?;
            }
        }
        Ok(())
    }
}

impl FromStr for FrameworkVersion {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Install locations of the host, the roots every framework probing rule starts from.
///
/// A missing location disables the rules rooted at it; nothing is guessed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlatformPaths {
    /// The native `Program Files` directory.
    pub program_files: Option<PathBuf>,
    /// The 32-bit `Program Files (x86)` directory on 64-bit hosts.
    pub program_files_x86: Option<PathBuf>,
    /// Roots of the system-wide assembly store, each holding `GAC_MSIL`, `GAC_32`, ...
    pub system_store_roots: Vec<PathBuf>,
}

impl PlatformPaths {
    /// Read the install locations from the environment of a Windows host.
    ///
    /// Uses `ProgramFiles`, `ProgramFiles(x86)` and `windir` (or `SystemRoot`). The system
    /// store roots are `<windir>/Microsoft.NET/assembly` and `<windir>/assembly`.
    #[must_use]
    pub fn from_env() -> Self {
        let var = |name: &str| env::var_os(name).filter(|value| !value.is_empty());

        let system_store_roots = var("windir")
            .or_else(|| var("SystemRoot"))
            .map(PathBuf::from)
            .map(|windir| {
                vec![
                    windir.join("Microsoft.NET").join("assembly"),
                    windir.join("assembly"),
                ]
            })
            .unwrap_or_default();

        Self {
            program_files: var("ProgramFiles").map(PathBuf::from),
            program_files_x86: var("ProgramFiles(x86)").map(PathBuf::from),
            system_store_roots,
        }
    }

    /// `Program Files` for 32-bit software: the x86 directory if the host has one.
    #[must_use]
    pub fn program_files_32(&self) -> Option<&Path> {
        self.program_files_x86
            .as_deref()
            .or(self.program_files.as_deref())
    }
}

/// The target framework of a resolution pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameworkDescriptor {
    /// Framework family.
    pub kind: FrameworkKind,
    /// Framework version.
    pub version: FrameworkVersion,
    /// Directory holding the framework's own reference assemblies. Required by the kinds
    /// that have no well-known installation layout (portable, compact, Script#).
    pub assembly_dir: Option<PathBuf>,
    /// Host install locations the probing rules start from.
    pub platform: PlatformPaths,
}

impl FrameworkDescriptor {
    /// Create a descriptor without an assembly directory and without host locations.
    #[must_use]
    pub fn new(kind: FrameworkKind, version: FrameworkVersion) -> Self {
        Self {
            kind,
            version,
            assembly_dir: None,
            platform: PlatformPaths::default(),
        }
    }

    /// Set the framework's own assembly directory.
    #[must_use]
    pub fn with_assembly_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.assembly_dir = Some(dir.into());
        self
    }

    /// Set the host install locations.
    #[must_use]
    pub fn with_platform(mut self, platform: PlatformPaths) -> Self {
        self.platform = platform;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_parse() {
        assert_eq!("DotNet".parse::<FrameworkKind>().unwrap(), FrameworkKind::DotNet);
        assert_eq!("desktop".parse::<FrameworkKind>().unwrap(), FrameworkKind::DotNet);
        assert_eq!("silverlight".parse::<FrameworkKind>().unwrap(), FrameworkKind::Silverlight);
        assert_eq!("Script#".parse::<FrameworkKind>().unwrap(), FrameworkKind::ScriptSharp);
        assert_eq!(
            "XNA".parse::<FrameworkKind>().unwrap(),
            FrameworkKind::Other("XNA".to_string())
        );
        assert_eq!(FrameworkKind::Other("XNA".to_string()).to_string(), "XNA");

        assert!(FrameworkKind::DotNet.is_desktop());
        assert!(FrameworkKind::DotNet.uses_system_store());
        assert!(!FrameworkKind::Silverlight.uses_system_store());
    }

    #[test]
    fn version_parse() {
        let version = FrameworkVersion::parse("5.1.10411.0").unwrap();
        assert_eq!(version.major, 5);
        assert_eq!(version.minor, 1);
        assert_eq!(version.short(), "5.1");
        assert_eq!(version.to_string(), "5.1.10411.0");

        assert_eq!(FrameworkVersion::parse("v4.0").unwrap(), FrameworkVersion::new(4, 0));
        assert_eq!(FrameworkVersion::parse("3").unwrap().to_string(), "3.0");
        assert_eq!(FrameworkVersion::parse("4.0.30319").unwrap().to_string(), "4.0.30319");

        assert!(FrameworkVersion::parse("").is_err());
        assert!(FrameworkVersion::parse("4.x").is_err());
        assert!(FrameworkVersion::parse("1.2.3.4.5").is_err());
    }

    #[test]
    fn program_files_32() {
        let mut platform = PlatformPaths {
            program_files: Some(PathBuf::from("C:/Program Files")),
            ..PlatformPaths::default()
        };
        assert_eq!(platform.program_files_32(), Some(Path::new("C:/Program Files")));

        platform.program_files_x86 = Some(PathBuf::from("C:/Program Files (x86)"));
        assert_eq!(
            platform.program_files_32(),
            Some(Path::new("C:/Program Files (x86)"))
        );

        assert_eq!(PlatformPaths::default().program_files_32(), None);
    }
}
