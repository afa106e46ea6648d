//! Resolution pass configuration.
//!
//! [`ResolverOptions`] collects the knobs of a pass that are not part of its inputs: the
//! name of the base runtime library, the system store markers, the file extensions probed,
//! how discovered duplicates are treated and how long a single metadata read may take.

use std::time::Duration;

/// How a discovered dependency is treated when its file is already known to the pass.
///
/// A file is known when it is the location of an explicitly declared dependency or of one of
/// the primary reference assemblies. A file discovered twice is recorded once under either
/// policy, and merged content never lists a location twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    /// Do not report a dependency whose location is already known. Its own references are
    /// still walked and a version redirect is still recorded.
    #[default]
    SkipKnownLocations,
    /// Report a discovered dependency even if an explicit entry or a primary assembly lives at
    /// the same file. The merged content keeps the explicit entry.
    KeepAll,
}

/// Configuration for a resolution pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverOptions {
    /// Name prefix of the base runtime library of the desktop framework. References
    /// starting with it (ignoring case) are never resolved.
    pub base_runtime_name: String,

    /// Path fragments identifying the system-wide assembly store, matched ignoring case
    /// against resolved paths.
    pub system_store_markers: Vec<String>,

    /// File extensions probed for each requested assembly, in order, without the dot.
    pub probe_extensions: Vec<String>,

    /// Extension of the documentation comment file next to an assembly, without the dot.
    pub comment_extension: String,

    /// Treatment of discovered dependencies whose file is already known.
    pub duplicate_policy: DuplicatePolicy,

    /// Upper bound for a single metadata read. `None` reads without a bound.
    pub read_timeout: Option<Duration>,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            base_runtime_name: "mscorlib".to_string(),
            system_store_markers: vec![
                "GAC_MSIL".to_string(),
                "GAC_32".to_string(),
                "GAC_64".to_string(),
            ],
            probe_extensions: vec!["dll".to_string(), "exe".to_string()],
            comment_extension: "xml".to_string(),
            duplicate_policy: DuplicatePolicy::SkipKnownLocations,
            read_timeout: Some(Duration::from_secs(30)),
        }
    }
}

impl ResolverOptions {
    /// Reports discovered dependencies that are also declared explicitly and reads without a
    /// time bound.
    ///
    /// Matches the behavior of build setups that expect discovered entries to be listed even
    /// when an explicit entry names the same file.
    #[must_use]
    pub fn legacy() -> Self {
        Self {
            duplicate_policy: DuplicatePolicy::KeepAll,
            read_timeout: None,
            ..Self::default()
        }
    }

    /// Keeps locations unique and gives up on a metadata read after 10 seconds.
    #[must_use]
    pub fn strict() -> Self {
        Self {
            duplicate_policy: DuplicatePolicy::SkipKnownLocations,
            read_timeout: Some(Duration::from_secs(10)),
            ..Self::default()
        }
    }

    /// Returns true if `path` contains one of the system store markers.
    #[must_use]
    pub fn is_system_store_path(&self, path: &str) -> bool {
        let path = path.to_ascii_lowercase();
        self.system_store_markers
            .iter()
            .any(|marker| path.contains(&marker.to_ascii_lowercase()))
    }

    /// Returns true if `name` is the base runtime library, or one of its variants.
    #[must_use]
    pub fn is_base_runtime(&self, name: &str) -> bool {
        !self.base_runtime_name.is_empty()
            && name.len() >= self.base_runtime_name.len()
            && name.as_bytes()[..self.base_runtime_name.len()]
                .eq_ignore_ascii_case(self.base_runtime_name.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets() {
        let default = ResolverOptions::default();
        assert_eq!(default.duplicate_policy, DuplicatePolicy::SkipKnownLocations);
        assert_eq!(default.read_timeout, Some(Duration::from_secs(30)));
        assert_eq!(default.probe_extensions, vec!["dll", "exe"]);

        let legacy = ResolverOptions::legacy();
        assert_eq!(legacy.duplicate_policy, DuplicatePolicy::KeepAll);
        assert_eq!(legacy.read_timeout, None);
        assert_eq!(legacy.base_runtime_name, "mscorlib");

        assert_eq!(
            ResolverOptions::strict().read_timeout,
            Some(Duration::from_secs(10))
        );
    }

    #[test]
    fn system_store_markers() {
        let options = ResolverOptions::default();

        assert!(options.is_system_store_path(
            r"C:\Windows\Microsoft.NET\assembly\GAC_MSIL\System\v4.0_4.0.0.0__b77a5c561934e089\System.dll"
        ));
        assert!(options.is_system_store_path("/mnt/windows/assembly/gac_32/Native/Native.dll"));
        assert!(!options.is_system_store_path("/work/lib/GAC/Lib.dll"));
        assert!(!options.is_system_store_path("/work/lib/Lib.dll"));
    }

    #[test]
    fn base_runtime() {
        let options = ResolverOptions::default();

        assert!(options.is_base_runtime("mscorlib"));
        assert!(options.is_base_runtime("MSCorLib"));
        assert!(options.is_base_runtime("mscorlib.resources"));
        assert!(!options.is_base_runtime("System"));
        assert!(!options.is_base_runtime("mscor"));

        let disabled = ResolverOptions {
            base_runtime_name: String::new(),
            ..ResolverOptions::default()
        };
        assert!(!disabled.is_base_runtime("mscorlib"));
    }
}
