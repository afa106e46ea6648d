use std::path::{Path, PathBuf};

use anyhow::Context;
use dotdeps::prelude::*;

/// Build the framework descriptor from the command line, with host locations from the
/// environment.
pub fn framework(
    kind: &str,
    version: &str,
    assembly_dir: Option<&Path>,
) -> anyhow::Result<FrameworkDescriptor> {
    let kind: FrameworkKind = kind.parse()?;
    let version = FrameworkVersion::parse(version)
        .with_context(|| format!("invalid framework version: {version}"))?;

    let mut descriptor =
        FrameworkDescriptor::new(kind, version).with_platform(PlatformPaths::from_env());
    if let Some(dir) = assembly_dir {
        descriptor = descriptor.with_assembly_dir(dir);
    }
    Ok(descriptor)
}

/// Expand the inputs: files are kept, directories are scanned for `.exe` and `.dll` files.
pub fn collect_inputs(paths: &[PathBuf]) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            collect_assemblies(path, &mut files)?;
        } else {
            files.push(path.clone());
        }
    }
    Ok(files)
}

fn collect_assemblies(dir: &Path, files: &mut Vec<PathBuf>) -> anyhow::Result<()> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?;

    let mut found = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.is_dir() {
            collect_assemblies(&path, files)?;
        } else if is_assembly_file(&path) {
            found.push(path);
        }
    }
    found.sort();
    files.extend(found);
    Ok(())
}

/// Returns true if the path has an `.exe` or `.dll` extension, ignoring case.
pub fn is_assembly_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("exe") || e.eq_ignore_ascii_case("dll"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assembly_extensions() {
        assert!(is_assembly_file(Path::new("bin/App.EXE")));
        assert!(is_assembly_file(Path::new("Lib.dll")));
        assert!(!is_assembly_file(Path::new("Lib.xml")));
        assert!(!is_assembly_file(Path::new("Lib")));
    }

    #[test]
    fn framework_from_arguments() {
        let descriptor = framework("silverlight", "v5.0", None).unwrap();
        assert_eq!(descriptor.kind, FrameworkKind::Silverlight);
        assert_eq!(descriptor.version, FrameworkVersion::new(5, 0));

        assert!(framework("DotNet", "four", None).is_err());
    }
}
