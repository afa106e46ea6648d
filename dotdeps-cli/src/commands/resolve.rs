use std::path::{Path, PathBuf};

use anyhow::bail;
use dotdeps::prelude::*;
use serde::Serialize;

use crate::{
    app::GlobalOptions,
    commands::common::{collect_inputs, framework},
    output::{print_output, TabWriter},
};

/// Command line settings of a resolution pass.
pub struct ResolveOptions<'a> {
    pub framework: &'a str,
    pub version: &'a str,
    pub assembly_dir: Option<&'a Path>,
    pub dependency_dirs: &'a [PathBuf],
    pub binding_sources: &'a [PathBuf],
    pub link: bool,
    pub working_dir: Option<&'a Path>,
    pub xaml: bool,
    pub legacy: bool,
    pub global: &'a GlobalOptions,
}

#[derive(Debug, Serialize)]
pub struct ResolveReport {
    pub framework: String,
    pub dependencies: Vec<DependencyInfo>,
    pub redirects: Vec<RedirectInfo>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub comment_files: Vec<String>,
    pub search_directories: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub xmlns: Vec<ModuleXmlns>,
    pub failures: Vec<String>,
    pub copied: usize,
}

#[derive(Debug, Serialize)]
pub struct DependencyInfo {
    pub name: String,
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strong_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirected_from: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RedirectInfo {
    pub name: String,
    pub from: String,
    pub to: String,
}

#[derive(Debug, Serialize)]
pub struct ModuleXmlns {
    pub module: String,
    pub definitions: usize,
}

pub fn run(paths: &[PathBuf], opts: &ResolveOptions<'_>) -> anyhow::Result<()> {
    let inputs = collect_inputs(paths)?;
    if inputs.is_empty() {
        bail!("no assemblies found in the given paths");
    }

    let framework = framework(opts.framework, opts.version, opts.assembly_dir)?;
    let framework_name = format!("{} {}", framework.kind, framework.version);

    let mut dependencies = DependencyContent::new();
    for dir in opts.dependency_dirs {
        dependencies.add_path(dir);
    }

    let mut resolver = ReferenceResolver::new(CilMetadataReader::new())
        .framework(framework)
        .references(
            inputs
                .iter()
                .map(|path| ReferenceItem::new(path).with_xaml_syntax(opts.xaml)),
        )
        .dependencies(dependencies)
        .link_group(opts.link)
        .options(if opts.legacy {
            ResolverOptions::legacy()
        } else {
            ResolverOptions::default()
        });
    for dir in opts.binding_sources {
        resolver = resolver.binding_source(dir);
    }
    if let Some(dir) = opts.working_dir {
        resolver = resolver.working_dir(dir);
    }

    let result = resolver.resolve()?;
    let report = report(framework_name, &result);

    print_output(&report, opts.global, |report| {
        println!("Framework: {}", report.framework);

        if report.dependencies.is_empty() {
            println!("\nNo dependencies found.");
        } else {
            println!("\nDependencies ({}):", report.dependencies.len());
            let mut tw = TabWriter::new(&["Name", "Redirected from", "Location"]).indent("  ");
            for dependency in &report.dependencies {
                tw.row(vec![
                    dependency.name.clone(),
                    dependency.redirected_from.clone().unwrap_or_default(),
                    dependency.location.clone(),
                ]);
            }
            tw.print();
        }

        if !report.redirects.is_empty() {
            println!("\nBinding redirects ({}):", report.redirects.len());
            for redirect in &report.redirects {
                println!("  {}", redirect.from);
                println!("    -> {}", redirect.to);
            }
        }

        if !report.xmlns.is_empty() {
            println!("\nXAML namespaces:");
            for module in &report.xmlns {
                println!("  {}: {}", module.module, module.definitions);
            }
        }

        if opts.working_dir.is_some() {
            println!("\nCopied {} files.", report.copied);
        }

        if !report.failures.is_empty() {
            println!("\nFailures ({}):", report.failures.len());
            for failure in &report.failures {
                println!("  {failure}");
            }
        }
    })
}

fn report(framework: String, result: &ResolutionResult) -> ResolveReport {
    ResolveReport {
        framework,
        dependencies: result
            .discovered
            .iter()
            .map(|item| DependencyInfo {
                name: item.name.clone(),
                location: item.location.display().to_string(),
                strong_name: item.strong_name.clone(),
                redirected_from: item.redirect_version().map(|version| version.to_string()),
            })
            .collect(),
        redirects: result
            .redirects
            .iter()
            .map(|redirect| RedirectInfo {
                name: redirect.name.clone(),
                from: redirect.from.clone(),
                to: redirect.to.clone(),
            })
            .collect(),
        comment_files: result
            .comment_files
            .iter()
            .map(|path| path.display().to_string())
            .collect(),
        search_directories: result.search_directories.clone(),
        xmlns: result
            .xmlns
            .iter()
            .map(|(module, definitions)| ModuleXmlns {
                module: module.clone(),
                definitions: definitions.len(),
            })
            .collect(),
        failures: result.failures.iter().map(ToString::to_string).collect(),
        copied: result.copied_count,
    }
}
