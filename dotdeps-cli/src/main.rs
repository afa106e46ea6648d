mod app;
mod commands;
mod output;

use anyhow::Context;
use clap::Parser;

use crate::app::{Cli, Command, GlobalOptions};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // dotdeps logs on stderr: info+ by default, warn+ with --json, debug with --verbose;
    // RUST_LOG overrides
    env_logger::Builder::new()
        .filter_module("dotdeps", log_level(&cli.global))
        .parse_default_env()
        .target(env_logger::Target::Stderr)
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(false)
        .init();

    ctrlc::set_handler(|| {
        eprintln!("\nCancelled.");
        std::process::exit(130);
    })
    .context("failed to set Ctrl+C handler")?;

    match &cli.command {
        Command::Resolve {
            paths,
            framework,
            version,
            assembly_dir,
            dependency_dirs,
            binding_sources,
            link,
            working_dir,
            xaml,
            legacy,
        } => commands::resolve::run(
            paths,
            &commands::resolve::ResolveOptions {
                framework,
                version,
                assembly_dir: assembly_dir.as_deref(),
                dependency_dirs,
                binding_sources,
                link: *link,
                working_dir: working_dir.as_deref(),
                xaml: *xaml,
                legacy: *legacy,
                global: &cli.global,
            },
        ),
        Command::Identity { path } => commands::identity::run(path, &cli.global),
    }
}

/// Unresolved references are reported as warnings, so JSON output still keeps them on stderr.
fn log_level(global: &GlobalOptions) -> log::LevelFilter {
    if global.verbose {
        log::LevelFilter::Debug
    } else if global.json {
        log::LevelFilter::Warn
    } else {
        log::LevelFilter::Info
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_output_keeps_warnings() {
        let cli = Cli::parse_from(["dotdeps", "--json", "identity", "App.dll"]);
        assert_eq!(log_level(&cli.global), log::LevelFilter::Warn);

        let cli = Cli::parse_from(["dotdeps", "identity", "App.dll"]);
        assert_eq!(log_level(&cli.global), log::LevelFilter::Info);

        let cli = Cli::parse_from(["dotdeps", "--json", "-v", "identity", "App.dll"]);
        assert_eq!(log_level(&cli.global), log::LevelFilter::Debug);
    }
}
