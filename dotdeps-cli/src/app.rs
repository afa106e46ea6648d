use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// dotdeps - .NET assembly dependency resolution for documentation builds
#[derive(Debug, Parser)]
#[command(name = "dotdeps", version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOptions,

    #[command(subcommand)]
    pub command: Command,
}

/// Options shared across all subcommands.
#[derive(Debug, Parser)]
pub struct GlobalOptions {
    /// Emit output as JSON instead of human-readable text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable verbose (debug-level) logging output.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Resolve the transitive dependencies of one or more assemblies.
    Resolve {
        /// Assembly files, or directories scanned recursively for .exe/.dll files.
        #[arg(value_name = "ASSEMBLY", required = true)]
        paths: Vec<PathBuf>,

        /// Framework kind: DotNet, Silverlight, Portable, Compact, ScriptSharp.
        #[arg(short, long, default_value = "DotNet")]
        framework: String,

        /// Framework version (e.g. 4.0, v5.0, 4.0.50826).
        #[arg(long = "framework-version", default_value = "4.0")]
        version: String,

        /// The framework's own reference assembly directory (Portable, Compact, Script#).
        #[arg(long, value_name = "DIR")]
        assembly_dir: Option<PathBuf>,

        /// Directory with explicit dependencies. May be repeated.
        #[arg(short = 'd', long = "dependency-dir", value_name = "DIR")]
        dependency_dirs: Vec<PathBuf>,

        /// Binding source directory, probed last for link groups. May be repeated.
        #[arg(long = "binding-source", value_name = "DIR")]
        binding_sources: Vec<PathBuf>,

        /// Treat the assemblies as a link group, enabling binding sources.
        #[arg(long)]
        link: bool,

        /// Copy the dependencies into this directory.
        #[arg(short, long, value_name = "DIR")]
        working_dir: Option<PathBuf>,

        /// Extract XAML namespace definitions from the assemblies.
        #[arg(long)]
        xaml: bool,

        /// Also list dependencies that are declared explicitly, and read without a timeout.
        #[arg(long)]
        legacy: bool,
    },

    /// Display the identity, references and XAML namespaces of an assembly.
    Identity {
        /// Path to the .NET assembly file.
        #[arg(value_name = "FILE")]
        path: PathBuf,
    },
}
