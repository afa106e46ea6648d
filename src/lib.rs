// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
//#![deny(unsafe_code)]
// - 'file/mod.rs' uses mmap to map a file into memory

//! # dotdeps
//!
//! Dependency resolution for documenting .NET assemblies, in pure Rust.
//!
//! A documentation build reflects over a set of primary assemblies. The reflection tool needs
//! every assembly they reference, transitively, and it needs to be told when a reference asks
//! for version 1.0.0.0 of a library but only 1.2.0.0 is around. `dotdeps` computes exactly
//! that, offline and without the .NET runtime:
//!
//! - **Search planning** - ordered probe directories per framework family (desktop,
//!   Silverlight, Portable, Compact, Script#), including SDK and toolkit installs
//! - **Resolution** - locating the file of each requested identity, with system store probing
//! - **Closure** - a depth-first walk over all references, cycle safe, failure tolerant
//! - **Redirects** - requested versus resolved versions as binding redirects
//! - **Materialization** - copying dependencies into a working directory, once
//! - **XAML namespaces** - `XmlnsDefinitionAttribute` maps of markup assemblies
//!
//! Metadata is read straight from the PE image by a small ECMA-335 reader.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dotdeps::prelude::*;
//!
//! let framework = FrameworkDescriptor::new(FrameworkKind::DotNet, FrameworkVersion::new(4, 0))
//!     .with_platform(PlatformPaths::from_env());
//!
//! let result = ReferenceResolver::new(CilMetadataReader::new())
//!     .framework(framework)
//!     .reference(ReferenceItem::new("bin/App.exe"))
//!     .dependencies(DependencyContent::new().with_path("lib"))
//!     .working_dir("obj/dependencies")
//!     .resolve()?;
//!
//! for item in &result.discovered {
//!     println!("{}", item.name);
//! }
//! for failure in &result.failures {
//!     eprintln!("{}", failure);
//! }
//! # Ok::<(), dotdeps::Error>(())
//! ```
//!
//! ### Reading a single assembly
//!
//! ```rust,no_run
//! use dotdeps::metadata::{AssemblyMetadataReader, CilMetadataReader};
//! use std::path::Path;
//!
//! let metadata = CilMetadataReader::new().read(Path::new("bin/App.exe"))?;
//! println!("{}", metadata.identity);
//! for reference in &metadata.references {
//!     println!("  -> {}", reference);
//! }
//! # Ok::<(), dotdeps::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`prelude`] - Convenient re-exports of commonly used types and traits
//! - [`framework`] - Target framework descriptions and host install locations
//! - [`metadata`] - Assembly identities and the metadata reader
//! - [`resolution`] - The resolution pass and its components
//! - [`Error`] and [`Result`] - Error handling
//!
//! ## Logging
//!
//! The crate logs through the [`log`](https://docs.rs/log) facade. Recorded dependencies and
//! redirects are logged at `info`, unresolvable references at `warn`, probing details at
//! `debug`. Install any logger to see them.
//!
//! ## Error Handling
//!
//! All fallible operations return [`Result<T>`]. A resolution pass only fails for
//! configuration problems; everything else ends up in
//! [`resolution::ResolutionResult::failures`].
#[macro_use]
pub(crate) mod error;
pub(crate) mod file;

/// Shared functionality which is used in unit- and integration-tests
#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types and traits.
///
/// # Example
///
/// ```rust,no_run
/// use dotdeps::prelude::*;
///
/// let identity = AssemblyIdentity::parse("Lib, Version=1.2.0.0, Culture=neutral, PublicKeyToken=null")?;
/// println!("{}", identity.version);
/// # Ok::<(), dotdeps::Error>(())
/// ```
pub mod prelude;

/// Target frameworks and the host locations their assemblies are installed to.
pub mod framework;

/// Assembly identities and reading them from ECMA-335 metadata.
///
/// # Key Components
///
/// - [`metadata::identity`] - Names, versions, cultures and public key tokens
/// - [`metadata::AssemblyMetadataReader`] - The reading capability resolution is built on
/// - [`metadata::CilMetadataReader`] - Reads PE images
/// - [`metadata::TimeoutReader`] - Bounds reads in time
pub mod metadata;

/// Dependency resolution passes.
///
/// See [`resolution::ReferenceResolver`] for the entry point.
pub mod resolution;

/// `dotdeps` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// `dotdeps` Error type
///
/// # Examples
///
/// ```rust,no_run
/// use dotdeps::prelude::*;
///
/// let result = ReferenceResolver::new(CilMetadataReader::new())
///     .reference(ReferenceItem::new("bin/App.exe"))
///     .resolve();
///
/// match result {
///     Ok(result) => println!("{} dependencies", result.discovered.len()),
///     Err(Error::Configuration(message)) => println!("Configuration: {}", message),
///     Err(e) => println!("Error: {}", e),
/// }
/// ```
pub use error::Error;

/// Low-level access to PE images and metadata blobs.
pub use file::{parser::Parser, File};
