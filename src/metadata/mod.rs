//! Assembly metadata: identities and the readers that produce them.
//!
//! This module holds everything the resolution engine needs to know about a single
//! assembly file, and nothing about how the files relate to each other.
//!
//! # Key Components
//!
//! - [`identity`] - Assembly names, versions and public key tokens
//! - [`reader`] - The [`AssemblyMetadataReader`] capability and the data it returns
//! - [`CilMetadataReader`] - Reader parsing ECMA-335 metadata straight from PE files
//! - [`TimeoutReader`] - Wrapper bounding every read of another reader in time
//!
//! # Examples
//!
//! ```rust,no_run
//! use dotdeps::metadata::{AssemblyMetadataReader, CilMetadataReader, TimeoutReader};
//! use std::{path::Path, sync::Arc, time::Duration};
//!
//! let reader = TimeoutReader::new(Arc::new(CilMetadataReader::new()), Duration::from_secs(5));
//! let metadata = reader.read(Path::new("Library.dll"))?;
//!
//! println!("Assembly: {}", metadata.identity);
//! println!("References: {}", metadata.references.len());
//! # Ok::<(), dotdeps::Error>(())
//! ```

mod cil;
/// Assembly identities, versions and public key tokens
pub mod identity;
/// The metadata reading capability and its output
pub mod reader;
mod timeout;

pub use cil::{AssemblyFlags, CilMetadataReader};
pub use reader::{AssemblyMetadata, AssemblyMetadataReader, AttributeValue, CustomAttributeInfo};
pub use timeout::TimeoutReader;
