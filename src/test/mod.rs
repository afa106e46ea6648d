//! Shared helpers for unit tests.
//!
//! - [`builder`] produces raw ECMA-335 metadata for the CIL reader
//! - [`reader`] provides an in-memory [`crate::metadata::AssemblyMetadataReader`] and factories
//!   for identities, metadata and on-disk assembly layouts

pub mod reader;

pub use reader::{create_metadata, create_test_identity, touch, MockReader};
