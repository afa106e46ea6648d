//! # dotdeps Prelude
//!
//! This module provides a convenient prelude for the most commonly used types and traits
//! from the dotdeps library. Import this module to get quick access to the essential
//! types for running resolution passes.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all dotdeps operations
pub use crate::Error;

/// The result type used throughout dotdeps
pub use crate::Result;

/// Low-level file parsing utilities
pub use crate::{File, Parser};

// ================================================================================================
// Frameworks
// ================================================================================================

/// Target framework description
pub use crate::framework::{FrameworkDescriptor, FrameworkKind, FrameworkVersion, PlatformPaths};

// ================================================================================================
// Metadata
// ================================================================================================

/// Assembly identities
pub use crate::metadata::identity::{AssemblyIdentity, AssemblyVersion, PublicKeyToken};

/// Reading assembly metadata
pub use crate::metadata::{
    AssemblyMetadata, AssemblyMetadataReader, CilMetadataReader, CustomAttributeInfo,
    TimeoutReader,
};

// ================================================================================================
// Resolution
// ================================================================================================

/// Main entry point for resolution passes
pub use crate::resolution::{ReferenceResolver, ResolutionFailure, ResolutionResult};

/// Inputs and outputs of a pass
pub use crate::resolution::{
    BindingRedirect, DependencyContent, DependencyItem, ReferenceItem, XmlnsDefinitions,
};

/// Pass configuration
pub use crate::resolution::{DuplicatePolicy, ResolverOptions};
