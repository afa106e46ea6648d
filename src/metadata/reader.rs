//! The metadata reading capability consumed by the resolution pass.
//!
//! A resolution pass only needs three things from an assembly file: who it is, whom it
//! references, and which assembly-level custom attributes it carries. [`AssemblyMetadataReader`]
//! is the seam for that; [`crate::metadata::CilMetadataReader`] implements it by parsing the
//! file, tests substitute an in-memory reader, and [`crate::metadata::TimeoutReader`] wraps any
//! reader to bound each read in time.

use std::{path::Path, sync::Arc};

use crate::{metadata::identity::AssemblyIdentity, Result};

/// A decoded fixed argument of a custom attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    /// `string` argument. `None` is the null string.
    String(Option<String>),
    /// `bool` argument.
    Boolean(bool),
    /// `char` argument, as its UTF-16 code unit.
    Char(u16),
    /// Any signed or unsigned integer argument up to 64 bits.
    Integer(i128),
    /// `float` or `double` argument.
    Float(f64),
    /// `System.Type` argument, carried as its serialized type name.
    Type(Option<String>),
    /// An argument whose encoding depends on information not available without loading
    /// another assembly (enums, boxed objects, arrays). Decoding stops at the first one.
    Unsupported,
}

impl AttributeValue {
    /// Returns the string payload if this is a non-null string argument.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::String(Some(value)) => Some(value),
            _ => None,
        }
    }
}

/// An assembly-level custom attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomAttributeInfo {
    /// Namespace of the attribute type, e.g. `System.Windows.Markup`.
    pub namespace: String,
    /// Simple name of the attribute type, e.g. `XmlnsDefinitionAttribute`.
    pub name: String,
    /// Constructor arguments in declaration order.
    pub fixed_args: Vec<AttributeValue>,
}

impl CustomAttributeInfo {
    /// Returns the namespace-qualified type name.
    #[must_use]
    pub fn full_name(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.namespace, self.name)
        }
    }
}

/// Everything a resolution pass reads from one assembly file.
#[derive(Debug, Clone, PartialEq)]
pub struct AssemblyMetadata {
    /// Identity declared by the file's `Assembly` row.
    pub identity: AssemblyIdentity,
    /// Name of the module, usually the file name (`Lib.dll`).
    pub module_name: String,
    /// Referenced assemblies in declaration order.
    pub references: Vec<AssemblyIdentity>,
    /// Custom attributes attached to the assembly itself.
    pub custom_attributes: Vec<CustomAttributeInfo>,
}

/// Reads assembly metadata from a file.
///
/// Implementations must be usable from several threads, since independent resolution passes
/// may share one reader, and [`crate::metadata::TimeoutReader`] moves reads onto a worker
/// thread.
pub trait AssemblyMetadataReader: Send + Sync {
    /// Read identity, references and custom attributes of the assembly at `path`.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or is not a managed assembly.
    fn read(&self, path: &Path) -> Result<AssemblyMetadata>;
}

impl<R: AssemblyMetadataReader + ?Sized> AssemblyMetadataReader for Arc<R> {
    fn read(&self, path: &Path) -> Result<AssemblyMetadata> {
        (**self).read(path)
    }
}

impl<R: AssemblyMetadataReader + ?Sized> AssemblyMetadataReader for &R {
    fn read(&self, path: &Path) -> Result<AssemblyMetadata> {
        (**self).read(path)
    }
}
