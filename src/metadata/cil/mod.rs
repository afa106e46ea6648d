//! [`AssemblyMetadataReader`] implementation over ECMA-335 metadata.
//!
//! [`CilMetadataReader`] memory-maps the file, finds the CLI header through the PE data
//! directory, and reads the few metadata tables a dependency walk consumes:
//!
//! - `Module` for the module name
//! - `Assembly` for the file's own identity
//! - `AssemblyRef` for the references, in declaration order
//! - `CustomAttribute` rows owned by the assembly, with their constructor resolved through
//!   `MemberRef`/`MethodDef` to `TypeRef`/`TypeDef` and their fixed arguments decoded
//!
//! Public keys are reduced to public key tokens as rows are read, so every identity this
//! reader produces carries at most a token.
//!
//! # Examples
//!
//! ```rust,no_run
//! use dotdeps::metadata::{AssemblyMetadataReader, CilMetadataReader};
//! use std::path::Path;
//!
//! let metadata = CilMetadataReader::new().read(Path::new("Library.dll"))?;
//! println!("{} ({})", metadata.identity, metadata.module_name);
//! for reference in &metadata.references {
//!     println!("  -> {}", reference);
//! }
//! # Ok::<(), dotdeps::Error>(())
//! ```

mod attributes;
mod heaps;
mod root;
mod tables;

use std::path::Path;

use crate::{
    file::{parser::Parser, File},
    metadata::{
        identity::{AssemblyIdentity, AssemblyVersion, PublicKeyToken},
        reader::{AssemblyMetadata, AssemblyMetadataReader, CustomAttributeInfo},
    },
    Error::{NotSupported, OutOfBounds},
    Result,
};
use heaps::{Blob, Strings};
use root::Root;
use tables::{CodedIndexType, TableId, TablesHeader};

#[allow(non_snake_case)]
/// All possible flags for `AssemblyFlags`
pub mod AssemblyFlags {
    /// The assembly reference holds the full (unhashed) public key
    pub const PUBLIC_KEY: u32 = 0x0001;
    /// The implementation of this assembly used at runtime is not expected to match the version seen at compile time
    pub const RETARGETABLE: u32 = 0x0100;
}

/// Reads [`AssemblyMetadata`] from managed PE files.
#[derive(Debug, Clone, Copy, Default)]
pub struct CilMetadataReader;

impl CilMetadataReader {
    /// Create a new reader.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Read the metadata of an already loaded PE file.
    ///
    /// # Errors
    /// Returns an error if the CLI header or the metadata it points to is malformed.
    pub fn read_file(&self, file: &File) -> Result<AssemblyMetadata> {
        let (clr_rva, clr_size) = file.clr();
        let clr_offset = file.rva_to_offset(clr_rva)?;
        let clr_data = file.data_slice(clr_offset, clr_size.max(16))?;

        let mut parser = Parser::new(clr_data);
        let cb = parser.read_le::<u32>()?;
        if cb < 16 {
            return Err(malformed_error!("Invalid CLR header size - {}", cb));
        }
        let _major_runtime_version = parser.read_le::<u16>()?;
        let _minor_runtime_version = parser.read_le::<u16>()?;
        let metadata_rva = parser.read_le::<u32>()?;
        let metadata_size = parser.read_le::<u32>()?;
        if metadata_rva == 0 || metadata_size == 0 {
            return Err(malformed_error!("CLR header does not point to metadata"));
        }

        let metadata_offset = file.rva_to_offset(metadata_rva as usize)?;
        let metadata = file.data_slice(metadata_offset, metadata_size as usize)?;

        self.read_metadata(metadata)
    }

    /// Read the metadata starting at the metadata root (`BSJB` signature).
    ///
    /// # Errors
    /// Returns [`crate::Error::NotSupported`] for a module without an `Assembly` row (a
    /// netmodule), or an error for malformed streams and tables.
    pub fn read_metadata(&self, data: &[u8]) -> Result<AssemblyMetadata> {
        let root = Root::read(data)?;

        let tables_data = root
            .stream(data, "#~")
            .or_else(|| root.stream(data, "#-"))
            .ok_or_else(|| malformed_error!("Metadata has no table stream"))?;
        let strings_data = root
            .stream(data, "#Strings")
            .ok_or_else(|| malformed_error!("Metadata has no #Strings stream"))?;

        let view = MetadataView {
            tables: TablesHeader::from(tables_data)?,
            strings: Strings::from(strings_data)?,
            blobs: Blob::from(root.stream(data, "#Blob").unwrap_or(&[])),
        };

        if view.tables.row_count(TableId::Assembly) == 0 {
            return Err(NotSupported);
        }

        Ok(AssemblyMetadata {
            identity: view.assembly_identity()?,
            module_name: view.module_name()?,
            references: view.assembly_references()?,
            custom_attributes: view.assembly_attributes()?,
        })
    }
}

impl AssemblyMetadataReader for CilMetadataReader {
    fn read(&self, path: &Path) -> Result<AssemblyMetadata> {
        let file = File::from_file(path)?;
        self.read_file(&file)
    }
}

struct MetadataView<'a> {
    tables: TablesHeader<'a>,
    strings: Strings<'a>,
    blobs: Blob<'a>,
}

impl MetadataView<'_> {
    fn string(&self, index: u32) -> Result<String> {
        Ok(self.strings.get(index as usize)?.to_string())
    }

    fn module_name(&self) -> Result<String> {
        if self.tables.row_count(TableId::Module) == 0 {
            return Ok(String::new());
        }

        // Generation, Name, Mvid, EncId, EncBaseId
        let row = self.tables.row(TableId::Module, 1)?;
        self.string(row[1])
    }

    fn assembly_identity(&self) -> Result<AssemblyIdentity> {
        // HashAlgId, Major, Minor, Build, Revision, Flags, PublicKey, Name, Culture
        let row = self.tables.row(TableId::Assembly, 1)?;
        let public_key = self.blobs.get(row[6] as usize)?;

        self.identity(&row[1..5], self.string(row[7])?, self.string(row[8])?)
            .map(|identity| match PublicKeyToken::from_blob(public_key, true) {
                Ok(Some(token)) => identity.with_public_key_token(token),
                _ => identity,
            })
    }

    fn assembly_references(&self) -> Result<Vec<AssemblyIdentity>> {
        let count = self.tables.row_count(TableId::AssemblyRef);
        let mut references = Vec::with_capacity(count as usize);

        for rid in 1..=count {
            // Major, Minor, Build, Revision, Flags, PublicKeyOrToken, Name, Culture, HashValue
            let row = self.tables.row(TableId::AssemblyRef, rid)?;
            let is_public_key = row[4] & AssemblyFlags::PUBLIC_KEY != 0;
            let token = PublicKeyToken::from_blob(self.blobs.get(row[5] as usize)?, is_public_key)?;

            let mut identity = self.identity(&row[0..4], self.string(row[6])?, self.string(row[7])?)?;
            identity.public_key_token = token;
            references.push(identity);
        }

        Ok(references)
    }

    #[allow(clippy::cast_possible_truncation)]
    fn identity(&self, version: &[u32], name: String, culture: String) -> Result<AssemblyIdentity> {
        if name.is_empty() {
            return Err(malformed_error!("Assembly name cannot be empty"));
        }

        // Columns are u16 in the table, widened to u32 by the row reader
        let version = AssemblyVersion::new(
            version[0] as u16,
            version[1] as u16,
            version[2] as u16,
            version[3] as u16,
        );

        Ok(AssemblyIdentity::new(name, version).with_culture(culture))
    }

    fn assembly_attributes(&self) -> Result<Vec<CustomAttributeInfo>> {
        let info = self.tables.info();
        let mut attributes = Vec::new();

        for rid in 1..=self.tables.row_count(TableId::CustomAttribute) {
            // Parent, Type, Value
            let row = self.tables.row(TableId::CustomAttribute, rid)?;
            let (parent_table, _) =
                info.decode_coded_index(row[0], CodedIndexType::HasCustomAttribute)?;
            if parent_table != TableId::Assembly {
                continue;
            }

            match self.custom_attribute(row[1], row[2]) {
                Ok(attribute) => attributes.push(attribute),
                Err(error) => {
                    log::debug!("Skipping undecodable assembly attribute {}: {}", rid, error);
                }
            }
        }

        Ok(attributes)
    }

    fn custom_attribute(&self, constructor: u32, value: u32) -> Result<CustomAttributeInfo> {
        let info = self.tables.info();
        let (ctor_table, ctor_rid) =
            info.decode_coded_index(constructor, CodedIndexType::CustomAttributeType)?;

        let (type_table, type_rid, signature) = match ctor_table {
            TableId::MemberRef => {
                // Class, Name, Signature
                let row = self.tables.row(TableId::MemberRef, ctor_rid)?;
                let (parent_table, parent_rid) =
                    info.decode_coded_index(row[0], CodedIndexType::MemberRefParent)?;
                (parent_table, parent_rid, row[2])
            }
            TableId::MethodDef => {
                // RVA, ImplFlags, Flags, Name, Signature, ParamList
                let row = self.tables.row(TableId::MethodDef, ctor_rid)?;
                (TableId::TypeDef, self.method_owner(ctor_rid)?, row[4])
            }
            _ => return Err(malformed_error!("Invalid attribute constructor - {:?}", ctor_table)),
        };

        let (namespace, name) = self.type_name(type_table, type_rid)?;
        let fixed_args = attributes::decode_fixed_args(
            self.blobs.get(signature as usize)?,
            self.blobs.get(value as usize)?,
            |token| self.is_system_type(token),
        )?;

        Ok(CustomAttributeInfo {
            namespace,
            name,
            fixed_args,
        })
    }

    /// Find the `TypeDef` whose method list contains `method_rid`.
    fn method_owner(&self, method_rid: u32) -> Result<u32> {
        let mut owner = None;
        for rid in 1..=self.tables.row_count(TableId::TypeDef) {
            // Flags, Name, Namespace, Extends, FieldList, MethodList
            let row = self.tables.row(TableId::TypeDef, rid)?;
            if row[5] > method_rid {
                break;
            }
            owner = Some(rid);
        }

        owner.ok_or(OutOfBounds)
    }

    /// Returns (namespace, name) of a `TypeRef` or `TypeDef` row.
    fn type_name(&self, table: TableId, rid: u32) -> Result<(String, String)> {
        let row = match table {
            // ResolutionScope, Name, Namespace
            TableId::TypeRef => self.tables.row(TableId::TypeRef, rid)?,
            // Flags, Name, Namespace, ...
            TableId::TypeDef => self.tables.row(TableId::TypeDef, rid)?,
            _ => {
                return Err(malformed_error!(
                    "Attribute type is neither TypeRef nor TypeDef - {:?}",
                    table
                ))
            }
        };

        Ok((self.string(row[2])?, self.string(row[1])?))
    }

    /// `token` is a TypeDefOrRefOrSpecEncoded value from a signature.
    fn is_system_type(&self, token: u32) -> bool {
        let Ok((table, rid)) = self
            .tables
            .info()
            .decode_coded_index(token, CodedIndexType::TypeDefOrRef)
        else {
            return false;
        };

        matches!(
            self.type_name(table, rid),
            Ok((namespace, name)) if namespace == "System" && name == "Type"
        )
    }
}
