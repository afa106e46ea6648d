//! The `#~` table stream: row counts, row layouts and row access.
//!
//! Only a handful of tables carry what a dependency walk needs (`Module`, `Assembly`,
//! `AssemblyRef`, `CustomAttribute` and the tables naming attribute constructors), but every
//! table in front of them has to be sized to find where they start. Column layouts follow
//! ECMA-335 II.22; index widths follow II.24.2.6.

use strum::{EnumCount, EnumIter, IntoEnumIterator};

use crate::{
    file::io::{read_le, read_le_at, read_le_at_dyn},
    Error::OutOfBounds,
    Result,
};

/// Identifiers of the ECMA-335 metadata tables, valued by their table number.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumCount)]
#[repr(usize)]
pub enum TableId {
    Module = 0x00,
    TypeRef = 0x01,
    TypeDef = 0x02,
    FieldPtr = 0x03,
    Field = 0x04,
    MethodPtr = 0x05,
    MethodDef = 0x06,
    ParamPtr = 0x07,
    Param = 0x08,
    InterfaceImpl = 0x09,
    MemberRef = 0x0A,
    Constant = 0x0B,
    CustomAttribute = 0x0C,
    FieldMarshal = 0x0D,
    DeclSecurity = 0x0E,
    ClassLayout = 0x0F,
    FieldLayout = 0x10,
    StandAloneSig = 0x11,
    EventMap = 0x12,
    EventPtr = 0x13,
    Event = 0x14,
    PropertyMap = 0x15,
    PropertyPtr = 0x16,
    Property = 0x17,
    MethodSemantics = 0x18,
    MethodImpl = 0x19,
    ModuleRef = 0x1A,
    TypeSpec = 0x1B,
    ImplMap = 0x1C,
    FieldRVA = 0x1D,
    EncLog = 0x1E,
    EncMap = 0x1F,
    Assembly = 0x20,
    AssemblyProcessor = 0x21,
    AssemblyOS = 0x22,
    AssemblyRef = 0x23,
    AssemblyRefProcessor = 0x24,
    AssemblyRefOS = 0x25,
    File = 0x26,
    ExportedType = 0x27,
    ManifestResource = 0x28,
    NestedClass = 0x29,
    GenericParam = 0x2A,
    MethodSpec = 0x2B,
    GenericParamConstraint = 0x2C,
}

/// Coded index kinds (ECMA-335 II.24.2.6).
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumCount)]
#[repr(usize)]
pub enum CodedIndexType {
    TypeDefOrRef,
    HasConstant,
    HasCustomAttribute,
    HasFieldMarshal,
    HasDeclSecurity,
    MemberRefParent,
    HasSemantics,
    MethodDefOrRef,
    MemberForwarded,
    Implementation,
    CustomAttributeType,
    ResolutionScope,
    TypeOrMethodDef,
}

impl CodedIndexType {
    /// The tables a coded index of this kind can point into, in tag order.
    #[must_use]
    pub fn tables(&self) -> &'static [TableId] {
        match self {
            CodedIndexType::TypeDefOrRef => {
                &[TableId::TypeDef, TableId::TypeRef, TableId::TypeSpec]
            }
            CodedIndexType::HasConstant => &[TableId::Field, TableId::Param, TableId::Property],
            CodedIndexType::HasCustomAttribute => &[
                TableId::MethodDef,
                TableId::Field,
                TableId::TypeRef,
                TableId::TypeDef,
                TableId::Param,
                TableId::InterfaceImpl,
                TableId::MemberRef,
                TableId::Module,
                TableId::DeclSecurity,
                TableId::Property,
                TableId::Event,
                TableId::StandAloneSig,
                TableId::ModuleRef,
                TableId::TypeSpec,
                TableId::Assembly,
                TableId::AssemblyRef,
                TableId::File,
                TableId::ExportedType,
                TableId::ManifestResource,
                TableId::GenericParam,
                TableId::GenericParamConstraint,
                TableId::MethodSpec,
            ],
            CodedIndexType::HasFieldMarshal => &[TableId::Field, TableId::Param],
            CodedIndexType::HasDeclSecurity => {
                &[TableId::TypeDef, TableId::MethodDef, TableId::Assembly]
            }
            CodedIndexType::MemberRefParent => &[
                TableId::TypeDef,
                TableId::TypeRef,
                TableId::ModuleRef,
                TableId::MethodDef,
                TableId::TypeSpec,
            ],
            CodedIndexType::HasSemantics => &[TableId::Event, TableId::Property],
            CodedIndexType::MethodDefOrRef => &[TableId::MethodDef, TableId::MemberRef],
            CodedIndexType::MemberForwarded => &[TableId::Field, TableId::MethodDef],
            CodedIndexType::Implementation => {
                &[TableId::File, TableId::AssemblyRef, TableId::ExportedType]
            }
            // Tags 0, 1 and 4 are unused; only MethodDef (2) and MemberRef (3) occur
            CodedIndexType::CustomAttributeType => &[
                TableId::MethodDef,
                TableId::MethodDef,
                TableId::MethodDef,
                TableId::MemberRef,
                TableId::MemberRef,
            ],
            CodedIndexType::ResolutionScope => &[
                TableId::Module,
                TableId::ModuleRef,
                TableId::AssemblyRef,
                TableId::TypeRef,
            ],
            CodedIndexType::TypeOrMethodDef => &[TableId::TypeDef, TableId::MethodDef],
        }
    }

    /// Number of low bits holding the table tag.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn tag_bits(&self) -> u8 {
        let tables = self.tables().len();
        // ceil(log2(n)) for n >= 2
        (usize::BITS - (tables - 1).leading_zeros()) as u8
    }
}

/// A column of a table row.
#[derive(Debug, Clone, Copy)]
enum Column {
    U8,
    U16,
    U32,
    Str,
    Guid,
    Blob,
    Table(TableId),
    Coded(CodedIndexType),
}

impl TableId {
    #[rustfmt::skip]
    fn columns(self) -> &'static [Column] {
        use Column::{Blob, Coded, Guid, Str, Table, U16, U32, U8};
        use CodedIndexType as C;

        match self {
            TableId::Module                 => &[U16, Str, Guid, Guid, Guid],
            TableId::TypeRef                => &[Coded(C::ResolutionScope), Str, Str],
            TableId::TypeDef                => &[U32, Str, Str, Coded(C::TypeDefOrRef), Table(TableId::Field), Table(TableId::MethodDef)],
            TableId::FieldPtr               => &[Table(TableId::Field)],
            TableId::Field                  => &[U16, Str, Blob],
            TableId::MethodPtr              => &[Table(TableId::MethodDef)],
            TableId::MethodDef              => &[U32, U16, U16, Str, Blob, Table(TableId::Param)],
            TableId::ParamPtr               => &[Table(TableId::Param)],
            TableId::Param                  => &[U16, U16, Str],
            TableId::InterfaceImpl          => &[Table(TableId::TypeDef), Coded(C::TypeDefOrRef)],
            TableId::MemberRef              => &[Coded(C::MemberRefParent), Str, Blob],
            TableId::Constant               => &[U8, U8, Coded(C::HasConstant), Blob],
            TableId::CustomAttribute        => &[Coded(C::HasCustomAttribute), Coded(C::CustomAttributeType), Blob],
            TableId::FieldMarshal           => &[Coded(C::HasFieldMarshal), Blob],
            TableId::DeclSecurity           => &[U16, Coded(C::HasDeclSecurity), Blob],
            TableId::ClassLayout            => &[U16, U32, Table(TableId::TypeDef)],
            TableId::FieldLayout            => &[U32, Table(TableId::Field)],
            TableId::StandAloneSig          => &[Blob],
            TableId::EventMap               => &[Table(TableId::TypeDef), Table(TableId::Event)],
            TableId::EventPtr               => &[Table(TableId::Event)],
            TableId::Event                  => &[U16, Str, Coded(C::TypeDefOrRef)],
            TableId::PropertyMap            => &[Table(TableId::TypeDef), Table(TableId::Property)],
            TableId::PropertyPtr            => &[Table(TableId::Property)],
            TableId::Property               => &[U16, Str, Blob],
            TableId::MethodSemantics        => &[U16, Table(TableId::MethodDef), Coded(C::HasSemantics)],
            TableId::MethodImpl             => &[Table(TableId::TypeDef), Coded(C::MethodDefOrRef), Coded(C::MethodDefOrRef)],
            TableId::ModuleRef              => &[Str],
            TableId::TypeSpec               => &[Blob],
            TableId::ImplMap                => &[U16, Coded(C::MemberForwarded), Str, Table(TableId::ModuleRef)],
            TableId::FieldRVA               => &[U32, Table(TableId::Field)],
            TableId::EncLog                 => &[U32, U32],
            TableId::EncMap                 => &[U32],
            TableId::Assembly               => &[U32, U16, U16, U16, U16, U32, Blob, Str, Str],
            TableId::AssemblyProcessor      => &[U32],
            TableId::AssemblyOS             => &[U32, U32, U32],
            TableId::AssemblyRef            => &[U16, U16, U16, U16, U32, Blob, Str, Str, Blob],
            TableId::AssemblyRefProcessor   => &[U32, Table(TableId::AssemblyRef)],
            TableId::AssemblyRefOS          => &[U32, U32, U32, Table(TableId::AssemblyRef)],
            TableId::File                   => &[U32, Str, Blob],
            TableId::ExportedType           => &[U32, U32, Str, Str, Coded(C::Implementation)],
            TableId::ManifestResource       => &[U32, U32, Str, Coded(C::Implementation)],
            TableId::NestedClass            => &[Table(TableId::TypeDef), Table(TableId::TypeDef)],
            TableId::GenericParam           => &[U16, U16, Coded(C::TypeOrMethodDef), Str],
            TableId::MethodSpec             => &[Coded(C::MethodDefOrRef), Blob],
            TableId::GenericParamConstraint => &[Table(TableId::GenericParam), Coded(C::TypeDefOrRef)],
        }
    }
}

/// Row count and index width information of one table.
#[derive(Clone, Copy, Default, PartialEq, Debug)]
pub struct TableRowInfo {
    /// Number of rows
    pub rows: u32,
    /// Bits needed to address every row
    pub bits: u8,
}

impl TableRowInfo {
    /// Compute the index width of a table with `rows` rows.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn new(rows: u32) -> Self {
        let bits = if rows == 0 {
            1
        } else {
            (32 - rows.leading_zeros()) as u8
        };

        Self { rows, bits }
    }
}

/// Sizes of every table and heap index, derived from the `#~` header.
#[derive(Clone, Debug, Default)]
pub struct TableInfo {
    rows: Vec<TableRowInfo>,
    coded_indexes: Vec<u8>,
    is_large_index_str: bool,
    is_large_index_guid: bool,
    is_large_index_blob: bool,
}

impl TableInfo {
    /// Build the table information from row counts and the heap size flags.
    #[must_use]
    pub fn new(row_counts: &[(TableId, u32)], heap_size_flags: u8) -> Self {
        let mut table_info = TableInfo {
            rows: vec![TableRowInfo::default(); TableId::COUNT],
            coded_indexes: vec![0; CodedIndexType::COUNT],
            is_large_index_str: heap_size_flags & 1 == 1,
            is_large_index_guid: heap_size_flags & 2 == 2,
            is_large_index_blob: heap_size_flags & 4 == 4,
        };

        for (table, rows) in row_counts {
            table_info.rows[*table as usize] = TableRowInfo::new(*rows);
        }

        for coded_index in CodedIndexType::iter() {
            let max_bits = coded_index
                .tables()
                .iter()
                .map(|table| table_info.rows[*table as usize].bits)
                .max()
                .unwrap_or(1);
            table_info.coded_indexes[coded_index as usize] = max_bits + coded_index.tag_bits();
        }

        table_info
    }

    /// Number of rows in `table`.
    #[must_use]
    pub fn rows(&self, table: TableId) -> u32 {
        self.rows[table as usize].rows
    }

    /// Decode a coded index into its table and 1-based row index.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] for a tag outside the coded index's table list.
    pub fn decode_coded_index(
        &self,
        value: u32,
        coded_index_type: CodedIndexType,
    ) -> Result<(TableId, u32)> {
        let tables = coded_index_type.tables();
        let tag_bits = coded_index_type.tag_bits();
        let tag_mask = (1 << tag_bits) - 1;

        let tag = value & tag_mask;
        let index = value >> tag_bits;

        if tag as usize >= tables.len() {
            return Err(OutOfBounds);
        }

        Ok((tables[tag as usize], index))
    }

    fn column_is_large(&self, column: Column) -> Option<bool> {
        match column {
            Column::U8 | Column::U16 | Column::U32 => None,
            Column::Str => Some(self.is_large_index_str),
            Column::Guid => Some(self.is_large_index_guid),
            Column::Blob => Some(self.is_large_index_blob),
            Column::Table(table) => Some(self.rows[table as usize].bits > 16),
            Column::Coded(coded) => Some(self.coded_indexes[coded as usize] > 16),
        }
    }

    fn column_size(&self, column: Column) -> usize {
        match column {
            Column::U8 => 1,
            Column::U16 => 2,
            Column::U32 => 4,
            _ => {
                if self.column_is_large(column) == Some(true) {
                    4
                } else {
                    2
                }
            }
        }
    }

    /// Size in bytes of one row of `table`.
    #[must_use]
    pub fn row_size(&self, table: TableId) -> usize {
        table
            .columns()
            .iter()
            .map(|column| self.column_size(*column))
            .sum()
    }
}

/// The parsed `#~` (or `#-`) stream, giving access to table rows as column values.
pub struct TablesHeader<'a> {
    data: &'a [u8],
    info: TableInfo,
    table_offsets: Vec<usize>,
}

impl<'a> TablesHeader<'a> {
    /// Parse the tables header and locate every table.
    ///
    /// Tables numbered above `GenericParamConstraint` (e.g. portable PDB tables) are counted to
    /// find where row data starts, but cannot be addressed.
    ///
    /// # Errors
    /// Returns an error if the header is truncated or the tables run past the stream.
    pub fn from(data: &'a [u8]) -> Result<TablesHeader<'a>> {
        if data.len() < 24 {
            return Err(OutOfBounds);
        }

        let heap_size_flags = read_le::<u8>(&data[6..])?;
        let valid = read_le::<u64>(&data[8..])?;

        let mut offset = 24_usize;
        let mut row_counts = Vec::new();
        for bit in 0..64_usize {
            if valid & (1 << bit) == 0 {
                continue;
            }

            let rows = read_le_at::<u32>(data, &mut offset)?;
            if let Some(table) = TableId::iter().find(|table| *table as usize == bit) {
                row_counts.push((table, rows));
            }
        }

        // Extra data flag, followed by 4 bytes of unspecified content
        if heap_size_flags & 0x40 != 0 {
            offset += 4;
        }

        let info = TableInfo::new(&row_counts, heap_size_flags);
        let mut table_offsets = vec![0; TableId::COUNT];
        for table in TableId::iter() {
            table_offsets[table as usize] = offset;

            let size = (info.rows(table) as usize)
                .checked_mul(info.row_size(table))
                .ok_or(OutOfBounds)?;
            offset = offset.checked_add(size).ok_or(OutOfBounds)?;
        }

        if offset > data.len() {
            return Err(malformed_error!(
                "Tables exceed the #~ stream - {} > {}",
                offset,
                data.len()
            ));
        }

        Ok(TablesHeader {
            data,
            info,
            table_offsets,
        })
    }

    /// Index width information.
    #[must_use]
    pub fn info(&self) -> &TableInfo {
        &self.info
    }

    /// Number of rows in `table`.
    #[must_use]
    pub fn row_count(&self, table: TableId) -> u32 {
        self.info.rows(table)
    }

    /// Read the columns of row `rid` (1-based) of `table`, each widened to `u32`.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the row does not exist.
    pub fn row(&self, table: TableId, rid: u32) -> Result<Vec<u32>> {
        if rid == 0 || rid > self.info.rows(table) {
            return Err(OutOfBounds);
        }

        let mut offset =
            self.table_offsets[table as usize] + (rid as usize - 1) * self.info.row_size(table);

        let mut values = Vec::with_capacity(table.columns().len());
        for column in table.columns() {
            let value = match column {
                Column::U8 => u32::from(read_le_at::<u8>(self.data, &mut offset)?),
                Column::U16 => u32::from(read_le_at::<u16>(self.data, &mut offset)?),
                Column::U32 => read_le_at::<u32>(self.data, &mut offset)?,
                _ => read_le_at_dyn(
                    self.data,
                    &mut offset,
                    self.info.column_is_large(*column) == Some(true),
                )?,
            };
            values.push(value);
        }

        Ok(values)
    }
}
