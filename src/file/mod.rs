//! PE file abstraction for managed assemblies.
//!
//! This module maps a Portable Executable image from disk, checks that it carries a
//! CLI header, and translates relative virtual addresses into file offsets so the metadata
//! reader can locate the metadata root.
//!
//! # Key Components
//!
//! - [`crate::file::File`] - A loaded PE image with its CLI header location and section map
//! - [`crate::file::parser::Parser`] - Cursor over signature and attribute blobs
//! - [`crate::file::io`] - Low-level little-endian reading helpers
//!
//! # Examples
//!
//! ```rust,no_run
//! use dotdeps::File;
//! use std::path::Path;
//!
//! let file = File::from_file(Path::new("Library.dll"))?;
//! let (clr_rva, clr_size) = file.clr();
//! let clr_offset = file.rva_to_offset(clr_rva)?;
//! let cli_header = file.data_slice(clr_offset, clr_size)?;
//! # Ok::<(), dotdeps::Error>(())
//! ```

pub mod io;
pub mod parser;

use std::{fs, path::Path};

use goblin::pe::PE;
use memmap2::Mmap;

use crate::{
    Error::{Empty, Error, GoblinErr, NotSupported, OutOfBounds},
    Result,
};

/// Placement of a single PE section, kept so RVAs can be mapped without holding the parsed PE.
#[derive(Debug, Clone, Copy)]
struct SectionRange {
    virtual_address: u32,
    virtual_size: u32,
    pointer_to_raw_data: u32,
}

/// Represents a loaded PE file that carries .NET metadata.
///
/// The file is memory-mapped. A dependency walk opens many files but only touches the PE
/// headers and the metadata streams of each, so the OS pages in just what is read.
///
/// Loading validates the PE structure through goblin and rejects images without a CLI
/// header with [`crate::Error::NotSupported`], which is how native DLLs sitting next to
/// managed ones in a probe directory are told apart.
pub struct File {
    /// Memory-mapped file contents.
    data: Mmap,
    /// RVA and size of the CLI header.
    clr: (usize, usize),
    /// Section table, in file order.
    sections: Vec<SectionRange>,
}

impl File {
    /// Loads and maps the PE file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be opened ([`crate::Error::FileError`]) or mapped
    /// - The file is empty ([`crate::Error::Empty`])
    /// - The file is not a valid PE image
    /// - The image has no CLI header ([`crate::Error::NotSupported`])
    pub fn from_file(path: &Path) -> Result<File> {
        let file = fs::File::open(path)?;
        if file.metadata()?.len() == 0 {
            return Err(Empty);
        }

        // The mapping is read-only and lives as long as the `File`.
        let data = match unsafe { Mmap::map(&file) } {
            Ok(data) => data,
            Err(error) => return Err(Error(error.to_string())),
        };

        let (clr, sections) = Self::parse_headers(&data)?;
        Ok(File {
            data,
            clr,
            sections,
        })
    }

    fn parse_headers(data: &[u8]) -> Result<((usize, usize), Vec<SectionRange>)> {
        let pe = PE::parse(data).map_err(GoblinErr)?;
        let Some(optional_header) = pe.header.optional_header else {
            return Err(malformed_error!("File does not have an OptionalHeader"));
        };

        let Some(clr_dir) = optional_header.data_directories.get_clr_runtime_header() else {
            return Err(NotSupported);
        };

        let sections = pe
            .sections
            .iter()
            .map(|section| SectionRange {
                virtual_address: section.virtual_address,
                virtual_size: section.virtual_size.max(section.size_of_raw_data),
                pointer_to_raw_data: section.pointer_to_raw_data,
            })
            .collect();

        Ok((
            (clr_dir.virtual_address as usize, clr_dir.size as usize),
            sections,
        ))
    }

    /// Returns the total size of the loaded file in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the file has a length of zero.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the RVA and size of the CLI header.
    #[must_use]
    pub fn clr(&self) -> (usize, usize) {
        self.clr
    }

    /// Returns the full file contents.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns a bounds-checked slice of the file.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::OutOfBounds`] if the range exceeds the file.
    pub fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]> {
        offset
            .checked_add(len)
            .and_then(|end| self.data.get(offset..end))
            .ok_or(OutOfBounds)
    }

    /// Converts a relative virtual address (RVA) to a file offset.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Malformed`] if no section contains the RVA or a section
    /// header overflows.
    pub fn rva_to_offset(&self, rva: usize) -> Result<usize> {
        let rva_u32 =
            u32::try_from(rva).map_err(|_| malformed_error!("RVA too large to fit in u32: {}", rva))?;

        for section in &self.sections {
            let Some(section_max) = section.virtual_address.checked_add(section.virtual_size)
            else {
                return Err(malformed_error!(
                    "Section malformed, causing integer overflow - {} + {}",
                    section.virtual_address,
                    section.virtual_size
                ));
            };

            if section.virtual_address <= rva_u32 && section_max > rva_u32 {
                return Ok((rva - section.virtual_address as usize)
                    + section.pointer_to_raw_data as usize);
            }
        }

        Err(malformed_error!(
            "RVA could not be converted to offset - {}",
            rva
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    fn write(bytes: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, bytes).unwrap();
        file
    }

    #[test]
    fn load_empty() {
        let file = write(b"");
        assert!(matches!(File::from_file(file.path()), Err(Error::Empty)));
    }

    #[test]
    fn load_garbage() {
        let file = write(&[0x42; 512]);
        assert!(File::from_file(file.path()).is_err());
    }

    #[test]
    fn load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = File::from_file(&dir.path().join("Nope.dll"));
        assert!(matches!(result, Err(Error::FileError(_))));
    }

    #[test]
    fn slices_and_rva_mapping() {
        let mut bytes = vec![0; 0x600];
        bytes[0x208..0x20C].copy_from_slice(b"BSJB");
        let backing = write(&bytes);
        let mapped = std::fs::File::open(backing.path()).unwrap();

        let file = File {
            data: unsafe { Mmap::map(&mapped) }.unwrap(),
            clr: (0x2008, 0x48),
            sections: vec![
                SectionRange {
                    virtual_address: 0x2000,
                    virtual_size: 0x200,
                    pointer_to_raw_data: 0x200,
                },
                SectionRange {
                    virtual_address: 0x4000,
                    virtual_size: 0x100,
                    pointer_to_raw_data: 0x400,
                },
            ],
        };

        assert_eq!(file.len(), 0x600);
        assert_eq!(file.clr(), (0x2008, 0x48));
        assert_eq!(file.rva_to_offset(0x2000).unwrap(), 0x200);
        assert_eq!(file.rva_to_offset(0x2008).unwrap(), 0x208);
        assert_eq!(file.rva_to_offset(0x40FF).unwrap(), 0x4FF);
        assert!(file.rva_to_offset(0x2200).is_err());
        assert!(file.rva_to_offset(0x100).is_err());

        let offset = file.rva_to_offset(0x2008).unwrap();
        assert_eq!(file.data_slice(offset, 4).unwrap(), b"BSJB");
        assert!(matches!(file.data_slice(0x5FF, 2), Err(Error::OutOfBounds)));
        assert!(matches!(file.data_slice(usize::MAX, 2), Err(Error::OutOfBounds)));
    }
}
