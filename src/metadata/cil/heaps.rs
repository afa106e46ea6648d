//! The `#Strings` and `#Blob` heaps.

use std::ffi::CStr;

use crate::{file::parser::Parser, Error::OutOfBounds, Result};

/// The `#Strings` heap: NUL-terminated UTF-8 identifiers, indexed by byte offset.
pub struct Strings<'a> {
    data: &'a [u8],
}

impl<'a> Strings<'a> {
    /// Wrap the heap bytes. A valid heap starts with the empty string.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the first byte is not NUL.
    pub fn from(data: &'a [u8]) -> Result<Strings<'a>> {
        if data.first() != Some(&0) {
            return Err(malformed_error!("Provided #Strings heap is invalid"));
        }

        Ok(Strings { data })
    }

    /// Get the string at `index`.
    ///
    /// # Errors
    /// Returns an error if the index is outside the heap or the string is not valid UTF-8.
    pub fn get(&self, index: usize) -> Result<&'a str> {
        if index >= self.data.len() {
            return Err(OutOfBounds);
        }

        match CStr::from_bytes_until_nul(&self.data[index..]) {
            Ok(result) => result
                .to_str()
                .map_err(|_| malformed_error!("Invalid string at index - {}", index)),
            Err(_) => Err(malformed_error!("Invalid string at index - {}", index)),
        }
    }
}

/// The `#Blob` heap: length-prefixed byte sequences, indexed by byte offset.
pub struct Blob<'a> {
    data: &'a [u8],
}

impl<'a> Blob<'a> {
    /// Wrap the heap bytes. A missing heap behaves like one holding only the empty blob.
    #[must_use]
    pub fn from(data: &'a [u8]) -> Blob<'a> {
        Blob { data }
    }

    /// Get the blob at `index`. Index 0 is always the empty blob.
    ///
    /// # Errors
    /// Returns an error if the index or the blob's length runs past the heap.
    pub fn get(&self, index: usize) -> Result<&'a [u8]> {
        if index == 0 {
            return Ok(&[]);
        }

        if index >= self.data.len() {
            return Err(OutOfBounds);
        }

        let mut parser = Parser::new(&self.data[index..]);
        let len = parser.read_compressed_uint()? as usize;
        parser.read_bytes(len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strings() {
        let data = b"\0Lib\0System.Runtime\0";
        let strings = Strings::from(data).unwrap();

        assert_eq!(strings.get(0).unwrap(), "");
        assert_eq!(strings.get(1).unwrap(), "Lib");
        assert_eq!(strings.get(5).unwrap(), "System.Runtime");
        assert_eq!(strings.get(12).unwrap(), "Runtime");
        assert!(strings.get(data.len()).is_err());

        assert!(Strings::from(b"Lib\0").is_err());
        assert!(Strings::from(b"\0Lib").unwrap().get(1).is_err());
    }

    #[test]
    fn blob() {
        let data = [0x00, 0x03, 0x0A, 0x0B, 0x0C, 0x02, 0x01];
        let blob = Blob::from(&data);

        assert_eq!(blob.get(0).unwrap(), &[] as &[u8]);
        assert_eq!(blob.get(1).unwrap(), &[0x0A, 0x0B, 0x0C]);
        assert!(blob.get(5).is_err());
        assert!(blob.get(42).is_err());
    }
}
