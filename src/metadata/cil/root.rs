//! Metadata root and stream directory (ECMA-335 II.24.2.1, II.24.2.2).

use crate::{
    file::io::{read_le, read_le_at},
    Error::OutOfBounds,
    Result,
};

/// The MAGIC value indicating the CIL header
pub const CIL_HEADER_MAGIC: u32 = 0x424A_5342;

/// A stream header, locating one metadata stream relative to the metadata root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamHeader {
    /// Offset of the stream from the start of the metadata root
    pub offset: u32,
    /// Size of the stream in bytes
    pub size: u32,
    /// Name of the stream, e.g. `#~`
    pub name: String,
}

impl StreamHeader {
    /// Read a stream header and return it together with its encoded length.
    ///
    /// The name is NUL-terminated and padded to the next 4-byte boundary.
    ///
    /// # Errors
    /// Returns an error if the header is truncated or the name is not one of the known streams.
    pub fn read(data: &[u8]) -> Result<(StreamHeader, usize)> {
        if data.len() < 9 {
            return Err(OutOfBounds);
        }

        let name_area = &data[8..data.len().min(8 + 32)];
        let Some(name_len) = name_area.iter().position(|&b| b == 0) else {
            return Err(malformed_error!("Stream header name is not terminated"));
        };

        let name = String::from_utf8_lossy(&name_area[..name_len]).into_owned();
        if !["#Strings", "#US", "#Blob", "#GUID", "#~", "#-"]
            .iter()
            .any(|valid_name| name == *valid_name)
        {
            return Err(malformed_error!("Invalid stream header name - {}", name));
        }

        let padded_name_len = (name_len + 1 + 3) & !3;

        Ok((
            StreamHeader {
                offset: read_le::<u32>(data)?,
                size: read_le::<u32>(&data[4..])?,
                name,
            },
            8 + padded_name_len,
        ))
    }
}

/// The metadata root: version string and stream directory.
#[derive(Debug, Clone)]
pub struct Root {
    /// 'VersionString', e.g. `v4.0.30319`
    pub version: String,
    /// Streams
    pub stream_headers: Vec<StreamHeader>,
}

impl Root {
    /// Reads the metadata root from the start of the metadata section.
    ///
    /// Every stream header is checked to lie within `data`.
    ///
    /// # Errors
    /// Returns an error if the data is too short, the signature is invalid, or the stream
    /// directory is malformed.
    pub fn read(data: &[u8]) -> Result<Root> {
        if data.len() < 20 {
            return Err(OutOfBounds);
        }

        let signature = read_le::<u32>(data)?;
        if signature != CIL_HEADER_MAGIC {
            return Err(malformed_error!(
                "CIL_HEADER_MAGIC does not match - {}",
                signature
            ));
        }

        let version_string_length = read_le_at::<u32>(data, &mut 12)? as usize;
        let Some(version_end) = version_string_length.checked_add(16) else {
            return Err(malformed_error!(
                "Version string length causing integer overflow - {}",
                version_string_length
            ));
        };
        if version_end > data.len() {
            return Err(OutOfBounds);
        }

        let version_bytes = &data[16..version_end];
        let version_len = version_bytes
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(version_bytes.len());
        let version = String::from_utf8_lossy(&version_bytes[..version_len]).into_owned();

        // Flags (u16) precede the stream count
        let mut offset = version_end + 2;
        let stream_count = read_le_at::<u16>(data, &mut offset)?;
        if stream_count == 0 || stream_count > 6 {
            return Err(malformed_error!("Invalid stream count - {}", stream_count));
        }

        let mut stream_headers = Vec::with_capacity(stream_count as usize);
        for _ in 0..stream_count {
            if offset > data.len() {
                return Err(OutOfBounds);
            }

            let (header, consumed) = StreamHeader::read(&data[offset..])?;
            match header.offset.checked_add(header.size) {
                Some(end) if end as usize <= data.len() => {}
                Some(_) => return Err(OutOfBounds),
                None => {
                    return Err(malformed_error!(
                        "Stream offset and size cause integer overflow - {} + {}",
                        header.offset,
                        header.size
                    ))
                }
            }

            offset += consumed;
            stream_headers.push(header);
        }

        Ok(Root {
            version,
            stream_headers,
        })
    }

    /// Returns the bytes of the named stream.
    #[must_use]
    pub fn stream<'a>(&self, data: &'a [u8], name: &str) -> Option<&'a [u8]> {
        self.stream_headers
            .iter()
            .find(|header| header.name == name)
            .and_then(|header| {
                let start = header.offset as usize;
                data.get(start..start + header.size as usize)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crafted() {
        #[rustfmt::skip]
        let header_bytes = [
            0x42, 0x53, 0x4A, 0x42,
            0x01, 0x00,
            0x01, 0x00,
            0x00, 0x00, 0x00, 0x00,
            0x04, 0x00, 0x00, 0x00,
            b'v', b'4', 0x00, 0x00,
            0x00, 0x00,
            0x02, 0x00,
            0x38, 0x00, 0x00, 0x00, // #~ header
            0x04, 0x00, 0x00, 0x00,
            0x23, 0x7E, 0x00, 0x00,
            0x3C, 0x00, 0x00, 0x00, // #Strings header
            0x02, 0x00, 0x00, 0x00,
            b'#', b'S', b't', b'r', b'i', b'n', b'g', b's', 0x00, 0x00, 0x00, 0x00,
            0xAA, 0xBB, 0xCC, 0xDD, // #~ data
            0x00, 0x41,             // #Strings data
        ];

        let root = Root::read(&header_bytes).unwrap();

        assert_eq!(root.version, "v4");
        assert_eq!(root.stream_headers.len(), 2);
        assert_eq!(root.stream_headers[0].name, "#~");
        assert_eq!(root.stream_headers[1].name, "#Strings");
        assert_eq!(
            root.stream(&header_bytes, "#~").unwrap(),
            &[0xAA, 0xBB, 0xCC, 0xDD]
        );
        assert_eq!(root.stream(&header_bytes, "#Strings").unwrap(), &[0x00, 0x41]);
        assert!(root.stream(&header_bytes, "#Blob").is_none());
    }

    #[test]
    fn invalid_magic() {
        let mut data = vec![0u8; 32];
        data[0] = 0x42;
        assert!(Root::read(&data).is_err());
    }

    #[test]
    fn stream_header_invalid_name() {
        #[rustfmt::skip]
        let header_bytes = [
            0x6C, 0x00, 0x00, 0x00,
            0xA4, 0x45, 0x00, 0x00,
            0x24, 0x7E, 0x00,
        ];

        assert!(StreamHeader::read(&header_bytes).is_err());
    }
}
