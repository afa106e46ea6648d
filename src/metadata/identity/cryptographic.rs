use std::fmt;

use sha1::{Digest, Sha1};

use crate::Result;

/// The 8-byte public key token of a strong-named assembly.
///
/// Bytes are stored in display order, so `b77a5c561934e089` is `[0xb7, 0x7a, ...]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PublicKeyToken([u8; 8]);

impl PublicKeyToken {
    /// Create a token from its bytes in display order.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 8]) -> Self {
        Self(bytes)
    }

    /// Derive the token of a full public key blob.
    ///
    /// The token is the last 8 bytes of the SHA-1 digest of the key, reversed.
    #[must_use]
    pub fn from_public_key(public_key: &[u8]) -> Self {
        let digest = Sha1::digest(public_key);

        let mut token = [0u8; 8];
        for (dst, src) in token.iter_mut().zip(digest.iter().rev()) {
            *dst = *src;
        }

        Self(token)
    }

    /// Build a token from a metadata blob, which holds either a full key or a token.
    ///
    /// Returns `None` for an empty blob.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if `is_public_key` is unset and the blob is not
    /// exactly 8 bytes.
    pub fn from_blob(data: &[u8], is_public_key: bool) -> Result<Option<Self>> {
        if data.is_empty() {
            return Ok(None);
        }

        if is_public_key {
            return Ok(Some(Self::from_public_key(data)));
        }

        let bytes: [u8; 8] = data.try_into().map_err(|_| {
            malformed_error!(
                "Public key token must be 8 bytes, got {} bytes",
                data.len()
            )
        })?;

        Ok(Some(Self(bytes)))
    }

    /// Parse a token from 16 hex characters.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] for invalid hex or a wrong length.
    pub fn parse(value: &str) -> Result<Self> {
        let token_bytes = hex::decode(value)
            .map_err(|e| malformed_error!("Invalid hex in PublicKeyToken '{}': {}", value, e))?;

        let bytes: [u8; 8] = token_bytes.as_slice().try_into().map_err(|_| {
            malformed_error!(
                "PublicKeyToken must be exactly 8 bytes (16 hex characters), got {} bytes from '{}'",
                token_bytes.len(),
                value
            )
        })?;

        Ok(Self(bytes))
    }

    /// Returns the token bytes in display order.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 8] {
        &self.0
    }
}

impl fmt::Display for PublicKeyToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}
