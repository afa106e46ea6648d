//! Assembly identity and version types.
//!
//! # Key Components
//!
//! - [`AssemblyIdentity`] - Name, version, culture and public key token of an assembly
//! - [`AssemblyVersion`] - Four-part version numbering (major.minor.build.revision)
//!
//! # Full Names
//!
//! The full name is the canonical textual form of an identity and the key used to
//! deduplicate identities during a resolution pass:
//!
//! ```text
//! Name, Version=Major.Minor.Build.Revision, Culture=neutral|culture, PublicKeyToken=null|token
//! ```

use std::{fmt, fmt::Write, str::FromStr};

use crate::{metadata::identity::PublicKeyToken, Error, Result};

/// Complete identity of a .NET assembly or assembly reference.
///
/// Two identities are equal only if every component matches, including the public key
/// token. Names compare case-sensitively here; the resolution pass keys its visited set on the
/// lowercased [`AssemblyIdentity::full_name`] instead.
///
/// # Examples
///
/// ```rust
/// use dotdeps::metadata::identity::{AssemblyIdentity, AssemblyVersion};
///
/// let lib = AssemblyIdentity::new("Lib", AssemblyVersion::new(1, 2, 0, 0));
/// assert_eq!(
///     lib.full_name(),
///     "Lib, Version=1.2.0.0, Culture=neutral, PublicKeyToken=null"
/// );
///
/// let parsed = AssemblyIdentity::parse(&lib.full_name())?;
/// assert_eq!(parsed, lib);
/// # Ok::<(), dotdeps::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssemblyIdentity {
    /// Simple assembly name (e.g., "mscorlib", "System.Core").
    pub name: String,

    /// Four-part version number.
    pub version: AssemblyVersion,

    /// Culture of a satellite assembly. `None` for culture-neutral assemblies.
    pub culture: Option<String>,

    /// Public key token of a strong-named assembly.
    ///
    /// Full public keys found in metadata are reduced to their token when the identity is
    /// built, so identities read from an `Assembly` row and from an `AssemblyRef` row with
    /// a token compare equal.
    pub public_key_token: Option<PublicKeyToken>,
}

impl AssemblyIdentity {
    /// Create a culture-neutral identity without a public key token.
    #[must_use]
    pub fn new(name: impl Into<String>, version: AssemblyVersion) -> Self {
        Self {
            name: name.into(),
            version,
            culture: None,
            public_key_token: None,
        }
    }

    /// Set the culture. An empty string or `neutral` leaves the identity culture-neutral.
    #[must_use]
    pub fn with_culture(mut self, culture: impl Into<String>) -> Self {
        let culture = culture.into();
        self.culture = if culture.is_empty() || culture.eq_ignore_ascii_case("neutral") {
            None
        } else {
            Some(culture)
        };
        self
    }

    /// Set the public key token.
    #[must_use]
    pub fn with_public_key_token(mut self, token: PublicKeyToken) -> Self {
        self.public_key_token = Some(token);
        self
    }

    /// Parse an assembly display name.
    ///
    /// # Format
    ///
    /// ```text
    /// AssemblyName[, Version=Major.Minor.Build.Revision][, Culture=culture][, PublicKeyToken=token]
    /// ```
    ///
    /// Unknown components (e.g. `ProcessorArchitecture=`) are ignored.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the name is empty or a component is invalid.
    pub fn parse(display_name: &str) -> Result<Self> {
        let mut parts = display_name.split(',').map(str::trim);

        let name = parts.next().unwrap_or_default().to_string();
        if name.is_empty() {
            return Err(malformed_error!("Assembly name cannot be empty"));
        }

        let mut identity = AssemblyIdentity::new(name, AssemblyVersion::default());
        for part in parts {
            if let Some(value) = part.strip_prefix("Version=") {
                identity.version = AssemblyVersion::parse(value)?;
            } else if let Some(value) = part.strip_prefix("Culture=") {
                identity = identity.with_culture(value);
            } else if let Some(value) = part.strip_prefix("PublicKeyToken=") {
                if value != "null" && !value.is_empty() {
                    identity.public_key_token = Some(PublicKeyToken::parse(value)?);
                }
            }
        }

        Ok(identity)
    }

    /// Generate the full name of this identity.
    #[must_use]
    pub fn full_name(&self) -> String {
        // Typical format: "Name, Version=x.x.x.x, Culture=neutral, PublicKeyToken=xxxxxxxxxxxxxxxx"
        let mut result = String::with_capacity(self.name.len() + 80);

        result.push_str(&self.name);

        let _ = write!(result, ", Version={}", self.version);

        let culture_str = self.culture.as_deref().unwrap_or("neutral");
        let _ = write!(result, ", Culture={}", culture_str);

        match &self.public_key_token {
            Some(token) => {
                let _ = write!(result, ", PublicKeyToken={}", token);
            }
            None => result.push_str(", PublicKeyToken=null"),
        }

        result
    }

    /// Returns `true` if the identity carries a public key token.
    #[must_use]
    pub fn is_strong_named(&self) -> bool {
        self.public_key_token.is_some()
    }

    /// Returns `true` if the identity has no culture.
    #[must_use]
    pub fn is_culture_neutral(&self) -> bool {
        self.culture.is_none()
    }
}

/// Four-part version numbering for .NET assemblies.
///
/// Versions are compared component-wise in order: major, minor, build, revision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AssemblyVersion {
    /// Major version component.
    pub major: u16,
    /// Minor version component.
    pub minor: u16,
    /// Build version component.
    pub build: u16,
    /// Revision version component.
    pub revision: u16,
}

impl AssemblyVersion {
    /// Create a new version from its four components.
    #[must_use]
    pub const fn new(major: u16, minor: u16, build: u16, revision: u16) -> Self {
        Self {
            major,
            minor,
            build,
            revision,
        }
    }

    /// Parse a dotted version string. Missing trailing components default to zero.
    ///
    /// # Errors
    /// Returns an error if the version string has an invalid format.
    pub fn parse(version_str: &str) -> Result<Self> {
        let parts: Vec<&str> = version_str.split('.').collect();

        if parts.is_empty() || parts.len() > 4 {
            return Err(malformed_error!("Invalid version format: {}", version_str));
        }

        let mut components = [0u16; 4];

        for (i, part) in parts.iter().enumerate() {
            components[i] = part
                .parse::<u16>()
                .map_err(|_| malformed_error!("Invalid version component: {}", part))?;
        }

        Ok(Self::new(
            components[0],
            components[1],
            components[2],
            components[3],
        ))
    }
}

impl fmt::Display for AssemblyVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            self.major, self.minor, self.build, self.revision
        )
    }
}

impl fmt::Display for AssemblyIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_name())
    }
}

impl FromStr for AssemblyVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl FromStr for AssemblyIdentity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assembly_version_parse_full() {
        let version = AssemblyVersion::parse("1.2.3.4").unwrap();
        assert_eq!(version, AssemblyVersion::new(1, 2, 3, 4));
    }

    #[test]
    fn test_assembly_version_parse_partial() {
        let version = AssemblyVersion::parse("2.0").unwrap();
        assert_eq!(version, AssemblyVersion::new(2, 0, 0, 0));

        let version = AssemblyVersion::parse("3").unwrap();
        assert_eq!(version, AssemblyVersion::new(3, 0, 0, 0));
    }

    #[test]
    fn test_assembly_version_parse_invalid() {
        assert!(AssemblyVersion::parse("").is_err());
        assert!(AssemblyVersion::parse("1.2.3.4.5").is_err());
        assert!(AssemblyVersion::parse("1.x").is_err());
        assert!(AssemblyVersion::parse("70000.0").is_err());
    }

    #[test]
    fn test_assembly_version_ordering() {
        let v1 = AssemblyVersion::new(1, 0, 0, 0);
        let v2 = AssemblyVersion::new(1, 2, 0, 0);
        let v3 = AssemblyVersion::new(2, 0, 0, 0);

        assert!(v1 < v2);
        assert!(v2 < v3);
        assert_eq!("1.2.0.0".parse::<AssemblyVersion>().unwrap(), v2);
        assert_eq!(v2.to_string(), "1.2.0.0");
    }

    #[test]
    fn test_identity_full_name() {
        let identity = AssemblyIdentity::new("Lib", AssemblyVersion::new(1, 0, 0, 0));
        assert_eq!(
            identity.full_name(),
            "Lib, Version=1.0.0.0, Culture=neutral, PublicKeyToken=null"
        );

        let identity = AssemblyIdentity::new("Lib.resources", AssemblyVersion::new(1, 0, 0, 0))
            .with_culture("de-DE")
            .with_public_key_token(PublicKeyToken::parse("b77a5c561934e089").unwrap());
        assert_eq!(
            identity.to_string(),
            "Lib.resources, Version=1.0.0.0, Culture=de-DE, PublicKeyToken=b77a5c561934e089"
        );
        assert!(identity.is_strong_named());
        assert!(!identity.is_culture_neutral());
    }

    #[test]
    fn test_identity_parse() {
        let identity = AssemblyIdentity::parse(
            "mscorlib, Version=4.0.0.0, Culture=neutral, PublicKeyToken=b77a5c561934e089",
        )
        .unwrap();

        assert_eq!(identity.name, "mscorlib");
        assert_eq!(identity.version, AssemblyVersion::new(4, 0, 0, 0));
        assert!(identity.culture.is_none());
        assert_eq!(
            identity.public_key_token.unwrap().to_string(),
            "b77a5c561934e089"
        );

        let simple = AssemblyIdentity::parse("MyLibrary").unwrap();
        assert_eq!(simple.version, AssemblyVersion::default());
        assert!(!simple.is_strong_named());

        let extra =
            AssemblyIdentity::parse("Util, Version=2.0.0.0, ProcessorArchitecture=MSIL").unwrap();
        assert_eq!(extra.version, AssemblyVersion::new(2, 0, 0, 0));
    }

    #[test]
    fn test_identity_parse_invalid() {
        assert!(AssemblyIdentity::parse("").is_err());
        assert!(AssemblyIdentity::parse(", Version=1.0.0.0").is_err());
        assert!(AssemblyIdentity::parse("Lib, Version=abc").is_err());
        assert!(AssemblyIdentity::parse("Lib, PublicKeyToken=1234").is_err());
    }

    #[test]
    fn test_identity_equality_includes_token() {
        let plain = AssemblyIdentity::new("Lib", AssemblyVersion::new(1, 0, 0, 0));
        let signed = plain
            .clone()
            .with_public_key_token(PublicKeyToken::from_bytes([1, 2, 3, 4, 5, 6, 7, 8]));

        assert_ne!(plain, signed);
        assert_eq!(plain, plain.clone().with_culture("neutral"));
        assert_eq!(plain, plain.clone().with_culture(""));
    }
}
