//! Version redirect detection.

use crate::metadata::identity::AssemblyIdentity;

/// A requested reference that was satisfied by a different version.
///
/// `requested` keeps the reference as it was declared: its version is the redirect version,
/// and its culture and public key token are the ones the redirect is emitted for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    /// The reference as declared by the referencing assembly.
    pub requested: AssemblyIdentity,
    /// Full name of the assembly that was actually resolved.
    pub strong_name: String,
}

/// Compares requested and resolved identities.
pub struct RedirectPolicy;

impl RedirectPolicy {
    /// Returns a [`Redirect`] if `requested` and `resolved` differ in version.
    ///
    /// Names are not compared; the resolver already matched them. An empty requested culture
    /// is carried as no culture.
    #[must_use]
    pub fn evaluate(requested: &AssemblyIdentity, resolved: &AssemblyIdentity) -> Option<Redirect> {
        if requested.version == resolved.version {
            return None;
        }

        let mut requested = requested.clone();
        if requested.culture.as_deref().is_some_and(str::is_empty) {
            requested.culture = None;
        }

        Some(Redirect {
            requested,
            strong_name: resolved.full_name(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{metadata::identity::PublicKeyToken, test::create_test_identity};

    #[test]
    fn same_version() {
        let requested = create_test_identity("Util", "2.0.0.0");
        let resolved = create_test_identity("Util", "2.0.0.0");

        assert_eq!(RedirectPolicy::evaluate(&requested, &resolved), None);
    }

    #[test]
    fn different_version() {
        let token = PublicKeyToken::parse("31bf3856ad364e35").unwrap();
        let requested = create_test_identity("Lib", "1.0.0.0").with_public_key_token(token);
        let resolved = create_test_identity("Lib", "1.2.0.0").with_public_key_token(token);

        let redirect = RedirectPolicy::evaluate(&requested, &resolved).unwrap();
        assert_eq!(redirect.requested.version.to_string(), "1.0.0.0");
        assert_eq!(redirect.requested.public_key_token, Some(token));
        assert_eq!(redirect.requested.culture, None);
        assert_eq!(
            redirect.strong_name,
            "Lib, Version=1.2.0.0, Culture=neutral, PublicKeyToken=31bf3856ad364e35"
        );
    }

    #[test]
    fn carries_requested_culture() {
        let requested = create_test_identity("Lib.resources", "1.0.0.0").with_culture("fr");
        let resolved = create_test_identity("Lib.resources", "1.1.0.0").with_culture("fr");

        let redirect = RedirectPolicy::evaluate(&requested, &resolved).unwrap();
        assert_eq!(redirect.requested.culture.as_deref(), Some("fr"));

        let mut blank = create_test_identity("Lib", "1.0.0.0");
        blank.culture = Some(String::new());
        let redirect =
            RedirectPolicy::evaluate(&blank, &create_test_identity("Lib", "2.0.0.0")).unwrap();
        assert_eq!(redirect.requested.culture, None);
    }
}
