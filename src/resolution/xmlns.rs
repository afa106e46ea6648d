//! XAML namespace definitions declared by an assembly.
//!
//! XAML-aware assemblies map XML namespaces to CLR namespaces with assembly-level
//! `[XmlnsDefinition("http://...", "Clr.Namespace")]` attributes. The markup linking feature of
//! the documentation build needs those pairs to turn element names back into types.

use std::collections::BTreeMap;

use crate::metadata::reader::{AssemblyMetadata, CustomAttributeInfo};

const XMLNS_DEFINITION_ATTRIBUTE: &str = "XmlnsDefinitionAttribute";

/// Multimap from XML namespace to the CLR namespaces it covers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlnsDefinitions {
    definitions: BTreeMap<String, Vec<String>>,
}

impl XmlnsDefinitions {
    /// Create an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `xml_namespace` to `clr_namespace`. Repeated pairs are stored once.
    pub fn add(&mut self, xml_namespace: impl Into<String>, clr_namespace: impl Into<String>) {
        let clr_namespace = clr_namespace.into();
        let values = self.definitions.entry(xml_namespace.into()).or_default();
        if !values.contains(&clr_namespace) {
            values.push(clr_namespace);
        }
    }

    /// The CLR namespaces of `xml_namespace`, in declaration order.
    #[must_use]
    pub fn get(&self, xml_namespace: &str) -> &[String] {
        self.definitions
            .get(xml_namespace)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Iterate over `(xml namespace, clr namespaces)` sorted by XML namespace.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.definitions
            .iter()
            .map(|(xml, clr)| (xml.as_str(), clr.as_slice()))
    }

    /// Number of distinct XML namespaces.
    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Returns true if no namespace is mapped.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

/// Extracts [`XmlnsDefinitions`] from assembly metadata.
pub struct XmlnsExtractor;

impl XmlnsExtractor {
    /// Collect every `XmlnsDefinitionAttribute` of `metadata`.
    ///
    /// An attribute contributes only if it has exactly two arguments, both non-empty strings.
    #[must_use]
    pub fn extract(metadata: &AssemblyMetadata) -> XmlnsDefinitions {
        let mut definitions = XmlnsDefinitions::new();

        for attribute in &metadata.custom_attributes {
            if let Some((xml, clr)) = Self::definition(attribute) {
                definitions.add(xml, clr);
            }
        }

        definitions
    }

    fn definition(attribute: &CustomAttributeInfo) -> Option<(&str, &str)> {
        if !attribute.name.eq_ignore_ascii_case(XMLNS_DEFINITION_ATTRIBUTE) {
            return None;
        }

        match attribute.fixed_args.as_slice() {
            [xml, clr] => {
                let xml = xml.as_str().filter(|value| !value.is_empty())?;
                let clr = clr.as_str().filter(|value| !value.is_empty())?;
                Some((xml, clr))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{metadata::reader::AttributeValue, test::create_metadata};

    fn attribute(name: &str, args: Vec<AttributeValue>) -> CustomAttributeInfo {
        CustomAttributeInfo {
            namespace: "System.Windows.Markup".to_string(),
            name: name.to_string(),
            fixed_args: args,
        }
    }

    fn string(value: &str) -> AttributeValue {
        AttributeValue::String(Some(value.to_string()))
    }

    #[test]
    fn extract_definitions() {
        let ui = "http://schemas.example.com/ui";
        let mut metadata = create_metadata("Lib.UI", "1.0.0.0", &[]);
        metadata.custom_attributes = vec![
            attribute("XmlnsDefinitionAttribute", vec![string(ui), string("Lib.UI.Controls")]),
            attribute("XmlnsDefinitionAttribute", vec![string(ui), string("Lib.UI.Shapes")]),
            attribute("xmlnsdefinitionattribute", vec![string(ui), string("Lib.UI.Controls")]),
            attribute("XmlnsPrefixAttribute", vec![string(ui), string("ui")]),
            attribute("XmlnsDefinitionAttribute", vec![string(ui)]),
            attribute("XmlnsDefinitionAttribute", vec![string(""), string("Lib.UI.Empty")]),
            attribute(
                "XmlnsDefinitionAttribute",
                vec![string("urn:other"), AttributeValue::String(None)],
            ),
            attribute(
                "XmlnsDefinitionAttribute",
                vec![string("urn:other"), AttributeValue::Boolean(true)],
            ),
        ];

        let definitions = XmlnsExtractor::extract(&metadata);

        assert_eq!(definitions.len(), 1);
        assert_eq!(definitions.get(ui), &["Lib.UI.Controls", "Lib.UI.Shapes"]);
        assert!(definitions.get("urn:other").is_empty());
        assert_eq!(
            definitions.iter().map(|(xml, _)| xml).collect::<Vec<_>>(),
            vec![ui]
        );
    }

    #[test]
    fn no_attributes() {
        let definitions = XmlnsExtractor::extract(&create_metadata("Lib", "1.0.0.0", &[]));
        assert!(definitions.is_empty());
    }
}
