use std::path::Path;

use anyhow::Context;
use dotdeps::{prelude::*, resolution::XmlnsExtractor};
use serde::Serialize;

use crate::{
    app::GlobalOptions,
    output::{print_output, TabWriter},
};

#[derive(Debug, Serialize)]
pub struct IdentityInfo {
    pub full_name: String,
    pub name: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub culture: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key_token: Option<String>,
    pub module: String,
    pub references: Vec<ReferenceInfo>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub xmlns: Vec<XmlnsInfo>,
}

#[derive(Debug, Serialize)]
pub struct ReferenceInfo {
    pub name: String,
    pub version: String,
    pub full_name: String,
}

#[derive(Debug, Serialize)]
pub struct XmlnsInfo {
    pub xml_namespace: String,
    pub clr_namespaces: Vec<String>,
}

pub fn run(path: &Path, opts: &GlobalOptions) -> anyhow::Result<()> {
    let metadata = CilMetadataReader::new()
        .read(path)
        .with_context(|| format!("failed to read assembly: {}", path.display()))?;

    let identity = &metadata.identity;
    let info = IdentityInfo {
        full_name: identity.full_name(),
        name: identity.name.clone(),
        version: identity.version.to_string(),
        culture: identity.culture.clone(),
        public_key_token: identity.public_key_token.map(|token| token.to_string()),
        module: metadata.module_name.clone(),
        references: metadata
            .references
            .iter()
            .map(|reference| ReferenceInfo {
                name: reference.name.clone(),
                version: reference.version.to_string(),
                full_name: reference.full_name(),
            })
            .collect(),
        xmlns: XmlnsExtractor::extract(&metadata)
            .iter()
            .map(|(xml, clr)| XmlnsInfo {
                xml_namespace: xml.to_string(),
                clr_namespaces: clr.to_vec(),
            })
            .collect(),
    };

    print_output(&info, opts, |info| {
        println!("Assembly:  {}", info.name);
        println!("Version:   {}", info.version);
        println!("Culture:   {}", info.culture.as_deref().unwrap_or("neutral"));
        println!(
            "Token:     {}",
            info.public_key_token.as_deref().unwrap_or("null")
        );
        println!("Module:    {}", info.module);
        println!("Full name: {}", info.full_name);

        if !info.references.is_empty() {
            println!("\nReferences:");
            let mut tw = TabWriter::new(&["Name", "Version"]).indent("  ");
            for reference in &info.references {
                tw.row(vec![reference.name.clone(), reference.version.clone()]);
            }
            tw.print();
        }

        if !info.xmlns.is_empty() {
            println!("\nXAML namespaces:");
            for definition in &info.xmlns {
                println!("  {}", definition.xml_namespace);
                for clr in &definition.clr_namespaces {
                    println!("    {clr}");
                }
            }
        }
    })
}
