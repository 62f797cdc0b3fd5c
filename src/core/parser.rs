//! SM-003: smake.yaml parsing and declaration helpers.
//!
//! Parses a document into typed records and provides the shared steps used by
//! the registry and assembler:
//! - single-key declaration unpacking
//! - later-wins merging of property groups and role/mode mappings
//! - required-property checks with descriptive errors

use super::error::{Error, Result};
use super::types::{Declaration, Document, Merge};
use indexmap::IndexMap;
use std::path::Path;

/// Parse a smake.yaml file from disk.
pub fn parse_document_file(path: &Path) -> Result<Document> {
    let content = std::fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_document(&content, &path.display().to_string())
}

/// Parse a smake.yaml from a string. An empty document has no declarations.
pub fn parse_document(yaml: &str, origin: &str) -> Result<Document> {
    if yaml.trim().is_empty() {
        return Ok(Document::default());
    }
    serde_yaml_ng::from_str(yaml).map_err(|source| Error::Parse {
        origin: origin.to_string(),
        source,
    })
}

/// Unpack a `{name: [group, ...]}` declaration.
pub fn declaration_name<'a, P>(
    decl: &'a Declaration<P>,
    kind: &'static str,
) -> Result<(&'a str, &'a [P])> {
    if decl.len() != 1 {
        return Err(Error::MalformedDeclaration {
            kind,
            count: decl.len(),
        });
    }
    let (name, groups) = decl
        .first()
        .ok_or(Error::MalformedDeclaration { kind, count: 0 })?;
    Ok((name.as_str(), groups.as_slice()))
}

/// Merge property groups in order; later groups override earlier fields.
pub fn merge_groups<P: Merge + Default + Clone>(groups: &[P]) -> P {
    groups.iter().cloned().fold(P::default(), |mut acc, group| {
        acc.merge(group);
        acc
    })
}

/// Union a list of small mappings into one; later keys win.
pub fn concat<V: Clone>(maps: &[IndexMap<String, V>]) -> IndexMap<String, V> {
    let mut out = IndexMap::new();
    for map in maps {
        for (k, v) in map {
            out.insert(k.clone(), v.clone());
        }
    }
    out
}

/// Unwrap a required merged property.
pub fn require<T>(
    value: Option<T>,
    kind: &'static str,
    name: &str,
    property: &'static str,
) -> Result<T> {
    value.ok_or_else(|| Error::MissingProperty {
        kind,
        name: name.to_string(),
        property,
    })
}
