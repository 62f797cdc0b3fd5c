//! SM-004: Definition loading and reference splitting.
//!
//! Definitions come from the document's `sources` section. Any build or target
//! property entry that exactly matches a definition name expands in place to
//! the definition's values; other entries pass through literally. Expansion is
//! single-level.

use super::error::{Error, Result};
use super::types::{Definitions, Document, Property, ResolvePolicy};
use tracing::{debug, warn};

/// Flatten the `sources` groups into one definition mapping.
///
/// Later groups overwrite earlier ones for the same name unless the policy is
/// `Strict`, in which case a repeated name is an error.
pub fn load_definitions(doc: &Document, policy: ResolvePolicy) -> Result<Definitions> {
    let mut defns = Definitions::new();
    for group in &doc.sources {
        for (name, value) in group {
            if defns.contains_key(name) {
                if policy == ResolvePolicy::Strict {
                    return Err(Error::DuplicateDefinition { name: name.clone() });
                }
                warn!(definition = %name, "duplicate definition; later value wins");
            }
            defns.insert(name.clone(), value.clone());
        }
    }
    debug!(count = defns.len(), "loaded definitions");
    Ok(defns)
}

/// Expand a property against the definitions, preserving input order.
pub fn split(prop: &Property, defns: &Definitions) -> Vec<String> {
    let mut out = Vec::new();
    for entry in prop.references() {
        match defns.get(&entry) {
            Some(value) => out.extend(value.to_vec()),
            None => out.push(entry),
        }
    }
    out
}

/// Expand an optional property, defaulting to empty.
pub fn split_optional(prop: Option<&Property>, defns: &Definitions) -> Vec<String> {
    prop.map(|p| split(p, defns)).unwrap_or_default()
}
