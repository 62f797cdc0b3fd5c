//! SM-005: Build registry construction.

use super::error::Result;
use super::parser::{declaration_name, merge_groups, require};
use super::resolver::{split, split_optional};
use super::types::{Build, BuildProps, Declaration, Definitions, Document};
use indexmap::IndexMap;
use tracing::debug;

/// Build name → descriptor, scoped to one document.
pub type BuildRegistry = IndexMap<String, Build>;

/// Turn one `{name: [group, ...]}` declaration into a `Build`.
pub fn load_build(decl: &Declaration<BuildProps>, defns: &Definitions) -> Result<Build> {
    let (name, groups) = declaration_name(decl, "build")?;
    let props = merge_groups(groups);

    let sources = require(props.sources.as_ref(), "build", name, "sources")?;
    let sources = split(sources, defns);
    let includes = split_optional(props.includes.as_ref(), defns);
    let libraries = split_optional(props.libraries.as_ref(), defns);
    let flags = split_optional(props.flags.as_ref(), defns);

    debug!(build = name, sources = sources.len(), "loaded build");
    Ok(Build::new(name, sources, includes, libraries, flags))
}

/// Load every build declared in the document.
pub fn load_all_builds(doc: &Document, defns: &Definitions) -> Result<BuildRegistry> {
    let mut registry = BuildRegistry::new();
    for decl in &doc.builds {
        let build = load_build(decl, defns)?;
        registry.insert(build.name.clone(), build);
    }
    Ok(registry)
}
