//! SM-006: Target assembly.
//!
//! Wires builds into targets by role, resolves modes, and turns post-build
//! entries into either definition commands or literal scripts. Each bound
//! build is a copy owned by its target, so one registry build may back roles
//! in several targets without any shared mutation.

use super::error::{Error, Result};
use super::parser::{concat, declaration_name, merge_groups, require};
use super::registry::BuildRegistry;
use super::resolver::split;
use super::types::{
    BoundBuild, BuildSlot, Declaration, Definitions, Document, PostBuild, ResolvePolicy, Script,
    Target, TargetProps,
};
use indexmap::IndexMap;
use tracing::{debug, warn};

/// Turn one `{name: [group, ...]}` declaration into a `Target`.
pub fn load_target(
    decl: &Declaration<TargetProps>,
    registry: &BuildRegistry,
    defns: &Definitions,
    policy: ResolvePolicy,
) -> Result<Target> {
    let (name, groups) = declaration_name(decl, "target")?;
    let props = merge_groups(groups);

    let modes = split(require(props.modes.as_ref(), "target", name, "modes")?, defns);
    let roles = concat(require(props.builds.as_deref(), "target", name, "builds")?);
    let postbuild = props.postbuild.as_deref().map(concat).unwrap_or_default();

    let builds = bind_builds(name, roles, registry, policy)?;
    let postbuilds = resolve_postbuilds(postbuild, defns);

    debug!(
        target_name = name,
        modes = modes.len(),
        builds = builds.len(),
        postbuilds = postbuilds.len(),
        "assembled target"
    );
    Ok(Target::new(name, modes, builds, postbuilds))
}

/// Replace role → build-name entries with bound builds.
fn bind_builds(
    target: &str,
    roles: IndexMap<String, String>,
    registry: &BuildRegistry,
    policy: ResolvePolicy,
) -> Result<IndexMap<String, BuildSlot>> {
    let mut builds = IndexMap::new();
    for (role, build_name) in roles {
        let slot = match registry.get(&build_name) {
            Some(build) => BuildSlot::Bound(BoundBuild {
                target: target.to_string(),
                role: role.clone(),
                build: build.clone(),
            }),
            None if policy == ResolvePolicy::Strict => {
                return Err(Error::DanglingBuild {
                    target: target.to_string(),
                    role,
                    build: build_name,
                });
            }
            None => {
                warn!(target_name = target, role = %role, build = %build_name, "unresolved build reference");
                BuildSlot::Dangling(build_name)
            }
        };
        builds.insert(role, slot);
    }
    Ok(builds)
}

/// Mode → definition commands, or a literal script when no definition matches.
fn resolve_postbuilds(
    entries: IndexMap<String, String>,
    defns: &Definitions,
) -> IndexMap<String, PostBuild> {
    entries
        .into_iter()
        .map(|(mode, reference)| {
            let action = match defns.get(&reference) {
                Some(value) => PostBuild::Defined(value.to_vec()),
                None => PostBuild::Script(Script::new(reference)),
            };
            (mode, action)
        })
        .collect()
}

/// Assemble every target declared in the document.
pub fn load_all_targets(
    doc: &Document,
    registry: &BuildRegistry,
    defns: &Definitions,
    policy: ResolvePolicy,
) -> Result<IndexMap<String, Target>> {
    let mut targets = IndexMap::new();
    for decl in &doc.targets {
        let target = load_target(decl, registry, defns, policy)?;
        targets.insert(target.name.clone(), target);
    }
    Ok(targets)
}
