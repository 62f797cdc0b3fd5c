//! SM-001: Configuration schema and resolved descriptors.
//!
//! Raw records mirror the smake.yaml layout: every build and target is a
//! single-key mapping whose value is a list of property groups. Groups merge
//! field by field, later groups winning. Resolved descriptors (`Build`,
//! `Target`) are what the dispatcher and executor operate on.

use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Base name of every configuration file picked up by discovery.
pub const CONFIG_FILE_NAME: &str = "smake.yaml";

/// Marker carried by every build descriptor.
pub const BUILD_KIND: &str = "smake-build";

// ============================================================================
// Raw smake.yaml
// ============================================================================

/// One parsed smake.yaml document.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct Document {
    /// Definition groups (name → value or list of values)
    #[serde(default)]
    pub sources: Vec<IndexMap<String, Property>>,

    /// Build declarations (build name → property groups)
    #[serde(default)]
    pub builds: Vec<Declaration<BuildProps>>,

    /// Target declarations (target name → property groups)
    #[serde(default)]
    pub targets: Vec<Declaration<TargetProps>>,
}

/// A named declaration: a mapping expected to hold exactly one key.
pub type Declaration<P> = IndexMap<String, Vec<P>>;

/// A property value: a single string or a list of strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum Property {
    Single(String),
    List(Vec<String>),
}

impl Property {
    /// Entries as written in a build/target property.
    /// A single string is a `", "`-separated list.
    pub fn references(&self) -> Vec<String> {
        match self {
            Self::Single(s) => s.split(", ").map(str::to_string).collect(),
            Self::List(v) => v.clone(),
        }
    }

    /// Values of a definition. A single string stays one value.
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            Self::Single(s) => vec![s.clone()],
            Self::List(v) => v.clone(),
        }
    }
}

impl From<&str> for Property {
    fn from(s: &str) -> Self {
        Self::Single(s.to_string())
    }
}

/// One property group of a build declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct BuildProps {
    /// Source files (required once groups are merged)
    #[serde(default)]
    pub sources: Option<Property>,

    /// Include directories
    #[serde(default)]
    pub includes: Option<Property>,

    /// Libraries to link
    #[serde(default)]
    pub libraries: Option<Property>,

    /// Compiler flags
    #[serde(default)]
    pub flags: Option<Property>,
}

/// One property group of a target declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct TargetProps {
    /// Supported modes (required once groups are merged)
    #[serde(default)]
    pub modes: Option<Property>,

    /// Role → build name groups (required once groups are merged)
    #[serde(default)]
    pub builds: Option<Vec<IndexMap<String, String>>>,

    /// Mode → definition name or literal command groups
    #[serde(default)]
    pub postbuild: Option<Vec<IndexMap<String, String>>>,
}

/// Later-wins merge of property groups.
pub trait Merge {
    fn merge(&mut self, later: Self);
}

impl Merge for BuildProps {
    fn merge(&mut self, later: Self) {
        if later.sources.is_some() {
            self.sources = later.sources;
        }
        if later.includes.is_some() {
            self.includes = later.includes;
        }
        if later.libraries.is_some() {
            self.libraries = later.libraries;
        }
        if later.flags.is_some() {
            self.flags = later.flags;
        }
    }
}

impl Merge for TargetProps {
    fn merge(&mut self, later: Self) {
        if later.modes.is_some() {
            self.modes = later.modes;
        }
        if later.builds.is_some() {
            self.builds = later.builds;
        }
        if later.postbuild.is_some() {
            self.postbuild = later.postbuild;
        }
    }
}

// ============================================================================
// Resolution policy
// ============================================================================

/// How unresolved or conflicting references are handled during loading.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResolvePolicy {
    /// Duplicate definitions overwrite; unknown build names stay dangling.
    #[default]
    Lenient,
    /// Duplicate definitions and dangling build names are load errors.
    Strict,
}

// ============================================================================
// Resolved descriptors
// ============================================================================

/// Definition name → values, scoped to one document.
pub type Definitions = IndexMap<String, Property>;

/// A compilation unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Build {
    pub kind: &'static str,
    pub name: String,
    pub sources: Vec<String>,
    pub includes: Vec<String>,
    pub libraries: Vec<String>,
    pub flags: Vec<String>,
}

impl Build {
    pub fn new(
        name: impl Into<String>,
        sources: Vec<String>,
        includes: Vec<String>,
        libraries: Vec<String>,
        flags: Vec<String>,
    ) -> Self {
        Self {
            kind: BUILD_KIND,
            name: name.into(),
            sources,
            includes,
            libraries,
            flags,
        }
    }
}

/// A build attached to a target under a role.
///
/// The registry's `Build` is never mutated; each target owns its own copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundBuild {
    pub target: String,
    pub role: String,
    pub build: Build,
}

impl BoundBuild {
    /// Name of the owning target.
    pub fn owner(&self) -> &str {
        &self.target
    }
}

/// A target's entry for one role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildSlot {
    Bound(BoundBuild),
    /// The referenced build name matched nothing in the registry.
    Dangling(String),
}

impl BuildSlot {
    pub fn as_bound(&self) -> Option<&BoundBuild> {
        match self {
            Self::Bound(b) => Some(b),
            Self::Dangling(_) => None,
        }
    }
}

/// A literal shell command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script {
    pub command: String,
}

impl Script {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

/// Action run after a target's builds for a given mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostBuild {
    /// Commands taken from a definition.
    Defined(Vec<String>),
    Script(Script),
}

impl PostBuild {
    /// Shell commands this action runs, in order.
    pub fn commands(&self) -> Vec<&str> {
        match self {
            Self::Defined(lines) => lines.iter().map(String::as_str).collect(),
            Self::Script(s) => vec![s.command.as_str()],
        }
    }
}

/// A runnable unit: builds under roles, modes, and per-mode post-build actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub name: String,
    pub modes: Vec<String>,
    pub builds: IndexMap<String, BuildSlot>,
    pub postbuilds: IndexMap<String, PostBuild>,
}

impl Target {
    pub fn new(
        name: impl Into<String>,
        modes: Vec<String>,
        builds: IndexMap<String, BuildSlot>,
        postbuilds: IndexMap<String, PostBuild>,
    ) -> Self {
        Self {
            name: name.into(),
            modes,
            builds,
            postbuilds,
        }
    }

    /// Bound builds in role order.
    pub fn bound_builds(&self) -> impl Iterator<Item = &BoundBuild> {
        self.builds.values().filter_map(BuildSlot::as_bound)
    }

    /// Roles whose build reference did not resolve.
    pub fn dangling(&self) -> Vec<(&str, &str)> {
        self.builds
            .iter()
            .filter_map(|(role, slot)| match slot {
                BuildSlot::Dangling(name) => Some((role.as_str(), name.as_str())),
                BuildSlot::Bound(_) => None,
            })
            .collect()
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.name, self.modes.join(", "))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sm001_document_parse() {
        let yaml = r#"
sources:
  - core_src: [main.c, util.c]
builds:
  - core:
      - sources: core_src
      - flags: -O2
targets:
  - app:
      - modes: default, release
      - builds:
          - main: core
      - postbuild:
          - release: strip build/app/core
"#;
        let doc: Document = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(doc.sources.len(), 1);
        assert_eq!(
            doc.sources[0]["core_src"],
            Property::List(vec!["main.c".into(), "util.c".into()])
        );
        assert_eq!(doc.builds[0]["core"].len(), 2);
        assert_eq!(doc.targets[0]["app"].len(), 3);
    }

    #[test]
    fn test_sm001_document_defaults() {
        let doc: Document = serde_yaml_ng::from_str("sources: []").unwrap();
        assert!(doc.builds.is_empty());
        assert!(doc.targets.is_empty());
    }

    #[test]
    fn test_sm001_unknown_build_property_rejected() {
        let yaml = r#"
builds:
  - core:
      - sauces: main.c
"#;
        assert!(serde_yaml_ng::from_str::<Document>(yaml).is_err());
    }

    #[test]
    fn test_sm001_property_references_split() {
        let p = Property::from("a, b, literal");
        assert_eq!(p.references(), vec!["a", "b", "literal"]);
        // Only ", " separates
        let p = Property::from("a,b");
        assert_eq!(p.references(), vec!["a,b"]);
    }

    #[test]
    fn test_sm001_property_to_vec_keeps_single() {
        let p = Property::from("-Wall -Wextra, -g");
        assert_eq!(p.to_vec(), vec!["-Wall -Wextra, -g"]);
    }

    #[test]
    fn test_sm001_build_props_merge_later_wins() {
        let mut a = BuildProps {
            sources: Some("a.c".into()),
            flags: Some("-O0".into()),
            ..Default::default()
        };
        a.merge(BuildProps {
            flags: Some("-O2".into()),
            ..Default::default()
        });
        assert_eq!(a.sources, Some("a.c".into()));
        assert_eq!(a.flags, Some("-O2".into()));
    }

    #[test]
    fn test_sm001_build_kind_marker() {
        let b = Build::new("core", vec!["main.c".into()], vec![], vec![], vec![]);
        assert_eq!(b.kind, BUILD_KIND);
    }

    #[test]
    fn test_sm001_postbuild_commands() {
        let pb = PostBuild::Defined(vec!["echo a".into(), "echo b".into()]);
        assert_eq!(pb.commands(), vec!["echo a", "echo b"]);
        let pb = PostBuild::Script(Script::new("make install"));
        assert_eq!(pb.commands(), vec!["make install"]);
    }

    #[test]
    fn test_sm001_target_dangling_and_bound() {
        let build = Build::new("core", vec!["main.c".into()], vec![], vec![], vec![]);
        let mut builds = IndexMap::new();
        builds.insert(
            "main".to_string(),
            BuildSlot::Bound(BoundBuild {
                target: "app".into(),
                role: "main".into(),
                build,
            }),
        );
        builds.insert("extra".to_string(), BuildSlot::Dangling("ghost".into()));
        let t = Target::new("app", vec!["default".into()], builds, IndexMap::new());
        assert_eq!(t.bound_builds().count(), 1);
        assert_eq!(t.dangling(), vec![("extra", "ghost")]);
        assert_eq!(t.to_string(), "app [default]");
    }
}
