//! SM-007: Multi-file loading.
//!
//! Finds every smake.yaml under a root and folds each file's targets into one
//! namespace. Discovered paths are sorted so that later-file-wins merging is
//! reproducible across filesystems.

use super::assembler::load_all_targets;
use super::error::Result;
use super::parser::parse_document_file;
use super::registry::load_all_builds;
use super::resolver::load_definitions;
use super::types::{Document, ResolvePolicy, Target, CONFIG_FILE_NAME};
use indexmap::IndexMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Every smake.yaml under `root`, in lexicographic path order.
pub fn discover(root: &Path) -> Result<Vec<PathBuf>> {
    let escaped = glob::Pattern::escape(&root.to_string_lossy());
    let pattern = Path::new(&escaped).join("**").join(CONFIG_FILE_NAME);

    let mut paths = Vec::new();
    for entry in glob::glob(&pattern.to_string_lossy())? {
        let path = entry?;
        if path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();
    debug!(root = %root.display(), found = paths.len(), "discovered config files");
    Ok(paths)
}

/// The merged target namespace.
#[derive(Debug, Default)]
pub struct Config {
    policy: ResolvePolicy,
    targets: IndexMap<String, Target>,
    files: Vec<PathBuf>,
}

impl Config {
    /// An empty namespace.
    pub fn new(policy: ResolvePolicy) -> Self {
        Self {
            policy,
            ..Default::default()
        }
    }

    /// Discover and load every config file under `root`.
    /// Any unreadable or invalid file aborts the whole load.
    pub fn discover(root: &Path, policy: ResolvePolicy) -> Result<Self> {
        let mut config = Self::new(policy);
        for path in discover(root)? {
            config.load_file(&path)?;
        }
        Ok(config)
    }

    /// Load one file into the namespace. Returns the number of targets it declared.
    pub fn load_file(&mut self, path: &Path) -> Result<usize> {
        let doc = parse_document_file(path)?;
        let count = self.load_document(&doc)?;
        info!(path = %path.display(), targets = count, "loaded config");
        self.files.push(path.to_path_buf());
        Ok(count)
    }

    /// Resolve a parsed document and merge its targets; same-named targets are replaced.
    pub fn load_document(&mut self, doc: &Document) -> Result<usize> {
        let defns = load_definitions(doc, self.policy)?;
        let registry = load_all_builds(doc, &defns)?;
        let targets = load_all_targets(doc, &registry, &defns, self.policy)?;

        let count = targets.len();
        for (name, target) in targets {
            if self.targets.contains_key(&name) {
                debug!(target_name = %name, "replacing target from earlier file");
            }
            self.targets.insert(name, target);
        }
        Ok(count)
    }

    pub fn targets(&self) -> &IndexMap<String, Target> {
        &self.targets
    }

    pub fn target(&self, name: &str) -> Option<&Target> {
        self.targets.get(name)
    }

    /// Known target names in namespace order.
    pub fn target_names(&self) -> Vec<&str> {
        self.targets.keys().map(String::as_str).collect()
    }

    /// Files loaded so far, in load order.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn policy(&self) -> ResolvePolicy {
        self.policy
    }
}
