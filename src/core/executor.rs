//! SM-008: Executor. Runs a target's builds and its post-build action.
//!
//! For each bound build, in role order: compile every source to an object
//! (in parallel, bounded by the thread hint), then link. Afterwards the
//! post-build registered for the selected mode runs through bash in the
//! project root.

use super::error::{Error, Result};
use super::types::{BoundBuild, Build, BuildSlot, PostBuild, Script, Target};
use crate::transport::{self, render_command};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Default concurrency hint.
pub const DEFAULT_THREADS: usize = 8;

/// Settings for running a target.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Project root; commands run here and relative paths resolve against it
    pub root: PathBuf,
    /// Output directory, relative to the root unless absolute
    pub build_dir: PathBuf,
    /// Maximum concurrent compiler processes
    pub threads: usize,
    /// Compiler driver
    pub compiler: String,
    /// Print commands instead of running them
    pub dry_run: bool,
}

impl RunOptions {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            build_dir: PathBuf::from("build"),
            threads: DEFAULT_THREADS,
            compiler: compiler_from_env(),
            dry_run: false,
        }
    }

    /// A path as seen from this process. Command arguments are relative to
    /// `root`, where commands run.
    pub fn on_disk(&self, path: &Path) -> PathBuf {
        self.root.join(path)
    }

    /// Compiler program and leading arguments, e.g. `CC="gcc -m32"`.
    fn compiler_argv(&self) -> Vec<String> {
        let argv: Vec<String> = self.compiler.split_whitespace().map(String::from).collect();
        if argv.is_empty() {
            vec!["cc".to_string()]
        } else {
            argv
        }
    }
}

/// `SMAKE_CC`, then `CC`, then `cc`.
pub fn compiler_from_env() -> String {
    ["SMAKE_CC", "CC"]
        .iter()
        .filter_map(|key| std::env::var(key).ok())
        .find(|value| !value.trim().is_empty())
        .unwrap_or_else(|| "cc".to_string())
}

/// Result of running one bound build.
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub role: String,
    pub build: String,
    pub objects: usize,
    pub output: PathBuf,
    /// Non-empty stderr from successful compile and link steps
    pub diagnostics: Vec<String>,
}

/// Result of running a target under a mode.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub target: String,
    pub mode: String,
    pub builds: Vec<BuildReport>,
    /// Roles skipped because their build reference is dangling
    pub skipped: Vec<String>,
    pub postbuild: bool,
    pub duration: Duration,
}

// ============================================================================
// Target
// ============================================================================

impl Target {
    /// Validate a requested mode. Empty selects the first declared mode.
    pub fn resolve_mode<'a>(&'a self, mode: &'a str) -> Result<&'a str> {
        if mode.is_empty() {
            return self
                .modes
                .first()
                .map(String::as_str)
                .ok_or_else(|| Error::NoModes {
                    target: self.name.clone(),
                });
        }
        if self.modes.iter().any(|m| m == mode) {
            return Ok(mode);
        }
        Err(Error::UnknownMode {
            target: self.name.clone(),
            mode: mode.to_string(),
            known: self.modes.clone(),
        })
    }

    /// Run every build, then the post-build action for `mode`.
    pub fn run(&self, mode: &str, opts: &RunOptions) -> Result<RunReport> {
        let start = Instant::now();
        let mode = self.resolve_mode(mode)?;
        info!(target_name = %self.name, mode, threads = opts.threads, "running target");

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(opts.threads.max(1))
            .enable_all()
            .build()?;

        let mut builds = Vec::new();
        let mut skipped = Vec::new();
        for (role, slot) in &self.builds {
            match slot {
                BuildSlot::Bound(bound) => builds.push(runtime.block_on(bound.run(opts))?),
                BuildSlot::Dangling(name) => {
                    warn!(target_name = %self.name, role = %role, build = %name, "skipping unresolved build");
                    skipped.push(role.clone());
                }
            }
        }

        let postbuild = match self.postbuilds.get(mode) {
            Some(action) => {
                action.run(opts)?;
                true
            }
            None => false,
        };

        Ok(RunReport {
            target: self.name.clone(),
            mode: mode.to_string(),
            builds,
            skipped,
            postbuild,
            duration: start.elapsed(),
        })
    }
}

// ============================================================================
// Builds
// ============================================================================

impl BoundBuild {
    /// Linked output `<build-dir>/<target>/<build>`, relative to the project root.
    pub fn output_path(&self, opts: &RunOptions) -> PathBuf {
        opts.build_dir.join(&self.target).join(&self.build.name)
    }

    /// Object directory `<build-dir>/<target>/<build>.obj`, relative to the project root.
    pub fn object_dir(&self, opts: &RunOptions) -> PathBuf {
        opts.build_dir
            .join(&self.target)
            .join(format!("{}.obj", self.build.name))
    }

    /// Compile all sources, then link.
    pub async fn run(&self, opts: &RunOptions) -> Result<BuildReport> {
        let build = &self.build;
        let output = self.output_path(opts);
        let obj_dir = self.object_dir(opts);
        let mut report = BuildReport {
            role: self.role.clone(),
            build: build.name.clone(),
            objects: build.sources.len(),
            output: opts.on_disk(&output),
            diagnostics: Vec::new(),
        };

        if build.sources.is_empty() {
            warn!(build = %build.name, "build has no sources; nothing to do");
            return Ok(report);
        }

        let compiler = opts.compiler_argv();
        let objects: Vec<PathBuf> = build
            .sources
            .iter()
            .enumerate()
            .map(|(index, src)| object_path(&obj_dir, index, src))
            .collect();
        let steps: Vec<Vec<String>> = build
            .sources
            .iter()
            .zip(&objects)
            .map(|(src, obj)| compile_command(&compiler, build, src, obj))
            .collect();
        let link = link_command(&compiler, build, &objects, &output);

        if opts.dry_run {
            for step in &steps {
                println!("{}", render_command(step));
            }
            println!("{}", render_command(&link));
            return Ok(report);
        }

        tokio::fs::create_dir_all(opts.on_disk(&obj_dir)).await?;
        report.diagnostics = compile_all(steps, &opts.root, opts.threads).await?;

        let command = render_command(&link);
        info!(%command, "linking");
        let out = transport::exec_command(&link, &opts.root)
            .await?
            .check(&command)?;
        report.diagnostics.extend(out.forward());

        Ok(report)
    }
}

/// Run compile steps concurrently, at most `threads` at a time.
/// Every step runs to completion; the first failure is returned.
/// On success, returns the non-empty stderr of each step in completion order.
async fn compile_all(steps: Vec<Vec<String>>, cwd: &Path, threads: usize) -> Result<Vec<String>> {
    let semaphore = Arc::new(Semaphore::new(threads.max(1)));
    let mut join_set = JoinSet::new();

    for argv in steps {
        let semaphore = semaphore.clone();
        let cwd = cwd.to_path_buf();
        join_set.spawn(async move {
            let _permit = semaphore.acquire().await?;
            let command = render_command(&argv);
            info!(%command, "compiling");
            let out = transport::exec_command(&argv, &cwd).await?.check(&command)?;
            Ok::<_, Error>(out.forward())
        });
    }

    let mut diagnostics = Vec::new();
    let mut first_error = None;
    while let Some(joined) = join_set.join_next().await {
        match joined.map_err(Error::from).and_then(|r| r) {
            Ok(stderr) => diagnostics.extend(stderr),
            Err(e) => {
                debug!(error = %e, "compile step failed");
                first_error.get_or_insert(e);
            }
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(diagnostics),
    }
}

/// `<cc> <flags> -I<inc>... -c <src> -o <obj>`
pub fn compile_command(compiler: &[String], build: &Build, source: &str, object: &Path) -> Vec<String> {
    let mut argv = compiler.to_vec();
    argv.extend(build.flags.iter().cloned());
    argv.extend(build.includes.iter().map(|inc| format!("-I{inc}")));
    argv.push("-c".to_string());
    argv.push(source.to_string());
    argv.push("-o".to_string());
    argv.push(object.display().to_string());
    argv
}

/// `<cc> <objs> -o <out> <flags> <libs>`
pub fn link_command(compiler: &[String], build: &Build, objects: &[PathBuf], output: &Path) -> Vec<String> {
    let mut argv = compiler.to_vec();
    argv.extend(objects.iter().map(|o| o.display().to_string()));
    argv.push("-o".to_string());
    argv.push(output.display().to_string());
    argv.extend(build.flags.iter().cloned());
    argv.extend(build.libraries.iter().map(|lib| library_arg(lib)));
    argv
}

/// Bare names become `-l<name>`; flags and paths pass through.
pub fn library_arg(lib: &str) -> String {
    let passthrough =
        lib.starts_with('-') || lib.contains('/') || lib.ends_with(".a") || lib.ends_with(".so");
    if passthrough {
        lib.to_string()
    } else {
        format!("-l{lib}")
    }
}

/// Object file for the `index`-th source of a build. The index prefix keeps
/// names unique within the object directory; the flattened source name keeps
/// them readable.
pub fn object_path(obj_dir: &Path, index: usize, source: &str) -> PathBuf {
    let flat: String = source
        .trim_start_matches("./")
        .chars()
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .collect();
    obj_dir.join(format!("{index}-{flat}.o"))
}

// ============================================================================
// Post-build actions
// ============================================================================

impl Script {
    pub fn run(&self, opts: &RunOptions) -> Result<()> {
        run_shell(&self.command, opts)
    }
}

impl PostBuild {
    /// Run each command in order, stopping at the first failure.
    pub fn run(&self, opts: &RunOptions) -> Result<()> {
        for command in self.commands() {
            run_shell(command, opts)?;
        }
        Ok(())
    }
}

fn run_shell(command: &str, opts: &RunOptions) -> Result<()> {
    if opts.dry_run {
        println!("{command}");
        return Ok(());
    }
    info!(%command, "running post-build");
    transport::exec_script(command, &opts.root)?
        .check(command)?
        .forward();
    Ok(())
}
