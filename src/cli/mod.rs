//! SM-011: Command-line surface: run a target, print schema or completions.

use crate::core::dispatch::Dispatch;
use crate::core::error::Result;
use crate::core::executor::{compiler_from_env, RunOptions, RunReport, DEFAULT_THREADS};
use crate::core::loader::Config;
use crate::core::types::{Document, ResolvePolicy};
use clap::{ArgAction, CommandFactory, Parser};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "smake",
    version,
    about = "Declarative build orchestrator for C-family projects"
)]
pub struct Cli {
    /// Target to run
    #[arg(required_unless_present_any = ["print_schema", "completions"])]
    pub target: Option<String>,

    /// Execution mode (default: the target's first mode)
    #[arg(short, long, default_value = "")]
    pub mode: String,

    /// Number of concurrent compiler processes
    #[arg(
        short = 'j',
        long,
        default_value_t = DEFAULT_THREADS as u16,
        value_parser = clap::value_parser!(u16).range(1..)
    )]
    pub threads: u16,

    /// Project root to search for smake.yaml files
    #[arg(short = 'C', long, default_value = ".")]
    pub directory: PathBuf,

    /// Output directory, relative to the project root
    #[arg(long, default_value = "build")]
    pub build_dir: PathBuf,

    /// Reject duplicate definitions and unresolved build references
    #[arg(long)]
    pub strict: bool,

    /// Print commands without running them
    #[arg(long)]
    pub dry_run: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Print the JSON schema of smake.yaml and exit
    #[arg(long)]
    pub print_schema: bool,

    /// Print a shell completion script and exit
    #[arg(long, value_name = "SHELL")]
    pub completions: Option<clap_complete::Shell>,
}

impl Cli {
    fn policy(&self) -> ResolvePolicy {
        if self.strict {
            ResolvePolicy::Strict
        } else {
            ResolvePolicy::Lenient
        }
    }

    fn run_options(&self) -> RunOptions {
        RunOptions {
            root: self.directory.clone(),
            build_dir: self.build_dir.clone(),
            threads: usize::from(self.threads),
            compiler: compiler_from_env(),
            dry_run: self.dry_run,
        }
    }
}

/// Install the stderr log subscriber. `RUST_LOG` overrides `-v`.
pub fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("smake={level}")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

/// Execute a parsed command line.
pub fn dispatch(cli: Cli) -> Result<()> {
    if let Some(shell) = cli.completions {
        clap_complete::generate(shell, &mut Cli::command(), "smake", &mut std::io::stdout());
        return Ok(());
    }
    if cli.print_schema {
        println!("{}", schema_json()?);
        return Ok(());
    }

    let Some(target) = cli.target.as_deref() else {
        return Ok(());
    };
    let config = Config::discover(&cli.directory, cli.policy())?;
    match config.run(target, &cli.mode, &cli.run_options())? {
        Dispatch::Ran(report) => print_report(&report, cli.dry_run),
        Dispatch::UnknownTarget { .. } => {}
    }
    Ok(())
}

/// JSON schema of the smake.yaml document.
pub fn schema_json() -> Result<String> {
    let schema = schemars::schema_for!(Document);
    Ok(serde_json::to_string_pretty(&schema)?)
}

fn print_report(report: &RunReport, dry_run: bool) {
    if dry_run {
        println!("Dry run: no commands executed.");
        return;
    }
    for build in &report.builds {
        println!(
            "  {} ({}): {} source(s) -> {}",
            build.role,
            build.build,
            build.objects,
            build.output.display()
        );
    }
    for role in &report.skipped {
        println!("  {}: skipped (unresolved build)", role);
    }
    println!(
        "Built {} [{}] in {:.1}s",
        report.target,
        report.mode,
        report.duration.as_secs_f64()
    );
}
