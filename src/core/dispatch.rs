//! SM-009: Target dispatch by name and mode.

use super::error::Result;
use super::executor::{RunOptions, RunReport};
use super::loader::Config;
use owo_colors::{OwoColorize, Stream};
use tracing::debug;

/// Outcome of a dispatch request.
#[derive(Debug)]
pub enum Dispatch {
    Ran(RunReport),
    /// The name was not in the namespace; already reported to the user.
    UnknownTarget {
        name: String,
        suggestions: Vec<String>,
    },
}

impl Config {
    /// Run `name` under `mode`. An unknown name is reported with the list of
    /// known targets and is not an error.
    pub fn run(&self, name: &str, mode: &str, opts: &RunOptions) -> Result<Dispatch> {
        if let Some(target) = self.target(name) {
            debug!(selected = %target, mode, "dispatching");
            return Ok(Dispatch::Ran(target.run(mode, opts)?));
        }

        let suggestions: Vec<String> = self.target_names().into_iter().map(String::from).collect();
        print!("{}", render_unknown_target(name, &suggestions));
        Ok(Dispatch::UnknownTarget {
            name: name.to_string(),
            suggestions,
        })
    }
}

/// Failure line followed by one indented line per known target.
pub fn render_unknown_target(name: &str, suggestions: &[String]) -> String {
    let headline =
        format!("No target {name} found. Perhaps you meant one of the following:");
    let mut out = format!(
        "{}\n",
        headline.if_supports_color(Stream::Stdout, |s| s.red())
    );
    for valid in suggestions {
        let line = format!("\t{valid}");
        out.push_str(&format!(
            "{}\n",
            line.if_supports_color(Stream::Stdout, |s| s.magenta())
        ));
    }
    out
}
