//! SM-010: Process transport for shell scripts and direct compiler commands.

pub mod local;

use crate::core::error::{Error, Result};
use std::path::Path;

/// Output from running a script or command.
#[derive(Debug, Clone)]
pub struct ExecOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ExecOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Turn a non-zero exit into `Error::CommandFailed`.
    pub fn check(self, command: &str) -> Result<Self> {
        if self.success() {
            return Ok(self);
        }
        Err(Error::CommandFailed {
            command: command.to_string(),
            code: self.exit_code,
            stderr: self.stderr.trim().to_string(),
        })
    }

    /// Echo captured output to the console. Returns the trimmed stderr when
    /// there was any.
    pub fn forward(&self) -> Option<String> {
        print!("{}", self.stdout);
        if self.stderr.trim().is_empty() {
            return None;
        }
        eprint!("{}", self.stderr);
        Some(self.stderr.trim().to_string())
    }
}

/// Run a shell script in `cwd`.
pub fn exec_script(script: &str, cwd: &Path) -> Result<ExecOutput> {
    local::exec_local(script, cwd)
}

/// Run `argv[0]` with the remaining arguments in `cwd`, without a shell.
pub async fn exec_command(argv: &[String], cwd: &Path) -> Result<ExecOutput> {
    local::exec_argv(argv, cwd).await
}

/// Render an argument vector for display, quoting arguments with whitespace.
pub fn render_command(argv: &[String]) -> String {
    argv.iter()
        .map(|arg| {
            if arg.is_empty() || arg.chars().any(|c| c.is_whitespace() || c == '\'') {
                format!("'{}'", arg.replace('\'', r"'\''"))
            } else {
                arg.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sm010_exec_output_success() {
        let ok = ExecOutput { exit_code: 0, stdout: "ok".into(), stderr: "".into() };
        assert!(ok.success());
        let fail = ExecOutput { exit_code: 1, stdout: "".into(), stderr: "err".into() };
        assert!(!fail.success());
        let sig = ExecOutput { exit_code: 137, stdout: "".into(), stderr: "killed".into() };
        assert!(!sig.success());
    }

    #[test]
    fn test_sm010_check_failure() {
        let fail = ExecOutput { exit_code: 2, stdout: "".into(), stderr: " boom \n".into() };
        let err = fail.check("cc -c x.c").unwrap_err();
        match err {
            Error::CommandFailed { command, code, stderr } => {
                assert_eq!(command, "cc -c x.c");
                assert_eq!(code, 2);
                assert_eq!(stderr, "boom");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_sm010_forward_reports_stderr() {
        let quiet = ExecOutput { exit_code: 0, stdout: "ok\n".into(), stderr: " \n".into() };
        assert_eq!(quiet.forward(), None);
        let noisy = ExecOutput {
            exit_code: 0,
            stdout: "".into(),
            stderr: "main.c:3: warning: unused variable\n".into(),
        };
        assert_eq!(noisy.forward().as_deref(), Some("main.c:3: warning: unused variable"));
    }

    #[test]
    fn test_sm010_exec_script_in_cwd() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("marker.txt"), "").unwrap();
        let out = exec_script("ls", dir.path()).unwrap();
        assert!(out.success());
        assert!(out.stdout.contains("marker.txt"));
    }

    #[test]
    fn test_sm010_render_command_quotes() {
        let argv = vec![
            "cc".to_string(),
            "-DNAME=hello world".to_string(),
            "it's".to_string(),
            "main.c".to_string(),
        ];
        assert_eq!(
            render_command(&argv),
            r"cc '-DNAME=hello world' 'it'\''s' main.c"
        );
    }
}
