//! Process execution utilities
//!
//! External tools are invoked as shell command strings, the same way they
//! would be typed into a terminal (`npm exec cap sync android`). This module
//! provides:
//! - [`ShellCommand`]: a command line plus environment overrides and a working directory
//! - [`CommandRunner`]: the seam through which every invocation goes
//! - [`ShellRunner`]: the real runner (`sh -c` / `cmd /C`)
//! - [`ChildHandle`]: a spawned, still-running child process

use crate::error::{Error, ErrorCode, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Output, Stdio};

/// A shell command line with environment overrides
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellCommand {
    line: String,
    env: Vec<(String, String)>,
    cwd: Option<PathBuf>,
}

impl ShellCommand {
    /// Create a command from a shell line
    pub fn new(line: impl Into<String>) -> Self {
        Self {
            line: line.into(),
            env: Vec::new(),
            cwd: None,
        }
    }

    /// Set an environment variable for this command only
    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Run the command from the given directory
    #[must_use]
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// The command line without environment prefixes
    pub fn line(&self) -> &str {
        &self.line
    }

    /// Environment overrides in insertion order
    pub fn envs(&self) -> &[(String, String)] {
        &self.env
    }

    /// Working directory, if any
    pub fn cwd(&self) -> Option<&Path> {
        self.cwd.as_deref()
    }

    fn to_command(&self) -> Command {
        let mut cmd = if cfg!(windows) {
            let mut c = Command::new("cmd");
            c.args(["/C", &self.line]);
            c
        } else {
            let mut c = Command::new("sh");
            c.args(["-c", &self.line]);
            c
        };
        for (key, value) in &self.env {
            cmd.env(key, value);
        }
        if let Some(dir) = &self.cwd {
            cmd.current_dir(dir);
        }
        cmd
    }
}

/// Renders as `KEY=value ... line`, the way it would be typed in a shell.
impl fmt::Display for ShellCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in &self.env {
            write!(f, "{key}={value} ")?;
        }
        f.write_str(&self.line)
    }
}

/// Result of a command execution
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Whether the command succeeded (exit code 0)
    pub success: bool,
    /// Exit code of the command
    pub exit_code: i32,
    /// Standard output
    pub stdout: String,
    /// Standard error
    pub stderr: String,
}

impl CommandResult {
    /// Create from std::process::Output
    pub fn from_output(output: Output) -> Self {
        Self {
            success: output.status.success(),
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        }
    }

    /// A successful result with no output
    pub fn ok() -> Self {
        Self {
            success: true,
            exit_code: 0,
            stdout: String::new(),
            stderr: String::new(),
        }
    }

    /// A failed result with the given exit code and stderr
    pub fn failed(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            exit_code,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Get combined output (stdout + stderr)
    pub fn combined_output(&self) -> String {
        if self.stderr.is_empty() {
            self.stdout.clone()
        } else if self.stdout.is_empty() {
            self.stderr.clone()
        } else {
            format!("{}\n{}", self.stdout, self.stderr)
        }
    }

    /// Turn an unsuccessful result into a [`ErrorCode::CommandFailed`] error
    pub fn into_result(self, command: &ShellCommand) -> Result<Self> {
        if self.success {
            return Ok(self);
        }
        let mut err = Error::command_failed(command, self.exit_code);
        let output = self.combined_output();
        if !output.trim().is_empty() {
            err = err.with_context(output.trim().to_string());
        }
        Err(err)
    }
}

/// A spawned child process that may still be running
pub trait ChildHandle: fmt::Debug {
    /// OS process id
    fn id(&self) -> u32;

    /// Kill the process and reap it
    fn kill(&mut self) -> Result<()>;

    /// Exit code if the process has finished
    fn try_wait(&mut self) -> Result<Option<i32>>;
}

/// Executes shell commands
///
/// Every external invocation goes through this trait so callers can be
/// exercised against a recording runner in tests.
pub trait CommandRunner {
    /// Run to completion, capturing output
    fn run(&self, command: &ShellCommand) -> Result<CommandResult>;

    /// Run to completion with inherited stdio, returning the exit code
    fn run_inherited(&self, command: &ShellCommand) -> Result<i32>;

    /// Start the command without waiting for it
    fn spawn(&self, command: &ShellCommand) -> Result<Box<dyn ChildHandle>>;
}

/// Runs commands through the platform shell
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellRunner;

impl CommandRunner for ShellRunner {
    fn run(&self, command: &ShellCommand) -> Result<CommandResult> {
        let output = command
            .to_command()
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| Error::process(format!("Failed to execute {command}: {e}")).with_source(e))?;

        Ok(CommandResult::from_output(output))
    }

    fn run_inherited(&self, command: &ShellCommand) -> Result<i32> {
        let status = command
            .to_command()
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|e| Error::process(format!("Failed to execute {command}: {e}")).with_source(e))?;

        Ok(status.code().unwrap_or(-1))
    }

    fn spawn(&self, command: &ShellCommand) -> Result<Box<dyn ChildHandle>> {
        let child = command
            .to_command()
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| Error::process(format!("Failed to spawn {command}: {e}")).with_source(e))?;

        Ok(Box::new(SpawnedChild::new(child)))
    }
}

/// A [`ChildHandle`] backed by `std::process::Child`
#[derive(Debug)]
pub struct SpawnedChild {
    child: Child,
}

impl SpawnedChild {
    /// Wrap a spawned child
    pub fn new(child: Child) -> Self {
        Self { child }
    }

    /// Block until the child exits, returning its exit code
    pub fn wait(&mut self) -> Result<i32> {
        let status = self.child.wait()?;
        Ok(status.code().unwrap_or(-1))
    }
}

impl ChildHandle for SpawnedChild {
    fn id(&self) -> u32 {
        self.child.id()
    }

    fn kill(&mut self) -> Result<()> {
        // Already exited: nothing to kill, just reap.
        if self.child.try_wait()?.is_some() {
            return Ok(());
        }
        self.child
            .kill()
            .map_err(|e| Error::new(ErrorCode::ProcessError, format!("Failed to kill process {}: {e}", self.child.id())))?;
        let _ = self.child.wait();
        Ok(())
    }

    fn try_wait(&mut self) -> Result<Option<i32>> {
        Ok(self.child.try_wait()?.map(|s| s.code().unwrap_or(-1)))
    }
}

/// Spawn a program with arguments and inherited stdio
pub fn spawn_program(
    program: &str,
    args: &[String],
    env: &[(String, String)],
    dir: &Path,
) -> Result<SpawnedChild> {
    let mut cmd = Command::new(program);
    cmd.args(args)
        .current_dir(dir)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());
    for (key, value) in env {
        cmd.env(key, value);
    }
    let child = cmd
        .spawn()
        .map_err(|e| Error::process(format!("Failed to execute {program}: {e}")).with_source(e))?;
    Ok(SpawnedChild::new(child))
}

/// Run a program directly (no shell) and capture output
pub fn run_command(program: &str, args: &[&str]) -> Result<CommandResult> {
    let output = Command::new(program)
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| Error::process(format!("Failed to execute {program}: {e}")))?;

    Ok(CommandResult::from_output(output))
}

/// Check if a command exists in PATH
pub fn command_exists(program: &str) -> bool {
    which::which(program).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_renders_env_prefix() {
        let cmd = ShellCommand::new("npm exec cap sync android")
            .env("NODE_ENV", "development")
            .env("VITE_DEV_URL", "http://10.0.2.2:3000");
        assert_eq!(
            cmd.to_string(),
            "NODE_ENV=development VITE_DEV_URL=http://10.0.2.2:3000 npm exec cap sync android"
        );
    }

    #[test]
    fn test_command_result_into_result() {
        let cmd = ShellCommand::new("false");
        assert!(CommandResult::ok().into_result(&cmd).is_ok());

        let err = CommandResult::failed(2, "boom").into_result(&cmd).unwrap_err();
        assert_eq!(err.code, ErrorCode::CommandFailed);
        assert_eq!(err.context.as_deref(), Some("boom"));
    }

    #[test]
    fn test_command_result_combined_output() {
        let result = CommandResult {
            success: true,
            exit_code: 0,
            stdout: "out".to_string(),
            stderr: "err".to_string(),
        };
        assert!(result.combined_output().contains("out"));
        assert!(result.combined_output().contains("err"));
    }

    #[cfg(unix)]
    #[test]
    fn test_shell_runner_runs_line_with_env() {
        let cmd = ShellCommand::new("echo $CAPBRIDGE_TEST_VALUE").env("CAPBRIDGE_TEST_VALUE", "hello");
        let result = ShellRunner.run(&cmd).unwrap();
        assert!(result.success);
        assert_eq!(result.stdout.trim(), "hello");
    }

    #[cfg(unix)]
    #[test]
    fn test_shell_runner_reports_exit_code() {
        let code = ShellRunner.run_inherited(&ShellCommand::new("exit 3")).unwrap();
        assert_eq!(code, 3);
    }

    #[cfg(unix)]
    #[test]
    fn test_spawned_child_kill() {
        let mut child = ShellRunner.spawn(&ShellCommand::new("sleep 30")).unwrap();
        assert!(child.try_wait().unwrap().is_none());
        child.kill().unwrap();
        assert!(child.try_wait().unwrap().is_some());
    }

    #[test]
    fn test_command_exists_nonexistent() {
        assert!(!command_exists("nonexistent_command_12345"));
    }
}
