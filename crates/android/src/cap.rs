//! Capacitor CLI commands
//!
//! Builds the shell commands for `cap add`, `cap sync`, `cap run` and
//! `cap build` against the Android platform.

use capbridge_core::env::keys;
use capbridge_core::process::ShellCommand;
use std::path::PathBuf;

/// Native platform every command targets
pub const PLATFORM: &str = "android";

/// Address of the host machine's loopback as seen from the Android emulator
pub const EMULATOR_HOST: &str = "10.0.2.2";

/// Flags always passed to `cap run`
pub const RUN_FLAGS: &str = "--no-sync --live-reload";

/// Command builder for the native wrapper CLI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapCli {
    base: String,
    root: PathBuf,
    dev_server_port: Option<u16>,
    node_env: Option<String>,
}

impl CapCli {
    /// `base` is how the CLI is invoked, e.g. `npm exec cap`
    pub fn new(base: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            base: base.into(),
            root: root.into(),
            dev_server_port: None,
            node_env: None,
        }
    }

    /// Run every command with `NODE_ENV` set to `value`
    #[must_use]
    pub fn with_node_env(mut self, value: impl Into<String>) -> Self {
        self.node_env = Some(value.into());
        self
    }

    /// Point every command at a local dev server
    ///
    /// Commands then run with `NODE_ENV=development` and `VITE_DEV_URL`
    /// set to the dev server as reachable from the emulator.
    #[must_use]
    pub fn with_dev_server(mut self, port: u16) -> Self {
        self.dev_server_port = Some(port);
        self.with_node_env("development")
    }

    /// Dev server URL handed to the native config, if any
    pub fn dev_server_url(&self) -> Option<String> {
        self.dev_server_port
            .map(|port| format!("http://{EMULATOR_HOST}:{port}"))
    }

    fn command(&self, args: &str) -> ShellCommand {
        let mut cmd = ShellCommand::new(format!("{} {args}", self.base)).current_dir(&self.root);
        if let Some(node_env) = &self.node_env {
            cmd = cmd.env(keys::NODE_ENV, node_env);
        }
        if let Some(url) = self.dev_server_url() {
            cmd = cmd.env(keys::VITE_DEV_URL, url);
        }
        cmd
    }

    /// Create the native project scaffold
    pub fn add_platform(&self) -> ShellCommand {
        self.command(&format!("add {PLATFORM}"))
    }

    /// Copy web assets and plugins into the native project
    pub fn sync(&self) -> ShellCommand {
        self.command(&format!("sync {PLATFORM}"))
    }

    /// Build, install and launch on `target` with live reload
    pub fn run(&self, target: &str, extra_args: &str) -> ShellCommand {
        let line = format!("run {PLATFORM} --verbose -- --target {target} {RUN_FLAGS} {extra_args}");
        self.command(line.trim_end())
    }

    /// Release build
    pub fn build(&self) -> ShellCommand {
        self.command(&format!("build {PLATFORM}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_production_commands_have_no_env() {
        let cap = CapCli::new("npm exec cap", "/app");
        let sync = cap.sync();
        assert_eq!(sync.to_string(), "npm exec cap sync android");
        assert!(sync.envs().is_empty());
        assert_eq!(sync.cwd(), Some(std::path::Path::new("/app")));
        assert_eq!(cap.add_platform().line(), "npm exec cap add android");
        assert_eq!(cap.build().line(), "npm exec cap build android");
    }

    #[test]
    fn test_dev_server_env() {
        let cap = CapCli::new("npm exec cap", "/app").with_dev_server(3000);
        assert_eq!(
            cap.sync().to_string(),
            "NODE_ENV=development VITE_DEV_URL=http://10.0.2.2:3000 npm exec cap sync android"
        );
    }

    #[test]
    fn test_node_env_without_dev_server() {
        let cap = CapCli::new("npm exec cap", "/app").with_node_env("production");
        assert_eq!(cap.build().to_string(), "NODE_ENV=production npm exec cap build android");
        assert_eq!(cap.dev_server_url(), None);
    }

    #[test]
    fn test_run_flags() {
        let cap = CapCli::new("npx cap", "/app");
        assert_eq!(
            cap.run("Default_API_34", "").line(),
            "npx cap run android --verbose -- --target Default_API_34 --no-sync --live-reload"
        );
        assert_eq!(
            cap.run("Pixel_7", "--forwardPorts 3000:3000").line(),
            "npx cap run android --verbose -- --target Pixel_7 --no-sync --live-reload --forwardPorts 3000:3000"
        );
    }
}
