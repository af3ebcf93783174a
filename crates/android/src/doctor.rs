//! Environment diagnosis
//!
//! Checks what a build needs: the native CLI's runtime, the SDK tools, the
//! SDK environment and the project files.

use crate::emulator;
use crate::orchestrator::Layout;
use capbridge_core::config::AndroidOptions;
use capbridge_core::env::{keys, EnvSnapshot};
use capbridge_core::error::Result;
use capbridge_core::process::command_exists;
use serde::Serialize;
use std::path::Path;

/// Outcome of one check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Check {
    /// Tool, variable or file checked
    pub name: String,
    /// Whether the check passed
    pub ok: bool,
    /// A failed required check fails the whole diagnosis
    pub required: bool,
    /// Value found, or why the check failed
    pub detail: String,
}

impl Check {
    fn new(name: &str, ok: bool, required: bool, detail: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            ok,
            required,
            detail: detail.into(),
        }
    }
}

/// All checks, in display order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DoctorReport {
    /// Individual results
    pub checks: Vec<Check>,
}

impl DoctorReport {
    /// Whether every required check passed
    pub fn healthy(&self) -> bool {
        self.checks.iter().all(|c| c.ok || !c.required)
    }
}

/// Access to the host's tools
pub trait Toolbox {
    /// Whether `program` is on the PATH
    fn has(&self, program: &str) -> bool;

    /// Names of the installed virtual devices
    fn avds(&self) -> Result<Vec<String>>;
}

/// The real PATH and `emulator -list-avds`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemToolbox;

impl Toolbox for SystemToolbox {
    fn has(&self, program: &str) -> bool {
        command_exists(program)
    }

    fn avds(&self) -> Result<Vec<String>> {
        emulator::list_avds()
    }
}

/// Run every check
pub fn diagnose(
    root: &Path,
    options: &AndroidOptions,
    env: &EnvSnapshot,
    tools: &dyn Toolbox,
) -> Result<DoctorReport> {
    let layout = Layout::resolve(root, options)?;
    let mut checks = Vec::new();

    for (program, required) in [("npm", true), ("adb", false), ("emulator", false)] {
        let ok = tools.has(program);
        checks.push(Check::new(
            program,
            ok,
            required,
            if ok { "installed" } else { "not found" },
        ));
    }

    for (var, required) in [(keys::ANDROID_HOME, false), (keys::ANDROID_API, false)] {
        let value = env.get(var);
        checks.push(Check::new(
            var,
            value.is_some(),
            required,
            value.unwrap_or("not set"),
        ));
    }

    let config_file = layout.native_config_file();
    checks.push(Check::new(
        "native config",
        config_file.is_some(),
        true,
        config_file.map_or_else(
            || "no capacitor.config.{ts,json,js} in the project root".to_string(),
            |p| p.display().to_string(),
        ),
    ));

    let project = layout.project_dir.is_dir();
    checks.push(Check::new(
        "android project",
        project,
        false,
        if project {
            layout.project_dir.display().to_string()
        } else {
            format!("{} (created on first run)", layout.project_dir.display())
        },
    ));

    if tools.has("emulator") {
        let target = options.target(env);
        let check = match tools.avds() {
            Ok(avds) if avds.contains(&target) => Check::new("emulator target", true, false, target),
            Ok(_) => Check::new("emulator target", false, false, format!("{target} is not an installed AVD")),
            Err(e) => Check::new("emulator target", false, false, format!("Could not list AVDs: {e}")),
        };
        checks.push(check);
    }

    Ok(DoctorReport { checks })
}
