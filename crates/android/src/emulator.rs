//! Android Emulator management
//!
//! Tracks the `cap run` process that drives the emulator during development,
//! and lists the virtual devices the SDK knows about.

use capbridge_core::error::Result;
use capbridge_core::process::{run_command, ChildHandle};

/// The single tracked emulator run process
///
/// At most one child is owned at a time. Replacing it kills the previous one
/// first so repeated auto-open triggers never leave duplicate emulators.
#[derive(Debug, Default)]
pub struct RunHandle {
    child: Option<Box<dyn ChildHandle>>,
}

impl RunHandle {
    /// A handle tracking nothing
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a child is tracked
    pub fn is_tracked(&self) -> bool {
        self.child.is_some()
    }

    /// Process id of the tracked child
    pub fn pid(&self) -> Option<u32> {
        self.child.as_ref().map(|c| c.id())
    }

    /// Kill and drop the tracked child, if any
    ///
    /// Returns whether a child was tracked.
    pub fn terminate(&mut self) -> bool {
        let Some(mut child) = self.child.take() else {
            return false;
        };
        let pid = child.id();
        match child.kill() {
            Ok(()) => tracing::debug!(pid, "Stopped emulator run process"),
            Err(e) => tracing::warn!(pid, error = %e, "Failed to stop emulator run process"),
        }
        true
    }

    /// Track `child`, killing any previously tracked one first
    pub fn replace(&mut self, child: Box<dyn ChildHandle>) {
        self.terminate();
        tracing::debug!(pid = child.id(), "Tracking emulator run process");
        self.child = Some(child);
    }
}

impl Drop for RunHandle {
    fn drop(&mut self) {
        self.terminate();
    }
}

/// List available AVDs (Android Virtual Devices)
pub fn list_avds() -> Result<Vec<String>> {
    let result = run_command("emulator", &["-list-avds"])?;
    Ok(parse_avd_list(&result.stdout))
}

fn parse_avd_list(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with("INFO"))
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{CallLog, FakeChild};

    #[test]
    fn test_replace_kills_previous_first() {
        let log = CallLog::default();
        let mut handle = RunHandle::new();

        handle.replace(Box::new(FakeChild::new(1, log.clone())));
        handle.replace(Box::new(FakeChild::new(2, log.clone())));

        assert_eq!(log.entries(), vec!["kill 1"]);
        assert_eq!(handle.pid(), Some(2));
    }

    #[test]
    fn test_terminate() {
        let log = CallLog::default();
        let mut handle = RunHandle::new();
        assert!(!handle.terminate());

        handle.replace(Box::new(FakeChild::new(7, log.clone())));
        assert!(handle.terminate());
        assert!(!handle.is_tracked());
        assert_eq!(log.entries(), vec!["kill 7"]);
    }

    #[test]
    fn test_drop_kills_tracked_child() {
        let log = CallLog::default();
        {
            let mut handle = RunHandle::new();
            handle.replace(Box::new(FakeChild::new(3, log.clone())));
        }
        assert_eq!(log.entries(), vec!["kill 3"]);
    }

    #[test]
    fn test_parse_avd_list() {
        let out = "INFO    | Storing crashdata in: /tmp\nPixel_7_API_34\n\nDefault_API_34\n";
        assert_eq!(parse_avd_list(out), vec!["Pixel_7_API_34", "Default_API_34"]);
    }
}
