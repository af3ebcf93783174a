//! Configuration schema definitions

use crate::env::EnvSnapshot;
use crate::error::{Error, ErrorCode, Result};
use serde::{Deserialize, Serialize};

/// Root configuration schema
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConfigSchema {
    /// `[android]` table
    #[serde(default)]
    pub android: AndroidOptions,

    /// Partial native wrapper config merged over the computed defaults
    #[serde(default)]
    pub capacitor: serde_json::Value,
}

impl ConfigSchema {
    /// Validate option values
    pub fn validate(&self) -> Result<()> {
        self.android.validate()
    }
}

/// Options for the Android bridge
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AndroidOptions {
    /// Disable the bridge entirely
    pub enable: bool,

    /// Native project directory; release artifacts are copied out of it
    pub android_project_dir: String,

    /// Where the web output for the native build and the release dir go
    pub android_build_dir: String,

    /// AVD name for auto-open; `Default_API_$ANDROID_API` when unset
    pub android_target: Option<String>,

    /// Extra flags for `cap run android` (`--no-sync --live-reload` are always passed)
    pub additional_capacitor_run_cli_args: String,

    /// Route the native app opens
    pub android_route: String,

    /// Extra pages kept in the native build (`/` is always kept)
    pub additional_routes: Vec<String>,

    /// Debug logging; follows `DEBUG` when unset
    pub debug: Option<bool>,

    /// Launch the emulator once the dev server is ready; follows `AUTO_OPEN` when unset
    pub auto_open: Option<bool>,

    /// Dev-server port the emulator connects back to
    pub dev_server_port: u16,

    /// The framework's own output dir, as set in its config
    pub web_output_dir: Option<String>,

    /// How to invoke the native wrapper CLI
    pub cap_command: String,

    /// Directory of runtime helpers registered for auto-import
    pub imports_dir: Option<String>,

    /// Where framework adjustments are written for the framework config to read
    pub manifest_path: String,

    /// Upper bound on waiting for the dev server before firing `ready`
    pub ready_timeout_secs: u64,
}

impl Default for AndroidOptions {
    fn default() -> Self {
        Self {
            enable: true,
            android_project_dir: "~~/app-android".to_string(),
            android_build_dir: "~~/.dist/android".to_string(),
            android_target: None,
            additional_capacitor_run_cli_args: String::new(),
            android_route: "/app".to_string(),
            additional_routes: Vec::new(),
            debug: None,
            auto_open: None,
            dev_server_port: 3000,
            web_output_dir: None,
            cap_command: "npm exec cap".to_string(),
            imports_dir: None,
            manifest_path: "~~/.capbridge/manifest.json".to_string(),
            ready_timeout_secs: 120,
        }
    }
}

impl AndroidOptions {
    /// AVD target name
    pub fn target(&self, env: &EnvSnapshot) -> String {
        self.android_target.clone().unwrap_or_else(|| {
            format!("Default_API_{}", env.android_api().unwrap_or("undefined"))
        })
    }

    /// Whether debug logging is on
    pub fn debug_enabled(&self, env: &EnvSnapshot) -> bool {
        self.debug.unwrap_or_else(|| env.debug_enabled())
    }

    /// Whether auto-open is on
    pub fn auto_open_enabled(&self, env: &EnvSnapshot) -> bool {
        self.auto_open.unwrap_or_else(|| env.auto_open_requested())
    }

    /// Pages kept in a mobile build: `/`, the android route, then extras
    pub fn kept_routes(&self) -> Vec<String> {
        let mut routes = vec!["/".to_string(), self.android_route.clone()];
        for route in &self.additional_routes {
            if !routes.contains(route) {
                routes.push(route.clone());
            }
        }
        routes
    }

    /// Validate option values
    pub fn validate(&self) -> Result<()> {
        for route in std::iter::once(&self.android_route).chain(&self.additional_routes) {
            if !route.starts_with('/') {
                return Err(Error::new(
                    ErrorCode::ConfigValidationError,
                    format!("Route '{route}' must start with '/'"),
                ));
            }
        }
        if self.cap_command.trim().is_empty() {
            return Err(Error::new(
                ErrorCode::InvalidConfigValue,
                "cap_command must not be empty",
            ));
        }
        Ok(())
    }
}
