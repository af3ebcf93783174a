//! Web framework integration
//!
//! The orchestrator adjusts the framework through [`FrameworkHost`]. The
//! shipped implementation, [`ManifestHost`], records every adjustment in a
//! [`HostManifest`] that is written as JSON before the framework starts; the
//! framework config reads it from the path in [`MANIFEST_ENV`].

use capbridge_core::error::{Error, Result, ResultExt};
use capbridge_core::paths::to_slash;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Environment variable carrying the manifest path to the framework process
pub const MANIFEST_ENV: &str = "CAPBRIDGE_MANIFEST";

/// The framework's stock output directory
pub const DEFAULT_OUTPUT_DIR: &str = ".output";

/// Rendering rule for a route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteRule {
    /// Render on the server
    pub ssr: bool,
    /// Render at build time
    pub prerender: bool,
}

impl RouteRule {
    /// Client-only and prerendered
    pub fn spa() -> Self {
        Self {
            ssr: false,
            prerender: true,
        }
    }
}

/// Framework capabilities the orchestrator relies on
pub trait FrameworkHost {
    /// Port of the framework's dev server
    fn dev_server_port(&self) -> u16;

    /// The framework's configured output dir, if any
    fn output_dir(&self) -> Option<&str>;

    /// Send the framework's build output to `dir` (relative to the project root)
    fn reroute_output_to(&mut self, dir: &str);

    /// Drop every page except `routes`
    fn keep_pages(&mut self, routes: &[String]);

    /// Set a route rule; with `override_existing` an existing rule is replaced
    fn extend_route_rules(&mut self, route: &str, rule: RouteRule, override_existing: bool);

    /// Register a directory of auto-imported runtime helpers
    fn add_imports_dir(&mut self, dir: &Path);
}

/// Adjustments handed to the framework
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HostManifest {
    /// Build output directory, relative to the root
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<String>,
    /// Pages kept in the build; every other page is dropped
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub kept_pages: Vec<String>,
    /// Rendering rules by route
    pub route_rules: BTreeMap<String, RouteRule>,
    /// Extra auto-import directories
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub imports_dirs: Vec<String>,
}

/// [`FrameworkHost`] that records adjustments into a [`HostManifest`]
#[derive(Debug, Clone)]
pub struct ManifestHost {
    port: u16,
    output_dir: Option<String>,
    manifest: HostManifest,
}

impl ManifestHost {
    /// Host for a framework serving on `port` with the given output dir
    pub fn new(port: u16, output_dir: Option<String>) -> Self {
        Self {
            port,
            output_dir,
            manifest: HostManifest::default(),
        }
    }

    /// Adjustments recorded so far
    pub fn manifest(&self) -> &HostManifest {
        &self.manifest
    }

    /// Write the manifest as pretty JSON, creating parent directories
    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.manifest)?;
        std::fs::write(path, json)
            .map_err(Error::from)
            .context(format!("Writing framework manifest {}", path.display()))
    }
}

impl FrameworkHost for ManifestHost {
    fn dev_server_port(&self) -> u16 {
        self.port
    }

    fn output_dir(&self) -> Option<&str> {
        self.output_dir.as_deref()
    }

    fn reroute_output_to(&mut self, dir: &str) {
        self.manifest.output_dir = Some(dir.to_string());
    }

    fn keep_pages(&mut self, routes: &[String]) {
        self.manifest.kept_pages = routes.to_vec();
    }

    fn extend_route_rules(&mut self, route: &str, rule: RouteRule, override_existing: bool) {
        if override_existing {
            self.manifest.route_rules.insert(route.to_string(), rule);
        } else {
            self.manifest.route_rules.entry(route.to_string()).or_insert(rule);
        }
    }

    fn add_imports_dir(&mut self, dir: &Path) {
        let dir = to_slash(dir);
        if !self.manifest.imports_dirs.contains(&dir) {
            self.manifest.imports_dirs.push(dir);
        }
    }
}
