//! Configuration file loading

use super::schema::ConfigSchema;
use crate::error::{Error, Result, ResultExt};
use std::path::{Path, PathBuf};

/// Configuration wrapper
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Parsed contents
    pub schema: ConfigSchema,
    /// File it was loaded from; `None` when defaults are used
    pub path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from an explicit path, or search the project root.
    ///
    /// An explicit path must exist; a missing searched file yields defaults.
    pub fn load(path: Option<&Path>, root: &Path) -> Result<Self> {
        let config_path = match path {
            Some(p) if !p.exists() => return Err(Error::config_not_found(p)),
            Some(p) => Some(p.to_path_buf()),
            None => find_config_file(root),
        };

        let schema = if let Some(ref p) = config_path {
            load_config_file(p)?
        } else {
            ConfigSchema::default()
        };
        schema
            .validate()
            .context(format!("Invalid options in {}", display_or_defaults(config_path.as_deref())))?;

        Ok(Self {
            schema,
            path: config_path,
        })
    }
}

fn display_or_defaults(path: Option<&Path>) -> String {
    path.map_or_else(|| "defaults".to_string(), |p| p.display().to_string())
}

/// Find configuration file in standard locations
fn find_config_file(root: &Path) -> Option<PathBuf> {
    let candidates = [
        "capbridge.toml",
        ".capbridge.toml",
        ".config/capbridge.toml",
    ];

    candidates
        .iter()
        .map(|candidate| root.join(candidate))
        .find(|p| p.exists())
}

/// Load and parse a TOML configuration file
fn load_config_file(path: &Path) -> Result<ConfigSchema> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::config(format!("Failed to read config file {}: {e}", path.display())).with_source(e))?;

    toml::from_str(&content)
        .map_err(|e| Error::from(e).with_context(format!("While parsing {}", path.display())))
}
