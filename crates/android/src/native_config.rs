//! Native wrapper configuration
//!
//! Builds the object the Capacitor CLI reads as its config: environment-derived
//! defaults (signing, server, directories) with a user-supplied partial config
//! merged over them. The user's values win on every key, recursively.
//!
//! The CLI reads this through `capbridge native-config`, so it is rebuilt
//! fresh on every native CLI invocation with that invocation's environment.

use capbridge_core::config::AndroidOptions;
use capbridge_core::env::{keys, EnvSnapshot};
use capbridge_core::error::{Error, Result, ResultExt};
use capbridge_core::paths::{relative_to, resolve_path, to_slash};
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Placeholder written in place of secrets when logging
const REDACTED: &str = "********";

/// Keys whose values are never logged
const SECRET_KEYS: &[&str] = &["keystorePassword", "keystoreAliasPassword"];

/// Directory layout the native config points at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeLayout {
    /// Project root; relative paths in the config are relative to it
    pub project_root: PathBuf,
    /// Build dir, relative to the root, slash-separated
    pub build_dir: String,
    /// Native project dir, relative to the root, slash-separated
    pub android_path: String,
}

impl Default for NativeLayout {
    fn default() -> Self {
        Self {
            project_root: PathBuf::from("."),
            build_dir: ".dist/android".to_string(),
            android_path: "app-android".to_string(),
        }
    }
}

impl NativeLayout {
    /// Derive the layout from project options
    pub fn from_options(root: &Path, options: &AndroidOptions) -> Result<Self> {
        let build_dir = resolve_path(root, &options.android_build_dir)?;
        let project_dir = resolve_path(root, &options.android_project_dir)?;
        Ok(Self {
            project_root: root.to_path_buf(),
            build_dir: to_slash(&relative_to(root, &build_dir)),
            android_path: to_slash(&relative_to(root, &project_dir)),
        })
    }

    /// Static web assets the native app bundles
    pub fn web_dir(&self) -> String {
        format!("{}/.output/public/", self.build_dir.trim_end_matches('/'))
    }
}

/// Resolved native config defaults
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NativeConfig {
    /// Absent when the webview loads a dev server
    #[serde(skip_serializing_if = "Option::is_none")]
    pub web_dir: Option<String>,
    /// Build dir the native CLI works from
    pub root_dir: String,
    /// Android platform settings
    pub android: AndroidSection,
    /// Webview server settings
    pub server: ServerSection,
}

/// Android platform settings
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AndroidSection {
    /// Native project dir
    pub path: String,
    /// Release signing
    pub build_options: BuildOptions,
}

/// Signing parameters for `cap build android`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildOptions {
    /// Always `apksigner`
    pub signing_type: String,
    /// Absolute keystore path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keystore_path: Option<String>,
    /// Keystore password
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keystore_password: Option<String>,
    /// Key alias password
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keystore_alias_password: Option<String>,
    /// Key alias
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keystore_alias: Option<String>,
    /// Always `APK`
    pub release_type: String,
}

/// How the webview reaches the app
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ServerSection {
    /// Live dev server over cleartext HTTP
    Development {
        /// Dev server URL as seen from the emulator
        url: String,
        /// Always true
        cleartext: bool,
    },
    /// Bundled assets served over a secure scheme
    Bundled {
        /// Scheme of the bundled origin
        #[serde(rename = "androidScheme")]
        android_scheme: String,
    },
}

/// Keystore secrets resolved from values or files
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    /// Keystore password
    pub keystore_password: Option<String>,
    /// Key alias password
    pub keystore_alias_password: Option<String>,
}

/// Builds the merged native config from an environment snapshot
#[derive(Debug, Clone)]
pub struct NativeConfigBuilder<'a> {
    env: &'a EnvSnapshot,
    layout: NativeLayout,
    debug: bool,
}

impl<'a> NativeConfigBuilder<'a> {
    /// Builder over `env` for the given layout
    pub fn new(env: &'a EnvSnapshot, layout: NativeLayout) -> Self {
        Self {
            env,
            layout,
            debug: false,
        }
    }

    /// Log the merged config once built
    #[must_use]
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Fail unless the runtime mode is known and complete
    pub fn check_preconditions(&self) -> Result<()> {
        let suggestion = "Run the native CLI through the project's scripts, set VITE_DEV_URL, or set NODE_ENV=production";
        match self.env.get(keys::NODE_ENV) {
            None => Err(Error::precondition("NODE_ENV is not set; it looks like the native CLI was called directly")
                .with_suggestion(suggestion)),
            Some("development") if !self.env.is_set(keys::VITE_DEV_URL) => Err(Error::precondition(
                "NODE_ENV=development requires VITE_DEV_URL to point at the dev server",
            )
            .with_suggestion(suggestion)),
            Some(_) => Ok(()),
        }
    }

    /// Resolve keystore secrets
    ///
    /// The alias password falls back to `ANDROID_KS_PASSWORD`, then to the
    /// resolved keystore password.
    pub fn credentials(&self) -> Result<Credentials> {
        let keystore_password = match self.env.get(keys::ANDROID_KS_PASSWORD_PATH) {
            Some(path) => Some(self.read_secret(keys::ANDROID_KS_PASSWORD_PATH, path)?),
            None => self.env.get(keys::ANDROID_KS_PASSWORD).map(String::from),
        };
        let keystore_alias_password = match self.env.get(keys::ANDROID_KS_ALIAS_PASSWORD_PATH) {
            Some(path) => Some(self.read_secret(keys::ANDROID_KS_ALIAS_PASSWORD_PATH, path)?),
            None => self.env.get(keys::ANDROID_KS_PASSWORD).map(String::from),
        }
        .or_else(|| keystore_password.clone());

        Ok(Credentials {
            keystore_password,
            keystore_alias_password,
        })
    }

    fn read_secret(&self, var: &str, raw: &str) -> Result<String> {
        let path = resolve_path(&self.layout.project_root, raw)?;
        std::fs::read_to_string(&path)
            .map_err(Error::from)
            .context(format!("Reading {var} ({})", path.display()))
    }

    /// Environment-derived defaults
    pub fn defaults(&self) -> Result<NativeConfig> {
        self.check_preconditions()?;
        let credentials = self.credentials()?;

        let keystore_path = self
            .env
            .get(keys::ANDROID_KS_PATH)
            .map(|p| resolve_path(&self.layout.project_root, p))
            .transpose()?
            .map(|p| p.display().to_string());

        let server = match (self.env.is_development(), self.env.get(keys::VITE_DEV_URL)) {
            (true, Some(url)) => ServerSection::Development {
                url: url.to_string(),
                cleartext: true,
            },
            _ => ServerSection::Bundled {
                android_scheme: "https".to_string(),
            },
        };

        Ok(NativeConfig {
            web_dir: if self.env.is_set(keys::VITE_DEV_URL) {
                None
            } else {
                Some(self.layout.web_dir())
            },
            root_dir: self.layout.build_dir.clone(),
            android: AndroidSection {
                path: self.layout.android_path.clone(),
                build_options: BuildOptions {
                    signing_type: "apksigner".to_string(),
                    keystore_path,
                    keystore_password: credentials.keystore_password,
                    keystore_alias_password: credentials.keystore_alias_password,
                    keystore_alias: self.env.get(keys::ANDROID_KS_ALIAS).map(String::from),
                    release_type: "APK".to_string(),
                },
            },
            server,
        })
    }

    /// Merge `overrides` over the defaults
    pub fn build(&self, overrides: &Value) -> Result<Value> {
        let defaults = serde_json::to_value(self.defaults()?)?;
        let merged = deep_merge(overrides, &defaults);

        if self.debug {
            tracing::info!(
                config = %serde_json::to_string_pretty(&redacted(&merged))?,
                "Resolved native config"
            );
        }
        Ok(merged)
    }
}

/// Recursively merge `overrides` over `defaults`
///
/// Objects merge key by key; any other override value replaces the default
/// whole. `null` in the override means unset and keeps the default.
pub fn deep_merge(overrides: &Value, defaults: &Value) -> Value {
    match (overrides, defaults) {
        (Value::Object(over), Value::Object(base)) => {
            let mut merged = base.clone();
            for (key, value) in over {
                if value.is_null() {
                    continue;
                }
                let next = match base.get(key) {
                    Some(default) => deep_merge(value, default),
                    None => value.clone(),
                };
                merged.insert(key.clone(), next);
            }
            Value::Object(merged)
        }
        (Value::Null, base) => base.clone(),
        (over, _) => over.clone(),
    }
}

/// Copy of `value` with keystore secrets masked
pub fn redacted(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| {
                    let v = if SECRET_KEYS.contains(&k.as_str()) && v.is_string() {
                        Value::String(REDACTED.to_string())
                    } else {
                        redacted(v)
                    };
                    (k.clone(), v)
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(redacted).collect()),
        other => other.clone(),
    }
}

/// Read a JSON override file
pub fn load_override_file(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path)
        .map_err(Error::from)
        .context(format!("Reading native config override {}", path.display()))?;
    serde_json::from_str(&content)
        .map_err(Error::from)
        .context(format!("Parsing {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use capbridge_core::error::ErrorCode;
    use serde_json::json;
    use tempfile::TempDir;

    fn production() -> EnvSnapshot {
        EnvSnapshot::from_pairs([
            ("NODE_ENV", "production"),
            ("ANDROID_KS_PATH", "/keys/release.jks"),
            ("ANDROID_KS_PASSWORD", "store-pass"),
            ("ANDROID_KS_ALIAS", "release"),
        ])
    }

    #[test]
    fn test_node_env_unset_is_precondition_error() {
        let env = EnvSnapshot::default();
        let err = NativeConfigBuilder::new(&env, NativeLayout::default())
            .build(&Value::Null)
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::PreconditionFailed);
    }

    #[test]
    fn test_development_without_dev_url_is_precondition_error() {
        let env = EnvSnapshot::from_pairs([("NODE_ENV", "development")]);
        let err = NativeConfigBuilder::new(&env, NativeLayout::default())
            .defaults()
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::PreconditionFailed);
        assert!(err.message.contains("VITE_DEV_URL"));
    }

    #[test]
    fn test_production_defaults() {
        let env = production();
        let config = NativeConfigBuilder::new(&env, NativeLayout::default())
            .build(&Value::Null)
            .unwrap();

        assert_eq!(config["webDir"], ".dist/android/.output/public/");
        assert_eq!(config["rootDir"], ".dist/android");
        assert_eq!(config["android"]["path"], "app-android");
        let opts = &config["android"]["buildOptions"];
        assert_eq!(opts["signingType"], "apksigner");
        assert_eq!(opts["keystorePath"], "/keys/release.jks");
        assert_eq!(opts["keystorePassword"], "store-pass");
        assert_eq!(opts["keystoreAliasPassword"], "store-pass");
        assert_eq!(opts["keystoreAlias"], "release");
        assert_eq!(opts["releaseType"], "APK");
        assert_eq!(config["server"], json!({ "androidScheme": "https" }));
    }

    #[test]
    fn test_development_server() {
        let env = EnvSnapshot::from_pairs([
            ("NODE_ENV", "development"),
            ("VITE_DEV_URL", "http://10.0.2.2:3000"),
        ]);
        let config = NativeConfigBuilder::new(&env, NativeLayout::default())
            .build(&Value::Null)
            .unwrap();

        assert!(config.get("webDir").is_none());
        assert_eq!(config["server"], json!({ "url": "http://10.0.2.2:3000", "cleartext": true }));
        assert!(config["android"]["buildOptions"].get("keystorePath").is_none());
    }

    #[test]
    fn test_password_file_beats_plain_value() {
        let temp = TempDir::new().unwrap();
        let secret = temp.path().join("ks-pass");
        std::fs::write(&secret, "from-file\n").unwrap();
        let env = production().with_overrides([("ANDROID_KS_PASSWORD_PATH", secret.display().to_string())]);

        let creds = NativeConfigBuilder::new(&env, NativeLayout::default())
            .credentials()
            .unwrap();

        assert_eq!(creds.keystore_password.as_deref(), Some("from-file\n"));
        // Alias password still follows ANDROID_KS_PASSWORD before the file value.
        assert_eq!(creds.keystore_alias_password.as_deref(), Some("store-pass"));
    }

    #[test]
    fn test_alias_password_falls_back_to_keystore_password() {
        let temp = TempDir::new().unwrap();
        let secret = temp.path().join("ks-pass");
        std::fs::write(&secret, "file-pass").unwrap();
        let env = EnvSnapshot::from_pairs([
            ("NODE_ENV", "production"),
            ("ANDROID_KS_PASSWORD_PATH", secret.display().to_string().as_str()),
        ]);

        let creds = NativeConfigBuilder::new(&env, NativeLayout::default())
            .credentials()
            .unwrap();
        assert_eq!(creds.keystore_alias_password.as_deref(), Some("file-pass"));
    }

    #[test]
    fn test_alias_password_file() {
        let temp = TempDir::new().unwrap();
        let secret = temp.path().join("alias-pass");
        std::fs::write(&secret, "alias-secret").unwrap();
        let env = production().with_overrides([("ANDROID_KS_ALIAS_PASSWORD_PATH", secret.display().to_string())]);

        let creds = NativeConfigBuilder::new(&env, NativeLayout::default())
            .credentials()
            .unwrap();
        assert_eq!(creds.keystore_alias_password.as_deref(), Some("alias-secret"));
    }

    #[test]
    fn test_missing_password_file_is_error() {
        let env = production().with_overrides([("ANDROID_KS_PASSWORD_PATH", "/definitely/not/here")]);
        let err = NativeConfigBuilder::new(&env, NativeLayout::default())
            .credentials()
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::FileNotFound);
        assert!(err.context.unwrap().contains("ANDROID_KS_PASSWORD_PATH"));
    }

    #[test]
    fn test_override_changes_only_named_key() {
        let env = production();
        let builder = NativeConfigBuilder::new(&env, NativeLayout::default());
        let defaults = serde_json::to_value(builder.defaults().unwrap()).unwrap();

        let merged = builder
            .build(&json!({ "android": { "buildOptions": { "keystoreAlias": "X" } } }))
            .unwrap();

        assert_eq!(merged["android"]["buildOptions"]["keystoreAlias"], "X");
        let mut expected = defaults.clone();
        expected["android"]["buildOptions"]["keystoreAlias"] = json!("X");
        assert_eq!(merged, expected);
    }

    #[test]
    fn test_deep_merge_rules() {
        let defaults = json!({ "a": 1, "nested": { "b": 2, "c": [1, 2] }, "s": "x" });
        let overrides = json!({ "a": null, "nested": { "c": [9] }, "s": { "now": "object" }, "extra": true });

        let merged = deep_merge(&overrides, &defaults);
        assert_eq!(
            merged,
            json!({ "a": 1, "nested": { "b": 2, "c": [9] }, "s": { "now": "object" }, "extra": true })
        );
    }

    #[test]
    fn test_layout_from_options() {
        let options = AndroidOptions {
            android_build_dir: "~~/.dist/mobile".to_string(),
            ..Default::default()
        };
        let layout = NativeLayout::from_options(Path::new("/work/app"), &options).unwrap();
        assert_eq!(layout.build_dir, ".dist/mobile");
        assert_eq!(layout.android_path, "app-android");
        assert_eq!(layout.web_dir(), ".dist/mobile/.output/public/");
    }

    #[test]
    fn test_redacted_masks_secrets() {
        let value = json!({ "android": { "buildOptions": { "keystorePassword": "p", "keystoreAlias": "a" } } });
        let masked = redacted(&value);
        assert_eq!(masked["android"]["buildOptions"]["keystorePassword"], REDACTED);
        assert_eq!(masked["android"]["buildOptions"]["keystoreAlias"], "a");
    }
}
