//! Immutable environment snapshot
//!
//! The bridge reads its configuration from process environment variables. They
//! are captured once at startup into an [`EnvSnapshot`] and passed down
//! explicitly, so nothing below the binary calls `std::env::var` ad hoc.

use std::collections::BTreeMap;

/// Environment variable names shared by the patcher, the config builder and
/// the orchestrator.
pub mod keys {
    /// Runtime mode; `development` selects the dev-server config
    pub const NODE_ENV: &str = "NODE_ENV";
    /// Dev-server URL the native webview loads in development
    pub const VITE_DEV_URL: &str = "VITE_DEV_URL";
    /// Android SDK API level
    pub const ANDROID_API: &str = "ANDROID_API";
    /// Android SDK home
    pub const ANDROID_HOME: &str = "ANDROID_HOME";
    /// Native project directory used by `sync-gradle`
    pub const ANDROID_PROJECT_DIR: &str = "ANDROID_PROJECT_DIR";
    /// Keystore path
    pub const ANDROID_KS_PATH: &str = "ANDROID_KS_PATH";
    /// Keystore password value
    pub const ANDROID_KS_PASSWORD: &str = "ANDROID_KS_PASSWORD";
    /// File holding the keystore password
    pub const ANDROID_KS_PASSWORD_PATH: &str = "ANDROID_KS_PASSWORD_PATH";
    /// Keystore alias
    pub const ANDROID_KS_ALIAS: &str = "ANDROID_KS_ALIAS";
    /// File holding the keystore alias password
    pub const ANDROID_KS_ALIAS_PASSWORD_PATH: &str = "ANDROID_KS_ALIAS_PASSWORD_PATH";
    /// Debug scopes (`*` or a list containing `android`)
    pub const DEBUG: &str = "DEBUG";
    /// Auto-open scopes (a list containing `android`)
    pub const AUTO_OPEN: &str = "AUTO_OPEN";
    /// `true` requests a mobile release build
    pub const BUILD_ANDROID: &str = "BUILD_ANDROID";
}

/// Scope name used in `DEBUG` and `AUTO_OPEN`
pub const ANDROID_SCOPE: &str = "android";

/// An immutable mapping of environment variable names to values
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvSnapshot {
    vars: BTreeMap<String, String>,
}

impl EnvSnapshot {
    /// Capture the current process environment
    pub fn capture() -> Self {
        Self::from_pairs(std::env::vars())
    }

    /// Build a snapshot from explicit pairs
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Return a new snapshot with the given pairs layered on top
    #[must_use]
    pub fn with_overrides<I, K, V>(&self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut vars = self.vars.clone();
        vars.extend(pairs.into_iter().map(|(k, v)| (k.into(), v.into())));
        Self { vars }
    }

    /// Look up a variable
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Whether a variable is present (even if empty)
    pub fn is_set(&self, key: &str) -> bool {
        self.vars.contains_key(key)
    }

    /// `NODE_ENV == "development"`
    pub fn is_development(&self) -> bool {
        self.get(keys::NODE_ENV) == Some("development")
    }

    /// `BUILD_ANDROID == "true"`
    pub fn building_android(&self) -> bool {
        self.get(keys::BUILD_ANDROID) == Some("true")
    }

    /// `DEBUG` is `*` or mentions the android scope
    pub fn debug_enabled(&self) -> bool {
        self.get(keys::DEBUG)
            .is_some_and(|v| v == "*" || v.contains(ANDROID_SCOPE))
    }

    /// `AUTO_OPEN` mentions the android scope
    pub fn auto_open_requested(&self) -> bool {
        self.get(keys::AUTO_OPEN)
            .is_some_and(|v| v.contains(ANDROID_SCOPE))
    }

    /// The Android API level, if set
    pub fn android_api(&self) -> Option<&str> {
        self.get(keys::ANDROID_API)
    }
}
