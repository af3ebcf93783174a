//! Gradle property sync
//!
//! Rewrites recognized `key = value` lines in `variables.gradle` and
//! `key=value` lines in `local.properties` from environment variables. Lines
//! that are not recognized are written back byte-for-byte, in order.

use capbridge_core::env::{keys, EnvSnapshot};
use capbridge_core::error::{Result, ResultExt};
use capbridge_core::fs::read_or_create;
use std::path::Path;

/// Gradle variables file inside the native project
pub const VARIABLES_GRADLE: &str = "variables.gradle";

/// SDK location file inside the native project
pub const LOCAL_PROPERTIES: &str = "local.properties";

/// Key/value separator convention of a property file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// `key = value`
    Gradle,
    /// `key=value`
    Properties,
}

impl Dialect {
    /// Render a line in this dialect
    pub fn render(self, key: &str, value: &str) -> String {
        match self {
            Self::Gradle => format!("{key} = {value}"),
            Self::Properties => format!("{key}={value}"),
        }
    }
}

/// A recognized line prefix and the value written for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyRule {
    /// Line prefix that identifies the property
    pub key: String,
    /// Value written after the key
    pub value: String,
}

impl PropertyRule {
    /// Rule writing `value` for `key`
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// A set of rules applied to one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyPatch {
    /// How lines are written
    pub dialect: Dialect,
    /// Rules in append order
    pub rules: Vec<PropertyRule>,
    /// Append `key=value` when no line starts with the key
    pub append_missing: bool,
}

/// Patched text plus what changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchResult {
    /// Patched text
    pub contents: String,
    /// Lines rewritten in place
    pub replaced: usize,
    /// Lines added at the end
    pub appended: usize,
}

impl PropertyPatch {
    /// Apply the rules to file contents
    pub fn apply(&self, contents: &str) -> PatchResult {
        let mut replaced = 0;
        let mut out = contents
            .split('\n')
            .map(|line| match self.rules.iter().find(|r| line.starts_with(&r.key)) {
                Some(rule) => {
                    replaced += 1;
                    let cr = if line.ends_with('\r') { "\r" } else { "" };
                    format!("{}{cr}", self.dialect.render(&rule.key, &rule.value))
                }
                None => line.to_string(),
            })
            .collect::<Vec<_>>()
            .join("\n");

        let mut appended = 0;
        if self.append_missing {
            for rule in &self.rules {
                if out.split('\n').any(|line| line.starts_with(&rule.key)) {
                    continue;
                }
                if !out.is_empty() && !out.ends_with('\n') {
                    out.push('\n');
                }
                out.push_str(&self.dialect.render(&rule.key, &rule.value));
                appended += 1;
            }
        }

        PatchResult {
            contents: out,
            replaced,
            appended,
        }
    }
}

/// Outcome of patching one file on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchOutcome {
    /// Lines rewritten in place
    pub replaced: usize,
    /// Lines added at the end
    pub appended: usize,
    /// Whether the file on disk changed
    pub changed: bool,
}

/// Patch a file in place, creating it empty first if missing
pub fn patch_file(path: &Path, patch: &PropertyPatch) -> Result<PatchOutcome> {
    let original = read_or_create(path).context(format!("Reading {}", path.display()))?;
    let result = patch.apply(&original);
    let changed = result.contents != original;

    std::fs::write(path, &result.contents)?;
    tracing::debug!(
        path = %path.display(),
        replaced = result.replaced,
        appended = result.appended,
        "Patched property file"
    );

    Ok(PatchOutcome {
        replaced: result.replaced,
        appended: result.appended,
        changed,
    })
}

/// Compile and target SDK versions from `ANDROID_API`
pub fn variables_gradle_patch(env: &EnvSnapshot) -> Option<PropertyPatch> {
    let api = env.android_api()?;
    Some(PropertyPatch {
        dialect: Dialect::Gradle,
        rules: vec![
            PropertyRule::new("compileSdkVersion", api),
            PropertyRule::new("targetSdkVersion", api),
        ],
        append_missing: false,
    })
}

/// SDK location from `ANDROID_HOME`
pub fn local_properties_patch(env: &EnvSnapshot) -> Option<PropertyPatch> {
    let home = env.get(keys::ANDROID_HOME)?;
    Some(PropertyPatch {
        dialect: Dialect::Properties,
        rules: vec![PropertyRule::new("sdk.dir", home)],
        append_missing: true,
    })
}

/// What [`sync_gradle_with_env`] touched; `None` means the variable was unset
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// `variables.gradle`, patched from `ANDROID_API`
    pub variables_gradle: Option<PatchOutcome>,
    /// `local.properties`, patched from `ANDROID_HOME`
    pub local_properties: Option<PatchOutcome>,
}

/// Patch both property files of a native project from the environment
pub fn sync_gradle_with_env(project_dir: &Path, env: &EnvSnapshot) -> Result<SyncReport> {
    let mut report = SyncReport::default();

    if let Some(patch) = variables_gradle_patch(env) {
        report.variables_gradle = Some(patch_file(&project_dir.join(VARIABLES_GRADLE), &patch)?);
    }
    if let Some(patch) = local_properties_patch(env) {
        report.local_properties = Some(patch_file(&project_dir.join(LOCAL_PROPERTIES), &patch)?);
    }

    Ok(report)
}
