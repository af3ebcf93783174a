use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const BRIDGE_VARS: &[&str] = &[
    "NODE_ENV",
    "VITE_DEV_URL",
    "ANDROID_API",
    "ANDROID_HOME",
    "ANDROID_PROJECT_DIR",
    "ANDROID_KS_PATH",
    "ANDROID_KS_PASSWORD",
    "ANDROID_KS_PASSWORD_PATH",
    "ANDROID_KS_ALIAS",
    "ANDROID_KS_ALIAS_PASSWORD_PATH",
    "DEBUG",
    "AUTO_OPEN",
    "BUILD_ANDROID",
    "RUST_LOG",
];

fn capbridge(root: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("capbridge").unwrap();
    for var in BRIDGE_VARS {
        cmd.env_remove(var);
    }
    cmd.arg("--root").arg(root.path()).arg("--no-color");
    cmd
}

#[test]
fn test_help_lists_subcommands() {
    Command::cargo_bin("capbridge")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("sync-gradle"))
        .stdout(predicate::str::contains("native-config"))
        .stdout(predicate::str::contains("doctor"));
}

#[test]
fn test_native_config_requires_node_env() {
    let root = TempDir::new().unwrap();

    capbridge(&root)
        .arg("native-config")
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("NODE_ENV is not set"));
}

#[test]
fn test_native_config_development_requires_dev_url() {
    let root = TempDir::new().unwrap();

    capbridge(&root)
        .env("NODE_ENV", "development")
        .arg("native-config")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("VITE_DEV_URL"));
}

#[test]
fn test_native_config_production_defaults() {
    let root = TempDir::new().unwrap();

    let output = capbridge(&root)
        .env("NODE_ENV", "production")
        .env("ANDROID_KS_ALIAS", "release")
        .arg("native-config")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let config: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(config["webDir"], ".dist/android/.output/public/");
    assert_eq!(config["rootDir"], ".dist/android");
    assert_eq!(config["android"]["path"], "app-android");
    assert_eq!(config["android"]["buildOptions"]["keystoreAlias"], "release");
    assert_eq!(config["android"]["buildOptions"]["releaseType"], "APK");
    assert_eq!(config["server"]["androidScheme"], "https");
}

#[test]
fn test_native_config_layers_overrides() {
    let root = TempDir::new().unwrap();
    std::fs::write(
        root.path().join("capbridge.toml"),
        "[capacitor]\nappId = \"org.example.app\"\nappName = \"Example\"\n",
    )
    .unwrap();
    let override_file = root.path().join("override.json");
    std::fs::write(
        &override_file,
        r#"{ "appName": "Override", "android": { "buildOptions": { "keystoreAlias": "X" } } }"#,
    )
    .unwrap();
    let out = root.path().join("capacitor.json");

    capbridge(&root)
        .env("NODE_ENV", "production")
        .arg("native-config")
        .arg("--override")
        .arg(&override_file)
        .arg("--write")
        .arg(&out)
        .assert()
        .success();

    let config: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(out).unwrap()).unwrap();
    assert_eq!(config["appId"], "org.example.app");
    assert_eq!(config["appName"], "Override");
    assert_eq!(config["android"]["buildOptions"]["keystoreAlias"], "X");
    assert_eq!(config["android"]["buildOptions"]["signingType"], "apksigner");
}

#[test]
fn test_sync_gradle_patches_project() {
    let root = TempDir::new().unwrap();
    let project = root.path().join("app-android");
    std::fs::create_dir_all(&project).unwrap();
    std::fs::write(
        project.join("variables.gradle"),
        "ext {\ncompileSdkVersion = 33\ntargetSdkVersion = 33\n}\n",
    )
    .unwrap();

    capbridge(&root)
        .env("ANDROID_API", "34")
        .env("ANDROID_HOME", "/opt/android-sdk")
        .arg("sync-gradle")
        .assert()
        .success();

    assert_eq!(
        std::fs::read_to_string(project.join("variables.gradle")).unwrap(),
        "ext {\ncompileSdkVersion = 34\ntargetSdkVersion = 34\n}\n"
    );
    assert_eq!(
        std::fs::read_to_string(project.join("local.properties")).unwrap(),
        "sdk.dir=/opt/android-sdk"
    );
}

#[test]
fn test_sync_gradle_uses_project_dir_env() {
    let root = TempDir::new().unwrap();
    std::fs::create_dir_all(root.path().join("native")).unwrap();

    capbridge(&root)
        .env("ANDROID_PROJECT_DIR", "native")
        .env("ANDROID_HOME", "/sdk")
        .arg("sync-gradle")
        .assert()
        .success();

    assert!(root.path().join("native/local.properties").is_file());
}

#[test]
fn test_sync_gradle_missing_project_fails() {
    let root = TempDir::new().unwrap();

    capbridge(&root)
        .env("ANDROID_API", "34")
        .arg("sync-gradle")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Android project not found"));
}

#[test]
fn test_invalid_config_exits_with_config_error() {
    let root = TempDir::new().unwrap();
    std::fs::write(root.path().join("capbridge.toml"), "[android]\nandroid_route = \"app\"\n").unwrap();

    capbridge(&root).arg("doctor").assert().code(3);
}

#[cfg(unix)]
#[test]
fn test_run_disabled_passes_exit_code_through() {
    let root = TempDir::new().unwrap();
    std::fs::write(root.path().join("capbridge.toml"), "[android]\nenable = false\n").unwrap();

    capbridge(&root)
        .args(["run", "--", "sh", "-c", "exit 4"])
        .assert()
        .code(4);

    assert!(!root.path().join(".capbridge").exists());
}

#[cfg(unix)]
#[test]
fn test_run_without_native_config_writes_manifest() {
    let root = TempDir::new().unwrap();

    capbridge(&root)
        .args(["run", "--", "sh", "-c", "test -f \"$CAPBRIDGE_MANIFEST\""])
        .assert()
        .success();

    assert!(root.path().join(".capbridge/manifest.json").is_file());
    assert!(!root.path().join("app-android").exists());
}

#[cfg(unix)]
#[test]
fn test_run_reports_framework_failure() {
    let root = TempDir::new().unwrap();

    capbridge(&root)
        .args(["run", "--android-build", "--", "sh", "-c", "exit 2"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Framework exited with code 2"));
}

#[test]
fn test_run_help_lists_dev_flag() {
    Command::cargo_bin("capbridge")
        .unwrap()
        .args(["run", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--dev"))
        .stdout(predicate::str::contains("--android-build"));
}
