//! Build orchestration
//!
//! [`Orchestrator`] drives the native side of a web framework build through
//! the framework's lifecycle:
//!
//! ```text
//! Idle -> ScaffoldCheck -> (ScaffoldCreate) -> AwaitingReady
//!      -> MobileBuild | DevMode -> Closed
//! ```
//!
//! - `initialize` creates the native project when missing and adjusts the
//!   framework for mobile builds.
//! - `on_ready` syncs and launches the emulator during development.
//! - `on_close` produces the release build in mobile mode, or stops the
//!   emulator run process otherwise.
//!
//! Fatal failures are returned as errors; the caller exits non-zero.
//! Best-effort steps log and carry on.

use crate::cap::CapCli;
use crate::emulator::RunHandle;
use crate::host::{FrameworkHost, RouteRule, DEFAULT_OUTPUT_DIR};
use crate::properties::sync_gradle_with_env;
use capbridge_core::config::AndroidOptions;
use capbridge_core::env::{keys, EnvSnapshot};
use capbridge_core::error::{Error, ErrorCode, Result, ResultExt};
use capbridge_core::fs::{copy_dir_recursive, CopyStats};
use capbridge_core::paths::{relative_to, resolve_path, to_slash};
use capbridge_core::process::CommandRunner;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Native CLI config files, any of which enables the bridge
pub const CONFIG_FILES: &[&str] = &[
    "capacitor.config.ts",
    "capacitor.config.json",
    "capacitor.config.js",
];

/// Where Gradle leaves release APKs inside the native project
pub const RELEASE_OUTPUT: &str = "build/outputs/apk/release";

/// What this run produces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildMode {
    /// A signed native release package
    MobileRelease,
    /// A local development run
    LocalDev,
}

/// Lifecycle position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Not yet initialized
    Idle,
    /// Looking for the native project
    ScaffoldCheck,
    /// Running `cap add`
    ScaffoldCreate,
    /// Initialized, waiting for the framework's ready hook
    AwaitingReady,
    /// Ready fired for a release build
    MobileBuild,
    /// Ready fired for a development run
    DevMode,
    /// Close hook ran or the run was shut down
    Closed,
}

/// Resolved directories
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    /// Project root
    pub root: PathBuf,
    /// Native android project
    pub project_dir: PathBuf,
    /// Root of the android build output
    pub build_dir: PathBuf,
    /// Web output consumed by `cap sync` (`<build dir>/.output`)
    pub native_output_dir: PathBuf,
    /// Where Gradle leaves the release APKs
    pub release_source: PathBuf,
    /// Where release APKs are copied after a build
    pub release_dest: PathBuf,
    /// Framework manifest location
    pub manifest_path: PathBuf,
    /// Extra auto-import directory for the framework
    pub imports_dir: Option<PathBuf>,
}

impl Layout {
    /// Resolve option paths against the project root
    pub fn resolve(root: &Path, options: &AndroidOptions) -> Result<Self> {
        let project_dir = resolve_path(root, &options.android_project_dir)?;
        let build_dir = resolve_path(root, &options.android_build_dir)?;
        Ok(Self {
            root: root.to_path_buf(),
            native_output_dir: build_dir.join(".output"),
            release_source: project_dir.join(RELEASE_OUTPUT),
            release_dest: build_dir.join("release"),
            manifest_path: resolve_path(root, &options.manifest_path)?,
            imports_dir: options
                .imports_dir
                .as_deref()
                .map(|d| resolve_path(root, d))
                .transpose()?,
            project_dir,
            build_dir,
        })
    }

    /// First native config file present in the root
    pub fn native_config_file(&self) -> Option<PathBuf> {
        CONFIG_FILES
            .iter()
            .map(|name| self.root.join(name))
            .find(|p| p.is_file())
    }
}

/// Result of the `ready` hook
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyOutcome {
    /// Mobile builds never launch an emulator
    Skipped,
    /// Auto-open is off
    NotRequested,
    /// `cap sync` failed; nothing launched
    SyncFailed,
    /// `ANDROID_API` is unset; nothing launched
    MissingApiLevel,
    /// `cap run` could not be started
    LaunchFailed,
    /// `cap run` is running
    Launched {
        /// Process id of the run
        pid: u32,
    },
}

/// Result of the `close` hook
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseOutcome {
    /// Close already ran
    AlreadyClosed,
    /// Dev mode shut down
    Stopped {
        /// Whether a run process was killed
        stopped_run: bool,
    },
    /// Release artifacts copied to `destination`
    Released {
        /// Copy destination
        destination: PathBuf,
        /// What was copied
        artifacts: CopyStats,
        /// Time spent in `cap build`
        build_time: Duration,
    },
}

/// Native build orchestrator
pub struct Orchestrator<R: CommandRunner> {
    env: EnvSnapshot,
    options: AndroidOptions,
    layout: Layout,
    runner: R,
    cap: CapCli,
    has_native_config: bool,
    has_project: bool,
    mode: BuildMode,
    auto_open: bool,
    phase: Phase,
    run: RunHandle,
}

impl<R: CommandRunner> Orchestrator<R> {
    /// Resolve directories and decide the build mode
    pub fn new(env: EnvSnapshot, options: AndroidOptions, root: &Path, runner: R) -> Result<Self> {
        let layout = Layout::resolve(root, &options)?;
        let has_native_config = layout.native_config_file().is_some();
        let has_project = layout.project_dir.exists();
        let mode = if env.building_android() && has_native_config {
            BuildMode::MobileRelease
        } else {
            BuildMode::LocalDev
        };
        let auto_open = options.auto_open_enabled(&env);
        let mut cap = CapCli::new(options.cap_command.clone(), root);
        if mode == BuildMode::MobileRelease && !env.is_set(keys::NODE_ENV) {
            cap = cap.with_node_env("production");
        }

        tracing::debug!(
            ?mode,
            has_native_config,
            has_project,
            auto_open,
            project_dir = %layout.project_dir.display(),
            build_dir = %layout.build_dir.display(),
            "Resolved android layout"
        );

        Ok(Self {
            env,
            options,
            layout,
            runner,
            cap,
            has_native_config,
            has_project,
            mode,
            auto_open,
            phase: Phase::Idle,
            run: RunHandle::new(),
        })
    }

    /// Build mode decided at construction
    pub fn mode(&self) -> BuildMode {
        self.mode
    }

    /// Current lifecycle position
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Resolved directories
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Whether the native project exists
    pub fn has_project(&self) -> bool {
        self.has_project
    }

    /// The tracked emulator run process
    pub fn run_handle(&self) -> &RunHandle {
        &self.run
    }

    /// Whether the `ready` hook has any work to do
    pub fn wants_ready(&self) -> bool {
        self.mode == BuildMode::LocalDev && self.auto_open
    }

    /// Scaffold check, scaffold creation and framework adjustments
    pub fn initialize(&mut self, host: &mut dyn FrameworkHost) -> Result<()> {
        if self.phase != Phase::Idle {
            return Err(Error::new(ErrorCode::Internal, "Orchestrator already initialized"));
        }
        self.phase = Phase::ScaffoldCheck;

        if self.env.is_development() {
            self.cap = self.cap.clone().with_dev_server(host.dev_server_port());
        }
        if let Some(url) = self.cap.dev_server_url() {
            tracing::debug!(%url, "Native CLI targets dev server");
        }

        if !self.has_native_config {
            tracing::warn!(
                "No capacitor.config.ts found, please create one that loads `capbridge native-config` and add it to your project. Skipping android build."
            );
        }

        if !self.has_project && self.has_native_config {
            self.phase = Phase::ScaffoldCreate;
            self.create_scaffold()?;
        }

        match self.mode {
            BuildMode::MobileRelease => self.configure_mobile_routes(host),
            BuildMode::LocalDev => self.check_output_dir(host),
        }

        if let Some(dir) = &self.layout.imports_dir {
            host.add_imports_dir(&relative_to(&self.layout.root, dir));
        }

        self.phase = Phase::AwaitingReady;
        Ok(())
    }

    fn create_scaffold(&mut self) -> Result<()> {
        let cmd = self.cap.add_platform();
        tracing::debug!(command = %cmd, "Android project not found, creating");

        self.runner
            .run(&cmd)?
            .into_result(&cmd)
            .map_err(|e| {
                e.recode(ErrorCode::ScaffoldFailed)
                    .with_suggestion("Check that @capacitor/android is installed")
            })?;

        sync_gradle_with_env(&self.layout.project_dir, &self.env)
            .context("Syncing gradle properties into the new android project")?;

        self.has_project = true;
        Ok(())
    }

    /// Mobile builds render the entry route and `/` as prerendered SPA pages,
    /// since the native wrapper can only open the root.
    fn configure_mobile_routes(&self, host: &mut dyn FrameworkHost) {
        let output = to_slash(&relative_to(&self.layout.root, &self.layout.native_output_dir));
        host.reroute_output_to(&output);
        host.keep_pages(&self.options.kept_routes());
        host.extend_route_rules("/", RouteRule::spa(), true);
        host.extend_route_rules(&self.options.android_route, RouteRule::spa(), true);
    }

    fn check_output_dir(&self, host: &dyn FrameworkHost) {
        let output = host.output_dir();
        if output.is_none() || output == Some(DEFAULT_OUTPUT_DIR) {
            tracing::warn!(
                "Framework output dir is not set or set to the default; with the android bridge it should be set to \".dist/web/.output\" (server \".dist/web/.output/server\", public \".dist/web/.output/public\")"
            );
        }
    }

    /// The `ready` hook
    pub fn on_ready(&mut self) -> ReadyOutcome {
        match (self.phase, self.mode) {
            (Phase::AwaitingReady | Phase::MobileBuild, BuildMode::MobileRelease) => {
                self.phase = Phase::MobileBuild;
                return ReadyOutcome::Skipped;
            }
            (Phase::AwaitingReady | Phase::DevMode, BuildMode::LocalDev) => {
                self.phase = Phase::DevMode;
            }
            (phase, _) => {
                tracing::warn!(?phase, "Ignoring ready hook outside the ready window");
                return ReadyOutcome::Skipped;
            }
        }

        if !self.auto_open {
            return ReadyOutcome::NotRequested;
        }

        if let Err(e) = self.sync_native_project() {
            tracing::error!(error = %e, "Syncing android project failed");
            return ReadyOutcome::SyncFailed;
        }

        if self.env.android_api().is_none() {
            tracing::error!(
                "ANDROID_API is not set, please set it to the api version you want to use or autoOpen won't work."
            );
            return ReadyOutcome::MissingApiLevel;
        }

        self.launch()
    }

    /// Start `cap run`, stopping any previously tracked run first
    fn launch(&mut self) -> ReadyOutcome {
        let target = self.options.target(&self.env);
        let cmd = self
            .cap
            .run(&target, &self.options.additional_capacitor_run_cli_args);
        tracing::debug!(command = %cmd, "Opening Android emulator");

        self.run.terminate();
        match self.runner.spawn(&cmd) {
            Ok(child) => {
                let pid = child.id();
                self.run.replace(child);
                ReadyOutcome::Launched { pid }
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to start emulator run");
                ReadyOutcome::LaunchFailed
            }
        }
    }

    /// `cap sync android`, making sure the web output dir has the shape it expects
    fn sync_native_project(&self) -> Result<()> {
        if !self.layout.native_output_dir.exists() {
            std::fs::create_dir_all(self.layout.native_output_dir.join("public"))?;
        }

        let cmd = self.cap.sync();
        tracing::debug!(command = %cmd, "Syncing Android project");
        self.runner
            .run(&cmd)?
            .into_result(&cmd)
            .map_err(|e| e.recode(ErrorCode::NativeSyncFailed))?;
        Ok(())
    }

    /// The `close` hook
    pub fn on_close(&mut self) -> Result<CloseOutcome> {
        if self.phase == Phase::Closed {
            return Ok(CloseOutcome::AlreadyClosed);
        }
        self.phase = Phase::Closed;

        match self.mode {
            BuildMode::MobileRelease => self.build_release(),
            BuildMode::LocalDev => Ok(CloseOutcome::Stopped {
                stopped_run: self.run.terminate(),
            }),
        }
    }

    /// Close without building, used when the framework itself failed
    pub fn shutdown(&mut self) {
        self.phase = Phase::Closed;
        self.run.terminate();
    }

    fn build_release(&mut self) -> Result<CloseOutcome> {
        self.sync_native_project()
            .context("Syncing before the release build")?;

        let cmd = self.cap.build();
        tracing::debug!(command = %cmd, "Building Android project");
        let started = Instant::now();
        let code = self.runner.run_inherited(&cmd)?;
        if code != 0 {
            return Err(Error::command_failed(&cmd, code)
                .recode(ErrorCode::ReleaseBuildFailed)
                .with_context("Error building android."));
        }
        let build_time = started.elapsed();

        tracing::debug!(
            from = %self.layout.release_source.display(),
            to = %self.layout.release_dest.display(),
            "Copying android release"
        );
        let artifacts = copy_dir_recursive(&self.layout.release_source, &self.layout.release_dest)
            .map_err(|e| {
                e.recode(ErrorCode::CopyFailed).with_context(format!(
                    "Copying {} to {}",
                    self.layout.release_source.display(),
                    self.layout.release_dest.display()
                ))
            })?;

        Ok(CloseOutcome::Released {
            destination: self.layout.release_dest.clone(),
            artifacts,
            build_time,
        })
    }
}
