//! capbridge CLI
//!
//! Runs a web framework command with the Android bridge attached, and exposes
//! the bridge's pieces (gradle sync, native config, environment checks) as
//! standalone subcommands.

use anyhow::{Context as _, Result};
use capbridge_android::doctor::{self, SystemToolbox};
use capbridge_android::host::ManifestHost;
use capbridge_android::lifecycle::{run_framework, FrameworkRun, StopSignal};
use capbridge_android::native_config::{deep_merge, load_override_file, NativeConfigBuilder, NativeLayout};
use capbridge_android::orchestrator::{CloseOutcome, Orchestrator, ReadyOutcome};
use capbridge_android::properties::{sync_gradle_with_env, PatchOutcome, LOCAL_PROPERTIES, VARIABLES_GRADLE};
use capbridge_cli::output::{format_count, format_duration, format_size, Status};
use capbridge_core::config::{AndroidOptions, Config};
use capbridge_core::env::{keys, EnvSnapshot};
use capbridge_core::error::{exit_codes, Error};
use capbridge_core::paths::resolve_path;
use capbridge_core::process::{spawn_program, ShellRunner};
use capbridge_telemetry::TelemetryConfig;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Parser)]
#[command(name = "capbridge")]
#[command(about = "Bridge a web framework build to the Capacitor Android toolchain")]
#[command(version)]
struct Cli {
    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Project root (defaults to the current directory)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Increase output verbosity
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a framework command with the Android bridge attached
    Run {
        /// Produce a signed release build when the framework finishes
        #[arg(long)]
        android_build: bool,

        /// Run the native CLI against the framework's dev server (NODE_ENV=development)
        #[arg(long)]
        dev: bool,

        /// Framework command, e.g. `npx nuxi dev`
        #[arg(last = true, required = true)]
        command: Vec<String>,
    },

    /// Write ANDROID_API and ANDROID_HOME into the native project's gradle files
    #[command(name = "sync-gradle")]
    SyncGradle {
        /// Native project directory
        #[arg(long)]
        project_dir: Option<PathBuf>,
    },

    /// Print the native wrapper config for the current environment
    #[command(name = "native-config")]
    NativeConfig {
        /// JSON file merged over the computed config
        #[arg(long = "override", value_name = "FILE")]
        override_file: Option<PathBuf>,

        /// Write to a file instead of stdout
        #[arg(long, value_name = "PATH")]
        write: Option<PathBuf>,

        /// Log the resolved config (secrets masked)
        #[arg(long)]
        debug: bool,
    },

    /// Diagnose environment
    Doctor {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Shared state for every subcommand
struct Context {
    root: PathBuf,
    config: Config,
    env: EnvSnapshot,
}

impl Context {
    fn options(&self) -> &AndroidOptions {
        &self.config.schema.android
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.no_color {
        owo_colors::set_override(false);
    }
    Status::set_quiet(cli.quiet);

    let root = match cli.root {
        Some(root) => root,
        None => std::env::current_dir().context("Reading the current directory")?,
    };

    let config = match Config::load(cli.config.as_deref(), &root) {
        Ok(config) => config,
        Err(e) => {
            report_error(&e);
            std::process::exit(exit_codes::CONFIG_ERROR);
        }
    };

    let env = EnvSnapshot::capture();
    let debug = config.schema.android.debug_enabled(&env);
    let mut telemetry = TelemetryConfig::for_verbosity(cli.verbose, cli.quiet, debug);
    telemetry.ansi = !cli.no_color;
    capbridge_telemetry::init_with_config(telemetry)?;
    if let Some(path) = &config.path {
        tracing::debug!(path = %path.display(), "Loaded config");
    }

    let ctx = Context { root, config, env };

    let exit_code = match cli.command {
        Commands::Run {
            android_build,
            dev,
            command,
        } => run(&ctx, android_build, dev, &command),
        Commands::SyncGradle { project_dir } => run_sync_gradle(&ctx, project_dir.as_deref()),
        Commands::NativeConfig {
            override_file,
            write,
            debug,
        } => run_native_config(&ctx, override_file.as_deref(), write.as_deref(), debug),
        Commands::Doctor { json } => run_doctor(&ctx, json),
    };

    std::process::exit(exit_code);
}

fn report_error(err: &Error) {
    tracing::debug!(report = ?err.to_report(), "Fatal error");
    Status::error(&err.to_string());
}

fn run(ctx: &Context, android_build: bool, dev: bool, command: &[String]) -> i32 {
    let options = ctx.options().clone();
    if !options.enable {
        tracing::debug!("Android bridge disabled; running the framework command as is");
        return passthrough(&ctx.root, command);
    }

    let mut overrides = Vec::new();
    if android_build {
        overrides.push((keys::BUILD_ANDROID, "true"));
    }
    if dev {
        overrides.push((keys::NODE_ENV, "development"));
    }
    let env = ctx.env.with_overrides(overrides);
    let ready_timeout = Duration::from_secs(options.ready_timeout_secs);
    let mut host = ManifestHost::new(options.dev_server_port, options.web_output_dir.clone());

    let stop = StopSignal::default();
    let handler_stop = stop.clone();
    if let Err(e) = ctrlc::set_handler(move || handler_stop.trigger()) {
        tracing::warn!(error = %e, "Could not install the Ctrl-C handler");
    }

    let result = Orchestrator::new(env, options, &ctx.root, ShellRunner).and_then(|mut orchestrator| {
        run_framework(&mut orchestrator, &mut host, command, ready_timeout, &stop)
    });

    match result {
        Ok(run) => {
            report_run(&run);
            run.exit_code
        }
        Err(e) => {
            report_error(&e);
            exit_codes::FAILURE
        }
    }
}

fn passthrough(root: &Path, command: &[String]) -> i32 {
    let Some((program, args)) = command.split_first() else {
        Status::error("No framework command given");
        return exit_codes::VALIDATION_ERROR;
    };
    match spawn_program(program, args, &[], root).and_then(|mut child| child.wait()) {
        Ok(code) => code,
        Err(e) => {
            report_error(&e);
            exit_codes::FAILURE
        }
    }
}

fn report_run(run: &FrameworkRun) {
    if run.interrupted {
        Status::warning("Run interrupted");
    }
    if let Some(ReadyOutcome::Launched { pid }) = run.ready {
        tracing::debug!(pid, "Emulator run was started during this session");
    }
    match &run.close {
        Some(CloseOutcome::Released {
            destination,
            artifacts,
            build_time,
        }) => Status::success(&format!(
            "Android release built in {}: {} ({}) copied to {}",
            format_duration(*build_time),
            format_count(artifacts.files, "file", "files"),
            format_size(artifacts.bytes),
            destination.display()
        )),
        Some(CloseOutcome::Stopped { stopped_run: true }) => Status::info("Stopped the emulator run process"),
        Some(_) => {}
        None if run.interrupted => {}
        None => Status::error(&format!("Framework exited with code {}", run.exit_code)),
    }
}

fn run_sync_gradle(ctx: &Context, project_dir: Option<&Path>) -> i32 {
    let dir = match project_dir {
        Some(dir) => Ok(ctx.root.join(dir)),
        None => {
            let raw = ctx
                .env
                .get(keys::ANDROID_PROJECT_DIR)
                .unwrap_or(&ctx.options().android_project_dir);
            resolve_path(&ctx.root, raw)
        }
    };

    let report = dir.and_then(|dir| {
        if dir.is_dir() {
            sync_gradle_with_env(&dir, &ctx.env)
        } else {
            Err(Error::new(
                capbridge_core::ErrorCode::DirectoryNotFound,
                format!("Android project not found: {}", dir.display()),
            )
            .with_suggestion("Pass --project-dir or set ANDROID_PROJECT_DIR"))
        }
    });

    match report {
        Ok(report) => {
            report_patch(VARIABLES_GRADLE, keys::ANDROID_API, report.variables_gradle);
            report_patch(LOCAL_PROPERTIES, keys::ANDROID_HOME, report.local_properties);
            exit_codes::SUCCESS
        }
        Err(e) => {
            report_error(&e);
            exit_codes::FAILURE
        }
    }
}

fn report_patch(file: &str, var: &str, outcome: Option<PatchOutcome>) {
    match outcome {
        None => Status::info(&format!("{var} not set, {file} left alone")),
        Some(o) if !o.changed => Status::success(&format!("{file} already up to date")),
        Some(o) => Status::success(&format!(
            "{file}: {} replaced, {} appended",
            format_count(o.replaced, "line", "lines"),
            format_count(o.appended, "line", "lines")
        )),
    }
}

fn run_native_config(ctx: &Context, override_file: Option<&Path>, write: Option<&Path>, debug: bool) -> i32 {
    let result = NativeLayout::from_options(&ctx.root, ctx.options()).and_then(|layout| {
        let mut overrides = ctx.config.schema.capacitor.clone();
        if let Some(path) = override_file {
            overrides = deep_merge(&load_override_file(path)?, &overrides);
        }
        let debug = debug || ctx.options().debug_enabled(&ctx.env);
        let config = NativeConfigBuilder::new(&ctx.env, layout)
            .debug(debug)
            .build(&overrides)?;
        Ok(serde_json::to_string_pretty(&config)?)
    });

    let json = match result {
        Ok(json) => json,
        Err(e) => {
            report_error(&e);
            return exit_codes::FAILURE;
        }
    };

    match write {
        None => {
            println!("{json}");
            exit_codes::SUCCESS
        }
        Some(path) => match std::fs::write(path, json) {
            Ok(()) => {
                Status::success(&format!("Native config written to {}", path.display()));
                exit_codes::SUCCESS
            }
            Err(e) => {
                report_error(&Error::from(e).with_context(format!("Writing {}", path.display())));
                exit_codes::FAILURE
            }
        },
    }
}

fn run_doctor(ctx: &Context, json: bool) -> i32 {
    let report = match doctor::diagnose(&ctx.root, ctx.options(), &ctx.env, &SystemToolbox) {
        Ok(report) => report,
        Err(e) => {
            report_error(&e);
            return exit_codes::FAILURE;
        }
    };

    if json {
        match serde_json::to_string_pretty(&report) {
            Ok(out) => println!("{out}"),
            Err(e) => {
                report_error(&Error::from(e));
                return exit_codes::FAILURE;
            }
        }
    } else {
        Status::header("Environment Check");
        for check in &report.checks {
            Status::check(check.ok, check.required, &format!("{}: {}", check.name, check.detail));
        }
    }

    if report.healthy() {
        exit_codes::SUCCESS
    } else {
        exit_codes::FAILURE
    }
}
