//! Framework lifecycle driver
//!
//! Runs the web framework command as a child process and fires the
//! orchestrator's hooks around it: `initialize` before it starts, `ready` once
//! it is serving (or immediately when there is nothing to wait for), and
//! `close` after it exits.
//!
//! A [`StopSignal`] interrupts the run: the framework is killed and the
//! orchestrator is closed without a release build.

use crate::host::{ManifestHost, MANIFEST_ENV, FrameworkHost};
use crate::orchestrator::{BuildMode, CloseOutcome, Orchestrator, ReadyOutcome};
use capbridge_core::error::{exit_codes, Error, ErrorCode, Result};
use capbridge_core::process::{spawn_program, ChildHandle, CommandRunner, SpawnedChild};
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

const PROBE_INTERVAL: Duration = Duration::from_millis(250);
const CONNECT_TIMEOUT: Duration = Duration::from_millis(500);
const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Shared flag asking a framework run to stop
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    /// Ask the run to stop
    pub fn trigger(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether a stop was requested
    pub fn is_triggered(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// How waiting for the dev server ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// The port accepted a connection
    Listening,
    /// The framework exited first
    Exited,
    /// Gave up waiting
    TimedOut,
    /// A stop was requested
    Stopped,
}

/// What happened over one framework run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameworkRun {
    /// The framework's exit code
    pub exit_code: i32,
    /// `None` when the framework exited before it was ready
    pub ready: Option<ReadyOutcome>,
    /// `None` when the framework failed and no close work was done
    pub close: Option<CloseOutcome>,
    /// The run was stopped through its [`StopSignal`]
    pub interrupted: bool,
}

/// Drive one framework run through the orchestrator's hooks
///
/// Errors are fatal orchestrator failures; a failing framework is reported
/// through [`FrameworkRun::exit_code`].
pub fn run_framework<R: CommandRunner>(
    orchestrator: &mut Orchestrator<R>,
    host: &mut ManifestHost,
    command: &[String],
    ready_timeout: Duration,
    stop: &StopSignal,
) -> Result<FrameworkRun> {
    let (program, args) = command.split_first().ok_or_else(|| {
        Error::new(ErrorCode::InvalidInput, "No framework command given")
            .with_suggestion("Pass the framework command after `--`, e.g. `capbridge run -- npx nuxi dev`")
    })?;

    orchestrator.initialize(host)?;

    let manifest_path = orchestrator.layout().manifest_path.clone();
    host.write(&manifest_path)?;
    tracing::debug!(path = %manifest_path.display(), "Wrote framework manifest");

    let env = [(MANIFEST_ENV.to_string(), manifest_path.display().to_string())];
    let mut child = spawn_program(program, args, &env, &orchestrator.layout().root)?;
    tracing::debug!(pid = child.id(), command = %command.join(" "), "Started framework");

    let readiness = if orchestrator.wants_ready() {
        wait_for_port(&mut child, host.dev_server_port(), ready_timeout, stop)?
    } else {
        Readiness::Listening
    };
    if readiness == Readiness::TimedOut {
        tracing::warn!(
            port = host.dev_server_port(),
            "Dev server did not accept connections in time; continuing anyway"
        );
    }

    let ready = matches!(readiness, Readiness::Listening | Readiness::TimedOut)
        .then(|| orchestrator.on_ready());

    let exit_code = wait_for_exit(&mut child, stop)?;
    if stop.is_triggered() {
        tracing::warn!("Interrupted; skipping the release build");
        let close = match orchestrator.mode() {
            BuildMode::LocalDev => Some(orchestrator.on_close()?),
            BuildMode::MobileRelease => {
                orchestrator.shutdown();
                None
            }
        };
        return Ok(FrameworkRun {
            exit_code: exit_codes::INTERRUPTED,
            ready,
            close,
            interrupted: true,
        });
    }

    if exit_code != 0 {
        tracing::error!(exit_code, "Framework exited with an error; skipping close steps");
        orchestrator.shutdown();
        return Ok(FrameworkRun {
            exit_code,
            ready,
            close: None,
            interrupted: false,
        });
    }

    let close = orchestrator.on_close()?;
    Ok(FrameworkRun {
        exit_code,
        ready,
        close: Some(close),
        interrupted: false,
    })
}

/// Wait for the framework to exit, killing it once a stop is requested
fn wait_for_exit(child: &mut SpawnedChild, stop: &StopSignal) -> Result<i32> {
    loop {
        if let Some(code) = child.try_wait()? {
            return Ok(code);
        }
        if stop.is_triggered() {
            tracing::debug!(pid = child.id(), "Stopping framework");
            child.kill()?;
            return Ok(exit_codes::INTERRUPTED);
        }
        std::thread::sleep(EXIT_POLL_INTERVAL);
    }
}

/// Wait until something listens on the local dev-server port
///
/// Tries both the IPv4 and the IPv6 loopback address.
pub fn wait_for_port(
    child: &mut SpawnedChild,
    port: u16,
    timeout: Duration,
    stop: &StopSignal,
) -> Result<Readiness> {
    let addrs = [
        SocketAddr::from((Ipv4Addr::LOCALHOST, port)),
        SocketAddr::from((Ipv6Addr::LOCALHOST, port)),
    ];
    let started = Instant::now();

    loop {
        if child.try_wait()?.is_some() {
            return Ok(Readiness::Exited);
        }
        if stop.is_triggered() {
            return Ok(Readiness::Stopped);
        }
        if addrs
            .iter()
            .any(|addr| TcpStream::connect_timeout(addr, CONNECT_TIMEOUT).is_ok())
        {
            return Ok(Readiness::Listening);
        }
        if started.elapsed() >= timeout {
            return Ok(Readiness::TimedOut);
        }
        std::thread::sleep(PROBE_INTERVAL);
    }
}
