//! Test doubles for command execution

use capbridge_core::error::Result;
use capbridge_core::process::{ChildHandle, CommandResult, CommandRunner, ShellCommand};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Shared, ordered record of what happened
#[derive(Debug, Clone, Default)]
pub struct CallLog(Rc<RefCell<Vec<String>>>);

impl CallLog {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.borrow_mut().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.borrow().clone()
    }
}

#[derive(Debug)]
pub struct FakeChild {
    pid: u32,
    log: CallLog,
    killed: bool,
}

impl FakeChild {
    pub fn new(pid: u32, log: CallLog) -> Self {
        Self { pid, log, killed: false }
    }
}

impl ChildHandle for FakeChild {
    fn id(&self) -> u32 {
        self.pid
    }

    fn kill(&mut self) -> Result<()> {
        if !self.killed {
            self.killed = true;
            self.log.push(format!("kill {}", self.pid));
        }
        Ok(())
    }

    fn try_wait(&mut self) -> Result<Option<i32>> {
        Ok(self.killed.then_some(-1))
    }
}

type Effect = Box<dyn Fn(&ShellCommand)>;

/// Records every command; fails or runs side effects for matching lines
#[derive(Default)]
pub struct RecordingRunner {
    pub log: CallLog,
    failures: Vec<String>,
    effects: Vec<(String, Effect)>,
    next_pid: Cell<u32>,
}

impl RecordingRunner {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            ..Default::default()
        }
    }

    /// Commands whose line contains `needle` exit with code 1
    pub fn fail_on(mut self, needle: &str) -> Self {
        self.failures.push(needle.to_string());
        self
    }

    /// Run `effect` when a command whose line contains `needle` executes
    pub fn on(mut self, needle: &str, effect: impl Fn(&ShellCommand) + 'static) -> Self {
        self.effects.push((needle.to_string(), Box::new(effect)));
        self
    }

    fn execute(&self, kind: &str, command: &ShellCommand) -> bool {
        self.log.push(format!("{kind} {}", command.line()));
        for (needle, effect) in &self.effects {
            if command.line().contains(needle.as_str()) {
                effect(command);
            }
        }
        !self.failures.iter().any(|n| command.line().contains(n.as_str()))
    }
}

impl CommandRunner for RecordingRunner {
    fn run(&self, command: &ShellCommand) -> Result<CommandResult> {
        Ok(if self.execute("run", command) {
            CommandResult::ok()
        } else {
            CommandResult::failed(1, "simulated failure")
        })
    }

    fn run_inherited(&self, command: &ShellCommand) -> Result<i32> {
        Ok(if self.execute("inherit", command) { 0 } else { 1 })
    }

    fn spawn(&self, command: &ShellCommand) -> Result<Box<dyn ChildHandle>> {
        self.execute("spawn", command);
        let pid = self.next_pid.get() + 1;
        self.next_pid.set(pid);
        Ok(Box::new(FakeChild::new(pid, self.log.clone())))
    }
}
