//! Terminal output utilities
//!
//! Status lines go to stderr so commands that print machine-readable data
//! (`native-config`, `doctor --json`) keep stdout clean.

use owo_colors::{OwoColorize, Stream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

static QUIET: AtomicBool = AtomicBool::new(false);

/// Status message helpers
pub struct Status;

impl Status {
    /// Suppress success, info and header lines; warnings and errors still print
    pub fn set_quiet(quiet: bool) {
        QUIET.store(quiet, Ordering::Relaxed);
    }

    fn quiet() -> bool {
        QUIET.load(Ordering::Relaxed)
    }

    /// Print a success message
    pub fn success(message: &str) {
        if !Self::quiet() {
            eprintln!("{} {message}", "✓".if_supports_color(Stream::Stderr, |t| t.green()));
        }
    }

    /// Print an error message
    pub fn error(message: &str) {
        eprintln!("{} {message}", "✗".if_supports_color(Stream::Stderr, |t| t.red()));
    }

    /// Print a warning message
    pub fn warning(message: &str) {
        eprintln!("{} {message}", "⚠".if_supports_color(Stream::Stderr, |t| t.yellow()));
    }

    /// Print an info message
    pub fn info(message: &str) {
        if !Self::quiet() {
            eprintln!("{} {message}", "ℹ".if_supports_color(Stream::Stderr, |t| t.blue()));
        }
    }

    /// Print a check result: success when `ok`, otherwise a warning or an error
    pub fn check(ok: bool, required: bool, message: &str) {
        match (ok, required) {
            (true, _) => Self::success(message),
            (false, true) => Self::error(message),
            (false, false) => Self::warning(message),
        }
    }

    /// Print a header
    pub fn header(message: &str) {
        if !Self::quiet() {
            eprintln!();
            eprintln!("{}", message.if_supports_color(Stream::Stderr, |t| t.bold()));
            eprintln!("{}", "─".repeat(message.chars().count()));
        }
    }
}

/// Format a duration for display
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs_f32();
    if secs < 1.0 {
        format!("{:.0}ms", secs * 1000.0)
    } else if secs < 60.0 {
        format!("{secs:.1}s")
    } else {
        let mins = (secs / 60.0).floor();
        let remaining_secs = secs % 60.0;
        format!("{mins}m {remaining_secs:.0}s")
    }
}

/// Format a file size for display
#[allow(clippy::cast_precision_loss)]
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}

/// Format a count with singular/plural
pub fn format_count(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{count} {singular}")
    } else {
        format!("{count} {plural}")
    }
}
