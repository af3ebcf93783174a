//! Core utilities for capbridge
//!
//! This crate provides the shared plumbing used by the Android bridge:
//!
//! - **Error handling**: Structured errors with codes, context, and recovery suggestions
//! - **Environment**: An immutable snapshot of the process environment
//! - **Process execution**: Shell command execution and spawned children
//! - **Filesystem**: Recursive copies and directory helpers
//! - **Configuration**: TOML-based project options with path resolution
//!
//! # Example
//!
//! ```rust,no_run
//! use capbridge_core::{config::Config, env::EnvSnapshot};
//! use std::path::Path;
//!
//! let env = EnvSnapshot::capture();
//! let config = Config::load(None, Path::new(".")).expect("invalid capbridge.toml");
//!
//! if config.schema.android.auto_open_enabled(&env) {
//!     println!("auto-open requested");
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod env;
pub mod error;
pub mod fs;
pub mod paths;
pub mod process;

pub use error::{Error, ErrorCode, Result, ResultExt};
