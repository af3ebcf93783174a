//! Android bridge for capbridge
//!
//! This crate wires a web framework's build lifecycle to the Capacitor CLI:
//! - Gradle property sync from environment variables
//! - Native config construction with user overrides
//! - `cap` command construction
//! - Emulator run process tracking
//! - Framework adjustments for mobile builds
//! - The build orchestrator and the lifecycle driver around it
//! - Environment diagnosis

#![warn(missing_docs)]

pub mod cap;
pub mod doctor;
pub mod emulator;
pub mod host;
pub mod lifecycle;
pub mod native_config;
pub mod orchestrator;
pub mod properties;

#[cfg(test)]
pub(crate) mod testing;
