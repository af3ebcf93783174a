//! Configuration loading and schema definitions
//!
//! Project options live in `capbridge.toml` at the project root.

mod loader;
mod schema;

pub use loader::Config;
pub use schema::*;
