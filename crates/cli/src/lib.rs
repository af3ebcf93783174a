//! Terminal output helpers for capbridge
//!
//! - Status lines (success, warning, error, info, checks, headers)
//! - Duration, size and count formatting

#![warn(missing_docs)]

pub mod output;
