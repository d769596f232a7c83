//! skinned-rs library
//!
//! Command definitions and output helpers behind the `skinned-rs` binary.

pub mod cli;
pub mod commands;
pub mod utils;
