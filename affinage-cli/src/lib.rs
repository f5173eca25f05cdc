//! Support library for the `affinage` binary.
//!
//! Exposes the command and logging modules so tests can drive the pipeline
//! without spawning a subprocess.

pub mod cli;
pub mod logging;
