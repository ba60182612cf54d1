//! Command handlers for the `prism` binary.

pub mod assets;
pub mod config;
pub mod process;
