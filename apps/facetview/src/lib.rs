//! # facetview
//!
//! Library half of the facetview binary: CLI definitions, command
//! implementations and configuration loading. Exposed so integration tests
//! can drive the commands without spawning a process.

pub mod cli;
pub mod config;

pub use config::{AppConfig, LogFormat};
