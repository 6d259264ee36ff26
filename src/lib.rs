// ABOUTME: Library root for ephemera - exposes public types for testing.
// ABOUTME: The main binary is in main.rs.

pub mod build;
pub mod cluster;
pub mod config;
pub mod deploy;
pub mod diagnostics;
pub mod error;
pub mod manifest;
pub mod namespace;
pub mod output;
pub mod ports;
pub mod preview;
pub mod probe;
pub mod process;
pub mod source;
pub mod state_files;
pub mod teardown;
pub mod types;
