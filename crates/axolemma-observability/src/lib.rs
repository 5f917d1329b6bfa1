// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # axolemma-observability
//!
//! Logging infrastructure shared by the axolemma crates and tools.
//!
//! Provides consistent `tracing` initialisation with per-crate debug flag
//! support.
//!
//! ## Features
//! - `file-logging`: per-run log directories with daily rotation

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cli;
pub mod config;
pub mod init;

// Re-export commonly used items
pub use cli::*;
pub use config::*;
pub use init::*;

/// Known axolemma crate names for debug flags
pub const KNOWN_CRATES: &[&str] = &[
    "axolemma",
    "axolemma-membrane",
    "axolemma-engine",
    "axolemma-config",
    "axolemma-observability",
];

/// `tracing` target for a crate name (`axolemma-engine` -> `axolemma_engine`).
pub fn crate_target(crate_name: &str) -> String {
    crate_name.replace('-', "_")
}
