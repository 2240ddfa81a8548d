//! Integration tests for the quality gate
//!
//! These drive the public library API against real git repositories in
//! temporary directories.

pub mod config_files;
pub mod gate_flow;
pub mod helpers;
