//! Pre-commit quality gate for agent-produced changesets.
//!
//! The [`gates::QualityGatesCoordinator`] runs mandatory tests, success
//! criteria, functional checks, diff validation and claim enforcement over
//! a working tree, records what it observed as evidence, and decides
//! whether the change may be committed.

pub mod commands;
pub mod config;
pub mod evidence;
pub mod fs;
pub mod gates;
pub mod logging;
pub mod models;
pub mod process;
pub mod vcs;
pub mod verify;
