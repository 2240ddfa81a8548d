//! `qgate` subcommand implementations

pub mod claims;
pub mod validate;
