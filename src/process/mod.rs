//! Subprocess execution for gate checks
//!
//! Test runners and `command_succeeds` criteria are executed through the
//! system shell with a hard timeout. Output is drained concurrently with the
//! wait so a chatty child can never deadlock on a full pipe.

mod runner;

pub use runner::{
    run_shell_command, run_shell_command_with_timeout, CommandOutput, DEFAULT_COMMAND_TIMEOUT,
};
