//! Mandatory test execution
//!
//! Before a commit, the suite for the changed code is run and its counts are
//! recorded as evidence. Commands come from configuration or are inferred
//! from changed file paths.

mod detection;
mod parser;
mod result;
mod validator;


pub use detection::{command_program, detect_test_commands, select_test_commands};
pub use parser::{parse_test_output, TestCounts};
pub use result::TestExecutionResult;
pub use validator::{TestExecutionValidator, TestPhaseOutcome};
