//! Diff validation
//!
//! Bounds a changeset before it is committed: only expected files, not too
//! many lines, and nothing matching a disallowed pattern in added code.

mod parse;
mod types;
mod validator;


pub use parse::{added_lines, parse_diff_stat, AddedLine, DiffStat};
pub use types::{DiffValidationResult, PatternViolation};
pub use validator::DiffValidator;
