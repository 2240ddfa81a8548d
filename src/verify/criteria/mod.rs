//! Success criteria verification
//!
//! A task may declare criteria such as "this file exists" or "this string
//! appears in that file". Each definition is dispatched on its `type` to a
//! check that reads the working tree and records expected vs. actual.
//! Unknown types fail closed.

mod types;
mod verifier;

#[cfg(test)]
mod tests;

pub use types::{CriterionCheck, SuccessCriterion};
pub use verifier::SuccessCriteriaVerifier;
