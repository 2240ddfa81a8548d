//! Individual verification phases
//!
//! Each phase is usable on its own; [`crate::gates`] wires them together.

pub mod context;
pub mod criteria;
pub mod diff;
pub mod failure;
pub mod functional;
pub mod test_execution;
pub mod truth;
pub mod utils;

pub use context::CommandContext;
pub use criteria::{SuccessCriteriaVerifier, SuccessCriterion};
pub use diff::{DiffValidationResult, DiffValidator};
pub use failure::{FailureReport, FailureType, RetryContext, VerificationFailureHandler};
pub use functional::{FunctionalVerificationResult, FunctionalVerifier};
pub use test_execution::{TestExecutionResult, TestExecutionValidator};
pub use truth::{extract_claims, Claim, TruthEnforcer, TruthVerdict};
