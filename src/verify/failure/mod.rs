//! Verification failure handling
//!
//! Per failure type: retry while `retry_count < max_retries`, then escalate
//! by writing a report or flagging the task for manual review. Success
//! criteria have no retry budget.

mod handler;
mod report;


pub use handler::{RetryContext, VerificationFailureHandler};
pub use report::{report_paths, write_report, FailureReport, FailureType, ReportEvidence};
