//! Quality gate coordination
//!
//! [`QualityGatesCoordinator`] is the entry point: one call per completed
//! task, returning whether the changeset may be committed and why.

mod coordinator;
mod footer;
mod result;


pub use coordinator::QualityGatesCoordinator;
pub use footer::render_footer;
pub use result::QualityGateResult;
