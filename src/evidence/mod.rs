//! Evidence collection
//!
//! Every check that produces proof records it here. Claims are later judged
//! solely against what the collector holds.

mod collector;
mod types;


pub use collector::{load_report, EvidenceCollector};
pub use types::{
    values_match, Evidence, EvidenceReport, EvidenceSummary, EvidenceType, TestEvidence,
};
