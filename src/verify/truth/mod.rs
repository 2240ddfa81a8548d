//! Truth enforcement
//!
//! Claims such as "all tests pass" are matched against an ordered rule list.
//! The first rule whose phrase appears in the claim names the evidence that
//! proves it; claims no rule covers are never proven. In strict mode an
//! unproven claim blocks completion, in permissive mode it is only
//! reported.

mod claims;
mod enforcer;

#[cfg(test)]
mod tests;

pub use claims::{extract_claims, Claim, ProofRequirement, UNKNOWN_PROOF};
pub use enforcer::{TruthEnforcer, TruthVerdict};
