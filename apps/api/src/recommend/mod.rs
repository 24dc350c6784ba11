// Recommendation: load the caller's latest score and the matching admission
// cutoffs, rank them with the configured `Ranker`, and page the result.
// The ranking itself is pure; all I/O lives in `candidates` and `handlers`.

pub mod candidates;
pub mod engine;
pub mod handlers;

pub use engine::{BandedRanker, Ranker};
