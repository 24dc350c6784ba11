// Read-only reference data: colleges, majors, historical admission cutoffs,
// enrollment plans and high-school enrollment outcomes.

pub mod handlers;
pub mod repository;
