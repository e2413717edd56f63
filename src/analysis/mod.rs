//! Aggregation engine.
//!
//! Pure functions turning a candidate snapshot into scores, tallies,
//! ward totals and comparison rows.

pub mod aggregator;
pub mod ordering;

pub use aggregator::*;
pub use ordering::natural_cmp;
