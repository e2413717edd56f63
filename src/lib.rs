//! JanTrack - promise-fulfillment and fund aggregation for civic candidate data.
//!
//! The [`analysis`] module is the aggregation engine: pure functions over a
//! validated candidate snapshot. [`snapshot`] validates raw store exports at
//! the boundary, and [`report`] renders engine output for people.

pub mod analysis;
pub mod cli;
pub mod config;
pub mod models;
pub mod report;
pub mod snapshot;
