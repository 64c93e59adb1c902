//! CLI library components for time-to-event derivation.

pub mod analysis;
pub mod logging;
pub mod report;
