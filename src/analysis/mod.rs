//! Analysis modules.
//!
//! Turns raw instance lists into per-service statistics and the
//! flagged/normal classification of every tick.

pub mod aggregator;

pub use aggregator::*;
