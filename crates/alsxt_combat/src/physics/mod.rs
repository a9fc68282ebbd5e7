//! Physics queries module
//!
//! Sweeps и line traces для targeting/attack trace.
//! Никакой симуляции тел: только queries по снапшоту `TraceBody`.

pub mod spatial;

// Re-export основных типов
pub use spatial::{QueryFilter, SpatialQuery, SweepHit, TraceBody, TraceChannel, TraceWorld};
