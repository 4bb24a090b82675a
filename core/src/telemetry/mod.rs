//! telemetry/mod.rs
//! Composite stream telemetry: mutable counters and immutable snapshots.
//!
//! Counters are only updated when the composite's config enables telemetry.

pub mod counters;
pub mod snapshot;

pub use counters::*;
pub use snapshot::*;
