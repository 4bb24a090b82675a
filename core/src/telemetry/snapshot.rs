// ## src/telemetry/snapshot.rs

use std::time::{Duration, Instant};
use serde::{Deserialize, Serialize};

use crate::telemetry::counters::TelemetryCounters;

/// Immutable view of a composite's counters at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    pub reads: u64,
    pub writes: u64,
    pub seeks: u64,
    pub bytes_read: u64,
    pub bytes_written: u64,
    pub segment_transfers: u64,
    pub boundary_crossings: u64,
    pub close_failures: u64,
    pub segment_count: usize,
    pub avg_bytes_per_transfer: f64,
    pub elapsed: Duration,
}

impl TelemetrySnapshot {
    pub fn from(counters: &TelemetryCounters, started: Instant, segment_count: usize) -> Self {
        let moved = counters.bytes_read + counters.bytes_written;
        let avg_bytes_per_transfer = if counters.segment_transfers > 0 {
            moved as f64 / counters.segment_transfers as f64
        } else {
            0.0
        };

        Self {
            reads: counters.reads,
            writes: counters.writes,
            seeks: counters.seeks,
            bytes_read: counters.bytes_read,
            bytes_written: counters.bytes_written,
            segment_transfers: counters.segment_transfers,
            boundary_crossings: counters.boundary_crossings,
            close_failures: counters.close_failures,
            segment_count,
            avg_bytes_per_transfer,
            elapsed: started.elapsed(),
        }
    }

    /// Crossings can never outnumber transfers.
    pub fn sanity_check(&self) -> bool {
        self.boundary_crossings <= self.segment_transfers
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
