// ### `src/telemetry/counters.rs`

//! telemetry/counters.rs
//! Mutable counters updated by composite stream operations.
//!
//! Summary: Collects call counts, byte counts and per-segment transfer counts.
//! Converted into an immutable TelemetrySnapshot on demand.
use bincode::{Decode, Encode};
use std::ops::AddAssign;

/// Deterministic counters collected while a composite is in use
#[derive(Default, Clone, Debug, Encode, Decode, PartialEq, Eq)]
pub struct TelemetryCounters {
    pub reads: u64,
    pub writes: u64,
    pub seeks: u64,
    pub bytes_read: u64,
    pub bytes_written: u64,
    /// One per contiguous range copied to or from a single segment.
    pub segment_transfers: u64,
    /// Transfers that continued into a following segment.
    pub boundary_crossings: u64,
    pub close_failures: u64,
}

impl TelemetryCounters {
    /// Record one `read` call that moved `transfers` per-segment ranges.
    pub fn add_read(&mut self, bytes: usize, transfers: u64) {
        self.reads += 1;
        self.bytes_read += bytes as u64;
        self.add_transfers(transfers);
    }

    /// Record one `write` call that moved `transfers` per-segment ranges.
    pub fn add_write(&mut self, bytes: usize, transfers: u64) {
        self.writes += 1;
        self.bytes_written += bytes as u64;
        self.add_transfers(transfers);
    }

    pub fn add_seek(&mut self) {
        self.seeks += 1;
    }

    pub fn add_close_failures(&mut self, n: usize) {
        self.close_failures += n as u64;
    }

    fn add_transfers(&mut self, transfers: u64) {
        self.segment_transfers += transfers;
        self.boundary_crossings += transfers.saturating_sub(1);
    }

    pub fn merge(&mut self, other: &TelemetryCounters) {
        self.reads += other.reads;
        self.writes += other.writes;
        self.seeks += other.seeks;
        self.bytes_read += other.bytes_read;
        self.bytes_written += other.bytes_written;
        self.segment_transfers += other.segment_transfers;
        self.boundary_crossings += other.boundary_crossings;
        self.close_failures += other.close_failures;
    }

    /// Compact binary form for persisting counters between runs.
    pub fn to_bytes(&self) -> Result<Vec<u8>, bincode::error::EncodeError> {
        bincode::encode_to_vec(self, bincode::config::standard())
    }

    pub fn from_bytes(buf: &[u8]) -> Result<Self, bincode::error::DecodeError> {
        let (counters, _) = bincode::decode_from_slice(buf, bincode::config::standard())?;
        Ok(counters)
    }
}

impl AddAssign for TelemetryCounters {
    fn add_assign(&mut self, rhs: Self) {
        self.merge(&rhs);
    }
}
