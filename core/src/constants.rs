/// Scratch buffer size for whole-stream helpers (checksums, copies).
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024; // 64 KiB

/// Log target used by the composite layer.
pub const LOG_TARGET: &str = "composite";
pub const SEGMENT_LOG_TARGET: &str = "composite::segment";
