//! Segment descriptors.
//!
//! Responsibilities:
//! - Wrap one owned backend with live length and capability queries
//! - Position the backend before every transfer
//! - Idempotent release
//!
//! Non-responsibilities:
//! - Virtual offsets (see `boundary`)
//! - Multi-segment transfers (see `composite`)

pub mod backend;
pub mod descriptor;
pub mod types;

pub use backend::{BytesSegment, FileSegment, ReadOnly, SegmentIo, SequentialReader, SharedBuffer};
pub use descriptor::Segment;
pub use types::Capabilities;
