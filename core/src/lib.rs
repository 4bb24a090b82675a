//! composite-core
//!
//! Virtual, seekable byte stream concatenating an ordered list of
//! independently owned segments into one address space.

#![forbid(unsafe_code)]

// Shared and top level
pub mod constants;
pub mod types;
pub mod utils;

pub mod telemetry;

// Stream layers
pub mod segment;
pub mod boundary;
pub mod composite;

// -----------------------------------------------------------------------------
// Prelude (Rust users)
// -----------------------------------------------------------------------------
pub mod prelude {
    pub use crate::boundary::{BoundaryIndex, Location};
    pub use crate::composite::{CancelToken, CompositeConfig, CompositeStream, SeekPolicy};
    pub use crate::segment::{
        BytesSegment, Capabilities, FileSegment, ReadOnly, Segment, SegmentIo, SequentialReader, SharedBuffer,
    };
    pub use crate::types::{CloseFailure, StreamError};
}
