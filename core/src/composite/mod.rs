//! Composite stream.
//!
//! Responsibilities:
//! - Read/Write/Seek across segment boundaries
//! - Capability aggregation
//! - Live length, final-segment `set_len`
//! - Ordered, failure-tolerant close
//!
//! Non-responsibilities:
//! - Offset resolution (see `boundary`)
//! - Backend specifics (see `segment`)

pub mod cancel;
pub mod config;
pub mod stream;

pub use cancel::CancelToken;
pub use config::{CompositeConfig, SeekPolicy};
pub use stream::CompositeStream;
