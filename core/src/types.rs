use std::io;

use thiserror::Error;

/// One segment that failed to release during `close`.
#[derive(Debug)]
pub struct CloseFailure {
    /// Position of the segment in the composite's concatenation order.
    pub index: usize,
    pub error: io::Error,
}

/// Unified composite stream error.
/// - `From<StreamError> for io::Error` lets the `std::io` trait impls use `?`.
/// - Callers holding an `io::Error` can recover the typed error with [`StreamError::downcast`].
#[derive(Debug, Error)]
pub enum StreamError {
    /// Operation needs a capability the aggregate does not have, or the
    /// request is an unsupported partial operation.
    #[error("not supported: {0}")]
    NotSupported(String),

    /// Computed virtual offset is negative or otherwise unrepresentable.
    #[error("argument out of range: {0}")]
    ArgumentOutOfRange(String),

    /// Failure reported by an underlying segment, passed through verbatim.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Stream (or segment) has already been closed.
    #[error("stream is closed")]
    Closed,

    /// A cancel token fired before any byte was transferred.
    #[error("operation cancelled")]
    Cancelled,

    /// One or more segments failed to release. Every segment was still attempted.
    #[error("{} segment(s) failed to close: {}", .failures.len(), describe_failures(.failures))]
    Close { failures: Vec<CloseFailure> },
}

fn describe_failures(failures: &[CloseFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("#{}: {}", f.index, f.error))
        .collect::<Vec<_>>()
        .join("; ")
}

impl StreamError {
    pub fn not_supported(msg: impl Into<String>) -> Self {
        StreamError::NotSupported(msg.into())
    }

    pub fn out_of_range(msg: impl Into<String>) -> Self {
        StreamError::ArgumentOutOfRange(msg.into())
    }

    /// The `io::ErrorKind` this error surfaces as through `Read`/`Write`/`Seek`.
    pub fn io_kind(&self) -> io::ErrorKind {
        match self {
            StreamError::NotSupported(_) => io::ErrorKind::Unsupported,
            StreamError::ArgumentOutOfRange(_) => io::ErrorKind::InvalidInput,
            StreamError::Io(e) => e.kind(),
            StreamError::Closed => io::ErrorKind::NotConnected,
            StreamError::Cancelled => io::ErrorKind::Other,
            StreamError::Close { .. } => io::ErrorKind::Other,
        }
    }

    /// Recover the typed error from an `io::Error` produced by this crate.
    pub fn downcast(err: &io::Error) -> Option<&StreamError> {
        err.get_ref().and_then(|inner| inner.downcast_ref::<StreamError>())
    }
}

impl From<StreamError> for io::Error {
    fn from(e: StreamError) -> Self {
        match e {
            // Segment failures stay verbatim.
            StreamError::Io(inner) => inner,
            other => io::Error::new(other.io_kind(), other),
        }
    }
}
