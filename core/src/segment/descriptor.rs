use std::fmt;
use std::io;

use crate::constants::SEGMENT_LOG_TARGET;
use crate::segment::backend::SegmentIo;
use crate::segment::types::Capabilities;
use crate::types::StreamError;

/// One member of a composite: an owned backend plus the cursor bookkeeping
/// needed to position it before every transfer.
pub struct Segment {
    io: Box<dyn SegmentIo>,
    /// Backend position as far as this descriptor knows. Only trusted for
    /// non-seekable backends, which cannot be repositioned.
    cursor: Option<u64>,
    closed: bool,
}

impl Segment {
    pub fn new(io: impl SegmentIo + 'static) -> Self {
        Self::from_boxed(Box::new(io))
    }

    /// Non-seekable backends are assumed to sit at their own offset 0.
    pub fn from_boxed(io: Box<dyn SegmentIo>) -> Self {
        Self { io, cursor: Some(0), closed: false }
    }

    /// Live capability query. A closed segment has none.
    pub fn capabilities(&self) -> Capabilities {
        if self.closed {
            Capabilities::empty()
        } else {
            self.io.capabilities()
        }
    }

    /// Live length query; never cached.
    pub fn length(&self) -> Result<u64, StreamError> {
        self.ensure_open()?;
        Ok(self.io.len()?)
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Read up to `buf.len()` bytes starting at `local`. Returns fewer only
    /// when the segment runs out of data.
    pub fn read_at(&mut self, local: u64, buf: &mut [u8]) -> Result<usize, StreamError> {
        self.ensure_open()?;
        if !self.capabilities().can_read() {
            return Err(StreamError::not_supported("segment is not readable"));
        }
        self.position_at(local)?;

        let mut filled = 0;
        while filled < buf.len() {
            match self.io.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => {
                    filled += n;
                    self.advance(n);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.invalidate();
                    return Err(e.into());
                }
            }
        }

        log::trace!(target: SEGMENT_LOG_TARGET, "read {} bytes at local offset {}", filled, local);
        Ok(filled)
    }

    /// Write all of `data` starting at `local`.
    pub fn write_at(&mut self, local: u64, data: &[u8]) -> Result<usize, StreamError> {
        self.ensure_open()?;
        if !self.capabilities().can_write() {
            return Err(StreamError::not_supported("segment is not writable"));
        }
        self.position_at(local)?;

        let mut written = 0;
        while written < data.len() {
            match self.io.write(&data[written..]) {
                Ok(0) => {
                    self.invalidate();
                    return Err(io::Error::new(io::ErrorKind::WriteZero, "segment accepted no bytes").into());
                }
                Ok(n) => {
                    written += n;
                    self.advance(n);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.invalidate();
                    return Err(e.into());
                }
            }
        }

        log::trace!(target: SEGMENT_LOG_TARGET, "wrote {} bytes at local offset {}", written, local);
        Ok(written)
    }

    pub fn set_len(&mut self, len: u64) -> Result<(), StreamError> {
        self.ensure_open()?;
        if !self.capabilities().can_resize() {
            return Err(StreamError::not_supported("segment is not resizable"));
        }
        self.io.set_len(len)?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), StreamError> {
        if self.closed {
            return Ok(());
        }
        Ok(self.io.flush()?)
    }

    /// Release the backend. Closing twice is a no-op.
    pub fn close(&mut self) -> Result<(), StreamError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.cursor = None;
        Ok(self.io.close()?)
    }

    /// Give back the backend without closing it.
    pub fn into_inner(self) -> Box<dyn SegmentIo> {
        self.io
    }

    fn ensure_open(&self) -> Result<(), StreamError> {
        if self.closed {
            Err(StreamError::Closed)
        } else {
            Ok(())
        }
    }

    /// Seek-then-transfer: seekable backends are always repositioned, others
    /// must already be exactly at `local`.
    fn position_at(&mut self, local: u64) -> Result<(), StreamError> {
        if self.capabilities().can_seek() {
            self.io.seek_to(local)?;
            self.cursor = Some(local);
            return Ok(());
        }
        match self.cursor {
            Some(at) if at == local => Ok(()),
            Some(at) => Err(StreamError::not_supported(format!(
                "segment is not seekable: positioned at {at}, requested {local}"
            ))),
            None => Err(StreamError::not_supported(
                "segment is not seekable and its position is unknown",
            )),
        }
    }

    fn advance(&mut self, n: usize) {
        if let Some(at) = self.cursor.as_mut() {
            *at += n as u64;
        }
    }

    fn invalidate(&mut self) {
        if !self.io.capabilities().can_seek() {
            self.cursor = None;
        }
    }
}

impl fmt::Debug for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Segment")
            .field("capabilities", &self.capabilities())
            .field("cursor", &self.cursor)
            .field("closed", &self.closed)
            .finish()
    }
}

impl<T: SegmentIo + 'static> From<T> for Segment {
    fn from(io: T) -> Self {
        Segment::new(io)
    }
}
