#![allow(dead_code)]

use std::io::{self, Cursor};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use composite_core::prelude::*;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn mem(data: &[u8]) -> Segment {
    Segment::new(Cursor::new(data.to_vec()))
}

pub fn fixed(data: &[u8]) -> Segment {
    Segment::new(BytesSegment::new(data.to_vec()))
}

pub fn composite_of(parts: &[&[u8]]) -> CompositeStream {
    CompositeStream::new(parts.iter().map(|p| mem(p)).collect())
}

/// Backend wrapper that counts closes and optionally fails them.
pub struct CloseProbe<T> {
    pub inner: T,
    pub closes: Arc<AtomicUsize>,
    pub fail: bool,
}

impl<T> CloseProbe<T> {
    pub fn new(inner: T, closes: Arc<AtomicUsize>, fail: bool) -> Self {
        Self { inner, closes, fail }
    }
}

impl<T: SegmentIo> SegmentIo for CloseProbe<T> {
    fn capabilities(&self) -> Capabilities {
        self.inner.capabilities()
    }
    fn len(&self) -> io::Result<u64> {
        self.inner.len()
    }
    fn seek_to(&mut self, offset: u64) -> io::Result<()> {
        self.inner.seek_to(offset)
    }
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.inner.write(data)
    }
    fn close(&mut self) -> io::Result<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(io::Error::new(io::ErrorKind::Other, "close failed"));
        }
        self.inner.close()
    }
}

/// Readable, seekable backend that reports `len` bytes but fails every read.
pub struct BrokenRead {
    pub len: u64,
}

impl SegmentIo for BrokenRead {
    fn capabilities(&self) -> Capabilities {
        Capabilities::READ_ONLY
    }
    fn len(&self) -> io::Result<u64> {
        Ok(self.len)
    }
    fn seek_to(&mut self, _offset: u64) -> io::Result<()> {
        Ok(())
    }
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "disk went away"))
    }
}

/// Writable, seekable, fixed-size backend that fails every write.
pub struct BrokenWrite {
    pub len: u64,
}

impl SegmentIo for BrokenWrite {
    fn capabilities(&self) -> Capabilities {
        Capabilities::STREAM
    }
    fn len(&self) -> io::Result<u64> {
        Ok(self.len)
    }
    fn seek_to(&mut self, _offset: u64) -> io::Result<()> {
        Ok(())
    }
    fn write(&mut self, _data: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "disk went away"))
    }
}

/// Backend whose capabilities can be switched off from outside.
pub struct Revocable {
    pub inner: Cursor<Vec<u8>>,
    pub revoked: Arc<std::sync::atomic::AtomicBool>,
}

impl SegmentIo for Revocable {
    fn capabilities(&self) -> Capabilities {
        if self.revoked.load(Ordering::SeqCst) {
            Capabilities::empty()
        } else {
            self.inner.capabilities()
        }
    }
    fn len(&self) -> io::Result<u64> {
        SegmentIo::len(&self.inner)
    }
    fn seek_to(&mut self, offset: u64) -> io::Result<()> {
        self.inner.seek_to(offset)
    }
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        SegmentIo::read(&mut self.inner, buf)
    }
}
