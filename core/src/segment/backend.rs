// ## Segment backends
// Minimal stream contract a segment is built on, plus the stock backends.

use std::fs::{File, OpenOptions};
use std::io::{self, Cursor, Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use bytes::Bytes;

use crate::segment::types::Capabilities;
use crate::types::StreamError;

pub(crate) fn unsupported(what: &str) -> io::Error {
    StreamError::not_supported(what.to_string()).into()
}

/// Underlying byte storage of one segment.
///
/// Implementations report capabilities live: a backend that was closed or lost
/// its handle must stop reporting the flags it can no longer honour.
/// Positioning is absolute (`seek_to`); the segment descriptor always positions
/// before it transfers.
pub trait SegmentIo: Send {
    fn capabilities(&self) -> Capabilities;

    /// Current length in bytes. Fails when the backend cannot tell.
    fn len(&self) -> io::Result<u64>;

    fn seek_to(&mut self, _offset: u64) -> io::Result<()> {
        Err(unsupported("segment is not seekable"))
    }

    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(unsupported("segment is not readable"))
    }

    fn write(&mut self, _data: &[u8]) -> io::Result<usize> {
        Err(unsupported("segment is not writable"))
    }

    fn set_len(&mut self, _len: u64) -> io::Result<()> {
        Err(unsupported("segment is not resizable"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }

    /// Release the underlying resource.
    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<T: SegmentIo + ?Sized> SegmentIo for Box<T> {
    fn capabilities(&self) -> Capabilities {
        (**self).capabilities()
    }
    fn len(&self) -> io::Result<u64> {
        (**self).len()
    }
    fn seek_to(&mut self, offset: u64) -> io::Result<()> {
        (**self).seek_to(offset)
    }
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        (**self).read(buf)
    }
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        (**self).write(data)
    }
    fn set_len(&mut self, len: u64) -> io::Result<()> {
        (**self).set_len(len)
    }
    fn flush(&mut self) -> io::Result<()> {
        (**self).flush()
    }
    fn close(&mut self) -> io::Result<()> {
        (**self).close()
    }
}

// ================= Memory =================

impl SegmentIo for Cursor<Vec<u8>> {
    fn capabilities(&self) -> Capabilities {
        Capabilities::FULL
    }

    fn len(&self) -> io::Result<u64> {
        Ok(self.get_ref().len() as u64)
    }

    fn seek_to(&mut self, offset: u64) -> io::Result<()> {
        self.set_position(offset);
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Read::read(self, buf)
    }

    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        Write::write(self, data)
    }

    fn set_len(&mut self, len: u64) -> io::Result<()> {
        let len = usize::try_from(len)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "length exceeds address space"))?;
        self.get_mut().resize(len, 0);
        Ok(())
    }
}

/// Immutable, cheaply cloneable segment over `Bytes`.
#[derive(Debug, Clone)]
pub struct BytesSegment {
    data: Bytes,
    pos: usize,
}

impl BytesSegment {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self { data: data.into(), pos: 0 }
    }

    pub fn bytes(&self) -> &Bytes {
        &self.data
    }
}

impl SegmentIo for BytesSegment {
    fn capabilities(&self) -> Capabilities {
        Capabilities::READ_ONLY
    }

    fn len(&self) -> io::Result<u64> {
        Ok(self.data.len() as u64)
    }

    fn seek_to(&mut self, offset: u64) -> io::Result<()> {
        self.pos = usize::try_from(offset).unwrap_or(usize::MAX);
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.pos >= self.data.len() {
            return Ok(0);
        }
        let n = buf.len().min(self.data.len() - self.pos);
        buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

/// Growable buffer that other owners may mutate while a composite holds it.
///
/// Clones share the same bytes but keep their own cursor. The length is read
/// under the lock on every query, so growth or truncation by another clone is
/// visible to the next composite operation.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer {
    inner: Arc<Mutex<Vec<u8>>>,
    pos: u64,
}

impl SharedBuffer {
    pub fn new(data: Vec<u8>) -> Self {
        Self { inner: Arc::new(Mutex::new(data)), pos: 0 }
    }

    fn lock(&self) -> io::Result<MutexGuard<'_, Vec<u8>>> {
        self.inner
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "shared buffer lock poisoned"))
    }

    /// Append bytes at the end, regardless of this handle's cursor.
    pub fn append(&self, data: &[u8]) -> io::Result<()> {
        self.lock()?.extend_from_slice(data);
        Ok(())
    }

    pub fn truncate(&self, len: usize) -> io::Result<()> {
        self.lock()?.truncate(len);
        Ok(())
    }

    /// Copy of the current contents.
    pub fn snapshot(&self) -> io::Result<Vec<u8>> {
        Ok(self.lock()?.clone())
    }
}

impl SegmentIo for SharedBuffer {
    fn capabilities(&self) -> Capabilities {
        if self.inner.is_poisoned() {
            Capabilities::empty()
        } else {
            Capabilities::FULL
        }
    }

    fn len(&self) -> io::Result<u64> {
        Ok(self.lock()?.len() as u64)
    }

    fn seek_to(&mut self, offset: u64) -> io::Result<()> {
        self.pos = offset;
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let guard = self.lock()?;
        let len = guard.len() as u64;
        if self.pos >= len {
            return Ok(0);
        }
        let start = self.pos as usize;
        let n = buf.len().min(guard.len() - start);
        buf[..n].copy_from_slice(&guard[start..start + n]);
        drop(guard);
        self.pos += n as u64;
        Ok(n)
    }

    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        let mut guard = self.lock()?;
        let start = usize::try_from(self.pos)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "offset exceeds address space"))?;
        let end = start + data.len();
        if guard.len() < end {
            guard.resize(end, 0);
        }
        guard[start..end].copy_from_slice(data);
        drop(guard);
        self.pos = end as u64;
        Ok(data.len())
    }

    fn set_len(&mut self, len: u64) -> io::Result<()> {
        let len = usize::try_from(len)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "length exceeds address space"))?;
        self.lock()?.resize(len, 0);
        Ok(())
    }
}

// ================= File =================

/// File-backed segment. The capability set is fixed at open time because a
/// `File` cannot report its own access mode.
#[derive(Debug)]
pub struct FileSegment {
    file: Option<File>,
    caps: Capabilities,
}

impl FileSegment {
    pub fn open_read(path: impl AsRef<Path>) -> io::Result<Self> {
        Ok(Self::from_file(File::open(path)?, Capabilities::READ_ONLY))
    }

    /// Open (creating if missing) for reading and writing.
    pub fn open_read_write(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;
        Ok(Self::from_file(file, Capabilities::FULL))
    }

    pub fn from_file(file: File, caps: Capabilities) -> Self {
        Self { file: Some(file), caps }
    }

    fn file(&mut self) -> io::Result<&mut File> {
        self.file.as_mut().ok_or_else(|| StreamError::Closed.into())
    }
}

impl SegmentIo for FileSegment {
    fn capabilities(&self) -> Capabilities {
        if self.file.is_some() {
            self.caps
        } else {
            Capabilities::empty()
        }
    }

    fn len(&self) -> io::Result<u64> {
        match &self.file {
            Some(f) => Ok(f.metadata()?.len()),
            None => Err(StreamError::Closed.into()),
        }
    }

    fn seek_to(&mut self, offset: u64) -> io::Result<()> {
        self.file()?.seek(SeekFrom::Start(offset))?;
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file()?.read(buf)
    }

    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.file()?.write(data)
    }

    fn set_len(&mut self, len: u64) -> io::Result<()> {
        self.file()?.set_len(len)
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.file.as_mut() {
            Some(f) => f.flush(),
            None => Ok(()),
        }
    }

    fn close(&mut self) -> io::Result<()> {
        match self.file.take() {
            Some(mut f) => f.flush(),
            None => Ok(()),
        }
    }
}

// ================= Adapters =================

/// Forward-only reader. Readable, never seekable.
pub struct SequentialReader<R> {
    inner: R,
    len_hint: Option<u64>,
}

impl<R: Read + Send> SequentialReader<R> {
    /// Reader of unknown size: `len()` fails, so a composite holding it
    /// cannot resolve offsets and every composite operation errors. Use
    /// [`SequentialReader::with_len`] for segments placed in a composite.
    pub fn new(inner: R) -> Self {
        Self { inner, len_hint: None }
    }

    pub fn with_len(inner: R, len: u64) -> Self {
        Self { inner, len_hint: Some(len) }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read + Send> SegmentIo for SequentialReader<R> {
    fn capabilities(&self) -> Capabilities {
        Capabilities::READABLE
    }

    fn len(&self) -> io::Result<u64> {
        self.len_hint
            .ok_or_else(|| io::Error::new(io::ErrorKind::Unsupported, "sequential segment has no known length"))
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

/// Masks the write side of another backend.
pub struct ReadOnly<T>(pub T);

impl<T: SegmentIo> SegmentIo for ReadOnly<T> {
    fn capabilities(&self) -> Capabilities {
        self.0.capabilities() - Capabilities::WRITABLE - Capabilities::RESIZABLE
    }

    fn len(&self) -> io::Result<u64> {
        self.0.len()
    }

    fn seek_to(&mut self, offset: u64) -> io::Result<()> {
        self.0.seek_to(offset)
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.read(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.flush()
    }

    fn close(&mut self) -> io::Result<()> {
        self.0.close()
    }
}
