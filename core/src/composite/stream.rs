// ## Composite stream
// One continuous, seekable address space over an ordered list of segments.

use std::io::{self, Read, Seek, SeekFrom, Write};
use std::time::Instant;

use crate::boundary::{BoundaryIndex, Location};
use crate::composite::cancel::CancelToken;
use crate::composite::config::{CompositeConfig, SeekPolicy};
use crate::constants::LOG_TARGET;
use crate::segment::{Capabilities, Segment, SegmentIo};
use crate::telemetry::{TelemetryCounters, TelemetrySnapshot};
use crate::types::{CloseFailure, StreamError};

/// Virtual stream concatenating its segments in order.
///
/// - Lengths and capabilities are queried live on every operation that needs
///   them; nothing about a segment's extent is cached between calls.
/// - Every transfer repositions the target segment first.
/// - The composite owns its segments and closes each of them exactly once.
///
/// Not internally synchronized: one caller at a time.
#[derive(Debug)]
pub struct CompositeStream {
    segments: Vec<Segment>,
    position: u64,
    config: CompositeConfig,
    cancel: Option<CancelToken>,
    counters: TelemetryCounters,
    started: Instant,
    closed: bool,
}

impl CompositeStream {
    pub fn new(segments: Vec<Segment>) -> Self {
        Self::with_config(segments, CompositeConfig::default())
    }

    pub fn with_config(segments: Vec<Segment>, config: CompositeConfig) -> Self {
        log::debug!(target: LOG_TARGET, "composite created with {} segment(s)", segments.len());
        Self {
            segments,
            position: 0,
            config,
            cancel: None,
            counters: TelemetryCounters::default(),
            started: Instant::now(),
            closed: false,
        }
    }

    /// Box each backend into a segment, preserving order.
    pub fn from_backends<I, T>(backends: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: SegmentIo + 'static,
    {
        Self::new(backends.into_iter().map(Segment::new).collect())
    }

    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn set_cancel_token(&mut self, token: Option<CancelToken>) {
        self.cancel = token;
    }

    pub fn config(&self) -> &CompositeConfig {
        &self.config
    }

    /// Current virtual cursor.
    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    pub fn segment(&self, index: usize) -> Option<&Segment> {
        self.segments.get(index)
    }

    pub fn segment_mut(&mut self, index: usize) -> Option<&mut Segment> {
        self.segments.get_mut(index)
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Live length of every segment, in order.
    pub fn segment_lengths(&self) -> Result<Vec<u64>, StreamError> {
        self.ensure_open()?;
        self.segments.iter().map(Segment::length).collect()
    }

    /// Sum of the live segment lengths. Recomputed on every call.
    pub fn len(&self) -> Result<u64, StreamError> {
        Ok(self.index()?.total())
    }

    pub fn is_empty(&self) -> Result<bool, StreamError> {
        Ok(self.len()? == 0)
    }

    /// Aggregate capabilities.
    ///
    /// READABLE, WRITABLE and SEEKABLE are the logical AND over all segments
    /// (vacuously set for an empty list). RESIZABLE follows the final segment,
    /// the only one allowed to change the total length.
    pub fn capabilities(&self) -> Capabilities {
        if self.closed {
            return Capabilities::empty();
        }
        let mut caps = self
            .segments
            .iter()
            .fold(Capabilities::STREAM, |acc, s| acc & s.capabilities())
            & Capabilities::STREAM;
        if let Some(last) = self.segments.last() {
            if caps.can_write() && last.capabilities().can_resize() {
                caps |= Capabilities::RESIZABLE;
            }
        }
        caps
    }

    pub fn can_read(&self) -> bool {
        self.capabilities().can_read()
    }

    pub fn can_write(&self) -> bool {
        self.capabilities().can_write()
    }

    pub fn can_seek(&self) -> bool {
        self.capabilities().can_seek()
    }

    /// Truncate or extend the final segment so the total becomes `len`.
    ///
    /// Fails with `NotSupported` when `len` would remove or create a whole
    /// segment, or when the final segment is not resizable.
    pub fn set_len(&mut self, len: u64) -> Result<(), StreamError> {
        self.ensure_open()?;
        if !self.can_write() {
            return Err(StreamError::not_supported("composite is not writable"));
        }
        let index = self.index()?;
        let Some(last) = index.segment_count().checked_sub(1) else {
            if len == 0 {
                return Ok(());
            }
            return Err(StreamError::not_supported("composite has no segment to extend"));
        };
        let start = index.segment_start(last).unwrap_or(0);
        if len < start {
            return Err(StreamError::not_supported(format!(
                "length {len} would cut into non-final segments (final segment starts at {start})"
            )));
        }

        self.segments[last].set_len(len - start)?;
        if self.position > len {
            self.position = len;
        }
        log::debug!(target: LOG_TARGET, "set_len {} (final segment {} now {} bytes)", len, last, len - start);
        Ok(())
    }

    /// Flush every segment.
    pub fn flush_segments(&mut self) -> Result<(), StreamError> {
        self.ensure_open()?;
        for segment in self.segments.iter_mut() {
            segment.flush()?;
        }
        Ok(())
    }

    /// Close every segment in order.
    ///
    /// A failing segment does not stop the rest from being released; all
    /// failures are reported together. Closing again is a no-op.
    pub fn close(&mut self) -> Result<(), StreamError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        let mut failures = Vec::new();
        for (index, segment) in self.segments.iter_mut().enumerate() {
            if let Err(e) = segment.close() {
                log::warn!(target: LOG_TARGET, "segment {} failed to close: {}", index, e);
                failures.push(CloseFailure { index, error: e.into() });
            }
        }
        log::debug!(
            target: LOG_TARGET,
            "closed {} segment(s), {} failure(s)",
            self.segments.len(),
            failures.len()
        );

        if failures.is_empty() {
            Ok(())
        } else {
            let n = failures.len();
            self.record(|c| c.add_close_failures(n));
            Err(StreamError::Close { failures })
        }
    }

    /// Hand the segments back without closing them.
    pub fn into_segments(mut self) -> Vec<Segment> {
        self.closed = true;
        std::mem::take(&mut self.segments)
    }

    /// Telemetry snapshot, when enabled in the config.
    pub fn telemetry(&self) -> Option<TelemetrySnapshot> {
        self.config
            .telemetry_enabled()
            .then(|| TelemetrySnapshot::from(&self.counters, self.started, self.segments.len()))
    }

    pub fn counters(&self) -> &TelemetryCounters {
        &self.counters
    }

    // ================= Transfers =================

    fn read_inner(&mut self, buf: &mut [u8]) -> Result<usize, StreamError> {
        self.ensure_open()?;
        if !self.can_read() {
            return Err(StreamError::not_supported("composite is not readable"));
        }
        if buf.is_empty() {
            return Ok(0);
        }

        let index = self.index()?;
        self.clamp_position(index.total());
        let mut loc = index.locate(self.position).unwrap_or_else(|| index.append_point());

        let mut filled = 0usize;
        let mut transfers = 0u64;
        let outcome = loop {
            if filled == buf.len() || index.is_append(&loc) {
                break Ok(());
            }
            let seg_len = index.segment_len(loc.index).unwrap_or(0);
            let remaining = seg_len.saturating_sub(loc.local);
            if remaining == 0 {
                loc = next_segment(loc);
                continue;
            }
            if self.is_cancelled() {
                break Err(StreamError::Cancelled);
            }

            let want = clamp_len(remaining, buf.len() - filled);
            match self.segments[loc.index].read_at(loc.local, &mut buf[filled..filled + want]) {
                Ok(n) => {
                    filled += n;
                    self.position += n as u64;
                    if n > 0 {
                        transfers += 1;
                    }
                    loc.local += n as u64;
                    // A short read means the segment shrank after its length
                    // was taken; its data is exhausted either way.
                    if n < want || loc.local >= seg_len {
                        loc = next_segment(loc);
                    }
                }
                Err(e) => break Err(e),
            }
        };

        self.record(|c| c.add_read(filled, transfers));
        log::trace!(
            target: LOG_TARGET,
            "read {} bytes over {} segment transfer(s), position {}",
            filled,
            transfers,
            self.position
        );
        settle(outcome, filled)
    }

    fn write_inner(&mut self, data: &[u8]) -> Result<usize, StreamError> {
        self.ensure_open()?;
        if !self.can_write() {
            return Err(StreamError::not_supported("composite is not writable"));
        }
        if data.is_empty() {
            return Ok(0);
        }

        let index = self.index()?;
        let Some(last) = index.segment_count().checked_sub(1) else {
            return Err(StreamError::not_supported("composite has no segment to append to"));
        };
        self.clamp_position(index.total());
        let mut loc = index.locate(self.position).unwrap_or_else(|| index.append_point());
        if index.is_append(&loc) {
            // Appends extend the final segment from its current end.
            loc = Location { index: last, local: index.segment_len(last).unwrap_or(0) };
        }

        let mut written = 0usize;
        let mut transfers = 0u64;
        let outcome = loop {
            if written == data.len() {
                break Ok(());
            }
            let seg_len = index.segment_len(loc.index).unwrap_or(0);
            let left = data.len() - written;
            let chunk = if loc.index == last && self.segments[last].capabilities().can_resize() {
                left
            } else {
                // Non-final segments are fixed-size: overwrite in place only.
                clamp_len(seg_len.saturating_sub(loc.local), left)
            };
            if chunk == 0 {
                if loc.index == last {
                    break Err(StreamError::not_supported("final segment cannot grow"));
                }
                loc = next_segment(loc);
                continue;
            }
            if self.is_cancelled() {
                break Err(StreamError::Cancelled);
            }

            match self.segments[loc.index].write_at(loc.local, &data[written..written + chunk]) {
                Ok(n) => {
                    written += n;
                    self.position += n as u64;
                    if n > 0 {
                        transfers += 1;
                    }
                    loc.local += n as u64;
                    if loc.index != last && loc.local >= seg_len {
                        loc = next_segment(loc);
                    }
                }
                Err(e) => break Err(e),
            }
        };

        self.record(|c| c.add_write(written, transfers));
        log::trace!(
            target: LOG_TARGET,
            "wrote {} bytes over {} segment transfer(s), position {}",
            written,
            transfers,
            self.position
        );
        // A short write is a valid `Write::write` result; the next call
        // surfaces the error if nothing more fits.
        match outcome {
            Err(StreamError::NotSupported(_)) if written > 0 => Ok(written),
            other => settle(other, written),
        }
    }

    fn seek_inner(&mut self, pos: SeekFrom) -> Result<u64, StreamError> {
        self.ensure_open()?;
        if !self.can_seek() {
            return Err(StreamError::not_supported("composite is not seekable"));
        }

        let total = self.len()?;
        let target = match pos {
            SeekFrom::Start(n) => i128::from(n),
            SeekFrom::Current(delta) => i128::from(self.position.min(total)) + i128::from(delta),
            SeekFrom::End(delta) => i128::from(total) + i128::from(delta),
        };
        if target < 0 {
            return Err(StreamError::out_of_range(format!("seek to negative offset {target}")));
        }
        let target = u64::try_from(target)
            .map_err(|_| StreamError::out_of_range(format!("seek offset {target} overflows")))?;

        let new_pos = if target > total {
            match self.config.seek_policy {
                SeekPolicy::Clamp => total,
                SeekPolicy::Strict => {
                    return Err(StreamError::out_of_range(format!(
                        "seek to {target} past end of stream ({total})"
                    )))
                }
            }
        } else {
            target
        };

        self.position = new_pos;
        self.record(TelemetryCounters::add_seek);
        log::debug!(target: LOG_TARGET, "seek {:?} -> {}", pos, new_pos);
        Ok(new_pos)
    }

    // ================= Helpers =================

    fn index(&self) -> Result<BoundaryIndex, StreamError> {
        BoundaryIndex::from_lengths(&self.segment_lengths()?)
    }

    fn ensure_open(&self) -> Result<(), StreamError> {
        if self.closed {
            Err(StreamError::Closed)
        } else {
            Ok(())
        }
    }

    /// Segments may shrink between operations; never resolve past the end.
    fn clamp_position(&mut self, total: u64) {
        if self.position > total {
            log::debug!(target: LOG_TARGET, "position {} past end {}, clamping", self.position, total);
            self.position = total;
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelToken::is_cancelled)
    }

    fn record(&mut self, f: impl FnOnce(&mut TelemetryCounters)) {
        if self.config.telemetry_enabled() {
            f(&mut self.counters);
        }
    }
}

fn next_segment(loc: Location) -> Location {
    Location { index: loc.index + 1, local: 0 }
}

fn clamp_len(available: u64, wanted: usize) -> usize {
    usize::try_from(available).map_or(wanted, |a| a.min(wanted))
}

/// Cancellation after partial progress reports the progress.
fn settle(outcome: Result<(), StreamError>, moved: usize) -> Result<usize, StreamError> {
    match outcome {
        Ok(()) => Ok(moved),
        Err(StreamError::Cancelled) if moved > 0 => Ok(moved),
        Err(e) => Err(e),
    }
}

impl Read for CompositeStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(self.read_inner(buf)?)
    }
}

impl Write for CompositeStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(self.write_inner(buf)?)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(self.flush_segments()?)
    }
}

impl Seek for CompositeStream {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        Ok(self.seek_inner(pos)?)
    }

    fn stream_position(&mut self) -> io::Result<u64> {
        Ok(self.position)
    }
}

impl Drop for CompositeStream {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            log::warn!(target: LOG_TARGET, "close on drop failed: {}", e);
        }
    }
}
