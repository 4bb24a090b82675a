// Segment descriptor and backend behaviour.

mod common;

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Write};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use composite_core::prelude::*;

    use crate::common::{mem, CloseProbe};

// # ✅ 1. Positioning before every transfer

    #[test]
    fn read_at_repositions_seekable_backend() {
        let mut seg = mem(b"abcdef");
        let mut buf = [0u8; 2];

        assert_eq!(seg.read_at(4, &mut buf).unwrap(), 2);
        assert_eq!(&buf, b"ef");

        // Backend cursor is at 6 now; descriptor must not trust it.
        assert_eq!(seg.read_at(1, &mut buf).unwrap(), 2);
        assert_eq!(&buf, b"bc");
    }

    #[test]
    fn read_at_returns_short_only_at_end_of_data() {
        let mut seg = mem(b"abc");
        let mut buf = [0u8; 8];
        assert_eq!(seg.read_at(1, &mut buf).unwrap(), 2);
        assert_eq!(&buf[..2], b"bc");
        assert_eq!(seg.read_at(3, &mut buf).unwrap(), 0);
    }

    #[test]
    fn write_at_overwrites_in_place() {
        let mut seg = mem(b"hello");
        assert_eq!(seg.write_at(1, b"EL").unwrap(), 2);
        assert_eq!(seg.length().unwrap(), 5);

        let mut buf = [0u8; 5];
        seg.read_at(0, &mut buf).unwrap();
        assert_eq!(&buf, b"hELlo");
    }

// # ❌ 2. Capability enforcement

    #[test]
    fn write_on_read_only_segment_is_not_supported() {
        let mut seg = Segment::new(BytesSegment::new(&b"abc"[..]));
        assert!(matches!(seg.write_at(0, b"x"), Err(StreamError::NotSupported(_))));

        let mut masked = Segment::new(ReadOnly(Cursor::new(b"abc".to_vec())));
        assert!(!masked.capabilities().can_write());
        assert!(!masked.capabilities().can_resize());
        assert!(matches!(masked.write_at(0, b"x"), Err(StreamError::NotSupported(_))));
        assert!(matches!(masked.set_len(1), Err(StreamError::NotSupported(_))));
    }

    #[test]
    fn sequential_segment_only_reads_forward() {
        let reader = Cursor::new(b"abcdef".to_vec());
        let mut seg = Segment::new(SequentialReader::with_len(reader, 6));
        assert_eq!(seg.capabilities(), Capabilities::READABLE);

        let mut buf = [0u8; 3];
        assert_eq!(seg.read_at(0, &mut buf).unwrap(), 3);
        assert_eq!(seg.read_at(3, &mut buf).unwrap(), 3);
        assert_eq!(&buf, b"def");

        assert!(matches!(seg.read_at(0, &mut buf), Err(StreamError::NotSupported(_))));
    }

    #[test]
    fn sequential_segment_without_hint_has_no_length() {
        let seg = Segment::new(SequentialReader::new(std::io::empty()));
        assert!(matches!(seg.length(), Err(StreamError::Io(_))));
    }

    #[test]
    fn write_accepting_no_bytes_is_write_zero() {
        struct Full;
        impl SegmentIo for Full {
            fn capabilities(&self) -> Capabilities {
                Capabilities::STREAM
            }
            fn len(&self) -> std::io::Result<u64> {
                Ok(0)
            }
            fn seek_to(&mut self, _offset: u64) -> std::io::Result<()> {
                Ok(())
            }
            fn write(&mut self, _data: &[u8]) -> std::io::Result<usize> {
                Ok(0)
            }
        }

        let mut seg = Segment::new(Full);
        match seg.write_at(0, b"x") {
            Err(StreamError::Io(e)) => assert_eq!(e.kind(), std::io::ErrorKind::WriteZero),
            other => panic!("expected WriteZero, got {other:?}"),
        }
    }

// # ✅ 3. Live length

    #[test]
    fn shared_buffer_length_is_live() {
        let shared = SharedBuffer::new(b"ab".to_vec());
        let seg = Segment::new(shared.clone());
        assert_eq!(seg.length().unwrap(), 2);

        shared.append(b"cde").unwrap();
        assert_eq!(seg.length().unwrap(), 5);

        shared.truncate(1).unwrap();
        assert_eq!(seg.length().unwrap(), 1);
    }

    #[test]
    fn file_segment_reads_and_writes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seg.bin");
        std::fs::File::create(&path).unwrap().write_all(b"0123456789").unwrap();

        let mut seg = Segment::new(FileSegment::open_read_write(&path).unwrap());
        assert_eq!(seg.length().unwrap(), 10);
        seg.write_at(8, b"xyz").unwrap();
        assert_eq!(seg.length().unwrap(), 11);

        let mut buf = [0u8; 4];
        seg.read_at(7, &mut buf).unwrap();
        assert_eq!(&buf, b"7xyz");

        let ro = Segment::new(FileSegment::open_read(&path).unwrap());
        assert_eq!(ro.capabilities(), Capabilities::READ_ONLY);
    }

// # ✅ 4. Close

    #[test]
    fn close_is_idempotent() {
        let closes = Arc::new(AtomicUsize::new(0));
        let mut seg = Segment::new(CloseProbe::new(Cursor::new(vec![1u8, 2, 3]), closes.clone(), false));

        seg.close().unwrap();
        seg.close().unwrap();
        assert_eq!(closes.load(Ordering::SeqCst), 1);
        assert!(seg.is_closed());
        assert_eq!(seg.capabilities(), Capabilities::empty());
    }

    #[test]
    fn closed_segment_rejects_io() {
        let mut seg = mem(b"abc");
        seg.close().unwrap();

        let mut buf = [0u8; 1];
        assert!(matches!(seg.read_at(0, &mut buf), Err(StreamError::Closed)));
        assert!(matches!(seg.length(), Err(StreamError::Closed)));
    }

    #[test]
    fn closed_file_segment_reports_no_capabilities() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seg.bin");
        let mut backend = FileSegment::open_read_write(&path).unwrap();
        backend.close().unwrap();
        assert_eq!(backend.capabilities(), Capabilities::empty());
        assert!(backend.len().is_err());
    }

    #[test]
    fn capabilities_display_as_flags() {
        assert_eq!(Capabilities::FULL.to_string(), "rws+");
        assert_eq!(Capabilities::READ_ONLY.to_string(), "r-s-");
        assert_eq!(Capabilities::empty().to_string(), "----");
    }
}
