use std::fmt;

bitflags::bitflags! {
    /// ## Segment capability flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Capabilities: u8 {
        /// Bytes can be read
        const READABLE = 0b0000_0001;

        /// Bytes can be overwritten in place
        const WRITABLE = 0b0000_0010;

        /// Arbitrary positioning is supported
        const SEEKABLE = 0b0000_0100;

        /// Length can change (grow on append, `set_len`)
        const RESIZABLE = 0b0000_1000;
    }
}

impl Capabilities {
    /// The three flags that aggregate across a composite by logical AND.
    pub const STREAM: Capabilities = Capabilities::READABLE
        .union(Capabilities::WRITABLE)
        .union(Capabilities::SEEKABLE);

    /// Readable, writable, seekable and resizable: growable memory or files.
    pub const FULL: Capabilities = Capabilities::all();

    /// Immutable random-access storage.
    pub const READ_ONLY: Capabilities = Capabilities::READABLE.union(Capabilities::SEEKABLE);

    pub fn can_read(self) -> bool {
        self.contains(Capabilities::READABLE)
    }

    pub fn can_write(self) -> bool {
        self.contains(Capabilities::WRITABLE)
    }

    pub fn can_seek(self) -> bool {
        self.contains(Capabilities::SEEKABLE)
    }

    pub fn can_resize(self) -> bool {
        self.contains(Capabilities::RESIZABLE)
    }
}

impl fmt::Display for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flag = |set: bool, c: char| if set { c } else { '-' };
        write!(
            f,
            "{}{}{}{}",
            flag(self.can_read(), 'r'),
            flag(self.can_write(), 'w'),
            flag(self.can_seek(), 's'),
            flag(self.can_resize(), '+'),
        )
    }
}
