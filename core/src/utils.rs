use std::io::{self, Read};

use crate::constants::DEFAULT_CHUNK_SIZE;

/// CRC32 of everything `reader` yields from its current position on,
/// streamed through a fixed scratch buffer.
///
/// Used to compare segment or composite contents without materializing them.
pub fn crc32_of<R: Read + ?Sized>(reader: &mut R) -> io::Result<u32> {
    let mut hasher = crc32fast::Hasher::new();
    let mut buf = vec![0u8; DEFAULT_CHUNK_SIZE];
    loop {
        match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => hasher.update(&buf[..n]),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(hasher.finalize())
}

pub fn crc32_of_slice(data: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(data);
    hasher.finalize()
}
