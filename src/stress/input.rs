//! Byte-stream reader used to decode stress steps.

/// Reads bytes front to back from a borrowed input blob.
///
/// Exhaustion is reported as `None`; it ends a run rather than failing it.
#[derive(Debug, Clone)]
pub struct ByteInput<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> ByteInput<'a> {
    /// Creates a reader positioned at the first byte.
    #[must_use]
    pub const fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, position: 0 }
    }

    /// Reads the next byte.
    pub fn read(&mut self) -> Option<u8> {
        let byte = self.bytes.get(self.position).copied()?;
        self.position += 1;
        Some(byte)
    }

    /// Reads bytes until one satisfies `accept`, skipping the others.
    pub fn read_where<P>(&mut self, mut accept: P) -> Option<u8>
    where
        P: FnMut(u8) -> bool,
    {
        loop {
            let byte = self.read()?;
            if accept(byte) {
                return Some(byte);
            }
        }
    }

    /// Number of bytes consumed so far.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Returns `true` once every byte has been consumed.
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        self.position >= self.bytes.len()
    }
}
