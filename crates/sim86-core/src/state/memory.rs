use thiserror::Error;

/// Size of the flat address space in bytes.
pub const MEMORY_BYTES: usize = 1 << 16;

/// Flat 64 KiB byte-addressed memory image.
///
/// Every instance spans exactly [`MEMORY_BYTES`], so any `u16` address is in
/// bounds.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Deserialize, serde::Serialize),
    serde(try_from = "Vec<u8>", into = "Vec<u8>")
)]
pub struct Memory {
    bytes: Box<[u8]>,
}

/// A memory image whose length is not [`MEMORY_BYTES`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("memory image holds {len} bytes, expected {MEMORY_BYTES}")]
pub struct ImageSizeError {
    /// Length of the rejected image.
    pub len: usize,
}

impl TryFrom<Vec<u8>> for Memory {
    type Error = ImageSizeError;

    fn try_from(bytes: Vec<u8>) -> Result<Self, Self::Error> {
        if bytes.len() != MEMORY_BYTES {
            return Err(ImageSizeError { len: bytes.len() });
        }
        Ok(Self {
            bytes: bytes.into_boxed_slice(),
        })
    }
}

impl From<Memory> for Vec<u8> {
    fn from(memory: Memory) -> Self {
        memory.bytes.into_vec()
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self {
            bytes: vec![0; MEMORY_BYTES].into_boxed_slice(),
        }
    }
}

impl Memory {
    /// Reads one byte.
    #[must_use]
    pub fn read_u8(&self, addr: u16) -> u8 {
        self.bytes[usize::from(addr)]
    }

    /// Writes one byte.
    pub fn write_u8(&mut self, addr: u16, value: u8) {
        self.bytes[usize::from(addr)] = value;
    }

    /// Reads a little-endian word; the high byte wraps to address 0 at the top.
    #[must_use]
    pub fn read_u16_le(&self, addr: u16) -> u16 {
        u16::from_le_bytes([self.read_u8(addr), self.read_u8(addr.wrapping_add(1))])
    }

    /// Writes a little-endian word with the same wrapping as reads.
    pub fn write_u16_le(&mut self, addr: u16, value: u16) {
        let [lo, hi] = value.to_le_bytes();
        self.write_u8(addr, lo);
        self.write_u8(addr.wrapping_add(1), hi);
    }

    /// Raw image.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::{ImageSizeError, Memory, MEMORY_BYTES};

    #[test]
    fn memory_spans_the_full_address_space() {
        assert_eq!(Memory::default().as_slice().len(), MEMORY_BYTES);
    }

    #[test]
    fn words_are_little_endian() {
        let mut memory = Memory::default();
        memory.write_u16_le(0x1000, 0xBEEF);
        assert_eq!(memory.read_u8(0x1000), 0xEF);
        assert_eq!(memory.read_u8(0x1001), 0xBE);
        assert_eq!(memory.read_u16_le(0x1000), 0xBEEF);
    }

    #[test]
    fn word_access_wraps_at_top_of_memory() {
        let mut memory = Memory::default();
        memory.write_u16_le(0xFFFF, 0x1234);
        assert_eq!(memory.read_u8(0xFFFF), 0x34);
        assert_eq!(memory.read_u8(0x0000), 0x12);
        assert_eq!(memory.read_u16_le(0xFFFF), 0x1234);
    }

    #[test]
    fn images_must_span_the_address_space() {
        assert_eq!(
            Memory::try_from(vec![0; 16]),
            Err(ImageSizeError { len: 16 })
        );

        let mut image = vec![0; MEMORY_BYTES];
        image[0xFFFF] = 0xAB;
        let memory = Memory::try_from(image).expect("full image");
        assert_eq!(memory.read_u8(0xFFFF), 0xAB);
        assert_eq!(Vec::from(memory).len(), MEMORY_BYTES);
    }
}
