//! Byte-addressed frame memory

use rsv_primitives::{u256_to_word, U256};

/// Frame memory, grown in 32-byte words
#[derive(Clone, Debug, Default)]
pub struct Memory {
    data: Vec<u8>,
}

impl Memory {
    /// Empty memory
    pub fn new() -> Self {
        Self::default()
    }

    /// Current size in bytes, always word-aligned
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether nothing has been touched
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Size after touching `[offset, offset + size)`, without growing
    pub fn required_size(&self, offset: usize, size: usize) -> Option<usize> {
        if size == 0 {
            return Some(self.data.len());
        }
        let end = offset.checked_add(size)?;
        let aligned = end.checked_add(31)? / 32 * 32;
        Some(aligned.max(self.data.len()))
    }

    /// Grow to `new_size` bytes
    pub fn resize(&mut self, new_size: usize) {
        if new_size > self.data.len() {
            self.data.resize(new_size, 0);
        }
    }

    /// Load a word
    pub fn load_word(&self, offset: usize) -> U256 {
        U256::from_big_endian(&self.data[offset..offset + 32])
    }

    /// Store a word
    pub fn store_word(&mut self, offset: usize, value: &U256) {
        self.data[offset..offset + 32].copy_from_slice(&u256_to_word(value));
    }

    /// Store one byte
    pub fn store_byte(&mut self, offset: usize, value: u8) {
        self.data[offset] = value;
    }

    /// Copy `src` into memory, zero-filling past its end up to `size`
    pub fn store_padded(&mut self, offset: usize, size: usize, src: &[u8]) {
        let n = src.len().min(size);
        self.data[offset..offset + n].copy_from_slice(&src[..n]);
        self.data[offset + n..offset + size].fill(0);
    }

    /// Copy a range out of memory
    pub fn slice(&self, offset: usize, size: usize) -> &[u8] {
        if size == 0 {
            return &[];
        }
        &self.data[offset..offset + size]
    }
}
