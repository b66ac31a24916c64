//! A simple MSB-first bit reader and writer for variable-length codewords.

/// A bit reader.
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    /// The underlying bytes of the bit reader.
    pub data: &'a [u8],
    cur_pos: usize,
}

impl<'a> BitReader<'a> {
    /// Create a new bit reader.
    #[inline]
    pub fn new(data: &'a [u8]) -> Self {
        Self::new_with(data, 0)
    }

    /// Create a new bit reader, and start at a specific bit offset.
    #[inline]
    pub fn new_with(data: &'a [u8], cur_pos: usize) -> Self {
        Self { data, cur_pos }
    }

    /// Align the reader to the next byte boundary.
    #[inline]
    pub fn align(&mut self) {
        let bit_pos = self.bit_pos();

        if !bit_pos.is_multiple_of(8) {
            self.cur_pos += 8 - bit_pos;
        }
    }

    /// Read the given number of bits from the byte stream.
    ///
    /// Returns `None` if `bit_size` > 32 or if the stream does not contain
    /// enough bits.
    #[inline(always)]
    pub fn read(&mut self, bit_size: u8) -> Option<u32> {
        if bit_size > 32 || self.remaining() < bit_size as usize {
            return None;
        }

        let item = self.window(bit_size);
        self.cur_pos += bit_size as usize;

        Some(item)
    }

    /// Read a single bit.
    #[inline(always)]
    pub fn read_bit(&mut self) -> Option<u32> {
        self.read(1)
    }

    /// Peek the given number of bits.
    pub fn peek(&self, bit_size: u8) -> Option<u32> {
        self.clone().read(bit_size)
    }

    /// Peek the given number of bits, padding with zero bits past the end of
    /// the stream.
    ///
    /// Lookup-table decoders always index with a full window, even when fewer
    /// bits are left. Returns `None` only if `bit_size` > 32.
    pub fn peek_padded(&self, bit_size: u8) -> Option<u32> {
        if bit_size > 32 {
            return None;
        }

        Some(self.window(bit_size))
    }

    /// Skip the given number of bits.
    ///
    /// Returns `None` if the stream does not contain enough bits.
    pub fn skip(&mut self, bit_size: usize) -> Option<()> {
        if self.remaining() < bit_size {
            return None;
        }

        self.cur_pos += bit_size;

        Some(())
    }

    /// Whether the bit reader has read all bytes.
    pub fn at_end(&self) -> bool {
        self.byte_pos() >= self.data.len()
    }

    /// The number of bits left in the stream.
    #[inline]
    pub fn remaining(&self) -> usize {
        (self.data.len() * 8).saturating_sub(self.cur_pos)
    }

    /// Get the current byte position.
    #[inline]
    pub fn byte_pos(&self) -> usize {
        self.cur_pos / 8
    }

    /// Get the current position within the byte.
    #[inline]
    pub fn bit_pos(&self) -> usize {
        self.cur_pos % 8
    }

    /// Get the current position in bits.
    #[inline]
    pub fn cur_pos(&self) -> usize {
        self.cur_pos
    }

    // Missing bytes past the end read as zero.
    #[inline(always)]
    fn window(&self, bit_size: u8) -> u32 {
        if bit_size == 0 {
            return 0;
        }

        let byte_pos = self.byte_pos();
        let bit_pos = self.bit_pos();
        let end_byte_pos = (bit_pos + bit_size as usize - 1) / 8;
        let mut read = [0u8; 8];

        for (i, r) in read.iter_mut().enumerate().take(end_byte_pos + 1) {
            *r = self.data.get(byte_pos + i).copied().unwrap_or(0);
        }

        (u64::from_be_bytes(read) >> (64 - bit_pos - bit_size as usize)) as u32 & bit_mask(bit_size)
    }
}

/// Get the mask for the given bit size. Sizes above 32 give a full mask.
#[inline]
pub fn bit_mask(bit_size: u8) -> u32 {
    1u32.checked_shl(u32::from(bit_size))
        .map_or(u32::MAX, |bit| bit - 1)
}

/// A bit writer that grows its buffer as codewords are appended.
#[derive(Debug, Default, Clone)]
pub struct BitWriter {
    data: Vec<u8>,
    cur_pos: usize,
}

impl BitWriter {
    /// Create a new, empty bit writer.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Align the writer to the next byte boundary. The skipped bits are zero.
    #[inline]
    pub fn align(&mut self) {
        let bit_pos = self.bit_pos();

        if !bit_pos.is_multiple_of(8) {
            self.cur_pos += 8 - bit_pos;
        }
    }

    /// Return the number of written bits.
    #[inline]
    pub fn cur_pos(&self) -> usize {
        self.cur_pos
    }

    /// Return the bytes written so far. A trailing partial byte is zero padded.
    #[inline]
    pub fn get_data(&self) -> &[u8] {
        &self.data
    }

    /// Consume the writer and return the written bytes.
    pub fn finish(self) -> Vec<u8> {
        self.data
    }

    fn bit_pos(&self) -> usize {
        self.cur_pos % 8
    }

    /// Write the lowest `bit_size` bits of `val`, most significant bit first.
    ///
    /// Returns `None` if `bit_size` > 32.
    #[inline]
    pub fn write(&mut self, val: u32, bit_size: u8) -> Option<()> {
        if bit_size > 32 {
            return None;
        }

        let bit_size = bit_size as usize;
        let end = (self.cur_pos + bit_size).div_ceil(8);

        if self.data.len() < end {
            self.data.resize(end, 0);
        }

        let mut bits_left = bit_size;
        let value = val & bit_mask(bit_size as u8);

        while bits_left > 0 {
            let already_advanced = bit_size - bits_left;
            let absolute_pos = self.cur_pos + already_advanced;
            let byte_pos = absolute_pos / 8;
            let bit_pos = absolute_pos % 8;
            let bits_in_byte = (8 - bit_pos).min(bits_left);
            let shift = bits_left - bits_in_byte;
            let chunk_mask = bit_mask(bits_in_byte as u8);
            let chunk = ((value >> shift) & chunk_mask) as u8;

            let shift_in_byte = 8 - bits_in_byte - bit_pos;
            let byte = self.data.get_mut(byte_pos)?;
            let byte_mask = (chunk_mask as u8) << shift_in_byte;

            *byte = (*byte & !byte_mask) | ((chunk << shift_in_byte) & byte_mask);

            bits_left -= bits_in_byte;
        }

        self.cur_pos += bit_size;

        Some(())
    }
}
