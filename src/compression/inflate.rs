//! Inflate engine
//!
//! Block-oriented decompression of RFC 1950 / RFC 1951 streams. The
//! default mode expects the zlib envelope (two-byte header, Adler-32
//! trailer); raw mode consumes a bare deflate body. Any corruption puts
//! the instance into a permanent error state; further calls return the
//! original failure until [`Inflater::reset`].

use log::{debug, trace};

use super::checksum::adler32;
use super::huffman::HuffmanTree;
use super::{
    CodecError, Result, CODE_LENGTH_ORDER, DIST_EXTRA, DIST_OFFSET, END_OF_BLOCK, LENGTH_EXTRA,
    LENGTH_OFFSET,
};
use crate::io::BitReader;

const INITIAL_OUTPUT_CAPACITY: usize = 1024;

/// Decompression state machine for DEFLATE streams.
pub struct Inflater {
    bits: BitReader,
    input_len: usize,
    out: Vec<u8>,
    wrap: bool,
    header_done: bool,
    last_block: bool,
    eof: bool,
    total_in: u64,
    total_out: u64,
    error: Option<CodecError>,
}

impl Inflater {
    /// Creates an inflater for zlib-wrapped streams (RFC 1950).
    pub fn new() -> Self {
        Self::with_wrap(true)
    }

    /// Creates an inflater for raw deflate bodies (RFC 1951).
    pub fn raw() -> Self {
        Self::with_wrap(false)
    }

    fn with_wrap(wrap: bool) -> Self {
        Inflater {
            bits: BitReader::default(),
            input_len: 0,
            out: Vec::with_capacity(INITIAL_OUTPUT_CAPACITY),
            wrap,
            header_done: false,
            last_block: false,
            eof: false,
            total_in: 0,
            total_out: 0,
            error: None,
        }
    }

    /// Passes a block of compressed bytes to the decompressor.
    pub fn set_input(&mut self, data: &[u8]) {
        self.total_in += self.bits.bytes_consumed() as u64;
        self.input_len = data.len();
        self.bits.replace(data.to_vec());
    }

    /// True while the end of the stream has not been reached.
    pub fn needs_input(&self) -> bool {
        !self.eof
    }

    /// True once the final block has been decoded.
    pub fn finished(&self) -> bool {
        self.eof
    }

    /// Unconsumed bytes left in the current input buffer.
    pub fn remaining(&self) -> usize {
        self.bits.remaining_bytes()
    }

    /// Total compressed bytes consumed.
    pub fn total_in(&self) -> u64 {
        self.total_in + self.bits.bytes_consumed() as u64
    }

    /// Total decompressed bytes produced.
    pub fn total_out(&self) -> u64 {
        self.total_out
    }

    /// Returns the decompressor to its initial state.
    pub fn reset(&mut self) {
        let wrap = self.wrap;
        *self = Self::with_wrap(wrap);
    }

    /// Decompresses the current input and returns the produced bytes.
    ///
    /// On failure the instance stays in the error state and every later
    /// call returns the same error until [`reset`](Self::reset).
    pub fn inflate(&mut self) -> Result<Vec<u8>> {
        if let Some(error) = &self.error {
            return Err(error.clone());
        }
        match self.run() {
            Ok(output) => Ok(output),
            Err(error) => {
                debug!("inflate failed: {error}");
                self.error = Some(error.clone());
                Err(error)
            }
        }
    }

    fn run(&mut self) -> Result<Vec<u8>> {
        if self.eof {
            return Ok(Vec::new());
        }
        if self.wrap && !self.header_done {
            self.read_zlib_header()?;
        }
        self.header_done = true;

        while !self.last_block {
            let bfinal = self.bits.next_bit()?;
            let btype = self.bits.next_bits_low_first(2)?;
            if bfinal == 1 {
                self.last_block = true;
            }
            trace!("block header: final={bfinal} type={btype}");
            match btype {
                0 => self.stored_block()?,
                1 => self.fixed_block()?,
                2 => self.dynamic_block()?,
                _ => return Err(CodecError::CorruptBlock),
            }
        }

        if self.wrap {
            self.check_trailer()?;
        }
        self.eof = true;

        let output = std::mem::take(&mut self.out);
        debug!(
            "inflated {} bytes into {} bytes",
            self.total_in(),
            output.len()
        );
        Ok(output)
    }

    fn read_zlib_header(&mut self) -> Result<()> {
        let cmf = self.bits.next_aligned_u8().map_err(|_| CodecError::CorruptHeader)?;
        let flg = self.bits.next_aligned_u8().map_err(|_| CodecError::CorruptHeader)?;

        let method = cmf & 0x0F;
        if method != 8 {
            return Err(CodecError::UnsupportedMethod(method));
        }
        let info = (cmf >> 4) & 0x0F;
        if info > 7 {
            return Err(CodecError::CorruptHeader);
        }
        if (flg >> 5) & 1 != 0 {
            return Err(CodecError::DictionaryUnsupported);
        }
        if (u16::from(cmf) * 256 + u16::from(flg)) % 31 != 0 {
            return Err(CodecError::HeaderChecksum);
        }
        Ok(())
    }

    fn check_trailer(&mut self) -> Result<()> {
        self.bits.skip_to_byte();
        let mut stored = 0u32;
        for _ in 0..4 {
            stored = (stored << 8) | u32::from(self.bits.next_aligned_u8()?);
        }
        let computed = adler32(&self.out);
        if stored != computed {
            return Err(CodecError::ChecksumMismatch { stored, computed });
        }
        Ok(())
    }

    /// Grows the output buffer using the current compression ratio, so a
    /// stream that expands heavily reserves in large steps instead of
    /// many small ones.
    fn reserve_output(&mut self) {
        if self.out.len() < self.out.capacity() {
            return;
        }
        let consumed = self.bits.bytes_consumed().max(1);
        let ratio = consumed as f64 / self.input_len.max(1) as f64;
        let additional = ((self.out.capacity() as f64 / ratio) as usize).max(4096);
        self.out.reserve(additional);
    }

    fn push_output(&mut self, byte: u8) {
        self.reserve_output();
        self.out.push(byte);
        self.total_out += 1;
    }

    fn stored_block(&mut self) -> Result<()> {
        self.bits.skip_to_byte();
        let len = self.bits.next_aligned_u16_le()?;
        let nlen = self.bits.next_aligned_u16_le()?;
        if len != !nlen {
            return Err(CodecError::StoredLengthMismatch);
        }
        for _ in 0..len {
            let byte = self.bits.next_aligned_u8()?;
            self.push_output(byte);
        }
        Ok(())
    }

    fn fixed_block(&mut self) -> Result<()> {
        self.block_body(HuffmanTree::fixed_literal(), HuffmanTree::fixed_distance())
    }

    fn dynamic_block(&mut self) -> Result<()> {
        let hlit = self.bits.next_bits_low_first(5)? as usize + 257;
        let hdist = self.bits.next_bits_low_first(5)? as usize + 1;
        let hclen = self.bits.next_bits_low_first(4)? as usize + 4;

        let mut cl_lengths = [0u8; 19];
        for &index in CODE_LENGTH_ORDER.iter().take(hclen) {
            cl_lengths[index] = self.bits.next_bits_low_first(3)? as u8;
        }
        let cl_tree = HuffmanTree::from_lengths(&cl_lengths)?;

        // Literal/length and distance code lengths form one sequence, so
        // a repeat escape may cross the boundary between them.
        let lengths = self.read_code_lengths(&cl_tree, hlit + hdist)?;
        if lengths[END_OF_BLOCK as usize] == 0 {
            return Err(CodecError::CorruptBlock);
        }
        let literal_tree = HuffmanTree::from_lengths(&lengths[..hlit])?;
        let distance_tree = HuffmanTree::from_lengths(&lengths[hlit..])?;

        self.block_body(&literal_tree, &distance_tree)
    }

    fn read_code_lengths(&mut self, cl_tree: &HuffmanTree, count: usize) -> Result<Vec<u8>> {
        let mut lengths = vec![0u8; count];
        let mut filled = 0usize;
        while filled < count {
            let symbol = cl_tree.decode(&mut self.bits)?;
            match symbol {
                0..=15 => {
                    lengths[filled] = symbol as u8;
                    filled += 1;
                }
                16 => {
                    if filled == 0 {
                        return Err(CodecError::CorruptBlock);
                    }
                    let previous = lengths[filled - 1];
                    let repeat = 3 + self.bits.next_bits_low_first(2)? as usize;
                    if filled + repeat > count {
                        return Err(CodecError::CorruptBlock);
                    }
                    for _ in 0..repeat {
                        lengths[filled] = previous;
                        filled += 1;
                    }
                }
                17 => {
                    let repeat = 3 + self.bits.next_bits_low_first(3)? as usize;
                    if filled + repeat > count {
                        return Err(CodecError::CorruptBlock);
                    }
                    filled += repeat;
                }
                18 => {
                    let repeat = 11 + self.bits.next_bits_low_first(7)? as usize;
                    if filled + repeat > count {
                        return Err(CodecError::CorruptBlock);
                    }
                    filled += repeat;
                }
                _ => return Err(CodecError::CorruptBlock),
            }
        }
        Ok(lengths)
    }

    fn block_body(&mut self, literal: &HuffmanTree, distance: &HuffmanTree) -> Result<()> {
        loop {
            let symbol = literal.decode(&mut self.bits)?;
            match symbol {
                0..=255 => self.push_output(symbol as u8),
                END_OF_BLOCK => return Ok(()),
                257..=285 => {
                    let index = (symbol - 257) as usize;
                    let extra = self.bits.next_bits_low_first(LENGTH_EXTRA[index])?;
                    let length = (LENGTH_OFFSET[index] + extra) as usize;

                    let dist_symbol = distance.decode(&mut self.bits)?;
                    if dist_symbol >= 30 {
                        return Err(CodecError::BadSymbol(dist_symbol));
                    }
                    let dist_index = dist_symbol as usize;
                    let extra = self.bits.next_bits_low_first(DIST_EXTRA[dist_index])?;
                    let dist = DIST_OFFSET[dist_index] as usize + extra as usize;

                    if dist > self.out.len() {
                        return Err(CodecError::BadDistance(dist));
                    }
                    // Byte-wise copy from the already produced output;
                    // overlapping runs (dist < length) must repeat.
                    let start = self.out.len() - dist;
                    for offset in 0..length {
                        let byte = self.out[start + offset];
                        self.push_output(byte);
                    }
                }
                _ => return Err(CodecError::BadSymbol(symbol)),
            }
        }
    }
}

impl Default for Inflater {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// zlib stream of "abc" in one stored block, assembled by hand:
    /// header 78 01, block 01 (final, stored), LEN/NLEN, payload,
    /// Adler-32 of "abc" big-endian.
    const STORED_ABC: [u8; 14] = [
        0x78, 0x01, 0x01, 0x03, 0x00, 0xFC, 0xFF, b'a', b'b', b'c', 0x02, 0x4D, 0x01, 0x27,
    ];

    #[test]
    fn stored_block_zlib_stream() {
        let mut inflater = Inflater::new();
        inflater.set_input(&STORED_ABC);
        assert!(inflater.needs_input());
        let out = inflater.inflate().unwrap();
        assert_eq!(out, b"abc");
        assert!(inflater.finished());
        assert_eq!(inflater.total_out(), 3);
        assert_eq!(inflater.total_in(), 14);
    }

    #[test]
    fn fixed_block_empty_raw_stream() {
        // BFINAL=1, BTYPE=01, then the 7-bit end-of-block code 0000000.
        let mut inflater = Inflater::raw();
        inflater.set_input(&[0x03, 0x00]);
        let out = inflater.inflate().unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn fixed_block_single_literal() {
        // BFINAL=1, BTYPE=01, literal 'a' (code 0x91, 8 bits), end code.
        let mut inflater = Inflater::raw();
        inflater.set_input(&[0x4B, 0x04, 0x00]);
        let out = inflater.inflate().unwrap();
        assert_eq!(out, b"a");
    }

    #[test]
    fn back_reference_repeats_output() {
        // Raw fixed block: literal 'x', then length 3 / distance 1,
        // then end of block. Length 3 is code 257 (7-bit 0000001),
        // distance 1 is fixed code 0 (5 bits).
        let mut bits = crate::io::BitWriter::new();
        bits.write_bit(1);
        bits.write_bits_low_first(1, 2);
        bits.write_code_high_first(0x30 + u32::from(b'x'), 8);
        bits.write_code_high_first(0b000_0001, 7);
        bits.write_code_high_first(0, 5);
        bits.write_code_high_first(0, 7);
        let mut inflater = Inflater::raw();
        inflater.set_input(&bits.into_bytes());
        let out = inflater.inflate().unwrap();
        assert_eq!(out, b"xxxx");
    }

    #[test]
    fn corrupt_header_taxonomy() {
        let mut inflater = Inflater::new();
        inflater.set_input(&[0x79, 0x01, 0x00]);
        assert!(matches!(
            inflater.inflate(),
            Err(CodecError::UnsupportedMethod(9))
        ));

        let mut inflater = Inflater::new();
        inflater.set_input(&[0x88, 0x98, 0x00]);
        assert!(matches!(inflater.inflate(), Err(CodecError::CorruptHeader)));

        let mut inflater = Inflater::new();
        // FDICT is inspected before the header check digits.
        inflater.set_input(&[0x78, 0x3C, 0x00]);
        assert!(matches!(
            inflater.inflate(),
            Err(CodecError::DictionaryUnsupported)
        ));

        let mut inflater = Inflater::new();
        inflater.set_input(&[0x78, 0x02, 0x00]);
        assert!(matches!(
            inflater.inflate(),
            Err(CodecError::HeaderChecksum)
        ));
    }

    #[test]
    fn reserved_block_type_is_corrupt() {
        // Raw stream, BFINAL=1, BTYPE=11.
        let mut inflater = Inflater::raw();
        inflater.set_input(&[0b0000_0111]);
        assert!(matches!(inflater.inflate(), Err(CodecError::CorruptBlock)));
    }

    #[test]
    fn stored_length_complement_is_verified() {
        let mut bad = STORED_ABC;
        bad[5] = 0xFB; // damage NLEN
        let mut inflater = Inflater::new();
        inflater.set_input(&bad);
        assert!(matches!(
            inflater.inflate(),
            Err(CodecError::StoredLengthMismatch)
        ));
    }

    #[test]
    fn trailer_checksum_is_verified() {
        let mut bad = STORED_ABC;
        bad[13] = 0x28; // damage the Adler trailer
        let mut inflater = Inflater::new();
        inflater.set_input(&bad);
        assert!(matches!(
            inflater.inflate(),
            Err(CodecError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn error_state_is_sticky_until_reset() {
        let mut inflater = Inflater::raw();
        inflater.set_input(&[0b0000_0111]);
        assert!(inflater.inflate().is_err());

        // The failure is replayed even for fresh input.
        inflater.set_input(&[0x03, 0x00]);
        assert!(matches!(inflater.inflate(), Err(CodecError::CorruptBlock)));

        inflater.reset();
        inflater.set_input(&[0x03, 0x00]);
        assert!(inflater.inflate().unwrap().is_empty());
    }

    #[test]
    fn distance_before_stream_start_is_rejected() {
        // Raw fixed block that opens with a match: no output exists yet.
        let mut bits = crate::io::BitWriter::new();
        bits.write_bit(1);
        bits.write_bits_low_first(1, 2);
        bits.write_code_high_first(0b000_0001, 7); // length 3
        bits.write_code_high_first(0, 5); // distance 1
        let mut inflater = Inflater::raw();
        inflater.set_input(&bits.into_bytes());
        assert!(matches!(
            inflater.inflate(),
            Err(CodecError::BadDistance(1))
        ));
    }
}
