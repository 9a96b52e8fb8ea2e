//! # Compression Module
//!
//! A self-contained DEFLATE codec: [`Inflater`] decompresses RFC 1950
//! (zlib-wrapped) and raw RFC 1951 streams, [`Deflater`] produces them.
//! Both halves share the canonical Huffman machinery and the Adler-32
//! checksum used by the zlib envelope.
//!
//! A codec instance moves into a permanent error state on the first
//! corrupt-input failure and rejects further work until reset.

pub mod checksum;
pub mod deflate;
pub mod huffman;
pub mod inflate;

use thiserror::Error;

use crate::io::BitIoError;

pub use checksum::{adler32, Adler32};
pub use deflate::Deflater;
pub use huffman::HuffmanTree;
pub use inflate::Inflater;

/// Codec error types
///
/// Every variant is a hard, non-recoverable error: the codec instance
/// that raised it stays in the failed state until it is reset. The enum
/// is `Clone` so the sticky state can re-surface the original failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The two-byte zlib header is malformed.
    #[error("corrupt zlib header")]
    CorruptHeader,

    /// The header names a compression method other than deflate.
    #[error("unsupported compression method {0}")]
    UnsupportedMethod(u8),

    /// The header requires a preset dictionary, which is not supported.
    #[error("preset dictionaries are not supported")]
    DictionaryUnsupported,

    /// The zlib header check (`(CMF * 256 + FLG) mod 31`) failed.
    #[error("zlib header check failed")]
    HeaderChecksum,

    /// The Adler-32 trailer does not match the decompressed output.
    #[error("checksum mismatch: stored {stored:#010x}, computed {computed:#010x}")]
    ChecksumMismatch {
        /// Checksum carried in the stream trailer.
        stored: u32,
        /// Checksum computed over the produced output.
        computed: u32,
    },

    /// A block header carried the reserved type `BTYPE = 3`.
    #[error("corrupt block header")]
    CorruptBlock,

    /// A stored block's length and one's-complement length disagree.
    #[error("stored block length complement mismatch")]
    StoredLengthMismatch,

    /// A back reference points before the start of the output stream.
    #[error("back reference distance {0} reaches before the output start")]
    BadDistance(usize),

    /// A decoded symbol lies outside the literal/length alphabet.
    #[error("symbol {0} is outside the expected alphabet")]
    BadSymbol(u16),

    /// A Huffman code length exceeds the 15-bit limit.
    #[error("huffman code longer than 15 bits")]
    CodeTooLong,

    /// The code length set assigns more codes than the code space holds.
    #[error("huffman code space is over-subscribed")]
    OverSubscribed,

    /// More bits were consumed than any code in the tree is long.
    #[error("undecodable huffman code")]
    BadCode,

    /// The bit stream ended inside a structure.
    #[error(transparent)]
    Bits(#[from] BitIoError),
}

/// Result type for codec operations
pub type Result<T> = std::result::Result<T, CodecError>;

/// End-of-block symbol in the literal/length alphabet.
pub(crate) const END_OF_BLOCK: u16 = 256;

/// Extra bits per length code 257..=285 (RFC 1951, 3.2.5).
pub(crate) const LENGTH_EXTRA: [u8; 29] = [
    0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 2, 2, 2, 2, 3, 3, 3, 3, 4, 4, 4, 4, 5, 5, 5, 5, 0,
];

/// Base length per length code 257..=285.
pub(crate) const LENGTH_OFFSET: [u16; 29] = [
    3, 4, 5, 6, 7, 8, 9, 10, 11, 13, 15, 17, 19, 23, 27, 31, 35, 43, 51, 59, 67, 83, 99, 115,
    131, 163, 195, 227, 258,
];

/// Extra bits per distance code 0..=29.
pub(crate) const DIST_EXTRA: [u8; 30] = [
    0, 0, 0, 0, 1, 1, 2, 2, 3, 3, 4, 4, 5, 5, 6, 6, 7, 7, 8, 8, 9, 9, 10, 10, 11, 11, 12, 12,
    13, 13,
];

/// Base distance per distance code 0..=29.
pub(crate) const DIST_OFFSET: [u16; 30] = [
    1, 2, 3, 4, 5, 7, 9, 13, 17, 25, 33, 49, 65, 97, 129, 193, 257, 385, 513, 769, 1025, 1537,
    2049, 3073, 4097, 6145, 8193, 12289, 16385, 24577,
];

/// Transmission order of the code-length code lengths (RFC 1951, 3.2.7).
pub(crate) const CODE_LENGTH_ORDER: [usize; 19] = [
    16, 17, 18, 0, 8, 7, 9, 6, 10, 5, 11, 4, 12, 3, 13, 2, 14, 1, 15,
];

/// Maps a match length in `[3..=258]` to its length code and extra bits.
/// Returns `(symbol, extra_bit_count, extra_value)`.
pub(crate) fn length_to_code(length: u16) -> (u16, u8, u16) {
    debug_assert!((3..=258).contains(&length));
    let mut idx = 0;
    for (i, &base) in LENGTH_OFFSET.iter().enumerate() {
        if base <= length {
            idx = i;
        } else {
            break;
        }
    }
    (257 + idx as u16, LENGTH_EXTRA[idx], length - LENGTH_OFFSET[idx])
}

/// Maps a match distance in `[1..=32768]` to its distance code and extra
/// bits. Returns `(symbol, extra_bit_count, extra_value)`.
pub(crate) fn distance_to_code(distance: u16) -> (u16, u8, u16) {
    debug_assert!(distance >= 1);
    let mut idx = 0;
    for (i, &base) in DIST_OFFSET.iter().enumerate() {
        if base <= distance {
            idx = i;
        } else {
            break;
        }
    }
    (idx as u16, DIST_EXTRA[idx], distance - DIST_OFFSET[idx])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_codes_cover_the_rfc_table() {
        assert_eq!(length_to_code(3), (257, 0, 0));
        assert_eq!(length_to_code(10), (264, 0, 0));
        assert_eq!(length_to_code(11), (265, 1, 0));
        assert_eq!(length_to_code(12), (265, 1, 1));
        assert_eq!(length_to_code(130), (284, 5, 15));
        assert_eq!(length_to_code(257), (284, 5, 30));
        assert_eq!(length_to_code(258), (285, 0, 0));
    }

    #[test]
    fn distance_codes_cover_the_rfc_table() {
        assert_eq!(distance_to_code(1), (0, 0, 0));
        assert_eq!(distance_to_code(4), (3, 0, 0));
        assert_eq!(distance_to_code(5), (4, 1, 0));
        assert_eq!(distance_to_code(6), (4, 1, 1));
        assert_eq!(distance_to_code(24577), (29, 13, 0));
        assert_eq!(distance_to_code(32768), (29, 13, 8191));
    }
}
