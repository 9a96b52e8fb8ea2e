//! # I/O Layer
//!
//! The stream abstraction consumed by the codec and the object model, an
//! in-memory stream implementation, the endian serializer family and the
//! bit-level reader/writer shared by the DEFLATE halves.

pub mod bits;
pub mod memory;
pub mod serializer;

use thiserror::Error;

pub use bits::{BitIoError, BitReader, BitWriter};
pub use memory::MemoryStream;

/// Mode for opening streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileMode {
    /// Open for reading only.
    Read,
    /// Open for writing only.
    Write,
    /// Open for reading and writing.
    ReadWrite,
}

/// Stream error types
#[derive(Debug, Error)]
pub enum IoError {
    /// Underlying operating-system failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream is not open.
    #[error("stream is not open")]
    NotOpen,

    /// The operation conflicts with the mode the stream was opened in.
    #[error("stream is not open for {0}")]
    WrongMode(&'static str),

    /// A seek target lies outside the stream.
    #[error("seek position {0} is outside the stream")]
    InvalidSeek(u64),

    /// Structured data in the stream could not be decoded.
    #[error("malformed stream content: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Result type for stream operations
pub type Result<T> = std::result::Result<T, IoError>;

/// Abstraction for manipulating data streams through a unified interface.
///
/// The stream itself can be a byte buffer, a file or anything else; the
/// codec and the preference store only rely on this surface.
pub trait Stream {
    /// Opens the stream for the given mode.
    fn open(&mut self, mode: FileMode) -> Result<()>;

    /// Closes the stream and releases any resources. Idempotent.
    fn close(&mut self);

    /// True while the stream is open.
    fn is_open(&self) -> bool;

    /// Length of the stream in bytes.
    fn size(&self) -> u64;

    /// Reads up to `buffer.len()` bytes. Returns the number of bytes
    /// actually read; 0 signals the end of the stream.
    fn read(&mut self, buffer: &mut [u8]) -> Result<usize>;

    /// Writes the buffer. Returns the number of bytes written.
    fn write(&mut self, buffer: &[u8]) -> Result<usize>;

    /// Moves the cursor to `position`, counted from the stream start.
    fn seek(&mut self, position: u64) -> Result<()>;

    /// Moves the cursor by `offset` relative to the current position.
    fn move_by(&mut self, offset: i64) -> Result<()>;

    /// Current cursor position.
    fn position(&self) -> u64;

    /// Reads until `buffer` is full or the stream ends. Returns the
    /// number of bytes read, which is less than `buffer.len()` only at
    /// the end of the stream.
    fn read_fully(&mut self, buffer: &mut [u8]) -> Result<usize> {
        let mut filled = 0;
        while filled < buffer.len() {
            let n = self.read(&mut buffer[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        Ok(filled)
    }

    /// Reads everything from the current position to the stream end.
    fn read_to_end(&mut self, out: &mut Vec<u8>) -> Result<usize> {
        let mut chunk = [0u8; 4096];
        let mut total = 0;
        loop {
            let n = self.read(&mut chunk)?;
            if n == 0 {
                break;
            }
            out.extend_from_slice(&chunk[..n]);
            total += n;
        }
        Ok(total)
    }
}
