//! In-memory stream
//!
//! A [`Stream`] over an owned byte buffer. In write mode the buffer grows
//! as needed; in read mode writes are rejected.

use super::{FileMode, IoError, Result, Stream};

/// A growable in-memory byte stream.
#[derive(Debug, Default)]
pub struct MemoryStream {
    data: Vec<u8>,
    position: u64,
    mode: Option<FileMode>,
}

impl MemoryStream {
    /// Creates an empty stream.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a stream over existing bytes.
    pub fn from_vec(data: Vec<u8>) -> Self {
        MemoryStream {
            data,
            position: 0,
            mode: None,
        }
    }

    /// Consumes the stream and returns the underlying buffer.
    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }

    /// Borrows the underlying buffer.
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    fn require_open(&self) -> Result<FileMode> {
        self.mode.ok_or(IoError::NotOpen)
    }
}

impl Stream for MemoryStream {
    fn open(&mut self, mode: FileMode) -> Result<()> {
        self.mode = Some(mode);
        self.position = 0;
        if mode == FileMode::Write {
            self.data.clear();
        }
        Ok(())
    }

    fn close(&mut self) {
        self.mode = None;
    }

    fn is_open(&self) -> bool {
        self.mode.is_some()
    }

    fn size(&self) -> u64 {
        self.data.len() as u64
    }

    fn read(&mut self, buffer: &mut [u8]) -> Result<usize> {
        let mode = self.require_open()?;
        if mode == FileMode::Write {
            return Err(IoError::WrongMode("reading"));
        }
        let start = self.position as usize;
        if start >= self.data.len() {
            return Ok(0);
        }
        let n = buffer.len().min(self.data.len() - start);
        buffer[..n].copy_from_slice(&self.data[start..start + n]);
        self.position += n as u64;
        Ok(n)
    }

    fn write(&mut self, buffer: &[u8]) -> Result<usize> {
        let mode = self.require_open()?;
        if mode == FileMode::Read {
            return Err(IoError::WrongMode("writing"));
        }
        let start = self.position as usize;
        let end = start + buffer.len();
        if end > self.data.len() {
            self.data.resize(end, 0);
        }
        self.data[start..end].copy_from_slice(buffer);
        self.position = end as u64;
        Ok(buffer.len())
    }

    fn seek(&mut self, position: u64) -> Result<()> {
        self.require_open()?;
        if position > self.data.len() as u64 {
            return Err(IoError::InvalidSeek(position));
        }
        self.position = position;
        Ok(())
    }

    fn move_by(&mut self, offset: i64) -> Result<()> {
        let target = self.position as i64 + offset;
        if target < 0 {
            return Err(IoError::InvalidSeek(0));
        }
        self.seek(target as u64)
    }

    fn position(&self) -> u64 {
        self.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_read_back() {
        let mut stream = MemoryStream::new();
        stream.open(FileMode::Write).unwrap();
        stream.write(b"hello ").unwrap();
        stream.write(b"stream").unwrap();
        assert_eq!(stream.size(), 12);
        stream.close();
        assert!(!stream.is_open());

        stream.open(FileMode::Read).unwrap();
        let mut buf = [0u8; 12];
        assert_eq!(stream.read_fully(&mut buf).unwrap(), 12);
        assert_eq!(&buf, b"hello stream");
        assert_eq!(stream.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn seek_and_overwrite() {
        let mut stream = MemoryStream::from_vec(b"abcdef".to_vec());
        stream.open(FileMode::ReadWrite).unwrap();
        stream.seek(2).unwrap();
        stream.write(b"XY").unwrap();
        assert_eq!(stream.position(), 4);
        stream.move_by(-4).unwrap();
        let mut buf = Vec::new();
        stream.read_to_end(&mut buf).unwrap();
        assert_eq!(buf, b"abXYef");
    }

    #[test]
    fn mode_violations_are_rejected() {
        let mut stream = MemoryStream::from_vec(vec![1, 2, 3]);
        assert!(matches!(
            stream.read(&mut [0u8; 2]),
            Err(IoError::NotOpen)
        ));
        stream.open(FileMode::Read).unwrap();
        assert!(matches!(
            stream.write(b"x"),
            Err(IoError::WrongMode(_))
        ));
        assert!(matches!(stream.seek(9), Err(IoError::InvalidSeek(9))));
    }
}
