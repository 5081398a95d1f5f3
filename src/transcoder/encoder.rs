//! Sequential container writer

use crate::error::Result;
use crate::transcoder::codec::{encode_header, encode_record_into};
use crate::transcoder::constants::HEADER_SIZE;
use crate::transcoder::layout::ProtocolVersion;
use bytes::BytesMut;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::debug;

/// Appends current-layout records to a byte sink
///
/// The header is written as soon as the encoder is constructed, so an encoder
/// that is closed without any writes still leaves a valid, empty container.
/// A single encoder is meant to be driven by one writer at a time.
pub struct Encoder<W: Write> {
    writer: W,
    scratch: BytesMut,
    total_bytes: u64,
    records_written: u64,
}

impl Encoder<BufWriter<File>> {
    /// Create (or truncate) a container file at `path`
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path)?;
        debug!(path = %path.display(), "Created container file");
        Self::new(BufWriter::new(file))
    }
}

impl<W: Write> Encoder<W> {
    /// Wrap `writer` and immediately write a current-version header
    pub fn new(mut writer: W) -> Result<Self> {
        writer.write_all(&encode_header(ProtocolVersion::Current))?;
        Ok(Self {
            writer,
            scratch: BytesMut::new(),
            total_bytes: HEADER_SIZE as u64,
            records_written: 0,
        })
    }

    /// Append one record and return the number of bytes it occupied
    ///
    /// `timestamp` is in whole seconds since the Unix epoch.
    pub fn write(&mut self, timestamp: i64, payload: &[u8], key: Option<&[u8]>) -> Result<u64> {
        self.scratch.clear();
        encode_record_into(&mut self.scratch, timestamp, key, payload)?;
        self.writer.write_all(&self.scratch)?;

        let written = self.scratch.len() as u64;
        self.total_bytes += written;
        self.records_written += 1;
        Ok(written)
    }

    /// Total bytes written so far, header included
    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    /// Number of records appended so far
    pub fn records_written(&self) -> u64 {
        self.records_written
    }

    /// Flush buffered bytes to the underlying sink
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    /// Flush and hand back the underlying sink
    pub fn into_inner(mut self) -> Result<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }

    /// Finalize the container and release the sink
    pub fn close(self) -> Result<()> {
        let total_bytes = self.total_bytes;
        let records = self.records_written;
        drop(self.into_inner()?);
        debug!(bytes = total_bytes, records = records, "Closed container encoder");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_new_writes_header() {
        let encoder = Encoder::new(Vec::new()).unwrap();
        assert_eq!(encoder.total_bytes(), 20);

        let bytes = encoder.into_inner().unwrap();
        assert_eq!(bytes.len(), 20);
        assert_eq!(&bytes[..4], &2i32.to_be_bytes());
        assert!(bytes[4..].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_write_returns_entry_size() {
        let mut encoder = Encoder::new(Vec::new()).unwrap();

        let written = encoder
            .write(1706872530, b"Hello, World!", Some(b"user-123".as_slice()))
            .unwrap();
        assert_eq!(written, 45);
        assert_eq!(encoder.total_bytes(), 65);

        let written = encoder.write(1706872530, b"Hello, World!", None).unwrap();
        assert_eq!(written, 37);
        assert_eq!(encoder.total_bytes(), 102);
        assert_eq!(encoder.records_written(), 2);
    }

    #[test]
    fn test_total_bytes_matches_sink() {
        let mut encoder = Encoder::new(Vec::new()).unwrap();
        for i in 0..10 {
            let payload = format!("message-{}", i);
            encoder
                .write(i, payload.as_bytes(), Some(b"key".as_slice()))
                .unwrap();
        }
        let total = encoder.total_bytes();
        let bytes = encoder.into_inner().unwrap();
        assert_eq!(bytes.len() as u64, total);
    }

    #[test]
    fn test_create_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("messages.bin");

        let mut encoder = Encoder::create(&path).unwrap();
        encoder.write(1, b"payload", None).unwrap();
        let total = encoder.total_bytes();
        encoder.close().unwrap();

        let metadata = std::fs::metadata(&path).unwrap();
        assert_eq!(metadata.len(), total);
    }

    #[test]
    fn test_write_error_propagates() {
        struct FailingWriter;

        impl Write for FailingWriter {
            fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
                Err(std::io::Error::other("disk full"))
            }

            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        assert!(Encoder::new(FailingWriter).is_err());
    }
}
