//! Sequential container reader

use crate::error::Result;
use crate::transcoder::codec::decode_header;
use crate::transcoder::constants::HEADER_SIZE;
use crate::transcoder::entry::Entry;
use crate::transcoder::layout::{ProtocolVersion, RecordLayout};
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;
use tracing::debug;

/// Reads records from a container, one at a time
///
/// The header is parsed once on construction; the record layout it selects
/// is applied to every record in the container.
pub struct Decoder<R: Read + Seek> {
    reader: R,
    version: ProtocolVersion,
    layout: &'static dyn RecordLayout,
    data_start: u64,
    records_read: u64,
}

impl Decoder<BufReader<File>> {
    /// Open a container file at `path`
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let decoder = Self::new(BufReader::new(file))?;
        debug!(
            path = %path.display(),
            version = %decoder.version(),
            "Opened container file"
        );
        Ok(decoder)
    }
}

impl<R: Read + Seek> Decoder<R> {
    /// Read and validate the header at the reader's current position
    pub fn new(mut reader: R) -> Result<Self> {
        let start = reader.stream_position()?;
        let version = decode_header(&mut reader)?;

        Ok(Self {
            reader,
            version,
            layout: version.layout(),
            data_start: start + HEADER_SIZE as u64,
            records_read: 0,
        })
    }

    /// Read the next record
    ///
    /// `Ok(None)` marks the end of the container and repeats on every later
    /// call. A container that ends inside a record yields
    /// [`FramingError::Truncated`](crate::error::FramingError::Truncated).
    pub fn read(&mut self) -> Result<Option<Entry>> {
        let entry = self.layout.read_record(&mut self.reader)?;
        if entry.is_some() {
            self.records_read += 1;
        }
        Ok(entry)
    }

    /// Rewind to the first record
    pub fn reset(&mut self) -> Result<()> {
        self.reader.seek(SeekFrom::Start(self.data_start))?;
        Ok(())
    }

    /// Protocol version detected from the header
    pub fn version(&self) -> ProtocolVersion {
        self.version
    }

    /// Absolute position of the first record
    pub fn data_start(&self) -> u64 {
        self.data_start
    }

    /// Current absolute read position
    pub fn position(&mut self) -> Result<u64> {
        Ok(self.reader.stream_position()?)
    }

    /// Records returned since construction, across resets
    pub fn records_read(&self) -> u64 {
        self.records_read
    }

    /// Hand back the underlying reader
    pub fn into_inner(self) -> R {
        self.reader
    }

    /// Release the underlying reader
    pub fn close(self) -> Result<()> {
        debug!(records = self.records_read, "Closed container decoder");
        drop(self.reader);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{FramingError, ReplayError};
    use crate::transcoder::codec::encode_header;
    use crate::transcoder::Encoder;
    use std::io::Cursor;

    fn container(entries: &[Entry]) -> Vec<u8> {
        let mut encoder = Encoder::new(Vec::new()).unwrap();
        for entry in entries {
            encoder
                .write(entry.timestamp, &entry.payload, entry.key.as_deref())
                .unwrap();
        }
        encoder.into_inner().unwrap()
    }

    #[test]
    fn test_new_detects_version() {
        let bytes = container(&[]);
        let decoder = Decoder::new(Cursor::new(bytes)).unwrap();
        assert_eq!(decoder.version(), ProtocolVersion::Current);
        assert_eq!(decoder.data_start(), 20);
    }

    #[test]
    fn test_new_rejects_unknown_version() {
        let mut bytes = encode_header(ProtocolVersion::Current).to_vec();
        bytes[..4].copy_from_slice(&999i32.to_be_bytes());
        let result = Decoder::new(Cursor::new(bytes));
        assert!(matches!(
            result,
            Err(ReplayError::Framing(FramingError::UnsupportedVersion(999)))
        ));
    }

    #[test]
    fn test_read_sequence_then_end() {
        let entries = vec![
            Entry::with_key(1706872530, "user-123", "Hello, World!"),
            Entry::new(1706872531, ""),
            Entry::with_key(1706872532, "k", "third"),
        ];
        let mut decoder = Decoder::new(Cursor::new(container(&entries))).unwrap();

        for expected in &entries {
            assert_eq!(decoder.read().unwrap().as_ref(), Some(expected));
        }
        assert!(decoder.read().unwrap().is_none());
        // end of container is sticky
        assert!(decoder.read().unwrap().is_none());
        assert_eq!(decoder.records_read(), 3);
    }

    #[test]
    fn test_reset_rewinds_to_first_record() {
        let entries = vec![Entry::new(10, "first"), Entry::new(11, "second")];
        let mut decoder = Decoder::new(Cursor::new(container(&entries))).unwrap();

        let first = decoder.read().unwrap();
        decoder.read().unwrap();
        assert!(decoder.read().unwrap().is_none());

        decoder.reset().unwrap();
        assert_eq!(decoder.position().unwrap(), 20);
        assert_eq!(decoder.read().unwrap(), first);
    }

    #[test]
    fn test_data_start_honors_initial_offset() {
        let mut bytes = vec![0xFFu8; 7];
        bytes.extend(container(&[Entry::new(1, "x")]));

        let mut cursor = Cursor::new(bytes);
        cursor.set_position(7);
        let mut decoder = Decoder::new(cursor).unwrap();
        assert_eq!(decoder.data_start(), 27);

        let first = decoder.read().unwrap();
        decoder.reset().unwrap();
        assert_eq!(decoder.read().unwrap(), first);
    }

    #[test]
    fn test_truncated_record_is_not_end_of_container() {
        let mut bytes = container(&[Entry::new(1, "complete"), Entry::new(2, "cut off")]);
        bytes.truncate(bytes.len() - 3);

        let mut decoder = Decoder::new(Cursor::new(bytes)).unwrap();
        assert!(decoder.read().unwrap().is_some());
        let err = decoder.read().unwrap_err();
        assert!(matches!(
            err,
            ReplayError::Framing(FramingError::Truncated { .. })
        ));
    }

    #[test]
    fn test_legacy_container() {
        let mut bytes = encode_header(ProtocolVersion::Legacy).to_vec();
        for (ts, payload) in [(100i64, &b"one"[..]), (101, &b""[..])] {
            bytes.extend_from_slice(&ts.to_be_bytes());
            bytes.extend_from_slice(&(payload.len() as i64).to_be_bytes());
            bytes.extend_from_slice(payload);
        }

        let mut decoder = Decoder::new(Cursor::new(bytes)).unwrap();
        assert_eq!(decoder.version(), ProtocolVersion::Legacy);
        assert_eq!(decoder.read().unwrap(), Some(Entry::new(100, "one")));
        assert_eq!(decoder.read().unwrap(), Some(Entry::new(101, "")));
        assert!(decoder.read().unwrap().is_none());
    }
}
