//! Print the records of a container

use crate::error::{ReplayError, Result};
use crate::transcoder::{contains_bytes, Decoder, Entry};
use bytes::Bytes;
use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};
use std::io::{Read, Seek, Write};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Output format for [`cat`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatFormat {
    /// One JSON object per line
    #[default]
    Json,
    /// Payload bytes followed by a newline
    Raw,
}

#[derive(Debug, Clone, Default)]
pub struct CatConfig {
    pub format: CatFormat,
    /// Only print payloads containing this byte sequence
    pub find: Option<Bytes>,
    /// Count matching records without printing them
    pub count_only: bool,
}

#[derive(Serialize)]
struct CatLine<'a> {
    timestamp: String,
    key: Option<std::borrow::Cow<'a, str>>,
    data: std::borrow::Cow<'a, str>,
}

impl<'a> CatLine<'a> {
    fn from_entry(entry: &'a Entry) -> Self {
        let timestamp = match entry.datetime() {
            Some(dt) => dt.to_rfc3339_opts(SecondsFormat::Secs, true),
            None => entry.timestamp.to_string(),
        };
        Self {
            timestamp,
            key: entry.key.as_deref().map(String::from_utf8_lossy),
            data: String::from_utf8_lossy(&entry.payload),
        }
    }
}

/// Write every matching record of `decoder` to `output`
///
/// Returns the number of matching records. The decoder is closed on return.
pub fn cat<R, W>(
    mut decoder: Decoder<R>,
    config: &CatConfig,
    mut output: W,
    cancel: &CancellationToken,
) -> Result<u64>
where
    R: Read + Seek,
    W: Write,
{
    let mut count = 0u64;
    let result = loop {
        if cancel.is_cancelled() {
            break Err(ReplayError::Cancelled);
        }
        let entry = match decoder.read() {
            Ok(Some(entry)) => entry,
            Ok(None) => break Ok(()),
            Err(e) => break Err(e),
        };

        if let Some(needle) = config.find.as_deref() {
            if !contains_bytes(&entry.payload, needle) {
                continue;
            }
        }
        count += 1;
        if config.count_only {
            continue;
        }

        if let Err(e) = write_entry(&mut output, &entry, config.format) {
            break Err(e);
        }
    };

    let result = result.and_then(|()| output.flush().map_err(ReplayError::from));
    decoder.close()?;
    debug!(records = count, "Cat finished");
    result.map(|()| count)
}

fn write_entry<W: Write>(output: &mut W, entry: &Entry, format: CatFormat) -> Result<()> {
    match format {
        CatFormat::Json => {
            serde_json::to_writer(&mut *output, &CatLine::from_entry(entry))?;
        }
        CatFormat::Raw => output.write_all(&entry.payload)?,
    }
    output.write_all(b"\n")?;
    Ok(())
}
