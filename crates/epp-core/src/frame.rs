//! Frame encoding and decoding per RFC 5734 §4.
//!
//! Wire format:
//!
//! ```text
//! +----------------------+---------------------------+
//! | total length (u32 BE)| XML payload (length - 4)  |
//! +----------------------+---------------------------+
//! ```
//!
//! The length header counts itself, so an empty payload is encoded as
//! `00 00 00 04`.

use crate::{Error, Result};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Size of the length header in bytes.
pub const HEADER_LEN: usize = 4;

/// Largest total frame length accepted from a peer (16 MiB).
pub const MAX_FRAME_LEN: u32 = 16 * 1024 * 1024;

/// Read buffer size for the payload loop.
const READ_CHUNK: usize = 8 * 1024;

/// One length-prefixed EPP message unit.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Frame {
    payload: Vec<u8>,
}

impl Frame {
    /// Wraps a payload.
    pub fn new(payload: impl Into<Vec<u8>>) -> Self {
        Self {
            payload: payload.into(),
        }
    }

    /// Payload bytes, without the header.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Payload as UTF-8 XML text.
    ///
    /// # Errors
    ///
    /// Returns `Error::Interpretation` if the payload is not valid UTF-8.
    pub fn as_xml(&self) -> Result<&str> {
        std::str::from_utf8(&self.payload)
            .map_err(|e| Error::Interpretation(format!("response is not valid UTF-8: {e}")))
    }

    /// Total length value written into the header.
    ///
    /// # Errors
    ///
    /// Returns `Error::Framing` if the payload does not fit a u32 header.
    pub fn wire_len(&self) -> Result<u32> {
        self.payload
            .len()
            .checked_add(HEADER_LEN)
            .and_then(|total| u32::try_from(total).ok())
            .ok_or_else(|| {
                Error::Framing(format!(
                    "payload of {} bytes exceeds the 32-bit length header",
                    self.payload.len()
                ))
            })
    }

    /// Serialize frame to bytes (header followed by payload).
    pub fn serialize(&self) -> Result<Vec<u8>> {
        let total = self.wire_len()?;
        let mut buf = Vec::with_capacity(HEADER_LEN + self.payload.len());
        buf.extend_from_slice(&total.to_be_bytes());
        buf.extend_from_slice(&self.payload);
        Ok(buf)
    }

    /// Parse exactly one frame from `data`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Framing` if the header is short, declares less than
    /// its own size, or disagrees with the number of bytes supplied.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_LEN {
            return Err(Error::Framing(format!(
                "frame header needs {HEADER_LEN} bytes, got {}",
                data.len()
            )));
        }

        let length = payload_len(read_u32_be(&data[..HEADER_LEN]))?;
        let body = &data[HEADER_LEN..];
        if body.len() != length {
            return Err(Error::Framing(format!(
                "declared payload length {length} does not match {} bytes supplied",
                body.len()
            )));
        }

        Ok(Self::new(body))
    }
}

/// Writes `payload` as one frame.
///
/// Header and payload go out in a single `write_all` followed by a flush, so
/// callers never observe a partially written frame.
///
/// # Errors
///
/// Returns `Error::Framing` for oversized payloads and `Error::Io` if the
/// underlying write fails.
pub async fn write_frame<W>(writer: &mut W, payload: &[u8]) -> Result<()>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let data = Frame::new(payload).serialize()?;

    writer
        .write_all(&data)
        .await
        .map_err(|e| Error::Io(format!("failed to write frame: {e}")))?;
    writer
        .flush()
        .await
        .map_err(|e| Error::Io(format!("failed to flush frame: {e}")))?;

    Ok(())
}

/// Reads one frame.
///
/// There is no timeout here; the caller wraps this in its own deadline.
///
/// # Errors
///
/// Returns `Error::Framing` if the header cannot be read in full, declares
/// an invalid length, or the stream ends before the payload is complete.
pub async fn read_frame<R>(reader: &mut R) -> Result<Frame>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut header = [0u8; HEADER_LEN];
    reader
        .read_exact(&mut header)
        .await
        .map_err(|e| Error::Framing(format!("failed to read frame header: {e}")))?;

    let length = payload_len(u32::from_be_bytes(header))?;

    let mut payload = Vec::with_capacity(length.min(READ_CHUNK));
    let mut chunk = [0u8; READ_CHUNK];
    while payload.len() < length {
        let want = (length - payload.len()).min(READ_CHUNK);
        let n = reader.read(&mut chunk[..want]).await.map_err(|e| {
            Error::Framing(format!(
                "incomplete frame: read failed after {} of {length} bytes: {e}",
                payload.len()
            ))
        })?;
        if n == 0 {
            return Err(Error::Framing(format!(
                "incomplete frame: stream closed after {} of {length} bytes",
                payload.len()
            )));
        }
        payload.extend_from_slice(&chunk[..n]);
    }

    Ok(Frame { payload })
}

/// Validates a header value and returns the payload length it implies.
fn payload_len(total: u32) -> Result<usize> {
    if total < HEADER_LEN as u32 {
        return Err(Error::Framing(format!(
            "declared frame length {total} is smaller than the {HEADER_LEN}-byte header"
        )));
    }
    if total > MAX_FRAME_LEN {
        return Err(Error::Framing(format!(
            "declared frame length {total} exceeds maximum {MAX_FRAME_LEN}"
        )));
    }
    Ok((total as usize) - HEADER_LEN)
}

#[inline]
fn read_u32_be(data: &[u8]) -> u32 {
    u32::from_be_bytes([data[0], data[1], data[2], data[3]])
}
