//! Wire format: netstring-framed messages carrying a fixed binary header.
//!
//! ```text
//! tag         : u16   (reserved values in Tag; >= 1024 are user tags)
//! src_rank    : u16
//! serial      : u64   (per-sender monotonic)
//! payload_len : u32
//! ```
//! Payload bytes follow immediately; `(header || payload)` is wrapped in one
//! netstring (`<len>:<payload>,`).

use crate::{errors::Error, tag::Tag};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

const HEADER_LEN: usize = 2 + 2 + 8 + 4;

/// A framed message as it travels on the wire.
#[derive(Debug, Clone)]
pub struct Frame {
    /// The message tag.
    pub tag: Tag,
    /// The sender's rank.
    pub src_rank: u32,
    /// Per-sender monotonic serial number.
    pub serial: u64,
    /// Opaque payload bytes.
    pub payload: Vec<u8>,
}

impl Frame {
    fn header_bytes(&self) -> [u8; HEADER_LEN] {
        let mut buf = [0u8; HEADER_LEN];
        buf[0..2].copy_from_slice(&self.tag.0.to_be_bytes());
        buf[2..4].copy_from_slice(&(self.src_rank as u16).to_be_bytes());
        buf[4..12].copy_from_slice(&self.serial.to_be_bytes());
        buf[12..16].copy_from_slice(&(self.payload.len() as u32).to_be_bytes());
        buf
    }
}

/// Writes one netstring-framed message.
pub async fn write_frame<W: AsyncWrite + Unpin>(writer: &mut W, frame: &Frame) -> Result<(), Error> {
    let header = frame.header_bytes();
    let total_len = header.len() + frame.payload.len();
    let preamble = format!("{total_len}:");
    writer.write_all(preamble.as_bytes()).await?;
    writer.write_all(&header).await?;
    writer.write_all(&frame.payload).await?;
    writer.write_all(b",").await?;
    writer.flush().await?;
    Ok(())
}

/// Reads one netstring-framed message.
pub async fn read_frame<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Frame, Error> {
    let mut len_digits = Vec::new();
    loop {
        let mut byte = [0u8; 1];
        let n = reader.read(&mut byte).await?;
        if n == 0 {
            return Err(Error::Io(std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "connection closed")));
        }
        if byte[0] == b':' {
            break;
        }
        if !byte[0].is_ascii_digit() || len_digits.len() > 18 {
            return Err(Error::ProtocolError("malformed netstring length prefix".into()));
        }
        len_digits.push(byte[0]);
    }
    let total_len: usize = std::str::from_utf8(&len_digits)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| Error::ProtocolError("malformed netstring length prefix".into()))?;
    if total_len < HEADER_LEN {
        return Err(Error::ProtocolError("frame shorter than header".into()));
    }
    let mut body = vec![0u8; total_len];
    reader.read_exact(&mut body).await?;
    let mut trailer = [0u8; 1];
    reader.read_exact(&mut trailer).await?;
    if trailer[0] != b',' {
        return Err(Error::ProtocolError("missing netstring trailer".into()));
    }

    let tag = Tag(u16::from_be_bytes([body[0], body[1]]));
    let src_rank = u16::from_be_bytes([body[2], body[3]]) as u32;
    let serial = u64::from_be_bytes(body[4..12].try_into().expect("8 bytes"));
    let payload_len = u32::from_be_bytes(body[12..16].try_into().expect("4 bytes")) as usize;
    let payload = body[HEADER_LEN..].to_vec();
    if payload.len() != payload_len {
        return Err(Error::ProtocolError("payload length mismatch".into()));
    }
    Ok(Frame { tag, src_rank, serial, payload })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn round_trips_a_frame() {
        let frame = Frame { tag: Tag::BARRIER, src_rank: 2, serial: 7, payload: b"hello".to_vec() };
        let mut buffer = Vec::new();
        write_frame(&mut buffer, &frame).await.unwrap();

        let mut cursor = std::io::Cursor::new(buffer);
        let read_back = read_frame(&mut cursor).await.unwrap();
        assert_eq!(read_back.tag, frame.tag);
        assert_eq!(read_back.src_rank, frame.src_rank);
        assert_eq!(read_back.serial, frame.serial);
        assert_eq!(read_back.payload, frame.payload);
    }

    #[tokio::test]
    async fn rejects_malformed_length_prefix() {
        let mut cursor = std::io::Cursor::new(b"notanumber:".to_vec());
        assert!(read_frame(&mut cursor).await.is_err());
    }
}
