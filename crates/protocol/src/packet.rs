//! # Packet Framing
//!
//! Uncompressed Minecraft packets are framed as:
//!
//! ```text
//! {VARINT length}{VARINT packet_id}{payload...}
//! ```
//!
//! where `length` covers the packet id and the payload.
//!
//! A [`Packet`] keeps the exact frame bytes it was read from, so a packet can be
//! replayed or echoed byte-identical even if the sender used a non-minimal
//! length prefix.
//!
//! # Reading
//!
//! [`Packet::read_from`] reads straight from the socket without a buffered
//! reader. The stream may be handed to a raw byte relay right after the last
//! handshake packet, so nothing past the end of the current frame may be
//! consumed.

use crate::codecs::{read_varint, write_varint, varint_len, MAX_VARINT_LEN};
use bytes::{Bytes, BytesMut};
use mcproxy_core::{ProxyError, Result};
use std::io::ErrorKind;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Largest frame body accepted (the largest value a 3-byte VarInt can hold)
pub const MAX_PACKET_LEN: usize = 2_097_151;

/// Most a single body read may grow the frame buffer by
const READ_CHUNK: usize = 4096;

/// A single framed packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Packet ID
    id: i32,

    /// Payload after the packet ID
    payload: Bytes,

    /// Complete frame, length prefix included
    frame: Bytes,
}

impl Packet {
    /// Build a packet from an ID and payload, producing a minimal length prefix
    pub fn new(id: i32, payload: impl Into<Bytes>) -> Self {
        let payload = payload.into();
        let body_len = varint_len(id) + payload.len();

        let mut frame = BytesMut::with_capacity(varint_len(body_len as i32) + body_len);
        write_varint(&mut frame, body_len as i32);
        write_varint(&mut frame, id);
        frame.extend_from_slice(&payload);

        Self {
            id,
            payload,
            frame: frame.freeze(),
        }
    }

    /// Read one packet from a stream
    ///
    /// # Errors
    /// - `MalformedPacket` if the length prefix is invalid, too large, or the
    ///   stream ends in the middle of the frame
    /// - `Io` for any other socket error, including an `UnexpectedEof` when the
    ///   peer closes before sending the first byte of a frame
    pub async fn read_from<R>(reader: &mut R) -> Result<Self>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        let mut prefix = [0u8; MAX_VARINT_LEN];
        let mut prefix_len = 0;
        let mut declared: u32 = 0;

        loop {
            if prefix_len == MAX_VARINT_LEN {
                return Err(ProxyError::malformed("Packet length VarInt is too big"));
            }
            let byte = match reader.read_u8().await {
                Ok(byte) => byte,
                // A clean close between frames is reported as plain EOF
                Err(e) if prefix_len == 0 => return Err(ProxyError::Io(e)),
                Err(e) => return Err(truncated(e)),
            };
            prefix[prefix_len] = byte;
            declared |= ((byte & 0x7F) as u32) << (7 * prefix_len);
            prefix_len += 1;
            if byte & 0x80 == 0 {
                break;
            }
        }

        let declared = declared as i32;
        if declared <= 0 || declared as usize > MAX_PACKET_LEN {
            return Err(ProxyError::malformed(format!("Invalid packet length: {}", declared)));
        }

        let mut frame = BytesMut::with_capacity(prefix_len + (declared as usize).min(READ_CHUNK));
        frame.extend_from_slice(&prefix[..prefix_len]);
        read_body(reader, &mut frame, declared as usize).await?;

        let frame = frame.freeze();
        let body = frame.slice(prefix_len..);
        Self::from_parts(frame, body)
    }

    fn from_parts(frame: Bytes, mut body: Bytes) -> Result<Self> {
        let id = read_varint(&mut body)?;
        Ok(Self {
            id,
            payload: body,
            frame,
        })
    }

    /// Write the frame exactly as stored
    pub async fn write_to<W>(&self, writer: &mut W) -> Result<()>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        writer.write_all(&self.frame).await?;
        Ok(())
    }

    /// Packet ID
    pub fn id(&self) -> i32 {
        self.id
    }

    /// Payload (everything after the packet ID)
    ///
    /// The returned `Bytes` is a cheap clone and can be consumed by the
    /// `read_*` codecs.
    pub fn payload(&self) -> Bytes {
        self.payload.clone()
    }

    /// Complete frame bytes, length prefix included
    pub fn frame(&self) -> &[u8] {
        &self.frame
    }

    /// Fail with `MalformedPacket` unless this packet has the expected ID
    pub fn expect_id(&self, expected: i32, name: &str) -> Result<()> {
        if self.id != expected {
            return Err(ProxyError::malformed(format!(
                "Expected {} packet (id 0x{:02x}), got id 0x{:02x}",
                name, expected, self.id
            )));
        }
        Ok(())
    }
}

/// Append exactly `len` more bytes from `reader` to `frame`
///
/// The buffer grows with the bytes that actually arrived, never with the
/// declared length alone.
async fn read_body<R>(reader: &mut R, frame: &mut BytesMut, len: usize) -> Result<()>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let target = frame.len() + len;
    while frame.len() < target {
        frame.reserve((target - frame.len()).min(READ_CHUNK));
        let mut limited = (&mut *reader).take((target - frame.len()) as u64);
        let read = limited.read_buf(frame).await.map_err(truncated)?;
        if read == 0 {
            return Err(truncated(ErrorKind::UnexpectedEof.into()));
        }
    }
    Ok(())
}

/// EOF mid-frame means the client sent a truncated packet
fn truncated(err: std::io::Error) -> ProxyError {
    if err.kind() == ErrorKind::UnexpectedEof {
        ProxyError::malformed("Connection closed in the middle of a packet")
    } else {
        ProxyError::Io(err)
    }
}
