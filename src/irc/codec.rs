/// IRC line codec for the client connection.
///
/// Frames the byte stream into [`Message`]s. Outgoing lines are terminated
/// with `\r\n`; incoming lines are split on `\n` with an optional preceding
/// `\r`, matching the tolerance of common servers. Lines that do not parse
/// as IRC messages are dropped here, since the engine would discard them
/// anyway.
use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use super::message::Message;

/// Upper bound on a buffered inbound line. RFC 2812 caps server lines at
/// 512 bytes; this matches the engine's historical 2048-byte read chunk.
const MAX_LINE_LENGTH: usize = 2048;

/// Codec error: oversized line or an I/O failure underneath.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("line exceeds maximum length ({MAX_LINE_LENGTH} bytes)")]
    LineTooLong,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A tokio codec framing IRC messages on line boundaries.
#[derive(Debug, Default)]
pub struct IrcCodec;

impl Decoder for IrcCodec {
    type Item = Message;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            let Some(pos) = src.iter().position(|&b| b == b'\n') else {
                if src.len() > MAX_LINE_LENGTH {
                    return Err(CodecError::LineTooLong);
                }
                return Ok(None);
            };

            // Take the line, advance past the `\n`.
            let line_bytes = src.split_to(pos);
            src.advance(1);

            let line = String::from_utf8_lossy(&line_bytes);
            match Message::parse(line.trim_end_matches('\r')) {
                Ok(msg) => return Ok(Some(msg)),
                // Blank or malformed line: skip it and keep scanning.
                Err(_) => continue,
            }
        }
    }
}

impl Encoder<Message> for IrcCodec {
    type Error = CodecError;

    fn encode(&mut self, item: Message, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let wire = item.to_wire();
        dst.reserve(wire.len() + 2);
        dst.put_slice(wire.as_bytes());
        dst.put_slice(b"\r\n");
        Ok(())
    }
}
