//! Streaming frame decoder.
//!
//! Reassembles tag-prefixed, length-delimited messages from an
//! arbitrarily-chunked inbound byte stream. The receive buffer is appended
//! at the tail and consumed only from the head; a frame is never consumed
//! until every byte it declares has arrived.

use crate::error::{Error, Result};
use crate::protocol::tag;

/// One complete wire message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Message tag byte
    pub tag: u8,
    /// Declared length: the length field plus the payload, excluding the tag.
    /// The legacy single-byte `N` acknowledgement reports 1.
    pub declared_len: u32,
    /// Message payload (after the length field)
    pub payload: Vec<u8>,
}

/// Accumulating decoder over the session's receive buffer.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buf: Vec<u8>,
}

impl FrameDecoder {
    /// Create an empty decoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an inbound chunk to the tail of the receive buffer.
    pub fn extend(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    /// Number of bytes currently buffered.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Extract the next complete frame, or `None` if the buffer holds only
    /// a partial tail. A partial frame leaves the buffer untouched.
    ///
    /// Wire layout: 1-byte tag, 4-byte big-endian length counting itself
    /// plus the payload (the tag is excluded), then `length - 4` payload
    /// bytes. The legacy `N` acknowledgement is a bare tag byte.
    pub fn next_frame(&mut self) -> Result<Option<Frame>> {
        if self.buf.is_empty() {
            return Ok(None);
        }

        let tag_byte = self.buf[0];
        if tag_byte == tag::NOTICE {
            self.buf.drain(..1);
            return Ok(Some(Frame {
                tag: tag_byte,
                declared_len: 1,
                payload: Vec::new(),
            }));
        }

        if self.buf.len() < 5 {
            return Ok(None);
        }

        let declared = i32::from_be_bytes([self.buf[1], self.buf[2], self.buf[3], self.buf[4]]);
        if declared < 4 {
            return Err(Error::Protocol(format!(
                "Invalid message length {} for tag '{}'",
                declared, tag_byte as char
            )));
        }

        let total = 1 + declared as usize;
        if self.buf.len() < total {
            return Ok(None);
        }

        let payload = self.buf[5..total].to_vec();
        self.buf.drain(..total);

        Ok(Some(Frame {
            tag: tag_byte,
            declared_len: declared as u32,
            payload,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(tag: u8, payload: &[u8]) -> Vec<u8> {
        let mut out = vec![tag];
        out.extend_from_slice(&((payload.len() as i32 + 4).to_be_bytes()));
        out.extend_from_slice(payload);
        out
    }

    #[test]
    fn empty_buffer_yields_nothing() {
        let mut dec = FrameDecoder::new();
        assert_eq!(dec.next_frame().unwrap(), None);
        assert_eq!(dec.buffered(), 0);
    }

    #[test]
    fn back_to_back_frames_drain_in_one_pass() {
        let mut dec = FrameDecoder::new();
        let mut bytes = msg(b'S', b"a\0b\0");
        bytes.extend_from_slice(&msg(b'Z', &[b'I']));
        dec.extend(&bytes);

        let first = dec.next_frame().unwrap().unwrap();
        assert_eq!(first.tag, b'S');
        assert_eq!(first.payload, b"a\0b\0");

        let second = dec.next_frame().unwrap().unwrap();
        assert_eq!(second.tag, b'Z');
        assert_eq!(second.payload, &[b'I']);

        assert_eq!(dec.next_frame().unwrap(), None);
        assert_eq!(dec.buffered(), 0);
    }

    #[test]
    fn split_frame_parses_once_after_second_chunk() {
        let bytes = msg(b'C', b"SELECT 1\0");
        let mut dec = FrameDecoder::new();

        dec.extend(&bytes[..7]);
        assert_eq!(dec.next_frame().unwrap(), None);
        assert_eq!(dec.buffered(), 7); // untouched

        dec.extend(&bytes[7..]);
        let frame = dec.next_frame().unwrap().unwrap();
        assert_eq!(frame.tag, b'C');
        assert_eq!(frame.payload, b"SELECT 1\0");
        assert_eq!(dec.next_frame().unwrap(), None);
    }

    #[test]
    fn zero_length_payload_is_valid() {
        let mut dec = FrameDecoder::new();
        dec.extend(&msg(b'I', b""));
        let frame = dec.next_frame().unwrap().unwrap();
        assert_eq!(frame.tag, b'I');
        assert_eq!(frame.declared_len, 4);
        assert!(frame.payload.is_empty());
    }

    #[test]
    fn legacy_ack_consumes_one_byte() {
        let mut dec = FrameDecoder::new();
        let mut bytes = vec![b'N'];
        bytes.extend_from_slice(&msg(b'Z', &[b'I']));
        dec.extend(&bytes);

        let ack = dec.next_frame().unwrap().unwrap();
        assert_eq!(ack.tag, b'N');
        assert_eq!(ack.declared_len, 1);
        assert!(ack.payload.is_empty());

        let ready = dec.next_frame().unwrap().unwrap();
        assert_eq!(ready.tag, b'Z');
    }

    #[test]
    fn partial_header_is_not_a_frame() {
        let mut dec = FrameDecoder::new();
        dec.extend(&[b'S', 0x00, 0x00]);
        assert_eq!(dec.next_frame().unwrap(), None);
        assert_eq!(dec.buffered(), 3);
    }

    #[test]
    fn undersized_declared_length_is_an_error() {
        let mut dec = FrameDecoder::new();
        dec.extend(&[b'S', 0x00, 0x00, 0x00, 0x02]);
        assert!(dec.next_frame().is_err());
    }
}
