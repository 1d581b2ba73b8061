//! TLV frame extraction for stream transports.
//!
//! A stream face accumulates bytes and cuts complete TLV blocks out of the
//! buffer. A frame that would exceed the maximum packet size, or a length
//! encoding we cannot parse, is unrecoverable on a stream: the face must
//! close because resynchronization is impossible.

use bytes::{Bytes, BytesMut};
use rust_ndnd_common::{Error, Result, MAX_PACKET_SIZE};

#[derive(Debug, Default)]
pub struct FrameDecoder {
    buf: BytesMut,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    /// Cuts the next complete TLV frame out of the buffer.
    ///
    /// Returns `Ok(None)` when more bytes are needed; an error means the
    /// stream is corrupt and the face has to close.
    pub fn next_frame(&mut self) -> Result<Option<Bytes>> {
        // Type (1 byte) + first length byte.
        if self.buf.len() < 2 {
            return Ok(None);
        }

        let (value_len, header_len) = match self.buf[1] {
            len @ 0..=252 => (len as usize, 2),
            253 => {
                if self.buf.len() < 4 {
                    return Ok(None);
                }
                (u16::from_be_bytes([self.buf[2], self.buf[3]]) as usize, 4)
            }
            254 => {
                if self.buf.len() < 6 {
                    return Ok(None);
                }
                (
                    u32::from_be_bytes([self.buf[2], self.buf[3], self.buf[4], self.buf[5]])
                        as usize,
                    6,
                )
            }
            255 => {
                return Err(Error::Tlv("64-bit TLV lengths not supported".into()));
            }
        };

        let frame_len = header_len + value_len;
        if frame_len > MAX_PACKET_SIZE {
            return Err(Error::Packet(format!(
                "frame of {} bytes exceeds the {} byte packet limit",
                frame_len, MAX_PACKET_SIZE
            )));
        }
        if self.buf.len() < frame_len {
            return Ok(None);
        }

        Ok(Some(self.buf.split_to(frame_len).freeze()))
    }

    pub fn buffered(&self) -> usize {
        self.buf.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_ndnd_common::name::Name;
    use rust_ndnd_common::packet::Interest;

    #[test]
    fn test_frames_are_cut_at_boundaries() {
        let a = Interest::new(Name::from_string("/a")).with_nonce(1).to_wire();
        let b = Interest::new(Name::from_string("/b")).with_nonce(2).to_wire();

        let mut decoder = FrameDecoder::new();
        let mut joined = Vec::new();
        joined.extend_from_slice(&a);
        joined.extend_from_slice(&b);

        // Feed everything except the last byte: only the first frame pops.
        decoder.extend(&joined[..joined.len() - 1]);
        assert_eq!(decoder.next_frame().unwrap().unwrap(), a);
        assert!(decoder.next_frame().unwrap().is_none());

        decoder.extend(&joined[joined.len() - 1..]);
        assert_eq!(decoder.next_frame().unwrap().unwrap(), b);
        assert_eq!(decoder.buffered(), 0);
    }

    #[test]
    fn test_partial_header_waits() {
        let mut decoder = FrameDecoder::new();
        decoder.extend(&[0x05]);
        assert!(decoder.next_frame().unwrap().is_none());

        // 16-bit length marker with only one length byte so far.
        let mut decoder = FrameDecoder::new();
        decoder.extend(&[0x05, 253, 0x01]);
        assert!(decoder.next_frame().unwrap().is_none());
    }

    #[test]
    fn test_oversized_frame_is_fatal() {
        let mut decoder = FrameDecoder::new();
        // Claims a 70000-byte value.
        decoder.extend(&[0x05, 254, 0x00, 0x01, 0x11, 0x70]);
        assert!(decoder.next_frame().is_err());
    }

    #[test]
    fn test_unsupported_length_is_fatal() {
        let mut decoder = FrameDecoder::new();
        decoder.extend(&[0x05, 255, 0, 0, 0, 0, 0, 0, 0, 1]);
        assert!(decoder.next_frame().is_err());
    }
}
