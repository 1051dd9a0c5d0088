//! Fixed-size frame codec for `tokio_util` framed streams.
//!
//! A frame is yielded only once all 512 bytes are buffered. Leftover bytes at
//! end-of-stream mean the peer sent a truncated frame.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use crate::core::packet::{Packet, PACKET_LEN};
use crate::error::ProtocolError;

#[derive(Debug, Default, Clone, Copy)]
pub struct PacketCodec;

impl Decoder for PacketCodec {
    type Item = Packet;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Packet>, ProtocolError> {
        if src.len() < PACKET_LEN {
            src.reserve(PACKET_LEN - src.len());
            return Ok(None);
        }

        let frame = src.split_to(PACKET_LEN);
        Packet::from_bytes(&frame)
            .map(Some)
            .map_err(ProtocolError::corrupt)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Packet>, ProtocolError> {
        match self.decode(src)? {
            Some(packet) => Ok(Some(packet)),
            None if src.is_empty() => Ok(None),
            None => {
                let remaining = src.len();
                src.clear();
                Err(ProtocolError::corrupt(ProtocolError::InvalidLength(
                    remaining,
                )))
            }
        }
    }
}

impl Encoder<Packet> for PacketCodec {
    type Error = ProtocolError;

    fn encode(&mut self, item: Packet, dst: &mut BytesMut) -> Result<(), ProtocolError> {
        dst.reserve(PACKET_LEN);
        dst.extend_from_slice(item.as_bytes());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::packet::STATE_OFFSET;
    use crate::core::session_id::SessionId;

    #[test]
    fn partial_frame_waits_for_more() {
        let mut codec = PacketCodec;
        let mut buf = BytesMut::from(&[0u8; 100][..]);
        assert!(codec.decode(&mut buf).unwrap().is_none());
        assert_eq!(buf.len(), 100);
    }

    #[test]
    fn back_to_back_frames() {
        let mut codec = PacketCodec;
        let mut buf = BytesMut::new();
        let id = SessionId::generate();
        codec.encode(Packet::open(), &mut buf).unwrap();
        codec.encode(Packet::close(id).unwrap(), &mut buf).unwrap();
        assert_eq!(buf.len(), 2 * PACKET_LEN);

        assert!(codec.decode(&mut buf).unwrap().unwrap().is_open());
        let second = codec.decode(&mut buf).unwrap().unwrap();
        assert!(second.is_close());
        assert_eq!(second.id(), id);
        assert!(buf.is_empty());
    }

    #[test]
    fn corrupt_frame_is_reported() {
        let mut codec = PacketCodec;
        let mut frame = [0u8; PACKET_LEN];
        frame[STATE_OFFSET] = 9;
        let mut buf = BytesMut::from(&frame[..]);
        match codec.decode(&mut buf) {
            Err(ProtocolError::CorruptPacket(inner)) => {
                assert!(matches!(*inner, ProtocolError::InvalidType(9)))
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn truncated_frame_at_eof() {
        let mut codec = PacketCodec;
        let mut buf = BytesMut::from(&[0u8; 40][..]);
        match codec.decode_eof(&mut buf) {
            Err(ProtocolError::CorruptPacket(inner)) => {
                assert!(matches!(*inner, ProtocolError::InvalidLength(40)))
            }
            other => panic!("unexpected: {other:?}"),
        }

        let mut empty = BytesMut::new();
        assert!(codec.decode_eof(&mut empty).unwrap().is_none());
    }
}
