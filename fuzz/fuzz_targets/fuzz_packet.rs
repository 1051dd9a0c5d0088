#![no_main]

use bytes::BytesMut;
use libfuzzer_sys::fuzz_target;
use session_socket::{Packet, PacketCodec};
use tokio_util::codec::Decoder;

fuzz_target!(|data: &[u8]| {
    // Frame validation and stream decoding must never panic
    let _ = Packet::from_bytes(data);

    let mut codec = PacketCodec;
    let mut buf = BytesMut::from(data);
    while let Ok(Some(packet)) = codec.decode(&mut buf) {
        let _ = packet.message();
    }
    let _ = codec.decode_eof(&mut buf);
});
