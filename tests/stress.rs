//! Stress tests
//!
//! Long bursts through the codec and the session registry.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::time::Duration;

use bytes::BytesMut;
use session_socket::{Packet, PacketCodec, SessionId, SessionRegistry};
use tokio_util::codec::{Decoder, Encoder};

#[test]
fn stress_packet_encode_decode_large_series() {
    // Heavy burst of frames through one buffer; no panics, nothing left over
    let mut codec = PacketCodec;
    let mut buf = BytesMut::new();

    for len in [0usize, 1, 64, 256, 478] {
        let message = "s".repeat(len);
        for _ in 0..10_000 {
            let mut packet = Packet::acknowledge(SessionId::generate()).unwrap();
            packet.set_message(&message).unwrap();
            codec.encode(packet, &mut buf).unwrap();
            let decoded = codec.decode(&mut buf).unwrap().unwrap();
            assert_eq!(decoded.message().len(), len);
            assert!(buf.is_empty());
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn stress_registry_open_touch_close() {
    let registry = SessionRegistry::new(Duration::from_secs(60));
    let mut tasks = tokio::task::JoinSet::new();

    for _ in 0..64 {
        let registry = registry.clone();
        tasks.spawn(async move {
            for _ in 0..200 {
                let id = registry.open().await;
                registry.touch(&id).await.unwrap();
                registry.touch(&id).await.unwrap();
                assert!(registry.close(&id).await.is_some());
            }
        });
    }

    while let Some(result) = tasks.join_next().await {
        result.unwrap();
    }

    let stats = registry.stats().await;
    assert_eq!(stats.active_sessions, 0);
    assert_eq!(stats.total_opened, 64 * 200);
}
