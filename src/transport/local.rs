use std::os::unix::fs::FileTypeExt;
use std::path::Path;

use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{UnixListener, UnixStream};
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::{debug, info, instrument, trace, warn};

use crate::core::codec::PacketCodec;
use crate::core::packet::Packet;
use crate::error::{constants, ProtocolError, Result};
use crate::utils::metrics::global_metrics;

/// Read half of a connection, yielding whole frames
pub type PacketReader = FramedRead<OwnedReadHalf, PacketCodec>;

/// Write half of a connection, accepting whole frames
pub type PacketWriter = FramedWrite<OwnedWriteHalf, PacketCodec>;

/// Bind a Unix domain socket at `path`.
///
/// With `force`, an existing socket special file at `path` is treated as stale
/// and removed first. Any other file is left alone and the bind error surfaces.
#[instrument(skip(path), fields(socket_path = %path.as_ref().display()))]
pub fn bind<P: AsRef<Path>>(path: P, force: bool) -> Result<UnixListener> {
    let path = path.as_ref();

    if force {
        if let Ok(meta) = std::fs::symlink_metadata(path) {
            if meta.file_type().is_socket() {
                std::fs::remove_file(path).map_err(|e| {
                    ProtocolError::TransportError(format!(
                        "Failed to remove stale socket {}: {e}",
                        path.display()
                    ))
                })?;
                warn!("Removed stale socket file");
            }
        }
    }

    let listener = UnixListener::bind(path).map_err(|e| {
        ProtocolError::TransportError(format!(
            "{} {}: {e}",
            constants::ERR_BIND_FAILED,
            path.display()
        ))
    })?;
    info!("Listening on unix socket");
    Ok(listener)
}

/// Dial the socket at `path` and split the stream into framed halves
#[instrument(skip(path), fields(socket_path = %path.as_ref().display()))]
pub async fn connect<P: AsRef<Path>>(path: P) -> Result<(PacketReader, PacketWriter)> {
    let stream = UnixStream::connect(path.as_ref()).await.map_err(|e| {
        global_metrics().transport_error();
        ProtocolError::TransportError(format!(
            "{} {}: {e}",
            constants::ERR_CONNECT_FAILED,
            path.as_ref().display()
        ))
    })?;
    Ok(split(stream))
}

/// Split a connected stream into framed read and write halves
pub fn split(stream: UnixStream) -> (PacketReader, PacketWriter) {
    let (read_half, write_half) = stream.into_split();
    (
        FramedRead::new(read_half, PacketCodec),
        FramedWrite::new(write_half, PacketCodec),
    )
}

/// Read exactly one frame.
///
/// `Ok(None)` means the peer hung up cleanly before sending anything. A frame
/// that fails validation is `CorruptPacket`; any other I/O failure is a
/// `TransportError`.
pub async fn receive<R>(reader: &mut FramedRead<R, PacketCodec>) -> Result<Option<Packet>>
where
    R: AsyncRead + Unpin,
{
    match reader.next().await {
        None => {
            debug!("Peer closed connection");
            Ok(None)
        }
        Some(Ok(packet)) => {
            global_metrics().packet_received();
            trace!(?packet, "Packet received");
            Ok(Some(packet))
        }
        Some(Err(ProtocolError::Io(e))) => {
            global_metrics().transport_error();
            Err(ProtocolError::TransportError(format!("receive: {e}")))
        }
        Some(Err(e)) => {
            if matches!(e, ProtocolError::CorruptPacket(_)) {
                global_metrics().corrupt_packet();
                warn!(error = %e, "Discarding corrupt packet");
            }
            Err(e)
        }
    }
}

/// Write one full frame and flush it
pub async fn transmit<W>(writer: &mut FramedWrite<W, PacketCodec>, packet: Packet) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    trace!(?packet, "Packet sending");
    writer.send(packet).await.map_err(|e| {
        global_metrics().transport_error();
        match e {
            ProtocolError::Io(io) if io.kind() == std::io::ErrorKind::WriteZero => {
                ProtocolError::TransportError(constants::ERR_SHORT_WRITE.to_string())
            }
            ProtocolError::Io(io) => ProtocolError::TransportError(format!("transmit: {io}")),
            other => other,
        }
    })?;
    global_metrics().packet_sent();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::packet::{PACKET_LEN, STATE_OFFSET};
    use crate::core::session_id::SessionId;
    use tokio::io::AsyncWriteExt;

    #[tokio::test]
    async fn transmit_then_receive_over_socket_pair() {
        let (left, right) = UnixStream::pair().unwrap();
        let (_left_reader, mut left_writer) = split(left);
        let (mut right_reader, _right_writer) = split(right);

        let id = SessionId::generate();
        let mut packet = Packet::acknowledge(id).unwrap();
        packet.set_message("hello").unwrap();
        transmit(&mut left_writer, packet.clone()).await.unwrap();

        let received = receive(&mut right_reader).await.unwrap().unwrap();
        assert_eq!(received, packet);
    }

    #[tokio::test]
    async fn clean_hangup_is_none() {
        let (left, right) = UnixStream::pair().unwrap();
        drop(left);
        let (mut reader, _writer) = split(right);
        assert!(receive(&mut reader).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn short_frame_then_hangup_is_corrupt() {
        let (mut left, right) = UnixStream::pair().unwrap();
        left.write_all(&[0u8; PACKET_LEN / 2]).await.unwrap();
        drop(left);
        let (mut reader, _writer) = split(right);
        assert!(matches!(
            receive(&mut reader).await,
            Err(ProtocolError::CorruptPacket(_))
        ));
    }

    #[tokio::test]
    async fn bad_state_is_corrupt() {
        let (mut left, right) = UnixStream::pair().unwrap();
        let mut frame = [0u8; PACKET_LEN];
        frame[STATE_OFFSET] = 0xAB;
        left.write_all(&frame).await.unwrap();
        let (mut reader, _writer) = split(right);
        assert!(matches!(
            receive(&mut reader).await,
            Err(ProtocolError::CorruptPacket(_))
        ));
    }

    #[tokio::test]
    async fn force_removes_stale_socket_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stale.sock");

        let first = bind(&path, false).unwrap();
        drop(first);
        assert!(path.exists());

        assert!(matches!(
            bind(&path, false),
            Err(ProtocolError::TransportError(_))
        ));
        assert!(bind(&path, true).is_ok());

        let regular = dir.path().join("regular.file");
        std::fs::write(&regular, b"not a socket").unwrap();
        assert!(bind(&regular, true).is_err());
        assert!(regular.exists());
    }
}
