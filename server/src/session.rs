//! One connected client: an exclusively owned writer plus a reader task that
//! decodes frames into a bounded inbox.

use crate::error::ServerError;
use log::{debug, warn};
use pong_shared::{encode_frame, CodecError, FrameDecoder, Framing, Message};
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, Mutex};

/// Ordinal assigned at connect time, starting at 1 and never reused.
pub type SessionId = u32;

type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Write side of a client connection.
pub struct Session {
    id: SessionId,
    peer: Option<SocketAddr>,
    framing: Framing,
    writer: Mutex<BoxedWriter>,
}

impl Session {
    /// Wraps a duplex stream. Returns the session, the reader half that must
    /// be driven with [`SessionReader::run`], and the receiving end of the
    /// inbox the reader fills.
    pub fn open<R, W>(
        id: SessionId,
        peer: Option<SocketAddr>,
        reader: R,
        writer: W,
        framing: Framing,
        inbox_capacity: usize,
    ) -> (Arc<Session>, SessionReader<R>, mpsc::Receiver<String>)
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let (inbox_tx, inbox_rx) = mpsc::channel(inbox_capacity.max(1));

        let session = Arc::new(Session {
            id,
            peer,
            framing,
            writer: Mutex::new(Box::new(writer)),
        });
        let reader = SessionReader {
            id,
            reader,
            decoder: FrameDecoder::new(framing),
            inbox: inbox_tx,
        };

        (session, reader, inbox_rx)
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn peer(&self) -> Option<SocketAddr> {
        self.peer
    }

    /// Writes one framed message and flushes.
    pub async fn send(&self, message: &Message) -> Result<(), ServerError> {
        let frame = encode_frame(&message.encode(), self.framing);
        let mut writer = self.writer.lock().await;
        writer.write_all(&frame).await?;
        writer.flush().await?;
        Ok(())
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("peer", &self.peer)
            .field("framing", &self.framing)
            .finish()
    }
}

/// Read side of a client connection.
pub struct SessionReader<R> {
    id: SessionId,
    reader: R,
    decoder: FrameDecoder,
    inbox: mpsc::Sender<String>,
}

impl<R: AsyncRead + Unpin> SessionReader<R> {
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Reads until EOF or a fatal error, pushing each decoded frame into the
    /// inbox. A full inbox blocks this loop, and only this loop.
    pub async fn run(mut self) -> Result<(), ServerError> {
        let mut buffer = vec![0u8; self.decoder.framing().read_buffer_size()];

        loop {
            let len = self.reader.read(&mut buffer).await?;
            if len == 0 {
                debug!("Session {} reached end of stream", self.id);
                return Ok(());
            }
            self.decoder.extend(&buffer[..len]);

            loop {
                match self.decoder.next_frame() {
                    Ok(Some(frame)) => {
                        debug!("Recv message from session {}: {}", self.id, frame);
                        if self.inbox.send(frame).await.is_err() {
                            debug!("Inbox for session {} dropped", self.id);
                            return Ok(());
                        }
                    }
                    Ok(None) => break,
                    Err(CodecError::InvalidUtf8) => {
                        warn!("Dropping non UTF-8 frame from session {}", self.id);
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pong_shared::MAX_FRAME_LEN;
    use std::time::Duration;
    use tokio::io::{duplex, split};
    use tokio::time::timeout;

    #[tokio::test]
    async fn test_reader_decodes_split_frames() {
        let (server_side, mut client_side) = duplex(256);
        let (read_half, write_half) = split(server_side);
        let (_session, reader, mut inbox) =
            Session::open(1, None, read_half, write_half, Framing::Newline, 50);
        let task = tokio::spawn(reader.run());

        client_side.write_all(b"X,W_DO").await.unwrap();
        client_side.write_all(b"WN\nX,W_UP\n").await.unwrap();

        assert_eq!(inbox.recv().await.as_deref(), Some("X,W_DOWN"));
        assert_eq!(inbox.recv().await.as_deref(), Some("X,W_UP"));

        drop(client_side);
        assert!(task.await.unwrap().is_ok());
        assert_eq!(inbox.recv().await, None);
    }

    #[tokio::test]
    async fn test_legacy_reads_are_frames() {
        let reader = tokio_test::io::Builder::new()
            .read(b"X,W_DOWN")
            .read(b"X,W_UP,X_POWERUP")
            .build();
        let (_session, reader, mut inbox) =
            Session::open(3, None, reader, tokio::io::sink(), Framing::Legacy, 50);

        assert!(reader.run().await.is_ok());
        assert_eq!(inbox.recv().await.as_deref(), Some("X,W_DOWN"));
        assert_eq!(inbox.recv().await.as_deref(), Some("X,W_UP,X_POWERUP"));
        assert_eq!(inbox.recv().await, None);
    }

    #[tokio::test]
    async fn test_invalid_utf8_frame_skipped() {
        let reader = tokio_test::io::Builder::new()
            .read(b"X,\xff\xfe\nX,K_DOWN\n")
            .build();
        let (_session, reader, mut inbox) =
            Session::open(1, None, reader, tokio::io::sink(), Framing::Newline, 50);

        assert!(reader.run().await.is_ok());
        assert_eq!(inbox.recv().await.as_deref(), Some("X,K_DOWN"));
        assert_eq!(inbox.recv().await, None);
    }

    #[tokio::test]
    async fn test_full_inbox_blocks_reader_without_loss() {
        let (server_side, mut client_side) = duplex(256);
        let (read_half, write_half) = split(server_side);
        let (_session, reader, mut inbox) =
            Session::open(1, None, read_half, write_half, Framing::Newline, 1);
        tokio::spawn(reader.run());

        client_side.write_all(b"A,1\nA,2\nA,3\n").await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        for expected in ["A,1", "A,2", "A,3"] {
            let frame = timeout(Duration::from_secs(1), inbox.recv()).await.unwrap();
            assert_eq!(frame.as_deref(), Some(expected));
        }
    }

    #[tokio::test]
    async fn test_send_writes_terminated_frame() {
        let (server_side, mut client_side) = duplex(256);
        let (read_half, write_half) = split(server_side);
        let (session, _reader, _inbox) =
            Session::open(7, None, read_half, write_half, Framing::Newline, 50);

        session.send(&Message::PlayerNum(7)).await.unwrap();

        let mut buf = [0u8; 32];
        let len = client_side.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..len], b"PLAYERNUM,7\n");
        assert_eq!(session.id(), 7);
    }

    #[tokio::test]
    async fn test_send_to_closed_peer_fails() {
        let (server_side, client_side) = duplex(256);
        let (read_half, write_half) = split(server_side);
        let (session, _reader, _inbox) =
            Session::open(1, None, read_half, write_half, Framing::Newline, 50);
        drop(client_side);

        assert!(session.send(&Message::PlayerNum(1)).await.is_err());
    }

    #[tokio::test]
    async fn test_oversized_frame_ends_session() {
        let (server_side, mut client_side) = duplex(MAX_FRAME_LEN * 2);
        let (read_half, write_half) = split(server_side);
        let (_session, reader, _inbox) =
            Session::open(1, None, read_half, write_half, Framing::Newline, 50);
        let task = tokio::spawn(reader.run());

        client_side
            .write_all(&vec![b'A'; MAX_FRAME_LEN + 10])
            .await
            .unwrap();

        let result = timeout(Duration::from_secs(1), task).await.unwrap().unwrap();
        assert!(matches!(result, Err(ServerError::Codec(CodecError::FrameTooLong { .. }))));
    }

    #[tokio::test]
    async fn test_legacy_framing() {
        let (server_side, mut client_side) = duplex(256);
        let (read_half, write_half) = split(server_side);
        let (session, reader, mut inbox) =
            Session::open(1, None, read_half, write_half, Framing::Legacy, 50);
        tokio::spawn(reader.run());

        client_side.write_all(b"X,I_DOWN").await.unwrap();
        assert_eq!(inbox.recv().await.as_deref(), Some("X,I_DOWN"));

        session.send(&Message::HitWall(pong_shared::WallSide::Top)).await.unwrap();
        let mut buf = [0u8; 36];
        let len = client_side.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..len], b"HIT_WALL_UP");
    }
}
