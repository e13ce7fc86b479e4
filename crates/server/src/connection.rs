use bytes::{Buf, BytesMut};
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufWriter};
use tokio::net::TcpStream;

use burnnote_common::{ConnectionError, INITIAL_BUFFER_CAPACITY};
use burnnote_protocol::Frame;

/// Socket de um cliente com os bytes ainda não decodificados.
pub struct Connection {
    stream: BufWriter<TcpStream>,
    pending: BytesMut,
}

impl Connection {
    pub fn new(stream: TcpStream) -> Self {
        Self {
            stream: BufWriter::new(stream),
            pending: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
        }
    }

    /// Próximo comando do cliente. `None` quando ele fecha entre comandos;
    /// fechar no meio de um frame é `ConnectionReset`.
    pub async fn read_frame(&mut self) -> Result<Option<Frame>, ConnectionError> {
        loop {
            if let Some((frame, len)) = Frame::decode(&self.pending)? {
                self.pending.advance(len);
                return Ok(Some(frame));
            }

            if self.stream.read_buf(&mut self.pending).await? == 0 {
                if self.pending.is_empty() {
                    return Ok(None);
                }
                return Err(ConnectionError::ConnectionReset);
            }
        }
    }

    pub async fn write_frame(&mut self, frame: &Frame) -> Result<(), ConnectionError> {
        self.stream.write_all(&frame.to_bytes()).await?;
        self.stream.flush().await?;
        Ok(())
    }
}
