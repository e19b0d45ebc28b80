use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_util::codec::Framed;
use uuid::Uuid;

use crate::codec::PipelineCodec;
use crate::Error;

pub struct Connection {
    pub id: Uuid,
    framed: Framed<TcpStream, PipelineCodec>,
}

impl Connection {
    pub fn new(stream: TcpStream, max_frame_size: usize) -> Connection {
        Connection {
            id: Uuid::new_v4(),
            framed: Framed::new(stream, PipelineCodec::new(max_frame_size)),
        }
    }

    /// Reads the next chunk of complete requests. `None` means the peer closed the connection.
    pub async fn read_chunk(&mut self) -> Result<Option<Bytes>, Error> {
        self.framed.next().await.transpose()
    }

    pub async fn write_chunk(&mut self, chunk: Bytes) -> Result<(), Error> {
        self.framed.send(chunk).await
    }
}
