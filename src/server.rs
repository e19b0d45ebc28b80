use bytes::Bytes;
use std::net::SocketAddr;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info, instrument};

use crate::connection::Connection;
use crate::handler::Handler;
use crate::store::Store;
use crate::Error;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 6379;
pub const DEFAULT_MAX_FRAME_SIZE: usize = 512 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Upper bound, in bytes, for data buffered while waiting for a request to complete.
    pub max_frame_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }
}

pub async fn run(config: Config) -> Result<(), Error> {
    let _ = tracing_subscriber::fmt()
        .try_init()
        .map_err(|e| debug!("Failed to initialize global tracing: {}", e));

    let listener = TcpListener::bind((config.host.as_str(), config.port)).await?;

    serve(listener, Store::new(), config.max_frame_size).await
}

/// Accepts connections on `listener` forever, serving each one on its own task. All connections
/// share `store`.
pub async fn serve(listener: TcpListener, store: Store, max_frame_size: usize) -> Result<(), Error> {
    let handler = Handler::new(store);

    info!("Server listening on {}", listener.local_addr()?);

    loop {
        let (socket, client_address) = listener.accept().await?;
        let handler = handler.clone();
        info!("Accepted connection from {:?}", client_address);

        tokio::spawn(async move {
            if let Err(e) = handle_connection(socket, client_address, handler, max_frame_size).await
            {
                error!("Connection error: {}", e);
            }
        });
    }
}

#[instrument(
    name = "connection",
    skip(stream, handler, max_frame_size),
    fields(connection_id, client_address)
)]
async fn handle_connection(
    stream: TcpStream,
    client_address: SocketAddr,
    handler: Handler,
    max_frame_size: usize,
) -> Result<(), Error> {
    let mut conn = Connection::new(stream, max_frame_size);

    tracing::Span::current()
        .record("connection_id", conn.id.to_string())
        .record("client_address", client_address.to_string());

    while let Some(chunk) = conn.read_chunk().await? {
        debug!("Received {} bytes", chunk.len());

        let res = handler.serve_input(&chunk);
        if res.is_empty() {
            continue;
        }

        conn.write_chunk(Bytes::from(res)).await?;
    }

    info!("Connection closed");
    Ok(())
}
