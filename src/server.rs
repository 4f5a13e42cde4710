use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info, instrument};

use crate::codec::FrameCodec;
use crate::commands::registry::Registry;
use crate::config::Config;
use crate::connection::Connection;
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

pub async fn run(config: Config) -> Result<(), Error> {
    let _ = tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .try_init()
        .map_err(|e| debug!("Failed to initialize global tracing: {}", e));

    let listener = TcpListener::bind((config.bind, config.port)).await?;
    let store = Store::with_shards(config.shards);

    serve(listener, store, config.max_frame_size).await
}

/// Accepts connections on `listener` until it fails, serving each of them on its own task.
pub async fn serve(listener: TcpListener, store: Store, max_frame_size: usize) -> Result<(), Error> {
    let registry = Arc::new(Registry::new());

    info!(
        shards = store.shard_count(),
        "Server listening on {}",
        listener.local_addr()?
    );

    loop {
        let (socket, client_address) = listener.accept().await?;
        let store = store.clone();
        let registry = registry.clone();
        info!("Accepted connection from {:?}", client_address);

        tokio::spawn(async move {
            let codec = FrameCodec::new(max_frame_size);
            if let Err(e) = handle_connection(socket, client_address, codec, store, registry).await
            {
                error!("Connection failed: {}", e);
            }
        });
    }
}

#[instrument(
    name = "connection",
    skip(stream, codec, store, registry),
    fields(connection_id, client_address)
)]
async fn handle_connection(
    stream: TcpStream,
    client_address: SocketAddr,
    codec: FrameCodec,
    store: Store,
    registry: Arc<Registry>,
) -> Result<(), Error> {
    let mut conn = Connection::with_codec(stream, codec);

    tracing::Span::current()
        .record("connection_id", conn.id.to_string())
        .record("client_address", client_address.to_string());

    loop {
        let frame = match conn.read_frame().await {
            Ok(Some(frame)) => frame,
            Ok(None) => break,
            Err(err) => {
                // The stream can't be resynchronized after a malformed frame.
                let reply = Frame::Error(format!("ERR Protocol error: {}", err));
                conn.write_frame(reply).await?;
                return Err(err);
            }
        };

        debug!("Received frame from client: {}", frame);
        let res = registry.dispatch(frame, &store);
        debug!("Sending response to client: {}", res);

        conn.write_frame(res).await?;
    }

    info!("Connection closed");
    Ok(())
}
