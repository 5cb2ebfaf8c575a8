use async_stream::stream;
use futures_util::Stream;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error};

/// Yields accepted connections forever. Accept errors are logged and skipped.
pub fn tcp_accept_stream(listener: TcpListener) -> impl Stream<Item = TcpStream> {
    stream! {
        loop {
            match listener.accept().await {
                Ok((stream, addr)) => {
                    debug!("Accepted connection from {}", addr);
                    yield stream;
                }
                Err(e) => {
                    error!("TCP accept error: {}", e);
                }
            }
        }
    }
}
