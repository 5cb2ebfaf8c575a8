use crate::types::GenericBoxedStream;

use futures_util::StreamExt;
use std::sync::Arc;
use tokio::sync::Notify;
use tracing::info;

#[derive(Debug, PartialEq, Eq)]
enum Next<T> {
    Item(T),
    End,
    Shutdown,
}

async fn next_or_shutdown<T>(stream: &mut GenericBoxedStream<T>, shutdown: &Notify) -> Next<T> {
    tokio::select! {
        item = stream.next() => item.map_or(Next::End, Next::Item),
        _ = shutdown.notified() => Next::Shutdown,
    }
}

/// Hands every item of `stream` to `handler` until the stream ends or
/// shutdown is notified.
pub async fn serve_stream<T>(
    mut stream: GenericBoxedStream<T>,
    shutdown_notify: Arc<Notify>,
    handler: impl Fn(T) -> tokio::task::JoinHandle<()> + Send + Sync + 'static,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        match next_or_shutdown(&mut stream, &shutdown_notify).await {
            Next::Item(item) => {
                handler(item);
            }
            Next::End => {
                info!("Stream ended");
                break;
            }
            Next::Shutdown => {
                info!("Shutdown requested");
                break;
            }
        }
    }

    Ok(())
}
