use crate::bird::scanner::scan_peers;
use crate::config::StatusConfig;
use crate::error::StatusError;
use crate::peers::PeerRecord;
use crate::types::AddressFamily;
use std::io;
use std::path::Path;
use std::time::Duration;
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::UnixStream;
use tokio::time;
use tracing::debug;

/// Command asking BIRD for its protocol table.
const SHOW_PROTOCOLS: &[u8] = b"show protocols\n";

async fn connect_path(path: &Path, timeout: Duration) -> io::Result<UnixStream> {
    time::timeout(timeout, UnixStream::connect(path))
        .await
        .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "connect timed out"))?
}

/// Opens the BIRD control socket, trying the fallback directory once when the
/// primary socket is unavailable.
pub async fn connect(
    config: &StatusConfig,
    family: AddressFamily,
) -> Result<UnixStream, StatusError> {
    let primary = config.bird_socket_dir.join(family.bird_socket_name());
    match connect_path(&primary, config.read_timeout).await {
        Ok(stream) => return Ok(stream),
        Err(e) => debug!(
            "Failed to connect to BIRD socket {}: {}, trying {}",
            primary.display(),
            e,
            config.bird_fallback_dir.display()
        ),
    }

    // Default socket location of a non-containerized BIRD install
    let fallback = config.bird_fallback_dir.join(family.bird_socket_name());
    connect_path(&fallback, config.read_timeout)
        .await
        .map_err(|source| StatusError::Connect {
            family,
            path: fallback,
            source,
        })
}

/// Queries one BIRD daemon for its BGP peers.
///
/// The socket is dropped, and so closed, on every return path.
pub async fn query_peers(
    config: &StatusConfig,
    family: AddressFamily,
) -> Result<Vec<PeerRecord>, StatusError> {
    let mut stream = connect(config, family).await?;

    stream
        .write_all(SHOW_PROTOCOLS)
        .await
        .map_err(StatusError::Write)?;

    debug!("Reading output from BIRDv{}", family);
    let (reader, _writer) = stream.split();
    scan_peers(BufReader::new(reader), family, config.read_timeout).await
}
