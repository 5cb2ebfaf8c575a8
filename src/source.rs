use crate::bird;
use crate::config::StatusConfig;
use crate::error::StatusError;
use crate::gobgp::{neighbors_to_peers, GobgpClient};
use crate::peers::PeerRecord;
use crate::types::AddressFamily;

/// Where peer status comes from: the BIRD control socket or the GoBGP API.
pub enum PeerSource<'a> {
    Bird(&'a StatusConfig),
    Gobgp(GobgpClient),
}

impl PeerSource<'_> {
    pub async fn list_peers(&self, family: AddressFamily) -> Result<Vec<PeerRecord>, StatusError> {
        match self {
            PeerSource::Bird(config) => bird::query_peers(config, family).await,
            PeerSource::Gobgp(client) => {
                let neighbors = client.list_neighbors(family).await?;
                Ok(neighbors_to_peers(&neighbors, chrono::Utc::now().timestamp()))
            }
        }
    }

    /// Prefix for errors raised while querying this source.
    pub fn error_context(&self) -> &'static str {
        match self {
            PeerSource::Bird(_) => "Error querying BIRD",
            PeerSource::Gobgp(_) => "Error querying GoBGP",
        }
    }
}
