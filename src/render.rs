use crate::peers::PeerRecord;
use tabled::settings::Style;
use tabled::{Table, Tabled};

#[derive(Tabled)]
struct PeerRow<'a> {
    #[tabled(rename = "PEER ADDRESS")]
    address: &'a str,
    #[tabled(rename = "PEER TYPE")]
    peer_type: &'static str,
    #[tabled(rename = "STATE")]
    state: &'a str,
    #[tabled(rename = "SINCE")]
    since: &'a str,
    #[tabled(rename = "INFO")]
    info: String,
}

/// Renders peers as a table. Returns `None` for an empty list so callers
/// print a message instead of a table without rows.
pub fn render_peers(peers: &[PeerRecord]) -> Option<String> {
    if peers.is_empty() {
        return None;
    }

    let rows = peers.iter().map(|peer| PeerRow {
        address: &peer.address,
        peer_type: peer.kind.display_name(),
        state: &peer.admin_state,
        since: &peer.since,
        info: peer.info_column(),
    });

    Some(Table::new(rows).with(Style::ascii()).to_string())
}
