use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

// Peer names are <Kind>_<address>, where every group separator of the
// address, dotted or colon, was replaced by "_".
// Example match: "Mesh_192_168_56_101" or "Mesh_fd80_24e2_f998_72d7__2"
static PEER_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([^_]+)_(.+)$").expect("peer name pattern is valid"));

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PeerKind {
    GlobalPeer,
    MeshPeer,
    NodeSpecificPeer,
}

impl PeerKind {
    /// Maps the kind token of a peer name. Unknown tokens yield `None`.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "Global" => Some(PeerKind::GlobalPeer),
            "Mesh" => Some(PeerKind::MeshPeer),
            "Node" => Some(PeerKind::NodeSpecificPeer),
            _ => None,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            PeerKind::GlobalPeer => "global",
            PeerKind::MeshPeer => "node-to-node mesh",
            PeerKind::NodeSpecificPeer => "node specific",
        }
    }
}

/// One remote BGP peer as reported by the routing daemon.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PeerRecord {
    pub address: String,
    pub kind: PeerKind,
    pub admin_state: String,
    pub since: String,
    pub session_state: String,
    pub info: String,
}

impl PeerRecord {
    /// Session state followed by the free-text trailer, if any.
    pub fn info_column(&self) -> String {
        if self.info.is_empty() {
            self.session_state.clone()
        } else {
            format!("{} {}", self.session_state, self.info)
        }
    }
}

/// Decodes an encoded peer name into its kind and address.
///
/// Every underscore of the address part is rewritten to `delimiter`, which
/// restores both dotted-quad and colon-grouped addresses. Returns `None` when
/// the name does not follow the grammar or names an unknown kind.
pub fn decode_peer_name(name: &str, delimiter: char) -> Option<(PeerKind, String)> {
    let Some(captures) = PEER_NAME.captures(name) else {
        debug!("Peer name '{}' is not in the expected format", name);
        return None;
    };
    let Some(kind) = PeerKind::from_token(&captures[1]) else {
        debug!("Peer type '{}' is not recognized", &captures[1]);
        return None;
    };
    let address = captures[2].replace('_', &delimiter.to_string());
    Some((kind, address))
}
