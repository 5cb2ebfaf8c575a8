use crate::config::StatusConfig;
use crate::error::StatusError;
use crate::peers::{decode_peer_name, PeerRecord};
use crate::types::AddressFamily;
use serde::Deserialize;
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;
use tokio::process::Command;
use tokio::time;
use tracing::debug;

#[derive(Deserialize, Clone, Debug, Default)]
pub struct NeighborConf {
    #[serde(rename = "neighbor-address", alias = "neighbor_address", default)]
    pub neighbor_address: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct NeighborState {
    #[serde(rename = "admin-state", alias = "admin_state", default)]
    pub admin_state: String,
    #[serde(rename = "session-state", alias = "session_state", default)]
    pub session_state: String,
}

/// Unix timestamps of the last session up and down transitions.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct TimersState {
    #[serde(default)]
    pub uptime: i64,
    #[serde(default)]
    pub downtime: i64,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct Timers {
    #[serde(default)]
    pub state: TimersState,
}

/// One neighbor as listed by `gobgp -j neighbor`.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct NeighborInfo {
    #[serde(alias = "conf", default)]
    pub config: NeighborConf,
    #[serde(default)]
    pub state: NeighborState,
    #[serde(default)]
    pub timers: Timers,
}

pub struct GobgpClient {
    program: PathBuf,
    args: Vec<String>,
    timeout: Duration,
}

impl GobgpClient {
    pub fn new(config: &StatusConfig) -> Self {
        Self {
            program: config.gobgp_path.clone(),
            args: Vec::new(),
            timeout: config.read_timeout,
        }
    }

    /// Arguments passed before the neighbor query.
    #[cfg(test)]
    fn with_args(mut self, args: &[&str]) -> Self {
        self.args = args.iter().map(|a| a.to_string()).collect();
        self
    }

    /// Lists the neighbors whose transport address belongs to `family`.
    pub async fn list_neighbors(
        &self,
        family: AddressFamily,
    ) -> Result<Vec<NeighborInfo>, StatusError> {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .args(["-j", "neighbor"])
            .kill_on_drop(true);

        let output = time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| {
                StatusError::Backend(format!(
                    "no neighbor info within {:?}",
                    self.timeout
                ))
            })?
            .map_err(|e| {
                StatusError::Backend(format!(
                    "unable to run {}: {}",
                    self.program.display(),
                    e
                ))
            })?;

        if !output.status.success() {
            return Err(StatusError::Backend(format!(
                "unable to retrieve neighbor info: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let neighbors: Option<Vec<NeighborInfo>> = serde_json::from_slice(&output.stdout)
            .map_err(|e| {
                StatusError::Backend(format!("unable to decode neighbor info: {}", e))
            })?;

        Ok(neighbors
            .unwrap_or_default()
            .into_iter()
            .filter(|n| {
                n.config
                    .neighbor_address
                    .parse::<IpAddr>()
                    .map(|ip| family.contains(&ip))
                    .unwrap_or(false)
            })
            .collect())
    }
}

/// Renders a signed number of seconds as `[Nd ]HH:MM:SS`, ignoring the sign.
pub fn format_timedelta(seconds: i64) -> String {
    let mut u = seconds.unsigned_abs();
    let secs = u % 60;
    u /= 60;
    let mins = u % 60;
    u /= 60;
    let hours = u % 24;
    let days = u / 24;

    if days == 0 {
        format!("{:02}:{:02}:{:02}", hours, mins, secs)
    } else {
        format!("{}d {:02}:{:02}:{:02}", days, hours, mins, secs)
    }
}

fn capitalize(state: &str) -> String {
    let mut chars = state.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Maps GoBGP neighbors onto peers. `now` is the current unix time.
///
/// Neighbors whose description is not a calico peer name are skipped.
pub fn neighbors_to_peers(neighbors: &[NeighborInfo], now: i64) -> Vec<PeerRecord> {
    neighbors
        .iter()
        .filter_map(|n| {
            // The address is taken verbatim, the description only tells the kind.
            let Some((kind, _)) = decode_peer_name(&n.config.description, '_') else {
                debug!(
                    "Not a valid neighbor: peer name '{}' is not recognized",
                    n.config.description
                );
                return None;
            };

            let session_state = capitalize(&n.state.session_state);
            let since = if n.timers.state.uptime == 0 {
                "never".to_string()
            } else {
                let t = if session_state == "Established" {
                    n.timers.state.uptime
                } else {
                    n.timers.state.downtime
                };
                format_timedelta(now.saturating_sub(t))
            };

            Some(PeerRecord {
                address: n.config.neighbor_address.clone(),
                kind,
                admin_state: n.state.admin_state.clone(),
                since,
                session_state,
                info: String::new(),
            })
        })
        .collect()
}
