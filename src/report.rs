//! Plain-text status report of the local calico node.
use crate::config::StatusConfig;
use crate::error::StatusError;
use crate::gobgp::GobgpClient;
use crate::privilege::enforce_root;
use crate::process::ProcessTable;
use crate::render::render_peers;
use crate::source::PeerSource;
use crate::types::AddressFamily;
use std::future::Future;
use std::io;
use tokio::task;
use tracing::{debug, warn};

// Older calico/node releases ran `calico-felix`, newer ones `calico-node -felix`.
const FELIX_PROCESSES: [&[&str]; 2] = [&["calico-felix"], &["calico-node", "-felix"]];
const GOBGP_PROCESS: &[&str] = &["calico-bgp-daemon"];

/// Runs every check and returns the report the status endpoint serves.
pub async fn status_report(config: &StatusConfig) -> String {
    build_report(enforce_root(), load_processes, config).await
}

/// Reads `/proc` off the async worker threads.
async fn load_processes() -> Result<ProcessTable, StatusError> {
    task::spawn_blocking(ProcessTable::load)
        .await
        .map_err(|e| StatusError::ProcessInspection(io::Error::other(e)))?
}

/// Builds the report from the privilege check and, only when that passed,
/// the process listing produced by `load_processes`.
pub async fn build_report<F, Fut>(
    privilege: Result<(), StatusError>,
    load_processes: F,
    config: &StatusConfig,
) -> String
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<ProcessTable, StatusError>>,
{
    let mut out = String::new();

    // Must run as root to be able to connect to BIRD sockets
    if let Err(e) = privilege {
        out.push_str(&format!("{}\n", e));
        return out;
    }

    let processes = match load_processes().await {
        Ok(table) => table,
        Err(e) => {
            warn!("{}", e);
            out.push_str(&format!("{}\n", e));
            ProcessTable::default()
        }
    };

    write_node_status(&mut out, &processes, config).await;
    out
}

/// Writes the node and BGP peer sections for the given process view.
pub async fn write_node_status(out: &mut String, processes: &ProcessTable, config: &StatusConfig) {
    if !FELIX_PROCESSES.iter().any(|p| processes.contains(p)) {
        out.push_str("Calico process is not running.\n");
        return;
    }
    out.push_str("Calico process is running.\n");

    let bird_running = |family: AddressFamily| processes.contains(&[family.bird_process()]);

    if AddressFamily::ALL.into_iter().any(bird_running) {
        let source = PeerSource::Bird(config);
        for family in AddressFamily::ALL {
            if bird_running(family) {
                write_peers(out, &source, family).await;
            } else {
                out.push_str(&format!(
                    "\nINFO: BIRDv{} process: '{}' is not running.\n",
                    family,
                    family.bird_process()
                ));
            }
        }
    } else if processes.contains(GOBGP_PROCESS) {
        let source = PeerSource::Gobgp(GobgpClient::new(config));
        for family in AddressFamily::ALL {
            write_peers(out, &source, family).await;
        }
    } else {
        out.push_str("\nNone of the BGP backend processes (BIRD or GoBGP) are running.\n");
    }

    out.push('\n');
}

async fn write_peers(out: &mut String, source: &PeerSource<'_>, family: AddressFamily) {
    debug!("Print peers for IPv{}", family);
    out.push_str(&format!("\nIPv{} BGP status\n", family));

    match source.list_peers(family).await {
        Ok(peers) => match render_peers(&peers) {
            Some(table) => {
                out.push_str(&table);
                out.push('\n');
            }
            None => out.push_str(&format!("No IPv{} peers found.\n", family)),
        },
        Err(e) => {
            warn!("IPv{} peer query failed: {}", family, e);
            out.push_str(&format!("{}: {}\n", source.error_context(), e));
        }
    }
}
