use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Settings fixed at startup and shared read-only by every request.
#[derive(Clone, Debug)]
pub struct StatusConfig {
    /// Directory holding `bird.ctl` and `bird6.ctl` in a calico/node container
    pub bird_socket_dir: PathBuf,
    /// Socket directory of a plain BIRD install, tried when the first fails
    pub bird_fallback_dir: PathBuf,
    /// Deadline for the socket connect and for each line read
    pub read_timeout: Duration,
    /// GoBGP command line client
    pub gobgp_path: PathBuf,
}

pub type SharedConfig = Arc<StatusConfig>;

pub fn new_config(config: StatusConfig) -> SharedConfig {
    Arc::new(config)
}
