mod bird;
mod config;
mod error;
mod gobgp;
mod handlers;
mod peers;
mod privilege;
mod process;
mod render;
mod report;
mod server_loop;
mod source;
mod tcp_accept_stream;
mod types;

use crate::types::GenericBoxedStream;
use clap::{Parser, Subcommand};
use config::{new_config, SharedConfig, StatusConfig};
use handlers::handle_connection;
use server_loop::serve_stream;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tcp_accept_stream::tcp_accept_stream;
use tokio::{
    net::{TcpListener, TcpStream},
    signal, task,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about)]
struct Args {
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    #[arg(long, default_value = "8080")]
    port: u16,
    #[arg(
        long,
        default_value = "/var/run/calico",
        help = "Directory holding the BIRD control sockets"
    )]
    bird_socket_dir: PathBuf,
    #[arg(
        long,
        default_value = "/var/run/bird",
        help = "BIRD socket directory tried when the first one fails"
    )]
    bird_fallback_dir: PathBuf,
    #[arg(
        long,
        default_value = "2",
        help = "Longest silence tolerated from a BGP daemon, in seconds"
    )]
    read_timeout: u64,
    #[arg(long, default_value = "gobgp", help = "Path to the GoBGP command line client")]
    gobgp_path: PathBuf,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Print the node status once and exit
    Status,
}

impl Args {
    fn status_config(&self) -> StatusConfig {
        StatusConfig {
            bird_socket_dir: self.bird_socket_dir.clone(),
            bird_fallback_dir: self.bird_fallback_dir.clone(),
            read_timeout: Duration::from_secs(self.read_timeout),
            gobgp_path: self.gobgp_path.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();
    let config = new_config(args.status_config());

    if let Some(Command::Status) = args.command {
        print!("{}", report::status_report(&config).await);
        return Ok(());
    }

    let version = env!("CARGO_PKG_VERSION");
    let build = option_env!("GIT_COMMIT_HASH").unwrap_or("unknown");
    info!("bgp-node-status {} (build {})", version, build);

    let shutdown_notify = Arc::new(tokio::sync::Notify::new());

    tokio::spawn({
        let interrupt_handle = shutdown_notify.clone();
        async move {
            if let Err(e) = signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {}", e);
            }
            interrupt_handle.notify_waiters();
        }
    });

    let addr = format!("{}:{}", args.host, args.port);
    let tcp = TcpListener::bind(&addr).await?;
    info!("Listening on http://{}/status/", addr);

    run_web_server(tcp, config, shutdown_notify).await
}

async fn run_web_server(
    tcp: TcpListener,
    config: SharedConfig,
    shutdown_notify: Arc<tokio::sync::Notify>,
) -> Result<(), Box<dyn std::error::Error>> {
    let stream: GenericBoxedStream<TcpStream> = Box::pin(tcp_accept_stream(tcp));

    serve_stream(stream, shutdown_notify, move |stream| {
        let config = config.clone();
        task::spawn(async move {
            handle_connection(stream, config).await;
        })
    })
    .await?;

    Ok(())
}
