use clap::Parser;
use peer_share::api::router;
use peer_share::config::{BROADCAST_PORT, PeerConfig};
use peer_share::peer::node::PeerNode;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "peer_share", about = "Peer-to-peer file sharing node")]
struct Args {
    /// Unicast UDP port (0 = any free port)
    #[arg(long, env = "PEER_UDP_PORT", default_value_t = 0)]
    udp_port: u16,

    /// File-transfer TCP port (0 = any free port)
    #[arg(long, env = "PEER_TCP_PORT", default_value_t = 0)]
    tcp_port: u16,

    #[arg(long, env = "PEER_BROADCAST_PORT", default_value_t = BROADCAST_PORT)]
    broadcast_port: u16,

    /// Directory whose files are shared with the group
    #[arg(long, env = "PEER_SHARED_DIR", default_value = "shared_files")]
    shared_dir: PathBuf,

    /// IP announced to other peers (detected when omitted)
    #[arg(long, env = "PEER_ADVERTISE_IP")]
    advertise_ip: Option<IpAddr>,

    /// Local control API address
    #[arg(long, env = "PEER_API_BIND", default_value = "127.0.0.1:8080")]
    api_bind: SocketAddr,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let config = PeerConfig {
        udp_port: args.udp_port,
        tcp_port: args.tcp_port,
        advertise_ip: args.advertise_ip,
        ..PeerConfig::default()
    }
    .with_broadcast_port(args.broadcast_port)
    .with_shared_dir(args.shared_dir);

    // 1. Sockets + coordination state:
    let node = PeerNode::bind(config).await?;
    tracing::info!("Node ID: {}", node.id());

    // 2. Background loops + discovery:
    node.start();

    // 3. Control API:
    let app = router(node.clone());
    let listener = tokio::net::TcpListener::bind(args.api_bind).await?;
    tracing::info!("Control API listening on {}", args.api_bind);
    tracing::info!("Press Ctrl+C to shutdown");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for Ctrl+C: {}", e);
            }
        })
        .await?;

    node.shutdown();
    node.join().await;

    Ok(())
}
