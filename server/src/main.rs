use std::{path::PathBuf, process, time::Duration};

use clap::Parser;
use huddle_server::{
    server::{HuddleServer, ServerConfig, TlsFiles},
    ws_handler::Heartbeat,
};
use huddle_shared::DEFAULT_PORT;
use log::{error, info};
use tokio::signal;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    #[arg(long, env = "BIND_HOST", default_value = "0.0.0.0")]
    host: String,

    #[arg(short, long, env = "PORT", default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Address reported by /get-connection-info instead of the detected one
    #[arg(long, env = "ADVERTISE_IP")]
    advertise_ip: Option<String>,

    /// Report https; set when TLS is terminated in front of this server
    #[arg(long, env = "SECURE")]
    secure: bool,

    /// PEM certificate chain; serves HTTPS together with --tls-key
    #[arg(long, env = "TLS_CERT", requires = "tls_key")]
    tls_cert: Option<PathBuf>,

    #[arg(long, env = "TLS_KEY", requires = "tls_cert")]
    tls_key: Option<PathBuf>,

    #[arg(long, env = "PUBLIC_DIR")]
    public_dir: Option<PathBuf>,

    #[arg(long, env = "OUTBOUND_QUEUE", default_value_t = 256)]
    outbound_queue: usize,

    /// Seconds between WebSocket pings
    #[arg(long, env = "PING_INTERVAL", default_value_t = 25)]
    ping_interval: u64,

    /// Seconds of silence before a connection is dropped
    #[arg(long, env = "PING_TIMEOUT", default_value_t = 30)]
    ping_timeout: u64,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let addr = format!("{}:{}", args.host, args.port);
    let tls = match (args.tls_cert, args.tls_key) {
        (Some(cert), Some(key)) => Some(TlsFiles { cert, key }),
        _ => None,
    };
    let config = ServerConfig {
        advertise_ip: args.advertise_ip,
        secure: args.secure,
        tls,
        public_dir: args.public_dir,
        outbound_queue: args.outbound_queue,
        heartbeat: Heartbeat {
            interval: Duration::from_secs(args.ping_interval.max(1)),
            timeout: Duration::from_secs(args.ping_timeout.max(1)),
        },
    };

    let server = match HuddleServer::bind(&addr, config).await {
        Ok(server) => server,
        Err(e) => {
            error!("Error binding {}: {}", addr, e);
            process::exit(1);
        }
    };

    let scheme = if server.serves_tls() { "https" } else { "http" };
    info!("Huddle listening on {}://{}", scheme, addr);

    if let Err(e) = server.listen(shutdown_signal()).await {
        error!("{}", e);
        process::exit(1);
    }

    info!("Server stopped");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received SIGINT, shutting down..."),
            Err(e) => error!("Failed to listen for SIGINT: {}", e),
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received SIGTERM, shutting down...");
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
