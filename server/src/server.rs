use core::error::Error;
use std::{
    future::Future,
    net::SocketAddr,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use axum::{
    Router,
    http::{HeaderValue, header},
    routing::get,
};
use axum_server::{Handle, tls_rustls::RustlsConfig};
use log::{info, warn};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, services::ServeDir, set_header::SetResponseHeaderLayer};

use crate::{
    http_handler::{ConnectionInfo, connection_info, detect_local_ipv4, health},
    hub::Hub,
    ws_handler::{Heartbeat, ws_upgrade},
};

const HSTS: &str = "max-age=31536000; includeSubDomains";
const TLS_SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// PEM certificate chain and private key for serving HTTPS in-process.
#[derive(Debug, Clone)]
pub struct TlsFiles {
    pub cert: PathBuf,
    pub key: PathBuf,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub advertise_ip: Option<String>,
    /// Report https even without `tls`, for when a proxy terminates TLS.
    pub secure: bool,
    pub tls: Option<TlsFiles>,
    pub public_dir: Option<PathBuf>,
    pub outbound_queue: usize,
    pub heartbeat: Heartbeat,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            advertise_ip: None,
            secure: false,
            tls: None,
            public_dir: None,
            outbound_queue: 256,
            heartbeat: Heartbeat::default(),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub hub: Hub,
    pub connection_info: Arc<ConnectionInfo>,
    pub heartbeat: Heartbeat,
}

pub struct HuddleServer {
    listener: TcpListener,
    tls: Option<RustlsConfig>,
    state: AppState,
    public_dir: Option<PathBuf>,
}

impl HuddleServer {
    pub async fn bind(
        addr: &str,
        config: ServerConfig,
    ) -> Result<Self, Box<dyn Error + Send + Sync>> {
        let tls = match &config.tls {
            Some(files) => Some(RustlsConfig::from_pem_file(&files.cert, &files.key).await?),
            None => None,
        };

        let listener = TcpListener::bind(addr).await?;
        let port = listener.local_addr()?.port();
        let secure = tls.is_some() || config.secure;

        let ip = match config.advertise_ip {
            Some(ip) => ip,
            None => match detect_local_ipv4() {
                Some(ip) => ip.to_string(),
                None => {
                    warn!("Could not detect a LAN address, advertising localhost");
                    "localhost".to_string()
                }
            },
        };

        Ok(Self {
            listener,
            tls,
            state: AppState {
                hub: Hub::new(config.outbound_queue),
                connection_info: Arc::new(ConnectionInfo::new(ip, port, secure)),
                heartbeat: config.heartbeat,
            },
            public_dir: config.public_dir,
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn hub(&self) -> Hub {
        self.state.hub.clone()
    }

    pub fn serves_tls(&self) -> bool {
        self.tls.is_some()
    }

    pub fn router(state: AppState, public_dir: Option<&Path>) -> Router {
        let secure = state.connection_info.secure;

        let mut router = Router::new()
            .route("/ws", get(ws_upgrade))
            .route("/health", get(health))
            .route("/get-connection-info", get(connection_info))
            .with_state(state);

        if let Some(dir) = public_dir {
            router = router.fallback_service(ServeDir::new(dir));
        }

        if secure {
            router = router.layer(SetResponseHeaderLayer::overriding(
                header::STRICT_TRANSPORT_SECURITY,
                HeaderValue::from_static(HSTS),
            ));
        }

        router
            .layer(SetResponseHeaderLayer::overriding(
                header::X_CONTENT_TYPE_OPTIONS,
                HeaderValue::from_static("nosniff"),
            ))
            .layer(SetResponseHeaderLayer::overriding(
                header::X_FRAME_OPTIONS,
                HeaderValue::from_static("SAMEORIGIN"),
            ))
            .layer(SetResponseHeaderLayer::overriding(
                header::X_XSS_PROTECTION,
                HeaderValue::from_static("1; mode=block"),
            ))
            .layer(CorsLayer::permissive())
    }

    pub async fn listen<F>(self, shutdown: F) -> Result<(), Box<dyn Error + Send + Sync>>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if let Some(dir) = &self.public_dir {
            info!("Serving static files from {}", dir.display());
        }

        let router = Self::router(self.state, self.public_dir.as_deref());

        let Some(tls) = self.tls else {
            axum::serve(self.listener, router)
                .with_graceful_shutdown(shutdown)
                .await?;

            return Ok(());
        };

        info!("Serving HTTPS");

        let handle = Handle::new();
        let shutdown_handle = handle.clone();
        tokio::spawn(async move {
            shutdown.await;
            shutdown_handle.graceful_shutdown(Some(TLS_SHUTDOWN_GRACE));
        });

        axum_server::from_tcp_rustls(self.listener.into_std()?, tls)
            .handle(handle)
            .serve(router.into_make_service())
            .await?;

        return Ok(());
    }
}
