use std::net::{IpAddr, UdpSocket};

use axum::{Json, extract::State};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::server::AppState;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

/// Details a browser needs to share a join link with devices on the same network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionInfo {
    pub ip: String,
    pub port: u16,
    pub protocol: String,
    pub secure: bool,
}

impl ConnectionInfo {
    pub fn new(ip: String, port: u16, secure: bool) -> Self {
        let protocol = if secure { "https" } else { "http" };

        Self {
            ip,
            port,
            protocol: protocol.to_string(),
            secure,
        }
    }
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "UP".to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

pub async fn connection_info(State(state): State<AppState>) -> Json<ConnectionInfo> {
    Json(state.connection_info.as_ref().clone())
}

/// First non-loopback IPv4 address this host would route outbound traffic from.
/// No packet is sent; connecting a UDP socket only selects a route.
pub fn detect_local_ipv4() -> Option<IpAddr> {
    let socket = UdpSocket::bind("0.0.0.0:0").ok()?;
    socket.connect("192.0.2.1:9").ok()?;

    let ip = socket.local_addr().ok()?.ip();

    if ip.is_loopback() || ip.is_unspecified() {
        None
    } else {
        Some(ip)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secure_flag_selects_protocol() {
        assert_eq!(ConnectionInfo::new("10.0.0.4".to_string(), 3001, true).protocol, "https");
        assert_eq!(ConnectionInfo::new("10.0.0.4".to_string(), 3001, false).protocol, "http");
    }

    #[tokio::test]
    async fn health_reports_up() {
        let Json(response) = health().await;

        assert_eq!(response.status, "UP");
        assert!(chrono::DateTime::parse_from_rfc3339(&response.timestamp).is_ok());
    }
}
