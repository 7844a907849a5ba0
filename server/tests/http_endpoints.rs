use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use huddle_server::{
    http_handler::{ConnectionInfo, HealthResponse},
    hub::Hub,
    server::{AppState, HuddleServer},
    ws_handler::Heartbeat,
};
use tower::ServiceExt;

fn test_state(secure: bool) -> AppState {
    AppState {
        hub: Hub::new(8),
        connection_info: Arc::new(ConnectionInfo::new("192.168.1.20".to_string(), 3001, secure)),
        heartbeat: Heartbeat::default(),
    }
}

async fn get_from(state: AppState, uri: &str) -> axum::response::Response {
    HuddleServer::router(state, None)
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn get(uri: &str) -> axum::response::Response {
    get_from(test_state(false), uri).await
}

#[tokio::test]
async fn health_is_up() {
    let response = get("/health").await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let health: HealthResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(health.status, "UP");
}

#[tokio::test]
async fn connection_info_reports_advertised_address() {
    let response = get("/get-connection-info").await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let info: ConnectionInfo = serde_json::from_slice(&body).unwrap();
    assert_eq!(
        info,
        ConnectionInfo {
            ip: "192.168.1.20".to_string(),
            port: 3001,
            protocol: "http".to_string(),
            secure: false,
        }
    );
}

#[tokio::test]
async fn responses_carry_security_headers() {
    let response = get("/health").await;

    assert_eq!(
        response.headers().get(header::X_CONTENT_TYPE_OPTIONS).unwrap(),
        "nosniff"
    );
    assert_eq!(
        response.headers().get(header::X_FRAME_OPTIONS).unwrap(),
        "SAMEORIGIN"
    );
    assert_eq!(
        response.headers().get(header::X_XSS_PROTECTION).unwrap(),
        "1; mode=block"
    );
    assert!(response.headers().get(header::STRICT_TRANSPORT_SECURITY).is_none());
}

#[tokio::test]
async fn secure_origin_sends_hsts() {
    let response = get_from(test_state(true), "/health").await;

    assert_eq!(
        response.headers().get(header::STRICT_TRANSPORT_SECURITY).unwrap(),
        "max-age=31536000; includeSubDomains"
    );
}

#[tokio::test]
async fn unknown_paths_are_not_found_without_public_dir() {
    let response = get("/room.html").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
