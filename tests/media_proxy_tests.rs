use hyper::{Body, Client, Response, StatusCode};
use serde_json::Value;
use std::net::SocketAddr;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tunegate::config::{Config, MediaConfig};
use tunegate::handler::HandlerRegistry;
use tunegate::server::GatewayServer;

fn media_config_for(mock: &MockServer) -> MediaConfig {
    let addr = mock.address();
    MediaConfig {
        host: addr.ip().to_string(),
        port: addr.port(),
        path: "/song/media/outer/url".to_string(),
        accept_encoding: "gzip, deflate, br".to_string(),
        accept_language: "zh-CN,zh;q=0.9".to_string(),
    }
}

fn start_gateway(media: MediaConfig) -> SocketAddr {
    let mut config = Config::default();
    config.server.bind = "127.0.0.1:0".parse().unwrap();
    config.media = media;
    let server = GatewayServer::new(config, HandlerRegistry::new());
    let (addr, _handle) = server.start().unwrap();
    addr
}

async fn get(addr: SocketAddr, path_and_query: &str) -> Response<Body> {
    let client = Client::new();
    let uri = format!("http://{}{}", addr, path_and_query);
    client.get(uri.parse().unwrap()).await.unwrap()
}

#[tokio::test]
async fn test_missing_id_returns_403() {
    let remote = MockServer::start().await;
    let addr = start_gateway(media_config_for(&remote));

    let response = get(addr, "/getMusic").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let body = hyper::body::to_bytes(response.into_body()).await.unwrap();
    let parsed: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(parsed["error"], "id is required");

    // No outbound request may have been issued
    assert!(remote.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_valid_id_passes_remote_bytes_and_status_through() {
    let remote = MockServer::start().await;
    let payload: &[u8] = b"\x49\x44\x33\x04binary-mp3-bytes";

    Mock::given(method("GET"))
        .and(path("/song/media/outer/url"))
        .and(query_param("id", "33894312"))
        .and(header("accept-encoding", "gzip, deflate, br"))
        .and(header("accept-language", "zh-CN,zh;q=0.9"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "audio/mpeg")
                .set_body_bytes(payload),
        )
        .mount(&remote)
        .await;

    let addr = start_gateway(media_config_for(&remote));

    let response = get(addr, "/getMusic?id=33894312").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("content-type").unwrap(), "audio/mpeg");
    assert!(response.headers().contains_key("Access-Control-Allow-Origin"));

    let body = hyper::body::to_bytes(response.into_body()).await.unwrap();
    assert_eq!(&body[..], payload);
}

#[tokio::test]
async fn test_remote_error_status_passes_through() {
    let remote = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/song/media/outer/url"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such song"))
        .mount(&remote)
        .await;

    let addr = start_gateway(media_config_for(&remote));

    let response = get(addr, "/getMusic?id=999").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = hyper::body::to_bytes(response.into_body()).await.unwrap();
    assert_eq!(&body[..], b"no such song");
}

#[tokio::test]
async fn test_transport_failure_returns_500_with_diagnostic() {
    // Point the proxy at a port nothing listens on
    let media = MediaConfig {
        host: "127.0.0.1".to_string(),
        port: 1,
        path: "/song/media/outer/url".to_string(),
        accept_encoding: "gzip".to_string(),
        accept_language: "zh-CN".to_string(),
    };
    let addr = start_gateway(media);

    let response = get(addr, "/getMusic?id=42").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = hyper::body::to_bytes(response.into_body()).await.unwrap();
    let parsed: Value = serde_json::from_slice(&body).unwrap();
    assert!(parsed["error"].as_str().is_some_and(|s| !s.is_empty()));
}

#[tokio::test]
async fn test_media_route_is_not_cached() {
    let remote = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/song/media/outer/url"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"bytes".as_slice()))
        .mount(&remote)
        .await;

    let addr = start_gateway(media_config_for(&remote));

    get(addr, "/getMusic?id=7").await;
    get(addr, "/getMusic?id=7").await;

    // Both requests must reach the remote; the response cache never
    // intercepts the media route
    assert_eq!(remote.received_requests().await.unwrap().len(), 2);
}
