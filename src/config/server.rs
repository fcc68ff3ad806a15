use serde::{Deserialize, Serialize};

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Listen address for the gateway
    #[serde(default = "default_bind")]
    pub bind: std::net::SocketAddr,
}

fn default_bind() -> std::net::SocketAddr {
    "0.0.0.0:4001".parse().expect("default bind address is valid")
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind: default_bind() }
    }
}
