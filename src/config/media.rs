use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Media passthrough proxy configuration
///
/// The proxy issues plain HTTP GETs against `http://{host}:{port}{path}?id=<id>`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MediaConfig {
    /// Remote host serving the binary media
    pub host: String,
    /// Remote port
    pub port: u16,
    /// Remote path template (the id is appended as a query parameter)
    pub path: String,
    /// Fixed Accept-Encoding header sent upstream
    pub accept_encoding: String,
    /// Fixed Accept-Language header sent upstream
    pub accept_language: String,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            host: "music.163.com".to_string(),
            port: 80,
            path: "/song/media/outer/url".to_string(),
            accept_encoding: "gzip, deflate, br".to_string(),
            accept_language: "zh-CN,zh;q=0.9".to_string(),
        }
    }
}

impl MediaConfig {
    /// Validate media proxy configuration
    pub fn validate(&self) -> Result<()> {
        if self.host.is_empty() {
            return Err(anyhow::anyhow!("Media host cannot be empty"));
        }

        if !self.path.starts_with('/') {
            return Err(anyhow::anyhow!("Media path must start with '/'"));
        }

        Ok(())
    }

    /// Build the remote URI for a media identifier
    pub fn remote_uri(&self, id: &str) -> String {
        format!("http://{}:{}{}?id={}", self.host, self.port, self.path, id)
    }
}
