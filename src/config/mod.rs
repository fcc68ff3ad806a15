//! # 配置管理模块
//!
//! 提供tunegate网关的配置管理功能，包括：
//!
//! - TOML配置文件解析和验证
//! - 环境变量替换
//! - 类型安全的配置结构定义
//!
//! 主配置包含以下子模块：
//! - `server`: 服务器基础配置（监听地址）
//! - `cache`: 响应缓存配置
//! - `media`: 媒体直通代理的远端配置
//! - `http_client`: 上游HTTP客户端连接池配置

pub mod cache;
pub mod http_client;
pub mod media;
pub mod server;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use tracing::{info, warn};

pub use cache::CacheConfig;
pub use http_client::HttpClientConfig;
pub use media::MediaConfig;
pub use server::ServerConfig;

/// Main gateway configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    /// Server configuration (listen address)
    #[serde(default)]
    pub server: ServerConfig,
    /// Response cache configuration
    #[serde(default)]
    pub cache: CacheConfig,
    /// Media passthrough proxy configuration
    #[serde(default)]
    pub media: MediaConfig,
    /// Outbound HTTP client connection pool configuration (optional)
    #[serde(default)]
    pub http_client: Option<HttpClientConfig>,
}

impl Config {
    /// Load configuration from file with environment variable expansion
    pub async fn from_file_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = tokio::fs::read_to_string(path.as_ref()).await?;

        // Expand environment variables in the content
        let expanded_content = expand_env_vars(&content);

        let config: Config = toml::from_str(&expanded_content)?;
        config.validate()?;

        info!("Configuration loaded from {:?}", path.as_ref());
        Ok(config)
    }

    /// Load configuration from file, falling back to defaults when the file
    /// does not exist
    pub async fn from_file_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::from_file_with_env(path).await
        } else {
            warn!(
                "Configuration file {:?} not found, using built-in defaults",
                path.as_ref()
            );
            Ok(Self::default())
        }
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        self.cache.validate()?;
        self.media.validate()?;

        if let Some(http_client) = &self.http_client {
            http_client.validate()?;
        }

        Ok(())
    }
}

/// Expand environment variables in configuration content
/// Supports ${VAR} and ${VAR:-default} syntax
fn expand_env_vars(content: &str) -> String {
    let mut result = content.to_string();

    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_expr = &result[start + 2..start + end];
            let replacement = if let Some(default_pos) = var_expr.find(":-") {
                let var_name = &var_expr[..default_pos];
                let default_value = &var_expr[default_pos + 2..];
                env::var(var_name).unwrap_or_else(|_| default_value.to_string())
            } else {
                env::var(var_expr).unwrap_or_else(|_| {
                    warn!(
                        "Environment variable '{}' not found, using empty string",
                        var_expr
                    );
                    String::new()
                })
            };

            result.replace_range(start..start + end + 1, &replacement);
        } else {
            break; // Malformed ${VAR expression
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    /// Helper function to create a temporary config file
    fn create_temp_config_file(content: &str) -> NamedTempFile {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(content.as_bytes()).unwrap();
        temp_file.flush().unwrap();
        temp_file
    }

    #[tokio::test]
    async fn test_basic_config_loading() {
        let config_content = r#"
[server]
bind = "127.0.0.1:4001"

[cache]
enabled = true
max_size = 1048576
ttl = 120
metrics_enabled = false

[media]
host = "media.example.com"
port = 8080
path = "/song/media/outer/url"
accept_encoding = "gzip, deflate, br"
accept_language = "zh-CN,zh;q=0.9"
"#;

        let temp_file = create_temp_config_file(config_content);
        let config = Config::from_file_with_env(temp_file.path()).await.unwrap();

        assert_eq!(config.server.bind, "127.0.0.1:4001".parse().unwrap());
        assert_eq!(config.cache.ttl, 120);
        assert_eq!(config.media.host, "media.example.com");
        assert_eq!(config.media.port, 8080);
    }

    #[tokio::test]
    async fn test_missing_sections_use_defaults() {
        let temp_file = create_temp_config_file("[server]\nbind = \"0.0.0.0:9000\"\n");
        let config = Config::from_file_with_env(temp_file.path()).await.unwrap();

        assert_eq!(config.server.bind, "0.0.0.0:9000".parse().unwrap());
        assert_eq!(config.cache.ttl, 120);
        assert_eq!(config.media.host, "music.163.com");
    }

    #[tokio::test]
    async fn test_invalid_config_rejected() {
        let config_content = r#"
[cache]
enabled = true
max_size = 0
ttl = 120
metrics_enabled = true
"#;

        let temp_file = create_temp_config_file(config_content);
        let result = Config::from_file_with_env(temp_file.path()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_env_var_expansion() {
        env::set_var("TUNEGATE_TEST_MEDIA_HOST", "expanded.example.com");

        let config_content = r#"
[media]
host = "${TUNEGATE_TEST_MEDIA_HOST}"
port = 80
path = "/media"
accept_encoding = "gzip"
accept_language = "zh-CN"
"#;

        let temp_file = create_temp_config_file(config_content);
        let config = Config::from_file_with_env(temp_file.path()).await.unwrap();
        assert_eq!(config.media.host, "expanded.example.com");

        env::remove_var("TUNEGATE_TEST_MEDIA_HOST");
    }

    #[tokio::test]
    async fn test_env_var_default_value() {
        let config_content = r#"
[media]
host = "${TUNEGATE_TEST_UNSET_HOST:-fallback.example.com}"
port = 80
path = "/media"
accept_encoding = "gzip"
accept_language = "zh-CN"
"#;

        let temp_file = create_temp_config_file(config_content);
        let config = Config::from_file_with_env(temp_file.path()).await.unwrap();
        assert_eq!(config.media.host, "fallback.example.com");
    }

    #[tokio::test]
    async fn test_missing_file_falls_back_to_defaults() {
        let config = Config::from_file_or_default("does/not/exist.toml")
            .await
            .unwrap();
        assert_eq!(config.server.bind, "0.0.0.0:4001".parse().unwrap());
        assert!(config.cache.enabled);
    }
}
