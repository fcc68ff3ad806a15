use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Outbound HTTP client connection pool configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct HttpClientConfig {
    /// Idle pooled connection timeout in seconds
    pub pool_idle_timeout_secs: Option<u64>,
    /// Maximum idle pooled connections per host
    pub pool_max_idle_per_host: Option<usize>,
}

impl HttpClientConfig {
    /// Validate HTTP client configuration
    pub fn validate(&self) -> Result<()> {
        if let Some(timeout) = self.pool_idle_timeout_secs {
            if timeout == 0 {
                return Err(anyhow::anyhow!(
                    "http_client pool_idle_timeout_secs must be greater than 0"
                ));
            }
        }

        Ok(())
    }
}
