use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Response cache configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    /// Enable/disable caching
    pub enabled: bool,
    /// Maximum cache size in bytes
    pub max_size: u64,
    /// TTL for cached responses in seconds
    pub ttl: u64,
    /// Enable cache metrics
    pub metrics_enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_size: 64 * 1024 * 1024, // 64MB
            ttl: 120,                   // 2 minutes
            metrics_enabled: true,
        }
    }
}

impl CacheConfig {
    /// Validate cache configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_size == 0 {
            return Err(anyhow::anyhow!("Cache max_size must be greater than 0"));
        }

        if self.ttl == 0 {
            return Err(anyhow::anyhow!("Cache ttl must be greater than 0"));
        }

        Ok(())
    }
}
