//! # Tunegate - 音乐API统一网关
//!
//! Tunegate是一个用Rust编写的HTTP网关，将一组独立编写的API处理模块
//! 统一暴露为REST接口，并提供二进制媒体直通代理。
//!
//! ## 核心功能
//!
//! - **路由映射**: 处理模块标识符到路径的转换，带显式覆盖表
//! - **请求归一化**: cookie、查询串、请求体、上传文件合并为统一查询对象
//! - **响应转换**: 统一的Answer结果到HTTP响应的映射
//! - **响应缓存**: 2分钟TTL、仅缓存200响应
//! - **媒体直通**: 固定的二进制媒体透传端点
//!
//! ## 使用示例
//!
//! ```rust,no_run
//! use tunegate::config::Config;
//! use tunegate::handler::HandlerRegistry;
//! use tunegate::server::GatewayServer;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_file_or_default("config/config.toml").await?;
//!     let registry = HandlerRegistry::new();
//!     // registry.register(...) for each handler module
//!     let server = GatewayServer::new(config, registry);
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod config;
pub mod cookies;
pub mod dispatch;
pub mod error;
pub mod handler;
pub mod media;
pub mod outbound;
pub mod query;
pub mod server;

// Re-export commonly used types
pub use cache::{CacheEntry, ResponseCache};
pub use config::Config;
pub use error::{GatewayError, GatewayResult};
pub use handler::{Answer, ApiHandler, HandlerRegistry, Verdict};
pub use outbound::OutboundClient;
pub use query::{QueryMap, QueryValue};
pub use server::{GatewayContext, GatewayServer};
