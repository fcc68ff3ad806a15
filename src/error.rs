use thiserror::Error;

/// Main error type for the tunegate gateway
#[derive(Error, Debug, Clone)]
pub enum GatewayError {
    /// Configuration related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Network related errors (outbound transport)
    #[error("Network error: {message}")]
    Network { message: String },

    /// Route registration errors
    #[error("Route error: {message}")]
    Route { message: String },

    /// Request normalization errors
    #[error("Request error: {message}")]
    Request { message: String },

    /// Cache errors
    #[error("Cache error: {message}")]
    Cache { message: String },

    /// Internal server errors
    #[error("Internal server error: {message}")]
    Internal { message: String },
}

impl GatewayError {
    /// Create a configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a network error
    pub fn network<S: Into<String>>(message: S) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Create a route error
    pub fn route<S: Into<String>>(message: S) -> Self {
        Self::Route {
            message: message.into(),
        }
    }

    /// Create a request error
    pub fn request<S: Into<String>>(message: S) -> Self {
        Self::Request {
            message: message.into(),
        }
    }

    /// Create a cache error
    pub fn cache<S: Into<String>>(message: S) -> Self {
        Self::Cache {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

/// Result type alias for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Convert from std::io::Error to GatewayError
impl From<std::io::Error> for GatewayError {
    fn from(err: std::io::Error) -> Self {
        GatewayError::internal(format!("IO error: {}", err))
    }
}

/// Convert from hyper::Error to GatewayError
impl From<hyper::Error> for GatewayError {
    fn from(err: hyper::Error) -> Self {
        if err.is_connect() {
            GatewayError::network(format!("Connection error: {}", err))
        } else {
            GatewayError::network(format!("HTTP error: {}", err))
        }
    }
}

/// Convert from toml::de::Error to GatewayError
impl From<toml::de::Error> for GatewayError {
    fn from(err: toml::de::Error) -> Self {
        GatewayError::config(format!("TOML parsing error: {}", err))
    }
}

/// Convert from serde_json::Error to GatewayError
impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        GatewayError::internal(format!("JSON serialization error: {}", err))
    }
}

/// Convert from hyper::http::uri::InvalidUri to GatewayError
impl From<hyper::http::uri::InvalidUri> for GatewayError {
    fn from(err: hyper::http::uri::InvalidUri) -> Self {
        GatewayError::config(format!("Invalid URI: {}", err))
    }
}

/// Convert from hyper::http::Error to GatewayError
impl From<hyper::http::Error> for GatewayError {
    fn from(err: hyper::http::Error) -> Self {
        GatewayError::network(format!("HTTP error: {}", err))
    }
}
