//! Configuration management for the provisioning service

use anyhow::{Context, Result};
use std::env;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server host
    pub http_host: String,
    /// HTTP server port
    pub http_port: u16,
    /// Microsoft Graph configuration
    pub graph: GraphConfig,
    /// Exchange Online configuration
    pub exchange: ExchangeConfig,
    /// Optional shared secret expected in the SecurityKey request header
    pub security_key: Option<String>,
    /// Usage location code stamped on every created user
    pub usage_location: String,
}

#[derive(Debug, Clone)]
pub struct GraphConfig {
    /// Default tenant used when a request does not carry a TenantId override
    pub tenant_id: String,
    /// Application (client) identifier
    pub client_id: String,
    /// Application secret for the client-credential grant
    pub client_secret: String,
    /// Graph API base URL (e.g. https://graph.microsoft.com/v1.0)
    pub base_url: String,
    /// Token authority base URL (e.g. https://login.microsoftonline.com)
    pub login_url: String,
}

#[derive(Debug, Clone)]
pub struct ExchangeConfig {
    /// Exchange Online admin API base URL (e.g. https://outlook.office365.com)
    pub base_url: String,
    /// Optional certificate thumbprint for certificate-based authentication
    pub cert_thumbprint: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            http_host: env::var("HTTP_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            http_port: env::var("HTTP_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("Invalid HTTP_PORT")?,
            graph: GraphConfig {
                tenant_id: env::var("GRAPH_TENANT_ID").context("GRAPH_TENANT_ID is required")?,
                client_id: env::var("GRAPH_CLIENT_ID").context("GRAPH_CLIENT_ID is required")?,
                client_secret: env::var("GRAPH_CLIENT_SECRET")
                    .context("GRAPH_CLIENT_SECRET is required")?,
                base_url: env::var("GRAPH_BASE_URL")
                    .unwrap_or_else(|_| "https://graph.microsoft.com/v1.0".to_string()),
                login_url: env::var("GRAPH_LOGIN_URL")
                    .unwrap_or_else(|_| "https://login.microsoftonline.com".to_string()),
            },
            exchange: ExchangeConfig {
                base_url: env::var("EXCHANGE_BASE_URL")
                    .unwrap_or_else(|_| "https://outlook.office365.com".to_string()),
                cert_thumbprint: env::var("EXCHANGE_CERT_THUMBPRINT").ok(),
            },
            security_key: env::var("SECURITY_KEY").ok().filter(|k| !k.is_empty()),
            usage_location: env::var("USAGE_LOCATION").unwrap_or_else(|_| "US".to_string()),
        })
    }

    /// Get HTTP server address
    pub fn http_addr(&self) -> String {
        format!("{}:{}", self.http_host, self.http_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            http_host: "127.0.0.1".to_string(),
            http_port: 8080,
            graph: GraphConfig {
                tenant_id: "a5c2e1f0-0000-0000-0000-000000000001".to_string(),
                client_id: "app-id".to_string(),
                client_secret: "app-secret".to_string(),
                base_url: "https://graph.microsoft.com/v1.0".to_string(),
                login_url: "https://login.microsoftonline.com".to_string(),
            },
            exchange: ExchangeConfig {
                base_url: "https://outlook.office365.com".to_string(),
                cert_thumbprint: None,
            },
            security_key: None,
            usage_location: "US".to_string(),
        }
    }

    #[test]
    fn test_config_http_addr() {
        let config = test_config();
        assert_eq!(config.http_addr(), "127.0.0.1:8080");
    }

    #[test]
    fn test_config_clone() {
        let config1 = test_config();
        let config2 = config1.clone();

        assert_eq!(config1.graph.tenant_id, config2.graph.tenant_id);
        assert_eq!(config1.usage_location, config2.usage_location);
    }

    #[test]
    fn test_config_debug() {
        let config = test_config();
        let debug_str = format!("{:?}", config);

        assert!(debug_str.contains("Config"));
        assert!(debug_str.contains("graph.microsoft.com"));
    }

    #[test]
    fn test_exchange_config_thumbprint_optional() {
        let mut config = test_config();
        assert!(config.exchange.cert_thumbprint.is_none());

        config.exchange.cert_thumbprint = Some("AB12CD34".to_string());
        assert_eq!(config.exchange.cert_thumbprint.as_deref(), Some("AB12CD34"));
    }
}
