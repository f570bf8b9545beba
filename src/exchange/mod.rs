//! Exchange Online integration
//!
//! Mail-enabled group (distribution list) membership cannot be changed
//! through the directory API; it goes through the Exchange Online admin
//! endpoint instead. The [`MailGateway`] trait is the seam the
//! orchestrator uses; [`ExchangeClient`] is the production
//! implementation, which authenticates with the same app registration as
//! the Graph client.

use crate::config::{ExchangeConfig, GraphConfig};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::RwLock;

/// OAuth2 scope for the Exchange Online admin API
const EXCHANGE_SCOPE: &str = "https://outlook.office365.com/.default";

/// Operations the provisioning flow needs from the mail system.
///
/// The session is an explicit capability: `connect` must succeed before
/// `add_group_member` can be used, and `disconnect` releases it. A failed
/// `connect` is a normal, checked condition (mail-enabled groups are then
/// skipped), not an abort.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MailGateway: Send + Sync {
    /// Open an admin session for a tenant.
    async fn connect(&self, tenant: &str) -> Result<()>;

    /// Add a member to a distribution group, identified by mail address
    /// or display name.
    async fn add_group_member(&self, identity: &str, member: &str) -> Result<()>;

    /// Release the session. Never fails the overall operation.
    async fn disconnect(&self) -> Result<()>;
}

#[derive(Debug, Clone)]
struct AdminSession {
    tenant: String,
    access_token: String,
    expires_at: chrono::DateTime<chrono::Utc>,
}

/// Exchange Online admin API client
#[derive(Clone)]
pub struct ExchangeClient {
    config: ExchangeConfig,
    auth: GraphConfig,
    http_client: Client,
    session: Arc<RwLock<Option<AdminSession>>>,
}

impl ExchangeClient {
    /// Create a new Exchange client. The app registration from the Graph
    /// configuration supplies the client credentials.
    pub fn new(config: ExchangeConfig, auth: GraphConfig) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| AppError::Exchange(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            config,
            auth,
            http_client,
            session: Arc::new(RwLock::new(None)),
        })
    }
}

#[async_trait]
impl MailGateway for ExchangeClient {
    async fn connect(&self, tenant: &str) -> Result<()> {
        {
            let session = self.session.read().await;
            if let Some(ref s) = *session {
                if s.tenant == tenant
                    && s.expires_at > chrono::Utc::now() + chrono::Duration::seconds(30)
                {
                    return Ok(());
                }
            }
        }

        if let Some(thumbprint) = &self.config.cert_thumbprint {
            tracing::debug!("Certificate authentication configured ({})", thumbprint);
        }

        let token_url = format!("{}/{}/oauth2/v2.0/token", self.auth.login_url, tenant);

        let response = self
            .http_client
            .post(&token_url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", &self.auth.client_id),
                ("client_secret", &self.auth.client_secret),
                ("scope", EXCHANGE_SCOPE),
            ])
            .send()
            .await
            .map_err(|e| AppError::Exchange(format!("Failed to open admin session: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Exchange(format!(
                "Failed to open admin session: {} - {}",
                status, body
            )));
        }

        #[derive(Deserialize)]
        struct TokenResponse {
            access_token: String,
            expires_in: i64,
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AppError::Exchange(format!("Failed to parse token response: {}", e)))?;

        let mut session = self.session.write().await;
        *session = Some(AdminSession {
            tenant: tenant.to_string(),
            access_token: token.access_token,
            expires_at: chrono::Utc::now() + chrono::Duration::seconds(token.expires_in),
        });

        Ok(())
    }

    async fn add_group_member(&self, identity: &str, member: &str) -> Result<()> {
        let (tenant, token) = {
            let session = self.session.read().await;
            match *session {
                Some(ref s) => (s.tenant.clone(), s.access_token.clone()),
                None => {
                    return Err(AppError::Exchange(
                        "No active admin session".to_string(),
                    ))
                }
            }
        };

        let url = format!(
            "{}/adminapi/beta/{}/InvokeCommand",
            self.config.base_url, tenant
        );

        let body = serde_json::json!({
            "CmdletInput": {
                "CmdletName": "Add-DistributionGroupMember",
                "Parameters": {
                    "Identity": identity,
                    "Member": member
                }
            }
        });

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&token)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Exchange(format!("Failed to add group member: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::Exchange(format!(
                "Failed to add member to {}: {} - {}",
                identity, status, text
            )));
        }

        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        let mut session = self.session.write().await;
        *session = None;
        Ok(())
    }
}
