//! Microsoft Graph API client
//!
//! This module provides a client for the Graph endpoints the provisioning
//! flow consumes. It handles client-credential authentication with
//! per-tenant token caching, user lookup and creation, license
//! assignment, and group membership operations.

use crate::config::GraphConfig;
use crate::error::{AppError, Result};
use crate::graph::{
    DirectoryApi, DirectoryObjectRef, DirectoryUser, MemberOfResponse, NewDirectoryUser,
};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// OAuth2 scope for the Graph client-credential grant
const GRAPH_SCOPE: &str = "https://graph.microsoft.com/.default";

/// Microsoft Graph API client
#[derive(Clone)]
pub struct GraphClient {
    config: GraphConfig,
    http_client: Client,
    tokens: Arc<RwLock<HashMap<String, AppToken>>>,
}

#[derive(Debug, Clone)]
struct AppToken {
    access_token: String,
    expires_at: chrono::DateTime<chrono::Utc>,
}

impl GraphClient {
    /// Create a new Graph client
    pub fn new(config: GraphConfig) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| AppError::Graph(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            config,
            http_client,
            tokens: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    /// Get an app access token for a tenant (with caching)
    async fn get_app_token(&self, tenant: &str) -> Result<String> {
        {
            let tokens = self.tokens.read().await;
            if let Some(t) = tokens.get(tenant) {
                if t.expires_at > chrono::Utc::now() + chrono::Duration::seconds(30) {
                    return Ok(t.access_token.clone());
                }
            }
        }

        let token_url = format!("{}/{}/oauth2/v2.0/token", self.config.login_url, tenant);

        let response = self
            .http_client
            .post(&token_url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", &self.config.client_id),
                ("client_secret", &self.config.client_secret),
                ("scope", GRAPH_SCOPE),
            ])
            .send()
            .await
            .map_err(|e| AppError::Graph(format!("Failed to get app token: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Graph(format!(
                "Failed to get app token: {} - {}",
                status, body
            )));
        }

        #[derive(Deserialize)]
        struct TokenResponse {
            access_token: String,
            expires_in: i64,
        }

        let token_response: TokenResponse = response
            .json()
            .await
            .map_err(|e| AppError::Graph(format!("Failed to parse token response: {}", e)))?;

        let token = AppToken {
            access_token: token_response.access_token.clone(),
            expires_at: chrono::Utc::now() + chrono::Duration::seconds(token_response.expires_in),
        };

        {
            let mut tokens = self.tokens.write().await;
            tokens.insert(tenant.to_string(), token);
        }

        Ok(token_response.access_token)
    }

    /// Extract the service error message from a failed response
    async fn error_text(response: reqwest::Response) -> String {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        match serde_json::from_str::<crate::graph::GraphErrorBody>(&body) {
            Ok(parsed) => format!("{} - {}: {}", status, parsed.error.code, parsed.error.message),
            Err(_) => format!("{} - {}", status, body),
        }
    }
}

#[async_trait]
impl DirectoryApi for GraphClient {
    async fn find_user(&self, tenant: &str, principal: &str) -> Result<DirectoryUser> {
        let token = self.get_app_token(tenant).await?;
        let url = format!(
            "{}/users/{}?$select=id,displayName,userPrincipalName,assignedLicenses",
            self.config.base_url, principal
        );

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|e| AppError::Graph(format!("Failed to get user: {}", e)))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(AppError::NotFound(format!(
                "User {} not found in directory",
                principal
            )));
        }

        if !response.status().is_success() {
            return Err(AppError::Graph(format!(
                "Failed to get user: {}",
                Self::error_text(response).await
            )));
        }

        let user: DirectoryUser = response
            .json()
            .await
            .map_err(|e| AppError::Graph(format!("Failed to parse user: {}", e)))?;

        Ok(user)
    }

    async fn create_user(&self, tenant: &str, input: &NewDirectoryUser) -> Result<DirectoryUser> {
        let token = self.get_app_token(tenant).await?;
        let url = format!("{}/users", self.config.base_url);

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&token)
            .json(input)
            .send()
            .await
            .map_err(|e| AppError::Graph(format!("Failed to create user: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Graph(format!(
                "Failed to create user: {}",
                Self::error_text(response).await
            )));
        }

        let user: DirectoryUser = response
            .json()
            .await
            .map_err(|e| AppError::Graph(format!("Failed to parse created user: {}", e)))?;

        Ok(user)
    }

    async fn assign_license(&self, tenant: &str, user_id: &str, sku_id: &str) -> Result<()> {
        let token = self.get_app_token(tenant).await?;
        let url = format!("{}/users/{}/assignLicense", self.config.base_url, user_id);

        let body = serde_json::json!({
            "addLicenses": [{ "skuId": sku_id }],
            "removeLicenses": []
        });

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&token)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Graph(format!("Failed to assign license: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Graph(format!(
                "Failed to assign license {}: {}",
                sku_id,
                Self::error_text(response).await
            )));
        }

        Ok(())
    }

    async fn list_memberships(
        &self,
        tenant: &str,
        user_id: &str,
    ) -> Result<Vec<DirectoryObjectRef>> {
        let token = self.get_app_token(tenant).await?;
        let mut url = format!("{}/users/{}/memberOf", self.config.base_url, user_id);
        let mut memberships = Vec::new();

        // Follow paging links; ordering within and across pages is the
        // directory's ordering.
        loop {
            let response = self
                .http_client
                .get(&url)
                .bearer_auth(&token)
                .send()
                .await
                .map_err(|e| AppError::Graph(format!("Failed to list memberships: {}", e)))?;

            if !response.status().is_success() {
                return Err(AppError::Graph(format!(
                    "Failed to list memberships: {}",
                    Self::error_text(response).await
                )));
            }

            let page: MemberOfResponse = response
                .json()
                .await
                .map_err(|e| AppError::Graph(format!("Failed to parse memberships: {}", e)))?;

            memberships.extend(page.value);

            match page.next_link {
                Some(next) => url = next,
                None => break,
            }
        }

        Ok(memberships)
    }

    async fn add_group_member(&self, tenant: &str, group_id: &str, user_id: &str) -> Result<()> {
        let token = self.get_app_token(tenant).await?;
        let url = format!("{}/groups/{}/members/$ref", self.config.base_url, group_id);

        let body = serde_json::json!({
            "@odata.id": format!("{}/directoryObjects/{}", self.config.base_url, user_id)
        });

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&token)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Graph(format!("Failed to add group member: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Graph(format!(
                "Failed to add member to group {}: {}",
                group_id,
                Self::error_text(response).await
            )));
        }

        Ok(())
    }
}
