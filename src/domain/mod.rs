//! Trigger contract types: provisioning request, validation, and result

use crate::config::Config;
use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Incoming provisioning request body.
///
/// Field names follow the trigger contract, not Rust convention.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProvisionRequest {
    #[serde(default)]
    pub new_user_email: String,
    #[serde(default)]
    pub existing_user_email: String,
    #[serde(default)]
    pub new_user_first_name: String,
    #[serde(default)]
    pub new_user_last_name: String,
    #[serde(default)]
    pub new_user_display_name: Option<String>,
    #[serde(default)]
    pub tenant_id: Option<String>,
    #[serde(default)]
    pub ticket_id: Option<String>,
    #[serde(default)]
    pub security_key: Option<String>,
}

/// A provisioning request that has passed validation and normalization.
#[derive(Debug, Clone)]
pub struct ValidatedRequest {
    pub new_user_email: String,
    pub existing_user_email: String,
    pub first_name: String,
    pub last_name: String,
    pub display_name: String,
    pub tenant_id: String,
    pub ticket_id: String,
}

impl ProvisionRequest {
    /// Validate required fields and normalize optional ones.
    ///
    /// Required fields must be non-blank; the error message names the
    /// offending contract field. Email and tenant values are trimmed,
    /// the display name defaults to "first last", and the tenant falls
    /// back to the configured default.
    pub fn validate(&self, config: &Config) -> Result<ValidatedRequest> {
        let new_user_email = required(&self.new_user_email, "NewUserEmail")?;
        let existing_user_email = required(&self.existing_user_email, "ExistingUserEmail")?;
        let first_name = required(&self.new_user_first_name, "NewUserFirstName")?;
        let last_name = required(&self.new_user_last_name, "NewUserLastName")?;

        let display_name = match self.new_user_display_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!("{} {}", first_name, last_name),
        };

        let tenant_id = match self.tenant_id.as_deref().map(str::trim) {
            Some(tenant) if !tenant.is_empty() => {
                Uuid::parse_str(tenant).map_err(|_| {
                    AppError::Validation(format!("TenantId '{}' is not a valid GUID", tenant))
                })?;
                tenant.to_string()
            }
            _ => config.graph.tenant_id.clone(),
        };

        let ticket_id = self.ticket_id.clone().unwrap_or_default();

        Ok(ValidatedRequest {
            new_user_email,
            existing_user_email,
            first_name,
            last_name,
            display_name,
            tenant_id,
            ticket_id,
        })
    }
}

fn required(value: &str, field: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}

/// Outcome artifact returned to the caller.
///
/// The transport status is always HTTP 200; the business outcome lives in
/// `ResultCode` / `ResultStatus`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProvisionResult {
    pub message: String,
    pub ticket_id: String,
    pub result_code: u16,
    pub result_status: String,
}

impl ProvisionResult {
    /// Build a result; the status string is derived purely from the code.
    pub fn new(message: impl Into<String>, ticket_id: impl Into<String>, result_code: u16) -> Self {
        let result_status = if result_code == 200 {
            "Success".to_string()
        } else {
            "Failure".to_string()
        };
        Self {
            message: message.into(),
            ticket_id: ticket_id.into(),
            result_code,
            result_status,
        }
    }

    pub fn success(message: impl Into<String>, ticket_id: impl Into<String>) -> Self {
        Self::new(message, ticket_id, 200)
    }

    pub fn failure(message: impl Into<String>, ticket_id: impl Into<String>) -> Self {
        Self::new(message, ticket_id, 500)
    }
}
