//! Graph wire type definitions

use serde::{Deserialize, Serialize};

/// Directory user representation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryUser {
    pub id: String,
    pub display_name: Option<String>,
    pub user_principal_name: String,
    #[serde(default)]
    pub assigned_licenses: Vec<AssignedLicense>,
}

/// A license SKU assigned to a user
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignedLicense {
    pub sku_id: String,
}

/// Input for creating a directory user
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDirectoryUser {
    pub account_enabled: bool,
    pub display_name: String,
    pub given_name: String,
    pub surname: String,
    pub mail_nickname: String,
    pub user_principal_name: String,
    pub usage_location: String,
    pub password_profile: PasswordProfile,
}

/// Password profile attached to a new user
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordProfile {
    pub password: String,
    pub force_change_password_next_sign_in: bool,
}

/// A directory object returned from a membership listing.
///
/// The `@odata.type` discriminator separates groups from other directory
/// objects (e.g. directory roles); group entries additionally carry the
/// mail-enabled / security-enabled flags.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryObjectRef {
    #[serde(rename = "@odata.type", default)]
    pub odata_type: String,
    pub id: String,
    pub display_name: Option<String>,
    pub mail: Option<String>,
    pub mail_enabled: Option<bool>,
    pub security_enabled: Option<bool>,
}

impl DirectoryObjectRef {
    /// True when the object is a directory group (not a role or other object)
    pub fn is_group(&self) -> bool {
        self.odata_type == "#microsoft.graph.group"
    }

    /// The identity used for mail-system membership changes: the group's
    /// mail address when present, otherwise its display name.
    pub fn mail_identity(&self) -> Option<&str> {
        self.mail
            .as_deref()
            .or(self.display_name.as_deref())
            .filter(|s| !s.is_empty())
    }
}

/// Paged membership listing response
#[derive(Debug, Deserialize)]
pub struct MemberOfResponse {
    #[serde(default)]
    pub value: Vec<DirectoryObjectRef>,
    #[serde(rename = "@odata.nextLink")]
    pub next_link: Option<String>,
}

/// Graph error envelope
#[derive(Debug, Deserialize)]
pub struct GraphErrorBody {
    pub error: GraphErrorDetail,
}

#[derive(Debug, Deserialize)]
pub struct GraphErrorDetail {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}
