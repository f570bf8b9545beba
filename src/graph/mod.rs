//! Microsoft Graph directory integration
//!
//! The [`DirectoryApi`] trait is the seam between the orchestrator and the
//! directory service; [`GraphClient`] is the production implementation.

mod client;
mod types;

pub use client::GraphClient;
pub use types::*;

use crate::error::Result;
use async_trait::async_trait;

/// Operations the provisioning flow needs from the identity directory.
///
/// All calls are tenant-scoped because a request may override the
/// configured default tenant.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DirectoryApi: Send + Sync {
    /// Resolve a user by principal name, including assigned licenses.
    async fn find_user(&self, tenant: &str, principal: &str) -> Result<DirectoryUser>;

    /// Create a new user record.
    async fn create_user(&self, tenant: &str, input: &NewDirectoryUser) -> Result<DirectoryUser>;

    /// Assign a single license SKU to a user. One call per SKU; each
    /// outcome is independent.
    async fn assign_license(&self, tenant: &str, user_id: &str, sku_id: &str) -> Result<()>;

    /// List the directory objects a user is a member of, in directory order.
    async fn list_memberships(&self, tenant: &str, user_id: &str)
        -> Result<Vec<DirectoryObjectRef>>;

    /// Add a user as a member of a directory group.
    async fn add_group_member(&self, tenant: &str, group_id: &str, user_id: &str) -> Result<()>;
}
