//! Application state trait for dependency injection
//!
//! Handlers are generic over this trait so the same code works with both
//! the production `AppState` and test implementations backed by mocks.

use crate::config::Config;
use crate::exchange::MailGateway;
use crate::graph::DirectoryApi;
use crate::service::ProvisioningService;

/// Trait for application state that provides the provisioning service.
pub trait ProvisioningState: Clone + Send + Sync + 'static {
    /// The directory client type
    type Directory: DirectoryApi;
    /// The mail gateway type
    type Mail: MailGateway;

    /// Get the application configuration
    fn config(&self) -> &Config;

    /// Get the provisioning orchestrator
    fn provisioner(&self) -> &ProvisioningService<Self::Directory, Self::Mail>;
}
