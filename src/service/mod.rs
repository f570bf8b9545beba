//! Business logic services

pub mod provision;

pub use provision::{GroupOutcome, ProvisioningService, ReplicationOutcome};
