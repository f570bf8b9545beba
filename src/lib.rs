//! User Provisioner - Directory Provisioning Service
//!
//! This crate provides an HTTP-triggered operation that creates a new
//! directory user modeled on an existing reference user: the reference
//! user's license assignments and group memberships are replicated onto
//! the new account via Microsoft Graph, with mail-enabled group
//! memberships handled through the Exchange Online admin API.

pub mod api;
pub mod config;
pub mod crypto;
pub mod domain;
pub mod error;
pub mod exchange;
pub mod graph;
pub mod server;
pub mod service;
pub mod state;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, Result};
