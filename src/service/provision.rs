//! Provisioning orchestration
//!
//! Sequences the directory-read, user-creation, license-assignment and
//! group-replication steps. Only the reference-user lookup and the user
//! creation are fatal; every per-item step is best-effort and recorded in
//! counters. A created user is never rolled back.

use crate::config::Config;
use crate::crypto::generate_temp_password;
use crate::domain::{ProvisionResult, ValidatedRequest};
use crate::error::AppError;
use crate::exchange::MailGateway;
use crate::graph::{DirectoryApi, NewDirectoryUser, PasswordProfile};
use std::sync::Arc;
use tracing::{info, warn};

/// Outcome of a per-item replication pass: a fold over the item sequence
/// with no early exit.
#[derive(Debug, Default)]
pub struct ReplicationOutcome {
    pub succeeded: u32,
    pub failed: u32,
    pub failures: Vec<(String, String)>,
}

impl ReplicationOutcome {
    fn record_failure(&mut self, item: &str, reason: String) {
        self.failed += 1;
        self.failures.push((item.to_string(), reason));
    }
}

/// Group replication counters. Security and mail-enabled additions are
/// counted separately because they go through different APIs.
#[derive(Debug, Default)]
pub struct GroupOutcome {
    pub security_added: u32,
    pub mail_added: u32,
    pub failed: u32,
    pub failures: Vec<(String, String)>,
}

impl GroupOutcome {
    fn record_failure(&mut self, item: &str, reason: String) {
        self.failed += 1;
        self.failures.push((item.to_string(), reason));
    }
}

/// Orchestrates the provision-like-user operation
pub struct ProvisioningService<D: DirectoryApi, M: MailGateway> {
    directory: Arc<D>,
    mail: Arc<M>,
    config: Arc<Config>,
}

impl<D: DirectoryApi, M: MailGateway> ProvisioningService<D, M> {
    pub fn new(directory: Arc<D>, mail: Arc<M>, config: Arc<Config>) -> Self {
        Self {
            directory,
            mail,
            config,
        }
    }

    /// Run the full provisioning sequence for a validated request.
    ///
    /// Always produces a `ProvisionResult`; fatal steps short-circuit with
    /// a 500-coded result, everything else degrades to counters.
    pub async fn provision(&self, request: &ValidatedRequest) -> ProvisionResult {
        let tenant = &request.tenant_id;

        // 1. Resolve the reference user (fatal if absent).
        let reference = match self
            .directory
            .find_user(tenant, &request.existing_user_email)
            .await
        {
            Ok(user) => user,
            Err(AppError::NotFound(_)) => {
                return ProvisionResult::failure(
                    format!(
                        "Reference user {} was not found in the directory",
                        request.existing_user_email
                    ),
                    &request.ticket_id,
                );
            }
            Err(e) => {
                return ProvisionResult::failure(
                    format!(
                        "Failed to read reference user {}: {}",
                        request.existing_user_email, e
                    ),
                    &request.ticket_id,
                );
            }
        };

        // 2-3. Create the target user with a temporary password (fatal on
        // rejection; the service error text is surfaced to the caller).
        let mail_nickname = request
            .new_user_email
            .split('@')
            .next()
            .unwrap_or(&request.new_user_email)
            .to_string();

        let input = NewDirectoryUser {
            account_enabled: true,
            display_name: request.display_name.clone(),
            given_name: request.first_name.clone(),
            surname: request.last_name.clone(),
            mail_nickname,
            user_principal_name: request.new_user_email.clone(),
            usage_location: self.config.usage_location.clone(),
            password_profile: PasswordProfile {
                password: generate_temp_password(),
                force_change_password_next_sign_in: true,
            },
        };

        let created = match self.directory.create_user(tenant, &input).await {
            Ok(user) => user,
            Err(e) => {
                return ProvisionResult::failure(
                    format!("Failed to create user {}: {}", request.new_user_email, e),
                    &request.ticket_id,
                );
            }
        };

        info!(
            "Created user {} ({}) modeled on {}",
            created.user_principal_name, created.id, reference.user_principal_name
        );

        // 4. Replicate license assignments, one call per SKU. A rejected
        // SKU (e.g. no seats left) is counted and skipped.
        let mut licenses = ReplicationOutcome::default();
        for license in &reference.assigned_licenses {
            match self
                .directory
                .assign_license(tenant, &created.id, &license.sku_id)
                .await
            {
                Ok(()) => licenses.succeeded += 1,
                Err(e) => {
                    warn!(
                        "Skipping license {} for {}: {}",
                        license.sku_id, created.user_principal_name, e
                    );
                    licenses.record_failure(&license.sku_id, e.to_string());
                }
            }
        }

        // 5. Read the reference user's memberships; a listing failure
        // degrades to an empty set rather than aborting.
        let memberships = match self.directory.list_memberships(tenant, &reference.id).await {
            Ok(memberships) => memberships,
            Err(e) => {
                warn!(
                    "Failed to list group memberships of {}: {}",
                    reference.user_principal_name, e
                );
                Vec::new()
            }
        };

        // Open the mail session proactively; without it, mail-enabled
        // groups simply fail with no fallback.
        let mail_available = match self.mail.connect(tenant).await {
            Ok(()) => true,
            Err(e) => {
                warn!(
                    "Mail session unavailable, mail-enabled groups will not be replicated: {}",
                    e
                );
                false
            }
        };

        // 6. Replicate memberships in directory order, filtering out
        // non-group objects such as directory roles.
        let mut groups = GroupOutcome::default();
        for object in memberships.iter().filter(|o| o.is_group()) {
            let label = object.display_name.as_deref().unwrap_or(&object.id);

            match self
                .directory
                .add_group_member(tenant, &object.id, &created.id)
                .await
            {
                Ok(()) => groups.security_added += 1,
                Err(primary_err) => {
                    let reason = primary_err.to_string();
                    if mail_available && indicates_mail_enabled(&reason) {
                        match object.mail_identity() {
                            Some(identity) => {
                                match self
                                    .mail
                                    .add_group_member(identity, &request.new_user_email)
                                    .await
                                {
                                    Ok(()) => groups.mail_added += 1,
                                    Err(mail_err) => {
                                        warn!(
                                            "Failed to add {} to mail group {}: {}",
                                            request.new_user_email, label, mail_err
                                        );
                                        groups.record_failure(label, mail_err.to_string());
                                    }
                                }
                            }
                            None => {
                                warn!("Mail group {} has no resolvable identity", label);
                                groups.record_failure(label, reason);
                            }
                        }
                    } else {
                        warn!(
                            "Failed to add {} to group {}: {}",
                            request.new_user_email, label, reason
                        );
                        groups.record_failure(label, reason);
                    }
                }
            }
        }

        // 7. Release the mail session if one was opened; release errors
        // never affect the outcome.
        if mail_available {
            if let Err(e) = self.mail.disconnect().await {
                warn!("Failed to release mail session: {}", e);
            }
        }

        // 8. Compose the final summary.
        let message = format!(
            "Created {} modeled on {}. Licenses assigned: {}, skipped: {}. \
             Groups added: {} security, {} mail-enabled, {} failed.",
            request.new_user_email,
            request.existing_user_email,
            licenses.succeeded,
            licenses.failed,
            groups.security_added,
            groups.mail_added,
            groups.failed
        );

        info!("{}", message);
        ProvisionResult::success(message, &request.ticket_id)
    }
}

/// Whether a directory failure reason indicates the target group is
/// mail-enabled or a distribution list, i.e. membership must go through
/// the mail system.
fn indicates_mail_enabled(reason: &str) -> bool {
    let lower = reason.to_lowercase();
    lower.contains("mail-enabled") || lower.contains("distribution")
}
