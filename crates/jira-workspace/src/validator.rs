//! Credential validation against the remote instance.

use crate::profile::WorkspaceProfile;
use crate::store::WorkspaceStore;
use chrono::Utc;
use jira_api::{ApiError, Connector};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Why a validation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ValidationErrorKind {
    /// The profile still holds skeleton placeholders.
    IncompleteCredentials,
    /// The instance rejected the credentials (HTTP 401).
    AuthenticationFailed,
    /// The instance could not be reached.
    Unreachable,
    /// The credentials are valid but lack permission (HTTP 403).
    Forbidden,
    /// Anything else.
    Unknown,
}

impl ValidationErrorKind {
    /// Stable name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::IncompleteCredentials => "IncompleteCredentials",
            Self::AuthenticationFailed => "AuthenticationFailed",
            Self::Unreachable => "Unreachable",
            Self::Forbidden => "Forbidden",
            Self::Unknown => "Unknown",
        }
    }

    fn classify(err: &ApiError) -> Self {
        match err {
            ApiError::Unauthorized(_) => Self::AuthenticationFailed,
            ApiError::Forbidden(_) => Self::Forbidden,
            ApiError::Unreachable { .. } => Self::Unreachable,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for ValidationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of validating one profile.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationResult {
    /// Workspace name.
    pub workspace: String,
    /// Whether the credentials work.
    pub ok: bool,
    /// Display name of the authenticated user.
    pub identity: Option<String>,
    /// Account id (Cloud) or username (Server).
    pub account_id: Option<String>,
    /// Failure classification.
    pub error: Option<ValidationErrorKind>,
    /// Human-readable outcome.
    pub message: String,
}

impl ValidationResult {
    fn failed(workspace: &str, kind: ValidationErrorKind, message: String) -> Self {
        Self {
            workspace: workspace.to_string(),
            ok: false,
            identity: None,
            account_id: None,
            error: Some(kind),
            message,
        }
    }
}

/// Checks profiles with one authenticated round trip each.
pub struct CredentialValidator {
    store: Arc<WorkspaceStore>,
    connector: Arc<dyn Connector>,
}

impl CredentialValidator {
    /// Create a validator that records successes in `store`.
    #[must_use]
    pub fn new(store: Arc<WorkspaceStore>, connector: Arc<dyn Connector>) -> Self {
        Self { store, connector }
    }

    /// Validate a profile.
    ///
    /// Never fails: every outcome, including a skeleton profile or an
    /// unreachable host, is reported in the returned [`ValidationResult`]. A
    /// skeleton is rejected without touching the network. On success
    /// `last_validated` is recorded in the store.
    pub async fn validate(&self, profile: &WorkspaceProfile) -> ValidationResult {
        let name = profile.name.as_str();

        if !profile.is_complete() {
            debug!(workspace = %name, "Skipping validation of incomplete workspace");
            return ValidationResult::failed(
                name,
                ValidationErrorKind::IncompleteCredentials,
                format!(
                    "Workspace '{name}' has placeholder values. Edit {} and try again",
                    self.store.profile_path(name).display()
                ),
            );
        }

        let api = match self.connector.connect(&profile.to_credentials()) {
            Ok(api) => api,
            Err(e) => {
                warn!(workspace = %name, error = %e, "Could not build client");
                return ValidationResult::failed(name, ValidationErrorKind::Unknown, e.to_string());
            }
        };

        match api.myself().await {
            Ok(user) => {
                if let Err(e) = self.store.mark_validated(name, Utc::now()).await {
                    warn!(workspace = %name, error = %e, "Could not record validation time");
                }
                let identity = user
                    .display_name
                    .clone()
                    .or_else(|| user.email_address.clone());
                info!(workspace = %name, "Workspace credentials validated");
                ValidationResult {
                    workspace: name.to_string(),
                    ok: true,
                    message: format!(
                        "Authenticated to {} as {}",
                        profile.site_url,
                        identity.as_deref().unwrap_or("unknown user")
                    ),
                    account_id: user.account_ref().map(str::to_string),
                    identity,
                    error: None,
                }
            }
            Err(e) => {
                let kind = ValidationErrorKind::classify(&e);
                warn!(workspace = %name, kind = %kind, error = %e, "Workspace validation failed");
                ValidationResult::failed(name, kind, e.to_string())
            }
        }
    }
}
