//! Multi-workspace credential store for Jira.
//!
//! A *workspace* is a named credential profile for one Jira instance. The
//! [`WorkspaceStore`] persists profiles as files under a home directory and
//! tracks which one is active. The [`CredentialValidator`] confirms a profile
//! works by calling the instance's `myself` endpoint.
//!
//! # Example
//!
//! ```no_run
//! use jira_workspace::{AuthType, NewProfile, WorkspaceStore};
//! use secrecy::SecretString;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = WorkspaceStore::open("/tmp/jira-mcp").await?;
//! store
//!     .add(NewProfile {
//!         name: "acme".to_string(),
//!         site_url: "acme.atlassian.net".to_string(),
//!         email: Some("me@acme.io".to_string()),
//!         api_token: SecretString::from("my-api-token-123"),
//!         auth_type: AuthType::Cloud,
//!     })
//!     .await?;
//!
//! // The first workspace becomes active.
//! let active = store.credentials(None).await?;
//! assert_eq!(active.name, "acme");
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod atomic;
pub mod error;
pub mod profile;
pub mod store;
pub mod validator;

pub use error::{Result, StoreError};
pub use profile::{
    AuthType, NewProfile, ResolvedWorkspace, WorkspaceProfile, WorkspaceSummary, mask_secret,
};
pub use store::{AddOutcome, RemoveOutcome, SwitchOutcome, WorkspaceStore};
pub use validator::{CredentialValidator, ValidationErrorKind, ValidationResult};
