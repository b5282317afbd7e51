//! Operation handlers.
//!
//! Remote handlers receive a [`CallContext`] built once per call by the
//! router; they never look up credentials themselves.

pub mod issue;
pub mod project;
pub mod workspace;

use crate::error::Result;
use jira_api::JiraApi;
use jira_workspace::{AuthType, ResolvedWorkspace};
use serde::Serialize;
use serde_json::{Value, json};
use std::sync::Arc;

/// Everything a remote operation needs, resolved once per call.
pub struct CallContext {
    /// The workspace the call runs against.
    pub workspace: ResolvedWorkspace,
    /// Client connected with that workspace's credentials.
    pub api: Arc<dyn JiraApi>,
    /// Cap for list operations when the caller gives none.
    pub default_max_results: u32,
}

impl CallContext {
    /// Assignee reference in the shape the deployment expects.
    pub(crate) fn user_field(&self, user: &str) -> Value {
        match self.workspace.auth_type {
            AuthType::Cloud => json!({ "accountId": user }),
            AuthType::Pat => json!({ "name": user }),
        }
    }
}

pub(crate) fn to_json<T: Serialize>(value: &T) -> Result<Value> {
    Ok(serde_json::to_value(value)?)
}
