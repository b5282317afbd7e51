//! Operation router.
//!
//! Takes a tool name plus raw arguments, validates them into a typed
//! operation, resolves the workspace once if the operation is remote, and
//! hands off to the matching handler. Every failure leaves here as a
//! [`ToolFailure`].

use crate::config::ServerConfig;
use crate::error::{Result, ToolFailure};
use crate::handlers::{self, CallContext};
use crate::operations::{
    IssueOperation, OperationGroup, ProjectOperation, ToolGroup, WorkspaceOperation, parse_request,
};
use jira_api::Connector;
use jira_workspace::{CredentialValidator, WorkspaceStore};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, warn};

/// Routes tool calls to handlers.
pub struct Router {
    store: Arc<WorkspaceStore>,
    connector: Arc<dyn Connector>,
    validator: CredentialValidator,
    config: ServerConfig,
}

impl Router {
    /// Create a router over `store`, building clients with `connector`.
    #[must_use]
    pub fn new(
        store: Arc<WorkspaceStore>,
        connector: Arc<dyn Connector>,
        config: ServerConfig,
    ) -> Self {
        let validator = CredentialValidator::new(Arc::clone(&store), Arc::clone(&connector));
        Self {
            store,
            connector,
            validator,
            config,
        }
    }

    /// The workspace store.
    #[must_use]
    pub fn store(&self) -> &Arc<WorkspaceStore> {
        &self.store
    }

    /// Server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub(crate) fn validator(&self) -> &CredentialValidator {
        &self.validator
    }

    /// Handle one tool call.
    ///
    /// # Errors
    ///
    /// Returns a [`ToolFailure`] for unknown tools or operations, parameter
    /// problems (detected before any credential lookup or network call),
    /// workspace resolution failures and Jira errors.
    pub async fn dispatch(
        &self,
        tool: &str,
        args: Map<String, Value>,
    ) -> std::result::Result<Value, ToolFailure> {
        self.route(tool, args).await.map_err(|e| {
            warn!(tool = %tool, error_kind = %e.kind(), error = %e, "Tool call failed");
            e.to_failure()
        })
    }

    async fn route(&self, tool: &str, args: Map<String, Value>) -> Result<Value> {
        match tool.parse::<ToolGroup>()? {
            ToolGroup::Workspace => {
                let request = parse_request::<WorkspaceOperation>(args)?;
                debug!(tool = %tool, operation = request.operation.name(), "Dispatching");
                let ctx = if request.remote {
                    Some(self.connect(request.workspace.as_deref()).await?)
                } else {
                    None
                };
                handlers::workspace::handle(request.operation, self, ctx.as_ref()).await
            }
            ToolGroup::Projects => {
                let request = parse_request::<ProjectOperation>(args)?;
                debug!(tool = %tool, operation = request.operation.name(), "Dispatching");
                let ctx = self.connect(request.workspace.as_deref()).await?;
                handlers::project::handle(request.operation, &ctx).await
            }
            ToolGroup::Issues => {
                let request = parse_request::<IssueOperation>(args)?;
                debug!(tool = %tool, operation = request.operation.name(), "Dispatching");
                let ctx = self.connect(request.workspace.as_deref()).await?;
                handlers::issue::handle(request.operation, &ctx).await
            }
        }
    }

    /// Resolve a workspace (the active one when `None`) and connect to it.
    pub(crate) async fn connect(&self, workspace: Option<&str>) -> Result<CallContext> {
        let workspace = self.store.credentials(workspace).await?;
        let api = self.connector.connect(&workspace.credentials)?;
        debug!(workspace = %workspace.name, site = %workspace.site_url, "Resolved workspace");
        Ok(CallContext {
            workspace,
            api,
            default_max_results: self.config.default_max_results,
        })
    }
}
