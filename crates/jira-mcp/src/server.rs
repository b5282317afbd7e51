//! MCP server implementation.
//!
//! Registers the three tools with rmcp and forwards every call to the
//! [`Router`]. Tool failures are returned as error results carrying a
//! [`ToolFailure`](crate::error::ToolFailure) body, not as protocol errors.

use crate::config::ServerConfig;
use crate::operations::{OPERATION_PARAM, ToolGroup};
use crate::router::Router;
use jira_api::Connector;
use jira_workspace::WorkspaceStore;
use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::{ErrorData as McpError, handler::server::ServerHandler, tool, tool_handler, tool_router};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Arguments shared by every tool: an operation name plus that operation's
/// parameters, flat.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct ToolArguments {
    /// Operation to run. See the tool description for valid names.
    #[serde(default)]
    pub operation: Option<String>,

    /// Operation parameters. Remote operations also accept `workspace` to
    /// run against a named workspace instead of the active one.
    #[serde(flatten)]
    pub params: Map<String, Value>,
}

impl ToolArguments {
    fn into_map(self) -> Map<String, Value> {
        let mut args = self.params;
        if let Some(operation) = self.operation {
            args.insert(OPERATION_PARAM.to_string(), Value::String(operation));
        }
        args
    }
}

/// The Jira MCP server.
#[derive(Clone)]
pub struct JiraMcpServer {
    router: Arc<Router>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl JiraMcpServer {
    /// Workspace management and connectivity.
    #[tool(
        description = "Manage Jira workspaces (named credential profiles) and check connectivity. Operations: add_workspace, list_workspaces, get_active_workspace, switch_workspace, validate_workspace, remove_workspace, create_workspace_skeleton, get_current_user, search_users, hello."
    )]
    async fn jira_workspace(
        &self,
        Parameters(args): Parameters<ToolArguments>,
    ) -> Result<CallToolResult, McpError> {
        self.call(ToolGroup::Workspace, args).await
    }

    /// Project queries.
    #[tool(
        description = "Query Jira projects. Operations: list, get (project_key), get_issue_types (project_key). Optional: workspace."
    )]
    async fn jira_projects(
        &self,
        Parameters(args): Parameters<ToolArguments>,
    ) -> Result<CallToolResult, McpError> {
        self.call(ToolGroup::Projects, args).await
    }

    /// Issue operations.
    #[tool(
        description = "Work with Jira issues. Operations: search, read, create, update, assign, transition, get_transitions, list_comments, add_comment, update_comment, delete_comment, list_attachments, add_attachment, delete_attachment, create_link, delete_link, list_links, create_subtask, list_subtasks. Optional: workspace."
    )]
    async fn jira_issues(
        &self,
        Parameters(args): Parameters<ToolArguments>,
    ) -> Result<CallToolResult, McpError> {
        self.call(ToolGroup::Issues, args).await
    }
}

impl JiraMcpServer {
    /// Create a server over `store`, connecting to Jira through `connector`.
    #[must_use]
    pub fn new(
        store: Arc<WorkspaceStore>,
        connector: Arc<dyn Connector>,
        config: ServerConfig,
    ) -> Self {
        Self {
            router: Arc::new(Router::new(store, connector, config)),
            tool_router: Self::tool_router(),
        }
    }

    /// The operation router.
    #[must_use]
    pub fn router(&self) -> &Arc<Router> {
        &self.router
    }

    async fn call(
        &self,
        group: ToolGroup,
        args: ToolArguments,
    ) -> Result<CallToolResult, McpError> {
        match self.router.dispatch(group.name(), args.into_map()).await {
            Ok(value) => Ok(CallToolResult::success(vec![Content::json(value)?])),
            Err(failure) => Ok(CallToolResult::error(vec![Content::json(failure)?])),
        }
    }

    /// Serve over stdio until the client disconnects.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport fails to start or stops abnormally.
    pub async fn run(self) -> anyhow::Result<()> {
        use rmcp::{ServiceExt, transport::stdio};

        let service = self.serve(stdio()).await?;
        service.waiting().await?;
        Ok(())
    }
}

#[tool_handler]
impl ServerHandler for JiraMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: self.router.config().server_name.clone(),
                version: env!("CARGO_PKG_VERSION").into(),
                title: None,
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Jira MCP server. Every tool takes an `operation` plus flat parameters. Start with jira_workspace hello; add a workspace with add_workspace if none is configured."
                    .into(),
            ),
        }
    }
}
