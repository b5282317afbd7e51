//! Operations of the `jira_workspace` tool.

use super::{NoParams, OperationGroup, operation_params, parse_params};
use crate::error::Result;
use jira_workspace::AuthType;
use serde::Deserialize;
use serde_json::{Map, Value};

/// `add_workspace` parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct AddWorkspaceParams {
    /// Unique workspace name.
    pub workspace_name: String,
    /// Site URL, with or without scheme.
    pub site_url: String,
    /// Account email. Required for cloud.
    #[serde(default)]
    pub email: Option<String>,
    /// API token or personal access token.
    pub api_token: String,
    /// `cloud` (default) or `pat`.
    #[serde(default)]
    pub auth_type: Option<AuthType>,
}

operation_params!(
    AddWorkspaceParams,
    required: ["workspace_name", "site_url", "api_token"],
    optional: ["email", "auth_type"]
);

/// Parameters naming one workspace.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkspaceNameParams {
    /// Workspace name.
    pub workspace_name: String,
}

operation_params!(WorkspaceNameParams, required: ["workspace_name"], optional: []);

/// `validate_workspace` parameters. Defaults to the active workspace.
#[derive(Debug, Clone, Deserialize)]
pub struct ValidateWorkspaceParams {
    /// Workspace name.
    #[serde(default)]
    pub workspace_name: Option<String>,
}

operation_params!(ValidateWorkspaceParams, required: [], optional: ["workspace_name"]);

/// `create_workspace_skeleton` parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct SkeletonParams {
    /// Workspace name.
    pub workspace_name: String,
    /// `cloud` (default) or `pat`.
    #[serde(default)]
    pub auth_type: Option<AuthType>,
}

operation_params!(SkeletonParams, required: ["workspace_name"], optional: ["auth_type"]);

/// `search_users` parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchUsersParams {
    /// Name or email fragment.
    pub query: String,
    /// Result cap.
    #[serde(default)]
    pub max_results: Option<u32>,
}

operation_params!(SearchUsersParams, required: ["query"], optional: ["max_results"]);

/// An operation of the `jira_workspace` tool.
#[derive(Debug, Clone)]
pub enum WorkspaceOperation {
    /// Register a workspace.
    Add(AddWorkspaceParams),
    /// List workspaces, tokens masked.
    List,
    /// Show the active workspace.
    GetActive,
    /// Change the active workspace.
    Switch(WorkspaceNameParams),
    /// Check a workspace's credentials.
    Validate(ValidateWorkspaceParams),
    /// Delete a workspace.
    Remove(WorkspaceNameParams),
    /// Write a placeholder workspace file for manual editing.
    CreateSkeleton(SkeletonParams),
    /// Show the authenticated user.
    GetCurrentUser,
    /// Find users for assignment.
    SearchUsers(SearchUsersParams),
    /// Server status and connectivity check.
    Hello,
}

impl OperationGroup for WorkspaceOperation {
    const TOOL: &'static str = "jira_workspace";
    const NAMES: &'static [&'static str] = &[
        "add_workspace",
        "list_workspaces",
        "get_active_workspace",
        "switch_workspace",
        "validate_workspace",
        "remove_workspace",
        "create_workspace_skeleton",
        "get_current_user",
        "search_users",
        "hello",
    ];

    fn is_remote(operation: &str) -> bool {
        matches!(operation, "get_current_user" | "search_users")
    }

    fn parse(operation: &str, args: Map<String, Value>) -> Result<Self> {
        Ok(match operation {
            "add_workspace" => Self::Add(parse_params("add_workspace", args)?),
            "list_workspaces" => {
                parse_params::<NoParams>("list_workspaces", args)?;
                Self::List
            }
            "get_active_workspace" => {
                parse_params::<NoParams>("get_active_workspace", args)?;
                Self::GetActive
            }
            "switch_workspace" => Self::Switch(parse_params("switch_workspace", args)?),
            "validate_workspace" => Self::Validate(parse_params("validate_workspace", args)?),
            "remove_workspace" => Self::Remove(parse_params("remove_workspace", args)?),
            "create_workspace_skeleton" => {
                Self::CreateSkeleton(parse_params("create_workspace_skeleton", args)?)
            }
            "get_current_user" => {
                parse_params::<NoParams>("get_current_user", args)?;
                Self::GetCurrentUser
            }
            "search_users" => Self::SearchUsers(parse_params("search_users", args)?),
            "hello" => {
                parse_params::<NoParams>("hello", args)?;
                Self::Hello
            }
            other => return Err(Self::unknown(other)),
        })
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Add(_) => "add_workspace",
            Self::List => "list_workspaces",
            Self::GetActive => "get_active_workspace",
            Self::Switch(_) => "switch_workspace",
            Self::Validate(_) => "validate_workspace",
            Self::Remove(_) => "remove_workspace",
            Self::CreateSkeleton(_) => "create_workspace_skeleton",
            Self::GetCurrentUser => "get_current_user",
            Self::SearchUsers(_) => "search_users",
            Self::Hello => "hello",
        }
    }
}
