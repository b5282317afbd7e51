//! `jira_workspace` handlers.

use super::{CallContext, to_json};
use crate::error::{Result, ToolError};
use crate::models::{
    AddWorkspaceResponse, ConnectionStatus, HelloResponse, ListWorkspacesResponse,
    RemoveWorkspaceResponse, SkeletonResponse, SwitchWorkspaceResponse, UserView,
};
use crate::operations::WorkspaceOperation;
use crate::operations::workspace::AddWorkspaceParams;
use crate::router::Router;
use jira_workspace::{AuthType, NewProfile, StoreError, ValidationErrorKind};
use secrecy::SecretString;
use serde_json::{Value, json};
use tracing::{info, warn};

/// Run a workspace operation.
///
/// `ctx` is present exactly when the operation is remote
/// (`get_current_user`, `search_users`).
///
/// # Errors
///
/// Returns store errors, validation failures and API errors.
pub async fn handle(
    op: WorkspaceOperation,
    router: &Router,
    ctx: Option<&CallContext>,
) -> Result<Value> {
    let store = router.store();
    match op {
        WorkspaceOperation::Add(params) => add(params, router).await,
        WorkspaceOperation::List => {
            let workspaces = store.list().await;
            let active = workspaces.iter().find(|w| w.active).map(|w| w.name.clone());
            to_json(&ListWorkspacesResponse {
                count: workspaces.len(),
                workspaces,
                active,
            })
        }
        WorkspaceOperation::GetActive => to_json(&store.get_active().await?),
        WorkspaceOperation::Switch(params) => {
            let outcome = store.switch(&params.workspace_name).await?;
            let mut message = if outcome.already_active {
                format!("Workspace '{}' is already active", outcome.workspace.name)
            } else {
                format!("Switched to workspace '{}'", outcome.workspace.name)
            };
            if !outcome.workspace.complete {
                message.push_str(&format!(
                    ". It still has placeholder values; edit {} before using it",
                    store.profile_path(&outcome.workspace.name).display()
                ));
            }
            to_json(&SwitchWorkspaceResponse {
                workspace: outcome.workspace,
                already_active: outcome.already_active,
                message,
            })
        }
        WorkspaceOperation::Validate(params) => {
            let profile = store.profile(params.workspace_name.as_deref()).await?;
            let result = router.validator().validate(&profile).await;
            if result.ok {
                to_json(&result)
            } else {
                Err(ToolError::Validation {
                    workspace: result.workspace,
                    kind: result.error.unwrap_or(ValidationErrorKind::Unknown),
                    message: result.message,
                })
            }
        }
        WorkspaceOperation::Remove(params) => {
            let outcome = store.remove(&params.workspace_name).await?;
            let message = if outcome.was_active {
                format!(
                    "Removed workspace '{}'. No workspace is active now; use switch_workspace to pick one",
                    outcome.name
                )
            } else {
                format!("Removed workspace '{}'", outcome.name)
            };
            to_json(&RemoveWorkspaceResponse {
                removed: outcome.name,
                was_active: outcome.was_active,
                message,
            })
        }
        WorkspaceOperation::CreateSkeleton(params) => {
            let auth_type = params.auth_type.unwrap_or_default();
            let path = store
                .create_skeleton(&params.workspace_name, auth_type)
                .await?;
            to_json(&SkeletonResponse {
                message: format!(
                    "Created {}. Replace the placeholder values, then run validate_workspace",
                    path.display()
                ),
                workspace_name: params.workspace_name,
                path: path.display().to_string(),
                auth_type: auth_type.to_string(),
            })
        }
        WorkspaceOperation::GetCurrentUser => {
            let ctx = remote(ctx)?;
            let user = ctx.api.myself().await?;
            Ok(json!({
                "workspace": ctx.workspace.name,
                "user": UserView::from(&user),
            }))
        }
        WorkspaceOperation::SearchUsers(params) => {
            let ctx = remote(ctx)?;
            let max_results = params.max_results.unwrap_or(ctx.default_max_results);
            let users = ctx.api.search_users(&params.query, max_results).await?;
            let views: Vec<UserView> = users.iter().map(UserView::from).collect();
            Ok(json!({ "query": params.query, "count": views.len(), "users": views }))
        }
        WorkspaceOperation::Hello => hello(router).await,
    }
}

fn remote(ctx: Option<&CallContext>) -> Result<&CallContext> {
    ctx.ok_or(ToolError::Store(StoreError::NoActiveWorkspace))
}

async fn add(params: AddWorkspaceParams, router: &Router) -> Result<Value> {
    let auth_type = params.auth_type.unwrap_or_default();
    if auth_type == AuthType::Cloud && params.email.is_none() {
        return Err(ToolError::MissingParameter("email".to_string()));
    }

    let store = router.store();
    let outcome = store
        .add(NewProfile {
            name: params.workspace_name,
            site_url: params.site_url,
            email: params.email,
            api_token: SecretString::from(params.api_token),
            auth_type,
        })
        .await?;
    let name = outcome.workspace.name.clone();

    // The workspace stays saved whatever the check says.
    let profile = store.profile(Some(&name)).await?;
    let validation = router.validator().validate(&profile).await;
    if !validation.ok {
        warn!(workspace = %name, message = %validation.message, "New workspace failed validation");
    }
    let workspace = store
        .profile(Some(&name))
        .await?
        .summary(outcome.workspace.active);

    to_json(&AddWorkspaceResponse {
        workspace,
        activated: outcome.activated,
        validation,
    })
}

async fn hello(router: &Router) -> Result<Value> {
    let store = router.store();
    let workspaces = store.list().await;
    let active = workspaces.iter().find(|w| w.active).cloned();

    let (connection, hint) = match &active {
        None if workspaces.is_empty() => (
            None,
            Some(
                "No workspaces configured. Use add_workspace or create_workspace_skeleton"
                    .to_string(),
            ),
        ),
        None => (
            None,
            Some("No workspace is active. Use switch_workspace to pick one".to_string()),
        ),
        Some(ws) if !ws.complete => (
            None,
            Some(format!(
                "Workspace '{}' has placeholder values. Edit {}",
                ws.name,
                store.profile_path(&ws.name).display()
            )),
        ),
        Some(ws) => (Some(check_connection(router, &ws.name).await), None),
    };

    info!(workspaces = workspaces.len(), "Hello");
    to_json(&HelloResponse {
        server: router.config().server_name.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        status: "running",
        workspaces: workspaces.len(),
        active_workspace: active,
        connection,
        hint,
    })
}

/// Contact the instance; failures are reported, not raised.
async fn check_connection(router: &Router, name: &str) -> ConnectionStatus {
    let attempt = async {
        let ctx = router.connect(Some(name)).await?;
        Ok::<_, ToolError>(ctx.api.server_info().await?)
    };
    match attempt.await {
        Ok(info) => ConnectionStatus::from(&info),
        Err(e) => {
            warn!(workspace = %name, error = %e, "Connectivity check failed");
            ConnectionStatus {
                ok: false,
                server_title: None,
                version: None,
                deployment_type: None,
                error: Some(e.to_string()),
            }
        }
    }
}
