//! `jira_projects` handlers.

use super::{CallContext, to_json};
use crate::error::Result;
use crate::models::{IssueTypeView, ProjectView};
use crate::operations::ProjectOperation;
use serde_json::{Value, json};
use tracing::debug;

/// Run a project operation.
///
/// # Errors
///
/// Returns API errors from Jira.
pub async fn handle(op: ProjectOperation, ctx: &CallContext) -> Result<Value> {
    match op {
        ProjectOperation::List => {
            let projects = ctx.api.projects().await?;
            debug!(count = projects.len(), "Listed projects");
            let views: Vec<ProjectView> = projects
                .iter()
                .map(|p| ProjectView {
                    description: None,
                    lead: None,
                    issue_types: Vec::new(),
                    ..ProjectView::from(p)
                })
                .collect();
            Ok(json!({ "count": views.len(), "projects": views }))
        }
        ProjectOperation::Get(params) => {
            let project = ctx.api.project(&params.project_key).await?;
            to_json(&ProjectView::from(&project))
        }
        ProjectOperation::GetIssueTypes(params) => {
            let project = ctx.api.project(&params.project_key).await?;
            let types: Vec<IssueTypeView> =
                project.issue_types.iter().map(IssueTypeView::from).collect();
            Ok(json!({ "project_key": project.key, "issue_types": types }))
        }
    }
}
