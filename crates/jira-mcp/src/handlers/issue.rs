//! `jira_issues` handlers.

use super::{CallContext, to_json};
use crate::error::{Result, ToolError};
use crate::models::{
    AttachmentView, CommentView, DeletedResponse, IssueView, LinkCreatedResponse, LinkView,
    SearchResponse, SubtaskView, TransitionView,
};
use crate::operations::IssueOperation;
use crate::operations::issue::{
    AddAttachmentParams, CreateIssueParams, CreateSubtaskParams, SearchParams, TransitionParams,
    UpdateIssueParams,
};
use jira_api::types::Transition;
use serde_json::{Map, Value, json};
use std::path::Path;
use tracing::{debug, info};

/// Fields requested by searches when the caller names none.
pub const DEFAULT_SEARCH_FIELDS: &[&str] = &[
    "summary",
    "status",
    "assignee",
    "reporter",
    "priority",
    "created",
    "updated",
    "issuetype",
    "project",
];

/// Link type used when the caller names none.
pub const DEFAULT_LINK_TYPE: &str = "Relates";

/// Issue type used for sub-tasks.
pub const SUBTASK_TYPE: &str = "Sub-task";

/// Run an issue operation.
///
/// # Errors
///
/// Returns API errors from Jira, [`ToolError::InvalidParameter`] for values
/// that can only be checked against the issue (an unknown transition), and
/// I/O errors when reading an attachment.
pub async fn handle(op: IssueOperation, ctx: &CallContext) -> Result<Value> {
    match op {
        IssueOperation::Search(params) => search(params, ctx).await,
        IssueOperation::Read(params) => read(&params.issue_key, ctx).await,
        IssueOperation::Create(params) => create(params, ctx).await,
        IssueOperation::Update(params) => update(params, ctx).await,
        IssueOperation::Assign(params) => {
            ctx.api
                .assign_issue(&params.issue_key, ctx.user_field(&params.assignee))
                .await?;
            info!(issue = %params.issue_key, "Assigned issue");
            read(&params.issue_key, ctx).await
        }
        IssueOperation::Transition(params) => transition(params, ctx).await,
        IssueOperation::GetTransitions(params) => {
            let transitions = ctx.api.transitions(&params.issue_key).await?;
            let views: Vec<TransitionView> = transitions.iter().map(TransitionView::from).collect();
            Ok(json!({ "issue_key": params.issue_key, "transitions": views }))
        }
        IssueOperation::ListComments(params) => {
            let comments = ctx.api.comments(&params.issue_key).await?;
            let views: Vec<CommentView> = comments.iter().map(CommentView::from).collect();
            Ok(json!({ "issue_key": params.issue_key, "count": views.len(), "comments": views }))
        }
        IssueOperation::AddComment(params) => {
            let comment = ctx.api.add_comment(&params.issue_key, &params.body).await?;
            to_json(&CommentView::from(&comment))
        }
        IssueOperation::UpdateComment(params) => {
            let comment = ctx
                .api
                .update_comment(&params.issue_key, &params.comment_id, &params.body)
                .await?;
            to_json(&CommentView::from(&comment))
        }
        IssueOperation::DeleteComment(params) => {
            ctx.api
                .delete_comment(&params.issue_key, &params.comment_id)
                .await?;
            to_json(&DeletedResponse::new("comment", params.comment_id))
        }
        IssueOperation::ListAttachments(params) => {
            let issue = ctx.api.issue(&params.issue_key).await?;
            let views: Vec<AttachmentView> = issue
                .fields
                .attachment
                .iter()
                .map(AttachmentView::from)
                .collect();
            Ok(json!({ "issue_key": issue.key, "count": views.len(), "attachments": views }))
        }
        IssueOperation::AddAttachment(params) => add_attachment(params, ctx).await,
        IssueOperation::DeleteAttachment(params) => {
            ctx.api.delete_attachment(&params.attachment_id).await?;
            to_json(&DeletedResponse::new("attachment", params.attachment_id))
        }
        IssueOperation::CreateLink(params) => {
            let link_type = params
                .link_type
                .unwrap_or_else(|| DEFAULT_LINK_TYPE.to_string());
            ctx.api
                .create_link(&link_type, &params.inward_issue, &params.outward_issue)
                .await?;
            to_json(&LinkCreatedResponse {
                inward_issue: params.inward_issue,
                outward_issue: params.outward_issue,
                link_type,
            })
        }
        IssueOperation::DeleteLink(params) => {
            ctx.api.delete_link(&params.link_id).await?;
            to_json(&DeletedResponse::new("link", params.link_id))
        }
        IssueOperation::ListLinks(params) => {
            let issue = ctx.api.issue(&params.issue_key).await?;
            let views: Vec<LinkView> =
                issue.fields.issue_links.iter().map(LinkView::from).collect();
            Ok(json!({ "issue_key": issue.key, "count": views.len(), "links": views }))
        }
        IssueOperation::CreateSubtask(params) => create_subtask(params, ctx).await,
        IssueOperation::ListSubtasks(params) => {
            let issue = ctx.api.issue(&params.issue_key).await?;
            let views: Vec<SubtaskView> = issue
                .fields
                .subtasks
                .iter()
                .map(|s| SubtaskView::new(s, &ctx.workspace.site_url))
                .collect();
            Ok(json!({ "parent_key": issue.key, "count": views.len(), "subtasks": views }))
        }
    }
}

async fn read(key: &str, ctx: &CallContext) -> Result<Value> {
    let issue = ctx.api.issue(key).await?;
    to_json(&IssueView::full(&issue, &ctx.workspace.site_url))
}

async fn search(params: SearchParams, ctx: &CallContext) -> Result<Value> {
    let max_results = params.max_results.unwrap_or(ctx.default_max_results);
    let fields = params.fields.unwrap_or_else(|| {
        DEFAULT_SEARCH_FIELDS
            .iter()
            .map(|f| (*f).to_string())
            .collect()
    });

    let results = ctx
        .api
        .search_issues(&params.jql, max_results, &fields)
        .await?;
    debug!(jql = %params.jql, returned = results.issues.len(), "Search complete");

    let issues: Vec<IssueView> = results
        .issues
        .iter()
        .map(|i| IssueView::brief(i, &ctx.workspace.site_url))
        .collect();
    to_json(&SearchResponse {
        jql: params.jql,
        total: results.total,
        count: issues.len(),
        issues,
    })
}

async fn create(params: CreateIssueParams, ctx: &CallContext) -> Result<Value> {
    let mut fields = Map::new();
    fields.insert("project".into(), json!({ "key": params.project_key }));
    fields.insert("summary".into(), json!(params.summary));
    fields.insert("issuetype".into(), json!({ "name": params.issue_type }));
    if let Some(description) = params.description {
        fields.insert("description".into(), json!(description));
    }
    if let Some(assignee) = params.assignee {
        fields.insert("assignee".into(), ctx.user_field(&assignee));
    }
    if let Some(priority) = params.priority {
        fields.insert("priority".into(), json!({ "name": priority }));
    }
    if let Some(labels) = params.labels {
        fields.insert("labels".into(), json!(labels));
    }

    let created = ctx.api.create_issue(Value::Object(fields)).await?;
    info!(issue = %created.key, "Created issue");
    read(&created.key, ctx).await
}

async fn update(params: UpdateIssueParams, ctx: &CallContext) -> Result<Value> {
    let mut fields = Map::new();
    if let Some(summary) = params.summary {
        fields.insert("summary".into(), json!(summary));
    }
    if let Some(description) = params.description {
        fields.insert("description".into(), json!(description));
    }
    if let Some(assignee) = params.assignee {
        fields.insert("assignee".into(), ctx.user_field(&assignee));
    }
    if let Some(priority) = params.priority {
        fields.insert("priority".into(), json!({ "name": priority }));
    }
    if let Some(labels) = params.labels {
        fields.insert("labels".into(), json!(labels));
    }
    if fields.is_empty() {
        return Err(ToolError::invalid(
            "issue_key",
            "nothing to update; give at least one of summary, description, assignee, priority, labels",
        ));
    }

    ctx.api
        .update_issue(&params.issue_key, Value::Object(fields))
        .await?;
    info!(issue = %params.issue_key, "Updated issue");
    read(&params.issue_key, ctx).await
}

/// Find a transition by id or by case-insensitive name.
fn match_transition<'a>(available: &'a [Transition], wanted: &str) -> Option<&'a Transition> {
    available
        .iter()
        .find(|t| t.id == wanted)
        .or_else(|| available.iter().find(|t| t.name.eq_ignore_ascii_case(wanted)))
}

async fn transition(params: TransitionParams, ctx: &CallContext) -> Result<Value> {
    let available = ctx.api.transitions(&params.issue_key).await?;
    let Some(chosen) = match_transition(&available, &params.transition) else {
        let names: Vec<String> = available
            .iter()
            .map(|t| format!("{} ({})", t.name, t.id))
            .collect();
        return Err(ToolError::invalid(
            "transition",
            format!(
                "'{}' is not available on {}. Available: {}",
                params.transition,
                params.issue_key,
                if names.is_empty() {
                    "none".to_string()
                } else {
                    names.join(", ")
                }
            ),
        ));
    };

    ctx.api
        .transition_issue(&params.issue_key, &chosen.id, params.comment.as_deref())
        .await?;
    info!(issue = %params.issue_key, transition = %chosen.name, "Transitioned issue");
    read(&params.issue_key, ctx).await
}

async fn add_attachment(params: AddAttachmentParams, ctx: &CallContext) -> Result<Value> {
    let path = Path::new(&params.file_path);
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| ToolError::invalid("file_path", "path does not name a file"))?
        .to_string();
    let content = tokio::fs::read(path).await.map_err(|e| {
        ToolError::invalid("file_path", format!("cannot read {}: {e}", path.display()))
    })?;

    let uploaded = ctx
        .api
        .add_attachment(&params.issue_key, &filename, content)
        .await?;
    info!(issue = %params.issue_key, file = %filename, "Uploaded attachment");
    let views: Vec<AttachmentView> = uploaded.iter().map(AttachmentView::from).collect();
    Ok(json!({ "issue_key": params.issue_key, "attachments": views }))
}

async fn create_subtask(params: CreateSubtaskParams, ctx: &CallContext) -> Result<Value> {
    let parent = ctx.api.issue(&params.parent_key).await?;
    let project_key = parent
        .fields
        .project
        .as_ref()
        .map(|p| p.key.clone())
        .ok_or_else(|| {
            ToolError::invalid(
                "parent_key",
                format!("{} has no project", params.parent_key),
            )
        })?;

    let mut fields = Map::new();
    fields.insert("project".into(), json!({ "key": project_key }));
    fields.insert("parent".into(), json!({ "key": parent.key }));
    fields.insert("summary".into(), json!(params.summary));
    fields.insert("issuetype".into(), json!({ "name": SUBTASK_TYPE }));
    if let Some(description) = params.description {
        fields.insert("description".into(), json!(description));
    }
    if let Some(assignee) = params.assignee {
        fields.insert("assignee".into(), ctx.user_field(&assignee));
    }

    let created = ctx.api.create_issue(Value::Object(fields)).await?;
    info!(issue = %created.key, parent = %parent.key, "Created sub-task");
    read(&created.key, ctx).await
}
