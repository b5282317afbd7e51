//! Operations of the `jira_issues` tool.

use super::{OperationGroup, id_string, operation_params, parse_params};
use crate::error::Result;
use serde::Deserialize;
use serde_json::{Map, Value};

/// Parameters naming one issue.
#[derive(Debug, Clone, Deserialize)]
pub struct IssueKeyParams {
    /// Issue key, e.g. `PROJ-123`.
    pub issue_key: String,
}

operation_params!(IssueKeyParams, required: ["issue_key"], optional: []);

/// `search` parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchParams {
    /// JQL, passed through unmodified.
    pub jql: String,
    /// Result cap.
    #[serde(default)]
    pub max_results: Option<u32>,
    /// Fields to fetch instead of the default set.
    #[serde(default)]
    pub fields: Option<Vec<String>>,
}

operation_params!(SearchParams, required: ["jql"], optional: ["max_results", "fields"]);

/// `create` parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateIssueParams {
    /// Project key.
    pub project_key: String,
    /// Summary line.
    pub summary: String,
    /// Issue type name, e.g. `Task` or `Bug`.
    pub issue_type: String,
    /// Description.
    #[serde(default)]
    pub description: Option<String>,
    /// Assignee account id (Cloud) or username (Server).
    #[serde(default)]
    pub assignee: Option<String>,
    /// Priority name.
    #[serde(default)]
    pub priority: Option<String>,
    /// Labels.
    #[serde(default)]
    pub labels: Option<Vec<String>>,
}

operation_params!(
    CreateIssueParams,
    required: ["project_key", "summary", "issue_type"],
    optional: ["description", "assignee", "priority", "labels"]
);

/// `update` parameters. At least one field besides the key must be given.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateIssueParams {
    /// Issue key.
    pub issue_key: String,
    /// New summary.
    #[serde(default)]
    pub summary: Option<String>,
    /// New description.
    #[serde(default)]
    pub description: Option<String>,
    /// New assignee.
    #[serde(default)]
    pub assignee: Option<String>,
    /// New priority name.
    #[serde(default)]
    pub priority: Option<String>,
    /// Replacement label set.
    #[serde(default)]
    pub labels: Option<Vec<String>>,
}

operation_params!(
    UpdateIssueParams,
    required: ["issue_key"],
    optional: ["summary", "description", "assignee", "priority", "labels"]
);

/// `assign` parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct AssignParams {
    /// Issue key.
    pub issue_key: String,
    /// Account id (Cloud) or username (Server).
    pub assignee: String,
}

operation_params!(AssignParams, required: ["issue_key", "assignee"], optional: []);

/// `transition` parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct TransitionParams {
    /// Issue key.
    pub issue_key: String,
    /// Transition name (case-insensitive) or id.
    #[serde(deserialize_with = "id_string")]
    pub transition: String,
    /// Comment to add with the transition.
    #[serde(default)]
    pub comment: Option<String>,
}

operation_params!(
    TransitionParams,
    required: ["issue_key", "transition"],
    optional: ["comment"]
);

/// `add_comment` parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct AddCommentParams {
    /// Issue key.
    pub issue_key: String,
    /// Comment text.
    pub body: String,
}

operation_params!(AddCommentParams, required: ["issue_key", "body"], optional: []);

/// `update_comment` parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateCommentParams {
    /// Issue key.
    pub issue_key: String,
    /// Comment id.
    #[serde(deserialize_with = "id_string")]
    pub comment_id: String,
    /// New comment text.
    pub body: String,
}

operation_params!(
    UpdateCommentParams,
    required: ["issue_key", "comment_id", "body"],
    optional: []
);

/// `delete_comment` parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct DeleteCommentParams {
    /// Issue key.
    pub issue_key: String,
    /// Comment id.
    #[serde(deserialize_with = "id_string")]
    pub comment_id: String,
}

operation_params!(
    DeleteCommentParams,
    required: ["issue_key", "comment_id"],
    optional: []
);

/// `add_attachment` parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct AddAttachmentParams {
    /// Issue key.
    pub issue_key: String,
    /// Local path of the file to upload.
    pub file_path: String,
}

operation_params!(AddAttachmentParams, required: ["issue_key", "file_path"], optional: []);

/// `delete_attachment` parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct DeleteAttachmentParams {
    /// Attachment id.
    #[serde(deserialize_with = "id_string")]
    pub attachment_id: String,
}

operation_params!(DeleteAttachmentParams, required: ["attachment_id"], optional: []);

/// `create_link` parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateLinkParams {
    /// Issue on the inward side.
    pub inward_issue: String,
    /// Issue on the outward side.
    pub outward_issue: String,
    /// Link type name. Defaults to `Relates`.
    #[serde(default)]
    pub link_type: Option<String>,
}

operation_params!(
    CreateLinkParams,
    required: ["inward_issue", "outward_issue"],
    optional: ["link_type"]
);

/// `delete_link` parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct DeleteLinkParams {
    /// Link id.
    #[serde(deserialize_with = "id_string")]
    pub link_id: String,
}

operation_params!(DeleteLinkParams, required: ["link_id"], optional: []);

/// `create_subtask` parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSubtaskParams {
    /// Parent issue key.
    pub parent_key: String,
    /// Summary line.
    pub summary: String,
    /// Description.
    #[serde(default)]
    pub description: Option<String>,
    /// Assignee.
    #[serde(default)]
    pub assignee: Option<String>,
}

operation_params!(
    CreateSubtaskParams,
    required: ["parent_key", "summary"],
    optional: ["description", "assignee"]
);

/// An operation of the `jira_issues` tool.
#[derive(Debug, Clone)]
pub enum IssueOperation {
    /// JQL search.
    Search(SearchParams),
    /// One issue with full details.
    Read(IssueKeyParams),
    /// Create an issue.
    Create(CreateIssueParams),
    /// Update fields of an issue.
    Update(UpdateIssueParams),
    /// Change the assignee.
    Assign(AssignParams),
    /// Move through the workflow.
    Transition(TransitionParams),
    /// Transitions currently available.
    GetTransitions(IssueKeyParams),
    /// Comments on an issue.
    ListComments(IssueKeyParams),
    /// Add a comment.
    AddComment(AddCommentParams),
    /// Edit a comment.
    UpdateComment(UpdateCommentParams),
    /// Delete a comment.
    DeleteComment(DeleteCommentParams),
    /// Attachments on an issue.
    ListAttachments(IssueKeyParams),
    /// Upload a local file.
    AddAttachment(AddAttachmentParams),
    /// Delete an attachment.
    DeleteAttachment(DeleteAttachmentParams),
    /// Link two issues.
    CreateLink(CreateLinkParams),
    /// Delete a link.
    DeleteLink(DeleteLinkParams),
    /// Links on an issue.
    ListLinks(IssueKeyParams),
    /// Create a sub-task under a parent.
    CreateSubtask(CreateSubtaskParams),
    /// Sub-tasks of an issue.
    ListSubtasks(IssueKeyParams),
}

impl OperationGroup for IssueOperation {
    const TOOL: &'static str = "jira_issues";
    const NAMES: &'static [&'static str] = &[
        "search",
        "read",
        "create",
        "update",
        "assign",
        "transition",
        "get_transitions",
        "list_comments",
        "add_comment",
        "update_comment",
        "delete_comment",
        "list_attachments",
        "add_attachment",
        "delete_attachment",
        "create_link",
        "delete_link",
        "list_links",
        "create_subtask",
        "list_subtasks",
    ];

    fn is_remote(_operation: &str) -> bool {
        true
    }

    fn parse(operation: &str, args: Map<String, Value>) -> Result<Self> {
        Ok(match operation {
            "search" => Self::Search(parse_params("search", args)?),
            "read" => Self::Read(parse_params("read", args)?),
            "create" => Self::Create(parse_params("create", args)?),
            "update" => Self::Update(parse_params("update", args)?),
            "assign" => Self::Assign(parse_params("assign", args)?),
            "transition" => Self::Transition(parse_params("transition", args)?),
            "get_transitions" => Self::GetTransitions(parse_params("get_transitions", args)?),
            "list_comments" => Self::ListComments(parse_params("list_comments", args)?),
            "add_comment" => Self::AddComment(parse_params("add_comment", args)?),
            "update_comment" => Self::UpdateComment(parse_params("update_comment", args)?),
            "delete_comment" => Self::DeleteComment(parse_params("delete_comment", args)?),
            "list_attachments" => Self::ListAttachments(parse_params("list_attachments", args)?),
            "add_attachment" => Self::AddAttachment(parse_params("add_attachment", args)?),
            "delete_attachment" => {
                Self::DeleteAttachment(parse_params("delete_attachment", args)?)
            }
            "create_link" => Self::CreateLink(parse_params("create_link", args)?),
            "delete_link" => Self::DeleteLink(parse_params("delete_link", args)?),
            "list_links" => Self::ListLinks(parse_params("list_links", args)?),
            "create_subtask" => Self::CreateSubtask(parse_params("create_subtask", args)?),
            "list_subtasks" => Self::ListSubtasks(parse_params("list_subtasks", args)?),
            other => return Err(Self::unknown(other)),
        })
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Search(_) => "search",
            Self::Read(_) => "read",
            Self::Create(_) => "create",
            Self::Update(_) => "update",
            Self::Assign(_) => "assign",
            Self::Transition(_) => "transition",
            Self::GetTransitions(_) => "get_transitions",
            Self::ListComments(_) => "list_comments",
            Self::AddComment(_) => "add_comment",
            Self::UpdateComment(_) => "update_comment",
            Self::DeleteComment(_) => "delete_comment",
            Self::ListAttachments(_) => "list_attachments",
            Self::AddAttachment(_) => "add_attachment",
            Self::DeleteAttachment(_) => "delete_attachment",
            Self::CreateLink(_) => "create_link",
            Self::DeleteLink(_) => "delete_link",
            Self::ListLinks(_) => "list_links",
            Self::CreateSubtask(_) => "create_subtask",
            Self::ListSubtasks(_) => "list_subtasks",
        }
    }
}
