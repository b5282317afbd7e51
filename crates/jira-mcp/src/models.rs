//! MCP response models.
//!
//! These are the JSON shapes tools return. They flatten the raw Jira types
//! from `jira_api::types` into compact views that are stable across Cloud and
//! Server: a user is always `{name, account_id}`, a description is always a
//! string, and so on.

use jira_api::types::{
    Attachment, Comment, Issue, IssueLink, IssueType, Project, ServerInfo, Transition, User,
};
use jira_workspace::{ValidationResult, WorkspaceSummary};
use schemars::JsonSchema;
use serde::Serialize;
use serde_json::Value;

/// Reference to a user.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct UserRef {
    /// Display name.
    pub name: String,
    /// Account id (Cloud) or username (Server).
    pub account_id: Option<String>,
}

impl From<&User> for UserRef {
    fn from(user: &User) -> Self {
        Self {
            name: user
                .display_name
                .clone()
                .or_else(|| user.account_ref().map(str::to_string))
                .unwrap_or_else(|| "Unknown".to_string()),
            account_id: user.account_ref().map(str::to_string),
        }
    }
}

fn user_ref(user: Option<&User>) -> Option<UserRef> {
    user.map(UserRef::from)
}

/// Render a Jira text field. REST v2 sends plain strings; anything else
/// (an Atlassian document) is returned as compact JSON.
fn text_of(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Issue representation for MCP responses.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct IssueView {
    /// Issue key.
    pub key: String,
    /// Issue id.
    pub id: String,
    /// Summary line.
    pub summary: String,
    /// Status name.
    pub status: Option<String>,
    /// Issue type name.
    pub issue_type: Option<String>,
    /// Project key.
    pub project: Option<String>,
    /// Browser URL.
    pub url: String,
    /// Creation timestamp as sent by Jira.
    pub created: Option<String>,
    /// Last update timestamp as sent by Jira.
    pub updated: Option<String>,
    /// Assignee.
    pub assignee: Option<UserRef>,
    /// Reporter.
    pub reporter: Option<UserRef>,
    /// Priority name.
    pub priority: Option<String>,
    /// Description (full details only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Labels (full details only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
    /// Component names (full details only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub components: Option<Vec<String>>,
    /// Fix version names (full details only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fix_versions: Option<Vec<String>>,
}

impl IssueView {
    /// Summary view, as returned by searches.
    #[must_use]
    pub fn brief(issue: &Issue, site_url: &str) -> Self {
        let fields = &issue.fields;
        Self {
            key: issue.key.clone(),
            id: issue.id.clone(),
            summary: fields.summary.clone().unwrap_or_default(),
            status: fields.status.as_ref().map(|s| s.name.clone()),
            issue_type: fields.issue_type.as_ref().map(|t| t.name.clone()),
            project: fields.project.as_ref().map(|p| p.key.clone()),
            url: format!("{site_url}/browse/{}", issue.key),
            created: fields.created.clone(),
            updated: fields.updated.clone(),
            assignee: user_ref(fields.assignee.as_ref()),
            reporter: user_ref(fields.reporter.as_ref()),
            priority: fields.priority.as_ref().map(|p| p.name.clone()),
            description: None,
            labels: None,
            components: None,
            fix_versions: None,
        }
    }

    /// Full view, as returned by reads and writes.
    #[must_use]
    pub fn full(issue: &Issue, site_url: &str) -> Self {
        let fields = &issue.fields;
        Self {
            description: Some(text_of(fields.description.as_ref())),
            labels: Some(fields.labels.clone()),
            components: Some(fields.components.iter().map(|c| c.name.clone()).collect()),
            fix_versions: Some(fields.fix_versions.iter().map(|v| v.name.clone()).collect()),
            ..Self::brief(issue, site_url)
        }
    }
}

/// Search results.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct SearchResponse {
    /// JQL that was run.
    pub jql: String,
    /// Total matches on the server.
    pub total: Option<u64>,
    /// Number of issues returned.
    pub count: usize,
    /// Matching issues.
    pub issues: Vec<IssueView>,
}

/// A workflow transition.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct TransitionView {
    /// Transition id.
    pub id: String,
    /// Transition name.
    pub name: String,
    /// Target status name.
    pub to_status: Option<String>,
}

impl From<&Transition> for TransitionView {
    fn from(t: &Transition) -> Self {
        Self {
            id: t.id.clone(),
            name: t.name.clone(),
            to_status: t.to.as_ref().map(|s| s.name.clone()),
        }
    }
}

/// A comment.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct CommentView {
    /// Comment id.
    pub id: String,
    /// Comment text.
    pub body: String,
    /// Author.
    pub author: Option<UserRef>,
    /// Creation timestamp.
    pub created: Option<String>,
    /// Last update timestamp.
    pub updated: Option<String>,
}

impl From<&Comment> for CommentView {
    fn from(c: &Comment) -> Self {
        Self {
            id: c.id.clone(),
            body: text_of(c.body.as_ref()),
            author: user_ref(c.author.as_ref()),
            created: c.created.clone(),
            updated: c.updated.clone(),
        }
    }
}

/// An attachment.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct AttachmentView {
    /// Attachment id.
    pub id: String,
    /// File name.
    pub filename: String,
    /// Size in bytes.
    pub size: u64,
    /// MIME type.
    pub mime_type: String,
    /// Upload timestamp.
    pub created: Option<String>,
    /// Uploader.
    pub author: Option<UserRef>,
    /// Download URL.
    pub content_url: Option<String>,
}

impl From<&Attachment> for AttachmentView {
    fn from(a: &Attachment) -> Self {
        Self {
            id: a.id.clone(),
            filename: a.filename.clone(),
            size: a.size,
            mime_type: a.mime_type.clone().unwrap_or_else(|| "unknown".to_string()),
            created: a.created.clone(),
            author: user_ref(a.author.as_ref()),
            content_url: a.content.clone(),
        }
    }
}

/// A link, seen from the issue it was listed on.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct LinkView {
    /// Link id.
    pub id: String,
    /// Link type name.
    #[serde(rename = "type")]
    pub link_type: String,
    /// `inward` or `outward`.
    pub direction: Option<&'static str>,
    /// Key of the issue on the other end.
    pub related_issue: Option<String>,
    /// Summary of the issue on the other end.
    pub related_summary: Option<String>,
}

impl From<&IssueLink> for LinkView {
    fn from(link: &IssueLink) -> Self {
        let (direction, other) = match (&link.outward_issue, &link.inward_issue) {
            (Some(issue), _) => (Some("outward"), Some(issue)),
            (None, Some(issue)) => (Some("inward"), Some(issue)),
            (None, None) => (None, None),
        };
        Self {
            id: link.id.clone(),
            link_type: link.link_type.name.clone(),
            direction,
            related_issue: other.map(|i| i.key.clone()),
            related_summary: other.and_then(|i| i.fields.summary.clone()),
        }
    }
}

/// A sub-task.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct SubtaskView {
    /// Issue key.
    pub key: String,
    /// Issue id.
    pub id: String,
    /// Summary line.
    pub summary: String,
    /// Status name.
    pub status: Option<String>,
    /// Browser URL.
    pub url: String,
    /// Assignee.
    pub assignee: Option<UserRef>,
}

impl SubtaskView {
    /// Build from a sub-task embedded in its parent.
    #[must_use]
    pub fn new(issue: &Issue, site_url: &str) -> Self {
        Self {
            key: issue.key.clone(),
            id: issue.id.clone(),
            summary: issue.fields.summary.clone().unwrap_or_default(),
            status: issue.fields.status.as_ref().map(|s| s.name.clone()),
            url: format!("{site_url}/browse/{}", issue.key),
            assignee: user_ref(issue.fields.assignee.as_ref()),
        }
    }
}

/// An issue type.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct IssueTypeView {
    /// Issue type id.
    pub id: String,
    /// Issue type name.
    pub name: String,
    /// Description.
    pub description: Option<String>,
    /// Whether this is a sub-task type.
    pub subtask: bool,
}

impl From<&IssueType> for IssueTypeView {
    fn from(t: &IssueType) -> Self {
        Self {
            id: t.id.clone(),
            name: t.name.clone(),
            description: t.description.clone(),
            subtask: t.subtask,
        }
    }
}

/// A project.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ProjectView {
    /// Project id.
    pub id: String,
    /// Project key.
    pub key: String,
    /// Project name.
    pub name: String,
    /// Project type.
    pub project_type: Option<String>,
    /// Description (single-project reads only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Lead (single-project reads only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lead: Option<UserRef>,
    /// Issue types (single-project reads only).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub issue_types: Vec<IssueTypeView>,
}

impl From<&Project> for ProjectView {
    fn from(p: &Project) -> Self {
        Self {
            id: p.id.clone(),
            key: p.key.clone(),
            name: p.name.clone(),
            project_type: p.project_type_key.clone(),
            description: p.description.clone(),
            lead: user_ref(p.lead.as_ref()),
            issue_types: p.issue_types.iter().map(IssueTypeView::from).collect(),
        }
    }
}

/// A user, as returned by `get_current_user` and `search_users`.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct UserView {
    /// Account id (Cloud) or username (Server).
    pub account_id: Option<String>,
    /// Display name.
    pub display_name: Option<String>,
    /// Email address, when visible.
    pub email: Option<String>,
    /// Whether the account is active.
    pub active: Option<bool>,
}

impl From<&User> for UserView {
    fn from(u: &User) -> Self {
        Self {
            account_id: u.account_ref().map(str::to_string),
            display_name: u.display_name.clone(),
            email: u.email_address.clone(),
            active: u.active,
        }
    }
}

/// Confirmation of a delete.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct DeletedResponse {
    /// Always `true`.
    pub deleted: bool,
    /// What was deleted, e.g. `comment`.
    pub kind: &'static str,
    /// Its id.
    pub id: String,
    /// Human-readable confirmation.
    pub message: String,
}

impl DeletedResponse {
    /// Build a confirmation.
    #[must_use]
    pub fn new(kind: &'static str, id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            deleted: true,
            message: format!("Deleted {kind} {id}"),
            kind,
            id,
        }
    }
}

/// Confirmation of a new link.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct LinkCreatedResponse {
    /// Inward issue key.
    pub inward_issue: String,
    /// Outward issue key.
    pub outward_issue: String,
    /// Link type name.
    pub link_type: String,
}

/// Response from `add_workspace`.
#[derive(Debug, Clone, Serialize)]
pub struct AddWorkspaceResponse {
    /// The stored workspace, token masked.
    pub workspace: WorkspaceSummary,
    /// Whether it became active.
    pub activated: bool,
    /// Connection check run right after saving. The workspace is kept even
    /// when this fails.
    pub validation: ValidationResult,
}

/// Response from `list_workspaces`.
#[derive(Debug, Clone, Serialize)]
pub struct ListWorkspacesResponse {
    /// All workspaces, tokens masked.
    pub workspaces: Vec<WorkspaceSummary>,
    /// Active workspace name.
    pub active: Option<String>,
    /// Number of workspaces.
    pub count: usize,
}

/// Response from `switch_workspace`.
#[derive(Debug, Clone, Serialize)]
pub struct SwitchWorkspaceResponse {
    /// The now-active workspace.
    pub workspace: WorkspaceSummary,
    /// Whether it was already active.
    pub already_active: bool,
    /// Human-readable outcome.
    pub message: String,
}

/// Response from `remove_workspace`.
#[derive(Debug, Clone, Serialize)]
pub struct RemoveWorkspaceResponse {
    /// Removed workspace name.
    pub removed: String,
    /// Whether it was active; if so nothing is active now.
    pub was_active: bool,
    /// Human-readable outcome.
    pub message: String,
}

/// Response from `create_workspace_skeleton`.
#[derive(Debug, Clone, Serialize)]
pub struct SkeletonResponse {
    /// Workspace name.
    pub workspace_name: String,
    /// File to edit.
    pub path: String,
    /// `cloud` or `pat`.
    pub auth_type: String,
    /// What to do next.
    pub message: String,
}

/// Connectivity section of `hello`.
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionStatus {
    /// Whether the instance answered.
    pub ok: bool,
    /// Instance title.
    pub server_title: Option<String>,
    /// Jira version.
    pub version: Option<String>,
    /// `Cloud` or `Server`.
    pub deployment_type: Option<String>,
    /// Failure detail.
    pub error: Option<String>,
}

impl From<&ServerInfo> for ConnectionStatus {
    fn from(info: &ServerInfo) -> Self {
        Self {
            ok: true,
            server_title: info.server_title.clone(),
            version: info.version.clone(),
            deployment_type: info.deployment_type.clone(),
            error: None,
        }
    }
}

/// Response from `hello`.
#[derive(Debug, Clone, Serialize)]
pub struct HelloResponse {
    /// Server name.
    pub server: String,
    /// Server version.
    pub version: String,
    /// Always `running`.
    pub status: &'static str,
    /// Number of configured workspaces.
    pub workspaces: usize,
    /// Active workspace, if any.
    pub active_workspace: Option<WorkspaceSummary>,
    /// Result of contacting the active workspace's instance.
    pub connection: Option<ConnectionStatus>,
    /// Next step, when there is an obvious one.
    pub hint: Option<String>,
}
