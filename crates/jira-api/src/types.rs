//! Raw Jira REST v2 response types.
//!
//! These mirror the subset of the wire format the adapter reads. Fields Jira
//! may omit or send as `null` are optional or defaulted; unknown fields are
//! ignored.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Deserialize `null` as the type's default (Jira sends `null` for empty lists).
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Result of `GET serverInfo`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerInfo {
    /// Human-readable instance title.
    pub server_title: Option<String>,
    /// Jira version string.
    pub version: Option<String>,
    /// Canonical base URL reported by the instance.
    pub base_url: Option<String>,
    /// `Cloud` or `Server`.
    pub deployment_type: Option<String>,
}

/// A Jira user.
///
/// Cloud identifies users by `accountId`; Server and Data Center use `name`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Cloud account id.
    pub account_id: Option<String>,
    /// Server / Data Center username.
    pub name: Option<String>,
    /// Email address, when visible to the caller.
    pub email_address: Option<String>,
    /// Display name.
    pub display_name: Option<String>,
    /// Whether the account is active.
    pub active: Option<bool>,
}

impl User {
    /// Identifier to use when referring to this user in requests.
    #[must_use]
    pub fn account_ref(&self) -> Option<&str> {
        self.account_id.as_deref().or(self.name.as_deref())
    }
}

/// Any Jira entity that carries an id and a name (status, priority, type...).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Named {
    /// Entity id.
    pub id: Option<String>,
    /// Entity name.
    #[serde(default)]
    pub name: String,
}

/// An issue type as listed on a project.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IssueType {
    /// Issue type id.
    pub id: String,
    /// Issue type name.
    pub name: String,
    /// Description, if any.
    pub description: Option<String>,
    /// Whether this is a sub-task type.
    #[serde(default)]
    pub subtask: bool,
}

/// A project.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Project id.
    pub id: String,
    /// Project key (e.g. `PROJ`).
    pub key: String,
    /// Project name.
    pub name: String,
    /// `software`, `business`, `service_desk`...
    pub project_type_key: Option<String>,
    /// Description, present on the single-project endpoint.
    pub description: Option<String>,
    /// Project lead, present on the single-project endpoint.
    pub lead: Option<User>,
    /// Issue types, present on the single-project endpoint.
    #[serde(default, deserialize_with = "null_as_default")]
    pub issue_types: Vec<IssueType>,
}

/// Reference to a project inside an issue.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectRef {
    /// Project key.
    pub key: String,
    /// Project name.
    pub name: Option<String>,
}

/// An issue.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Issue {
    /// Issue id.
    pub id: String,
    /// Issue key (e.g. `PROJ-123`).
    pub key: String,
    /// Issue fields.
    #[serde(default)]
    pub fields: IssueFields,
}

/// The subset of issue fields the adapter reads.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueFields {
    /// Summary line.
    pub summary: Option<String>,
    /// Workflow status.
    pub status: Option<Named>,
    /// Issue type.
    #[serde(rename = "issuetype")]
    pub issue_type: Option<Named>,
    /// Owning project.
    pub project: Option<ProjectRef>,
    /// Creation timestamp as sent by Jira.
    pub created: Option<String>,
    /// Last update timestamp as sent by Jira.
    pub updated: Option<String>,
    /// Assignee.
    pub assignee: Option<User>,
    /// Reporter.
    pub reporter: Option<User>,
    /// Priority.
    pub priority: Option<Named>,
    /// Description. A plain string on REST v2, a document on v3.
    pub description: Option<Value>,
    /// Labels.
    #[serde(default, deserialize_with = "null_as_default")]
    pub labels: Vec<String>,
    /// Components.
    #[serde(default, deserialize_with = "null_as_default")]
    pub components: Vec<Named>,
    /// Fix versions.
    #[serde(default, deserialize_with = "null_as_default")]
    pub fix_versions: Vec<Named>,
    /// Embedded comment page.
    pub comment: Option<CommentPage>,
    /// Attachments.
    #[serde(default, deserialize_with = "null_as_default")]
    pub attachment: Vec<Attachment>,
    /// Links to other issues.
    #[serde(rename = "issuelinks", default, deserialize_with = "null_as_default")]
    pub issue_links: Vec<IssueLink>,
    /// Sub-tasks.
    #[serde(default, deserialize_with = "null_as_default")]
    pub subtasks: Vec<Issue>,
}

/// Reply to `POST issue`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedIssue {
    /// New issue id.
    pub id: String,
    /// New issue key.
    pub key: String,
}

/// A page of search results.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResults {
    /// Matching issues.
    #[serde(default)]
    pub issues: Vec<Issue>,
    /// Total number of matches on the server.
    pub total: Option<u64>,
}

/// A workflow transition available on an issue.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Transition {
    /// Transition id.
    pub id: String,
    /// Transition name.
    pub name: String,
    /// Target status.
    pub to: Option<Named>,
}

/// Reply to `GET issue/{key}/transitions`.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct TransitionList {
    #[serde(default)]
    pub transitions: Vec<Transition>,
}

/// A comment.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Comment {
    /// Comment id.
    pub id: String,
    /// Comment body.
    pub body: Option<Value>,
    /// Author.
    pub author: Option<User>,
    /// Creation timestamp.
    pub created: Option<String>,
    /// Last update timestamp.
    pub updated: Option<String>,
}

/// A page of comments.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommentPage {
    /// Comments on this page.
    #[serde(default)]
    pub comments: Vec<Comment>,
}

/// An attachment.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    /// Attachment id.
    pub id: String,
    /// File name.
    pub filename: String,
    /// Size in bytes.
    #[serde(default)]
    pub size: u64,
    /// MIME type.
    pub mime_type: Option<String>,
    /// Upload timestamp.
    pub created: Option<String>,
    /// Uploader.
    pub author: Option<User>,
    /// Download URL.
    pub content: Option<String>,
}

/// A link type (e.g. `Blocks`, `Relates`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LinkType {
    /// Link type name.
    pub name: String,
    /// Phrase for the inward direction.
    pub inward: Option<String>,
    /// Phrase for the outward direction.
    pub outward: Option<String>,
}

/// A link between two issues, seen from one side.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueLink {
    /// Link id.
    pub id: String,
    /// Link type.
    #[serde(rename = "type")]
    pub link_type: LinkType,
    /// Present when the other issue is on the inward side.
    pub inward_issue: Option<Issue>,
    /// Present when the other issue is on the outward side.
    pub outward_issue: Option<Issue>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_tolerates_nulls_and_missing_fields() {
        let raw = r#"{
            "id": "10001",
            "key": "PROJ-1",
            "fields": {
                "summary": "Broken login",
                "labels": null,
                "components": null,
                "assignee": null,
                "issuelinks": [],
                "fixVersions": [{"id": "1", "name": "1.0"}]
            }
        }"#;

        let issue: Issue = serde_json::from_str(raw).unwrap();
        assert_eq!(issue.key, "PROJ-1");
        assert!(issue.fields.labels.is_empty());
        assert!(issue.fields.components.is_empty());
        assert!(issue.fields.assignee.is_none());
        assert_eq!(issue.fields.fix_versions[0].name, "1.0");
    }

    #[test]
    fn test_user_account_ref_prefers_cloud_id() {
        let cloud: User =
            serde_json::from_str(r#"{"accountId":"5b10a","name":"jdoe","displayName":"J"}"#)
                .unwrap();
        assert_eq!(cloud.account_ref(), Some("5b10a"));

        let server: User = serde_json::from_str(r#"{"name":"jdoe"}"#).unwrap();
        assert_eq!(server.account_ref(), Some("jdoe"));

        assert_eq!(User::default().account_ref(), None);
    }

    #[test]
    fn test_issue_link_direction() {
        let raw = r#"{
            "id": "200",
            "type": {"name": "Blocks", "inward": "is blocked by", "outward": "blocks"},
            "outwardIssue": {"id": "2", "key": "PROJ-2", "fields": {"summary": "Other"}}
        }"#;

        let link: IssueLink = serde_json::from_str(raw).unwrap();
        assert_eq!(link.link_type.name, "Blocks");
        assert!(link.inward_issue.is_none());
        assert_eq!(link.outward_issue.unwrap().key, "PROJ-2");
    }
}
