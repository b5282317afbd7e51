//! In-memory [`JiraApi`] and [`Connector`] for tests.
//!
//! Available under `#[cfg(test)]` or with the `test-util` feature:
//!
//! ```toml
//! [dev-dependencies]
//! jira-api = { version = "...", features = ["test-util"] }
//! ```
//!
//! `MockJira` keeps issues, comments and transitions in memory and records
//! every call by method name, so tests can assert how many remote round trips
//! an operation made.

use crate::auth::Credentials;
use crate::client::{Connector, JiraApi};
use crate::error::{ApiError, Result};
use crate::types::{
    Attachment, Comment, CommentPage, CreatedIssue, Issue, IssueFields, Named, Project,
    ProjectRef, SearchResults, ServerInfo, Transition, User,
};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// Failure a [`MockJira`] returns from every call once set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockFailure {
    /// HTTP 401.
    Unauthorized,
    /// HTTP 403.
    Forbidden,
    /// Connection failure.
    Unreachable,
    /// HTTP 500.
    ServerError,
}

impl MockFailure {
    fn to_error(self) -> ApiError {
        match self {
            Self::Unauthorized => ApiError::Unauthorized("Unauthorized".to_string()),
            Self::Forbidden => ApiError::Forbidden("Forbidden".to_string()),
            Self::Unreachable => ApiError::Unreachable {
                site: "mock".to_string(),
                reason: "connection failed",
            },
            Self::ServerError => ApiError::Remote {
                status: 500,
                message: "Internal Server Error".to_string(),
            },
        }
    }
}

#[derive(Default)]
struct MockState {
    calls: Vec<String>,
    failure: Option<MockFailure>,
    issues: BTreeMap<String, Issue>,
    transitions: Vec<Transition>,
    next_id: u64,
}

/// In-memory Jira.
#[derive(Default)]
pub struct MockJira {
    state: Mutex<MockState>,
}

impl MockJira {
    /// Create an empty mock.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an issue.
    #[must_use]
    pub fn with_issue(self, issue: Issue) -> Self {
        self.lock().issues.insert(issue.key.clone(), issue);
        self
    }

    /// Seed the transitions every issue offers.
    #[must_use]
    pub fn with_transitions(self, transitions: Vec<Transition>) -> Self {
        self.lock().transitions = transitions;
        self
    }

    /// Make every subsequent call fail.
    pub fn fail_with(&self, failure: MockFailure) {
        self.lock().failure = Some(failure);
    }

    /// Method names of all calls made so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    /// Number of calls made so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.lock().calls.len()
    }

    /// Snapshot of a stored issue.
    #[must_use]
    pub fn stored_issue(&self, key: &str) -> Option<Issue> {
        self.lock().issues.get(key).cloned()
    }

    /// Build a minimal issue for seeding.
    #[must_use]
    pub fn issue(key: &str, summary: &str) -> Issue {
        let project = key.split('-').next().unwrap_or(key).to_string();
        Issue {
            id: format!("1{}", key.len()),
            key: key.to_string(),
            fields: IssueFields {
                summary: Some(summary.to_string()),
                status: Some(named("To Do")),
                issue_type: Some(named("Task")),
                project: Some(ProjectRef {
                    key: project,
                    name: None,
                }),
                created: Some("2024-01-01T00:00:00.000+0000".to_string()),
                updated: Some("2024-01-01T00:00:00.000+0000".to_string()),
                ..IssueFields::default()
            },
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Record a call and return the configured failure, if any.
    fn record(&self, name: &str) -> Result<MutexGuard<'_, MockState>> {
        let mut state = self.lock();
        state.calls.push(name.to_string());
        match state.failure {
            Some(failure) => Err(failure.to_error()),
            None => Ok(state),
        }
    }
}

fn named(name: &str) -> Named {
    Named {
        id: None,
        name: name.to_string(),
    }
}

fn mock_user() -> User {
    User {
        account_id: Some("mock-account".to_string()),
        name: None,
        email_address: Some("mock@example.com".to_string()),
        display_name: Some("Mock User".to_string()),
        active: Some(true),
    }
}

fn not_found(key: &str) -> ApiError {
    ApiError::NotFound(format!("Issue {key} does not exist"))
}

fn apply_fields(fields: &mut IssueFields, update: &Value) {
    if let Some(summary) = update.get("summary").and_then(Value::as_str) {
        fields.summary = Some(summary.to_string());
    }
    if let Some(description) = update.get("description") {
        fields.description = Some(description.clone());
    }
    if let Some(labels) = update.get("labels").and_then(Value::as_array) {
        fields.labels = labels
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect();
    }
    if let Some(priority) = update
        .get("priority")
        .and_then(|p| p.get("name"))
        .and_then(Value::as_str)
    {
        fields.priority = Some(named(priority));
    }
    if let Some(assignee) = update.get("assignee") {
        fields.assignee = assignee_from(assignee);
    }
}

fn assignee_from(body: &Value) -> Option<User> {
    let account_id = body.get("accountId").and_then(Value::as_str);
    let name = body.get("name").and_then(Value::as_str);
    if account_id.is_none() && name.is_none() {
        return None;
    }
    Some(User {
        account_id: account_id.map(str::to_string),
        name: name.map(str::to_string),
        display_name: account_id.or(name).map(str::to_string),
        ..User::default()
    })
}

#[async_trait]
impl JiraApi for MockJira {
    async fn server_info(&self) -> Result<ServerInfo> {
        self.record("server_info")?;
        Ok(ServerInfo {
            server_title: Some("Mock Jira".to_string()),
            version: Some("9.12.0".to_string()),
            base_url: None,
            deployment_type: Some("Cloud".to_string()),
        })
    }

    async fn myself(&self) -> Result<User> {
        self.record("myself")?;
        Ok(mock_user())
    }

    async fn search_users(&self, query: &str, max_results: u32) -> Result<Vec<User>> {
        self.record("search_users")?;
        let user = mock_user();
        let matches = user
            .display_name
            .as_deref()
            .is_some_and(|n| n.to_lowercase().contains(&query.to_lowercase()));
        Ok(if matches && max_results > 0 {
            vec![user]
        } else {
            vec![]
        })
    }

    async fn projects(&self) -> Result<Vec<Project>> {
        let state = self.record("projects")?;
        let mut keys: Vec<String> = state
            .issues
            .values()
            .filter_map(|i| i.fields.project.as_ref().map(|p| p.key.clone()))
            .collect();
        keys.dedup();
        Ok(keys
            .into_iter()
            .map(|key| Project {
                id: format!("100{}", key.len()),
                name: format!("{key} project"),
                key,
                project_type_key: Some("software".to_string()),
                ..Project::default()
            })
            .collect())
    }

    async fn project(&self, key: &str) -> Result<Project> {
        self.record("project")?;
        Ok(Project {
            id: "10000".to_string(),
            key: key.to_string(),
            name: format!("{key} project"),
            project_type_key: Some("software".to_string()),
            description: None,
            lead: Some(mock_user()),
            issue_types: vec![
                crate::types::IssueType {
                    id: "1".to_string(),
                    name: "Task".to_string(),
                    description: None,
                    subtask: false,
                },
                crate::types::IssueType {
                    id: "2".to_string(),
                    name: "Sub-task".to_string(),
                    description: None,
                    subtask: true,
                },
            ],
        })
    }

    async fn search_issues(
        &self,
        _jql: &str,
        max_results: u32,
        _fields: &[String],
    ) -> Result<SearchResults> {
        let state = self.record("search_issues")?;
        let issues: Vec<Issue> = state
            .issues
            .values()
            .take(usize::try_from(max_results).unwrap_or(usize::MAX))
            .cloned()
            .collect();
        Ok(SearchResults {
            total: Some(state.issues.len() as u64),
            issues,
        })
    }

    async fn issue(&self, key: &str) -> Result<Issue> {
        let state = self.record("issue")?;
        state.issues.get(key).cloned().ok_or_else(|| not_found(key))
    }

    async fn create_issue(&self, fields: Value) -> Result<CreatedIssue> {
        let mut state = self.record("create_issue")?;
        state.next_id += 1;
        let project = fields
            .pointer("/project/key")
            .and_then(Value::as_str)
            .unwrap_or("MOCK")
            .to_string();
        let key = format!("{project}-{}", 100 + state.next_id);
        let mut issue = Self::issue(&key, "");
        issue.id = format!("{}", 20_000 + state.next_id);
        if let Some(kind) = fields.pointer("/issuetype/name").and_then(Value::as_str) {
            issue.fields.issue_type = Some(named(kind));
        }
        apply_fields(&mut issue.fields, &fields);

        if let Some(parent) = fields.pointer("/parent/key").and_then(Value::as_str) {
            let child = issue.clone();
            if let Some(parent) = state.issues.get_mut(parent) {
                parent.fields.subtasks.push(child);
            }
        }

        let created = CreatedIssue {
            id: issue.id.clone(),
            key: key.clone(),
        };
        state.issues.insert(key, issue);
        Ok(created)
    }

    async fn update_issue(&self, key: &str, fields: Value) -> Result<()> {
        let mut state = self.record("update_issue")?;
        let issue = state.issues.get_mut(key).ok_or_else(|| not_found(key))?;
        apply_fields(&mut issue.fields, &fields);
        Ok(())
    }

    async fn assign_issue(&self, key: &str, assignee: Value) -> Result<()> {
        let mut state = self.record("assign_issue")?;
        let issue = state.issues.get_mut(key).ok_or_else(|| not_found(key))?;
        issue.fields.assignee = assignee_from(&assignee);
        Ok(())
    }

    async fn transitions(&self, key: &str) -> Result<Vec<Transition>> {
        let state = self.record("transitions")?;
        if !state.issues.contains_key(key) {
            return Err(not_found(key));
        }
        Ok(state.transitions.clone())
    }

    async fn transition_issue(
        &self,
        key: &str,
        transition_id: &str,
        comment: Option<&str>,
    ) -> Result<()> {
        let mut state = self.record("transition_issue")?;
        let target = state
            .transitions
            .iter()
            .find(|t| t.id == transition_id)
            .and_then(|t| t.to.clone())
            .ok_or_else(|| ApiError::Remote {
                status: 400,
                message: format!("Transition {transition_id} is not valid"),
            })?;
        let issue = state.issues.get_mut(key).ok_or_else(|| not_found(key))?;
        issue.fields.status = Some(target);
        if let Some(body) = comment {
            let page = issue.fields.comment.get_or_insert_with(CommentPage::default);
            let id = format!("{}", 500 + page.comments.len());
            page.comments.push(Comment {
                id,
                body: Some(Value::String(body.to_string())),
                author: Some(mock_user()),
                created: None,
                updated: None,
            });
        }
        Ok(())
    }

    async fn comments(&self, key: &str) -> Result<Vec<Comment>> {
        let state = self.record("comments")?;
        let issue = state.issues.get(key).ok_or_else(|| not_found(key))?;
        Ok(issue
            .fields
            .comment
            .as_ref()
            .map(|p| p.comments.clone())
            .unwrap_or_default())
    }

    async fn add_comment(&self, key: &str, body: &str) -> Result<Comment> {
        let mut state = self.record("add_comment")?;
        let issue = state.issues.get_mut(key).ok_or_else(|| not_found(key))?;
        let page = issue.fields.comment.get_or_insert_with(CommentPage::default);
        let comment = Comment {
            id: format!("{}", 500 + page.comments.len()),
            body: Some(Value::String(body.to_string())),
            author: Some(mock_user()),
            created: Some("2024-01-02T00:00:00.000+0000".to_string()),
            updated: Some("2024-01-02T00:00:00.000+0000".to_string()),
        };
        page.comments.push(comment.clone());
        Ok(comment)
    }

    async fn update_comment(&self, key: &str, comment_id: &str, body: &str) -> Result<Comment> {
        let mut state = self.record("update_comment")?;
        let issue = state.issues.get_mut(key).ok_or_else(|| not_found(key))?;
        let comment = issue
            .fields
            .comment
            .as_mut()
            .and_then(|p| p.comments.iter_mut().find(|c| c.id == comment_id))
            .ok_or_else(|| ApiError::NotFound(format!("Comment {comment_id} not found")))?;
        comment.body = Some(Value::String(body.to_string()));
        Ok(comment.clone())
    }

    async fn delete_comment(&self, key: &str, comment_id: &str) -> Result<()> {
        let mut state = self.record("delete_comment")?;
        let issue = state.issues.get_mut(key).ok_or_else(|| not_found(key))?;
        if let Some(page) = issue.fields.comment.as_mut() {
            page.comments.retain(|c| c.id != comment_id);
        }
        Ok(())
    }

    async fn add_attachment(
        &self,
        key: &str,
        filename: &str,
        content: Vec<u8>,
    ) -> Result<Vec<Attachment>> {
        let mut state = self.record("add_attachment")?;
        let issue = state.issues.get_mut(key).ok_or_else(|| not_found(key))?;
        let attachment = Attachment {
            id: format!("{}", 900 + issue.fields.attachment.len()),
            filename: filename.to_string(),
            size: content.len() as u64,
            mime_type: Some("application/octet-stream".to_string()),
            created: None,
            author: Some(mock_user()),
            content: None,
        };
        issue.fields.attachment.push(attachment.clone());
        Ok(vec![attachment])
    }

    async fn delete_attachment(&self, attachment_id: &str) -> Result<()> {
        let mut state = self.record("delete_attachment")?;
        for issue in state.issues.values_mut() {
            issue.fields.attachment.retain(|a| a.id != attachment_id);
        }
        Ok(())
    }

    async fn create_link(&self, _link_type: &str, inward: &str, outward: &str) -> Result<()> {
        let state = self.record("create_link")?;
        for key in [inward, outward] {
            if !state.issues.contains_key(key) {
                return Err(not_found(key));
            }
        }
        Ok(())
    }

    async fn delete_link(&self, _link_id: &str) -> Result<()> {
        self.record("delete_link")?;
        Ok(())
    }
}

/// [`Connector`] that hands out one shared [`MockJira`].
pub struct MockConnector {
    api: Arc<MockJira>,
    connects: AtomicUsize,
    last: Mutex<Option<Credentials>>,
}

impl MockConnector {
    /// Wrap a mock.
    #[must_use]
    pub fn new(api: Arc<MockJira>) -> Self {
        Self {
            api,
            connects: AtomicUsize::new(0),
            last: Mutex::new(None),
        }
    }

    /// The shared mock.
    #[must_use]
    pub fn api(&self) -> &Arc<MockJira> {
        &self.api
    }

    /// Number of clients handed out.
    #[must_use]
    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    /// Credentials of the most recent `connect`.
    #[must_use]
    pub fn last_credentials(&self) -> Option<Credentials> {
        self.last
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

impl Connector for MockConnector {
    fn connect(&self, credentials: &Credentials) -> Result<Arc<dyn JiraApi>> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        *self
            .last
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(credentials.clone());
        let api: Arc<dyn JiraApi> = self.api.clone();
        Ok(api)
    }
}
