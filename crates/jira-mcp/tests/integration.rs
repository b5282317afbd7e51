//! End-to-end tests of the operation router against a mock Jira.

use jira_api::mock::{MockConnector, MockFailure, MockJira};
use jira_api::types::{Named, Transition};
use jira_mcp::{ErrorKind, Router, ServerConfig, ToolFailure};
use jira_workspace::WorkspaceStore;
use serde_json::{Map, Value, json};
use std::sync::Arc;
use tempfile::TempDir;

struct Harness {
    _dir: TempDir,
    connector: Arc<MockConnector>,
    router: Router,
}

impl Harness {
    async fn new(jira: MockJira) -> Self {
        Self::with_config(jira, ServerConfig::default()).await
    }

    async fn with_config(jira: MockJira, config: ServerConfig) -> Self {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(WorkspaceStore::open(dir.path()).await.unwrap());
        let connector = Arc::new(MockConnector::new(Arc::new(jira)));
        let router = Router::new(store, connector.clone(), config);
        Self {
            _dir: dir,
            connector,
            router,
        }
    }

    /// A harness with one active cloud workspace named `acme`.
    async fn with_acme(jira: MockJira) -> Self {
        let harness = Self::new(jira).await;
        harness.add_workspace("acme").await;
        harness
    }

    async fn add_workspace(&self, name: &str) {
        self.call(
            "jira_workspace",
            json!({
                "operation": "add_workspace",
                "workspace_name": name,
                "site_url": format!("{name}.atlassian.net"),
                "email": format!("me@{name}.io"),
                "api_token": "token-abcdef-1234"
            }),
        )
        .await
        .unwrap();
    }

    async fn call(&self, tool: &str, args: Value) -> Result<Value, ToolFailure> {
        let args: Map<String, Value> = args.as_object().cloned().unwrap();
        self.router.dispatch(tool, args).await
    }

    fn jira(&self) -> &Arc<MockJira> {
        self.connector.api()
    }
}

fn jira_with_issue() -> MockJira {
    MockJira::new().with_issue(MockJira::issue("PROJ-1", "Login broken"))
}

fn assert_kind(result: Result<Value, ToolFailure>, expected: ErrorKind) -> ToolFailure {
    match result {
        Err(failure) => {
            assert_eq!(failure.error_kind, expected, "message: {}", failure.message);
            failure
        }
        Ok(value) => panic!("Expected {expected}, got success: {value}"),
    }
}

#[tokio::test]
async fn test_missing_parameter_fails_before_any_network_call() {
    let h = Harness::with_acme(jira_with_issue()).await;
    let connects = h.connector.connect_count();
    let calls = h.jira().call_count();

    let failure = assert_kind(
        h.call(
            "jira_issues",
            json!({"operation": "create", "summary": "New", "issue_type": "Task"}),
        )
        .await,
        ErrorKind::MissingParameter,
    );

    assert!(failure.message.contains("project_key"));
    assert_eq!(h.connector.connect_count(), connects);
    assert_eq!(h.jira().call_count(), calls);
}

#[tokio::test]
async fn test_unknown_tool_lists_tools() {
    let h = Harness::new(MockJira::new()).await;
    let failure = assert_kind(
        h.call("jira_boards", json!({"operation": "list"})).await,
        ErrorKind::UnknownTool,
    );
    assert!(failure.message.contains("jira_workspace, jira_projects, jira_issues"));
}

#[tokio::test]
async fn test_unknown_operation_lists_operations() {
    let h = Harness::with_acme(MockJira::new()).await;
    let failure = assert_kind(
        h.call("jira_projects", json!({"operation": "archive"})).await,
        ErrorKind::UnknownOperation,
    );
    assert!(failure.message.contains("list, get, get_issue_types"));
}

#[tokio::test]
async fn test_unexpected_parameter_rejected() {
    let h = Harness::with_acme(jira_with_issue()).await;
    let failure = assert_kind(
        h.call(
            "jira_issues",
            json!({"operation": "read", "issue_key": "PROJ-1", "expand": "all"}),
        )
        .await,
        ErrorKind::UnexpectedParameter,
    );
    assert!(failure.message.contains("expand"));
}

#[tokio::test]
async fn test_read_connects_once() {
    let h = Harness::with_acme(jira_with_issue()).await;
    let connects = h.connector.connect_count();

    let issue = h
        .call("jira_issues", json!({"operation": "read", "issue_key": "PROJ-1"}))
        .await
        .unwrap();

    assert_eq!(issue["key"], "PROJ-1");
    assert_eq!(issue["summary"], "Login broken");
    assert_eq!(issue["url"], "https://acme.atlassian.net/browse/PROJ-1");
    assert_eq!(issue["description"], "");
    assert_eq!(h.connector.connect_count(), connects + 1);
}

#[tokio::test]
async fn test_no_active_workspace_is_not_an_auth_failure() {
    let h = Harness::new(jira_with_issue()).await;
    assert_kind(
        h.call("jira_issues", json!({"operation": "read", "issue_key": "PROJ-1"}))
            .await,
        ErrorKind::NoActiveWorkspace,
    );
    assert_eq!(h.connector.connect_count(), 0);

    let h = Harness::with_acme(jira_with_issue()).await;
    h.jira().fail_with(MockFailure::Unauthorized);
    assert_kind(
        h.call("jira_issues", json!({"operation": "read", "issue_key": "PROJ-1"}))
            .await,
        ErrorKind::AuthenticationFailed,
    );
}

#[tokio::test]
async fn test_workspace_override_uses_named_credentials() {
    let h = Harness::with_acme(jira_with_issue()).await;
    h.add_workspace("beta").await;

    h.call(
        "jira_issues",
        json!({"operation": "read", "issue_key": "PROJ-1", "workspace": "beta"}),
    )
    .await
    .unwrap();
    let creds = h.connector.last_credentials().unwrap();
    assert_eq!(creds.site_url, "https://beta.atlassian.net");

    h.call("jira_issues", json!({"operation": "read", "issue_key": "PROJ-1"}))
        .await
        .unwrap();
    let creds = h.connector.last_credentials().unwrap();
    assert_eq!(creds.site_url, "https://acme.atlassian.net");
}

#[tokio::test]
async fn test_unknown_workspace_override() {
    let h = Harness::with_acme(jira_with_issue()).await;
    assert_kind(
        h.call(
            "jira_issues",
            json!({"operation": "read", "issue_key": "PROJ-1", "workspace": "nope"}),
        )
        .await,
        ErrorKind::NotFound,
    );
}

fn workflow() -> Vec<Transition> {
    [("11", "Start Progress", "In Progress"), ("31", "Done", "Done")]
        .into_iter()
        .map(|(id, name, to)| Transition {
            id: id.to_string(),
            name: name.to_string(),
            to: Some(Named {
                id: None,
                name: to.to_string(),
            }),
        })
        .collect()
}

#[tokio::test]
async fn test_transition_by_name() {
    let h = Harness::with_acme(jira_with_issue().with_transitions(workflow())).await;

    let issue = h
        .call(
            "jira_issues",
            json!({
                "operation": "transition",
                "issue_key": "PROJ-1",
                "transition": "start progress"
            }),
        )
        .await
        .unwrap();

    assert_eq!(issue["status"], "In Progress");
}

#[tokio::test]
async fn test_transition_by_numeric_id_with_comment() {
    let h = Harness::with_acme(jira_with_issue().with_transitions(workflow())).await;

    let issue = h
        .call(
            "jira_issues",
            json!({
                "operation": "transition",
                "issue_key": "PROJ-1",
                "transition": 31,
                "comment": "Shipped"
            }),
        )
        .await
        .unwrap();
    assert_eq!(issue["status"], "Done");

    let comments = h
        .call(
            "jira_issues",
            json!({"operation": "list_comments", "issue_key": "PROJ-1"}),
        )
        .await
        .unwrap();
    assert_eq!(comments["comments"][0]["body"], "Shipped");
}

#[tokio::test]
async fn test_unavailable_transition_lists_choices() {
    let h = Harness::with_acme(jira_with_issue().with_transitions(workflow())).await;
    let failure = assert_kind(
        h.call(
            "jira_issues",
            json!({"operation": "transition", "issue_key": "PROJ-1", "transition": "Reopen"}),
        )
        .await,
        ErrorKind::InvalidParameter,
    );
    assert!(failure.message.contains("Start Progress (11)"));
    assert!(failure.message.contains("Done (31)"));
}

#[tokio::test]
async fn test_create_and_update_issue() {
    let h = Harness::with_acme(jira_with_issue()).await;

    let created = h
        .call(
            "jira_issues",
            json!({
                "operation": "create",
                "project_key": "PROJ",
                "summary": "Add SSO",
                "issue_type": "Story",
                "labels": ["auth"],
                "priority": "High"
            }),
        )
        .await
        .unwrap();
    let key = created["key"].as_str().unwrap().to_string();
    assert!(key.starts_with("PROJ-"));
    assert_eq!(created["issue_type"], "Story");
    assert_eq!(created["labels"], json!(["auth"]));
    assert_eq!(created["priority"], "High");

    let updated = h
        .call(
            "jira_issues",
            json!({"operation": "update", "issue_key": key, "summary": "Add SAML SSO"}),
        )
        .await
        .unwrap();
    assert_eq!(updated["summary"], "Add SAML SSO");
}

#[tokio::test]
async fn test_update_without_fields_is_rejected() {
    let h = Harness::with_acme(jira_with_issue()).await;
    let calls = h.jira().call_count();
    assert_kind(
        h.call(
            "jira_issues",
            json!({"operation": "update", "issue_key": "PROJ-1"}),
        )
        .await,
        ErrorKind::InvalidParameter,
    );
    assert_eq!(h.jira().call_count(), calls);
}

#[tokio::test]
async fn test_assign_uses_account_id_on_cloud() {
    let h = Harness::with_acme(jira_with_issue()).await;
    let issue = h
        .call(
            "jira_issues",
            json!({"operation": "assign", "issue_key": "PROJ-1", "assignee": "5b10ac8d"}),
        )
        .await
        .unwrap();
    assert_eq!(issue["assignee"]["account_id"], "5b10ac8d");
}

#[tokio::test]
async fn test_subtasks() {
    let h = Harness::with_acme(jira_with_issue()).await;

    let subtask = h
        .call(
            "jira_issues",
            json!({
                "operation": "create_subtask",
                "parent_key": "PROJ-1",
                "summary": "Write tests"
            }),
        )
        .await
        .unwrap();
    assert_eq!(subtask["issue_type"], "Sub-task");
    assert_eq!(subtask["project"], "PROJ");

    let listed = h
        .call(
            "jira_issues",
            json!({"operation": "list_subtasks", "issue_key": "PROJ-1"}),
        )
        .await
        .unwrap();
    assert_eq!(listed["count"], 1);
    assert_eq!(listed["subtasks"][0]["key"], subtask["key"]);
}

#[tokio::test]
async fn test_comment_lifecycle() {
    let h = Harness::with_acme(jira_with_issue()).await;

    let added = h
        .call(
            "jira_issues",
            json!({"operation": "add_comment", "issue_key": "PROJ-1", "body": "First"}),
        )
        .await
        .unwrap();
    assert_eq!(added["body"], "First");
    assert_eq!(added["author"]["name"], "Mock User");
    let id: u64 = added["id"].as_str().unwrap().parse().unwrap();

    let updated = h
        .call(
            "jira_issues",
            json!({
                "operation": "update_comment",
                "issue_key": "PROJ-1",
                "comment_id": id,
                "body": "Edited"
            }),
        )
        .await
        .unwrap();
    assert_eq!(updated["body"], "Edited");

    let deleted = h
        .call(
            "jira_issues",
            json!({
                "operation": "delete_comment",
                "issue_key": "PROJ-1",
                "comment_id": id.to_string()
            }),
        )
        .await
        .unwrap();
    assert_eq!(deleted["deleted"], true);

    let listed = h
        .call(
            "jira_issues",
            json!({"operation": "list_comments", "issue_key": "PROJ-1"}),
        )
        .await
        .unwrap();
    assert_eq!(listed["count"], 0);
}

#[tokio::test]
async fn test_add_attachment_from_file() {
    let h = Harness::with_acme(jira_with_issue()).await;
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("trace.log");
    std::fs::write(&path, b"stack trace").unwrap();

    let uploaded = h
        .call(
            "jira_issues",
            json!({"operation": "add_attachment", "issue_key": "PROJ-1", "file_path": path}),
        )
        .await
        .unwrap();
    assert_eq!(uploaded["attachments"][0]["filename"], "trace.log");
    assert_eq!(uploaded["attachments"][0]["size"], 11);

    let listed = h
        .call(
            "jira_issues",
            json!({"operation": "list_attachments", "issue_key": "PROJ-1"}),
        )
        .await
        .unwrap();
    assert_eq!(listed["count"], 1);
}

#[tokio::test]
async fn test_missing_attachment_file_makes_no_upload() {
    let h = Harness::with_acme(jira_with_issue()).await;
    let failure = assert_kind(
        h.call(
            "jira_issues",
            json!({
                "operation": "add_attachment",
                "issue_key": "PROJ-1",
                "file_path": "/no/such/file.txt"
            }),
        )
        .await,
        ErrorKind::InvalidParameter,
    );
    assert!(failure.message.contains("file_path"));
    assert!(!h.jira().calls().contains(&"add_attachment".to_string()));
}

#[tokio::test]
async fn test_create_link_defaults_to_relates() {
    let h = Harness::with_acme(
        jira_with_issue().with_issue(MockJira::issue("PROJ-2", "Other")),
    )
    .await;
    let link = h
        .call(
            "jira_issues",
            json!({
                "operation": "create_link",
                "inward_issue": "PROJ-1",
                "outward_issue": "PROJ-2"
            }),
        )
        .await
        .unwrap();
    assert_eq!(link["link_type"], "Relates");
}

#[tokio::test]
async fn test_search_uses_configured_default_limit() {
    let jira = jira_with_issue()
        .with_issue(MockJira::issue("PROJ-2", "Two"))
        .with_issue(MockJira::issue("PROJ-3", "Three"));
    let config = ServerConfig {
        default_max_results: 2,
        ..ServerConfig::default()
    };
    let h = Harness::with_config(jira, config).await;
    h.add_workspace("acme").await;

    let results = h
        .call(
            "jira_issues",
            json!({"operation": "search", "jql": "project = PROJ"}),
        )
        .await
        .unwrap();
    assert_eq!(results["count"], 2);
    assert_eq!(results["total"], 3);
    assert!(results["issues"][0].get("description").is_none());
}

#[tokio::test]
async fn test_projects() {
    let h = Harness::with_acme(jira_with_issue()).await;

    let listed = h
        .call("jira_projects", json!({"operation": "list"}))
        .await
        .unwrap();
    assert_eq!(listed["projects"][0]["key"], "PROJ");

    let types = h
        .call(
            "jira_projects",
            json!({"operation": "get_issue_types", "project_key": "PROJ"}),
        )
        .await
        .unwrap();
    assert_eq!(types["issue_types"][1]["subtask"], true);
}

#[tokio::test]
async fn test_skeleton_is_incomplete_until_edited() {
    let h = Harness::new(jira_with_issue()).await;

    let skeleton = h
        .call(
            "jira_workspace",
            json!({"operation": "create_workspace_skeleton", "workspace_name": "draft"}),
        )
        .await
        .unwrap();
    assert!(skeleton["path"].as_str().unwrap().ends_with("draft.json"));

    h.call(
        "jira_workspace",
        json!({"operation": "switch_workspace", "workspace_name": "draft"}),
    )
    .await
    .unwrap();

    assert_kind(
        h.call("jira_issues", json!({"operation": "read", "issue_key": "PROJ-1"}))
            .await,
        ErrorKind::IncompleteCredentials,
    );
    assert_kind(
        h.call("jira_workspace", json!({"operation": "validate_workspace"}))
            .await,
        ErrorKind::IncompleteCredentials,
    );
    assert_eq!(h.connector.connect_count(), 0);
}

#[tokio::test]
async fn test_add_workspace_reports_validation() {
    let h = Harness::new(MockJira::new()).await;
    h.jira().fail_with(MockFailure::Unauthorized);

    let added = h
        .call(
            "jira_workspace",
            json!({
                "operation": "add_workspace",
                "workspace_name": "acme",
                "site_url": "acme.atlassian.net",
                "email": "me@acme.io",
                "api_token": "token-abcdef-1234"
            }),
        )
        .await
        .unwrap();

    assert_eq!(added["activated"], true);
    assert_eq!(added["validation"]["ok"], false);
    assert_eq!(added["validation"]["error"], "AuthenticationFailed");
    assert_eq!(added["workspace"]["api_token"], "****1234");

    assert_kind(
        h.call("jira_workspace", json!({"operation": "validate_workspace"}))
            .await,
        ErrorKind::AuthenticationFailed,
    );
}

#[tokio::test]
async fn test_cloud_workspace_requires_email() {
    let h = Harness::new(MockJira::new()).await;
    let failure = assert_kind(
        h.call(
            "jira_workspace",
            json!({
                "operation": "add_workspace",
                "workspace_name": "acme",
                "site_url": "acme.atlassian.net",
                "api_token": "token-abcdef-1234"
            }),
        )
        .await,
        ErrorKind::MissingParameter,
    );
    assert!(failure.message.contains("email"));
}

#[tokio::test]
async fn test_duplicate_workspace() {
    let h = Harness::with_acme(MockJira::new()).await;
    assert_kind(
        h.call(
            "jira_workspace",
            json!({
                "operation": "add_workspace",
                "workspace_name": "acme",
                "site_url": "other.atlassian.net",
                "email": "x@other.io",
                "api_token": "token-zzzzzz-9999"
            }),
        )
        .await,
        ErrorKind::DuplicateName,
    );
}

#[tokio::test]
async fn test_workspace_listing_and_removal() {
    let h = Harness::with_acme(MockJira::new()).await;
    h.add_workspace("beta").await;

    let listed = h
        .call("jira_workspace", json!({"operation": "list_workspaces"}))
        .await
        .unwrap();
    assert_eq!(listed["count"], 2);
    assert_eq!(listed["active"], "acme");
    assert!(!listed.to_string().contains("token-abcdef-1234"));

    let removed = h
        .call(
            "jira_workspace",
            json!({"operation": "remove_workspace", "workspace_name": "acme"}),
        )
        .await
        .unwrap();
    assert_eq!(removed["was_active"], true);

    assert_kind(
        h.call("jira_workspace", json!({"operation": "get_active_workspace"}))
            .await,
        ErrorKind::NoActiveWorkspace,
    );
}

#[tokio::test]
async fn test_current_user_and_user_search() {
    let h = Harness::with_acme(MockJira::new()).await;

    let me = h
        .call("jira_workspace", json!({"operation": "get_current_user"}))
        .await
        .unwrap();
    assert_eq!(me["workspace"], "acme");
    assert_eq!(me["user"]["account_id"], "mock-account");

    let found = h
        .call(
            "jira_workspace",
            json!({"operation": "search_users", "query": "mock"}),
        )
        .await
        .unwrap();
    assert_eq!(found["count"], 1);
}

#[tokio::test]
async fn test_hello() {
    let h = Harness::new(MockJira::new()).await;
    let hello = h
        .call("jira_workspace", json!({"operation": "hello"}))
        .await
        .unwrap();
    assert_eq!(hello["status"], "running");
    assert_eq!(hello["workspaces"], 0);
    assert!(hello["connection"].is_null());
    assert!(hello["hint"].as_str().unwrap().contains("add_workspace"));

    h.add_workspace("acme").await;
    let hello = h
        .call("jira_workspace", json!({"operation": "hello"}))
        .await
        .unwrap();
    assert_eq!(hello["active_workspace"]["name"], "acme");
    assert_eq!(hello["connection"]["ok"], true);
    assert_eq!(hello["connection"]["server_title"], "Mock Jira");
}

#[tokio::test]
async fn test_hello_survives_unreachable_instance() {
    let h = Harness::with_acme(MockJira::new()).await;
    h.jira().fail_with(MockFailure::Unreachable);

    let hello = h
        .call("jira_workspace", json!({"operation": "hello"}))
        .await
        .unwrap();
    assert_eq!(hello["connection"]["ok"], false);
    assert!(hello["connection"]["error"].is_string());
}

#[tokio::test]
async fn test_numeric_token_is_not_echoed() {
    let h = Harness::new(MockJira::new()).await;
    let failure = assert_kind(
        h.call(
            "jira_workspace",
            json!({
                "operation": "add_workspace",
                "workspace_name": "acme",
                "site_url": "acme.atlassian.net",
                "email": "me@acme.io",
                "api_token": 98_765_432_109_876_u64
            }),
        )
        .await,
        ErrorKind::InvalidParameter,
    );
    assert!(failure.message.contains("api_token"), "{}", failure.message);
    assert!(!failure.message.contains("98765432109876"), "{}", failure.message);
}

#[tokio::test]
async fn test_hello_connects_after_skeleton_is_edited() {
    let h = Harness::new(MockJira::new()).await;
    let skeleton = h
        .call(
            "jira_workspace",
            json!({"operation": "create_workspace_skeleton", "workspace_name": "draft"}),
        )
        .await
        .unwrap();
    h.call(
        "jira_workspace",
        json!({"operation": "switch_workspace", "workspace_name": "draft"}),
    )
    .await
    .unwrap();

    let hello = h
        .call("jira_workspace", json!({"operation": "hello"}))
        .await
        .unwrap();
    assert!(hello["connection"].is_null());

    let path = skeleton["path"].as_str().unwrap();
    let mut file: Value = serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
    file["site_url"] = "https://draft.atlassian.net".into();
    file["email"] = "me@draft.io".into();
    file["api_token"] = "real-token-12345".into();
    std::fs::write(path, serde_json::to_string_pretty(&file).unwrap()).unwrap();

    let listed = h
        .call("jira_workspace", json!({"operation": "list_workspaces"}))
        .await
        .unwrap();
    assert_eq!(listed["workspaces"][0]["complete"], true);

    let hello = h
        .call("jira_workspace", json!({"operation": "hello"}))
        .await
        .unwrap();
    assert_eq!(hello["active_workspace"]["complete"], true);
    assert_eq!(hello["connection"]["ok"], true);
}
