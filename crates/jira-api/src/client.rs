//! The [`JiraApi`] trait and its HTTP implementation.

use crate::auth::{AuthScheme, Credentials};
use crate::error::{ApiError, Result};
use crate::types::{
    Attachment, Comment, CreatedIssue, Issue, Project, SearchResults, ServerInfo, Transition,
    TransitionList, User,
};
use async_trait::async_trait;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::header::{ACCEPT, HeaderValue};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Path prefix for REST v2 resources.
const API_PREFIX: &str = "rest/api/2";

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Operations the adapter performs against a Jira instance.
///
/// Each method is one REST round trip. Implementations must be `Send + Sync`
/// so a client can be shared across the tasks of a single tool call.
#[async_trait]
pub trait JiraApi: Send + Sync {
    /// Instance title and version.
    async fn server_info(&self) -> Result<ServerInfo>;

    /// The authenticated user. This is the cheapest authenticated call.
    async fn myself(&self) -> Result<User>;

    /// Find users by name or email.
    async fn search_users(&self, query: &str, max_results: u32) -> Result<Vec<User>>;

    /// All projects visible to the caller.
    async fn projects(&self) -> Result<Vec<Project>>;

    /// One project, including its issue types.
    async fn project(&self, key: &str) -> Result<Project>;

    /// Run a JQL search. The query is passed through unmodified.
    async fn search_issues(
        &self,
        jql: &str,
        max_results: u32,
        fields: &[String],
    ) -> Result<SearchResults>;

    /// Fetch one issue with all navigable fields.
    async fn issue(&self, key: &str) -> Result<Issue>;

    /// Create an issue from a prepared `fields` object.
    async fn create_issue(&self, fields: Value) -> Result<CreatedIssue>;

    /// Update an issue with a prepared `fields` object.
    async fn update_issue(&self, key: &str, fields: Value) -> Result<()>;

    /// Set the assignee. `assignee` is the body Jira expects for the
    /// deployment (`{"accountId": ..}` or `{"name": ..}`).
    async fn assign_issue(&self, key: &str, assignee: Value) -> Result<()>;

    /// Transitions currently available on an issue.
    async fn transitions(&self, key: &str) -> Result<Vec<Transition>>;

    /// Perform a transition, optionally adding a comment.
    async fn transition_issue(
        &self,
        key: &str,
        transition_id: &str,
        comment: Option<&str>,
    ) -> Result<()>;

    /// All comments on an issue.
    async fn comments(&self, key: &str) -> Result<Vec<Comment>>;

    /// Add a comment.
    async fn add_comment(&self, key: &str, body: &str) -> Result<Comment>;

    /// Replace a comment's body.
    async fn update_comment(&self, key: &str, comment_id: &str, body: &str) -> Result<Comment>;

    /// Delete a comment.
    async fn delete_comment(&self, key: &str, comment_id: &str) -> Result<()>;

    /// Upload a file as an attachment.
    async fn add_attachment(
        &self,
        key: &str,
        filename: &str,
        content: Vec<u8>,
    ) -> Result<Vec<Attachment>>;

    /// Delete an attachment.
    async fn delete_attachment(&self, attachment_id: &str) -> Result<()>;

    /// Link two issues.
    async fn create_link(&self, link_type: &str, inward: &str, outward: &str) -> Result<()>;

    /// Delete an issue link.
    async fn delete_link(&self, link_id: &str) -> Result<()>;
}

/// Builds API clients from credentials.
///
/// The router resolves credentials once per call and asks the connector for a
/// client; tests substitute a connector that hands out mocks.
pub trait Connector: Send + Sync {
    /// Create a client bound to `credentials`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidConfig` if the client cannot be constructed.
    fn connect(&self, credentials: &Credentials) -> Result<Arc<dyn JiraApi>>;
}

/// [`Connector`] that builds [`JiraClient`]s.
#[derive(Debug, Clone)]
pub struct HttpConnector {
    timeout: Duration,
}

impl HttpConnector {
    /// Create a connector whose clients use the given request timeout.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for HttpConnector {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl Connector for HttpConnector {
    fn connect(&self, credentials: &Credentials) -> Result<Arc<dyn JiraApi>> {
        Ok(Arc::new(JiraClient::new(credentials.clone(), self.timeout)?))
    }
}

/// HTTP client for one Jira instance.
#[derive(Debug, Clone)]
pub struct JiraClient {
    http: Client,
    credentials: Credentials,
}

impl JiraClient {
    /// Create a client for the instance described by `credentials`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidConfig` if the site URL is not http(s) or the
    /// underlying HTTP client cannot be built.
    pub fn new(credentials: Credentials, timeout: Duration) -> Result<Self> {
        let site = credentials.site_url.trim_end_matches('/');
        if !(site.starts_with("https://") || site.starts_with("http://")) {
            return Err(ApiError::InvalidConfig(format!(
                "site URL must start with http:// or https://: {site}"
            )));
        }

        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("jira-mcp/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::InvalidConfig(e.to_string()))?;

        let credentials = Credentials {
            site_url: site.to_string(),
            ..credentials
        };

        Ok(Self { http, credentials })
    }

    /// Base URL of the instance.
    #[must_use]
    pub fn site_url(&self) -> &str {
        &self.credentials.site_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{API_PREFIX}/{path}", self.credentials.site_url)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let request = self
            .http
            .request(method, self.url(path))
            .header(ACCEPT, HeaderValue::from_static("application/json"));
        self.credentials.apply(request)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::from_transport(self.site_url(), &e))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        debug!(%status, "Jira request failed");
        Err(ApiError::from_response(status, &body))
    }

    async fn json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = self.send(request).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Decode(decode_reason(&e)))
    }

    async fn empty(&self, request: RequestBuilder) -> Result<()> {
        self.send(request).await.map(drop)
    }
}

fn decode_reason(err: &reqwest::Error) -> String {
    if err.is_decode() {
        "response body did not match the expected shape".to_string()
    } else {
        "response body could not be read".to_string()
    }
}

/// Characters escaped in a path segment: everything except RFC 3986 unreserved.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Percent-encode a value used as a single path segment.
fn segment(value: &str) -> String {
    utf8_percent_encode(value, SEGMENT).to_string()
}

#[async_trait]
impl JiraApi for JiraClient {
    async fn server_info(&self) -> Result<ServerInfo> {
        self.json(self.request(Method::GET, "serverInfo")).await
    }

    async fn myself(&self) -> Result<User> {
        self.json(self.request(Method::GET, "myself")).await
    }

    async fn search_users(&self, query: &str, max_results: u32) -> Result<Vec<User>> {
        // Server / Data Center still takes `username`; Cloud removed it.
        let param = match self.credentials.scheme {
            AuthScheme::Basic => "query",
            AuthScheme::Bearer => "username",
        };
        let request = self
            .request(Method::GET, "user/search")
            .query(&[(param, query.to_string()), ("maxResults", max_results.to_string())]);
        self.json(request).await
    }

    async fn projects(&self) -> Result<Vec<Project>> {
        self.json(self.request(Method::GET, "project")).await
    }

    async fn project(&self, key: &str) -> Result<Project> {
        let path = format!("project/{}", segment(key));
        self.json(self.request(Method::GET, &path)).await
    }

    async fn search_issues(
        &self,
        jql: &str,
        max_results: u32,
        fields: &[String],
    ) -> Result<SearchResults> {
        let body = json!({
            "jql": jql,
            "maxResults": max_results,
            "fields": fields,
        });
        self.json(self.request(Method::POST, "search").json(&body)).await
    }

    async fn issue(&self, key: &str) -> Result<Issue> {
        let path = format!("issue/{}", segment(key));
        self.json(self.request(Method::GET, &path)).await
    }

    async fn create_issue(&self, fields: Value) -> Result<CreatedIssue> {
        let body = json!({ "fields": fields });
        self.json(self.request(Method::POST, "issue").json(&body)).await
    }

    async fn update_issue(&self, key: &str, fields: Value) -> Result<()> {
        let path = format!("issue/{}", segment(key));
        let body = json!({ "fields": fields });
        self.empty(self.request(Method::PUT, &path).json(&body)).await
    }

    async fn assign_issue(&self, key: &str, assignee: Value) -> Result<()> {
        let path = format!("issue/{}/assignee", segment(key));
        self.empty(self.request(Method::PUT, &path).json(&assignee)).await
    }

    async fn transitions(&self, key: &str) -> Result<Vec<Transition>> {
        let path = format!("issue/{}/transitions", segment(key));
        let list: TransitionList = self.json(self.request(Method::GET, &path)).await?;
        Ok(list.transitions)
    }

    async fn transition_issue(
        &self,
        key: &str,
        transition_id: &str,
        comment: Option<&str>,
    ) -> Result<()> {
        let path = format!("issue/{}/transitions", segment(key));
        let mut body = json!({ "transition": { "id": transition_id } });
        if let Some(comment) = comment {
            body["update"] = json!({ "comment": [{ "add": { "body": comment } }] });
        }
        self.empty(self.request(Method::POST, &path).json(&body)).await
    }

    async fn comments(&self, key: &str) -> Result<Vec<Comment>> {
        let path = format!("issue/{}/comment", segment(key));
        let page: crate::types::CommentPage = self.json(self.request(Method::GET, &path)).await?;
        Ok(page.comments)
    }

    async fn add_comment(&self, key: &str, body: &str) -> Result<Comment> {
        let path = format!("issue/{}/comment", segment(key));
        self.json(self.request(Method::POST, &path).json(&json!({ "body": body }))).await
    }

    async fn update_comment(&self, key: &str, comment_id: &str, body: &str) -> Result<Comment> {
        let path = format!("issue/{}/comment/{}", segment(key), segment(comment_id));
        self.json(self.request(Method::PUT, &path).json(&json!({ "body": body }))).await
    }

    async fn delete_comment(&self, key: &str, comment_id: &str) -> Result<()> {
        let path = format!("issue/{}/comment/{}", segment(key), segment(comment_id));
        self.empty(self.request(Method::DELETE, &path)).await
    }

    async fn add_attachment(
        &self,
        key: &str,
        filename: &str,
        content: Vec<u8>,
    ) -> Result<Vec<Attachment>> {
        let path = format!("issue/{}/attachments", segment(key));
        let part = reqwest::multipart::Part::bytes(content).file_name(filename.to_string());
        let form = reqwest::multipart::Form::new().part("file", part);
        let request = self
            .request(Method::POST, &path)
            .header("X-Atlassian-Token", "no-check")
            .multipart(form);
        self.json(request).await
    }

    async fn delete_attachment(&self, attachment_id: &str) -> Result<()> {
        let path = format!("attachment/{}", segment(attachment_id));
        self.empty(self.request(Method::DELETE, &path)).await
    }

    async fn create_link(&self, link_type: &str, inward: &str, outward: &str) -> Result<()> {
        let body = json!({
            "type": { "name": link_type },
            "inwardIssue": { "key": inward },
            "outwardIssue": { "key": outward },
        });
        self.empty(self.request(Method::POST, "issueLink").json(&body)).await
    }

    async fn delete_link(&self, link_id: &str) -> Result<()> {
        let path = format!("issueLink/{}", segment(link_id));
        self.empty(self.request(Method::DELETE, &path)).await
    }
}
