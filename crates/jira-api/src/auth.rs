//! Credentials and authentication schemes.

use secrecy::{ExposeSecret, SecretString};
use std::fmt;

/// How a request authenticates against the instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScheme {
    /// HTTP basic auth with an account email and API token (Jira Cloud).
    Basic,
    /// Bearer auth with a personal access token (Jira Server / Data Center).
    Bearer,
}

/// Everything needed to authenticate against one Jira instance.
///
/// The token is held as a [`SecretString`]; `Debug` output never shows it.
#[derive(Clone)]
pub struct Credentials {
    /// Base URL of the instance, without a trailing slash.
    pub site_url: String,
    /// Account email (basic auth) or username (bearer auth, informational).
    pub identity: Option<String>,
    /// API token or personal access token.
    pub token: SecretString,
    /// Authentication scheme.
    pub scheme: AuthScheme,
}

impl Credentials {
    /// Create credentials for a Jira Cloud account.
    pub fn basic(
        site_url: impl Into<String>,
        email: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            site_url: site_url.into(),
            identity: Some(email.into()),
            token: SecretString::from(token.into()),
            scheme: AuthScheme::Basic,
        }
    }

    /// Create credentials for a personal access token.
    pub fn bearer(site_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            site_url: site_url.into(),
            identity: None,
            token: SecretString::from(token.into()),
            scheme: AuthScheme::Bearer,
        }
    }

    /// Attach credentials to a request.
    pub(crate) fn apply(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.scheme {
            AuthScheme::Basic => request.basic_auth(
                self.identity.as_deref().unwrap_or_default(),
                Some(self.token.expose_secret()),
            ),
            AuthScheme::Bearer => request.bearer_auth(self.token.expose_secret()),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("site_url", &self.site_url)
            .field("identity", &self.identity)
            .field("token", &"[REDACTED]")
            .field("scheme", &self.scheme)
            .finish()
    }
}
