//! Workspace profiles and their on-disk representation.
//!
//! A [`WorkspaceProfile`] is one named set of credentials for one Jira
//! instance. Profiles are built from a [`NewProfile`] (which validates every
//! field) or written as skeleton templates that the user fills in by hand.

use crate::error::{Result, StoreError};
use chrono::{DateTime, Utc};
use jira_api::{AuthScheme, Credentials};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum workspace name length.
pub const MAX_NAME_LEN: usize = 50;

/// Minimum API token length.
pub const MIN_TOKEN_LEN: usize = 10;

/// Tokens shorter than this are masked entirely in listings.
const MASK_REVEAL_MIN_LEN: usize = 12;

pub(crate) const PLACEHOLDER_CLOUD_SITE: &str = "https://your-domain.atlassian.net";
pub(crate) const PLACEHOLDER_PAT_SITE: &str = "https://jira.your-company.com";
pub(crate) const PLACEHOLDER_EMAIL: &str = "you@example.com";
pub(crate) const PLACEHOLDER_TOKEN: &str = "<paste-api-token-here>";

/// How a workspace authenticates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthType {
    /// Jira Cloud: account email plus API token over basic auth.
    #[default]
    Cloud,
    /// Jira Server / Data Center personal access token over bearer auth.
    Pat,
}

impl AuthType {
    /// Stable lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cloud => "cloud",
            Self::Pat => "pat",
        }
    }

    /// The HTTP authentication scheme for this type.
    #[must_use]
    pub const fn scheme(self) -> AuthScheme {
        match self {
            Self::Cloud => AuthScheme::Basic,
            Self::Pat => AuthScheme::Bearer,
        }
    }
}

impl fmt::Display for AuthType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuthType {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "cloud" => Ok(Self::Cloud),
            "pat" => Ok(Self::Pat),
            other => Err(StoreError::invalid(
                "auth_type",
                format!("'{other}' is not one of: cloud, pat"),
            )),
        }
    }
}

/// A named credential profile.
#[derive(Debug, Clone)]
pub struct WorkspaceProfile {
    /// Unique name.
    pub name: String,
    /// Normalized base URL.
    pub site_url: String,
    /// Account email. Required for cloud, optional for PAT.
    pub email: Option<String>,
    /// API token or personal access token.
    pub api_token: SecretString,
    /// Authentication type.
    pub auth_type: AuthType,
    /// When the profile was created.
    pub created: DateTime<Utc>,
    /// When the credentials last passed validation.
    pub last_validated: Option<DateTime<Utc>>,
}

impl WorkspaceProfile {
    /// Whether every field holds a real value rather than a skeleton placeholder.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        let token = self.api_token.expose_secret();
        if token == PLACEHOLDER_TOKEN || token.chars().count() < MIN_TOKEN_LEN {
            return false;
        }
        if self.site_url == PLACEHOLDER_CLOUD_SITE || self.site_url == PLACEHOLDER_PAT_SITE {
            return false;
        }
        match self.auth_type {
            AuthType::Cloud => self
                .email
                .as_deref()
                .is_some_and(|e| e != PLACEHOLDER_EMAIL && e.contains('@')),
            AuthType::Pat => self.email.as_deref() != Some(PLACEHOLDER_EMAIL),
        }
    }

    /// The token with all but its last four characters hidden.
    #[must_use]
    pub fn masked_token(&self) -> String {
        mask_secret(self.api_token.expose_secret())
    }

    /// Credentials for the API client.
    #[must_use]
    pub fn to_credentials(&self) -> Credentials {
        Credentials {
            site_url: self.site_url.clone(),
            identity: self.email.clone(),
            token: self.api_token.clone(),
            scheme: self.auth_type.scheme(),
        }
    }

    /// A masked listing entry.
    #[must_use]
    pub fn summary(&self, active: bool) -> WorkspaceSummary {
        WorkspaceSummary {
            name: self.name.clone(),
            site_url: self.site_url.clone(),
            email: self.email.clone(),
            auth_type: self.auth_type,
            api_token: self.masked_token(),
            active,
            complete: self.is_complete(),
            created: self.created,
            last_validated: self.last_validated,
        }
    }

    pub(crate) fn from_file(name: &str, file: ProfileFile) -> Self {
        Self {
            name: name.to_string(),
            site_url: file.site_url.trim().trim_end_matches('/').to_string(),
            email: file.email.filter(|e| !e.trim().is_empty()),
            api_token: SecretString::from(file.api_token),
            auth_type: file.auth_type,
            created: file.created.unwrap_or_else(Utc::now),
            last_validated: file.last_validated,
        }
    }

    pub(crate) fn to_file(&self) -> ProfileFile {
        ProfileFile {
            instructions: Vec::new(),
            name: self.name.clone(),
            site_url: self.site_url.clone(),
            email: self.email.clone(),
            api_token: self.api_token.expose_secret().to_string(),
            auth_type: self.auth_type,
            created: Some(self.created),
            last_validated: self.last_validated,
        }
    }
}

/// Input for [`WorkspaceStore::add`](crate::WorkspaceStore::add).
#[derive(Debug, Clone)]
pub struct NewProfile {
    /// Unique name.
    pub name: String,
    /// Base URL, with or without scheme.
    pub site_url: String,
    /// Account email.
    pub email: Option<String>,
    /// API token or personal access token.
    pub api_token: SecretString,
    /// Authentication type.
    pub auth_type: AuthType,
}

impl NewProfile {
    /// Validate every field and build the profile.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidProfile`] naming the first field that fails.
    pub fn into_profile(self, created: DateTime<Utc>) -> Result<WorkspaceProfile> {
        validate_name(&self.name)?;
        let site_url = normalize_site_url(&self.site_url)?;
        let email = validate_email(self.email, self.auth_type)?;
        validate_token(self.api_token.expose_secret())?;

        Ok(WorkspaceProfile {
            name: self.name,
            site_url,
            email,
            api_token: self.api_token,
            auth_type: self.auth_type,
            created,
            last_validated: None,
        })
    }
}

/// A profile as shown to callers: token masked, status flags attached.
#[derive(Debug, Clone, Serialize)]
pub struct WorkspaceSummary {
    /// Workspace name.
    pub name: String,
    /// Base URL.
    pub site_url: String,
    /// Account email.
    pub email: Option<String>,
    /// Authentication type.
    pub auth_type: AuthType,
    /// Masked token.
    pub api_token: String,
    /// Whether this is the active workspace.
    pub active: bool,
    /// Whether the profile is usable (not a skeleton).
    pub complete: bool,
    /// Creation time.
    pub created: DateTime<Utc>,
    /// Last successful validation.
    pub last_validated: Option<DateTime<Utc>>,
}

/// Credentials resolved for one operation.
///
/// Built once per dispatched call and handed to the handler, so a handler
/// never reads the store itself.
#[derive(Debug, Clone)]
pub struct ResolvedWorkspace {
    /// Workspace name.
    pub name: String,
    /// Base URL.
    pub site_url: String,
    /// Authentication type.
    pub auth_type: AuthType,
    /// Client credentials.
    pub credentials: Credentials,
}

impl ResolvedWorkspace {
    pub(crate) fn from_profile(profile: &WorkspaceProfile) -> Self {
        Self {
            name: profile.name.clone(),
            site_url: profile.site_url.clone(),
            auth_type: profile.auth_type,
            credentials: profile.to_credentials(),
        }
    }

    /// Browser URL for an issue.
    #[must_use]
    pub fn browse_url(&self, key: &str) -> String {
        format!("{}/browse/{key}", self.site_url)
    }
}

/// Profile file layout.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct ProfileFile {
    #[serde(rename = "_instructions", default, skip_serializing_if = "Vec::is_empty")]
    pub instructions: Vec<String>,
    #[serde(default)]
    pub name: String,
    pub site_url: String,
    #[serde(default)]
    pub email: Option<String>,
    pub api_token: String,
    #[serde(default)]
    pub auth_type: AuthType,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_validated: Option<DateTime<Utc>>,
}

impl ProfileFile {
    /// Template for a profile the user completes by editing the file.
    pub(crate) fn skeleton(name: &str, auth_type: AuthType, created: DateTime<Utc>) -> Self {
        let (site_url, email, hint) = match auth_type {
            AuthType::Cloud => (
                PLACEHOLDER_CLOUD_SITE,
                Some(PLACEHOLDER_EMAIL.to_string()),
                "Create an API token at https://id.atlassian.com/manage-profile/security/api-tokens",
            ),
            AuthType::Pat => (
                PLACEHOLDER_PAT_SITE,
                None,
                "Create a personal access token from your Jira profile page",
            ),
        };
        Self {
            instructions: vec![
                "Replace the placeholder values below, then run validate_workspace.".to_string(),
                hint.to_string(),
                "This section may be left in place; it is ignored once the values are real."
                    .to_string(),
            ],
            name: name.to_string(),
            site_url: site_url.to_string(),
            email,
            api_token: PLACEHOLDER_TOKEN.to_string(),
            auth_type,
            created: Some(created),
            last_validated: None,
        }
    }
}

/// Check a workspace name: 1-50 ASCII alphanumerics or dashes, no leading or
/// trailing dash.
///
/// # Errors
///
/// Returns [`StoreError::InvalidProfile`] for the `name` field.
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || name.len() > MAX_NAME_LEN {
        return Err(StoreError::invalid(
            "name",
            format!("must be 1-{MAX_NAME_LEN} characters"),
        ));
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(StoreError::invalid(
            "name",
            format!("'{name}' may contain only letters, digits and dashes"),
        ));
    }
    if name.starts_with('-') || name.ends_with('-') {
        return Err(StoreError::invalid(
            "name",
            format!("'{name}' may not start or end with a dash"),
        ));
    }
    Ok(())
}

/// Normalize a site URL: add `https://` when no scheme is given and trim
/// trailing slashes.
///
/// # Errors
///
/// Returns [`StoreError::InvalidProfile`] if the URL is empty.
pub fn normalize_site_url(site_url: &str) -> Result<String> {
    let trimmed = site_url.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(StoreError::invalid("site_url", "cannot be empty"));
    }

    let normalized = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };

    if normalized.contains(char::is_whitespace) {
        return Err(StoreError::invalid("site_url", "may not contain whitespace"));
    }
    if !normalized.contains(".atlassian.net") {
        tracing::warn!(site_url = %normalized, "Site URL is not an atlassian.net host");
    }
    Ok(normalized)
}

fn validate_email(email: Option<String>, auth_type: AuthType) -> Result<Option<String>> {
    let email = email.map(|e| e.trim().to_string()).filter(|e| !e.is_empty());
    match (auth_type, email) {
        (AuthType::Cloud, None) => Err(StoreError::invalid(
            "email",
            "is required for cloud workspaces",
        )),
        (_, Some(e)) if !e.contains('@') => Err(StoreError::invalid(
            "email",
            format!("'{e}' is not an email address"),
        )),
        (_, email) => Ok(email),
    }
}

fn validate_token(token: &str) -> Result<()> {
    if token.trim().chars().count() < MIN_TOKEN_LEN {
        return Err(StoreError::invalid(
            "api_token",
            format!("appears to be invalid (shorter than {MIN_TOKEN_LEN} characters)"),
        ));
    }
    Ok(())
}

/// Mask a secret for display: `****` plus the last four characters, or `****`
/// alone when the secret is too short to reveal any of it.
#[must_use]
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() < MASK_REVEAL_MIN_LEN {
        return "****".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("****{tail}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn cloud(name: &str) -> NewProfile {
        NewProfile {
            name: name.to_string(),
            site_url: "acme.atlassian.net/".to_string(),
            email: Some("me@acme.io".to_string()),
            api_token: SecretString::from("token-1234567890"),
            auth_type: AuthType::Cloud,
        }
    }

    #[rstest]
    #[case("acme")]
    #[case("a")]
    #[case("acme-prod-2")]
    #[case("A1")]
    fn test_valid_names(#[case] name: &str) {
        assert!(validate_name(name).is_ok());
    }

    #[rstest]
    #[case("")]
    #[case("-acme")]
    #[case("acme-")]
    #[case("acme prod")]
    #[case("acme_prod")]
    #[case("../etc")]
    fn test_invalid_names(#[case] name: &str) {
        assert!(matches!(
            validate_name(name),
            Err(StoreError::InvalidProfile { field: "name", .. })
        ));
    }

    #[test]
    fn test_name_length_limit() {
        assert!(validate_name(&"a".repeat(MAX_NAME_LEN)).is_ok());
        assert!(validate_name(&"a".repeat(MAX_NAME_LEN + 1)).is_err());
    }

    #[rstest]
    #[case("acme.atlassian.net", "https://acme.atlassian.net")]
    #[case("https://acme.atlassian.net///", "https://acme.atlassian.net")]
    #[case("http://jira.local:8080/", "http://jira.local:8080")]
    fn test_normalize_site_url(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(normalize_site_url(input).unwrap(), expected);
    }

    #[test]
    fn test_normalize_site_url_rejects_empty() {
        assert!(normalize_site_url("  / ").is_err());
    }

    #[rstest]
    #[case("token-1234567890", "****7890")]
    #[case("abcdefghijkl", "****ijkl")]
    #[case("abcdefghijk", "****")]
    #[case("", "****")]
    fn test_mask_secret(#[case] secret: &str, #[case] expected: &str) {
        assert_eq!(mask_secret(secret), expected);
    }

    #[test]
    fn test_new_profile_normalizes_url() {
        let profile = cloud("acme").into_profile(Utc::now()).unwrap();
        assert_eq!(profile.site_url, "https://acme.atlassian.net");
        assert!(profile.is_complete());
        assert!(profile.last_validated.is_none());
    }

    #[test]
    fn test_cloud_requires_email() {
        let mut input = cloud("acme");
        input.email = None;
        assert!(matches!(
            input.into_profile(Utc::now()),
            Err(StoreError::InvalidProfile { field: "email", .. })
        ));
    }

    #[test]
    fn test_pat_email_optional() {
        let mut input = cloud("onprem");
        input.email = None;
        input.auth_type = AuthType::Pat;
        let profile = input.into_profile(Utc::now()).unwrap();
        assert!(profile.is_complete());
        assert_eq!(profile.to_credentials().scheme, AuthScheme::Bearer);
    }

    #[test]
    fn test_short_token_rejected() {
        let mut input = cloud("acme");
        input.api_token = SecretString::from("short");
        assert!(matches!(
            input.into_profile(Utc::now()),
            Err(StoreError::InvalidProfile {
                field: "api_token",
                ..
            })
        ));
    }

    #[rstest]
    #[case(AuthType::Cloud)]
    #[case(AuthType::Pat)]
    fn test_skeleton_is_incomplete(#[case] auth_type: AuthType) {
        let file = ProfileFile::skeleton("draft", auth_type, Utc::now());
        assert!(!file.instructions.is_empty());

        let profile = WorkspaceProfile::from_file("draft", file);
        assert!(!profile.is_complete());
    }

    #[test]
    fn test_skeleton_round_trips_instructions_key() {
        let file = ProfileFile::skeleton("draft", AuthType::Cloud, Utc::now());
        let json = serde_json::to_value(&file).unwrap();
        assert!(json.get("_instructions").is_some());
        assert_eq!(json["auth_type"], "cloud");
    }

    #[test]
    fn test_saved_profile_has_no_instructions_key() {
        let profile = cloud("acme").into_profile(Utc::now()).unwrap();
        let json = serde_json::to_value(profile.to_file()).unwrap();
        assert!(json.get("_instructions").is_none());
    }

    #[test]
    fn test_auth_type_from_str() {
        assert_eq!("Cloud".parse::<AuthType>().unwrap(), AuthType::Cloud);
        assert_eq!("pat".parse::<AuthType>().unwrap(), AuthType::Pat);
        assert!("oauth".parse::<AuthType>().is_err());
    }

    #[test]
    fn test_browse_url() {
        let profile = cloud("acme").into_profile(Utc::now()).unwrap();
        let resolved = ResolvedWorkspace::from_profile(&profile);
        assert_eq!(
            resolved.browse_url("PROJ-1"),
            "https://acme.atlassian.net/browse/PROJ-1"
        );
    }
}
