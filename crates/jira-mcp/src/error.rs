//! Error types for the Jira MCP server.
//!
//! Every failure a tool call can produce is a [`ToolError`]. At the router
//! boundary it is flattened into a [`ToolFailure`]: a stable `error_kind`
//! string plus a message that never contains credentials.

use jira_api::ApiError;
use jira_workspace::{StoreError, ValidationErrorKind};
use schemars::JsonSchema;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Errors that can occur while handling a tool call.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The tool name is not one of the registered tools.
    #[error("Unknown tool '{name}'. Available tools: {available}")]
    UnknownTool {
        /// The requested tool.
        name: String,
        /// Comma-separated tool names.
        available: String,
    },

    /// The operation is not valid for the tool.
    #[error("Unknown operation '{operation}' for {tool}. Valid operations: {valid}")]
    UnknownOperation {
        /// The tool that was called.
        tool: &'static str,
        /// The requested operation.
        operation: String,
        /// Comma-separated valid operations.
        valid: String,
    },

    /// A required parameter is absent, `null`, or blank.
    #[error("Missing required parameter '{0}'")]
    MissingParameter(String),

    /// A parameter is not accepted by the operation.
    #[error("Unexpected parameter '{parameter}' for {operation}. Accepted: {accepted}")]
    UnexpectedParameter {
        /// The operation being called.
        operation: &'static str,
        /// The offending parameter.
        parameter: String,
        /// Comma-separated accepted parameters.
        accepted: String,
    },

    /// A parameter has the wrong type or an unusable value.
    #[error("Invalid parameter '{parameter}': {reason}")]
    InvalidParameter {
        /// The offending parameter.
        parameter: String,
        /// What is wrong with it.
        reason: String,
    },

    /// An error from the workspace store.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// An error from the Jira API.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// A credential check failed.
    #[error("Workspace '{workspace}' failed validation: {message}")]
    Validation {
        /// The workspace that was checked.
        workspace: String,
        /// Failure classification.
        kind: ValidationErrorKind,
        /// Detail from the validator.
        message: String,
    },

    /// An I/O error outside the store (e.g. reading an attachment).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A response could not be serialized.
    #[error("Failed to serialize response: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl ToolError {
    pub(crate) fn invalid(parameter: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            parameter: parameter.into(),
            reason: reason.into(),
        }
    }

    /// Stable classification of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownTool { .. } => ErrorKind::UnknownTool,
            Self::UnknownOperation { .. } => ErrorKind::UnknownOperation,
            Self::MissingParameter(_) => ErrorKind::MissingParameter,
            Self::UnexpectedParameter { .. } => ErrorKind::UnexpectedParameter,
            Self::InvalidParameter { .. } => ErrorKind::InvalidParameter,
            Self::Store(e) => match e {
                StoreError::DuplicateName(_) => ErrorKind::DuplicateName,
                StoreError::NotFound(_) => ErrorKind::NotFound,
                StoreError::NoActiveWorkspace => ErrorKind::NoActiveWorkspace,
                StoreError::IncompleteCredentials(_) => ErrorKind::IncompleteCredentials,
                StoreError::InvalidProfile { .. } => ErrorKind::InvalidParameter,
                StoreError::Io(_) | StoreError::Json(_) => ErrorKind::StorageError,
            },
            Self::Api(e) => match e {
                ApiError::Unauthorized(_) => ErrorKind::AuthenticationFailed,
                ApiError::Forbidden(_) => ErrorKind::Forbidden,
                ApiError::Unreachable { .. } => ErrorKind::Unreachable,
                ApiError::NotFound(_) | ApiError::Remote { .. } | ApiError::Decode(_) => {
                    ErrorKind::RemoteApiError
                }
                ApiError::InvalidConfig(_) => ErrorKind::Unknown,
            },
            Self::Validation { kind, .. } => match kind {
                ValidationErrorKind::IncompleteCredentials => ErrorKind::IncompleteCredentials,
                ValidationErrorKind::AuthenticationFailed => ErrorKind::AuthenticationFailed,
                ValidationErrorKind::Unreachable => ErrorKind::Unreachable,
                ValidationErrorKind::Forbidden => ErrorKind::Forbidden,
                ValidationErrorKind::Unknown => ErrorKind::Unknown,
            },
            Self::Io(_) | Self::Serialize(_) => ErrorKind::Unknown,
        }
    }

    /// Flatten into the wire representation.
    #[must_use]
    pub fn to_failure(&self) -> ToolFailure {
        ToolFailure {
            error_kind: self.kind(),
            message: self.to_string(),
        }
    }
}

/// Stable error classification exposed to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, JsonSchema)]
pub enum ErrorKind {
    /// Workspace name already taken.
    DuplicateName,
    /// Named workspace does not exist.
    NotFound,
    /// No workspace is active and none was named.
    NoActiveWorkspace,
    /// The workspace is a skeleton.
    IncompleteCredentials,
    /// The instance rejected the credentials.
    AuthenticationFailed,
    /// The instance could not be reached.
    Unreachable,
    /// The credentials lack permission.
    Forbidden,
    /// Tool name not registered.
    UnknownTool,
    /// Operation not valid for the tool.
    UnknownOperation,
    /// Required parameter absent.
    MissingParameter,
    /// Parameter not accepted by the operation.
    UnexpectedParameter,
    /// Parameter has the wrong type or value.
    InvalidParameter,
    /// Jira answered with an error.
    RemoteApiError,
    /// The credential store could not be read or written.
    StorageError,
    /// Anything else.
    Unknown,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Structured failure returned to the client.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ToolFailure {
    /// Stable error classification.
    pub error_kind: ErrorKind,
    /// Human-readable message.
    pub message: String,
}

/// Result type for tool handlers.
pub type Result<T> = std::result::Result<T, ToolError>;
