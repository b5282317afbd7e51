//! MCP server for Jira.
//!
//! This crate exposes Jira Cloud and Jira Server/Data Center to AI assistants
//! over the Model Context Protocol. It can hold credentials for several Jira
//! instances ("workspaces") at once and switch between them.
//!
//! # Architecture
//!
//! - `jira-api` talks HTTP to one Jira instance
//! - `jira-workspace` stores credential profiles and tracks the active one
//! - this crate validates tool arguments into typed operations ([`operations`]),
//!   resolves the workspace once per call ([`router`]) and runs the matching
//!   handler ([`handlers`])
//!
//! # Tools
//!
//! Each tool takes an `operation` plus flat parameters. Remote operations
//! also accept `workspace` to target a workspace other than the active one.
//!
//! ## `jira_workspace`
//! - `add_workspace`, `list_workspaces`, `get_active_workspace`
//! - `switch_workspace`, `validate_workspace`, `remove_workspace`
//! - `create_workspace_skeleton`
//! - `get_current_user`, `search_users`, `hello`
//!
//! ## `jira_projects`
//! - `list`, `get`, `get_issue_types`
//!
//! ## `jira_issues`
//! - `search`, `read`, `create`, `update`, `assign`
//! - `transition`, `get_transitions`
//! - `list_comments`, `add_comment`, `update_comment`, `delete_comment`
//! - `list_attachments`, `add_attachment`, `delete_attachment`
//! - `create_link`, `delete_link`, `list_links`
//! - `create_subtask`, `list_subtasks`
//!
//! # Errors
//!
//! A failed call returns an error result whose body is
//! `{"error_kind": "...", "message": "..."}`. See [`error::ErrorKind`].

pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod operations;
pub mod router;
pub mod server;

pub use config::ServerConfig;
pub use error::{ErrorKind, Result, ToolError, ToolFailure};
pub use router::Router;
pub use server::JiraMcpServer;
