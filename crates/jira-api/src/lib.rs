//! Thin async client for the Jira REST API.
//!
//! This crate is a call-through layer: every method on [`JiraApi`] maps onto a
//! single REST v2 request. It performs no caching and no retries. Workflow,
//! pagination and permission semantics belong to the remote instance.
//!
//! # Authentication
//!
//! - **Cloud**: HTTP basic auth with the account email and an API token
//! - **Server / Data Center**: bearer auth with a personal access token (PAT)
//!
//! See [`Credentials`] and [`AuthScheme`].
//!
//! # Seams
//!
//! Callers depend on the [`JiraApi`] and [`Connector`] traits rather than on
//! [`JiraClient`] directly, so the workspace and routing layers can be tested
//! without a network.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod auth;
pub mod client;
pub mod error;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;
pub mod types;

pub use auth::{AuthScheme, Credentials};
pub use client::{Connector, HttpConnector, JiraApi, JiraClient};
pub use error::{ApiError, Result};
