//! Operations of the `jira_projects` tool.

use super::{NoParams, OperationGroup, operation_params, parse_params};
use crate::error::Result;
use serde::Deserialize;
use serde_json::{Map, Value};

/// Parameters naming one project.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectKeyParams {
    /// Project key, e.g. `PROJ`.
    pub project_key: String,
}

operation_params!(ProjectKeyParams, required: ["project_key"], optional: []);

/// An operation of the `jira_projects` tool.
#[derive(Debug, Clone)]
pub enum ProjectOperation {
    /// All projects visible to the user.
    List,
    /// One project's details.
    Get(ProjectKeyParams),
    /// Issue types available in a project.
    GetIssueTypes(ProjectKeyParams),
}

impl OperationGroup for ProjectOperation {
    const TOOL: &'static str = "jira_projects";
    const NAMES: &'static [&'static str] = &["list", "get", "get_issue_types"];

    fn is_remote(_operation: &str) -> bool {
        true
    }

    fn parse(operation: &str, args: Map<String, Value>) -> Result<Self> {
        Ok(match operation {
            "list" => {
                parse_params::<NoParams>("list", args)?;
                Self::List
            }
            "get" => Self::Get(parse_params("get", args)?),
            "get_issue_types" => Self::GetIssueTypes(parse_params("get_issue_types", args)?),
            other => return Err(Self::unknown(other)),
        })
    }

    fn name(&self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Get(_) => "get",
            Self::GetIssueTypes(_) => "get_issue_types",
        }
    }
}
