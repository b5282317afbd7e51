//! Typed operations for each tool.
//!
//! Every tool takes an `operation` name plus flat parameters. Each tool's
//! operations form a closed enum ([`WorkspaceOperation`], [`ProjectOperation`],
//! [`IssueOperation`]) whose variants carry a typed parameter struct. Each
//! struct declares which fields it requires and which it accepts, and
//! [`parse_params`] enforces that allowlist before anything touches the
//! network.

pub mod issue;
pub mod project;
pub mod workspace;

pub use issue::IssueOperation;
pub use project::ProjectOperation;
pub use workspace::WorkspaceOperation;

use crate::error::{Result, ToolError};
use serde::Deserialize;
use serde::de::{self, DeserializeOwned, Deserializer};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Parameter naming the workspace to use instead of the active one.
pub const WORKSPACE_PARAM: &str = "workspace";

/// Parameter naming the operation.
pub const OPERATION_PARAM: &str = "operation";

/// A parameter struct with an explicit field allowlist.
pub trait OperationParams: DeserializeOwned {
    /// Fields that must be present and non-blank.
    const REQUIRED: &'static [&'static str];
    /// Fields that may be present.
    const OPTIONAL: &'static [&'static str];
}

/// Implement [`OperationParams`] for a struct.
macro_rules! operation_params {
    ($ty:ty, required: [$($req:literal),* $(,)?], optional: [$($opt:literal),* $(,)?]) => {
        impl $crate::operations::OperationParams for $ty {
            const REQUIRED: &'static [&'static str] = &[$($req),*];
            const OPTIONAL: &'static [&'static str] = &[$($opt),*];
        }
    };
}
pub(crate) use operation_params;

/// The closed set of operations one tool accepts.
pub trait OperationGroup: Sized {
    /// Tool name.
    const TOOL: &'static str;
    /// Every valid operation name.
    const NAMES: &'static [&'static str];

    /// Whether the named operation talks to Jira and so needs credentials.
    fn is_remote(operation: &str) -> bool;

    /// Parse the parameters for `operation`.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::UnknownOperation`] for a name not in
    /// [`NAMES`](Self::NAMES), and parameter errors from [`parse_params`].
    fn parse(operation: &str, args: Map<String, Value>) -> Result<Self>;

    /// Operation name.
    fn name(&self) -> &'static str;

    /// The error for an operation name outside [`NAMES`](Self::NAMES).
    fn unknown(operation: &str) -> ToolError {
        ToolError::UnknownOperation {
            tool: Self::TOOL,
            operation: operation.to_string(),
            valid: Self::NAMES.join(", "),
        }
    }
}

/// An operation plus the workspace it should run against.
#[derive(Debug, Clone)]
pub struct Request<O> {
    /// The parsed operation.
    pub operation: O,
    /// Explicit workspace override.
    pub workspace: Option<String>,
    /// Whether credentials must be resolved before running it.
    pub remote: bool,
}

/// Split tool arguments into a typed [`Request`].
///
/// Runs every check that can fail without credentials: operation name,
/// allowlist, required fields and types.
///
/// # Errors
///
/// Returns the first validation failure.
pub fn parse_request<O: OperationGroup>(mut args: Map<String, Value>) -> Result<Request<O>> {
    let operation = take_string(&mut args, OPERATION_PARAM)?
        .ok_or_else(|| ToolError::MissingParameter(OPERATION_PARAM.to_string()))?;
    if !O::NAMES.contains(&operation.as_str()) {
        return Err(O::unknown(&operation));
    }

    let remote = O::is_remote(&operation);
    let workspace = if remote {
        take_string(&mut args, WORKSPACE_PARAM)?
    } else {
        None
    };

    Ok(Request {
        operation: O::parse(&operation, args)?,
        workspace,
        remote,
    })
}

/// Validate `args` against `P`'s allowlist and deserialize it.
///
/// `null` values and blank strings are treated as absent.
///
/// # Errors
///
/// - [`ToolError::UnexpectedParameter`] for a field outside the allowlist
/// - [`ToolError::MissingParameter`] for an absent required field
/// - [`ToolError::InvalidParameter`] for a type mismatch; the reason names
///   the expected type but never echoes the value, which may be a secret
pub fn parse_params<P: OperationParams>(
    operation: &'static str,
    mut args: Map<String, Value>,
) -> Result<P> {
    args.retain(|_, value| !is_blank(value));

    let mut keys: Vec<&String> = args.keys().collect();
    keys.sort();
    if let Some(unexpected) = keys
        .into_iter()
        .find(|k| !P::REQUIRED.contains(&k.as_str()) && !P::OPTIONAL.contains(&k.as_str()))
    {
        return Err(ToolError::UnexpectedParameter {
            operation,
            parameter: unexpected.clone(),
            accepted: accepted(P::REQUIRED, P::OPTIONAL),
        });
    }

    if let Some(missing) = P::REQUIRED.iter().find(|r| !args.contains_key(**r)) {
        return Err(ToolError::MissingParameter((*missing).to_string()));
    }

    let all = Value::Object(args);
    serde_json::from_value(all.clone()).map_err(|e| {
        let culprit = all
            .as_object()
            .and_then(find_culprit::<P>)
            .unwrap_or_else(|| operation.to_string());
        ToolError::invalid(culprit, reason(&e))
    })
}

/// The "expected ..." part of a deserialization error. serde puts the
/// offending value before it, so the value never reaches the caller.
fn reason(err: &serde_json::Error) -> String {
    let text = err.to_string();
    text.rfind("expected ").map_or_else(
        || "has an invalid type or value".to_string(),
        |at| text[at..].to_string(),
    )
}

/// Find the field that fails to deserialize, trying each optional field
/// alongside the required ones.
fn find_culprit<P: OperationParams>(map: &Map<String, Value>) -> Option<String> {
    let required: Map<String, Value> = map
        .iter()
        .filter(|(k, _)| P::REQUIRED.contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    if serde_json::from_value::<P>(Value::Object(required.clone())).is_err() {
        let parses_with = |key: &str, stand_in: Value| {
            let mut patched = required.clone();
            patched.insert(key.to_string(), stand_in);
            serde_json::from_value::<P>(Value::Object(patched)).is_ok()
        };
        // Several bad required fields: report the first non-string one.
        return P::REQUIRED
            .iter()
            .find(|r| parses_with(r, Value::from("0")) || parses_with(r, Value::from(0)))
            .or_else(|| {
                P::REQUIRED
                    .iter()
                    .find(|r| map.get(**r).is_some_and(|v| !v.is_string()))
            })
            .map(|r| (*r).to_string());
    }

    map.iter()
        .filter(|(k, _)| !P::REQUIRED.contains(&k.as_str()))
        .find(|(k, v)| {
            let mut single = required.clone();
            single.insert((*k).clone(), (*v).clone());
            serde_json::from_value::<P>(Value::Object(single)).is_err()
        })
        .map(|(k, _)| k.clone())
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn accepted(required: &[&str], optional: &[&str]) -> String {
    let all: Vec<&str> = required.iter().chain(optional).copied().collect();
    if all.is_empty() {
        "none".to_string()
    } else {
        all.join(", ")
    }
}

/// Remove a string field, treating `null` and blank as absent.
fn take_string(args: &mut Map<String, Value>, key: &str) -> Result<Option<String>> {
    match args.remove(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.trim().to_string())),
        Some(other) => Err(ToolError::invalid(
            key,
            format!("expected a string, got {}", type_name(&other)),
        )),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Parameters for operations that take none.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NoParams {}

operation_params!(NoParams, required: [], optional: []);

/// Deserialize an id given either as a string or as a number.
pub(crate) fn id_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<String, D::Error> {
    struct IdVisitor;

    impl de::Visitor<'_> for IdVisitor {
        type Value = String;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a string or integer id")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<String, E> {
            Ok(v.trim().to_string())
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<String, E> {
            Ok(v.to_string())
        }
    }

    deserializer.deserialize_any(IdVisitor)
}

/// The three registered tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolGroup {
    /// Workspace management and connectivity.
    Workspace,
    /// Project queries.
    Projects,
    /// Issue operations.
    Issues,
}

impl ToolGroup {
    /// Every tool, in registration order.
    pub const ALL: [Self; 3] = [Self::Workspace, Self::Projects, Self::Issues];

    /// Tool name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Workspace => WorkspaceOperation::TOOL,
            Self::Projects => ProjectOperation::TOOL,
            Self::Issues => IssueOperation::TOOL,
        }
    }

    /// Valid operation names for this tool.
    #[must_use]
    pub const fn operations(self) -> &'static [&'static str] {
        match self {
            Self::Workspace => WorkspaceOperation::NAMES,
            Self::Projects => ProjectOperation::NAMES,
            Self::Issues => IssueOperation::NAMES,
        }
    }
}

impl FromStr for ToolGroup {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|g| g.name() == s)
            .ok_or_else(|| ToolError::UnknownTool {
                name: s.to_string(),
                available: Self::ALL.map(Self::name).join(", "),
            })
    }
}
