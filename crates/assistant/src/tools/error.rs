//! Error types for the tool registry.

use thiserror::Error;

/// Errors raised while dispatching a tool call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolError {
    /// No tool with this name is registered.
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    /// The argument text is not a JSON object.
    #[error("malformed arguments for {tool}: {reason}")]
    MalformedArguments {
        tool: String,
        reason: String,
    },

    /// An argument failed schema or domain validation.
    #[error("invalid argument {field} for {tool}: {reason}")]
    InvalidArgument {
        tool: String,
        field: String,
        reason: String,
    },

    /// The handler itself failed.
    #[error("{tool} failed: {message}")]
    Execution {
        tool: String,
        message: String,
    },
}

/// Errors raised while registering a tool.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("tool {0} is already registered")]
    DuplicateTool(String),

    #[error("invalid tool name {0:?}: use 1-64 characters from [A-Za-z0-9_-]")]
    InvalidName(String),

    #[error("tool {tool} declares parameter {param:?} more than once")]
    DuplicateParameter { tool: String, param: String },

    #[error("tool {0} declares a parameter with an empty name")]
    EmptyParameterName(String),
}
