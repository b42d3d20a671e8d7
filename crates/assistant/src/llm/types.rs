//! Conversation types exchanged with the language model.
//!
//! Messages are a closed set of roles; every transition in the orchestrator
//! matches on them exhaustively.

use serde::{Deserialize, Serialize};

/// A message in a conversation with the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// Instructions that frame the whole conversation.
    System {
        /// Prompt text.
        content: String,
    },
    /// Text typed by the merchant.
    User {
        /// Message text.
        content: String,
    },
    /// A model turn: either prose or a request to run a tool.
    Assistant(AssistantTurn),
    /// The result of a tool call, answering the assistant turn right before it.
    Tool(ToolResult),
}

impl Message {
    /// Create a system message.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self::System {
            content: content.into(),
        }
    }

    /// Create a user message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::User {
            content: content.into(),
        }
    }

    /// Create an assistant text message.
    #[must_use]
    pub fn assistant_text(content: impl Into<String>) -> Self {
        Self::Assistant(AssistantTurn::Text(content.into()))
    }

    /// Create an assistant tool-call message.
    #[must_use]
    pub const fn assistant_tool_call(call: ToolCall) -> Self {
        Self::Assistant(AssistantTurn::ToolCall(call))
    }

    /// Role name as used on the wire.
    #[must_use]
    pub const fn role(&self) -> &'static str {
        match self {
            Self::System { .. } => "system",
            Self::User { .. } => "user",
            Self::Assistant(_) => "assistant",
            Self::Tool(_) => "tool",
        }
    }
}

/// The content of an assistant turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssistantTurn {
    /// Final or intermediate prose.
    Text(String),
    /// A request to invoke one tool.
    ToolCall(ToolCall),
}

/// A model's request to invoke a named tool.
///
/// `arguments` holds the JSON text exactly as the model produced it; it is
/// parsed and validated at dispatch time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Call ID, unique within a conversation.
    pub id: String,
    /// Name of the tool to invoke.
    pub name: String,
    /// Raw JSON arguments.
    pub arguments: String,
}

impl ToolCall {
    /// Create a tool call.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }
}

/// The output of a tool, paired to its call by `call_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResult {
    /// Name of the tool that ran.
    pub name: String,
    /// ID of the call this result answers.
    pub call_id: String,
    /// Serialized result.
    pub content: String,
}

/// What the model returned for one completion request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelReply {
    /// A textual answer.
    Text(String),
    /// A request to run a tool before continuing.
    ToolCall(ToolCall),
}
