//! Chat Completions wire format.
//!
//! Request and response bodies for `POST /chat/completions`, plus the
//! conversions from the crate's own [`Message`] and [`ToolSpec`] types.

use serde::{Deserialize, Serialize};

use crate::tools::ToolSpec;

use super::error::LlmError;
use super::types::{AssistantTurn, Message, ModelReply, ToolCall};

/// Request body.
#[derive(Debug, Serialize)]
pub struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<WireMessage<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<WireTool<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallel_tool_calls: Option<bool>,
}

impl<'a> ChatRequest<'a> {
    /// Build a request; with no tools the model can only answer in text.
    pub fn new(model: &'a str, messages: &'a [Message], tools: &'a [ToolSpec]) -> Self {
        let offers_tools = !tools.is_empty();
        Self {
            model,
            messages: messages.iter().map(WireMessage::from).collect(),
            tools: tools.iter().map(WireTool::from).collect(),
            tool_choice: offers_tools.then_some("auto"),
            parallel_tool_calls: offers_tools.then_some(false),
        }
    }
}

/// One message on the wire.
#[derive(Debug, Serialize)]
pub struct WireMessage<'a> {
    pub role: &'static str,
    /// `null` for assistant tool-call turns.
    pub content: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<[WireToolCall<'a>; 1]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<&'a str>,
}

impl<'a> From<&'a Message> for WireMessage<'a> {
    fn from(message: &'a Message) -> Self {
        let role = message.role();
        match message {
            Message::System { content } | Message::User { content } => Self {
                role,
                content: Some(content),
                tool_calls: None,
                tool_call_id: None,
            },
            Message::Assistant(AssistantTurn::Text(text)) => Self {
                role,
                content: Some(text),
                tool_calls: None,
                tool_call_id: None,
            },
            Message::Assistant(AssistantTurn::ToolCall(call)) => Self {
                role,
                content: None,
                tool_calls: Some([WireToolCall {
                    id: &call.id,
                    kind: "function",
                    function: WireFunctionCall {
                        name: &call.name,
                        arguments: &call.arguments,
                    },
                }]),
                tool_call_id: None,
            },
            Message::Tool(result) => Self {
                role,
                content: Some(&result.content),
                tool_calls: None,
                tool_call_id: Some(&result.call_id),
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct WireToolCall<'a> {
    pub id: &'a str,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub function: WireFunctionCall<'a>,
}

#[derive(Debug, Serialize)]
pub struct WireFunctionCall<'a> {
    pub name: &'a str,
    pub arguments: &'a str,
}

/// Tool definition on the wire.
#[derive(Debug, Serialize)]
pub struct WireTool<'a> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub function: WireFunction<'a>,
}

#[derive(Debug, Serialize)]
pub struct WireFunction<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub parameters: serde_json::Value,
}

impl<'a> From<&'a ToolSpec> for WireTool<'a> {
    fn from(spec: &'a ToolSpec) -> Self {
        Self {
            kind: "function",
            function: WireFunction {
                name: &spec.name,
                description: &spec.description,
                parameters: spec.json_schema(),
            },
        }
    }
}

/// Response body.
#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub id: Option<String>,
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ResponseMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResponseMessage {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub tool_calls: Vec<ResponseToolCall>,
}

#[derive(Debug, Deserialize)]
pub struct ResponseToolCall {
    pub id: String,
    pub function: ResponseFunctionCall,
}

#[derive(Debug, Deserialize)]
pub struct ResponseFunctionCall {
    pub name: String,
    #[serde(default)]
    pub arguments: String,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl ResponseMessage {
    /// Convert to a reply, keeping only the first tool call.
    ///
    /// Returns the reply and the number of extra tool calls that were dropped.
    ///
    /// # Errors
    ///
    /// Returns `LlmError::Protocol` if the message has neither content nor a
    /// tool call.
    pub fn into_reply(self) -> Result<(ModelReply, usize), LlmError> {
        let mut calls = self.tool_calls.into_iter();
        match calls.next() {
            Some(first) => {
                let dropped = calls.count();
                let call = ToolCall {
                    id: first.id,
                    name: first.function.name,
                    arguments: if first.function.arguments.trim().is_empty() {
                        "{}".to_string()
                    } else {
                        first.function.arguments
                    },
                };
                Ok((ModelReply::ToolCall(call), dropped))
            }
            None => self
                .content
                .map(|text| (ModelReply::Text(text), 0))
                .ok_or_else(|| {
                    LlmError::Protocol("assistant message had no content and no tool call".into())
                }),
        }
    }
}
