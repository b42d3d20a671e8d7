//! Language model integration.
//!
//! [`LanguageModel`] is the seam the orchestrator drives. The production
//! implementation is [`OpenAiChatClient`]; tests script replies through their
//! own implementations.

mod client;
pub mod conversation;
mod error;
pub mod types;
mod wire;

use async_trait::async_trait;

use crate::tools::ToolSpec;

pub use client::OpenAiChatClient;
pub use conversation::{Conversation, ConversationError};
pub use error::{ApiError, ApiErrorResponse, LlmError};
pub use types::{AssistantTurn, Message, ModelReply, ToolCall, ToolResult};

/// A chat model that can answer in text or request one tool call.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Complete the conversation.
    ///
    /// An empty `tools` slice means the model is offered no tools and must
    /// answer in text.
    ///
    /// # Errors
    ///
    /// Returns an error if the service is unreachable or rejects the request.
    async fn complete(
        &self,
        messages: &[Message],
        tools: &[ToolSpec],
    ) -> Result<ModelReply, LlmError>;
}
