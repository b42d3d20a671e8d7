//! Append-only conversation owned by a single orchestrator run.

use std::collections::HashSet;

use thiserror::Error;

use super::types::{AssistantTurn, Message, ToolCall, ToolResult};

/// Ways a message history can break tool-call pairing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversationError {
    /// A tool message does not directly follow the tool call it answers.
    #[error("tool result for call {call_id} at position {position} does not follow its tool call")]
    OrphanToolResult {
        /// Call ID carried by the tool message.
        call_id: String,
        /// Index of the offending message.
        position: usize,
    },

    /// A tool call is not immediately answered by a tool message.
    #[error("tool call {call_id} at position {position} has no result")]
    UnansweredToolCall {
        /// ID of the unanswered call.
        call_id: String,
        /// Index of the offending message.
        position: usize,
    },

    /// Two tool calls share an ID.
    #[error("duplicate tool call id {0}")]
    DuplicateCallId(String),
}

/// Ordered, append-only message history.
///
/// Built as `[system, prior…, user]`; every tool result is appended together
/// with the call it answers, so pairing holds by construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    /// Start a conversation.
    ///
    /// System messages in `prior` are dropped; the caller's `system_prompt`
    /// always comes first.
    ///
    /// # Errors
    ///
    /// Returns an error if `prior` breaks tool-call pairing.
    pub fn start(
        system_prompt: impl Into<String>,
        prior: Vec<Message>,
        user_text: impl Into<String>,
    ) -> Result<Self, ConversationError> {
        let mut messages = Vec::with_capacity(prior.len() + 2);
        messages.push(Message::system(system_prompt));
        messages.extend(
            prior
                .into_iter()
                .filter(|m| !matches!(m, Message::System { .. })),
        );
        messages.push(Message::user(user_text));
        validate(&messages)?;
        Ok(Self { messages })
    }

    /// Append a tool call and its result as one exchange.
    pub fn push_tool_exchange(&mut self, call: ToolCall, content: String) {
        let result = ToolResult {
            name: call.name.clone(),
            call_id: call.id.clone(),
            content,
        };
        self.messages.push(Message::assistant_tool_call(call));
        self.messages.push(Message::Tool(result));
    }

    /// Append the model's textual answer.
    pub fn push_assistant_text(&mut self, text: impl Into<String>) {
        self.messages.push(Message::assistant_text(text));
    }

    /// All messages in order.
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Number of messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Always `false`: a conversation holds at least the system and user messages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Whether a tool call with this ID is already present.
    #[must_use]
    pub fn has_call_id(&self, id: &str) -> bool {
        self.messages.iter().any(|m| {
            matches!(m, Message::Assistant(AssistantTurn::ToolCall(call)) if call.id == id)
        })
    }
}

/// Check tool-call pairing over a message sequence.
///
/// # Errors
///
/// Returns the first pairing violation found.
pub fn validate(messages: &[Message]) -> Result<(), ConversationError> {
    let mut seen = HashSet::new();

    for (position, message) in messages.iter().enumerate() {
        match message {
            Message::Assistant(AssistantTurn::ToolCall(call)) => {
                if !seen.insert(call.id.as_str()) {
                    return Err(ConversationError::DuplicateCallId(call.id.clone()));
                }
                let answered = matches!(
                    messages.get(position + 1),
                    Some(Message::Tool(result)) if result.call_id == call.id
                );
                if !answered {
                    return Err(ConversationError::UnansweredToolCall {
                        call_id: call.id.clone(),
                        position,
                    });
                }
            }
            Message::Tool(result) => {
                let follows_call = position
                    .checked_sub(1)
                    .and_then(|prev| messages.get(prev))
                    .is_some_and(|prev| {
                        matches!(
                            prev,
                            Message::Assistant(AssistantTurn::ToolCall(call)) if call.id == result.call_id
                        )
                    });
                if !follows_call {
                    return Err(ConversationError::OrphanToolResult {
                        call_id: result.call_id.clone(),
                        position,
                    });
                }
            }
            Message::System { .. } | Message::User { .. } | Message::Assistant(_) => {}
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(id: &str) -> ToolCall {
        ToolCall::new(id, "get_inventory", "{}")
    }

    fn result(id: &str) -> Message {
        Message::Tool(ToolResult {
            name: "get_inventory".to_string(),
            call_id: id.to_string(),
            content: "[]".to_string(),
        })
    }

    #[test]
    fn test_start_orders_system_prior_user() {
        let prior = vec![
            Message::system("stale prompt"),
            Message::user("hi"),
            Message::assistant_text("hello"),
        ];
        let conversation = Conversation::start("prompt", prior, "what's low?").expect("valid");
        let roles: Vec<_> = conversation.messages().iter().map(Message::role).collect();
        assert_eq!(roles, ["system", "user", "assistant", "user"]);
        assert_eq!(conversation.messages()[0], Message::system("prompt"));
    }

    #[test]
    fn test_tool_exchange_keeps_pairing() {
        let mut conversation = Conversation::start("prompt", Vec::new(), "q").expect("valid");
        conversation.push_tool_exchange(call("c1"), "[]".to_string());
        conversation.push_tool_exchange(call("c2"), "[]".to_string());
        conversation.push_assistant_text("done");
        assert!(validate(conversation.messages()).is_ok());
        assert!(conversation.has_call_id("c2"));
        assert_eq!(conversation.len(), 7);
    }

    #[test]
    fn test_rejects_orphan_result() {
        let prior = vec![Message::user("q"), result("c1")];
        let err = Conversation::start("p", prior, "q2").expect_err("orphan");
        assert!(matches!(err, ConversationError::OrphanToolResult { .. }));
    }

    #[test]
    fn test_rejects_unanswered_call() {
        let prior = vec![Message::assistant_tool_call(call("c1")), Message::user("q")];
        let err = Conversation::start("p", prior, "q2").expect_err("unanswered");
        assert!(matches!(err, ConversationError::UnansweredToolCall { .. }));
    }

    #[test]
    fn test_rejects_mismatched_call_id() {
        let prior = vec![Message::assistant_tool_call(call("c1")), result("c2")];
        assert!(Conversation::start("p", prior, "q").is_err());
    }

    #[test]
    fn test_rejects_duplicate_call_ids() {
        let prior = vec![
            Message::assistant_tool_call(call("c1")),
            result("c1"),
            Message::assistant_tool_call(call("c1")),
            result("c1"),
        ];
        assert_eq!(
            Conversation::start("p", prior, "q").expect_err("duplicate"),
            ConversationError::DuplicateCallId("c1".to_string())
        );
    }
}
