//! Tool-calling orchestration loop.
//!
//! One [`Orchestrator::run`] owns one [`Conversation`] from start to finish:
//!
//! 1. Ask the model for a reply, offering every registered tool.
//! 2. Text ends the run. A tool call is dispatched through the registry and
//!    the call plus its result are appended before asking again.
//! 3. After `max_tool_rounds` tool rounds the model is asked once more with
//!    no tools, which forces a text answer.
//!
//! A run therefore issues at most `max_tool_rounds + 1` model calls (plus
//! configured retries of transient failures).

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use askama::Template;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::llm::{
    Conversation, ConversationError, LanguageModel, LlmError, Message, ModelReply, ToolCall,
};
use crate::tools::{ToolError, ToolRegistry, ToolSpec};

/// Default number of tool rounds before a text answer is forced.
pub const DEFAULT_MAX_TOOL_ROUNDS: usize = 10;
/// Default deadline for one model call.
pub const DEFAULT_MODEL_TIMEOUT: Duration = Duration::from_secs(60);

const RETRY_BASE_DELAY: Duration = Duration::from_millis(500);
const MAX_RATE_LIMIT_WAIT: Duration = Duration::from_secs(30);

/// System prompt template. Lists the registered tools.
#[derive(Template)]
#[template(path = "assistant/system_prompt.txt")]
struct SystemPromptTemplate<'a> {
    tools: &'a [ToolSpec],
}

/// Render the system prompt for a tool set.
#[must_use]
pub fn render_system_prompt(tools: &[ToolSpec]) -> String {
    SystemPromptTemplate { tools }.render().unwrap_or_else(|e| {
        warn!(error = %e, "Failed to render system prompt, using fallback");
        String::from("You are a merchant assistant for inventory and restock questions.")
    })
}

/// Loop tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrchestratorConfig {
    /// Tool rounds allowed before a text answer is forced.
    pub max_tool_rounds: usize,
    /// Deadline for each model call.
    pub model_timeout: Duration,
    /// Extra attempts for a model call that failed transiently.
    pub model_max_retries: u32,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
            model_timeout: DEFAULT_MODEL_TIMEOUT,
            model_max_retries: 0,
        }
    }
}

/// Cooperative cancellation flag shared between a caller and its runs.
#[derive(Debug, Clone, Default)]
pub struct AbortSignal(Arc<AtomicBool>);

impl AbortSignal {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Irreversible.
    pub fn abort(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_aborted(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), OrchestratorError> {
        if self.is_aborted() {
            Err(OrchestratorError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Errors that end a run.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// The model service failed, timed out or broke the protocol.
    #[error("model service error: {0}")]
    Upstream(#[from] LlmError),

    /// The model asked for a tool that is not registered.
    #[error("model requested unknown tool: {0}")]
    UnknownTool(String),

    /// A tool rejected its arguments or failed.
    #[error("tool execution failed: {0}")]
    ToolExecution(ToolError),

    /// The abort signal was set.
    #[error("run cancelled")]
    Cancelled,

    /// The prior conversation breaks tool-call pairing.
    #[error("invalid conversation history: {0}")]
    InvalidHistory(#[from] ConversationError),
}

impl From<ToolError> for OrchestratorError {
    fn from(e: ToolError) -> Self {
        match e {
            ToolError::UnknownTool(name) => Self::UnknownTool(name),
            other => Self::ToolExecution(other),
        }
    }
}

/// A finished run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    /// The model's final text.
    pub answer: String,
    /// Full transcript, ending with the answer.
    pub conversation: Conversation,
    /// Model calls issued, retries included.
    pub model_calls: usize,
}

/// Drives a language model through tool rounds to a text answer.
///
/// Holds only immutable collaborators; every run builds its own
/// conversation, so one orchestrator can serve concurrent requests.
#[derive(Clone)]
pub struct Orchestrator {
    model: Arc<dyn LanguageModel>,
    registry: Arc<ToolRegistry>,
    config: OrchestratorConfig,
    system_prompt: String,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("registry", &self.registry)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Orchestrator {
    /// Create an orchestrator. The system prompt is rendered once from the
    /// registry's tools.
    #[must_use]
    pub fn new(
        model: Arc<dyn LanguageModel>,
        registry: Arc<ToolRegistry>,
        config: OrchestratorConfig,
    ) -> Self {
        let system_prompt = render_system_prompt(registry.specs());
        Self {
            model,
            registry,
            config,
            system_prompt,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    #[must_use]
    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Answer `user_text`, continuing `prior` if given.
    ///
    /// # Errors
    ///
    /// - [`OrchestratorError::InvalidHistory`] before any model call if
    ///   `prior` is malformed
    /// - [`OrchestratorError::Upstream`] if the model fails after retries,
    ///   times out, or requests a tool when none are offered
    /// - [`OrchestratorError::UnknownTool`] / [`OrchestratorError::ToolExecution`]
    ///   if a tool call cannot be served; no further model calls are made
    /// - [`OrchestratorError::Cancelled`] once `abort` is observed
    #[instrument(skip_all, fields(prior = prior.len()))]
    pub async fn run(
        &self,
        user_text: &str,
        prior: Vec<Message>,
        abort: &AbortSignal,
    ) -> Result<RunOutput, OrchestratorError> {
        let mut conversation = Conversation::start(&self.system_prompt, prior, user_text)?;
        let mut model_calls = 0;

        for round in 0..self.config.max_tool_rounds {
            let reply = self
                .complete(&conversation, self.registry.specs(), abort, &mut model_calls)
                .await?;

            let call = match reply {
                ModelReply::Text(answer) => {
                    info!(round, model_calls, "Run complete");
                    return Ok(finish(conversation, answer, model_calls));
                }
                ModelReply::ToolCall(call) => with_unique_id(&conversation, call),
            };

            abort.check()?;
            info!(round, tool = %call.name, call_id = %call.id, "Dispatching tool call");
            let content = self.registry.dispatch_call(&call).await.map_err(|e| {
                warn!(tool = %call.name, error = %e, "Tool call failed");
                OrchestratorError::from(e)
            })?;
            conversation.push_tool_exchange(call, content);
        }

        warn!(
            rounds = self.config.max_tool_rounds,
            "Tool round limit reached, forcing a text answer"
        );
        match self
            .complete(&conversation, &[], abort, &mut model_calls)
            .await?
        {
            ModelReply::Text(answer) => Ok(finish(conversation, answer, model_calls)),
            ModelReply::ToolCall(call) => Err(OrchestratorError::Upstream(LlmError::Protocol(
                format!("model requested tool {} when no tools were offered", call.name),
            ))),
        }
    }

    /// One model call under the timeout, retrying transient failures.
    async fn complete(
        &self,
        conversation: &Conversation,
        tools: &[ToolSpec],
        abort: &AbortSignal,
        model_calls: &mut usize,
    ) -> Result<ModelReply, OrchestratorError> {
        let mut attempt = 0;
        loop {
            abort.check()?;
            *model_calls += 1;
            debug!(
                attempt,
                messages = conversation.len(),
                tools = tools.len(),
                "Calling model"
            );

            let result = tokio::time::timeout(
                self.config.model_timeout,
                self.model.complete(conversation.messages(), tools),
            )
            .await
            .unwrap_or_else(|_| Err(LlmError::Timeout(self.config.model_timeout)));

            match result {
                Ok(reply) => return Ok(reply),
                Err(e) if e.is_retryable() && attempt < self.config.model_max_retries => {
                    let delay = retry_delay(&e, attempt);
                    warn!(error = %e, attempt, ?delay, "Model call failed, retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

fn finish(mut conversation: Conversation, answer: String, model_calls: usize) -> RunOutput {
    conversation.push_assistant_text(answer.clone());
    RunOutput {
        answer,
        conversation,
        model_calls,
    }
}

/// Call IDs must be unique within a conversation; models sometimes reuse them.
fn with_unique_id(conversation: &Conversation, mut call: ToolCall) -> ToolCall {
    if !call.id.is_empty() && !conversation.has_call_id(&call.id) {
        return call;
    }
    let mut n = conversation.len();
    let mut id = format!("call_{n}");
    while conversation.has_call_id(&id) {
        n += 1;
        id = format!("call_{n}");
    }
    debug!(original = %call.id, replacement = %id, "Reassigned tool call id");
    call.id = id;
    call
}

fn retry_delay(error: &LlmError, attempt: u32) -> Duration {
    match error {
        LlmError::RateLimited(secs) => Duration::from_secs(*secs).min(MAX_RATE_LIMIT_WAIT),
        _ => RETRY_BASE_DELAY.saturating_mul(2u32.saturating_pow(attempt.min(6))),
    }
}
