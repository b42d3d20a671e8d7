//! Closed registry mapping tool names to specs and handlers.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::{debug, instrument};

use crate::llm::ToolCall;

use super::error::{RegistryError, ToolError};
use super::schema::{ToolArguments, ToolSpec};

const MAX_TOOL_NAME_LEN: usize = 64;

/// A tool implementation.
///
/// Handlers receive arguments that already passed schema validation and
/// return a JSON value, which the registry serializes for the model.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Run the tool.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::InvalidArgument`] for domain-level argument
    /// problems and [`ToolError::Execution`] when the collaborator fails.
    async fn call(&self, arguments: ToolArguments<'_>) -> Result<Value, ToolError>;
}

struct RegisteredTool {
    spec: ToolSpec,
    handler: Arc<dyn ToolHandler>,
}

/// Name → {spec, handler}, validated at registration.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<RegisteredTool>,
    index: HashMap<String, usize>,
    // Cached copy handed to the model on every round.
    specs: Vec<ToolSpec>,
}

impl fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names().collect::<Vec<_>>())
            .finish()
    }
}

impl ToolRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is invalid or taken, or if the parameter
    /// list has empty or repeated names.
    pub fn register(
        &mut self,
        spec: ToolSpec,
        handler: Arc<dyn ToolHandler>,
    ) -> Result<(), RegistryError> {
        if !is_valid_tool_name(&spec.name) {
            return Err(RegistryError::InvalidName(spec.name));
        }
        if self.index.contains_key(&spec.name) {
            return Err(RegistryError::DuplicateTool(spec.name));
        }

        let mut seen = HashSet::new();
        for param in &spec.parameters {
            if param.name.is_empty() {
                return Err(RegistryError::EmptyParameterName(spec.name.clone()));
            }
            if !seen.insert(param.name.as_str()) {
                return Err(RegistryError::DuplicateParameter {
                    tool: spec.name.clone(),
                    param: param.name.clone(),
                });
            }
        }

        self.index.insert(spec.name.clone(), self.tools.len());
        self.specs.push(spec.clone());
        self.tools.push(RegisteredTool { spec, handler });
        Ok(())
    }

    /// Registered specs, in registration order.
    #[must_use]
    pub fn specs(&self) -> &[ToolSpec] {
        &self.specs
    }

    /// Registered tool names, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.specs.iter().map(|s| s.name.as_str())
    }

    /// Whether a tool with this name is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Number of registered tools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Validate arguments and run the named tool.
    ///
    /// Returns the handler's result serialized as JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::UnknownTool`] if nothing is registered under
    /// `name`, or the validation/handler error otherwise.
    #[instrument(skip(self, arguments))]
    pub async fn dispatch(
        &self,
        name: &str,
        arguments: &Map<String, Value>,
    ) -> Result<String, ToolError> {
        let tool = self
            .index
            .get(name)
            .and_then(|&i| self.tools.get(i))
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;

        tool.spec.validate(arguments)?;

        let value = tool
            .handler
            .call(ToolArguments::new(&tool.spec.name, arguments))
            .await?;

        let content = serde_json::to_string(&value).map_err(|e| ToolError::Execution {
            tool: name.to_string(),
            message: format!("Failed to serialize result: {e}"),
        })?;
        debug!(bytes = content.len(), "Tool completed");
        Ok(content)
    }

    /// Parse a model tool call's raw JSON arguments and dispatch it.
    ///
    /// Unknown names are reported before the arguments are looked at. Empty
    /// argument text is treated as `{}`.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::MalformedArguments`] if the text is not a JSON
    /// object, or any error from [`Self::dispatch`].
    pub async fn dispatch_call(&self, call: &ToolCall) -> Result<String, ToolError> {
        if !self.contains(&call.name) {
            return Err(ToolError::UnknownTool(call.name.clone()));
        }

        let arguments = parse_arguments(&call.name, &call.arguments)?;
        self.dispatch(&call.name, &arguments).await
    }
}

fn parse_arguments(tool: &str, raw: &str) -> Result<Map<String, Value>, ToolError> {
    if raw.trim().is_empty() {
        return Ok(Map::new());
    }

    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(ToolError::MalformedArguments {
            tool: tool.to_string(),
            reason: format!("expected a JSON object, got {}", json_kind(&other)),
        }),
        Err(e) => Err(ToolError::MalformedArguments {
            tool: tool.to_string(),
            reason: e.to_string(),
        }),
    }
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn is_valid_tool_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= MAX_TOOL_NAME_LEN
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;

    use super::*;
    use crate::tools::{ParamSpec, ParamType};

    struct Echo {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ToolHandler for Echo {
        async fn call(&self, arguments: ToolArguments<'_>) -> Result<Value, ToolError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(json!({ "echo": arguments.str("text")? }))
        }
    }

    fn echo_spec(name: &str) -> ToolSpec {
        ToolSpec::new(
            name,
            "Echo the text back",
            vec![ParamSpec::required("text", ParamType::String, "Text to echo")],
        )
    }

    fn registry() -> (ToolRegistry, Arc<Echo>) {
        let echo = Arc::new(Echo {
            calls: AtomicUsize::new(0),
        });
        let mut registry = ToolRegistry::new();
        registry.register(echo_spec("echo"), echo.clone()).unwrap();
        (registry, echo)
    }

    #[test]
    fn test_register_rejects_duplicates() {
        let (mut registry, echo) = registry();
        assert_eq!(
            registry.register(echo_spec("echo"), echo),
            Err(RegistryError::DuplicateTool("echo".to_string()))
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_register_rejects_invalid_names() {
        let (mut registry, echo) = registry();
        let too_long = "x".repeat(65);
        for name in ["", "has space", "dot.name", too_long.as_str()] {
            assert!(matches!(
                registry.register(echo_spec(name), echo.clone()),
                Err(RegistryError::InvalidName(_))
            ));
        }
        assert!(registry.register(echo_spec(&"x".repeat(64)), echo).is_ok());
    }

    #[test]
    fn test_register_rejects_bad_parameters() {
        let (mut registry, echo) = registry();
        let repeated = ToolSpec::new(
            "repeated",
            "",
            vec![
                ParamSpec::required("a", ParamType::String, ""),
                ParamSpec::optional("a", ParamType::Number, ""),
            ],
        );
        assert!(matches!(
            registry.register(repeated, echo.clone()),
            Err(RegistryError::DuplicateParameter { .. })
        ));

        let empty = ToolSpec::new("empty", "", vec![ParamSpec::required("", ParamType::String, "")]);
        assert_eq!(
            registry.register(empty, echo),
            Err(RegistryError::EmptyParameterName("empty".to_string()))
        );
    }

    #[test]
    fn test_specs_keep_registration_order() {
        let (mut registry, echo) = registry();
        registry.register(echo_spec("second"), echo.clone()).unwrap();
        registry.register(echo_spec("third"), echo).unwrap();
        assert_eq!(registry.names().collect::<Vec<_>>(), ["echo", "second", "third"]);
    }

    #[tokio::test]
    async fn test_dispatch_serializes_result() {
        let (registry, echo) = registry();
        let args = json!({"text": "hi"}).as_object().unwrap().clone();
        let content = registry.dispatch("echo", &args).await.unwrap();
        assert_eq!(content, r#"{"echo":"hi"}"#);
        assert_eq!(echo.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_dispatch_unknown_tool() {
        let (registry, _) = registry();
        let err = registry.dispatch("nope", &Map::new()).await.unwrap_err();
        assert_eq!(err, ToolError::UnknownTool("nope".to_string()));
    }

    #[tokio::test]
    async fn test_invalid_arguments_skip_handler() {
        let (registry, echo) = registry();
        let err = registry.dispatch("echo", &Map::new()).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArgument { ref field, .. } if field == "text"));
        assert_eq!(echo.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_dispatch_call_malformed_json() {
        let (registry, echo) = registry();
        let err = registry
            .dispatch_call(&ToolCall::new("c1", "echo", "{\"text\": "))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::MalformedArguments { .. }));

        let err = registry
            .dispatch_call(&ToolCall::new("c2", "echo", "[1, 2]"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ToolError::MalformedArguments { ref reason, .. } if reason.contains("an array")
        ));
        assert_eq!(echo.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_dispatch_call_unknown_before_parse() {
        let (registry, _) = registry();
        let err = registry
            .dispatch_call(&ToolCall::new("c1", "nope", "not json"))
            .await
            .unwrap_err();
        assert_eq!(err, ToolError::UnknownTool("nope".to_string()));
    }
}
