//! Tool specifications and argument validation.

use serde_json::{Map, Value, json};

use super::error::ToolError;

/// JSON type of a tool parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    String,
    Number,
    Integer,
    Boolean,
}

impl ParamType {
    /// JSON Schema type name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
        }
    }

    fn accepts(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Number => value.is_number(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Boolean => value.is_boolean(),
        }
    }
}

/// One declared parameter of a tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: String,
    pub kind: ParamType,
    pub required: bool,
    pub description: String,
}

impl ParamSpec {
    /// A required parameter.
    #[must_use]
    pub fn required(name: impl Into<String>, kind: ParamType, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            required: true,
            description: description.into(),
        }
    }

    /// An optional parameter.
    #[must_use]
    pub fn optional(name: impl Into<String>, kind: ParamType, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
            description: description.into(),
        }
    }
}

/// Name, description and parameter schema of a tool, as offered to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub parameters: Vec<ParamSpec>,
}

impl ToolSpec {
    /// Create a tool spec.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: Vec<ParamSpec>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }

    /// JSON Schema object describing the parameters.
    #[must_use]
    pub fn json_schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .parameters
            .iter()
            .map(|p| {
                (
                    p.name.clone(),
                    json!({
                        "type": p.kind.as_str(),
                        "description": p.description,
                    }),
                )
            })
            .collect();
        let required: Vec<&str> = self
            .parameters
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// Check arguments against the declared parameters.
    ///
    /// Undeclared keys are ignored. A `null` value counts as absent.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::InvalidArgument`] naming the first offending field.
    pub fn validate(&self, arguments: &Map<String, Value>) -> Result<(), ToolError> {
        for param in &self.parameters {
            match arguments.get(&param.name).filter(|v| !v.is_null()) {
                None if param.required => {
                    return Err(self.invalid(&param.name, "is required"));
                }
                None => {}
                Some(value) if !param.kind.accepts(value) => {
                    return Err(self.invalid(
                        &param.name,
                        format!("must be a {}", param.kind.as_str()),
                    ));
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    fn invalid(&self, field: &str, reason: impl Into<String>) -> ToolError {
        ToolError::InvalidArgument {
            tool: self.name.clone(),
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

/// Validated arguments handed to a tool handler.
#[derive(Debug, Clone)]
pub struct ToolArguments<'a> {
    tool: &'a str,
    values: &'a Map<String, Value>,
}

impl<'a> ToolArguments<'a> {
    pub(crate) const fn new(tool: &'a str, values: &'a Map<String, Value>) -> Self {
        Self { tool, values }
    }

    /// Name of the tool being invoked.
    #[must_use]
    pub const fn tool(&self) -> &str {
        self.tool
    }

    /// A required string argument.
    ///
    /// # Errors
    ///
    /// Returns an error if the field is missing or not a string.
    pub fn str(&self, field: &str) -> Result<&'a str, ToolError> {
        self.values
            .get(field)
            .and_then(Value::as_str)
            .ok_or_else(|| self.invalid(field, "must be a string"))
    }

    /// An optional numeric argument.
    ///
    /// # Errors
    ///
    /// Returns an error if the field is present but not a number.
    pub fn optional_f64(&self, field: &str) -> Result<Option<f64>, ToolError> {
        match self.values.get(field) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => value
                .as_f64()
                .map(Some)
                .ok_or_else(|| self.invalid(field, "must be a number")),
        }
    }

    /// Build an execution error for this tool.
    #[must_use]
    pub fn failure(&self, message: impl Into<String>) -> ToolError {
        ToolError::Execution {
            tool: self.tool.to_string(),
            message: message.into(),
        }
    }

    fn invalid(&self, field: &str, reason: &str) -> ToolError {
        ToolError::InvalidArgument {
            tool: self.tool.to_string(),
            field: field.to_string(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn restock_spec() -> ToolSpec {
        ToolSpec::new(
            "calculate_restock",
            "Calculate restock",
            vec![
                ParamSpec::required("sku_number", ParamType::String, "SKU number"),
                ParamSpec::optional("lead_time_days", ParamType::Number, "Lead time override"),
            ],
        )
    }

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_json_schema() {
        let schema = restock_spec().json_schema();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["sku_number"]["type"], "string");
        assert_eq!(schema["properties"]["lead_time_days"]["type"], "number");
        assert_eq!(schema["required"], json!(["sku_number"]));
    }

    #[test]
    fn test_empty_parameters_schema() {
        let schema = ToolSpec::new("get_inventory", "All SKUs", Vec::new()).json_schema();
        assert_eq!(schema["properties"], json!({}));
        assert_eq!(schema["required"], json!([]));
    }

    #[test]
    fn test_validate_missing_required() {
        let err = restock_spec().validate(&args(json!({}))).unwrap_err();
        assert!(matches!(
            err,
            ToolError::InvalidArgument { ref field, .. } if field == "sku_number"
        ));
    }

    #[test]
    fn test_validate_wrong_type() {
        let err = restock_spec()
            .validate(&args(json!({"sku_number": "SKU-001", "lead_time_days": "soon"})))
            .unwrap_err();
        assert!(matches!(
            err,
            ToolError::InvalidArgument { ref field, .. } if field == "lead_time_days"
        ));
    }

    #[test]
    fn test_validate_null_optional_is_absent() {
        assert!(
            restock_spec()
                .validate(&args(json!({"sku_number": "SKU-001", "lead_time_days": null})))
                .is_ok()
        );
    }

    #[test]
    fn test_integer_rejects_fraction() {
        assert!(ParamType::Integer.accepts(&json!(3)));
        assert!(!ParamType::Integer.accepts(&json!(3.5)));
        assert!(ParamType::Number.accepts(&json!(3)));
    }

    #[test]
    fn test_arguments_accessors() {
        let values = args(json!({"sku_number": "SKU-002", "safety_days": 4}));
        let arguments = ToolArguments::new("calculate_restock", &values);
        assert_eq!(arguments.str("sku_number").unwrap(), "SKU-002");
        assert_eq!(arguments.optional_f64("safety_days").unwrap(), Some(4.0));
        assert_eq!(arguments.optional_f64("lead_time_days").unwrap(), None);
        assert!(arguments.str("missing").is_err());
    }
}
