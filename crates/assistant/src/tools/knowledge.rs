//! Knowledge-base search tool.

use async_trait::async_trait;
use serde_json::Value;

use crate::retrieval::RetrievalPipeline;

use super::error::ToolError;
use super::registry::ToolHandler;
use super::schema::{ParamSpec, ParamType, ToolArguments, ToolSpec};

/// `search_knowledge`: top-k chunk texts for a query.
///
/// Fails open: an unavailable knowledge base yields `[]`, never an error.
#[derive(Debug, Clone)]
pub struct SearchKnowledgeTool {
    pipeline: RetrievalPipeline,
    top_k: usize,
}

impl SearchKnowledgeTool {
    #[must_use]
    pub const fn new(pipeline: RetrievalPipeline, top_k: usize) -> Self {
        Self { pipeline, top_k }
    }

    #[must_use]
    pub fn spec() -> ToolSpec {
        ToolSpec::new(
            "search_knowledge",
            "Search the knowledge base for supply chain definitions, formulas, and best practices",
            vec![ParamSpec::required(
                "query",
                ParamType::String,
                "The search query",
            )],
        )
    }
}

#[async_trait]
impl ToolHandler for SearchKnowledgeTool {
    async fn call(&self, arguments: ToolArguments<'_>) -> Result<Value, ToolError> {
        let query = arguments.str("query")?;
        let texts = self.pipeline.search(query, self.top_k).await;
        Ok(Value::Array(texts.into_iter().map(Value::String).collect()))
    }
}
