//! Shared fixtures for the merchant assistant integration tests.
//!
//! Everything here runs in memory: a scripted chat model, the hashing
//! embedder, the in-memory vector store and SKU catalog. No network or
//! database is needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p merchant-assistant-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;

use merchant_assistant::llm::{LanguageModel, LlmError, Message, ModelReply, ToolCall};
use merchant_assistant::models::UpsertSkuInput;
use merchant_assistant::retrieval::{
    HashingEmbedder, InMemoryVectorStore, RetrievalConfig, RetrievalPipeline, ScoredChunk,
    StoreError, VectorRecord, VectorStore,
};
use merchant_assistant::services::{
    InMemorySkuCatalog, InventoryService, Orchestrator, OrchestratorConfig,
};
use merchant_assistant::state::AppState;
use merchant_assistant::tools::{ToolSpec, build_registry};
use merchant_assistant_core::SkuNumber;

/// Dimensions used by every in-memory fixture.
pub const TEST_DIMENSIONS: usize = 256;

/// One recorded model call.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub messages: Vec<Message>,
    pub tool_names: Vec<String>,
}

/// A chat model that replays a script.
///
/// When the script runs out it keeps returning `fallback`. A fallback tool
/// call is answered with text on any call that offers no tools, the way a
/// real model must when forced to answer.
pub struct ScriptedModel {
    replies: Mutex<VecDeque<Result<ModelReply, LlmError>>>,
    fallback: ModelReply,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedModel {
    pub fn new(replies: impl IntoIterator<Item = ModelReply>) -> Self {
        Self::with_results(replies.into_iter().map(Ok))
    }

    pub fn with_results(replies: impl IntoIterator<Item = Result<ModelReply, LlmError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            fallback: ModelReply::Text("done".to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// A model that requests `call` forever.
    pub fn always_calling(call: ToolCall) -> Self {
        Self {
            fallback: ModelReply::ToolCall(call),
            ..Self::new([])
        }
    }

    /// Every call made so far.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn complete(
        &self,
        messages: &[Message],
        tools: &[ToolSpec],
    ) -> Result<ModelReply, LlmError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedCall {
                messages: messages.to_vec(),
                tool_names: tools.iter().map(|t| t.name.clone()).collect(),
            });

        let next = self
            .replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        if let Some(reply) = next {
            return reply;
        }
        match &self.fallback {
            ModelReply::ToolCall(_) if tools.is_empty() => {
                Ok(ModelReply::Text("Here is what I found so far.".to_string()))
            }
            other => Ok(other.clone()),
        }
    }
}

/// A vector store whose every operation fails.
#[derive(Debug, Default)]
pub struct FailingVectorStore;

#[async_trait]
impl VectorStore for FailingVectorStore {
    async fn upsert(&self, _records: Vec<VectorRecord>) -> Result<(), StoreError> {
        Err(StoreError::DataCorruption("store offline".to_string()))
    }

    async fn query(&self, _vector: &[f32], _k: usize) -> Result<Vec<ScoredChunk>, StoreError> {
        Err(StoreError::DataCorruption("store offline".to_string()))
    }
}

/// A tool call with arguments given as JSON.
pub fn tool_call(id: &str, name: &str, arguments: &serde_json::Value) -> ModelReply {
    ModelReply::ToolCall(ToolCall::new(id, name, arguments.to_string()))
}

fn seed(
    number: &str,
    name: &str,
    inventory: i64,
    daily: f64,
    safety: f64,
    lead: f64,
    cadence: f64,
) -> UpsertSkuInput {
    UpsertSkuInput {
        sku_number: SkuNumber::parse(number).expect("valid seed SKU number"),
        sku_name: name.to_string(),
        current_inventory: inventory,
        daily_forecasted_sales: daily,
        safety_days: safety,
        lead_time_days: lead,
        restock_cadence_days: cadence,
    }
}

/// The four demo SKUs.
pub fn seed_skus() -> Vec<UpsertSkuInput> {
    vec![
        seed("SKU-001", "Wireless Headphones", 1250, 45.0, 5.0, 7.0, 14.0),
        seed("SKU-002", "USB-C Cable", 180, 80.0, 3.0, 5.0, 7.0),
        seed("SKU-003", "Bluetooth Speaker", 45, 30.0, 5.0, 10.0, 14.0),
        seed("SKU-004", "Phone Case", 0, 60.0, 3.0, 7.0, 7.0),
    ]
}

pub fn seeded_inventory() -> InventoryService {
    InventoryService::new(Arc::new(InMemorySkuCatalog::from_inputs(seed_skus())))
}

pub fn pipeline_with(store: Arc<dyn VectorStore>) -> RetrievalPipeline {
    RetrievalPipeline::new(
        Arc::new(HashingEmbedder::new(TEST_DIMENSIONS)),
        store,
        RetrievalConfig::default(),
    )
}

pub fn memory_pipeline() -> RetrievalPipeline {
    pipeline_with(Arc::new(InMemoryVectorStore::new()))
}

/// An orchestrator over the seeded catalog and `knowledge`.
pub fn orchestrator(
    model: Arc<ScriptedModel>,
    knowledge: &RetrievalPipeline,
    config: OrchestratorConfig,
) -> Orchestrator {
    let inventory = seeded_inventory();
    let registry = build_registry(&inventory, knowledge, RetrievalConfig::default().top_k)
        .expect("built-in tools register");
    Orchestrator::new(model, Arc::new(registry), config)
}

/// Application state wired entirely in memory.
pub fn app_state(model: Arc<ScriptedModel>, uploads_dir: &std::path::Path) -> AppState {
    let knowledge = memory_pipeline();
    let inventory = seeded_inventory();
    let registry = build_registry(&inventory, &knowledge, RetrievalConfig::default().top_k)
        .expect("built-in tools register");
    let orchestrator =
        Orchestrator::new(model, Arc::new(registry), OrchestratorConfig::default());
    AppState::new(orchestrator, inventory, knowledge, uploads_dir, None)
}
