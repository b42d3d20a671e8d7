//! Application state shared across handlers.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use sqlx::PgPool;
use thiserror::Error;

use crate::config::{AssistantConfig, EmbeddingProvider};
use crate::db::{self, PgVectorStore, SkuRepository};
use crate::llm::{LlmError, OpenAiChatClient};
use crate::retrieval::{
    Embedder, EmbeddingError, HashingEmbedder, OpenAiEmbedder, RetrievalPipeline,
};
use crate::services::{AbortSignal, InventoryService, Orchestrator};
use crate::tools::{RegistryError, build_registry};

/// Failures while wiring the application together at startup.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("database connection failed: {0}")]
    Database(#[from] sqlx::Error),

    #[error("embedding client setup failed: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("chat client setup failed: {0}")]
    Llm(#[from] LlmError),

    #[error("tool registration failed: {0}")]
    Registry(#[from] RegistryError),
}

/// Application state shared across all handlers.
///
/// Cheap to clone; every clone shares the same collaborators.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    orchestrator: Orchestrator,
    inventory: InventoryService,
    knowledge: RetrievalPipeline,
    uploads_dir: PathBuf,
    pool: Option<PgPool>,
    shutdown: AbortSignal,
}

impl AppState {
    /// Create application state.
    ///
    /// `pool` is the database checked by the readiness probe; without one the
    /// service reports ready as soon as it is up.
    #[must_use]
    pub fn new(
        orchestrator: Orchestrator,
        inventory: InventoryService,
        knowledge: RetrievalPipeline,
        uploads_dir: impl Into<PathBuf>,
        pool: Option<PgPool>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                orchestrator,
                inventory,
                knowledge,
                uploads_dir: uploads_dir.into(),
                pool,
                shutdown: AbortSignal::new(),
            }),
        }
    }

    /// Connect to Postgres and build every collaborator from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the pool cannot be created or a client cannot be
    /// configured.
    pub async fn connect(config: &AssistantConfig) -> Result<Self, StartupError> {
        let pool = db::create_pool(&config.database_url).await?;
        tracing::info!("Database pool created");

        let embedder = build_embedder(config)?;
        let store = Arc::new(PgVectorStore::new(pool.clone(), embedder.dimensions()));
        let knowledge = RetrievalPipeline::new(embedder, store, config.retrieval);

        let inventory = InventoryService::new(Arc::new(SkuRepository::new(pool.clone())));

        let registry = build_registry(&inventory, &knowledge, config.retrieval.top_k)?;
        let model = OpenAiChatClient::new(&config.openai, config.orchestrator.model_timeout)?;
        let orchestrator =
            Orchestrator::new(Arc::new(model), Arc::new(registry), config.orchestrator);

        Ok(Self::new(
            orchestrator,
            inventory,
            knowledge,
            config.uploads_dir.clone(),
            Some(pool),
        ))
    }

    #[must_use]
    pub fn orchestrator(&self) -> &Orchestrator {
        &self.inner.orchestrator
    }

    #[must_use]
    pub fn inventory(&self) -> &InventoryService {
        &self.inner.inventory
    }

    #[must_use]
    pub fn knowledge(&self) -> &RetrievalPipeline {
        &self.inner.knowledge
    }

    #[must_use]
    pub fn uploads_dir(&self) -> &Path {
        &self.inner.uploads_dir
    }

    /// Database pool, if one is attached.
    #[must_use]
    pub fn pool(&self) -> Option<&PgPool> {
        self.inner.pool.as_ref()
    }

    /// Signal tripped on graceful shutdown; in-flight chat runs observe it.
    #[must_use]
    pub fn shutdown(&self) -> &AbortSignal {
        &self.inner.shutdown
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("orchestrator", &self.inner.orchestrator)
            .field("uploads_dir", &self.inner.uploads_dir)
            .field("database", &self.inner.pool.is_some())
            .finish_non_exhaustive()
    }
}

/// Build the embedder selected by `EMBEDDING_PROVIDER`.
///
/// # Errors
///
/// Returns an error if the `OpenAI` client cannot be configured.
pub fn build_embedder(config: &AssistantConfig) -> Result<Arc<dyn Embedder>, EmbeddingError> {
    let embedding = &config.embedding;
    let embedder: Arc<dyn Embedder> = match embedding.provider {
        EmbeddingProvider::OpenAi => Arc::new(OpenAiEmbedder::new(
            &config.openai.api_key,
            &config.openai.base_url,
            embedding.model.clone(),
            embedding.dimensions,
            config.retrieval.timeout,
        )?),
        EmbeddingProvider::Hashing => Arc::new(HashingEmbedder::new(embedding.dimensions)),
    };
    tracing::info!(
        provider = ?embedding.provider,
        dimensions = embedding.dimensions,
        "Embedder configured"
    );
    Ok(embedder)
}
