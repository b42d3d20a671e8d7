//! Inventory lookups and restock projections.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::instrument;

use merchant_assistant_core::{RestockOverrides, RestockResult, SkuId, SkuNumber};

use crate::db::RepositoryError;
use crate::models::{InventoryItem, Sku, UpsertSkuInput};

/// Read access to the SKU catalog.
#[async_trait]
pub trait SkuCatalog: Send + Sync {
    /// All SKUs, ordered by SKU number.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store fails.
    async fn list_skus(&self) -> Result<Vec<Sku>, RepositoryError>;

    /// One SKU by number.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store fails.
    async fn find_sku(&self, sku_number: &SkuNumber) -> Result<Option<Sku>, RepositoryError>;
}

/// Catalog held in memory, for tests and offline runs.
#[derive(Debug, Default)]
pub struct InMemorySkuCatalog {
    skus: RwLock<Vec<Sku>>,
}

impl InMemorySkuCatalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a catalog from seed inputs, assigning IDs from 1.
    #[must_use]
    pub fn from_inputs(inputs: impl IntoIterator<Item = UpsertSkuInput>) -> Self {
        let now = Utc::now();
        let mut skus: Vec<Sku> = inputs
            .into_iter()
            .zip(1..)
            .map(|(input, id)| Sku {
                id: SkuId::new(id),
                sku_number: input.sku_number,
                sku_name: input.sku_name,
                current_inventory: input.current_inventory,
                daily_forecasted_sales: input.daily_forecasted_sales,
                safety_days: input.safety_days,
                lead_time_days: input.lead_time_days,
                restock_cadence_days: input.restock_cadence_days,
                created_at: now,
                updated_at: now,
            })
            .collect();
        skus.sort_by(|a, b| a.sku_number.cmp(&b.sku_number));
        Self {
            skus: RwLock::new(skus),
        }
    }

    /// Insert or replace a SKU by number.
    pub async fn upsert(&self, sku: Sku) {
        let mut skus = self.skus.write().await;
        match skus.iter_mut().find(|s| s.sku_number == sku.sku_number) {
            Some(existing) => *existing = sku,
            None => {
                skus.push(sku);
                skus.sort_by(|a, b| a.sku_number.cmp(&b.sku_number));
            }
        }
    }
}

#[async_trait]
impl SkuCatalog for InMemorySkuCatalog {
    async fn list_skus(&self) -> Result<Vec<Sku>, RepositoryError> {
        Ok(self.skus.read().await.clone())
    }

    async fn find_sku(&self, sku_number: &SkuNumber) -> Result<Option<Sku>, RepositoryError> {
        Ok(self
            .skus
            .read()
            .await
            .iter()
            .find(|s| &s.sku_number == sku_number)
            .cloned())
    }
}

/// Inventory queries used by the tools and the inventory endpoint.
#[derive(Clone)]
pub struct InventoryService {
    catalog: Arc<dyn SkuCatalog>,
}

impl InventoryService {
    /// Create a service over a catalog.
    #[must_use]
    pub fn new(catalog: Arc<dyn SkuCatalog>) -> Self {
        Self { catalog }
    }

    /// Every SKU with its restock projection.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog fails.
    #[instrument(skip(self))]
    pub async fn inventory(&self) -> Result<Vec<InventoryItem>, RepositoryError> {
        let skus = self.catalog.list_skus().await?;
        Ok(skus.into_iter().map(InventoryItem::from).collect())
    }

    /// One SKU by number.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog fails.
    #[instrument(skip(self), fields(sku = %sku_number))]
    pub async fn sku(&self, sku_number: &SkuNumber) -> Result<Option<Sku>, RepositoryError> {
        self.catalog.find_sku(sku_number).await
    }

    /// Restock recommendation for one SKU with optional what-if overrides.
    ///
    /// Returns `None` if the SKU does not exist. Overrides must already be
    /// validated.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog fails.
    #[instrument(skip(self, overrides), fields(sku = %sku_number))]
    pub async fn calculate_restock(
        &self,
        sku_number: &SkuNumber,
        overrides: &RestockOverrides,
    ) -> Result<Option<RestockResult>, RepositoryError> {
        let Some(sku) = self.catalog.find_sku(sku_number).await? else {
            return Ok(None);
        };

        let inputs = overrides.apply(sku.restock_inputs());
        Ok(Some(RestockResult::compute(
            sku.sku_number,
            sku.sku_name,
            inputs,
        )))
    }
}

impl std::fmt::Debug for InventoryService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InventoryService").finish_non_exhaustive()
    }
}
