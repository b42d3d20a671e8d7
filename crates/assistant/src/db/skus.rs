//! SKU repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use merchant_assistant_core::{SkuId, SkuNumber};

use super::RepositoryError;
use crate::models::{Sku, UpsertSkuInput};
use crate::services::SkuCatalog;

const SKU_COLUMNS: &str = "id, sku_number, sku_name, current_inventory, \
    daily_forecasted_sales, safety_days, lead_time_days, restock_cadence_days, \
    created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct SkuRow {
    id: i32,
    sku_number: String,
    sku_name: String,
    current_inventory: i64,
    daily_forecasted_sales: f64,
    safety_days: f64,
    lead_time_days: f64,
    restock_cadence_days: f64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SkuRow> for Sku {
    type Error = RepositoryError;

    fn try_from(row: SkuRow) -> Result<Self, Self::Error> {
        let sku_number = SkuNumber::parse(&row.sku_number).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid SKU number in database: {e}"))
        })?;

        Ok(Self {
            id: SkuId::new(row.id),
            sku_number,
            sku_name: row.sku_name,
            current_inventory: row.current_inventory,
            daily_forecasted_sales: row.daily_forecasted_sales,
            safety_days: row.safety_days,
            lead_time_days: row.lead_time_days,
            restock_cadence_days: row.restock_cadence_days,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Repository for SKU database operations.
#[derive(Debug, Clone)]
pub struct SkuRepository {
    pool: PgPool,
}

impl SkuRepository {
    /// Create a new SKU repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List all SKUs ordered by SKU number.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    #[instrument(skip(self))]
    pub async fn list_all(&self) -> Result<Vec<Sku>, RepositoryError> {
        let rows = sqlx::query_as::<_, SkuRow>(&format!(
            "SELECT {SKU_COLUMNS} FROM skus ORDER BY sku_number"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Get a SKU by its number.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    #[instrument(skip(self), fields(sku = %sku_number))]
    pub async fn get_by_number(
        &self,
        sku_number: &SkuNumber,
    ) -> Result<Option<Sku>, RepositoryError> {
        let row = sqlx::query_as::<_, SkuRow>(&format!(
            "SELECT {SKU_COLUMNS} FROM skus WHERE sku_number = $1"
        ))
        .bind(sku_number.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Insert a SKU, or update the existing row with the same number.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    #[instrument(skip(self, input), fields(sku = %input.sku_number))]
    pub async fn upsert(&self, input: &UpsertSkuInput) -> Result<Sku, RepositoryError> {
        let row = sqlx::query_as::<_, SkuRow>(&format!(
            r"
            INSERT INTO skus (sku_number, sku_name, current_inventory,
                              daily_forecasted_sales, safety_days,
                              lead_time_days, restock_cadence_days)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (sku_number) DO UPDATE SET
                sku_name = EXCLUDED.sku_name,
                current_inventory = EXCLUDED.current_inventory,
                daily_forecasted_sales = EXCLUDED.daily_forecasted_sales,
                safety_days = EXCLUDED.safety_days,
                lead_time_days = EXCLUDED.lead_time_days,
                restock_cadence_days = EXCLUDED.restock_cadence_days,
                updated_at = NOW()
            RETURNING {SKU_COLUMNS}
            "
        ))
        .bind(input.sku_number.as_str())
        .bind(&input.sku_name)
        .bind(input.current_inventory)
        .bind(input.daily_forecasted_sales)
        .bind(input.safety_days)
        .bind(input.lead_time_days)
        .bind(input.restock_cadence_days)
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }
}

#[async_trait]
impl SkuCatalog for SkuRepository {
    async fn list_skus(&self) -> Result<Vec<Sku>, RepositoryError> {
        self.list_all().await
    }

    async fn find_sku(&self, sku_number: &SkuNumber) -> Result<Option<Sku>, RepositoryError> {
        self.get_by_number(sku_number).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(sku_number: &str) -> SkuRow {
        SkuRow {
            id: 3,
            sku_number: sku_number.to_string(),
            sku_name: "Bluetooth Speaker".to_string(),
            current_inventory: 45,
            daily_forecasted_sales: 30.0,
            safety_days: 5.0,
            lead_time_days: 10.0,
            restock_cadence_days: 14.0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_row_conversion() {
        let sku = Sku::try_from(row("SKU-003")).expect("valid row");
        assert_eq!(sku.id, SkuId::new(3));
        assert_eq!(sku.sku_number.as_str(), "SKU-003");
        assert_eq!(sku.restock().restock_amount, 825);
    }

    #[test]
    fn test_row_with_invalid_number_is_corruption() {
        assert!(matches!(
            Sku::try_from(row("")),
            Err(RepositoryError::DataCorruption(_))
        ));
    }
}
