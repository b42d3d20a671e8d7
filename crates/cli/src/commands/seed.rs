//! Seed the SKU catalog from a YAML file.
//!
//! The file is a list of SKUs:
//!
//! ```yaml
//! - sku_number: SKU-001
//!   sku_name: Wireless Headphones
//!   current_inventory: 1250
//!   daily_forecasted_sales: 45
//!   safety_days: 5
//!   lead_time_days: 7
//!   restock_cadence_days: 14
//! ```

use std::path::Path;

use tracing::{error, info};

use merchant_assistant::config::database_url_from_env;
use merchant_assistant::db::{self, SkuRepository};
use merchant_assistant::models::UpsertSkuInput;

/// Parse and check a SKU seed file's contents.
///
/// Returns every problem found, not just the first.
fn parse_skus(content: &str) -> Result<Vec<UpsertSkuInput>, Vec<String>> {
    let skus: Vec<UpsertSkuInput> =
        serde_yaml::from_str(content).map_err(|e| vec![format!("invalid YAML: {e}")])?;

    let mut errors = Vec::new();
    let mut seen = std::collections::HashSet::new();
    for sku in &skus {
        let number = sku.sku_number.as_str();
        if !seen.insert(number.to_string()) {
            errors.push(format!("{number}: listed more than once"));
        }
        if sku.sku_name.trim().is_empty() {
            errors.push(format!("{number}: sku_name is empty"));
        }
        if sku.current_inventory < 0 {
            errors.push(format!("{number}: current_inventory is negative"));
        }
        for (field, value) in [
            ("daily_forecasted_sales", sku.daily_forecasted_sales),
            ("safety_days", sku.safety_days),
            ("lead_time_days", sku.lead_time_days),
            ("restock_cadence_days", sku.restock_cadence_days),
        ] {
            if !value.is_finite() || value < 0.0 {
                errors.push(format!("{number}: {field} must be a non-negative number"));
            }
        }
    }

    if errors.is_empty() { Ok(skus) } else { Err(errors) }
}

/// Upsert every SKU in `file_path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or fails validation, or if a
/// database operation fails.
pub async fn skus(file_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let database_url = database_url_from_env()?;

    info!(path = %file_path.display(), "Loading SKUs from file");
    let content = tokio::fs::read_to_string(file_path).await?;

    // Validate before connecting to the database
    let skus = match parse_skus(&content) {
        Ok(skus) => skus,
        Err(errors) => {
            error!("SKU file validation failed:");
            for err in &errors {
                error!("  - {err}");
            }
            return Err(format!("{} validation errors found", errors.len()).into());
        }
    };
    info!(count = skus.len(), "Parsed SKUs");

    let pool = db::create_pool(&database_url).await?;
    let repo = SkuRepository::new(pool);

    for input in &skus {
        let sku = repo.upsert(input).await?;
        info!(sku_number = %sku.sku_number, inventory = sku.current_inventory, "Upserted SKU");
    }

    info!("Seeding complete! {} SKUs upserted", skus.len());
    Ok(())
}
