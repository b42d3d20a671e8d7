//! Inventory tools: catalog lookups and the restock formula.

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use merchant_assistant_core::{RestockError, RestockOverrides, SkuNumber};

use crate::services::InventoryService;

use super::error::ToolError;
use super::registry::ToolHandler;
use super::schema::{ParamSpec, ParamType, ToolArguments, ToolSpec};

/// `get_inventory`: every SKU with its restock projection.
#[derive(Debug, Clone)]
pub struct GetInventoryTool {
    inventory: InventoryService,
}

impl GetInventoryTool {
    #[must_use]
    pub const fn new(inventory: InventoryService) -> Self {
        Self { inventory }
    }

    #[must_use]
    pub fn spec() -> ToolSpec {
        ToolSpec::new(
            "get_inventory",
            "Get all SKUs with current inventory levels, parameters and restock calculations",
            Vec::new(),
        )
    }
}

#[async_trait]
impl ToolHandler for GetInventoryTool {
    async fn call(&self, arguments: ToolArguments<'_>) -> Result<Value, ToolError> {
        let items = self
            .inventory
            .inventory()
            .await
            .map_err(|e| arguments.failure(e.to_string()))?;
        to_value(&arguments, &items)
    }
}

/// `get_sku`: one SKU by number, or `null`.
#[derive(Debug, Clone)]
pub struct GetSkuTool {
    inventory: InventoryService,
}

impl GetSkuTool {
    #[must_use]
    pub const fn new(inventory: InventoryService) -> Self {
        Self { inventory }
    }

    #[must_use]
    pub fn spec() -> ToolSpec {
        ToolSpec::new(
            "get_sku",
            "Get data for a specific SKU by SKU number",
            vec![ParamSpec::required(
                "sku_number",
                ParamType::String,
                "The SKU identifier",
            )],
        )
    }
}

#[async_trait]
impl ToolHandler for GetSkuTool {
    async fn call(&self, arguments: ToolArguments<'_>) -> Result<Value, ToolError> {
        let Some(sku_number) = lookup_key(arguments.str("sku_number")?) else {
            return Ok(Value::Null);
        };
        let sku = self
            .inventory
            .sku(&sku_number)
            .await
            .map_err(|e| arguments.failure(e.to_string()))?;
        to_value(&arguments, &sku)
    }
}

/// `calculate_restock`: the restock formula with optional what-if overrides.
#[derive(Debug, Clone)]
pub struct CalculateRestockTool {
    inventory: InventoryService,
}

impl CalculateRestockTool {
    #[must_use]
    pub const fn new(inventory: InventoryService) -> Self {
        Self { inventory }
    }

    #[must_use]
    pub fn spec() -> ToolSpec {
        ToolSpec::new(
            "calculate_restock",
            "Calculate restock recommendation for a SKU with optional variable overrides for what-if scenarios",
            vec![
                ParamSpec::required("sku_number", ParamType::String, "The SKU identifier"),
                ParamSpec::optional(
                    "lead_time_days",
                    ParamType::Number,
                    "Override lead time in days",
                ),
                ParamSpec::optional("safety_days", ParamType::Number, "Override safety days"),
                ParamSpec::optional(
                    "restock_cadence_days",
                    ParamType::Number,
                    "Override restock cadence in days",
                ),
                ParamSpec::optional(
                    "daily_forecasted_sales",
                    ParamType::Number,
                    "Override daily demand",
                ),
            ],
        )
    }
}

#[async_trait]
impl ToolHandler for CalculateRestockTool {
    async fn call(&self, arguments: ToolArguments<'_>) -> Result<Value, ToolError> {
        let raw_number = arguments.str("sku_number")?;
        let overrides = RestockOverrides {
            lead_time_days: arguments.optional_f64("lead_time_days")?,
            safety_days: arguments.optional_f64("safety_days")?,
            restock_cadence_days: arguments.optional_f64("restock_cadence_days")?,
            daily_forecasted_sales: arguments.optional_f64("daily_forecasted_sales")?,
        };
        overrides.validate().map_err(|e| match e {
            RestockError::InvalidOverride { field, .. } => ToolError::InvalidArgument {
                tool: arguments.tool().to_string(),
                field: field.to_string(),
                reason: e.to_string(),
            },
        })?;

        let Some(sku_number) = lookup_key(raw_number) else {
            return Ok(Value::Null);
        };
        if !overrides.is_empty() {
            debug!(sku = %sku_number, ?overrides, "What-if restock");
        }

        let result = self
            .inventory
            .calculate_restock(&sku_number, &overrides)
            .await
            .map_err(|e| arguments.failure(e.to_string()))?;
        to_value(&arguments, &result)
    }
}

/// A SKU number that fails to parse cannot match any stored SKU.
fn lookup_key(raw: &str) -> Option<SkuNumber> {
    SkuNumber::parse(raw).ok()
}

fn to_value<T: serde::Serialize>(arguments: &ToolArguments<'_>, value: &T) -> Result<Value, ToolError> {
    serde_json::to_value(value)
        .map_err(|e| arguments.failure(format!("Failed to serialize result: {e}")))
}
