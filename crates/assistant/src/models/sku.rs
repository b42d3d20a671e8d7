//! SKU domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use merchant_assistant_core::{HealthStatus, RestockInputs, RestockResult, SkuId, SkuNumber};

/// A stocked product line with its replenishment parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sku {
    /// Unique SKU ID.
    pub id: SkuId,
    /// Merchant-facing SKU number (e.g. `SKU-002`).
    pub sku_number: SkuNumber,
    /// Product name.
    pub sku_name: String,
    /// Units currently on hand.
    pub current_inventory: i64,
    /// Forecasted units sold per day.
    pub daily_forecasted_sales: f64,
    /// Safety buffer in days.
    pub safety_days: f64,
    /// Supplier lead time in days.
    pub lead_time_days: f64,
    /// Days between restock orders.
    pub restock_cadence_days: f64,
    /// When the SKU was created.
    pub created_at: DateTime<Utc>,
    /// When the SKU was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Sku {
    /// The SKU's own parameters as formula inputs.
    #[must_use]
    pub const fn restock_inputs(&self) -> RestockInputs {
        RestockInputs {
            current_inventory: self.current_inventory,
            daily_forecasted_sales: self.daily_forecasted_sales,
            lead_time_days: self.lead_time_days,
            safety_days: self.safety_days,
            restock_cadence_days: self.restock_cadence_days,
        }
    }

    /// Run the restock formula with the stored parameters.
    #[must_use]
    pub fn restock(&self) -> RestockResult {
        RestockResult::compute(
            self.sku_number.clone(),
            self.sku_name.clone(),
            self.restock_inputs(),
        )
    }
}

/// A SKU together with its restock projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    /// The SKU itself.
    #[serde(flatten)]
    pub sku: Sku,
    /// Units to order now.
    pub restock_amount: i64,
    /// Stock health.
    pub health_status: HealthStatus,
    /// Whole days of cover; `null` when there is no forecasted demand.
    pub days_of_stock: Option<i64>,
}

impl From<Sku> for InventoryItem {
    fn from(sku: Sku) -> Self {
        let projection = sku.restock();
        Self {
            restock_amount: projection.restock_amount,
            health_status: projection.health_status,
            days_of_stock: projection.days_of_stock,
            sku,
        }
    }
}

/// Input for creating or updating a SKU by number.
#[derive(Debug, Clone, Deserialize)]
pub struct UpsertSkuInput {
    pub sku_number: SkuNumber,
    pub sku_name: String,
    pub current_inventory: i64,
    pub daily_forecasted_sales: f64,
    pub safety_days: f64,
    pub lead_time_days: f64,
    pub restock_cadence_days: f64,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn usb_cable() -> Sku {
        Sku {
            id: SkuId::new(2),
            sku_number: SkuNumber::parse("SKU-002").unwrap(),
            sku_name: "USB-C Cable".to_string(),
            current_inventory: 180,
            daily_forecasted_sales: 80.0,
            safety_days: 3.0,
            lead_time_days: 5.0,
            restock_cadence_days: 7.0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_inventory_item_projection() {
        let item = InventoryItem::from(usb_cable());
        assert_eq!(item.restock_amount, 1020);
        assert_eq!(item.health_status, HealthStatus::Critical);
        assert_eq!(item.days_of_stock, Some(2));
    }

    #[test]
    fn test_inventory_item_serializes_flat() {
        let json = serde_json::to_value(InventoryItem::from(usb_cable())).unwrap();
        assert_eq!(json["sku_number"], "SKU-002");
        assert_eq!(json["sku_name"], "USB-C Cable");
        assert_eq!(json["restock_amount"], 1020);
        assert_eq!(json["health_status"], "Critical");
        assert_eq!(json["days_of_stock"], 2);
    }
}
