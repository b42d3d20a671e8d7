//! Status enums for inventory entities.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Days of cover below which a SKU is considered critical.
pub const CRITICAL_DAYS_THRESHOLD: i64 = 15;

/// Days of cover below which a SKU is considered low.
pub const LOW_DAYS_THRESHOLD: i64 = 30;

/// Inventory health of a SKU, derived from its days of stock.
///
/// Serialized with the display labels the assistant's prompt refers to
/// (`"Out of Stock"` rather than `"out_of_stock"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HealthStatus {
    /// Inventory covers at least 30 days of demand.
    Healthy,
    /// Inventory covers 15 to 29 days of demand.
    Low,
    /// Inventory covers fewer than 15 days of demand.
    Critical,
    /// No inventory on hand.
    #[serde(rename = "Out of Stock")]
    OutOfStock,
}

impl HealthStatus {
    /// Classify a SKU from its on-hand quantity and days of stock.
    ///
    /// `days_of_stock` is `None` when there is no forecasted demand, which
    /// counts as unlimited cover.
    #[must_use]
    pub const fn classify(current_inventory: i64, days_of_stock: Option<i64>) -> Self {
        if current_inventory == 0 {
            return Self::OutOfStock;
        }
        match days_of_stock {
            Some(days) if days < CRITICAL_DAYS_THRESHOLD => Self::Critical,
            Some(days) if days < LOW_DAYS_THRESHOLD => Self::Low,
            _ => Self::Healthy,
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Healthy => "Healthy",
            Self::Low => "Low",
            Self::Critical => "Critical",
            Self::OutOfStock => "Out of Stock",
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
