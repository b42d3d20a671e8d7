//! Restock recommendation formula.
//!
//! ```text
//! coverage_days  = lead_time_days + safety_days + restock_cadence_days
//! required_stock = daily_forecasted_sales × coverage_days
//! restock_amount = max(0, ceil(required_stock − current_inventory))
//! days_of_stock  = floor(current_inventory / daily_forecasted_sales)
//! ```
//!
//! Overrides for what-if scenarios are merged into the SKU's own parameters
//! exactly once via [`RestockOverrides::apply`], before the formula runs.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{HealthStatus, SkuNumber};

/// Errors raised while validating restock overrides.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RestockError {
    /// An override is negative, NaN, or infinite.
    #[error("{field} must be a finite, non-negative number (got {value})")]
    InvalidOverride {
        /// Name of the offending override field.
        field: &'static str,
        /// The rejected value.
        value: f64,
    },
}

/// Fully-populated inputs to the restock formula.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RestockInputs {
    /// Units currently on hand.
    pub current_inventory: i64,
    /// Forecasted units sold per day.
    pub daily_forecasted_sales: f64,
    /// Supplier lead time in days.
    pub lead_time_days: f64,
    /// Safety buffer in days.
    pub safety_days: f64,
    /// Days between restock orders.
    pub restock_cadence_days: f64,
}

/// Optional what-if overrides for [`RestockInputs`].
///
/// Every field defaults to `None`, meaning "use the SKU's stored value".
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RestockOverrides {
    /// Replaces the SKU's lead time.
    pub lead_time_days: Option<f64>,
    /// Replaces the SKU's safety days.
    pub safety_days: Option<f64>,
    /// Replaces the SKU's restock cadence.
    pub restock_cadence_days: Option<f64>,
    /// Replaces the SKU's forecasted daily demand.
    pub daily_forecasted_sales: Option<f64>,
}

impl RestockOverrides {
    /// Returns `true` when no override is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.lead_time_days.is_none()
            && self.safety_days.is_none()
            && self.restock_cadence_days.is_none()
            && self.daily_forecasted_sales.is_none()
    }

    /// Check that every present override is finite and non-negative.
    ///
    /// # Errors
    ///
    /// Returns [`RestockError::InvalidOverride`] naming the first bad field.
    pub fn validate(&self) -> Result<(), RestockError> {
        let fields = [
            ("lead_time_days", self.lead_time_days),
            ("safety_days", self.safety_days),
            ("restock_cadence_days", self.restock_cadence_days),
            ("daily_forecasted_sales", self.daily_forecasted_sales),
        ];
        fields
            .into_iter()
            .find_map(|(field, value)| {
                value
                    .filter(|v| !v.is_finite() || *v < 0.0)
                    .map(|value| RestockError::InvalidOverride { field, value })
            })
            .map_or(Ok(()), Err)
    }

    /// Merge these overrides over `base`, field by field.
    #[must_use]
    pub fn apply(&self, base: RestockInputs) -> RestockInputs {
        RestockInputs {
            current_inventory: base.current_inventory,
            daily_forecasted_sales: self
                .daily_forecasted_sales
                .unwrap_or(base.daily_forecasted_sales),
            lead_time_days: self.lead_time_days.unwrap_or(base.lead_time_days),
            safety_days: self.safety_days.unwrap_or(base.safety_days),
            restock_cadence_days: self
                .restock_cadence_days
                .unwrap_or(base.restock_cadence_days),
        }
    }
}

/// Output of the restock formula for one SKU.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestockResult {
    pub sku_number: SkuNumber,
    pub sku_name: String,
    pub current_inventory: i64,
    pub daily_forecasted_sales: f64,
    pub lead_time_days: f64,
    pub safety_days: f64,
    pub restock_cadence_days: f64,
    pub coverage_days: f64,
    pub required_stock: f64,
    pub restock_amount: i64,
    /// `None` when there is no forecasted demand (unlimited cover).
    pub days_of_stock: Option<i64>,
    pub health_status: HealthStatus,
    pub formula_used: String,
}

impl RestockResult {
    /// Run the restock formula for a SKU.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    pub fn compute(sku_number: SkuNumber, sku_name: String, inputs: RestockInputs) -> Self {
        let RestockInputs {
            current_inventory,
            daily_forecasted_sales,
            lead_time_days,
            safety_days,
            restock_cadence_days,
        } = inputs;

        let coverage_days = lead_time_days + safety_days + restock_cadence_days;
        let required_stock = daily_forecasted_sales * coverage_days;
        let restock_amount = (required_stock - current_inventory as f64).ceil().max(0.0) as i64;
        let days_of_stock = (daily_forecasted_sales > 0.0)
            .then(|| (current_inventory as f64 / daily_forecasted_sales).floor() as i64);
        let health_status = HealthStatus::classify(current_inventory, days_of_stock);

        let formula_used = format!(
            "{daily_forecasted_sales} × ({lead_time_days} + {safety_days} + {restock_cadence_days}) − {current_inventory} = {restock_amount}"
        );

        Self {
            sku_number,
            sku_name,
            current_inventory,
            daily_forecasted_sales,
            lead_time_days,
            safety_days,
            restock_cadence_days,
            coverage_days,
            required_stock,
            restock_amount,
            days_of_stock,
            health_status,
            formula_used,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn inputs(inv: i64, sales: f64, lead: f64, safety: f64, cadence: f64) -> RestockInputs {
        RestockInputs {
            current_inventory: inv,
            daily_forecasted_sales: sales,
            lead_time_days: lead,
            safety_days: safety,
            restock_cadence_days: cadence,
        }
    }

    fn sku(n: &str) -> SkuNumber {
        SkuNumber::parse(n).unwrap()
    }

    #[test]
    fn test_usb_cable_is_critical() {
        let result = RestockResult::compute(
            sku("SKU-002"),
            "USB-C Cable".to_string(),
            inputs(180, 80.0, 5.0, 3.0, 7.0),
        );
        assert!((result.coverage_days - 15.0).abs() < f64::EPSILON);
        assert!((result.required_stock - 1200.0).abs() < f64::EPSILON);
        assert_eq!(result.restock_amount, 1020);
        assert_eq!(result.days_of_stock, Some(2));
        assert_eq!(result.health_status, HealthStatus::Critical);
        assert_eq!(result.formula_used, "80 × (5 + 3 + 7) − 180 = 1020");
    }

    #[test]
    fn test_overstocked_sku_needs_nothing() {
        let result = RestockResult::compute(
            sku("SKU-001"),
            "Wireless Headphones".to_string(),
            inputs(1250, 45.0, 7.0, 5.0, 14.0),
        );
        assert_eq!(result.restock_amount, 0);
        assert_eq!(result.days_of_stock, Some(27));
        assert_eq!(result.health_status, HealthStatus::Low);
    }

    #[test]
    fn test_out_of_stock() {
        let result = RestockResult::compute(
            sku("SKU-004"),
            "Phone Case".to_string(),
            inputs(0, 60.0, 7.0, 3.0, 7.0),
        );
        assert_eq!(result.restock_amount, 1020);
        assert_eq!(result.days_of_stock, Some(0));
        assert_eq!(result.health_status, HealthStatus::OutOfStock);
    }

    #[test]
    fn test_zero_demand_has_unlimited_cover() {
        let result =
            RestockResult::compute(sku("SKU-009"), "Idle".to_string(), inputs(10, 0.0, 1.0, 1.0, 1.0));
        assert_eq!(result.days_of_stock, None);
        assert_eq!(result.restock_amount, 0);
        assert_eq!(result.health_status, HealthStatus::Healthy);

        let json = serde_json::to_value(&result).unwrap();
        assert!(json["days_of_stock"].is_null());
    }

    #[test]
    fn test_fractional_requirement_rounds_up() {
        let result =
            RestockResult::compute(sku("SKU-010"), "Bolts".to_string(), inputs(0, 2.5, 1.0, 0.0, 0.0));
        assert_eq!(result.restock_amount, 3);
    }

    #[test]
    fn test_overrides_apply_field_by_field() {
        let base = inputs(45, 30.0, 10.0, 5.0, 14.0);
        let overrides = RestockOverrides {
            lead_time_days: Some(3.0),
            daily_forecasted_sales: Some(10.0),
            ..RestockOverrides::default()
        };
        let merged = overrides.apply(base);
        assert!((merged.lead_time_days - 3.0).abs() < f64::EPSILON);
        assert!((merged.daily_forecasted_sales - 10.0).abs() < f64::EPSILON);
        assert!((merged.safety_days - 5.0).abs() < f64::EPSILON);
        assert!((merged.restock_cadence_days - 14.0).abs() < f64::EPSILON);
        assert_eq!(merged.current_inventory, 45);
    }

    #[test]
    fn test_empty_overrides() {
        assert!(RestockOverrides::default().is_empty());
        let base = inputs(1, 1.0, 1.0, 1.0, 1.0);
        assert_eq!(RestockOverrides::default().apply(base), base);
    }

    #[test]
    fn test_validate_rejects_negative_and_nan() {
        let negative = RestockOverrides {
            safety_days: Some(-1.0),
            ..RestockOverrides::default()
        };
        assert!(matches!(
            negative.validate(),
            Err(RestockError::InvalidOverride {
                field: "safety_days",
                ..
            })
        ));

        let nan = RestockOverrides {
            daily_forecasted_sales: Some(f64::NAN),
            ..RestockOverrides::default()
        };
        assert!(nan.validate().is_err());

        assert!(RestockOverrides::default().validate().is_ok());
    }
}
