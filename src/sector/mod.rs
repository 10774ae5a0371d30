//! Sector templates: investment, cost structure, revenue streams and customer dynamics

mod seasonality;
mod formula;
mod catalog;
pub mod loader;

pub use seasonality::{Seasonality, calendar_month, month_name};
pub use formula::{
    StreamFormula, CustomBasis, RevenueStream, CostCategory, CostRule, StructuredCost,
    CostItem, OperationalCost, check_stream_order,
};
pub use catalog::SectorCatalog;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{PlanError, PlanResult};

/// Investment bracket for a sector
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InvestmentRange {
    pub min: f64,
    pub max: f64,
    pub average: f64,
}

/// Itemized startup cost
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequiredItem {
    pub id: String,
    pub name: String,
    pub category: String,
    pub estimated_price: f64,
}

/// Customer acquisition and churn parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerManagement {
    #[serde(default)]
    pub initial_customers: u32,
    /// New customers per month before seasonality
    pub monthly_growth_base: f64,
    /// Fraction of active customers lost each month
    pub monthly_churn_rate: f64,
    #[serde(default)]
    pub seasonality: Seasonality,
    #[serde(default)]
    pub year1_target: Option<u32>,
}

/// Operational KPI benchmark
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KpiBenchmark {
    pub target: f64,
    pub benchmark_sector: f64,
    pub critical: f64,
}

/// Opening-period adjustments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemporalAspects {
    /// Months without rent for `Rent` cost items that declare no grace of their own
    pub rent_grace_months: u32,
    /// Customers signed before opening; they join the seed population
    pub pre_opening_customers: u32,
    /// Months over which acquisition ramps up to full speed
    pub ramp_up_months: u32,
    /// Acquisition factor in month 1 of the ramp-up
    pub ramp_up_initial_factor: f64,
    pub max_capacity: Option<u32>,
    /// Trading floor area, for customer density
    pub floor_area_m2: Option<f64>,
}

impl Default for TemporalAspects {
    fn default() -> Self {
        Self {
            rent_grace_months: 0,
            pre_opening_customers: 0,
            ramp_up_months: 0,
            ramp_up_initial_factor: 1.0,
            max_capacity: None,
            floor_area_m2: None,
        }
    }
}

/// Immutable business-model definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorTemplate {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub sector: String,
    #[serde(default)]
    pub description: String,
    pub investment_range: InvestmentRange,
    #[serde(default)]
    pub required_items: Vec<RequiredItem>,
    #[serde(default)]
    pub cost_schedule: Vec<CostItem>,
    #[serde(default)]
    pub revenue_streams: Vec<RevenueStream>,
    pub customer_management: CustomerManagement,
    #[serde(default)]
    pub operational_kpis: BTreeMap<String, KpiBenchmark>,
    #[serde(default)]
    pub temporal_aspects: TemporalAspects,
}

impl SectorTemplate {
    /// Check the template's invariants
    pub fn validate(&self) -> PlanResult<()> {
        let invalid = |reason: String| PlanError::InvalidTemplate {
            id: self.id.clone(),
            reason,
        };

        let range = &self.investment_range;
        if !(range.min <= range.average && range.average <= range.max) {
            return Err(invalid(format!(
                "investment range must satisfy min <= average <= max (got {} / {} / {})",
                range.min, range.average, range.max
            )));
        }

        if self.revenue_streams.is_empty() {
            return Err(PlanError::missing(format!(
                "revenue streams for sector '{}'",
                self.id
            )));
        }
        check_stream_order(&self.revenue_streams)?;

        let customers = &self.customer_management;
        if !customers.monthly_churn_rate.is_finite() || customers.monthly_churn_rate < 0.0 {
            return Err(invalid(format!(
                "monthly churn rate {} is negative or not finite",
                customers.monthly_churn_rate
            )));
        }
        customers.seasonality.validate().map_err(invalid)?;

        Ok(())
    }

    /// Sum of estimated prices of the itemized startup costs
    pub fn required_items_total(&self) -> f64 {
        self.required_items.iter().map(|item| item.estimated_price).sum()
    }

    pub fn stream(&self, key: &str) -> Option<&RevenueStream> {
        self.revenue_streams.iter().find(|s| s.key == key)
    }

    pub fn cost_item(&self, key: &str) -> Option<&CostItem> {
        self.cost_schedule.iter().find(|c| c.key == key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_templates_are_valid() {
        for template in SectorCatalog::builtin().templates() {
            template.validate().unwrap();
        }
    }

    #[test]
    fn test_investment_range_order_enforced() {
        let mut template = SectorCatalog::builtin().get("gym-fitness").unwrap().clone();
        template.investment_range.average = template.investment_range.max + 1.0;
        assert!(matches!(template.validate(), Err(PlanError::InvalidTemplate { .. })));
    }

    #[test]
    fn test_no_streams_is_missing_input() {
        let mut template = SectorCatalog::builtin().get("generic").unwrap().clone();
        template.revenue_streams.clear();
        assert!(matches!(template.validate(), Err(PlanError::MissingInput { .. })));
    }

    #[test]
    fn test_required_items_total() {
        let catalog = SectorCatalog::builtin();
        let gym = catalog.get("gym-fitness").unwrap();
        assert_eq!(gym.required_items_total(), 116_841.0);
    }
}
