//! Revenue-stream formulas and cost rules
//!
//! Templates declare streams and cost items against a closed set of formula
//! families. Projectors dispatch on these enums instead of on stream names.

use serde::{Deserialize, Serialize};

use crate::error::{PlanError, PlanResult};

fn default_days_in_month() -> f64 {
    30.0
}

/// How a revenue stream turns a month's customer counts into money
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "formula", rename_all = "snake_case")]
pub enum StreamFormula {
    /// active customers × base price
    Subscription { base_price: f64 },

    /// new customers × price (registration fees, key deposits)
    PerNewCustomer { price: f64 },

    /// round(active × cohort fraction) × units per month × unit price
    CohortAddOn {
        cohort_fraction: f64,
        units_per_month: f64,
        unit_price: f64,
    },

    /// −(round(active × discount fraction) × base price × discount rate).
    /// Without an explicit base price the first subscription price is used.
    Discount {
        discount_fraction: f64,
        discount_rate: f64,
        #[serde(default)]
        base_price: Option<f64>,
    },

    /// daily volume × days in month × average ticket (covers, sessions)
    VolumeTicket {
        daily_volume: f64,
        #[serde(default = "default_days_in_month")]
        days_in_month: f64,
        average_ticket: f64,
    },

    /// fraction of another stream declared earlier
    PercentOfStream { source: String, fraction: f64 },

    /// visits × conversion rate × average order value
    Funnel {
        visits: f64,
        conversion_rate: f64,
        average_order_value: f64,
    },

    /// rooms × nights × occupancy × nightly rate × seasonal factor
    Occupancy {
        rooms: f64,
        occupancy_rate: f64,
        nightly_rate: f64,
        #[serde(default = "default_days_in_month")]
        nights_in_month: f64,
    },

    /// User-defined fallback
    Custom { basis: CustomBasis, amount: f64 },
}

/// Basis for user-defined streams
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomBasis {
    PerCustomer,
    PerNewCustomer,
    FlatMonthly,
}

impl StreamFormula {
    /// Whether the month's seasonal factor multiplies this stream's result.
    ///
    /// Discounts are not seasonal and occupancy streams embed the factor in
    /// the formula. Every other family, percent-of-stream included, is scaled.
    pub fn applies_seasonality(&self) -> bool {
        !matches!(self, StreamFormula::Discount { .. } | StreamFormula::Occupancy { .. })
    }

    /// The user-editable price of the stream, if the family has one
    pub fn price(&self) -> Option<f64> {
        match self {
            StreamFormula::Subscription { base_price } => Some(*base_price),
            StreamFormula::PerNewCustomer { price } => Some(*price),
            StreamFormula::CohortAddOn { unit_price, .. } => Some(*unit_price),
            StreamFormula::Discount { base_price, .. } => *base_price,
            StreamFormula::VolumeTicket { average_ticket, .. } => Some(*average_ticket),
            StreamFormula::PercentOfStream { .. } => None,
            StreamFormula::Funnel { average_order_value, .. } => Some(*average_order_value),
            StreamFormula::Occupancy { nightly_rate, .. } => Some(*nightly_rate),
            StreamFormula::Custom { amount, .. } => Some(*amount),
        }
    }

    /// Replace the user-editable price. Percent-of-stream has none and is unchanged.
    pub fn set_price(&mut self, new_price: f64) {
        match self {
            StreamFormula::Subscription { base_price } => *base_price = new_price,
            StreamFormula::PerNewCustomer { price } => *price = new_price,
            StreamFormula::CohortAddOn { unit_price, .. } => *unit_price = new_price,
            StreamFormula::Discount { base_price, .. } => *base_price = Some(new_price),
            StreamFormula::VolumeTicket { average_ticket, .. } => *average_ticket = new_price,
            StreamFormula::PercentOfStream { .. } => {}
            StreamFormula::Funnel { average_order_value, .. } => *average_order_value = new_price,
            StreamFormula::Occupancy { nightly_rate, .. } => *nightly_rate = new_price,
            StreamFormula::Custom { amount, .. } => *amount = new_price,
        }
    }
}

/// A named revenue stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueStream {
    pub key: String,
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub formula: StreamFormula,
}

impl RevenueStream {
    pub fn new(key: &str, name: &str, formula: StreamFormula) -> Self {
        Self {
            key: key.to_string(),
            name: name.to_string(),
            formula,
        }
    }
}

/// Percent-of-stream formulas may only reference streams declared before them
pub fn check_stream_order(streams: &[RevenueStream]) -> PlanResult<()> {
    for (idx, stream) in streams.iter().enumerate() {
        if let StreamFormula::PercentOfStream { source, .. } = &stream.formula {
            if !streams[..idx].iter().any(|s| &s.key == source) {
                return Err(PlanError::UnknownStreamDependency {
                    stream: stream.key.clone(),
                    source_stream: source.clone(),
                });
            }
        }
    }
    Ok(())
}

/// Reporting category for a cost line
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CostCategory {
    Operational,
    Rent,
    Personnel,
    Equipment,
    Marketing,
    Legal,
    Supplies,
    #[default]
    Other,
}

/// Monthly cost rule: a flat amount or a structured rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CostRule {
    Flat(f64),
    Structured(StructuredCost),
}

/// Structured cost rule.
///
/// `schedule_by_quarter` replaces `base` when present: tier `i` applies to
/// months `3i+1..=3i+3` and the last tier holds for the rest of the horizon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StructuredCost {
    pub base: f64,
    pub variable_per_customer: Option<f64>,
    pub percent_of_revenue: Option<f64>,
    pub grace_months: Option<u32>,
    pub schedule_by_quarter: Option<Vec<f64>>,
    /// Charged in month 1 only (pre-opening spend)
    pub initial_only: bool,
    /// Multiply by the month's seasonal factor
    pub seasonal: bool,
    /// Replaces `base` in the listed calendar months
    pub peak_amount: Option<f64>,
    pub peak_months: Vec<u32>,
}

/// A line of the template's monthly cost schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostItem {
    pub key: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub category: CostCategory,
    pub rule: CostRule,
}

impl CostItem {
    pub fn flat(key: &str, name: &str, category: CostCategory, amount: f64) -> Self {
        Self {
            key: key.to_string(),
            name: name.to_string(),
            category,
            rule: CostRule::Flat(amount),
        }
    }

    pub fn structured(key: &str, name: &str, category: CostCategory, rule: StructuredCost) -> Self {
        Self {
            key: key.to_string(),
            name: name.to_string(),
            category,
            rule: CostRule::Structured(rule),
        }
    }

    /// Base monthly amount ignoring schedules, peaks and grace
    pub fn base_amount(&self) -> f64 {
        match &self.rule {
            CostRule::Flat(amount) => *amount,
            CostRule::Structured(rule) => rule.base,
        }
    }
}

/// User-editable operational cost: `{baseAmount, variableRate, hasSeasonality}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationalCost {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub category: CostCategory,
    #[serde(default)]
    pub base_amount: f64,
    #[serde(default)]
    pub variable_rate: f64,
    #[serde(default)]
    pub has_seasonality: bool,
}
