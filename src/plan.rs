//! Plan configuration: user overrides, financing terms and resolved inputs
//!
//! `PlanOverrides` is the editable layer a user applies on top of a sector
//! template. `PlanInputs::resolve` merges the two into the fully materialized
//! parameter set the projectors consume.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{Datelike, NaiveDate};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::{PlanError, PlanResult};
use crate::sector::{
    check_stream_order, CostItem, CostRule, KpiBenchmark, OperationalCost, RevenueStream,
    Seasonality, SectorTemplate, StructuredCost, TemporalAspects,
};

/// Default projection horizon in months
pub const DEFAULT_HORIZON_MONTHS: u32 = 36;

/// Default per-period discount rate for NPV
pub const DEFAULT_DISCOUNT_RATE: f64 = 0.12;

/// Default corporate tax rate on positive pre-tax income
pub const DEFAULT_TAX_RATE: f64 = 0.25;

/// Straight-line depreciation period (10 years)
pub const DEFAULT_DEPRECIATION_MONTHS: u32 = 120;

/// Plan start used when no date is given
pub fn default_start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 1).unwrap_or_default()
}

/// Customer-management overrides; unset fields keep the template value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomerOverrides {
    pub initial_customers: Option<u32>,
    pub monthly_growth_base: Option<f64>,
    pub monthly_churn_rate: Option<f64>,
    pub seasonality: Option<Seasonality>,
    pub pre_opening_customers: Option<u32>,
    pub ramp_up_months: Option<u32>,
    pub ramp_up_initial_factor: Option<f64>,
    pub max_capacity: Option<u32>,
    pub floor_area_m2: Option<f64>,
}

/// Per-cost-item override of the base and variable parts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostOverride {
    pub base: Option<f64>,
    pub variable_per_customer: Option<f64>,
    pub percent_of_revenue: Option<f64>,
}

impl CostOverride {
    fn apply(&self, item: &mut CostItem) {
        // A flat item that gains a variable part becomes structured
        if self.variable_per_customer.is_some() || self.percent_of_revenue.is_some() {
            if let CostRule::Flat(amount) = item.rule {
                item.rule = CostRule::Structured(StructuredCost { base: amount, ..Default::default() });
            }
        }

        match &mut item.rule {
            CostRule::Flat(amount) => {
                if let Some(base) = self.base {
                    *amount = base;
                }
            }
            CostRule::Structured(rule) => {
                if let Some(base) = self.base {
                    rule.base = base;
                    rule.schedule_by_quarter = None;
                }
                if self.variable_per_customer.is_some() {
                    rule.variable_per_customer = self.variable_per_customer;
                }
                if self.percent_of_revenue.is_some() {
                    rule.percent_of_revenue = self.percent_of_revenue;
                }
            }
        }
    }
}

/// Amortizing loan terms
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanParams {
    pub principal: f64,
    /// Nominal annual rate, compounded monthly
    pub annual_rate: f64,
    pub term_months: u32,
    /// Fixed payment; the annuity payment when absent
    #[serde(default)]
    pub monthly_payment: Option<f64>,
}

/// One month of the amortization schedule
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoanPayment {
    pub month: u32,
    pub payment: f64,
    pub interest: f64,
    pub principal: f64,
    pub closing_balance: f64,
}

impl LoanParams {
    pub fn monthly_rate(&self) -> f64 {
        self.annual_rate / 12.0
    }

    /// Monthly payment: the declared one or the level annuity payment
    pub fn payment(&self) -> f64 {
        if let Some(payment) = self.monthly_payment {
            return payment;
        }
        if self.term_months == 0 || self.principal <= 0.0 {
            return 0.0;
        }
        let r = self.monthly_rate();
        let n = self.term_months as i32;
        if r.abs() < 1e-12 {
            self.principal / n as f64
        } else {
            self.principal * r / (1.0 - (1.0 + r).powi(-n))
        }
    }

    /// Amortization over `months`; zero rows once the loan is repaid
    pub fn schedule(&self, months: u32) -> Vec<LoanPayment> {
        let r = self.monthly_rate();
        let level = self.payment();
        let mut balance = self.principal.max(0.0);

        (1..=months)
            .map(|month| {
                if month > self.term_months || balance <= 1e-9 {
                    return LoanPayment { month, payment: 0.0, interest: 0.0, principal: 0.0, closing_balance: balance.max(0.0) };
                }
                let interest = balance * r;
                // Final instalment clears the balance
                let payment = if month == self.term_months {
                    balance + interest
                } else {
                    level.min(balance + interest)
                };
                let principal = payment - interest;
                balance -= principal;
                LoanPayment { month, payment, interest, principal, closing_balance: balance.max(0.0) }
            })
            .collect()
    }
}

fn default_discount_rate() -> f64 {
    DEFAULT_DISCOUNT_RATE
}

fn default_tax_rate() -> f64 {
    DEFAULT_TAX_RATE
}

fn default_depreciation_months() -> u32 {
    DEFAULT_DEPRECIATION_MONTHS
}

/// Investment, debt and valuation parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancingParams {
    /// Falls back to the template's average investment
    #[serde(default)]
    pub initial_investment: Option<f64>,
    #[serde(default)]
    pub loan: Option<LoanParams>,
    #[serde(default = "default_discount_rate")]
    pub discount_rate: f64,
    #[serde(default = "default_tax_rate")]
    pub tax_rate: f64,
    #[serde(default)]
    pub capital_reinvestment_monthly: f64,
    #[serde(default = "default_depreciation_months")]
    pub depreciation_months: u32,
}

impl Default for FinancingParams {
    fn default() -> Self {
        Self {
            initial_investment: None,
            loan: None,
            discount_rate: DEFAULT_DISCOUNT_RATE,
            tax_rate: DEFAULT_TAX_RATE,
            capital_reinvestment_monthly: 0.0,
            depreciation_months: DEFAULT_DEPRECIATION_MONTHS,
        }
    }
}

fn default_horizon() -> u32 {
    DEFAULT_HORIZON_MONTHS
}

/// User overrides applied on top of a sector template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanOverrides {
    #[serde(default = "default_horizon")]
    pub horizon_months: u32,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub customers: CustomerOverrides,
    /// stream key → new price
    #[serde(default)]
    pub stream_prices: BTreeMap<String, f64>,
    /// Extra streams; a key already in the template replaces that stream
    #[serde(default)]
    pub custom_streams: Vec<RevenueStream>,
    /// cost key → base/variable override
    #[serde(default)]
    pub cost_overrides: BTreeMap<String, CostOverride>,
    #[serde(default)]
    pub operational_costs: Vec<OperationalCost>,
    #[serde(default)]
    pub financing: FinancingParams,
}

impl Default for PlanOverrides {
    fn default() -> Self {
        Self {
            horizon_months: DEFAULT_HORIZON_MONTHS,
            start_date: None,
            customers: CustomerOverrides::default(),
            stream_prices: BTreeMap::new(),
            custom_streams: Vec::new(),
            cost_overrides: BTreeMap::new(),
            operational_costs: Vec::new(),
            financing: FinancingParams::default(),
        }
    }
}

impl PlanOverrides {
    pub fn from_json_str(json: &str) -> PlanResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_path<P: AsRef<Path>>(path: P) -> PlanResult<Self> {
        let data = std::fs::read_to_string(path)?;
        Self::from_json_str(&data)
    }

    pub fn with_horizon(mut self, months: u32) -> Self {
        self.horizon_months = months;
        self
    }

    pub fn with_loan(mut self, loan: LoanParams) -> Self {
        self.financing.loan = Some(loan);
        self
    }
}

/// Fully resolved parameters for one plan computation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanInputs {
    pub sector_id: String,
    pub horizon_months: u32,
    pub start_date: NaiveDate,
    pub initial_customers: u32,
    pub monthly_growth_base: f64,
    pub monthly_churn_rate: f64,
    pub seasonality: Seasonality,
    pub year1_target: Option<u32>,
    pub temporal: TemporalAspects,
    pub streams: Vec<RevenueStream>,
    pub cost_schedule: Vec<CostItem>,
    pub operational_costs: Vec<OperationalCost>,
    pub kpi_benchmarks: BTreeMap<String, KpiBenchmark>,
    pub initial_investment: f64,
    pub financing: FinancingParams,
}

impl PlanInputs {
    /// Merge a template with user overrides
    pub fn resolve(template: &SectorTemplate, overrides: &PlanOverrides) -> PlanResult<Self> {
        let cm = &template.customer_management;
        let co = &overrides.customers;

        let mut temporal = template.temporal_aspects.clone();
        if let Some(pre) = co.pre_opening_customers {
            temporal.pre_opening_customers = pre;
        }
        if let Some(months) = co.ramp_up_months {
            temporal.ramp_up_months = months;
        }
        if let Some(factor) = co.ramp_up_initial_factor {
            temporal.ramp_up_initial_factor = factor;
        }
        if co.max_capacity.is_some() {
            temporal.max_capacity = co.max_capacity;
        }
        if co.floor_area_m2.is_some() {
            temporal.floor_area_m2 = co.floor_area_m2;
        }

        let mut streams = template.revenue_streams.clone();
        for custom in &overrides.custom_streams {
            match streams.iter_mut().find(|s| s.key == custom.key) {
                Some(existing) => *existing = custom.clone(),
                None => streams.push(custom.clone()),
            }
        }
        for (key, price) in &overrides.stream_prices {
            match streams.iter_mut().find(|s| &s.key == key) {
                Some(stream) => stream.formula.set_price(*price),
                None => warn!("Price override for unknown stream '{}' ignored", key),
            }
        }
        if streams.is_empty() {
            return Err(PlanError::missing(format!(
                "revenue streams for sector '{}'",
                template.id
            )));
        }
        check_stream_order(&streams)?;

        let mut cost_schedule = template.cost_schedule.clone();
        for (key, cost_override) in &overrides.cost_overrides {
            match cost_schedule.iter_mut().find(|c| &c.key == key) {
                Some(item) => cost_override.apply(item),
                None => warn!("Cost override for unknown item '{}' ignored", key),
            }
        }

        let initial_investment = overrides
            .financing
            .initial_investment
            .unwrap_or(template.investment_range.average);

        let inputs = Self {
            sector_id: template.id.clone(),
            horizon_months: overrides.horizon_months,
            start_date: overrides.start_date.unwrap_or_else(default_start_date),
            initial_customers: co.initial_customers.unwrap_or(cm.initial_customers),
            monthly_growth_base: co.monthly_growth_base.unwrap_or(cm.monthly_growth_base),
            monthly_churn_rate: co.monthly_churn_rate.unwrap_or(cm.monthly_churn_rate),
            seasonality: co.seasonality.unwrap_or(cm.seasonality),
            year1_target: cm.year1_target,
            temporal,
            streams,
            cost_schedule,
            operational_costs: overrides.operational_costs.clone(),
            kpi_benchmarks: template.operational_kpis.clone(),
            initial_investment,
            financing: overrides.financing.clone(),
        };
        inputs.validate()?;
        Ok(inputs)
    }

    fn validate(&self) -> PlanResult<()> {
        let invalid = |reason: String| PlanError::InvalidTemplate {
            id: self.sector_id.clone(),
            reason,
        };
        if !self.monthly_churn_rate.is_finite() || self.monthly_churn_rate < 0.0 {
            return Err(invalid(format!("monthly churn rate {} is negative or not finite", self.monthly_churn_rate)));
        }
        if !self.monthly_growth_base.is_finite() || self.monthly_growth_base < 0.0 {
            return Err(invalid(format!("monthly growth {} is negative or not finite", self.monthly_growth_base)));
        }
        if !self.initial_investment.is_finite() || self.initial_investment < 0.0 {
            return Err(invalid(format!("initial investment {} is negative or not finite", self.initial_investment)));
        }
        self.seasonality.validate().map_err(invalid)?;
        Ok(())
    }

    /// Calendar month (1-12) of the plan start
    pub fn start_month(&self) -> u32 {
        self.start_date.month()
    }

    /// Principal borrowed, 0 without a loan
    pub fn loan_principal(&self) -> f64 {
        self.financing.loan.as_ref().map(|l| l.principal).unwrap_or(0.0)
    }
}

/// Multiplicative stress applied to resolved inputs
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScenarioAdjustment {
    pub price_factor: f64,
    pub churn_factor: f64,
    pub fixed_cost_factor: f64,
}

impl ScenarioAdjustment {
    pub const PESSIMISTIC: Self = Self { price_factor: 0.85, churn_factor: 1.25, fixed_cost_factor: 1.10 };
    pub const BASE: Self = Self { price_factor: 1.0, churn_factor: 1.0, fixed_cost_factor: 1.0 };
    pub const OPTIMISTIC: Self = Self { price_factor: 1.15, churn_factor: 0.75, fixed_cost_factor: 0.90 };

    /// Scale prices, churn and fixed cost amounts in place
    pub fn apply(&self, inputs: &mut PlanInputs) {
        for stream in &mut inputs.streams {
            if let Some(price) = stream.formula.price() {
                stream.formula.set_price(price * self.price_factor);
            }
        }

        inputs.monthly_churn_rate *= self.churn_factor;

        let f = self.fixed_cost_factor;
        for item in &mut inputs.cost_schedule {
            match &mut item.rule {
                CostRule::Flat(amount) => *amount *= f,
                CostRule::Structured(rule) => {
                    rule.base *= f;
                    if let Some(tiers) = rule.schedule_by_quarter.as_mut() {
                        tiers.iter_mut().for_each(|t| *t *= f);
                    }
                    if let Some(peak) = rule.peak_amount.as_mut() {
                        *peak *= f;
                    }
                }
            }
        }
        for cost in &mut inputs.operational_costs {
            cost.base_amount *= f;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sector::{SectorCatalog, StreamFormula};
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_annuity_payment() {
        let loan = LoanParams { principal: 100_000.0, annual_rate: 0.06, term_months: 60, monthly_payment: None };
        assert_abs_diff_eq!(loan.payment(), 1_933.28, epsilon = 0.01);

        let schedule = loan.schedule(72);
        assert_eq!(schedule.len(), 72);
        assert_abs_diff_eq!(schedule[0].interest, 500.0, epsilon = 1e-9);
        assert_abs_diff_eq!(schedule[59].closing_balance, 0.0, epsilon = 1e-6);
        assert_eq!(schedule[60].payment, 0.0);
        let repaid: f64 = schedule.iter().map(|p| p.principal).sum();
        assert_abs_diff_eq!(repaid, 100_000.0, epsilon = 1e-6);
    }

    #[test]
    fn test_zero_rate_loan_is_straight_line() {
        let loan = LoanParams { principal: 12_000.0, annual_rate: 0.0, term_months: 12, monthly_payment: None };
        assert_abs_diff_eq!(loan.payment(), 1_000.0, epsilon = 1e-9);
        assert!(loan.schedule(12).iter().all(|p| p.interest == 0.0));
    }

    #[test]
    fn test_overrides_from_partial_json() {
        let overrides = PlanOverrides::from_json_str(
            r#"{"customers": {"monthly_churn_rate": 0.1}, "financing": {"initial_investment": 90000}}"#,
        )
        .unwrap();
        assert_eq!(overrides.horizon_months, 36);
        assert_eq!(overrides.customers.monthly_churn_rate, Some(0.1));
        assert_eq!(overrides.financing.discount_rate, 0.12);
        assert_eq!(overrides.financing.depreciation_months, 120);
    }

    #[test]
    fn test_resolve_applies_overrides() {
        let catalog = SectorCatalog::builtin();
        let gym = catalog.get("gym-fitness").unwrap();
        let mut overrides = PlanOverrides::default();
        overrides.stream_prices.insert("monthly_fee".into(), 50.0);
        overrides.cost_overrides.insert(
            "utilities".into(),
            CostOverride { base: Some(2_000.0), variable_per_customer: Some(1.0), percent_of_revenue: None },
        );

        let inputs = PlanInputs::resolve(gym, &overrides).unwrap();
        assert_eq!(inputs.initial_investment, 115_000.0);
        assert_eq!(inputs.start_month(), 1);
        assert_eq!(
            inputs.streams[0].formula,
            StreamFormula::Subscription { base_price: 50.0 }
        );
        let utilities = inputs.cost_schedule.iter().find(|c| c.key == "utilities").unwrap();
        match &utilities.rule {
            CostRule::Structured(rule) => {
                assert_eq!(rule.base, 2_000.0);
                assert_eq!(rule.variable_per_customer, Some(1.0));
            }
            other => panic!("expected structured rule, got {:?}", other),
        }
    }

    #[test]
    fn test_custom_stream_replaces_same_key() {
        let catalog = SectorCatalog::builtin();
        let generic = catalog.get("generic").unwrap();
        let mut overrides = PlanOverrides::default();
        overrides.custom_streams.push(RevenueStream::new(
            "main_revenue",
            "Main",
            StreamFormula::Subscription { base_price: 30.0 },
        ));
        let inputs = PlanInputs::resolve(generic, &overrides).unwrap();
        assert_eq!(inputs.streams.len(), 1);
        assert_eq!(inputs.streams[0].formula.price(), Some(30.0));
    }

    #[test]
    fn test_negative_churn_rejected() {
        let catalog = SectorCatalog::builtin();
        let mut overrides = PlanOverrides::default();
        overrides.customers.monthly_churn_rate = Some(-0.1);
        let err = PlanInputs::resolve(catalog.get("generic").unwrap(), &overrides).unwrap_err();
        assert!(matches!(err, PlanError::InvalidTemplate { .. }));
    }

    #[test]
    fn test_pessimistic_adjustment() {
        let catalog = SectorCatalog::builtin();
        let mut inputs = PlanInputs::resolve(catalog.get("gym-fitness").unwrap(), &PlanOverrides::default()).unwrap();
        ScenarioAdjustment::PESSIMISTIC.apply(&mut inputs);

        assert_abs_diff_eq!(inputs.monthly_churn_rate, 0.10, epsilon = 1e-12);
        assert_eq!(inputs.streams[0].formula.price(), Some(45.0 * 0.85));
        let staff = inputs.cost_schedule.iter().find(|c| c.key == "staff").unwrap();
        match &staff.rule {
            CostRule::Structured(rule) => {
                let tiers = rule.schedule_by_quarter.as_ref().unwrap();
                assert_abs_diff_eq!(tiers[1], 815.0 * 1.10, epsilon = 1e-9);
            }
            other => panic!("expected structured rule, got {:?}", other),
        }
    }
}
