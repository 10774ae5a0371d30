//! Plan-level financial metrics: period totals, NPV, IRR, payback, break-even, returns

use log::warn;
use serde::{Deserialize, Serialize};

use super::irr::{annualize, discounted_payback_period, irr, npv, payback_period};
use crate::error::{PlanError, PlanResult};
use crate::plan::{PlanInputs, DEFAULT_DISCOUNT_RATE, DEFAULT_TAX_RATE};
use crate::projection::MonthlyProjection;

/// Months needed for year-1 aggregates
pub const MIN_MONTHS: usize = 12;

/// Sums over a run of months
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PeriodTotals {
    pub revenue: f64,
    pub costs: f64,
    pub fixed_costs: f64,
    pub variable_costs: f64,
    pub ebitda: f64,
    pub ebit: f64,
    pub interest: f64,
    pub net_income: f64,
    pub free_cash_flow: f64,
}

impl PeriodTotals {
    pub fn from_months(months: &[MonthlyProjection]) -> Self {
        months.iter().fold(Self::default(), |mut t, m| {
            t.revenue += m.total_revenue;
            t.costs += m.total_cost;
            t.fixed_costs += m.total_fixed_cost;
            t.variable_costs += m.total_variable_cost;
            t.ebitda += m.ebitda;
            t.ebit += m.ebit;
            t.interest += m.interest;
            t.net_income += m.net_income;
            t.free_cash_flow += m.free_cash_flow;
            t
        })
    }

    pub fn gross_margin(&self) -> f64 {
        ratio(self.revenue - self.variable_costs, self.revenue)
    }

    pub fn ebitda_margin(&self) -> f64 {
        ratio(self.ebitda, self.revenue)
    }

    pub fn net_margin(&self) -> f64 {
        ratio(self.net_income, self.revenue)
    }
}

/// `num / den`, or 0 when the denominator is 0 or the result is not finite
pub(crate) fn ratio(num: f64, den: f64) -> f64 {
    if den == 0.0 {
        return 0.0;
    }
    let r = num / den;
    if r.is_finite() {
        r
    } else {
        0.0
    }
}

/// Months of plan year `year` (1-indexed), if fully projected
pub fn year_slice(months: &[MonthlyProjection], year: usize) -> Option<&[MonthlyProjection]> {
    let end = year * 12;
    if year == 0 || months.len() < end {
        return None;
    }
    Some(&months[end - 12..end])
}

/// Plan-level financial metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialMetrics {
    pub months: usize,
    pub initial_investment: f64,
    pub discount_rate: f64,

    pub year1: PeriodTotals,
    /// Months 25-36, when projected
    pub year3: Option<PeriodTotals>,
    pub horizon: PeriodTotals,

    pub gross_margin_year1: f64,
    pub ebitda_margin_year1: f64,
    pub net_margin_year1: f64,
    pub average_monthly_revenue_year1: f64,
    pub average_monthly_cost_year1: f64,
    /// Cumulative cash position after month 12
    pub closing_cash_year1: f64,

    pub npv: f64,
    /// Per-month IRR; `None` when undefined
    pub irr_monthly: Option<f64>,
    pub irr_annual: Option<f64>,
    pub payback_month: Option<u32>,
    pub discounted_payback_month: Option<u32>,
    pub break_even_month: Option<u32>,
    pub break_even_customers: Option<u32>,

    /// Year-1 EBITDA over initial investment
    pub roi: f64,
    /// Year-1 net income over equity; `None` when equity is not positive
    pub roe: Option<f64>,
    pub roa: f64,
    pub roic: f64,
}

/// Computes `FinancialMetrics` from a projected month sequence
#[derive(Debug, Clone)]
pub struct FinancialMetricsEngine {
    initial_investment: f64,
    discount_rate: f64,
    equity: f64,
    tax_rate: f64,
}

impl FinancialMetricsEngine {
    pub fn new(initial_investment: f64) -> Self {
        Self {
            initial_investment,
            discount_rate: DEFAULT_DISCOUNT_RATE,
            equity: initial_investment,
            tax_rate: DEFAULT_TAX_RATE,
        }
    }

    pub fn from_inputs(inputs: &PlanInputs) -> Self {
        Self::new(inputs.initial_investment)
            .with_discount_rate(inputs.financing.discount_rate)
            .with_equity(inputs.initial_investment - inputs.loan_principal())
            .with_tax_rate(inputs.financing.tax_rate)
    }

    pub fn with_discount_rate(mut self, rate: f64) -> Self {
        self.discount_rate = rate;
        self
    }

    pub fn with_equity(mut self, equity: f64) -> Self {
        self.equity = equity;
        self
    }

    pub fn with_tax_rate(mut self, rate: f64) -> Self {
        self.tax_rate = rate;
        self
    }

    /// Compute the metrics; at least a full year of months is required
    pub fn compute(&self, months: &[MonthlyProjection]) -> PlanResult<FinancialMetrics> {
        let year1_months = year_slice(months, 1).ok_or(PlanError::InsufficientHorizon {
            months: months.len(),
            required: MIN_MONTHS,
        })?;

        let year1 = PeriodTotals::from_months(year1_months);
        let year3 = year_slice(months, 3).map(PeriodTotals::from_months);
        let horizon = PeriodTotals::from_months(months);

        let cashflows: Vec<f64> = std::iter::once(-self.initial_investment)
            .chain(months.iter().map(|m| m.free_cash_flow))
            .collect();

        let npv = npv(self.discount_rate, &cashflows);
        let irr_monthly = irr(&cashflows);
        if irr_monthly.is_none() {
            warn!("IRR undefined for the projected cash flows");
        }

        let break_even = months.iter().find(|m| m.ebitda > 0.0);

        let investment = self.initial_investment;
        let roe = if self.equity > 0.0 { Some(year1.net_income / self.equity) } else { None };

        Ok(FinancialMetrics {
            months: months.len(),
            initial_investment: investment,
            discount_rate: self.discount_rate,
            year1,
            year3,
            horizon,
            gross_margin_year1: year1.gross_margin(),
            ebitda_margin_year1: year1.ebitda_margin(),
            net_margin_year1: year1.net_margin(),
            average_monthly_revenue_year1: year1.revenue / 12.0,
            average_monthly_cost_year1: year1.costs / 12.0,
            closing_cash_year1: year1_months[11].cumulative_cash_flow,
            npv,
            irr_monthly,
            irr_annual: irr_monthly.map(annualize),
            payback_month: payback_period(&cashflows),
            discounted_payback_month: discounted_payback_period(self.discount_rate, &cashflows),
            break_even_month: break_even.map(|m| m.month),
            break_even_customers: break_even.map(|m| m.active_customers),
            roi: ratio(year1.ebitda, investment),
            roe,
            roa: ratio(year1.net_income, investment),
            roic: ratio(year1.ebit * (1.0 - self.tax_rate), investment),
        })
    }
}
