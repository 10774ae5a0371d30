//! Core projection engine for monthly business-plan projections

use log::{debug, info};

use super::cashflows::{MonthlyProjection, ProjectionResult};
use super::costs::{CostProjector, MonthlyCost};
use super::customers::{CustomerProjector, MonthlyCustomers};
use super::revenue::{MonthlyRevenue, RevenueProjector};
use super::state::ProjectionState;
use crate::error::PlanResult;
use crate::metrics::{
    compute_kpis, ratio, year_slice, BankingAndRatingEngine, BusinessRating, CostSummary,
    CustomerSummary, FinancialMetricsEngine, PnlPolicy, RevenueSummary,
};
use crate::plan::{LoanPayment, PlanInputs, PlanOverrides};
use crate::sector::{SectorCatalog, SectorTemplate};

/// Main projection engine
pub struct ProjectionEngine {
    catalog: SectorCatalog,
}

impl Default for ProjectionEngine {
    fn default() -> Self {
        Self::new(SectorCatalog::builtin())
    }
}

impl ProjectionEngine {
    /// Create an engine over a fixed sector catalog
    pub fn new(catalog: SectorCatalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &SectorCatalog {
        &self.catalog
    }

    /// Project a plan for a catalog sector
    pub fn compute(&self, sector_id: &str, overrides: &PlanOverrides) -> PlanResult<ProjectionResult> {
        let template = self.catalog.get(sector_id)?;
        Self::compute_template(template, overrides)
    }

    pub fn compute_template(template: &SectorTemplate, overrides: &PlanOverrides) -> PlanResult<ProjectionResult> {
        let inputs = PlanInputs::resolve(template, overrides)?;
        Self::compute_inputs(&inputs)
    }

    /// Project resolved inputs and derive every plan-level metric
    pub fn compute_inputs(inputs: &PlanInputs) -> PlanResult<ProjectionResult> {
        let months = Self::project_months(inputs)?;

        let financial = FinancialMetricsEngine::from_inputs(inputs).compute(&months)?;
        let banking = BankingAndRatingEngine::compute(&financial, inputs.financing.loan.as_ref());

        // compute() above already rejected horizons shorter than a year
        let year1 = year_slice(&months, 1).unwrap_or(&months[..]);
        let stream_keys: Vec<String> = inputs.streams.iter().map(|s| s.key.clone()).collect();
        let customers = CustomerSummary::compute(&months, year1, inputs.year1_target);
        let revenue = RevenueSummary::compute(&months, year1, &stream_keys);
        let costs = CostSummary::compute(year1, year1.iter().map(|m| m.seasonal_cost).sum());
        let kpis = compute_kpis(year1, inputs, &financial, &customers, &revenue);
        let rating = BusinessRating::compute(&financial, banking.ratios.dscr, &kpis, &customers, &revenue);

        info!(
            "Plan {}: {} months, year-1 revenue {:.0}, NPV {:.0}, credit {} / business {}",
            inputs.sector_id,
            months.len(),
            financial.year1.revenue,
            financial.npv,
            banking.rating.grade,
            rating.grade,
        );

        Ok(ProjectionResult {
            sector_id: inputs.sector_id.clone(),
            initial_investment: inputs.initial_investment,
            months,
            financial,
            banking,
            customers,
            revenue,
            costs,
            kpis,
            rating,
        })
    }

    /// Run the monthly pipeline: customers, revenue, costs, then P&L and cash
    pub fn project_months(inputs: &PlanInputs) -> PlanResult<Vec<MonthlyProjection>> {
        let horizon = inputs.horizon_months;
        let customers = CustomerProjector::from_inputs(inputs).project(horizon);
        let revenue = RevenueProjector::new(inputs.streams.clone())?.project(&customers);
        let costs = CostProjector::from_inputs(inputs).project(&customers, &revenue);
        let loan_schedule = inputs
            .financing
            .loan
            .as_ref()
            .map(|loan| loan.schedule(horizon))
            .unwrap_or_default();

        let pnl = PnlPolicy::from_inputs(inputs);
        let mut state = ProjectionState::from_inputs(inputs);
        let mut rows = Vec::with_capacity(customers.len());

        for (i, ((c, r), k)) in customers.iter().zip(&revenue).zip(&costs).enumerate() {
            state.advance_month();
            let row = Self::calculate_month(&pnl, &mut state, c, r, k, loan_schedule.get(i));
            debug!(
                "Month {}: active {}, revenue {:.0}, cost {:.0}, cumulative cash {:.0}",
                row.month, row.active_customers, row.total_revenue, row.total_cost, row.cumulative_cash_flow
            );
            rows.push(row);
        }

        Ok(rows)
    }

    /// Build one month's row and fold its cash flow into the state
    fn calculate_month(
        pnl: &PnlPolicy,
        state: &mut ProjectionState,
        customers: &MonthlyCustomers,
        revenue: &MonthlyRevenue,
        cost: &MonthlyCost,
        payment: Option<&LoanPayment>,
    ) -> MonthlyProjection {
        let interest = payment.map(|p| p.interest).unwrap_or(0.0);
        if let Some(p) = payment {
            state.loan_balance = p.closing_balance;
        }

        let statement = pnl.statement(revenue.total, cost.total, interest);
        let cumulative_cash_flow = state.record_cash_flow(statement.free_cash_flow);

        let active = customers.active_customers as f64;
        let contribution_margin = revenue.total - cost.total_variable;
        let unit_margin = ratio(contribution_margin, active);
        let break_even_customers = if cost.total_fixed > 0.0 && unit_margin > 0.0 {
            cost.total_fixed / unit_margin
        } else {
            0.0
        };

        MonthlyProjection {
            month: state.projection_month,
            plan_year: state.plan_year,
            year: state.year(),
            calendar_month: state.calendar_month(),
            quarter: state.quarter(),
            seasonal_factor: customers.seasonal_factor,

            new_customers: customers.new_customers,
            lost_customers: customers.lost_customers,
            net_customers: customers.net_customers,
            active_customers: customers.active_customers,
            retention_rate: customers.retention_rate,

            revenue_by_stream: revenue.by_stream.clone(),
            total_revenue: revenue.total,

            cost_by_category: cost.by_category.clone(),
            total_fixed_cost: cost.total_fixed,
            total_variable_cost: cost.total_variable,
            total_cost: cost.total,
            seasonal_cost: cost.lines.iter().filter(|l| l.seasonal).map(|l| l.total()).sum(),

            gross_margin: ratio(contribution_margin, revenue.total),
            ebitda: statement.ebitda,
            ebitda_margin: statement.ebitda_margin,
            depreciation: statement.depreciation,
            ebit: statement.ebit,
            interest: statement.interest,
            pre_tax_income: statement.pre_tax_income,
            tax: statement.tax,
            net_income: statement.net_income,

            operating_cash_flow: statement.operating_cash_flow,
            capital_reinvestment: statement.capital_reinvestment,
            free_cash_flow: statement.free_cash_flow,
            cumulative_cash_flow,
            loan_balance: state.loan_balance,

            revenue_per_customer: ratio(revenue.total, active),
            cost_per_customer: ratio(cost.total, active),
            contribution_margin,
            break_even_customers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlanError;
    use crate::metrics::irr::npv;
    use crate::plan::LoanParams;

    /// Generic template with 12 customers paying 50 and no costs
    fn flat_subscription(investment: f64) -> PlanOverrides {
        let mut overrides = PlanOverrides::default();
        overrides.stream_prices.insert("main_revenue".into(), 50.0);
        overrides.customers.initial_customers = Some(12);
        overrides.customers.monthly_growth_base = Some(0.0);
        overrides.customers.monthly_churn_rate = Some(0.0);
        overrides.financing.initial_investment = Some(investment);
        overrides
    }

    #[test]
    fn test_flat_subscription_plan() {
        let engine = ProjectionEngine::default();
        let result = engine.compute("generic", &flat_subscription(0.0)).unwrap();

        assert_eq!(result.months.len(), 36);
        for m in &result.months {
            assert_eq!(m.active_customers, 12);
            assert_eq!(m.total_revenue, 600.0);
            assert_eq!(m.total_cost, 0.0);
            assert_eq!(m.ebitda, 600.0);
        }
        assert_eq!(result.financial.break_even_month, Some(1));
        assert_eq!(result.financial.year1.revenue, 7_200.0);
    }

    #[test]
    fn test_break_even_is_first_month_with_positive_ebitda() {
        // 10 new members a month at 50 against 2,000 of fixed cost
        let mut overrides = flat_subscription(0.0);
        overrides.customers.initial_customers = Some(0);
        overrides.customers.monthly_growth_base = Some(10.0);
        overrides.cost_overrides.insert(
            "general_expenses".into(),
            crate::plan::CostOverride { base: Some(2_000.0), ..Default::default() },
        );

        let result = ProjectionEngine::default().compute("generic", &overrides).unwrap();
        let ebitda: Vec<f64> = result.months.iter().map(|m| m.ebitda).collect();
        assert!(ebitda.windows(2).all(|w| w[1] >= w[0]));
        assert_eq!(&ebitda[..5], &[-1_500.0, -1_000.0, -500.0, 0.0, 500.0]);

        // Zero EBITDA in month 4 does not count
        assert_eq!(result.financial.break_even_month, Some(5));
        assert_eq!(result.financial.break_even_customers, Some(50));
        let first_positive = result.months.iter().find(|m| m.ebitda > 0.0).map(|m| m.month);
        assert_eq!(result.financial.break_even_month, first_positive);
    }

    #[test]
    fn test_cash_continuity() {
        let engine = ProjectionEngine::default();
        let result = engine.compute("gym-fitness", &PlanOverrides::default()).unwrap();

        let cumulative = result.cumulative_cash_flow();
        assert_eq!(cumulative[0], -result.initial_investment);
        for (i, m) in result.months.iter().enumerate() {
            approx::assert_abs_diff_eq!(cumulative[i + 1], cumulative[i] + m.free_cash_flow, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_revenue_and_cost_totals_match_breakdowns() {
        let engine = ProjectionEngine::default();
        for id in ["gym-fitness", "restaurant", "rural-hotel"] {
            let result = engine.compute(id, &PlanOverrides::default()).unwrap();
            for m in &result.months {
                let streams: f64 = m.revenue_by_stream.values().sum();
                let categories: f64 = m.cost_by_category.values().sum();
                approx::assert_abs_diff_eq!(m.total_revenue, streams, epsilon = 1e-9);
                approx::assert_abs_diff_eq!(m.total_cost, categories, epsilon = 1e-9);
                approx::assert_abs_diff_eq!(m.total_cost, m.total_fixed_cost + m.total_variable_cost, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn test_npv_vanishes_at_irr() {
        let engine = ProjectionEngine::default();
        let result = engine.compute("generic", &flat_subscription(10_000.0)).unwrap();

        let irr = result.financial.irr_monthly.expect("cash flows change sign");
        assert!(npv(irr, &result.cash_flows()).abs() < 1e-4);
        assert_eq!(result.financial.payback_month, Some(22));
    }

    #[test]
    fn test_horizon_shorter_than_a_year() {
        let engine = ProjectionEngine::default();
        let err = engine.compute("gym-fitness", &PlanOverrides::default().with_horizon(6)).unwrap_err();
        assert!(matches!(err, PlanError::InsufficientHorizon { months: 6, required: 12 }));
    }

    #[test]
    fn test_every_builtin_sector_computes() {
        let engine = ProjectionEngine::default();
        let ids: Vec<String> = engine.catalog().ids().map(String::from).collect();
        for id in ids {
            let result = engine.compute(&id, &PlanOverrides::default()).unwrap();
            assert_eq!(result.months.len(), 36, "{}", id);
            assert!(result.rating.score <= 100, "{}", id);
            assert!(result.banking.rating.score <= 100, "{}", id);
        }
    }

    #[test]
    fn test_loan_interest_reduces_pre_tax_income() {
        let engine = ProjectionEngine::default();
        let base = engine.compute("gym-fitness", &PlanOverrides::default()).unwrap();
        let loan = LoanParams { principal: 60_000.0, annual_rate: 0.06, term_months: 60, monthly_payment: None };
        let levered = engine
            .compute("gym-fitness", &PlanOverrides::default().with_loan(loan))
            .unwrap();

        let first = &levered.months[0];
        assert!(first.interest > 0.0);
        approx::assert_abs_diff_eq!(first.interest, 300.0, epsilon = 1e-9);
        approx::assert_abs_diff_eq!(
            first.pre_tax_income,
            base.months[0].pre_tax_income - first.interest,
            epsilon = 1e-9
        );
        assert!(first.loan_balance < 60_000.0);
        assert!(levered.banking.ratios.dscr.is_some());
        assert!(base.banking.ratios.dscr.is_none());
    }

    #[test]
    fn test_unknown_sector() {
        let engine = ProjectionEngine::default();
        assert!(matches!(
            engine.compute("bakery", &PlanOverrides::default()),
            Err(PlanError::UnknownSector { .. })
        ));
    }
}
