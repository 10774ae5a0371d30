//! Projection output structures

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::PlanResult;
use crate::metrics::{
    BankingAssessment, BusinessRating, CostSummary, CustomerSummary, FinancialMetrics, Kpi,
    RevenueSummary,
};
use crate::sector::CostCategory;

/// A single row of projection output for one month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyProjection {
    // Timing
    pub month: u32,
    pub plan_year: u32,
    pub year: i32,
    pub calendar_month: u32,
    pub quarter: u32,
    pub seasonal_factor: f64,

    // Customers
    pub new_customers: u32,
    pub lost_customers: u32,
    pub net_customers: i64,
    pub active_customers: u32,
    pub retention_rate: f64,

    // Revenue
    pub revenue_by_stream: BTreeMap<String, f64>,
    pub total_revenue: f64,

    // Costs
    pub cost_by_category: BTreeMap<CostCategory, f64>,
    pub total_fixed_cost: f64,
    pub total_variable_cost: f64,
    pub total_cost: f64,
    /// Part of `total_cost` scaled by the seasonal factor
    pub seasonal_cost: f64,

    // P&L
    pub gross_margin: f64,
    pub ebitda: f64,
    pub ebitda_margin: f64,
    pub depreciation: f64,
    pub ebit: f64,
    pub interest: f64,
    pub pre_tax_income: f64,
    pub tax: f64,
    pub net_income: f64,

    // Cash flow
    pub operating_cash_flow: f64,
    pub capital_reinvestment: f64,
    pub free_cash_flow: f64,
    pub cumulative_cash_flow: f64,
    pub loan_balance: f64,

    // Unit economics
    pub revenue_per_customer: f64,
    pub cost_per_customer: f64,
    pub contribution_margin: f64,
    /// Customers needed to cover this month's fixed cost at its unit margin
    pub break_even_customers: f64,
}

/// Flat CSV record; per-stream and per-category maps are left out
#[derive(Debug, Serialize)]
struct CsvRow {
    month: u32,
    year: i32,
    calendar_month: u32,
    seasonal_factor: f64,
    new_customers: u32,
    lost_customers: u32,
    active_customers: u32,
    retention_rate: f64,
    total_revenue: f64,
    total_fixed_cost: f64,
    total_variable_cost: f64,
    total_cost: f64,
    ebitda: f64,
    ebitda_margin: f64,
    ebit: f64,
    interest: f64,
    net_income: f64,
    free_cash_flow: f64,
    cumulative_cash_flow: f64,
    loan_balance: f64,
}

impl From<&MonthlyProjection> for CsvRow {
    fn from(row: &MonthlyProjection) -> Self {
        Self {
            month: row.month,
            year: row.year,
            calendar_month: row.calendar_month,
            seasonal_factor: row.seasonal_factor,
            new_customers: row.new_customers,
            lost_customers: row.lost_customers,
            active_customers: row.active_customers,
            retention_rate: row.retention_rate,
            total_revenue: row.total_revenue,
            total_fixed_cost: row.total_fixed_cost,
            total_variable_cost: row.total_variable_cost,
            total_cost: row.total_cost,
            ebitda: row.ebitda,
            ebitda_margin: row.ebitda_margin,
            ebit: row.ebit,
            interest: row.interest,
            net_income: row.net_income,
            free_cash_flow: row.free_cash_flow,
            cumulative_cash_flow: row.cumulative_cash_flow,
            loan_balance: row.loan_balance,
        }
    }
}

/// Complete plan result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectionResult {
    pub sector_id: String,
    pub initial_investment: f64,
    pub months: Vec<MonthlyProjection>,
    pub financial: FinancialMetrics,
    pub banking: BankingAssessment,
    pub customers: CustomerSummary,
    pub revenue: RevenueSummary,
    pub costs: CostSummary,
    pub kpis: Vec<Kpi>,
    pub rating: BusinessRating,
}

impl ProjectionResult {
    /// Cash flow series with the negative investment at index 0
    pub fn cash_flows(&self) -> Vec<f64> {
        std::iter::once(-self.initial_investment)
            .chain(self.months.iter().map(|m| m.free_cash_flow))
            .collect()
    }

    /// Cumulative cash position with the month-0 anchor at index 0
    pub fn cumulative_cash_flow(&self) -> Vec<f64> {
        std::iter::once(-self.initial_investment)
            .chain(self.months.iter().map(|m| m.cumulative_cash_flow))
            .collect()
    }

    /// Write the month table as CSV
    pub fn write_csv<W: Write>(&self, writer: W) -> PlanResult<()> {
        let mut csv = csv::Writer::from_writer(writer);
        for row in &self.months {
            csv.serialize(CsvRow::from(row))?;
        }
        csv.flush()?;
        Ok(())
    }

    pub fn write_csv_path<P: AsRef<Path>>(&self, path: P) -> PlanResult<()> {
        let file = std::fs::File::create(path)?;
        self.write_csv(file)
    }

    /// Headline figures
    pub fn summary(&self) -> ProjectionSummary {
        let f = &self.financial;
        ProjectionSummary {
            sector_id: self.sector_id.clone(),
            total_months: self.months.len() as u32,
            revenue_year1: f.year1.revenue,
            ebitda_year1: f.year1.ebitda,
            net_income_year1: f.year1.net_income,
            final_active_customers: self.months.last().map(|m| m.active_customers).unwrap_or(0),
            final_cumulative_cash: self.months.last().map(|m| m.cumulative_cash_flow).unwrap_or(-self.initial_investment),
            npv: f.npv,
            irr_annual: f.irr_annual,
            payback_month: f.payback_month,
            break_even_month: f.break_even_month,
            credit_grade: self.banking.rating.grade.to_string(),
            business_grade: self.rating.grade.to_string(),
        }
    }
}

/// Headline figures for a plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectionSummary {
    pub sector_id: String,
    pub total_months: u32,
    pub revenue_year1: f64,
    pub ebitda_year1: f64,
    pub net_income_year1: f64,
    pub final_active_customers: u32,
    pub final_cumulative_cash: f64,
    pub npv: f64,
    pub irr_annual: Option<f64>,
    pub payback_month: Option<u32>,
    pub break_even_month: Option<u32>,
    pub credit_grade: String,
    pub business_grade: String,
}
