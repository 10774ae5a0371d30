//! Monthly income statement and cash flow

use serde::{Deserialize, Serialize};

use crate::plan::PlanInputs;

/// Accounting parameters shared by every month of a plan
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PnlPolicy {
    pub depreciation_monthly: f64,
    pub tax_rate: f64,
    pub capital_reinvestment_monthly: f64,
}

impl PnlPolicy {
    pub fn from_inputs(inputs: &PlanInputs) -> Self {
        let financing = &inputs.financing;
        let depreciation_monthly = if financing.depreciation_months > 0 {
            inputs.initial_investment / financing.depreciation_months as f64
        } else {
            0.0
        };
        Self {
            depreciation_monthly,
            tax_rate: financing.tax_rate,
            capital_reinvestment_monthly: financing.capital_reinvestment_monthly,
        }
    }

    /// Income statement for one month
    pub fn statement(&self, revenue: f64, cost: f64, interest: f64) -> IncomeStatement {
        let ebitda = revenue - cost;
        let ebitda_margin = if revenue != 0.0 { ebitda / revenue } else { 0.0 };
        let ebit = ebitda - self.depreciation_monthly;
        let pre_tax_income = ebit - interest;
        // No tax credit on losses
        let tax = if pre_tax_income > 0.0 { pre_tax_income * self.tax_rate } else { 0.0 };
        let net_income = pre_tax_income - tax;
        let operating_cash_flow = net_income + self.depreciation_monthly;
        let free_cash_flow = operating_cash_flow - self.capital_reinvestment_monthly;

        IncomeStatement {
            revenue,
            cost,
            ebitda,
            ebitda_margin,
            depreciation: self.depreciation_monthly,
            ebit,
            interest,
            pre_tax_income,
            tax,
            net_income,
            operating_cash_flow,
            capital_reinvestment: self.capital_reinvestment_monthly,
            free_cash_flow,
        }
    }
}

/// P&L and cash flow lines for a month
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IncomeStatement {
    pub revenue: f64,
    pub cost: f64,
    pub ebitda: f64,
    pub ebitda_margin: f64,
    pub depreciation: f64,
    pub ebit: f64,
    pub interest: f64,
    pub pre_tax_income: f64,
    pub tax: f64,
    pub net_income: f64,
    pub operating_cash_flow: f64,
    pub capital_reinvestment: f64,
    pub free_cash_flow: f64,
}
