//! Running state carried from one projection month to the next

use chrono::{Datelike, Months, NaiveDate};

use crate::plan::PlanInputs;

/// State of the plan at a point in time during projection
#[derive(Debug, Clone)]
pub struct ProjectionState {
    /// Current projection month (1-indexed, 0 before the first month)
    pub projection_month: u32,

    /// Plan year (1-indexed)
    pub plan_year: u32,

    /// First day of the plan's opening month
    start: NaiveDate,

    /// First day of the current calendar month
    pub date: NaiveDate,

    /// Cumulative free cash flow, anchored at minus the initial investment
    pub cumulative_cash_flow: f64,

    /// Outstanding loan principal at the end of the month
    pub loan_balance: f64,
}

impl ProjectionState {
    /// State at month 0
    pub fn from_inputs(inputs: &PlanInputs) -> Self {
        let start = inputs.start_date.with_day(1).unwrap_or(inputs.start_date);
        Self {
            projection_month: 0,
            plan_year: 1,
            start,
            date: start,
            cumulative_cash_flow: -inputs.initial_investment,
            loan_balance: inputs.loan_principal(),
        }
    }

    /// Advance to next month
    pub fn advance_month(&mut self) {
        self.projection_month += 1;
        self.plan_year = (self.projection_month - 1) / 12 + 1;
        self.date = self
            .start
            .checked_add_months(Months::new(self.projection_month - 1))
            .unwrap_or(self.date);
    }

    pub fn year(&self) -> i32 {
        self.date.year()
    }

    pub fn calendar_month(&self) -> u32 {
        self.date.month()
    }

    /// Calendar quarter (1-4)
    pub fn quarter(&self) -> u32 {
        (self.date.month() - 1) / 3 + 1
    }

    /// Fold one month's free cash flow into the running position
    pub fn record_cash_flow(&mut self, free_cash_flow: f64) -> f64 {
        self.cumulative_cash_flow += free_cash_flow;
        self.cumulative_cash_flow
    }
}
