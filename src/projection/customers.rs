//! Month-by-month customer fold: acquisition, churn and retention

use serde::{Deserialize, Serialize};

use super::round_half_up;
use crate::plan::PlanInputs;
use crate::sector::{calendar_month, Seasonality};

/// Customer counts for one projection month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyCustomers {
    /// Projection month (1-indexed)
    pub month: u32,
    /// Calendar month (1-12)
    pub calendar_month: u32,
    pub seasonal_factor: f64,
    pub ramp_up_factor: f64,
    pub new_customers: u32,
    pub lost_customers: u32,
    pub net_customers: i64,
    pub active_customers: u32,
    pub retention_rate: f64,
}

/// Customer projection parameters
#[derive(Debug, Clone)]
pub struct CustomerProjector {
    initial_customers: u32,
    growth_base: f64,
    churn_rate: f64,
    seasonality: Seasonality,
    start_month: u32,
    ramp_up_months: u32,
    ramp_up_initial_factor: f64,
}

impl CustomerProjector {
    pub fn new(initial_customers: u32, growth_base: f64, churn_rate: f64, seasonality: Seasonality) -> Self {
        Self {
            initial_customers,
            growth_base,
            churn_rate,
            seasonality,
            start_month: 1,
            ramp_up_months: 0,
            ramp_up_initial_factor: 1.0,
        }
    }

    /// Projector for resolved plan inputs; pre-opening customers join the seed
    pub fn from_inputs(inputs: &PlanInputs) -> Self {
        Self::new(
            inputs.initial_customers + inputs.temporal.pre_opening_customers,
            inputs.monthly_growth_base,
            inputs.monthly_churn_rate,
            inputs.seasonality,
        )
        .starting_in(inputs.start_month())
        .with_ramp_up(inputs.temporal.ramp_up_months, inputs.temporal.ramp_up_initial_factor)
    }

    pub fn with_ramp_up(mut self, months: u32, initial_factor: f64) -> Self {
        self.ramp_up_months = months;
        self.ramp_up_initial_factor = initial_factor;
        self
    }

    /// Calendar month (1-12) of projection month 1
    pub fn starting_in(mut self, calendar_month: u32) -> Self {
        self.start_month = calendar_month.clamp(1, 12);
        self
    }

    /// Acquisition multiplier during ramp-up, linear from the initial factor to 1
    pub fn ramp_up_factor(&self, month: u32) -> f64 {
        let r = self.ramp_up_months;
        if r <= 1 || month > r {
            return 1.0;
        }
        let f0 = self.ramp_up_initial_factor;
        f0 + (1.0 - f0) * month.saturating_sub(1) as f64 / (r - 1) as f64
    }

    /// One step of the fold: month `month` given the prior month's active count.
    /// Months are 1-indexed; month 0 is treated as the opening month.
    pub fn step(&self, month: u32, prior_active: u32) -> MonthlyCustomers {
        let cal = calendar_month(self.start_month, month.saturating_sub(1));
        let seasonal_factor = self.seasonality.factor_for(cal);
        let ramp_up_factor = self.ramp_up_factor(month);

        let new_customers = round_half_up(self.growth_base * seasonal_factor * ramp_up_factor).max(0.0) as u32;
        // The seed population does not churn in the opening month
        let lost_customers = if month > 1 {
            round_half_up(prior_active as f64 * self.churn_rate).max(0.0) as u32
        } else {
            0
        };

        let net_customers = new_customers as i64 - lost_customers as i64;
        let active_customers = (prior_active as i64 + net_customers).max(0) as u32;

        let retention_rate = if active_customers > 0 {
            (active_customers as f64 - new_customers as f64 + lost_customers as f64) / active_customers as f64
        } else {
            0.0
        };

        MonthlyCustomers {
            month,
            calendar_month: cal,
            seasonal_factor,
            ramp_up_factor,
            new_customers,
            lost_customers,
            net_customers,
            active_customers,
            retention_rate,
        }
    }

    /// Run the fold for `months` months
    pub fn project(&self, months: u32) -> Vec<MonthlyCustomers> {
        let mut rows = Vec::with_capacity(months as usize);
        let mut active = self.initial_customers;

        for month in 1..=months {
            let row = self.step(month, active);
            active = row.active_customers;
            rows.push(row);
        }

        rows
    }
}

/// Project customers from January with no ramp-up
pub fn project_customers(
    initial_customers: u32,
    growth_base: f64,
    churn_rate: f64,
    seasonality: &Seasonality,
    months: u32,
) -> Vec<MonthlyCustomers> {
    CustomerProjector::new(initial_customers, growth_base, churn_rate, *seasonality).project(months)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_full_churn_empties_and_stays_empty() {
        let rows = project_customers(100, 0.0, 1.0, &Seasonality::flat(), 12);
        assert_eq!(rows[0].active_customers, 100);
        assert_eq!(rows[0].lost_customers, 0);
        assert_eq!(rows[1].active_customers, 0);
        assert!(rows[1..].iter().all(|r| r.active_customers == 0));
        assert_eq!(rows[1].retention_rate, 0.0);
    }

    #[test]
    fn test_churn_above_one_clamps_at_zero() {
        let rows = project_customers(50, 10.0, 3.5, &Seasonality::flat(), 36);
        // Month 2: 60 + 10 - 210 clamps to 0
        assert_eq!(rows[1].active_customers, 0);
        // Recovers through acquisition; loses everyone again the month after
        assert_eq!(rows[2].active_customers, 10);
    }

    #[test]
    fn test_no_churn_in_month_one() {
        let rows = project_customers(12, 0.0, 0.5, &Seasonality::flat(), 2);
        assert_eq!(rows[0].active_customers, 12);
        assert_eq!(rows[1].lost_customers, 6);
        assert_eq!(rows[1].active_customers, 6);
    }

    #[test]
    fn test_seasonality_drives_acquisition() {
        let mut f = [1.0; 12];
        f[0] = 1.4;
        f[7] = 0.5;
        let rows = project_customers(0, 95.0, 0.0, &Seasonality::from_factors(f), 12);
        assert_eq!(rows[0].new_customers, 133);
        assert_eq!(rows[7].new_customers, 48);
        assert_eq!(rows[1].new_customers, 95);
    }

    #[test]
    fn test_retention_rate() {
        let rows = project_customers(100, 20.0, 0.1, &Seasonality::flat(), 2);
        // 120 + 20 - 12 = 128; retained = 128 - 20 + 12 = 120
        assert_eq!(rows[1].active_customers, 128);
        assert_abs_diff_eq!(rows[1].retention_rate, 120.0 / 128.0, epsilon = 1e-12);
    }

    #[test]
    fn test_ramp_up_and_start_month() {
        let projector = CustomerProjector::new(0, 100.0, 0.0, Seasonality::flat())
            .with_ramp_up(6, 0.3)
            .starting_in(10);
        assert_abs_diff_eq!(projector.ramp_up_factor(1), 0.3, epsilon = 1e-12);
        assert_abs_diff_eq!(projector.ramp_up_factor(6), 1.0, epsilon = 1e-12);
        assert_eq!(projector.ramp_up_factor(7), 1.0);

        let rows = projector.project(4);
        assert_eq!(rows[0].new_customers, 30);
        assert_eq!(rows[0].calendar_month, 10);
        assert_eq!(rows[3].calendar_month, 1);
    }

    #[test]
    fn test_month_zero_is_the_opening_month() {
        let projector = CustomerProjector::new(5, 100.0, 0.5, Seasonality::flat())
            .with_ramp_up(6, 0.3)
            .starting_in(3);
        assert_abs_diff_eq!(projector.ramp_up_factor(0), 0.3, epsilon = 1e-12);

        let row = projector.step(0, 5);
        assert_eq!(row.calendar_month, 3);
        assert_eq!(row.new_customers, 30);
        assert_eq!(row.lost_customers, 0);
        assert_eq!(row.active_customers, 35);
    }
}
