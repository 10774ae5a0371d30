//! Projection pipeline: customers → revenue → costs → monthly P&L and cash flow

mod state;
mod engine;
mod cashflows;
pub mod customers;
pub mod revenue;
pub mod costs;

pub use state::ProjectionState;
pub use engine::ProjectionEngine;
pub use cashflows::{MonthlyProjection, ProjectionResult, ProjectionSummary};
pub use customers::{project_customers, CustomerProjector, MonthlyCustomers};
pub use revenue::{MonthlyRevenue, RevenueProjector};
pub use costs::{CostLine, CostProjector, MonthlyCost};

/// Round to the nearest integer, ties toward +∞
pub fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

#[cfg(test)]
mod tests {
    use super::round_half_up;

    #[test]
    fn test_round_half_up() {
        assert_eq!(round_half_up(2.5), 3.0);
        assert_eq!(round_half_up(2.4999), 2.0);
        assert_eq!(round_half_up(-2.5), -2.0);
        assert_eq!(round_half_up(-80.0), -80.0);
    }
}
