//! Per-stream monthly revenue
//!
//! Streams are evaluated in declaration order so percent-of-stream formulas
//! can read the already rounded amount of their source. Each stream amount is
//! rounded to the currency unit and the month total is the sum of the rounded
//! parts.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::customers::MonthlyCustomers;
use super::round_half_up;
use crate::error::{PlanError, PlanResult};
use crate::sector::{check_stream_order, CustomBasis, RevenueStream, StreamFormula};

/// Revenue for one projection month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyRevenue {
    pub month: u32,
    pub by_stream: BTreeMap<String, f64>,
    pub total: f64,
}

impl MonthlyRevenue {
    pub fn stream(&self, key: &str) -> f64 {
        self.by_stream.get(key).copied().unwrap_or(0.0)
    }
}

/// Evaluates declared revenue streams against customer counts
#[derive(Debug, Clone)]
pub struct RevenueProjector {
    streams: Vec<RevenueStream>,
    /// Base price discounts apply to when they declare none
    reference_price: f64,
}

impl RevenueProjector {
    pub fn new(streams: Vec<RevenueStream>) -> PlanResult<Self> {
        if streams.is_empty() {
            return Err(PlanError::missing("revenue streams"));
        }
        check_stream_order(&streams)?;

        let reference_price = streams
            .iter()
            .find_map(|s| match s.formula {
                StreamFormula::Subscription { base_price } => Some(base_price),
                _ => None,
            })
            .unwrap_or(0.0);

        Ok(Self { streams, reference_price })
    }

    pub fn streams(&self) -> &[RevenueStream] {
        &self.streams
    }

    /// Unrounded, unseasoned amount of one stream
    fn base_amount(&self, formula: &StreamFormula, customers: &MonthlyCustomers, computed: &BTreeMap<String, f64>) -> f64 {
        let active = customers.active_customers as f64;
        let new = customers.new_customers as f64;

        match formula {
            StreamFormula::Subscription { base_price } => active * base_price,
            StreamFormula::PerNewCustomer { price } => new * price,
            StreamFormula::CohortAddOn { cohort_fraction, units_per_month, unit_price } => {
                round_half_up(active * cohort_fraction) * units_per_month * unit_price
            }
            StreamFormula::Discount { discount_fraction, discount_rate, base_price } => {
                let price = base_price.unwrap_or(self.reference_price);
                -(round_half_up(active * discount_fraction) * price * discount_rate)
            }
            StreamFormula::VolumeTicket { daily_volume, days_in_month, average_ticket } => {
                daily_volume * days_in_month * average_ticket
            }
            StreamFormula::PercentOfStream { source, fraction } => {
                computed.get(source).copied().unwrap_or(0.0) * fraction
            }
            StreamFormula::Funnel { visits, conversion_rate, average_order_value } => {
                visits * conversion_rate * average_order_value
            }
            StreamFormula::Occupancy { rooms, occupancy_rate, nightly_rate, nights_in_month } => {
                rooms * nights_in_month * occupancy_rate * nightly_rate * customers.seasonal_factor
            }
            StreamFormula::Custom { basis, amount } => match basis {
                CustomBasis::PerCustomer => active * amount,
                CustomBasis::PerNewCustomer => new * amount,
                CustomBasis::FlatMonthly => *amount,
            },
        }
    }

    /// Revenue of every stream for a single month
    pub fn evaluate_month(&self, customers: &MonthlyCustomers) -> MonthlyRevenue {
        let mut by_stream = BTreeMap::new();
        let mut total = 0.0;

        for stream in &self.streams {
            let mut amount = self.base_amount(&stream.formula, customers, &by_stream);
            if stream.formula.applies_seasonality() {
                amount *= customers.seasonal_factor;
            }
            let amount = round_half_up(amount);
            total += amount;
            by_stream.insert(stream.key.clone(), amount);
        }

        MonthlyRevenue { month: customers.month, by_stream, total }
    }

    pub fn project(&self, customers: &[MonthlyCustomers]) -> Vec<MonthlyRevenue> {
        customers.iter().map(|c| self.evaluate_month(c)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::customers::project_customers;
    use crate::sector::Seasonality;

    fn month_with(active: u32, new: u32, seasonal_factor: f64) -> MonthlyCustomers {
        MonthlyCustomers {
            month: 1,
            calendar_month: 1,
            seasonal_factor,
            ramp_up_factor: 1.0,
            new_customers: new,
            lost_customers: 0,
            net_customers: new as i64,
            active_customers: active,
            retention_rate: 1.0,
        }
    }

    #[test]
    fn test_flat_subscription() {
        let projector = RevenueProjector::new(vec![RevenueStream::new(
            "fee",
            "Fee",
            StreamFormula::Subscription { base_price: 50.0 },
        )])
        .unwrap();
        let customers = project_customers(12, 0.0, 0.0, &Seasonality::flat(), 36);
        for month in projector.project(&customers) {
            assert_eq!(month.total, 600.0);
        }
    }

    #[test]
    fn test_discount_stream_is_negative_and_not_seasonal() {
        let projector = RevenueProjector::new(vec![RevenueStream::new(
            "special_rates",
            "Special rates",
            StreamFormula::Discount { discount_fraction: 0.10, discount_rate: 0.20, base_price: Some(40.0) },
        )])
        .unwrap();
        let revenue = projector.evaluate_month(&month_with(100, 0, 1.4));
        assert_eq!(revenue.stream("special_rates"), -80.0);
        assert_eq!(revenue.total, -80.0);
    }

    #[test]
    fn test_discount_defaults_to_subscription_price() {
        let projector = RevenueProjector::new(vec![
            RevenueStream::new("fee", "Fee", StreamFormula::Subscription { base_price: 40.0 }),
            RevenueStream::new(
                "special_rates",
                "Special rates",
                StreamFormula::Discount { discount_fraction: 0.10, discount_rate: 0.20, base_price: None },
            ),
        ])
        .unwrap();
        let revenue = projector.evaluate_month(&month_with(100, 0, 1.0));
        assert_eq!(revenue.stream("special_rates"), -80.0);
        assert_eq!(revenue.total, 4_000.0 - 80.0);
    }

    #[test]
    fn test_percent_of_stream_is_seasonal() {
        let projector = RevenueProjector::new(vec![
            RevenueStream::new(
                "food",
                "Food",
                StreamFormula::VolumeTicket { daily_volume: 45.0, days_in_month: 30.0, average_ticket: 25.0 },
            ),
            RevenueStream::new("drinks", "Drinks", StreamFormula::PercentOfStream { source: "food".into(), fraction: 0.4 }),
        ])
        .unwrap();
        let revenue = projector.evaluate_month(&month_with(0, 0, 1.2));
        assert_eq!(revenue.stream("food"), 40_500.0);
        // 40% of the seasonal food revenue, scaled by the month's factor again
        assert_eq!(revenue.stream("drinks"), 19_440.0);
        assert_eq!(revenue.total, 40_500.0 + 19_440.0);
    }

    #[test]
    fn test_occupancy_embeds_seasonality() {
        let projector = RevenueProjector::new(vec![RevenueStream::new(
            "rooms",
            "Rooms",
            StreamFormula::Occupancy { rooms: 18.0, occupancy_rate: 0.65, nightly_rate: 120.0, nights_in_month: 30.0 },
        )])
        .unwrap();
        let revenue = projector.evaluate_month(&month_with(0, 0, 0.5));
        assert_eq!(revenue.total, 21_060.0);
    }

    #[test]
    fn test_total_is_sum_of_rounded_streams() {
        let projector = RevenueProjector::new(vec![
            RevenueStream::new("a", "A", StreamFormula::Custom { basis: CustomBasis::FlatMonthly, amount: 10.4 }),
            RevenueStream::new("b", "B", StreamFormula::Custom { basis: CustomBasis::FlatMonthly, amount: 10.4 }),
            RevenueStream::new("c", "C", StreamFormula::Custom { basis: CustomBasis::FlatMonthly, amount: 10.4 }),
        ])
        .unwrap();
        let revenue = projector.evaluate_month(&month_with(0, 0, 1.0));
        // Round of the sum would give 31
        assert_eq!(revenue.total, 30.0);
        assert_eq!(revenue.total, revenue.by_stream.values().sum::<f64>());
    }

    #[test]
    fn test_cohort_and_per_new_customer() {
        let projector = RevenueProjector::new(vec![
            RevenueStream::new(
                "personal_training",
                "PT",
                StreamFormula::CohortAddOn { cohort_fraction: 0.25, units_per_month: 4.0, unit_price: 25.0 },
            ),
            RevenueStream::new("registration", "Registration", StreamFormula::PerNewCustomer { price: 50.0 }),
        ])
        .unwrap();
        let revenue = projector.evaluate_month(&month_with(101, 7, 1.0));
        // round(25.25) = 25 members × 4 sessions × 25
        assert_eq!(revenue.stream("personal_training"), 2_500.0);
        assert_eq!(revenue.stream("registration"), 350.0);
    }

    #[test]
    fn test_empty_streams_rejected() {
        assert!(matches!(RevenueProjector::new(vec![]), Err(PlanError::MissingInput { .. })));
    }
}
