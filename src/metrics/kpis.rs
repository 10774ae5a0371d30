//! Operational analytics: customer, revenue and cost summaries and KPIs

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::financial::{ratio, year_slice, FinancialMetrics};
use crate::plan::PlanInputs;
use crate::projection::MonthlyProjection;
use crate::sector::{CostCategory, KpiBenchmark, RevenueStream, StreamFormula};

/// Customer dynamics over the plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerSummary {
    pub active_end_year1: u32,
    pub active_end_year3: Option<u32>,
    pub new_year1: u32,
    pub lost_year1: u32,
    pub average_retention_year1: f64,
    /// Annualized growth of active customers from month 1 to the last month
    pub customer_cagr: f64,
    /// Month with the most new customers (earliest on ties)
    pub peak_acquisition_month: u32,
    pub lowest_acquisition_month: u32,
    pub year1_target: Option<u32>,
    /// First month the active count reaches the year-1 target
    pub months_to_target: Option<u32>,
}

impl CustomerSummary {
    pub fn compute(months: &[MonthlyProjection], year1: &[MonthlyProjection], target: Option<u32>) -> Self {
        let first = months.first().map(|m| m.active_customers).unwrap_or(0);
        let last = months.last().map(|m| m.active_customers).unwrap_or(0);
        let years = months.len() as f64 / 12.0;
        // Empty populations count as one customer
        let customer_cagr = if years > 0.0 {
            (last.max(1) as f64 / first.max(1) as f64).powf(1.0 / years) - 1.0
        } else {
            0.0
        };

        let mut peak = months.first();
        let mut lowest = months.first();
        for m in months {
            if peak.map_or(true, |p| m.new_customers > p.new_customers) {
                peak = Some(m);
            }
            if lowest.map_or(true, |l| m.new_customers < l.new_customers) {
                lowest = Some(m);
            }
        }

        Self {
            active_end_year1: year1.last().map(|m| m.active_customers).unwrap_or(0),
            active_end_year3: year_slice(months, 3).and_then(|y| y.last()).map(|m| m.active_customers),
            new_year1: year1.iter().map(|m| m.new_customers).sum(),
            lost_year1: year1.iter().map(|m| m.lost_customers).sum(),
            average_retention_year1: ratio(year1.iter().map(|m| m.retention_rate).sum(), year1.len() as f64),
            customer_cagr,
            peak_acquisition_month: peak.map(|m| m.month).unwrap_or(0),
            lowest_acquisition_month: lowest.map(|m| m.month).unwrap_or(0),
            year1_target: target,
            months_to_target: target.and_then(|t| months.iter().find(|m| m.active_customers >= t).map(|m| m.month)),
        }
    }
}

/// One stream's year-1 contribution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamSummary {
    pub key: String,
    pub total_year1: f64,
    pub share: f64,
    /// Mean month-over-month growth across year 1
    pub average_monthly_growth: f64,
    /// (max − min) / mean of the year-1 monthly amounts
    pub seasonality_spread: f64,
}

/// Revenue mix over year 1
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueSummary {
    pub total_year1: f64,
    pub streams: Vec<StreamSummary>,
    pub main_stream: Option<String>,
    /// 1 − HHI of stream shares; 0 for a single stream
    pub diversification_index: f64,
    /// Year-1 revenue per average active customer per month
    pub arpu: f64,
    /// Annualized growth from year-1 to year-3 revenue, when projected
    pub revenue_cagr: Option<f64>,
}

impl RevenueSummary {
    pub fn compute(months: &[MonthlyProjection], year1: &[MonthlyProjection], keys: &[String]) -> Self {
        let total_year1: f64 = year1.iter().map(|m| m.total_revenue).sum();

        let streams: Vec<StreamSummary> = keys
            .iter()
            .map(|key| {
                let amounts: Vec<f64> = year1
                    .iter()
                    .map(|m| m.revenue_by_stream.get(key).copied().unwrap_or(0.0))
                    .collect();
                let total: f64 = amounts.iter().sum();

                let growth: Vec<f64> = amounts
                    .windows(2)
                    .filter(|w| w[0] != 0.0)
                    .map(|w| (w[1] - w[0]) / w[0].abs())
                    .collect();
                let average_monthly_growth = ratio(growth.iter().sum(), growth.len() as f64);

                let max = amounts.iter().copied().fold(f64::MIN, f64::max);
                let min = amounts.iter().copied().fold(f64::MAX, f64::min);
                let mean = ratio(total, amounts.len() as f64);

                StreamSummary {
                    key: key.clone(),
                    total_year1: total,
                    share: ratio(total, total_year1),
                    average_monthly_growth,
                    seasonality_spread: if amounts.is_empty() { 0.0 } else { ratio(max - min, mean.abs()) },
                }
            })
            .collect();

        let main_stream = streams
            .iter()
            .filter(|s| s.total_year1 > 0.0)
            .max_by(|a, b| a.total_year1.total_cmp(&b.total_year1))
            .map(|s| s.key.clone());

        // Discounts carry negative shares; only positive contributions diversify
        let positive: Vec<f64> = streams.iter().map(|s| s.total_year1.max(0.0)).collect();
        let positive_total: f64 = positive.iter().sum();
        let hhi: f64 = positive.iter().map(|t| ratio(*t, positive_total).powi(2)).sum();
        let diversification_index = if positive_total > 0.0 { 1.0 - hhi } else { 0.0 };

        let customer_months: f64 = year1.iter().map(|m| m.active_customers as f64).sum();
        let revenue_cagr = year_slice(months, 3).and_then(|y3| {
            let y3_total: f64 = y3.iter().map(|m| m.total_revenue).sum();
            (total_year1 > 0.0 && y3_total > 0.0).then(|| (y3_total / total_year1).sqrt() - 1.0)
        });

        Self {
            total_year1,
            streams,
            main_stream,
            diversification_index,
            arpu: ratio(total_year1, customer_months),
            revenue_cagr,
        }
    }
}

/// Cost structure over year 1
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostSummary {
    pub total_year1: f64,
    pub by_category: BTreeMap<CostCategory, f64>,
    pub fixed_share: f64,
    pub variable_share: f64,
    /// Share of year-1 cost from seasonally scaled items
    pub seasonal_share: f64,
}

impl CostSummary {
    pub fn compute(year1: &[MonthlyProjection], seasonal_year1: f64) -> Self {
        let mut by_category = BTreeMap::new();
        for m in year1 {
            for (category, amount) in &m.cost_by_category {
                *by_category.entry(*category).or_insert(0.0) += amount;
            }
        }
        let total: f64 = year1.iter().map(|m| m.total_cost).sum();
        let fixed: f64 = year1.iter().map(|m| m.total_fixed_cost).sum();
        let variable: f64 = year1.iter().map(|m| m.total_variable_cost).sum();

        Self {
            total_year1: total,
            by_category,
            fixed_share: ratio(fixed, total),
            variable_share: ratio(variable, total),
            seasonal_share: ratio(seasonal_year1, total),
        }
    }
}

/// Distance of a KPI from its target
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KpiStatus {
    Excellent,
    Good,
    Warning,
    Critical,
}

impl KpiStatus {
    /// Bands on relative deviation: ≤10% excellent, ≤25% good, ≤50% warning
    pub fn classify(value: f64, target: f64) -> Self {
        if target == 0.0 {
            return if value == 0.0 { KpiStatus::Excellent } else { KpiStatus::Critical };
        }
        let deviation = (value - target).abs() / target.abs();
        if !deviation.is_finite() {
            KpiStatus::Critical
        } else if deviation <= 0.10 {
            KpiStatus::Excellent
        } else if deviation <= 0.25 {
            KpiStatus::Good
        } else if deviation <= 0.50 {
            KpiStatus::Warning
        } else {
            KpiStatus::Critical
        }
    }

    pub fn is_met(&self) -> bool {
        matches!(self, KpiStatus::Excellent | KpiStatus::Good)
    }
}

impl fmt::Display for KpiStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            KpiStatus::Excellent => "excellent",
            KpiStatus::Good => "good",
            KpiStatus::Warning => "warning",
            KpiStatus::Critical => "critical",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Kpi {
    pub key: String,
    pub value: f64,
    pub target: f64,
    pub benchmark: f64,
    pub unit: String,
    pub status: KpiStatus,
}

impl Kpi {
    fn new(key: &str, value: f64, target: f64, benchmark: f64, unit: &str) -> Self {
        Self {
            key: key.to_string(),
            value,
            target,
            benchmark,
            unit: unit.to_string(),
            status: KpiStatus::classify(value, target),
        }
    }

    /// Template benchmark for `key` when declared, else the defaults
    fn benchmarked(
        benchmarks: &BTreeMap<String, KpiBenchmark>,
        key: &str,
        value: f64,
        default_target: f64,
        default_benchmark: f64,
        unit: &str,
    ) -> Self {
        match benchmarks.get(key) {
            Some(b) => Self::new(key, value, b.target, b.benchmark_sector, unit),
            None => Self::new(key, value, default_target, default_benchmark, unit),
        }
    }
}

/// |Δcost/cost| over |Δcustomers/customers| between the first and last month
pub fn cost_elasticity(months: &[MonthlyProjection]) -> f64 {
    let (Some(first), Some(last)) = (months.first(), months.last()) else {
        return 0.0;
    };
    if months.len() < 2 || first.active_customers == 0 || first.total_cost == 0.0 {
        return 0.0;
    }
    let customer_change = (last.active_customers as f64 - first.active_customers as f64) / first.active_customers as f64;
    let cost_change = (last.total_cost - first.total_cost) / first.total_cost;
    ratio(cost_change, customer_change).abs()
}

/// Operational KPIs over year 1
pub fn compute_kpis(
    year1: &[MonthlyProjection],
    inputs: &PlanInputs,
    financial: &FinancialMetrics,
    customers: &CustomerSummary,
    revenue: &RevenueSummary,
) -> Vec<Kpi> {
    let b = &inputs.kpi_benchmarks;
    let n = year1.len() as f64;
    let mean = |f: fn(&MonthlyProjection) -> f64| ratio(year1.iter().map(f).sum(), n);

    let fixed = financial.year1.fixed_costs;
    let variable = financial.year1.variable_costs;
    let opening_active = year1.first().map(|m| m.active_customers as f64).unwrap_or(0.0);
    let break_even_target = if opening_active > 0.0 { opening_active * 0.6 } else { 100.0 };
    let break_even_benchmark = if opening_active > 0.0 { opening_active * 0.7 } else { 120.0 };

    let mut kpis = vec![
        Kpi::benchmarked(b, "cost_per_customer", mean(|m| m.cost_per_customer), 30.0, 35.0, "currency/customer"),
        Kpi::new(
            "fixed_cost_share",
            if fixed > 0.0 { fixed / (fixed + variable) } else { 1.0 },
            0.70,
            0.75,
            "share",
        ),
        Kpi::new("cost_elasticity", cost_elasticity(year1), 0.3, 0.4, "elasticity"),
        Kpi::benchmarked(b, "ebitda_margin", mean(|m| m.ebitda_margin), 0.25, 0.22, "share"),
        Kpi::new(
            "break_even_customers",
            mean(|m| m.break_even_customers),
            break_even_target,
            break_even_benchmark,
            "customers",
        ),
        Kpi::benchmarked(b, "retention_rate", customers.average_retention_year1, 0.70, 0.70, "share"),
        Kpi::benchmarked(b, "revenue_per_customer", revenue.arpu, 50.0, 45.0, "currency/customer"),
    ];

    if let Some(capacity) = inputs.temporal.max_capacity.filter(|c| *c > 0) {
        let occupancy = ratio(mean(|m| m.active_customers as f64), capacity as f64);
        kpis.push(Kpi::benchmarked(b, "occupancy", occupancy, 0.70, 0.65, "share"));
    }

    if let Some(area) = inputs.temporal.floor_area_m2.filter(|a| *a > 0.0) {
        let density = ratio(mean(|m| m.active_customers as f64), area);
        kpis.push(Kpi::benchmarked(b, "customers_per_m2", density, 3.0, 2.8, "customers/m2"));
    }

    // Only reported where the template sets a target for it
    if b.contains_key("gross_margin") {
        kpis.push(Kpi::benchmarked(b, "gross_margin", financial.year1.gross_margin(), 0.30, 0.30, "share"));
    }

    kpis.extend(stream_kpis(year1, &inputs.streams, b));
    kpis
}

/// KPIs tied to the revenue formula families present in the plan.
///
/// Volumes follow the stream formulas, scaled by each month's seasonal
/// factor the same way the revenue is.
fn stream_kpis(
    year1: &[MonthlyProjection],
    streams: &[RevenueStream],
    b: &BTreeMap<String, KpiBenchmark>,
) -> Vec<Kpi> {
    let stream_total = |key: &str| -> f64 {
        year1.iter().map(|m| m.revenue_by_stream.get(key).copied().unwrap_or(0.0)).sum()
    };
    let seasonal_volume = |per_month: f64| -> f64 { year1.iter().map(|m| per_month * m.seasonal_factor).sum() };
    let mut kpis = Vec::new();

    // Revenue per cover over every volume x ticket stream
    let (ticket_revenue, covers) = streams.iter().fold((0.0, 0.0), |(revenue, volume), s| match &s.formula {
        StreamFormula::VolumeTicket { daily_volume, days_in_month, .. } => (
            revenue + stream_total(&s.key),
            volume + seasonal_volume(daily_volume * days_in_month),
        ),
        _ => (revenue, volume),
    });
    if covers > 0.0 {
        kpis.push(Kpi::benchmarked(b, "average_ticket", ratio(ticket_revenue, covers), 25.0, 23.0, "currency/cover"));
    }

    // The funnel with the most year-1 revenue is the shop itself
    let main_funnel = streams
        .iter()
        .filter_map(|s| match &s.formula {
            StreamFormula::Funnel { visits, conversion_rate, .. } => Some((s.key.as_str(), *visits, *conversion_rate)),
            _ => None,
        })
        .max_by(|x, y| stream_total(x.0).total_cmp(&stream_total(y.0)));
    if let Some((key, visits, conversion)) = main_funnel {
        let orders = seasonal_volume(visits * conversion);
        kpis.push(Kpi::benchmarked(b, "conversion_rate", conversion, 0.030, 0.025, "share"));
        kpis.push(Kpi::benchmarked(b, "average_order_value", ratio(stream_total(key), orders), 70.0, 65.0, "currency/order"));
    }

    let (room_revenue, available, occupied) = streams.iter().fold((0.0, 0.0, 0.0), |acc, s| match &s.formula {
        StreamFormula::Occupancy { rooms, occupancy_rate, nights_in_month, .. } => {
            let room_nights = rooms * nights_in_month;
            (
                acc.0 + stream_total(&s.key),
                acc.1 + room_nights * year1.len() as f64,
                acc.2 + seasonal_volume(room_nights * occupancy_rate),
            )
        }
        _ => acc,
    });
    if available > 0.0 {
        let cost: f64 = year1.iter().map(|m| m.total_cost).sum();
        kpis.push(Kpi::benchmarked(b, "room_occupancy", ratio(occupied, available), 0.65, 0.60, "share"));
        kpis.push(Kpi::benchmarked(b, "adr", ratio(room_revenue, occupied), 120.0, 115.0, "currency/night"));
        kpis.push(Kpi::benchmarked(b, "revpar", ratio(room_revenue, available), 78.0, 72.0, "currency/night"));
        kpis.push(Kpi::benchmarked(b, "cost_per_room_night", ratio(cost, available), 45.0, 50.0, "currency/night"));
    }

    kpis
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_bands() {
        assert_eq!(KpiStatus::classify(0.72, 0.70), KpiStatus::Excellent);
        assert_eq!(KpiStatus::classify(0.55, 0.70), KpiStatus::Good);
        assert_eq!(KpiStatus::classify(0.40, 0.70), KpiStatus::Warning);
        assert_eq!(KpiStatus::classify(0.10, 0.70), KpiStatus::Critical);
        assert_eq!(KpiStatus::classify(1.5, 1.0), KpiStatus::Warning);
    }

    #[test]
    fn test_zero_target() {
        assert_eq!(KpiStatus::classify(0.0, 0.0), KpiStatus::Excellent);
        assert_eq!(KpiStatus::classify(3.0, 0.0), KpiStatus::Critical);
    }

    #[test]
    fn test_gym_summaries() {
        use crate::plan::PlanOverrides;
        use crate::projection::ProjectionEngine;

        let result = ProjectionEngine::default().compute("gym-fitness", &PlanOverrides::default()).unwrap();

        assert_eq!(result.revenue.main_stream.as_deref(), Some("monthly_fee"));
        assert_eq!(result.revenue.streams.len(), 5);
        assert!(result.revenue.diversification_index > 0.0 && result.revenue.diversification_index < 1.0);
        let shares: f64 = result.revenue.streams.iter().map(|s| s.share).sum();
        approx::assert_abs_diff_eq!(shares, 1.0, epsilon = 1e-9);

        assert_eq!(result.customers.year1_target, Some(710));
        assert_eq!(result.customers.new_year1, result.months[..12].iter().map(|m| m.new_customers).sum::<u32>());
        // First January after the ramp-up
        assert_eq!(result.customers.peak_acquisition_month, 13);

        let keys: Vec<_> = result.kpis.iter().map(|k| k.key.as_str()).collect();
        assert!(keys.contains(&"occupancy"));
        let retention = result.kpis.iter().find(|k| k.key == "retention_rate").unwrap();
        assert_eq!(retention.target, 0.75);

        approx::assert_abs_diff_eq!(result.costs.fixed_share + result.costs.variable_share, 1.0, epsilon = 1e-9);
        assert!(result.costs.by_category.contains_key(&CostCategory::Rent));
    }

    fn kpi_value(result: &crate::ProjectionResult, key: &str) -> f64 {
        result
            .kpis
            .iter()
            .find(|k| k.key == key)
            .map(|k| k.value)
            .unwrap_or_else(|| panic!("missing KPI {}", key))
    }

    #[test]
    fn test_sector_kpis_follow_stream_formulas() {
        use crate::plan::PlanOverrides;
        use crate::projection::ProjectionEngine;
        use approx::assert_abs_diff_eq;

        let engine = ProjectionEngine::default();
        let overrides = PlanOverrides::default();

        let restaurant = engine.compute("restaurant", &overrides).unwrap();
        assert_abs_diff_eq!(kpi_value(&restaurant, "average_ticket"), 25.0, epsilon = 0.01);

        let shop = engine.compute("ecommerce", &overrides).unwrap();
        assert_eq!(kpi_value(&shop, "conversion_rate"), 0.025);
        assert_abs_diff_eq!(kpi_value(&shop, "average_order_value"), 65.0, epsilon = 0.01);

        // Seasonal factors of the first year sum to 10
        let hotel = engine.compute("rural-hotel", &overrides).unwrap();
        let occupancy = kpi_value(&hotel, "room_occupancy");
        assert_abs_diff_eq!(occupancy, 0.65 * 10.0 / 12.0, epsilon = 1e-9);
        assert_abs_diff_eq!(kpi_value(&hotel, "adr"), 120.0, epsilon = 0.01);
        assert_abs_diff_eq!(kpi_value(&hotel, "revpar"), 120.0 * occupancy, epsilon = 0.01);
        assert!(kpi_value(&hotel, "cost_per_room_night") > 0.0);

        let consultancy = engine.compute("consultancy", &overrides).unwrap();
        assert_abs_diff_eq!(kpi_value(&consultancy, "average_ticket"), 80.0, epsilon = 0.01);

        let gym = engine.compute("gym-fitness", &overrides).unwrap();
        let mean_active = gym.months[..12].iter().map(|m| m.active_customers as f64).sum::<f64>() / 12.0;
        assert_abs_diff_eq!(kpi_value(&gym, "customers_per_m2"), mean_active / 500.0, epsilon = 1e-9);
        assert!(gym.kpis.iter().all(|k| k.key != "average_ticket" && k.key != "adr"));
    }

    #[test]
    fn test_every_template_benchmark_is_reported() {
        use crate::plan::PlanOverrides;
        use crate::projection::ProjectionEngine;

        let engine = ProjectionEngine::default();
        for template in engine.catalog().templates() {
            let result = engine.compute(&template.id, &PlanOverrides::default()).unwrap();
            for key in template.operational_kpis.keys() {
                assert!(
                    result.kpis.iter().any(|k| &k.key == key),
                    "{} declares {} but it is never computed",
                    template.id,
                    key
                );
            }
        }
    }

    #[test]
    fn test_is_met() {
        assert!(KpiStatus::Good.is_met());
        assert!(!KpiStatus::Warning.is_met());
        assert_eq!(KpiStatus::Warning.to_string(), "warning");
    }
}
