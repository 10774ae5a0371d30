//! Monthly cost breakdown: fixed, staff, one-off and variable items

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::customers::MonthlyCustomers;
use super::revenue::MonthlyRevenue;
use super::round_half_up;
use crate::plan::PlanInputs;
use crate::sector::{CostCategory, CostItem, CostRule, OperationalCost, StructuredCost};

/// One cost item's contribution in a month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostLine {
    pub key: String,
    pub category: CostCategory,
    pub fixed: f64,
    pub variable: f64,
    /// Whether the amount was scaled by the seasonal factor
    pub seasonal: bool,
}

impl CostLine {
    pub fn total(&self) -> f64 {
        self.fixed + self.variable
    }
}

/// Costs for one projection month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyCost {
    pub month: u32,
    pub lines: Vec<CostLine>,
    pub by_category: BTreeMap<CostCategory, f64>,
    pub total_fixed: f64,
    pub total_variable: f64,
    pub total: f64,
}

impl MonthlyCost {
    fn from_lines(month: u32, lines: Vec<CostLine>) -> Self {
        let mut by_category = BTreeMap::new();
        let mut total_fixed = 0.0;
        let mut total_variable = 0.0;
        for line in &lines {
            *by_category.entry(line.category).or_insert(0.0) += line.total();
            total_fixed += line.fixed;
            total_variable += line.variable;
        }
        Self {
            month,
            lines,
            by_category,
            total_fixed,
            total_variable,
            total: total_fixed + total_variable,
        }
    }

    pub fn line(&self, key: &str) -> Option<&CostLine> {
        self.lines.iter().find(|l| l.key == key)
    }

    pub fn category(&self, category: CostCategory) -> f64 {
        self.by_category.get(&category).copied().unwrap_or(0.0)
    }
}

/// Evaluates the cost schedule and the user operational costs
#[derive(Debug, Clone)]
pub struct CostProjector {
    schedule: Vec<CostItem>,
    operational: Vec<OperationalCost>,
    /// Grace applied to `Rent` items without their own
    rent_grace_months: u32,
}

impl CostProjector {
    pub fn new(schedule: Vec<CostItem>, operational: Vec<OperationalCost>) -> Self {
        Self { schedule, operational, rent_grace_months: 0 }
    }

    pub fn from_inputs(inputs: &PlanInputs) -> Self {
        Self::new(inputs.cost_schedule.clone(), inputs.operational_costs.clone())
            .with_rent_grace(inputs.temporal.rent_grace_months)
    }

    pub fn with_rent_grace(mut self, months: u32) -> Self {
        self.rent_grace_months = months;
        self
    }

    fn grace_for(&self, item: &CostItem, explicit: Option<u32>) -> u32 {
        match explicit {
            Some(months) => months,
            None if item.category == CostCategory::Rent => self.rent_grace_months,
            None => 0,
        }
    }

    fn structured_line(
        &self,
        item: &CostItem,
        rule: &StructuredCost,
        customers: &MonthlyCustomers,
        revenue_total: f64,
    ) -> CostLine {
        let month = customers.month;
        let mut line = CostLine {
            key: item.key.clone(),
            category: item.category,
            fixed: 0.0,
            variable: 0.0,
            seasonal: rule.seasonal,
        };
        if rule.initial_only && month != 1 {
            return line;
        }

        let mut fixed = match rule.schedule_by_quarter.as_deref() {
            Some(tiers) if !tiers.is_empty() => {
                let tier = (((month - 1) / 3) as usize).min(tiers.len() - 1);
                tiers[tier]
            }
            _ => rule.base,
        };
        if let Some(peak) = rule.peak_amount {
            if rule.peak_months.contains(&customers.calendar_month) {
                fixed = peak;
            }
        }
        if month <= self.grace_for(item, rule.grace_months) {
            fixed = 0.0;
        }

        let mut variable = rule.variable_per_customer.unwrap_or(0.0) * customers.active_customers as f64
            + rule.percent_of_revenue.unwrap_or(0.0) * revenue_total;

        if rule.seasonal {
            fixed *= customers.seasonal_factor;
            variable *= customers.seasonal_factor;
        }

        line.fixed = round_half_up(fixed);
        line.variable = round_half_up(variable);
        line
    }

    fn schedule_line(&self, item: &CostItem, customers: &MonthlyCustomers, revenue_total: f64) -> CostLine {
        match &item.rule {
            CostRule::Flat(amount) => {
                let fixed = if customers.month <= self.grace_for(item, None) { 0.0 } else { *amount };
                CostLine {
                    key: item.key.clone(),
                    category: item.category,
                    fixed: round_half_up(fixed),
                    variable: 0.0,
                    seasonal: false,
                }
            }
            CostRule::Structured(rule) => self.structured_line(item, rule, customers, revenue_total),
        }
    }

    fn operational_line(cost: &OperationalCost, customers: &MonthlyCustomers) -> CostLine {
        let factor = if cost.has_seasonality { customers.seasonal_factor } else { 1.0 };
        CostLine {
            key: cost.id.clone(),
            category: cost.category,
            fixed: round_half_up(cost.base_amount * factor),
            variable: round_half_up(cost.variable_rate * customers.active_customers as f64 * factor),
            seasonal: cost.has_seasonality,
        }
    }

    /// Cost breakdown for one month
    pub fn evaluate_month(&self, customers: &MonthlyCustomers, revenue: &MonthlyRevenue) -> MonthlyCost {
        let lines = self
            .schedule
            .iter()
            .map(|item| self.schedule_line(item, customers, revenue.total))
            .chain(self.operational.iter().map(|cost| Self::operational_line(cost, customers)))
            .collect();
        MonthlyCost::from_lines(customers.month, lines)
    }

    pub fn project(&self, customers: &[MonthlyCustomers], revenue: &[MonthlyRevenue]) -> Vec<MonthlyCost> {
        customers
            .iter()
            .zip(revenue)
            .map(|(c, r)| self.evaluate_month(c, r))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::customers::project_customers;
    use crate::sector::Seasonality;

    fn zero_revenue(months: u32) -> Vec<MonthlyRevenue> {
        (1..=months)
            .map(|month| MonthlyRevenue { month, by_stream: BTreeMap::new(), total: 0.0 })
            .collect()
    }

    fn run(schedule: Vec<CostItem>, months: u32) -> Vec<MonthlyCost> {
        let customers = project_customers(0, 0.0, 0.0, &Seasonality::flat(), months);
        CostProjector::new(schedule, vec![]).project(&customers, &zero_revenue(months))
    }

    #[test]
    fn test_rent_grace() {
        let rent = CostItem::structured(
            "rent",
            "Rent",
            CostCategory::Rent,
            StructuredCost { base: 3_000.0, grace_months: Some(2), ..Default::default() },
        );
        let costs = run(vec![rent], 6);
        assert_eq!(costs[0].total, 0.0);
        assert_eq!(costs[1].total, 0.0);
        assert!(costs[2..].iter().all(|c| c.total == 3_000.0));
    }

    #[test]
    fn test_flat_rent_uses_template_grace() {
        let customers = project_customers(0, 0.0, 0.0, &Seasonality::flat(), 4);
        let projector = CostProjector::new(vec![CostItem::flat("rent", "Rent", CostCategory::Rent, 1_200.0)], vec![])
            .with_rent_grace(3);
        let costs = projector.project(&customers, &zero_revenue(4));
        assert_eq!(costs[2].category(CostCategory::Rent), 0.0);
        assert_eq!(costs[3].category(CostCategory::Rent), 1_200.0);
    }

    #[test]
    fn test_staff_schedule_holds_last_tier() {
        let staff = CostItem::structured(
            "staff",
            "Staff",
            CostCategory::Personnel,
            StructuredCost { schedule_by_quarter: Some(vec![0.0, 1_000.0, 2_000.0]), ..Default::default() },
        );
        let totals: Vec<f64> = run(vec![staff], 7).iter().map(|c| c.total).collect();
        assert_eq!(totals, vec![0.0, 0.0, 0.0, 1_000.0, 1_000.0, 1_000.0, 2_000.0]);
    }

    #[test]
    fn test_initial_only_cost() {
        let launch = CostItem::structured(
            "opening_advertising",
            "Opening advertising",
            CostCategory::Marketing,
            StructuredCost { base: 10_000.0, initial_only: true, ..Default::default() },
        );
        let costs = run(vec![launch], 3);
        assert_eq!(costs[0].total, 10_000.0);
        assert_eq!(costs[1].total, 0.0);
    }

    #[test]
    fn test_variable_costs() {
        let customers = project_customers(200, 0.0, 0.0, &Seasonality::flat(), 1);
        let revenue = vec![MonthlyRevenue { month: 1, by_stream: BTreeMap::new(), total: 10_000.0 }];
        let item = CostItem::structured(
            "raw_materials",
            "Raw materials",
            CostCategory::Supplies,
            StructuredCost {
                base: 2_000.0,
                variable_per_customer: Some(2.5),
                percent_of_revenue: Some(0.32),
                ..Default::default()
            },
        );
        let month = &CostProjector::new(vec![item], vec![]).project(&customers, &revenue)[0];
        assert_eq!(month.total_fixed, 2_000.0);
        assert_eq!(month.total_variable, 500.0 + 3_200.0);
        assert_eq!(month.total, 5_700.0);
    }

    #[test]
    fn test_operational_cost_with_seasonality() {
        let mut f = [1.0; 12];
        f[0] = 1.5;
        let customers = project_customers(10, 0.0, 0.0, &Seasonality::from_factors(f), 2);
        let cleaning = OperationalCost {
            id: "cleaning".into(),
            name: "Cleaning".into(),
            category: CostCategory::Operational,
            base_amount: 400.0,
            variable_rate: 2.0,
            has_seasonality: true,
        };
        let costs = CostProjector::new(vec![], vec![cleaning]).project(&customers, &zero_revenue(2));
        assert_eq!(costs[0].total_fixed, 600.0);
        assert_eq!(costs[0].total_variable, 30.0);
        assert_eq!(costs[1].total, 420.0);
    }

    #[test]
    fn test_peak_month_amount() {
        let marketing = CostItem::structured(
            "marketing",
            "Marketing",
            CostCategory::Marketing,
            StructuredCost { base: 1_500.0, peak_amount: Some(3_000.0), peak_months: vec![6, 7, 8], ..Default::default() },
        );
        let costs = run(vec![marketing], 9);
        assert_eq!(costs[4].total, 1_500.0);
        assert_eq!(costs[5].total, 3_000.0);
        assert_eq!(costs[7].total, 3_000.0);
        assert_eq!(costs[8].total, 1_500.0);
    }
}
