//! Overall business rating from financial, operational, market and risk scores

use std::fmt;

use serde::{Deserialize, Serialize};

use super::financial::FinancialMetrics;
use super::kpis::{CustomerSummary, Kpi, RevenueSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BusinessGrade {
    #[serde(rename = "A+")]
    APlus,
    A,
    #[serde(rename = "B+")]
    BPlus,
    B,
    C,
    D,
}

impl BusinessGrade {
    pub fn from_score(score: u32) -> Self {
        match score {
            s if s >= 90 => BusinessGrade::APlus,
            s if s >= 80 => BusinessGrade::A,
            s if s >= 70 => BusinessGrade::BPlus,
            s if s >= 60 => BusinessGrade::B,
            s if s >= 50 => BusinessGrade::C,
            _ => BusinessGrade::D,
        }
    }

    pub fn recommendation(&self) -> &'static str {
        match self {
            BusinessGrade::APlus | BusinessGrade::A => {
                "Excellent project: highly recommended for investment."
            }
            BusinessGrade::BPlus | BusinessGrade::B => {
                "Viable project with good potential. Review some operational KPIs."
            }
            BusinessGrade::C => "Project with moderate risk. Optimize costs and improve retention.",
            BusinessGrade::D => "High-risk project. Rethink the business model.",
        }
    }
}

impl fmt::Display for BusinessGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BusinessGrade::APlus => "A+",
            BusinessGrade::A => "A",
            BusinessGrade::BPlus => "B+",
            BusinessGrade::B => "B",
            BusinessGrade::C => "C",
            BusinessGrade::D => "D",
        };
        f.write_str(s)
    }
}

/// Sub-scores, each in 0..=25
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingScores {
    pub financial: u32,
    pub operational: u32,
    pub market: u32,
    pub risk: u32,
}

impl RatingScores {
    pub fn total(&self) -> u32 {
        self.financial + self.operational + self.market + self.risk
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessRating {
    pub score: u32,
    pub grade: BusinessGrade,
    pub scores: RatingScores,
    pub recommendation: String,
}

impl BusinessRating {
    pub fn compute(
        financial: &FinancialMetrics,
        dscr: Option<f64>,
        kpis: &[Kpi],
        customers: &CustomerSummary,
        revenue: &RevenueSummary,
    ) -> Self {
        let scores = RatingScores {
            financial: financial_score(financial, dscr),
            operational: operational_score(kpis),
            market: market_score(revenue, customers),
            risk: risk_score(financial, customers),
        };
        let score = scores.total();
        let grade = BusinessGrade::from_score(score);
        Self {
            score,
            grade,
            scores,
            recommendation: grade.recommendation().to_string(),
        }
    }
}

fn financial_score(financial: &FinancialMetrics, dscr: Option<f64>) -> u32 {
    let mut score = 0;
    match financial.irr_annual {
        Some(irr) if irr >= 0.20 => score += 10,
        Some(irr) if irr >= 0.15 => score += 7,
        Some(irr) if irr >= 0.10 => score += 5,
        _ => {}
    }
    if financial.npv > 0.0 {
        score += 10;
    }
    // Without debt the coverage test passes
    if dscr.map_or(true, |d| d >= 1.5) {
        score += 5;
    }
    score
}

fn operational_score(kpis: &[Kpi]) -> u32 {
    if kpis.is_empty() {
        return 0;
    }
    let met = kpis.iter().filter(|k| k.status.is_met()).count();
    (met as f64 / kpis.len() as f64 * 25.0).round() as u32
}

fn market_score(revenue: &RevenueSummary, customers: &CustomerSummary) -> u32 {
    let mut score = 5;
    if revenue.diversification_index >= 0.7 {
        score += 10;
    }
    if customers.customer_cagr >= 0.15 {
        score += 10;
    }
    score
}

fn risk_score(financial: &FinancialMetrics, customers: &CustomerSummary) -> u32 {
    let mut score = 5;
    if customers.average_retention_year1 >= 0.8 {
        score += 10;
    }
    if financial.payback_month.is_some_and(|m| m <= 24) {
        score += 10;
    }
    score
}
