//! Banking ratios and the credit scoring table
//!
//! The score is a fixed point table over debt coverage, leverage and return on
//! investment plus a baseline, mapped to a letter grade:
//!
//! | component | bands                                              |
//! |-----------|----------------------------------------------------|
//! | DSCR      | ≥2.0 → 30, ≥1.5 → 25, ≥1.25 → 20, ≥1.0 → 10, else 0 |
//! | leverage  | ≤0.5 → 25, ≤0.7 → 20, ≤0.8 → 15, else 5            |
//! | ROI       | ≥25% → 25, ≥20% → 20, ≥15% → 15, else 10           |
//! | baseline  | 20                                                 |
//!
//! A plan without debt has no DSCR and scores the top DSCR band.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::financial::{ratio, FinancialMetrics};
use crate::plan::LoanParams;

pub const BASELINE_POINTS: u32 = 20;

/// Debt and liquidity ratios
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankingRatios {
    /// Loan payments due in the first 12 months
    pub annual_debt_service: f64,
    /// Year-1 EBITDA over annual debt service; `None` without debt
    pub dscr: Option<f64>,
    pub leverage_ratio: f64,
    pub autonomy_ratio: f64,
    /// Year-1 EBITDA over year-1 interest; `None` without interest
    pub interest_coverage: Option<f64>,
    /// Principal over year-1 EBITDA; `None` unless EBITDA is positive
    pub debt_to_ebitda: Option<f64>,
    /// Closing year-1 cash over average monthly cost
    pub cash_ratio: f64,
    /// Average monthly revenue over average monthly cost
    pub liquidity_ratio: f64,
}

/// Letter grade, best first
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CreditGrade {
    AAA,
    AA,
    A,
    BBB,
    BB,
    B,
    C,
}

impl CreditGrade {
    pub fn from_score(score: u32) -> Self {
        match score {
            90.. => CreditGrade::AAA,
            80..=89 => CreditGrade::AA,
            70..=79 => CreditGrade::A,
            60..=69 => CreditGrade::BBB,
            50..=59 => CreditGrade::BB,
            40..=49 => CreditGrade::B,
            _ => CreditGrade::C,
        }
    }

    pub fn is_investment_grade(&self) -> bool {
        *self <= CreditGrade::BBB
    }
}

impl fmt::Display for CreditGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CreditGrade::AAA => "AAA",
            CreditGrade::AA => "AA",
            CreditGrade::A => "A",
            CreditGrade::BBB => "BBB",
            CreditGrade::BB => "BB",
            CreditGrade::B => "B",
            CreditGrade::C => "C",
        };
        f.write_str(s)
    }
}

/// Points awarded per component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub dscr: u32,
    pub leverage: u32,
    pub roi: u32,
    pub baseline: u32,
}

impl ScoreBreakdown {
    pub fn total(&self) -> u32 {
        self.dscr + self.leverage + self.roi + self.baseline
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditRating {
    pub score: u32,
    pub grade: CreditGrade,
    pub breakdown: ScoreBreakdown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankingAssessment {
    pub ratios: BankingRatios,
    pub rating: CreditRating,
}

fn dscr_points(dscr: Option<f64>) -> u32 {
    match dscr {
        None => 30,
        Some(d) if d >= 2.0 => 30,
        Some(d) if d >= 1.5 => 25,
        Some(d) if d >= 1.25 => 20,
        Some(d) if d >= 1.0 => 10,
        Some(_) => 0,
    }
}

fn leverage_points(leverage: f64) -> u32 {
    if leverage <= 0.5 {
        25
    } else if leverage <= 0.7 {
        20
    } else if leverage <= 0.8 {
        15
    } else {
        5
    }
}

fn roi_points(roi: f64) -> u32 {
    if roi >= 0.25 {
        25
    } else if roi >= 0.20 {
        20
    } else if roi >= 0.15 {
        15
    } else {
        10
    }
}

/// Derives banking ratios and the credit rating
pub struct BankingAndRatingEngine;

impl BankingAndRatingEngine {
    pub fn compute(financial: &FinancialMetrics, loan: Option<&LoanParams>) -> BankingAssessment {
        let ratios = Self::ratios(financial, loan);
        let rating = Self::rate(financial, &ratios);
        BankingAssessment { ratios, rating }
    }

    pub fn ratios(financial: &FinancialMetrics, loan: Option<&LoanParams>) -> BankingRatios {
        let principal = loan.map(|l| l.principal.max(0.0)).unwrap_or(0.0);
        let annual_debt_service: f64 = loan
            .map(|l| l.schedule(12).iter().map(|p| p.payment).sum())
            .unwrap_or(0.0);

        let ebitda = financial.year1.ebitda;
        let interest = financial.year1.interest;
        let leverage_ratio = ratio(principal, financial.initial_investment);

        BankingRatios {
            annual_debt_service,
            dscr: (annual_debt_service > 0.0).then(|| ebitda / annual_debt_service),
            leverage_ratio,
            autonomy_ratio: 1.0 - leverage_ratio,
            interest_coverage: (interest > 0.0).then(|| ebitda / interest),
            debt_to_ebitda: (principal > 0.0 && ebitda > 0.0).then(|| principal / ebitda),
            cash_ratio: ratio(financial.closing_cash_year1, financial.average_monthly_cost_year1),
            liquidity_ratio: ratio(financial.average_monthly_revenue_year1, financial.average_monthly_cost_year1),
        }
    }

    /// Score the plan; recomputed from scratch on every call
    pub fn rate(financial: &FinancialMetrics, ratios: &BankingRatios) -> CreditRating {
        let breakdown = ScoreBreakdown {
            dscr: dscr_points(ratios.dscr),
            leverage: leverage_points(ratios.leverage_ratio),
            roi: roi_points(financial.roi),
            baseline: BASELINE_POINTS,
        };
        let score = breakdown.total();
        CreditRating { score, grade: CreditGrade::from_score(score), breakdown }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grade_thresholds() {
        assert_eq!(CreditGrade::from_score(100), CreditGrade::AAA);
        assert_eq!(CreditGrade::from_score(90), CreditGrade::AAA);
        assert_eq!(CreditGrade::from_score(89), CreditGrade::AA);
        assert_eq!(CreditGrade::from_score(60), CreditGrade::BBB);
        assert_eq!(CreditGrade::from_score(40), CreditGrade::B);
        assert_eq!(CreditGrade::from_score(39), CreditGrade::C);
        assert!(CreditGrade::BBB.is_investment_grade());
        assert!(!CreditGrade::BB.is_investment_grade());
        assert_eq!(CreditGrade::BBB.to_string(), "BBB");
    }

    #[test]
    fn test_band_edges() {
        assert_eq!(dscr_points(None), 30);
        assert_eq!(dscr_points(Some(1.5)), 25);
        assert_eq!(dscr_points(Some(1.249)), 10);
        assert_eq!(dscr_points(Some(0.8)), 0);
        assert_eq!(leverage_points(0.5), 25);
        assert_eq!(leverage_points(0.81), 5);
        assert_eq!(roi_points(0.20), 20);
        assert_eq!(roi_points(-1.0), 10);
    }
}
