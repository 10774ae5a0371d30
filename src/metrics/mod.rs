//! Financial, banking and operational metrics derived from a month sequence

pub mod irr;
mod pnl;
mod financial;
mod banking;
mod kpis;
mod rating;

pub use pnl::{IncomeStatement, PnlPolicy};
pub(crate) use financial::ratio;
pub use financial::{year_slice, FinancialMetrics, FinancialMetricsEngine, PeriodTotals, MIN_MONTHS};
pub use banking::{
    BankingAndRatingEngine, BankingAssessment, BankingRatios, CreditGrade, CreditRating,
    ScoreBreakdown,
};
pub use kpis::{
    compute_kpis, cost_elasticity, CostSummary, CustomerSummary, Kpi, KpiStatus, RevenueSummary,
    StreamSummary,
};
pub use rating::{BusinessGrade, BusinessRating, RatingScores};
