//! Business Plan - projection engine for small-business financial plans
//!
//! This library provides:
//! - Sector templates with investment, cost structure and revenue streams
//! - Monthly customer, revenue and cost projections with seasonality
//! - P&L and cash flow with depreciation, tax and loan interest
//! - NPV, IRR, payback, break-even, banking ratios and credit grade
//! - Operational KPIs, business rating and scenario sensitivity

pub mod error;
pub mod sector;
pub mod plan;
pub mod projection;
pub mod metrics;
pub mod scenario;

// Re-export commonly used types
pub use error::{PlanError, PlanResult};
pub use sector::{SectorCatalog, SectorTemplate, Seasonality, RevenueStream, StreamFormula, CostItem};
pub use plan::{PlanOverrides, PlanInputs, LoanParams, ScenarioAdjustment};
pub use projection::{ProjectionEngine, ProjectionResult, ProjectionSummary, MonthlyProjection};
pub use metrics::{FinancialMetrics, BankingAssessment, BusinessRating, Kpi};
pub use scenario::{ScenarioRunner, SensitivityCase};
