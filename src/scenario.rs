//! Scenario runner for batch and sensitivity projections
//!
//! Holds the sector catalog once, then runs many plans against it with
//! different overrides. Batches are evaluated in parallel; every plan is an
//! independent computation over shared read-only templates.

use log::info;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::PlanResult;
use crate::plan::{PlanInputs, PlanOverrides, ScenarioAdjustment};
use crate::projection::{ProjectionEngine, ProjectionResult};
use crate::sector::SectorCatalog;

/// Outcome of one stressed scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityCase {
    pub name: String,
    pub adjustment: ScenarioAdjustment,
    pub npv: f64,
    pub irr_annual: Option<f64>,
    pub payback_month: Option<u32>,
    pub revenue_year1: f64,
}

/// Pre-loaded scenario runner
///
/// # Example
/// ```ignore
/// let runner = ScenarioRunner::new();
///
/// for price in [40.0, 45.0, 50.0] {
///     let mut overrides = PlanOverrides::default();
///     overrides.stream_prices.insert("monthly_fee".into(), price);
///     let result = runner.run("gym-fitness", &overrides)?;
/// }
/// ```
pub struct ScenarioRunner {
    engine: ProjectionEngine,
}

impl ScenarioRunner {
    /// Create runner over the builtin catalog
    pub fn new() -> Self {
        Self::with_catalog(SectorCatalog::builtin())
    }

    pub fn with_catalog(catalog: SectorCatalog) -> Self {
        Self {
            engine: ProjectionEngine::new(catalog),
        }
    }

    pub fn catalog(&self) -> &SectorCatalog {
        self.engine.catalog()
    }

    /// Run a single plan
    pub fn run(&self, sector_id: &str, overrides: &PlanOverrides) -> PlanResult<ProjectionResult> {
        self.engine.compute(sector_id, overrides)
    }

    /// Run many override sets for one sector in parallel, keeping input order
    pub fn run_batch(&self, sector_id: &str, overrides: &[PlanOverrides]) -> Vec<PlanResult<ProjectionResult>> {
        overrides
            .par_iter()
            .map(|o| self.engine.compute(sector_id, o))
            .collect()
    }

    /// Run the same overrides against several sectors in parallel
    pub fn run_scenarios(&self, sector_ids: &[&str], overrides: &PlanOverrides) -> Vec<PlanResult<ProjectionResult>> {
        sector_ids
            .par_iter()
            .map(|id| self.engine.compute(id, overrides))
            .collect()
    }

    /// Pessimistic, base and optimistic stress of one plan
    pub fn sensitivity(&self, sector_id: &str, base: &PlanOverrides) -> PlanResult<Vec<SensitivityCase>> {
        let template = self.engine.catalog().get(sector_id)?;
        let inputs = PlanInputs::resolve(template, base)?;

        let cases = [
            ("pessimistic", ScenarioAdjustment::PESSIMISTIC),
            ("base", ScenarioAdjustment::BASE),
            ("optimistic", ScenarioAdjustment::OPTIMISTIC),
        ];

        let results: PlanResult<Vec<SensitivityCase>> = cases
            .par_iter()
            .map(|(name, adjustment)| {
                let mut stressed = inputs.clone();
                adjustment.apply(&mut stressed);
                let result = ProjectionEngine::compute_inputs(&stressed)?;
                Ok(SensitivityCase {
                    name: name.to_string(),
                    adjustment: *adjustment,
                    npv: result.financial.npv,
                    irr_annual: result.financial.irr_annual,
                    payback_month: result.financial.payback_month,
                    revenue_year1: result.financial.year1.revenue,
                })
            })
            .collect();

        let cases = results?;
        info!("Sensitivity for {}: {} scenarios", sector_id, cases.len());
        Ok(cases)
    }
}

impl Default for ScenarioRunner {
    fn default() -> Self {
        Self::new()
    }
}
