//! Run every catalog sector with default overrides and rank them
//!
//! Outputs a per-sector summary CSV alongside the console ranking

use std::time::Instant;

use anyhow::{Context, Result};
use bizplan::{PlanOverrides, ProjectionEngine, ProjectionSummary};
use rayon::prelude::*;

fn main() -> Result<()> {
    env_logger::init();

    let start = Instant::now();
    let engine = ProjectionEngine::default();
    let overrides = PlanOverrides::default();
    let ids: Vec<&str> = engine.catalog().ids().collect();
    println!("Projecting {} sectors over {} months...", ids.len(), overrides.horizon_months);

    // Run projections in parallel
    let mut summaries: Vec<ProjectionSummary> = ids
        .par_iter()
        .filter_map(|id| match engine.compute(id, &overrides) {
            Ok(result) => Some(result.summary()),
            Err(e) => {
                log::warn!("Sector {} skipped: {}", id, e);
                None
            }
        })
        .collect();

    println!("Projections complete in {:?}\n", start.elapsed());

    summaries.sort_by(|a, b| b.npv.total_cmp(&a.npv));

    println!("{:>4} {:<14} {:>12} {:>12} {:>9} {:>8} {:>7} {:>7}",
        "Rank", "Sector", "Revenue Y1", "NPV", "IRR", "Payback", "Credit", "Grade");
    println!("{}", "-".repeat(80));
    for (rank, s) in summaries.iter().enumerate() {
        println!("{:>4} {:<14} {:>12.0} {:>12.0} {:>9} {:>8} {:>7} {:>7}",
            rank + 1,
            s.sector_id,
            s.revenue_year1,
            s.npv,
            s.irr_annual.map(|r| format!("{:.1}%", r * 100.0)).unwrap_or_else(|| "n/a".into()),
            s.payback_month.map(|m| m.to_string()).unwrap_or_else(|| "-".into()),
            s.credit_grade,
            s.business_grade,
        );
    }

    let output_path = "sector_comparison.csv";
    let mut writer = csv::Writer::from_path(output_path)
        .with_context(|| format!("creating {}", output_path))?;
    for s in &summaries {
        writer.serialize(s)?;
    }
    writer.flush()?;
    println!("\nOutput written to {}", output_path);

    Ok(())
}
