//! Business Plan CLI
//!
//! Command-line interface for projecting a sector plan

use std::path::PathBuf;

use anyhow::{Context, Result};
use bizplan::sector::loader::load_operational_costs;
use bizplan::{PlanOverrides, ProjectionEngine, ScenarioRunner, SectorCatalog};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "bizplan", version, about = "Monthly business-plan projection")]
struct Cli {
    /// Sector template id
    #[arg(long, default_value = "gym-fitness")]
    sector: String,

    /// Projection horizon in months (overrides the overrides file)
    #[arg(long)]
    months: Option<u32>,

    /// JSON file with plan overrides
    #[arg(long)]
    overrides: Option<PathBuf>,

    /// JSON sector catalog replacing the builtin one
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// CSV of extra operational cost items
    #[arg(long)]
    costs: Option<PathBuf>,

    /// Where to write the month table
    #[arg(long, default_value = "projection_output.csv")]
    csv: PathBuf,

    /// Print the full result as JSON instead of the summary
    #[arg(long)]
    json: bool,

    /// Also run the pessimistic/base/optimistic stress
    #[arg(long)]
    sensitivity: bool,

    /// List catalog sectors and exit
    #[arg(long)]
    list: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let catalog = match &cli.catalog {
        Some(path) => SectorCatalog::from_json_path(path)
            .with_context(|| format!("loading catalog {}", path.display()))?,
        None => SectorCatalog::builtin(),
    };

    if cli.list {
        for template in catalog.templates() {
            println!(
                "{:<14} {:<32} {:>12.0}",
                template.id, template.name, template.investment_range.average
            );
        }
        return Ok(());
    }

    let mut overrides = match &cli.overrides {
        Some(path) => PlanOverrides::from_json_path(path)
            .with_context(|| format!("loading overrides {}", path.display()))?,
        None => PlanOverrides::default(),
    };
    if let Some(months) = cli.months {
        overrides.horizon_months = months;
    }
    if let Some(path) = &cli.costs {
        let costs = load_operational_costs(path)
            .with_context(|| format!("loading operational costs {}", path.display()))?;
        overrides.operational_costs.extend(costs);
    }

    let engine = ProjectionEngine::new(catalog.clone());
    let result = engine
        .compute(&cli.sector, &overrides)
        .with_context(|| format!("projecting sector {}", cli.sector))?;

    result
        .write_csv_path(&cli.csv)
        .with_context(|| format!("writing {}", cli.csv.display()))?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    let template = catalog.get(&cli.sector)?;
    println!("{} ({})", template.name, template.sector);
    println!("{}\n", "=".repeat(60));

    println!("{:>5} {:>7} {:>6} {:>12} {:>12} {:>12} {:>14}",
        "Month", "Date", "Active", "Revenue", "Cost", "EBITDA", "Cumul. cash");
    println!("{}", "-".repeat(74));
    for row in result.months.iter().take(12) {
        println!("{:>5} {:>4}-{:02} {:>6} {:>12.0} {:>12.0} {:>12.0} {:>14.0}",
            row.month,
            row.year,
            row.calendar_month,
            row.active_customers,
            row.total_revenue,
            row.total_cost,
            row.ebitda,
            row.cumulative_cash_flow,
        );
    }
    if result.months.len() > 12 {
        println!("... ({} more months)", result.months.len() - 12);
    }
    println!("\nFull results written to: {}", cli.csv.display());

    let summary = result.summary();
    let fmt_opt = |v: Option<u32>| v.map(|m| m.to_string()).unwrap_or_else(|| "never".into());
    println!("\nSummary:");
    println!("  Initial investment: {:.0}", result.initial_investment);
    println!("  Year-1 revenue:     {:.0}", summary.revenue_year1);
    println!("  Year-1 EBITDA:      {:.0}", summary.ebitda_year1);
    println!("  Year-1 net income:  {:.0}", summary.net_income_year1);
    println!("  NPV:                {:.0}", summary.npv);
    match summary.irr_annual {
        Some(irr) => println!("  IRR (annual):       {:.2}%", irr * 100.0),
        None => println!("  IRR (annual):       undefined"),
    }
    println!("  Payback month:      {}", fmt_opt(summary.payback_month));
    println!("  Break-even month:   {}", fmt_opt(summary.break_even_month));
    match result.banking.ratios.dscr {
        Some(dscr) => println!("  DSCR:               {:.2}", dscr),
        None => println!("  DSCR:               no debt"),
    }
    println!("  Credit grade:       {} ({})", summary.credit_grade, result.banking.rating.score);
    println!("  Business grade:     {} ({})", summary.business_grade, result.rating.score);
    println!("  {}", result.rating.recommendation);

    println!("\nKPIs:");
    for kpi in &result.kpis {
        println!("  {:<22} {:>10.2} target {:>10.2}  {}", kpi.key, kpi.value, kpi.target, kpi.status);
    }

    if cli.sensitivity {
        let runner = ScenarioRunner::with_catalog(catalog);
        println!("\nSensitivity:");
        for case in runner.sensitivity(&cli.sector, &overrides)? {
            println!("  {:<12} NPV {:>12.0}  IRR {:>8}  payback {:>6}  revenue Y1 {:>12.0}",
                case.name,
                case.npv,
                case.irr_annual.map(|r| format!("{:.2}%", r * 100.0)).unwrap_or_else(|| "n/a".into()),
                fmt_opt(case.payback_month),
                case.revenue_year1,
            );
        }
    }

    Ok(())
}
