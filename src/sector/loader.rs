//! Load sector catalogs from JSON and operational cost items from CSV

use super::{CostCategory, OperationalCost, SectorCatalog, SectorTemplate};
use crate::error::{PlanError, PlanResult};
use csv::Reader;
use std::fs;
use std::path::Path;

/// Raw CSV row for a user operational cost
#[derive(Debug, serde::Deserialize)]
struct CsvRow {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    category: String,
    base_amount: f64,
    #[serde(default)]
    variable_rate: f64,
    #[serde(default)]
    has_seasonality: String,
}

impl CsvRow {
    fn to_cost(self) -> PlanResult<OperationalCost> {
        let category = match self.category.trim().to_lowercase().as_str() {
            "operational" => CostCategory::Operational,
            "rent" => CostCategory::Rent,
            "personnel" | "staff" => CostCategory::Personnel,
            "equipment" => CostCategory::Equipment,
            "marketing" => CostCategory::Marketing,
            "legal" => CostCategory::Legal,
            "supplies" => CostCategory::Supplies,
            "" | "other" => CostCategory::Other,
            other => {
                return Err(PlanError::missing(format!(
                    "known cost category for '{}' (got '{}')",
                    self.id, other
                )))
            }
        };

        let has_seasonality = matches!(
            self.has_seasonality.trim().to_lowercase().as_str(),
            "true" | "yes" | "1"
        );

        Ok(OperationalCost {
            name: if self.name.is_empty() { self.id.clone() } else { self.name },
            id: self.id,
            category,
            base_amount: self.base_amount,
            variable_rate: self.variable_rate,
            has_seasonality,
        })
    }
}

/// Load operational cost items from a CSV file with headers
/// `id,name,category,base_amount,variable_rate,has_seasonality`
pub fn load_operational_costs<P: AsRef<Path>>(path: P) -> PlanResult<Vec<OperationalCost>> {
    let mut reader = Reader::from_path(path)?;
    let mut costs = Vec::new();

    for result in reader.deserialize() {
        let row: CsvRow = result?;
        costs.push(row.to_cost()?);
    }

    Ok(costs)
}

/// Parse operational cost items from in-memory CSV text
pub fn parse_operational_costs(data: &str) -> PlanResult<Vec<OperationalCost>> {
    let mut reader = Reader::from_reader(data.as_bytes());
    reader
        .deserialize::<CsvRow>()
        .map(|row| row?.to_cost())
        .collect()
}

impl SectorCatalog {
    /// Parse a JSON array of templates
    pub fn from_json_str(json: &str) -> PlanResult<Self> {
        let templates: Vec<SectorTemplate> = serde_json::from_str(json)?;
        if templates.is_empty() {
            return Err(PlanError::missing("sector templates in catalog"));
        }
        Self::new(templates)
    }

    /// Load a JSON catalog file
    pub fn from_json_path<P: AsRef<Path>>(path: P) -> PlanResult<Self> {
        let data = fs::read_to_string(path)?;
        Self::from_json_str(&data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_operational_costs() {
        let data = "id,name,category,base_amount,variable_rate,has_seasonality\n\
                    cleaning,Cleaning,operational,400,0.5,true\n\
                    lawyer,,legal,150,0,no\n";
        let costs = parse_operational_costs(data).unwrap();
        assert_eq!(costs.len(), 2);
        assert_eq!(costs[0].category, CostCategory::Operational);
        assert!(costs[0].has_seasonality);
        assert_eq!(costs[1].name, "lawyer");
        assert!(!costs[1].has_seasonality);
    }

    #[test]
    fn test_unknown_category_rejected() {
        let data = "id,name,category,base_amount,variable_rate,has_seasonality\n\
                    x,X,spaceships,1,0,false\n";
        assert!(parse_operational_costs(data).is_err());
    }

    #[test]
    fn test_catalog_roundtrips_through_json() {
        let builtin = SectorCatalog::builtin();
        let templates: Vec<_> = builtin.templates().cloned().collect();
        let json = serde_json::to_string(&templates).unwrap();

        let loaded = SectorCatalog::from_json_str(&json).unwrap();
        assert_eq!(loaded.len(), builtin.len());
        let restaurant = loaded.get("restaurant").unwrap();
        assert_eq!(restaurant.revenue_streams.len(), 4);
        assert_eq!(restaurant.cost_schedule.len(), 9);
        assert_eq!(restaurant.temporal_aspects.ramp_up_months, 4);
    }

    #[test]
    fn test_empty_catalog_is_missing_input() {
        let err = SectorCatalog::from_json_str("[]").unwrap_err();
        assert!(matches!(err, PlanError::MissingInput { .. }));
    }
}
