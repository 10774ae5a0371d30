//! Sector catalog
//!
//! An explicit, immutable set of templates handed to the engine at
//! construction. `builtin()` carries the six stock business models; tests and
//! callers can substitute their own via `new` or the JSON loader.

use std::collections::BTreeMap;

use super::formula::{
    CostCategory, CostItem, CustomBasis, RevenueStream, StreamFormula, StructuredCost,
};
use super::{
    CustomerManagement, InvestmentRange, KpiBenchmark, RequiredItem, Seasonality,
    SectorTemplate, TemporalAspects,
};
use crate::error::{PlanError, PlanResult};

/// Catalog of sector templates keyed by id
#[derive(Debug, Clone, Default)]
pub struct SectorCatalog {
    templates: BTreeMap<String, SectorTemplate>,
}

impl SectorCatalog {
    /// Build a catalog from templates, validating each one
    pub fn new(templates: Vec<SectorTemplate>) -> PlanResult<Self> {
        let mut map = BTreeMap::new();
        for template in templates {
            template.validate()?;
            map.insert(template.id.clone(), template);
        }
        Ok(Self { templates: map })
    }

    /// The stock catalog: gym, restaurant, e-commerce, rural hotel, consultancy, generic
    pub fn builtin() -> Self {
        let templates = vec![gym(), restaurant(), ecommerce(), rural_hotel(), consultancy(), generic()];
        Self {
            templates: templates.into_iter().map(|t| (t.id.clone(), t)).collect(),
        }
    }

    pub fn get(&self, id: &str) -> PlanResult<&SectorTemplate> {
        self.templates
            .get(id)
            .ok_or_else(|| PlanError::UnknownSector { id: id.to_string() })
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    pub fn templates(&self) -> impl Iterator<Item = &SectorTemplate> {
        self.templates.values()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Templates whose average investment fits the budget, cheapest first
    pub fn by_investment_budget(&self, budget: f64) -> Vec<&SectorTemplate> {
        let mut fits: Vec<_> = self
            .templates
            .values()
            .filter(|t| t.investment_range.average <= budget)
            .collect();
        fits.sort_by(|a, b| a.investment_range.average.total_cmp(&b.investment_range.average));
        fits
    }

    /// Templates whose sector label contains `query` (case-insensitive)
    pub fn by_sector(&self, query: &str) -> Vec<&SectorTemplate> {
        let query = query.to_lowercase();
        self.templates
            .values()
            .filter(|t| t.sector.to_lowercase().contains(&query))
            .collect()
    }
}

fn item(id: &str, name: &str, category: &str, price: f64) -> RequiredItem {
    RequiredItem {
        id: id.to_string(),
        name: name.to_string(),
        category: category.to_string(),
        estimated_price: price,
    }
}

fn kpi(target: f64, benchmark_sector: f64, critical: f64) -> KpiBenchmark {
    KpiBenchmark { target, benchmark_sector, critical }
}

fn kpis(entries: &[(&str, KpiBenchmark)]) -> BTreeMap<String, KpiBenchmark> {
    entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

fn gym() -> SectorTemplate {
    use CostCategory::*;
    SectorTemplate {
        id: "gym-fitness".into(),
        name: "Gym / Fitness Centre".into(),
        sector: "Sport/Fitness".into(),
        description: "Fitness centre with membership, add-on and registration revenue".into(),
        investment_range: InvestmentRange { min: 80_000.0, max: 150_000.0, average: 115_000.0 },
        required_items: vec![
            item("premises-fit-out", "Premises fit-out", "infrastructure", 25_000.0),
            item("cardio-equipment", "Cardio equipment", "equipment", 30_000.0),
            item("strength-equipment", "Strength equipment", "equipment", 35_000.0),
            item("changing-rooms", "Changing rooms and showers", "infrastructure", 12_000.0),
            item("member-software", "Member management software", "technology", 2_000.0),
            item("sound-hvac", "Sound system and climate control", "infrastructure", 6_000.0),
            item("equipment-leasing", "Fitness equipment leasing", "equipment", 0.0),
            item("music-licences", "Music and class licences", "legal", 341.0),
            item("liability-insurance", "Liability insurance", "legal", 1_500.0),
            item("opening-licences", "Opening licences", "legal", 2_000.0),
            item("opening-campaign", "Opening marketing campaign", "marketing", 3_000.0),
        ],
        // Flat block sums to 8,548 a month
        cost_schedule: vec![
            CostItem::flat("utilities", "Utilities", Supplies, 1_800.0),
            CostItem::flat("insurance", "Insurance", Legal, 100.0),
            CostItem::flat("accounting", "Accounting", Legal, 200.0),
            CostItem::flat("maintenance", "Maintenance", Operational, 800.0),
            CostItem::flat("music_licences", "Music licences", Legal, 341.0),
            CostItem::flat("advertising", "Advertising", Marketing, 500.0),
            CostItem::flat("other_operating", "Other operating", Other, 1_000.0),
            CostItem::flat("professional_services", "Professional services", Operational, 3_807.0),
            CostItem::structured("rent", "Rent", Rent, StructuredCost {
                base: 3_000.0,
                grace_months: Some(2),
                ..Default::default()
            }),
            CostItem::structured("staff", "Staff", Personnel, StructuredCost {
                schedule_by_quarter: Some(vec![0.0, 815.0, 1_630.0, 2_445.0]),
                ..Default::default()
            }),
            CostItem::flat("equipment_leasing", "Equipment leasing", Equipment, 1_500.0),
            CostItem::structured("opening_advertising", "Pre-opening advertising", Marketing, StructuredCost {
                base: 10_000.0,
                initial_only: true,
                ..Default::default()
            }),
            CostItem::structured("consumables", "Towels and cleaning consumables", Supplies, StructuredCost {
                variable_per_customer: Some(2.5),
                ..Default::default()
            }),
        ],
        revenue_streams: vec![
            RevenueStream::new("monthly_fee", "Monthly membership", StreamFormula::Subscription { base_price: 45.0 }),
            RevenueStream::new("registration", "Registration fee", StreamFormula::PerNewCustomer { price: 50.0 }),
            RevenueStream::new("personal_training", "Personal training", StreamFormula::CohortAddOn {
                cohort_fraction: 0.25,
                units_per_month: 4.0,
                unit_price: 25.0,
            }),
            RevenueStream::new("access_keys", "Access keys and cards", StreamFormula::PerNewCustomer { price: 11.0 }),
            RevenueStream::new("special_rates", "Student and senior rates", StreamFormula::Discount {
                discount_fraction: 0.20,
                discount_rate: 0.15,
                base_price: None,
            }),
        ],
        customer_management: CustomerManagement {
            initial_customers: 0,
            monthly_growth_base: 95.0,
            monthly_churn_rate: 0.08,
            seasonality: Seasonality::from_factors([1.4, 1.2, 1.0, 0.9, 0.8, 0.7, 0.6, 0.5, 1.3, 1.1, 0.9, 0.8]),
            year1_target: Some(710),
        },
        operational_kpis: kpis(&[
            ("revenue_per_customer", kpi(45.0, 42.0, 30.0)),
            ("retention_rate", kpi(0.75, 0.70, 0.60)),
            ("customers_per_m2", kpi(3.0, 2.8, 2.0)),
            ("occupancy", kpi(0.70, 0.65, 0.50)),
            ("ebitda_margin", kpi(0.25, 0.22, 0.15)),
        ]),
        temporal_aspects: TemporalAspects {
            rent_grace_months: 2,
            pre_opening_customers: 105,
            ramp_up_months: 6,
            ramp_up_initial_factor: 0.3,
            max_capacity: Some(1_200),
            floor_area_m2: Some(500.0),
        },
    }
}

fn restaurant() -> SectorTemplate {
    use CostCategory::*;
    SectorTemplate {
        id: "restaurant".into(),
        name: "Restaurant / Bar".into(),
        sector: "Hospitality".into(),
        description: "Restaurant with covers, beverages, set menus and catering".into(),
        investment_range: InvestmentRange { min: 60_000.0, max: 150_000.0, average: 105_000.0 },
        required_items: vec![
            item("premises", "Premises and fit-out", "infrastructure", 35_000.0),
            item("kitchen-equipment", "Professional kitchen equipment", "equipment", 25_000.0),
            item("furniture", "Furniture and decoration", "infrastructure", 15_000.0),
            item("licences", "Licences and permits", "legal", 3_000.0),
            item("opening-stock", "Opening food and beverage stock", "stock", 8_000.0),
            item("pos", "POS and management software", "technology", 2_500.0),
            item("opening-marketing", "Opening marketing", "marketing", 4_000.0),
            item("insurance", "Premises insurance", "legal", 1_200.0),
            item("uniforms", "Uniforms and tableware", "operational", 2_000.0),
            item("working-capital", "Initial working capital", "operational", 9_300.0),
        ],
        cost_schedule: vec![
            CostItem::flat("rent", "Rent", Rent, 3_500.0),
            CostItem::structured("staff", "Staff", Personnel, StructuredCost {
                base: 6_000.0,
                percent_of_revenue: Some(0.15),
                ..Default::default()
            }),
            CostItem::structured("raw_materials", "Raw materials", Supplies, StructuredCost {
                base: 2_000.0,
                percent_of_revenue: Some(0.32),
                ..Default::default()
            }),
            CostItem::flat("utilities", "Utilities", Supplies, 1_200.0),
            CostItem::flat("insurance", "Insurance", Legal, 100.0),
            CostItem::flat("accounting", "Accounting", Legal, 150.0),
            CostItem::flat("marketing", "Marketing", Marketing, 600.0),
            CostItem::flat("maintenance", "Maintenance", Operational, 400.0),
            CostItem::flat("other_operating", "Other operating", Other, 500.0),
        ],
        revenue_streams: vec![
            RevenueStream::new("food_sales", "Food sales", StreamFormula::VolumeTicket {
                daily_volume: 45.0,
                days_in_month: 30.0,
                average_ticket: 25.0,
            }),
            RevenueStream::new("beverages", "Beverages", StreamFormula::PercentOfStream {
                source: "food_sales".into(),
                fraction: 0.40,
            }),
            RevenueStream::new("set_menus", "Set menus and specials", StreamFormula::VolumeTicket {
                daily_volume: 15.0,
                days_in_month: 8.0,
                average_ticket: 25.0,
            }),
            RevenueStream::new("catering", "External catering", StreamFormula::Custom {
                basis: CustomBasis::FlatMonthly,
                amount: 1_600.0,
            }),
        ],
        customer_management: CustomerManagement {
            initial_customers: 0,
            monthly_growth_base: 60.0,
            monthly_churn_rate: 0.40,
            seasonality: Seasonality::from_factors([0.8, 0.9, 1.0, 1.1, 1.2, 1.3, 1.4, 1.3, 1.1, 1.0, 1.2, 1.5]),
            year1_target: None,
        },
        operational_kpis: kpis(&[
            ("average_ticket", kpi(25.0, 23.0, 15.0)),
            ("ebitda_margin", kpi(0.15, 0.12, 0.05)),
        ]),
        temporal_aspects: TemporalAspects {
            ramp_up_months: 4,
            ramp_up_initial_factor: 0.4,
            ..Default::default()
        },
    }
}

fn ecommerce() -> SectorTemplate {
    use CostCategory::*;
    SectorTemplate {
        id: "ecommerce".into(),
        name: "Professional E-commerce".into(),
        sector: "Digital/E-commerce".into(),
        description: "Online shop with own store, marketplace and premium memberships".into(),
        investment_range: InvestmentRange { min: 15_000.0, max: 50_000.0, average: 32_500.0 },
        required_items: vec![
            item("platform", "E-commerce platform", "technology", 4_000.0),
            item("hosting-cdn", "Premium hosting and CDN", "technology", 600.0),
            item("inventory", "Initial inventory", "stock", 15_000.0),
            item("ux-design", "UX/UI design", "marketing", 3_500.0),
            item("digital-marketing", "SEM/SEO launch", "marketing", 5_000.0),
            item("logistics", "Logistics setup", "operational", 2_000.0),
            item("photography", "Product photography", "marketing", 1_500.0),
            item("integrations", "ERP/CRM integrations", "technology", 2_000.0),
            item("insurance", "Digital insurance", "legal", 500.0),
            item("analytics", "Analytics tooling", "technology", 800.0),
        ],
        cost_schedule: vec![
            CostItem::flat("hosting", "Hosting", Operational, 150.0),
            CostItem::structured("digital_marketing", "Digital marketing", Marketing, StructuredCost {
                base: 2_000.0,
                percent_of_revenue: Some(0.08),
                ..Default::default()
            }),
            CostItem::structured("logistics", "Logistics", Operational, StructuredCost {
                base: 500.0,
                variable_per_customer: Some(3.5),
                ..Default::default()
            }),
            CostItem::flat("staff", "Staff", Personnel, 2_500.0),
            CostItem::flat("digital_tools", "Digital tools", Operational, 200.0),
            CostItem::structured("returns", "Returns and warranties", Other, StructuredCost {
                percent_of_revenue: Some(0.02),
                ..Default::default()
            }),
            CostItem::structured("payment_commissions", "Marketplace and payment commissions", Other, StructuredCost {
                percent_of_revenue: Some(0.15),
                ..Default::default()
            }),
            CostItem::flat("other_operating", "Other operating", Other, 300.0),
        ],
        revenue_streams: vec![
            RevenueStream::new("product_sales", "Product sales", StreamFormula::Funnel {
                visits: 5_000.0,
                conversion_rate: 0.025,
                average_order_value: 65.0,
            }),
            // 70% of orders pay shipping
            RevenueStream::new("shipping", "Shipping fees", StreamFormula::Funnel {
                visits: 5_000.0,
                conversion_rate: 0.0175,
                average_order_value: 4.95,
            }),
            RevenueStream::new("marketplace", "Marketplace sales", StreamFormula::PercentOfStream {
                source: "product_sales".into(),
                fraction: 0.30,
            }),
            RevenueStream::new("premium_memberships", "Premium memberships", StreamFormula::CohortAddOn {
                cohort_fraction: 0.05,
                units_per_month: 1.0,
                unit_price: 9.99,
            }),
        ],
        customer_management: CustomerManagement {
            initial_customers: 0,
            monthly_growth_base: 125.0,
            monthly_churn_rate: 0.65,
            seasonality: Seasonality::from_factors([0.9, 0.9, 1.0, 1.0, 1.0, 1.1, 1.1, 1.0, 1.0, 1.1, 1.4, 1.8]),
            year1_target: None,
        },
        operational_kpis: kpis(&[
            ("conversion_rate", kpi(0.030, 0.025, 0.015)),
            ("average_order_value", kpi(70.0, 65.0, 45.0)),
            ("ebitda_margin", kpi(0.15, 0.10, 0.05)),
        ]),
        temporal_aspects: TemporalAspects {
            ramp_up_months: 6,
            ramp_up_initial_factor: 0.25,
            ..Default::default()
        },
    }
}

fn rural_hotel() -> SectorTemplate {
    use CostCategory::*;
    SectorTemplate {
        id: "rural-hotel".into(),
        name: "Rural Hotel".into(),
        sector: "Tourism/Hospitality".into(),
        description: "Rural hotel with rooms, restaurant, complementary services and events".into(),
        investment_range: InvestmentRange { min: 500_000.0, max: 1_200_000.0, average: 850_000.0 },
        required_items: vec![
            item("building", "Building acquisition and refurbishment", "infrastructure", 400_000.0),
            item("room-furniture", "Room furniture", "infrastructure", 80_000.0),
            item("kitchen", "Professional kitchen", "equipment", 50_000.0),
            item("hotel-equipment", "Hotel equipment", "equipment", 60_000.0),
            item("pms", "Property management system", "technology", 15_000.0),
            item("tourism-licences", "Tourism licences", "legal", 25_000.0),
            item("tourism-marketing", "Tourism marketing", "marketing", 30_000.0),
            item("insurance", "Hotel insurance", "legal", 8_000.0),
            item("gardens", "Gardens and grounds", "infrastructure", 40_000.0),
            item("working-capital", "Working capital, 12 months", "operational", 142_000.0),
        ],
        cost_schedule: vec![
            CostItem::flat("staff", "Staff", Personnel, 12_000.0),
            // 3.2 nights per stay at 15 per occupied room-night
            CostItem::structured("utilities", "Utilities", Supplies, StructuredCost {
                base: 2_000.0,
                variable_per_customer: Some(48.0),
                ..Default::default()
            }),
            CostItem::flat("maintenance", "Maintenance", Operational, 2_500.0),
            CostItem::structured("marketing", "Marketing", Marketing, StructuredCost {
                base: 1_500.0,
                peak_amount: Some(3_000.0),
                peak_months: vec![6, 7, 8],
                ..Default::default()
            }),
            CostItem::flat("insurance", "Insurance", Legal, 1_000.0),
            CostItem::structured("booking_commissions", "Booking commissions", Other, StructuredCost {
                percent_of_revenue: Some(0.12),
                ..Default::default()
            }),
            CostItem::flat("other_operating", "Other operating", Other, 1_500.0),
        ],
        revenue_streams: vec![
            RevenueStream::new("rooms", "Rooms", StreamFormula::Occupancy {
                rooms: 18.0,
                occupancy_rate: 0.65,
                nightly_rate: 120.0,
                nights_in_month: 30.0,
            }),
            RevenueStream::new("restaurant", "Restaurant", StreamFormula::PercentOfStream {
                source: "rooms".into(),
                fraction: 0.35,
            }),
            RevenueStream::new("additional_services", "Spa, activities and transfers", StreamFormula::Custom {
                basis: CustomBasis::FlatMonthly,
                amount: 3_200.0,
            }),
            RevenueStream::new("events", "Weddings and meetings", StreamFormula::Custom {
                basis: CustomBasis::FlatMonthly,
                amount: 12_000.0,
            }),
        ],
        customer_management: CustomerManagement {
            initial_customers: 0,
            monthly_growth_base: 150.0,
            monthly_churn_rate: 0.75,
            seasonality: Seasonality::from_factors([0.3, 0.4, 0.6, 0.8, 1.0, 1.2, 1.4, 1.4, 1.1, 0.9, 0.5, 0.4]),
            year1_target: None,
        },
        operational_kpis: kpis(&[
            ("room_occupancy", kpi(0.65, 0.60, 0.40)),
            ("revpar", kpi(78.0, 72.0, 50.0)),
            ("adr", kpi(120.0, 115.0, 80.0)),
            ("cost_per_room_night", kpi(45.0, 50.0, 65.0)),
            ("ebitda_margin", kpi(0.30, 0.25, 0.15)),
        ]),
        temporal_aspects: TemporalAspects {
            ramp_up_months: 12,
            ramp_up_initial_factor: 0.2,
            ..Default::default()
        },
    }
}

fn consultancy() -> SectorTemplate {
    use CostCategory::*;
    SectorTemplate {
        id: "consultancy".into(),
        name: "Professional Services Consultancy".into(),
        sector: "B2B Services".into(),
        description: "B2B consultancy billing hours, fixed-price projects, retainers and training".into(),
        investment_range: InvestmentRange { min: 15_000.0, max: 45_000.0, average: 30_000.0 },
        required_items: vec![
            item("office", "Office, 6 months", "infrastructure", 7_200.0),
            item("computers", "Professional computers", "technology", 6_000.0),
            item("software", "Specialist software", "technology", 3_500.0),
            item("certifications", "Professional certifications", "legal", 2_500.0),
            item("website", "Corporate website", "marketing", 4_000.0),
            item("b2b-marketing", "B2B digital marketing", "marketing", 3_500.0),
            item("liability-insurance", "Professional liability insurance", "legal", 800.0),
            item("office-supplies", "Office supplies and furniture", "infrastructure", 2_000.0),
            item("training", "Continuous training", "personnel", 1_500.0),
        ],
        cost_schedule: vec![
            CostItem::flat("office_rent", "Office rent", Rent, 1_200.0),
            // Junior 2,500 + senior 4,500
            CostItem::flat("staff", "Consultants", Personnel, 7_000.0),
            CostItem::flat("software_licences", "Software licences", Operational, 400.0),
            CostItem::flat("marketing", "Marketing and lead generation", Marketing, 800.0),
            CostItem::flat("training", "Training", Personnel, 300.0),
            CostItem::flat("insurance", "Insurance", Legal, 80.0),
            CostItem::flat("accounting", "Accounting", Legal, 150.0),
            CostItem::flat("other_operating", "Other operating", Other, 200.0),
        ],
        revenue_streams: vec![
            // 120 billable hours at a blended 80/hour
            RevenueStream::new("hourly_consulting", "Hourly consulting", StreamFormula::VolumeTicket {
                daily_volume: 6.0,
                days_in_month: 20.0,
                average_ticket: 80.0,
            }),
            RevenueStream::new("fixed_projects", "Fixed-price projects", StreamFormula::PerNewCustomer { price: 9_000.0 }),
            RevenueStream::new("retainers", "Monthly retainers", StreamFormula::Custom {
                basis: CustomBasis::FlatMonthly,
                amount: 10_500.0,
            }),
            RevenueStream::new("training_courses", "Training courses", StreamFormula::Custom {
                basis: CustomBasis::FlatMonthly,
                amount: 3_000.0,
            }),
        ],
        customer_management: CustomerManagement {
            initial_customers: 0,
            monthly_growth_base: 2.0,
            monthly_churn_rate: 0.20,
            seasonality: Seasonality::from_factors([1.1, 1.2, 1.3, 1.0, 0.9, 0.8, 0.6, 0.5, 1.4, 1.2, 1.1, 0.8]),
            year1_target: None,
        },
        operational_kpis: kpis(&[
            ("gross_margin", kpi(0.70, 0.65, 0.55)),
            ("average_ticket", kpi(85.0, 80.0, 65.0)),
            ("ebitda_margin", kpi(0.35, 0.30, 0.20)),
        ]),
        temporal_aspects: TemporalAspects {
            ramp_up_months: 6,
            ramp_up_initial_factor: 0.4,
            ..Default::default()
        },
    }
}

fn generic() -> SectorTemplate {
    use CostCategory::*;
    SectorTemplate {
        id: "generic".into(),
        name: "Custom / Generic Plan".into(),
        sector: "Custom".into(),
        description: "Blank plan to configure from scratch".into(),
        investment_range: InvestmentRange { min: 0.0, max: 999_999_999.0, average: 50_000.0 },
        required_items: vec![
            item("custom-item-1", "Custom item 1", "custom", 0.0),
            item("custom-item-2", "Custom item 2", "custom", 0.0),
            item("custom-item-3", "Custom item 3", "custom", 0.0),
        ],
        cost_schedule: vec![
            CostItem::flat("general_expenses", "General expenses", Operational, 0.0),
            CostItem::flat("staff", "Staff", Personnel, 0.0),
            CostItem::flat("marketing", "Marketing", Marketing, 0.0),
            CostItem::flat("other", "Other", Other, 0.0),
        ],
        revenue_streams: vec![RevenueStream::new(
            "main_revenue",
            "Main revenue",
            StreamFormula::Subscription { base_price: 0.0 },
        )],
        customer_management: CustomerManagement {
            initial_customers: 0,
            monthly_growth_base: 0.0,
            monthly_churn_rate: 0.05,
            seasonality: Seasonality::flat(),
            year1_target: None,
        },
        operational_kpis: kpis(&[("gross_margin", kpi(0.30, 0.30, 0.15))]),
        temporal_aspects: TemporalAspects::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_has_six_sectors() {
        let catalog = SectorCatalog::builtin();
        assert_eq!(catalog.len(), 6);
        let ids: Vec<_> = catalog.ids().collect();
        assert!(ids.contains(&"gym-fitness"));
        assert!(ids.contains(&"rural-hotel"));
    }

    #[test]
    fn test_unknown_sector() {
        let err = SectorCatalog::builtin().get("bakery").unwrap_err();
        assert!(matches!(err, PlanError::UnknownSector { .. }));
    }

    #[test]
    fn test_gym_flat_block_matches_reference() {
        let catalog = SectorCatalog::builtin();
        let gym = catalog.get("gym-fitness").unwrap();
        let flat: f64 = gym
            .cost_schedule
            .iter()
            .filter(|c| matches!(c.rule, crate::sector::CostRule::Flat(_)) && c.category != CostCategory::Equipment)
            .map(|c| c.base_amount())
            .sum();
        assert_eq!(flat, 8_548.0);
    }

    #[test]
    fn test_budget_filter_sorted_ascending() {
        let catalog = SectorCatalog::builtin();
        let fits = catalog.by_investment_budget(60_000.0);
        let ids: Vec<_> = fits.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["consultancy", "ecommerce", "generic"]);
    }

    #[test]
    fn test_sector_search_is_case_insensitive() {
        let catalog = SectorCatalog::builtin();
        let hits = catalog.by_sector("hospitality");
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn test_new_rejects_invalid_template() {
        let mut broken = generic();
        broken.investment_range.min = 100_000.0;
        assert!(SectorCatalog::new(vec![broken]).is_err());
    }
}
