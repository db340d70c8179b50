use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Income category for the routine water/electricity/cleaning share.
pub const ALLOCATION: &str = "Shared Expense Allocation (Water/Electricity)";
pub const RESERVE_FUND: &str = "Reserve Fund";
pub const EXTRA_CHARGE: &str = "Extra Charge";
pub const EXTRA_FEE: &str = "Extra Fee";
pub const ADJUSTMENT: &str = "Adjustment/Tip";
pub const INITIAL_BALANCE: &str = "Initial Balance";
pub const WATER_PAYMENT: &str = "Water/Sewage Payment";
pub const ELECTRICITY_PAYMENT: &str = "Electricity Payment";
pub const CLEANING_PAYMENT: &str = "Cleaning Payment";
pub const MAINTENANCE: &str = "Maintenance";
/// Expense category used to mirror collected extras.
pub const CONSTRUCTION: &str = "Construction/Improvements";

/// Cost center for expenses generated by a billing run.
pub const CONDOMINIUM_UNIT: &str = "Condominium";
/// Cost center offered for ad-hoc building-wide entries.
pub const BUILDING_GENERAL_UNIT: &str = "Building (General)";
/// Cost center for the opening cash balance.
pub const CASH_UNIT: &str = "Cash";

/// Known categories and unit identifiers, used for classification and choice sets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CondoConfig {
    #[serde(default)]
    pub categories: BTreeSet<String>,
    #[serde(default)]
    pub units: BTreeSet<String>,
}

impl CondoConfig {
    pub fn new<C, U>(categories: C, units: U) -> Self
    where
        C: IntoIterator,
        C::Item: Into<String>,
        U: IntoIterator,
        U::Item: Into<String>,
    {
        Self {
            categories: clean_set(categories),
            units: clean_set(units),
        }
    }

    /// Seed lists used when the store holds no configuration yet.
    pub fn seed() -> Self {
        Self::new(
            [
                ALLOCATION,
                RESERVE_FUND,
                EXTRA_FEE,
                ADJUSTMENT,
                INITIAL_BALANCE,
                WATER_PAYMENT,
                ELECTRICITY_PAYMENT,
                CLEANING_PAYMENT,
                MAINTENANCE,
                CONSTRUCTION,
            ],
            [
                "Apartment 101",
                "Apartment 201",
                "Apartment 202",
                "Apartment 301",
                "Room 01",
                "Room 02",
                "Room 03",
                "Room 04",
            ],
        )
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty() && self.units.is_empty()
    }

    /// Unit choices for ad-hoc entries: the building-wide sentinel first.
    pub fn unit_choices(&self) -> Vec<String> {
        std::iter::once(BUILDING_GENERAL_UNIT.to_string())
            .chain(self.units.iter().cloned())
            .collect()
    }
}

fn clean_set<I>(items: I) -> BTreeSet<String>
where
    I: IntoIterator,
    I::Item: Into<String>,
{
    items
        .into_iter()
        .map(|item| item.into().trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_entries_are_dropped() {
        let config = CondoConfig::new(["Fund", "  ", ""], ["Room 1 ", ""]);
        assert_eq!(config.categories.len(), 1);
        assert!(config.units.contains("Room 1"));
    }

    #[test]
    fn unit_choices_lead_with_building_sentinel() {
        let config = CondoConfig::seed();
        let choices = config.unit_choices();
        assert_eq!(choices[0], BUILDING_GENERAL_UNIT);
        assert_eq!(choices.len(), config.units.len() + 1);
    }
}
