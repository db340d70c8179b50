use serde::{Deserialize, Serialize};

pub const ROOM_TOKEN: &str = "Room";
pub const APARTMENT_TOKEN: &str = "Apartment";

/// Billable partition a unit belongs to, derived from its name.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum UnitGroup {
    Rooms,
    Apartments,
}

impl UnitGroup {
    /// Group for a unit name. Names containing neither token are ungrouped and never billed.
    pub fn of(unit: &str) -> Option<Self> {
        if unit.contains(ROOM_TOKEN) {
            Some(UnitGroup::Rooms)
        } else if unit.contains(APARTMENT_TOKEN) {
            Some(UnitGroup::Apartments)
        } else {
            None
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            UnitGroup::Rooms => "Rooms",
            UnitGroup::Apartments => "Apartments",
        }
    }

    /// Share of the water bill charged to the group.
    pub fn water_share(&self) -> f64 {
        match self {
            UnitGroup::Rooms => 0.35,
            UnitGroup::Apartments => 0.65,
        }
    }

    /// Whether electricity and cleaning are charged to the group.
    pub fn pays_electricity_and_cleaning(&self) -> bool {
        matches!(self, UnitGroup::Apartments)
    }
}

/// Known units partitioned into Rooms and Apartments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitGroups {
    pub rooms: Vec<String>,
    pub apartments: Vec<String>,
}

impl UnitGroups {
    pub fn from_units<I, S>(units: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut groups = Self::default();
        for unit in units {
            let unit = unit.as_ref().trim();
            match UnitGroup::of(unit) {
                Some(UnitGroup::Rooms) => groups.rooms.push(unit.to_string()),
                Some(UnitGroup::Apartments) => groups.apartments.push(unit.to_string()),
                None => {}
            }
        }
        groups
    }

    pub fn members(&self, group: UnitGroup) -> &[String] {
        match group {
            UnitGroup::Rooms => &self.rooms,
            UnitGroup::Apartments => &self.apartments,
        }
    }

    /// Unit count used to split a group amount; an empty group divides by one.
    pub fn divisor(&self, group: UnitGroup) -> usize {
        self.members(group).len().max(1)
    }

    /// Divisor for charges split across every billable unit.
    pub fn total_divisor(&self) -> usize {
        self.divisor(UnitGroup::Rooms) + self.divisor(UnitGroup::Apartments)
    }

    /// Billable units in billing order: rooms first, then apartments.
    pub fn billable(&self) -> impl Iterator<Item = (UnitGroup, &str)> {
        self.rooms
            .iter()
            .map(|unit| (UnitGroup::Rooms, unit.as_str()))
            .chain(
                self.apartments
                    .iter()
                    .map(|unit| (UnitGroup::Apartments, unit.as_str())),
            )
    }
}
