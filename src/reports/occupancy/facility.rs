use super::units::UnitLabelRule;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Facility {
    BrennenHouse,
    RosalieHouse,
}

impl Facility {
    pub const fn ordered() -> [Self; 2] {
        [Self::BrennenHouse, Self::RosalieHouse]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::BrennenHouse => "Brennen House",
            Self::RosalieHouse => "Rosalie House",
        }
    }

    /// Prefix used in bed assignment labels, e.g. `BH Rm 05-A`.
    pub const fn code(self) -> &'static str {
        match self {
            Self::BrennenHouse => "BH",
            Self::RosalieHouse => "RH",
        }
    }

    pub const fn default_beds(self) -> u32 {
        match self {
            Self::BrennenHouse => 32,
            Self::RosalieHouse => 18,
        }
    }

    pub const fn default_rooms(self) -> u32 {
        match self {
            Self::BrennenHouse => 12,
            Self::RosalieHouse => 6,
        }
    }

    pub fn room_rule(self) -> UnitLabelRule {
        match self {
            // Brennen bedrooms are numbered 5 through 16.
            Self::BrennenHouse => UnitLabelRule::rooms_in(5..=16),
            Self::RosalieHouse => UnitLabelRule::rooms(),
        }
    }

    /// Detects the house from a bed label carrying its code as a token.
    pub fn from_label(label: &str) -> Option<Self> {
        let tokens: Vec<&str> = label
            .split(|c: char| !c.is_ascii_alphanumeric())
            .filter(|token| !token.is_empty())
            .collect();
        Self::ordered()
            .into_iter()
            .find(|facility| tokens.iter().any(|token| *token == facility.code()))
    }
}
