//! Head counts by age, gender and ethnicity for a set of client stays.

use crate::reports::intake::ClientStay;
use crate::reports::occupancy::{occupancy_percentage, Category};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AgeBracket {
    UpToEighteen,
    NineteenToFifty,
    FiftyOneAndOver,
}

impl AgeBracket {
    pub const fn ordered() -> [Self; 3] {
        [
            Self::UpToEighteen,
            Self::NineteenToFifty,
            Self::FiftyOneAndOver,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::UpToEighteen => "0-18",
            Self::NineteenToFifty => "19-50",
            Self::FiftyOneAndOver => "51+",
        }
    }

    pub fn for_age(age: u32) -> Self {
        match age {
            0..=18 => Self::UpToEighteen,
            19..=50 => Self::NineteenToFifty,
            _ => Self::FiftyOneAndOver,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EthnicityCategory {
    White,
    Black,
    Asian,
    NativeAmerican,
    PacificIslander,
    MiddleEasternNorthAfrican,
    MultiRacial,
    HispanicLatino,
    Other,
    Unknown,
}

impl EthnicityCategory {
    pub const fn label(self) -> &'static str {
        match self {
            Self::White => "White",
            Self::Black => "Black/African American",
            Self::Asian => "Asian",
            Self::NativeAmerican => "Native American/Indigenous",
            Self::PacificIslander => "Pacific Islander",
            Self::MiddleEasternNorthAfrican => "Middle Eastern/North African",
            Self::MultiRacial => "Multi-Racial",
            Self::HispanicLatino => "Hispanic/Latino",
            Self::Other => "Other",
            Self::Unknown => "Unknown",
        }
    }

    /// Race is consulted first; the free-text nationality/ethnicity column
    /// only when race is blank or unrecognized.
    pub fn classify(race: Option<&str>, ethnicity: Option<&str>) -> Self {
        if let Some(category) = race.and_then(Self::from_race) {
            return category;
        }

        match ethnicity {
            Some(ethnicity) => Self::from_ethnicity(ethnicity),
            None => Self::Unknown,
        }
    }

    fn from_race(race: &str) -> Option<Self> {
        let race = race.to_lowercase();
        let has = |needle: &str| race.contains(needle);

        if has("white") && !has("hispanic") {
            Some(Self::White)
        } else if has("black") || has("african") {
            Some(Self::Black)
        } else if has("asian") {
            Some(Self::Asian)
        } else if has("native american") || has("alaskan native") {
            Some(Self::NativeAmerican)
        } else if has("hawaiian native") || has("pacific islander") {
            Some(Self::PacificIslander)
        } else if has("middle eastern") {
            Some(Self::MiddleEasternNorthAfrican)
        } else if has("multi-racial") || has("two or more races") {
            Some(Self::MultiRacial)
        } else if has("unknown") || has("data not collected") {
            Some(Self::Unknown)
        } else if has("other") {
            Some(Self::Other)
        } else {
            None
        }
    }

    fn from_ethnicity(ethnicity: &str) -> Self {
        const HISPANIC: &[&str] = &[
            "hispanic",
            "latino",
            "puerto rican",
            "honduran",
            "guatemalan",
            "salvadorean",
            "peruvian",
        ];
        let ethnicity = ethnicity.to_lowercase();
        let has = |needle: &str| ethnicity.contains(needle);

        if HISPANIC.iter().any(|needle| has(needle)) {
            Self::HispanicLatino
        } else if has("american indian") || has("alaskan native") {
            Self::NativeAmerican
        } else if has("chinese") || has("afghan") || has("turkish") || has("indian") {
            Self::Asian
        } else if has("samoan") {
            Self::PacificIslander
        } else {
            Self::Other
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DemographicBreakdown {
    pub total_records: usize,
    pub adults: usize,
    pub children: usize,
    pub unknown_age_group: usize,
    pub genders: BTreeMap<String, usize>,
    pub age_brackets: BTreeMap<AgeBracket, usize>,
    pub ethnicities: BTreeMap<EthnicityCategory, usize>,
    /// Mean adult stay in days with each stay capped; `None` without
    /// completed adult stays.
    pub average_adult_stay_days: Option<f64>,
    pub stay_cap_days: i64,
}

impl DemographicBreakdown {
    pub fn from_stays(stays: &[ClientStay], stay_cap_days: i64) -> Self {
        let mut breakdown = Self {
            total_records: stays.len(),
            stay_cap_days,
            ..Self::default()
        };
        let mut adult_stay_total = 0_i64;
        let mut adult_stays = 0_i64;

        for client in stays {
            let group = match client.profile.age {
                Some(age) => Some(Category::from_age(age)),
                None => match client.stay.category {
                    Category::Adult => Some(Category::Adult),
                    Category::Child => Some(Category::Child),
                    Category::Unit(_) => None,
                },
            };

            match group {
                Some(Category::Adult) => {
                    breakdown.adults += 1;
                    if let Some(exit) = client.stay.exit {
                        let length = (exit - client.stay.entry).num_days();
                        if length >= 0 {
                            adult_stay_total += length.min(stay_cap_days);
                            adult_stays += 1;
                        }
                    }
                }
                Some(_) => breakdown.children += 1,
                None => breakdown.unknown_age_group += 1,
            }

            if let Some(age) = client.profile.age {
                *breakdown
                    .age_brackets
                    .entry(AgeBracket::for_age(age))
                    .or_insert(0) += 1;
            }

            let gender = client
                .profile
                .gender
                .as_deref()
                .map(|gender| gender.trim().to_lowercase())
                .filter(|gender| !gender.is_empty())
                .unwrap_or_else(|| "unknown".to_string());
            *breakdown.genders.entry(gender).or_insert(0) += 1;

            let ethnicity = EthnicityCategory::classify(
                client.profile.race.as_deref(),
                client.profile.ethnicity.as_deref(),
            );
            *breakdown.ethnicities.entry(ethnicity).or_insert(0) += 1;
        }

        if adult_stays > 0 {
            breakdown.average_adult_stay_days =
                Some(adult_stay_total as f64 / adult_stays as f64);
        }

        breakdown
    }

    pub fn records_with_age(&self) -> usize {
        self.age_brackets.values().sum()
    }

    pub fn bracket_count(&self, bracket: AgeBracket) -> usize {
        self.age_brackets.get(&bracket).copied().unwrap_or(0)
    }

    pub fn bracket_percentage(&self, bracket: AgeBracket) -> f64 {
        percentage(self.bracket_count(bracket), self.records_with_age())
    }

    pub fn ethnicity_percentage(&self, category: EthnicityCategory) -> f64 {
        let count = self.ethnicities.get(&category).copied().unwrap_or(0);
        percentage(count, self.total_records)
    }

    pub fn view(&self) -> DemographicsView {
        DemographicsView {
            total_records: self.total_records,
            adults: self.adults,
            children: self.children,
            unknown_age_group: self.unknown_age_group,
            genders: self
                .genders
                .iter()
                .map(|(label, count)| CountView {
                    label: label.clone(),
                    count: *count,
                    percentage: percentage(*count, self.total_records),
                })
                .collect(),
            age_brackets: AgeBracket::ordered()
                .into_iter()
                .map(|bracket| CountView {
                    label: bracket.label().to_string(),
                    count: self.bracket_count(bracket),
                    percentage: self.bracket_percentage(bracket),
                })
                .collect(),
            ethnicities: self
                .ethnicities
                .iter()
                .map(|(category, count)| CountView {
                    label: category.label().to_string(),
                    count: *count,
                    percentage: percentage(*count, self.total_records),
                })
                .collect(),
            average_adult_stay_days: self.average_adult_stay_days,
            stay_cap_days: self.stay_cap_days,
        }
    }
}

fn percentage(count: usize, total: usize) -> f64 {
    occupancy_percentage(count as i64, total as i64)
}

#[derive(Debug, Clone, Serialize)]
pub struct CountView {
    pub label: String,
    pub count: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DemographicsView {
    pub total_records: usize,
    pub adults: usize,
    pub children: usize,
    pub unknown_age_group: usize,
    pub genders: Vec<CountView>,
    pub age_brackets: Vec<CountView>,
    pub ethnicities: Vec<CountView>,
    pub average_adult_stay_days: Option<f64>,
    pub stay_cap_days: i64,
}
