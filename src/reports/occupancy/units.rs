use super::domain::UnitId;
use std::ops::RangeInclusive;

/// How a physical unit is recovered from a raw bed assignment label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitLabelRule {
    /// The room is the number after the `Rm` token: `BH Rm 05-A` is room 5,
    /// `RH Rm 3-2` is room 3. Numbers outside `valid` do not resolve.
    RoomNumber { valid: Option<RangeInclusive<u32>> },
    /// Every distinct label is its own unit.
    BedLabel,
}

impl UnitLabelRule {
    pub fn rooms() -> Self {
        Self::RoomNumber { valid: None }
    }

    pub fn rooms_in(valid: RangeInclusive<u32>) -> Self {
        Self::RoomNumber { valid: Some(valid) }
    }

    pub fn resolve(&self, label: &str) -> Option<UnitId> {
        match self {
            Self::RoomNumber { valid } => {
                let number = room_number(label)?;
                match valid {
                    Some(range) if !range.contains(&number) => None,
                    _ => Some(UnitId::Room(number)),
                }
            }
            Self::BedLabel => {
                let collapsed = label.split_whitespace().collect::<Vec<_>>().join(" ");
                if collapsed.is_empty() {
                    None
                } else {
                    Some(UnitId::Bed(collapsed))
                }
            }
        }
    }
}

fn room_number(label: &str) -> Option<u32> {
    let lower = label.to_ascii_lowercase();
    let bytes = lower.as_bytes();
    let mut search_from = 0;

    while let Some(offset) = lower[search_from..].find("rm") {
        let at = search_from + offset;
        search_from = at + 2;

        // "rm" must start a token, so "Farm 3" is not room 3.
        if at > 0 && bytes[at - 1].is_ascii_alphanumeric() {
            continue;
        }

        let rest = lower[at + 2..]
            .trim_start_matches(|c: char| c == '.' || c == '#' || c.is_whitespace());
        let end = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        if end == 0 {
            continue;
        }

        return rest[..end].parse().ok();
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn room_rule_reads_number_after_token() {
        let rule = UnitLabelRule::rooms();
        assert_eq!(rule.resolve("BH Rm 05-A"), Some(UnitId::Room(5)));
        assert_eq!(rule.resolve("RH Rm 3-2"), Some(UnitId::Room(3)));
        assert_eq!(rule.resolve("BH Rm 10 Bed 1"), Some(UnitId::Room(10)));
        assert_eq!(rule.resolve("rm12"), Some(UnitId::Room(12)));
    }

    #[test]
    fn room_rule_rejects_labels_without_room() {
        let rule = UnitLabelRule::rooms();
        assert_eq!(rule.resolve("Overflow cot"), None);
        assert_eq!(rule.resolve("Farm 3"), None);
        assert_eq!(rule.resolve("BH Rm -A"), None);
        assert_eq!(rule.resolve(""), None);
    }

    #[test]
    fn room_rule_respects_valid_range() {
        let rule = UnitLabelRule::rooms_in(5..=16);
        assert_eq!(rule.resolve("BH Rm 16-B"), Some(UnitId::Room(16)));
        assert_eq!(rule.resolve("BH Rm 4-A"), None);
        assert_eq!(rule.resolve("BH Rm 17-A"), None);
    }

    #[test]
    fn bed_rule_collapses_whitespace() {
        let rule = UnitLabelRule::BedLabel;
        assert_eq!(
            rule.resolve("  RH  Rm 3-2 "),
            Some(UnitId::Bed("RH Rm 3-2".to_string()))
        );
        assert_eq!(rule.resolve("   "), None);
    }
}
