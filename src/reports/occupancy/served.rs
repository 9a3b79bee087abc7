use super::domain::{Category, ReportingWindow, StayRecord};
use super::interval::{entry_or_exit_within, overlaps};
use std::collections::{BTreeMap, BTreeSet};

/// Which stays count as "served during the window".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowFilter {
    /// Stay intersects the window; open stays run to the window end.
    Overlaps,
    /// Raw entry or raw exit date lies inside the window.
    EntryOrExitWithin,
}

impl WindowFilter {
    pub fn matches(self, record: &StayRecord, window: &ReportingWindow) -> bool {
        match self {
            Self::Overlaps => overlaps(record, window),
            Self::EntryOrExitWithin => entry_or_exit_within(record, window),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServedSummary {
    pub by_category: BTreeMap<Category, usize>,
    pub distinct_people: usize,
    pub records_matched: usize,
    pub records_without_key: usize,
}

impl ServedSummary {
    pub fn served(&self, category: &Category) -> usize {
        self.by_category.get(category).copied().unwrap_or(0)
    }
}

/// Counts distinct individuals per category among stays matching `filter`.
///
/// Several stays sharing a key collapse to one person. A person recorded
/// under two categories (a child who aged into adulthood) is counted once in
/// each category but once in `distinct_people`.
pub fn people_served<K, F>(
    records: &[StayRecord],
    window: &ReportingWindow,
    filter: WindowFilter,
    key: F,
) -> ServedSummary
where
    K: Ord + Clone,
    F: Fn(&StayRecord) -> Option<K>,
{
    let mut per_category: BTreeMap<Category, BTreeSet<K>> = BTreeMap::new();
    let mut everyone: BTreeSet<K> = BTreeSet::new();
    let mut summary = ServedSummary::default();

    for record in records.iter().filter(|record| filter.matches(record, window)) {
        summary.records_matched += 1;
        let Some(person) = key(record) else {
            summary.records_without_key += 1;
            continue;
        };

        per_category
            .entry(record.category.clone())
            .or_default()
            .insert(person.clone());
        everyone.insert(person);
    }

    summary.distinct_people = everyone.len();
    summary.by_category = per_category
        .into_iter()
        .map(|(category, people)| (category, people.len()))
        .collect();
    summary
}

/// Indices of the first matching stay for each person, in input order.
pub fn first_stay_per_person<K, F>(
    records: &[StayRecord],
    window: &ReportingWindow,
    filter: WindowFilter,
    key: F,
) -> Vec<usize>
where
    K: Ord,
    F: Fn(&StayRecord) -> Option<K>,
{
    let mut seen: BTreeSet<K> = BTreeSet::new();
    records
        .iter()
        .enumerate()
        .filter(|(_, record)| filter.matches(record, window))
        .filter_map(|(index, record)| {
            let person = key(record)?;
            seen.insert(person).then_some(index)
        })
        .collect()
}

/// Default identity key: the full name, case- and whitespace-insensitive.
pub fn person_key(record: &StayRecord) -> Option<String> {
    let name = record.person.as_deref()?;
    let cleaned = name.replace(['\u{feff}', '\u{200b}'], "");
    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        None
    } else {
        Some(collapsed.to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn person_key_ignores_case_and_spacing() {
        let record = StayRecord::new(date(2024, 1, 1), None, Category::Adult)
            .with_person("\u{feff}Jane   DOE ");
        assert_eq!(person_key(&record).as_deref(), Some("jane doe"));

        let blank = StayRecord::new(date(2024, 1, 1), None, Category::Adult).with_person("  ");
        assert_eq!(person_key(&blank), None);
    }

    #[test]
    fn first_stay_per_person_keeps_input_order() {
        let window =
            ReportingWindow::new(date(2024, 1, 1), date(2024, 12, 31), 1).expect("valid window");
        let records = vec![
            StayRecord::new(date(2024, 2, 1), None, Category::Adult).with_person("A"),
            StayRecord::new(date(2023, 1, 1), Some(date(2023, 2, 1)), Category::Adult)
                .with_person("B"),
            StayRecord::new(date(2024, 3, 1), None, Category::Adult).with_person("a"),
            StayRecord::new(date(2024, 4, 1), None, Category::Child).with_person("C"),
        ];

        let kept = first_stay_per_person(&records, &window, WindowFilter::Overlaps, person_key);
        assert_eq!(kept, vec![0, 3]);
    }
}
