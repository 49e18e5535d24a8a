use std::cmp::Ordering;
use std::collections::BTreeSet;

use crate::models::{StudentWeekRecord, TaAssignment, GROUP_LABELS, UNASSIGNED_TA};

pub const ALL_GROUPS: &str = "All Groups";
pub const ALL_TAS: &str = "All TAs";
pub const PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum SortKey {
    Name,
    Email,
    Group,
    Ta,
    Attendance,
    Total,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SortConfig {
    pub key: Option<SortKey>,
    pub direction: SortDirection,
}

impl SortConfig {
    /// Header click: the active key flips direction, any other key starts
    /// ascending.
    pub fn request(&mut self, key: SortKey) {
        let direction = if self.key == Some(key) && self.direction == SortDirection::Ascending {
            SortDirection::Descending
        } else {
            SortDirection::Ascending
        };
        self.key = Some(key);
        self.direction = direction;
    }

    pub fn indicator(&self, key: SortKey) -> &'static str {
        match (self.key == Some(key), self.direction) {
            (false, _) => "",
            (true, SortDirection::Ascending) => " ^",
            (true, SortDirection::Descending) => " v",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterCriteria {
    pub search: String,
    pub group: String,
    pub ta: String,
    pub sort: SortConfig,
}

impl Default for FilterCriteria {
    fn default() -> Self {
        Self {
            search: String::new(),
            group: ALL_GROUPS.to_string(),
            ta: ALL_TAS.to_string(),
            sort: SortConfig::default(),
        }
    }
}

impl FilterCriteria {
    /// Resets the three filters. Sorting is left as is.
    pub fn clear_filters(&mut self) {
        self.search.clear();
        self.group = ALL_GROUPS.to_string();
        self.ta = ALL_TAS.to_string();
    }

    pub fn has_active_filter(&self) -> bool {
        !self.search.is_empty() || self.group != ALL_GROUPS || self.ta != ALL_TAS
    }

    fn matches_group(&self, record: &StudentWeekRecord) -> bool {
        self.group == ALL_GROUPS || record.group.as_deref() == Some(self.group.as_str())
    }

    fn matches_ta(&self, record: &StudentWeekRecord) -> bool {
        self.ta == ALL_TAS || record.ta.label() == self.ta
    }

    fn matches_name(&self, record: &StudentWeekRecord) -> bool {
        self.search.is_empty()
            || record
                .name
                .to_lowercase()
                .contains(&self.search.to_lowercase())
    }

    pub fn matches(&self, record: &StudentWeekRecord) -> bool {
        self.matches_group(record) && self.matches_ta(record) && self.matches_name(record)
    }
}

fn sort_text(record: &StudentWeekRecord, key: SortKey) -> Option<String> {
    match key {
        SortKey::Name => Some(record.name.to_lowercase()),
        SortKey::Email => Some(record.email.as_deref().unwrap_or("").to_lowercase()),
        SortKey::Group => Some(record.group.as_deref().unwrap_or("").to_lowercase()),
        SortKey::Ta => Some(record.ta.label().to_lowercase()),
        SortKey::Attendance | SortKey::Total => None,
    }
}

fn compare(a: &StudentWeekRecord, b: &StudentWeekRecord, sort: &SortConfig) -> Ordering {
    let Some(key) = sort.key else {
        return Ordering::Equal;
    };
    match (sort_text(a, key), sort_text(b, key)) {
        (Some(left), Some(right)) => match sort.direction {
            SortDirection::Ascending => left.cmp(&right),
            SortDirection::Descending => right.cmp(&left),
        },
        _ => Ordering::Equal,
    }
}

/// Visible rows for the given criteria, in display order. Equal keys keep
/// roster order.
pub fn derive_view<'a>(
    roster: &'a [StudentWeekRecord],
    criteria: &FilterCriteria,
) -> Vec<&'a StudentWeekRecord> {
    let mut rows: Vec<&StudentWeekRecord> = roster
        .iter()
        .filter(|record| criteria.matches(record))
        .collect();

    if criteria.sort.key.is_some() {
        rows.sort_by(|a, b| compare(a, b, &criteria.sort));
    }
    rows
}

/// TA dropdown options, taken from the full roster rather than the view.
pub fn ta_options(roster: &[StudentWeekRecord]) -> Vec<String> {
    let distinct: BTreeSet<&str> = roster
        .iter()
        .filter_map(|record| match &record.ta {
            TaAssignment::Assigned(name) if !name.is_empty() && name != UNASSIGNED_TA => {
                Some(name.as_str())
            }
            _ => None,
        })
        .collect();

    std::iter::once(ALL_TAS.to_string())
        .chain(distinct.into_iter().map(str::to_string))
        .collect()
}

pub fn group_options() -> Vec<String> {
    std::iter::once(ALL_GROUPS)
        .chain(GROUP_LABELS)
        .map(str::to_string)
        .collect()
}

pub fn empty_message(criteria: &FilterCriteria) -> &'static str {
    if criteria.has_active_filter() {
        "No data available for your current filters."
    } else {
        "No data available."
    }
}

pub fn pagination_summary(visible: usize) -> Option<String> {
    if visible == 0 {
        return None;
    }
    Some(format!(
        "Showing 1 to {} of {} results",
        visible.min(PAGE_SIZE),
        visible
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BonusScore, ExerciseScore, GdScore};

    fn record(id: usize, name: &str, group: &str, ta: Option<&str>) -> StudentWeekRecord {
        StudentWeekRecord {
            id,
            name: name.to_string(),
            email: Some(format!("{}@example.com", name.to_lowercase().replace(' ', "."))),
            group: Some(group.to_string()),
            ta: ta
                .map(|t| TaAssignment::Assigned(t.to_string()))
                .unwrap_or(TaAssignment::Unassigned),
            attendance: id % 2 == 0,
            gd_score: GdScore::default(),
            bonus_score: BonusScore::default(),
            exercise_score: ExerciseScore::default(),
            week: 1,
            total: id as i32,
        }
    }

    fn roster() -> Vec<StudentWeekRecord> {
        vec![
            record(1, "avery Lee", "Group 1", Some("Ravi")),
            record(2, "Bob Lee", "Group 2", Some("Amara")),
            record(3, "Jules Moreno", "Group 1", None),
            record(4, "Kiara Patel", "Group 1", Some("Amara")),
            record(5, "bob marley", "Group 2", Some("Ravi")),
        ]
    }

    fn names(rows: &[&StudentWeekRecord]) -> Vec<String> {
        rows.iter().map(|r| r.name.clone()).collect()
    }

    #[test]
    fn filters_combine_as_conjunction() {
        let roster = roster();
        let criteria = FilterCriteria {
            search: "LEE".to_string(),
            group: "Group 1".to_string(),
            ta: "Ravi".to_string(),
            ..FilterCriteria::default()
        };
        assert_eq!(names(&derive_view(&roster, &criteria)), vec!["avery Lee"]);
    }

    #[test]
    fn filter_order_does_not_change_result() {
        let roster = roster();
        let criteria = FilterCriteria {
            search: "b".to_string(),
            group: "Group 2".to_string(),
            ta: "Ravi".to_string(),
            ..FilterCriteria::default()
        };
        let ta_first: Vec<usize> = roster
            .iter()
            .filter(|r| criteria.matches_ta(r))
            .filter(|r| criteria.matches_name(r))
            .filter(|r| criteria.matches_group(r))
            .map(|r| r.id)
            .collect();
        let via_view: Vec<usize> = derive_view(&roster, &criteria).iter().map(|r| r.id).collect();
        assert_eq!(via_view, ta_first);
        assert_eq!(via_view, vec![5]);
    }

    #[test]
    fn unassigned_ta_is_filterable_by_label() {
        let roster = roster();
        let criteria = FilterCriteria {
            ta: UNASSIGNED_TA.to_string(),
            ..FilterCriteria::default()
        };
        assert_eq!(names(&derive_view(&roster, &criteria)), vec!["Jules Moreno"]);
    }

    #[test]
    fn name_sort_is_case_insensitive_and_toggles() {
        let roster = roster();
        let mut criteria = FilterCriteria::default();

        criteria.sort.request(SortKey::Name);
        assert_eq!(
            names(&derive_view(&roster, &criteria)),
            vec!["avery Lee", "Bob Lee", "bob marley", "Jules Moreno", "Kiara Patel"]
        );

        criteria.sort.request(SortKey::Name);
        assert_eq!(criteria.sort.direction, SortDirection::Descending);
        assert_eq!(
            names(&derive_view(&roster, &criteria)),
            vec!["Kiara Patel", "Jules Moreno", "bob marley", "Bob Lee", "avery Lee"]
        );

        criteria.sort.request(SortKey::Name);
        assert_eq!(criteria.sort.direction, SortDirection::Ascending);
    }

    #[test]
    fn switching_key_resets_to_ascending() {
        let mut sort = SortConfig::default();
        sort.request(SortKey::Name);
        sort.request(SortKey::Name);
        sort.request(SortKey::Group);
        assert_eq!(sort.key, Some(SortKey::Group));
        assert_eq!(sort.direction, SortDirection::Ascending);
        assert_eq!(sort.indicator(SortKey::Group), " ^");
        assert_eq!(sort.indicator(SortKey::Name), "");
    }

    #[test]
    fn non_text_keys_keep_roster_order() {
        let roster = roster();
        let mut criteria = FilterCriteria::default();
        criteria.sort.request(SortKey::Total);
        criteria.sort.request(SortKey::Total);
        let ids: Vec<usize> = derive_view(&roster, &criteria).iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn equal_keys_are_stable() {
        let roster = roster();
        let mut criteria = FilterCriteria::default();
        criteria.sort.request(SortKey::Group);
        let ids: Vec<usize> = derive_view(&roster, &criteria).iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 3, 4, 2, 5]);
    }

    #[test]
    fn deriving_twice_is_identical() {
        let roster = roster();
        let mut criteria = FilterCriteria {
            search: "e".to_string(),
            ..FilterCriteria::default()
        };
        criteria.sort.request(SortKey::Name);
        assert_eq!(derive_view(&roster, &criteria), derive_view(&roster, &criteria));
    }

    #[test]
    fn ta_options_come_from_full_roster() {
        let roster = roster();
        assert_eq!(ta_options(&roster), vec![ALL_TAS, "Amara", "Ravi"]);
        assert_eq!(ta_options(&[]), vec![ALL_TAS]);
    }

    #[test]
    fn clear_filters_keeps_sort() {
        let mut criteria = FilterCriteria {
            search: "bob".to_string(),
            group: "Group 2".to_string(),
            ta: "Ravi".to_string(),
            ..FilterCriteria::default()
        };
        criteria.sort.request(SortKey::Name);
        criteria.clear_filters();
        assert!(!criteria.has_active_filter());
        assert_eq!(criteria.sort.key, Some(SortKey::Name));
    }

    #[test]
    fn empty_and_pagination_messages() {
        let mut criteria = FilterCriteria::default();
        assert_eq!(empty_message(&criteria), "No data available.");
        criteria.group = "Group 3".to_string();
        assert_eq!(
            empty_message(&criteria),
            "No data available for your current filters."
        );
        assert_eq!(pagination_summary(0), None);
        assert_eq!(
            pagination_summary(4).as_deref(),
            Some("Showing 1 to 4 of 4 results")
        );
        assert_eq!(
            pagination_summary(23).as_deref(),
            Some("Showing 1 to 10 of 23 results")
        );
        assert_eq!(group_options().len(), 5);
    }
}
