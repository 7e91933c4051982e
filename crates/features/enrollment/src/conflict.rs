use crate::schedule::{ParsedSchedule, day_label};
use std::collections::BTreeSet;
use std::fmt;

/// Days and periods two schedules share.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Overlap {
    pub days: BTreeSet<u8>,
    pub periods: BTreeSet<u32>,
}

/// Shared days and periods when the schedules collide: a common day, a common
/// period and intersecting date ranges. A missing date range overlaps anything.
#[must_use]
pub fn overlap(a: &ParsedSchedule, b: &ParsedSchedule) -> Option<Overlap> {
    let days: BTreeSet<u8> = a.days.intersection(&b.days).copied().collect();
    if days.is_empty() {
        return None;
    }
    let periods: BTreeSet<u32> = a.periods.intersection(&b.periods).copied().collect();
    if periods.is_empty() {
        return None;
    }
    let dates_meet = match (&a.dates, &b.dates) {
        (Some(x), Some(y)) => x.overlaps(y),
        _ => true,
    };
    dates_meet.then_some(Overlap { days, periods })
}

#[must_use]
pub fn conflicts(a: &ParsedSchedule, b: &ParsedSchedule) -> bool {
    overlap(a, b).is_some()
}

/// The already-held section a registration collided with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictDetail {
    pub section_id: String,
    pub name: String,
    pub days: BTreeSet<u8>,
    pub periods: BTreeSet<u32>,
    /// Date-range text of the held section; `None` when it runs continuously.
    pub date_range: Option<String>,
}

impl fmt::Display for ConflictDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let days: Vec<_> = self.days.iter().map(|day| day_label(*day)).collect();
        let periods: Vec<_> = self.periods.iter().map(u32::to_string).collect();
        write!(
            f,
            "'{}' ({}) on {} periods {} during {}",
            self.name,
            self.section_id,
            days.join(", "),
            periods.join(", "),
            self.date_range.as_deref().unwrap_or("the whole term"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schedule(days: &str, periods: &str, dates: &str) -> ParsedSchedule {
        ParsedSchedule::from_parts(days, periods, dates)
    }

    #[test]
    fn all_three_dimensions_must_meet() {
        let x = schedule("2-4", "1-3", "01/09/2024 - 30/12/2024");
        let y = schedule("2", "2-3", "01/09/2024 - 30/12/2024");
        let found = overlap(&x, &y).unwrap();
        assert_eq!(found.days, BTreeSet::from([2]));
        assert_eq!(found.periods, BTreeSet::from([2, 3]));

        assert!(!conflicts(&x, &schedule("3", "1-3", "")));
        assert!(!conflicts(&x, &schedule("2", "4-6", "")));
        assert!(!conflicts(&x, &schedule("2", "1", "01/01/2025 - 30/04/2025")));
    }

    #[test]
    fn missing_range_overlaps_everything() {
        let x = schedule("5", "7", "");
        let y = schedule("5", "7", "01/01/2030 - 02/01/2030");
        assert!(conflicts(&x, &y));
        assert!(conflicts(&y, &x));
    }

    #[test]
    fn empty_schedules_never_conflict() {
        let empty = ParsedSchedule::default();
        assert!(!conflicts(&empty, &empty));
    }

    #[test]
    fn detail_names_days_and_periods() {
        let detail = ConflictDetail {
            section_id: "X".into(),
            name: "Algebra".into(),
            days: BTreeSet::from([2, 8]),
            periods: BTreeSet::from([2, 3]),
            date_range: None,
        };
        assert_eq!(detail.to_string(), "'Algebra' (X) on Mon, Sun periods 2, 3 during the whole term");
    }
}
