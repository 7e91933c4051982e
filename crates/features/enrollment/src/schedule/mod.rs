//! Normalization of loosely structured section schedules.
//!
//! Schedules arrive either as discrete `dayOfWeek`/`periods`/`dateRange`
//! fields or as one `days | periods | room | date-range` string. Every
//! parser here degrades to an empty set or an absent range on bad input.

mod grammar;

use crate::model::{ClassSection, LooseText};
use campus_domain::constants::SCHEDULE_DELIMITER;
use chrono::NaiveDate;
use std::collections::BTreeSet;
use std::fmt;

/// Day code of Sunday. Monday through Saturday are 2 through 7.
pub const SUNDAY: u8 = 8;

/// Lowercase markers meaning Sunday.
const SUNDAY_MARKERS: [&str; 5] = ["cn", "nhật", "chủ nhật", "sun", "sunday"];

/// Widest period range accepted from a single token.
const MAX_PERIOD_SPAN: u32 = 64;

/// Inclusive calendar interval with `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Builds the interval in either argument order.
    #[must_use]
    pub fn new(a: NaiveDate, b: NaiveDate) -> Self {
        Self { start: a.min(b), end: a.max(b) }
    }

    #[must_use]
    pub const fn start(&self) -> NaiveDate {
        self.start
    }

    #[must_use]
    pub const fn end(&self) -> NaiveDate {
        self.end
    }

    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start.max(other.start) <= self.end.min(other.end)
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.start.format("%d/%m/%Y"), self.end.format("%d/%m/%Y"))
    }
}

/// Comparable form of a section schedule.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedSchedule {
    pub days: BTreeSet<u8>,
    pub periods: BTreeSet<u32>,
    /// `None` overlaps every range.
    pub dates: Option<DateRange>,
}

impl ParsedSchedule {
    #[must_use]
    pub fn parse(section: &ClassSection) -> Self {
        let text = ScheduleText::of(section);
        Self::from_parts(&text.days, &text.periods, &text.dates)
    }

    #[must_use]
    pub fn from_parts(days: &str, periods: &str, dates: &str) -> Self {
        Self { days: parse_days(days), periods: parse_periods(periods), dates: parse_dates(dates) }
    }
}

/// Raw schedule components of a section after the delimited-string fallback.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleText {
    pub days: String,
    pub periods: String,
    pub dates: String,
}

impl ScheduleText {
    /// Discrete fields win; blank ones are filled from the `schedule` string
    /// when it carries the delimiter. A three-segment string has no room.
    #[must_use]
    pub fn of(section: &ClassSection) -> Self {
        let field = |value: Option<&LooseText>| value.map(LooseText::render).unwrap_or_default();
        let mut text = Self {
            days: field(section.day_of_week.as_ref()),
            periods: field(section.periods.as_ref()),
            dates: field(section.date_range.as_ref()),
        };

        let combined = field(section.schedule.as_ref());
        if !combined.contains(SCHEDULE_DELIMITER) {
            return text;
        }

        let parts: Vec<&str> = combined.split(SCHEDULE_DELIMITER).map(str::trim).collect();
        if text.days.trim().is_empty() {
            parts[0].clone_into(&mut text.days);
        }
        if text.periods.trim().is_empty()
            && let Some(periods) = parts.get(1)
        {
            (*periods).clone_into(&mut text.periods);
        }
        if text.dates.trim().is_empty() {
            let dates = match parts.len() {
                3 => parts.get(2),
                n if n >= 4 => parts.get(3),
                _ => None,
            };
            if let Some(dates) = dates {
                (*dates).clone_into(&mut text.dates);
            }
        }
        text
    }
}

/// Day codes 2..=8 in `text`. Lists such as `2-4-6` name three days.
#[must_use]
pub fn parse_days(text: &str) -> BTreeSet<u8> {
    let lower = text.to_lowercase();
    let mut days: BTreeSet<u8> = grammar::numbers(&lower)
        .into_iter()
        .filter_map(|n| u8::try_from(n).ok())
        .filter(|n| (2..=SUNDAY).contains(n))
        .collect();
    if SUNDAY_MARKERS.iter().any(|marker| lower.contains(marker)) {
        days.insert(SUNDAY);
    }
    days
}

/// Period numbers in `text`. Tokens split on whitespace and commas; a token
/// with `-` covers its first through last number.
#[must_use]
pub fn parse_periods(text: &str) -> BTreeSet<u32> {
    let mut periods = BTreeSet::new();
    let tokens = text.split(|c: char| c == ',' || c.is_whitespace()).filter(|t| !t.is_empty());
    for token in tokens {
        let numbers = grammar::numbers(token);
        if !token.contains('-') {
            periods.extend(numbers);
            continue;
        }
        if let [first, .., last] = numbers.as_slice()
            && first <= last
            && last - first < MAX_PERIOD_SPAN
        {
            periods.extend(*first..=*last);
        }
    }
    periods
}

/// The first two `d/m/yyyy` dates of `text` as a range. Fewer than two, or an
/// impossible calendar date, yields `None`.
#[must_use]
pub fn parse_dates(text: &str) -> Option<DateRange> {
    let tokens = grammar::date_tokens(text, 2);
    let [first, second] = tokens.as_slice() else {
        return None;
    };
    let date = |(day, month, year): grammar::DateToken| NaiveDate::from_ymd_opt(year, month, day);
    Some(DateRange::new(date(*first)?, date(*second)?))
}

/// Short label of a day code.
#[must_use]
pub fn day_label(code: u8) -> &'static str {
    match code {
        2 => "Mon",
        3 => "Tue",
        4 => "Wed",
        5 => "Thu",
        6 => "Fri",
        7 => "Sat",
        SUNDAY => "Sun",
        _ => "?",
    }
}
