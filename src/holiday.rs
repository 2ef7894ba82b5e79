use std::collections::BTreeSet;

use crate::date::DateRange;

pub const DEFAULT_ALLOWANCE: i64 = 26;

/// Tags marking an event as time off. `urlop` is Polish for holiday.
pub const HOLIDAY_TAGS: [&str; 2] = ["holiday", "urlop"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedEvent {
    pub timespan: DateRange,
    pub tags: BTreeSet<String>,
}

impl TaggedEvent {
    pub fn is_holiday(&self) -> bool {
        HOLIDAY_TAGS.iter().any(|tag| self.tags.contains(*tag))
    }
}

/// Subtracts the whole-day length of every holiday event from `allowance`.
/// The result is allowed to go negative.
pub fn remaining_holiday_days(events: &[TaggedEvent], allowance: i64) -> i64 {
    let taken: i64 = events
        .iter()
        .filter(|event| event.is_holiday())
        .map(|event| event.timespan.whole_days())
        .sum();

    allowance - taken
}
