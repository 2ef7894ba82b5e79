use chrono::{NaiveDate, NaiveTime, SecondsFormat};

use crate::error::Error;

/// Format of the dates in the request path, e.g. `2024-Jan-05`.
pub const PATH_DATE_FORMAT: &str = "%Y-%b-%d";

/// Format of all-day event dates returned by the calendar API.
pub const EVENT_DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, Error> {
        if start > end {
            return Err(Error::InvertedRange { start, end });
        }

        Ok(Self { start, end })
    }

    pub fn from_path(start: &str, end: &str) -> Result<Self, Error> {
        Self::new(
            parse_date(start, PATH_DATE_FORMAT)?,
            parse_date(end, PATH_DATE_FORMAT)?,
        )
    }

    pub fn from_event(start: &str, end: &str) -> Result<Self, Error> {
        Self::new(
            parse_date(start, EVENT_DATE_FORMAT)?,
            parse_date(end, EVENT_DATE_FORMAT)?,
        )
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Whole days covered by the range, counted from the hour difference.
    /// A range starting and ending on the same day spans zero days.
    pub fn whole_days(&self) -> i64 {
        self.end.signed_duration_since(self.start).num_hours() / 24
    }

    /// Bounds of the range as RFC 3339 timestamps at midnight UTC.
    pub fn to_rfc3339(&self) -> (String, String) {
        (midnight_utc(self.start), midnight_utc(self.end))
    }
}

fn parse_date(input: &str, format: &str) -> Result<NaiveDate, Error> {
    NaiveDate::parse_from_str(input, format).map_err(|source| Error::InvalidDate {
        input: input.to_owned(),
        source,
    })
}

fn midnight_utc(date: NaiveDate) -> String {
    date.and_time(NaiveTime::MIN)
        .and_utc()
        .to_rfc3339_opts(SecondsFormat::Secs, true)
}
