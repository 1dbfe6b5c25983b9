use std::fmt::{Display, Formatter};
use thiserror::*;

use time::macros::format_description;
use time::{Date, Weekday};

#[derive(Debug, Error)]
pub enum LontidDateError {
    #[error("Invalid date: {0}")]
    DateError(#[from] time::error::ComponentRange),
    #[error("Unparseable date: {0}")]
    ParseError(#[from] time::error::Parse),
    #[error("Could not format date: {0}")]
    FormatError(#[from] time::error::Format),
}

/// How a calendar day is treated by the collective agreement:
/// ordinary weekdays follow the weekly norm, Saturdays and Sundays
/// have their own overtime buckets.
#[derive(Debug, PartialEq, Eq, Clone, Copy, PartialOrd, Ord, Hash)]
pub enum DayKind {
    Weekday,
    Saturday,
    Sunday,
}

impl From<Weekday> for DayKind {
    fn from(weekday: Weekday) -> Self {
        match weekday {
            Weekday::Saturday => Self::Saturday,
            Weekday::Sunday => Self::Sunday,
            _ => Self::Weekday,
        }
    }
}

impl Display for DayKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                DayKind::Weekday => "Weekday",
                DayKind::Saturday => "Saturday",
                DayKind::Sunday => "Sunday",
            }
        )
    }
}

impl DayKind {
    pub fn from_date(date: Date) -> Self {
        Self::from(date.weekday())
    }

    pub fn is_weekend(&self) -> bool {
        matches!(self, DayKind::Saturday | DayKind::Sunday)
    }
}

/// ISO week identifier. The year is the ISO week-based year, so the first
/// days of January may belong to the previous year's last week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WeekKey {
    pub year: i32,
    pub week: u8,
}

pub fn iso_week_key(date: Date) -> WeekKey {
    let (year, week, _) = date.to_iso_week_date();
    WeekKey { year, week }
}

/// English weekday name as rendered in exports ("Monday" .. "Sunday").
pub fn english_day_name(date: Date) -> &'static str {
    match date.weekday() {
        Weekday::Monday => "Monday",
        Weekday::Tuesday => "Tuesday",
        Weekday::Wednesday => "Wednesday",
        Weekday::Thursday => "Thursday",
        Weekday::Friday => "Friday",
        Weekday::Saturday => "Saturday",
        Weekday::Sunday => "Sunday",
    }
}

/// Wire date format used by the FTZ exports and the frontend: DD-MM-YYYY.
pub fn format_date_dmy(date: Date) -> Result<String, LontidDateError> {
    let format = format_description!("[day]-[month]-[year]");
    Ok(date.format(&format)?)
}

pub fn parse_date_dmy(value: &str) -> Result<Date, LontidDateError> {
    let format = format_description!("[day]-[month]-[year]");
    Ok(Date::parse(value, &format)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn day_kind_from_date() {
        assert_eq!(DayKind::from_date(date!(2026 - 01 - 12)), DayKind::Weekday);
        assert_eq!(DayKind::from_date(date!(2026 - 01 - 17)), DayKind::Saturday);
        assert_eq!(DayKind::from_date(date!(2026 - 01 - 18)), DayKind::Sunday);
        assert!(DayKind::Sunday.is_weekend());
        assert!(!DayKind::Weekday.is_weekend());
    }

    #[test]
    fn week_key_uses_iso_week_year() {
        // 2026-01-01 is a Thursday in ISO week 1 of 2026.
        assert_eq!(
            iso_week_key(date!(2026 - 01 - 01)),
            WeekKey { year: 2026, week: 1 }
        );
        // 2027-01-01 is a Friday and belongs to ISO week 53 of 2026.
        assert_eq!(
            iso_week_key(date!(2027 - 01 - 01)),
            WeekKey { year: 2026, week: 53 }
        );
    }

    #[test]
    fn dmy_round_trip() {
        let date = date!(2026 - 01 - 12);
        let formatted = format_date_dmy(date).unwrap();
        assert_eq!(formatted, "12-01-2026");
        assert_eq!(parse_date_dmy(&formatted).unwrap(), date);
    }
}
