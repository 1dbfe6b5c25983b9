pub mod date_utils;

pub use date_utils::{
    english_day_name, format_date_dmy, iso_week_key, parse_date_dmy, DayKind, LontidDateError,
    WeekKey,
};
