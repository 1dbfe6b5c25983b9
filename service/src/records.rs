//! Normalized time-registration records.
//!
//! Both ingest paths (vendor CSV upload and the FTZ REST feed) produce the
//! same per-day record stream: one [`DailyRecord`] per (worker, local date)
//! holding the ordered [`TimeEntry`] intervals of that day. The pipeline
//! stages annotate these records in place before the overtime engine
//! consumes them.

use std::sync::Arc;

use lontid_utils::{english_day_name, iso_week_key, DayKind};
use time::{Date, Time};

/// A contiguous work interval on one local date. Intervals never cross
/// midnight; callers must split such intervals before ingest.
#[derive(Clone, Debug, PartialEq)]
pub struct TimeEntry {
    pub activity: Arc<str>,
    pub case_number: Option<Arc<str>>,
    pub start_time: Time,
    pub end_time: Time,
    pub total_hours: f32,
    pub hours_in_norm: f32,
    pub hours_outside_norm: f32,
}

impl TimeEntry {
    pub fn new(
        activity: impl Into<Arc<str>>,
        case_number: Option<Arc<str>>,
        start_time: Time,
        end_time: Time,
        total_hours: f32,
    ) -> Self {
        Self {
            activity: activity.into(),
            case_number,
            start_time,
            end_time,
            total_hours,
            hours_in_norm: 0.0,
            hours_outside_norm: 0.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AbsentType {
    None,
    Vacation,
    Sick,
    PublicHoliday,
    Kursus,
}

impl AbsentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AbsentType::None => "None",
            AbsentType::Vacation => "Vacation",
            AbsentType::Sick => "Sick",
            AbsentType::PublicHoliday => "PublicHoliday",
            AbsentType::Kursus => "Kursus",
        }
    }

    /// Absence selections arriving from the frontend use these labels.
    pub fn from_selection(value: &str) -> Option<Self> {
        match value {
            "None" => Some(AbsentType::None),
            "Vacation" => Some(AbsentType::Vacation),
            "Sick" => Some(AbsentType::Sick),
            "PublicHoliday" => Some(AbsentType::PublicHoliday),
            "Kursus" => Some(AbsentType::Kursus),
            _ => None,
        }
    }
}

/// Employee category from the DBR agreement. Accepted on ingest and recorded
/// with the preview session; categorization itself is type-independent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EmployeeType {
    Laerling,
    #[default]
    Svend,
    Funktionaer,
    Elev,
}

impl EmployeeType {
    pub fn from_form_value(value: &str) -> Self {
        match value {
            "Lærling" => EmployeeType::Laerling,
            "Funktionær" => EmployeeType::Funktionaer,
            "Elev" => EmployeeType::Elev,
            _ => EmployeeType::Svend,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EmployeeType::Laerling => "Lærling",
            EmployeeType::Svend => "Svend",
            EmployeeType::Funktionaer => "Funktionær",
            EmployeeType::Elev => "Elev",
        }
    }
}

/// All entries for one (worker, local date), plus the flags the pipeline
/// derives: absence classification, day-off marker, credited hours and
/// call-out eligibility.
#[derive(Clone, Debug, PartialEq)]
pub struct DailyRecord {
    pub worker_name: Arc<str>,
    pub date: Date,
    pub day_name: Arc<str>,
    pub day_kind: DayKind,
    pub week_number: u8,
    pub entries: Vec<TimeEntry>,
    pub total_hours: f32,
    pub hours_in_norm: f32,
    pub hours_outside_norm: f32,
    pub absent_type: AbsentType,
    pub is_day_off: bool,
    pub credited_hours: f32,
    pub has_call_out_qualifying_time: bool,
}

impl DailyRecord {
    pub fn new(worker_name: impl Into<Arc<str>>, date: Date, entries: Vec<TimeEntry>) -> Self {
        let total_hours = entries.iter().map(|entry| entry.total_hours).sum();
        Self {
            worker_name: worker_name.into(),
            date,
            day_name: english_day_name(date).into(),
            day_kind: DayKind::from_date(date),
            week_number: iso_week_key(date).week,
            entries,
            total_hours,
            hours_in_norm: 0.0,
            hours_outside_norm: 0.0,
            absent_type: AbsentType::None,
            is_day_off: false,
            credited_hours: 0.0,
            has_call_out_qualifying_time: false,
        }
    }

    /// An absence-only day: classified absent and without any worked entries.
    pub fn is_credited_absence(&self) -> bool {
        self.absent_type != AbsentType::None && self.entries.is_empty()
    }
}
