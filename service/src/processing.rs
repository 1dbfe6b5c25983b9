//! Derived pay-categorization output of the overtime engine.

use std::collections::HashMap;
use std::sync::Arc;

use lontid_utils::DayKind;
use mockall::automock;
use time::Date;

use crate::records::{AbsentType, DailyRecord, EmployeeType, TimeEntry};
use crate::ServiceError;

/// The eleven overtime buckets of the DBR 2026 schedule.
///
/// `hour_1_2`/`hour_3_4`/`hour_5_plus` (cumulative weekly tiers) together
/// with the day-off, Saturday and Sunday buckets partition a day's overtime.
/// `scheduled_day`/`scheduled_night` are a parallel time-of-day view of the
/// same weekday overtime; the two weekday views must never be summed with
/// each other.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OvertimeBreakdown {
    pub hour_1_2: f32,
    pub hour_3_4: f32,
    pub hour_5_plus: f32,
    pub scheduled_day: f32,
    pub scheduled_night: f32,
    pub dayoff_day: f32,
    pub dayoff_night: f32,
    pub saturday_day: f32,
    pub saturday_night: f32,
    pub sunday_before_noon: f32,
    pub sunday_after_noon: f32,
}

impl OvertimeBreakdown {
    /// Total overtime hours: the tiered partition, excluding the parallel
    /// `scheduled_*` view. This is the figure that feeds the Danløn
    /// overtime pay code.
    pub fn tiered_total(&self) -> f32 {
        self.hour_1_2
            + self.hour_3_4
            + self.hour_5_plus
            + self.dayoff_day
            + self.dayoff_night
            + self.saturday_day
            + self.saturday_night
            + self.sunday_before_noon
            + self.sunday_after_noon
    }

    pub fn accumulate(&mut self, other: &OvertimeBreakdown) {
        self.hour_1_2 += other.hour_1_2;
        self.hour_3_4 += other.hour_3_4;
        self.hour_5_plus += other.hour_5_plus;
        self.scheduled_day += other.scheduled_day;
        self.scheduled_night += other.scheduled_night;
        self.dayoff_day += other.dayoff_day;
        self.dayoff_night += other.dayoff_night;
        self.saturday_day += other.saturday_day;
        self.saturday_night += other.saturday_night;
        self.sunday_before_noon += other.sunday_before_noon;
        self.sunday_after_noon += other.sunday_after_noon;
    }
}

/// Per-day presentation record emitted by the engine.
#[derive(Clone, Debug, PartialEq)]
pub struct DailyOutput {
    pub worker: Arc<str>,
    pub date: Date,
    pub day: Arc<str>,
    pub day_kind: DayKind,
    pub total_hours: f32,
    pub hours_norm_time: f32,
    pub hours_outside_norm: f32,
    pub week_number: u8,
    pub weekly_total: f32,
    pub normal_hours: f32,
    pub breakdown: OvertimeBreakdown,
    pub overtime_1: f32,
    pub overtime_2: f32,
    pub overtime_3: f32,
    pub has_call_out_qualifying_time: bool,
    pub call_out_payment: f32,
    pub call_out_applied: bool,
    pub entries: Vec<TimeEntry>,
}

impl DailyOutput {
    /// Zeroed output for a date without registrations (date filler).
    pub fn empty(worker: Arc<str>, date: Date) -> Self {
        Self {
            worker,
            date,
            day: lontid_utils::english_day_name(date).into(),
            day_kind: DayKind::from_date(date),
            total_hours: 0.0,
            hours_norm_time: 0.0,
            hours_outside_norm: 0.0,
            week_number: lontid_utils::iso_week_key(date).week,
            weekly_total: 0.0,
            normal_hours: 0.0,
            breakdown: OvertimeBreakdown::default(),
            overtime_1: 0.0,
            overtime_2: 0.0,
            overtime_3: 0.0,
            has_call_out_qualifying_time: false,
            call_out_payment: 0.0,
            call_out_applied: false,
            entries: Vec::new(),
        }
    }

    pub fn total_overtime(&self) -> f32 {
        self.breakdown.tiered_total()
    }
}

/// Per (worker, ISO year, ISO week) summary.
#[derive(Clone, Debug, PartialEq)]
pub struct WeeklySummary {
    pub worker_name: Arc<str>,
    pub year: i32,
    pub week_number: u8,
    pub total_hours: f32,
    pub normal_hours: f32,
    pub breakdown: OvertimeBreakdown,
    pub overtime_1: f32,
    pub overtime_2: f32,
    pub overtime_3: f32,
}

/// One day that qualifies for a call-out bonus, with the start times that
/// triggered it, for user confirmation in the frontend.
#[derive(Clone, Debug, PartialEq)]
pub struct CallOutDay {
    pub date: Date,
    pub worker: Arc<str>,
    pub qualifying_times: Vec<Arc<str>>,
}

#[derive(Clone, Debug, PartialEq, Default)]
pub struct ProcessedData {
    pub outputs: Vec<DailyOutput>,
    pub summaries: Vec<WeeklySummary>,
    pub call_out_days: Vec<CallOutDay>,
}

/// Runs the full categorization pipeline (splitting, classification,
/// overtime engine, date filling) over a record stream. Recalculation after
/// user edits always goes through [`ProcessingService::process`] again;
/// partial updates are impossible because hourly tiering is order-dependent
/// across the week.
#[automock]
pub trait ProcessingService {
    fn process(
        &self,
        records: &mut Vec<DailyRecord>,
        employee_type: EmployeeType,
    ) -> Result<ProcessedData, ServiceError>;

    /// Apply confirmed call-out selections to already-processed outputs.
    fn apply_call_out_selections(
        &self,
        outputs: &mut [DailyOutput],
        selections: &HashMap<Date, bool>,
    );

    /// Apply absence selections to the raw records (only days without worked
    /// entries can be marked; unknown dates get a fresh absent record).
    fn apply_absence_selections(
        &self,
        records: &mut Vec<DailyRecord>,
        selections: &HashMap<Date, AbsentType>,
    ) -> Result<(), ServiceError>;
}
