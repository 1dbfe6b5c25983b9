//! DBR 2026 overtime categorization.
//!
//! Records are grouped per (worker, ISO year, ISO week) and walked in date
//! order. Ordinary weekdays fill the 37-hour weekly norm first; the
//! remainder is overtime, categorized both by cumulative weekly tiers and
//! by a time-of-day split of the worked overtime tail. Saturdays, Sundays
//! and worked day-offs bypass the norm entirely and land in their own
//! buckets. Absent days credit 7.4 hours against the norm; a credit that
//! overflows the norm is tiered like worked overtime but carries no
//! time-of-day attribution, having no entries.

use std::collections::BTreeMap;
use std::sync::Arc;

use lontid_utils::{iso_week_key, DayKind, WeekKey};
use service::processing::{DailyOutput, OvertimeBreakdown, WeeklySummary};
use service::records::{DailyRecord, TimeEntry};
use service::ServiceError;
use time::Time;

use crate::time_split::{
    day_night_split, minute_of_day, noon_split, OT_DAY_END, OT_DAY_START,
};

pub const WEEKLY_NORM_HOURS: f32 = 37.0;

/// Each of the first two weekly tiers holds two overtime hours.
const TIER_CAP_1: f32 = 2.0;
const TIER_CAP_2: f32 = 4.0;

pub fn round2(value: f32) -> f32 {
    (value * 100.0).round() / 100.0
}

fn group_by_week(
    records: &[DailyRecord],
) -> BTreeMap<(Arc<str>, WeekKey), Vec<&DailyRecord>> {
    let mut grouped: BTreeMap<(Arc<str>, WeekKey), Vec<&DailyRecord>> = BTreeMap::new();
    for record in records {
        grouped
            .entry((record.worker_name.clone(), iso_week_key(record.date)))
            .or_default()
            .push(record);
    }
    for week in grouped.values_mut() {
        week.sort_by_key(|record| record.date);
    }
    grouped
}

/// Time-of-day split of the last `ot_hours` worked hours of the day.
/// Overtime is attributed to the tail of the day's entries: the sub-interval
/// at the end of each entry, walking backwards until the overtime is
/// exhausted, split at 06:00/18:00.
fn scheduled_split_of_tail(entries: &[TimeEntry], ot_hours: f32) -> (f32, f32) {
    let mut sorted: Vec<_> = entries.iter().collect();
    sorted.sort_by_key(|entry| entry.start_time);

    let day_window = (minute_of_day(OT_DAY_START), minute_of_day(OT_DAY_END));
    let mut remaining = (ot_hours * 60.0).round() as i32;
    let mut day_minutes = 0;
    let mut night_minutes = 0;

    for entry in sorted.iter().rev() {
        if remaining <= 0 {
            break;
        }
        let start = minute_of_day(entry.start_time);
        let end = minute_of_day(entry.end_time);
        let take = remaining.min(end - start);
        if take <= 0 {
            continue;
        }
        let tail_start = end - take;
        let overlap = (end.min(day_window.1) - tail_start.max(day_window.0)).max(0);
        day_minutes += overlap;
        night_minutes += take - overlap;
        remaining -= take;
    }

    (day_minutes as f32 / 60.0, night_minutes as f32 / 60.0)
}

struct WeekState {
    norm_used: f32,
    ot_hours_used: f32,
    weekly_total: f32,
}

impl WeekState {
    fn new() -> Self {
        Self {
            norm_used: 0.0,
            ot_hours_used: 0.0,
            weekly_total: 0.0,
        }
    }

    /// Fill the cumulative weekly tiers with `ot_hours` of weekday overtime.
    fn fill_tiers(&mut self, ot_hours: f32, breakdown: &mut OvertimeBreakdown) {
        let mut remaining = ot_hours;

        let tier_1 = remaining.min((TIER_CAP_1 - self.ot_hours_used).max(0.0));
        breakdown.hour_1_2 += tier_1;
        self.ot_hours_used += tier_1;
        remaining -= tier_1;

        let tier_2 = remaining.min((TIER_CAP_2 - self.ot_hours_used).max(0.0));
        breakdown.hour_3_4 += tier_2;
        self.ot_hours_used += tier_2;
        remaining -= tier_2;

        breakdown.hour_5_plus += remaining;
        self.ot_hours_used += remaining;
    }
}

fn split_entries_by<F>(entries: &[TimeEntry], split: F) -> Result<(f32, f32), ServiceError>
where
    F: Fn(Time, Time) -> Result<(f32, f32), ServiceError>,
{
    let mut first = 0.0;
    let mut second = 0.0;
    for entry in entries {
        let (entry_first, entry_second) = split(entry.start_time, entry.end_time)?;
        first += entry_first;
        second += entry_second;
    }
    Ok((first, second))
}

fn calculate_week(
    records: &[&DailyRecord],
) -> Result<(WeeklySummary, Vec<DailyOutput>), ServiceError> {
    let first = records
        .first()
        .ok_or_else(|| ServiceError::invalid_input("empty week"))?;
    let worker_name = first.worker_name.clone();
    let week_key = iso_week_key(first.date);

    let mut state = WeekState::new();
    let mut weekly_breakdown = OvertimeBreakdown::default();
    let mut outputs = Vec::with_capacity(records.len());

    for record in records {
        let day_total = record.total_hours + record.credited_hours;
        let mut breakdown = OvertimeBreakdown::default();
        let mut day_norm = 0.0;

        match record.day_kind {
            DayKind::Sunday => {
                let (before, after) = split_entries_by(&record.entries, noon_split)?;
                breakdown.sunday_before_noon = before;
                breakdown.sunday_after_noon = after;
            }
            DayKind::Saturday => {
                let (day, night) = split_entries_by(&record.entries, day_night_split)?;
                breakdown.saturday_day = day;
                breakdown.saturday_night = night;
            }
            DayKind::Weekday if record.is_day_off => {
                let (day, night) = split_entries_by(&record.entries, day_night_split)?;
                breakdown.dayoff_day = day;
                breakdown.dayoff_night = night;
            }
            DayKind::Weekday => {
                let available_norm = (WEEKLY_NORM_HOURS - state.norm_used).max(0.0);
                day_norm = day_total.min(available_norm);
                state.norm_used += day_norm;

                let ot_this_day = day_total - day_norm;
                if ot_this_day > 0.0 {
                    state.fill_tiers(ot_this_day, &mut breakdown);
                    if !record.entries.is_empty() {
                        let (day, night) = scheduled_split_of_tail(&record.entries, ot_this_day);
                        breakdown.scheduled_day = day;
                        breakdown.scheduled_night = night;
                    }
                }
            }
        }

        state.weekly_total += day_total;
        weekly_breakdown.accumulate(&breakdown);

        let overtime_1 = breakdown.hour_1_2;
        let overtime_2 = breakdown.hour_3_4;
        let overtime_3 = breakdown.tiered_total() - breakdown.hour_1_2 - breakdown.hour_3_4;

        outputs.push(DailyOutput {
            worker: worker_name.clone(),
            date: record.date,
            day: record.day_name.clone(),
            day_kind: record.day_kind,
            total_hours: round2(day_total),
            hours_norm_time: round2(record.hours_in_norm),
            hours_outside_norm: round2(record.hours_outside_norm),
            week_number: week_key.week,
            weekly_total: round2(state.weekly_total),
            normal_hours: round2(day_norm),
            breakdown: round_breakdown(&breakdown),
            overtime_1: round2(overtime_1),
            overtime_2: round2(overtime_2),
            overtime_3: round2(overtime_3),
            has_call_out_qualifying_time: record.has_call_out_qualifying_time,
            call_out_payment: 0.0,
            call_out_applied: false,
            entries: record.entries.clone(),
        });
    }

    let weekly_breakdown = round_breakdown(&weekly_breakdown);
    let summary = WeeklySummary {
        worker_name,
        year: week_key.year,
        week_number: week_key.week,
        total_hours: round2(state.weekly_total),
        normal_hours: round2(state.norm_used),
        overtime_1: weekly_breakdown.hour_1_2,
        overtime_2: weekly_breakdown.hour_3_4,
        overtime_3: round2(
            weekly_breakdown.tiered_total()
                - weekly_breakdown.hour_1_2
                - weekly_breakdown.hour_3_4,
        ),
        breakdown: weekly_breakdown,
    };

    Ok((summary, outputs))
}

fn round_breakdown(breakdown: &OvertimeBreakdown) -> OvertimeBreakdown {
    OvertimeBreakdown {
        hour_1_2: round2(breakdown.hour_1_2),
        hour_3_4: round2(breakdown.hour_3_4),
        hour_5_plus: round2(breakdown.hour_5_plus),
        scheduled_day: round2(breakdown.scheduled_day),
        scheduled_night: round2(breakdown.scheduled_night),
        dayoff_day: round2(breakdown.dayoff_day),
        dayoff_night: round2(breakdown.dayoff_night),
        saturday_day: round2(breakdown.saturday_day),
        saturday_night: round2(breakdown.saturday_night),
        sunday_before_noon: round2(breakdown.sunday_before_noon),
        sunday_after_noon: round2(breakdown.sunday_after_noon),
    }
}

/// Run the engine over the whole record stream, week by week, workers and
/// weeks in ascending order.
pub fn process_all_records(
    records: &[DailyRecord],
) -> Result<(Vec<WeeklySummary>, Vec<DailyOutput>), ServiceError> {
    let grouped = group_by_week(records);

    let mut summaries = Vec::with_capacity(grouped.len());
    let mut outputs = Vec::with_capacity(records.len());
    for week_records in grouped.values() {
        let (summary, week_outputs) = calculate_week(week_records)?;
        summaries.push(summary);
        outputs.extend(week_outputs);
    }
    Ok((summaries, outputs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use service::records::AbsentType;
    use time::macros::{date, time};
    use time::Date;

    fn worked_day(date: Date, start: Time, end: Time) -> DailyRecord {
        let hours = (minute_of_day(end) - minute_of_day(start)) as f32 / 60.0;
        let entry = TimeEntry::new("Arbejdskort", None, start, end, hours);
        DailyRecord::new("Jens Hansen", date, vec![entry])
    }

    fn absent_day(date: Date, absent_type: AbsentType) -> DailyRecord {
        let mut record = DailyRecord::new("Jens Hansen", date, vec![]);
        record.absent_type = absent_type;
        record.credited_hours = crate::absence::DAILY_CREDIT_HOURS;
        record
    }

    #[test]
    fn forty_hour_week_tiering() {
        // Five weekdays of 08:00-16:00: 40 hours, 3 of them overtime.
        let records: Vec<_> = (12..=16)
            .map(|day| {
                worked_day(
                    Date::from_calendar_date(2026, time::Month::January, day).unwrap(),
                    time!(8:00),
                    time!(16:00),
                )
            })
            .collect();

        let (summaries, outputs) = process_all_records(&records).unwrap();
        assert_eq!(summaries.len(), 1);
        let summary = &summaries[0];
        assert_eq!(summary.normal_hours, 37.0);
        assert_eq!(summary.breakdown.hour_1_2, 2.0);
        assert_eq!(summary.breakdown.hour_3_4, 1.0);
        assert_eq!(summary.breakdown.hour_5_plus, 0.0);
        assert_eq!(summary.breakdown.scheduled_day, 3.0);
        assert_eq!(summary.breakdown.scheduled_night, 0.0);
        assert_eq!(summary.total_hours, 40.0);

        // All overtime lands on Friday; the first four days are pure norm.
        assert_eq!(outputs[3].normal_hours, 8.0);
        assert_eq!(outputs[4].normal_hours, 5.0);
        assert_eq!(outputs[4].breakdown.hour_1_2, 2.0);
        assert_eq!(outputs[4].breakdown.hour_3_4, 1.0);
        assert_eq!(outputs[4].weekly_total, 40.0);
    }

    #[test]
    fn exactly_norm_week_has_no_overtime() {
        // 37.0 hours: four days of 7.5 and one of 7.0.
        let mut records: Vec<_> = (12..=15)
            .map(|day| {
                worked_day(
                    Date::from_calendar_date(2026, time::Month::January, day).unwrap(),
                    time!(8:00),
                    time!(15:30),
                )
            })
            .collect();
        records.push(worked_day(date!(2026 - 01 - 16), time!(8:00), time!(15:00)));

        let (summaries, _) = process_all_records(&records).unwrap();
        let summary = &summaries[0];
        assert_eq!(summary.normal_hours, 37.0);
        assert_eq!(summary.breakdown, OvertimeBreakdown::default());
    }

    #[test]
    fn saturday_splits_day_and_night() {
        let records = vec![worked_day(date!(2026 - 01 - 17), time!(16:00), time!(20:00))];
        let (summaries, outputs) = process_all_records(&records).unwrap();
        let breakdown = &summaries[0].breakdown;
        assert_eq!(breakdown.saturday_day, 2.0);
        assert_eq!(breakdown.saturday_night, 2.0);
        assert_eq!(breakdown.hour_1_2, 0.0);
        assert_eq!(outputs[0].normal_hours, 0.0);
        assert_eq!(outputs[0].overtime_3, 4.0);
    }

    #[test]
    fn sunday_splits_at_noon_and_never_tiers() {
        let records = vec![worked_day(date!(2026 - 01 - 18), time!(10:00), time!(14:00))];
        let (summaries, _) = process_all_records(&records).unwrap();
        let breakdown = &summaries[0].breakdown;
        assert_eq!(breakdown.sunday_before_noon, 2.0);
        assert_eq!(breakdown.sunday_after_noon, 2.0);
        assert_eq!(breakdown.hour_1_2, 0.0);
        assert_eq!(breakdown.hour_3_4, 0.0);
        assert_eq!(breakdown.hour_5_plus, 0.0);
    }

    #[test]
    fn worked_day_off_uses_dayoff_buckets() {
        let mut record = worked_day(date!(2026 - 01 - 14), time!(16:00), time!(20:00));
        record.is_day_off = true;
        let (summaries, _) = process_all_records(&[record]).unwrap();
        let breakdown = &summaries[0].breakdown;
        assert_eq!(breakdown.dayoff_day, 2.0);
        assert_eq!(breakdown.dayoff_night, 2.0);
        assert_eq!(summaries[0].normal_hours, 0.0);
    }

    #[test]
    fn absence_credit_crossing_the_norm_is_tiered() {
        // Mon-Thu 08:00-16:30 (8.5h each), Friday vacation credited 7.4h.
        // The credit meets only 3.0h of remaining norm; its 4.4h overflow
        // fires the credited-overtime path.
        let mut records: Vec<_> = (12..=15)
            .map(|day| {
                worked_day(
                    Date::from_calendar_date(2026, time::Month::January, day).unwrap(),
                    time!(8:00),
                    time!(16:30),
                )
            })
            .collect();
        records.push(absent_day(date!(2026 - 01 - 16), AbsentType::Vacation));

        let (summaries, outputs) = process_all_records(&records).unwrap();
        let summary = &summaries[0];
        assert_eq!(summary.normal_hours, 37.0);
        assert_eq!(summary.breakdown.hour_1_2, 2.0);
        assert_eq!(summary.breakdown.hour_3_4, 2.0);
        assert!((summary.breakdown.hour_5_plus - 0.4).abs() < 0.01);
        // Credited overtime has no entries, so no time-of-day view.
        assert_eq!(summary.breakdown.scheduled_day, 0.0);
        assert_eq!(summary.breakdown.scheduled_night, 0.0);

        let friday = &outputs[4];
        assert_eq!(friday.normal_hours, 3.0);
        assert!((friday.total_hours - 7.4).abs() < 0.01);
    }

    #[test]
    fn evening_overtime_splits_into_scheduled_night() {
        // Mon-Thu 07:00-16:15 exhaust the norm; Friday is pure overtime.
        let mut records: Vec<_> = (12..=15)
            .map(|day| {
                worked_day(
                    Date::from_calendar_date(2026, time::Month::January, day).unwrap(),
                    time!(7:00),
                    time!(16:15),
                )
            })
            .collect();
        // Friday 10:00-20:00: 10h, all overtime (norm exhausted).
        records.push(worked_day(date!(2026 - 01 - 16), time!(10:00), time!(20:00)));

        let (summaries, outputs) = process_all_records(&records).unwrap();
        let summary = &summaries[0];
        // 4 * 9.25 = 37 norm; Friday is pure overtime.
        assert_eq!(summary.normal_hours, 37.0);
        let friday = &outputs[4];
        assert_eq!(friday.breakdown.hour_1_2, 2.0);
        assert_eq!(friday.breakdown.hour_3_4, 2.0);
        assert_eq!(friday.breakdown.hour_5_plus, 6.0);
        // The overtime tail 10:00-20:00 splits 8h day / 2h night.
        assert_eq!(friday.breakdown.scheduled_day, 8.0);
        assert_eq!(friday.breakdown.scheduled_night, 2.0);
        // Both weekday views cover the same overtime hours.
        assert!(
            (friday.breakdown.scheduled_day + friday.breakdown.scheduled_night
                - (friday.breakdown.hour_1_2
                    + friday.breakdown.hour_3_4
                    + friday.breakdown.hour_5_plus))
                .abs()
                < 1e-6
        );
    }

    #[test]
    fn weeks_are_keyed_by_iso_year() {
        let records = vec![
            // Friday 2027-01-01 belongs to ISO week 53 of 2026.
            worked_day(date!(2026 - 12 - 28), time!(8:00), time!(16:00)),
            worked_day(date!(2027 - 01 - 01), time!(8:00), time!(16:00)),
        ];
        let (summaries, _) = process_all_records(&records).unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].year, 2026);
        assert_eq!(summaries[0].week_number, 53);
        assert_eq!(summaries[0].total_hours, 16.0);
    }

    #[test]
    fn summary_invariants_hold() {
        let records = vec![
            worked_day(date!(2026 - 01 - 12), time!(6:00), time!(18:00)),
            worked_day(date!(2026 - 01 - 13), time!(6:00), time!(18:00)),
            worked_day(date!(2026 - 01 - 14), time!(6:00), time!(18:00)),
            worked_day(date!(2026 - 01 - 15), time!(6:00), time!(18:00)),
            worked_day(date!(2026 - 01 - 17), time!(9:00), time!(13:00)),
        ];
        let (summaries, _) = process_all_records(&records).unwrap();
        let summary = &summaries[0];
        assert!(summary.normal_hours <= WEEKLY_NORM_HOURS);
        assert!(summary.breakdown.hour_1_2 <= 2.0);
        assert!(summary.breakdown.hour_3_4 <= 2.0);
        assert!(
            (summary.total_hours - summary.normal_hours - summary.breakdown.tiered_total()).abs()
                < 0.01
        );
    }
}
