//! Call-out detection.
//!
//! A day qualifies when any entry starts before 07:00, or at/after 15:30.
//! Starts at/after 16:00 are suppressed when an earlier entry on the day
//! ended at/after 15:30: the worker is treated as continuously on the
//! clock, gaps notwithstanding. Morning starts never invoke continuation.

use std::collections::HashMap;

use service::processing::{CallOutDay, DailyOutput};
use service::records::DailyRecord;
use time::macros::{format_description, time};
use time::{Date, Time};

/// Fixed bonus for a confirmed call-out day.
pub const CALL_OUT_PAYMENT_DKK: f32 = 750.0;

const MORNING_END: Time = time!(7:00);
const EVENING_START: Time = time!(15:30);
const CONTINUATION_START: Time = time!(16:00);

/// Start times on this day that qualify as call-outs, in start order.
pub fn qualifying_start_times(record: &DailyRecord) -> Vec<Time> {
    let mut sorted: Vec<_> = record.entries.iter().collect();
    sorted.sort_by_key(|entry| entry.start_time);

    let mut times = Vec::new();
    for (index, entry) in sorted.iter().enumerate() {
        let start = entry.start_time;
        if start < MORNING_END {
            times.push(start);
            continue;
        }
        if start >= EVENING_START {
            if start >= CONTINUATION_START {
                let has_recent_work = sorted[..index]
                    .iter()
                    .any(|previous| previous.end_time >= EVENING_START);
                if has_recent_work {
                    continue;
                }
            }
            times.push(start);
        }
    }
    times
}

pub fn detect_call_out(record: &DailyRecord) -> bool {
    !qualifying_start_times(record).is_empty()
}

pub fn mark_call_out_eligibility(records: &mut [DailyRecord]) {
    for record in records.iter_mut() {
        record.has_call_out_qualifying_time = detect_call_out(record);
    }
}

/// Qualifying days with their start times, for user confirmation.
pub fn call_out_days(records: &[DailyRecord]) -> Vec<CallOutDay> {
    let format = format_description!("[hour]:[minute]");
    records
        .iter()
        .filter(|record| record.has_call_out_qualifying_time)
        .filter_map(|record| {
            let times: Vec<_> = qualifying_start_times(record)
                .iter()
                .filter_map(|start| start.format(&format).ok())
                .map(Into::into)
                .collect();
            if times.is_empty() {
                return None;
            }
            Some(CallOutDay {
                date: record.date,
                worker: record.worker_name.clone(),
                qualifying_times: times,
            })
        })
        .collect()
}

/// Apply confirmed selections: the fixed payment lands only on days that
/// actually qualify; everything else is reset. Re-application with the same
/// selections is a no-op.
pub fn apply_call_out_selections(outputs: &mut [DailyOutput], selections: &HashMap<Date, bool>) {
    for output in outputs.iter_mut() {
        let selected = selections.get(&output.date).copied().unwrap_or(false);
        if selected && output.has_call_out_qualifying_time {
            output.call_out_payment = CALL_OUT_PAYMENT_DKK;
            output.call_out_applied = true;
        } else {
            output.call_out_payment = 0.0;
            output.call_out_applied = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use service::records::TimeEntry;
    use time::macros::date;

    fn record(entries: Vec<(Time, Time)>) -> DailyRecord {
        let entries = entries
            .into_iter()
            .map(|(start, end)| {
                let hours =
                    (crate::time_split::minute_of_day(end) - crate::time_split::minute_of_day(start)) as f32 / 60.0;
                TimeEntry::new("Arbejdskort", None, start, end, hours)
            })
            .collect();
        DailyRecord::new("Jens Hansen", date!(2026 - 01 - 13), entries)
    }

    #[test]
    fn early_morning_start_qualifies() {
        assert!(detect_call_out(&record(vec![(time!(5:30), time!(9:00))])));
    }

    #[test]
    fn boundary_at_half_past_three() {
        assert!(detect_call_out(&record(vec![(time!(15:30), time!(18:00))])));
        assert!(!detect_call_out(&record(vec![(time!(15:29), time!(18:00))])));
    }

    #[test]
    fn continuation_suppresses_sixteen_hundred_start() {
        // 07:00-15:45 then 16:00-17:30: the late entry is a continuation.
        let record = record(vec![(time!(7:00), time!(15:45)), (time!(16:00), time!(17:30))]);
        assert!(!detect_call_out(&record));
    }

    #[test]
    fn continuation_boundary_end_exactly_half_past_three() {
        let record = record(vec![(time!(10:00), time!(15:30)), (time!(16:00), time!(18:00))]);
        assert!(!detect_call_out(&record));
    }

    #[test]
    fn no_continuation_when_previous_work_ended_early() {
        let record = record(vec![(time!(8:00), time!(15:00)), (time!(16:30), time!(18:00))]);
        assert!(detect_call_out(&record));
    }

    #[test]
    fn start_between_half_past_three_and_four_never_continues() {
        let record = record(vec![(time!(7:00), time!(15:45)), (time!(15:50), time!(17:00))]);
        assert!(detect_call_out(&record));
    }

    #[test]
    fn selections_only_pay_qualifying_days() {
        let mut records = vec![record(vec![(time!(5:30), time!(9:00))])];
        mark_call_out_eligibility(&mut records);

        let mut qualifying = DailyOutput::empty("Jens Hansen".into(), date!(2026 - 01 - 13));
        qualifying.has_call_out_qualifying_time = true;
        let mut plain = DailyOutput::empty("Jens Hansen".into(), date!(2026 - 01 - 14));
        plain.has_call_out_qualifying_time = false;
        let mut outputs = vec![qualifying, plain];

        let selections: HashMap<Date, bool> = [
            (date!(2026 - 01 - 13), true),
            (date!(2026 - 01 - 14), true),
        ]
        .into();
        apply_call_out_selections(&mut outputs, &selections);

        assert!(outputs[0].call_out_applied);
        assert_eq!(outputs[0].call_out_payment, CALL_OUT_PAYMENT_DKK);
        assert!(!outputs[1].call_out_applied);
        assert_eq!(outputs[1].call_out_payment, 0.0);

        // Deselecting resets the payment.
        let selections: HashMap<Date, bool> = [(date!(2026 - 01 - 13), false)].into();
        apply_call_out_selections(&mut outputs, &selections);
        assert!(!outputs[0].call_out_applied);
        assert_eq!(outputs[0].call_out_payment, 0.0);
    }
}
