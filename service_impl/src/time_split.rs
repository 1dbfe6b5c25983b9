//! Interval projections on a single day.
//!
//! Every split reduces to interval intersection on minute counts. Intervals
//! never cross midnight; an entry with `end <= start` is rejected.

use service::records::DailyRecord;
use service::ServiceError;
use time::macros::time;
use time::Time;

/// Reference working window used to split entries into in-norm hours.
pub const NORM_START: Time = time!(7:00);
pub const NORM_END: Time = time!(17:00);

/// Day window for the overtime day/night split.
pub const OT_DAY_START: Time = time!(6:00);
pub const OT_DAY_END: Time = time!(18:00);

/// Sunday overtime splits at noon.
pub const SUNDAY_NOON: Time = time!(12:00);

pub fn minute_of_day(value: Time) -> i32 {
    value.hour() as i32 * 60 + value.minute() as i32
}

fn minutes_to_hours(minutes: i32) -> f32 {
    minutes as f32 / 60.0
}

fn check_interval(start: Time, end: Time) -> Result<(i32, i32), ServiceError> {
    let start_minutes = minute_of_day(start);
    let end_minutes = minute_of_day(end);
    if end_minutes <= start_minutes {
        return Err(ServiceError::invalid_input(format!(
            "invalid interval: end {end} is not after start {start}"
        )));
    }
    Ok((start_minutes, end_minutes))
}

/// Hours of `[start, end)` inside `[window_start, window_end)` and outside.
pub fn split_by_window(
    start: Time,
    end: Time,
    window_start: Time,
    window_end: Time,
) -> Result<(f32, f32), ServiceError> {
    let (start_minutes, end_minutes) = check_interval(start, end)?;
    let total = end_minutes - start_minutes;
    let overlap = (end_minutes.min(minute_of_day(window_end))
        - start_minutes.max(minute_of_day(window_start)))
    .max(0);
    Ok((minutes_to_hours(overlap), minutes_to_hours(total - overlap)))
}

/// Hours of `[start, end)` before and at-or-after `boundary`.
pub fn split_by_boundary(
    start: Time,
    end: Time,
    boundary: Time,
) -> Result<(f32, f32), ServiceError> {
    let (start_minutes, end_minutes) = check_interval(start, end)?;
    let boundary_minutes = minute_of_day(boundary);
    let before = (end_minutes.min(boundary_minutes) - start_minutes).max(0);
    let after = (end_minutes - start_minutes.max(boundary_minutes)).max(0);
    Ok((minutes_to_hours(before), minutes_to_hours(after)))
}

pub fn norm_split(start: Time, end: Time) -> Result<(f32, f32), ServiceError> {
    split_by_window(start, end, NORM_START, NORM_END)
}

pub fn day_night_split(start: Time, end: Time) -> Result<(f32, f32), ServiceError> {
    split_by_window(start, end, OT_DAY_START, OT_DAY_END)
}

pub fn noon_split(start: Time, end: Time) -> Result<(f32, f32), ServiceError> {
    split_by_boundary(start, end, SUNDAY_NOON)
}

/// Annotate every entry and record with its in-norm / outside-norm hours.
pub fn annotate_records(records: &mut [DailyRecord]) -> Result<(), ServiceError> {
    for record in records.iter_mut() {
        let mut in_norm = 0.0;
        let mut outside = 0.0;
        for entry in record.entries.iter_mut() {
            let (entry_in, entry_out) = norm_split(entry.start_time, entry.end_time)?;
            entry.hours_in_norm = entry_in;
            entry.hours_outside_norm = entry_out;
            in_norm += entry_in;
            outside += entry_out;
        }
        record.hours_in_norm = in_norm;
        record.hours_outside_norm = outside;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn norm_split_inside_window() {
        let (in_norm, outside) = norm_split(time!(8:00), time!(16:00)).unwrap();
        assert_eq!(in_norm, 8.0);
        assert_eq!(outside, 0.0);
    }

    #[test]
    fn norm_split_spanning_both_edges() {
        let (in_norm, outside) = norm_split(time!(6:00), time!(18:30)).unwrap();
        assert_eq!(in_norm, 10.0);
        assert_eq!(outside, 2.5);
    }

    #[test]
    fn norm_split_fully_outside() {
        let (in_norm, outside) = norm_split(time!(18:00), time!(21:00)).unwrap();
        assert_eq!(in_norm, 0.0);
        assert_eq!(outside, 3.0);
    }

    #[test]
    fn day_night_split_evening() {
        let (day, night) = day_night_split(time!(16:00), time!(20:00)).unwrap();
        assert_eq!(day, 2.0);
        assert_eq!(night, 2.0);
    }

    #[test]
    fn noon_split_spanning() {
        let (before, after) = noon_split(time!(10:00), time!(14:00)).unwrap();
        assert_eq!(before, 2.0);
        assert_eq!(after, 2.0);
    }

    #[test]
    fn boundary_conservation_in_minutes() {
        // before + after always equals the interval length.
        let cases = [
            (time!(5:15), time!(11:45)),
            (time!(11:59), time!(12:01)),
            (time!(12:00), time!(13:00)),
        ];
        for (start, end) in cases {
            let (before, after) = noon_split(start, end).unwrap();
            let total = (minute_of_day(end) - minute_of_day(start)) as f32 / 60.0;
            assert!((before + after - total).abs() < 1e-6);
        }
    }

    #[test]
    fn rejects_reversed_interval() {
        assert!(norm_split(time!(16:00), time!(15:00)).is_err());
        assert!(noon_split(time!(12:00), time!(12:00)).is_err());
    }
}
