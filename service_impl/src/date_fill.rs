//! Backfill of missing dates per worker.
//!
//! Between the first and last observed date of each worker, missing
//! weekdays get a zeroed output row; missing weekend days are only emitted
//! when the worker actually had a registration on that date.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use service::processing::DailyOutput;
use service::ServiceError;
use time::Date;

pub fn fill_missing_dates(outputs: Vec<DailyOutput>) -> Result<Vec<DailyOutput>, ServiceError> {
    if outputs.is_empty() {
        return Ok(outputs);
    }

    let mut by_worker: HashMap<Arc<str>, Vec<DailyOutput>> = HashMap::new();
    for output in outputs {
        by_worker
            .entry(output.worker.clone())
            .or_default()
            .push(output);
    }

    let mut filled = Vec::new();
    for (worker, worker_outputs) in by_worker {
        let weekend_dates: HashSet<Date> = worker_outputs
            .iter()
            .filter(|output| output.day_kind.is_weekend())
            .map(|output| output.date)
            .collect();
        let min_date = worker_outputs
            .iter()
            .map(|output| output.date)
            .min()
            .ok_or(ServiceError::InternalError)?;
        let max_date = worker_outputs
            .iter()
            .map(|output| output.date)
            .max()
            .ok_or(ServiceError::InternalError)?;

        let mut existing: HashMap<Date, DailyOutput> = worker_outputs
            .into_iter()
            .map(|output| (output.date, output))
            .collect();

        let mut date = min_date;
        while date <= max_date {
            if let Some(output) = existing.remove(&date) {
                filled.push(output);
            } else {
                let is_weekend = date.weekday() == time::Weekday::Saturday
                    || date.weekday() == time::Weekday::Sunday;
                if !is_weekend || weekend_dates.contains(&date) {
                    filled.push(DailyOutput::empty(worker.clone(), date));
                }
            }
            let Some(next) = date.next_day() else {
                break;
            };
            date = next;
        }
    }

    filled.sort_by(|a, b| a.worker.cmp(&b.worker).then(a.date.cmp(&b.date)));
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn output(worker: &str, date: Date, hours: f32) -> DailyOutput {
        let mut output = DailyOutput::empty(worker.into(), date);
        output.total_hours = hours;
        output
    }

    #[test]
    fn fills_weekdays_only_unless_weekend_was_worked() {
        // Monday and the following Monday; the Saturday in between had a
        // registration, the Sunday did not.
        let outputs = vec![
            output("Jens Hansen", date!(2026 - 01 - 12), 8.0),
            output("Jens Hansen", date!(2026 - 01 - 17), 4.0),
            output("Jens Hansen", date!(2026 - 01 - 19), 8.0),
        ];
        let filled = fill_missing_dates(outputs).unwrap();

        let dates: Vec<Date> = filled.iter().map(|o| o.date).collect();
        assert_eq!(
            dates,
            vec![
                date!(2026 - 01 - 12),
                date!(2026 - 01 - 13),
                date!(2026 - 01 - 14),
                date!(2026 - 01 - 15),
                date!(2026 - 01 - 16),
                date!(2026 - 01 - 17),
                date!(2026 - 01 - 19),
            ]
        );
        // The backfilled Tuesday is zeroed.
        assert_eq!(filled[1].total_hours, 0.0);
        // The worked Saturday keeps its hours; Sunday was never emitted.
        assert_eq!(filled[5].total_hours, 4.0);
    }

    #[test]
    fn sorts_by_worker_then_date() {
        let outputs = vec![
            output("Niels", date!(2026 - 01 - 13), 8.0),
            output("Anna", date!(2026 - 01 - 14), 8.0),
            output("Anna", date!(2026 - 01 - 12), 8.0),
        ];
        let filled = fill_missing_dates(outputs).unwrap();
        let keys: Vec<(&str, Date)> = filled
            .iter()
            .map(|o| (o.worker.as_ref(), o.date))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("Anna", date!(2026 - 01 - 12)),
                ("Anna", date!(2026 - 01 - 13)),
                ("Anna", date!(2026 - 01 - 14)),
                ("Niels", date!(2026 - 01 - 13)),
            ]
        );
    }

    #[test]
    fn filling_twice_is_idempotent() {
        let outputs = vec![
            output("Jens Hansen", date!(2026 - 01 - 12), 8.0),
            output("Jens Hansen", date!(2026 - 01 - 16), 8.0),
        ];
        let once = fill_missing_dates(outputs).unwrap();
        let twice = fill_missing_dates(once.clone()).unwrap();
        assert_eq!(once, twice);
    }
}
