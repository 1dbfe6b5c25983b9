//! Absence classification and hour crediting.
//!
//! Activity texts are matched case-insensitively against three disjoint
//! Danish keyword sets; the first match wins in the order
//! Vacation -> Sick -> Holiday. "fridag" is not an absence: it marks a
//! worked day off, which the overtime engine pays from its own buckets.

use service::records::{AbsentType, DailyRecord};

use crate::overtime::WEEKLY_NORM_HOURS;

const VACATION_KEYWORDS: [&str; 3] = ["ferie", "vacation", "afspadsering"];

const SICK_KEYWORDS: [&str; 4] = ["syg", "sygdom", "sick", "barns sygedag"];

const HOLIDAY_KEYWORDS: [&str; 9] = [
    "helligdag",
    "holiday",
    "juledag",
    "nytårsdag",
    "påske",
    "pinse",
    "store bededag",
    "kr. himmelfartsdag",
    "grundlovsdag",
];

const DAY_OFF_MARKER: &str = "fridag";

/// Hours credited for a full absent weekday: the weekly norm spread over
/// five workdays.
pub const DAILY_CREDIT_HOURS: f32 = WEEKLY_NORM_HOURS / 5.0;

pub fn detect_absence(record: &DailyRecord) -> AbsentType {
    for entry in &record.entries {
        let activity = entry.activity.to_lowercase();
        if VACATION_KEYWORDS.iter().any(|kw| activity.contains(kw)) {
            return AbsentType::Vacation;
        }
        if SICK_KEYWORDS.iter().any(|kw| activity.contains(kw)) {
            return AbsentType::Sick;
        }
        if HOLIDAY_KEYWORDS.iter().any(|kw| activity.contains(kw)) {
            return AbsentType::PublicHoliday;
        }
    }
    AbsentType::None
}

fn detect_day_off(record: &DailyRecord) -> bool {
    record
        .entries
        .iter()
        .any(|entry| entry.activity.to_lowercase().contains(DAY_OFF_MARKER))
}

/// Classify all records. Idempotent: a record whose absent_type was already
/// set (by detection or by the user) keeps it.
pub fn mark_absences(records: &mut [DailyRecord]) {
    for record in records.iter_mut() {
        if record.absent_type == AbsentType::None {
            record.absent_type = detect_absence(record);
        }
        record.is_day_off = record.is_day_off || detect_day_off(record);
    }
}

/// Credit absent days that carry no worked entries. The credit represents a
/// share of the weekly norm, which only spans Monday to Friday, so weekend
/// absences credit nothing. Recomputed from scratch on every run so the
/// pipeline stays idempotent.
pub fn apply_credited_hours(records: &mut [DailyRecord]) {
    for record in records.iter_mut() {
        record.credited_hours =
            if record.is_credited_absence() && !record.day_kind.is_weekend() {
                DAILY_CREDIT_HOURS
            } else {
                0.0
            };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use service::records::TimeEntry;
    use time::macros::{date, time};

    fn record_with_activity(activity: &str) -> DailyRecord {
        let entry = TimeEntry::new(activity, None, time!(8:00), time!(16:00), 8.0);
        DailyRecord::new("Jens Hansen", date!(2026 - 01 - 12), vec![entry])
    }

    #[test]
    fn detects_vacation_before_sick() {
        let record = record_with_activity("Ferie og sygdom");
        assert_eq!(detect_absence(&record), AbsentType::Vacation);
    }

    #[test]
    fn detects_sick_case_insensitively() {
        let record = record_with_activity("Barns Sygedag");
        assert_eq!(detect_absence(&record), AbsentType::Sick);
    }

    #[test]
    fn detects_public_holiday() {
        let record = record_with_activity("Store Bededag");
        assert_eq!(detect_absence(&record), AbsentType::PublicHoliday);
    }

    #[test]
    fn fridag_flags_day_off_not_absence() {
        let mut records = vec![record_with_activity("Arbejde på fridag")];
        mark_absences(&mut records);
        assert!(records[0].is_day_off);
        assert_eq!(records[0].absent_type, AbsentType::None);
    }

    #[test]
    fn marking_is_idempotent_for_user_set_values() {
        let mut record = DailyRecord::new("Jens Hansen", date!(2026 - 01 - 12), vec![]);
        record.absent_type = AbsentType::Kursus;
        let mut records = vec![record];
        mark_absences(&mut records);
        assert_eq!(records[0].absent_type, AbsentType::Kursus);
    }

    #[test]
    fn credits_only_entryless_absences() {
        let mut absent = DailyRecord::new("Jens Hansen", date!(2026 - 01 - 12), vec![]);
        absent.absent_type = AbsentType::Vacation;
        let worked = record_with_activity("Arbejdskort");
        let mut records = vec![absent, worked];
        apply_credited_hours(&mut records);
        assert!((records[0].credited_hours - 7.4).abs() < 1e-6);
        assert_eq!(records[1].credited_hours, 0.0);

        // Re-running does not stack the credit.
        apply_credited_hours(&mut records);
        assert!((records[0].credited_hours - 7.4).abs() < 1e-6);
    }

    #[test]
    fn weekend_absences_credit_nothing() {
        let mut sunday = DailyRecord::new("Jens Hansen", date!(2026 - 01 - 18), vec![]);
        sunday.absent_type = AbsentType::Vacation;
        let mut records = vec![sunday];
        apply_credited_hours(&mut records);
        assert_eq!(records[0].credited_hours, 0.0);
    }
}
