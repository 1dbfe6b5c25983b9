//! Full categorization pipeline: splitting, classification, overtime
//! engine, date filling. Always re-run as a whole; hourly tiering makes
//! partial updates order-dependent across a week.

use std::collections::HashMap;

use service::processing::{DailyOutput, ProcessedData, ProcessingService};
use service::records::{AbsentType, DailyRecord, EmployeeType};
use service::ServiceError;
use time::Date;
use tracing::info;

use crate::{absence, call_out, date_fill, overtime, time_split};

pub struct ProcessingServiceImpl;

impl ProcessingService for ProcessingServiceImpl {
    fn process(
        &self,
        records: &mut Vec<DailyRecord>,
        _employee_type: EmployeeType,
    ) -> Result<ProcessedData, ServiceError> {
        time_split::annotate_records(records)?;
        call_out::mark_call_out_eligibility(records);
        absence::mark_absences(records);
        absence::apply_credited_hours(records);

        let (summaries, outputs) = overtime::process_all_records(records)?;
        let outputs = date_fill::fill_missing_dates(outputs)?;
        let call_out_days = call_out::call_out_days(records);

        info!(
            records = records.len(),
            outputs = outputs.len(),
            weeks = summaries.len(),
            "processed record stream"
        );

        Ok(ProcessedData {
            outputs,
            summaries,
            call_out_days,
        })
    }

    fn apply_call_out_selections(
        &self,
        outputs: &mut [DailyOutput],
        selections: &HashMap<Date, bool>,
    ) {
        call_out::apply_call_out_selections(outputs, selections);
    }

    fn apply_absence_selections(
        &self,
        records: &mut Vec<DailyRecord>,
        selections: &HashMap<Date, AbsentType>,
    ) -> Result<(), ServiceError> {
        let worker_name = records
            .first()
            .map(|record| record.worker_name.clone())
            .ok_or_else(|| ServiceError::invalid_input("no records in session"))?;

        for (&date, &absent_type) in selections {
            if let Some(record) = records.iter_mut().find(|record| record.date == date) {
                // Only days without worked entries can be marked absent.
                if record.entries.is_empty() {
                    record.absent_type = absent_type;
                }
            } else {
                let mut record = DailyRecord::new(worker_name.clone(), date, vec![]);
                record.absent_type = absent_type;
                records.push(record);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use service::records::TimeEntry;
    use time::macros::{date, time};

    fn worked(date: Date) -> DailyRecord {
        let entry = TimeEntry::new("Arbejdskort Sag Nr. 33511", None, time!(8:00), time!(16:00), 8.0);
        DailyRecord::new("Jens Hansen", date, vec![entry])
    }

    #[test]
    fn pipeline_is_deterministic() {
        let make_records = || {
            vec![
                worked(date!(2026 - 01 - 12)),
                worked(date!(2026 - 01 - 13)),
                worked(date!(2026 - 01 - 15)),
            ]
        };
        let service = ProcessingServiceImpl;

        let mut first_records = make_records();
        let first = service
            .process(&mut first_records, EmployeeType::Svend)
            .unwrap();
        let mut second_records = make_records();
        let second = service
            .process(&mut second_records, EmployeeType::Svend)
            .unwrap();

        assert_eq!(first, second);
        // Wednesday was backfilled.
        assert_eq!(first.outputs.len(), 4);
    }

    #[test]
    fn reprocessing_annotated_records_is_stable() {
        let mut records = vec![worked(date!(2026 - 01 - 12))];
        let service = ProcessingServiceImpl;
        let first = service.process(&mut records, EmployeeType::Svend).unwrap();
        let second = service.process(&mut records, EmployeeType::Svend).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn absence_selection_creates_missing_day() {
        let mut records = vec![worked(date!(2026 - 01 - 12))];
        let service = ProcessingServiceImpl;
        let selections: HashMap<Date, AbsentType> =
            [(date!(2026 - 01 - 13), AbsentType::Vacation)].into();
        service
            .apply_absence_selections(&mut records, &selections)
            .unwrap();

        assert_eq!(records.len(), 2);
        let added = records
            .iter()
            .find(|record| record.date == date!(2026 - 01 - 13))
            .unwrap();
        assert_eq!(added.absent_type, AbsentType::Vacation);
        assert!(added.entries.is_empty());

        // The vacation day credits hours once the pipeline re-runs.
        let data = service.process(&mut records, EmployeeType::Svend).unwrap();
        assert_eq!(data.summaries[0].total_hours, 15.4);
    }

    #[test]
    fn absence_selection_never_overwrites_worked_days() {
        let mut records = vec![worked(date!(2026 - 01 - 12))];
        let service = ProcessingServiceImpl;
        let selections: HashMap<Date, AbsentType> =
            [(date!(2026 - 01 - 12), AbsentType::Sick)].into();
        service
            .apply_absence_selections(&mut records, &selections)
            .unwrap();
        assert_eq!(records[0].absent_type, AbsentType::None);
    }
}
