//! CSV rendering of processed data for human review.
//!
//! Semicolon-delimited with Danish column headers, matching the sheets the
//! workshops already use. The detailed formats price each overtime bucket
//! with the DBR supplement effective on the row's date; this renderer is
//! the only reader of the rate table.

use lontid_utils::format_date_dmy;
use service::csv_export::{CsvExportService, ExportFormat};
use service::processing::{DailyOutput, WeeklySummary};
use service::ServiceError;
use time::macros::date;
use time::Date;

/// Hourly overtime supplements in DKK, one band per effective date.
#[derive(Clone, Copy, Debug)]
pub struct OvertimeRates {
    pub weekday_hour_1_2: f32,
    pub weekday_hour_3_4: f32,
    pub weekday_hour_5_plus: f32,
    pub weekday_scheduled_day: f32,
    pub weekday_scheduled_night: f32,
    pub dayoff_day: f32,
    pub dayoff_night: f32,
    pub saturday_day: f32,
    pub saturday_night: f32,
    pub sunday_before_noon: f32,
    pub sunday_after_noon: f32,
}

const RATES_2025: OvertimeRates = OvertimeRates {
    weekday_hour_1_2: 44.85,
    weekday_hour_3_4: 71.75,
    weekday_hour_5_plus: 134.50,
    weekday_scheduled_day: 44.85,
    weekday_scheduled_night: 53.80,
    dayoff_day: 89.70,
    dayoff_night: 107.60,
    saturday_day: 89.70,
    saturday_night: 107.60,
    sunday_before_noon: 107.60,
    sunday_after_noon: 134.50,
};

const RATES_2026: OvertimeRates = OvertimeRates {
    weekday_hour_1_2: 46.40,
    weekday_hour_3_4: 74.25,
    weekday_hour_5_plus: 139.20,
    weekday_scheduled_day: 46.40,
    weekday_scheduled_night: 55.70,
    dayoff_day: 92.85,
    dayoff_night: 111.35,
    saturday_day: 92.85,
    saturday_night: 111.35,
    sunday_before_noon: 111.35,
    sunday_after_noon: 139.20,
};

const RATES_2027: OvertimeRates = OvertimeRates {
    weekday_hour_1_2: 48.05,
    weekday_hour_3_4: 76.85,
    weekday_hour_5_plus: 144.05,
    weekday_scheduled_day: 48.05,
    weekday_scheduled_night: 57.65,
    dayoff_day: 96.10,
    dayoff_night: 115.25,
    saturday_day: 96.10,
    saturday_night: 115.25,
    sunday_before_noon: 115.25,
    sunday_after_noon: 144.05,
};

/// Supplement band effective on the given date.
pub fn rates_for(date: Date) -> &'static OvertimeRates {
    if date >= date!(2027 - 03 - 01) {
        &RATES_2027
    } else if date >= date!(2026 - 03 - 01) {
        &RATES_2026
    } else {
        &RATES_2025
    }
}

pub struct CsvExportServiceImpl;

fn hours(value: f32) -> String {
    format!("{value:.2}")
}

fn writer() -> csv::Writer<Vec<u8>> {
    csv::WriterBuilder::new().delimiter(b';').from_writer(Vec::new())
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<String, ServiceError> {
    let bytes = writer
        .into_inner()
        .map_err(|err| ServiceError::invalid_input(format!("CSV write failed: {err}")))?;
    String::from_utf8(bytes).map_err(|_| ServiceError::InternalError)
}

fn write_row(
    writer: &mut csv::Writer<Vec<u8>>,
    row: &[String],
) -> Result<(), ServiceError> {
    writer
        .write_record(row)
        .map_err(|err| ServiceError::invalid_input(format!("CSV write failed: {err}")))
}

fn daily_csv(outputs: &[DailyOutput]) -> Result<String, ServiceError> {
    let mut writer = writer();
    write_row(
        &mut writer,
        &[
            "Medarbejder".into(),
            "Dato".into(),
            "Dag".into(),
            "Dagtype".into(),
            "TotalTimer".into(),
            "TimerNormtid".into(),
            "TimerUdenforNorm".into(),
            "UgeNummer".into(),
            "UgeTotal".into(),
            "NormaleTimer".into(),
            "Overtid1".into(),
            "Overtid2".into(),
            "Overtid3".into(),
            "CallOutBetaling".into(),
        ],
    )?;
    for output in outputs {
        write_row(
            &mut writer,
            &[
                output.worker.to_string(),
                format_date_dmy(output.date)?,
                output.day.to_string(),
                output.day_kind.to_string(),
                hours(output.total_hours),
                hours(output.hours_norm_time),
                hours(output.hours_outside_norm),
                output.week_number.to_string(),
                hours(output.weekly_total),
                hours(output.normal_hours),
                hours(output.overtime_1),
                hours(output.overtime_2),
                hours(output.overtime_3),
                hours(output.call_out_payment),
            ],
        )?;
    }
    finish(writer)
}

fn weekly_csv(summaries: &[WeeklySummary]) -> Result<String, ServiceError> {
    let mut writer = writer();
    write_row(
        &mut writer,
        &[
            "Medarbejder".into(),
            "År".into(),
            "UgeNummer".into(),
            "TotalTimer".into(),
            "NormaleTimer".into(),
            "Overtid1".into(),
            "Overtid2".into(),
            "Overtid3".into(),
        ],
    )?;
    for summary in summaries {
        write_row(
            &mut writer,
            &[
                summary.worker_name.to_string(),
                summary.year.to_string(),
                summary.week_number.to_string(),
                hours(summary.total_hours),
                hours(summary.normal_hours),
                hours(summary.overtime_1),
                hours(summary.overtime_2),
                hours(summary.overtime_3),
            ],
        )?;
    }
    finish(writer)
}

fn detailed_daily_csv(outputs: &[DailyOutput]) -> Result<String, ServiceError> {
    let mut writer = writer();
    let mut header: Vec<String> = vec![
        "Medarbejder".into(),
        "Dato".into(),
        "Dag".into(),
        "Dagtype".into(),
        "TotalTimer".into(),
        "NormaleTimer".into(),
    ];
    for bucket in [
        "OT_Hvd_1-2",
        "OT_Hvd_3-4",
        "OT_Hvd_5+",
        "OT_Hvd_Dag",
        "OT_Hvd_Nat",
        "OT_Fridag_Dag",
        "OT_Fridag_Nat",
        "OT_Lør_Dag",
        "OT_Lør_Nat",
        "OT_Søn_Før12",
        "OT_Søn_Efter12",
    ] {
        header.push(format!("{bucket}_Timer"));
        header.push(format!("{bucket}_Rate"));
        header.push(format!("{bucket}_Betaling"));
    }
    header.push("OT_Total_Timer".into());
    header.push("OT_Total_Betaling".into());
    header.push("CallOutBetaling".into());
    header.push("Total_Betaling".into());
    write_row(&mut writer, &header)?;

    for output in outputs {
        let rates = rates_for(output.date);
        let breakdown = &output.breakdown;
        let priced: [(f32, f32); 11] = [
            (breakdown.hour_1_2, rates.weekday_hour_1_2),
            (breakdown.hour_3_4, rates.weekday_hour_3_4),
            (breakdown.hour_5_plus, rates.weekday_hour_5_plus),
            (breakdown.scheduled_day, rates.weekday_scheduled_day),
            (breakdown.scheduled_night, rates.weekday_scheduled_night),
            (breakdown.dayoff_day, rates.dayoff_day),
            (breakdown.dayoff_night, rates.dayoff_night),
            (breakdown.saturday_day, rates.saturday_day),
            (breakdown.saturday_night, rates.saturday_night),
            (breakdown.sunday_before_noon, rates.sunday_before_noon),
            (breakdown.sunday_after_noon, rates.sunday_after_noon),
        ];

        let mut row: Vec<String> = vec![
            output.worker.to_string(),
            format_date_dmy(output.date)?,
            output.day.to_string(),
            output.day_kind.to_string(),
            hours(output.total_hours),
            hours(output.normal_hours),
        ];
        let mut total_payment = 0.0;
        for (bucket_hours, rate) in priced {
            let payment = bucket_hours * rate;
            total_payment += payment;
            row.push(hours(bucket_hours));
            row.push(hours(rate));
            row.push(hours(payment));
        }
        row.push(hours(breakdown.tiered_total()));
        row.push(hours(total_payment));
        row.push(hours(output.call_out_payment));
        row.push(hours(total_payment + output.call_out_payment));
        write_row(&mut writer, &row)?;
    }
    finish(writer)
}

fn detailed_weekly_csv(summaries: &[WeeklySummary]) -> Result<String, ServiceError> {
    let mut writer = writer();
    write_row(
        &mut writer,
        &[
            "Medarbejder".into(),
            "År".into(),
            "UgeNummer".into(),
            "TotalTimer".into(),
            "NormaleTimer".into(),
            "OT_Hvd_1-2_Timer".into(),
            "OT_Hvd_3-4_Timer".into(),
            "OT_Hvd_5+_Timer".into(),
            "OT_Fridag_Timer".into(),
            "OT_Lør_Timer".into(),
            "OT_Søn_Timer".into(),
            "OT_Total_Timer".into(),
        ],
    )?;
    for summary in summaries {
        let breakdown = &summary.breakdown;
        write_row(
            &mut writer,
            &[
                summary.worker_name.to_string(),
                summary.year.to_string(),
                summary.week_number.to_string(),
                hours(summary.total_hours),
                hours(summary.normal_hours),
                hours(breakdown.hour_1_2),
                hours(breakdown.hour_3_4),
                hours(breakdown.hour_5_plus),
                hours(breakdown.dayoff_day + breakdown.dayoff_night),
                hours(breakdown.saturday_day + breakdown.saturday_night),
                hours(breakdown.sunday_before_noon + breakdown.sunday_after_noon),
                hours(breakdown.tiered_total()),
            ],
        )?;
    }
    finish(writer)
}

impl CsvExportService for CsvExportServiceImpl {
    fn render(
        &self,
        format: ExportFormat,
        outputs: &[DailyOutput],
        summaries: &[WeeklySummary],
    ) -> Result<String, ServiceError> {
        match format {
            ExportFormat::Daily => daily_csv(outputs),
            ExportFormat::Detailed => detailed_daily_csv(outputs),
            ExportFormat::Weekly => weekly_csv(summaries),
            ExportFormat::WeeklyDetailed => detailed_weekly_csv(summaries),
            ExportFormat::Combined => {
                let mut combined = daily_csv(outputs)?;
                combined.push_str("\n\nUGENTLIG OPSUMMERING\n");
                combined.push_str(&weekly_csv(summaries)?);
                Ok(combined)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use service::processing::OvertimeBreakdown;

    fn sample_output() -> DailyOutput {
        let mut output = DailyOutput::empty("Jens Hansen".into(), date!(2026 - 01 - 16));
        output.total_hours = 10.0;
        output.normal_hours = 7.0;
        output.weekly_total = 39.0;
        output.breakdown = OvertimeBreakdown {
            hour_1_2: 2.0,
            hour_3_4: 1.0,
            ..OvertimeBreakdown::default()
        };
        output.overtime_1 = 2.0;
        output.overtime_2 = 1.0;
        output
    }

    fn sample_summary() -> WeeklySummary {
        WeeklySummary {
            worker_name: "Jens Hansen".into(),
            year: 2026,
            week_number: 3,
            total_hours: 39.0,
            normal_hours: 37.0,
            breakdown: OvertimeBreakdown {
                hour_1_2: 2.0,
                ..OvertimeBreakdown::default()
            },
            overtime_1: 2.0,
            overtime_2: 0.0,
            overtime_3: 0.0,
        }
    }

    #[test]
    fn daily_csv_has_danish_headers_and_two_decimals() {
        let service = CsvExportServiceImpl;
        let rendered = service
            .render(ExportFormat::Daily, &[sample_output()], &[])
            .unwrap();
        let mut lines = rendered.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Medarbejder;Dato;Dag;Dagtype;TotalTimer;TimerNormtid;TimerUdenforNorm;UgeNummer;UgeTotal;NormaleTimer;Overtid1;Overtid2;Overtid3;CallOutBetaling"
        );
        let row = lines.next().unwrap();
        assert!(row.starts_with("Jens Hansen;16-01-2026;Friday;Weekday;10.00"));
        assert!(row.contains(";2.00;1.00;0.00;0.00"));
    }

    #[test]
    fn detailed_csv_prices_buckets_with_effective_rates() {
        let service = CsvExportServiceImpl;
        let rendered = service
            .render(ExportFormat::Detailed, &[sample_output()], &[])
            .unwrap();
        let row = rendered.lines().nth(1).unwrap();
        // January 2026 is before the 2026-03-01 band: 2025 rates apply.
        assert!(row.contains("2.00;44.85;89.70"));
        // Total payment: 2*44.85 + 1*71.75 = 161.45.
        assert!(row.contains(";161.45;"));
    }

    #[test]
    fn rate_bands_switch_on_effective_dates() {
        assert_eq!(
            rates_for(date!(2026 - 02 - 28)).weekday_hour_1_2,
            RATES_2025.weekday_hour_1_2
        );
        assert_eq!(
            rates_for(date!(2026 - 03 - 01)).weekday_hour_1_2,
            RATES_2026.weekday_hour_1_2
        );
        assert_eq!(
            rates_for(date!(2027 - 03 - 01)).weekday_hour_1_2,
            RATES_2027.weekday_hour_1_2
        );
    }

    #[test]
    fn combined_csv_contains_both_sections() {
        let service = CsvExportServiceImpl;
        let rendered = service
            .render(
                ExportFormat::Combined,
                &[sample_output()],
                &[sample_summary()],
            )
            .unwrap();
        assert!(rendered.contains("UGENTLIG OPSUMMERING"));
        assert!(rendered.contains("Medarbejder;År;UgeNummer"));
    }
}
