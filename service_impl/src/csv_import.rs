//! FTZ vendor CSV parsing.
//!
//! The export is semicolon-delimited but not rectangular: line 1 is the
//! report title, line 2 the worker name, and the rest is a sequence of day
//! blocks ("Mandag 12-01-2026"), column headers, entry rows and total rows.
//! Durations come as "X Timer Y Minutter"; activities carry either a work
//! card case number or an "Aktivitet:" label.

use std::borrow::Cow;
use std::sync::Arc;

use regex::Regex;
use service::csv_import::CsvImportService;
use service::records::{DailyRecord, TimeEntry};
use service::ServiceError;
use time::macros::format_description;
use time::{Date, Month, Time};
use tracing::warn;

const DANISH_DAYS: [&str; 7] = [
    "mandag", "tirsdag", "onsdag", "torsdag", "fredag", "lørdag", "søndag",
];

pub struct CsvImportServiceImpl {
    duration_re: Regex,
    case_re: Regex,
    activity_re: Regex,
    date_re: Regex,
}

impl Default for CsvImportServiceImpl {
    fn default() -> Self {
        Self::new()
    }
}

impl CsvImportServiceImpl {
    pub fn new() -> Self {
        Self {
            duration_re: Regex::new(r"(?i)(\d+)\s*Timer\s*(\d+)\s*Minutter").expect("valid regex"),
            case_re: Regex::new(r"(?i)Arbejdskort\s+Sag\s+Nr\.\s*(\d+)").expect("valid regex"),
            activity_re: Regex::new(r"(?i)Aktivitet:\s*(.+)").expect("valid regex"),
            date_re: Regex::new(r"(\d{2})-(\d{2})-(\d{4})").expect("valid regex"),
        }
    }

    /// Danish duration phrase to decimal hours; zero when unparseable.
    fn parse_duration(&self, value: &str) -> f32 {
        self.duration_re
            .captures(value)
            .and_then(|caps| {
                let hours: f32 = caps.get(1)?.as_str().parse().ok()?;
                let minutes: f32 = caps.get(2)?.as_str().parse().ok()?;
                Some(hours + minutes / 60.0)
            })
            .unwrap_or(0.0)
    }

    fn parse_day_header(&self, line: &str) -> Option<Date> {
        let caps = self.date_re.captures(line)?;
        let day: u8 = caps.get(1)?.as_str().parse().ok()?;
        let month: u8 = caps.get(2)?.as_str().parse().ok()?;
        let year: i32 = caps.get(3)?.as_str().parse().ok()?;
        let month = Month::try_from(month).ok()?;
        Date::from_calendar_date(year, month, day).ok()
    }

    /// Activity name plus the extracted case number, when present.
    fn split_activity(&self, raw: &str) -> (Arc<str>, Option<Arc<str>>) {
        if let Some(caps) = self.case_re.captures(raw) {
            let number = caps.get(1).map(|m| Arc::from(m.as_str()));
            return ("Arbejdskort".into(), number);
        }
        if let Some(caps) = self.activity_re.captures(raw) {
            if let Some(name) = caps.get(1) {
                return (name.as_str().trim().into(), None);
            }
        }
        (raw.into(), None)
    }
}

fn decode(content: &[u8]) -> Cow<'_, str> {
    if let Ok(utf8) = std::str::from_utf8(content) {
        return Cow::Borrowed(utf8);
    }
    let (decoded, _, had_errors) = encoding_rs::WINDOWS_1252.decode(content);
    if !had_errors {
        return decoded;
    }
    Cow::Owned(encoding_rs::mem::decode_latin1(content).into_owned())
}

fn is_day_header(line: &str) -> bool {
    let lower = line.trim().to_lowercase();
    DANISH_DAYS.iter().any(|day| lower.starts_with(day))
}

fn is_column_header(line: &str) -> bool {
    let lower = line.to_lowercase();
    lower.contains("aktivitet:") && lower.contains("start tid:")
}

fn is_total_row(line: &str) -> bool {
    let lower = line.to_lowercase();
    lower.contains("total tid for dagen:") || lower.contains("total tid i alt:")
}

fn is_footer(line: &str) -> bool {
    let lower = line.to_lowercase();
    lower.contains("fordelt p") || line.trim().ends_with("1/1")
}

fn parse_entry_time(value: &str) -> Option<Time> {
    let format = format_description!("[hour]:[minute]");
    Time::parse(value.trim(), &format).ok()
}

impl CsvImportService for CsvImportServiceImpl {
    fn parse(&self, content: &[u8]) -> Result<Vec<DailyRecord>, ServiceError> {
        let content = decode(content);
        let lines: Vec<&str> = content.lines().collect();
        if lines.len() < 3 {
            return Err(ServiceError::invalid_input(
                "CSV file too short to contain registrations",
            ));
        }

        // Line 1 is the "Tidsregistrering" title; line 2 holds the worker.
        let worker_name: Arc<str> = lines[1]
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .into();
        if worker_name.is_empty() {
            return Err(ServiceError::invalid_input("missing worker name in CSV"));
        }

        let mut records = Vec::new();
        let mut current_date: Option<Date> = None;
        let mut current_entries: Vec<TimeEntry> = Vec::new();

        let close_day =
            |date: Option<Date>, entries: &mut Vec<TimeEntry>, records: &mut Vec<DailyRecord>| {
                if let Some(date) = date {
                    if !entries.is_empty() {
                        records.push(DailyRecord::new(
                            worker_name.clone(),
                            date,
                            std::mem::take(entries),
                        ));
                    }
                }
                entries.clear();
            };

        for line in &lines[2..] {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.chars().all(|c| c == ';') {
                continue;
            }

            if is_day_header(line) {
                close_day(current_date, &mut current_entries, &mut records);
                current_date = self.parse_day_header(line);
                if current_date.is_none() {
                    warn!(header = %trimmed, "day header without a parseable date");
                }
                continue;
            }

            if is_column_header(line) || is_total_row(line) || is_footer(line) {
                continue;
            }

            let fields: Vec<&str> = line.split(';').collect();
            if fields.len() < 5 || fields[0].trim().is_empty() {
                continue;
            }

            let start_time = parse_entry_time(fields[1]);
            let end_time = parse_entry_time(fields[3]);
            let total_hours = self.parse_duration(fields[4]);

            if let (Some(start), Some(end)) = (start_time, end_time) {
                if total_hours > 0.0 {
                    let (activity, case_number) = self.split_activity(fields[0].trim());
                    current_entries.push(TimeEntry::new(
                        activity,
                        case_number,
                        start,
                        end,
                        total_hours,
                    ));
                }
            }
        }
        close_day(current_date, &mut current_entries, &mut records);

        Ok(records)
    }
}
