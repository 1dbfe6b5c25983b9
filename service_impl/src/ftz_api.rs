//! FTZ REST ingest.
//!
//! Registrations are fetched page by page for one employee and date range.
//! The range is expressed in Copenhagen local time and converted to UTC
//! boundaries for the query; the returned UTC timestamps are converted back
//! and grouped by local date before entering the pipeline.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use service::ftz_api::{FtzApiService, FtzEmployee};
use service::records::{DailyRecord, TimeEntry};
use service::ServiceError;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset};
use time_tz::{timezones, OffsetDateTimeExt, PrimitiveDateTimeExt};
use tracing::{debug, info};
use url::Url;

use crate::config::FtzConfig;
use crate::ftz_auth::{transport_error, upstream_error, FtzAuthClient};

const PAGE_SIZE: usize = 100;

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FtzRegistration {
    pub start_time_utc: String,
    pub end_time_utc: String,
    #[serde(default)]
    pub case_no: i64,
    #[serde(default)]
    pub elapsed_hours: f32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegistrationPage {
    #[serde(default)]
    results: Vec<FtzRegistration>,
    #[serde(default)]
    total_count: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EmployeeJson {
    #[serde(default)]
    employee_id: i64,
    #[serde(default)]
    firstname: String,
    #[serde(default)]
    lastname: String,
}

#[derive(Debug, Deserialize)]
struct EmployeePage {
    #[serde(default)]
    results: Vec<EmployeeJson>,
}

pub struct FtzApiServiceImpl {
    config: Arc<FtzConfig>,
    auth: Arc<FtzAuthClient>,
    http: reqwest::Client,
}

impl FtzApiServiceImpl {
    pub fn new(config: Arc<FtzConfig>, auth: Arc<FtzAuthClient>) -> Self {
        Self {
            config,
            auth,
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .expect("failed to build HTTP client"),
        }
    }

    async fn authorized_get(&self, url: Url) -> Result<reqwest::Response, ServiceError> {
        let token = self.auth.get_token().await?;
        let mut request = self.http.get(url).bearer_auth(token.as_ref());
        if let Some(key) = self.auth.subscription_key() {
            request = request.header("Ocp-Apim-Subscription-Key", key.as_ref());
        }
        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(upstream_error(status.as_u16(), &body));
        }
        Ok(response)
    }
}

/// Copenhagen-local `[from 00:00, to 23:59:59]` as UTC instants.
fn utc_range(from: Date, to: Date) -> Result<(OffsetDateTime, OffsetDateTime), ServiceError> {
    let tz = timezones::db::europe::COPENHAGEN;
    let start = PrimitiveDateTime::new(from, Time::MIDNIGHT)
        .assume_timezone(tz)
        .take_first()
        .ok_or_else(|| ServiceError::invalid_input("start date is invalid in Europe/Copenhagen"))?
        .to_offset(UtcOffset::UTC);
    let end = PrimitiveDateTime::new(to, time::macros::time!(23:59:59))
        .assume_timezone(tz)
        .take_first()
        .ok_or_else(|| ServiceError::invalid_input("end date is invalid in Europe/Copenhagen"))?
        .to_offset(UtcOffset::UTC);
    Ok((start, end))
}

fn format_utc(value: OffsetDateTime) -> Result<String, ServiceError> {
    let format = format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]Z");
    value
        .format(&format)
        .map_err(|err| ServiceError::DateError(err.into()))
}

/// Group raw registrations by Copenhagen local date and build daily records.
pub fn registrations_to_records(
    registrations: &[FtzRegistration],
    employee_name: &str,
) -> Result<Vec<DailyRecord>, ServiceError> {
    let tz = timezones::db::europe::COPENHAGEN;
    let mut by_date: BTreeMap<Date, Vec<TimeEntry>> = BTreeMap::new();

    for registration in registrations {
        let start_utc = OffsetDateTime::parse(&registration.start_time_utc, &Rfc3339)
            .map_err(|err| {
                ServiceError::invalid_input(format!("unparseable startTimeUtc: {err}"))
            })?;
        let end_utc = OffsetDateTime::parse(&registration.end_time_utc, &Rfc3339).map_err(
            |err| ServiceError::invalid_input(format!("unparseable endTimeUtc: {err}")),
        )?;

        let start_local = start_utc.to_timezone(tz);
        let end_local = end_utc.to_timezone(tz);

        let (activity, case_number): (Arc<str>, Option<Arc<str>>) = if registration.case_no > 0 {
            (
                format!("Sag {}", registration.case_no).into(),
                Some(registration.case_no.to_string().into()),
            )
        } else {
            ("Diverse".into(), None)
        };

        by_date
            .entry(start_local.date())
            .or_default()
            .push(TimeEntry::new(
                activity,
                case_number,
                Time::from_hms(start_local.hour(), start_local.minute(), 0)?,
                Time::from_hms(end_local.hour(), end_local.minute(), 0)?,
                registration.elapsed_hours,
            ));
    }

    Ok(by_date
        .into_iter()
        .map(|(date, entries)| DailyRecord::new(employee_name, date, entries))
        .collect())
}

#[async_trait]
impl FtzApiService for FtzApiServiceImpl {
    async fn fetch_employees(&self) -> Result<Arc<[FtzEmployee]>, ServiceError> {
        let url = Url::parse_with_params(
            &format!("{}/Employee/search", self.config.core_api_url),
            [("ShowDeleted", "false")],
        )
        .map_err(|err| ServiceError::invalid_input(format!("invalid CORE_API_URL: {err}")))?;

        let page: EmployeePage = self
            .authorized_get(url)
            .await?
            .json()
            .await
            .map_err(transport_error)?;

        Ok(page
            .results
            .into_iter()
            .map(|employee| FtzEmployee {
                employee_id: employee.employee_id,
                firstname: employee.firstname.trim().into(),
                lastname: employee.lastname.trim().into(),
            })
            .collect())
    }

    async fn fetch_daily_records(
        &self,
        employee_id: i64,
        employee_name: &str,
        from: Date,
        to: Date,
    ) -> Result<Vec<DailyRecord>, ServiceError> {
        if self.config.time_api_url.is_empty() {
            return Err(ServiceError::invalid_input("TIME_API_URL not configured"));
        }
        let (start_utc, end_utc) = utc_range(from, to)?;
        info!(
            employee_id,
            %from,
            %to,
            "fetching FTZ time registrations"
        );

        let mut registrations: Vec<FtzRegistration> = Vec::new();
        let mut page_number = 1usize;
        loop {
            let url = Url::parse_with_params(
                &format!("{}/timeRegistration/search", self.config.time_api_url),
                [
                    ("EmployeeIds", employee_id.to_string()),
                    ("SortOrder", "Descending".to_string()),
                    ("ShowOnlyCompleted", "true".to_string()),
                    ("StartTimeUtc", format_utc(start_utc)?),
                    ("EndTimeUtc", format_utc(end_utc)?),
                    ("PageNumber", page_number.to_string()),
                    ("PageSize", PAGE_SIZE.to_string()),
                ],
            )
            .map_err(|err| ServiceError::invalid_input(format!("invalid TIME_API_URL: {err}")))?;

            let page: RegistrationPage = self
                .authorized_get(url)
                .await?
                .json()
                .await
                .map_err(transport_error)?;

            let fetched_this_page = page.results.len();
            registrations.extend(page.results);
            debug!(
                page_number,
                fetched = registrations.len(),
                total = page.total_count,
                "fetched registration page"
            );

            if registrations.len() >= page.total_count || fetched_this_page < PAGE_SIZE {
                break;
            }
            page_number += 1;
        }

        registrations_to_records(&registrations, employee_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, time};

    fn registration(start: &str, end: &str, case_no: i64, hours: f32) -> FtzRegistration {
        FtzRegistration {
            start_time_utc: start.to_string(),
            end_time_utc: end.to_string(),
            case_no,
            elapsed_hours: hours,
        }
    }

    #[test]
    fn groups_by_copenhagen_local_date() {
        // 23:30 UTC on the 12th is 00:30 local on the 13th (CET, UTC+1).
        let registrations = vec![
            registration("2026-01-12T07:00:00Z", "2026-01-12T11:00:00Z", 33511, 4.0),
            registration("2026-01-12T23:30:00Z", "2026-01-13T01:00:00Z", 0, 1.5),
        ];
        let records = registrations_to_records(&registrations, "Jens Hansen").unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].date, date!(2026 - 01 - 12));
        // Local wall time is UTC+1 in January.
        assert_eq!(records[0].entries[0].start_time, time!(8:00));
        assert_eq!(records[0].entries[0].end_time, time!(12:00));
        assert_eq!(records[0].entries[0].activity.as_ref(), "Sag 33511");
        assert_eq!(records[0].entries[0].case_number.as_deref(), Some("33511"));

        assert_eq!(records[1].date, date!(2026 - 01 - 13));
        assert_eq!(records[1].entries[0].activity.as_ref(), "Diverse");
        assert_eq!(records[1].entries[0].start_time, time!(0:30));
    }

    #[test]
    fn summer_time_offset_is_applied() {
        // July is CEST, UTC+2.
        let registrations = vec![registration(
            "2026-07-06T06:00:00Z",
            "2026-07-06T14:00:00Z",
            1,
            8.0,
        )];
        let records = registrations_to_records(&registrations, "Jens Hansen").unwrap();
        assert_eq!(records[0].entries[0].start_time, time!(8:00));
        assert_eq!(records[0].entries[0].end_time, time!(16:00));
    }

    #[test]
    fn rejects_malformed_timestamps() {
        let registrations = vec![registration("yesterday", "2026-01-12T11:00:00Z", 0, 1.0)];
        assert!(registrations_to_records(&registrations, "Jens Hansen").is_err());
    }

    #[test]
    fn utc_range_covers_the_local_day() {
        let (start, end) = utc_range(date!(2026 - 01 - 12), date!(2026 - 01 - 12)).unwrap();
        // Copenhagen midnight in January is 23:00 UTC the previous day.
        assert_eq!(format_utc(start).unwrap(), "2026-01-11T23:00:00Z");
        assert_eq!(format_utc(end).unwrap(), "2026-01-12T22:59:59Z");
    }
}
