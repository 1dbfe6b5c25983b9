//! Transfer objects for the HTTP surface.
//!
//! Field names follow the JSON wire format the frontend already speaks:
//! snake_case keys, dates as DD-MM-YYYY strings, clock times as HH:MM.

use serde::{Deserialize, Serialize};
use service::danlon_api::{CreatedPayPart, DanlonEmployee, PayPartCodeMeta};
use service::danlon_oauth::{Connection, PendingFlow};
use service::ftz_api::FtzEmployee;
use service::mapping::{EmployeeMappingRow, EmployeeMappings, FallbackMapping, PayCodeMapping};
use service::processing::{
    CallOutDay, DailyOutput, OvertimeBreakdown, ProcessedData, WeeklySummary,
};
use service::records::TimeEntry;
use service::sync::{SkippedItem, SyncOutcome};
use time::macros::format_description;
use uuid::Uuid;

fn format_dmy(date: time::Date) -> String {
    lontid_utils::format_date_dmy(date).unwrap_or_default()
}

fn format_hm(value: time::Time) -> String {
    let format = format_description!("[hour]:[minute]");
    value.format(&format).unwrap_or_default()
}

#[derive(Clone, Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct TimeEntryTO {
    pub activity: String,
    pub case_number: Option<String>,
    pub start_time: String,
    pub end_time: String,
    pub total_hours: f32,
    pub hours_in_norm: f32,
    pub hours_outside_norm: f32,
}
impl From<&TimeEntry> for TimeEntryTO {
    fn from(entry: &TimeEntry) -> Self {
        Self {
            activity: entry.activity.to_string(),
            case_number: entry.case_number.as_ref().map(|case| case.to_string()),
            start_time: format_hm(entry.start_time),
            end_time: format_hm(entry.end_time),
            total_hours: entry.total_hours,
            hours_in_norm: entry.hours_in_norm,
            hours_outside_norm: entry.hours_outside_norm,
        }
    }
}

/// The eleven overtime buckets with their historical wire names.
#[derive(Clone, Debug, Default, Serialize, Deserialize, utoipa::ToSchema)]
pub struct OvertimeBreakdownTO {
    pub ot_weekday_hour_1_2: f32,
    pub ot_weekday_hour_3_4: f32,
    pub ot_weekday_hour_5_plus: f32,
    pub ot_weekday_scheduled_day: f32,
    pub ot_weekday_scheduled_night: f32,
    pub ot_dayoff_day: f32,
    pub ot_dayoff_night: f32,
    pub ot_saturday_day: f32,
    pub ot_saturday_night: f32,
    pub ot_sunday_before_noon: f32,
    pub ot_sunday_after_noon: f32,
}
impl From<&OvertimeBreakdown> for OvertimeBreakdownTO {
    fn from(breakdown: &OvertimeBreakdown) -> Self {
        Self {
            ot_weekday_hour_1_2: breakdown.hour_1_2,
            ot_weekday_hour_3_4: breakdown.hour_3_4,
            ot_weekday_hour_5_plus: breakdown.hour_5_plus,
            ot_weekday_scheduled_day: breakdown.scheduled_day,
            ot_weekday_scheduled_night: breakdown.scheduled_night,
            ot_dayoff_day: breakdown.dayoff_day,
            ot_dayoff_night: breakdown.dayoff_night,
            ot_saturday_day: breakdown.saturday_day,
            ot_saturday_night: breakdown.saturday_night,
            ot_sunday_before_noon: breakdown.sunday_before_noon,
            ot_sunday_after_noon: breakdown.sunday_after_noon,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct DailyOutputTO {
    pub worker: String,
    pub date: String,
    pub day: String,
    pub day_type: String,
    pub total_hours: f32,
    pub hours_norm_time: f32,
    pub hours_outside_norm: f32,
    pub week_number: u8,
    pub weekly_total: f32,
    pub normal_hours: f32,
    pub overtime_breakdown: OvertimeBreakdownTO,
    pub overtime_1: f32,
    pub overtime_2: f32,
    pub overtime_3: f32,
    pub has_call_out_qualifying_time: bool,
    pub call_out_payment: f32,
    pub call_out_applied: bool,
    pub entries: Vec<TimeEntryTO>,
}
impl From<&DailyOutput> for DailyOutputTO {
    fn from(output: &DailyOutput) -> Self {
        Self {
            worker: output.worker.to_string(),
            date: format_dmy(output.date),
            day: output.day.to_string(),
            day_type: output.day_kind.to_string(),
            total_hours: output.total_hours,
            hours_norm_time: output.hours_norm_time,
            hours_outside_norm: output.hours_outside_norm,
            week_number: output.week_number,
            weekly_total: output.weekly_total,
            normal_hours: output.normal_hours,
            overtime_breakdown: (&output.breakdown).into(),
            overtime_1: output.overtime_1,
            overtime_2: output.overtime_2,
            overtime_3: output.overtime_3,
            has_call_out_qualifying_time: output.has_call_out_qualifying_time,
            call_out_payment: output.call_out_payment,
            call_out_applied: output.call_out_applied,
            entries: output.entries.iter().map(TimeEntryTO::from).collect(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct WeeklySummaryTO {
    pub worker_name: String,
    pub year: i32,
    pub week_number: u8,
    pub total_hours: f32,
    pub normal_hours: f32,
    pub overtime_breakdown: OvertimeBreakdownTO,
    pub overtime_1: f32,
    pub overtime_2: f32,
    pub overtime_3: f32,
}
impl From<&WeeklySummary> for WeeklySummaryTO {
    fn from(summary: &WeeklySummary) -> Self {
        Self {
            worker_name: summary.worker_name.to_string(),
            year: summary.year,
            week_number: summary.week_number,
            total_hours: summary.total_hours,
            normal_hours: summary.normal_hours,
            overtime_breakdown: (&summary.breakdown).into(),
            overtime_1: summary.overtime_1,
            overtime_2: summary.overtime_2,
            overtime_3: summary.overtime_3,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CallOutDayTO {
    pub date: String,
    pub worker: String,
    pub qualifying_times: Vec<String>,
}
impl From<&CallOutDay> for CallOutDayTO {
    fn from(day: &CallOutDay) -> Self {
        Self {
            date: format_dmy(day.date),
            worker: day.worker.to_string(),
            qualifying_times: day
                .qualifying_times
                .iter()
                .map(|time| time.to_string())
                .collect(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct PreviewResponseTO {
    pub success: bool,
    pub session_id: Uuid,
    pub daily: Vec<DailyOutputTO>,
    pub weekly: Vec<WeeklySummaryTO>,
    pub call_out_eligible_days: Vec<CallOutDayTO>,
    pub total_records: usize,
    pub total_weeks: usize,
}
impl PreviewResponseTO {
    pub fn from_processed(session_id: Uuid, data: &ProcessedData) -> Self {
        Self {
            success: true,
            session_id,
            daily: data.outputs.iter().map(DailyOutputTO::from).collect(),
            weekly: data.summaries.iter().map(WeeklySummaryTO::from).collect(),
            call_out_eligible_days: data
                .call_out_days
                .iter()
                .map(CallOutDayTO::from)
                .collect(),
            total_records: data.outputs.len(),
            total_weeks: data.summaries.len(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct UploadResultTO {
    pub success: bool,
    pub message: String,
    pub output_filename: Option<String>,
    pub records_processed: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct FtzEmployeeTO {
    pub employee_id: i64,
    pub firstname: String,
    pub lastname: String,
    pub full_name: String,
}
impl From<&FtzEmployee> for FtzEmployeeTO {
    fn from(employee: &FtzEmployee) -> Self {
        Self {
            employee_id: employee.employee_id,
            firstname: employee.firstname.to_string(),
            lastname: employee.lastname.to_string(),
            full_name: employee.full_name(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct PendingFlowTO {
    pub pending: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub select_company_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<time::PrimitiveDateTime>,
}
impl From<Option<PendingFlow>> for PendingFlowTO {
    fn from(flow: Option<PendingFlow>) -> Self {
        match flow {
            Some(flow) => Self {
                pending: true,
                session_id: Some(flow.session_id),
                select_company_url: Some(flow.select_company_url.to_string()),
                expires_at: Some(flow.expires_at),
            },
            None => Self {
                pending: false,
                session_id: None,
                select_company_url: None,
                expires_at: None,
            },
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ConnectionStatusTO {
    pub connected: bool,
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<time::PrimitiveDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<time::PrimitiveDateTime>,
}
impl ConnectionStatusTO {
    pub fn from_connection(user_id: &str, connection: Option<Connection>) -> Self {
        match connection {
            Some(connection) => Self {
                connected: true,
                user_id: user_id.to_string(),
                company_id: Some(connection.company_id.to_string()),
                company_name: connection.company_name.map(|name| name.to_string()),
                expires_at: Some(connection.expires_at),
                created_at: Some(connection.created_at),
            },
            None => Self {
                connected: false,
                user_id: user_id.to_string(),
                company_id: None,
                company_name: None,
                expires_at: None,
                created_at: None,
            },
        }
    }
}

/// Manual completion request: either a marketplace code or raw tokens.
#[derive(Clone, Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CompleteRequestTO {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub company_id: Option<String>,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
}

#[derive(Clone, Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CompleteResponseTO {
    pub success: bool,
    pub company_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct PayCodeMappingTO {
    pub normal_code: String,
    pub overtime_code: String,
    pub callout_code: String,
    #[serde(default)]
    pub is_default: bool,
}
impl From<&PayCodeMapping> for PayCodeMappingTO {
    fn from(mapping: &PayCodeMapping) -> Self {
        Self {
            normal_code: mapping.normal_code.to_string(),
            overtime_code: mapping.overtime_code.to_string(),
            callout_code: mapping.callout_code.to_string(),
            is_default: mapping.is_default,
        }
    }
}
impl From<&PayCodeMappingTO> for PayCodeMapping {
    fn from(mapping: &PayCodeMappingTO) -> Self {
        Self {
            normal_code: mapping.normal_code.as_str().into(),
            overtime_code: mapping.overtime_code.as_str().into(),
            callout_code: mapping.callout_code.as_str().into(),
            is_default: false,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct EmployeeMappingRowTO {
    pub ftz_employee_name: String,
    pub danlon_employee_id: String,
    #[serde(default)]
    pub danlon_employee_name: String,
}
impl From<&EmployeeMappingRow> for EmployeeMappingRowTO {
    fn from(row: &EmployeeMappingRow) -> Self {
        Self {
            ftz_employee_name: row.ftz_employee_name.to_string(),
            danlon_employee_id: row.danlon_employee_id.to_string(),
            danlon_employee_name: row.danlon_employee_name.to_string(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct FallbackMappingTO {
    pub danlon_employee_id: String,
    #[serde(default)]
    pub danlon_employee_name: String,
}
impl From<&FallbackMapping> for FallbackMappingTO {
    fn from(fallback: &FallbackMapping) -> Self {
        Self {
            danlon_employee_id: fallback.danlon_employee_id.to_string(),
            danlon_employee_name: fallback.danlon_employee_name.to_string(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct EmployeeMappingsTO {
    pub mappings: Vec<EmployeeMappingRowTO>,
    #[serde(default)]
    pub fallback: Option<FallbackMappingTO>,
}
impl From<&EmployeeMappings> for EmployeeMappingsTO {
    fn from(mappings: &EmployeeMappings) -> Self {
        Self {
            mappings: mappings.rows.iter().map(EmployeeMappingRowTO::from).collect(),
            fallback: mappings.fallback.as_ref().map(FallbackMappingTO::from),
        }
    }
}
impl From<&EmployeeMappingsTO> for EmployeeMappings {
    fn from(mappings: &EmployeeMappingsTO) -> Self {
        Self {
            rows: mappings
                .mappings
                .iter()
                .map(|row| EmployeeMappingRow {
                    ftz_employee_name: row.ftz_employee_name.trim().into(),
                    danlon_employee_id: row.danlon_employee_id.trim().into(),
                    danlon_employee_name: row.danlon_employee_name.trim().into(),
                })
                .collect(),
            fallback: mappings.fallback.as_ref().map(|fallback| FallbackMapping {
                danlon_employee_id: fallback.danlon_employee_id.trim().into(),
                danlon_employee_name: fallback.danlon_employee_name.trim().into(),
            }),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct PayPartCodeMetaTO {
    pub code: String,
    pub description: String,
    #[serde(rename = "unitsAllowed")]
    pub units_allowed: bool,
    #[serde(rename = "rateAllowed")]
    pub rate_allowed: bool,
    #[serde(rename = "amountAllowed")]
    pub amount_allowed: bool,
}
impl From<&PayPartCodeMeta> for PayPartCodeMetaTO {
    fn from(meta: &PayPartCodeMeta) -> Self {
        Self {
            code: meta.code.to_string(),
            description: meta.description.to_string(),
            units_allowed: meta.units_allowed,
            rate_allowed: meta.rate_allowed,
            amount_allowed: meta.amount_allowed,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct DanlonEmployeeTO {
    pub id: String,
    pub name: String,
    #[serde(rename = "domainId", skip_serializing_if = "Option::is_none")]
    pub domain_id: Option<String>,
}
impl From<&DanlonEmployee> for DanlonEmployeeTO {
    fn from(employee: &DanlonEmployee) -> Self {
        Self {
            id: employee.id.to_string(),
            name: employee.name.to_string(),
            domain_id: employee.domain_id.as_ref().map(|id| id.to_string()),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CreatedPayPartTO {
    #[serde(rename = "employeeId")]
    pub employee_id: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub units: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<i64>,
}
impl From<&CreatedPayPart> for CreatedPayPartTO {
    fn from(pay_part: &CreatedPayPart) -> Self {
        Self {
            employee_id: pay_part.employee_id.to_string(),
            code: pay_part.code.to_string(),
            units: pay_part.units,
            amount: pay_part.amount,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct SkippedItemTO {
    pub worker: String,
    pub date: String,
    pub reason: String,
}
impl From<&SkippedItem> for SkippedItemTO {
    fn from(item: &SkippedItem) -> Self {
        Self {
            worker: item.worker.to_string(),
            date: item.date.to_string(),
            reason: item.reason.to_string(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct SyncSummaryTO {
    pub created: usize,
    pub skipped: usize,
    pub errors: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct SyncResponseTO {
    pub success: bool,
    pub message: String,
    pub summary: SyncSummaryTO,
    pub created_payparts: Vec<CreatedPayPartTO>,
    pub skipped_items: Vec<SkippedItemTO>,
    pub errors: Vec<String>,
    pub unmatched_workers: Vec<String>,
}
impl From<&SyncOutcome> for SyncResponseTO {
    fn from(outcome: &SyncOutcome) -> Self {
        Self {
            success: outcome.success,
            message: outcome.message.to_string(),
            summary: SyncSummaryTO {
                created: outcome.created.len(),
                skipped: outcome.skipped.len(),
                errors: outcome.errors.len(),
            },
            created_payparts: outcome.created.iter().map(CreatedPayPartTO::from).collect(),
            skipped_items: outcome.skipped.iter().map(SkippedItemTO::from).collect(),
            errors: outcome
                .errors
                .iter()
                .map(|error| error.to_string())
                .collect(),
            unmatched_workers: outcome
                .unmatched_workers
                .iter()
                .map(|worker| worker.to_string())
                .collect(),
        }
    }
}
