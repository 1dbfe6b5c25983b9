//! Upload, preview, export and absence-marking endpoints.

use std::collections::HashMap;

use axum::{
    body::Body,
    extract::{Multipart, Path, State},
    response::Response,
    routing::post,
    Form, Router,
};
use lontid_utils::parse_date_dmy;
use rest_types::{PreviewResponseTO, UploadResultTO};
use serde::Deserialize;
use service::csv_export::{CsvExportService, ExportFormat};
use service::csv_import::CsvImportService;
use service::preview::{PreviewCacheService, PreviewSnapshot};
use service::processing::ProcessingService;
use service::records::{AbsentType, DailyRecord, EmployeeType};
use service::ServiceError;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime};
use tracing::instrument;
use utoipa::OpenApi;
use uuid::Uuid;

use crate::{error_handler, json_response, RestStateDef};

pub fn generate_route<RestState: RestStateDef>() -> Router<RestState> {
    Router::new()
        .route("/upload", post(upload::<RestState>))
        .route("/preview", post(preview::<RestState>))
        .route("/export/{session_id}", post(export::<RestState>))
        .route("/mark-absence/{session_id}", post(mark_absence::<RestState>))
}

/// Uploaded CSV files plus the employee type form field.
async fn read_upload(
    mut multipart: Multipart,
) -> Result<(Vec<Vec<u8>>, EmployeeType), ServiceError> {
    let mut files = Vec::new();
    let mut employee_type = EmployeeType::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ServiceError::invalid_input(format!("invalid multipart body: {err}")))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("files") => {
                let is_csv = field
                    .file_name()
                    .map(|name| name.to_lowercase().ends_with(".csv"))
                    .unwrap_or(true);
                let bytes = field.bytes().await.map_err(|err| {
                    ServiceError::invalid_input(format!("could not read upload: {err}"))
                })?;
                if is_csv {
                    files.push(bytes.to_vec());
                }
            }
            Some("employee_type") => {
                let value = field.text().await.map_err(|err| {
                    ServiceError::invalid_input(format!("could not read employee_type: {err}"))
                })?;
                employee_type = EmployeeType::from_form_value(value.trim());
            }
            _ => {}
        }
    }
    if files.is_empty() {
        return Err(ServiceError::invalid_input(
            "No valid CSV data found in uploaded files",
        ));
    }
    Ok((files, employee_type))
}

fn parse_uploaded_records<RestState: RestStateDef>(
    rest_state: &RestState,
    files: &[Vec<u8>],
) -> Result<Vec<DailyRecord>, ServiceError> {
    let mut records = Vec::new();
    for file in files {
        records.extend(rest_state.csv_import_service().parse(file)?);
    }
    if records.is_empty() {
        return Err(ServiceError::invalid_input(
            "No valid CSV data found in uploaded files",
        ));
    }
    Ok(records)
}

#[instrument(skip(rest_state, multipart))]
#[utoipa::path(
    post,
    path = "/upload",
    tags = ["Preview"],
    responses(
        (status = 200, description = "Processing summary", body = UploadResultTO),
        (status = 400, description = "No parseable CSV data")
    )
)]
pub async fn upload<RestState: RestStateDef>(
    State(rest_state): State<RestState>,
    multipart: Multipart,
) -> Response {
    error_handler(
        (async {
            let (files, employee_type) = read_upload(multipart).await?;
            let file_count = files.len();
            let mut records = parse_uploaded_records(&rest_state, &files)?;
            let data = rest_state
                .processing_service()
                .process(&mut records, employee_type)?;

            let timestamp_format = format_description!("[year][month][day]_[hour][minute][second]");
            let timestamp = OffsetDateTime::now_utc()
                .format(&timestamp_format)
                .unwrap_or_default();
            let result = UploadResultTO {
                success: true,
                message: format!(
                    "Successfully processed {file_count} file(s) with {} daily records",
                    data.outputs.len()
                ),
                output_filename: Some(format!("time_registration_{timestamp}.csv")),
                records_processed: data.outputs.len(),
            };
            Ok(json_response(&result))
        })
        .await,
    )
}

#[instrument(skip(rest_state, multipart))]
#[utoipa::path(
    post,
    path = "/preview",
    tags = ["Preview"],
    responses(
        (status = 200, description = "Processed preview data", body = PreviewResponseTO),
        (status = 400, description = "No parseable CSV data")
    )
)]
pub async fn preview<RestState: RestStateDef>(
    State(rest_state): State<RestState>,
    multipart: Multipart,
) -> Response {
    error_handler(
        (async {
            let (files, employee_type) = read_upload(multipart).await?;
            let mut records = parse_uploaded_records(&rest_state, &files)?;
            let data = rest_state
                .processing_service()
                .process(&mut records, employee_type)?;

            let session_id = rest_state.preview_cache_service().insert(PreviewSnapshot {
                records,
                outputs: data.outputs.clone(),
                summaries: data.summaries.clone(),
                call_out_days: data.call_out_days.clone(),
                employee_type,
                created_at: {
                    let now = OffsetDateTime::now_utc();
                    PrimitiveDateTime::new(now.date(), now.time())
                },
            });

            Ok(json_response(&PreviewResponseTO::from_processed(
                session_id, &data,
            )))
        })
        .await,
    )
}

#[derive(Clone, Debug, Deserialize, utoipa::ToSchema)]
pub struct ExportRequest {
    #[serde(default)]
    output_format: Option<String>,
    #[serde(default)]
    call_out_selections: Option<String>,
}

fn parse_call_out_selections(raw: Option<&str>) -> HashMap<Date, bool> {
    let Some(raw) = raw else {
        return HashMap::new();
    };
    let parsed: HashMap<String, bool> = serde_json::from_str(raw).unwrap_or_default();
    parsed
        .into_iter()
        .filter_map(|(date, selected)| Some((parse_date_dmy(&date).ok()?, selected)))
        .collect()
}

#[instrument(skip(rest_state, form))]
#[utoipa::path(
    post,
    path = "/export/{session_id}",
    tags = ["Preview"],
    params(("session_id" = Uuid, Path, description = "Preview session")),
    responses(
        (status = 200, description = "CSV attachment", body = String, content_type = "text/csv"),
        (status = 404, description = "Unknown session")
    )
)]
pub async fn export<RestState: RestStateDef>(
    State(rest_state): State<RestState>,
    Path(session_id): Path<Uuid>,
    Form(form): Form<ExportRequest>,
) -> Response {
    error_handler(
        (async {
            let mut snapshot = rest_state.preview_cache_service().get(session_id)?;
            let selections = parse_call_out_selections(form.call_out_selections.as_deref());
            rest_state
                .processing_service()
                .apply_call_out_selections(&mut snapshot.outputs, &selections);

            let format = ExportFormat::from_form_value(
                form.output_format.as_deref().unwrap_or("daily"),
            );
            let csv = rest_state.csv_export_service().render(
                format,
                &snapshot.outputs,
                &snapshot.summaries,
            )?;

            // Confirmed call-outs stay on the session for a later sync.
            rest_state
                .preview_cache_service()
                .replace(session_id, snapshot)?;

            // BOM so Excel opens the Danish characters correctly.
            let body = format!("\u{feff}{csv}");
            Ok(Response::builder()
                .status(200)
                .header("Content-Type", "text/csv; charset=utf-8")
                .header(
                    "Content-Disposition",
                    format!("attachment; filename={}", format.file_name()),
                )
                .body(Body::new(body))
                .unwrap())
        })
        .await,
    )
}

#[derive(Clone, Debug, Deserialize, utoipa::ToSchema)]
pub struct MarkAbsenceRequest {
    #[serde(default)]
    absence_selections: Option<String>,
}

fn parse_absence_selections(raw: Option<&str>) -> Result<HashMap<Date, AbsentType>, ServiceError> {
    let Some(raw) = raw else {
        return Ok(HashMap::new());
    };
    let parsed: HashMap<String, String> = serde_json::from_str(raw)
        .map_err(|_| ServiceError::invalid_input("Invalid absence selections format"))?;
    parsed
        .into_iter()
        .map(|(date, absent)| {
            let date = parse_date_dmy(&date)?;
            let absent = AbsentType::from_selection(&absent).ok_or_else(|| {
                ServiceError::invalid_input(format!("Unknown absence type '{absent}'"))
            })?;
            Ok((date, absent))
        })
        .collect()
}

#[instrument(skip(rest_state, form))]
#[utoipa::path(
    post,
    path = "/mark-absence/{session_id}",
    tags = ["Preview"],
    params(("session_id" = Uuid, Path, description = "Preview session")),
    responses(
        (status = 200, description = "Recalculated preview data", body = PreviewResponseTO),
        (status = 404, description = "Unknown session")
    )
)]
pub async fn mark_absence<RestState: RestStateDef>(
    State(rest_state): State<RestState>,
    Path(session_id): Path<Uuid>,
    Form(form): Form<MarkAbsenceRequest>,
) -> Response {
    error_handler(
        (async {
            let selections = parse_absence_selections(form.absence_selections.as_deref())?;
            let mut snapshot = rest_state.preview_cache_service().get(session_id)?;

            let processing = rest_state.processing_service();
            processing.apply_absence_selections(&mut snapshot.records, &selections)?;
            // Tiering is order-dependent across the week, so the whole
            // pipeline runs again.
            let data = processing.process(&mut snapshot.records, snapshot.employee_type)?;

            snapshot.outputs = data.outputs.clone();
            snapshot.summaries = data.summaries.clone();
            snapshot.call_out_days = data.call_out_days.clone();
            rest_state
                .preview_cache_service()
                .replace(session_id, snapshot)?;

            Ok(json_response(&PreviewResponseTO::from_processed(
                session_id, &data,
            )))
        })
        .await,
    )
}

#[derive(OpenApi)]
#[openapi(
    tags(
        (name = "Preview", description = "CSV upload, preview and export")
    ),
    paths(upload, preview, export, mark_absence),
    components(schemas(UploadResultTO, PreviewResponseTO, ExportRequest, MarkAbsenceRequest))
)]
pub struct PreviewApiDoc;
