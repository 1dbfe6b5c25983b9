//! Pull ingest from the FTZ REST APIs.

use axum::{
    extract::State,
    response::Response,
    routing::{get, post},
    Form, Router,
};
use rest_types::{FtzEmployeeTO, PreviewResponseTO};
use serde::Deserialize;
use service::ftz_api::FtzApiService;
use service::preview::{PreviewCacheService, PreviewSnapshot};
use service::processing::ProcessingService;
use service::records::EmployeeType;
use service::ServiceError;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime};
use tracing::instrument;
use utoipa::OpenApi;

use crate::{error_handler, json_response, RestStateDef};

pub fn generate_route<RestState: RestStateDef>() -> Router<RestState> {
    Router::new()
        .route("/fetch-employees", get(fetch_employees::<RestState>))
        .route("/fetch-from-external", post(fetch_from_external::<RestState>))
}

#[instrument(skip(rest_state))]
#[utoipa::path(
    get,
    path = "/fetch-employees",
    tags = ["FTZ"],
    responses(
        (status = 200, description = "Employee list from the FTZ Core API", body = [FtzEmployeeTO]),
        (status = 502, description = "Upstream failure")
    )
)]
pub async fn fetch_employees<RestState: RestStateDef>(
    State(rest_state): State<RestState>,
) -> Response {
    error_handler(
        (async {
            let employees = rest_state.ftz_api_service().fetch_employees().await?;
            let employees: Vec<FtzEmployeeTO> =
                employees.iter().map(FtzEmployeeTO::from).collect();
            Ok(json_response(
                &serde_json::json!({ "employees": employees }),
            ))
        })
        .await,
    )
}

#[derive(Clone, Debug, Deserialize, utoipa::ToSchema)]
pub struct FetchRequest {
    employee_id: i64,
    employee_name: String,
    start_date: String,
    end_date: String,
    #[serde(default)]
    employee_type: Option<String>,
}

fn parse_iso_date(value: &str, label: &str) -> Result<Date, ServiceError> {
    let format = format_description!("[year]-[month]-[day]");
    Date::parse(value.trim(), &format)
        .map_err(|_| ServiceError::invalid_input(format!("Invalid {label} date '{value}'")))
}

#[instrument(skip(rest_state, form))]
#[utoipa::path(
    post,
    path = "/fetch-from-external",
    tags = ["FTZ"],
    responses(
        (status = 200, description = "Processed preview data", body = PreviewResponseTO),
        (status = 400, description = "Invalid date range"),
        (status = 502, description = "Upstream failure")
    )
)]
pub async fn fetch_from_external<RestState: RestStateDef>(
    State(rest_state): State<RestState>,
    Form(form): Form<FetchRequest>,
) -> Response {
    error_handler(
        (async {
            let from = parse_iso_date(&form.start_date, "start")?;
            let to = parse_iso_date(&form.end_date, "end")?;
            let employee_type =
                EmployeeType::from_form_value(form.employee_type.as_deref().unwrap_or("Svend"));

            let mut records = rest_state
                .ftz_api_service()
                .fetch_daily_records(form.employee_id, form.employee_name.trim(), from, to)
                .await?;
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

#[derive(OpenApi)]
#[openapi(
    tags(
        (name = "FTZ", description = "Time-registration pull from FTZ")
    ),
    paths(fetch_employees, fetch_from_external),
    components(schemas(FtzEmployeeTO, FetchRequest))
)]
pub struct FtzApiDoc;
